//! FIRST and FOLLOW set computation for context-free grammars.
//!
//! FIRST sets are computed by recursive memoization over the nonterminals,
//! with explicit cycle detection. FOLLOW sets are computed in two phases:
//! direct contributions first, then absorption of one FOLLOW set into
//! another along a dependency graph resolved by topological sort.

use crate::error::{GrammarError, Result};
use crate::grammar::Grammar;
use crate::symbol::{Symbol, END, EPSILON};
use log::debug;
use std::collections::{HashMap, HashSet, VecDeque};

/// FIRST sets by nonterminal name; values may contain [`EPSILON`].
pub type FirstSets = HashMap<char, HashSet<char>>;

/// FOLLOW sets by nonterminal name; values may contain [`END`].
pub type FollowSets = HashMap<char, HashSet<char>>;

/// Computes the FIRST sets for all nonterminals in the grammar.
///
/// FIRST(N) is the set of terminals that can begin a string derivable from
/// N, plus ε when some production of N derives the empty string.
///
/// # Errors
/// Fails with [`GrammarError::CyclicFirstDependency`] when a nonterminal's
/// FIRST set depends on itself, as under left recursion.
pub fn build_first_sets(grammar: &Grammar) -> Result<FirstSets> {
    let mut sets = FirstSets::new();
    let mut visiting = HashSet::new();

    for nt in grammar.lhs_order() {
        nonterminal_first(grammar, nt, &mut sets, &mut visiting)?;
    }

    debug!("FIRST sets: {:?}", sets);
    Ok(sets)
}

/// Ensures FIRST(nt) is memoized, recursing into the nonterminals its
/// productions start with.
fn nonterminal_first(
    grammar: &Grammar,
    nt: char,
    sets: &mut FirstSets,
    visiting: &mut HashSet<char>,
) -> Result<()> {
    if sets.contains_key(&nt) {
        return Ok(());
    }
    if !visiting.insert(nt) {
        return Err(GrammarError::CyclicFirstDependency { nonterminal: nt });
    }

    let mut first = HashSet::new();
    for rule in grammar.productions_for(nt) {
        first.extend(sequence_first(grammar, &rule.rhs, sets, visiting)?);
    }

    visiting.remove(&nt);
    sets.insert(nt, first);
    Ok(())
}

/// FIRST of a symbol sequence, memoizing nonterminal FIRST sets on demand.
fn sequence_first(
    grammar: &Grammar,
    symbols: &[Symbol],
    sets: &mut FirstSets,
    visiting: &mut HashSet<char>,
) -> Result<HashSet<char>> {
    let mut acc = HashSet::new();
    let mut derives_epsilon = true;

    for symbol in symbols {
        derives_epsilon = false;

        match symbol {
            Symbol::Terminal(EPSILON) => derives_epsilon = true,
            Symbol::Terminal(c) => {
                acc.insert(*c);
            }
            Symbol::Nonterminal(n) => {
                nonterminal_first(grammar, *n, sets, visiting)?;
                let first_n = &sets[n];
                if first_n.contains(&EPSILON) {
                    acc.extend(first_n.iter().filter(|c| **c != EPSILON));
                    derives_epsilon = true;
                } else {
                    acc.extend(first_n.iter());
                }
            }
        }

        if !derives_epsilon {
            break;
        }
    }

    // The whole sequence derives ε: an empty sequence trivially, a non-empty
    // one when every symbol does.
    if derives_epsilon {
        acc.insert(EPSILON);
    }

    Ok(acc)
}

/// Computes the FIRST set of a symbol string from already-computed sets.
///
/// Terminals contribute their character; a nonterminal contributes its FIRST
/// set, continuing to the next symbol only while ε remains derivable. The
/// result contains ε exactly when the whole string derives ε (an empty
/// string always does).
pub fn first_of_string(first_sets: &FirstSets, symbols: &[Symbol]) -> HashSet<char> {
    let mut acc = HashSet::new();
    let mut derives_epsilon = true;

    for symbol in symbols {
        derives_epsilon = false;

        match symbol {
            Symbol::Terminal(EPSILON) => derives_epsilon = true,
            Symbol::Terminal(c) => {
                acc.insert(*c);
            }
            Symbol::Nonterminal(n) => {
                let first_n = first_sets.get(n).cloned().unwrap_or_default();
                if first_n.contains(&EPSILON) {
                    acc.extend(first_n.iter().filter(|c| **c != EPSILON));
                    derives_epsilon = true;
                } else {
                    acc.extend(first_n.iter());
                }
            }
        }

        if !derives_epsilon {
            break;
        }
    }

    if derives_epsilon {
        acc.insert(EPSILON);
    }

    acc
}

/// Computes the FOLLOW sets for all nonterminals in the grammar.
///
/// FOLLOW(N) is the set of terminals that can immediately follow N in a
/// sentential form derivable from the start symbol, plus [`END`] when N can
/// end such a form. FOLLOW of the start symbol always contains [`END`].
///
/// # Algorithm
/// Phase A scans every rule `A → X₁…Xₖ`: each nonterminal Xᵢ receives
/// `FIRST(X_{i+1}…Xₖ) \ {ε}` directly, and when that tail can vanish the
/// dependency `FOLLOW(Xᵢ) ⊇ FOLLOW(A)` is recorded as a graph edge
/// (self-edges are trivially satisfied and suppressed). Phase B
/// topologically sorts the graph and absorbs the dependency sets in reverse
/// order.
///
/// # Errors
/// Fails with [`GrammarError::CyclicFollowDependency`] when the dependency
/// graph is cyclic.
pub fn build_follow_sets(grammar: &Grammar, first_sets: &FirstSets) -> Result<FollowSets> {
    let mut sets: FollowSets = grammar
        .nonterminals()
        .iter()
        .map(|nt| (*nt, HashSet::new()))
        .collect();

    let start = grammar.start_symbol().name();
    if let Some(follow_start) = sets.get_mut(&start) {
        follow_start.insert(END);
    }

    // Phase A: direct contributions and the dependency graph.
    let mut dependencies: HashMap<char, HashSet<char>> = HashMap::new();
    for rule in grammar.all_productions() {
        let lhs = rule.lhs.name();

        for (i, symbol) in rule.rhs.iter().enumerate() {
            if !symbol.is_nonterminal() {
                continue;
            }
            let nt = symbol.name();

            let first_beta = first_of_string(first_sets, &rule.rhs[i + 1..]);
            if let Some(follow_nt) = sets.get_mut(&nt) {
                follow_nt.extend(first_beta.iter().filter(|c| **c != EPSILON));
            }

            if first_beta.contains(&EPSILON) && nt != lhs {
                dependencies.entry(nt).or_default().insert(lhs);
            }
        }
    }

    // Phase B: resolve FOLLOW(u) ⊇ FOLLOW(v) edges in reverse topo-order,
    // so every dependency set is complete before it is absorbed.
    let order = topo_sort(&dependencies)?;
    for nt in order.iter().rev() {
        let Some(deps) = dependencies.get(nt) else {
            continue;
        };
        let mut absorbed = HashSet::new();
        for dep in deps {
            if let Some(follow_dep) = sets.get(dep) {
                absorbed.extend(follow_dep.iter().copied());
            }
        }
        if let Some(follow_nt) = sets.get_mut(nt) {
            follow_nt.extend(absorbed);
        }
    }

    debug!("FOLLOW sets: {:?}", sets);
    Ok(sets)
}

/// Topologically sorts a dependency graph with Kahn's algorithm.
///
/// An edge `u → v` places u before v in the result. The node set is the
/// union of keys and edge targets; ordering is deterministic for a given
/// graph.
///
/// # Errors
/// Fails with [`GrammarError::CyclicFollowDependency`] when edges remain
/// after the ready queue drains.
pub fn topo_sort(dependencies: &HashMap<char, HashSet<char>>) -> Result<Vec<char>> {
    let mut nodes: Vec<char> = dependencies
        .iter()
        .flat_map(|(node, targets)| std::iter::once(*node).chain(targets.iter().copied()))
        .collect();
    nodes.sort_unstable();
    nodes.dedup();

    let mut in_degree: HashMap<char, usize> = nodes.iter().map(|n| (*n, 0)).collect();
    for targets in dependencies.values() {
        for target in targets {
            *in_degree.get_mut(target).expect("target in node set") += 1;
        }
    }

    let mut ready: VecDeque<char> = nodes
        .iter()
        .filter(|n| in_degree[n] == 0)
        .copied()
        .collect();

    let mut order = Vec::with_capacity(nodes.len());
    while let Some(node) = ready.pop_front() {
        order.push(node);

        let Some(targets) = dependencies.get(&node) else {
            continue;
        };
        let mut targets: Vec<char> = targets.iter().copied().collect();
        targets.sort_unstable();
        for target in targets {
            let degree = in_degree.get_mut(&target).expect("target in node set");
            *degree -= 1;
            if *degree == 0 {
                ready.push_back(target);
            }
        }
    }

    if order.len() != nodes.len() {
        return Err(GrammarError::CyclicFollowDependency);
    }
    Ok(order)
}
