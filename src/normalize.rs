//! Grammar normalization passes.
//!
//! Two rewrites prepare a grammar for predictive parsing: removal of
//! immediate left recursion and factoring of common left prefixes. Each pass
//! consumes a grammar and produces a new one; nonterminals are processed in
//! order of first appearance as an lhs, and both passes keep the start
//! symbol's rule first.
//!
//! Only *immediate* left recursion is handled; indirect recursion
//! (`A ⇒ B α, B ⇒ A β`) passes through unchanged.

use crate::grammar::{Grammar, Production};
use crate::symbol::Symbol;
use log::{debug, warn};
use std::collections::{HashMap, HashSet};

/// Source of nonterminal names unused by a grammar.
///
/// Seeded with the highest code point among the grammar's lhs names and
/// yielding successive characters from there, so the same grammar always
/// produces the same fresh sequence. Names are drawn lazily, one per rewrite
/// that needs one.
#[derive(Debug)]
pub struct FreshNames {
    last: u32,
}

impl FreshNames {
    /// Seeds a generator from the lhs names already used by `grammar`.
    pub fn for_grammar(grammar: &Grammar) -> Self {
        let last = grammar
            .all_productions()
            .iter()
            .map(|p| p.lhs.name() as u32)
            .max()
            .unwrap_or(0);
        Self { last }
    }

    /// Draws the next unused name.
    pub fn draw(&mut self) -> char {
        // Code points in the surrogate range are not chars; step past them.
        loop {
            self.last += 1;
            if let Some(c) = char::from_u32(self.last) {
                return c;
            }
        }
    }
}

impl Iterator for FreshNames {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        Some(self.draw())
    }
}

/// Rewrites the grammar so that no production is immediately left-recursive.
///
/// Per nonterminal A:
/// 1. trivial rules `A → A` are dropped;
/// 2. if no rule starts with A, the rules pass through unchanged;
/// 3. otherwise a fresh A′ is allocated, `A → A γ` becomes `A′ → γ A′`, and
///    `A → β` becomes `A → β A′` (inserted at the front so the start symbol
///    keeps the first rule);
/// 4. `A′ → ε` is appended when at least one non-recursive rule existed.
///    When every rule was recursive, `A → A′` is prepended instead and no ε
///    rule is added; A then derives no terminal string, which is logged and
///    passed through.
pub fn remove_left_recursion(grammar: &Grammar) -> Grammar {
    let mut names = FreshNames::for_grammar(grammar);

    let mut new_rules = Vec::new();
    for nt in grammar.lhs_order() {
        new_rules.extend(split_rules(grammar.productions_for(nt), &mut names));
    }

    if new_rules.is_empty() {
        // Every rule was a trivial self-loop; nothing sensible to rewrite.
        warn!("grammar contains only trivial self-loops; left unchanged");
        return grammar.clone();
    }

    let rewritten = Grammar::from_rules(new_rules);
    debug!("removed left recursion:\n{}", rewritten);
    rewritten
}

/// Rewrites the rules of one nonterminal, eliminating left recursion.
fn split_rules(rules: &[Production], names: &mut FreshNames) -> Vec<Production> {
    let rules: Vec<&Production> = rules.iter().filter(|r| r.rhs != [r.lhs]).collect();

    if !rules.iter().any(|r| is_left_recursive(r)) {
        return rules.into_iter().cloned().collect();
    }

    let old_symbol = rules[0].lhs;
    let new_symbol = Symbol::Nonterminal(names.draw());

    let mut new_rules = Vec::new();
    let mut found_non_recursive = false;

    for rule in &rules {
        if is_left_recursive(rule) {
            // A → A γ becomes A′ → γ A′
            let mut rhs: Vec<Symbol> = rule.rhs[1..].to_vec();
            rhs.push(new_symbol);
            new_rules.push(Production::new(new_symbol, rhs));
        } else {
            // A → β becomes A → β A′, inserted at the front to keep the
            // start symbol's rule first.
            found_non_recursive = true;
            let mut rhs = rule.rhs.clone();
            rhs.push(new_symbol);
            new_rules.insert(0, Production::new(old_symbol, rhs));
        }
    }

    if found_non_recursive {
        new_rules.push(Production::empty(new_symbol));
    } else {
        warn!(
            "every rule of {} is left-recursive; {} derives no terminal string",
            old_symbol, old_symbol
        );
        new_rules.insert(0, Production::new(old_symbol, vec![new_symbol]));
    }

    new_rules
}

fn is_left_recursive(rule: &Production) -> bool {
    rule.rhs[0] == rule.lhs
}

/// Factors common left prefixes among each nonterminal's productions.
///
/// Per nonterminal A:
/// 1. the longest common prefix of every pair of A-rules is recorded, along
///    with the rule indices sharing it;
/// 2. a rule belongs to at most one group: a rule with several candidate
///    prefixes keeps only its longest and leaves the other groups;
/// 3. groups left with fewer than two rules dissolve;
/// 4. each surviving `(prefix P, rules I)` gets a fresh nonterminal B,
///    emitting `A → P B` and, for each rule in I, `B → suffix` (ε when the
///    suffix is empty);
/// 5. rules in no group are appended unchanged.
///
/// The pass runs once; the longest-prefix-wins tie-break keeps the grouping
/// deterministic.
pub fn left_factor(grammar: &Grammar) -> Grammar {
    let mut names = FreshNames::for_grammar(grammar);

    let mut new_rules = Vec::new();
    for nt in grammar.lhs_order() {
        new_rules.extend(factor_rules(grammar.productions_for(nt), &mut names));
    }

    let factored = Grammar::from_rules(new_rules);
    debug!("left-factored:\n{}", factored);
    factored
}

/// Factors the rules of one nonterminal.
fn factor_rules(rules: &[Production], names: &mut FreshNames) -> Vec<Production> {
    // Prefix groups in discovery order, and each rule's candidate prefixes.
    let mut groups: Vec<(Vec<Symbol>, Vec<usize>)> = Vec::new();
    let mut candidates: HashMap<usize, Vec<Vec<Symbol>>> = HashMap::new();

    for i in 0..rules.len() {
        for j in i + 1..rules.len() {
            let prefix = common_prefix(&rules[i].rhs, &rules[j].rhs);
            if prefix.is_empty() {
                continue;
            }

            let pos = match groups.iter().position(|(p, _)| *p == prefix) {
                Some(pos) => pos,
                None => {
                    groups.push((prefix.clone(), Vec::new()));
                    groups.len() - 1
                }
            };
            let members = &mut groups[pos].1;
            for idx in [i, j] {
                if !members.contains(&idx) {
                    members.push(idx);
                }
                let cands = candidates.entry(idx).or_default();
                if !cands.contains(&prefix) {
                    cands.push(prefix.clone());
                }
            }
        }
    }

    if groups.is_empty() {
        return rules.to_vec();
    }

    // Longest prefix wins: a rule sharing several prefixes stays only in the
    // group of its longest one. Candidate prefixes of one rule all have
    // distinct lengths, so the longest is unique.
    for (&idx, prefixes) in &candidates {
        if prefixes.len() < 2 {
            continue;
        }
        let Some(longest) = prefixes.iter().max_by_key(|p| p.len()) else {
            continue;
        };
        for (prefix, members) in groups.iter_mut() {
            if prefix != longest {
                members.retain(|&m| m != idx);
            }
        }
    }

    groups.retain(|(_, members)| members.len() >= 2);

    let grouped: HashSet<usize> = groups
        .iter()
        .flat_map(|(_, members)| members.iter().copied())
        .collect();

    let mut new_rules = Vec::new();
    for (prefix, members) in &groups {
        let old_symbol = rules[members[0]].lhs;
        let new_symbol = Symbol::Nonterminal(names.draw());

        let mut rhs = prefix.clone();
        rhs.push(new_symbol);
        new_rules.push(Production::new(old_symbol, rhs));

        let mut members = members.clone();
        members.sort_unstable();
        for idx in members {
            let suffix = &rules[idx].rhs[prefix.len()..];
            new_rules.push(if suffix.is_empty() {
                Production::empty(new_symbol)
            } else {
                Production::new(new_symbol, suffix.to_vec())
            });
        }
    }

    for (idx, rule) in rules.iter().enumerate() {
        if !grouped.contains(&idx) {
            new_rules.push(rule.clone());
        }
    }

    new_rules
}

/// Longest common prefix of two symbol sequences.
fn common_prefix(a: &[Symbol], b: &[Symbol]) -> Vec<Symbol> {
    a.iter()
        .zip(b.iter())
        .take_while(|(x, y)| x == y)
        .map(|(x, _)| *x)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Grammar;

    fn rhs_of(grammar: &Grammar, nt: char) -> Vec<String> {
        grammar
            .productions_for(nt)
            .iter()
            .map(|p| crate::symbol::symbols_to_string(&p.rhs))
            .collect()
    }

    #[test]
    fn test_fresh_names_follow_highest_lhs() {
        let grammar = Grammar::from_pairs(&[('A', "b"), ('C', "d")]).unwrap();
        let mut names = FreshNames::for_grammar(&grammar);
        assert_eq!(names.draw(), 'D');
        assert_eq!(names.draw(), 'E');

        let rest: Vec<char> = FreshNames::for_grammar(&grammar).take(3).collect();
        assert_eq!(rest, vec!['D', 'E', 'F']);
    }

    #[test]
    fn test_common_prefix() {
        let a = [Symbol::Terminal('b'), Symbol::Terminal('c')];
        let b = [Symbol::Terminal('b'), Symbol::Terminal('d')];
        assert_eq!(common_prefix(&a, &b), vec![Symbol::Terminal('b')]);
        assert_eq!(common_prefix(&a, &a[..1]), vec![Symbol::Terminal('b')]);
    }

    #[test]
    fn test_factoring_leaves_distinct_heads_alone() {
        let grammar = Grammar::from_pairs(&[('A', "bc"), ('A', "de")]).unwrap();
        let factored = left_factor(&grammar);
        assert_eq!(rhs_of(&factored, 'A'), vec!["bc", "de"]);
    }
}
