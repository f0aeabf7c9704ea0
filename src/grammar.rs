//! Grammar module for context-free grammars.
//!
//! This module provides the production and grammar representations shared by
//! every pass of the pipeline, plus the textual authoring conventions used to
//! build grammars in tests and by callers.

use crate::error::{GrammarError, Result};
use crate::symbol::{symbols_to_string, Symbol, END, EPSILON};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// A production rule in a context-free grammar.
///
/// Represents a rule of the form: LHS → RHS
/// where LHS is a single nonterminal and RHS is a non-empty sequence of
/// symbols. The empty production is written with an RHS of exactly `[ε]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Production {
    /// Left-hand side (always a nonterminal)
    pub lhs: Symbol,
    /// Right-hand side (sequence of symbols)
    pub rhs: Vec<Symbol>,
}

impl Production {
    /// Creates a new production.
    pub fn new(lhs: Symbol, rhs: Vec<Symbol>) -> Self {
        Self { lhs, rhs }
    }

    /// Creates the empty production `lhs → ε`.
    pub fn empty(lhs: Symbol) -> Self {
        Self::new(lhs, vec![Symbol::epsilon()])
    }

    /// Checks whether this is the empty production.
    pub fn is_empty_production(&self) -> bool {
        self.rhs == [Symbol::epsilon()]
    }
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.lhs, symbols_to_string(&self.rhs))
    }
}

/// A context-free grammar.
///
/// An ordered sequence of productions plus the designated start nonterminal.
/// The first rule's left-hand side is the start symbol; every pass in the
/// pipeline preserves this property. Grammars are immutable once built.
#[derive(Debug, Clone)]
pub struct Grammar {
    /// All productions, in authoring order
    productions: Vec<Production>,
    /// Names of all nonterminal symbols
    nonterminals: HashSet<char>,
    /// Names of all terminal symbols (ε excluded)
    terminals: HashSet<char>,
    /// The start symbol (the first rule's lhs)
    start_symbol: Symbol,
    /// Map from nonterminal names to their productions
    production_map: HashMap<char, Vec<Production>>,
}

impl Grammar {
    /// Builds a grammar from `(lhs, rhs)` character pairs.
    ///
    /// # Conventions
    /// - A character appearing as any pair's lhs is a nonterminal wherever it
    ///   occurs in any rhs; all other rhs characters are terminals.
    /// - An empty rhs string denotes the empty production `lhs → ε`.
    ///
    /// # Examples
    /// ```
    /// use predictive_parser::grammar::Grammar;
    /// let grammar = Grammar::from_pairs(&[
    ///     ('A', "Bc"),
    ///     ('B', "d"),
    ///     ('B', ""),
    /// ]).unwrap();
    /// assert_eq!(grammar.start_symbol().name(), 'A');
    /// ```
    ///
    /// # Errors
    /// Rejects an empty rule list, a literal ε anywhere, and any use of the
    /// reserved end-of-input character.
    pub fn from_pairs(pairs: &[(char, &str)]) -> Result<Self> {
        if pairs.is_empty() {
            return Err(GrammarError::EmptyGrammar);
        }

        let nonterminal_chars: HashSet<char> = pairs.iter().map(|(lhs, _)| *lhs).collect();

        let mut rules = Vec::with_capacity(pairs.len());
        for (lhs, rhs_str) in pairs {
            if *lhs == EPSILON || *lhs == END {
                return Err(GrammarError::ReservedSymbol {
                    lhs: *lhs,
                    symbol: *lhs,
                });
            }

            let rhs = if rhs_str.is_empty() {
                vec![Symbol::epsilon()]
            } else {
                let mut rhs = Vec::new();
                for c in rhs_str.chars() {
                    if c == EPSILON {
                        return Err(GrammarError::EpsilonInRhs { lhs: *lhs });
                    }
                    if c == END {
                        return Err(GrammarError::ReservedSymbol {
                            lhs: *lhs,
                            symbol: c,
                        });
                    }
                    rhs.push(if nonterminal_chars.contains(&c) {
                        Symbol::Nonterminal(c)
                    } else {
                        Symbol::Terminal(c)
                    });
                }
                rhs
            };

            rules.push(Production::new(Symbol::Nonterminal(*lhs), rhs));
        }

        Ok(Self::from_rules(rules))
    }

    /// Creates a grammar from an already-validated rule list.
    ///
    /// The start symbol is the first rule's lhs. Used by the normalization
    /// passes, which only ever produce well-formed rule lists.
    pub(crate) fn from_rules(productions: Vec<Production>) -> Self {
        debug_assert!(!productions.is_empty());

        let nonterminals: HashSet<char> = productions.iter().map(|p| p.lhs.name()).collect();

        let mut terminals = HashSet::new();
        for prod in &productions {
            for sym in &prod.rhs {
                if sym.is_terminal() && !sym.is_epsilon() {
                    terminals.insert(sym.name());
                }
            }
        }

        let start_symbol = productions[0].lhs;

        let mut production_map: HashMap<char, Vec<Production>> = HashMap::new();
        for prod in &productions {
            production_map
                .entry(prod.lhs.name())
                .or_default()
                .push(prod.clone());
        }

        Self {
            productions,
            nonterminals,
            terminals,
            start_symbol,
            production_map,
        }
    }

    /// Returns all productions for a given nonterminal name.
    pub fn productions_for(&self, nt: char) -> &[Production] {
        self.production_map
            .get(&nt)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Returns all productions in the grammar, in order.
    pub fn all_productions(&self) -> &[Production] {
        &self.productions
    }

    /// Returns the names of all nonterminals in the grammar.
    pub fn nonterminals(&self) -> &HashSet<char> {
        &self.nonterminals
    }

    /// Returns the names of all terminals in the grammar.
    pub fn terminals(&self) -> &HashSet<char> {
        &self.terminals
    }

    /// Returns the start symbol.
    pub fn start_symbol(&self) -> Symbol {
        self.start_symbol
    }

    /// Returns the names of nonterminals that appear in some rhs but have no
    /// rule of their own, sorted for stable reporting.
    ///
    /// Such grammars derive nothing from the affected nonterminals; detection
    /// is offered as a diagnostic, repair is left to the caller.
    pub fn undefined_nonterminals(&self) -> Vec<char> {
        let mut missing: Vec<char> = self
            .productions
            .iter()
            .flat_map(|p| p.rhs.iter())
            .filter(|s| s.is_nonterminal())
            .map(|s| s.name())
            .filter(|c| !self.production_map.contains_key(c))
            .collect();
        missing.sort_unstable();
        missing.dedup();
        missing
    }

    /// Returns the nonterminal names in order of first appearance as an lhs.
    ///
    /// The normalization passes process nonterminals in exactly this order.
    pub(crate) fn lhs_order(&self) -> Vec<char> {
        let mut seen = HashSet::new();
        self.productions
            .iter()
            .map(|p| p.lhs.name())
            .filter(|c| seen.insert(*c))
            .collect()
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for prod in &self.productions {
            writeln!(f, "{}", prod)?;
        }
        Ok(())
    }
}
