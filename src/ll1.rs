//! LL(1) predictive parser.
//!
//! Construction runs the whole pipeline: normalization (left-recursion
//! removal, then left factoring), FIRST/FOLLOW analysis, and parse-table
//! construction. Recognition is a table-driven stack machine over the
//! characters of the input.

use crate::error::Result;
use crate::first_follow::{build_first_sets, build_follow_sets, FirstSets, FollowSets};
use crate::grammar::Grammar;
use crate::normalize::{left_factor, remove_left_recursion};
use crate::parse_table::{build_parse_table, ParseTable};
use crate::symbol::{END, EPSILON};
use log::debug;
use std::collections::HashSet;

/// Table-driven LL(1) recognizer.
#[derive(Debug)]
pub struct LLParser {
    /// The normalized grammar the table was built from
    grammar: Grammar,
    /// Nonterminal names of the normalized grammar, including fresh ones
    nonterminals: HashSet<char>,
    table: ParseTable,
    first_sets: FirstSets,
    follow_sets: FollowSets,
}

impl LLParser {
    /// Builds a parser by normalizing the grammar and constructing its
    /// LL(1) parse table.
    ///
    /// # Errors
    /// Fails when the normalized grammar is not LL(1) or when its FIRST or
    /// FOLLOW computation hits a cyclic dependency.
    pub fn new(grammar: Grammar) -> Result<Self> {
        let grammar = left_factor(&remove_left_recursion(&grammar));
        debug!("normalized grammar:\n{}", grammar);

        let first_sets = build_first_sets(&grammar)?;
        let follow_sets = build_follow_sets(&grammar, &first_sets)?;
        let table = build_parse_table(&grammar, &first_sets, &follow_sets)?;

        // The step rules classify stack entries against this set, so it must
        // come from the normalized grammar: fresh nonterminals introduced by
        // the rewrites land on the stack like any other.
        let nonterminals = grammar.nonterminals().clone();

        Ok(Self {
            grammar,
            nonterminals,
            table,
            first_sets,
            follow_sets,
        })
    }

    /// Decides whether the input string is in the grammar's language.
    ///
    /// The stack starts as `[$, start]` and the input is the characters of
    /// `input` followed by `$`. At each step, the first matching rule fires:
    /// accept (both sides at `$`), match (top equals the token), predict
    /// (top is a nonterminal with a table entry; its body is pushed in
    /// reverse with ε filtered out), or reject.
    pub fn parse(&self, input: &str) -> bool {
        let mut stack = vec![END, self.grammar.start_symbol().name()];

        let tokens: Vec<char> = input.chars().chain(std::iter::once(END)).collect();
        let mut i = 0;

        while i < tokens.len() {
            let Some(&top) = stack.last() else {
                return false;
            };
            let token = tokens[i];

            if top == END && token == END {
                // successful full match
                return true;
            } else if top == token {
                stack.pop();
                i += 1;
            } else if self.nonterminals.contains(&top) {
                let Some(body) = self.table.get(&(top, token)) else {
                    // predict miss
                    return false;
                };
                stack.pop();
                stack.extend(body.iter().rev().filter(|c| **c != EPSILON));
            } else {
                // terminal mismatch
                return false;
            }
        }

        true
    }

    /// Returns the normalized grammar the parser runs on.
    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// Returns a reference to the parse table.
    pub fn table(&self) -> &ParseTable {
        &self.table
    }

    /// Returns the FIRST sets of the normalized grammar.
    pub fn first_sets(&self) -> &FirstSets {
        &self.first_sets
    }

    /// Returns the FOLLOW sets of the normalized grammar.
    pub fn follow_sets(&self) -> &FollowSets {
        &self.follow_sets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let grammar = Grammar::from_pairs(&[
            ('S', "AB"),
            ('A', "aA"),
            ('A', "d"),
            ('B', "bBc"),
            ('B', ""),
        ])
        .unwrap();

        let parser = LLParser::new(grammar).unwrap();
        assert!(parser.parse("d"));
        assert!(parser.parse("adbc"));
        assert!(!parser.parse("a"));
    }

    #[test]
    fn test_fresh_nonterminals_predictable() {
        // Left-recursive grammar: normalization introduces a fresh
        // nonterminal, which the recognizer must treat as one.
        let grammar = Grammar::from_pairs(&[('A', "Ab"), ('A', "c")]).unwrap();

        let parser = LLParser::new(grammar).unwrap();
        assert!(parser.parse("c"));
        assert!(parser.parse("cbb"));
        assert!(!parser.parse("b"));
    }
}
