//! LL(1) parse-table construction.
//!
//! The table maps `(nonterminal, terminal)` cells to the right-hand side of
//! the rule the parser should predict, spelled as the sequence of symbol
//! names. Cells that receive two different bodies make the grammar
//! non-LL(1) and abort construction.

use crate::error::{GrammarError, Result};
use crate::first_follow::{first_of_string, FirstSets, FollowSets};
use crate::grammar::Grammar;
use crate::symbol::EPSILON;
use log::debug;
use std::collections::HashMap;

/// Parse table: `M[nonterminal, terminal]` = rhs as symbol names.
///
/// Absence of an entry means "no prediction". ε appears as its sentinel
/// character and is filtered by the recognizer.
pub type ParseTable = HashMap<(char, char), Vec<char>>;

/// Builds the LL(1) parse table for a grammar.
///
/// For each rule `A → α`:
/// - every terminal of `FIRST(α) \ {ε}` maps `(A, t)` to α;
/// - when ε ∈ FIRST(α), every terminal of FOLLOW(A) (including the
///   end-of-input marker) maps `(A, t)` to α.
///
/// # Errors
/// Fails with [`GrammarError::LL1Conflict`] when a cell would receive a
/// second, different body. Writing the identical body twice is not a
/// conflict.
pub fn build_parse_table(
    grammar: &Grammar,
    first_sets: &FirstSets,
    follow_sets: &FollowSets,
) -> Result<ParseTable> {
    let mut table = ParseTable::new();

    for rule in grammar.all_productions() {
        let lhs = rule.lhs.name();
        let body: Vec<char> = rule.rhs.iter().map(|s| s.name()).collect();

        let first_alpha = first_of_string(first_sets, &rule.rhs);

        for terminal in &first_alpha {
            if *terminal != EPSILON {
                insert_cell(&mut table, lhs, *terminal, &body)?;
            }
        }

        if first_alpha.contains(&EPSILON) {
            if let Some(follow_lhs) = follow_sets.get(&lhs) {
                for terminal in follow_lhs {
                    insert_cell(&mut table, lhs, *terminal, &body)?;
                }
            }
        }
    }

    debug!("parse table has {} entries", table.len());
    Ok(table)
}

/// Writes one table cell, rejecting a double-write with a differing body.
fn insert_cell(
    table: &mut ParseTable,
    nonterminal: char,
    terminal: char,
    body: &[char],
) -> Result<()> {
    match table.get(&(nonterminal, terminal)) {
        Some(existing) if existing.as_slice() != body => Err(GrammarError::LL1Conflict {
            nonterminal,
            terminal,
            existing: existing.iter().collect(),
            candidate: body.iter().collect(),
        }),
        Some(_) => Ok(()),
        None => {
            table.insert((nonterminal, terminal), body.to_vec());
            Ok(())
        }
    }
}
