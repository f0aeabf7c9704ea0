//! Tests for LL(1) parse-table construction.

use predictive_parser::error::GrammarError;
use predictive_parser::first_follow::{build_first_sets, build_follow_sets};
use predictive_parser::grammar::Grammar;
use predictive_parser::parse_table::{build_parse_table, ParseTable};
use predictive_parser::symbol::{END, EPSILON};

/// `+,*` strings over `0`, with parentheses.
fn arithmetic_grammar() -> Grammar {
    Grammar::from_pairs(&[
        ('E', "TH"),
        ('H', "+TH"),
        ('H', ""),
        ('T', "FG"),
        ('G', "*FG"),
        ('G', ""),
        ('F', "(E)"),
        ('F', "0"),
    ])
    .unwrap()
}

fn build(grammar: &Grammar) -> Result<ParseTable, GrammarError> {
    let first_sets = build_first_sets(grammar)?;
    let follow_sets = build_follow_sets(grammar, &first_sets)?;
    build_parse_table(grammar, &first_sets, &follow_sets)
}

#[test]
fn test_arithmetic_parse_table() {
    let table = build(&arithmetic_grammar()).unwrap();

    let expected: ParseTable = [
        (('E', '0'), vec!['T', 'H']),
        (('E', '('), vec!['T', 'H']),
        (('H', '+'), vec!['+', 'T', 'H']),
        (('H', ')'), vec![EPSILON]),
        (('H', END), vec![EPSILON]),
        (('T', '0'), vec!['F', 'G']),
        (('T', '('), vec!['F', 'G']),
        (('G', '+'), vec![EPSILON]),
        (('G', '*'), vec!['*', 'F', 'G']),
        (('G', ')'), vec![EPSILON]),
        (('G', END), vec![EPSILON]),
        (('F', '0'), vec!['0']),
        (('F', '('), vec!['(', 'E', ')']),
    ]
    .into_iter()
    .collect();

    assert_eq!(table, expected);
}

#[test]
fn test_entries_justified_by_first_or_follow() {
    let grammar = arithmetic_grammar();
    let first_sets = build_first_sets(&grammar).unwrap();
    let follow_sets = build_follow_sets(&grammar, &first_sets).unwrap();
    let table = build_parse_table(&grammar, &first_sets, &follow_sets).unwrap();

    for ((nt, terminal), body) in &table {
        let rule = grammar
            .productions_for(*nt)
            .iter()
            .find(|p| p.rhs.iter().map(|s| s.name()).collect::<Vec<_>>() == *body)
            .expect("table body corresponds to a rule");

        let first_alpha =
            predictive_parser::first_follow::first_of_string(&first_sets, &rule.rhs);
        let justified = (first_alpha.contains(terminal) && *terminal != EPSILON)
            || (first_alpha.contains(&EPSILON) && follow_sets[nt].contains(terminal));
        assert!(justified, "unjustified entry at ({}, {})", nt, terminal);
    }
}

#[test]
fn test_first_first_conflict() {
    // FIRST(Ab) and FIRST(Bc) both start with 'a'.
    let grammar =
        Grammar::from_pairs(&[('S', "Ab"), ('S', "Bc"), ('A', "a"), ('B', "a")]).unwrap();

    match build(&grammar) {
        Err(GrammarError::LL1Conflict {
            nonterminal,
            terminal,
            ..
        }) => {
            assert_eq!(nonterminal, 'S');
            assert_eq!(terminal, 'a');
        }
        other => panic!("expected LL(1) conflict, got {:?}", other.map(|t| t.len())),
    }
}

#[test]
fn test_duplicate_rules_are_not_a_conflict() {
    let grammar = Grammar::from_pairs(&[('A', "a"), ('A', "a")]).unwrap();
    let table = build(&grammar).unwrap();

    assert_eq!(table[&('A', 'a')], vec!['a']);
}

#[test]
fn test_first_follow_conflict() {
    // ε ∈ FIRST(A) and FIRST(A) ∩ FOLLOW(A) = {a}: the cell (A, a) receives
    // both A → a and A → ε.
    let grammar = Grammar::from_pairs(&[('S', "Aa"), ('A', "a"), ('A', "")]).unwrap();

    assert!(matches!(
        build(&grammar),
        Err(GrammarError::LL1Conflict {
            nonterminal: 'A',
            terminal: 'a',
            ..
        })
    ));
}
