//! Error types for the parser generator.

use thiserror::Error;

/// Errors that can occur during grammar construction and analysis.
#[derive(Error, Debug)]
pub enum GrammarError {
    #[error("grammar has no rules")]
    EmptyGrammar,

    #[error("ε may only appear as the sole symbol of a right-hand side (rule {lhs})")]
    EpsilonInRhs { lhs: char },

    #[error("reserved symbol {symbol} used in rule {lhs}")]
    ReservedSymbol { lhs: char, symbol: char },

    #[error("LL(1) conflict at M[{nonterminal}, {terminal}]:\n  {existing}\n  {candidate}")]
    LL1Conflict {
        nonterminal: char,
        terminal: char,
        existing: String,
        candidate: String,
    },

    #[error("cyclic FIRST dependency through nonterminal {nonterminal}")]
    CyclicFirstDependency { nonterminal: char },

    #[error("cyclic FOLLOW dependency between nonterminals")]
    CyclicFollowDependency,
}

/// Type alias for Results in this crate.
pub type Result<T> = std::result::Result<T, GrammarError>;
