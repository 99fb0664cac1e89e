use std::collections::TryReserveError;

use regex_automata::{hybrid, meta::BuildError, nfa::thompson, MatchError};
use thiserror::Error;

#[cfg(feature = "host")]
use crate::host::Arity;
use crate::syntax::ere;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The pattern is not a valid extended regular expression.
    #[error(transparent)]
    Syntax(#[from] ere::Error),
    /// The pattern parsed but the engine refused it, e.g. because it exceeds
    /// the configured size limit.
    #[error("{0}")]
    Build(#[from] BuildError),
    /// Building the automaton that extends a match to its longest end failed.
    #[error("{0}")]
    BuildNfa(#[from] thompson::BuildError),
    #[error("{0}")]
    BuildDfa(#[from] hybrid::BuildError),
    /// The lazy DFA gave up during a search.
    #[error("{0}")]
    Search(#[from] MatchError),
    #[error("Invalid offset {offset} for subject of length {len}")]
    Offset { offset: usize, len: usize },
    #[error("Memory exhausted")]
    OutOfMemory(#[from] TryReserveError),
    #[cfg(feature = "host")]
    #[error("arg {position}: expected {expected}")]
    InvalidArgument {
        position: usize,
        expected: &'static str,
    },
    #[cfg(feature = "host")]
    #[error("Invalid number of arguments in \"{name}\", expected {expected}, got {got}")]
    InvalidNumberOfArguments {
        name: &'static str,
        expected: Arity,
        got: usize,
    },
    #[cfg(feature = "host")]
    #[error("\"{0}\" is not defined")]
    UnknownFunction(String),
}
