//! Library error type. The computation either returns the exact answer or
//! fails fast: range errors surface as [`Error`], broken internal
//! preconditions abort via assertions (there is no partial-failure recovery
//! and nothing to retry).

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// x is larger than the biggest input this build can count exactly.
    #[error("x = {x} exceeds the supported maximum {max}")]
    InputOutOfRange { x: u128, max: u128 },

    /// A caller-supplied parameter is malformed (e.g. an unparsable number
    /// on the command line).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
