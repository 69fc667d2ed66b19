use thiserror::Error;

/// Errors surfaced while constructing operators.
///
/// All validation happens eagerly, before any wiring occurs, so a failed
/// construction leaves the graph untouched. Once constructed, operators never
/// raise errors during normal operation; in particular, cancellation is not
/// an error.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// An argument failed validation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
