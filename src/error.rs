//! Main Crate Error

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
/// Kadsim crate error enum.
pub enum Error {
    /// Zero participant addresses were supplied, so there is nothing to
    /// bootstrap from.
    #[error("no participant addresses were supplied")]
    EmptyPopulation,

    /// A lookup was started from an address the network has never seen.
    ///
    /// Stale addresses *inside* routing tables are skipped silently by the
    /// reporting views; this error only guards the lookup entry point.
    #[error("unknown participant address: {0}")]
    UnknownParticipant(String),
}

pub type Result<T> = std::result::Result<T, Error>;
