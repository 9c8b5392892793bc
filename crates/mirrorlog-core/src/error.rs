//! The crate's single error surface.
//!
//! Every public operation returns `Result<_, Error>`. Backend errors
//! (anything a [`crate::BlockDevice`] implementation surfaces) are collapsed
//! into [`Error::Driver`], carrying the backend's own message for
//! diagnostics; the core itself never inspects backend error internals.

/// Errors surfaced by the core, per `spec.md` §7.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `ErrDriver` — the block device failed a read, write, or sync.
    #[error("block device operation failed: {0}")]
    Driver(String),

    /// `ErrParam` — bad caller input or device geometry.
    #[error("invalid parameter: {0}")]
    Param(String),

    /// `ErrFull` — the mirror slice (or device) has no room for this batch.
    #[error("mirror slice exhausted")]
    Full,

    /// `ErrLogFull` — the legacy byte-granular message cursor saturated.
    #[error("legacy message log is full")]
    LogFull,

    /// `ErrMeta` — every supersector mirror failed CRC; metadata is unrecoverable.
    #[error("supersector metadata unrecoverable: all mirrors failed CRC")]
    Meta,
}

/// Collapses any backend error into [`Error::Driver`], preserving its message.
pub(crate) fn driver_err<E: std::fmt::Display>(err: E) -> Error {
    Error::Driver(err.to_string())
}
