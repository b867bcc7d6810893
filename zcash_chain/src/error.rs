use std::io;

/// Errors that can occur while decoding, encoding, or hashing transactions and blocks.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input was truncated or malformed.
    #[error("parse error: {0}")]
    Parse(#[from] io::Error),
    /// The `(header, version_group_id)` pair does not name a known transaction format.
    #[error(
        "unsupported transaction version (header {header:#010x}, version group {version_group_id:#010x})"
    )]
    UnsupportedVersion { header: u32, version_group_id: u32 },
    /// A v5 transaction named a consensus branch this crate does not know about.
    #[error("unknown consensus branch ID {0:#010x}")]
    UnknownConsensusBranch(u32),
    /// The input contained bytes after the end of the encoded value.
    #[error("{0} bytes remaining after the end of the encoding")]
    TrailingBytes(usize),
    /// The caller supplied data that violates a structural rule of the format.
    #[error("invariant violation: {0}")]
    InvariantViolation(&'static str),
}
