//! Main Crate Error

#[derive(thiserror::Error, Debug)]
/// Discover crate error enum.
pub enum Error {
    /// The local node can not be identified by the all-zero [Id](crate::Id),
    /// as every other node would land in a bucket relative to an undefined origin.
    #[error("Local node id is undefined (all zeros)")]
    ZeroId,

    /// A routing table needs room for at least one node per bucket.
    #[error("Invalid bucket size: {0}, must be at least 1")]
    InvalidBucketSize(usize),

    /// Tried to build an [Id](crate::Id) from a slice of the wrong length.
    #[error("Invalid Id size, expected 32, got {0}")]
    InvalidIdSize(usize),

    /// Tried to parse an [Id](crate::Id) from an invalid hex string.
    #[error("Invalid Id encoding: {0}")]
    InvalidIdEncoding(#[from] hex::FromHexError),
}

/// Alias for `Result<T, discover::Error>`.
pub type Result<T, E = Error> = core::result::Result<T, E>;
