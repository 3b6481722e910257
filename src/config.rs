use crate::common::MAX_BUCKET_SIZE_K;
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Routing table configurations
pub struct Config {
    /// K, the maximum number of nodes in each bucket.
    ///
    /// The higher it is, the more nodes are kept close to the local node
    /// and the more redundant lookups become.
    ///
    /// Defaults to [MAX_BUCKET_SIZE_K]
    pub bucket_size: usize,
    /// Whether a least recently seen node that passed a liveness check is
    /// treated as a fresh contact, and moved to the head of its bucket.
    ///
    /// Defaults to `true`
    pub refresh_on_reachable: bool,
}

impl Config {
    /// Returns an error if this configuration can not back a routing table.
    pub fn validate(&self) -> Result<()> {
        if self.bucket_size == 0 {
            return Err(Error::InvalidBucketSize(self.bucket_size));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bucket_size: MAX_BUCKET_SIZE_K,
            refresh_on_reachable: true,
        }
    }
}
