#![doc = include_str!("../README.md")]
//! ## Feature flags
#![doc = document_features::document_features!()]
//!

mod common;
mod config;
mod error;
mod liveness;
mod table;

pub use crate::common::{
    contains_id, AddOutcome, ClosestNodes, Id, Insert, KBucket, Node, PendingEviction,
    RoutingTable, Touch, ID_BITS, ID_SIZE, MAX_BUCKET_SIZE_K,
};
pub use config::Config;
pub use error::{Error, Result};
pub use liveness::{Liveness, LivenessCheck};
pub use table::{PeerTable, PeerTableBuilder};
