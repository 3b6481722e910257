//! Routing table shared between the protocol handler, lookups and refresh routines.

use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::common::{AddOutcome, Id, Insert, Node, RoutingTable};
use crate::config::Config;
use crate::liveness::LivenessCheck;
use crate::Result;

/// Thread safe handle to a [RoutingTable].
///
/// Every mutation takes the write lock, queries take the read lock for the
/// duration of a scan. Liveness checks of full buckets run without holding
/// any lock. Cloning returns another handle to the same table.
#[derive(Clone)]
pub struct PeerTable {
    id: Id,
    inner: Arc<RwLock<RoutingTable>>,
    liveness: Option<Arc<dyn LivenessCheck>>,
}

impl PeerTable {
    /// Create a table with the default [Config] and no liveness check,
    /// so nodes in full buckets are never evicted.
    pub fn new(id: Id) -> Result<Self> {
        Self::builder(id).build()
    }

    pub fn builder(id: Id) -> PeerTableBuilder {
        PeerTableBuilder {
            id,
            config: Config::default(),
            liveness: None,
        }
    }

    // === Getters ===

    /// Returns the [Id] of the local node.
    pub fn id(&self) -> Id {
        self.id
    }

    // === Public Methods ===

    /// Record a contact with a node.
    ///
    /// If the node's bucket is full, the lock is released while the configured
    /// [LivenessCheck] runs on the least recently seen node, and re-acquired to
    /// apply its verdict. Without a liveness check, the node is not admitted.
    pub fn add(&self, node: Node) -> AddOutcome {
        let pending = match self.inner.write().add(node) {
            Insert::Ignored => return AddOutcome::Ignored,
            Insert::Inserted => return AddOutcome::Inserted,
            Insert::Refreshed => return AddOutcome::Refreshed,
            Insert::Full(pending) => pending,
        };

        let check = match &self.liveness {
            Some(check) => check,
            None => return AddOutcome::NotAdmitted,
        };

        let liveness = check.check(pending.tail());
        debug!(tail = ?pending.tail().id(), ?liveness, "Checked least recently seen node");

        self.inner.write().resolve(pending, liveness)
    }

    /// Remove a node, for example after it failed to answer repeatedly.
    pub fn remove(&self, node_id: &Id) -> Option<Node> {
        self.inner.write().remove(node_id)
    }

    /// See [RoutingTable::random_nodes].
    pub fn random_nodes(&self, count: usize, exclude: &[Id]) -> Vec<Node> {
        self.inner.read().random_nodes(count, exclude)
    }

    /// See [RoutingTable::closest].
    pub fn closest(&self, target: &Id, limit: usize) -> Vec<Node> {
        self.inner.read().closest(target, limit)
    }

    pub fn contains(&self, node_id: &Id) -> bool {
        self.inner.read().contains(node_id)
    }

    pub fn get(&self, node_id: &Id) -> Option<Node> {
        self.inner.read().get(node_id).cloned()
    }

    pub fn size(&self) -> usize {
        self.inner.read().size()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Owned copy of the whole table, to inspect without holding the lock.
    pub fn snapshot(&self) -> RoutingTable {
        self.inner.read().clone()
    }
}

impl Debug for PeerTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeerTable")
            .field("id", &self.id)
            .field("size", &self.size())
            .field("liveness_check", &self.liveness.is_some())
            .finish()
    }
}

/// Builder for [PeerTable].
pub struct PeerTableBuilder {
    id: Id,
    config: Config,
    liveness: Option<Arc<dyn LivenessCheck>>,
}

impl PeerTableBuilder {
    /// Set the maximum number of nodes in each bucket.
    pub fn bucket_size(mut self, k: usize) -> Self {
        self.config.bucket_size = k;
        self
    }

    /// See [Config::refresh_on_reachable].
    pub fn refresh_on_reachable(mut self, refresh: bool) -> Self {
        self.config.refresh_on_reachable = refresh;
        self
    }

    /// Replace the whole [Config].
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Check the least recently seen node of a full bucket before evicting it.
    pub fn liveness_check<C>(mut self, check: C) -> Self
    where
        C: LivenessCheck + 'static,
    {
        self.liveness = Some(Arc::new(check));
        self
    }

    /// Returns an error if the local [Id] is all zeros or the config is invalid.
    pub fn build(self) -> Result<PeerTable> {
        let table = RoutingTable::with_config(self.id, self.config)?;

        Ok(PeerTable {
            id: self.id,
            inner: Arc::new(RwLock::new(table)),
            liveness: self.liveness,
        })
    }
}

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::liveness::Liveness;
    use crate::{Error, ID_SIZE};

    fn fill_bucket(table: &PeerTable, class: u8, count: usize) -> Vec<Node> {
        (0..count)
            .map(|_| {
                let node = Node::new(table.id().random_in_class(class), [10, 0, 0, 1].into(), 1, 2);
                assert_eq!(table.add(node.clone()), AddOutcome::Inserted);
                node
            })
            .collect()
    }

    #[test]
    fn zero_id() {
        assert!(matches!(
            PeerTable::new(Id([0; ID_SIZE])),
            Err(Error::ZeroId)
        ));
    }

    #[test]
    fn invalid_bucket_size() {
        assert!(matches!(
            PeerTable::builder(Id::random()).bucket_size(0).build(),
            Err(Error::InvalidBucketSize(0))
        ));
    }

    #[test]
    fn add() {
        let table = PeerTable::new(Id::random()).unwrap();
        let node = Node::random();

        assert_eq!(table.add(node.clone()), AddOutcome::Inserted);
        assert_eq!(table.add(node.clone()), AddOutcome::Refreshed);
        assert_eq!(
            table.add(Node::new(table.id(), [10, 0, 0, 1].into(), 1, 2)),
            AddOutcome::Ignored
        );

        assert_eq!(table.size(), 1);
        assert_eq!(table.get(node.id()), Some(node));
    }

    #[test]
    fn full_bucket_without_liveness_check() {
        let table = PeerTable::builder(Id::random())
            .bucket_size(4)
            .build()
            .unwrap();

        let nodes = fill_bucket(&table, 255, 4);
        let incoming = Node::new(table.id().random_in_class(255), [10, 0, 0, 1].into(), 1, 2);

        assert_eq!(table.add(incoming.clone()), AddOutcome::NotAdmitted);
        assert!(!table.contains(incoming.id()));
        assert!(nodes.iter().all(|node| table.contains(node.id())));
    }

    #[test]
    fn full_bucket_with_liveness_check() {
        let checks = Arc::new(AtomicUsize::new(0));
        let counter = checks.clone();

        let table = PeerTable::builder(Id::random())
            .bucket_size(4)
            .liveness_check(move |_: &Node| {
                counter.fetch_add(1, Ordering::SeqCst);
                Liveness::Unreachable
            })
            .build()
            .unwrap();

        let nodes = fill_bucket(&table, 100, 4);
        let incoming = Node::new(table.id().random_in_class(100), [10, 0, 0, 1].into(), 1, 2);

        assert_eq!(
            table.add(incoming.clone()),
            AddOutcome::Evicted(nodes[0].clone())
        );
        assert_eq!(checks.load(Ordering::SeqCst), 1);
        assert!(table.contains(incoming.id()));
        assert!(!table.contains(nodes[0].id()));
        assert_eq!(table.snapshot().bucket(100)[0], incoming);
    }

    #[test]
    fn remove() {
        let table = PeerTable::new(Id::random()).unwrap();
        let node = Node::random();

        table.add(node.clone());

        assert_eq!(table.remove(node.id()), Some(node));
        assert!(table.is_empty());
    }

    #[test]
    fn clones_share_the_table() {
        let table = PeerTable::new(Id::random()).unwrap();
        let clone = table.clone();

        let node = Node::random();
        clone.add(node.clone());

        assert!(table.contains(node.id()));
        assert_eq!(table.closest(node.id(), 1), vec![node]);
    }
}
