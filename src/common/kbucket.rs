//! Kbuckets
use std::collections::VecDeque;
use std::time::Instant;

use crate::common::{Id, Node};

/// K = the default maximum size of a k-bucket.
pub const MAX_BUCKET_SIZE_K: usize = 20;

#[derive(Debug, Clone)]
struct Entry {
    node: Node,
    last_seen: Instant,
}

impl Entry {
    fn new(node: Node) -> Self {
        Entry {
            node,
            last_seen: Instant::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// The result of [KBucket::touch].
pub enum Touch {
    /// The node was new and there was room for it.
    Inserted,
    /// The node was already known; it moved to the head with its latest address.
    Refreshed,
    /// The bucket is full and the node was not admitted. Carries the least recently
    /// seen node, which should be checked for liveness before it can be replaced
    /// using [KBucket::replace_tail].
    Full(Node),
}

/// Kbuckets are similar to LRU caches that checks and evicts unresponsive nodes,
/// without dropping any responsive nodes in the process.
#[derive(Debug, Clone)]
pub struct KBucket {
    /// K (as in k-bucket) is the maximum number of nodes in a k-bucket.
    k: usize,
    /// Nodes in the k-bucket, from the most recently seen (front) to the
    /// least recently seen (back).
    entries: VecDeque<Entry>,
}

impl KBucket {
    pub fn new() -> Self {
        KBucket {
            k: MAX_BUCKET_SIZE_K,
            entries: VecDeque::with_capacity(MAX_BUCKET_SIZE_K),
        }
    }

    // === Options ===

    /// Set the maximum number of nodes in this bucket.
    ///
    /// A size of `0` is raised to `1`, a bucket always holds at least one
    /// node. Tables reject `0` earlier, in [Config::validate](crate::Config::validate).
    pub fn with_size(mut self, k: usize) -> Self {
        self.k = k.max(1);
        self.entries = VecDeque::with_capacity(self.k);
        self
    }

    // === Getters ===

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.k
    }

    pub fn get(&self, id: &Id) -> Option<&Node> {
        self.iter().find(|node| node.id() == id)
    }

    pub fn contains(&self, id: &Id) -> bool {
        self.get(id).is_some()
    }

    /// The node that has gone the longest without a contact, first in line for eviction.
    pub fn least_recently_seen(&self) -> Option<&Node> {
        self.entries.back().map(|entry| &entry.node)
    }

    /// When was the node with this id last touched.
    pub fn last_seen(&self, id: &Id) -> Option<Instant> {
        self.entries
            .iter()
            .find(|entry| entry.node.id() == id)
            .map(|entry| entry.last_seen)
    }

    /// Iterate over the nodes from the most to the least recently seen.
    pub fn iter(&self) -> impl Iterator<Item = &Node> + '_ {
        self.entries.iter().map(|entry| &entry.node)
    }

    /// Owned copy of the nodes from the most to the least recently seen.
    pub fn entries(&self) -> Vec<Node> {
        self.iter().cloned().collect()
    }

    // === Public Methods ===

    /// Record a contact with a node.
    ///
    /// Known nodes move to the head of the bucket, taking the address of the
    /// latest contact. New nodes are inserted at the head if there is room,
    /// otherwise the bucket stays unchanged and [Touch::Full] is returned.
    pub fn touch(&mut self, node: Node) -> Touch {
        if let Some(index) = self.position(node.id()) {
            self.entries.remove(index);
            self.entries.push_front(Entry::new(node));

            return Touch::Refreshed;
        }

        match self.entries.back() {
            Some(tail) if self.entries.len() >= self.k => Touch::Full(tail.node.clone()),
            _ => {
                self.entries.push_front(Entry::new(node));
                Touch::Inserted
            }
        }
    }

    /// Evict the least recently seen node and insert `incoming` at the head,
    /// returning the evicted node.
    ///
    /// Does nothing and returns `None` if the least recently seen node is no longer
    /// `tail`, or if `incoming` is already in the bucket.
    pub fn replace_tail(&mut self, tail: &Id, incoming: Node) -> Option<Node> {
        if self.least_recently_seen().map(|node| node.id()) != Some(tail)
            || self.contains(incoming.id())
        {
            return None;
        }

        let evicted = self.entries.pop_back()?.node;
        self.entries.push_front(Entry::new(incoming));

        Some(evicted)
    }

    /// Move a known node to the head without changing its address, returning
    /// `false` if it is not in this bucket.
    pub fn refresh(&mut self, id: &Id) -> bool {
        match self.position(id).and_then(|index| self.entries.remove(index)) {
            Some(entry) => {
                self.entries.push_front(Entry::new(entry.node));
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &Id) -> Option<Node> {
        let index = self.position(id)?;

        self.entries.remove(index).map(|entry| entry.node)
    }

    // === Private Methods ===

    fn position(&self, id: &Id) -> Option<usize> {
        self.entries.iter().position(|entry| entry.node.id() == id)
    }
}

impl Default for KBucket {
    fn default() -> Self {
        Self::new()
    }
}
