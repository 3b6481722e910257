use std::vec::IntoIter;

use crate::common::{Id, Node};

#[derive(Debug, Clone)]
/// Nodes sorted by their XOR distance to a target, closest first.
///
/// Used to answer "closest nodes to target" queries, independent of how the
/// nodes are stored, and to collect responses while a lookup is in progress.
pub struct ClosestNodes {
    target: Id,
    nodes: Vec<Node>,
    max: Option<usize>,
}

impl ClosestNodes {
    /// Unbounded collection of nodes sorted by distance to `target`.
    pub fn new(target: Id) -> Self {
        Self {
            target,
            nodes: Vec::new(),
            max: None,
        }
    }

    /// Keep at most the `max` closest nodes to `target`.
    ///
    /// `max` is only an upper bound, nothing is allocated for it upfront.
    pub fn with_max(target: Id, max: usize) -> Self {
        Self {
            target,
            nodes: Vec::new(),
            max: Some(max),
        }
    }

    // === Getters ===

    pub fn target(&self) -> Id {
        self.target
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn max(&self) -> Option<usize> {
        self.max
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The node furthest from the target, the first to drop when bounded.
    pub fn farthest(&self) -> Option<&Node> {
        self.nodes.last()
    }

    // === Public Methods ===

    /// Insert a node at its position by distance to the target.
    ///
    /// When the maximum size is reached, the node is only inserted if it is closer
    /// than the farthest node, which is dropped.
    ///
    /// Does not deduplicate; callers that need a set should check
    /// [contains_id](crate::common::contains_id) first.
    pub fn push(&mut self, node: Node) {
        let target = self.target;

        let pos = match self
            .nodes
            .binary_search_by(|probe| target.cmp_distance(probe.id(), node.id()))
        {
            Ok(pos) | Err(pos) => pos,
        };

        if let Some(max) = self.max {
            if pos >= max {
                return;
            }

            self.nodes.insert(pos, node);
            self.nodes.truncate(max);
        } else {
            self.nodes.insert(pos, node);
        }
    }
}

impl Extend<Node> for ClosestNodes {
    fn extend<T: IntoIterator<Item = Node>>(&mut self, iter: T) {
        for node in iter {
            self.push(node);
        }
    }
}

impl IntoIterator for ClosestNodes {
    type Item = Node;
    type IntoIter = IntoIter<Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

impl<'a> IntoIterator for &'a ClosestNodes {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}
