//! Liveness checks consulted before evicting a node from a full bucket.

use crate::common::Node;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Verdict of a [LivenessCheck].
pub enum Liveness {
    /// The node answered, keep it.
    Reachable,
    /// The node did not answer, it can be replaced.
    Unreachable,
    /// The check could not decide (timeout, socket error, ...), keep the node.
    Unknown,
}

/// Decides whether a known node is still reachable, usually by pinging it.
///
/// Called by the [PeerTable](crate::PeerTable) without holding its lock, but the
/// caller of [PeerTable::add](crate::PeerTable::add) still waits for it, so it
/// should answer quickly, for example from a cache of recent pongs.
///
/// Implemented for any `Fn(&Node) -> Liveness` closure.
pub trait LivenessCheck: Send + Sync {
    /// Check the least recently seen `node` of a full bucket.
    fn check(&self, node: &Node) -> Liveness;
}

impl<F> LivenessCheck for F
where
    F: Fn(&Node) -> Liveness + Send + Sync,
{
    fn check(&self, node: &Node) -> Liveness {
        self(node)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn closure() {
        let node = Node::random();
        let expected = *node.id();

        let check = move |node: &Node| {
            if node.id() == &expected {
                Liveness::Reachable
            } else {
                Liveness::Unknown
            }
        };

        assert_eq!(check.check(&node), Liveness::Reachable);
        assert_eq!(check.check(&Node::random()), Liveness::Unknown);
    }
}
