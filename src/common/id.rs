//! Kademlia node Id or a lookup target
use rand::Rng;
use std::{
    cmp::Ordering,
    fmt::{self, Debug, Display, Formatter},
    str::FromStr,
};

use crate::common::Node;
use crate::{Error, Result};

/// The size of node IDs in bytes.
pub const ID_SIZE: usize = 32;
/// The size of node IDs in bits, which is also the number of buckets in a routing table.
pub const ID_BITS: usize = ID_SIZE * 8;

#[derive(Clone, Copy, PartialEq, Ord, PartialOrd, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
/// Kademlia node Id or a lookup target
pub struct Id(pub [u8; ID_SIZE]);

impl Id {
    pub fn random() -> Id {
        let mut rng = rand::thread_rng();
        let random_bytes: [u8; ID_SIZE] = rng.gen();

        Id(random_bytes)
    }

    /// Create a new Id from some bytes. Returns Err if `bytes` is not of length
    /// [ID_SIZE].
    pub fn from_bytes<T: AsRef<[u8]>>(bytes: T) -> Result<Id> {
        let bytes = bytes.as_ref();
        if bytes.len() != ID_SIZE {
            return Err(Error::InvalidIdSize(bytes.len()));
        }

        let mut tmp: [u8; ID_SIZE] = [0; ID_SIZE];
        tmp.copy_from_slice(bytes);

        Ok(Id(tmp))
    }

    /// Returns a random Id that falls in the given distance class from this Id.
    ///
    /// Refresh routines use it to pick a lookup target for a specific bucket.
    pub fn random_in_class(&self, class: u8) -> Id {
        let mut bytes: [u8; ID_SIZE] = rand::thread_rng().gen();

        let byte = ID_SIZE - 1 - class as usize / 8;
        let flip = 1u8 << (class % 8);
        let above = !(flip | (flip - 1));

        bytes[..byte].copy_from_slice(&self.0[..byte]);
        bytes[byte] = (self.0[byte] & above) | (!self.0[byte] & flip) | (bytes[byte] & (flip - 1));

        Id(bytes)
    }

    /// The distance class between this Id and another, which is the index of the
    /// highest set bit of their XOR, counting the least significant bit of the
    /// last byte as `0`.
    ///
    /// Distance class to self is `None`
    /// Distance class of Ids differing only in their last bit is `Some(0)`
    /// Distance class of Ids differing in their first bit is `Some(255)`
    pub fn distance_class(&self, other: &Id) -> Option<u8> {
        for i in 0..ID_SIZE {
            let xor = self.0[i] ^ other.0[i];

            if xor != 0 {
                // leading zeros so far + leading zeros of this byte
                let leading_zeros = i as u32 * 8 + xor.leading_zeros();

                return Some((ID_BITS as u32 - 1 - leading_zeros) as u8);
            }
        }

        None
    }

    /// Compares the XOR distances of `a` and `b` to this Id (as the target).
    ///
    /// Equal distances fall back to comparing raw bytes, which only happens when
    /// `a == b`, so the order is strict over distinct Ids.
    pub fn cmp_distance(&self, a: &Id, b: &Id) -> Ordering {
        self.xor(a).cmp(&self.xor(b)).then_with(|| a.cmp(b))
    }

    pub fn xor(&self, other: &Id) -> Id {
        let mut result = [0_u8; ID_SIZE];

        for (i, (a, b)) in self.0.iter().zip(other.0).enumerate() {
            result[i] = a ^ b;
        }

        Id(result)
    }

    pub fn as_bytes(&self) -> &[u8; ID_SIZE] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    /// Returns `true` for the all-zero Id, which can not identify a local node.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }
}

/// Returns `true` if any of the `nodes` has exactly this `id`.
pub fn contains_id<'a, I>(nodes: I, id: &Id) -> bool
where
    I: IntoIterator<Item = &'a Node>,
{
    nodes.into_iter().any(|node| node.id() == id)
}

impl From<[u8; ID_SIZE]> for Id {
    fn from(bytes: [u8; ID_SIZE]) -> Id {
        Id(bytes)
    }
}

impl FromStr for Id {
    type Err = Error;

    fn from_str(s: &str) -> Result<Id> {
        let bytes = hex::decode(s)?;

        Id::from_bytes(bytes)
    }
}

impl Display for Id {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl Debug for Id {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self)
    }
}

#[cfg(test)]
mod test {
    use std::net::Ipv4Addr;

    use super::*;

    fn id_with(bytes: &[(usize, u8)]) -> Id {
        let mut id = [0; ID_SIZE];
        for (i, b) in bytes {
            id[*i] = *b;
        }
        Id(id)
    }

    /// Right aligns shorter hashes, like converting a 20 bytes hash to a 32 bytes one.
    fn hash(hex_str: &str) -> Id {
        let bytes = hex::decode(hex_str).unwrap();
        let mut id = [0; ID_SIZE];
        id[ID_SIZE - bytes.len()..].copy_from_slice(&bytes);
        Id(id)
    }

    #[test]
    fn distance_class_literals() {
        let id1 = id_with(&[(31, 1)]);
        let id2 = id_with(&[(31, 2)]);
        let id3 = id_with(&[(31, 1)]);

        assert_eq!(id1.distance_class(&id2), Some(1));
        assert_eq!(id1.distance_class(&id3), None);
    }

    #[test]
    fn distance_class_bounds() {
        let zero = Id([0; ID_SIZE]);

        assert_eq!(zero.distance_class(&id_with(&[(31, 1)])), Some(0));
        assert_eq!(zero.distance_class(&id_with(&[(0, 0x80)])), Some(255));
        assert_eq!(zero.distance_class(&id_with(&[(30, 1), (31, 0xff)])), Some(8));
    }

    #[test]
    fn distance_class_to_self() {
        for _ in 0..20 {
            let id = Id::random();
            assert_eq!(id.distance_class(&id), None);
        }
    }

    #[test]
    fn distance_class_is_symmetric() {
        for _ in 0..100 {
            let a = Id::random();
            let b = Id::random();

            assert_eq!(a.distance_class(&b), b.distance_class(&a));
        }
    }

    #[test]
    fn random_in_class() {
        let id = Id::random();

        for class in 0..=255_u8 {
            let random = id.random_in_class(class);
            assert_eq!(id.distance_class(&random), Some(class));
        }
    }

    #[test]
    fn cmp_distance() {
        let target = id_with(&[(31, 3)]);

        let same = id_with(&[(31, 3)]);
        let near = id_with(&[(31, 1)]);
        let far = id_with(&[(5, 8), (19, 2)]);

        assert_eq!(target.cmp_distance(&same, &near), Ordering::Less);
        assert_eq!(target.cmp_distance(&near, &far), Ordering::Less);
        assert_eq!(target.cmp_distance(&far, &near), Ordering::Greater);
        assert_eq!(target.cmp_distance(&far, &far), Ordering::Equal);
    }

    #[test]
    fn cmp_distance_is_a_total_order() {
        let target = Id::random();
        let mut ids: Vec<Id> = (0..50).map(|_| Id::random()).collect();

        ids.sort_by(|a, b| target.cmp_distance(a, b));

        for pair in ids.windows(2) {
            assert!(target.xor(&pair[0]) < target.xor(&pair[1]));
        }
    }

    #[test]
    fn contains() {
        let id1 = hash("7b52009b64fd0a2a49e6d8a939753077792b0554");
        let id2 = hash("40bd001563085fc35165329ea1ff5c5ecbdbbeef");
        let id3 = hash("7110eda4d09e062aa5e4a390b0a572ac0d2c0220");

        let address = Ipv4Addr::LOCALHOST.into();
        let nodes = vec![Node::new(id1, address, 0, 0), Node::new(id2, address, 0, 0)];

        assert!(contains_id(&nodes, &id1));
        assert!(!contains_id(&nodes, &id3));

        let mut near_miss = id1;
        near_miss.0[ID_SIZE - 1] ^= 1;
        assert!(!contains_id(&nodes, &near_miss));
    }

    #[test]
    fn from_str() {
        let str = "ba3042eb2d373b19e7c411ce6826e31b37be0b2ec03d9008add37f8414cb4154";
        let id = Id::from_str(str).unwrap();

        assert_eq!(id.to_string(), str);
        assert_eq!(format!("{:?}", id), format!("Id({})", str));
    }

    #[test]
    fn from_str_invalid() {
        assert!(matches!(
            Id::from_str("7b52009b64fd0a2a49e6d8a939753077792b0554"),
            Err(Error::InvalidIdSize(20))
        ));
        assert!(matches!(
            Id::from_str("not hex"),
            Err(Error::InvalidIdEncoding(_))
        ));
    }

    #[test]
    fn is_zero() {
        assert!(Id([0; ID_SIZE]).is_zero());
        assert!(!id_with(&[(31, 1)]).is_zero());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn bencode_round_trip() {
        let id = Id::random();

        let encoded = serde_bencode::to_bytes(&id).unwrap();
        let decoded: Id = serde_bencode::from_bytes(&encoded).unwrap();

        assert_eq!(decoded, id);
    }
}
