// src/oracle.rs - Keyed graph oracle: SipHash-2-4 node derivation

//! The keyed graph oracle.
//!
//! A graph instance is fully determined by (header, nonce): BLAKE2b-256 over
//! the header and little-endian nonce yields four 64-bit siphash keys, and
//! each edge's two endpoints are SipHash-2-4 outputs masked to the node
//! space. Both the solver and the verifier go through this module, so an
//! endpoint computed on one path is bit-identical on the other.

use std::io::Cursor;

use blake2::{
    digest::{Update, VariableOutput},
    Blake2bVar,
};
use byteorder::{LittleEndian, ReadBytesExt};

/// Which side of the bipartite graph a node lives on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// First partition, selected by even siphash inputs
    U = 0,
    /// Second partition, selected by odd siphash inputs
    V = 1,
}

impl Side {
    /// The opposite side
    #[inline]
    pub fn other(self) -> Self {
        match self {
            Side::U => Side::V,
            Side::V => Side::U,
        }
    }
}

/// SipHash key schedule for one graph instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SipKeys {
    k0: u64,
    k1: u64,
    k2: u64,
    k3: u64,
}

impl SipKeys {
    /// Derive keys from header bytes and nonce
    ///
    /// BLAKE2b-256 over `header || nonce_le`, with the 32-byte digest split
    /// little-endian into the four key words.
    pub fn derive(header: &[u8], nonce: u64) -> Self {
        let mut hasher = Blake2bVar::new(32).unwrap(); // 32 bytes = 256 bits
        hasher.update(header);
        hasher.update(&nonce.to_le_bytes());
        let mut hash = [0u8; 32];
        hasher.finalize_variable(&mut hash).unwrap();

        let mut cursor = Cursor::new(&hash[..]);
        Self {
            k0: cursor.read_u64::<LittleEndian>().unwrap(),
            k1: cursor.read_u64::<LittleEndian>().unwrap(),
            k2: cursor.read_u64::<LittleEndian>().unwrap(),
            k3: cursor.read_u64::<LittleEndian>().unwrap(),
        }
    }

    /// Endpoint of `edge` on `side`, masked to the node space
    #[inline]
    pub fn node(&self, edge: u32, side: Side, node_mask: u32) -> u32 {
        let input = ((edge as u64) << 1) ^ side as u64;
        (self.siphash24(input) & node_mask as u64) as u32
    }

    /// SipHash-2-4 over a single word, keyed by the full 4-word schedule
    fn siphash24(&self, input: u64) -> u64 {
        let mut v0 = self.k0;
        let mut v1 = self.k1;
        let mut v2 = self.k2;
        let mut v3 = self.k3 ^ input;

        // 2 rounds of SipRound
        for _ in 0..2 {
            sipround(&mut v0, &mut v1, &mut v2, &mut v3);
        }

        v0 ^= input;
        v2 ^= 0xff;

        // 4 rounds of SipRound
        for _ in 0..4 {
            sipround(&mut v0, &mut v1, &mut v2, &mut v3);
        }

        v0 ^ v1 ^ v2 ^ v3
    }
}

/// Single round of SipHash
#[inline]
fn sipround(v0: &mut u64, v1: &mut u64, v2: &mut u64, v3: &mut u64) {
    *v0 = v0.wrapping_add(*v1);
    *v1 = v1.rotate_left(13);
    *v1 ^= *v0;
    *v0 = v0.rotate_left(32);

    *v2 = v2.wrapping_add(*v3);
    *v3 = v3.rotate_left(16);
    *v3 ^= *v2;

    *v0 = v0.wrapping_add(*v3);
    *v3 = v3.rotate_left(21);
    *v3 ^= *v0;

    *v2 = v2.wrapping_add(*v1);
    *v1 = v1.rotate_left(17);
    *v1 ^= *v2;
    *v2 = v2.rotate_left(32);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_determinism() {
        let header = [0x42u8; 32];
        let keys = SipKeys::derive(&header, 12345);
        let keys2 = SipKeys::derive(&header, 12345);
        assert_eq!(keys, keys2);
    }

    #[test]
    fn test_keys_differ_across_nonces() {
        let header = [0u8; 32];
        let a = SipKeys::derive(&header, 0);
        let b = SipKeys::derive(&header, 1);
        assert_ne!(a, b);
    }

    #[test]
    fn test_keys_differ_across_headers() {
        let a = SipKeys::derive(&[0u8; 32], 7);
        let b = SipKeys::derive(&[1u8; 32], 7);
        assert_ne!(a, b);
    }

    #[test]
    fn test_node_range_and_determinism() {
        let keys = SipKeys::derive(&[0u8; 32], 0);
        let mask = (1u32 << 10) - 1;

        for edge in 0..64 {
            let u = keys.node(edge, Side::U, mask);
            let v = keys.node(edge, Side::V, mask);
            assert!(u <= mask);
            assert!(v <= mask);
            assert_eq!(u, keys.node(edge, Side::U, mask));
            assert_eq!(v, keys.node(edge, Side::V, mask));
        }
    }

    #[test]
    fn test_sides_are_independent_streams() {
        let keys = SipKeys::derive(&[0x12u8; 32], 999);
        let mask = (1u32 << 20) - 1;

        // The U and V streams come from disjoint siphash inputs; over a
        // window of edges they cannot be identical.
        let differs = (0..32).any(|e| keys.node(e, Side::U, mask) != keys.node(e, Side::V, mask));
        assert!(differs);
    }

    #[test]
    fn test_side_other() {
        assert_eq!(Side::U.other(), Side::V);
        assert_eq!(Side::V.other(), Side::U);
    }
}
