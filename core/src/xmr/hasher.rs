// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Incremental transcript hashers, used to bind streamed outputs to the
//! transaction later reconstructed and signed by the host

use sha3::{Digest, Keccak256};

use super::rsig::RangeProof;
use crate::helpers::{write_varint, VARINT_MAX};

/// Transaction prefix hasher, append only
#[derive(Clone, Default)]
pub struct TxPrefixHasher {
    h: Keccak256,
}

impl TxPrefixHasher {
    /// Create a new prefix hasher
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash a varint encoded value (container lengths etc.)
    pub fn uvarint(&mut self, v: u64) {
        let mut b = [0u8; VARINT_MAX];
        let n = write_varint(v, &mut b);
        self.h.update(&b[..n]);
    }

    /// Hash raw serialized data
    pub fn buffer(&mut self, b: &[u8]) {
        self.h.update(b);
    }

    /// Compute the prefix hash over data hashed so far
    pub fn digest(&self) -> [u8; 32] {
        self.h.clone().finalize().into()
    }
}

/// Full message hasher, maintaining separate states for the RingCT base
/// (ECDH payloads) and the range proof elements
#[derive(Clone, Default)]
pub struct FullMessageHasher {
    base: Keccak256,
    rsig: Keccak256,
}

impl FullMessageHasher {
    /// Create a new full message hasher
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash a serialized ECDH payload into the RingCT base
    pub fn set_ecdh(&mut self, ecdh: &[u8]) {
        self.base.update(ecdh);
    }

    /// Hash range proof elements.
    ///
    /// `L` and `R` counts are omitted, so this does not match the serialized proof.
    pub fn rsig_val(&mut self, p: &RangeProof) {
        p.for_each_element(|e| self.rsig.update(e));
    }

    /// Compute the full message `keccak256(prefix_hash || H(base) || H(rsig))`
    pub fn digest(&self, prefix_hash: &[u8; 32]) -> [u8; 32] {
        let base: [u8; 32] = self.base.clone().finalize().into();
        let rsig: [u8; 32] = self.rsig.clone().finalize().into();

        let mut h = Keccak256::new();
        h.update(prefix_hash);
        h.update(base);
        h.update(rsig);
        h.finalize().into()
    }
}
