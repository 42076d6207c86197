// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Range proof objects and their serialized layouts.
//!
//! Proof mathematics is provided by the [Driver][crate::engine::Driver], the
//! engine only handles proof layout, hashing and batch membership.
//!
//! The commitment vector `V` is never serialized, verifiers reconstruct it
//! from the output commitments. `L` and `R` vectors are prefixed with a single
//! byte count, limiting each to [MAX_RSIG_ELEMENTS] entries.
//!
//! ## Bulletproof encoding:
//! ```text
//! | A | S | T1 | T2 | taux | mu | N | L[N] | M | R[M] | a | b | t |
//! ```
//!
//! ## Bulletproof+ encoding:
//! ```text
//! | A | A1 | B | r1 | s1 | d1 | N | L[N] | M | R[M] |
//! ```
//!
//! All elements are 32 bytes, counts are a single byte.
#![allow(non_snake_case)]

use alloc::vec::Vec;

use encdec::{DecodeOwned, Encode};
use strum::{Display, EnumIter, EnumString, EnumVariantNames};

use super::MAX_RSIG_ELEMENTS;
use crate::engine::Error;

/// Range proof kinds, selected once per transaction
#[derive(Copy, Clone, PartialEq, Debug, EnumString, Display, EnumVariantNames, EnumIter)]
pub enum RangeProofKind {
    /// Bulletproof (legacy commitments)
    Bulletproof,
    /// Bulletproof+ (commitments scaled by `8^-1`)
    BulletproofPlus,
}

/// Bulletproof range proof
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Bulletproof {
    pub A: [u8; 32],
    pub S: [u8; 32],
    pub T1: [u8; 32],
    pub T2: [u8; 32],
    pub taux: [u8; 32],
    pub mu: [u8; 32],
    pub L: Vec<[u8; 32]>,
    pub R: Vec<[u8; 32]>,
    pub a: [u8; 32],
    pub b: [u8; 32],
    pub t: [u8; 32],
}

/// Bulletproof+ range proof
#[derive(Clone, PartialEq, Debug, Default)]
pub struct BulletproofPlus {
    pub A: [u8; 32],
    pub A1: [u8; 32],
    pub B: [u8; 32],
    pub r1: [u8; 32],
    pub s1: [u8; 32],
    pub d1: [u8; 32],
    pub L: Vec<[u8; 32]>,
    pub R: Vec<[u8; 32]>,
}

/// Range proof over a batch of outputs
#[derive(Clone, PartialEq, Debug)]
pub enum RangeProof {
    Bulletproof(Bulletproof),
    BulletproofPlus(BulletproofPlus),
}

impl RangeProof {
    /// Fetch proof kind
    pub fn kind(&self) -> RangeProofKind {
        match self {
            RangeProof::Bulletproof(_) => RangeProofKind::Bulletproof,
            RangeProof::BulletproofPlus(_) => RangeProofKind::BulletproofPlus,
        }
    }

    /// Parse a serialized proof of the expected kind,
    /// the buffer must contain exactly one proof
    pub fn parse(kind: RangeProofKind, buff: &[u8]) -> Result<Self, Error> {
        let (p, n) = match kind {
            RangeProofKind::Bulletproof => Bulletproof::decode_owned(buff)
                .map(|(p, n)| (RangeProof::Bulletproof(p), n))?,
            RangeProofKind::BulletproofPlus => BulletproofPlus::decode_owned(buff)
                .map(|(p, n)| (RangeProof::BulletproofPlus(p), n))?,
        };

        if n != buff.len() {
            return Err(Error::InvalidLength);
        }

        Ok(p)
    }

    /// Serialize proof to a newly allocated buffer
    pub fn to_vec(&self) -> Result<Vec<u8>, Error> {
        let mut b = alloc::vec![0u8; self.encode_len()?];
        let n = self.encode(&mut b)?;
        b.truncate(n);
        Ok(b)
    }

    /// Visit proof elements in transcript order (excluding `L` / `R` counts)
    pub fn for_each_element(&self, mut f: impl FnMut(&[u8; 32])) {
        match self {
            RangeProof::Bulletproof(p) => {
                for e in [&p.A, &p.S, &p.T1, &p.T2, &p.taux, &p.mu] {
                    f(e);
                }
                p.L.iter().chain(p.R.iter()).for_each(&mut f);
                for e in [&p.a, &p.b, &p.t] {
                    f(e);
                }
            }
            RangeProof::BulletproofPlus(p) => {
                for e in [&p.A, &p.A1, &p.B, &p.r1, &p.s1, &p.d1] {
                    f(e);
                }
                p.L.iter().chain(p.R.iter()).for_each(&mut f);
            }
        }
    }
}

impl Encode for RangeProof {
    type Error = Error;

    fn encode_len(&self) -> Result<usize, Error> {
        match self {
            RangeProof::Bulletproof(p) => p.encode_len(),
            RangeProof::BulletproofPlus(p) => p.encode_len(),
        }
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Error> {
        match self {
            RangeProof::Bulletproof(p) => p.encode(buff),
            RangeProof::BulletproofPlus(p) => p.encode(buff),
        }
    }
}

/// Encoded length of a proof with `n` fixed elements and the provided `L` / `R` vectors
fn proof_len(n: usize, L: &[[u8; 32]], R: &[[u8; 32]]) -> usize {
    32 * (n + L.len() + R.len()) + 2
}

/// Write fixed elements at the provided index
fn put_elements(buff: &mut [u8], mut index: usize, e: &[&[u8; 32]]) -> usize {
    for v in e {
        buff[index..][..32].copy_from_slice(&v[..]);
        index += 32;
    }
    index
}

/// Read a fixed element at the provided index
fn take_element(buff: &[u8], index: &mut usize) -> [u8; 32] {
    let mut v = [0u8; 32];
    v.copy_from_slice(&buff[*index..][..32]);
    *index += 32;
    v
}

/// Write a count-prefixed element vector
fn put_vector(buff: &mut [u8], mut index: usize, v: &[[u8; 32]]) -> Result<usize, Error> {
    if v.len() > MAX_RSIG_ELEMENTS {
        return Err(Error::BatchTooLarge);
    }

    buff[index] = v.len() as u8;
    index += 1;

    for e in v {
        buff[index..][..32].copy_from_slice(e);
        index += 32;
    }

    Ok(index)
}

/// Read a count-prefixed element vector
fn take_vector(buff: &[u8], index: &mut usize) -> Result<Vec<[u8; 32]>, Error> {
    if buff.len() < *index + 1 {
        return Err(Error::InvalidLength);
    }

    let n = buff[*index] as usize;
    *index += 1;

    if n > MAX_RSIG_ELEMENTS {
        return Err(Error::BatchTooLarge);
    }
    if buff.len() < *index + n * 32 {
        return Err(Error::InvalidLength);
    }

    let mut v = Vec::with_capacity(n);
    for _i in 0..n {
        v.push(take_element(buff, index));
    }

    Ok(v)
}

impl Encode for Bulletproof {
    type Error = Error;

    fn encode_len(&self) -> Result<usize, Error> {
        Ok(proof_len(9, &self.L, &self.R))
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Error> {
        if self.L.len() > MAX_RSIG_ELEMENTS || self.R.len() > MAX_RSIG_ELEMENTS {
            return Err(Error::BatchTooLarge);
        }
        if buff.len() < self.encode_len()? {
            return Err(Error::InvalidLength);
        }

        let mut index = put_elements(
            buff,
            0,
            &[&self.A, &self.S, &self.T1, &self.T2, &self.taux, &self.mu],
        );
        index = put_vector(buff, index, &self.L)?;
        index = put_vector(buff, index, &self.R)?;
        index = put_elements(buff, index, &[&self.a, &self.b, &self.t]);

        Ok(index)
    }
}

impl DecodeOwned for Bulletproof {
    type Output = Self;
    type Error = Error;

    fn decode_owned(buff: &[u8]) -> Result<(Self, usize), Error> {
        let mut index = 0;

        if buff.len() < 32 * 6 {
            return Err(Error::InvalidLength);
        }

        let A = take_element(buff, &mut index);
        let S = take_element(buff, &mut index);
        let T1 = take_element(buff, &mut index);
        let T2 = take_element(buff, &mut index);
        let taux = take_element(buff, &mut index);
        let mu = take_element(buff, &mut index);

        let L = take_vector(buff, &mut index)?;
        let R = take_vector(buff, &mut index)?;

        if buff.len() < index + 32 * 3 {
            return Err(Error::InvalidLength);
        }

        let a = take_element(buff, &mut index);
        let b = take_element(buff, &mut index);
        let t = take_element(buff, &mut index);

        let p = Self {
            A,
            S,
            T1,
            T2,
            taux,
            mu,
            L,
            R,
            a,
            b,
            t,
        };

        Ok((p, index))
    }
}

impl Encode for BulletproofPlus {
    type Error = Error;

    fn encode_len(&self) -> Result<usize, Error> {
        Ok(proof_len(6, &self.L, &self.R))
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Error> {
        if self.L.len() > MAX_RSIG_ELEMENTS || self.R.len() > MAX_RSIG_ELEMENTS {
            return Err(Error::BatchTooLarge);
        }
        if buff.len() < self.encode_len()? {
            return Err(Error::InvalidLength);
        }

        let mut index = put_elements(
            buff,
            0,
            &[&self.A, &self.A1, &self.B, &self.r1, &self.s1, &self.d1],
        );
        index = put_vector(buff, index, &self.L)?;
        index = put_vector(buff, index, &self.R)?;

        Ok(index)
    }
}

impl DecodeOwned for BulletproofPlus {
    type Output = Self;
    type Error = Error;

    fn decode_owned(buff: &[u8]) -> Result<(Self, usize), Error> {
        let mut index = 0;

        if buff.len() < 32 * 6 {
            return Err(Error::InvalidLength);
        }

        let A = take_element(buff, &mut index);
        let A1 = take_element(buff, &mut index);
        let B = take_element(buff, &mut index);
        let r1 = take_element(buff, &mut index);
        let s1 = take_element(buff, &mut index);
        let d1 = take_element(buff, &mut index);

        let L = take_vector(buff, &mut index)?;
        let R = take_vector(buff, &mut index)?;

        let p = Self {
            A,
            A1,
            B,
            r1,
            s1,
            d1,
            L,
            R,
        };

        Ok((p, index))
    }
}
