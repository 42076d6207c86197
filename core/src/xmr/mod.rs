// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Monero transaction primitives used when streaming outputs.
//!
//! Key derivation, commitments and amount encoding, destination / output HMACs,
//! incremental transcript hashers and the binary layouts of serialized outputs
//! and range proofs.

pub mod commitment;
pub mod hasher;
pub mod hmac;
pub mod keys;
pub mod rsig;
pub mod serialize;

/// Maximum number of elements in a range proof `L` / `R` vector
/// (single byte count in the serialized proof)
pub const MAX_RSIG_ELEMENTS: usize = 127;
