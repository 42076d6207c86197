// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Protocol / APDU definitions for Monero app communication
//!
//! This module provides a protocol specification and reference implementation for the
//! output streaming step of Monero transaction signing, where destinations are sent to
//! the wallet one at a time and the wallet returns the serialized output, its HMAC,
//! the output keys and (where applicable) range proof data.
//!
//! APDUs use a primitive binary encoding to simplify implementation with unsupported languages and platforms.
//! Encodings are intended to be _roughly_ equivalent to packed c structures while maintaining
//! 32-bit field alignment to reduce the need for unaligned access on constrained platforms.
//! All field encodings are little-endian.
//!
//! Points and scalars are carried as raw 32-byte arrays, decompression and validation
//! is the responsibility of the engine.

#![no_std]

use num_enum::TryFromPrimitive;

pub use ledger_proto::{ApduError, ApduReq, ApduStatic};

pub mod prelude;
pub mod state;
pub mod tx;

mod helpers;

/// Monero APDU Class
pub const XMR_APDU_CLA: u8 = 0xac;

/// Monero APDU protocol version
pub const XMR_PROTO_VERSION: u8 = 0x01;

/// Monero APDU instruction codes
#[derive(Copy, Clone, Debug, PartialEq, TryFromPrimitive)]
#[repr(u8)]
pub enum Instruction {
    /// Stream a transaction destination (or an offloaded range proof)
    TxSetOutput = 0x26,

    /// Fetch transaction state
    TxGetInfo = 0x51,
}
