// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Destination and output HMACs.
//!
//! Destinations are authenticated by the wallet during session setup, binding
//! each destination to its output index. On output streaming the HMAC is
//! re-computed and checked before use, and a new HMAC is issued over the
//! destination and the serialized output so the host cannot later substitute
//! a different output record.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::{
    apdu::tx::DestinationEntry,
    engine::Error,
    helpers::{keccak256, write_varint, VARINT_MAX},
};

type HmacSha256 = Hmac<Sha256>;

/// Key derivation buffer length (key, discriminator, index and padding)
const KEY_BUFF_LEN: usize = 32 + 12 + 4;

/// HMAC key purposes
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum HmacPurpose {
    /// Destination entry HMAC
    TxDest,
    /// Output record HMAC
    TxOut,
}

impl HmacPurpose {
    /// Key derivation discriminator
    pub fn discriminator(&self) -> &'static [u8] {
        match self {
            HmacPurpose::TxDest => b"txdest",
            HmacPurpose::TxOut => b"txout",
        }
    }
}

/// Derive a per-purpose, per-index HMAC key,
/// `keccak256(keccak256(key_hmac || discriminator || varint(index) || 0-pad))`
pub fn hmac_key(key_hmac: &[u8; 32], purpose: HmacPurpose, index: usize) -> Zeroizing<[u8; 32]> {
    let mut b = Zeroizing::new([0u8; KEY_BUFF_LEN]);

    let d = purpose.discriminator();
    b[..32].copy_from_slice(key_hmac);
    b[32..][..d.len()].copy_from_slice(d);

    let mut v = [0u8; VARINT_MAX];
    let n = write_varint(index as u64, &mut v);
    b[32 + d.len()..][..n].copy_from_slice(&v[..n]);

    let h = Zeroizing::new(keccak256(&[&b[..]]));
    Zeroizing::new(keccak256(&[&h[..]]))
}

/// Setup an HMAC instance over the keccak digest of the provided parts
fn hmac_over(
    key_hmac: &[u8; 32],
    purpose: HmacPurpose,
    index: usize,
    parts: &[&[u8]],
) -> Result<HmacSha256, Error> {
    let key = hmac_key(key_hmac, purpose, index);

    let mut mac = HmacSha256::new_from_slice(&key[..]).map_err(|_| Error::InvalidLength)?;
    mac.update(&keccak256(parts));

    Ok(mac)
}

/// Compute the HMAC for a destination entry at the provided output index
pub fn dest_hmac(
    key_hmac: &[u8; 32],
    dst: &DestinationEntry,
    index: usize,
) -> Result<[u8; 32], Error> {
    let mac = hmac_over(key_hmac, HmacPurpose::TxDest, index, &[&dst.to_bytes()])?;
    Ok(mac.finalize().into_bytes().into())
}

/// Check a host-provided destination HMAC (constant time)
pub fn verify_dest_hmac(
    key_hmac: &[u8; 32],
    dst: &DestinationEntry,
    index: usize,
    hmac: &[u8; 32],
) -> Result<(), Error> {
    let mac = hmac_over(key_hmac, HmacPurpose::TxDest, index, &[&dst.to_bytes()])?;
    mac.verify_slice(hmac)
        .map_err(|_| Error::AuthenticationFailed)
}

/// Compute the HMAC binding a destination entry to its serialized output record
pub fn output_hmac(
    key_hmac: &[u8; 32],
    dst: &DestinationEntry,
    tx_out: &[u8],
    index: usize,
) -> Result<[u8; 32], Error> {
    let mac = hmac_over(
        key_hmac,
        HmacPurpose::TxOut,
        index,
        &[&dst.to_bytes(), tx_out],
    )?;
    Ok(mac.finalize().into_bytes().into())
}
