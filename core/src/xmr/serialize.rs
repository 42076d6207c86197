// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Fixed layout output serializers

use curve25519_dalek::EdwardsPoint;

/// Serialized output record length
pub const TX_OUT_LEN: usize = 34;

/// `txout_to_key` variant tag
pub const TXOUT_TO_KEY: u8 = 0x02;

/// Serialize a `TxOut(0, TxoutToKey(key))` record.
///
/// ```text
/// | AMOUNT (varint, 0x00) | TAG (0x02) | KEY (32-byte compressed point) |
/// ```
pub fn tx_out_to_key(key: &EdwardsPoint) -> [u8; TX_OUT_LEN] {
    let mut b = [0u8; TX_OUT_LEN];
    b[1] = TXOUT_TO_KEY;
    b[2..].copy_from_slice(key.compress().as_bytes());
    b
}

/// Output public key block, `one-time key || commitment`
pub fn out_pk(dest: &[u8; 32], commitment: &[u8; 32]) -> [u8; 64] {
    let mut b = [0u8; 64];
    b[..32].copy_from_slice(dest);
    b[32..].copy_from_slice(commitment);
    b
}
