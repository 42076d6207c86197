// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Pedersen commitments and ECDH amount encoding

use curve25519_dalek::{edwards::CompressedEdwardsY, EdwardsPoint, Scalar};
use strum::{Display, EnumIter, EnumString, EnumVariantNames};

use super::rsig::RangeProofKind;
use crate::{
    engine::Error,
    helpers::{decompress, hash_to_scalar, keccak256},
};

/// Amount generator `H = 8·to_point(keccak256(G))`
pub const H: CompressedEdwardsY = CompressedEdwardsY([
    0x8b, 0x65, 0x59, 0x70, 0x15, 0x37, 0x99, 0xaf, 0x2a, 0xea, 0xdc, 0x9f, 0xf1, 0xad, 0xd0, 0xea,
    0x6c, 0x72, 0x51, 0xd5, 0x41, 0x54, 0xcf, 0xa9, 0x2c, 0x17, 0x3a, 0x0d, 0xd3, 0x9c, 0x1f, 0x94,
]);

/// Decompressed amount generator
pub fn h() -> Result<EdwardsPoint, Error> {
    decompress(&H.0)
}

/// Modular inverse of 8
pub fn inv_eight() -> Scalar {
    Scalar::from(8u64).invert()
}

/// Deterministic commitment mask, `H_s("commitment_mask" || amount_key)`
pub fn commitment_mask(amount_key: &Scalar) -> Scalar {
    hash_to_scalar(&[b"commitment_mask", amount_key.as_bytes()])
}

/// Pedersen commitment `C = mask·G + amount·H`
pub fn gen_commitment(mask: &Scalar, amount: u64) -> Result<EdwardsPoint, Error> {
    Ok(EdwardsPoint::mul_base(mask) + Scalar::from(amount) * h()?)
}

/// Compute the output commitment for the provided range proof kind.
///
/// Bulletproof+ outputs store the commitment multiplied by `8^-1`, as the
/// verifier multiplies by 8 to clear the cofactor.
pub fn commit(kind: RangeProofKind, mask: &Scalar, amount: u64) -> Result<EdwardsPoint, Error> {
    match kind {
        RangeProofKind::Bulletproof => gen_commitment(mask, amount),
        RangeProofKind::BulletproofPlus => {
            let inv8 = inv_eight();
            let mask8 = mask * inv8;
            let amount8 = Scalar::from(amount) * inv8;

            Ok(EdwardsPoint::mul_base(&mask8) + amount8 * h()?)
        }
    }
}

/// ECDH amount encoding, selected once per session
#[derive(Copy, Clone, PartialEq, Debug, Default, EnumString, Display, EnumVariantNames, EnumIter)]
pub enum EcdhFormat {
    /// 8-byte little-endian amount
    #[default]
    Plain,
    /// Amount XOR the first 8 bytes of `keccak256("amount" || amount_key)`
    Masked,
}

/// Encode an amount for the recipient
pub fn ecdh_encode(format: EcdhFormat, amount: u64, amount_key: &Scalar) -> [u8; 8] {
    let mut b = amount.to_le_bytes();

    if format == EcdhFormat::Masked {
        let h = keccak256(&[b"amount", amount_key.as_bytes()]);
        for (v, k) in b.iter_mut().zip(h.iter()) {
            *v ^= k;
        }
    }

    b
}
