// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Hashing and encoding helpers shared by the [xmr][crate::xmr] modules

use curve25519_dalek::{
    edwards::{CompressedEdwardsY, EdwardsPoint},
    Scalar,
};
use sha3::{Digest, Keccak256};

use crate::engine::Error;

/// Maximum encoded length of a `u64` varint
pub const VARINT_MAX: usize = 10;

/// Keccak-256 over the concatenation of the provided parts
pub fn keccak256(parts: &[&[u8]]) -> [u8; 32] {
    let mut h = Keccak256::new();
    for p in parts {
        h.update(p);
    }
    h.finalize().into()
}

/// Hash to scalar, `H_s(x) = keccak256(x) mod l`
pub fn hash_to_scalar(parts: &[&[u8]]) -> Scalar {
    Scalar::from_bytes_mod_order(keccak256(parts))
}

/// Write a LEB128 style unsigned varint to the provided buffer,
/// returning the encoded length
pub fn write_varint(mut v: u64, buff: &mut [u8; VARINT_MAX]) -> usize {
    let mut n = 0;

    while v >= 0x80 {
        buff[n] = (v as u8 & 0x7f) | 0x80;
        v >>= 7;
        n += 1;
    }
    buff[n] = v as u8;

    n + 1
}

/// Decompress an edwards point, rejecting invalid encodings
pub fn decompress(b: &[u8; 32]) -> Result<EdwardsPoint, Error> {
    match CompressedEdwardsY(*b).decompress() {
        Some(p) => Ok(p),
        None => Err(Error::InvalidKey),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn varint_encoding() {
        let tests: &[(u64, &[u8])] = &[
            (0, &[0x00]),
            (1, &[0x01]),
            (127, &[0x7f]),
            (128, &[0x80, 0x01]),
            (300, &[0xac, 0x02]),
            (16383, &[0xff, 0x7f]),
            (16384, &[0x80, 0x80, 0x01]),
            (
                u64::MAX,
                &[0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x01],
            ),
        ];

        for (v, e) in tests {
            let mut buff = [0u8; VARINT_MAX];
            let n = write_varint(*v, &mut buff);

            assert_eq!(&buff[..n], *e, "varint encoding mismatch for {v}");
        }
    }

    #[test]
    fn keccak_parts() {
        // Concatenated parts hash as a single buffer
        let a = keccak256(&[b"commitment", b"_mask"]);
        let b = keccak256(&[b"commitment_mask"]);
        assert_eq!(a, b);

        // Keccak-256 (not SHA3-256) of the empty string
        assert_eq!(
            keccak256(&[]),
            [
                0xc5, 0xd2, 0x46, 0x01, 0x86, 0xf7, 0x23, 0x3c, 0x92, 0x7e, 0x7d, 0xb2, 0xdc, 0xc7,
                0x03, 0xc0, 0xe5, 0x00, 0xb6, 0x53, 0xca, 0x82, 0x27, 0x3b, 0x7b, 0xfa, 0xd8, 0x04,
                0x5d, 0x85, 0xa4, 0x70
            ]
        );
    }

    #[test]
    fn reject_invalid_points() {
        // y = 2 is not on the curve
        let mut b = [0u8; 32];
        b[0] = 2;

        assert_eq!(decompress(&b), Err(Error::InvalidKey));
    }
}
