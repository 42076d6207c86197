// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Shared secret derivation and one-time output keys

use curve25519_dalek::{EdwardsPoint, Scalar};
use rand_core::CryptoRngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::helpers::{hash_to_scalar, write_varint, VARINT_MAX};

/// Shared key derivation, `8·(sec·pub)` in compressed form
#[derive(Clone, PartialEq, Zeroize, ZeroizeOnDrop)]
pub struct KeyDerivation([u8; 32]);

impl KeyDerivation {
    /// Compute the derivation for a public / secret key pair,
    /// `a·R` for change outputs, `r·A` or `s·C` otherwise.
    pub fn generate(public: &EdwardsPoint, secret: &Scalar) -> Self {
        Self((secret * public).mul_by_cofactor().compress().to_bytes())
    }

    /// Fetch derivation bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Derive the per-output scalar `H_s(derivation || varint(index))`,
    /// used as the amount key
    pub fn to_scalar(&self, index: usize) -> Scalar {
        let mut v = [0u8; VARINT_MAX];
        let n = write_varint(index as u64, &mut v);

        hash_to_scalar(&[&self.0, &v[..n]])
    }

    /// Derive the one-time output key `P = H_s(derivation || index)·G + B`
    pub fn derive_public_key(&self, index: usize, spend_public: &EdwardsPoint) -> EdwardsPoint {
        let mut s = self.to_scalar(index);
        let p = EdwardsPoint::mul_base(&s) + spend_public;
        s.zeroize();
        p
    }

    /// Derive the one-time output key and amount key for an output
    pub fn output_keys(&self, index: usize, spend_public: &EdwardsPoint) -> OutputKeys {
        let amount_key = self.to_scalar(index);

        OutputKeys {
            tx_out_key: EdwardsPoint::mul_base(&amount_key) + spend_public,
            amount_key,
        }
    }
}

impl core::fmt::Debug for KeyDerivation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "KeyDerivation(..)")
    }
}

/// Per-output keys
#[derive(Clone, PartialEq, Debug, Zeroize, ZeroizeOnDrop)]
pub struct OutputKeys {
    /// One-time output public key
    #[zeroize(skip)]
    pub tx_out_key: EdwardsPoint,
    /// Amount key, `H_s(derivation || index)`
    pub amount_key: Scalar,
}

/// Generate an additional per-output transaction key pair,
/// `s·D` for subaddress destinations (with spend key `D`), `s·G` otherwise
pub fn additional_tx_key<RNG: CryptoRngCore>(
    rng: &mut RNG,
    subaddress_spend: Option<&EdwardsPoint>,
) -> (Scalar, EdwardsPoint) {
    let s = Scalar::random(rng);

    let p = match subaddress_spend {
        Some(d) => s * d,
        None => EdwardsPoint::mul_base(&s),
    };

    (s, p)
}

#[cfg(test)]
mod test {
    use rand::rngs::OsRng;

    use super::*;

    fn scalar(v: u8) -> Scalar {
        Scalar::from_bytes_mod_order([v; 32])
    }

    #[test]
    fn derivation_is_symmetric() {
        let (a, r) = (Scalar::random(&mut OsRng), Scalar::random(&mut OsRng));
        let (big_a, big_r) = (EdwardsPoint::mul_base(&a), EdwardsPoint::mul_base(&r));

        // Sender r·A matches recipient a·R
        assert_eq!(
            KeyDerivation::generate(&big_a, &r),
            KeyDerivation::generate(&big_r, &a)
        );
    }

    #[test]
    fn derivation_known_answer() {
        let a = EdwardsPoint::mul_base(&scalar(9));
        let b = EdwardsPoint::mul_base(&scalar(5));

        assert_eq!(
            hex::encode(a.compress().as_bytes()),
            "4faa93763d0702316ddef05a7921b30b30e81530b44cf9f35773ffee16f68638"
        );

        let d = KeyDerivation::generate(&a, &scalar(7));
        assert_eq!(
            hex::encode(d.as_bytes()),
            "c2e09bc9434ff6da0c66b4a8266626e7edfef91cd1a34ba38c94e0f3a01f695a"
        );

        let k = d.output_keys(1, &b);
        assert_eq!(
            hex::encode(k.amount_key.as_bytes()),
            "17eb9e4322e8b1b0a20d81a14dbf781928d45afae2f116a3050928b01426b803"
        );
        assert_eq!(
            hex::encode(k.tx_out_key.compress().as_bytes()),
            "7f4088d146ac1897d3d6669a6b9781f0b98af5d74c7a5d523da98eb3d156861c"
        );
    }

    #[test]
    fn output_keys_deterministic() {
        let d = KeyDerivation::generate(
            &EdwardsPoint::mul_base(&Scalar::random(&mut OsRng)),
            &Scalar::random(&mut OsRng),
        );
        let b = EdwardsPoint::mul_base(&Scalar::random(&mut OsRng));

        for i in [0, 1, 2, 127, 128, 300] {
            let k1 = d.output_keys(i, &b);
            let k2 = d.clone().output_keys(i, &b);

            assert_eq!(k1, k2);
            assert_eq!(k1.tx_out_key, d.derive_public_key(i, &b));

            // Index is bound into the output keys
            assert_ne!(k1.amount_key, d.to_scalar(i + 1));
        }
    }

    #[test]
    fn recipient_recovers_spend_key() {
        let (a, b, r) = (scalar(11), scalar(12), scalar(13));
        let (big_a, big_b) = (EdwardsPoint::mul_base(&a), EdwardsPoint::mul_base(&b));
        let big_r = EdwardsPoint::mul_base(&r);

        let sender = KeyDerivation::generate(&big_a, &r).output_keys(4, &big_b);

        // Recipient computes P - H_s(a·R || i)·G == B
        let recipient = KeyDerivation::generate(&big_r, &a);
        let recovered =
            sender.tx_out_key - EdwardsPoint::mul_base(&recipient.to_scalar(4));
        assert_eq!(recovered, big_b);
    }

    #[test]
    fn additional_keys() {
        let d = EdwardsPoint::mul_base(&Scalar::random(&mut OsRng));

        let (s, p) = additional_tx_key(&mut OsRng, Some(&d));
        assert_eq!(p, s * d);

        let (s, p) = additional_tx_key(&mut OsRng, None);
        assert_eq!(p, EdwardsPoint::mul_base(&s));
    }
}
