// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Output streaming.
//!
//! Destinations are provided one at a time in output index order, each with
//! the HMAC issued by the wallet during session setup. For each output the
//! session derives the one-time output key and amount key, computes the
//! deterministic mask and commitment, and hashes the serialized output into
//! the transaction transcript.
//!
//! Range proofs are computed per batch. With local proving the proof is
//! generated via the [Driver] when the last output of each batch is
//! processed. With offloaded proving the mask for each output is returned to
//! the host, and once a batch is closed the host must immediately resubmit
//! the proof for that batch (an offloaded follow-up), which is verified
//! before streaming continues.

use rand_core::CryptoRngCore;
use zeroize::Zeroize;

use curve25519_dalek::{EdwardsPoint, Scalar};

use super::{session::RsigState, Driver, Error, Output, Session};
use crate::{
    apdu::{state::TxStep, tx::DestinationEntry},
    helpers::decompress,
    xmr::{
        commitment::{commit, commitment_mask, ecdh_encode},
        hmac::{output_hmac, verify_dest_hmac},
        keys::{additional_tx_key, KeyDerivation},
        rsig::RangeProof,
        serialize::{out_pk, tx_out_to_key},
    },
};

impl Session {
    /// Process a set-output message.
    ///
    /// First-pass messages carry a destination and HMAC, offloaded follow-ups
    /// carry only the range proof for the batch just closed. Any error is
    /// fatal to the session, subsequent calls return [Error::InvalidState].
    #[cfg_attr(feature = "noinline", inline(never))]
    pub fn set_output<DRV: Driver, RNG: CryptoRngCore>(
        &mut self,
        drv: &mut DRV,
        rng: &mut RNG,
        destination: Option<(&DestinationEntry, &[u8; 32])>,
        rsig: Option<&[u8]>,
        offloaded: bool,
    ) -> Result<Output, Error> {
        if self.poisoned {
            return Err(Error::InvalidState);
        }

        let r = self.process(drv, rng, destination, rsig, offloaded);
        if r.is_err() {
            self.poisoned = true;
        }
        r
    }

    fn process<DRV: Driver, RNG: CryptoRngCore>(
        &mut self,
        drv: &mut DRV,
        rng: &mut RNG,
        destination: Option<(&DestinationEntry, &[u8; 32])>,
        rsig: Option<&[u8]>,
        offloaded: bool,
    ) -> Result<Output, Error> {
        if !matches!(self.last_step, TxStep::AllInputs | TxStep::Output) {
            return Err(Error::ProtocolViolation);
        }

        if offloaded {
            if !self.config.rsig_offload {
                return Err(Error::UnexpectedProof);
            }
            let RsigState::AwaitingProof(batch) = self.rsig_state else {
                return Err(Error::OffloadedMessageOutOfOrder);
            };
            let rsig = rsig.ok_or(Error::MissingProof)?;
            if destination.is_some() {
                return Err(Error::ProtocolViolation);
            }

            return self.verify_offloaded(drv, batch, rsig);
        }

        if self.is_processing_offloaded() {
            return Err(Error::OffloadedMessageOutOfOrder);
        }
        if rsig.is_some() {
            if self.config.rsig_offload {
                return Err(Error::ProofSuppliedTooEarly);
            }
            return Err(Error::UnexpectedProof);
        }
        let (dst, hmac) = destination.ok_or(Error::ProtocolViolation)?;

        self.output(drv, rng, dst, hmac)
    }

    /// Process a first-pass output
    fn output<DRV: Driver, RNG: CryptoRngCore>(
        &mut self,
        drv: &mut DRV,
        rng: &mut RNG,
        dst: &DestinationEntry,
        hmac: &[u8; 32],
    ) -> Result<Output, Error> {
        // Validate before any state is mutated
        if dst.amount < 0 {
            return Err(Error::NegativeAmount);
        }
        let amount = dst.amount as u64;

        if !self.inputs_done() {
            return Err(Error::ProtocolViolation);
        }

        let index = self.current_output_index.map_or(0, |i| i + 1);
        if index >= self.config.output_count {
            return Err(Error::ProtocolViolation);
        }

        let outs_money = self
            .summary_outs_money
            .checked_add(amount)
            .ok_or(Error::ProtocolViolation)?;

        let batch = match self.rsig_state {
            RsigState::Collecting(b) if self.config.grouping.batch_of(index) == Some(b) => b,
            _ => return Err(Error::InvalidState),
        };

        verify_dest_hmac(&self.keys.key_hmac, dst, index, hmac)?;

        let spend_public = decompress(&dst.addr.spend_public)?;
        let view_public = decompress(&dst.addr.view_public)?;

        #[cfg(feature = "log")]
        log::debug!(
            "output {}/{} (batch {})",
            index + 1,
            self.config.output_count,
            batch
        );

        drv.transaction_step(TxStep::Output, index, self.config.output_count);

        self.current_output_index = Some(index);
        if index == 0 {
            self.prefix_hasher.uvarint(self.config.output_count as u64);
        }
        self.summary_outs_money = outs_money;

        // Derive output keys and deterministic mask
        let mut additional = self.additional_key(rng, dst, &spend_public)?;
        let derivation = self.derivation(dst, &view_public, additional.as_ref());
        additional.zeroize();

        let keys = derivation.output_keys(index, &spend_public);
        let mask = commitment_mask(&keys.amount_key);

        self.batch.push(amount, mask)?;

        // Range proof for closed batches
        let last_in_batch = self.config.grouping.is_last_in_batch(index);
        let (rsig, wrapped_mask) = match (self.config.rsig_offload, last_in_batch) {
            (false, false) => (None, None),
            (false, true) => (Some(self.prove_batch(drv, batch)?), None),
            (true, false) => (None, Some(mask.to_bytes())),
            (true, true) => {
                self.rsig_state = RsigState::AwaitingProof(batch);
                (None, Some(mask.to_bytes()))
            }
        };

        // Serialize output and bind to destination
        let tx_out = tx_out_to_key(&keys.tx_out_key);
        self.prefix_hasher.buffer(&tx_out);

        let vouti_hmac = output_hmac(&self.keys.key_hmac, dst, &tx_out, index)?;

        // Commitment and encoded amount
        let commitment = commit(self.config.rsig_kind, &mask, amount)?
            .compress()
            .to_bytes();
        let pk = out_pk(keys.tx_out_key.compress().as_bytes(), &commitment);

        self.sumout += mask;

        let ecdh_info = ecdh_encode(self.config.ecdh_format, amount, &keys.amount_key);
        self.full_message_hasher.set_ecdh(&ecdh_info);

        self.output_pk_commitments
            .push(commitment)
            .map_err(|_| Error::InvalidState)?;

        self.last_step = TxStep::Output;

        Ok(Output::TxOutput {
            tx_out,
            vouti_hmac,
            out_pk: pk,
            ecdh_info,
            mask: wrapped_mask,
            rsig,
        })
    }

    /// Generate an additional transaction key where required
    fn additional_key<RNG: CryptoRngCore>(
        &mut self,
        rng: &mut RNG,
        dst: &DestinationEntry,
        spend_public: &EdwardsPoint,
    ) -> Result<Option<Scalar>, Error> {
        if !self.config.need_additional_txkeys {
            return Ok(None);
        }

        let (s, p) = additional_tx_key(rng, dst.is_subaddress().then_some(spend_public));

        self.additional_tx_public_keys
            .push(p.compress().to_bytes())
            .map_err(|_| Error::InvalidState)?;
        self.additional_tx_private_keys
            .push(s)
            .map_err(|_| Error::InvalidState)?;

        Ok(Some(s))
    }

    /// Compute the shared derivation for a destination,
    /// `a·R` for change, `s·C` for subaddresses with additional keys, `r·A` otherwise
    fn derivation(
        &self,
        dst: &DestinationEntry,
        view_public: &EdwardsPoint,
        additional: Option<&Scalar>,
    ) -> KeyDerivation {
        if self.keys.change_address.as_ref() == Some(&dst.addr) {
            return KeyDerivation::generate(&self.keys.tx_pub, &self.keys.view_private);
        }

        match additional {
            Some(s) if dst.is_subaddress() => KeyDerivation::generate(view_public, s),
            _ => KeyDerivation::generate(view_public, &self.keys.tx_priv),
        }
    }

    /// Generate the range proof for a closed batch
    fn prove_batch<DRV: Driver>(
        &mut self,
        drv: &mut DRV,
        batch: usize,
    ) -> Result<alloc::vec::Vec<u8>, Error> {
        let b = self.batch.close();

        let proof = drv.prove_range(self.config.rsig_kind, &b.amounts, &b.masks)?;
        if proof.kind() != self.config.rsig_kind {
            return Err(Error::ProofGenerationFailed);
        }

        self.full_message_hasher.rsig_val(&proof);
        self.next_batch(batch);

        proof.to_vec()
    }

    /// Verify an offloaded range proof for a closed batch
    fn verify_offloaded<DRV: Driver>(
        &mut self,
        drv: &DRV,
        batch: usize,
        rsig: &[u8],
    ) -> Result<Output, Error> {
        let proof = RangeProof::parse(self.config.rsig_kind, rsig)?;

        let b = self.batch.close();
        if !drv.verify_range(&proof, &b.amounts, &b.masks) {
            #[cfg(feature = "log")]
            log::error!("range proof verification failed for batch {}", batch);

            return Err(Error::ProofVerificationFailed);
        }

        self.full_message_hasher.rsig_val(&proof);
        self.next_batch(batch);

        self.last_step = TxStep::Output;

        Ok(Output::TxRsigAck)
    }

    /// Move to the next batch, releasing the accumulator after the last
    fn next_batch(&mut self, batch: usize) {
        if batch + 1 >= self.config.grouping.batches() {
            self.rsig_state = RsigState::Complete;
            self.batch.release();
        } else {
            self.rsig_state = RsigState::Collecting(batch + 1);
        }
    }
}

#[cfg(test)]
mod test {
    use rand::rngs::OsRng;

    use super::*;
    use crate::{
        apdu::tx::AccountAddress,
        engine::{SessionConfig, SessionKeys},
        xmr::{hmac::dest_hmac, rsig::RangeProofKind},
    };

    /// Driver with a failing prover
    struct FailingProver;

    impl Driver for FailingProver {
        fn prove_range(
            &mut self,
            _kind: RangeProofKind,
            _amounts: &[u64],
            _masks: &[Scalar],
        ) -> Result<RangeProof, Error> {
            Err(Error::ProofGenerationFailed)
        }

        fn verify_range(&self, _proof: &RangeProof, _amounts: &[u64], _masks: &[Scalar]) -> bool {
            false
        }
    }

    fn destination() -> DestinationEntry {
        let p = || EdwardsPoint::mul_base(&Scalar::random(&mut OsRng)).compress().to_bytes();

        DestinationEntry::new(
            AccountAddress {
                spend_public: p(),
                view_public: p(),
            },
            1000,
            false,
        )
    }

    #[test]
    fn errors_poison_session() {
        let key_hmac = [0x22; 32];
        let config =
            SessionConfig::new(1, 2, RangeProofKind::BulletproofPlus, false, &[1, 1]).unwrap();
        let keys = SessionKeys::new(
            key_hmac,
            Scalar::random(&mut OsRng),
            Scalar::random(&mut OsRng),
        );

        let mut s = Session::new(config, keys);
        s.record_input(&[0x02], &Scalar::ONE).unwrap();
        s.finish_inputs().unwrap();

        let dst = destination();
        let hmac = dest_hmac(&key_hmac, &dst, 0).unwrap();

        let mut drv = FailingProver;
        assert_eq!(
            s.set_output(&mut drv, &mut OsRng, Some((&dst, &hmac)), None, false),
            Err(Error::ProofGenerationFailed)
        );

        // Retrying the same output does not resume the partially updated session
        assert_eq!(
            s.set_output(&mut drv, &mut OsRng, Some((&dst, &hmac)), None, false),
            Err(Error::InvalidState)
        );
    }
}
