// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Per-transaction signing session state.
//!
//! A [Session] is created when a transaction is started and owns all state
//! for streamed inputs and outputs. It is dropped (and secrets zeroized) when
//! the transaction completes or on any error.

use heapless::Vec;
use strum::{Display, EnumIter, EnumString, EnumVariantNames};
use zeroize::Zeroize;

use curve25519_dalek::{EdwardsPoint, Scalar};

use super::{
    batch::{BatchAccumulator, BatchPlan, MAX_OUTPUTS},
    Error,
};
use crate::{
    apdu::{state::TxStep, tx::AccountAddress},
    xmr::{
        commitment::EcdhFormat,
        hasher::{FullMessageHasher, TxPrefixHasher},
        rsig::RangeProofKind,
    },
};

/// Per-transaction configuration
#[derive(Clone, PartialEq, Debug)]
pub struct SessionConfig {
    /// Number of transaction inputs
    pub input_count: usize,
    /// Number of transaction outputs
    pub output_count: usize,
    /// Range proof kind
    pub rsig_kind: RangeProofKind,
    /// Range proofs are computed by the host and verified on-device
    pub rsig_offload: bool,
    /// Range proof batches
    pub grouping: BatchPlan,
    /// Generate per-output transaction keys
    pub need_additional_txkeys: bool,
    /// Amount encoding
    pub ecdh_format: EcdhFormat,
}

impl SessionConfig {
    /// Create a new session configuration, checking output count and grouping
    pub fn new(
        input_count: usize,
        output_count: usize,
        rsig_kind: RangeProofKind,
        rsig_offload: bool,
        grouping: &[usize],
    ) -> Result<Self, Error> {
        if input_count == 0 || output_count == 0 || output_count > MAX_OUTPUTS {
            return Err(Error::ProtocolViolation);
        }

        Ok(Self {
            input_count,
            output_count,
            rsig_kind,
            rsig_offload,
            grouping: BatchPlan::new(grouping, output_count)?,
            need_additional_txkeys: false,
            ecdh_format: EcdhFormat::default(),
        })
    }

    /// Enable per-output transaction keys
    pub fn with_additional_txkeys(mut self, enabled: bool) -> Self {
        self.need_additional_txkeys = enabled;
        self
    }

    /// Set amount encoding
    pub fn with_ecdh_format(mut self, format: EcdhFormat) -> Self {
        self.ecdh_format = format;
        self
    }
}

/// Per-transaction secrets, provided by the wallet on session setup
#[derive(Clone)]
pub struct SessionKeys {
    /// Key for destination / output HMACs
    pub key_hmac: [u8; 32],
    /// Transaction private key `r`
    pub tx_priv: Scalar,
    /// Transaction public key `R`
    pub tx_pub: EdwardsPoint,
    /// Wallet private view key `a`
    pub view_private: Scalar,
    /// Wallet change address, if any
    pub change_address: Option<AccountAddress>,
}

impl SessionKeys {
    /// Create session keys from the transaction private key,
    /// computing the public key `R = r·G`
    pub fn new(key_hmac: [u8; 32], tx_priv: Scalar, view_private: Scalar) -> Self {
        Self {
            key_hmac,
            tx_pub: EdwardsPoint::mul_base(&tx_priv),
            tx_priv,
            view_private,
            change_address: None,
        }
    }

    /// Set the wallet change address
    pub fn with_change_address(mut self, addr: AccountAddress) -> Self {
        self.change_address = Some(addr);
        self
    }
}

impl Drop for SessionKeys {
    fn drop(&mut self) {
        self.key_hmac.zeroize();
        self.tx_priv.zeroize();
        self.view_private.zeroize();
    }
}

impl core::fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionKeys")
            .field("tx_pub", &self.tx_pub.compress())
            .field("change_address", &self.change_address)
            .finish_non_exhaustive()
    }
}

/// Range proof states, tracking the current batch
#[derive(Copy, Clone, PartialEq, Debug, EnumString, Display, EnumVariantNames, EnumIter)]
pub enum RsigState {
    /// Collecting outputs for the batch
    Collecting(usize),
    /// Batch closed, awaiting the offloaded proof
    AwaitingProof(usize),
    /// All batches proven or verified
    Complete,
}

impl Default for RsigState {
    fn default() -> Self {
        Self::Collecting(0)
    }
}

/// Signing session state
pub struct Session {
    pub(crate) config: SessionConfig,
    pub(crate) keys: SessionKeys,

    /// Last completed protocol step
    pub(crate) last_step: TxStep,

    pub(crate) current_input_index: Option<usize>,
    pub(crate) current_output_index: Option<usize>,

    /// Amounts and masks for the current batch
    pub(crate) batch: BatchAccumulator,
    pub(crate) rsig_state: RsigState,

    /// Output commitments, retained for the final step
    pub(crate) output_pk_commitments: Vec<[u8; 32], MAX_OUTPUTS>,

    /// Sum of output masks
    pub(crate) sumout: Scalar,
    /// Sum of pseudo-output masks
    pub(crate) sumpouts_alphas: Scalar,
    /// Sum of output amounts
    pub(crate) summary_outs_money: u64,

    pub(crate) prefix_hasher: TxPrefixHasher,
    pub(crate) full_message_hasher: FullMessageHasher,

    pub(crate) additional_tx_public_keys: Vec<[u8; 32], MAX_OUTPUTS>,
    pub(crate) additional_tx_private_keys: Vec<Scalar, MAX_OUTPUTS>,

    /// Set on any output streaming error
    pub(crate) poisoned: bool,
}

impl Session {
    /// Create a new signing session
    pub fn new(config: SessionConfig, keys: SessionKeys) -> Self {
        Self {
            config,
            keys,
            last_step: TxStep::Init,
            current_input_index: None,
            current_output_index: None,
            batch: BatchAccumulator::new(),
            rsig_state: RsigState::default(),
            output_pk_commitments: Vec::new(),
            sumout: Scalar::ZERO,
            sumpouts_alphas: Scalar::ZERO,
            summary_outs_money: 0,
            prefix_hasher: TxPrefixHasher::new(),
            full_message_hasher: FullMessageHasher::new(),
            additional_tx_public_keys: Vec::new(),
            additional_tx_private_keys: Vec::new(),
            poisoned: false,
        }
    }

    /// Record a serialized input and its pseudo-output mask
    pub fn record_input(&mut self, vini: &[u8], pseudo_out_alpha: &Scalar) -> Result<(), Error> {
        if !matches!(self.last_step, TxStep::Init | TxStep::Input) {
            return Err(Error::ProtocolViolation);
        }

        let index = self.current_input_index.map_or(0, |i| i + 1);
        if index >= self.config.input_count {
            return Err(Error::ProtocolViolation);
        }

        self.prefix_hasher.buffer(vini);
        self.sumpouts_alphas += pseudo_out_alpha;

        self.current_input_index = Some(index);
        self.last_step = TxStep::Input;

        Ok(())
    }

    /// Complete input streaming, all inputs must have been recorded
    pub fn finish_inputs(&mut self) -> Result<(), Error> {
        if self.last_step != TxStep::Input || !self.inputs_done() {
            return Err(Error::ProtocolViolation);
        }

        self.last_step = TxStep::AllInputs;

        Ok(())
    }

    /// Complete output streaming, all outputs and range proofs must be processed
    pub fn finish_outputs(&mut self) -> Result<(), Error> {
        if self.last_step != TxStep::Output || !self.is_complete() {
            return Err(Error::ProtocolViolation);
        }

        self.last_step = TxStep::AllOutputs;

        Ok(())
    }

    /// Check whether all inputs have been recorded
    pub(crate) fn inputs_done(&self) -> bool {
        self.current_input_index.map(|i| i + 1) == Some(self.config.input_count)
    }

    /// Fetch session configuration
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Fetch the last completed step
    pub fn last_step(&self) -> TxStep {
        self.last_step
    }

    /// Fetch the index of the last accepted output
    pub fn current_output_index(&self) -> Option<usize> {
        self.current_output_index
    }

    /// Fetch the range proof state
    pub fn rsig_state(&self) -> RsigState {
        self.rsig_state
    }

    /// Check whether the session is waiting on an offloaded proof
    pub fn is_processing_offloaded(&self) -> bool {
        matches!(self.rsig_state, RsigState::AwaitingProof(_))
    }

    /// Check whether all outputs and range proofs have been processed
    pub fn is_complete(&self) -> bool {
        self.rsig_state == RsigState::Complete
    }

    /// Fetch the batch accumulator
    pub fn batch(&self) -> &BatchAccumulator {
        &self.batch
    }

    /// Fetch output commitments
    pub fn output_pk_commitments(&self) -> &[[u8; 32]] {
        &self.output_pk_commitments
    }

    /// Fetch the sum of output masks
    pub fn sumout(&self) -> &Scalar {
        &self.sumout
    }

    /// Fetch the sum of pseudo-output masks
    pub fn sumpouts_alphas(&self) -> &Scalar {
        &self.sumpouts_alphas
    }

    /// Fetch the sum of output amounts
    pub fn summary_outs_money(&self) -> u64 {
        self.summary_outs_money
    }

    /// Fetch additional transaction public keys
    pub fn additional_tx_public_keys(&self) -> &[[u8; 32]] {
        &self.additional_tx_public_keys
    }

    /// Fetch the transaction prefix hasher
    pub fn prefix_hasher(&self) -> &TxPrefixHasher {
        &self.prefix_hasher
    }

    /// Fetch the full message hasher
    pub fn full_message_hasher(&self) -> &FullMessageHasher {
        &self.full_message_hasher
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.batch.release();
        self.sumout.zeroize();
        self.sumpouts_alphas.zeroize();
        self.additional_tx_private_keys
            .iter_mut()
            .for_each(|k| k.zeroize());
    }
}
