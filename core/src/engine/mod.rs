// Copyright (c) 2022-2023 The MobileCoin Foundation

//! The [Engine] provides output streaming functionality required by hardware wallets.
//!
//! This handles [Event] inputs and returns [Output] responses to the caller,
//! see [apdu][crate::apdu] for APDU protocol / encoding specifications.
//!
//! Transactions are started with [Engine::begin], after which inputs are
//! recorded and finalised via [Engine::record_input] and [Engine::finish_inputs]
//! before outputs may be streamed via [Event::TxSetOutput]. Any error during
//! output streaming aborts the session.

use curve25519_dalek::Scalar;
use rand_core::{CryptoRngCore, OsRng};
use strum::{Display, EnumIter, EnumString, EnumVariantNames};

use crate::{
    apdu::state::TxStep,
    xmr::rsig::{RangeProof, RangeProofKind},
};

mod batch;
pub use batch::{Batch, BatchAccumulator, BatchPlan, MAX_BATCH_OUTPUTS, MAX_OUTPUTS};

mod error;
pub use error::Error;

mod event;
pub use event::Event;

mod output;
pub use output::Output;

mod session;
pub use session::{RsigState, Session, SessionConfig, SessionKeys};

mod set_output;

/// Engine internal state enumeration
#[derive(Copy, Clone, PartialEq, Debug, EnumString, Display, EnumVariantNames, EnumIter)]
pub enum State {
    /// Idle state, no transaction running
    Init,
    /// Session started, recording inputs
    Inputs,
    /// Inputs complete, streaming outputs
    Outputs,
    /// All outputs and range proofs processed
    OutputsDone,
    /// Transaction failed
    Error,
}

/// [Engine] provides hardware-independent support for Monero output streaming
pub struct Engine<DRV: Driver, RNG: CryptoRngCore = OsRng> {
    state: State,
    session: Option<Session>,

    drv: DRV,
    rng: RNG,
}

/// [`Driver`] trait provides platform support for [`Engine`] instances
pub trait Driver {
    /// Progress notification, called once for each first-pass output
    fn transaction_step(&mut self, _step: TxStep, _index: usize, _total: usize) {}

    /// Generate an aggregate range proof over a batch of amounts and masks
    fn prove_range(
        &mut self,
        kind: RangeProofKind,
        amounts: &[u64],
        masks: &[Scalar],
    ) -> Result<RangeProof, Error>;

    /// Verify an aggregate range proof against a batch of amounts and masks
    fn verify_range(&self, proof: &RangeProof, amounts: &[u64], masks: &[Scalar]) -> bool;
}

impl<T: Driver> Driver for &mut T {
    fn transaction_step(&mut self, step: TxStep, index: usize, total: usize) {
        T::transaction_step(self, step, index, total)
    }

    fn prove_range(
        &mut self,
        kind: RangeProofKind,
        amounts: &[u64],
        masks: &[Scalar],
    ) -> Result<RangeProof, Error> {
        T::prove_range(self, kind, amounts, masks)
    }

    fn verify_range(&self, proof: &RangeProof, amounts: &[u64], masks: &[Scalar]) -> bool {
        T::verify_range(self, proof, amounts, masks)
    }
}

impl<DRV: Driver> Engine<DRV> {
    /// Create a new engine instance with the provided driver,
    /// using the default [OsRng]
    pub const fn new(drv: DRV) -> Self {
        Self::new_with_rng(drv, OsRng {})
    }
}

impl<DRV: Driver, RNG: CryptoRngCore> Engine<DRV, RNG> {
    /// Create a new engine instance with the provided driver and rng
    pub const fn new_with_rng(drv: DRV, rng: RNG) -> Self {
        Self {
            state: State::Init,
            session: None,
            drv,
            rng,
        }
    }

    /// Start a new signing session, replacing any existing session
    pub fn begin(&mut self, config: SessionConfig, keys: SessionKeys) {
        #[cfg(feature = "log")]
        log::debug!(
            "begin session ({} inputs, {} outputs, {} offload: {})",
            config.input_count,
            config.output_count,
            config.rsig_kind,
            config.rsig_offload
        );

        self.session = Some(Session::new(config, keys));
        self.state = State::Inputs;
    }

    /// Record a serialized input and its pseudo-output mask
    pub fn record_input(&mut self, vini: &[u8], pseudo_out_alpha: &Scalar) -> Result<(), Error> {
        self.with_session(|s| s.record_input(vini, pseudo_out_alpha))
    }

    /// Complete input streaming, enabling output streaming
    pub fn finish_inputs(&mut self) -> Result<(), Error> {
        self.with_session(|s| s.finish_inputs())?;
        self.state = State::Outputs;
        Ok(())
    }

    /// Complete output streaming, once all outputs and proofs are processed
    pub fn finish_outputs(&mut self) -> Result<(), Error> {
        self.with_session(|s| s.finish_outputs())
    }

    /// Handle incoming events
    #[cfg_attr(feature = "noinline", inline(never))]
    pub fn update(&mut self, evt: &Event) -> Result<Output, Error> {
        #[cfg(feature = "log")]
        log::debug!("event: {:02x?}", evt);

        match (self.state, evt) {
            // Empty event, do nothing
            (_, Event::None) => Ok(Output::None),

            // Fetch transaction state
            (_, Event::TxGetInfo) => Ok(self.info()),

            // Outputs require an active session
            (State::Init | State::Error, Event::TxSetOutput { .. }) => Err(Error::UnexpectedEvent),

            // Stream outputs and offloaded range proofs
            (
                _,
                Event::TxSetOutput {
                    destination,
                    rsig,
                    offloaded,
                },
            ) => {
                let s = self.session.as_mut().ok_or(Error::InvalidState)?;
                let dst = destination.as_ref().map(|(d, h)| (d, h));

                match s.set_output(&mut self.drv, &mut self.rng, dst, *rsig, *offloaded) {
                    Ok(o) => {
                        if s.is_complete() {
                            self.state = State::OutputsDone;
                        }
                        Ok(o)
                    }
                    Err(e) => self.fail(e),
                }
            }
        }
    }

    /// Run a session operation, aborting the session on failure
    fn with_session<T>(
        &mut self,
        f: impl FnOnce(&mut Session) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let s = self.session.as_mut().ok_or(Error::InvalidState)?;

        match f(s) {
            Ok(v) => Ok(v),
            Err(e) => self.fail(e),
        }
    }

    /// Drop the active session and move to the error state
    fn fail<T>(&mut self, e: Error) -> Result<T, Error> {
        #[cfg(feature = "log")]
        log::error!("session aborted: {:?}", e);

        self.session = None;
        self.state = State::Error;

        Err(e)
    }

    /// Build state response
    fn info(&self) -> Output {
        let (last_step, output_index) = match &self.session {
            Some(s) => (
                s.last_step(),
                s.current_output_index().map_or(u16::MAX, |i| i as u16),
            ),
            None => (TxStep::Init, u16::MAX),
        };

        Output::State {
            state: self.state,
            last_step,
            output_index,
        }
    }

    /// Fetch active session
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Fetch engine state
    pub fn state(&self) -> State {
        self.state
    }

    /// Drop any active session and return to the idle state
    pub fn reset(&mut self) {
        self.session = None;
        self.state = State::Init;
    }
}
