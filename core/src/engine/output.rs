// Copyright (c) 2022-2023 The MobileCoin Foundation

use alloc::vec::Vec;

use encdec::Encode;

use ledger_proto::ApduError;

use crate::apdu::{
    self,
    state::{TxState, TxStep},
};

/// [`Engine`][super::Engine] outputs (in response to events), typically encoded to response [APDUs][crate::apdu]
#[derive(Clone, PartialEq, Debug)]
pub enum Output {
    None,

    /// Engine state
    State {
        state: super::State,
        last_step: TxStep,
        output_index: u16,
    },

    /// Processed output
    TxOutput {
        tx_out: [u8; 34],
        vouti_hmac: [u8; 32],
        out_pk: [u8; 64],
        ecdh_info: [u8; 8],
        mask: Option<[u8; 32]>,
        rsig: Option<Vec<u8>>,
    },

    /// Offloaded range proof accepted
    TxRsigAck,
}

impl Output {
    /// Encode an [`Output`] object to an APDU response
    #[cfg_attr(feature = "noinline", inline(never))]
    pub fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        match self {
            Output::None => Ok(0),
            Output::State {
                state,
                last_step,
                output_index,
            } => apdu::tx::TxInfo {
                state: state.state(),
                last_step: *last_step,
                output_index: *output_index,
            }
            .encode(buff),
            Output::TxOutput {
                tx_out,
                vouti_hmac,
                out_pk,
                ecdh_info,
                mask,
                rsig,
            } => apdu::tx::TxSetOutputAck {
                tx_out: *tx_out,
                vouti_hmac: *vouti_hmac,
                out_pk: *out_pk,
                ecdh_info: *ecdh_info,
                mask: *mask,
                rsig: rsig.as_deref(),
            }
            .encode(buff),
            Output::TxRsigAck => apdu::tx::TxSetOutputRsigAck.encode(buff),
        }
    }

    /// Fetch state for outputs containing this
    pub fn state(&self) -> Option<super::State> {
        match &self {
            Output::State { state, .. } => Some(*state),
            _ => None,
        }
    }
}

impl PartialEq<super::State> for Output {
    fn eq(&self, other: &super::State) -> bool {
        match self {
            Output::State { state, .. } => state == other,
            _ => false,
        }
    }
}

impl crate::engine::State {
    /// Map [engine](crate::engine) states to [apdu][apdu::state::TxState] states for transmission
    pub fn state(&self) -> TxState {
        use crate::engine::State;

        match self {
            State::Init => TxState::Init,
            State::Inputs => TxState::Inputs,
            State::Outputs => TxState::Outputs,
            State::OutputsDone => TxState::OutputsDone,
            State::Error => TxState::Error,
        }
    }
}
