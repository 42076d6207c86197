// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Transaction related APDUs, used to stream outputs through the hardware wallet.
//!
//! See [ledger_xmr_core::engine] for interaction and state machines

use encdec::{Decode, Encode};
use ledger_proto::ApduStatic;

use crate::{
    state::{TxState, TxStep},
    ApduError, Instruction, XMR_APDU_CLA,
};

mod destination;
pub use destination::*;

mod set_output;
pub use set_output::*;

/// Transaction information request APDU (0 length APDU)
#[derive(Clone, PartialEq, Debug, Encode, Decode)]
#[encdec(error = "ApduError")]
pub struct TxInfoReq;

impl ApduStatic for TxInfoReq {
    const CLA: u8 = XMR_APDU_CLA;
    const INS: u8 = Instruction::TxGetInfo as u8;
}

/// Transaction information response APDU.
///
/// Contains the last completed signing step and the index of the last
/// accepted output, so the host can resynchronise or detect an aborted
/// session.
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |     STATE     |   LAST_STEP   |         OUTPUT_INDEX          |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Clone, PartialEq, Debug, Encode, Decode)]
#[encdec(error = "ApduError")]
pub struct TxInfo {
    /// Engine state
    pub state: TxState,
    /// Last completed protocol step
    pub last_step: TxStep,
    /// Index of the last accepted output (`0xffff` if none)
    pub output_index: u16,
}
