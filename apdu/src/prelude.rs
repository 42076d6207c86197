//! Prelude to simplify downstream use of APDU objects
//!

pub use crate::{
    state::{TxState, TxStep},
    tx::{
        AccountAddress, DestinationEntry, DestinationFlags, SetOutputAckFlags, SetOutputFlags,
        TxInfo, TxInfoReq, TxSetOutput, TxSetOutputAck, TxSetOutputRsigAck,
    },
    Instruction, XMR_APDU_CLA,
};
