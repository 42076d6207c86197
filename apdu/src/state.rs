// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Application State encodings
//!

use encdec::{DecodeOwned, Encode};
use ledger_proto::ApduError;
use num_enum::TryFromPrimitive;
use strum::{Display, EnumIter, EnumString, EnumVariantNames};

/// Engine state enumeration
/// used in [`TxInfo`][crate::tx::TxInfo] to communicate transaction progress
#[derive(
    Copy, Clone, PartialEq, Debug, EnumString, Display, EnumVariantNames, EnumIter, TryFromPrimitive,
)]
#[repr(u8)]
pub enum TxState {
    /// No signing session active
    Init = 0x00,
    /// Session active, collecting inputs
    Inputs = 0x10,
    /// Streaming outputs
    Outputs = 0x20,
    /// All outputs (and range proofs) processed
    OutputsDone = 0x21,
    /// Session aborted
    Error = 0xFF,
}

/// Signing protocol step, the last completed step is used to reject
/// out-of-order messages
#[derive(
    Copy, Clone, PartialEq, Debug, EnumString, Display, EnumVariantNames, EnumIter, TryFromPrimitive,
)]
#[repr(u8)]
pub enum TxStep {
    /// Session initialised
    Init = 0x00,
    /// Input(s) recorded
    Input = 0x01,
    /// All inputs recorded
    AllInputs = 0x02,
    /// Output(s) processed
    Output = 0x03,
    /// All outputs processed
    AllOutputs = 0x04,
}

/// Helper macro for single byte enum encodings
macro_rules! encdec_u8_enum {
    ($t:ty) => {
        impl Encode for $t {
            type Error = ApduError;

            fn encode_len(&self) -> Result<usize, ApduError> {
                Ok(1)
            }

            fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
                if buff.is_empty() {
                    return Err(ApduError::InvalidLength);
                }

                buff[0] = *self as u8;
                Ok(1)
            }
        }

        impl DecodeOwned for $t {
            type Output = Self;

            type Error = ApduError;

            fn decode_owned(buff: &[u8]) -> Result<(Self, usize), ApduError> {
                if buff.is_empty() {
                    return Err(ApduError::InvalidLength);
                }

                match Self::try_from(buff[0]) {
                    Ok(v) => Ok((v, 1)),
                    Err(_) => Err(ApduError::InvalidEncoding),
                }
            }
        }
    };
}

encdec_u8_enum!(TxState);
encdec_u8_enum!(TxStep);
