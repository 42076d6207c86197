// Copyright (c) 2022-2023 The MobileCoin Foundation

use ledger_proto::ApduError;
use num_enum::TryFromPrimitive;

/// [Engine][super::Engine] errors
///
/// All errors returned while streaming outputs are fatal to the signing session.
/// Error codes are stable, allowing these to be reported to the host.
#[derive(Copy, Clone, PartialEq, Debug, TryFromPrimitive)]
#[cfg_attr(feature = "thiserror", derive(thiserror::Error))]
#[repr(u8)]
pub enum Error {
    /// Invalid argument length
    #[cfg_attr(feature = "thiserror", error("Invalid argument length"))]
    InvalidLength = 0x00,

    /// Unexpected event
    #[cfg_attr(feature = "thiserror", error("Unexpected event"))]
    UnexpectedEvent = 0x01,

    /// Invalid key (decompression failed)
    #[cfg_attr(feature = "thiserror", error("invalid edwards point"))]
    InvalidKey = 0x05,

    /// Invalid engine state
    #[cfg_attr(feature = "thiserror", error("invalid engine state"))]
    InvalidState = 0x0a,

    /// Message encoding failed
    #[cfg_attr(feature = "thiserror", error("message encoding failed"))]
    EncodingFailed = 0x0b,

    /// Out of order step or inconsistent input / output bookkeeping
    #[cfg_attr(feature = "thiserror", error("protocol violation"))]
    ProtocolViolation = 0x10,

    /// Destination HMAC mismatch
    #[cfg_attr(feature = "thiserror", error("destination authentication failed"))]
    AuthenticationFailed = 0x11,

    /// Range proof provided to a session that does not offload proofs
    #[cfg_attr(feature = "thiserror", error("unexpected range proof"))]
    UnexpectedProof = 0x12,

    /// Range proof provided before the batch was closed
    #[cfg_attr(feature = "thiserror", error("range proof supplied too early"))]
    ProofSuppliedTooEarly = 0x13,

    /// Offloaded message without a matching closed batch,
    /// or first-pass message while a proof is owed
    #[cfg_attr(feature = "thiserror", error("offloaded message out of order"))]
    OffloadedMessageOutOfOrder = 0x14,

    /// Offloaded follow-up missing the range proof
    #[cfg_attr(feature = "thiserror", error("range proof expected, not provided"))]
    MissingProof = 0x15,

    /// Host provided range proof failed verification
    #[cfg_attr(feature = "thiserror", error("range proof verification failed"))]
    ProofVerificationFailed = 0x16,

    /// More than 127 elements in a range proof vector
    #[cfg_attr(feature = "thiserror", error("range proof batch too large"))]
    BatchTooLarge = 0x17,

    /// Destination with a negative amount
    #[cfg_attr(feature = "thiserror", error("destination with negative amount"))]
    NegativeAmount = 0x18,

    /// Range proof grouping does not partition the outputs
    #[cfg_attr(feature = "thiserror", error("invalid range proof grouping"))]
    InvalidGrouping = 0x19,

    /// Range proof generation failed
    #[cfg_attr(feature = "thiserror", error("range proof generation failed"))]
    ProofGenerationFailed = 0x1a,

    /// Unknown / not-yet defined error (placeholder)
    #[cfg_attr(feature = "thiserror", error("unknown"))]
    Unknown = 0xf0,
}

impl From<ApduError> for Error {
    fn from(e: ApduError) -> Self {
        match e {
            ApduError::InvalidLength => Error::InvalidLength,
            _ => Error::EncodingFailed,
        }
    }
}

impl From<encdec::Error> for Error {
    fn from(e: encdec::Error) -> Self {
        match e {
            encdec::Error::Length => Error::InvalidLength,
            _ => Error::EncodingFailed,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn error_codes() {
        let tests = &[
            (Error::ProtocolViolation, 0x10),
            (Error::AuthenticationFailed, 0x11),
            (Error::ProofVerificationFailed, 0x16),
            (Error::NegativeAmount, 0x18),
        ];

        for (e, c) in tests {
            assert_eq!(*e as u8, *c);
            assert_eq!(Error::try_from(*c).ok(), Some(*e));
        }

        assert!(Error::try_from(0xee).is_err());
    }

    #[test]
    fn error_conversions() {
        assert_eq!(Error::from(ApduError::InvalidLength), Error::InvalidLength);
        assert_eq!(Error::from(ApduError::InvalidEncoding), Error::EncodingFailed);
        assert_eq!(Error::from(encdec::Error::Length), Error::InvalidLength);
    }
}
