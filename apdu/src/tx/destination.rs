// Copyright (c) 2022-2023 The MobileCoin Foundation

use byteorder::{ByteOrder, LittleEndian};
use encdec::{DecodeOwned, Encode};

use crate::{
    helpers::{put, take},
    ApduError,
};

bitflags::bitflags! {
    /// Destination address flags
    pub struct DestinationFlags: u8 {
        /// Destination is a subaddress
        const SUBADDRESS = 1 << 0;
        /// Destination is an integrated address (carries a payment id)
        const INTEGRATED = 1 << 1;
    }
}

/// Public address of a transaction recipient
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct AccountAddress {
    /// Compressed public spend key
    pub spend_public: [u8; 32],
    /// Compressed public view key
    pub view_public: [u8; 32],
}

/// Transaction destination entry, one per output.
///
/// The amount is carried signed so malformed (negative) destinations can be
/// rejected by the engine rather than silently wrapping.
///
/// This encoding is also the input to the destination HMACs, so any change
/// here invalidates host-held HMACs.
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |     FLAGS     |                   RESERVED                    |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                            AMOUNT                             |
/// |                       (i64, 8-byte LE)                        |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// /                         SPEND_PUBLIC                          /
/// /             (32-byte Compressed Edwards Point)                /
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// /                          VIEW_PUBLIC                          /
/// /             (32-byte Compressed Edwards Point)                /
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Clone, PartialEq, Debug)]
pub struct DestinationEntry {
    /// Address flags
    pub flags: DestinationFlags,
    /// Amount to be sent (atomic units)
    pub amount: i64,
    /// Recipient address
    pub addr: AccountAddress,
}

impl DestinationEntry {
    /// Encoded length of a [DestinationEntry]
    pub const LEN: usize = 76;

    /// Create a new destination entry
    pub fn new(addr: AccountAddress, amount: i64, is_subaddress: bool) -> Self {
        let mut flags = DestinationFlags::empty();
        flags.set(DestinationFlags::SUBADDRESS, is_subaddress);

        Self {
            flags,
            amount,
            addr,
        }
    }

    /// Check whether the destination is a subaddress
    pub fn is_subaddress(&self) -> bool {
        self.flags.contains(DestinationFlags::SUBADDRESS)
    }

    /// Check whether the destination is an integrated address
    pub fn is_integrated(&self) -> bool {
        self.flags.contains(DestinationFlags::INTEGRATED)
    }

    /// Encode to a fixed size array (for hashing)
    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        let mut b = [0u8; Self::LEN];
        b[0] = self.flags.bits();
        LittleEndian::write_i64(&mut b[4..12], self.amount);
        b[12..44].copy_from_slice(&self.addr.spend_public);
        b[44..76].copy_from_slice(&self.addr.view_public);
        b
    }
}

impl Encode for DestinationEntry {
    type Error = ApduError;

    #[inline]
    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        if buff.len() < Self::LEN {
            return Err(ApduError::InvalidLength);
        }

        Ok(put(buff, 0, &self.to_bytes()))
    }

    #[inline]
    fn encode_len(&self) -> Result<usize, ApduError> {
        Ok(Self::LEN)
    }
}

impl DecodeOwned for DestinationEntry {
    type Output = Self;
    type Error = ApduError;

    #[inline]
    fn decode_owned(buff: &[u8]) -> Result<(Self, usize), ApduError> {
        if buff.len() < Self::LEN {
            return Err(ApduError::InvalidLength);
        }

        // Unknown flags are rejected rather than truncated, as these are hmac'd
        let flags = match DestinationFlags::from_bits(buff[0]) {
            Some(f) => f,
            None => return Err(ApduError::InvalidEncoding),
        };

        let d = Self {
            flags,
            amount: LittleEndian::read_i64(&buff[4..12]),
            addr: AccountAddress {
                spend_public: take(buff, 12),
                view_public: take(buff, 44),
            },
        };

        Ok((d, Self::LEN))
    }
}
