// Copyright (c) 2022-2023 The MobileCoin Foundation

use byteorder::{ByteOrder, LittleEndian};
use encdec::{Decode, DecodeOwned, Encode};

use ledger_proto::ApduStatic;

use super::DestinationEntry;
use crate::{
    helpers::{put, take},
    ApduError, Instruction, XMR_APDU_CLA,
};

bitflags::bitflags! {
    /// TxSetOutput request flags
    pub struct SetOutputFlags: u8 {
        /// Second pass for an offloaded range proof batch
        const OFFLOADED = 1 << 0;
        /// Request carries a destination entry and its HMAC
        const HAS_DESTINATION = 1 << 1;
        /// Request carries a serialized range proof
        const HAS_RSIG = 1 << 2;
    }
}

bitflags::bitflags! {
    /// TxSetOutputAck flags
    pub struct SetOutputAckFlags: u8 {
        /// Response carries a deterministic commitment mask
        const HAS_MASK = 1 << 0;
        /// Response carries a serialized range proof
        const HAS_RSIG = 1 << 1;
    }
}

/// Length of the fixed request / response header
const HEADER_LEN: usize = 4;

/// Stream a transaction destination to the wallet, or on the second pass of
/// an offloaded batch, the host-computed range proof for that batch.
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |     FLAGS     |   RESERVED    |           RSIG_LEN            |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// /                          DESTINATION                          /
/// /           (76-byte DestinationEntry, if HAS_DESTINATION)      /
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// /                        DESTINATION_HMAC                       /
/// /                 (32-byte HMAC, if HAS_DESTINATION)            /
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// /                              RSIG                             /
/// /               (RSIG_LEN bytes, if HAS_RSIG)                   /
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Clone, PartialEq, Debug)]
pub struct TxSetOutput<'a> {
    flags: SetOutputFlags,

    /// Destination entry and host-held HMAC (omitted on offloaded follow-ups)
    pub destination: Option<(DestinationEntry, [u8; 32])>,

    /// Serialized range proof (offloaded follow-ups only)
    pub rsig: Option<&'a [u8]>,
}

impl<'a> ApduStatic for TxSetOutput<'a> {
    const CLA: u8 = XMR_APDU_CLA;
    const INS: u8 = Instruction::TxSetOutput as u8;
}

impl<'a> TxSetOutput<'a> {
    /// Create a first-pass request for the provided destination
    pub fn new(destination: DestinationEntry, hmac: [u8; 32]) -> Self {
        Self {
            flags: SetOutputFlags::HAS_DESTINATION,
            destination: Some((destination, hmac)),
            rsig: None,
        }
    }

    /// Create an offloaded follow-up request carrying a range proof
    pub fn offloaded(rsig: &'a [u8]) -> Self {
        Self {
            flags: SetOutputFlags::OFFLOADED | SetOutputFlags::HAS_RSIG,
            destination: None,
            rsig: Some(rsig),
        }
    }

    /// Attach a range proof to an existing request
    pub fn with_rsig(mut self, rsig: &'a [u8]) -> Self {
        self.flags.insert(SetOutputFlags::HAS_RSIG);
        self.rsig = Some(rsig);
        self
    }

    /// Fetch flags
    pub fn flags(&self) -> SetOutputFlags {
        self.flags
    }

    /// Check whether this is an offloaded follow-up
    pub fn is_offloaded(&self) -> bool {
        self.flags.contains(SetOutputFlags::OFFLOADED)
    }
}

impl<'a> Encode for TxSetOutput<'a> {
    type Error = ApduError;

    #[inline]
    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        let n = self.encode_len()?;
        if buff.len() < n {
            return Err(ApduError::InvalidLength);
        }

        let rsig = self.rsig.unwrap_or(&[]);
        if rsig.len() > u16::MAX as usize {
            return Err(ApduError::InvalidLength);
        }

        // Write header
        let mut index = 0;
        buff[index] = self.flags.bits();
        buff[index + 1] = 0;
        LittleEndian::write_u16(&mut buff[index + 2..], rsig.len() as u16);
        index += HEADER_LEN;

        // Write destination and hmac
        if let Some((d, hmac)) = &self.destination {
            index += d.encode(&mut buff[index..])?;
            index = put(buff, index, hmac);
        }

        // Write range proof
        index = put(buff, index, rsig);

        Ok(index)
    }

    #[inline]
    fn encode_len(&self) -> Result<usize, ApduError> {
        let mut n = HEADER_LEN;
        if self.destination.is_some() {
            n += DestinationEntry::LEN + 32;
        }
        n += self.rsig.map(|r| r.len()).unwrap_or(0);
        Ok(n)
    }
}

impl<'a> Decode<'a> for TxSetOutput<'a> {
    type Output = Self;
    type Error = ApduError;

    #[inline]
    fn decode(buff: &'a [u8]) -> Result<(Self, usize), ApduError> {
        // Check header length
        if buff.len() < HEADER_LEN {
            return Err(ApduError::InvalidLength);
        }

        let flags = match SetOutputFlags::from_bits(buff[0]) {
            Some(f) => f,
            None => return Err(ApduError::InvalidEncoding),
        };
        let rsig_len = LittleEndian::read_u16(&buff[2..]) as usize;
        let mut index = HEADER_LEN;

        let destination = match flags.contains(SetOutputFlags::HAS_DESTINATION) {
            true => {
                if buff.len() < index + DestinationEntry::LEN + 32 {
                    return Err(ApduError::InvalidLength);
                }

                let (d, n) = DestinationEntry::decode_owned(&buff[index..])?;
                index += n;

                let hmac = take::<32>(buff, index);
                index += 32;

                Some((d, hmac))
            }
            false => None,
        };

        let rsig = match flags.contains(SetOutputFlags::HAS_RSIG) {
            true => {
                if buff.len() < index + rsig_len {
                    return Err(ApduError::InvalidLength);
                }

                let r = &buff[index..][..rsig_len];
                index += rsig_len;

                Some(r)
            }
            false => None,
        };

        Ok((
            Self {
                flags,
                destination,
                rsig,
            },
            index,
        ))
    }
}

/// Response to a first-pass [TxSetOutput] request.
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |     FLAGS     |   RESERVED    |           RSIG_LEN            |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// /                             TX_OUT                            /
/// /              (34-byte serialized output record)               /
/// |                               |           RESERVED            |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// /                           VOUTI_HMAC                          /
/// /                        (32-byte HMAC)                         /
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// /                             OUT_PK                            /
/// /        (64-byte one-time output key || commitment)            /
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                      ECDH_INFO (8-byte)                       |
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// /                             MASK                              /
/// /                (32-byte Scalar, if HAS_MASK)                  /
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// /                              RSIG                             /
/// /               (RSIG_LEN bytes, if HAS_RSIG)                   /
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Clone, PartialEq, Debug)]
pub struct TxSetOutputAck<'a> {
    /// Serialized output record
    pub tx_out: [u8; 34],
    /// HMAC over destination and output record
    pub vouti_hmac: [u8; 32],
    /// One-time output key and commitment
    pub out_pk: [u8; 64],
    /// Encoded amount
    pub ecdh_info: [u8; 8],
    /// Deterministic mask (offloaded range proofs only)
    pub mask: Option<[u8; 32]>,
    /// Serialized range proof (batch closing outputs only)
    pub rsig: Option<&'a [u8]>,
}

impl<'a> TxSetOutputAck<'a> {
    /// Fixed encoded length (excluding optional fields)
    const FIXED_LEN: usize = HEADER_LEN + 36 + 32 + 64 + 8;

    /// Compute flags from optional fields
    pub fn flags(&self) -> SetOutputAckFlags {
        let mut flags = SetOutputAckFlags::empty();
        flags.set(SetOutputAckFlags::HAS_MASK, self.mask.is_some());
        flags.set(SetOutputAckFlags::HAS_RSIG, self.rsig.is_some());
        flags
    }
}

impl<'a> Encode for TxSetOutputAck<'a> {
    type Error = ApduError;

    #[inline]
    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        let n = self.encode_len()?;
        if buff.len() < n {
            return Err(ApduError::InvalidLength);
        }

        let rsig = self.rsig.unwrap_or(&[]);
        if rsig.len() > u16::MAX as usize {
            return Err(ApduError::InvalidLength);
        }

        // Write header
        buff[0] = self.flags().bits();
        buff[1] = 0;
        LittleEndian::write_u16(&mut buff[2..], rsig.len() as u16);
        let mut index = HEADER_LEN;

        // Write fixed fields
        index = put(buff, index, &self.tx_out);
        index = put(buff, index, &[0u8; 2]);
        index = put(buff, index, &self.vouti_hmac);
        index = put(buff, index, &self.out_pk);
        index = put(buff, index, &self.ecdh_info);

        // Write optional fields
        if let Some(m) = &self.mask {
            index = put(buff, index, m);
        }
        index = put(buff, index, rsig);

        Ok(index)
    }

    #[inline]
    fn encode_len(&self) -> Result<usize, ApduError> {
        let mut n = Self::FIXED_LEN;
        if self.mask.is_some() {
            n += 32;
        }
        n += self.rsig.map(|r| r.len()).unwrap_or(0);
        Ok(n)
    }
}

impl<'a> Decode<'a> for TxSetOutputAck<'a> {
    type Output = Self;
    type Error = ApduError;

    #[inline]
    fn decode(buff: &'a [u8]) -> Result<(Self, usize), ApduError> {
        if buff.len() < Self::FIXED_LEN {
            return Err(ApduError::InvalidLength);
        }

        let flags = match SetOutputAckFlags::from_bits(buff[0]) {
            Some(f) => f,
            None => return Err(ApduError::InvalidEncoding),
        };
        let rsig_len = LittleEndian::read_u16(&buff[2..]) as usize;
        let mut index = HEADER_LEN;

        let tx_out = take::<34>(buff, index);
        index += 36;
        let vouti_hmac = take::<32>(buff, index);
        index += 32;
        let out_pk = take::<64>(buff, index);
        index += 64;
        let ecdh_info = take::<8>(buff, index);
        index += 8;

        let mask = match flags.contains(SetOutputAckFlags::HAS_MASK) {
            true => {
                if buff.len() < index + 32 {
                    return Err(ApduError::InvalidLength);
                }
                let m = take::<32>(buff, index);
                index += 32;
                Some(m)
            }
            false => None,
        };

        let rsig = match flags.contains(SetOutputAckFlags::HAS_RSIG) {
            true => {
                if buff.len() < index + rsig_len {
                    return Err(ApduError::InvalidLength);
                }
                let r = &buff[index..][..rsig_len];
                index += rsig_len;
                Some(r)
            }
            false => None,
        };

        Ok((
            Self {
                tx_out,
                vouti_hmac,
                out_pk,
                ecdh_info,
                mask,
                rsig,
            },
            index,
        ))
    }
}

/// Response to an offloaded follow-up once the provided range proof has
/// been verified (0 length APDU)
#[derive(Clone, PartialEq, Debug, Encode, Decode)]
#[encdec(error = "ApduError")]
pub struct TxSetOutputRsigAck;
