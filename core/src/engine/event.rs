// Copyright (c) 2022-2023 The MobileCoin Foundation

use encdec::Decode;

use ledger_proto::{ApduError, ApduStatic};
use ledger_xmr_apdu::prelude::*;

/// [`Engine`][super::Engine] input events, typically decoded from request [APDUs][crate::apdu]
#[derive(Clone, Debug)]
pub enum Event<'a> {
    None,

    /// Stream an output destination, or an offloaded range proof
    TxSetOutput {
        destination: Option<(DestinationEntry, [u8; 32])>,
        rsig: Option<&'a [u8]>,
        offloaded: bool,
    },

    /// Fetch TX info / state
    TxGetInfo,
}

/// Helper for decoding APDUs to events
fn decode_event<'a, T>(buff: &'a [u8]) -> Result<Event<'a>, ApduError>
where
    T: Decode<'a, Error = ApduError>,
    Event<'a>: From<T::Output>,
{
    T::decode(buff).map(|(v, _n)| Event::from(v))
}

impl<'a> Event<'a> {
    /// Parse an incoming APDU to engine event
    #[cfg_attr(feature = "noinline", inline(never))]
    pub fn parse(ins: u8, buff: &'a [u8]) -> Result<Self, ApduError> {
        match ins {
            TxSetOutput::INS => decode_event::<TxSetOutput>(buff),
            TxInfoReq::INS => decode_event::<TxInfoReq>(buff),
            _ => Err(ApduError::InvalidEncoding),
        }
    }
}

impl<'a> From<TxSetOutput<'a>> for Event<'a> {
    fn from(a: TxSetOutput<'a>) -> Self {
        Event::TxSetOutput {
            offloaded: a.is_offloaded(),
            destination: a.destination,
            rsig: a.rsig,
        }
    }
}

impl<'a> From<TxInfoReq> for Event<'a> {
    fn from(_: TxInfoReq) -> Self {
        Event::TxGetInfo
    }
}

#[cfg(test)]
mod test {
    use encdec::Encode;

    use super::*;

    #[test]
    fn parse_set_output() {
        let dst = DestinationEntry::new(
            AccountAddress {
                spend_public: [0x11; 32],
                view_public: [0x22; 32],
            },
            1000,
            true,
        );

        let mut buff = [0u8; 256];
        let n = TxSetOutput::new(dst.clone(), [0x33; 32])
            .encode(&mut buff)
            .unwrap();

        let evt = Event::parse(TxSetOutput::INS, &buff[..n]).unwrap();
        match evt {
            Event::TxSetOutput {
                destination: Some((d, hmac)),
                rsig: None,
                offloaded: false,
            } => {
                assert_eq!(d, dst);
                assert_eq!(hmac, [0x33; 32]);
            }
            _ => panic!("unexpected event: {evt:?}"),
        }

        let proof = [0xab; 40];
        let n = TxSetOutput::offloaded(&proof).encode(&mut buff).unwrap();

        let evt = Event::parse(TxSetOutput::INS, &buff[..n]).unwrap();
        match evt {
            Event::TxSetOutput {
                destination: None,
                rsig: Some(r),
                offloaded: true,
            } => assert_eq!(r, &proof[..]),
            _ => panic!("unexpected event: {evt:?}"),
        }
    }

    #[test]
    fn parse_unknown() {
        assert!(matches!(
            Event::parse(0xff, &[]),
            Err(ApduError::InvalidEncoding)
        ));
        assert!(matches!(
            Event::parse(TxInfoReq::INS, &[]),
            Ok(Event::TxGetInfo)
        ));
    }
}
