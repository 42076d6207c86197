#![allow(unused)]

use std::sync::{Arc, Mutex};

use curve25519_dalek::{EdwardsPoint, Scalar};
use encdec::{Decode, Encode};
use log::{debug, trace};
use rand_chacha::ChaCha20Rng;
use rand_core::SeedableRng;

use ledger_xmr_core::{
    apdu::{prelude::*, ApduError, ApduStatic},
    engine::{Driver, Engine, Error, Event, Output, SessionConfig, SessionKeys},
    helpers::keccak256,
    xmr::{
        commitment::{gen_commitment, EcdhFormat},
        hmac::dest_hmac,
        rsig::{Bulletproof, BulletproofPlus, RangeProof, RangeProofKind},
    },
};

/// Engine type used in tests
pub type TestEngine = Engine<TestDriver, ChaCha20Rng>;

/// Progress notifications recorded by the [TestDriver]
pub type Steps = Arc<Mutex<Vec<(TxStep, usize, usize)>>>;

/// Driver implementation for test use, with a simulated range prover
#[derive(Clone, Default)]
pub struct TestDriver {
    /// Progress notifications
    pub steps: Steps,
    /// Reject all offloaded proofs
    pub reject_proofs: bool,
}

impl TestDriver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Driver for TestDriver {
    fn transaction_step(&mut self, step: TxStep, index: usize, total: usize) {
        trace!("step {step:?} {index}/{total}");
        self.steps.lock().unwrap().push((step, index, total));
    }

    fn prove_range(
        &mut self,
        kind: RangeProofKind,
        amounts: &[u64],
        masks: &[Scalar],
    ) -> Result<RangeProof, Error> {
        debug!("prove {kind} over {} outputs", amounts.len());
        Ok(simulate_proof(kind, amounts, masks))
    }

    fn verify_range(&self, proof: &RangeProof, amounts: &[u64], masks: &[Scalar]) -> bool {
        !self.reject_proofs && *proof == simulate_proof(proof.kind(), amounts, masks)
    }
}

/// Number of `L` / `R` elements for an aggregate proof over `m` outputs
pub fn rsig_rounds(m: usize) -> usize {
    6 + m.next_power_of_two().trailing_zeros() as usize
}

/// Deterministic stand-in for an aggregate range proof,
/// with elements derived from the batch commitments
pub fn simulate_proof(kind: RangeProofKind, amounts: &[u64], masks: &[Scalar]) -> RangeProof {
    let commitments: Vec<[u8; 32]> = amounts
        .iter()
        .zip(masks.iter())
        .map(|(a, m)| gen_commitment(m, *a).unwrap().compress().to_bytes())
        .collect();

    let mut i = 0u8;
    let mut e = || {
        let n = [i];
        let mut parts: Vec<&[u8]> = Vec::new();
        parts.push(b"rsig");
        parts.push(&n);
        for c in &commitments {
            parts.push(c);
        }
        i += 1;
        keccak256(&parts)
    };

    let rounds = rsig_rounds(amounts.len());

    match kind {
        RangeProofKind::Bulletproof => RangeProof::Bulletproof(Bulletproof {
            A: e(),
            S: e(),
            T1: e(),
            T2: e(),
            taux: e(),
            mu: e(),
            L: (0..rounds).map(|_| e()).collect(),
            R: (0..rounds).map(|_| e()).collect(),
            a: e(),
            b: e(),
            t: e(),
        }),
        RangeProofKind::BulletproofPlus => RangeProof::BulletproofPlus(BulletproofPlus {
            A: e(),
            A1: e(),
            B: e(),
            r1: e(),
            s1: e(),
            d1: e(),
            L: (0..rounds).map(|_| e()).collect(),
            R: (0..rounds).map(|_| e()).collect(),
        }),
    }
}

/// Recipient keys
pub struct Recipient {
    pub view_private: Scalar,
    pub spend_private: Scalar,
    pub addr: AccountAddress,
    pub is_subaddress: bool,
}

impl Recipient {
    /// Generate a standard address
    pub fn random(rng: &mut ChaCha20Rng) -> Self {
        let view_private = Scalar::random(rng);
        let spend_private = Scalar::random(rng);

        Self {
            addr: AccountAddress {
                spend_public: EdwardsPoint::mul_base(&spend_private).compress().to_bytes(),
                view_public: EdwardsPoint::mul_base(&view_private).compress().to_bytes(),
            },
            view_private,
            spend_private,
            is_subaddress: false,
        }
    }

    /// Generate a subaddress, `D = d·G`, `C = a·D`
    pub fn subaddress(rng: &mut ChaCha20Rng) -> Self {
        let view_private = Scalar::random(rng);
        let spend_private = Scalar::random(rng);
        let spend_public = EdwardsPoint::mul_base(&spend_private);

        Self {
            addr: AccountAddress {
                spend_public: spend_public.compress().to_bytes(),
                view_public: (view_private * spend_public).compress().to_bytes(),
            },
            view_private,
            spend_private,
            is_subaddress: true,
        }
    }

    pub fn spend_public(&self) -> EdwardsPoint {
        self.addr_point(&self.addr.spend_public)
    }

    fn addr_point(&self, b: &[u8; 32]) -> EdwardsPoint {
        curve25519_dalek::edwards::CompressedEdwardsY(*b)
            .decompress()
            .unwrap()
    }
}

/// Test transaction builder
pub struct TestTx {
    pub seed: u64,
    pub inputs: usize,
    pub amounts: Vec<i64>,
    pub grouping: Vec<usize>,
    pub kind: RangeProofKind,
    pub offload: bool,
    pub additional_keys: bool,
    pub ecdh_format: EcdhFormat,
    pub subaddress: bool,
    /// Output index sent to the wallet change address
    pub change: Option<usize>,
}

impl Default for TestTx {
    fn default() -> Self {
        Self {
            seed: 1,
            inputs: 2,
            amounts: vec![1000],
            grouping: vec![1],
            kind: RangeProofKind::BulletproofPlus,
            offload: false,
            additional_keys: false,
            ecdh_format: EcdhFormat::Plain,
            subaddress: false,
            change: None,
        }
    }
}

/// Wallet-side transaction context, holding secrets and authenticated destinations
pub struct TestCtx {
    pub key_hmac: [u8; 32],
    pub tx_priv: Scalar,
    pub wallet: Recipient,
    pub recipients: Vec<Recipient>,
    pub destinations: Vec<(DestinationEntry, [u8; 32])>,
    pub vini: Vec<Vec<u8>>,
    pub steps: Steps,
}

impl TestCtx {
    /// Fetch the transaction public key `R`
    pub fn tx_pub(&self) -> EdwardsPoint {
        EdwardsPoint::mul_base(&self.tx_priv)
    }

    /// Build a first-pass set-output event for the provided output
    pub fn output(&self, index: usize) -> Event<'static> {
        let (d, h) = self.destinations[index].clone();

        Event::TxSetOutput {
            destination: Some((d, h)),
            rsig: None,
            offloaded: false,
        }
    }
}

/// Build an offloaded follow-up event
pub fn offloaded(rsig: &[u8]) -> Event {
    Event::TxSetOutput {
        destination: None,
        rsig: Some(rsig),
        offloaded: true,
    }
}

impl TestTx {
    /// Setup an engine and session for the test transaction, recording and
    /// finalising inputs so outputs may be streamed
    pub fn start(&self) -> (TestEngine, TestCtx) {
        let _ = simplelog::SimpleLogger::init(log::LevelFilter::Debug, Default::default());

        let mut rng = ChaCha20Rng::seed_from_u64(self.seed);

        let key_hmac: [u8; 32] = rand::Rng::gen(&mut rng);
        let tx_priv = Scalar::random(&mut rng);
        let wallet = Recipient::random(&mut rng);

        let recipients: Vec<_> = self
            .amounts
            .iter()
            .map(|_| match self.subaddress {
                true => Recipient::subaddress(&mut rng),
                false => Recipient::random(&mut rng),
            })
            .collect();

        // Authenticate destinations
        let destinations = self
            .amounts
            .iter()
            .enumerate()
            .map(|(i, a)| {
                let (addr, sub) = match self.change == Some(i) {
                    true => (wallet.addr, false),
                    false => (recipients[i].addr, recipients[i].is_subaddress),
                };
                let d = DestinationEntry::new(addr, *a, sub);
                let h = dest_hmac(&key_hmac, &d, i).unwrap();
                (d, h)
            })
            .collect();

        let config = SessionConfig::new(
            self.inputs,
            self.amounts.len(),
            self.kind,
            self.offload,
            &self.grouping,
        )
        .unwrap()
        .with_additional_txkeys(self.additional_keys)
        .with_ecdh_format(self.ecdh_format);

        let keys = SessionKeys::new(key_hmac, tx_priv, wallet.view_private)
            .with_change_address(wallet.addr);

        let drv = TestDriver::new();
        let steps = drv.steps.clone();

        let mut e = Engine::new_with_rng(drv, ChaCha20Rng::seed_from_u64(self.seed + 1));
        e.begin(config, keys);

        let vini: Vec<Vec<u8>> = (0..self.inputs).map(|i| vec![0x02, i as u8]).collect();
        for v in &vini {
            e.record_input(v, &Scalar::random(&mut rng)).unwrap();
        }
        e.finish_inputs().unwrap();

        let ctx = TestCtx {
            key_hmac,
            tx_priv,
            wallet,
            recipients,
            destinations,
            vini,
            steps,
        };

        (e, ctx)
    }
}

/// Fields of a processed output
#[derive(Clone, Debug)]
pub struct TxOutput {
    pub tx_out: [u8; 34],
    pub vouti_hmac: [u8; 32],
    pub out_pk: [u8; 64],
    pub ecdh_info: [u8; 8],
    pub mask: Option<[u8; 32]>,
    pub rsig: Option<Vec<u8>>,
}

/// Unpack a processed output
pub fn tx_output(o: Output) -> TxOutput {
    match o {
        Output::TxOutput {
            tx_out,
            vouti_hmac,
            out_pk,
            ecdh_info,
            mask,
            rsig,
        } => TxOutput {
            tx_out,
            vouti_hmac,
            out_pk,
            ecdh_info,
            mask,
            rsig,
        },
        _ => panic!("unexpected output: {o:?}"),
    }
}

/// Exchange an APDU with the engine, returning the encoded response length
pub fn exchange<REQ: Encode<Error = ApduError> + ApduStatic>(
    e: &mut TestEngine,
    req: &REQ,
    buff: &mut [u8],
) -> Result<usize, Error> {
    let mut req_buff = [0u8; 1024];
    let n = req.encode(&mut req_buff).unwrap();

    trace!("encoded: {:02x?}", &req_buff[..n]);

    let evt = Event::parse(REQ::INS, &req_buff[..n]).unwrap();
    let r = e.update(&evt)?;

    Ok(r.encode(buff).unwrap())
}
