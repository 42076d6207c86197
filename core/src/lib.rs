// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Monero hardware wallet core
//!
//! This provides a common [Engine][engine] supporting the output streaming
//! step of Monero transaction signing for execution on hardware wallets.
//!
//! Interactions with the [Engine][engine] are performed via [Event][engine::Event]s and [Output][engine::Output]s,
//! see [ledger_xmr_apdu] for APDU objects and wire encodings.
//!
//! ## Operations
//!
//! A signing [Session][engine::Session] is bootstrapped by the caller with the
//! per-transaction [configuration][engine::SessionConfig] and
//! [secrets][engine::SessionKeys], then inputs are recorded before outputs
//! may be streamed.
//!
//! ### Streaming outputs
//!
//! 1. Issue [`TxSetOutput`][ledger_xmr_apdu::tx::TxSetOutput] for each destination in
//!    output index order, carrying the destination entry and the HMAC issued by the
//!    wallet during session setup. The wallet responds with a
//!    [`TxSetOutputAck`][ledger_xmr_apdu::tx::TxSetOutputAck] containing the serialized
//!    output, its HMAC, the output keys and encoded amount, and where applicable the
//!    range proof for a completed batch.
//! 2. Where range proofs are offloaded, the ack for each output contains the
//!    deterministic commitment mask. Once a batch is closed the host computes the
//!    proof and issues an offloaded [`TxSetOutput`][ledger_xmr_apdu::tx::TxSetOutput]
//!    containing the proof, which is verified and hashed by the wallet before
//!    acknowledging with [`TxSetOutputRsigAck`][ledger_xmr_apdu::tx::TxSetOutputRsigAck].
//! 3. [`TxInfoReq`][ledger_xmr_apdu::tx::TxInfoReq] may be issued at any point to fetch
//!    the engine state, last completed step and current output index.
//!
//! Any error aborts the session, all transaction state is discarded.
//!

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub use ledger_xmr_apdu::{self as apdu};

pub mod engine;

pub mod helpers;

pub mod xmr;
