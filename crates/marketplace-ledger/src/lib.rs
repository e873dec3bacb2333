//! Transaction Builder capability (spec section 4.1, C1).
//!
//! Ledger-specific transaction encoding is explicitly out of scope (spec
//! section 1); this crate supplies the abstract `TransactionBuilder` trait
//! and `MemoryLedger`, an in-memory reference implementation standing in for
//! a real JSON-RPC chain. Every downstream crate (facilitator client, x402
//! client) depends only on the trait.

pub mod rpc_client;

use dashmap::DashMap;
use marketplace_types::UnixTimestamp;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

pub use rpc_client::{RpcLedgerClient, RpcLedgerError};

/// An unsigned transfer instruction, base64-encoded for transport over the
/// x402 payment payload (spec section 4.1: "emit a single token-transfer
/// instruction").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnsignedTransaction {
    pub payer: String,
    pub recipient: String,
    pub token_mint: String,
    pub minor_units: u64,
    pub network: String,
    pub recent_blockhash: String,
    pub encoded: String,
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("recipient token account missing for {0}")]
    RecipientAccountMissing(String),
    #[error("insufficient balance: payer {payer} holds less than {required} minor units")]
    InsufficientBalance { payer: String, required: u64 },
    #[error("ledger RPC unavailable: {0}")]
    RpcUnavailable(String),
}

/// Constructs unsigned transfer transactions for a target ledger (spec
/// section 4.1, C1). Implementors resolve token accounts, attach a recent
/// blockhash, and emit a single transfer instruction.
pub trait TransactionBuilder: Send + Sync {
    type Error: Debug + Display;

    fn build_transfer(
        &self,
        payer_pubkey: &str,
        recipient_pubkey: &str,
        token_mint: &str,
        minor_units: u64,
        network: &str,
    ) -> impl Future<Output = Result<UnsignedTransaction, Self::Error>> + Send;

    /// Confirms a settled transfer by signature, used by the provider's
    /// payment-gated endpoint to check a presented proof (spec section 4.6,
    /// step 2: "transaction exists, is finalized, transfers >= expected
    /// amount to expected recipient in expected token").
    fn confirm_transfer(
        &self,
        signature: &str,
        expected_recipient: &str,
        expected_minor_units: u64,
        expected_token_mint: &str,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// Records a signature as settled so a later `confirm_transfer` call
    /// (possibly against a different process, via [`RpcLedgerClient`]) can
    /// see it. Called by the x402 client right after a successful
    /// facilitator settlement (spec section 4.3).
    fn record_settlement(
        &self,
        signature: &str,
        recipient: &str,
        minor_units: u64,
        token_mint: &str,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

#[derive(Debug, Clone, PartialEq)]
struct Account {
    balance_minor: u64,
}

#[derive(Debug, Clone, PartialEq)]
struct SettledTransfer {
    recipient: String,
    minor_units: u64,
    token_mint: String,
}

/// An in-memory reference ledger. Accounts are seeded with a generous
/// balance so `InsufficientBalance` is reachable only when explicitly
/// provisioned via [`MemoryLedger::set_balance`] in tests.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    accounts: DashMap<String, Account>,
    settled: DashMap<String, SettledTransfer>,
    blockhash_counter: AtomicU64,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_balance(&self, pubkey: &str, minor_units: u64) {
        self.accounts.insert(
            pubkey.to_string(),
            Account {
                balance_minor: minor_units,
            },
        );
    }

    pub fn balance_of(&self, pubkey: &str) -> u64 {
        self.accounts
            .get(pubkey)
            .map(|a| a.balance_minor)
            .unwrap_or(u64::MAX)
    }

    fn next_blockhash(&self) -> String {
        let n = self.blockhash_counter.fetch_add(1, Ordering::Relaxed);
        format!("blockhash-{n}")
    }
}

impl TransactionBuilder for MemoryLedger {
    type Error = LedgerError;

    async fn build_transfer(
        &self,
        payer_pubkey: &str,
        recipient_pubkey: &str,
        token_mint: &str,
        minor_units: u64,
        network: &str,
    ) -> Result<UnsignedTransaction, Self::Error> {
        if recipient_pubkey.trim().is_empty() {
            return Err(LedgerError::RecipientAccountMissing(
                recipient_pubkey.to_string(),
            ));
        }
        // Best-effort pre-check (spec section 4.1): accounts never
        // explicitly seeded are treated as having ample balance.
        if let Some(account) = self.accounts.get(payer_pubkey) {
            if account.balance_minor < minor_units {
                return Err(LedgerError::InsufficientBalance {
                    payer: payer_pubkey.to_string(),
                    required: minor_units,
                });
            }
        }

        let blockhash = self.next_blockhash();
        let raw = format!(
            "{payer_pubkey}|{recipient_pubkey}|{token_mint}|{minor_units}|{network}|{blockhash}"
        );
        let encoded = marketplace_types::Base64Bytes::encode(raw.as_bytes()).to_string();

        Ok(UnsignedTransaction {
            payer: payer_pubkey.to_string(),
            recipient: recipient_pubkey.to_string(),
            token_mint: token_mint.to_string(),
            minor_units,
            network: network.to_string(),
            recent_blockhash: blockhash,
            encoded,
        })
    }

    async fn confirm_transfer(
        &self,
        signature: &str,
        expected_recipient: &str,
        expected_minor_units: u64,
        expected_token_mint: &str,
    ) -> Result<bool, Self::Error> {
        let Some(transfer) = self.settled.get(signature) else {
            return Ok(false);
        };
        Ok(transfer.recipient == expected_recipient
            && transfer.minor_units >= expected_minor_units
            && transfer.token_mint == expected_token_mint)
    }

    async fn record_settlement(
        &self,
        signature: &str,
        recipient: &str,
        minor_units: u64,
        token_mint: &str,
    ) -> Result<(), Self::Error> {
        self.settled.insert(
            signature.to_string(),
            SettledTransfer {
                recipient: recipient.to_string(),
                minor_units,
                token_mint: token_mint.to_string(),
            },
        );
        Ok(())
    }
}

/// Marks a timestamp as within a ledger's finality window, used by replay
/// caches to size their TTL (spec section 4.6: "TTL >= the ledger's
/// finality window").
pub fn is_within_finality_window(settled_at: UnixTimestamp, now: UnixTimestamp, window_secs: u64) -> bool {
    now.seconds_since_epoch().saturating_sub(settled_at.seconds_since_epoch()) <= window_secs
}
