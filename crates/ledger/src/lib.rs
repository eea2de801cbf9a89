//! Compressed-token ledger client
//!
//! Tracks a persisted list of mint addresses, keeps per-mint compressed
//! balances and metadata for the connected owner, and submits compressed
//! token transfers. State changes are published as [`LedgerEvent`]s.

pub mod client;
pub mod events;
pub mod logging;
pub mod store;

pub use client::{LedgerDeps, LedgerSettings, TokenLedgerClient, TransferDraft};
pub use events::{LedgerEvent, Notice, NoticeLevel};
pub use store::{InMemoryMintStore, JsonFileMintStore, MintStore, SAVED_MINTS_KEY};
