use serde::Serialize;
use shared::{MintBalanceRecord, TrackedMint};
use tokio::sync::broadcast;
use tracing::debug;

use crate::client::TransferDraft;

/// Severity of a user-facing notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Transient message for the presentation layer (a toast)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub description: Option<String>,
}

/// State changes published by the ledger client
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEvent {
    TrackedMintsChanged {
        mints: Vec<TrackedMint>,
    },
    SelectionChanged {
        selected: Option<String>,
    },
    RecordUpdated {
        mint: String,
        record: MintBalanceRecord,
    },
    RecordRemoved {
        mint: String,
    },
    NativeBalanceUpdated {
        lamports: Option<u64>,
    },
    DraftChanged {
        draft: TransferDraft,
    },
    SendStatusChanged {
        sending: bool,
    },
    TransferConfirmed {
        mint: String,
        recipient: String,
        amount: u64,
        signature: String,
    },
    Notice(Notice),
}

/// Fan-out of ledger events to any number of subscribers
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<LedgerEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: LedgerEvent) {
        // No subscribers is normal for headless use
        if let Err(e) = self.tx.send(event) {
            debug!("Ledger event dropped: {}", e);
        }
    }

    pub fn notify(&self, level: NoticeLevel, title: &str, description: Option<String>) {
        self.publish(LedgerEvent::Notice(Notice {
            level,
            title: title.to_string(),
            description,
        }));
    }
}
