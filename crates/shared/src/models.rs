use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Tracked mint models
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedMint {
    pub address: String,
}

impl TrackedMint {
    pub fn new(address: impl Into<String>) -> Self {
        Self { address: address.into() }
    }

    /// Short form used in lists, e.g. `So1111...111112`
    pub fn abbreviated(&self) -> String {
        let chars: Vec<char> = self.address.chars().collect();
        if chars.len() <= 12 {
            return self.address.clone();
        }
        let head: String = chars[..6].iter().collect();
        let tail: String = chars[chars.len() - 6..].iter().collect();
        format!("{}...{}", head, tail)
    }
}

// Token metadata models
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub uri: Option<String>,
    pub image: Option<String>,
    pub description: Option<String>,
}

// Balance record models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Idle,
    Loading,
    Ready,
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintBalanceRecord {
    pub balance: Option<u64>,
    pub metadata: Option<TokenMetadata>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl MintBalanceRecord {
    pub fn loading() -> Self {
        Self {
            is_loading: true,
            updated_at: Some(Utc::now()),
            ..Default::default()
        }
    }

    pub fn ready(balance: u64, metadata: Option<TokenMetadata>) -> Self {
        Self {
            balance: Some(balance),
            metadata,
            is_loading: false,
            error: None,
            updated_at: Some(Utc::now()),
        }
    }

    /// A failure clears whatever balance and metadata were known before.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            balance: None,
            metadata: None,
            is_loading: false,
            error: Some(error.into()),
            updated_at: Some(Utc::now()),
        }
    }

    pub fn status(&self) -> RecordStatus {
        if self.is_loading {
            RecordStatus::Loading
        } else if self.error.is_some() {
            RecordStatus::Failed
        } else if self.balance.is_some() {
            RecordStatus::Ready
        } else {
            RecordStatus::Idle
        }
    }
}

/// Lamports per SOL
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}
