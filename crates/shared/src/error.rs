use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Mint address cannot be empty")]
    EmptyAddress,

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Mint address already tracked: {0}")]
    AlreadyTracked(String),

    #[error("Mint address not tracked: {0}")]
    NotTracked(String),

    #[error("Owner unavailable: {0}")]
    OwnerUnavailable(String),

    #[error("No mint selected")]
    NoMintSelected,

    #[error("Recipient address is required")]
    MissingRecipient,

    #[error("Invalid recipient address: {0}")]
    InvalidRecipient(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("No balance record for mint: {0}")]
    NoBalanceRecord(String),

    #[error("Balance unknown for mint: {0}")]
    BalanceUnknown(String),

    #[error("Insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: u64, available: u64 },

    #[error("No compressed token accounts found for mint: {0}")]
    NoAccounts(String),

    #[error("Solana RPC error: {0}")]
    SolanaRpc(String),

    #[error("Compression indexer error: {0}")]
    Indexer(String),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Wallet not connected")]
    WalletDisconnected,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Input validation failures, reported before any network call is made.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::EmptyAddress
                | Error::InvalidAddress(_)
                | Error::AlreadyTracked(_)
                | Error::NotTracked(_)
                | Error::OwnerUnavailable(_)
                | Error::NoMintSelected
                | Error::MissingRecipient
                | Error::InvalidRecipient(_)
                | Error::InvalidAmount(_)
                | Error::NoBalanceRecord(_)
                | Error::BalanceUnknown(_)
                | Error::InsufficientBalance { .. }
                | Error::Validation(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
