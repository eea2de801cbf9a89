pub mod client;
pub mod metadata;
pub mod rpc;
pub mod selection;
pub mod transfer;
pub mod types;
pub mod wallet;

pub use client::{
    derive_token_pool_pda, parse_pubkey, PhotonClient, COMPRESSED_TOKEN_PROGRAM_ID,
    SPL_TOKEN_PROGRAM_ID, TOKEN_2022_PROGRAM_ID,
};
pub use metadata::{HttpMetadataFetcher, MetadataFetcher};
pub use rpc::CompressionRpc;
pub use selection::{select_min_accounts_for_transfer, MAX_INPUT_ACCOUNTS};
pub use transfer::TransferBuilder;
pub use types::*;
pub use wallet::{KeypairWallet, WalletSigner};
