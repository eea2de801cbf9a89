use async_trait::async_trait;
use shared::Result;
use solana_sdk::{hash::Hash, pubkey::Pubkey, signature::Signature, transaction::Transaction};

use crate::types::{CompressedAsset, CompressedTokenAccount, TokenPoolInfo, ValidityProof};

/// Chain and compression-indexer queries used by the ledger client
#[async_trait]
pub trait CompressionRpc: Send + Sync {
    /// Native balance in lamports
    async fn get_native_balance(&self, owner: &Pubkey) -> Result<u64>;

    /// All compressed token accounts of `owner` for `mint`
    async fn get_compressed_token_accounts_by_owner(
        &self,
        owner: &Pubkey,
        mint: &Pubkey,
    ) -> Result<Vec<CompressedTokenAccount>>;

    /// Digital asset descriptor for `id`
    async fn get_asset(&self, id: &Pubkey) -> Result<CompressedAsset>;

    async fn get_validity_proof(&self, hashes: &[String]) -> Result<ValidityProof>;

    async fn get_token_pool_infos(&self, mint: &Pubkey) -> Result<Vec<TokenPoolInfo>>;

    async fn get_latest_blockhash(&self) -> Result<Hash>;

    async fn send_and_confirm_transaction(&self, transaction: &Transaction) -> Result<Signature>;
}
