// Shared mock collaborators for ledger integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use blockchain::{
    CompressedAsset, CompressedProof, CompressedTokenAccount, CompressionRpc, KeypairWallet,
    MetadataFetcher, OffChainMetadata, TokenPoolInfo, TransferBuilder, TransferParams,
    ValidityProof, COMPRESSED_TOKEN_PROGRAM_ID, SPL_TOKEN_PROGRAM_ID,
};
use ledger::{InMemoryMintStore, LedgerDeps, LedgerSettings, MintStore, TokenLedgerClient};
use shared::{Error, Result};
use solana_sdk::{
    hash::Hash,
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::Transaction,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn token_account(mint: &Pubkey, owner: &Pubkey, amount: u64) -> CompressedTokenAccount {
    CompressedTokenAccount {
        hash: bs58::encode(Pubkey::new_unique().to_bytes()).into_string(),
        tree: Some(Pubkey::new_unique()),
        leaf_index: 0,
        lamports: 0,
        mint: *mint,
        owner: *owner,
        amount,
        delegate: None,
        state: "initialized".to_string(),
    }
}

pub fn fungible_asset(mint: &Pubkey, name: &str, symbol: &str, uri: Option<&str>) -> CompressedAsset {
    CompressedAsset {
        id: *mint,
        interface: "FungibleToken".to_string(),
        compressed: false,
        owner: None,
        name: Some(name.to_string()),
        symbol: Some(symbol.to_string()),
        json_uri: uri.map(str::to_string),
    }
}

pub fn compressed_nft(mint: &Pubkey, owner: &Pubkey, name: &str) -> CompressedAsset {
    CompressedAsset {
        id: *mint,
        interface: "V1_NFT".to_string(),
        compressed: true,
        owner: Some(*owner),
        name: Some(name.to_string()),
        symbol: Some("CNFT".to_string()),
        json_uri: Some("https://example.com/nft.json".to_string()),
    }
}

#[derive(Default)]
pub struct MockRpc {
    pub accounts: Mutex<Vec<CompressedTokenAccount>>,
    /// Per-call (delay, accounts) overrides, consumed in order
    pub scripted_accounts: Mutex<VecDeque<(Duration, Vec<CompressedTokenAccount>)>>,
    pub asset: Mutex<Option<CompressedAsset>>,
    pub native_lamports: Mutex<u64>,
    pub fail_account_lookup: Mutex<bool>,
    pub fail_submission: Mutex<bool>,
    pub submitted: Mutex<Vec<Transaction>>,
    pub native_lookups: AtomicUsize,
    pub account_lookups: AtomicUsize,
    pub asset_lookups: AtomicUsize,
    pub proof_requests: AtomicUsize,
    pub pool_requests: AtomicUsize,
    pub blockhash_requests: AtomicUsize,
    pub submissions: AtomicUsize,
}

impl MockRpc {
    pub fn total_calls(&self) -> usize {
        self.native_lookups.load(Ordering::SeqCst)
            + self.account_lookups.load(Ordering::SeqCst)
            + self.asset_lookups.load(Ordering::SeqCst)
            + self.proof_requests.load(Ordering::SeqCst)
            + self.pool_requests.load(Ordering::SeqCst)
            + self.blockhash_requests.load(Ordering::SeqCst)
            + self.submissions.load(Ordering::SeqCst)
    }

    pub fn set_accounts(&self, accounts: Vec<CompressedTokenAccount>) {
        *self.accounts.lock().unwrap() = accounts;
    }

    pub fn set_asset(&self, asset: Option<CompressedAsset>) {
        *self.asset.lock().unwrap() = asset;
    }
}

#[async_trait]
impl CompressionRpc for MockRpc {
    async fn get_native_balance(&self, _owner: &Pubkey) -> Result<u64> {
        self.native_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(*self.native_lamports.lock().unwrap())
    }

    async fn get_compressed_token_accounts_by_owner(
        &self,
        _owner: &Pubkey,
        _mint: &Pubkey,
    ) -> Result<Vec<CompressedTokenAccount>> {
        self.account_lookups.fetch_add(1, Ordering::SeqCst);

        let scripted = self.scripted_accounts.lock().unwrap().pop_front();
        if let Some((delay, accounts)) = scripted {
            tokio::time::sleep(delay).await;
            return Ok(accounts);
        }

        if *self.fail_account_lookup.lock().unwrap() {
            return Err(Error::Indexer("indexer unavailable".to_string()));
        }
        Ok(self.accounts.lock().unwrap().clone())
    }

    async fn get_asset(&self, id: &Pubkey) -> Result<CompressedAsset> {
        self.asset_lookups.fetch_add(1, Ordering::SeqCst);
        self.asset
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| Error::Indexer(format!("Asset {} not found", id)))
    }

    async fn get_validity_proof(&self, hashes: &[String]) -> Result<ValidityProof> {
        self.proof_requests.fetch_add(1, Ordering::SeqCst);
        Ok(ValidityProof {
            compressed_proof: Some(CompressedProof {
                a: vec![1; 32],
                b: vec![2; 64],
                c: vec![3; 32],
            }),
            roots: hashes.to_vec(),
            root_indices: hashes.iter().map(|_| 7).collect(),
            leaf_indices: (0..hashes.len() as u32).collect(),
            leaves: hashes.to_vec(),
            merkle_trees: hashes.iter().map(|_| Pubkey::new_unique()).collect(),
        })
    }

    async fn get_token_pool_infos(&self, mint: &Pubkey) -> Result<Vec<TokenPoolInfo>> {
        self.pool_requests.fetch_add(1, Ordering::SeqCst);
        let (token_pool_pda, bump) = blockchain::derive_token_pool_pda(mint, 0);
        Ok(vec![TokenPoolInfo {
            mint: *mint,
            token_pool_pda,
            token_program: SPL_TOKEN_PROGRAM_ID,
            pool_index: 0,
            bump,
            balance: 1_000_000,
        }])
    }

    async fn get_latest_blockhash(&self) -> Result<Hash> {
        self.blockhash_requests.fetch_add(1, Ordering::SeqCst);
        Ok(Hash::new_unique())
    }

    async fn send_and_confirm_transaction(&self, transaction: &Transaction) -> Result<Signature> {
        self.submissions.fetch_add(1, Ordering::SeqCst);
        if *self.fail_submission.lock().unwrap() {
            return Err(Error::SolanaRpc("Transaction failed: blockhash expired".to_string()));
        }
        self.submitted.lock().unwrap().push(transaction.clone());
        Ok(transaction.signatures[0])
    }
}

#[derive(Default)]
pub struct MockBuilder {
    pub builds: AtomicUsize,
    pub last_params: Mutex<Option<TransferParams>>,
}

#[async_trait]
impl TransferBuilder for MockBuilder {
    async fn build_transfer_instruction(&self, params: &TransferParams) -> Result<Instruction> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        *self.last_params.lock().unwrap() = Some(params.clone());
        Ok(Instruction::new_with_bytes(
            COMPRESSED_TOKEN_PROGRAM_ID,
            &params.amount.to_le_bytes(),
            vec![
                AccountMeta::new(params.owner, true),
                AccountMeta::new_readonly(params.to_address, false),
            ],
        ))
    }
}

#[derive(Default)]
pub struct MockMetadata {
    /// `None` simulates a network error
    pub document: Mutex<Option<OffChainMetadata>>,
    pub fetches: AtomicUsize,
}

#[async_trait]
impl MetadataFetcher for MockMetadata {
    async fn fetch(&self, uri: &str) -> Result<OffChainMetadata> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.document
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| Error::ExternalService(format!("network error fetching {}", uri)))
    }
}

pub struct Harness {
    pub client: TokenLedgerClient,
    pub rpc: Arc<MockRpc>,
    pub builder: Arc<MockBuilder>,
    pub metadata: Arc<MockMetadata>,
    pub store: Arc<InMemoryMintStore>,
    pub owner: Pubkey,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_store(InMemoryMintStore::new()).await
    }

    pub async fn with_store(store: InMemoryMintStore) -> Self {
        let rpc = Arc::new(MockRpc::default());
        let builder = Arc::new(MockBuilder::default());
        let metadata = Arc::new(MockMetadata::default());
        let store = Arc::new(store);

        let keypair = Keypair::new();
        let owner = keypair.pubkey();
        let wallet = Arc::new(KeypairWallet::new(keypair));

        let deps = LedgerDeps {
            rpc: rpc.clone(),
            builder: builder.clone(),
            wallet,
            metadata: metadata.clone(),
            store: store.clone() as Arc<dyn MintStore>,
        };
        let client = TokenLedgerClient::load(deps, LedgerSettings::default()).await;

        Self {
            client,
            rpc,
            builder,
            metadata,
            store,
            owner,
        }
    }

    pub fn owner_key(&self) -> String {
        self.owner.to_string()
    }
}
