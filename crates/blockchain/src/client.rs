use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use shared::{Error, Result};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    account::Account,
    commitment_config::CommitmentConfig,
    hash::Hash,
    pubkey::Pubkey,
    signature::Signature,
    transaction::Transaction,
};
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::rpc::CompressionRpc;
use crate::types::{
    non_empty, CompressedAsset, CompressedProof, CompressedTokenAccount, TokenPoolInfo,
    ValidityProof,
};

/// Light compressed-token program
pub const COMPRESSED_TOKEN_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("cTokenmWW8bLPjZEBAUgYy3zKxQZW6VKi7bqNFEVv3m");

const POOL_SEED: &[u8] = b"pool";

pub const SPL_TOKEN_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA");

pub const TOKEN_2022_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb");

/// Pool indices 0..MAX_TOKEN_POOLS are probed for every mint
pub const MAX_TOKEN_POOLS: u8 = 5;

/// Parse a base58 Solana public key
pub fn parse_pubkey(address: &str) -> Result<Pubkey> {
    Pubkey::from_str(address.trim()).map_err(|e| {
        debug!("Invalid address format: {} - {}", address, e);
        Error::InvalidAddress(format!("Invalid Solana address format: {}", e))
    })
}

/// Token pool PDA for `mint`; index 0 uses the legacy two-seed derivation
pub fn derive_token_pool_pda(mint: &Pubkey, index: u8) -> (Pubkey, u8) {
    if index == 0 {
        Pubkey::find_program_address(&[POOL_SEED, mint.as_ref()], &COMPRESSED_TOKEN_PROGRAM_ID)
    } else {
        Pubkey::find_program_address(
            &[POOL_SEED, mint.as_ref(), &[index]],
            &COMPRESSED_TOKEN_PROGRAM_ID,
        )
    }
}

/// SPL token account amount (bytes 64..72, little endian)
fn spl_token_amount(data: &[u8]) -> u64 {
    data.get(64..72)
        .and_then(|bytes| <[u8; 8]>::try_from(bytes).ok())
        .map(u64::from_le_bytes)
        .unwrap_or(0)
}

/// Pool info for an account fetched at a derived pool address. Accounts not
/// owned by a token program are not pools.
fn token_pool_from_account(
    mint: &Pubkey,
    pool_index: u8,
    token_pool_pda: Pubkey,
    bump: u8,
    account: Account,
) -> Option<TokenPoolInfo> {
    if account.owner != SPL_TOKEN_PROGRAM_ID && account.owner != TOKEN_2022_PROGRAM_ID {
        debug!(
            "Ignoring account {} owned by {}, not a token program",
            token_pool_pda, account.owner
        );
        return None;
    }

    Some(TokenPoolInfo {
        mint: *mint,
        token_pool_pda,
        token_program: account.owner,
        pool_index,
        bump,
        balance: spl_token_amount(&account.data),
    })
}

fn validate_hash(hash: &str) -> Result<String> {
    let bytes = bs58::decode(hash)
        .into_vec()
        .map_err(|e| Error::Indexer(format!("Invalid account hash {}: {}", hash, e)))?;
    if bytes.len() != 32 {
        return Err(Error::Indexer(format!(
            "Account hash {} has {} bytes, expected 32",
            hash,
            bytes.len()
        )));
    }
    Ok(hash.to_string())
}

fn indexer_pubkey(field: &str, value: &str) -> Result<Pubkey> {
    Pubkey::from_str(value)
        .map_err(|e| Error::Indexer(format!("Invalid {} in indexer response: {}", field, e)))
}

// Raw JSON-RPC shapes, validated into domain types below

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct WithContext<T> {
    value: T,
}

/// Indexers disagree on whether u64 values are numbers or strings
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum U64Field {
    Number(u64),
    Text(String),
}

impl U64Field {
    fn value(&self, field: &str) -> Result<u64> {
        match self {
            U64Field::Number(n) => Ok(*n),
            U64Field::Text(s) => s
                .parse()
                .map_err(|e| Error::Indexer(format!("Invalid {} '{}': {}", field, s, e))),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ByteField {
    Bytes(Vec<u8>),
    Base58(String),
}

impl ByteField {
    fn into_bytes(self) -> Result<Vec<u8>> {
        match self {
            ByteField::Bytes(bytes) => Ok(bytes),
            ByteField::Base58(s) => bs58::decode(&s)
                .into_vec()
                .map_err(|e| Error::Indexer(format!("Invalid proof encoding: {}", e))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawTokenAccountList {
    #[serde(default)]
    items: Vec<RawTokenAccount>,
    cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTokenAccount {
    account: RawAccount,
    token_data: RawTokenData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAccount {
    hash: String,
    tree: Option<String>,
    #[serde(default)]
    leaf_index: u32,
    lamports: Option<U64Field>,
}

#[derive(Debug, Deserialize)]
struct RawTokenData {
    mint: String,
    owner: String,
    amount: U64Field,
    delegate: Option<String>,
    #[serde(default)]
    state: String,
}

impl TryFrom<RawTokenAccount> for CompressedTokenAccount {
    type Error = Error;

    fn try_from(raw: RawTokenAccount) -> Result<Self> {
        Ok(Self {
            hash: validate_hash(&raw.account.hash)?,
            tree: raw
                .account
                .tree
                .as_deref()
                .map(|t| indexer_pubkey("tree", t))
                .transpose()?,
            leaf_index: raw.account.leaf_index,
            lamports: raw
                .account
                .lamports
                .as_ref()
                .map(|l| l.value("lamports"))
                .transpose()?
                .unwrap_or(0),
            mint: indexer_pubkey("mint", &raw.token_data.mint)?,
            owner: indexer_pubkey("owner", &raw.token_data.owner)?,
            amount: raw.token_data.amount.value("amount")?,
            delegate: raw
                .token_data
                .delegate
                .as_deref()
                .map(|d| indexer_pubkey("delegate", d))
                .transpose()?,
            state: raw.token_data.state,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawValidityProof {
    compressed_proof: Option<RawCompressedProof>,
    #[serde(default)]
    roots: Vec<String>,
    #[serde(default)]
    root_indices: Vec<u16>,
    #[serde(default)]
    leaf_indices: Vec<u32>,
    #[serde(default)]
    leaves: Vec<String>,
    #[serde(default)]
    merkle_trees: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawCompressedProof {
    a: ByteField,
    b: ByteField,
    c: ByteField,
}

impl TryFrom<RawValidityProof> for ValidityProof {
    type Error = Error;

    fn try_from(raw: RawValidityProof) -> Result<Self> {
        let compressed_proof = raw
            .compressed_proof
            .map(|p| -> Result<CompressedProof> {
                Ok(CompressedProof {
                    a: p.a.into_bytes()?,
                    b: p.b.into_bytes()?,
                    c: p.c.into_bytes()?,
                })
            })
            .transpose()?;

        let merkle_trees = raw
            .merkle_trees
            .iter()
            .map(|t| indexer_pubkey("merkle tree", t))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            compressed_proof,
            roots: raw.roots,
            root_indices: raw.root_indices,
            leaf_indices: raw.leaf_indices,
            leaves: raw.leaves,
            merkle_trees,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawAsset {
    id: String,
    #[serde(default)]
    interface: String,
    content: Option<RawContent>,
    compression: Option<RawCompression>,
    ownership: Option<RawOwnership>,
}

#[derive(Debug, Deserialize)]
struct RawContent {
    json_uri: Option<String>,
    metadata: Option<RawAssetMetadata>,
}

#[derive(Debug, Deserialize)]
struct RawAssetMetadata {
    name: Option<String>,
    symbol: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCompression {
    #[serde(default)]
    compressed: bool,
}

#[derive(Debug, Deserialize)]
struct RawOwnership {
    owner: String,
}

impl TryFrom<RawAsset> for CompressedAsset {
    type Error = Error;

    fn try_from(raw: RawAsset) -> Result<Self> {
        let (json_uri, metadata) = match raw.content {
            Some(content) => (content.json_uri, content.metadata),
            None => (None, None),
        };
        let (name, symbol) = match metadata {
            Some(m) => (m.name, m.symbol),
            None => (None, None),
        };

        Ok(Self {
            id: indexer_pubkey("asset id", &raw.id)?,
            interface: raw.interface,
            compressed: raw.compression.map(|c| c.compressed).unwrap_or(false),
            owner: raw
                .ownership
                .as_ref()
                .and_then(|o| Pubkey::from_str(&o.owner).ok()),
            name: non_empty(name),
            symbol: non_empty(symbol),
            json_uri: non_empty(json_uri),
        })
    }
}

/// Compression RPC client: Photon/DAS JSON-RPC for compressed state, the
/// regular Solana RPC for lamports, blockhashes and submission.
pub struct PhotonClient {
    rpc_client: RpcClient,
    http: Client,
    compression_url: String,
}

impl PhotonClient {
    pub fn new(rpc_url: String, compression_url: String) -> Self {
        info!(
            "Initializing compression client with RPC: {}, indexer: {}",
            rpc_url, compression_url
        );

        Self {
            rpc_client: RpcClient::new_with_commitment(rpc_url, CommitmentConfig::confirmed()),
            http: Client::new(),
            compression_url,
        }
    }

    /// Issue a JSON-RPC call against the compression endpoint
    async fn call<R: DeserializeOwned>(&self, method: &str, params: Value) -> Result<R> {
        debug!("Indexer call: {}", method);

        let body = json!({
            "jsonrpc": "2.0",
            "id": "ledger",
            "method": method,
            "params": params,
        });

        let response = self
            .http
            .post(&self.compression_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Indexer(format!("{} request failed: {}", method, e)))?;

        if !response.status().is_success() {
            return Err(Error::Indexer(format!(
                "{} returned error status: {}",
                method,
                response.status()
            )));
        }

        let parsed: JsonRpcResponse<R> = response
            .json()
            .await
            .map_err(|e| Error::Indexer(format!("Failed to parse {} response: {}", method, e)))?;

        if let Some(err) = parsed.error {
            return Err(Error::Indexer(format!(
                "{} failed ({}): {}",
                method, err.code, err.message
            )));
        }

        parsed
            .result
            .ok_or_else(|| Error::Indexer(format!("{} returned no result", method)))
    }

    /// The underlying Solana RPC client
    pub fn rpc_client(&self) -> &RpcClient {
        &self.rpc_client
    }
}

#[async_trait]
impl CompressionRpc for PhotonClient {
    async fn get_native_balance(&self, owner: &Pubkey) -> Result<u64> {
        debug!("Fetching SOL balance for address: {}", owner);
        self.rpc_client
            .get_balance(owner)
            .await
            .map_err(|e| Error::SolanaRpc(format!("Failed to fetch balance: {}", e)))
    }

    async fn get_compressed_token_accounts_by_owner(
        &self,
        owner: &Pubkey,
        mint: &Pubkey,
    ) -> Result<Vec<CompressedTokenAccount>> {
        debug!("Fetching compressed token accounts of {} for mint {}", owner, mint);

        let mut accounts = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let page: WithContext<RawTokenAccountList> = self
                .call(
                    "getCompressedTokenAccountsByOwner",
                    json!({
                        "owner": owner.to_string(),
                        "mint": mint.to_string(),
                        "cursor": cursor,
                    }),
                )
                .await?;

            let page_len = page.value.items.len();
            for raw in page.value.items {
                accounts.push(CompressedTokenAccount::try_from(raw)?);
            }

            match page.value.cursor {
                Some(next) if page_len > 0 && cursor.as_deref() != Some(next.as_str()) => {
                    cursor = Some(next);
                }
                _ => break,
            }
        }

        debug!("Retrieved {} compressed token accounts", accounts.len());
        Ok(accounts)
    }

    async fn get_asset(&self, id: &Pubkey) -> Result<CompressedAsset> {
        let raw: RawAsset = self.call("getAsset", json!({ "id": id.to_string() })).await?;
        CompressedAsset::try_from(raw)
    }

    async fn get_validity_proof(&self, hashes: &[String]) -> Result<ValidityProof> {
        debug!("Requesting validity proof for {} hashes", hashes.len());

        let proof: WithContext<RawValidityProof> = self
            .call(
                "getValidityProof",
                json!({
                    "hashes": hashes,
                    "newAddressesWithTrees": [],
                }),
            )
            .await?;

        ValidityProof::try_from(proof.value)
    }

    async fn get_token_pool_infos(&self, mint: &Pubkey) -> Result<Vec<TokenPoolInfo>> {
        let derived: Vec<(u8, Pubkey, u8)> = (0..MAX_TOKEN_POOLS)
            .map(|index| {
                let (pda, bump) = derive_token_pool_pda(mint, index);
                (index, pda, bump)
            })
            .collect();
        let addresses: Vec<Pubkey> = derived.iter().map(|(_, pda, _)| *pda).collect();

        let accounts = self
            .rpc_client
            .get_multiple_accounts(&addresses)
            .await
            .map_err(|e| Error::SolanaRpc(format!("Failed to fetch token pools: {}", e)))?;

        let pools: Vec<TokenPoolInfo> = derived
            .into_iter()
            .zip(accounts)
            .filter_map(|((pool_index, token_pool_pda, bump), account)| {
                account.and_then(|account| {
                    token_pool_from_account(mint, pool_index, token_pool_pda, bump, account)
                })
            })
            .collect();

        if pools.is_empty() {
            warn!("No token pool found for mint {}", mint);
            return Err(Error::SolanaRpc(format!("No token pool found for mint {}", mint)));
        }

        debug!("Found {} token pools for mint {}", pools.len(), mint);
        Ok(pools)
    }

    async fn get_latest_blockhash(&self) -> Result<Hash> {
        self.rpc_client
            .get_latest_blockhash()
            .await
            .map_err(|e| Error::SolanaRpc(format!("Failed to get blockhash: {}", e)))
    }

    async fn send_and_confirm_transaction(&self, transaction: &Transaction) -> Result<Signature> {
        info!("Submitting transaction with {} instructions", transaction.message.instructions.len());
        self.rpc_client
            .send_and_confirm_transaction(transaction)
            .await
            .map_err(|e| Error::SolanaRpc(format!("Transaction failed: {}", e)))
    }
}
