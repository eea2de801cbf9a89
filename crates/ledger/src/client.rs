use blockchain::{
    parse_pubkey, CompressionRpc, MetadataFetcher, TransferBuilder, TransferParams, WalletSigner,
};
use serde::Serialize;
use shared::config::Config;
use shared::models::lamports_to_sol;
use shared::{Error, MintBalanceRecord, Result, TokenMetadata, TrackedMint};
use solana_sdk::{
    compute_budget::ComputeBudgetInstruction,
    message::Message,
    pubkey::Pubkey,
    signature::Signature,
    transaction::Transaction,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::events::{EventBus, LedgerEvent, NoticeLevel};
use crate::store::{load_tracked_mints, save_tracked_mints, MintStore};

/// External collaborators of the ledger client
#[derive(Clone)]
pub struct LedgerDeps {
    pub rpc: Arc<dyn CompressionRpc>,
    pub builder: Arc<dyn TransferBuilder>,
    pub wallet: Arc<dyn WalletSigner>,
    pub metadata: Arc<dyn MetadataFetcher>,
    pub store: Arc<dyn MintStore>,
}

#[derive(Debug, Clone)]
pub struct LedgerSettings {
    pub compute_unit_limit: u32,
    pub event_capacity: usize,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            compute_unit_limit: 300_000,
            event_capacity: 100,
        }
    }
}

impl LedgerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            compute_unit_limit: config.transfer.compute_unit_limit,
            event_capacity: config.events.channel_capacity,
        }
    }
}

/// Pending send inputs, kept as typed by the user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransferDraft {
    pub recipient: String,
    pub amount: String,
}

/// A transfer that passed every precondition
#[derive(Debug)]
struct ValidatedTransfer {
    mint: String,
    mint_key: Pubkey,
    owner: Pubkey,
    recipient: Pubkey,
    amount: u64,
}

/// Owns the tracked mint list, per-mint balance records and the transfer
/// pipeline for one wallet session.
pub struct TokenLedgerClient {
    deps: LedgerDeps,
    settings: LedgerSettings,
    tracked: RwLock<Vec<TrackedMint>>,
    selected: RwLock<Option<String>>,
    records: RwLock<HashMap<String, MintBalanceRecord>>,
    /// Source of refresh ids; never reset, so ids are never reused
    next_request_id: AtomicU64,
    /// Latest issued refresh id per mint; only that response is committed
    request_seq: Mutex<HashMap<String, u64>>,
    native_balance: RwLock<Option<u64>>,
    draft: RwLock<TransferDraft>,
    sending: AtomicBool,
    events: EventBus,
}

impl TokenLedgerClient {
    /// Build a client, restoring the persisted mint list and selecting its
    /// first entry.
    pub async fn load(deps: LedgerDeps, settings: LedgerSettings) -> Self {
        let tracked = load_tracked_mints(deps.store.as_ref()).await;
        let selected = tracked.first().map(|m| m.address.clone());

        info!("Ledger client loaded with {} tracked mints", tracked.len());

        Self {
            events: EventBus::new(settings.event_capacity),
            deps,
            settings,
            tracked: RwLock::new(tracked),
            selected: RwLock::new(selected),
            records: RwLock::new(HashMap::new()),
            next_request_id: AtomicU64::new(0),
            request_seq: Mutex::new(HashMap::new()),
            native_balance: RwLock::new(None),
            draft: RwLock::new(TransferDraft::default()),
            sending: AtomicBool::new(false),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.events.subscribe()
    }

    pub async fn tracked_mints(&self) -> Vec<TrackedMint> {
        self.tracked.read().await.clone()
    }

    pub async fn selected_mint(&self) -> Option<String> {
        self.selected.read().await.clone()
    }

    pub async fn record(&self, mint: &str) -> Option<MintBalanceRecord> {
        self.records.read().await.get(mint).cloned()
    }

    pub async fn records(&self) -> HashMap<String, MintBalanceRecord> {
        self.records.read().await.clone()
    }

    pub async fn native_balance(&self) -> Option<u64> {
        *self.native_balance.read().await
    }

    pub async fn native_balance_sol(&self) -> Option<f64> {
        self.native_balance().await.map(lamports_to_sol)
    }

    pub async fn draft(&self) -> TransferDraft {
        self.draft.read().await.clone()
    }

    pub fn is_sending(&self) -> bool {
        self.sending.load(Ordering::SeqCst)
    }

    /// Base58 key of the connected wallet, if any
    pub async fn connected_owner(&self) -> Option<String> {
        self.deps.wallet.public_key().await.map(|pk| pk.to_string())
    }

    /// Start tracking `address` and select it.
    pub async fn add_mint(&self, address: &str) -> Result<TrackedMint> {
        let address = address.trim();

        if address.is_empty() {
            self.events
                .notify(NoticeLevel::Warning, "Mint address cannot be empty.", None);
            return Err(Error::EmptyAddress);
        }

        if let Err(e) = parse_pubkey(address) {
            self.events
                .notify(NoticeLevel::Error, "Invalid mint address format.", None);
            return Err(e);
        }

        let mint = TrackedMint::new(address);
        let snapshot = {
            let mut tracked = self.tracked.write().await;
            if tracked.contains(&mint) {
                drop(tracked);
                self.events
                    .notify(NoticeLevel::Info, "Mint address already saved.", None);
                return Err(Error::AlreadyTracked(address.to_string()));
            }
            tracked.push(mint.clone());
            tracked.clone()
        };

        *self.selected.write().await = Some(mint.address.clone());

        save_tracked_mints(self.deps.store.as_ref(), &snapshot).await;
        info!("Tracking mint {}", mint.address);

        self.events
            .publish(LedgerEvent::TrackedMintsChanged { mints: snapshot });
        self.events.publish(LedgerEvent::SelectionChanged {
            selected: Some(mint.address.clone()),
        });
        self.events
            .notify(NoticeLevel::Success, "Mint address added!", None);

        Ok(mint)
    }

    /// Stop tracking `address`. Returns false when it was not tracked.
    pub async fn remove_mint(&self, address: &str) -> bool {
        let snapshot = {
            let mut tracked = self.tracked.write().await;
            let before = tracked.len();
            tracked.retain(|m| m.address != address);
            if tracked.len() == before {
                return false;
            }
            tracked.clone()
        };

        self.records.write().await.remove(address);
        // Responses still in flight for this mint must not resurrect a record
        self.request_seq.lock().await.remove(address);

        let new_selection = {
            let mut selected = self.selected.write().await;
            if selected.as_deref() == Some(address) {
                *selected = snapshot.first().map(|m| m.address.clone());
                Some(selected.clone())
            } else {
                None
            }
        };

        save_tracked_mints(self.deps.store.as_ref(), &snapshot).await;
        info!("Stopped tracking mint {}", address);

        self.events
            .publish(LedgerEvent::TrackedMintsChanged { mints: snapshot });
        self.events.publish(LedgerEvent::RecordRemoved {
            mint: address.to_string(),
        });
        if let Some(selected) = new_selection {
            self.events.publish(LedgerEvent::SelectionChanged { selected });
        }
        self.events
            .notify(NoticeLevel::Info, "Mint address removed.", None);

        true
    }

    /// Select an already tracked mint.
    pub async fn select_mint(&self, address: &str) -> Result<()> {
        if !self.tracked.read().await.iter().any(|m| m.address == address) {
            return Err(Error::NotTracked(address.to_string()));
        }

        let mut selected = self.selected.write().await;
        if selected.as_deref() != Some(address) {
            *selected = Some(address.to_string());
            drop(selected);
            debug!("Selected mint {}", address);
            self.events.publish(LedgerEvent::SelectionChanged {
                selected: Some(address.to_string()),
            });
        }
        Ok(())
    }

    /// Re-query balance and metadata of `mint` for `owner`.
    ///
    /// Always settles the record as ready or failed and returns what was
    /// committed. When a newer refresh for the same mint was issued while this
    /// one was in flight, nothing is committed and the current record is
    /// returned instead.
    pub async fn refresh_balance(&self, mint: &str, owner: Option<&str>) -> MintBalanceRecord {
        let seq = self.next_request(mint).await;

        let owner = match parse_owner(owner) {
            Ok(owner) => owner,
            Err(e) => {
                warn!("Skipping balance refresh for {}: {}", mint, e);
                return self.settle(mint, seq, MintBalanceRecord::failed(e.to_string())).await;
            }
        };

        let mint_key = match parse_pubkey(mint) {
            Ok(key) => key,
            Err(e) => {
                error!("Invalid mint address selected: {}", mint);
                let record = self.commit(mint, seq, MintBalanceRecord::failed(e.to_string())).await;
                if record.is_some() {
                    self.events.notify(
                        NoticeLevel::Error,
                        "Invalid Mint Address Selected",
                        Some(e.to_string()),
                    );
                }
                return self.or_current(mint, record).await;
            }
        };

        self.commit(mint, seq, MintBalanceRecord::loading()).await;
        debug!("Refreshing balance of {} for {}", mint, owner);

        let record = match self.fetch_balance(&mint_key, &owner).await {
            Ok((balance, metadata)) => {
                info!("Balance of {} for {}: {}", mint, owner, balance);
                MintBalanceRecord::ready(balance, metadata)
            }
            Err(e) => {
                error!("Error fetching token data for {}: {}", mint, e);
                MintBalanceRecord::failed(e.to_string())
            }
        };

        // Notices only for responses that were actually committed
        let committed = self.commit(mint, seq, record).await;
        if let Some(record) = &committed {
            if let Some(error) = &record.error {
                self.events.notify(
                    NoticeLevel::Error,
                    "Error Fetching Token Data",
                    Some(error.clone()),
                );
            } else if record.metadata.is_none() {
                self.events.notify(
                    NoticeLevel::Warning,
                    "Metadata Not Found",
                    Some("Could not fetch metadata for this mint. It might be a new or non-standard token.".to_string()),
                );
            }
        }
        self.or_current(mint, committed).await
    }

    /// Re-query the owner's lamport balance.
    pub async fn refresh_native_balance(&self, owner: Option<&str>) -> Option<u64> {
        let balance = match parse_owner(owner) {
            Ok(owner) => match self.deps.rpc.get_native_balance(&owner).await {
                Ok(lamports) => Some(lamports),
                Err(e) => {
                    error!("Error fetching SOL balance: {}", e);
                    self.events.notify(
                        NoticeLevel::Error,
                        "Error fetching SOL balance",
                        Some(e.to_string()),
                    );
                    None
                }
            },
            Err(_) => None,
        };

        *self.native_balance.write().await = balance;
        self.events
            .publish(LedgerEvent::NativeBalanceUpdated { lamports: balance });
        balance
    }

    pub async fn set_recipient(&self, recipient: &str) {
        let draft = {
            let mut draft = self.draft.write().await;
            draft.recipient = recipient.to_string();
            draft.clone()
        };
        self.events.publish(LedgerEvent::DraftChanged { draft });
    }

    pub async fn set_amount(&self, amount: &str) {
        let draft = {
            let mut draft = self.draft.write().await;
            draft.amount = amount.to_string();
            draft.clone()
        };
        self.events.publish(LedgerEvent::DraftChanged { draft });
    }

    /// Send the drafted transfer of the selected mint.
    pub async fn send_draft(&self, owner: Option<&str>) -> Result<Signature> {
        let mint = self.selected_mint().await;
        let draft = self.draft().await;
        self.send_tokens(mint.as_deref(), &draft.recipient, &draft.amount, owner)
            .await
    }

    /// Transfer `amount` of `mint` from `owner` to `recipient`.
    ///
    /// Every precondition is checked before the first collaborator call. On
    /// confirmation the draft is cleared and both the mint's record and the
    /// native balance are refreshed.
    pub async fn send_tokens(
        &self,
        mint: Option<&str>,
        recipient: &str,
        amount: &str,
        owner: Option<&str>,
    ) -> Result<Signature> {
        let transfer = match self.validate_transfer(mint, recipient, amount, owner).await {
            Ok(transfer) => transfer,
            Err(e) => {
                warn!("Transfer rejected: {}", e);
                self.events
                    .notify(NoticeLevel::Warning, "Transfer Rejected", Some(e.to_string()));
                return Err(e);
            }
        };

        if self
            .sending
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            let e = Error::Validation("transfer already in progress".to_string());
            warn!("Transfer rejected: {}", e);
            self.events
                .notify(NoticeLevel::Warning, "Transfer Rejected", Some(e.to_string()));
            return Err(e);
        }
        self.events
            .publish(LedgerEvent::SendStatusChanged { sending: true });

        let result = self.execute_transfer(&transfer).await;

        self.sending.store(false, Ordering::SeqCst);
        self.events
            .publish(LedgerEvent::SendStatusChanged { sending: false });

        let signature = match result {
            Ok(signature) => signature,
            Err(e) => {
                error!("Transfer of {} {} failed: {}", transfer.amount, transfer.mint, e);
                self.events
                    .notify(NoticeLevel::Error, "Transfer Failed", Some(e.to_string()));
                return Err(e);
            }
        };

        info!(
            "Transferred {} of {} to {}: {}",
            transfer.amount, transfer.mint, transfer.recipient, signature
        );
        self.events.notify(
            NoticeLevel::Success,
            "Transfer Successful!",
            Some(format!("Signature: {}", signature)),
        );
        self.events.publish(LedgerEvent::TransferConfirmed {
            mint: transfer.mint.clone(),
            recipient: transfer.recipient.to_string(),
            amount: transfer.amount,
            signature: signature.to_string(),
        });

        *self.draft.write().await = TransferDraft::default();
        self.events.publish(LedgerEvent::DraftChanged {
            draft: TransferDraft::default(),
        });

        let owner = transfer.owner.to_string();
        self.refresh_balance(&transfer.mint, Some(&owner)).await;
        self.refresh_native_balance(Some(&owner)).await;

        Ok(signature)
    }

    /// Drop per-owner state. The tracked list and selection survive.
    pub async fn disconnect(&self) {
        self.records.write().await.clear();
        self.request_seq.lock().await.clear();
        *self.native_balance.write().await = None;
        *self.draft.write().await = TransferDraft::default();

        info!("Ledger session state cleared");
        self.events
            .publish(LedgerEvent::NativeBalanceUpdated { lamports: None });
        self.events.publish(LedgerEvent::DraftChanged {
            draft: TransferDraft::default(),
        });
    }

    async fn next_request(&self, mint: &str) -> u64 {
        let id = self.next_request_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.request_seq.lock().await.insert(mint.to_string(), id);
        id
    }

    /// Store `record` if `seq` is still the latest request for `mint`.
    /// Returns `None` when the request was superseded.
    async fn commit(
        &self,
        mint: &str,
        seq: u64,
        record: MintBalanceRecord,
    ) -> Option<MintBalanceRecord> {
        let is_latest = self.request_seq.lock().await.get(mint).copied() == Some(seq);
        if !is_latest {
            debug!("Discarding superseded refresh #{} for {}", seq, mint);
            return None;
        }

        self.records
            .write()
            .await
            .insert(mint.to_string(), record.clone());
        self.events.publish(LedgerEvent::RecordUpdated {
            mint: mint.to_string(),
            record: record.clone(),
        });
        Some(record)
    }

    async fn settle(&self, mint: &str, seq: u64, record: MintBalanceRecord) -> MintBalanceRecord {
        let committed = self.commit(mint, seq, record).await;
        self.or_current(mint, committed).await
    }

    async fn or_current(
        &self,
        mint: &str,
        committed: Option<MintBalanceRecord>,
    ) -> MintBalanceRecord {
        match committed {
            Some(record) => record,
            None => self.record(mint).await.unwrap_or_default(),
        }
    }

    /// Balance and metadata of `mint` held by `owner`. A compressed NFT owned
    /// by `owner` counts as one unit and skips the token-account lookup.
    async fn fetch_balance(
        &self,
        mint: &Pubkey,
        owner: &Pubkey,
    ) -> Result<(u64, Option<TokenMetadata>)> {
        let asset = match self.deps.rpc.get_asset(mint).await {
            Ok(asset) => Some(asset),
            Err(e) => {
                debug!("Asset lookup failed for {}: {}", mint, e);
                None
            }
        };

        if let Some(nft) = asset.as_ref().filter(|a| a.is_compressed_nft_owned_by(owner)) {
            debug!("{} resolved as a compressed NFT", mint);
            let metadata = self.with_off_chain_metadata(nft.on_chain_metadata()).await;
            return Ok((1, Some(metadata)));
        }

        let accounts = self
            .deps
            .rpc
            .get_compressed_token_accounts_by_owner(owner, mint)
            .await?;

        let balance = accounts
            .iter()
            .try_fold(0u64, |acc, account| acc.checked_add(account.amount))
            .ok_or_else(|| Error::Internal(format!("Balance of {} overflows u64", mint)))?;

        let metadata = match asset {
            Some(asset) => Some(self.with_off_chain_metadata(asset.on_chain_metadata()).await),
            None => None,
        };

        Ok((balance, metadata))
    }

    /// Merge `image`/`description` from the metadata URI; failures keep the
    /// on-chain fields as they are.
    async fn with_off_chain_metadata(&self, mut metadata: TokenMetadata) -> TokenMetadata {
        let Some(uri) = metadata.uri.clone() else {
            debug!("No off-chain URI present in metadata");
            return metadata;
        };

        match self.deps.metadata.fetch(&uri).await {
            Ok(off_chain) => {
                metadata.image = off_chain.image;
                metadata.description = off_chain.description;
            }
            Err(e) => warn!("Off-chain metadata unavailable at {}: {}", uri, e),
        }
        metadata
    }

    async fn validate_transfer(
        &self,
        mint: Option<&str>,
        recipient: &str,
        amount: &str,
        owner: Option<&str>,
    ) -> Result<ValidatedTransfer> {
        let owner = parse_owner(owner)?;

        let mint = mint
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .ok_or(Error::NoMintSelected)?;
        let mint_key = parse_pubkey(mint)?;

        let recipient = recipient.trim();
        if recipient.is_empty() {
            return Err(Error::MissingRecipient);
        }
        let recipient = parse_pubkey(recipient)
            .map_err(|_| Error::InvalidRecipient(recipient.to_string()))?;

        let amount = parse_amount(amount)?;

        let record = self
            .record(mint)
            .await
            .ok_or_else(|| Error::NoBalanceRecord(mint.to_string()))?;
        let available = record
            .balance
            .ok_or_else(|| Error::BalanceUnknown(mint.to_string()))?;
        if amount > available {
            return Err(Error::InsufficientBalance {
                requested: amount,
                available,
            });
        }

        Ok(ValidatedTransfer {
            mint: mint.to_string(),
            mint_key,
            owner,
            recipient,
            amount,
        })
    }

    async fn execute_transfer(&self, transfer: &ValidatedTransfer) -> Result<Signature> {
        let rpc = &self.deps.rpc;

        let accounts = rpc
            .get_compressed_token_accounts_by_owner(&transfer.owner, &transfer.mint_key)
            .await?;
        if accounts.is_empty() {
            return Err(Error::NoAccounts(transfer.mint.clone()));
        }

        let selection = self.deps.builder.select_accounts(&accounts, transfer.amount)?;
        debug!(
            "Using {} input accounts totalling {}",
            selection.accounts.len(),
            selection.total_amount
        );

        let hashes: Vec<String> = selection.accounts.iter().map(|a| a.hash.clone()).collect();
        let proof = rpc.get_validity_proof(&hashes).await?;
        let token_pool_infos = rpc.get_token_pool_infos(&transfer.mint_key).await?;

        let params = TransferParams {
            payer: transfer.owner,
            owner: transfer.owner,
            inputs: selection.accounts,
            to_address: transfer.recipient,
            amount: transfer.amount,
            token_pool_infos,
            root_indices: proof.root_indices,
            proof: proof.compressed_proof,
        };
        let transfer_ix = self.deps.builder.build_transfer_instruction(&params).await?;

        let blockhash = rpc.get_latest_blockhash().await?;
        let instructions = [
            ComputeBudgetInstruction::set_compute_unit_limit(self.settings.compute_unit_limit),
            transfer_ix,
        ];
        let message = Message::new_with_blockhash(&instructions, Some(&transfer.owner), &blockhash);

        let signed = self
            .deps
            .wallet
            .sign_transaction(Transaction::new_unsigned(message))
            .await?;

        rpc.send_and_confirm_transaction(&signed).await
    }
}

fn parse_owner(owner: Option<&str>) -> Result<Pubkey> {
    let owner = owner
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .ok_or_else(|| Error::OwnerUnavailable("wallet not connected".to_string()))?;
    parse_pubkey(owner).map_err(|_| Error::OwnerUnavailable(format!("malformed owner key {}", owner)))
}

/// Positive whole number of base units
fn parse_amount(amount: &str) -> Result<u64> {
    let amount = amount.trim();
    if amount.is_empty() {
        return Err(Error::InvalidAmount("amount is required".to_string()));
    }
    match amount.parse::<u64>() {
        Ok(0) => Err(Error::InvalidAmount("amount must be greater than zero".to_string())),
        Ok(value) => Ok(value),
        Err(_) => Err(Error::InvalidAmount(format!(
            "'{}' is not a positive integer",
            amount
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("150").unwrap(), 150);
        assert_eq!(parse_amount(" 7 ").unwrap(), 7);
        assert!(matches!(parse_amount("0"), Err(Error::InvalidAmount(_))));
        assert!(matches!(parse_amount("-5"), Err(Error::InvalidAmount(_))));
        assert!(matches!(parse_amount("1.5"), Err(Error::InvalidAmount(_))));
        assert!(matches!(parse_amount("abc"), Err(Error::InvalidAmount(_))));
        assert!(matches!(parse_amount(""), Err(Error::InvalidAmount(_))));
    }

    #[test]
    fn test_parse_owner() {
        let key = Pubkey::new_unique().to_string();
        assert!(parse_owner(Some(&key)).is_ok());
        assert!(matches!(parse_owner(None), Err(Error::OwnerUnavailable(_))));
        assert!(matches!(parse_owner(Some("  ")), Err(Error::OwnerUnavailable(_))));
        assert!(matches!(parse_owner(Some("not-a-key")), Err(Error::OwnerUnavailable(_))));
    }

    #[test]
    fn test_default_settings() {
        let settings = LedgerSettings::default();
        assert_eq!(settings.compute_unit_limit, 300_000);
        assert_eq!(settings.event_capacity, 100);
    }
}
