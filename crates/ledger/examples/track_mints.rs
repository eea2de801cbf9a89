/// Track compressed token mints for an owner and print their balances
///
/// Usage:
///   cargo run -p ledger --example track_mints -- <OWNER> [MINT...]
///
/// Mints given on the command line are added to the persisted list at
/// MINT_STORE_PATH; every tracked mint is then refreshed. Requires
/// SOLANA_RPC_URL pointing at a node that serves the compression API.

use async_trait::async_trait;
use blockchain::{
    HttpMetadataFetcher, KeypairWallet, PhotonClient, TransferBuilder, TransferParams,
};
use ledger::logging::init_logging_pretty;
use ledger::{JsonFileMintStore, LedgerDeps, LedgerSettings, TokenLedgerClient};
use shared::config::Config;
use shared::{Error, RecordStatus};
use solana_sdk::instruction::Instruction;
use std::sync::Arc;

/// This example only reads balances
struct ReadOnlyBuilder;

#[async_trait]
impl TransferBuilder for ReadOnlyBuilder {
    async fn build_transfer_instruction(&self, _params: &TransferParams) -> shared::Result<Instruction> {
        Err(Error::Validation("transfers are disabled in this example".to_string()))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging_pretty();

    let config = Config::from_env()?;
    let mut args = std::env::args().skip(1);
    let owner = args
        .next()
        .ok_or_else(|| anyhow::anyhow!("usage: track_mints <OWNER> [MINT...]"))?;

    let deps = LedgerDeps {
        rpc: Arc::new(PhotonClient::new(
            config.solana.rpc_url.clone(),
            config.solana.compression_rpc_url.clone(),
        )),
        builder: Arc::new(ReadOnlyBuilder),
        wallet: Arc::new(KeypairWallet::disconnected()),
        metadata: Arc::new(HttpMetadataFetcher::new()),
        store: Arc::new(JsonFileMintStore::new(&config.storage.mint_store_path)),
    };
    let client = TokenLedgerClient::load(deps, LedgerSettings::from_config(&config)).await;

    for mint in args {
        if let Err(e) = client.add_mint(&mint).await {
            println!("Skipping {}: {}", mint, e);
        }
    }

    if let Some(lamports) = client.refresh_native_balance(Some(&owner)).await {
        println!("SOL: {}", shared::models::lamports_to_sol(lamports));
    }

    for mint in client.tracked_mints().await {
        let record = client.refresh_balance(&mint.address, Some(&owner)).await;
        let label = record
            .metadata
            .as_ref()
            .and_then(|m| m.symbol.clone())
            .unwrap_or_else(|| mint.abbreviated());

        match record.status() {
            RecordStatus::Ready => println!("{}: {}", label, record.balance.unwrap_or_default()),
            _ => println!(
                "{}: unavailable ({})",
                label,
                record.error.as_deref().unwrap_or("unknown error")
            ),
        }
    }

    Ok(())
}
