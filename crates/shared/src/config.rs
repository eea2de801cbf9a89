use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub solana: SolanaConfig,
    pub storage: StorageConfig,
    pub transfer: TransferConfig,
    pub events: EventConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SolanaConfig {
    pub rpc_url: String,
    /// Photon/DAS endpoint; usually the same node as `rpc_url`
    pub compression_rpc_url: String,
    pub network: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub mint_store_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransferConfig {
    /// Compute unit limit prepended to every transfer (default: 300000)
    pub compute_unit_limit: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventConfig {
    /// Buffered events per subscriber before lagging (default: 100)
    pub channel_capacity: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let rpc_url = env::var("SOLANA_RPC_URL")?;

        Ok(Config {
            solana: SolanaConfig {
                compression_rpc_url: env::var("COMPRESSION_RPC_URL")
                    .unwrap_or_else(|_| rpc_url.clone()),
                rpc_url,
                network: env::var("SOLANA_NETWORK").unwrap_or_else(|_| "devnet".to_string()),
            },
            storage: StorageConfig {
                mint_store_path: env::var("MINT_STORE_PATH")
                    .unwrap_or_else(|_| "./wallet_state.json".to_string()),
            },
            transfer: TransferConfig {
                compute_unit_limit: env::var("COMPUTE_UNIT_LIMIT")
                    .unwrap_or_else(|_| "300000".to_string())
                    .parse()?,
            },
            events: EventConfig {
                channel_capacity: env::var("LEDGER_EVENT_CAPACITY")
                    .unwrap_or_else(|_| "100".to_string())
                    .parse()?,
            },
        })
    }
}
