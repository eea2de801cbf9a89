use async_trait::async_trait;
use shared::{Error, Result};
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    transaction::Transaction,
};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Wallet provider capability: exposes the connected key and signs.
///
/// The ledger client never sees private key material; it hands an unsigned
/// transaction (recent blockhash already set) to the wallet and gets it back
/// signed.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    /// Currently connected public key, if any
    async fn public_key(&self) -> Option<Pubkey>;

    async fn sign_transaction(&self, transaction: Transaction) -> Result<Transaction>;
}

/// Local keypair wallet, useful for scripts and tests
pub struct KeypairWallet {
    keypair: RwLock<Option<Keypair>>,
}

impl KeypairWallet {
    pub fn new(keypair: Keypair) -> Self {
        info!("Keypair wallet connected: {}", keypair.pubkey());
        Self {
            keypair: RwLock::new(Some(keypair)),
        }
    }

    pub fn disconnected() -> Self {
        Self {
            keypair: RwLock::new(None),
        }
    }

    pub async fn connect(&self, keypair: Keypair) {
        info!("Keypair wallet connected: {}", keypair.pubkey());
        *self.keypair.write().await = Some(keypair);
    }

    pub async fn disconnect(&self) {
        if self.keypair.write().await.take().is_some() {
            info!("Keypair wallet disconnected");
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.keypair.read().await.is_some()
    }
}

#[async_trait]
impl WalletSigner for KeypairWallet {
    async fn public_key(&self) -> Option<Pubkey> {
        self.keypair.read().await.as_ref().map(|k| k.pubkey())
    }

    async fn sign_transaction(&self, mut transaction: Transaction) -> Result<Transaction> {
        let guard = self.keypair.read().await;
        let keypair = guard.as_ref().ok_or(Error::WalletDisconnected)?;

        let blockhash = transaction.message.recent_blockhash;
        transaction
            .try_partial_sign(&[keypair], blockhash)
            .map_err(|e| Error::Signing(format!("Keypair signing failed: {}", e)))?;

        debug!("Signed transaction with {}", keypair.pubkey());
        Ok(transaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::{hash::Hash, message::Message, system_instruction};

    fn unsigned_transfer(payer: &Pubkey) -> Transaction {
        let ix = system_instruction::transfer(payer, &Pubkey::new_unique(), 1);
        let message = Message::new_with_blockhash(&[ix], Some(payer), &Hash::new_unique());
        Transaction::new_unsigned(message)
    }

    #[tokio::test]
    async fn test_signs_with_connected_keypair() {
        let keypair = Keypair::new();
        let payer = keypair.pubkey();
        let wallet = KeypairWallet::new(keypair);

        assert_eq!(wallet.public_key().await, Some(payer));

        let signed = wallet.sign_transaction(unsigned_transfer(&payer)).await.unwrap();
        assert!(signed.is_signed());
        assert!(signed.verify().is_ok());
    }

    #[tokio::test]
    async fn test_disconnected_wallet_refuses_to_sign() {
        let keypair = Keypair::new();
        let payer = keypair.pubkey();
        let wallet = KeypairWallet::new(keypair);
        wallet.disconnect().await;

        assert!(!wallet.is_connected().await);
        assert_eq!(wallet.public_key().await, None);

        let result = wallet.sign_transaction(unsigned_transfer(&payer)).await;
        assert!(matches!(result, Err(Error::WalletDisconnected)));
    }

    #[tokio::test]
    async fn test_reconnect() {
        let wallet = KeypairWallet::disconnected();
        assert!(wallet.public_key().await.is_none());

        let keypair = Keypair::new();
        let expected = keypair.pubkey();
        wallet.connect(keypair).await;
        assert_eq!(wallet.public_key().await, Some(expected));
    }
}
