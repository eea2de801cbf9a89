use async_trait::async_trait;
use shared::Result;
use solana_sdk::instruction::Instruction;

use crate::selection::{select_min_accounts_for_transfer, MAX_INPUT_ACCOUNTS};
use crate::types::{AccountSelection, CompressedTokenAccount, TransferParams};

/// Compressed-token program instruction construction.
///
/// Encoding the transfer instruction is owned by the compressed-token SDK in
/// use; implementors wrap it. Input selection defaults to the minimal
/// largest-first routine.
#[async_trait]
pub trait TransferBuilder: Send + Sync {
    fn select_accounts(
        &self,
        accounts: &[CompressedTokenAccount],
        amount: u64,
    ) -> Result<AccountSelection> {
        select_min_accounts_for_transfer(accounts, amount, MAX_INPUT_ACCOUNTS)
    }

    async fn build_transfer_instruction(&self, params: &TransferParams) -> Result<Instruction>;
}
