use shared::{Error, Result};
use tracing::debug;

use crate::types::{AccountSelection, CompressedTokenAccount};

/// Input accounts a single compressed transfer can consume
pub const MAX_INPUT_ACCOUNTS: usize = 4;

/// Pick the fewest accounts (largest first) whose amounts cover `amount`.
///
/// Fails with `InsufficientBalance` when all accounts together fall short, and
/// with `Validation` when the balance exists but is spread over more than
/// `max_inputs` accounts.
pub fn select_min_accounts_for_transfer(
    accounts: &[CompressedTokenAccount],
    amount: u64,
    max_inputs: usize,
) -> Result<AccountSelection> {
    let mut sorted: Vec<&CompressedTokenAccount> = accounts.iter().collect();
    sorted.sort_by(|a, b| b.amount.cmp(&a.amount));

    let max_possible_amount = sorted
        .iter()
        .take(max_inputs)
        .fold(0u64, |acc, account| acc.saturating_add(account.amount));

    let mut selected = Vec::new();
    let mut total_amount = 0u64;
    let mut total_lamports = 0u64;

    for account in sorted.iter().take(max_inputs) {
        if total_amount >= amount {
            break;
        }
        total_amount = total_amount.saturating_add(account.amount);
        total_lamports = total_lamports.saturating_add(account.lamports);
        selected.push((*account).clone());
    }

    if total_amount < amount {
        let available = accounts
            .iter()
            .fold(0u64, |acc, account| acc.saturating_add(account.amount));
        if available < amount {
            return Err(Error::InsufficientBalance {
                requested: amount,
                available,
            });
        }
        return Err(Error::Validation(format!(
            "Transfer of {} needs more than {} input accounts; at most {} can be sent at once",
            amount, max_inputs, max_possible_amount
        )));
    }

    debug!(
        "Selected {} of {} accounts covering {} (requested {})",
        selected.len(),
        accounts.len(),
        total_amount,
        amount
    );

    Ok(AccountSelection {
        accounts: selected,
        total_amount,
        total_lamports,
        max_possible_amount,
    })
}
