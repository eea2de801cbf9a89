// Property-based tests for transfer input selection

use blockchain::{select_min_accounts_for_transfer, CompressedTokenAccount, MAX_INPUT_ACCOUNTS};
use proptest::prelude::*;
use solana_sdk::pubkey::Pubkey;

fn account(index: usize, amount: u64) -> CompressedTokenAccount {
    CompressedTokenAccount {
        hash: format!("hash-{}", index),
        tree: None,
        leaf_index: index as u32,
        lamports: 0,
        mint: Pubkey::default(),
        owner: Pubkey::default(),
        amount,
        delegate: None,
        state: "initialized".to_string(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// A successful selection always covers the requested amount, never
    /// exceeds the input limit, and dropping its smallest account would no
    /// longer cover the amount.
    #[test]
    fn prop_selection_covers_amount_minimally(
        amounts in prop::collection::vec(1u64..1_000_000, 1..10),
        requested in 1u64..2_000_000,
    ) {
        let accounts: Vec<_> = amounts.iter().enumerate().map(|(i, a)| account(i, *a)).collect();

        if let Ok(selection) = select_min_accounts_for_transfer(&accounts, requested, MAX_INPUT_ACCOUNTS) {
            prop_assert!(selection.total_amount >= requested);
            prop_assert!(selection.accounts.len() <= MAX_INPUT_ACCOUNTS);

            let sum: u64 = selection.accounts.iter().map(|a| a.amount).sum();
            prop_assert_eq!(sum, selection.total_amount);

            let smallest = selection.accounts.iter().map(|a| a.amount).min().unwrap_or(0);
            prop_assert!(selection.total_amount - smallest < requested);
        }
    }

    /// Selection fails exactly when the largest MAX_INPUT_ACCOUNTS accounts
    /// cannot cover the amount.
    #[test]
    fn prop_selection_fails_only_when_uncoverable(
        amounts in prop::collection::vec(1u64..1_000_000, 0..10),
        requested in 1u64..3_000_000,
    ) {
        let accounts: Vec<_> = amounts.iter().enumerate().map(|(i, a)| account(i, *a)).collect();

        let mut sorted = amounts.clone();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        let coverable: u64 = sorted.iter().take(MAX_INPUT_ACCOUNTS).sum();

        let result = select_min_accounts_for_transfer(&accounts, requested, MAX_INPUT_ACCOUNTS);
        prop_assert_eq!(result.is_ok(), coverable >= requested);
    }
}
