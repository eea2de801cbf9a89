use serde::{Deserialize, Serialize};
use shared::TokenMetadata;
use solana_sdk::pubkey::Pubkey;

/// A compressed token account as reported by the compression indexer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedTokenAccount {
    /// Base58 leaf hash of the compressed account
    pub hash: String,
    pub tree: Option<Pubkey>,
    pub leaf_index: u32,
    pub lamports: u64,
    pub mint: Pubkey,
    pub owner: Pubkey,
    pub amount: u64,
    pub delegate: Option<Pubkey>,
    pub state: String,
}

/// Groth16 proof points returned by the prover
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressedProof {
    pub a: Vec<u8>,
    pub b: Vec<u8>,
    pub c: Vec<u8>,
}

/// Validity proof for a set of input account hashes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidityProof {
    pub compressed_proof: Option<CompressedProof>,
    pub roots: Vec<String>,
    pub root_indices: Vec<u16>,
    pub leaf_indices: Vec<u32>,
    pub leaves: Vec<String>,
    pub merkle_trees: Vec<Pubkey>,
}

/// SPL token pool backing a compressed mint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPoolInfo {
    pub mint: Pubkey,
    pub token_pool_pda: Pubkey,
    pub token_program: Pubkey,
    pub pool_index: u8,
    pub bump: u8,
    pub balance: u64,
}

/// Digital asset descriptor (DAS `getAsset`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedAsset {
    pub id: Pubkey,
    pub interface: String,
    pub compressed: bool,
    pub owner: Option<Pubkey>,
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub json_uri: Option<String>,
}

const NON_FUNGIBLE_INTERFACES: &[&str] = &[
    "V1_NFT",
    "V2_NFT",
    "LEGACY_NFT",
    "ProgrammableNFT",
    "MplCoreAsset",
];

impl CompressedAsset {
    pub fn is_non_fungible(&self) -> bool {
        NON_FUNGIBLE_INTERFACES.contains(&self.interface.as_str())
    }

    /// True when this is a compressed NFT held by `owner`
    pub fn is_compressed_nft_owned_by(&self, owner: &Pubkey) -> bool {
        self.compressed && self.is_non_fungible() && self.owner.as_ref() == Some(owner)
    }

    pub fn on_chain_metadata(&self) -> TokenMetadata {
        TokenMetadata {
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            uri: self.json_uri.clone(),
            image: None,
            description: None,
        }
    }
}

/// Fields taken from the JSON document behind a metadata URI
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffChainMetadata {
    pub image: Option<String>,
    pub description: Option<String>,
}

/// Outcome of choosing input accounts for a transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSelection {
    pub accounts: Vec<CompressedTokenAccount>,
    pub total_amount: u64,
    pub total_lamports: u64,
    /// Largest amount transferable within the input limit
    pub max_possible_amount: u64,
}

/// Everything the transfer instruction builder needs
#[derive(Debug, Clone)]
pub struct TransferParams {
    pub payer: Pubkey,
    pub owner: Pubkey,
    pub inputs: Vec<CompressedTokenAccount>,
    pub to_address: Pubkey,
    pub amount: u64,
    pub token_pool_infos: Vec<TokenPoolInfo>,
    pub root_indices: Vec<u16>,
    pub proof: Option<CompressedProof>,
}

/// Normalise empty strings coming off the wire to `None`
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim_matches(char::from(0)).trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(interface: &str, compressed: bool, owner: Option<Pubkey>) -> CompressedAsset {
        CompressedAsset {
            id: Pubkey::new_unique(),
            interface: interface.to_string(),
            compressed,
            owner,
            name: Some("Token".to_string()),
            symbol: Some("TKN".to_string()),
            json_uri: Some("https://example.com/meta.json".to_string()),
        }
    }

    #[test]
    fn test_compressed_nft_ownership() {
        let owner = Pubkey::new_unique();
        assert!(asset("V1_NFT", true, Some(owner)).is_compressed_nft_owned_by(&owner));
        assert!(!asset("V1_NFT", false, Some(owner)).is_compressed_nft_owned_by(&owner));
        assert!(!asset("FungibleToken", true, Some(owner)).is_compressed_nft_owned_by(&owner));
        assert!(!asset("V1_NFT", true, Some(Pubkey::new_unique())).is_compressed_nft_owned_by(&owner));
        assert!(!asset("V1_NFT", true, None).is_compressed_nft_owned_by(&owner));
    }

    #[test]
    fn test_on_chain_metadata_leaves_off_chain_fields_empty() {
        let metadata = asset("FungibleToken", false, None).on_chain_metadata();
        assert_eq!(metadata.name.as_deref(), Some("Token"));
        assert_eq!(metadata.symbol.as_deref(), Some("TKN"));
        assert!(metadata.image.is_none());
        assert!(metadata.description.is_none());
    }

    #[test]
    fn test_non_empty_strips_padding() {
        assert_eq!(non_empty(Some("  ".to_string())), None);
        assert_eq!(non_empty(Some("ABC\0\0".to_string())), Some("ABC".to_string()));
        assert_eq!(non_empty(None), None);
    }
}
