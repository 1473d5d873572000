//! Instruction builders for the token, associated-account and metadata programs.

use mpl_token_metadata::instructions::CreateMetadataAccountV3Builder;
use mpl_token_metadata::types::DataV2;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::system_instruction;
use spl_token::instruction::AuthorityType;
use spl_token::solana_program::program_pack::Pack;
use spl_token::state::Mint;

use crate::blockchain::types::{BlockchainError, BlockchainResult};
use crate::config::schema::TokenConfig;

/// Seed prefix of metadata record addresses.
pub const METADATA_SEED: &[u8] = b"metadata";

/// Program owning metadata records.
pub fn metadata_program_id() -> Pubkey {
    mpl_token_metadata::ID
}

/// Size of a mint account.
pub const MINT_ACCOUNT_LEN: usize = Mint::LEN;

/// Deterministic metadata record address for `mint`.
pub fn metadata_address(mint: &Pubkey) -> Pubkey {
    let program_id = metadata_program_id();
    let (address, _bump) = Pubkey::find_program_address(
        &[METADATA_SEED, program_id.as_ref(), mint.as_ref()],
        &program_id,
    );
    address
}

/// Holding account of `owner` for `mint`.
pub fn token_account_address(owner: &Pubkey, mint: &Pubkey) -> Pubkey {
    spl_associated_token_account::get_associated_token_address(owner, mint)
}

/// Allocate `mint` and initialise it with `payer` as mint authority and no freeze authority.
pub fn create_mint(
    payer: &Pubkey,
    mint: &Pubkey,
    rent_lamports: u64,
    decimals: u8,
) -> BlockchainResult<Vec<Instruction>> {
    let allocate = system_instruction::create_account(
        payer,
        mint,
        rent_lamports,
        MINT_ACCOUNT_LEN as u64,
        &spl_token::id(),
    );
    let initialize =
        spl_token::instruction::initialize_mint2(&spl_token::id(), mint, payer, None, decimals)
            .map_err(|e| BlockchainError::Instruction(format!("initialize_mint2: {}", e)))?;

    Ok(vec![allocate, initialize])
}

/// Mutable metadata record for `mint`, with `payer` as update authority and no royalties.
pub fn create_metadata(payer: &Pubkey, mint: &Pubkey, token: &TokenConfig) -> Instruction {
    CreateMetadataAccountV3Builder::new()
        .metadata(metadata_address(mint))
        .mint(*mint)
        .mint_authority(*payer)
        .payer(*payer)
        .update_authority(*payer, true)
        .data(DataV2 {
            name: token.name.clone(),
            symbol: token.symbol.clone(),
            uri: token.uri.clone(),
            seller_fee_basis_points: 0,
            creators: None,
            collection: None,
            uses: None,
        })
        .is_mutable(true)
        .instruction()
}

/// Create the holding account of `owner` for `mint` unless it already exists.
pub fn create_token_account(payer: &Pubkey, owner: &Pubkey, mint: &Pubkey) -> Instruction {
    spl_associated_token_account::instruction::create_associated_token_account_idempotent(
        payer,
        owner,
        mint,
        &spl_token::id(),
    )
}

/// Credit `amount` base units of `mint` to `account`.
pub fn mint_to(
    mint: &Pubkey,
    account: &Pubkey,
    authority: &Pubkey,
    amount: u64,
) -> BlockchainResult<Instruction> {
    spl_token::instruction::mint_to(&spl_token::id(), mint, account, authority, &[], amount)
        .map_err(|e| BlockchainError::Instruction(format!("mint_to: {}", e)))
}

/// Clear the mint authority of `mint`. Irreversible once confirmed.
pub fn revoke_mint_authority(mint: &Pubkey, authority: &Pubkey) -> BlockchainResult<Instruction> {
    spl_token::instruction::set_authority(
        &spl_token::id(),
        mint,
        None,
        AuthorityType::MintTokens,
        authority,
        &[],
    )
    .map_err(|e| BlockchainError::Instruction(format!("set_authority: {}", e)))
}
