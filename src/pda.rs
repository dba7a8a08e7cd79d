//! Seed-based address derivation.
//!
//! Every address the program controls is recomputable from the program id
//! and a literal seed. Seeds must match callers byte for byte.

use solana_program::pubkey::Pubkey;

use crate::ledger::TokenSide;

pub const SEED_VAULT: &[u8] = b"vault";
pub const SEED_VAULT_TOKEN_A: &[u8] = b"vault_pscu";
pub const SEED_VAULT_TOKEN_B: &[u8] = b"vault_usdc";
pub const SEED_USER_STAKE: &[u8] = b"user_stake";

/// Vault singleton. PDA seeds: [b"vault"]
pub fn derive_vault(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[SEED_VAULT], program_id)
}

/// Holding account for one side of the pool.
/// PDA seeds: [b"vault_pscu" | b"vault_usdc", vault]
pub fn derive_holding(program_id: &Pubkey, vault: &Pubkey, side: TokenSide) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[holding_seed(side), vault.as_ref()], program_id)
}

/// Per-user position. PDA seeds: [b"user_stake", user]
pub fn derive_position(program_id: &Pubkey, user: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[SEED_USER_STAKE, user.as_ref()], program_id)
}

pub fn holding_seed(side: TokenSide) -> &'static [u8] {
    match side {
        TokenSide::A => SEED_VAULT_TOKEN_A,
        TokenSide::B => SEED_VAULT_TOKEN_B,
    }
}
