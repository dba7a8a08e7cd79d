use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program, sysvar,
};

use crate::ledger::TokenSide;
use crate::pda;
use crate::state::RewardConfig;

/// Instructions for the liquidity vault program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultInstruction {
    /// Create the vault singleton and both token holding accounts.
    ///
    /// Accounts:
    ///   0. `[signer, writable]` Admin (pays rent, recorded as vault admin)
    ///   1. `[writable]` Vault PDA (["vault"], to be created)
    ///   2. `[writable]` Token A holding PDA (["vault_pscu", vault], to be created)
    ///   3. `[writable]` Token B holding PDA (["vault_usdc", vault], to be created)
    ///   4. `[]` Token A mint
    ///   5. `[]` Token B mint
    ///   6. `[]` Token program
    ///   7. `[]` System program
    ///   8. `[]` Rent sysvar
    ///   9. `[]` Clock sysvar
    Initialize { reward_config: RewardConfig },

    /// Deposit into the pool. Creates the caller's position on first use.
    ///
    /// Accounts:
    ///   0. `[signer, writable]` User (pays rent for a new position)
    ///   1. `[writable]` Vault PDA
    ///   2. `[writable]` User position PDA (["user_stake", user])
    ///   3. `[writable]` User token account for the selected side (source)
    ///   4. `[writable]` Vault holding account for the selected side (destination)
    ///   5. `[]` Token program
    ///   6. `[]` System program
    ///   7. `[]` Clock sysvar
    AddLiquidity { amount: u64, side: TokenSide },

    /// Withdraw from the caller's position.
    ///
    /// Accounts:
    ///   0. `[signer]` User
    ///   1. `[writable]` Vault PDA (holding authority, signs the transfer)
    ///   2. `[writable]` User position PDA
    ///   3. `[writable]` User token account for the selected side (destination)
    ///   4. `[writable]` Vault holding account for the selected side (source)
    ///   5. `[]` Token program
    ///   6. `[]` Clock sysvar
    RemoveLiquidity { amount: u64, side: TokenSide },

    /// Pay accrued rewards in token A.
    ///
    /// Accounts:
    ///   0. `[signer]` User
    ///   1. `[writable]` Vault PDA
    ///   2. `[writable]` User position PDA
    ///   3. `[writable]` User token A account (destination)
    ///   4. `[writable]` Vault token A holding account (source)
    ///   5. `[]` Token program
    ///   6. `[]` Clock sysvar
    ClaimRewards,
}

const TAG_INITIALIZE: u8 = 0;
const TAG_ADD_LIQUIDITY: u8 = 1;
const TAG_REMOVE_LIQUIDITY: u8 = 2;
const TAG_CLAIM_REWARDS: u8 = 3;

impl VaultInstruction {
    pub fn unpack(data: &[u8]) -> Result<Self, ProgramError> {
        let (&tag, rest) = data.split_first().ok_or(ProgramError::InvalidInstructionData)?;

        match tag {
            TAG_INITIALIZE => {
                // rate_bps(8) + max_bonus_bps(8) + bonus_ramp_secs(8)
                let reward_config = RewardConfig {
                    rate_bps: read_u64(rest, 0)?,
                    max_bonus_bps: read_u64(rest, 8)?,
                    bonus_ramp_secs: read_u64(rest, 16)?,
                };
                Ok(Self::Initialize { reward_config })
            }
            TAG_ADD_LIQUIDITY => {
                let (amount, side) = unpack_amount_side(rest)?;
                Ok(Self::AddLiquidity { amount, side })
            }
            TAG_REMOVE_LIQUIDITY => {
                let (amount, side) = unpack_amount_side(rest)?;
                Ok(Self::RemoveLiquidity { amount, side })
            }
            TAG_CLAIM_REWARDS => Ok(Self::ClaimRewards),
            _ => Err(ProgramError::InvalidInstructionData),
        }
    }

    pub fn pack(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(25);
        match self {
            Self::Initialize { reward_config } => {
                data.push(TAG_INITIALIZE);
                data.extend_from_slice(&reward_config.rate_bps.to_le_bytes());
                data.extend_from_slice(&reward_config.max_bonus_bps.to_le_bytes());
                data.extend_from_slice(&reward_config.bonus_ramp_secs.to_le_bytes());
            }
            Self::AddLiquidity { amount, side } => {
                data.push(TAG_ADD_LIQUIDITY);
                data.extend_from_slice(&amount.to_le_bytes());
                data.push(*side as u8);
            }
            Self::RemoveLiquidity { amount, side } => {
                data.push(TAG_REMOVE_LIQUIDITY);
                data.extend_from_slice(&amount.to_le_bytes());
                data.push(*side as u8);
            }
            Self::ClaimRewards => data.push(TAG_CLAIM_REWARDS),
        }
        data
    }
}

fn read_u64(data: &[u8], offset: usize) -> Result<u64, ProgramError> {
    data.get(offset..offset + 8)
        .and_then(|bytes| bytes.try_into().ok())
        .map(u64::from_le_bytes)
        .ok_or(ProgramError::InvalidInstructionData)
}

fn unpack_amount_side(rest: &[u8]) -> Result<(u64, TokenSide), ProgramError> {
    let amount = read_u64(rest, 0)?;
    let side = rest
        .get(8)
        .copied()
        .and_then(TokenSide::from_u8)
        .ok_or(ProgramError::InvalidInstructionData)?;
    Ok((amount, side))
}

// ═══════════════════════════════════════════════════════════════
// Client-side builders
// ═══════════════════════════════════════════════════════════════

pub fn initialize(
    program_id: &Pubkey,
    admin: &Pubkey,
    token_a_mint: &Pubkey,
    token_b_mint: &Pubkey,
    reward_config: RewardConfig,
) -> Instruction {
    let (vault, _) = pda::derive_vault(program_id);
    let (holding_a, _) = pda::derive_holding(program_id, &vault, TokenSide::A);
    let (holding_b, _) = pda::derive_holding(program_id, &vault, TokenSide::B);

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*admin, true),
            AccountMeta::new(vault, false),
            AccountMeta::new(holding_a, false),
            AccountMeta::new(holding_b, false),
            AccountMeta::new_readonly(*token_a_mint, false),
            AccountMeta::new_readonly(*token_b_mint, false),
            AccountMeta::new_readonly(spl_token::id(), false),
            AccountMeta::new_readonly(system_program::id(), false),
            AccountMeta::new_readonly(sysvar::rent::id(), false),
            AccountMeta::new_readonly(sysvar::clock::id(), false),
        ],
        data: VaultInstruction::Initialize { reward_config }.pack(),
    }
}

pub fn add_liquidity(
    program_id: &Pubkey,
    user: &Pubkey,
    user_token_account: &Pubkey,
    side: TokenSide,
    amount: u64,
) -> Instruction {
    let (vault, _) = pda::derive_vault(program_id);
    let (position, _) = pda::derive_position(program_id, user);
    let (holding, _) = pda::derive_holding(program_id, &vault, side);

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*user, true),
            AccountMeta::new(vault, false),
            AccountMeta::new(position, false),
            AccountMeta::new(*user_token_account, false),
            AccountMeta::new(holding, false),
            AccountMeta::new_readonly(spl_token::id(), false),
            AccountMeta::new_readonly(system_program::id(), false),
            AccountMeta::new_readonly(sysvar::clock::id(), false),
        ],
        data: VaultInstruction::AddLiquidity { amount, side }.pack(),
    }
}

pub fn remove_liquidity(
    program_id: &Pubkey,
    user: &Pubkey,
    user_token_account: &Pubkey,
    side: TokenSide,
    amount: u64,
) -> Instruction {
    let (vault, _) = pda::derive_vault(program_id);
    let (position, _) = pda::derive_position(program_id, user);
    let (holding, _) = pda::derive_holding(program_id, &vault, side);

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*user, true),
            AccountMeta::new(vault, false),
            AccountMeta::new(position, false),
            AccountMeta::new(*user_token_account, false),
            AccountMeta::new(holding, false),
            AccountMeta::new_readonly(spl_token::id(), false),
            AccountMeta::new_readonly(sysvar::clock::id(), false),
        ],
        data: VaultInstruction::RemoveLiquidity { amount, side }.pack(),
    }
}

pub fn claim_rewards(program_id: &Pubkey, user: &Pubkey, user_token_a_account: &Pubkey) -> Instruction {
    let (vault, _) = pda::derive_vault(program_id);
    let (position, _) = pda::derive_position(program_id, user);
    let (holding_a, _) = pda::derive_holding(program_id, &vault, TokenSide::A);

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*user, true),
            AccountMeta::new(vault, false),
            AccountMeta::new(position, false),
            AccountMeta::new(*user_token_a_account, false),
            AccountMeta::new(holding_a, false),
            AccountMeta::new_readonly(spl_token::id(), false),
            AccountMeta::new_readonly(sysvar::clock::id(), false),
        ],
        data: VaultInstruction::ClaimRewards.pack(),
    }
}
