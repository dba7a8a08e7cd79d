use bytemuck::{Pod, Zeroable};
use solana_program::{program_error::ProgramError, pubkey::Pubkey};

use crate::error::VaultError;
use crate::ledger::TokenSide;
use crate::math;

/// Reward policy fixed at Initialize.
///
/// Annual rate on staked token A, boosted by a loyalty bonus that ramps
/// up with time since the position's first deposit.
#[derive(Debug, Clone, Copy, Pod, Zeroable, PartialEq, Eq)]
#[repr(C)]
pub struct RewardConfig {
    /// Annual reward rate in basis points of `amount_a`
    pub rate_bps: u64,

    /// Extra basis points applied on top of 1.0x once fully ramped
    pub max_bonus_bps: u64,

    /// Seconds of holding needed to reach `max_bonus_bps`
    pub bonus_ramp_secs: u64,
}

impl RewardConfig {
    pub fn validate(&self) -> Result<(), VaultError> {
        if self.rate_bps > math::MAX_RATE_BPS || self.max_bonus_bps > math::MAX_BONUS_BPS {
            return Err(VaultError::InvalidRewardConfig);
        }
        Ok(())
    }

    /// Reward owed to `position` at `now`, including anything already
    /// folded into `pending_reward`. Pure: touches nothing.
    pub fn reward(&self, position: &UserPosition, now: i64) -> Option<u64> {
        let accrued = self.accrued_since_checkpoint(position, now)?;
        position.pending_reward.checked_add(accrued)
    }

    /// Reward accrued between the position's checkpoint and `now`.
    pub fn accrued_since_checkpoint(&self, position: &UserPosition, now: i64) -> Option<u64> {
        let elapsed = math::elapsed_secs(position.reward_checkpoint_at, now);
        let held_from = math::elapsed_secs(position.stake_started_at, position.reward_checkpoint_at);
        let held_to = held_from.checked_add(elapsed)?;
        let bonus = math::loyalty_bonus_bps_secs(
            held_from,
            held_to,
            self.max_bonus_bps,
            self.bonus_ramp_secs,
        )?;
        math::accrued_reward(position.amount_a, self.rate_bps, elapsed, bonus)
    }
}

/// Vault singleton, one per deployment.
/// PDA seeds: [b"vault"]
///
/// The vault PDA is the token authority of both holding accounts, so every
/// outbound transfer is signed with the vault seeds.
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[repr(C)]
pub struct Vault {
    /// Whether the vault is initialized (1 = yes, 0 = no)
    pub is_initialized: u8,

    /// Bump seed for the vault PDA
    pub bump: u8,

    /// Bump seed for the token A holding PDA
    pub token_a_vault_bump: u8,

    /// Bump seed for the token B holding PDA
    pub token_b_vault_bump: u8,

    /// Padding for alignment
    pub _padding: [u8; 4],

    /// Identity that initialized the vault
    pub admin: [u8; 32],

    /// Token A mint (rewards are paid in this token)
    pub token_a_mint: [u8; 32],

    /// Token B mint
    pub token_b_mint: [u8; 32],

    /// Holding account for token A (authority = vault PDA)
    pub token_a_vault: [u8; 32],

    /// Holding account for token B (authority = vault PDA)
    pub token_b_vault: [u8; 32],

    /// Sum of all positions' `amount_a`
    pub total_staked_a: u64,

    /// Sum of all positions' `amount_b`
    pub total_staked_b: u64,

    /// Lifetime rewards transferred out of the token A holding account
    pub total_rewards_paid: u64,

    pub reward_config: RewardConfig,

    /// Unix timestamp of Initialize
    pub created_at: i64,

    /// Reserved for future use
    pub _reserved: [u8; 64],
}

/// Size of Vault in bytes
pub const VAULT_SIZE: usize = core::mem::size_of::<Vault>();

/// Per-depositor position.
/// PDA seeds: [b"user_stake", user_pubkey]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[repr(C)]
pub struct UserPosition {
    /// Whether this record is initialized
    pub is_initialized: u8,

    /// Bump seed for the position PDA
    pub bump: u8,

    /// Padding
    pub _padding: [u8; 6],

    /// The depositor
    pub owner: [u8; 32],

    /// The vault this position belongs to
    pub vault: [u8; 32],

    /// Staked token A
    pub amount_a: u64,

    /// Staked token B
    pub amount_b: u64,

    /// Timestamp of the first deposit; never moves afterwards
    pub stake_started_at: i64,

    /// Timestamp of the last successful claim
    pub last_claim_at: i64,

    /// Start of the window not yet folded into `pending_reward`
    pub reward_checkpoint_at: i64,

    /// Reward accrued before the last change to `amount_a`
    pub pending_reward: u64,

    /// Lifetime rewards claimed
    pub total_claimed: u64,

    /// Reserved for future use
    pub _reserved: [u8; 32],
}

/// Size of UserPosition in bytes
pub const USER_POSITION_SIZE: usize = core::mem::size_of::<UserPosition>();

impl Vault {
    pub fn mint(&self, side: TokenSide) -> Pubkey {
        match side {
            TokenSide::A => Pubkey::new_from_array(self.token_a_mint),
            TokenSide::B => Pubkey::new_from_array(self.token_b_mint),
        }
    }

    pub fn holding(&self, side: TokenSide) -> Pubkey {
        match side {
            TokenSide::A => Pubkey::new_from_array(self.token_a_vault),
            TokenSide::B => Pubkey::new_from_array(self.token_b_vault),
        }
    }

    pub fn total_staked(&self, side: TokenSide) -> u64 {
        match side {
            TokenSide::A => self.total_staked_a,
            TokenSide::B => self.total_staked_b,
        }
    }

    pub fn total_staked_mut(&mut self, side: TokenSide) -> &mut u64 {
        match side {
            TokenSide::A => &mut self.total_staked_a,
            TokenSide::B => &mut self.total_staked_b,
        }
    }
}

impl UserPosition {
    pub fn owner_pubkey(&self) -> Pubkey {
        Pubkey::new_from_array(self.owner)
    }

    pub fn amount(&self, side: TokenSide) -> u64 {
        match side {
            TokenSide::A => self.amount_a,
            TokenSide::B => self.amount_b,
        }
    }

    pub fn amount_mut(&mut self, side: TokenSide) -> &mut u64 {
        match side {
            TokenSide::A => &mut self.amount_a,
            TokenSide::B => &mut self.amount_b,
        }
    }
}

/// Copy a `Vault` out of raw account data. Does not check initialization.
pub fn read_vault(data: &[u8]) -> Result<Vault, ProgramError> {
    read_pod(data, VAULT_SIZE)
}

/// Copy a `UserPosition` out of raw account data. Does not check initialization.
pub fn read_position(data: &[u8]) -> Result<UserPosition, ProgramError> {
    read_pod(data, USER_POSITION_SIZE)
}

/// Write a Pod record back over the head of an account's data.
pub fn write<T: Pod>(data: &mut [u8], value: &T) -> Result<(), ProgramError> {
    let bytes = bytemuck::bytes_of(value);
    let dst = data
        .get_mut(..bytes.len())
        .ok_or(VaultError::InvalidAccountData)?;
    dst.copy_from_slice(bytes);
    Ok(())
}

// Account data is not guaranteed to be aligned for T off-chain, so read a copy.
fn read_pod<T: Pod>(data: &[u8], size: usize) -> Result<T, ProgramError> {
    let src = data.get(..size).ok_or(VaultError::InvalidAccountData)?;
    bytemuck::try_pod_read_unaligned(src).map_err(|_| VaultError::InvalidAccountData.into())
}
