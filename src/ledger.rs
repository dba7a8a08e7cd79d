//! Instruction semantics as pure state transitions.
//!
//! Handlers take copies of the vault and position, validate, and return the
//! staged new state together with the single token transfer it requires.
//! Nothing is persisted here. The processor issues the transfer through a
//! [`TokenCustody`] and writes the staged state only if that succeeds, so a
//! rejected instruction leaves no trace.

use bytemuck::Zeroable;
use solana_program::{entrypoint::ProgramResult, msg, program_error::ProgramError, pubkey::Pubkey};

use crate::error::VaultError;
use crate::math;
use crate::state::{RewardConfig, UserPosition, Vault};

/// Which of the two pool tokens an instruction targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TokenSide {
    A = 0,
    B = 1,
}

impl TokenSide {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::A),
            1 => Some(Self::B),
            _ => None,
        }
    }
}

/// One end of a token transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Custody {
    /// The caller's own token account for that side
    User(TokenSide),
    /// The vault-controlled holding account for that side
    Holding(TokenSide),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferRequest {
    pub from: Custody,
    pub to: Custody,
    pub amount: u64,
}

impl TransferRequest {
    /// Outbound transfers leave a holding account and need the vault PDA signature.
    pub fn vault_signs(&self) -> bool {
        matches!(self.from, Custody::Holding(_))
    }
}

/// The token-custody system that actually moves balances.
///
/// Implementations must be all-or-nothing: an `Err` means no balance moved.
pub trait TokenCustody {
    fn transfer(&mut self, request: &TransferRequest) -> ProgramResult;
}

/// Staged result of a successful handler.
#[derive(Debug, Clone, Copy)]
pub struct Transition {
    pub vault: Vault,
    pub position: UserPosition,
    pub transfer: TransferRequest,
}

/// Derived addresses recorded in the vault at creation.
#[derive(Debug, Clone, Copy)]
pub struct VaultAddresses {
    pub vault_bump: u8,
    pub token_a_vault: (Pubkey, u8),
    pub token_b_vault: (Pubkey, u8),
}

/// Build a fresh vault record. Existence is checked by the caller, which
/// owns the account and knows whether it already holds data.
pub fn initialize(
    admin: &Pubkey,
    token_a_mint: &Pubkey,
    token_b_mint: &Pubkey,
    addresses: &VaultAddresses,
    reward_config: RewardConfig,
    now: i64,
) -> Result<Vault, VaultError> {
    if token_a_mint == token_b_mint {
        return Err(VaultError::InvalidMint);
    }
    reward_config.validate()?;

    let mut vault = Vault::zeroed();
    vault.is_initialized = 1;
    vault.bump = addresses.vault_bump;
    vault.token_a_vault_bump = addresses.token_a_vault.1;
    vault.token_b_vault_bump = addresses.token_b_vault.1;
    vault.admin = admin.to_bytes();
    vault.token_a_mint = token_a_mint.to_bytes();
    vault.token_b_mint = token_b_mint.to_bytes();
    vault.token_a_vault = addresses.token_a_vault.0.to_bytes();
    vault.token_b_vault = addresses.token_b_vault.0.to_bytes();
    vault.total_staked_a = 0;
    vault.total_staked_b = 0;
    vault.total_rewards_paid = 0;
    vault.reward_config = reward_config;
    vault.created_at = now;
    Ok(vault)
}

/// Empty position for a first-time depositor. All clocks start at `now`.
pub fn open_position(owner: &Pubkey, vault: &Pubkey, bump: u8, now: i64) -> UserPosition {
    let mut position = UserPosition::zeroed();
    position.is_initialized = 1;
    position.bump = bump;
    position.owner = owner.to_bytes();
    position.vault = vault.to_bytes();
    position.stake_started_at = now;
    position.last_claim_at = now;
    position.reward_checkpoint_at = now;
    position
}

/// Deposit `amount` of `side` into the pool.
pub fn add_liquidity(
    vault: &Vault,
    position: &UserPosition,
    side: TokenSide,
    amount: u64,
    now: i64,
) -> Result<Transition, VaultError> {
    if amount == 0 {
        return Err(VaultError::ZeroAmount);
    }
    let mut vault = *vault;
    let mut position = *position;

    if side == TokenSide::A {
        checkpoint(&vault.reward_config, &mut position, now)?;
    }

    let staked = math::credit(position.amount(side), amount).ok_or(VaultError::NumberOverflow)?;
    let total = math::credit(vault.total_staked(side), amount).ok_or(VaultError::NumberOverflow)?;
    *position.amount_mut(side) = staked;
    *vault.total_staked_mut(side) = total;

    Ok(Transition {
        vault,
        position,
        transfer: TransferRequest {
            from: Custody::User(side),
            to: Custody::Holding(side),
            amount,
        },
    })
}

/// Withdraw `amount` of `side` back to the caller. Never more than the
/// caller's recorded position, whatever the holding account carries.
pub fn remove_liquidity(
    vault: &Vault,
    position: &UserPosition,
    side: TokenSide,
    amount: u64,
    now: i64,
) -> Result<Transition, VaultError> {
    if amount == 0 {
        return Err(VaultError::ZeroAmount);
    }
    if amount > position.amount(side) {
        return Err(VaultError::InsufficientStake);
    }
    let mut vault = *vault;
    let mut position = *position;

    // Principal always comes back. If the fold overflows, keep the old
    // checkpoint; later accrual is then measured on the reduced stake.
    if side == TokenSide::A && checkpoint(&vault.reward_config, &mut position, now).is_err() {
        msg!("Reward checkpoint overflowed; withdrawing without folding");
    }

    let staked = math::debit(position.amount(side), amount).ok_or(VaultError::InsufficientStake)?;
    let total = math::debit(vault.total_staked(side), amount).ok_or(VaultError::InsufficientStake)?;
    *position.amount_mut(side) = staked;
    *vault.total_staked_mut(side) = total;

    Ok(Transition {
        vault,
        position,
        transfer: TransferRequest {
            from: Custody::Holding(side),
            to: Custody::User(side),
            amount,
        },
    })
}

/// Pay out everything owed to `position` in token A.
///
/// `holding_a_balance` is the live balance of the token A holding account;
/// only the part above `total_staked_a` may be paid as reward.
pub fn claim_rewards(
    vault: &Vault,
    position: &UserPosition,
    holding_a_balance: u64,
    now: i64,
) -> Result<Transition, VaultError> {
    let reward = vault
        .reward_config
        .reward(position, now)
        .ok_or(VaultError::NumberOverflow)?;
    if reward == 0 {
        return Err(VaultError::NoRewardsAvailable);
    }
    if reward > math::reward_reserve(holding_a_balance, vault.total_staked_a) {
        return Err(VaultError::RewardReserveExhausted);
    }

    let mut vault = *vault;
    let mut position = *position;

    position.pending_reward = 0;
    position.reward_checkpoint_at = position.reward_checkpoint_at.max(now);
    position.last_claim_at = position.last_claim_at.max(now);
    position.total_claimed = position
        .total_claimed
        .checked_add(reward)
        .ok_or(VaultError::NumberOverflow)?;
    vault.total_rewards_paid = vault
        .total_rewards_paid
        .checked_add(reward)
        .ok_or(VaultError::NumberOverflow)?;

    Ok(Transition {
        vault,
        position,
        transfer: TransferRequest {
            from: Custody::Holding(TokenSide::A),
            to: Custody::User(TokenSide::A),
            amount: reward,
        },
    })
}

/// Issue the transition's transfer. The staged state comes back only when
/// custody accepted it; on error the caller has nothing to persist.
pub fn settle<C: TokenCustody>(
    transition: Transition,
    custody: &mut C,
) -> Result<(Vault, UserPosition), ProgramError> {
    custody.transfer(&transition.transfer)?;
    Ok((transition.vault, transition.position))
}

/// Fold reward accrued on the current `amount_a` into `pending_reward` and
/// restart the accrual window at `now`. Must run before `amount_a` changes.
fn checkpoint(config: &RewardConfig, position: &mut UserPosition, now: i64) -> Result<(), VaultError> {
    let accrued = config
        .accrued_since_checkpoint(position, now)
        .ok_or(VaultError::NumberOverflow)?;
    position.pending_reward = position
        .pending_reward
        .checked_add(accrued)
        .ok_or(VaultError::NumberOverflow)?;
    position.reward_checkpoint_at = position.reward_checkpoint_at.max(now);
    Ok(())
}
