//! In-memory pool: drives the pure ledger handlers against a simulated
//! token custody so whole instruction sequences can be checked end to end.

#![allow(dead_code)]

use std::collections::HashMap;

use liquidity_vault::error::VaultError;
use liquidity_vault::ledger::{
    self, Custody, TokenCustody, TokenSide, TransferRequest, VaultAddresses,
};
use liquidity_vault::state::{RewardConfig, UserPosition, Vault};
use solana_program::{entrypoint::ProgramResult, program_error::ProgramError, pubkey::Pubkey};

pub const T0: i64 = 1_700_000_000;

pub fn side_index(side: TokenSide) -> usize {
    side as usize
}

/// Token balances outside the ledger: user wallets plus the two holding accounts.
#[derive(Debug, Default, Clone)]
pub struct Balances {
    pub holding: [u64; 2],
    pub wallets: HashMap<(Pubkey, usize), u64>,
}

impl Balances {
    pub fn wallet(&self, user: &Pubkey, side: TokenSide) -> u64 {
        self.wallets.get(&(*user, side_index(side))).copied().unwrap_or(0)
    }

    fn slot(&mut self, user: &Pubkey, custody: Custody) -> &mut u64 {
        match custody {
            Custody::User(side) => self.wallets.entry((*user, side_index(side))).or_insert(0),
            Custody::Holding(side) => &mut self.holding[side_index(side)],
        }
    }
}

/// Custody that moves balances in memory. All-or-nothing like SPL Token.
pub struct MemoryCustody<'a> {
    pub user: Pubkey,
    pub balances: &'a mut Balances,
    pub fail: bool,
}

impl TokenCustody for MemoryCustody<'_> {
    fn transfer(&mut self, request: &TransferRequest) -> ProgramResult {
        if self.fail {
            return Err(ProgramError::Custom(u32::MAX));
        }
        let source = *self.balances.slot(&self.user, request.from);
        if source < request.amount {
            return Err(ProgramError::InsufficientFunds);
        }
        let dest = *self.balances.slot(&self.user, request.to);
        let credited = dest
            .checked_add(request.amount)
            .ok_or(ProgramError::ArithmeticOverflow)?;
        *self.balances.slot(&self.user, request.from) = source - request.amount;
        *self.balances.slot(&self.user, request.to) = credited;
        Ok(())
    }
}

pub struct Pool {
    pub vault_key: Pubkey,
    pub vault: Vault,
    pub positions: HashMap<Pubkey, UserPosition>,
    pub balances: Balances,
    pub now: i64,
    pub fail_transfers: bool,
}

impl Pool {
    pub fn new(config: RewardConfig) -> Self {
        let vault_key = Pubkey::new_unique();
        let addresses = VaultAddresses {
            vault_bump: 255,
            token_a_vault: (Pubkey::new_unique(), 254),
            token_b_vault: (Pubkey::new_unique(), 253),
        };
        let vault = ledger::initialize(
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            &addresses,
            config,
            T0,
        )
        .expect("valid config");
        Self {
            vault_key,
            vault,
            positions: HashMap::new(),
            balances: Balances::default(),
            now: T0,
            fail_transfers: false,
        }
    }

    pub fn no_rewards() -> Self {
        Self::new(RewardConfig {
            rate_bps: 0,
            max_bonus_bps: 0,
            bonus_ramp_secs: 0,
        })
    }

    pub fn fund(&mut self, user: &Pubkey, side: TokenSide, amount: u64) {
        *self.balances.slot(user, Custody::User(side)) += amount;
    }

    /// Plain token transfer into the token A holding account, outside the program.
    pub fn donate_reserve(&mut self, amount: u64) {
        self.balances.holding[0] += amount;
    }

    pub fn advance(&mut self, secs: i64) {
        self.now += secs;
    }

    pub fn position(&self, user: &Pubkey) -> Option<UserPosition> {
        self.positions.get(user).copied()
    }

    pub fn deposit(&mut self, user: &Pubkey, side: TokenSide, amount: u64) -> Result<(), ProgramError> {
        let position = self
            .positions
            .get(user)
            .copied()
            .unwrap_or_else(|| ledger::open_position(user, &self.vault_key, 255, self.now));
        let transition = ledger::add_liquidity(&self.vault, &position, side, amount, self.now)?;
        self.commit(user, transition)
    }

    pub fn withdraw(&mut self, user: &Pubkey, side: TokenSide, amount: u64) -> Result<(), ProgramError> {
        let position = self.positions.get(user).copied().ok_or(VaultError::NotInitialized)?;
        let transition = ledger::remove_liquidity(&self.vault, &position, side, amount, self.now)?;
        self.commit(user, transition)
    }

    pub fn claim(&mut self, user: &Pubkey) -> Result<u64, ProgramError> {
        let position = self.positions.get(user).copied().ok_or(VaultError::NotInitialized)?;
        let transition =
            ledger::claim_rewards(&self.vault, &position, self.balances.holding[0], self.now)?;
        let reward = transition.transfer.amount;
        self.commit(user, transition)?;
        Ok(reward)
    }

    pub fn sum_positions(&self, side: TokenSide) -> u128 {
        self.positions.values().map(|p| p.amount(side) as u128).sum()
    }

    fn commit(&mut self, user: &Pubkey, transition: ledger::Transition) -> Result<(), ProgramError> {
        let mut custody = MemoryCustody {
            user: *user,
            balances: &mut self.balances,
            fail: self.fail_transfers,
        };
        let (vault, position) = ledger::settle(transition, &mut custody)?;
        self.vault = vault;
        self.positions.insert(*user, position);
        Ok(())
    }
}
