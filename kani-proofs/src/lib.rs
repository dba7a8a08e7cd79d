//! Kani formal verification for liquidity-vault position accounting.
//!
//! ZERO dependencies. Pure Rust. CBMC-friendly.
//!
//! Counters are u32 with u64 intermediates instead of u64/u128. The
//! properties (conservation, no overdraw, reward bounds) are scale-invariant
//! and the narrow types keep SAT formulas tractable.
//!
//! Run all:   cargo kani --lib
//! Run one:   cargo kani --harness proof_two_users_conservation

// ═══════════════════════════════════════════════════════════════
// Ledger model (u32 mirror of liquidity-vault/src/ledger.rs)
// ═══════════════════════════════════════════════════════════════

/// Seconds in the model's reward year. Small so proofs can cover whole years.
pub const YEAR: u32 = 64;

/// Basis-point denominator.
pub const BPS: u64 = 10_000;

#[derive(Clone, Copy, Default)]
pub struct Ledger {
    pub total: u32,
    pub positions: [u32; 2],
}

impl Ledger {
    /// Deposit. Rejects zero and any overflow of the position or the total.
    pub fn add(&self, user: usize, amount: u32) -> Option<Ledger> {
        if amount == 0 {
            return None;
        }
        let mut next = *self;
        next.positions[user] = self.positions[user].checked_add(amount)?;
        next.total = self.total.checked_add(amount)?;
        Some(next)
    }

    /// Withdraw. Never more than the caller's own position.
    pub fn remove(&self, user: usize, amount: u32) -> Option<Ledger> {
        if amount == 0 || amount > self.positions[user] {
            return None;
        }
        let mut next = *self;
        next.positions[user] = self.positions[user].checked_sub(amount)?;
        next.total = self.total.checked_sub(amount)?;
        Some(next)
    }

    pub fn sum(&self) -> u64 {
        self.positions[0] as u64 + self.positions[1] as u64
    }
}

/// floor(amount * rate_bps * elapsed * (BPS + bonus) / (BPS * YEAR * BPS))
pub fn accrued(amount: u32, rate_bps: u32, elapsed: u32, bonus_bps: u32) -> Option<u32> {
    let num = (amount as u128)
        .checked_mul(rate_bps as u128)?
        .checked_mul(elapsed as u128)?
        .checked_mul(BPS as u128 + bonus_bps as u128)?;
    let den = BPS as u128 * YEAR as u128 * BPS as u128;
    u32::try_from(num / den).ok()
}

// ═══════════════════════════════════════════════════════════════
// KANI PROOFS
// ═══════════════════════════════════════════════════════════════

#[cfg(kani)]
mod proofs {
    use super::*;

    // ── 1. Conservation ──

    /// Total always equals the sum of positions after any two operations.
    #[kani::proof]
    fn proof_two_users_conservation() {
        let mut ledger = Ledger::default();
        for _ in 0..2 {
            let user: usize = if kani::any() { 1 } else { 0 };
            let amount: u32 = kani::any();
            let next = if kani::any() {
                ledger.add(user, amount)
            } else {
                ledger.remove(user, amount)
            };
            if let Some(n) = next {
                ledger = n;
            }
            assert_eq!(ledger.total as u64, ledger.sum());
        }
    }

    /// Deposit then withdraw of the same amount restores the ledger.
    #[kani::proof]
    fn proof_add_remove_roundtrip() {
        let start = Ledger {
            total: kani::any(),
            positions: [0, 0],
        };
        kani::assume(start.total == 0);
        let amount: u32 = kani::any();
        let after = match start.add(0, amount) {
            Some(l) => l,
            None => return,
        };
        let back = after.remove(0, amount).unwrap();
        assert_eq!(back.total, start.total);
        assert_eq!(back.positions, start.positions);
    }

    // ── 2. Isolation ──

    /// A withdrawal can never reach another user's funds.
    #[kani::proof]
    fn proof_withdraw_isolated() {
        let a: u32 = kani::any();
        let b: u32 = kani::any();
        kani::assume(a.checked_add(b).is_some());
        let ledger = Ledger { total: a + b, positions: [a, b] };

        let amount: u32 = kani::any();
        match ledger.remove(0, amount) {
            Some(next) => {
                assert!(amount <= a);
                assert_eq!(next.positions[1], b);
            }
            None => assert!(amount == 0 || amount > a),
        }
    }

    /// Overflow is refused and leaves nothing changed.
    #[kani::proof]
    fn proof_overflow_refused() {
        let ledger = Ledger { total: u32::MAX, positions: [u32::MAX, 0] };
        let amount: u32 = kani::any();
        kani::assume(amount > 0);
        assert!(ledger.add(1, amount).is_none());
    }

    // ── 3. Reward Bounds ──

    /// Nothing staked earns nothing.
    #[kani::proof]
    fn proof_zero_stake_zero_reward() {
        assert_eq!(accrued(0, kani::any(), kani::any(), kani::any()), Some(0));
    }

    /// A full year at 100% with no bonus pays exactly the stake.
    #[kani::proof]
    fn proof_full_year_exact() {
        let amount: u32 = kani::any();
        assert_eq!(accrued(amount, BPS as u32, YEAR, 0), Some(amount));
    }

    /// Longer elapsed time never lowers the reward.
    #[kani::proof]
    fn proof_reward_monotone() {
        let amount: u32 = kani::any();
        let rate: u32 = kani::any();
        let t1: u32 = kani::any();
        let t2: u32 = kani::any();
        kani::assume(rate <= BPS as u32);
        kani::assume(t1 <= t2 && t2 <= YEAR);

        let r1 = accrued(amount, rate, t1, 0).unwrap();
        let r2 = accrued(amount, rate, t2, 0).unwrap();
        assert!(r2 >= r1);
    }
}
