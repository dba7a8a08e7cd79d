//! Pure reward and counter math.
//!
//! No Solana/Pubkey dependencies. Just arithmetic, so the same functions
//! back the ledger, the property tests and the Kani proofs.

/// Basis-point denominator (10_000 = 100%).
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Seconds in a 365-day year. Reward rates are annualized against this.
pub const SECONDS_PER_YEAR: u64 = 365 * 86_400;

/// Upper bound on the annual reward rate accepted at Initialize (100x per year).
pub const MAX_RATE_BPS: u64 = 1_000_000;

/// Upper bound on the loyalty bonus accepted at Initialize (+10x).
pub const MAX_BONUS_BPS: u64 = 100_000;

/// Add to a staked counter.
///
/// # Returns
/// * `None` - the sum does not fit in u64
pub fn credit(balance: u64, amount: u64) -> Option<u64> {
    balance.checked_add(amount)
}

/// Subtract from a staked counter.
///
/// # Returns
/// * `None` - `amount > balance` (never wraps)
pub fn debit(balance: u64, amount: u64) -> Option<u64> {
    balance.checked_sub(amount)
}

/// Seconds from `from` to `now`, clamped at zero when the clock is behind.
pub fn elapsed_secs(from: i64, now: i64) -> u64 {
    let delta = (now as i128) - (from as i128);
    if delta <= 0 {
        0
    } else {
        // Difference of two i64 values always fits in u64 when positive.
        delta as u64
    }
}

/// Loyalty bonus accumulated over a holding window, in bps x seconds.
///
/// The instantaneous bonus ramps linearly from 0 at `held_from = 0` to
/// `max_bonus_bps` at `ramp_secs`, then stays flat. This integrates it from
/// `held_from` to `held_to` (both measured from the first deposit), so one
/// long window and the same span split into shorter windows earn the same
/// bonus, up to round-down. A zero ramp grants the full bonus throughout.
///
/// # Returns
/// * `None` - `held_from > held_to` or an intermediate overflows u128
pub fn loyalty_bonus_bps_secs(
    held_from: u64,
    held_to: u64,
    max_bonus_bps: u64,
    ramp_secs: u64,
) -> Option<u128> {
    let span = held_to.checked_sub(held_from)?;
    if max_bonus_bps == 0 || span == 0 {
        return Some(0);
    }
    if ramp_secs == 0 {
        return (max_bonus_bps as u128).checked_mul(span as u128);
    }

    // Twice the integral of min(h, ramp) dh, kept doubled to stay in integers.
    let lo = held_from.min(ramp_secs) as u128;
    let hi = held_to.min(ramp_secs) as u128;
    let ramping = (hi - lo).checked_mul(hi + lo)?;
    let flat_secs = held_to.saturating_sub(held_from.max(ramp_secs)) as u128;
    let flat = flat_secs.checked_mul(2 * ramp_secs as u128)?;

    (max_bonus_bps as u128)
        .checked_mul(ramping.checked_add(flat)?)?
        .checked_div(2 * ramp_secs as u128)
}

/// Reward accrued on `amount_a` over `elapsed_secs` with `bonus_bps_secs`
/// of loyalty bonus accumulated over the same window.
///
/// `reward = amount * rate_bps * (10_000 * elapsed + bonus_bps_secs)
///           / (10_000 * SECONDS_PER_YEAR * 10_000)`
///
/// # Returns
/// * `Some(reward)` - rounded DOWN (vault-favoring)
/// * `None` - an intermediate overflows u128 or the result exceeds u64
pub fn accrued_reward(
    amount_a: u64,
    rate_bps: u64,
    elapsed_secs: u64,
    bonus_bps_secs: u128,
) -> Option<u64> {
    if amount_a == 0 || rate_bps == 0 || elapsed_secs == 0 {
        return Some(0);
    }
    let weighted_secs = (BPS_DENOMINATOR as u128)
        .checked_mul(elapsed_secs as u128)?
        .checked_add(bonus_bps_secs)?;
    let numerator = (amount_a as u128)
        .checked_mul(rate_bps as u128)?
        .checked_mul(weighted_secs)?;
    let denominator = (BPS_DENOMINATOR as u128)
        * (SECONDS_PER_YEAR as u128)
        * (BPS_DENOMINATOR as u128);
    u64::try_from(numerator / denominator).ok()
}

/// Token-A balance available for rewards: whatever the holding account
/// carries above staked principal. Principal is never paid out as reward.
pub fn reward_reserve(holding_balance: u64, staked_principal: u64) -> u64 {
    holding_balance.saturating_sub(staked_principal)
}
