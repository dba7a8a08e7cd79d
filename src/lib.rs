//! Liquidity Vault Program
//!
//! Shared two-token pool. Users deposit token A or token B into vault-owned
//! holding accounts, the vault tracks each user's contribution in a per-user
//! position, and stakers of token A accrue time-based rewards paid in token A.
//!
//! Architecture:
//! - The vault PDA (["vault"]) is a singleton and the token authority of both
//!   holding accounts, so only this program can move pooled tokens
//! - Positions are PDAs (["user_stake", user]) created on first deposit
//! - Handlers in `ledger` are pure: they stage new state plus one transfer;
//!   `processor` issues the transfer and persists only after it succeeds
//! - Rewards are paid from token A held above staked principal, never from
//!   principal itself
//!
//! Instructions:
//!   0 - Initialize:       Create vault and both holding accounts
//!   1 - AddLiquidity:     Deposit token A or B, opening a position if needed
//!   2 - RemoveLiquidity:  Withdraw up to the caller's recorded position
//!   3 - ClaimRewards:     Pay accrued token A rewards

pub mod error;
pub mod instruction;
pub mod ledger;
pub mod math;
pub mod pda;
pub mod processor;
pub mod state;

#[cfg(not(feature = "no-entrypoint"))]
mod entrypoint;

solana_program::declare_id!("78V1S4FQ256qFjNCS1wbsrDem9AjCfeZdU3cwajdq9SG");
