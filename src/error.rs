use solana_program::program_error::ProgramError;

/// Stable, numbered error codes. Callers match on the custom code, so
/// existing discriminants must never be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum VaultError {
    /// Withdrawal requested against a position lacking sufficient recorded balance
    InsufficientStake = 0,
    /// Arithmetic accumulation would exceed the u64 range
    NumberOverflow = 1,
    /// Initialize invoked against an existing vault
    AlreadyInitialized = 2,
    /// Claim invoked when the computed reward is zero
    NoRewardsAvailable = 3,
    /// Vault or user position does not exist yet
    NotInitialized = 4,
    /// Zero amount
    ZeroAmount = 5,
    /// Address does not match its seed derivation
    InvalidPda = 6,
    /// Token identity mismatch
    InvalidMint = 7,
    /// Caller token account has the wrong mint or owner
    InvalidTokenAccount = 8,
    /// Position belongs to someone else
    Unauthorized = 9,
    /// Reward exceeds the token-A balance held above staked principal
    RewardReserveExhausted = 10,
    /// Initialize parameters out of range
    InvalidRewardConfig = 11,
    /// Account too small or not owned by this program
    InvalidAccountData = 12,
}

impl From<VaultError> for ProgramError {
    fn from(e: VaultError) -> Self {
        ProgramError::Custom(e as u32)
    }
}
