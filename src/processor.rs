use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    msg,
    program::{invoke, invoke_signed},
    program_error::ProgramError,
    program_pack::Pack,
    pubkey::Pubkey,
    rent::Rent,
    system_instruction,
    sysvar::{clock::Clock, Sysvar},
};
use spl_token::state::{Account as TokenAccount, Mint};

use crate::error::VaultError;
use crate::instruction::VaultInstruction;
use crate::ledger::{self, Custody, TokenCustody, TokenSide, TransferRequest, VaultAddresses};
use crate::pda;
use crate::state::{self, RewardConfig, UserPosition, Vault, USER_POSITION_SIZE, VAULT_SIZE};

/// Verify the token program is the real SPL Token program.
/// Without this check a fake program would receive the vault PDA's signer
/// authority through invoke_signed and could drain the holding accounts.
fn verify_token_program(token_program: &AccountInfo) -> ProgramResult {
    if *token_program.key != spl_token::id() {
        msg!("Error: invalid token program {}", token_program.key);
        return Err(ProgramError::IncorrectProgramId);
    }
    Ok(())
}

pub fn process(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    let instruction = VaultInstruction::unpack(instruction_data)?;

    match instruction {
        VaultInstruction::Initialize { reward_config } => {
            process_initialize(program_id, accounts, reward_config)
        }
        VaultInstruction::AddLiquidity { amount, side } => {
            process_add_liquidity(program_id, accounts, amount, side)
        }
        VaultInstruction::RemoveLiquidity { amount, side } => {
            process_remove_liquidity(program_id, accounts, amount, side)
        }
        VaultInstruction::ClaimRewards => process_claim_rewards(program_id, accounts),
    }
}

// ═══════════════════════════════════════════════════════════════
// Account loading
// ═══════════════════════════════════════════════════════════════

/// Load the vault singleton, checking address, owner and initialization.
fn load_vault(program_id: &Pubkey, vault_ai: &AccountInfo) -> Result<Vault, ProgramError> {
    let (expected_vault, _) = pda::derive_vault(program_id);
    if *vault_ai.key != expected_vault {
        return Err(VaultError::InvalidPda.into());
    }
    if vault_ai.data_is_empty() {
        return Err(VaultError::NotInitialized.into());
    }
    if vault_ai.owner != program_id {
        return Err(VaultError::InvalidAccountData.into());
    }
    let vault = state::read_vault(&vault_ai.try_borrow_data()?)?;
    if vault.is_initialized != 1 {
        return Err(VaultError::NotInitialized.into());
    }
    Ok(vault)
}

/// Load an existing position and check it belongs to `user`.
fn load_position(
    program_id: &Pubkey,
    position_ai: &AccountInfo,
    user: &Pubkey,
) -> Result<UserPosition, ProgramError> {
    if position_ai.owner != program_id {
        return Err(VaultError::InvalidAccountData.into());
    }
    let position = state::read_position(&position_ai.try_borrow_data()?)?;
    if position.is_initialized != 1 {
        return Err(VaultError::NotInitialized.into());
    }
    if position.owner_pubkey() != *user {
        return Err(VaultError::Unauthorized.into());
    }
    Ok(position)
}

fn verify_position_address(
    program_id: &Pubkey,
    position_ai: &AccountInfo,
    user: &Pubkey,
) -> Result<u8, ProgramError> {
    let (expected_position, bump) = pda::derive_position(program_id, user);
    if *position_ai.key != expected_position {
        return Err(VaultError::InvalidPda.into());
    }
    Ok(bump)
}

fn read_token_account(token_ai: &AccountInfo) -> Result<TokenAccount, ProgramError> {
    if *token_ai.owner != spl_token::id() {
        return Err(VaultError::InvalidTokenAccount.into());
    }
    TokenAccount::unpack(&token_ai.try_borrow_data()?)
}

/// The caller's external account must hold the expected mint and be owned by them.
fn verify_user_token_account(token_ai: &AccountInfo, user: &Pubkey, mint: &Pubkey) -> ProgramResult {
    let account = read_token_account(token_ai)?;
    if account.mint != *mint || account.owner != *user {
        return Err(VaultError::InvalidTokenAccount.into());
    }
    Ok(())
}

fn verify_holding(vault: &Vault, side: TokenSide, holding_ai: &AccountInfo) -> ProgramResult {
    if *holding_ai.key != vault.holding(side) {
        return Err(VaultError::InvalidPda.into());
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════
// SPL Token custody
// ═══════════════════════════════════════════════════════════════

/// Moves tokens between one user account and the matching holding account
/// via the SPL Token program. Outbound transfers are signed by the vault PDA.
struct SplTokenCustody<'a, 'info> {
    side: TokenSide,
    token_program: &'a AccountInfo<'info>,
    user: &'a AccountInfo<'info>,
    user_token: &'a AccountInfo<'info>,
    holding: &'a AccountInfo<'info>,
    vault: &'a AccountInfo<'info>,
    vault_bump: u8,
}

impl TokenCustody for SplTokenCustody<'_, '_> {
    fn transfer(&mut self, request: &TransferRequest) -> ProgramResult {
        let sides = match (request.from, request.to) {
            (Custody::User(from), Custody::Holding(to)) | (Custody::Holding(from), Custody::User(to)) => {
                (from, to)
            }
            _ => return Err(ProgramError::InvalidArgument),
        };
        if sides != (self.side, self.side) {
            return Err(ProgramError::InvalidArgument);
        }

        if request.vault_signs() {
            let vault_seeds: &[&[u8]] = &[pda::SEED_VAULT, &[self.vault_bump]];
            invoke_signed(
                &spl_token::instruction::transfer(
                    self.token_program.key,
                    self.holding.key,
                    self.user_token.key,
                    self.vault.key,
                    &[],
                    request.amount,
                )?,
                &[
                    self.holding.clone(),
                    self.user_token.clone(),
                    self.vault.clone(),
                    self.token_program.clone(),
                ],
                &[vault_seeds],
            )
        } else {
            invoke(
                &spl_token::instruction::transfer(
                    self.token_program.key,
                    self.user_token.key,
                    self.holding.key,
                    self.user.key,
                    &[],
                    request.amount,
                )?,
                &[
                    self.user_token.clone(),
                    self.holding.clone(),
                    self.user.clone(),
                    self.token_program.clone(),
                ],
            )
        }
    }
}

/// Create a PDA account owned by `owner`.
///
/// `create_account` fails on an address that already holds lamports, and
/// anyone can send lamports to a PDA. A funded address is topped up to rent
/// exemption by `payer`, then allocated and assigned under the PDA seeds.
fn create_pda_account<'a>(
    payer: &AccountInfo<'a>,
    target: &AccountInfo<'a>,
    system_program: &AccountInfo<'a>,
    owner: &Pubkey,
    space: usize,
    rent: &Rent,
    seeds: &[&[u8]],
) -> ProgramResult {
    let required = rent.minimum_balance(space);
    let current = target.lamports();

    if current == 0 {
        return invoke_signed(
            &system_instruction::create_account(payer.key, target.key, required, space as u64, owner),
            &[payer.clone(), target.clone(), system_program.clone()],
            &[seeds],
        );
    }

    let shortfall = required.saturating_sub(current);
    if shortfall > 0 {
        invoke(
            &system_instruction::transfer(payer.key, target.key, shortfall),
            &[payer.clone(), target.clone(), system_program.clone()],
        )?;
    }
    invoke_signed(
        &system_instruction::allocate(target.key, space as u64),
        &[target.clone(), system_program.clone()],
        &[seeds],
    )?;
    invoke_signed(
        &system_instruction::assign(target.key, owner),
        &[target.clone(), system_program.clone()],
        &[seeds],
    )
}

// ═══════════════════════════════════════════════════════════════
// 0: Initialize
// ═══════════════════════════════════════════════════════════════

fn process_initialize(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    reward_config: RewardConfig,
) -> ProgramResult {
    let accounts_iter = &mut accounts.iter();

    let admin = next_account_info(accounts_iter)?;
    let vault_ai = next_account_info(accounts_iter)?;
    let holding_a = next_account_info(accounts_iter)?;
    let holding_b = next_account_info(accounts_iter)?;
    let mint_a = next_account_info(accounts_iter)?;
    let mint_b = next_account_info(accounts_iter)?;
    let token_program = next_account_info(accounts_iter)?;
    let system_program = next_account_info(accounts_iter)?;
    let rent_sysvar = next_account_info(accounts_iter)?;
    let clock_sysvar = next_account_info(accounts_iter)?;

    if !admin.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }

    let (expected_vault, vault_bump) = pda::derive_vault(program_id);
    if *vault_ai.key != expected_vault {
        return Err(VaultError::InvalidPda.into());
    }
    if !vault_ai.data_is_empty() {
        return Err(VaultError::AlreadyInitialized.into());
    }

    let (expected_a, bump_a) = pda::derive_holding(program_id, &expected_vault, TokenSide::A);
    let (expected_b, bump_b) = pda::derive_holding(program_id, &expected_vault, TokenSide::B);
    if *holding_a.key != expected_a || *holding_b.key != expected_b {
        return Err(VaultError::InvalidPda.into());
    }

    // Validate token program BEFORE any invoke_signed that grants PDA signer authority
    verify_token_program(token_program)?;

    for mint in [mint_a, mint_b] {
        if *mint.owner != spl_token::id() {
            return Err(VaultError::InvalidMint.into());
        }
        Mint::unpack(&mint.try_borrow_data()?)?;
    }

    let clock = Clock::from_account_info(clock_sysvar)?;
    let rent = Rent::from_account_info(rent_sysvar)?;

    let addresses = VaultAddresses {
        vault_bump,
        token_a_vault: (expected_a, bump_a),
        token_b_vault: (expected_b, bump_b),
    };
    let vault = ledger::initialize(
        admin.key,
        mint_a.key,
        mint_b.key,
        &addresses,
        reward_config,
        clock.unix_timestamp,
    )?;

    // Create vault PDA account
    let vault_seeds: &[&[u8]] = &[pda::SEED_VAULT, &[vault_bump]];
    create_pda_account(admin, vault_ai, system_program, program_id, VAULT_SIZE, &rent, vault_seeds)?;

    for (side, holding, mint, bump) in [
        (TokenSide::A, holding_a, mint_a, bump_a),
        (TokenSide::B, holding_b, mint_b, bump_b),
    ] {
        let holding_seeds: &[&[u8]] = &[pda::holding_seed(side), vault_ai.key.as_ref(), &[bump]];
        create_pda_account(
            admin,
            holding,
            system_program,
            &spl_token::id(),
            TokenAccount::LEN,
            &rent,
            holding_seeds,
        )?;

        // Holding authority = vault PDA
        invoke(
            &spl_token::instruction::initialize_account(
                token_program.key,
                holding.key,
                mint.key,
                vault_ai.key,
            )?,
            &[holding.clone(), mint.clone(), vault_ai.clone(), rent_sysvar.clone(), token_program.clone()],
        )?;
    }

    state::write(&mut vault_ai.try_borrow_mut_data()?[..], &vault)?;

    msg!(
        "Vault initialized: token A {}, token B {}, rate {} bps",
        mint_a.key,
        mint_b.key,
        reward_config.rate_bps
    );
    Ok(())
}

// ═══════════════════════════════════════════════════════════════
// 1: AddLiquidity
// ═══════════════════════════════════════════════════════════════

fn process_add_liquidity(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    amount: u64,
    side: TokenSide,
) -> ProgramResult {
    if amount == 0 {
        return Err(VaultError::ZeroAmount.into());
    }

    let accounts_iter = &mut accounts.iter();

    let user = next_account_info(accounts_iter)?;
    let vault_ai = next_account_info(accounts_iter)?;
    let position_ai = next_account_info(accounts_iter)?;
    let user_token = next_account_info(accounts_iter)?;
    let holding = next_account_info(accounts_iter)?;
    let token_program = next_account_info(accounts_iter)?;
    let system_program = next_account_info(accounts_iter)?;
    let clock_sysvar = next_account_info(accounts_iter)?;

    if !user.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }

    let vault = load_vault(program_id, vault_ai)?;
    verify_token_program(token_program)?;
    verify_holding(&vault, side, holding)?;
    verify_user_token_account(user_token, user.key, &vault.mint(side))?;
    let position_bump = verify_position_address(program_id, position_ai, user.key)?;

    let clock = Clock::from_account_info(clock_sysvar)?;
    let now = clock.unix_timestamp;

    // Create if absent, else load
    let is_new = position_ai.data_is_empty();
    let position = if is_new {
        ledger::open_position(user.key, vault_ai.key, position_bump, now)
    } else {
        load_position(program_id, position_ai, user.key)?
    };

    let transition = ledger::add_liquidity(&vault, &position, side, amount, now)?;
    let mut custody = SplTokenCustody {
        side,
        token_program,
        user,
        user_token,
        holding,
        vault: vault_ai,
        vault_bump: vault.bump,
    };
    let (vault, position) = ledger::settle(transition, &mut custody)?;

    if is_new {
        let position_seeds: &[&[u8]] = &[pda::SEED_USER_STAKE, user.key.as_ref(), &[position_bump]];
        let rent = Rent::get()?;
        create_pda_account(
            user,
            position_ai,
            system_program,
            program_id,
            USER_POSITION_SIZE,
            &rent,
            position_seeds,
        )?;
    }

    state::write(&mut vault_ai.try_borrow_mut_data()?[..], &vault)?;
    state::write(&mut position_ai.try_borrow_mut_data()?[..], &position)?;

    msg!(
        "Deposited {} of token {:?}; position {}, vault total {}",
        amount,
        side,
        position.amount(side),
        vault.total_staked(side)
    );
    Ok(())
}

// ═══════════════════════════════════════════════════════════════
// 2: RemoveLiquidity
// ═══════════════════════════════════════════════════════════════

fn process_remove_liquidity(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    amount: u64,
    side: TokenSide,
) -> ProgramResult {
    if amount == 0 {
        return Err(VaultError::ZeroAmount.into());
    }

    let accounts_iter = &mut accounts.iter();

    let user = next_account_info(accounts_iter)?;
    let vault_ai = next_account_info(accounts_iter)?;
    let position_ai = next_account_info(accounts_iter)?;
    let user_token = next_account_info(accounts_iter)?;
    let holding = next_account_info(accounts_iter)?;
    let token_program = next_account_info(accounts_iter)?;
    let clock_sysvar = next_account_info(accounts_iter)?;

    if !user.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }

    let vault = load_vault(program_id, vault_ai)?;
    verify_token_program(token_program)?;
    verify_holding(&vault, side, holding)?;
    verify_user_token_account(user_token, user.key, &vault.mint(side))?;
    verify_position_address(program_id, position_ai, user.key)?;
    if position_ai.data_is_empty() {
        return Err(VaultError::NotInitialized.into());
    }
    let position = load_position(program_id, position_ai, user.key)?;

    let clock = Clock::from_account_info(clock_sysvar)?;

    let transition = ledger::remove_liquidity(&vault, &position, side, amount, clock.unix_timestamp)?;
    let mut custody = SplTokenCustody {
        side,
        token_program,
        user,
        user_token,
        holding,
        vault: vault_ai,
        vault_bump: vault.bump,
    };
    let (vault, position) = ledger::settle(transition, &mut custody)?;

    state::write(&mut vault_ai.try_borrow_mut_data()?[..], &vault)?;
    state::write(&mut position_ai.try_borrow_mut_data()?[..], &position)?;

    msg!(
        "Withdrew {} of token {:?}; position {}, vault total {}",
        amount,
        side,
        position.amount(side),
        vault.total_staked(side)
    );
    Ok(())
}

// ═══════════════════════════════════════════════════════════════
// 3: ClaimRewards
// ═══════════════════════════════════════════════════════════════

fn process_claim_rewards(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
    let accounts_iter = &mut accounts.iter();

    let user = next_account_info(accounts_iter)?;
    let vault_ai = next_account_info(accounts_iter)?;
    let position_ai = next_account_info(accounts_iter)?;
    let user_token_a = next_account_info(accounts_iter)?;
    let holding_a = next_account_info(accounts_iter)?;
    let token_program = next_account_info(accounts_iter)?;
    let clock_sysvar = next_account_info(accounts_iter)?;

    if !user.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }

    let vault = load_vault(program_id, vault_ai)?;
    verify_token_program(token_program)?;
    verify_holding(&vault, TokenSide::A, holding_a)?;
    verify_user_token_account(user_token_a, user.key, &vault.mint(TokenSide::A))?;
    verify_position_address(program_id, position_ai, user.key)?;
    if position_ai.data_is_empty() {
        return Err(VaultError::NotInitialized.into());
    }
    let position = load_position(program_id, position_ai, user.key)?;

    let holding_balance = read_token_account(holding_a)?.amount;
    let clock = Clock::from_account_info(clock_sysvar)?;

    let transition = ledger::claim_rewards(&vault, &position, holding_balance, clock.unix_timestamp)?;
    let reward = transition.transfer.amount;
    let mut custody = SplTokenCustody {
        side: TokenSide::A,
        token_program,
        user,
        user_token: user_token_a,
        holding: holding_a,
        vault: vault_ai,
        vault_bump: vault.bump,
    };
    let (vault, position) = ledger::settle(transition, &mut custody)?;

    state::write(&mut vault_ai.try_borrow_mut_data()?[..], &vault)?;
    state::write(&mut position_ai.try_borrow_mut_data()?[..], &position)?;

    msg!(
        "Claimed {} token A reward; lifetime claimed {}",
        reward,
        position.total_claimed
    );
    Ok(())
}
