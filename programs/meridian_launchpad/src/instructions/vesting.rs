/**
 * Vesting Administration & Claims
 *
 * Schedule creation for team, advisor, and community allocations, single and
 * aggregate claims, and the revocation paths. Tokens are minted on claim;
 * revocation mints the unvested remainder to the treasury instead.
 */

use anchor_lang::prelude::*;
use anchor_lang::solana_program::{program::invoke_signed, system_instruction};
use anchor_spl::associated_token::AssociatedToken;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::instructions::purchase::mint_immediate;
use crate::state::*;
use crate::{
    LaunchpadError, ScheduleCreated, ScheduleModified, SchedulePartiallyRevoked,
    ScheduleRevoked, TokensClaimed, MAX_BATCH_SCHEDULES, SALE_CONFIG_SEED, VESTING_SEED,
};

// ===== ACCOUNTS

#[derive(Accounts)]
#[instruction(beneficiary: Pubkey)]
pub struct CreateSchedule<'info> {
    #[account(
        mut,
        seeds = [SALE_CONFIG_SEED],
        bump = sale_config.bump,
        has_one = admin @ LaunchpadError::Unauthorized
    )]
    pub sale_config: Account<'info, SaleConfig>,

    #[account(
        init,
        payer = admin,
        space = VestingSchedule::LEN,
        seeds = [
            VESTING_SEED,
            beneficiary.as_ref(),
            &sale_config.total_schedules.to_le_bytes()
        ],
        bump
    )]
    pub schedule: Account<'info, VestingSchedule>,

    #[account(mut)]
    pub admin: Signer<'info>,

    pub system_program: Program<'info, System>,
}

/// Schedule PDAs are passed as remaining accounts, one per params entry,
/// in order
#[derive(Accounts)]
pub struct CreateSchedulesBatch<'info> {
    #[account(
        mut,
        seeds = [SALE_CONFIG_SEED],
        bump = sale_config.bump,
        has_one = admin @ LaunchpadError::Unauthorized
    )]
    pub sale_config: Account<'info, SaleConfig>,

    #[account(mut)]
    pub admin: Signer<'info>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
#[instruction(schedule_id: u64)]
pub struct Claim<'info> {
    #[account(
        seeds = [SALE_CONFIG_SEED],
        bump = sale_config.bump
    )]
    pub sale_config: Account<'info, SaleConfig>,

    #[account(
        mut,
        seeds = [
            VESTING_SEED,
            beneficiary.key().as_ref(),
            &schedule_id.to_le_bytes()
        ],
        bump = schedule.bump,
        has_one = beneficiary @ LaunchpadError::Unauthorized
    )]
    pub schedule: Account<'info, VestingSchedule>,

    #[account(mut, address = sale_config.mint @ LaunchpadError::InvalidTokenAccount)]
    pub mint: Account<'info, Mint>,

    #[account(
        init_if_needed,
        payer = beneficiary,
        associated_token::mint = mint,
        associated_token::authority = beneficiary
    )]
    pub beneficiary_token_account: Account<'info, TokenAccount>,

    #[account(mut)]
    pub beneficiary: Signer<'info>,

    pub token_program: Program<'info, Token>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

/// Schedules to claim from are passed as remaining accounts
#[derive(Accounts)]
pub struct ClaimAll<'info> {
    #[account(
        seeds = [SALE_CONFIG_SEED],
        bump = sale_config.bump
    )]
    pub sale_config: Account<'info, SaleConfig>,

    #[account(mut, address = sale_config.mint @ LaunchpadError::InvalidTokenAccount)]
    pub mint: Account<'info, Mint>,

    #[account(
        init_if_needed,
        payer = beneficiary,
        associated_token::mint = mint,
        associated_token::authority = beneficiary
    )]
    pub beneficiary_token_account: Account<'info, TokenAccount>,

    #[account(mut)]
    pub beneficiary: Signer<'info>,

    pub token_program: Program<'info, Token>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

/// Shared by full and partial revocation; the revoked remainder is minted
/// to the treasury's token account
#[derive(Accounts)]
#[instruction(schedule_id: u64)]
pub struct RevokeSchedule<'info> {
    #[account(
        seeds = [SALE_CONFIG_SEED],
        bump = sale_config.bump,
        has_one = admin @ LaunchpadError::Unauthorized
    )]
    pub sale_config: Account<'info, SaleConfig>,

    #[account(
        mut,
        seeds = [
            VESTING_SEED,
            schedule.beneficiary.as_ref(),
            &schedule_id.to_le_bytes()
        ],
        bump = schedule.bump
    )]
    pub schedule: Account<'info, VestingSchedule>,

    #[account(mut, address = sale_config.mint @ LaunchpadError::InvalidTokenAccount)]
    pub mint: Account<'info, Mint>,

    /// CHECK: validated against the configured treasury address
    #[account(address = sale_config.treasury @ LaunchpadError::Unauthorized)]
    pub treasury: UncheckedAccount<'info>,

    #[account(
        init_if_needed,
        payer = admin,
        associated_token::mint = mint,
        associated_token::authority = treasury
    )]
    pub treasury_token_account: Account<'info, TokenAccount>,

    #[account(mut)]
    pub admin: Signer<'info>,

    pub token_program: Program<'info, Token>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
#[instruction(schedule_id: u64)]
pub struct ModifySchedule<'info> {
    #[account(
        seeds = [SALE_CONFIG_SEED],
        bump = sale_config.bump,
        has_one = admin @ LaunchpadError::Unauthorized
    )]
    pub sale_config: Account<'info, SaleConfig>,

    #[account(
        mut,
        seeds = [
            VESTING_SEED,
            schedule.beneficiary.as_ref(),
            &schedule_id.to_le_bytes()
        ],
        bump = schedule.bump
    )]
    pub schedule: Account<'info, VestingSchedule>,

    pub admin: Signer<'info>,
}

// ===== PARAMS

#[derive(AnchorSerialize, AnchorDeserialize, Clone)]
pub struct ScheduleParams {
    pub beneficiary: Pubkey,
    pub total_amount: u64,
    pub start_time: i64,
    pub cliff_seconds: i64,
    pub duration_seconds: i64,
    pub tag: ScheduleTag,
}

// ===== HANDLERS

fn fill_schedule(
    schedule: &mut VestingSchedule,
    id: u64,
    params: &ScheduleParams,
    current_time: i64,
    bump: u8,
) {
    schedule.id = id;
    schedule.beneficiary = params.beneficiary;
    schedule.total_amount = params.total_amount;
    schedule.claimed_amount = 0;
    schedule.start_time = params.start_time;
    schedule.cliff_seconds = params.cliff_seconds;
    schedule.duration_seconds = params.duration_seconds;
    schedule.tag = params.tag;
    schedule.revoked = false;
    schedule.vested_at_revocation = 0;
    schedule.revoked_at = 0;
    schedule.created_at = current_time;
    schedule.bump = bump;
}

pub fn create_schedule_handler(
    ctx: Context<CreateSchedule>,
    beneficiary: Pubkey,
    total_amount: u64,
    start_time: i64,
    cliff_seconds: i64,
    duration_seconds: i64,
    tag: ScheduleTag,
) -> Result<()> {
    let current_time = Clock::get()?.unix_timestamp;
    VestingSchedule::validate_terms(total_amount, cliff_seconds, duration_seconds)?;
    require!(start_time >= current_time, LaunchpadError::InvalidSchedule);

    let sale = &mut ctx.accounts.sale_config;
    let id = sale.total_schedules;
    let params = ScheduleParams {
        beneficiary,
        total_amount,
        start_time,
        cliff_seconds,
        duration_seconds,
        tag,
    };
    fill_schedule(
        &mut ctx.accounts.schedule,
        id,
        &params,
        current_time,
        ctx.bumps.schedule,
    );
    sale.total_schedules = sale.total_schedules.saturating_add(1);

    emit!(ScheduleCreated {
        schedule_id: id,
        beneficiary,
        total_amount,
        start_time,
        cliff_seconds,
        duration_seconds,
        tag,
    });

    Ok(())
}

pub fn create_schedules_batch_handler<'info>(
    ctx: Context<'_, '_, 'info, 'info, CreateSchedulesBatch<'info>>,
    params: Vec<ScheduleParams>,
) -> Result<()> {
    let current_time = Clock::get()?.unix_timestamp;

    require!(!params.is_empty(), LaunchpadError::InvalidSchedule);
    require!(params.len() <= MAX_BATCH_SCHEDULES, LaunchpadError::BatchTooLarge);
    require!(
        ctx.remaining_accounts.len() == params.len(),
        LaunchpadError::InvalidSchedule
    );

    let rent = Rent::get()?;
    let lamports = rent.minimum_balance(VestingSchedule::LEN);
    let admin = &ctx.accounts.admin;

    for (entry, account_info) in params.iter().zip(ctx.remaining_accounts.iter()) {
        VestingSchedule::validate_terms(
            entry.total_amount,
            entry.cliff_seconds,
            entry.duration_seconds,
        )?;
        require!(entry.start_time >= current_time, LaunchpadError::InvalidSchedule);

        let id = ctx.accounts.sale_config.total_schedules;
        let id_bytes = id.to_le_bytes();
        let (expected, bump) = Pubkey::find_program_address(
            &[VESTING_SEED, entry.beneficiary.as_ref(), &id_bytes],
            &crate::ID,
        );
        require!(account_info.key() == expected, LaunchpadError::InvalidSchedule);
        require!(account_info.data_is_empty(), LaunchpadError::InvalidSchedule);

        let seeds: &[&[u8]] = &[VESTING_SEED, entry.beneficiary.as_ref(), &id_bytes, &[bump]];
        invoke_signed(
            &system_instruction::create_account(
                &admin.key(),
                &expected,
                lamports,
                VestingSchedule::LEN as u64,
                &crate::ID,
            ),
            &[
                admin.to_account_info(),
                account_info.clone(),
                ctx.accounts.system_program.to_account_info(),
            ],
            &[seeds],
        )?;

        let mut schedule = VestingSchedule {
            id: 0,
            beneficiary: Pubkey::default(),
            total_amount: 0,
            claimed_amount: 0,
            start_time: 0,
            cliff_seconds: 0,
            duration_seconds: 0,
            tag: ScheduleTag::SalePurchase,
            revoked: false,
            vested_at_revocation: 0,
            revoked_at: 0,
            created_at: 0,
            bump: 0,
            reserved: [0; 16],
        };
        fill_schedule(&mut schedule, id, entry, current_time, bump);

        let mut data = account_info.try_borrow_mut_data()?;
        schedule.try_serialize(&mut &mut data[..])?;

        ctx.accounts.sale_config.total_schedules =
            ctx.accounts.sale_config.total_schedules.saturating_add(1);

        emit!(ScheduleCreated {
            schedule_id: id,
            beneficiary: entry.beneficiary,
            total_amount: entry.total_amount,
            start_time: entry.start_time,
            cliff_seconds: entry.cliff_seconds,
            duration_seconds: entry.duration_seconds,
            tag: entry.tag,
        });
    }

    msg!("Created {} schedules", params.len());
    Ok(())
}

pub fn claim_handler(ctx: Context<Claim>, _schedule_id: u64) -> Result<()> {
    let current_time = Clock::get()?.unix_timestamp;
    require!(!ctx.accounts.sale_config.paused, LaunchpadError::Paused);

    let amount = ctx.accounts.schedule.claimable_amount(current_time);
    if amount == 0 {
        return Ok(());
    }

    {
        let schedule = &mut ctx.accounts.schedule;
        schedule.claimed_amount = schedule
            .claimed_amount
            .checked_add(amount)
            .ok_or(LaunchpadError::MathOverflow)?;
    }

    let sale_bump = ctx.accounts.sale_config.bump;
    mint_immediate(
        &ctx.accounts.token_program,
        &ctx.accounts.mint,
        &ctx.accounts.beneficiary_token_account,
        ctx.accounts.sale_config.to_account_info(),
        sale_bump,
        amount,
    )?;

    emit!(TokensClaimed {
        schedule_id: ctx.accounts.schedule.id,
        beneficiary: ctx.accounts.schedule.beneficiary,
        amount,
        total_claimed: ctx.accounts.schedule.claimed_amount,
    });

    Ok(())
}

pub fn claim_all_handler<'info>(
    ctx: Context<'_, '_, 'info, 'info, ClaimAll<'info>>,
) -> Result<()> {
    let current_time = Clock::get()?.unix_timestamp;
    require!(!ctx.accounts.sale_config.paused, LaunchpadError::Paused);

    let beneficiary_key = ctx.accounts.beneficiary.key();
    let mut total: u64 = 0;

    for account_info in ctx.remaining_accounts.iter() {
        require!(account_info.owner == &crate::ID, LaunchpadError::InvalidSchedule);

        let mut schedule = {
            let data = account_info.try_borrow_data()?;
            VestingSchedule::try_deserialize(&mut &data[..])?
        };
        require!(
            schedule.beneficiary == beneficiary_key,
            LaunchpadError::Unauthorized
        );

        let id_bytes = schedule.id.to_le_bytes();
        let expected = Pubkey::create_program_address(
            &[
                VESTING_SEED,
                beneficiary_key.as_ref(),
                &id_bytes,
                &[schedule.bump],
            ],
            &crate::ID,
        )
        .map_err(|_| LaunchpadError::InvalidSchedule)?;
        require!(account_info.key() == expected, LaunchpadError::InvalidSchedule);

        let amount = schedule.claimable_amount(current_time);
        if amount == 0 {
            continue;
        }

        schedule.claimed_amount = schedule
            .claimed_amount
            .checked_add(amount)
            .ok_or(LaunchpadError::MathOverflow)?;
        total = total.checked_add(amount).ok_or(LaunchpadError::MathOverflow)?;

        {
            let mut data = account_info.try_borrow_mut_data()?;
            schedule.try_serialize(&mut &mut data[..])?;
        }

        emit!(TokensClaimed {
            schedule_id: schedule.id,
            beneficiary: beneficiary_key,
            amount,
            total_claimed: schedule.claimed_amount,
        });
    }

    if total == 0 {
        return Ok(());
    }

    // One aggregate mint after all schedule updates
    let sale_bump = ctx.accounts.sale_config.bump;
    mint_immediate(
        &ctx.accounts.token_program,
        &ctx.accounts.mint,
        &ctx.accounts.beneficiary_token_account,
        ctx.accounts.sale_config.to_account_info(),
        sale_bump,
        total,
    )
}

pub fn revoke_handler(ctx: Context<RevokeSchedule>, _schedule_id: u64) -> Result<()> {
    let current_time = Clock::get()?.unix_timestamp;

    let (vested, unvested) = {
        let schedule = &mut ctx.accounts.schedule;

        require!(!schedule.revoked, LaunchpadError::AlreadyRevoked);
        require!(!schedule.completed(), LaunchpadError::ScheduleCompleted);

        let vested = schedule.vested_amount(current_time);
        let unvested = schedule.total_amount.saturating_sub(vested);

        schedule.revoked = true;
        schedule.vested_at_revocation = vested;
        schedule.revoked_at = current_time;
        (vested, unvested)
    };

    // The remainder goes to the treasury instead of the beneficiary
    let sale_bump = ctx.accounts.sale_config.bump;
    mint_immediate(
        &ctx.accounts.token_program,
        &ctx.accounts.mint,
        &ctx.accounts.treasury_token_account,
        ctx.accounts.sale_config.to_account_info(),
        sale_bump,
        unvested,
    )?;

    emit!(ScheduleRevoked {
        schedule_id: ctx.accounts.schedule.id,
        beneficiary: ctx.accounts.schedule.beneficiary,
        vested_retained: vested,
        unvested_returned: unvested,
    });

    msg!(
        "Schedule {} revoked, {} retained",
        ctx.accounts.schedule.id,
        vested
    );
    Ok(())
}

pub fn partial_revoke_handler(
    ctx: Context<RevokeSchedule>,
    _schedule_id: u64,
    reduce_amount: u64,
) -> Result<()> {
    let current_time = Clock::get()?.unix_timestamp;

    {
        let schedule = &mut ctx.accounts.schedule;

        require!(!schedule.revoked, LaunchpadError::AlreadyRevoked);
        require!(!schedule.completed(), LaunchpadError::ScheduleCompleted);
        require!(reduce_amount > 0, LaunchpadError::InvalidSchedule);

        // The new total may not dip under what has vested or been claimed
        let floor = schedule
            .vested_amount(current_time)
            .max(schedule.claimed_amount);
        let reducible = schedule.total_amount.saturating_sub(floor);
        require!(reduce_amount <= reducible, LaunchpadError::InvalidSchedule);

        schedule.total_amount -= reduce_amount;
    }

    let sale_bump = ctx.accounts.sale_config.bump;
    mint_immediate(
        &ctx.accounts.token_program,
        &ctx.accounts.mint,
        &ctx.accounts.treasury_token_account,
        ctx.accounts.sale_config.to_account_info(),
        sale_bump,
        reduce_amount,
    )?;

    emit!(SchedulePartiallyRevoked {
        schedule_id: ctx.accounts.schedule.id,
        beneficiary: ctx.accounts.schedule.beneficiary,
        reduced_by: reduce_amount,
        new_total: ctx.accounts.schedule.total_amount,
    });

    Ok(())
}

pub fn modify_schedule_handler(
    ctx: Context<ModifySchedule>,
    _schedule_id: u64,
    new_total: u64,
    new_duration: i64,
) -> Result<()> {
    let schedule = &mut ctx.accounts.schedule;

    require!(!schedule.revoked, LaunchpadError::AlreadyRevoked);
    require!(!schedule.completed(), LaunchpadError::ScheduleCompleted);
    VestingSchedule::validate_terms(new_total, schedule.cliff_seconds, new_duration)?;

    // Modification only tightens: totals and durations never grow
    require!(
        new_total <= schedule.total_amount && new_duration <= schedule.duration_seconds,
        LaunchpadError::InvalidSchedule
    );
    require!(
        new_total >= schedule.claimed_amount,
        LaunchpadError::InvalidSchedule
    );

    schedule.total_amount = new_total;
    schedule.duration_seconds = new_duration;

    emit!(ScheduleModified {
        schedule_id: schedule.id,
        new_total,
        new_duration,
    });

    Ok(())
}
