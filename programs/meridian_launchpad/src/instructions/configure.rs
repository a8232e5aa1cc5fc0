/**
 * Sale Configuration & Phase Lifecycle
 *
 * Initialization of the sale engine, per-phase configuration, and the
 * Inactive -> phase -> Inactive state machine. Phases may only be
 * configured while no phase is live and only before they have started.
 */

use anchor_lang::prelude::*;
use anchor_spl::token::Mint;

use crate::state::*;
use crate::{
    LaunchpadError, MevProtectionUpdated, PhaseConfigured, PhaseEnded, PhaseStarted,
    SaleInitialized, BPS_DENOMINATOR, DEFAULT_COMMIT_DURATION_SECONDS,
    DEFAULT_COMMIT_EXPIRY_SECONDS, DEFAULT_PURCHASE_COOLDOWN_SECONDS, PHASE_SEED,
    SALE_CONFIG_SEED, SALE_VAULT_SEED,
};

// ===== ACCOUNTS

#[derive(Accounts)]
pub struct InitSale<'info> {
    #[account(
        init,
        payer = admin,
        space = SaleConfig::LEN,
        seeds = [SALE_CONFIG_SEED],
        bump
    )]
    pub sale_config: Account<'info, SaleConfig>,

    /// Lamport vault for contributions, owned by the system program
    #[account(
        seeds = [SALE_VAULT_SEED],
        bump
    )]
    pub sale_vault: SystemAccount<'info>,

    /// Sale token mint; its mint authority must already be the sale_config PDA
    pub mint: Account<'info, Mint>,

    #[account(mut)]
    pub admin: Signer<'info>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
#[instruction(kind: PhaseKind)]
pub struct ConfigurePhase<'info> {
    #[account(
        seeds = [SALE_CONFIG_SEED],
        bump = sale_config.bump,
        has_one = admin @ LaunchpadError::Unauthorized
    )]
    pub sale_config: Account<'info, SaleConfig>,

    #[account(
        init_if_needed,
        payer = admin,
        space = PhaseConfig::LEN,
        seeds = [PHASE_SEED, &[kind.ordinal()]],
        bump
    )]
    pub phase_config: Account<'info, PhaseConfig>,

    #[account(mut)]
    pub admin: Signer<'info>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
#[instruction(kind: PhaseKind)]
pub struct StartPhase<'info> {
    #[account(
        mut,
        seeds = [SALE_CONFIG_SEED],
        bump = sale_config.bump,
        has_one = admin @ LaunchpadError::Unauthorized
    )]
    pub sale_config: Account<'info, SaleConfig>,

    #[account(
        mut,
        seeds = [PHASE_SEED, &[kind.ordinal()]],
        bump = phase_config.bump
    )]
    pub phase_config: Account<'info, PhaseConfig>,

    pub admin: Signer<'info>,
}

#[derive(Accounts)]
pub struct EndPhase<'info> {
    #[account(
        mut,
        seeds = [SALE_CONFIG_SEED],
        bump = sale_config.bump,
        has_one = admin @ LaunchpadError::Unauthorized
    )]
    pub sale_config: Account<'info, SaleConfig>,

    #[account(
        mut,
        seeds = [PHASE_SEED, &[sale_config.current_phase.ordinal()]],
        bump = phase_config.bump
    )]
    pub phase_config: Account<'info, PhaseConfig>,

    pub admin: Signer<'info>,
}

/// Shared by settings toggles and pause/unpause
#[derive(Accounts)]
pub struct UpdateSaleSettings<'info> {
    #[account(
        mut,
        seeds = [SALE_CONFIG_SEED],
        bump = sale_config.bump,
        has_one = admin @ LaunchpadError::Unauthorized
    )]
    pub sale_config: Account<'info, SaleConfig>,

    pub admin: Signer<'info>,
}

// ===== PARAMS

#[derive(AnchorSerialize, AnchorDeserialize, Clone)]
pub struct InitSaleParams {
    pub treasury: Pubkey,
    pub compliance_authority: Pubkey,
    pub auto_forward_enabled: bool,
    pub forward_threshold: u64,
    /// 0 = use the program default
    pub commit_duration: i64,
    /// 0 = use the program default
    pub commit_expiry: i64,
    /// 0 = use the program default
    pub purchase_cooldown: i64,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone)]
pub struct PhaseParams {
    pub price: u64,
    pub min_purchase: u64,
    pub max_purchase: u64,
    pub hard_cap: u64,
    pub token_allocation: u64,
    pub start_time: i64,
    pub end_time: i64,
    pub whitelist_required: bool,
    pub kyc_required: bool,
    pub accreditation_required: bool,
    pub whitelist_root: [u8; 32],
    pub vesting_bps: u16,
    pub vesting_cliff: i64,
    pub vesting_duration: i64,
    pub liquidity_bps: u16,
}

// ===== HANDLERS

pub fn init_sale_handler(ctx: Context<InitSale>, params: InitSaleParams) -> Result<()> {
    let sale = &mut ctx.accounts.sale_config;

    sale.admin = ctx.accounts.admin.key();
    sale.compliance_authority = params.compliance_authority;
    sale.treasury = params.treasury;
    sale.mint = ctx.accounts.mint.key();
    sale.current_phase = PhaseKind::Inactive;
    sale.highest_phase_started = 0;
    sale.paused = false;
    sale.mev_protection_required = false;
    sale.auto_forward_enabled = params.auto_forward_enabled;
    sale.forward_threshold = params.forward_threshold;
    sale.funds_in_custody = 0;
    sale.funds_allocated = 0;
    sale.total_purchases = 0;
    sale.total_schedules = 0;
    sale.total_kyc_approved = 0;
    sale.total_accredited = 0;

    sale.commit_duration = if params.commit_duration > 0 {
        params.commit_duration
    } else {
        DEFAULT_COMMIT_DURATION_SECONDS
    };
    sale.commit_expiry = if params.commit_expiry > 0 {
        params.commit_expiry
    } else {
        DEFAULT_COMMIT_EXPIRY_SECONDS
    };
    sale.purchase_cooldown = if params.purchase_cooldown > 0 {
        params.purchase_cooldown
    } else {
        DEFAULT_PURCHASE_COOLDOWN_SECONDS
    };
    require!(
        sale.commit_duration < sale.commit_expiry,
        LaunchpadError::InvalidPhaseParams
    );

    sale.bump = ctx.bumps.sale_config;
    sale.vault_bump = ctx.bumps.sale_vault;

    emit!(SaleInitialized {
        admin: sale.admin,
        mint: sale.mint,
        treasury: sale.treasury,
        compliance_authority: sale.compliance_authority,
        auto_forward_enabled: sale.auto_forward_enabled,
        forward_threshold: sale.forward_threshold,
    });

    msg!("Sale initialized, mint {}", sale.mint);
    Ok(())
}

pub fn configure_phase_handler(
    ctx: Context<ConfigurePhase>,
    kind: PhaseKind,
    params: PhaseParams,
) -> Result<()> {
    let sale = &ctx.accounts.sale_config;
    let phase = &mut ctx.accounts.phase_config;
    let current_time = Clock::get()?.unix_timestamp;

    require!(kind != PhaseKind::Inactive, LaunchpadError::InvalidPhaseParams);

    // No reconfiguration while a phase is live, nor after this phase started
    require!(
        sale.current_phase == PhaseKind::Inactive,
        LaunchpadError::InvalidPhaseTransition
    );
    require!(
        kind.ordinal() > sale.highest_phase_started,
        LaunchpadError::InvalidPhaseTransition
    );

    require!(params.start_time > current_time, LaunchpadError::StartTimeInPast);
    require!(params.end_time > params.start_time, LaunchpadError::InvalidPhaseParams);
    require!(params.price > 0, LaunchpadError::InvalidPhaseParams);
    require!(params.token_allocation > 0, LaunchpadError::InvalidPhaseParams);
    require!(params.hard_cap > 0, LaunchpadError::InvalidPhaseParams);
    require!(params.max_purchase > 0, LaunchpadError::InvalidPhaseParams);
    require!(
        params.max_purchase >= params.min_purchase,
        LaunchpadError::InvalidPhaseParams
    );
    require!(
        params.vesting_bps as u64 <= BPS_DENOMINATOR,
        LaunchpadError::InvalidPhaseParams
    );
    require!(
        params.liquidity_bps as u64 <= BPS_DENOMINATOR,
        LaunchpadError::InvalidPhaseParams
    );
    if params.vesting_bps > 0 {
        VestingSchedule::validate_terms(1, params.vesting_cliff, params.vesting_duration)?;
    }

    // Public phase: fully immediate, no eligibility gates, no minimum.
    // Liquidity seeding applies only to the public phase.
    if kind == PhaseKind::Public {
        require!(params.vesting_bps == 0, LaunchpadError::InvalidPhaseParams);
        require!(params.min_purchase == 0, LaunchpadError::InvalidPhaseParams);
        require!(
            !params.whitelist_required
                && !params.kyc_required
                && !params.accreditation_required,
            LaunchpadError::InvalidPhaseParams
        );
    } else {
        require!(params.liquidity_bps == 0, LaunchpadError::InvalidPhaseParams);
    }

    phase.kind = kind;
    phase.price = params.price;
    phase.min_purchase = params.min_purchase;
    phase.max_purchase = params.max_purchase;
    phase.hard_cap = params.hard_cap;
    phase.token_allocation = params.token_allocation;
    phase.allocation_remaining = params.token_allocation;
    phase.start_time = params.start_time;
    phase.end_time = params.end_time;
    phase.whitelist_required = params.whitelist_required;
    phase.kyc_required = params.kyc_required;
    phase.accreditation_required = params.accreditation_required;
    phase.whitelist_root = params.whitelist_root;
    phase.vesting_bps = params.vesting_bps;
    phase.vesting_cliff = params.vesting_cliff;
    phase.vesting_duration = params.vesting_duration;
    phase.liquidity_bps = params.liquidity_bps;
    phase.liquidity_reserved = 0;
    phase.tokens_sold = 0;
    phase.bonus_granted = 0;
    phase.lamports_raised = 0;
    phase.purchases = 0;
    phase.participants = 0;
    phase.activated_at = 0;
    phase.ended_at = 0;
    phase.bump = ctx.bumps.phase_config;

    emit!(PhaseConfigured {
        kind,
        price: params.price,
        min_purchase: params.min_purchase,
        max_purchase: params.max_purchase,
        hard_cap: params.hard_cap,
        token_allocation: params.token_allocation,
        start_time: params.start_time,
        end_time: params.end_time,
        vesting_bps: params.vesting_bps,
        vesting_cliff: params.vesting_cliff,
        vesting_duration: params.vesting_duration,
    });

    Ok(())
}

pub fn start_phase_handler(ctx: Context<StartPhase>, kind: PhaseKind) -> Result<()> {
    let sale = &mut ctx.accounts.sale_config;
    let phase = &mut ctx.accounts.phase_config;
    let current_time = Clock::get()?.unix_timestamp;

    sale.can_start(kind)?;
    require!(phase.kind == kind, LaunchpadError::PhaseNotConfigured);
    require!(phase.price > 0, LaunchpadError::PhaseNotConfigured);
    require!(phase.is_open(current_time), LaunchpadError::PhaseNotActive);

    sale.current_phase = kind;
    sale.highest_phase_started = kind.ordinal();
    phase.activated_at = current_time;

    emit!(PhaseStarted {
        kind,
        started_at: current_time,
        allocation_remaining: phase.allocation_remaining,
    });

    msg!("Phase {:?} started", kind);
    Ok(())
}

pub fn end_phase_handler(ctx: Context<EndPhase>) -> Result<()> {
    let sale = &mut ctx.accounts.sale_config;
    let phase = &mut ctx.accounts.phase_config;
    let current_time = Clock::get()?.unix_timestamp;

    require!(
        sale.current_phase != PhaseKind::Inactive,
        LaunchpadError::PhaseNotActive
    );

    let ended = sale.current_phase;
    sale.current_phase = PhaseKind::Inactive;
    phase.ended_at = current_time;

    emit!(PhaseEnded {
        kind: ended,
        ended_at: current_time,
        tokens_sold: phase.tokens_sold,
        lamports_raised: phase.lamports_raised,
    });

    msg!("Phase {:?} ended", ended);
    Ok(())
}

pub fn enable_mev_protection_handler(
    ctx: Context<UpdateSaleSettings>,
    enabled: bool,
) -> Result<()> {
    ctx.accounts.sale_config.mev_protection_required = enabled;
    emit!(MevProtectionUpdated { enabled });
    Ok(())
}
