/**
 * Purchase Processing
 *
 * The purchase pipeline: pause and phase-window checks, rate limiting,
 * eligibility gating, bounds, pricing with bonuses, atomic allocation
 * reserve, fund custody, token distribution per the phase policy, and an
 * immutable receipt. State is fully updated before any external transfer.
 */

use anchor_lang::prelude::*;
use anchor_lang::system_program;
use anchor_spl::associated_token::AssociatedToken;
use anchor_spl::token::{self, Mint, MintTo, Token, TokenAccount};

use crate::state::*;
use crate::whitelist;
use crate::{
    pricing, LaunchpadError, ReferralRegistered, TokensPurchased, BUYER_SEED, PHASE_SEED,
    PURCHASE_SEED, REFERRAL_BONUS_BPS, REFERRAL_SEED, SALE_CONFIG_SEED, SALE_VAULT_SEED,
    VESTING_SEED,
};

// ===== ACCOUNTS

/// Purchase in a vesting phase (private or pre-sale)
#[derive(Accounts)]
pub struct Purchase<'info> {
    #[account(
        mut,
        seeds = [SALE_CONFIG_SEED],
        bump = sale_config.bump
    )]
    pub sale_config: Account<'info, SaleConfig>,

    #[account(
        mut,
        seeds = [PHASE_SEED, &[sale_config.current_phase.ordinal()]],
        bump = phase_config.bump
    )]
    pub phase_config: Account<'info, PhaseConfig>,

    #[account(
        init_if_needed,
        payer = buyer,
        space = BuyerState::LEN,
        seeds = [BUYER_SEED, buyer.key().as_ref()],
        bump
    )]
    pub buyer_state: Account<'info, BuyerState>,

    #[account(
        init,
        payer = buyer,
        space = PurchaseReceipt::LEN,
        seeds = [
            PURCHASE_SEED,
            buyer.key().as_ref(),
            &buyer_state.purchase_count.to_le_bytes()
        ],
        bump
    )]
    pub receipt: Account<'info, PurchaseReceipt>,

    #[account(
        init,
        payer = buyer,
        space = VestingSchedule::LEN,
        seeds = [
            VESTING_SEED,
            buyer.key().as_ref(),
            &sale_config.total_schedules.to_le_bytes()
        ],
        bump
    )]
    pub schedule: Account<'info, VestingSchedule>,

    #[account(mut, address = sale_config.mint @ LaunchpadError::InvalidTokenAccount)]
    pub mint: Account<'info, Mint>,

    #[account(
        init_if_needed,
        payer = buyer,
        associated_token::mint = mint,
        associated_token::authority = buyer
    )]
    pub buyer_token_account: Account<'info, TokenAccount>,

    #[account(
        mut,
        seeds = [SALE_VAULT_SEED],
        bump = sale_config.vault_bump
    )]
    pub sale_vault: SystemAccount<'info>,

    /// CHECK: validated against the configured treasury address
    #[account(mut, address = sale_config.treasury @ LaunchpadError::Unauthorized)]
    pub treasury: UncheckedAccount<'info>,

    #[account(mut)]
    pub buyer: Signer<'info>,

    pub token_program: Program<'info, Token>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

/// Purchase in a vesting phase with referral attribution
#[derive(Accounts)]
#[instruction(contributed: u64, proof: Vec<[u8; 32]>, referrer: Pubkey)]
pub struct PurchaseWithReferral<'info> {
    #[account(
        mut,
        seeds = [SALE_CONFIG_SEED],
        bump = sale_config.bump
    )]
    pub sale_config: Account<'info, SaleConfig>,

    #[account(
        mut,
        seeds = [PHASE_SEED, &[sale_config.current_phase.ordinal()]],
        bump = phase_config.bump
    )]
    pub phase_config: Account<'info, PhaseConfig>,

    #[account(
        init_if_needed,
        payer = buyer,
        space = BuyerState::LEN,
        seeds = [BUYER_SEED, buyer.key().as_ref()],
        bump
    )]
    pub buyer_state: Account<'info, BuyerState>,

    /// Referrers qualify by having purchased in an earlier phase
    #[account(
        seeds = [BUYER_SEED, referrer.as_ref()],
        bump = referrer_state.bump
    )]
    pub referrer_state: Account<'info, BuyerState>,

    #[account(
        init_if_needed,
        payer = buyer,
        space = ReferralRecord::LEN,
        seeds = [REFERRAL_SEED, referrer.as_ref()],
        bump
    )]
    pub referral_record: Account<'info, ReferralRecord>,

    #[account(
        init,
        payer = buyer,
        space = PurchaseReceipt::LEN,
        seeds = [
            PURCHASE_SEED,
            buyer.key().as_ref(),
            &buyer_state.purchase_count.to_le_bytes()
        ],
        bump
    )]
    pub receipt: Account<'info, PurchaseReceipt>,

    #[account(
        init,
        payer = buyer,
        space = VestingSchedule::LEN,
        seeds = [
            VESTING_SEED,
            buyer.key().as_ref(),
            &sale_config.total_schedules.to_le_bytes()
        ],
        bump
    )]
    pub schedule: Account<'info, VestingSchedule>,

    #[account(mut, address = sale_config.mint @ LaunchpadError::InvalidTokenAccount)]
    pub mint: Account<'info, Mint>,

    #[account(
        init_if_needed,
        payer = buyer,
        associated_token::mint = mint,
        associated_token::authority = buyer
    )]
    pub buyer_token_account: Account<'info, TokenAccount>,

    #[account(
        mut,
        seeds = [SALE_VAULT_SEED],
        bump = sale_config.vault_bump
    )]
    pub sale_vault: SystemAccount<'info>,

    /// CHECK: validated against the configured treasury address
    #[account(mut, address = sale_config.treasury @ LaunchpadError::Unauthorized)]
    pub treasury: UncheckedAccount<'info>,

    #[account(mut)]
    pub buyer: Signer<'info>,

    pub token_program: Program<'info, Token>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

/// Public-phase purchase: fully immediate credit, no vesting schedule
#[derive(Accounts)]
pub struct PurchasePublic<'info> {
    #[account(
        mut,
        seeds = [SALE_CONFIG_SEED],
        bump = sale_config.bump
    )]
    pub sale_config: Account<'info, SaleConfig>,

    #[account(
        mut,
        seeds = [PHASE_SEED, &[sale_config.current_phase.ordinal()]],
        bump = phase_config.bump
    )]
    pub phase_config: Account<'info, PhaseConfig>,

    #[account(
        init_if_needed,
        payer = buyer,
        space = BuyerState::LEN,
        seeds = [BUYER_SEED, buyer.key().as_ref()],
        bump
    )]
    pub buyer_state: Account<'info, BuyerState>,

    #[account(
        init,
        payer = buyer,
        space = PurchaseReceipt::LEN,
        seeds = [
            PURCHASE_SEED,
            buyer.key().as_ref(),
            &buyer_state.purchase_count.to_le_bytes()
        ],
        bump
    )]
    pub receipt: Account<'info, PurchaseReceipt>,

    #[account(mut, address = sale_config.mint @ LaunchpadError::InvalidTokenAccount)]
    pub mint: Account<'info, Mint>,

    #[account(
        init_if_needed,
        payer = buyer,
        associated_token::mint = mint,
        associated_token::authority = buyer
    )]
    pub buyer_token_account: Account<'info, TokenAccount>,

    #[account(
        mut,
        seeds = [SALE_VAULT_SEED],
        bump = sale_config.vault_bump
    )]
    pub sale_vault: SystemAccount<'info>,

    /// CHECK: validated against the configured treasury address
    #[account(mut, address = sale_config.treasury @ LaunchpadError::Unauthorized)]
    pub treasury: UncheckedAccount<'info>,

    #[account(mut)]
    pub buyer: Signer<'info>,

    pub token_program: Program<'info, Token>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

// ===== SHARED CHECKS

/// Pause, window, cooldown, bounds, and cap checks shared by every path
pub(crate) fn assert_purchase_allowed(
    sale: &SaleConfig,
    phase: &PhaseConfig,
    buyer_state: &BuyerState,
    contributed: u64,
    current_time: i64,
) -> Result<()> {
    require!(!sale.paused, LaunchpadError::Paused);
    require!(
        sale.current_phase != PhaseKind::Inactive && phase.kind == sale.current_phase,
        LaunchpadError::PhaseNotActive
    );
    require!(phase.is_open(current_time), LaunchpadError::PhaseNotActive);
    require!(contributed > 0, LaunchpadError::PurchaseBelowMinimum);
    require!(
        !buyer_state.rate_limited(phase.kind, current_time, sale.purchase_cooldown),
        LaunchpadError::RateLimited
    );
    require!(
        contributed >= phase.min_purchase,
        LaunchpadError::PurchaseBelowMinimum
    );

    let wallet_total = buyer_state
        .contributed_in_phase(phase.kind)
        .checked_add(contributed)
        .ok_or(LaunchpadError::MathOverflow)?;
    require!(
        wallet_total <= phase.max_purchase,
        LaunchpadError::PurchaseAboveMaximum
    );

    let raised = phase
        .lamports_raised
        .checked_add(contributed)
        .ok_or(LaunchpadError::MathOverflow)?;
    require!(raised <= phase.hard_cap, LaunchpadError::HardCapReached);

    Ok(())
}

/// Whitelist, KYC, and accreditation gates per the phase rules
pub(crate) fn assert_eligible(
    phase: &PhaseConfig,
    buyer_state: &BuyerState,
    buyer: &Pubkey,
    proof: &[[u8; 32]],
) -> Result<()> {
    if phase.whitelist_required {
        let leaf = whitelist::leaf_for(buyer);
        require!(
            whitelist::verify_membership(leaf, proof, &phase.whitelist_root),
            LaunchpadError::NotWhitelisted
        );
    }
    if phase.kyc_required {
        require!(buyer_state.kyc_approved, LaunchpadError::KycRequired);
    }
    if phase.accreditation_required {
        require!(buyer_state.accredited, LaunchpadError::AccreditationRequired);
    }
    Ok(())
}

/// Base conversion plus engagement and referral bonuses.
/// Returns (base, bonus, total) in raw token units.
pub(crate) fn compute_award(
    phase: &PhaseConfig,
    buyer_state: &BuyerState,
    contributed: u64,
    referral_bps: u64,
) -> Result<(u64, u64, u64)> {
    let base = pricing::tokens_for(contributed, phase.price)?;
    require!(base > 0, LaunchpadError::PurchaseBelowMinimum);

    let engagement_bps = pricing::engagement_bonus_bps(
        buyer_state.discord_score,
        buyer_state.twitter_score,
        buyer_state.github_score,
        buyer_state.forum_score,
        buyer_state.engagement_verified,
    );
    let bonus = pricing::bonus_tokens(base, engagement_bps + referral_bps)?;
    let total = base.checked_add(bonus).ok_or(LaunchpadError::MathOverflow)?;

    Ok((base, bonus, total))
}

// ===== CUSTODY & DISTRIBUTION

/// Move the contribution into the sale vault
pub(crate) fn collect_contribution<'info>(
    system_program: &Program<'info, System>,
    buyer: &Signer<'info>,
    vault: &SystemAccount<'info>,
    amount: u64,
) -> Result<()> {
    let cpi_ctx = CpiContext::new(
        system_program.to_account_info(),
        system_program::Transfer {
            from: buyer.to_account_info(),
            to: vault.to_account_info(),
        },
    );
    system_program::transfer(cpi_ctx, amount)
}

/// Mint raw units to the buyer with the sale PDA as mint authority
pub(crate) fn mint_immediate<'info>(
    token_program: &Program<'info, Token>,
    mint: &Account<'info, Mint>,
    destination: &Account<'info, TokenAccount>,
    sale_authority: AccountInfo<'info>,
    sale_bump: u8,
    amount: u64,
) -> Result<()> {
    if amount == 0 {
        return Ok(());
    }
    let seeds: &[&[u8]] = &[SALE_CONFIG_SEED, &[sale_bump]];
    let signer_seeds = &[seeds];
    let cpi_ctx = CpiContext::new_with_signer(
        token_program.to_account_info(),
        MintTo {
            mint: mint.to_account_info(),
            to: destination.to_account_info(),
            authority: sale_authority,
        },
        signer_seeds,
    );
    token::mint_to(cpi_ctx, amount)
}

/// Forward unallocated custody to the treasury once past the threshold
pub(crate) fn maybe_auto_forward<'info>(
    sale: &mut SaleConfig,
    system_program: &Program<'info, System>,
    vault: &SystemAccount<'info>,
    treasury: &UncheckedAccount<'info>,
) -> Result<()> {
    if !sale.auto_forward_enabled {
        return Ok(());
    }
    let forwardable = sale.unallocated_custody();
    if forwardable == 0 || forwardable < sale.forward_threshold {
        return Ok(());
    }

    let seeds: &[&[u8]] = &[SALE_VAULT_SEED, &[sale.vault_bump]];
    let signer_seeds = &[seeds];
    let cpi_ctx = CpiContext::new_with_signer(
        system_program.to_account_info(),
        system_program::Transfer {
            from: vault.to_account_info(),
            to: treasury.to_account_info(),
        },
        signer_seeds,
    );
    system_program::transfer(cpi_ctx, forwardable)?;

    sale.funds_in_custody = sale
        .funds_in_custody
        .checked_sub(forwardable)
        .ok_or(LaunchpadError::MathOverflow)?;
    Ok(())
}

/// Fold an accepted purchase into phase and sale counters
pub(crate) fn apply_purchase_accounting(
    sale: &mut SaleConfig,
    phase: &mut PhaseConfig,
    buyer_state: &mut BuyerState,
    contributed: u64,
    bonus: u64,
    total: u64,
    current_time: i64,
) -> Result<()> {
    phase.reserve(total)?;
    phase.tokens_sold = phase
        .tokens_sold
        .checked_add(total)
        .ok_or(LaunchpadError::MathOverflow)?;
    phase.bonus_granted = phase.bonus_granted.saturating_add(bonus);
    phase.lamports_raised = phase
        .lamports_raised
        .checked_add(contributed)
        .ok_or(LaunchpadError::MathOverflow)?;
    phase.purchases = phase.purchases.saturating_add(1);

    let first_in_phase =
        buyer_state.record_purchase(phase.kind, contributed, total, current_time);
    if first_in_phase {
        phase.participants = phase.participants.saturating_add(1);
    }

    sale.total_purchases = sale.total_purchases.saturating_add(1);
    sale.funds_in_custody = sale
        .funds_in_custody
        .checked_add(contributed)
        .ok_or(LaunchpadError::MathOverflow)?;
    Ok(())
}

/// Fill an initialized vesting schedule from a purchase's vested portion
pub(crate) fn write_purchase_schedule(
    schedule: &mut VestingSchedule,
    sale: &mut SaleConfig,
    phase: &PhaseConfig,
    beneficiary: Pubkey,
    vested: u64,
    current_time: i64,
    bump: u8,
) -> u64 {
    let id = sale.total_schedules;
    schedule.id = id;
    schedule.beneficiary = beneficiary;
    schedule.total_amount = vested;
    schedule.claimed_amount = 0;
    schedule.start_time = current_time;
    schedule.cliff_seconds = phase.vesting_cliff;
    schedule.duration_seconds = phase.vesting_duration;
    schedule.tag = ScheduleTag::SalePurchase;
    schedule.revoked = false;
    schedule.vested_at_revocation = 0;
    schedule.revoked_at = 0;
    schedule.created_at = current_time;
    schedule.bump = bump;
    sale.total_schedules = sale.total_schedules.saturating_add(1);
    id
}

pub(crate) fn write_receipt(
    receipt: &mut PurchaseReceipt,
    buyer: Pubkey,
    phase: PhaseKind,
    contributed: u64,
    base: u64,
    bonus: u64,
    immediate: u64,
    vested: u64,
    schedule_id: u64,
    referrer: Pubkey,
    index: u64,
    current_time: i64,
    bump: u8,
) {
    receipt.buyer = buyer;
    receipt.phase = phase;
    receipt.contributed = contributed;
    receipt.base_tokens = base;
    receipt.bonus_tokens = bonus;
    receipt.immediate_amount = immediate;
    receipt.vested_amount = vested;
    receipt.schedule_id = schedule_id;
    receipt.referrer = referrer;
    receipt.index = index;
    receipt.timestamp = current_time;
    receipt.bump = bump;
}

// ===== HANDLERS

pub fn purchase_handler(
    ctx: Context<Purchase>,
    contributed: u64,
    proof: Vec<[u8; 32]>,
) -> Result<()> {
    let current_time = Clock::get()?.unix_timestamp;
    let buyer_key = ctx.accounts.buyer.key();

    {
        let state = &mut ctx.accounts.buyer_state;
        if state.buyer == Pubkey::default() {
            state.buyer = buyer_key;
            state.last_purchase_phase = PhaseKind::Inactive;
            state.bump = ctx.bumps.buyer_state;
        }
    }

    let phase_kind = ctx.accounts.sale_config.current_phase;
    require!(
        phase_kind == PhaseKind::Private || phase_kind == PhaseKind::PreSale,
        LaunchpadError::PhaseNotActive
    );

    assert_purchase_allowed(
        &ctx.accounts.sale_config,
        &ctx.accounts.phase_config,
        &ctx.accounts.buyer_state,
        contributed,
        current_time,
    )?;
    assert_eligible(
        &ctx.accounts.phase_config,
        &ctx.accounts.buyer_state,
        &buyer_key,
        &proof,
    )?;

    let (base, bonus, total) = compute_award(
        &ctx.accounts.phase_config,
        &ctx.accounts.buyer_state,
        contributed,
        0,
    )?;
    let (vested, immediate) =
        pricing::split_distribution(total, ctx.accounts.phase_config.vesting_bps)?;
    require!(vested > 0, LaunchpadError::PurchaseBelowMinimum);

    let receipt_index = ctx.accounts.buyer_state.purchase_count;
    apply_purchase_accounting(
        &mut ctx.accounts.sale_config,
        &mut ctx.accounts.phase_config,
        &mut ctx.accounts.buyer_state,
        contributed,
        bonus,
        total,
        current_time,
    )?;

    let schedule_id = write_purchase_schedule(
        &mut ctx.accounts.schedule,
        &mut ctx.accounts.sale_config,
        &ctx.accounts.phase_config,
        buyer_key,
        vested,
        current_time,
        ctx.bumps.schedule,
    );
    write_receipt(
        &mut ctx.accounts.receipt,
        buyer_key,
        phase_kind,
        contributed,
        base,
        bonus,
        immediate,
        vested,
        schedule_id,
        Pubkey::default(),
        receipt_index,
        current_time,
        ctx.bumps.receipt,
    );

    collect_contribution(
        &ctx.accounts.system_program,
        &ctx.accounts.buyer,
        &ctx.accounts.sale_vault,
        contributed,
    )?;
    let sale_bump = ctx.accounts.sale_config.bump;
    mint_immediate(
        &ctx.accounts.token_program,
        &ctx.accounts.mint,
        &ctx.accounts.buyer_token_account,
        ctx.accounts.sale_config.to_account_info(),
        sale_bump,
        immediate,
    )?;
    maybe_auto_forward(
        &mut ctx.accounts.sale_config,
        &ctx.accounts.system_program,
        &ctx.accounts.sale_vault,
        &ctx.accounts.treasury,
    )?;

    emit!(TokensPurchased {
        buyer: buyer_key,
        phase: phase_kind,
        contributed,
        base_tokens: base,
        bonus_tokens: bonus,
        immediate_amount: immediate,
        vested_amount: vested,
        schedule_id,
        referrer: Pubkey::default(),
        receipt_index,
        timestamp: current_time,
    });

    Ok(())
}

pub fn purchase_with_referral_handler(
    ctx: Context<PurchaseWithReferral>,
    contributed: u64,
    proof: Vec<[u8; 32]>,
    referrer: Pubkey,
) -> Result<()> {
    let current_time = Clock::get()?.unix_timestamp;
    let buyer_key = ctx.accounts.buyer.key();

    {
        let state = &mut ctx.accounts.buyer_state;
        if state.buyer == Pubkey::default() {
            state.buyer = buyer_key;
            state.last_purchase_phase = PhaseKind::Inactive;
            state.bump = ctx.bumps.buyer_state;
        }
    }

    let phase_kind = ctx.accounts.sale_config.current_phase;
    require!(
        phase_kind == PhaseKind::Private || phase_kind == PhaseKind::PreSale,
        LaunchpadError::PhaseNotActive
    );

    // Self-referral rejected; referrers qualify through an earlier phase
    require!(referrer != buyer_key, LaunchpadError::InvalidReferrer);
    require!(
        ctx.accounts.referrer_state.participated_before(phase_kind),
        LaunchpadError::InvalidReferrer
    );

    assert_purchase_allowed(
        &ctx.accounts.sale_config,
        &ctx.accounts.phase_config,
        &ctx.accounts.buyer_state,
        contributed,
        current_time,
    )?;
    assert_eligible(
        &ctx.accounts.phase_config,
        &ctx.accounts.buyer_state,
        &buyer_key,
        &proof,
    )?;

    let (base, bonus, total) = compute_award(
        &ctx.accounts.phase_config,
        &ctx.accounts.buyer_state,
        contributed,
        REFERRAL_BONUS_BPS,
    )?;
    let (vested, immediate) =
        pricing::split_distribution(total, ctx.accounts.phase_config.vesting_bps)?;
    require!(vested > 0, LaunchpadError::PurchaseBelowMinimum);

    let receipt_index = ctx.accounts.buyer_state.purchase_count;
    apply_purchase_accounting(
        &mut ctx.accounts.sale_config,
        &mut ctx.accounts.phase_config,
        &mut ctx.accounts.buyer_state,
        contributed,
        bonus,
        total,
        current_time,
    )?;

    // First referred purchase pins the referrer on the buyer record
    if ctx.accounts.buyer_state.referrer == Pubkey::default() {
        ctx.accounts.buyer_state.referrer = referrer;
    }

    {
        let record = &mut ctx.accounts.referral_record;
        if record.referrer == Pubkey::default() {
            record.referrer = referrer;
            record.bump = ctx.bumps.referral_record;
        }
        record.referral_count = record.referral_count.saturating_add(1);
        record.referred_volume = record.referred_volume.saturating_add(contributed);
        record.bonus_tokens_granted = record.bonus_tokens_granted.saturating_add(bonus);
    }

    let schedule_id = write_purchase_schedule(
        &mut ctx.accounts.schedule,
        &mut ctx.accounts.sale_config,
        &ctx.accounts.phase_config,
        buyer_key,
        vested,
        current_time,
        ctx.bumps.schedule,
    );
    write_receipt(
        &mut ctx.accounts.receipt,
        buyer_key,
        phase_kind,
        contributed,
        base,
        bonus,
        immediate,
        vested,
        schedule_id,
        referrer,
        receipt_index,
        current_time,
        ctx.bumps.receipt,
    );

    collect_contribution(
        &ctx.accounts.system_program,
        &ctx.accounts.buyer,
        &ctx.accounts.sale_vault,
        contributed,
    )?;
    let sale_bump = ctx.accounts.sale_config.bump;
    mint_immediate(
        &ctx.accounts.token_program,
        &ctx.accounts.mint,
        &ctx.accounts.buyer_token_account,
        ctx.accounts.sale_config.to_account_info(),
        sale_bump,
        immediate,
    )?;
    maybe_auto_forward(
        &mut ctx.accounts.sale_config,
        &ctx.accounts.system_program,
        &ctx.accounts.sale_vault,
        &ctx.accounts.treasury,
    )?;

    emit!(ReferralRegistered {
        referrer,
        referee: buyer_key,
        bonus_bps: REFERRAL_BONUS_BPS as u16,
    });
    emit!(TokensPurchased {
        buyer: buyer_key,
        phase: phase_kind,
        contributed,
        base_tokens: base,
        bonus_tokens: bonus,
        immediate_amount: immediate,
        vested_amount: vested,
        schedule_id,
        referrer,
        receipt_index,
        timestamp: current_time,
    });

    Ok(())
}

pub fn purchase_public_handler(
    ctx: Context<PurchasePublic>,
    contributed: u64,
    min_tokens_out: Option<u64>,
) -> Result<()> {
    let current_time = Clock::get()?.unix_timestamp;
    let buyer_key = ctx.accounts.buyer.key();

    {
        let state = &mut ctx.accounts.buyer_state;
        if state.buyer == Pubkey::default() {
            state.buyer = buyer_key;
            state.last_purchase_phase = PhaseKind::Inactive;
            state.bump = ctx.bumps.buyer_state;
        }
    }

    require!(
        ctx.accounts.sale_config.current_phase == PhaseKind::Public,
        LaunchpadError::PhaseNotActive
    );
    require!(
        !ctx.accounts.sale_config.mev_protection_required,
        LaunchpadError::CommitRevealRequired
    );

    assert_purchase_allowed(
        &ctx.accounts.sale_config,
        &ctx.accounts.phase_config,
        &ctx.accounts.buyer_state,
        contributed,
        current_time,
    )?;

    let (base, bonus, total) = compute_award(
        &ctx.accounts.phase_config,
        &ctx.accounts.buyer_state,
        contributed,
        0,
    )?;
    if let Some(min_out) = min_tokens_out {
        require!(total >= min_out, LaunchpadError::SlippageExceeded);
    }

    let receipt_index = ctx.accounts.buyer_state.purchase_count;
    apply_purchase_accounting(
        &mut ctx.accounts.sale_config,
        &mut ctx.accounts.phase_config,
        &mut ctx.accounts.buyer_state,
        contributed,
        bonus,
        total,
        current_time,
    )?;

    // Liquidity share of public contributions stays in custody, earmarked
    let liquidity_bps = ctx.accounts.phase_config.liquidity_bps;
    if liquidity_bps > 0 {
        let liquidity = pricing::bps_share(contributed, liquidity_bps as u64)?;
        ctx.accounts.phase_config.liquidity_reserved = ctx
            .accounts
            .phase_config
            .liquidity_reserved
            .saturating_add(liquidity);
        ctx.accounts.sale_config.funds_allocated = ctx
            .accounts
            .sale_config
            .funds_allocated
            .checked_add(liquidity)
            .ok_or(LaunchpadError::MathOverflow)?;
    }

    write_receipt(
        &mut ctx.accounts.receipt,
        buyer_key,
        PhaseKind::Public,
        contributed,
        base,
        bonus,
        total,
        0,
        0,
        Pubkey::default(),
        receipt_index,
        current_time,
        ctx.bumps.receipt,
    );

    collect_contribution(
        &ctx.accounts.system_program,
        &ctx.accounts.buyer,
        &ctx.accounts.sale_vault,
        contributed,
    )?;
    let sale_bump = ctx.accounts.sale_config.bump;
    mint_immediate(
        &ctx.accounts.token_program,
        &ctx.accounts.mint,
        &ctx.accounts.buyer_token_account,
        ctx.accounts.sale_config.to_account_info(),
        sale_bump,
        total,
    )?;
    maybe_auto_forward(
        &mut ctx.accounts.sale_config,
        &ctx.accounts.system_program,
        &ctx.accounts.sale_vault,
        &ctx.accounts.treasury,
    )?;

    emit!(TokensPurchased {
        buyer: buyer_key,
        phase: PhaseKind::Public,
        contributed,
        base_tokens: base,
        bonus_tokens: bonus,
        immediate_amount: total,
        vested_amount: 0,
        schedule_id: 0,
        referrer: Pubkey::default(),
        receipt_index,
        timestamp: current_time,
    });

    Ok(())
}
