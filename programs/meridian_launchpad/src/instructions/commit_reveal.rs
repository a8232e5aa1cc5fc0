/**
 * Commit-Reveal Purchasing
 *
 * Two-step public purchase for MEV protection: the buyer commits a hash of
 * (buyer, amount, nonce), waits out the commit delay, then reveals. One live
 * commitment per wallet; expired commitments may be overwritten, revealed
 * ones are closed.
 */

use anchor_lang::prelude::*;
use anchor_spl::associated_token::AssociatedToken;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::instructions::purchase::{
    apply_purchase_accounting, assert_purchase_allowed, collect_contribution, compute_award,
    maybe_auto_forward, mint_immediate, write_receipt,
};
use crate::state::*;
use crate::{
    pricing, LaunchpadError, PurchaseCommitted, PurchaseRevealed, TokensPurchased, BUYER_SEED,
    COMMITMENT_SEED, PHASE_SEED, PURCHASE_SEED, SALE_CONFIG_SEED, SALE_VAULT_SEED,
};

// ===== ACCOUNTS

#[derive(Accounts)]
pub struct CommitPurchase<'info> {
    #[account(
        seeds = [SALE_CONFIG_SEED],
        bump = sale_config.bump
    )]
    pub sale_config: Account<'info, SaleConfig>,

    #[account(
        seeds = [PHASE_SEED, &[sale_config.current_phase.ordinal()]],
        bump = phase_config.bump
    )]
    pub phase_config: Account<'info, PhaseConfig>,

    #[account(
        init_if_needed,
        payer = buyer,
        space = PurchaseCommitment::LEN,
        seeds = [COMMITMENT_SEED, buyer.key().as_ref()],
        bump
    )]
    pub commitment: Account<'info, PurchaseCommitment>,

    #[account(mut)]
    pub buyer: Signer<'info>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct RevealPurchase<'info> {
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

    /// Closed on success so each commitment executes exactly once
    #[account(
        mut,
        close = buyer,
        seeds = [COMMITMENT_SEED, buyer.key().as_ref()],
        bump = commitment.bump,
        constraint = commitment.buyer == buyer.key() @ LaunchpadError::InvalidCommitment
    )]
    pub commitment: Account<'info, PurchaseCommitment>,

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

// ===== HANDLERS

pub fn commit_purchase_handler(
    ctx: Context<CommitPurchase>,
    commitment_hash: [u8; 32],
) -> Result<()> {
    let sale = &ctx.accounts.sale_config;
    let commitment = &mut ctx.accounts.commitment;
    let current_time = Clock::get()?.unix_timestamp;
    let buyer_key = ctx.accounts.buyer.key();

    require!(!sale.paused, LaunchpadError::Paused);
    require!(
        sale.current_phase == PhaseKind::Public,
        LaunchpadError::PhaseNotActive
    );
    // No point committing once the public window has lapsed
    require!(
        ctx.accounts.phase_config.is_open(current_time),
        LaunchpadError::PhaseNotActive
    );

    // A live commitment blocks replacement until it expires
    if commitment.buyer != Pubkey::default() {
        require!(
            commitment.expired(current_time, sale.commit_expiry),
            LaunchpadError::InvalidCommitment
        );
    }

    commitment.buyer = buyer_key;
    commitment.commitment_hash = commitment_hash;
    commitment.committed_at = current_time;
    commitment.bump = ctx.bumps.commitment;

    emit!(PurchaseCommitted {
        buyer: buyer_key,
        commitment_hash,
        committed_at: current_time,
    });

    Ok(())
}

pub fn reveal_purchase_handler(
    ctx: Context<RevealPurchase>,
    contributed: u64,
    nonce: u64,
    min_tokens_out: u64,
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

    // Commitment checks before anything else
    {
        let sale = &ctx.accounts.sale_config;
        let commitment = &ctx.accounts.commitment;
        require!(
            commitment.matches(&buyer_key, contributed, nonce),
            LaunchpadError::InvalidCommitment
        );
        require!(
            commitment.matured(current_time, sale.commit_duration),
            LaunchpadError::CommitmentNotMatured
        );
        require!(
            !commitment.expired(current_time, sale.commit_expiry),
            LaunchpadError::CommitmentExpired
        );
    }

    require!(
        ctx.accounts.sale_config.current_phase == PhaseKind::Public,
        LaunchpadError::PhaseNotActive
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
    require!(total >= min_tokens_out, LaunchpadError::SlippageExceeded);

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

    emit!(PurchaseRevealed {
        buyer: buyer_key,
        contributed,
        token_amount: total,
        revealed_at: current_time,
    });
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
