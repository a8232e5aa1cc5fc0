/**
 * Eligibility Administration
 *
 * KYC, accreditation, engagement scoring, and whitelist root rotation.
 * Buyer state accounts are created lazily on the first compliance update
 * so approvals can land before a wallet ever purchases.
 */

use anchor_lang::prelude::*;

use crate::state::*;
use crate::{
    AccreditationUpdated, EngagementScoresUpdated, KycStatusUpdated, LaunchpadError,
    WhitelistRootUpdated, BUYER_SEED, MAX_ENGAGEMENT_SCORE, PHASE_SEED, SALE_CONFIG_SEED,
};

// ===== ACCOUNTS

/// Shared by KYC, accreditation, and engagement updates
#[derive(Accounts)]
#[instruction(buyer: Pubkey)]
pub struct UpdateBuyerFlags<'info> {
    #[account(
        mut,
        seeds = [SALE_CONFIG_SEED],
        bump = sale_config.bump,
        constraint = sale_config.compliance_authority == authority.key()
            @ LaunchpadError::Unauthorized
    )]
    pub sale_config: Account<'info, SaleConfig>,

    #[account(
        init_if_needed,
        payer = authority,
        space = BuyerState::LEN,
        seeds = [BUYER_SEED, buyer.as_ref()],
        bump
    )]
    pub buyer_state: Account<'info, BuyerState>,

    #[account(mut)]
    pub authority: Signer<'info>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
#[instruction(kind: PhaseKind)]
pub struct UpdateWhitelistRoot<'info> {
    #[account(
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

// ===== HANDLERS

/// Fill identity fields on a freshly created buyer state
fn ensure_initialized(state: &mut BuyerState, buyer: Pubkey, bump: u8) {
    if state.buyer == Pubkey::default() {
        state.buyer = buyer;
        state.last_purchase_phase = PhaseKind::Inactive;
        state.bump = bump;
    }
}

pub fn update_kyc_status_handler(
    ctx: Context<UpdateBuyerFlags>,
    buyer: Pubkey,
    approved: bool,
) -> Result<()> {
    let sale = &mut ctx.accounts.sale_config;
    let state = &mut ctx.accounts.buyer_state;
    ensure_initialized(state, buyer, ctx.bumps.buyer_state);

    if approved != state.kyc_approved {
        if approved {
            sale.total_kyc_approved = sale.total_kyc_approved.saturating_add(1);
        } else {
            sale.total_kyc_approved = sale.total_kyc_approved.saturating_sub(1);
        }
    }
    state.kyc_approved = approved;

    emit!(KycStatusUpdated { buyer, approved });
    Ok(())
}

pub fn set_accredited_status_handler(
    ctx: Context<UpdateBuyerFlags>,
    buyer: Pubkey,
    accredited: bool,
) -> Result<()> {
    let sale = &mut ctx.accounts.sale_config;
    let state = &mut ctx.accounts.buyer_state;
    ensure_initialized(state, buyer, ctx.bumps.buyer_state);

    if accredited != state.accredited {
        if accredited {
            sale.total_accredited = sale.total_accredited.saturating_add(1);
        } else {
            sale.total_accredited = sale.total_accredited.saturating_sub(1);
        }
    }
    state.accredited = accredited;

    emit!(AccreditationUpdated { buyer, accredited });
    Ok(())
}

pub fn update_engagement_scores_handler(
    ctx: Context<UpdateBuyerFlags>,
    buyer: Pubkey,
    discord: u8,
    twitter: u8,
    github: u8,
    forum: u8,
    verified: bool,
) -> Result<()> {
    let state = &mut ctx.accounts.buyer_state;
    ensure_initialized(state, buyer, ctx.bumps.buyer_state);

    require!(
        discord <= MAX_ENGAGEMENT_SCORE
            && twitter <= MAX_ENGAGEMENT_SCORE
            && github <= MAX_ENGAGEMENT_SCORE
            && forum <= MAX_ENGAGEMENT_SCORE,
        LaunchpadError::InvalidEngagementScore
    );

    state.discord_score = discord;
    state.twitter_score = twitter;
    state.github_score = github;
    state.forum_score = forum;
    state.engagement_verified = verified;

    emit!(EngagementScoresUpdated {
        buyer,
        discord,
        twitter,
        github,
        forum,
        verified,
    });
    Ok(())
}

pub fn update_whitelist_root_handler(
    ctx: Context<UpdateWhitelistRoot>,
    kind: PhaseKind,
    root: [u8; 32],
) -> Result<()> {
    let phase = &mut ctx.accounts.phase_config;
    require!(phase.kind == kind, LaunchpadError::PhaseNotConfigured);

    phase.whitelist_root = root;

    emit!(WhitelistRootUpdated { kind, root });
    msg!("Whitelist root rotated for phase {:?}", kind);
    Ok(())
}
