/**
 * Analytics & Reporting
 *
 * Read-only instructions that emit report events for off-chain consumers.
 * Nothing here mutates sale state.
 */

use anchor_lang::prelude::*;

use crate::state::*;
use crate::{
    ComplianceReport, ParticipantAnalytics, ParticipantDataExported, BPS_DENOMINATOR,
    BUYER_SEED, PHASE_SEED, SALE_CONFIG_SEED,
};

// ===== ACCOUNTS

#[derive(Accounts)]
#[instruction(kind: PhaseKind)]
pub struct GetPhaseStatistics<'info> {
    #[account(
        seeds = [SALE_CONFIG_SEED],
        bump = sale_config.bump
    )]
    pub sale_config: Account<'info, SaleConfig>,

    #[account(
        seeds = [PHASE_SEED, &[kind.ordinal()]],
        bump = phase_config.bump
    )]
    pub phase_config: Account<'info, PhaseConfig>,
}

/// Shared by participant analytics and data export
#[derive(Accounts)]
#[instruction(buyer: Pubkey)]
pub struct GetParticipantReport<'info> {
    #[account(
        seeds = [SALE_CONFIG_SEED],
        bump = sale_config.bump
    )]
    pub sale_config: Account<'info, SaleConfig>,

    #[account(
        seeds = [BUYER_SEED, buyer.as_ref()],
        bump = buyer_state.bump
    )]
    pub buyer_state: Account<'info, BuyerState>,
}

#[derive(Accounts)]
pub struct GetComplianceReport<'info> {
    #[account(
        seeds = [SALE_CONFIG_SEED],
        bump = sale_config.bump
    )]
    pub sale_config: Account<'info, SaleConfig>,
}

// ===== HANDLERS

pub fn get_phase_statistics_handler(
    ctx: Context<GetPhaseStatistics>,
    kind: PhaseKind,
) -> Result<()> {
    let phase = &ctx.accounts.phase_config;

    let sell_through_bps = if phase.token_allocation > 0 {
        ((phase.tokens_sold as u128 * BPS_DENOMINATOR as u128)
            / phase.token_allocation as u128) as u64
    } else {
        0
    };

    emit!(crate::PhaseStatistics {
        kind,
        token_allocation: phase.token_allocation,
        allocation_remaining: phase.allocation_remaining,
        tokens_sold: phase.tokens_sold,
        bonus_granted: phase.bonus_granted,
        lamports_raised: phase.lamports_raised,
        purchases: phase.purchases,
        participants: phase.participants,
        sell_through_bps,
    });

    msg!(
        "Phase {:?}: {} sold of {}, {} raised",
        kind,
        phase.tokens_sold,
        phase.token_allocation,
        phase.lamports_raised
    );
    Ok(())
}

pub fn get_participant_analytics_handler(
    ctx: Context<GetParticipantReport>,
    buyer: Pubkey,
) -> Result<()> {
    let state = &ctx.accounts.buyer_state;

    emit!(ParticipantAnalytics {
        buyer,
        purchase_count: state.purchase_count,
        total_contributed: state.total_contributed,
        total_tokens: state.total_tokens,
        phases_participated: state.phases_participated,
        last_purchase_at: state.last_purchase_at,
    });

    Ok(())
}

pub fn get_compliance_report_handler(ctx: Context<GetComplianceReport>) -> Result<()> {
    let sale = &ctx.accounts.sale_config;

    emit!(ComplianceReport {
        current_phase: sale.current_phase,
        total_purchases: sale.total_purchases,
        total_kyc_approved: sale.total_kyc_approved,
        total_accredited: sale.total_accredited,
        funds_in_custody: sale.funds_in_custody,
    });

    Ok(())
}

pub fn export_participant_data_handler(
    ctx: Context<GetParticipantReport>,
    buyer: Pubkey,
) -> Result<()> {
    let state = &ctx.accounts.buyer_state;

    emit!(ParticipantDataExported {
        buyer,
        kyc_approved: state.kyc_approved,
        accredited: state.accredited,
        engagement_verified: state.engagement_verified,
        purchase_count: state.purchase_count,
        total_contributed: state.total_contributed,
        total_tokens: state.total_tokens,
        referrer: state.referrer,
    });

    msg!(
        "Export {}: kyc={} accredited={} purchases={}",
        buyer,
        state.kyc_approved,
        state.accredited,
        state.purchase_count
    );
    Ok(())
}
