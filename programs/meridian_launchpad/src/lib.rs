/**
 * Meridian Launchpad
 *
 * Multi-phase token sale with whitelist gating, commit-reveal MEV protection,
 * and cliff + linear vesting for sale participants and team allocations.
 */

use anchor_lang::prelude::*;

pub mod pricing;
pub mod whitelist;
pub mod state;
pub mod instructions;

use state::*;
use instructions::*;

declare_id!("DkXgBaKrWg83XVRVeccKF4A3mWCQok7w8FuNKebbSZ9");

// =============================================================================
// SEEDS
// =============================================================================

pub const SALE_CONFIG_SEED: &[u8] = b"sale_config";
pub const SALE_VAULT_SEED: &[u8] = b"sale_vault";
pub const PHASE_SEED: &[u8] = b"phase";
pub const BUYER_SEED: &[u8] = b"buyer";
pub const PURCHASE_SEED: &[u8] = b"purchase";
pub const VESTING_SEED: &[u8] = b"vesting";
pub const COMMITMENT_SEED: &[u8] = b"commitment";
pub const REFERRAL_SEED: &[u8] = b"referral";
pub const FUND_CATEGORY_SEED: &[u8] = b"fund_category";

// =============================================================================
// CONSTANTS
// =============================================================================

/// Basis points denominator (10000 = 100%)
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Raw units per whole token (9 decimals)
pub const TOKEN_DECIMALS: u64 = 1_000_000_000;

/// Engagement score weights, in percent (sum to 100)
pub const ENGAGEMENT_WEIGHT_DISCORD: u64 = 30;
pub const ENGAGEMENT_WEIGHT_TWITTER: u64 = 25;
pub const ENGAGEMENT_WEIGHT_GITHUB: u64 = 30;
pub const ENGAGEMENT_WEIGHT_FORUM: u64 = 15;

/// Each engagement category score is 0-100
pub const MAX_ENGAGEMENT_SCORE: u8 = 100;

/// Engagement bonus cap: 10% (1000 bps) at a perfect score
pub const MAX_ENGAGEMENT_BONUS_BPS: u64 = 1_000;

/// Referral bonus for qualified referrers: 5%
pub const REFERRAL_BONUS_BPS: u64 = 500;

/// Private phase purchases vest 100% over 6 months, no cliff
pub const PRIVATE_VESTING_BPS: u16 = 10_000;
pub const PRIVATE_VESTING_SECONDS: i64 = 180 * 24 * 60 * 60;

/// Pre-sale purchases vest 50% over 3 months, no cliff
pub const PRESALE_VESTING_BPS: u16 = 5_000;
pub const PRESALE_VESTING_SECONDS: i64 = 90 * 24 * 60 * 60;

/// Team vesting template: 1 year cliff, 4 year duration.
/// A distinct beneficiary class from sale participants; never applied to purchases.
pub const TEAM_CLIFF_SECONDS: i64 = 365 * 24 * 60 * 60;
pub const TEAM_VESTING_SECONDS: i64 = 4 * 365 * 24 * 60 * 60;

/// Commit-reveal: minimum delay between commit and reveal
pub const DEFAULT_COMMIT_DURATION_SECONDS: i64 = 5 * 60;

/// Commit-reveal: commitments expire unusable after this window
pub const DEFAULT_COMMIT_EXPIRY_SECONDS: i64 = 60 * 60;

/// Cooldown between purchases from the same wallet within a phase
pub const DEFAULT_PURCHASE_COOLDOWN_SECONDS: i64 = 10 * 60;

/// Maximum schedules created per batch instruction
pub const MAX_BATCH_SCHEDULES: usize = 16;

// =============================================================================
// PROGRAM
// =============================================================================

#[program]
pub mod meridian_launchpad {
    use super::*;

    // =========================================================================
    // SALE CONFIGURATION & PHASE LIFECYCLE
    // =========================================================================

    /// Initialize the sale engine
    /// Called once after the token mint is created with the sale PDA as authority
    pub fn init_sale(ctx: Context<InitSale>, params: InitSaleParams) -> Result<()> {
        instructions::configure::init_sale_handler(ctx, params)
    }

    /// Create or update a phase configuration
    /// Rejected once the phase has started or while any phase is live
    pub fn configure_phase(
        ctx: Context<ConfigurePhase>,
        kind: PhaseKind,
        params: PhaseParams,
    ) -> Result<()> {
        instructions::configure::configure_phase_handler(ctx, kind, params)
    }

    /// Open a configured phase (Inactive -> kind)
    pub fn start_phase(ctx: Context<StartPhase>, kind: PhaseKind) -> Result<()> {
        instructions::configure::start_phase_handler(ctx, kind)
    }

    /// Close the active phase (kind -> Inactive), unconditionally
    pub fn end_phase(ctx: Context<EndPhase>) -> Result<()> {
        instructions::configure::end_phase_handler(ctx)
    }

    /// Toggle mandatory commit-reveal for public-phase purchases
    pub fn enable_mev_protection(
        ctx: Context<UpdateSaleSettings>,
        enabled: bool,
    ) -> Result<()> {
        instructions::configure::enable_mev_protection_handler(ctx, enabled)
    }

    // =========================================================================
    // ELIGIBILITY ADMINISTRATION
    // =========================================================================

    /// Set a buyer's KYC approval flag
    pub fn update_kyc_status(
        ctx: Context<UpdateBuyerFlags>,
        buyer: Pubkey,
        approved: bool,
    ) -> Result<()> {
        instructions::eligibility::update_kyc_status_handler(ctx, buyer, approved)
    }

    /// Set a buyer's accredited-investor flag
    pub fn set_accredited_status(
        ctx: Context<UpdateBuyerFlags>,
        buyer: Pubkey,
        accredited: bool,
    ) -> Result<()> {
        instructions::eligibility::set_accredited_status_handler(ctx, buyer, accredited)
    }

    /// Replace a phase's whitelist Merkle root
    pub fn update_whitelist_root(
        ctx: Context<UpdateWhitelistRoot>,
        kind: PhaseKind,
        root: [u8; 32],
    ) -> Result<()> {
        instructions::eligibility::update_whitelist_root_handler(ctx, kind, root)
    }

    /// Set a buyer's engagement category scores (0-100 each) and verified flag
    pub fn update_engagement_scores(
        ctx: Context<UpdateBuyerFlags>,
        buyer: Pubkey,
        discord: u8,
        twitter: u8,
        github: u8,
        forum: u8,
        verified: bool,
    ) -> Result<()> {
        instructions::eligibility::update_engagement_scores_handler(
            ctx, buyer, discord, twitter, github, forum, verified,
        )
    }

    // =========================================================================
    // PURCHASING
    // =========================================================================

    /// Purchase during a vesting phase (private or pre-sale)
    /// Creates a vesting schedule for the vested portion per the phase policy
    pub fn purchase(
        ctx: Context<Purchase>,
        contributed: u64,
        proof: Vec<[u8; 32]>,
    ) -> Result<()> {
        instructions::purchase::purchase_handler(ctx, contributed, proof)
    }

    /// Purchase during a vesting phase with a qualified referrer
    pub fn purchase_with_referral(
        ctx: Context<PurchaseWithReferral>,
        contributed: u64,
        proof: Vec<[u8; 32]>,
        referrer: Pubkey,
    ) -> Result<()> {
        instructions::purchase::purchase_with_referral_handler(ctx, contributed, proof, referrer)
    }

    /// Purchase during the public phase: 100% immediate credit, no schedule
    pub fn purchase_public(
        ctx: Context<PurchasePublic>,
        contributed: u64,
        min_tokens_out: Option<u64>,
    ) -> Result<()> {
        instructions::purchase::purchase_public_handler(ctx, contributed, min_tokens_out)
    }

    /// Record a purchase commitment hash (commit-reveal step 1)
    pub fn commit_purchase(
        ctx: Context<CommitPurchase>,
        commitment_hash: [u8; 32],
    ) -> Result<()> {
        instructions::commit_reveal::commit_purchase_handler(ctx, commitment_hash)
    }

    /// Reveal a committed purchase and execute it with slippage protection
    pub fn reveal_purchase(
        ctx: Context<RevealPurchase>,
        contributed: u64,
        nonce: u64,
        min_tokens_out: u64,
    ) -> Result<()> {
        instructions::commit_reveal::reveal_purchase_handler(ctx, contributed, nonce, min_tokens_out)
    }

    // =========================================================================
    // VESTING
    // =========================================================================

    /// Create a vesting schedule (team/advisor/community allocations)
    pub fn create_schedule(
        ctx: Context<CreateSchedule>,
        beneficiary: Pubkey,
        total_amount: u64,
        start_time: i64,
        cliff_seconds: i64,
        duration_seconds: i64,
        tag: ScheduleTag,
    ) -> Result<()> {
        instructions::vesting::create_schedule_handler(
            ctx, beneficiary, total_amount, start_time, cliff_seconds, duration_seconds, tag,
        )
    }

    /// Create up to MAX_BATCH_SCHEDULES schedules in one transaction
    pub fn create_schedules_batch<'info>(
        ctx: Context<'_, '_, 'info, 'info, CreateSchedulesBatch<'info>>,
        params: Vec<ScheduleParams>,
    ) -> Result<()> {
        instructions::vesting::create_schedules_batch_handler(ctx, params)
    }

    /// Claim the vested-but-unclaimed amount of one schedule
    /// A zero delta is a no-op, not an error
    pub fn claim(ctx: Context<Claim>, schedule_id: u64) -> Result<()> {
        instructions::vesting::claim_handler(ctx, schedule_id)
    }

    /// Claim across every schedule passed as a remaining account
    pub fn claim_all<'info>(ctx: Context<'_, '_, 'info, 'info, ClaimAll<'info>>) -> Result<()> {
        instructions::vesting::claim_all_handler(ctx)
    }

    /// Freeze a schedule's accrual; the unvested remainder returns to treasury
    pub fn revoke(ctx: Context<RevokeSchedule>, schedule_id: u64) -> Result<()> {
        instructions::vesting::revoke_handler(ctx, schedule_id)
    }

    /// Reduce a schedule's total without freezing accrual
    pub fn partial_revoke(
        ctx: Context<RevokeSchedule>,
        schedule_id: u64,
        reduce_amount: u64,
    ) -> Result<()> {
        instructions::vesting::partial_revoke_handler(ctx, schedule_id, reduce_amount)
    }

    /// Reduce a schedule's total and/or duration before completion
    pub fn modify_schedule(
        ctx: Context<ModifySchedule>,
        schedule_id: u64,
        new_total: u64,
        new_duration: i64,
    ) -> Result<()> {
        instructions::vesting::modify_schedule_handler(ctx, schedule_id, new_total, new_duration)
    }

    // =========================================================================
    // TREASURY & FUND CUSTODY
    // =========================================================================

    /// Forward all unallocated custody to the treasury
    pub fn forward_funds(ctx: Context<ForwardFunds>) -> Result<()> {
        instructions::treasury::forward_funds_handler(ctx)
    }

    /// Earmark custody to a named spending category
    pub fn create_fund_category(
        ctx: Context<CreateFundCategory>,
        id: u8,
        name: [u8; 32],
        amount: u64,
    ) -> Result<()> {
        instructions::treasury::create_fund_category_handler(ctx, id, name, amount)
    }

    /// Pay out of a spending category; over-spend is rejected
    pub fn spend_from_category(
        ctx: Context<SpendFromCategory>,
        id: u8,
        amount: u64,
    ) -> Result<()> {
        instructions::treasury::spend_from_category_handler(ctx, id, amount)
    }

    // =========================================================================
    // ANALYTICS & REPORTING
    // =========================================================================

    /// Emit a phase statistics report event
    pub fn get_phase_statistics(
        ctx: Context<GetPhaseStatistics>,
        kind: PhaseKind,
    ) -> Result<()> {
        instructions::analytics::get_phase_statistics_handler(ctx, kind)
    }

    /// Emit a participant analytics report event
    pub fn get_participant_analytics(
        ctx: Context<GetParticipantReport>,
        buyer: Pubkey,
    ) -> Result<()> {
        instructions::analytics::get_participant_analytics_handler(ctx, buyer)
    }

    /// Emit a sale-wide compliance report event
    pub fn get_compliance_report(ctx: Context<GetComplianceReport>) -> Result<()> {
        instructions::analytics::get_compliance_report_handler(ctx)
    }

    /// Log and emit a participant's full record for off-chain export
    pub fn export_participant_data(
        ctx: Context<GetParticipantReport>,
        buyer: Pubkey,
    ) -> Result<()> {
        instructions::analytics::export_participant_data_handler(ctx, buyer)
    }

    // =========================================================================
    // EMERGENCY
    // =========================================================================

    /// Pause all purchase and claim paths
    pub fn pause(ctx: Context<UpdateSaleSettings>) -> Result<()> {
        instructions::emergency::pause_handler(ctx)
    }

    /// Resume normal operation
    pub fn unpause(ctx: Context<UpdateSaleSettings>) -> Result<()> {
        instructions::emergency::unpause_handler(ctx)
    }

    /// Move custody lamports to the treasury outside the normal flow
    pub fn emergency_withdraw(ctx: Context<EmergencyWithdraw>, amount: u64) -> Result<()> {
        instructions::emergency::emergency_withdraw_handler(ctx, amount)
    }
}

// =============================================================================
// ERRORS
// =============================================================================

#[error_code]
pub enum LaunchpadError {
    #[msg("No phase is active or the current time is outside the phase window")]
    PhaseNotActive,

    #[msg("Phase has not been configured")]
    PhaseNotConfigured,

    #[msg("Illegal phase transition")]
    InvalidPhaseTransition,

    #[msg("Phase start time must be strictly in the future")]
    StartTimeInPast,

    #[msg("Phase timing or distribution parameters are inconsistent")]
    InvalidPhaseParams,

    #[msg("Buyer is not on the phase whitelist")]
    NotWhitelisted,

    #[msg("Buyer has not passed KYC")]
    KycRequired,

    #[msg("Buyer is not an accredited investor")]
    AccreditationRequired,

    #[msg("Contribution below the phase minimum")]
    PurchaseBelowMinimum,

    #[msg("Contribution exceeds the per-wallet maximum for this phase")]
    PurchaseAboveMaximum,

    #[msg("Phase hard cap reached")]
    HardCapReached,

    #[msg("Purchase cooldown has not elapsed")]
    RateLimited,

    #[msg("Phase token allocation exhausted")]
    AllocationExhausted,

    #[msg("Commitment hash does not match the revealed parameters")]
    InvalidCommitment,

    #[msg("Reveal attempted before the commit delay elapsed")]
    CommitmentNotMatured,

    #[msg("Commitment has expired")]
    CommitmentExpired,

    #[msg("MEV protection is active: public purchases must use commit-reveal")]
    CommitRevealRequired,

    #[msg("Computed token output below the requested minimum")]
    SlippageExceeded,

    #[msg("Referrer is missing, unqualified, or self-referential")]
    InvalidReferrer,

    #[msg("Schedule amount, timing, or cliff parameters are invalid")]
    InvalidSchedule,

    #[msg("Schedule has fully vested")]
    ScheduleCompleted,

    #[msg("Schedule is already revoked")]
    AlreadyRevoked,

    #[msg("Batch exceeds the per-transaction schedule limit")]
    BatchTooLarge,

    #[msg("Engagement scores must be 0-100")]
    InvalidEngagementScore,

    #[msg("Unauthorized")]
    Unauthorized,

    #[msg("Sale is paused")]
    Paused,

    #[msg("Token account does not match the sale mint")]
    InvalidTokenAccount,

    #[msg("Unknown fund category")]
    InvalidFundCategory,

    #[msg("Spend exceeds the category allocation")]
    CategoryOverspend,

    #[msg("Allocation exceeds unallocated custody")]
    InsufficientCustody,

    #[msg("Math overflow")]
    MathOverflow,
}

// =============================================================================
// EVENTS
// =============================================================================

#[event]
pub struct SaleInitialized {
    pub admin: Pubkey,
    pub mint: Pubkey,
    pub treasury: Pubkey,
    pub compliance_authority: Pubkey,
    pub auto_forward_enabled: bool,
    pub forward_threshold: u64,
}

#[event]
pub struct PhaseConfigured {
    pub kind: PhaseKind,
    pub price: u64,
    pub min_purchase: u64,
    pub max_purchase: u64,
    pub hard_cap: u64,
    pub token_allocation: u64,
    pub start_time: i64,
    pub end_time: i64,
    pub vesting_bps: u16,
    pub vesting_cliff: i64,
    pub vesting_duration: i64,
}

#[event]
pub struct PhaseStarted {
    pub kind: PhaseKind,
    pub started_at: i64,
    pub allocation_remaining: u64,
}

#[event]
pub struct PhaseEnded {
    pub kind: PhaseKind,
    pub ended_at: i64,
    pub tokens_sold: u64,
    pub lamports_raised: u64,
}

#[event]
pub struct MevProtectionUpdated {
    pub enabled: bool,
}

#[event]
pub struct KycStatusUpdated {
    pub buyer: Pubkey,
    pub approved: bool,
}

#[event]
pub struct AccreditationUpdated {
    pub buyer: Pubkey,
    pub accredited: bool,
}

#[event]
pub struct WhitelistRootUpdated {
    pub kind: PhaseKind,
    pub root: [u8; 32],
}

#[event]
pub struct EngagementScoresUpdated {
    pub buyer: Pubkey,
    pub discord: u8,
    pub twitter: u8,
    pub github: u8,
    pub forum: u8,
    pub verified: bool,
}

#[event]
pub struct TokensPurchased {
    pub buyer: Pubkey,
    pub phase: PhaseKind,
    pub contributed: u64,
    pub base_tokens: u64,
    pub bonus_tokens: u64,
    pub immediate_amount: u64,
    pub vested_amount: u64,
    pub schedule_id: u64,
    pub referrer: Pubkey,
    pub receipt_index: u64,
    pub timestamp: i64,
}

#[event]
pub struct ReferralRegistered {
    pub referrer: Pubkey,
    pub referee: Pubkey,
    pub bonus_bps: u16,
}

#[event]
pub struct PurchaseCommitted {
    pub buyer: Pubkey,
    pub commitment_hash: [u8; 32],
    pub committed_at: i64,
}

#[event]
pub struct PurchaseRevealed {
    pub buyer: Pubkey,
    pub contributed: u64,
    pub token_amount: u64,
    pub revealed_at: i64,
}

#[event]
pub struct ScheduleCreated {
    pub schedule_id: u64,
    pub beneficiary: Pubkey,
    pub total_amount: u64,
    pub start_time: i64,
    pub cliff_seconds: i64,
    pub duration_seconds: i64,
    pub tag: ScheduleTag,
}

#[event]
pub struct TokensClaimed {
    pub schedule_id: u64,
    pub beneficiary: Pubkey,
    pub amount: u64,
    pub total_claimed: u64,
}

#[event]
pub struct ScheduleRevoked {
    pub schedule_id: u64,
    pub beneficiary: Pubkey,
    pub vested_retained: u64,
    pub unvested_returned: u64,
}

#[event]
pub struct SchedulePartiallyRevoked {
    pub schedule_id: u64,
    pub beneficiary: Pubkey,
    pub reduced_by: u64,
    pub new_total: u64,
}

#[event]
pub struct ScheduleModified {
    pub schedule_id: u64,
    pub new_total: u64,
    pub new_duration: i64,
}

#[event]
pub struct FundsForwarded {
    pub amount: u64,
    pub treasury: Pubkey,
    pub remaining_custody: u64,
}

#[event]
pub struct FundCategoryCreated {
    pub id: u8,
    pub name: [u8; 32],
    pub allocated: u64,
}

#[event]
pub struct FundsSpent {
    pub category_id: u8,
    pub amount: u64,
    pub recipient: Pubkey,
}

#[event]
pub struct SalePaused {
    pub paused_by: Pubkey,
}

#[event]
pub struct SaleUnpaused {
    pub unpaused_by: Pubkey,
}

#[event]
pub struct EmergencyWithdrawal {
    pub amount: u64,
    pub treasury: Pubkey,
    pub timestamp: i64,
}

#[event]
pub struct PhaseStatistics {
    pub kind: PhaseKind,
    pub token_allocation: u64,
    pub allocation_remaining: u64,
    pub tokens_sold: u64,
    pub bonus_granted: u64,
    pub lamports_raised: u64,
    pub purchases: u64,
    pub participants: u64,
    pub sell_through_bps: u64,
}

#[event]
pub struct ParticipantAnalytics {
    pub buyer: Pubkey,
    pub purchase_count: u64,
    pub total_contributed: u64,
    pub total_tokens: u64,
    pub phases_participated: u8,
    pub last_purchase_at: i64,
}

#[event]
pub struct ComplianceReport {
    pub current_phase: PhaseKind,
    pub total_purchases: u64,
    pub total_kyc_approved: u64,
    pub total_accredited: u64,
    pub funds_in_custody: u64,
}

#[event]
pub struct ParticipantDataExported {
    pub buyer: Pubkey,
    pub kyc_approved: bool,
    pub accredited: bool,
    pub engagement_verified: bool,
    pub purchase_count: u64,
    pub total_contributed: u64,
    pub total_tokens: u64,
    pub referrer: Pubkey,
}
