/**
 * Sale Configuration State
 *
 * SaleConfig holds the phase state machine and global counters; PhaseConfig
 * carries one phase's pricing, caps, eligibility rules, distribution policy,
 * and its allocation ledger.
 */

use anchor_lang::prelude::*;

use crate::LaunchpadError;

/// Sale phase state machine values.
/// Legal flow: Inactive -> Private -> Inactive -> PreSale -> Inactive -> Public -> Inactive.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum PhaseKind {
    Inactive,
    Private,
    PreSale,
    Public,
}

impl PhaseKind {
    /// Ordering key for transition checks and participation bitmasks
    pub fn ordinal(&self) -> u8 {
        match self {
            PhaseKind::Inactive => 0,
            PhaseKind::Private => 1,
            PhaseKind::PreSale => 2,
            PhaseKind::Public => 3,
        }
    }
}

/// Top-level sale engine account
/// Holds the current phase, authority keys, custody counters, and anti-abuse windows
#[account]
pub struct SaleConfig {
    /// Admin for phase lifecycle, vesting administration, and treasury ops
    pub admin: Pubkey,

    /// Authority for KYC/accreditation/engagement updates
    pub compliance_authority: Pubkey,

    /// External treasury receiving forwarded contributions
    pub treasury: Pubkey,

    /// Sale token mint; this PDA is its mint authority
    pub mint: Pubkey,

    /// Currently open phase (Inactive when no sale is live)
    pub current_phase: PhaseKind,

    /// Highest phase ordinal ever started; phases open in ascending order
    pub highest_phase_started: u8,

    /// Emergency circuit breaker
    pub paused: bool,

    /// When set, public purchases must go through commit-reveal
    pub mev_protection_required: bool,

    /// Forward contributions to treasury automatically past the threshold
    pub auto_forward_enabled: bool,

    /// Custody level (lamports) that triggers auto-forwarding
    pub forward_threshold: u64,

    /// Contributed lamports held by the sale vault, not yet forwarded or spent
    pub funds_in_custody: u64,

    /// Portion of custody earmarked to spending categories
    pub funds_allocated: u64,

    /// Lifetime accepted purchases across all phases
    pub total_purchases: u64,

    /// Next vesting schedule id (lifetime counter)
    pub total_schedules: u64,

    /// Buyers currently KYC-approved
    pub total_kyc_approved: u64,

    /// Buyers currently flagged accredited
    pub total_accredited: u64,

    /// Minimum delay between commit and reveal (seconds)
    pub commit_duration: i64,

    /// Window after which an unrevealed commitment expires (seconds)
    pub commit_expiry: i64,

    /// Per-wallet cooldown between purchases within a phase (seconds)
    pub purchase_cooldown: i64,

    /// Bump seed for this PDA
    pub bump: u8,

    /// Bump seed for the lamport vault PDA
    pub vault_bump: u8,

    /// Reserved for future use
    pub reserved: [u8; 64],
}

impl SaleConfig {
    pub const LEN: usize = 8 + // discriminator
        32 + // admin
        32 + // compliance_authority
        32 + // treasury
        32 + // mint
        1 +  // current_phase
        1 +  // highest_phase_started
        1 +  // paused
        1 +  // mev_protection_required
        1 +  // auto_forward_enabled
        8 +  // forward_threshold
        8 +  // funds_in_custody
        8 +  // funds_allocated
        8 +  // total_purchases
        8 +  // total_schedules
        8 +  // total_kyc_approved
        8 +  // total_accredited
        8 +  // commit_duration
        8 +  // commit_expiry
        8 +  // purchase_cooldown
        1 +  // bump
        1 +  // vault_bump
        64;  // reserved

    /// Custody not yet earmarked to a spending category
    pub fn unallocated_custody(&self) -> u64 {
        self.funds_in_custody.saturating_sub(self.funds_allocated)
    }

    /// Transition check for `start_phase`: only from Inactive, only forward
    pub fn can_start(&self, kind: PhaseKind) -> Result<()> {
        require!(
            self.current_phase == PhaseKind::Inactive,
            LaunchpadError::InvalidPhaseTransition
        );
        require!(kind != PhaseKind::Inactive, LaunchpadError::InvalidPhaseTransition);
        require!(
            kind.ordinal() > self.highest_phase_started,
            LaunchpadError::InvalidPhaseTransition
        );
        Ok(())
    }
}

/// Per-phase configuration and allocation ledger
/// Immutable once the phase has started
#[account]
pub struct PhaseConfig {
    /// Which phase this account configures
    pub kind: PhaseKind,

    /// Unit price: lamports per whole token
    pub price: u64,

    /// Minimum contribution per purchase (0 = no minimum; public phase)
    pub min_purchase: u64,

    /// Per-wallet contribution cap for this phase
    pub max_purchase: u64,

    /// Maximum lamports raised in this phase
    pub hard_cap: u64,

    /// Token allocation reserved for this phase (raw units)
    pub token_allocation: u64,

    /// Remaining allocation; decremented atomically per accepted purchase
    pub allocation_remaining: u64,

    /// Phase window
    pub start_time: i64,
    pub end_time: i64,

    /// Eligibility rules
    pub whitelist_required: bool,
    pub kyc_required: bool,
    pub accreditation_required: bool,

    /// Merkle root committing to the phase whitelist
    pub whitelist_root: [u8; 32],

    /// Share of each purchase routed to a vesting schedule
    pub vesting_bps: u16,

    /// Cliff before any vested amount becomes claimable (seconds)
    pub vesting_cliff: i64,

    /// Total vesting duration from purchase time (seconds)
    pub vesting_duration: i64,

    /// Liquidity-seeding share of contributions (public phase only)
    pub liquidity_bps: u16,

    /// Lamports earmarked for liquidity seeding so far
    pub liquidity_reserved: u64,

    /// Statistics
    pub tokens_sold: u64,
    pub bonus_granted: u64,
    pub lamports_raised: u64,
    pub purchases: u64,
    pub participants: u64,

    /// Set when the phase is started / ended (0 = never)
    pub activated_at: i64,
    pub ended_at: i64,

    /// Bump seed for this PDA
    pub bump: u8,

    /// Reserved for future use
    pub reserved: [u8; 32],
}

impl PhaseConfig {
    pub const LEN: usize = 8 + // discriminator
        1 +  // kind
        8 +  // price
        8 +  // min_purchase
        8 +  // max_purchase
        8 +  // hard_cap
        8 +  // token_allocation
        8 +  // allocation_remaining
        8 +  // start_time
        8 +  // end_time
        1 +  // whitelist_required
        1 +  // kyc_required
        1 +  // accreditation_required
        32 + // whitelist_root
        2 +  // vesting_bps
        8 +  // vesting_cliff
        8 +  // vesting_duration
        2 +  // liquidity_bps
        8 +  // liquidity_reserved
        8 +  // tokens_sold
        8 +  // bonus_granted
        8 +  // lamports_raised
        8 +  // purchases
        8 +  // participants
        8 +  // activated_at
        8 +  // ended_at
        1 +  // bump
        32;  // reserved

    /// Current time within the configured window
    pub fn is_open(&self, current_time: i64) -> bool {
        current_time >= self.start_time && current_time < self.end_time
    }

    /// Atomically reserve `amount` raw tokens from the remaining allocation.
    /// The balance never goes negative; an insufficient balance rejects the
    /// whole purchase.
    pub fn reserve(&mut self, amount: u64) -> Result<()> {
        self.allocation_remaining = self
            .allocation_remaining
            .checked_sub(amount)
            .ok_or(LaunchpadError::AllocationExhausted)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phase_with_allocation(allocation: u64) -> PhaseConfig {
        PhaseConfig {
            kind: PhaseKind::Private,
            price: 1,
            min_purchase: 0,
            max_purchase: u64::MAX,
            hard_cap: u64::MAX,
            token_allocation: allocation,
            allocation_remaining: allocation,
            start_time: 1_000,
            end_time: 2_000,
            whitelist_required: false,
            kyc_required: false,
            accreditation_required: false,
            whitelist_root: [0; 32],
            vesting_bps: 0,
            vesting_cliff: 0,
            vesting_duration: 0,
            liquidity_bps: 0,
            liquidity_reserved: 0,
            tokens_sold: 0,
            bonus_granted: 0,
            lamports_raised: 0,
            purchases: 0,
            participants: 0,
            activated_at: 0,
            ended_at: 0,
            bump: 255,
            reserved: [0; 32],
        }
    }

    #[test]
    fn reserve_decrements_and_never_goes_negative() {
        let mut phase = phase_with_allocation(100);
        phase.reserve(60).unwrap();
        assert_eq!(phase.allocation_remaining, 40);
        phase.reserve(40).unwrap();
        assert_eq!(phase.allocation_remaining, 0);

        // Exhausted: the reserve fails and the balance is untouched
        assert!(phase.reserve(1).is_err());
        assert_eq!(phase.allocation_remaining, 0);
    }

    #[test]
    fn reserve_rejects_without_partial_decrement() {
        let mut phase = phase_with_allocation(50);
        assert!(phase.reserve(51).is_err());
        assert_eq!(phase.allocation_remaining, 50);
    }

    #[test]
    fn window_check_is_half_open() {
        let phase = phase_with_allocation(1);
        assert!(!phase.is_open(999));
        assert!(phase.is_open(1_000));
        assert!(phase.is_open(1_999));
        assert!(!phase.is_open(2_000));
    }

    #[test]
    fn phases_start_in_ascending_order_only() {
        let mut sale = SaleConfig {
            admin: Pubkey::default(),
            compliance_authority: Pubkey::default(),
            treasury: Pubkey::default(),
            mint: Pubkey::default(),
            current_phase: PhaseKind::Inactive,
            highest_phase_started: 0,
            paused: false,
            mev_protection_required: false,
            auto_forward_enabled: false,
            forward_threshold: 0,
            funds_in_custody: 0,
            funds_allocated: 0,
            total_purchases: 0,
            total_schedules: 0,
            total_kyc_approved: 0,
            total_accredited: 0,
            commit_duration: 0,
            commit_expiry: 0,
            purchase_cooldown: 0,
            bump: 255,
            vault_bump: 255,
            reserved: [0; 64],
        };

        assert!(sale.can_start(PhaseKind::Private).is_ok());
        assert!(sale.can_start(PhaseKind::Inactive).is_err());

        // A live phase blocks every start
        sale.current_phase = PhaseKind::Private;
        sale.highest_phase_started = PhaseKind::Private.ordinal();
        assert!(sale.can_start(PhaseKind::PreSale).is_err());

        // Ended: may move forward, never backward
        sale.current_phase = PhaseKind::Inactive;
        assert!(sale.can_start(PhaseKind::Private).is_err());
        assert!(sale.can_start(PhaseKind::PreSale).is_ok());
        assert!(sale.can_start(PhaseKind::Public).is_ok());
    }
}
