/**
 * Buyer State
 *
 * One BuyerState per wallet, created lazily on first compliance update or
 * first purchase. PurchaseReceipt is an immutable per-purchase record.
 */

use anchor_lang::prelude::*;

use crate::state::PhaseKind;

/// Per-wallet eligibility flags, engagement profile, and purchase history
#[account]
pub struct BuyerState {
    /// Wallet this state belongs to
    pub buyer: Pubkey,

    /// Compliance flags
    pub kyc_approved: bool,
    pub accredited: bool,

    /// Engagement category scores, 0-100 each
    pub discord_score: u8,
    pub twitter_score: u8,
    pub github_score: u8,
    pub forum_score: u8,

    /// Scores only count toward a bonus once verified by the compliance authority
    pub engagement_verified: bool,

    /// Lifetime purchase counters
    pub purchase_count: u64,
    pub total_contributed: u64,
    pub total_tokens: u64,

    /// Contribution within the current phase; resets when the phase changes
    pub phase_contributed: u64,

    /// Phase of the most recent purchase
    pub last_purchase_phase: PhaseKind,

    /// Timestamp of the most recent purchase (0 = never)
    pub last_purchase_at: i64,

    /// Bitmask of phase ordinals this wallet has purchased in
    pub phases_participated: u8,

    /// Referrer recorded on this wallet's first referred purchase
    pub referrer: Pubkey,

    /// Bump seed for this PDA
    pub bump: u8,

    /// Reserved for future use
    pub reserved: [u8; 32],
}

impl BuyerState {
    pub const LEN: usize = 8 + // discriminator
        32 + // buyer
        1 +  // kyc_approved
        1 +  // accredited
        1 +  // discord_score
        1 +  // twitter_score
        1 +  // github_score
        1 +  // forum_score
        1 +  // engagement_verified
        8 +  // purchase_count
        8 +  // total_contributed
        8 +  // total_tokens
        8 +  // phase_contributed
        1 +  // last_purchase_phase
        8 +  // last_purchase_at
        1 +  // phases_participated
        32 + // referrer
        1 +  // bump
        32;  // reserved

    /// Still inside the per-wallet cooldown window. The cooldown is scoped
    /// to the phase: a purchase at the tail of one phase does not lock the
    /// wallet out of the next.
    pub fn rate_limited(&self, phase: PhaseKind, current_time: i64, cooldown: i64) -> bool {
        self.last_purchase_phase == phase
            && self.last_purchase_at != 0
            && current_time < self.last_purchase_at + cooldown
    }

    /// Contribution already made in `phase`, accounting for phase rollover
    pub fn contributed_in_phase(&self, phase: PhaseKind) -> u64 {
        if self.last_purchase_phase == phase {
            self.phase_contributed
        } else {
            0
        }
    }

    /// Whether this wallet purchased in `phase` at any point
    pub fn participated_in(&self, phase: PhaseKind) -> bool {
        self.phases_participated & (1 << phase.ordinal()) != 0
    }

    /// Whether this wallet purchased in any phase earlier than `phase`
    pub fn participated_before(&self, phase: PhaseKind) -> bool {
        self.phases_participated & ((1u8 << phase.ordinal()) - 1) != 0
    }

    /// Record an accepted purchase. Returns true when this is the wallet's
    /// first purchase in `phase`.
    pub fn record_purchase(
        &mut self,
        phase: PhaseKind,
        contributed: u64,
        tokens: u64,
        current_time: i64,
    ) -> bool {
        let first_in_phase = !self.participated_in(phase);

        if self.last_purchase_phase != phase {
            self.phase_contributed = 0;
            self.last_purchase_phase = phase;
        }
        self.phase_contributed = self.phase_contributed.saturating_add(contributed);
        self.total_contributed = self.total_contributed.saturating_add(contributed);
        self.total_tokens = self.total_tokens.saturating_add(tokens);
        self.purchase_count = self.purchase_count.saturating_add(1);
        self.last_purchase_at = current_time;
        self.phases_participated |= 1 << phase.ordinal();

        first_in_phase
    }
}

/// Immutable record of one accepted purchase
#[account]
pub struct PurchaseReceipt {
    /// Purchasing wallet
    pub buyer: Pubkey,

    /// Phase the purchase executed in
    pub phase: PhaseKind,

    /// Contribution in lamports
    pub contributed: u64,

    /// Token amounts in raw units
    pub base_tokens: u64,
    pub bonus_tokens: u64,
    pub immediate_amount: u64,
    pub vested_amount: u64,

    /// Vesting schedule created for this purchase (0 when fully immediate;
    /// check vested_amount to disambiguate from schedule id 0)
    pub schedule_id: u64,

    /// Referrer credited on this purchase (default pubkey = none)
    pub referrer: Pubkey,

    /// Per-buyer sequence number
    pub index: u64,

    /// Execution time
    pub timestamp: i64,

    /// Bump seed for this PDA
    pub bump: u8,
}

impl PurchaseReceipt {
    pub const LEN: usize = 8 + // discriminator
        32 + // buyer
        1 +  // phase
        8 +  // contributed
        8 +  // base_tokens
        8 +  // bonus_tokens
        8 +  // immediate_amount
        8 +  // vested_amount
        8 +  // schedule_id
        32 + // referrer
        8 +  // index
        8 +  // timestamp
        1;   // bump
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_buyer() -> BuyerState {
        BuyerState {
            buyer: Pubkey::new_unique(),
            kyc_approved: false,
            accredited: false,
            discord_score: 0,
            twitter_score: 0,
            github_score: 0,
            forum_score: 0,
            engagement_verified: false,
            purchase_count: 0,
            total_contributed: 0,
            total_tokens: 0,
            phase_contributed: 0,
            last_purchase_phase: PhaseKind::Inactive,
            last_purchase_at: 0,
            phases_participated: 0,
            referrer: Pubkey::default(),
            bump: 255,
            reserved: [0; 32],
        }
    }

    #[test]
    fn cooldown_applies_only_after_a_purchase() {
        let mut buyer = fresh_buyer();
        assert!(!buyer.rate_limited(PhaseKind::Public, 100, 600));

        buyer.record_purchase(PhaseKind::Public, 10, 10, 100);
        assert!(buyer.rate_limited(PhaseKind::Public, 100, 600));
        assert!(buyer.rate_limited(PhaseKind::Public, 699, 600));
        assert!(!buyer.rate_limited(PhaseKind::Public, 700, 600));
    }

    #[test]
    fn cooldown_does_not_carry_across_phases() {
        let mut buyer = fresh_buyer();
        buyer.record_purchase(PhaseKind::PreSale, 10, 10, 100);
        assert!(buyer.rate_limited(PhaseKind::PreSale, 150, 600));

        // A fresh phase is not gated by the previous phase's purchase
        assert!(!buyer.rate_limited(PhaseKind::Public, 150, 600));
    }

    #[test]
    fn phase_contribution_resets_on_phase_change() {
        let mut buyer = fresh_buyer();
        buyer.record_purchase(PhaseKind::Private, 1_000, 50, 100);
        buyer.record_purchase(PhaseKind::Private, 500, 25, 800);
        assert_eq!(buyer.contributed_in_phase(PhaseKind::Private), 1_500);

        buyer.record_purchase(PhaseKind::PreSale, 200, 5, 2_000);
        assert_eq!(buyer.contributed_in_phase(PhaseKind::PreSale), 200);
        assert_eq!(buyer.contributed_in_phase(PhaseKind::Private), 0);
        assert_eq!(buyer.total_contributed, 1_700);
    }

    #[test]
    fn participation_bitmask_tracks_each_phase_once() {
        let mut buyer = fresh_buyer();
        assert!(buyer.record_purchase(PhaseKind::Private, 1, 1, 10));
        assert!(!buyer.record_purchase(PhaseKind::Private, 1, 1, 20));
        assert!(buyer.record_purchase(PhaseKind::Public, 1, 1, 30));

        assert!(buyer.participated_in(PhaseKind::Private));
        assert!(!buyer.participated_in(PhaseKind::PreSale));
        assert!(buyer.participated_in(PhaseKind::Public));
        assert_eq!(buyer.purchase_count, 3);
    }

    #[test]
    fn earlier_phase_participation_qualifies_referrers() {
        let mut buyer = fresh_buyer();
        assert!(!buyer.participated_before(PhaseKind::PreSale));

        buyer.record_purchase(PhaseKind::Private, 1, 1, 10);
        assert!(buyer.participated_before(PhaseKind::PreSale));
        assert!(buyer.participated_before(PhaseKind::Public));
        // Same-phase participation does not count as earlier
        assert!(!buyer.participated_before(PhaseKind::Private));
    }
}
