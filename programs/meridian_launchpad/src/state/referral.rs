/**
 * Referral State
 *
 * Aggregate record per referrer. Individual referee attribution lives in
 * purchase receipts and ReferralRegistered events.
 */

use anchor_lang::prelude::*;

#[account]
pub struct ReferralRecord {
    /// Referring wallet
    pub referrer: Pubkey,

    /// Purchases credited to this referrer
    pub referral_count: u64,

    /// Lamports contributed by referees
    pub referred_volume: u64,

    /// Bonus raw token units minted to referees on this referrer's behalf
    pub bonus_tokens_granted: u64,

    /// Bump seed for this PDA
    pub bump: u8,
}

impl ReferralRecord {
    pub const LEN: usize = 8 + // discriminator
        32 + // referrer
        8 +  // referral_count
        8 +  // referred_volume
        8 +  // bonus_tokens_granted
        1;   // bump
}
