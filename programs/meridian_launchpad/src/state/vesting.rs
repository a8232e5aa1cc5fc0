/**
 * Vesting Schedule State
 *
 * Linear vesting from start_time over duration_seconds. Nothing is vested
 * before start_time + cliff_seconds; at the cliff boundary the amount steps
 * up to the linear-from-start value and continues from there.
 */

use anchor_lang::prelude::*;

use crate::LaunchpadError;

/// Beneficiary class a schedule was created for
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum ScheduleTag {
    SalePurchase,
    Team,
    Advisor,
    Community,
}

#[account]
pub struct VestingSchedule {
    /// Sale-wide sequential id
    pub id: u64,

    /// Wallet entitled to claim
    pub beneficiary: Pubkey,

    /// Total raw token units the schedule vests
    pub total_amount: u64,

    /// Raw units already claimed
    pub claimed_amount: u64,

    /// Accrual begins here
    pub start_time: i64,

    /// Nothing is vested before start_time + cliff_seconds
    pub cliff_seconds: i64,

    /// Full amount vested at start_time + duration_seconds
    pub duration_seconds: i64,

    /// Beneficiary class
    pub tag: ScheduleTag,

    /// Revocation freezes accrual at the amount vested when it happened
    pub revoked: bool,
    pub vested_at_revocation: u64,
    pub revoked_at: i64,

    /// Creation time
    pub created_at: i64,

    /// Bump seed for this PDA
    pub bump: u8,

    /// Reserved for future use
    pub reserved: [u8; 16],
}

impl VestingSchedule {
    pub const LEN: usize = 8 + // discriminator
        8 +  // id
        32 + // beneficiary
        8 +  // total_amount
        8 +  // claimed_amount
        8 +  // start_time
        8 +  // cliff_seconds
        8 +  // duration_seconds
        1 +  // tag
        1 +  // revoked
        8 +  // vested_at_revocation
        8 +  // revoked_at
        8 +  // created_at
        1 +  // bump
        16;  // reserved

    /// Parameter validation shared by single and batch creation
    pub fn validate_terms(
        total_amount: u64,
        cliff_seconds: i64,
        duration_seconds: i64,
    ) -> Result<()> {
        require!(total_amount > 0, LaunchpadError::InvalidSchedule);
        require!(duration_seconds > 0, LaunchpadError::InvalidSchedule);
        require!(cliff_seconds >= 0, LaunchpadError::InvalidSchedule);
        require!(cliff_seconds < duration_seconds, LaunchpadError::InvalidSchedule);
        Ok(())
    }

    /// Amount vested at `current_time`: zero before the cliff, then linear
    /// from start_time. Revoked schedules are frozen at their
    /// revocation-time value.
    pub fn vested_amount(&self, current_time: i64) -> u64 {
        if self.revoked {
            return self.vested_at_revocation;
        }
        if current_time < self.start_time + self.cliff_seconds {
            return 0;
        }
        let elapsed = current_time - self.start_time;
        if elapsed >= self.duration_seconds {
            return self.total_amount;
        }
        // total * elapsed / duration, truncating
        ((self.total_amount as u128 * elapsed as u128) / self.duration_seconds as u128) as u64
    }

    /// Vested-but-unclaimed amount
    pub fn claimable_amount(&self, current_time: i64) -> u64 {
        self.vested_amount(current_time).saturating_sub(self.claimed_amount)
    }

    /// Fully vested and fully claimed
    pub fn completed(&self) -> bool {
        self.claimed_amount >= self.total_amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TOKEN_DECIMALS;

    const DAY: i64 = 24 * 60 * 60;

    fn schedule(total: u64, start: i64, cliff: i64, duration: i64) -> VestingSchedule {
        VestingSchedule {
            id: 0,
            beneficiary: Pubkey::new_unique(),
            total_amount: total,
            claimed_amount: 0,
            start_time: start,
            cliff_seconds: cliff,
            duration_seconds: duration,
            tag: ScheduleTag::SalePurchase,
            revoked: false,
            vested_at_revocation: 0,
            revoked_at: 0,
            created_at: start,
            bump: 255,
            reserved: [0; 16],
        }
    }

    #[test]
    fn private_purchase_vests_half_at_ninety_days() {
        // 1,250,000 tokens over 180 days, no cliff
        let total = 1_250_000 * TOKEN_DECIMALS;
        let s = schedule(total, 0, 0, 180 * DAY);

        assert_eq!(s.vested_amount(0), 0);
        assert_eq!(s.claimable_amount(90 * DAY), 625_000 * TOKEN_DECIMALS);
        assert_eq!(s.claimable_amount(180 * DAY), total);
        assert_eq!(s.claimable_amount(400 * DAY), total);
    }

    #[test]
    fn cliff_steps_vesting_to_the_linear_value() {
        // 1 year cliff inside a 4 year schedule
        let total = 4_000_000;
        let s = schedule(total, 0, 365 * DAY, 4 * 365 * DAY);

        // Nothing is vested before the cliff
        assert_eq!(s.vested_amount(180 * DAY), 0);
        assert_eq!(s.vested_amount(364 * DAY), 0);
        assert_eq!(s.claimable_amount(364 * DAY), 0);

        // At the cliff the amount steps up to linear-from-start
        assert_eq!(s.vested_amount(365 * DAY), 1_000_000);
        assert_eq!(s.claimable_amount(365 * DAY), 1_000_000);
    }

    #[test]
    fn pre_cliff_revocation_retains_nothing() {
        let total = 4_000_000;
        let mut s = schedule(total, 0, 365 * DAY, 4 * 365 * DAY);

        // Revoked at 180 days, well before the cliff
        let vested = s.vested_amount(180 * DAY);
        assert_eq!(vested, 0);
        s.revoked = true;
        s.vested_at_revocation = vested;
        s.revoked_at = 180 * DAY;

        // The whole allocation is unvested and nothing ever becomes claimable
        assert_eq!(total - vested, 4_000_000);
        assert_eq!(s.vested_amount(365 * DAY), 0);
        assert_eq!(s.claimable_amount(4 * 365 * DAY), 0);
    }

    #[test]
    fn repeated_claim_at_the_same_time_yields_zero() {
        let mut s = schedule(1_000, 0, 0, 100 * DAY);

        let first = s.claimable_amount(40 * DAY);
        assert_eq!(first, 400);
        s.claimed_amount += first;

        assert_eq!(s.claimable_amount(40 * DAY), 0);
        assert_eq!(s.claimable_amount(50 * DAY), 100);
    }

    #[test]
    fn vesting_is_monotonic_and_capped() {
        let s = schedule(999_983, 1_000, 0, 777);
        let mut previous = 0;
        for t in (900..2_200).step_by(7) {
            let vested = s.vested_amount(t);
            assert!(vested >= previous);
            assert!(vested <= s.total_amount);
            previous = vested;
        }
        assert_eq!(previous, s.total_amount);
    }

    #[test]
    fn revocation_freezes_accrual() {
        let mut s = schedule(1_000, 0, 0, 100 * DAY);
        let frozen = s.vested_amount(40 * DAY);
        assert_eq!(frozen, 400);

        s.revoked = true;
        s.vested_at_revocation = frozen;
        s.revoked_at = 40 * DAY;

        assert_eq!(s.vested_amount(100 * DAY), 400);
        assert_eq!(s.claimable_amount(100 * DAY), 400);

        s.claimed_amount = 400;
        assert_eq!(s.claimable_amount(200 * DAY), 0);
    }

    #[test]
    fn claimable_never_goes_negative_after_reduction() {
        // Claimed amount can exceed a reduced total after a partial revoke
        let mut s = schedule(1_000, 0, 0, 100);
        s.claimed_amount = 600;
        s.total_amount = 500;
        assert_eq!(s.claimable_amount(1_000), 0);
    }

    #[test]
    fn term_validation() {
        assert!(VestingSchedule::validate_terms(1, 0, 1).is_ok());
        assert!(VestingSchedule::validate_terms(0, 0, 1).is_err());
        assert!(VestingSchedule::validate_terms(1, 0, 0).is_err());
        assert!(VestingSchedule::validate_terms(1, -1, 10).is_err());
        assert!(VestingSchedule::validate_terms(1, 10, 10).is_err());
        assert!(VestingSchedule::validate_terms(1, 11, 10).is_err());
    }
}
