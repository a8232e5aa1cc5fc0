/**
 * Fund Category State
 *
 * Named spending buckets carved out of sale custody. A category can never
 * pay out more than it was allocated.
 */

use anchor_lang::prelude::*;

use crate::LaunchpadError;

#[account]
pub struct FundCategory {
    /// Small integer id, also the PDA seed
    pub id: u8,

    /// UTF-8 label, zero-padded
    pub name: [u8; 32],

    /// Lamports earmarked to this category
    pub allocated: u64,

    /// Lamports paid out so far
    pub spent: u64,

    /// Creation time
    pub created_at: i64,

    /// Bump seed for this PDA
    pub bump: u8,
}

impl FundCategory {
    pub const LEN: usize = 8 + // discriminator
        1 +  // id
        32 + // name
        8 +  // allocated
        8 +  // spent
        8 +  // created_at
        1;   // bump

    /// Allocation not yet spent
    pub fn remaining(&self) -> u64 {
        self.allocated.saturating_sub(self.spent)
    }

    /// Record a payout; rejects any spend past the allocation
    pub fn spend(&mut self, amount: u64) -> Result<()> {
        let new_spent = self
            .spent
            .checked_add(amount)
            .ok_or(LaunchpadError::MathOverflow)?;
        require!(new_spent <= self.allocated, LaunchpadError::CategoryOverspend);
        self.spent = new_spent;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spend_is_capped_at_the_allocation() {
        let mut category = FundCategory {
            id: 1,
            name: [0; 32],
            allocated: 100,
            spent: 0,
            created_at: 0,
            bump: 255,
        };

        category.spend(60).unwrap();
        assert_eq!(category.remaining(), 40);
        category.spend(40).unwrap();
        assert_eq!(category.remaining(), 0);

        assert!(category.spend(1).is_err());
        assert_eq!(category.spent, 100);
    }

    #[test]
    fn overspend_rejects_without_partial_update() {
        let mut category = FundCategory {
            id: 2,
            name: [0; 32],
            allocated: 50,
            spent: 10,
            created_at: 0,
            bump: 255,
        };

        assert!(category.spend(41).is_err());
        assert_eq!(category.spent, 10);
    }
}
