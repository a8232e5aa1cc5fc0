/**
 * Purchase Commitment State
 *
 * Commit-reveal record for MEV-protected public purchases. One live
 * commitment per wallet; consumed on reveal, replaceable once expired.
 */

use anchor_lang::prelude::*;
use solana_keccak_hasher as keccak;

#[account]
pub struct PurchaseCommitment {
    /// Committing wallet
    pub buyer: Pubkey,

    /// keccak256(buyer || contributed_le || nonce_le)
    pub commitment_hash: [u8; 32],

    /// Commit time; reveal window is measured from here
    pub committed_at: i64,

    /// Bump seed for this PDA
    pub bump: u8,
}

impl PurchaseCommitment {
    pub const LEN: usize = 8 + // discriminator
        32 + // buyer
        32 + // commitment_hash
        8 +  // committed_at
        1;   // bump

    /// The commit delay has elapsed
    pub fn matured(&self, current_time: i64, commit_duration: i64) -> bool {
        current_time >= self.committed_at + commit_duration
    }

    /// The reveal window has closed
    pub fn expired(&self, current_time: i64, commit_expiry: i64) -> bool {
        current_time > self.committed_at + commit_expiry
    }

    /// Recompute the hash from revealed parameters and compare
    pub fn matches(&self, buyer: &Pubkey, contributed: u64, nonce: u64) -> bool {
        self.commitment_hash == compute_commitment_hash(buyer, contributed, nonce)
    }
}

/// Hash preimage: buyer pubkey, then amount and nonce as little-endian u64s
pub fn compute_commitment_hash(buyer: &Pubkey, contributed: u64, nonce: u64) -> [u8; 32] {
    keccak::hashv(&[
        buyer.as_ref(),
        &contributed.to_le_bytes(),
        &nonce.to_le_bytes(),
    ])
    .0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commitment_for(buyer: &Pubkey, contributed: u64, nonce: u64) -> PurchaseCommitment {
        PurchaseCommitment {
            buyer: *buyer,
            commitment_hash: compute_commitment_hash(buyer, contributed, nonce),
            committed_at: 1_000,
            bump: 255,
        }
    }

    #[test]
    fn reveal_window_boundaries() {
        let buyer = Pubkey::new_unique();
        let c = commitment_for(&buyer, 500, 7);

        assert!(!c.matured(1_299, 300));
        assert!(c.matured(1_300, 300));

        assert!(!c.expired(4_600, 3_600));
        assert!(c.expired(4_601, 3_600));
    }

    #[test]
    fn hash_binds_all_three_parameters() {
        let buyer = Pubkey::new_unique();
        let c = commitment_for(&buyer, 500, 7);

        assert!(c.matches(&buyer, 500, 7));
        assert!(!c.matches(&buyer, 501, 7));
        assert!(!c.matches(&buyer, 500, 8));
        assert!(!c.matches(&Pubkey::new_unique(), 500, 7));
    }
}
