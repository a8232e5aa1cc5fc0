/**
 * Whitelist Verification
 *
 * Pure Merkle membership check over keccak leaves with sorted-pair hashing.
 * Malformed or empty proofs resolve to non-membership, never a panic.
 */

use anchor_lang::prelude::*;
use solana_keccak_hasher as keccak;

/// Leaf for a buyer: keccak256 of the raw address bytes
pub fn leaf_for(address: &Pubkey) -> [u8; 32] {
    keccak::hashv(&[address.as_ref()]).0
}

/// Recompute the Merkle path from `leaf` using `proof` and compare to `root`.
/// Sibling order is canonicalized by byte comparison so the prover does not
/// need to encode left/right direction bits.
pub fn verify_membership(leaf: [u8; 32], proof: &[[u8; 32]], root: &[u8; 32]) -> bool {
    let mut computed = leaf;
    for node in proof {
        computed = if computed <= *node {
            hash_pair(&computed, node)
        } else {
            hash_pair(node, &computed)
        };
    }
    computed == *root
}

fn hash_pair(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    keccak::hashv(&[left, right]).0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(a: &[u8; 32], b: &[u8; 32]) -> [u8; 32] {
        if a <= b {
            hash_pair(a, b)
        } else {
            hash_pair(b, a)
        }
    }

    /// Build a 4-leaf tree and return (leaves, root)
    fn four_leaf_tree() -> ([[u8; 32]; 4], [u8; 32]) {
        let addresses: Vec<Pubkey> = (1..=4u8).map(|i| Pubkey::new_from_array([i; 32])).collect();
        let leaves = [
            leaf_for(&addresses[0]),
            leaf_for(&addresses[1]),
            leaf_for(&addresses[2]),
            leaf_for(&addresses[3]),
        ];
        let left = pair(&leaves[0], &leaves[1]);
        let right = pair(&leaves[2], &leaves[3]);
        (leaves, pair(&left, &right))
    }

    #[test]
    fn accepts_every_member_of_a_generated_tree() {
        let (leaves, root) = four_leaf_tree();
        let left = pair(&leaves[0], &leaves[1]);
        let right = pair(&leaves[2], &leaves[3]);

        assert!(verify_membership(leaves[0], &[leaves[1], right], &root));
        assert!(verify_membership(leaves[1], &[leaves[0], right], &root));
        assert!(verify_membership(leaves[2], &[leaves[3], left], &root));
        assert!(verify_membership(leaves[3], &[leaves[2], left], &root));
    }

    #[test]
    fn rejects_non_members_and_wrong_paths() {
        let (leaves, root) = four_leaf_tree();
        let right = pair(&leaves[2], &leaves[3]);

        let outsider = leaf_for(&Pubkey::new_from_array([9; 32]));
        assert!(!verify_membership(outsider, &[leaves[1], right], &root));

        // Valid leaf, sibling from the wrong branch
        assert!(!verify_membership(leaves[0], &[leaves[2], right], &root));
    }

    #[test]
    fn empty_proof_fails_closed_unless_single_leaf_tree() {
        let (leaves, root) = four_leaf_tree();
        assert!(!verify_membership(leaves[0], &[], &root));

        // Degenerate single-leaf tree: the leaf is the root
        assert!(verify_membership(leaves[0], &[], &leaves[0]));
    }
}
