use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

use crate::{field::FieldElement, message::sha256_to_field};

/// Merkle inclusion proof of a withdrawal message in a block's outbox tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipWitness {
    leaf_index: u64,
    sibling_path: Vec<B256>,
}

impl MembershipWitness {
    pub fn new(leaf_index: u64, sibling_path: Vec<B256>) -> Self {
        Self {
            leaf_index,
            sibling_path,
        }
    }

    pub fn leaf_index(&self) -> u64 {
        self.leaf_index
    }

    pub fn sibling_path(&self) -> &[B256] {
        &self.sibling_path
    }

    pub fn depth(&self) -> usize {
        self.sibling_path.len()
    }

    /// Folds `leaf` up the sibling path and returns the resulting root.
    pub fn compute_root(&self, leaf: &FieldElement) -> B256 {
        let mut node = *leaf.as_b256();
        let mut index = self.leaf_index;
        for sibling in &self.sibling_path {
            node = if index & 1 == 0 {
                sha256_to_field([node.as_slice(), sibling.as_slice()]).into()
            } else {
                sha256_to_field([sibling.as_slice(), node.as_slice()]).into()
            };
            index >>= 1;
        }
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash(a: &B256, b: &B256) -> B256 {
        sha256_to_field([a.as_slice(), b.as_slice()]).into()
    }

    #[test]
    fn test_compute_root_matches_manual_tree() {
        let leaves: Vec<B256> = (1u64..=4)
            .map(|i| *FieldElement::from(i).as_b256())
            .collect();
        let left = hash(&leaves[0], &leaves[1]);
        let right = hash(&leaves[2], &leaves[3]);
        let root = hash(&left, &right);

        // Leaf 2 has sibling leaf 3, then the left subtree.
        let witness = MembershipWitness::new(2, vec![leaves[3], left]);
        assert_eq!(witness.compute_root(&FieldElement::from(3u64)), root);

        let wrong_index = MembershipWitness::new(3, vec![leaves[3], left]);
        assert_ne!(wrong_index.compute_root(&FieldElement::from(3u64)), root);
    }

    #[test]
    fn test_empty_path_is_leaf() {
        let leaf = FieldElement::from(5u64);
        let witness = MembershipWitness::new(0, vec![]);
        assert_eq!(witness.compute_root(&leaf), *leaf.as_b256());
        assert_eq!(witness.depth(), 0);
    }
}
