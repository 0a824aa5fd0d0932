//! Vote payload submitted to the induction gateway
//!
//! Signature verification happens upstream; the engine consumes the already
//! verified `(validator_index, target_epoch)` pair and carries the rest of
//! the payload opaquely for fork-choice consumers.

use serde::{Deserialize, Serialize};

use super::units::{Epoch, ValidatorIndex};

/// Hash identifying the checkpoint a vote commits to
pub type CheckpointHash = [u8; 32];

/// A vote for an epoch checkpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    /// Index of the voting validator
    pub validator_index: ValidatorIndex,

    /// Epoch whose checkpoint is being voted on
    pub target_epoch: Epoch,

    /// Checkpoint hash the vote commits to
    pub target_checkpoint: CheckpointHash,

    /// Opaque signature bytes, verified before submission
    pub signature: Vec<u8>,
}

impl Vote {
    /// Create a vote with full payload
    pub fn new(
        validator_index: ValidatorIndex,
        target_epoch: Epoch,
        target_checkpoint: CheckpointHash,
        signature: Vec<u8>,
    ) -> Self {
        Self {
            validator_index,
            target_epoch,
            target_checkpoint,
            signature,
        }
    }

    /// Create a vote without signature bytes, for already verified inputs
    pub fn unsigned(
        validator_index: ValidatorIndex,
        target_epoch: Epoch,
        target_checkpoint: CheckpointHash,
    ) -> Self {
        Self::new(validator_index, target_epoch, target_checkpoint, Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vote_construction() {
        let vote = Vote::unsigned(7, 12, [0xab; 32]);
        assert_eq!(vote.validator_index, 7);
        assert_eq!(vote.target_epoch, 12);
        assert!(vote.signature.is_empty());
    }

    #[test]
    fn test_vote_serde_round_trip() {
        let vote = Vote::new(3, 5, [1; 32], vec![9, 9, 9]);
        let bytes = bincode::serialize(&vote).unwrap();
        let back: Vote = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back.validator_index, vote.validator_index);
        assert_eq!(back.target_epoch, vote.target_epoch);
        assert_eq!(back.target_checkpoint, vote.target_checkpoint);
        assert_eq!(back.signature, vote.signature);
    }
}
