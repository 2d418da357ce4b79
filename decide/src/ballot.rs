use crate::*;
use sha2::{Digest, Sha256};

/// A stored vote. Immutable once accepted.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EncryptedBallot {
    pub voting: VotingId,
    pub voter: VoterId,
    pub vote: Ciphertext,
}

impl EncryptedBallot {
    /// Hex SHA-256 of the ciphertext. Lets a voter find their ballot without revealing it.
    pub fn receipt(&self) -> String {
        receipt_for(&self.vote)
    }
}

pub fn receipt_for(vote: &Ciphertext) -> String {
    hex::encode(Sha256::digest(&vote.to_bytes()))
}

/// A ballot as it arrives over the wire:
///
/// ```json
/// {"voting": 1, "voter": 42, "vote": {"a": "1234...", "b": "5678..."}}
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BallotSubmission {
    pub voting: VotingId,
    pub voter: VoterId,
    pub vote: Ciphertext,
}

impl BallotSubmission {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl From<BallotSubmission> for EncryptedBallot {
    fn from(item: BallotSubmission) -> Self {
        EncryptedBallot {
            voting: item.voting,
            voter: item.voter,
            vote: item.vote,
        }
    }
}

/// Handed back when a ballot is accepted
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BallotReceipt {
    pub voting: VotingId,
    pub voter: VoterId,
    pub receipt: String,
}

impl From<&EncryptedBallot> for BallotReceipt {
    fn from(ballot: &EncryptedBallot) -> Self {
        BallotReceipt {
            voting: ballot.voting,
            voter: ballot.voter,
            receipt: ballot.receipt(),
        }
    }
}
