use crate::*;
use std::collections::BTreeMap;
use std::sync::RwLock;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("voter {voter} already has a ballot in voting {voting}")]
pub struct DuplicateBallot {
    pub voting: VotingId,
    pub voter: VoterId,
}

impl From<DuplicateBallot> for EligibilityError {
    fn from(err: DuplicateBallot) -> Self {
        EligibilityError::AlreadyVoted {
            voting: err.voting,
            voter: err.voter,
        }
    }
}

impl From<DuplicateBallot> for Error {
    fn from(err: DuplicateBallot) -> Self {
        Error::Eligibility(err.into())
    }
}

/// A ballot store
///
/// At most one ballot is ever kept per (voting, voter). Implementations must make the
/// uniqueness check and the write a single atomic step.
pub trait BallotStore: Send + Sync {
    /// Store a ballot unless the voter already has one in this voting.
    fn insert(&self, ballot: EncryptedBallot) -> Result<(), DuplicateBallot>;

    fn get(&self, voting: VotingId, voter: VoterId) -> Option<EncryptedBallot>;

    /// All ballots of a voting, ordered by voter
    fn list(&self, voting: VotingId) -> Vec<EncryptedBallot>;

    fn count(&self, voting: VotingId) -> usize {
        self.list(voting).len()
    }
}

/// A simple store that uses an in-memory BTreeMap
#[derive(Default)]
pub struct MemStore {
    inner: RwLock<BTreeMap<(VotingId, VoterId), EncryptedBallot>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BallotStore for MemStore {
    fn insert(&self, ballot: EncryptedBallot) -> Result<(), DuplicateBallot> {
        let key = (ballot.voting, ballot.voter);
        let mut inner = self.inner.write().unwrap();
        if inner.contains_key(&key) {
            return Err(DuplicateBallot {
                voting: ballot.voting,
                voter: ballot.voter,
            });
        }
        inner.insert(key, ballot);
        Ok(())
    }

    fn get(&self, voting: VotingId, voter: VoterId) -> Option<EncryptedBallot> {
        self.inner.read().unwrap().get(&(voting, voter)).cloned()
    }

    fn list(&self, voting: VotingId) -> Vec<EncryptedBallot> {
        let start = (voting, VoterId(0));
        let end = (voting, VoterId(u64::MAX));

        self.inner
            .read()
            .unwrap()
            .range(start..=end)
            .map(|(_, v)| v.clone())
            .collect()
    }

    fn count(&self, voting: VotingId) -> usize {
        let start = (voting, VoterId(0));
        let end = (voting, VoterId(u64::MAX));
        self.inner.read().unwrap().range(start..=end).count()
    }
}

impl From<Vec<EncryptedBallot>> for MemStore {
    fn from(item: Vec<EncryptedBallot>) -> Self {
        let store = MemStore::default();
        for ballot in item {
            // Later duplicates are dropped
            let _ = store.insert(ballot);
        }
        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num::BigUint;
    use std::sync::Arc;

    fn ballot(voting: u64, voter: u64, a: u32) -> EncryptedBallot {
        EncryptedBallot {
            voting: VotingId(voting),
            voter: VoterId(voter),
            vote: Ciphertext {
                a: BigUint::from(a),
                b: BigUint::from(1_u32),
            },
        }
    }

    #[test]
    fn one_ballot_per_voter() {
        let store = MemStore::new();
        store.insert(ballot(1, 5, 4)).unwrap();
        store.insert(ballot(1, 2, 9)).unwrap();
        store.insert(ballot(2, 5, 16)).unwrap();

        assert_eq!(
            store.insert(ballot(1, 5, 25)),
            Err(DuplicateBallot {
                voting: VotingId(1),
                voter: VoterId(5)
            })
        );

        // The first ballot is kept
        assert_eq!(store.get(VotingId(1), VoterId(5)), Some(ballot(1, 5, 4)));

        let voters: Vec<VoterId> = store.list(VotingId(1)).iter().map(|b| b.voter).collect();
        assert_eq!(voters, vec![VoterId(2), VoterId(5)]);
        assert_eq!(store.count(VotingId(1)), 2);
        assert_eq!(store.count(VotingId(2)), 1);
        assert_eq!(store.count(VotingId(3)), 0);
    }

    #[test]
    fn concurrent_duplicates() {
        let store = Arc::new(MemStore::new());
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || store.insert(ballot(1, 7, i + 2)).is_ok())
            })
            .collect();

        let accepted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(accepted, 1);
        assert_eq!(store.count(VotingId(1)), 1);
    }

    #[test]
    fn duplicate_maps_to_already_voted() {
        let err: Error = DuplicateBallot {
            voting: VotingId(1),
            voter: VoterId(2),
        }
        .into();
        assert_eq!(err.reason(), "Voter 2 already voted in voting 1");
        assert!(err.is_rejection());
    }

    #[test]
    fn from_vec() {
        let store = MemStore::from(vec![ballot(1, 1, 4), ballot(1, 1, 9), ballot(1, 2, 4)]);
        assert_eq!(store.count(VotingId(1)), 2);
    }
}
