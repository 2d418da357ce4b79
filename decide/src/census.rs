use crate::*;
use std::collections::BTreeSet;
use std::sync::RwLock;

/// Outcome of an upsert into the census
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CensusInsert {
    Inserted,
    AlreadyPresent,
}

/// The roster of voters allowed to vote in each voting.
#[derive(Default)]
pub struct Census {
    entries: RwLock<BTreeSet<(VotingId, VoterId)>>,
}

impl Census {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a voter to a voting's census. Adding the same pair twice is not an error.
    pub fn add(&self, voting: VotingId, voter: VoterId) -> CensusInsert {
        let mut entries = self.entries.write().unwrap();
        if entries.insert((voting, voter)) {
            CensusInsert::Inserted
        } else {
            CensusInsert::AlreadyPresent
        }
    }

    pub fn contains(&self, voting: VotingId, voter: VoterId) -> bool {
        self.entries.read().unwrap().contains(&(voting, voter))
    }

    /// Fail with `NotInCensus` unless the voter may vote.
    pub fn check(&self, voting: VotingId, voter: VoterId) -> Result<(), EligibilityError> {
        if self.contains(voting, voter) {
            Ok(())
        } else {
            Err(EligibilityError::NotInCensus { voting, voter })
        }
    }

    /// Voters of one voting, in ascending order
    pub fn voters(&self, voting: VotingId) -> Vec<VoterId> {
        self.entries
            .read()
            .unwrap()
            .range((voting, VoterId(0))..=(voting, VoterId(u64::MAX)))
            .map(|(_, voter)| *voter)
            .collect()
    }
}
