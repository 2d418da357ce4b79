use crate::*;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A person who may stand as a candidate.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PersonId(pub u64);

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartyId(pub u64);

impl fmt::Display for PartyId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Province code, e.g. "S" or "H".
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Province(pub String);

impl Province {
    pub fn new(code: &str) -> Self {
        Province(code.to_owned())
    }
}

impl fmt::Display for Province {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Man,
    Woman,
    Other,
}

/// Employment category of a candidate
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Employment {
    Senator,
    Deputy,
    Other,
}

impl fmt::Display for Employment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Employment::Senator => "senator",
            Employment::Deputy => "deputy",
            Employment::Other => "other",
        };
        f.write_str(name)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PoliticalParty {
    pub id: PartyId,
    pub name: String,
    pub acronym: String,
    pub description: String,
    pub headquarters: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CandidateProfile {
    pub person: PersonId,
    pub party: PartyId,
    pub birthdate: NaiveDate,
    pub sex: Sex,
    pub province: Province,
    pub employment: Employment,
}

/// Source of candidate records for the eligibility checks.
pub trait CandidateDirectory: Send + Sync {
    /// Look up the profile of a person
    fn profile(&self, person: PersonId) -> Option<CandidateProfile>;

    /// All candidates that match an optional province and party scope.
    fn eligible(
        &self,
        province: Option<&Province>,
        party: Option<PartyId>,
    ) -> Vec<CandidateProfile>;
}

/// In-memory candidate records keyed by person.
#[derive(Default, Clone)]
pub struct MemCandidates {
    parties: BTreeMap<PartyId, PoliticalParty>,
    profiles: BTreeMap<PersonId, CandidateProfile>,
}

impl MemCandidates {
    pub fn add_party(&mut self, party: PoliticalParty) {
        self.parties.insert(party.id, party);
    }

    pub fn party(&self, id: PartyId) -> Option<&PoliticalParty> {
        self.parties.get(&id)
    }

    pub fn add_profile(&mut self, profile: CandidateProfile) {
        self.profiles.insert(profile.person, profile);
    }
}

impl From<Vec<CandidateProfile>> for MemCandidates {
    fn from(item: Vec<CandidateProfile>) -> Self {
        let mut candidates = MemCandidates::default();
        for profile in item {
            candidates.add_profile(profile);
        }
        candidates
    }
}

impl CandidateDirectory for MemCandidates {
    fn profile(&self, person: PersonId) -> Option<CandidateProfile> {
        self.profiles.get(&person).cloned()
    }

    fn eligible(
        &self,
        province: Option<&Province>,
        party: Option<PartyId>,
    ) -> Vec<CandidateProfile> {
        self.profiles
            .values()
            .filter(|p| province.map_or(true, |province| &p.province == province))
            .filter(|p| party.map_or(true, |party| p.party == party))
            .cloned()
            .collect()
    }
}

/// Every profile must be in the voting's province, if it has one.
pub fn check_province(
    province: Option<&Province>,
    profiles: &[CandidateProfile],
) -> Result<(), EligibilityError> {
    let expected = match province {
        Some(p) => p,
        None => return Ok(()),
    };
    for profile in profiles {
        if &profile.province != expected {
            return Err(EligibilityError::ProvinceMismatch {
                person: profile.person,
                expected: expected.clone(),
                found: profile.province.clone(),
            });
        }
    }
    Ok(())
}

/// Every profile must be in the voting's party, if it has one.
pub fn check_party(
    party: Option<PartyId>,
    profiles: &[CandidateProfile],
) -> Result<(), EligibilityError> {
    let expected = match party {
        Some(p) => p,
        None => return Ok(()),
    };
    for profile in profiles {
        if profile.party != expected {
            return Err(EligibilityError::PartyMismatch {
                person: profile.person,
                expected,
                found: profile.party,
            });
        }
    }
    Ok(())
}

pub fn check_employment(
    required: Employment,
    profiles: &[CandidateProfile],
) -> Result<(), EligibilityError> {
    for profile in profiles {
        if profile.employment != required {
            return Err(EligibilityError::CategoryMismatch {
                person: profile.person,
                expected: required,
                found: profile.employment,
            });
        }
    }
    Ok(())
}

pub fn check_candidate_count(options: usize, available: usize) -> Result<(), EligibilityError> {
    if options > available {
        return Err(EligibilityError::InsufficientCandidates { options, available });
    }
    Ok(())
}

/// No person may appear behind two options.
pub fn check_distinct_candidates(options: &[QuestionOption]) -> Result<(), EligibilityError> {
    let mut seen = BTreeSet::new();
    for person in options.iter().filter_map(|o| o.candidate) {
        if !seen.insert(person) {
            return Err(EligibilityError::DuplicateCandidate(person));
        }
    }
    Ok(())
}

/// Category-specific validation run when a voting is saved.
pub struct EligibilityGate<'a> {
    directory: &'a dyn CandidateDirectory,
}

impl<'a> EligibilityGate<'a> {
    pub fn new(directory: &'a dyn CandidateDirectory) -> Self {
        EligibilityGate { directory }
    }

    /// Run every check for the voting's type, returning the first failure.
    ///
    /// Ordinary votings have no category rules and always pass.
    pub fn validate(&self, voting: &Voting) -> Result<(), EligibilityError> {
        let required = match voting.voting_type.required_employment() {
            Some(employment) => employment,
            None => return Ok(()),
        };

        let options = &voting.question.options;
        let mut profiles = Vec::with_capacity(options.len());
        for person in options.iter().filter_map(|o| o.candidate) {
            let profile = self
                .directory
                .profile(person)
                .ok_or(EligibilityError::UnknownCandidate(person))?;
            profiles.push(profile);
        }

        check_province(voting.province.as_ref(), &profiles)?;
        check_party(voting.political_party, &profiles)?;
        check_employment(required, &profiles)?;

        let available = self
            .directory
            .eligible(voting.province.as_ref(), voting.political_party)
            .iter()
            .filter(|p| p.employment == required)
            .map(|p| p.person)
            .collect::<BTreeSet<_>>()
            .len();
        // Repeated persons are left to the distinct check
        let people = profiles.iter().map(|p| p.person).collect::<BTreeSet<_>>().len();
        let unbacked = options.iter().filter(|o| o.candidate.is_none()).count();
        check_candidate_count(people + unbacked, available)?;
        check_distinct_candidates(options)?;

        Ok(())
    }
}
