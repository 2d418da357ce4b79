use crate::*;
use chrono::{DateTime, Utc};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::fmt;
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VotingId(pub u64);

impl fmt::Display for VotingId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VoterId(pub u64);

impl fmt::Display for VoterId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Voting category. Senate categories carry extra eligibility rules.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VotingType {
    #[serde(rename = "O")]
    Ordinary,

    #[serde(rename = "S")]
    Senate,

    #[serde(rename = "SP")]
    SenateProvince,
}

impl VotingType {
    pub fn code(&self) -> &'static str {
        match self {
            VotingType::Ordinary => "O",
            VotingType::Senate => "S",
            VotingType::SenateProvince => "SP",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "O" => Some(VotingType::Ordinary),
            "S" => Some(VotingType::Senate),
            "SP" => Some(VotingType::SenateProvince),
            _ => None,
        }
    }

    /// The employment every candidate must have, or `None` when the type has no candidate rules.
    pub fn required_employment(&self) -> Option<Employment> {
        match self {
            VotingType::Ordinary => None,
            VotingType::Senate | VotingType::SenateProvince => Some(Employment::Senator),
        }
    }
}

impl Default for VotingType {
    fn default() -> Self {
        VotingType::Ordinary
    }
}

impl fmt::Display for VotingType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Lifecycle state. The discriminants only ever increase over a voting's life.
#[derive(
    Serialize, Deserialize, TryFromPrimitive, IntoPrimitive, Copy, Debug, Clone, PartialEq, Eq,
)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum VotingState {
    Created = 1,
    Started = 2,
    Stopped = 3,
    Tallied = 4,
}

impl fmt::Display for VotingState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            VotingState::Created => "created",
            VotingState::Started => "started",
            VotingState::Stopped => "stopped",
            VotingState::Tallied => "tallied",
        };
        write!(f, "{}", name)
    }
}

/// A trusted decryption party registered on a voting.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AuthorityInfo {
    pub id: Uuid,
    pub name: String,
    pub url: String,

    /// Served by this deployment rather than over the network
    pub me: bool,
}

impl AuthorityInfo {
    pub fn new(name: &str, url: &str, me: bool) -> Self {
        AuthorityInfo {
            id: Uuid::new_v4(),
            name: name.to_owned(),
            url: url.to_owned(),
            me,
        }
    }
}

/// What an administrator supplies to create a voting.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NewVoting {
    pub name: String,

    #[serde(default)]
    pub desc: Option<String>,

    pub question: Question,

    #[serde(default)]
    pub voting_type: VotingType,

    #[serde(default)]
    pub political_party: Option<PartyId>,

    #[serde(default)]
    pub province: Option<Province>,
}

impl NewVoting {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        self.question.validate()
    }
}

/// One election event.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Voting {
    pub id: VotingId,
    pub name: String,
    pub desc: Option<String>,
    pub question: Question,
    pub voting_type: VotingType,
    pub political_party: Option<PartyId>,
    pub province: Option<Province>,
    pub state: VotingState,

    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,

    /// Published when the voting starts
    pub public_key: Option<PublicKey>,

    /// Fixed once the voting starts
    pub authorities: Vec<AuthorityInfo>,

    pub tally: Option<TallyResult>,
    pub postproc: Option<Vec<PostprocOption>>,
}

impl Voting {
    pub fn new(id: VotingId, new: NewVoting) -> Self {
        Voting {
            id,
            name: new.name,
            desc: new.desc,
            question: new.question,
            voting_type: new.voting_type,
            political_party: new.political_party,
            province: new.province,
            state: VotingState::Created,
            start_date: None,
            end_date: None,
            public_key: None,
            authorities: vec![],
            tally: None,
            postproc: None,
        }
    }

    /// Get an authority with the given ID
    pub fn get_authority(&self, id: Uuid) -> Option<&AuthorityInfo> {
        self.authorities.iter().find(|a| a.id == id)
    }
}
