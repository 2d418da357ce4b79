use crate::*;

use thiserror::Error;

/// Top-level error type
///
/// Every fallible operation on the voting core returns this. The five concern-specific
/// errors below convert into it with `?`.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Eligibility(#[from] EligibilityError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Authority(#[from] AuthorityError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),
}

impl Error {
    /// The reason string handed back to the caller when an operation is rejected.
    pub fn reason(&self) -> String {
        self.to_string()
    }

    /// Rejections that are part of normal operation (duplicate votes, repeated transitions)
    /// as opposed to faults in the system.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Error::State(_)
                | Error::Eligibility(_)
                | Error::Validation(_)
                | Error::PermissionDenied(_)
        )
    }
}

/// Illegal lifecycle transitions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("Voting already started")]
    AlreadyStarted,

    #[error("Voting already stopped")]
    AlreadyStopped,

    #[error("Voting already tallied")]
    AlreadyTallied,

    #[error("Voting is not started")]
    NotStarted,

    #[error("Voting is not stopped")]
    NotStopped,

    #[error("Action not found, try with start, stop or tally (got {0:?})")]
    InvalidAction(String),
}

/// Census and category-specific eligibility failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EligibilityError {
    #[error("Voter {voter} is not in the census of voting {voting}")]
    NotInCensus { voting: VotingId, voter: VoterId },

    #[error("Voter {voter} already voted in voting {voting}")]
    AlreadyVoted { voting: VotingId, voter: VoterId },

    #[error("Candidate {person} belongs to province {found}, voting is scoped to {expected}")]
    ProvinceMismatch {
        person: PersonId,
        expected: Province,
        found: Province,
    },

    #[error("Candidate {person} belongs to party {found}, voting is scoped to party {expected}")]
    PartyMismatch {
        person: PersonId,
        expected: PartyId,
        found: PartyId,
    },

    #[error("Candidate {person} has employment {found}, voting requires {expected}")]
    CategoryMismatch {
        person: PersonId,
        expected: Employment,
        found: Employment,
    },

    #[error("Voting lists {options} candidates but only {available} are eligible")]
    InsufficientCandidates { options: usize, available: usize },

    #[error("Candidate {0} appears in more than one option")]
    DuplicateCandidate(PersonId),

    #[error("No candidate profile for person {0}")]
    UnknownCandidate(PersonId),
}

/// Key generation, encryption and decryption failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    #[error("Key generation failed: {0}")]
    KeyGeneration(KeyGenerationError),

    #[error("Decryption failed: {0}")]
    Decryption(DecryptionError),

    #[error("Plaintext {0} is outside the encodable range")]
    PlaintextOutOfRange(u32),

    #[error("Voting has no public key yet")]
    NoPublicKey,

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyGenerationError {
    #[error("unsupported key size of {0} bits")]
    UnsupportedBits(usize),

    #[error("threshold {threshold} is invalid for {shares} shares")]
    InvalidThreshold { threshold: usize, shares: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecryptionError {
    #[error("malformed ciphertext")]
    MalformedCiphertext,

    #[error("not enough key shares: need {0}, found {1}")]
    InsufficientShares(usize, usize),

    #[error("duplicate key share for index {0}")]
    DuplicateShare(u32),

    #[error("decrypted value does not decode to a plaintext")]
    NotAPlaintext,
}

impl From<KeyGenerationError> for CryptoError {
    fn from(err: KeyGenerationError) -> Self {
        CryptoError::KeyGeneration(err)
    }
}

impl From<DecryptionError> for CryptoError {
    fn from(err: DecryptionError) -> Self {
        CryptoError::Decryption(err)
    }
}

impl From<KeyGenerationError> for Error {
    fn from(err: KeyGenerationError) -> Self {
        Error::Crypto(err.into())
    }
}

impl From<DecryptionError> for Error {
    fn from(err: DecryptionError) -> Self {
        Error::Crypto(err.into())
    }
}

/// Failures while talking to the trusted authorities
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthorityError {
    #[error("Authority {authority} unavailable: {reason}")]
    Unavailable { authority: String, reason: String },

    #[error("Authorities did not answer within {0:?}")]
    Timeout(std::time::Duration),

    #[error("Authority {authority} sent a bad response: {reason}")]
    BadResponse { authority: String, reason: String },

    #[error("Voting has no authorities configured")]
    NoAuthorities,
}

/// Malformed voting or question configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Voting name cannot be empty")]
    EmptyName,

    #[error("Question needs at least one option")]
    NoOptions,

    #[error("Option number {0} is used more than once")]
    DuplicateOption(u32),

    #[error("Option number 0 is reserved")]
    ZeroOption,

    #[error("Authorities cannot change once the voting has started")]
    AuthoritiesFrozen,

    #[error("Voting {0} not found")]
    UnknownVoting(VotingId),

    #[error("Voting {0} has no tally yet")]
    TallyNotAvailable(VotingId),

    #[error("Recount of voting {0} does not match the stored tally")]
    RecountMismatch(VotingId),

    #[error("Ballots of voting {0} cannot be listed before it stops")]
    BallotsNotFrozen(VotingId),
}

/// Errors reading configuration from the environment
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got {value:?}")]
    BadValue {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
