use crate::*;
use std::collections::BTreeSet;

/// The single question asked by a voting.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub desc: String,
    pub options: Vec<QuestionOption>,
}

/// One answer to a question. `number` is what voters encrypt.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct QuestionOption {
    pub number: u32,
    pub option: String,

    /// The person standing behind this option, for candidate votings.
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate: Option<PersonId>,
}

/// An option as submitted by an administrator, possibly without a number.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct OptionDraft {
    #[serde(default)]
    pub number: Option<u32>,
    pub option: String,

    #[serde(default)]
    pub candidate: Option<PersonId>,
}

impl Question {
    pub fn new(desc: &str) -> Self {
        Question {
            desc: desc.to_owned(),
            options: vec![],
        }
    }

    /// Build a question from drafts, filling in missing option numbers.
    ///
    /// Unnumbered options take the lowest free numbers in insertion order, so a question
    /// with no explicit numbers is numbered `1..=n`.
    pub fn from_drafts(desc: &str, drafts: Vec<OptionDraft>) -> Result<Self, ValidationError> {
        let mut taken = BTreeSet::new();
        for number in drafts.iter().filter_map(|d| d.number) {
            if number == 0 {
                return Err(ValidationError::ZeroOption);
            }
            if !taken.insert(number) {
                return Err(ValidationError::DuplicateOption(number));
            }
        }

        let mut next = 1;
        let mut options = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let number = match draft.number {
                Some(n) => n,
                None => {
                    while taken.contains(&next) {
                        next += 1;
                    }
                    taken.insert(next);
                    next
                }
            };
            options.push(QuestionOption {
                number,
                option: draft.option,
                candidate: draft.candidate,
            });
        }

        Ok(Question {
            desc: desc.to_owned(),
            options,
        })
    }

    /// Append an option with the next number after the current highest. Returns that number.
    pub fn add_option(&mut self, option: &str, candidate: Option<PersonId>) -> u32 {
        let number = self.options.iter().map(|o| o.number).max().unwrap_or(0) + 1;
        self.options.push(QuestionOption {
            number,
            option: option.to_owned(),
            candidate,
        });
        number
    }

    /// Option numbers must be non-zero and unique.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut seen = BTreeSet::new();
        for option in &self.options {
            if option.number == 0 {
                return Err(ValidationError::ZeroOption);
            }
            if !seen.insert(option.number) {
                return Err(ValidationError::DuplicateOption(option.number));
            }
        }
        Ok(())
    }

    pub fn option(&self, number: u32) -> Option<&QuestionOption> {
        self.options.iter().find(|o| o.number == number)
    }

    /// Option numbers in ascending order
    pub fn numbers(&self) -> Vec<u32> {
        let mut numbers: Vec<u32> = self.options.iter().map(|o| o.number).collect();
        numbers.sort_unstable();
        numbers
    }
}
