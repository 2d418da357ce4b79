use crate::*;
use indexmap::IndexMap;
use tallystick::plurality::DefaultPluralityTally;

/// One line of the human-readable result breakdown.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PostprocOption {
    pub number: u32,
    pub option: String,
    pub votes: u64,
}

/// The outcome of tallying a voting.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TallyResult {
    /// Every decrypted vote, sorted
    pub votes: Vec<u32>,

    /// Votes per option number, in option number order. Options nobody chose are present with 0.
    pub counts: IndexMap<u32, u64>,

    /// Options ordered by votes (descending), ties broken by option number.
    pub postproc: Vec<PostprocOption>,

    /// Options with the most votes. More than one on a tie, none if nobody voted.
    pub winners: Vec<u32>,

    /// Receipts of ballots left out of the count because they were corrupt.
    #[serde(default)]
    pub excluded: Vec<String>,
}

impl TallyResult {
    /// Count decrypted votes against a question's options.
    ///
    /// The result only depends on the multiset of `votes`, never on their order.
    pub fn tally(question: &Question, mut votes: Vec<u32>, mut excluded: Vec<String>) -> Self {
        votes.sort_unstable();
        excluded.sort();

        let mut counts: IndexMap<u32, u64> =
            question.numbers().into_iter().map(|n| (n, 0)).collect();

        let mut winners = Vec::new();
        if !votes.is_empty() {
            let mut tally = DefaultPluralityTally::new(1);
            for vote in &votes {
                tally.add_ref(vote);
            }

            for (number, total) in tally.totals() {
                if let Some(count) = counts.get_mut(&number) {
                    *count = total;
                }
            }

            winners = tally.winners().into_unranked();
            winners.sort_unstable();
        }

        let mut postproc: Vec<PostprocOption> = question
            .options
            .iter()
            .map(|o| PostprocOption {
                number: o.number,
                option: o.option.clone(),
                votes: counts.get(&o.number).copied().unwrap_or(0),
            })
            .collect();
        postproc.sort_by(|a, b| b.votes.cmp(&a.votes).then(a.number.cmp(&b.number)));

        TallyResult {
            votes,
            counts,
            postproc,
            winners,
            excluded,
        }
    }

    /// Whether two tallies counted the same thing.
    ///
    /// Receipts of ballots excluded after shuffling differ between runs, so only their number
    /// is compared.
    pub fn same_count(&self, other: &TallyResult) -> bool {
        self.votes == other.votes
            && self.counts == other.counts
            && self.postproc == other.postproc
            && self.winners == other.winners
            && self.excluded.len() == other.excluded.len()
    }

    /// Total number of counted ballots
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }
}
