use super::*;
use chrono::NaiveDate;
use num::BigUint;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::sync::Arc;

fn new_voting(name: &str, options: usize) -> NewVoting {
    let mut question = Question::new("Which option?");
    for i in 1..=options {
        question.add_option(&format!("Option {}", i), None);
    }
    NewVoting {
        name: name.to_owned(),
        desc: Some("test voting".to_owned()),
        question,
        voting_type: VotingType::Ordinary,
        political_party: None,
        province: None,
    }
}

fn local_authority(service: &VotingService, admin: &Actor, voting: VotingId, name: &str) {
    let url = service.config().base_url.clone();
    service
        .add_authority(admin, voting, AuthorityInfo::new(name, &url, true))
        .unwrap();
}

fn vote(
    service: &VotingService,
    voting: VotingId,
    voter: u64,
    option: u32,
    rng: &mut ChaCha20Rng,
) -> Result<BallotReceipt, Error> {
    let pk = service.get_public_key(voting).unwrap();
    let submission = BallotSubmission {
        voting,
        voter: VoterId(voter),
        vote: encrypt(&pk, option, rng).unwrap(),
    };
    service.submit_ballot(submission)
}

#[test]
fn end_to_end_voting() {
    let mut rng = ChaCha20Rng::seed_from_u64(1000);
    let service = VotingService::new(Config::default());
    let admin = Actor::admin("admin");

    // Create a voting with 5 options and two local authorities
    let voting = service
        .create_voting(&admin, new_voting("Board election", 5))
        .unwrap();
    local_authority(&service, &admin, voting, "authority 1");
    local_authority(&service, &admin, voting, "authority 2");

    // 100 voters in the census
    for voter in 1..=100 {
        assert_eq!(
            service.add_voter(&admin, voting, VoterId(voter)).unwrap(),
            CensusInsert::Inserted
        );
    }

    let started = service.transition(voting, "start", &admin).unwrap();
    assert_eq!(started.message, "Voting started");
    assert_eq!(started.to, VotingState::Started);
    let snapshot = service.get_voting(voting).unwrap();
    assert!(snapshot.start_date.is_some());
    assert!(snapshot.public_key.is_some());

    // Ballots can't be listed mid-voting
    assert!(matches!(
        service.list_ballots(voting),
        Err(Error::Validation(ValidationError::BallotsNotFrozen(_)))
    ));

    // 80 of them vote
    let mut expected = [0_u64; 6];
    for voter in 1..=80 {
        let option = rng.gen_range(1, 6);
        expected[option as usize] += 1;
        let receipt = vote(&service, voting, voter, option, &mut rng).unwrap();
        assert_eq!(receipt.voter, VoterId(voter));
        assert_eq!(receipt.receipt.len(), 64);
    }

    let stopped = service.transition(voting, "stop", &admin).unwrap();
    assert_eq!(stopped.message, "Voting stopped");
    assert_eq!(service.list_ballots(voting).unwrap().len(), 80);

    // Too late to vote now
    assert_eq!(
        vote(&service, voting, 81, 1, &mut rng).unwrap_err().reason(),
        "Voting already stopped"
    );

    let tallied = service.transition(voting, "tally", &admin).unwrap();
    assert_eq!(tallied.message, "Voting tallied");

    let tally = service.get_tally(voting).unwrap();
    assert_eq!(tally.total(), 80);
    assert_eq!(tally.votes.len(), 80);
    assert!(tally.excluded.is_empty());
    for option in 1..=5_u32 {
        assert_eq!(tally.counts[&option], expected[option as usize]);
    }

    // Postproc is sorted by votes and lists every option
    let snapshot = service.get_voting(voting).unwrap();
    let postproc = snapshot.postproc.unwrap();
    assert_eq!(postproc.len(), 5);
    assert!(postproc.windows(2).all(|w| w[0].votes >= w[1].votes));
    assert_eq!(postproc, tally.postproc);

    // A recount gives the same answer and changes nothing
    let recount = service.recount(voting, &admin).unwrap();
    assert!(recount.same_count(&tally));
    assert_eq!(
        service.get_voting(voting).unwrap().state,
        VotingState::Tallied
    );
}

#[test]
fn authority_shared_between_votings() {
    let mut rng = ChaCha20Rng::seed_from_u64(1001);
    let service = VotingService::new(Config::default());
    let admin = Actor::admin("admin");
    let info = AuthorityInfo::new("shared authority", &service.config().base_url, true);

    let first = service.create_voting(&admin, new_voting("First", 2)).unwrap();
    let first_id = service.add_authority(&admin, first, info.clone()).unwrap();
    service.add_voter(&admin, first, VoterId(1)).unwrap();
    service.transition(first, "start", &admin).unwrap();
    vote(&service, first, 1, 2, &mut rng).unwrap();

    // Registering the same authority on a second voting must keep the first voting's share
    let second = service.create_voting(&admin, new_voting("Second", 3)).unwrap();
    let second_id = service.add_authority(&admin, second, info).unwrap();
    assert_eq!(first_id, second_id);
    service.add_voter(&admin, second, VoterId(1)).unwrap();
    service.transition(second, "start", &admin).unwrap();
    vote(&service, second, 1, 3, &mut rng).unwrap();

    for voting in &[first, second] {
        service.transition(*voting, "stop", &admin).unwrap();
        service.transition(*voting, "tally", &admin).unwrap();
    }
    assert_eq!(service.get_tally(first).unwrap().votes, vec![2]);
    assert_eq!(service.get_tally(second).unwrap().votes, vec![3]);
}

#[test]
fn lifecycle_messages() {
    let service = VotingService::new(Config::default());
    let admin = Actor::admin("admin");
    let voting = service.create_voting(&admin, new_voting("v", 2)).unwrap();
    local_authority(&service, &admin, voting, "local");

    let reason = |action: &str| {
        service
            .transition(voting, action, &admin)
            .unwrap_err()
            .reason()
    };

    assert_eq!(reason("stop"), "Voting is not started");
    assert_eq!(reason("tally"), "Voting is not started");
    assert!(reason("open").starts_with("Action not found"));

    service.transition(voting, "start", &admin).unwrap();
    assert_eq!(reason("start"), "Voting already started");
    assert_eq!(reason("tally"), "Voting is not stopped");

    service.transition(voting, "stop", &admin).unwrap();
    assert_eq!(reason("stop"), "Voting already stopped");
    assert_eq!(reason("start"), "Voting already started");

    service.transition(voting, "tally", &admin).unwrap();
    assert_eq!(reason("tally"), "Voting already tallied");
    assert_eq!(reason("stop"), "Voting already stopped");
    assert_eq!(reason("start"), "Voting already started");

    // An empty voting tallies to zeros
    let tally = service.get_tally(voting).unwrap();
    assert_eq!(tally.total(), 0);
    assert_eq!(tally.counts.len(), 2);
}

#[test]
fn submission_rejections() {
    let mut rng = ChaCha20Rng::seed_from_u64(1001);
    let service = VotingService::new(Config::default());
    let admin = Actor::admin("admin");
    let voting = service.create_voting(&admin, new_voting("v", 3)).unwrap();
    local_authority(&service, &admin, voting, "local");
    service.add_voter(&admin, voting, VoterId(1)).unwrap();
    assert_eq!(
        service.add_voter(&admin, voting, VoterId(1)).unwrap(),
        CensusInsert::AlreadyPresent
    );

    // Not started yet
    let early = BallotSubmission {
        voting,
        voter: VoterId(1),
        vote: Ciphertext {
            a: BigUint::from(4_u32),
            b: BigUint::from(4_u32),
        },
    };
    assert_eq!(
        service.submit_ballot(early).unwrap_err().reason(),
        "Voting is not started"
    );

    service.transition(voting, "start", &admin).unwrap();

    // Not in the census
    let err = vote(&service, voting, 2, 1, &mut rng).unwrap_err();
    assert!(matches!(
        err,
        Error::Eligibility(EligibilityError::NotInCensus { .. })
    ));
    assert!(err.is_rejection());

    // Malformed ciphertext
    let pk = service.get_public_key(voting).unwrap();
    let bad = BallotSubmission {
        voting,
        voter: VoterId(1),
        vote: Ciphertext {
            a: BigUint::from(0_u32),
            b: &pk.p - 1_u32,
        },
    };
    assert!(matches!(
        service.submit_ballot(bad),
        Err(Error::Crypto(CryptoError::Decryption(
            DecryptionError::MalformedCiphertext
        )))
    ));

    // First real ballot wins, the second is rejected
    vote(&service, voting, 1, 2, &mut rng).unwrap();
    let err = vote(&service, voting, 1, 3, &mut rng).unwrap_err();
    assert_eq!(err.reason(), format!("Voter 1 already voted in voting {}", voting));
}

#[test]
fn concurrent_duplicate_submissions() {
    let mut rng = ChaCha20Rng::seed_from_u64(1002);
    let service = Arc::new(VotingService::new(Config::default()));
    let admin = Actor::admin("admin");
    let voting = service.create_voting(&admin, new_voting("v", 3)).unwrap();
    local_authority(&service, &admin, voting, "local");
    service.add_voter(&admin, voting, VoterId(7)).unwrap();
    service.transition(voting, "start", &admin).unwrap();

    let pk = service.get_public_key(voting).unwrap();
    let submissions: Vec<BallotSubmission> = (0..20)
        .map(|i| BallotSubmission {
            voting,
            voter: VoterId(7),
            vote: encrypt(&pk, (i % 3) + 1, &mut rng).unwrap(),
        })
        .collect();

    let handles: Vec<_> = submissions
        .into_iter()
        .map(|submission| {
            let service = service.clone();
            std::thread::spawn(move || service.submit_ballot(submission))
        })
        .collect();

    let results: Vec<Result<BallotReceipt, Error>> =
        handles.into_iter().map(|h| h.join().unwrap()).collect();

    let accepted = results.iter().filter(|r| r.is_ok()).count();
    let already_voted = results
        .iter()
        .filter(|r| {
            matches!(
                r,
                Err(Error::Eligibility(EligibilityError::AlreadyVoted { .. }))
            )
        })
        .count();
    assert_eq!(accepted, 1);
    assert_eq!(already_voted, 19);

    service.transition(voting, "stop", &admin).unwrap();
    assert_eq!(service.list_ballots(voting).unwrap().len(), 1);
}

/// Hands out one tampered ballot, as if storage had been corrupted.
struct CorruptingStore {
    inner: MemStore,
    victim: VoterId,
}

impl BallotStore for CorruptingStore {
    fn insert(&self, ballot: EncryptedBallot) -> Result<(), DuplicateBallot> {
        self.inner.insert(ballot)
    }

    fn get(&self, voting: VotingId, voter: VoterId) -> Option<EncryptedBallot> {
        self.inner.get(voting, voter)
    }

    fn list(&self, voting: VotingId) -> Vec<EncryptedBallot> {
        let mut ballots = self.inner.list(voting);
        for ballot in ballots.iter_mut().filter(|b| b.voter == self.victim) {
            ballot.vote.a = BigUint::from(0_u32);
        }
        ballots
    }
}

#[test]
fn corrupt_stored_ballot_is_excluded() {
    let mut rng = ChaCha20Rng::seed_from_u64(1003);
    let store = Arc::new(CorruptingStore {
        inner: MemStore::new(),
        victim: VoterId(2),
    });
    let service = VotingService::with_parts(
        Config::default(),
        store,
        Arc::new(MemCandidates::default()),
    );
    let admin = Actor::admin("admin");
    let voting = service.create_voting(&admin, new_voting("v", 2)).unwrap();
    local_authority(&service, &admin, voting, "local");
    for voter in 1..=3 {
        service.add_voter(&admin, voting, VoterId(voter)).unwrap();
    }
    service.transition(voting, "start", &admin).unwrap();

    vote(&service, voting, 1, 1, &mut rng).unwrap();
    vote(&service, voting, 2, 1, &mut rng).unwrap();
    vote(&service, voting, 3, 2, &mut rng).unwrap();

    service.transition(voting, "stop", &admin).unwrap();
    service.transition(voting, "tally", &admin).unwrap();

    let tally = service.get_tally(voting).unwrap();
    assert_eq!(tally.votes, vec![1, 2]);
    assert_eq!(tally.excluded.len(), 1);

    let corrupted = service
        .list_ballots(voting)
        .unwrap()
        .into_iter()
        .find(|b| b.voter == VoterId(2))
        .unwrap();
    assert_eq!(tally.excluded[0], corrupted.receipt());
}

/// Holds its key share but refuses to decrypt.
struct Unreachable(LocalAuthority);

impl Authority for Unreachable {
    fn info(&self) -> &AuthorityInfo {
        self.0.info()
    }

    fn receive_share(
        &self,
        voting: VotingId,
        pk: &PublicKey,
        share: &KeyShare,
    ) -> Result<BigUint, AuthorityError> {
        self.0.receive_share(voting, pk, share)
    }

    fn shuffle(
        &self,
        voting: VotingId,
        pk: &PublicKey,
        ballots: &[Ciphertext],
    ) -> Result<Vec<Ciphertext>, AuthorityError> {
        self.0.shuffle(voting, pk, ballots)
    }

    fn partial_decrypt(
        &self,
        _voting: VotingId,
        _ballots: &[Ciphertext],
    ) -> Result<Vec<DecryptionShare>, AuthorityError> {
        Err(AuthorityError::Unavailable {
            authority: self.0.info().name.clone(),
            reason: "connection refused".to_owned(),
        })
    }
}

#[test]
fn unavailable_authority_aborts_tally() {
    let mut rng = ChaCha20Rng::seed_from_u64(1004);
    let service = VotingService::new(Config::default());
    let admin = Actor::admin("admin");
    let voting = service.create_voting(&admin, new_voting("v", 2)).unwrap();
    local_authority(&service, &admin, voting, "healthy");
    let broken = LocalAuthority::new(AuthorityInfo::new("broken", "http://localhost:8000", true));
    service
        .attach_authority(&admin, voting, Arc::new(Unreachable(broken)))
        .unwrap();

    service.add_voter(&admin, voting, VoterId(1)).unwrap();
    service.transition(voting, "start", &admin).unwrap();
    vote(&service, voting, 1, 2, &mut rng).unwrap();
    service.transition(voting, "stop", &admin).unwrap();

    let err = service.transition(voting, "tally", &admin).unwrap_err();
    assert!(matches!(
        err,
        Error::Authority(AuthorityError::Unavailable { .. })
    ));
    assert!(!err.is_rejection());

    // Nothing was committed and the tally can be retried later
    let snapshot = service.get_voting(voting).unwrap();
    assert_eq!(snapshot.state, VotingState::Stopped);
    assert!(snapshot.tally.is_none());
    assert!(snapshot.postproc.is_none());
    assert!(matches!(
        service.get_tally(voting),
        Err(Error::Validation(ValidationError::TallyNotAvailable(_)))
    ));
}

fn senator(person: u64, province: &str) -> CandidateProfile {
    CandidateProfile {
        person: PersonId(person),
        party: PartyId(1),
        birthdate: NaiveDate::from_ymd_opt(1965, 5, 17).unwrap(),
        sex: Sex::Man,
        province: Province::new(province),
        employment: Employment::Senator,
    }
}

#[test]
fn senate_province_eligibility() {
    let candidates = MemCandidates::from(vec![senator(1, "S"), senator(2, "H"), senator(3, "S")]);
    let service = VotingService::with_parts(
        Config::default(),
        Arc::new(MemStore::new()),
        Arc::new(candidates),
    );
    let admin = Actor::admin("admin");

    let senate = |people: &[u64]| {
        let mut question = Question::new("Senator for S");
        for person in people {
            question.add_option(&format!("Candidate {}", person), Some(PersonId(*person)));
        }
        NewVoting {
            name: "Senate".to_owned(),
            desc: None,
            question,
            voting_type: VotingType::Senate,
            political_party: Some(PartyId(1)),
            province: Some(Province::new("S")),
        }
    };

    // A candidate from province H can't stand in S
    let err = service.create_voting(&admin, senate(&[1, 2])).unwrap_err();
    assert_eq!(
        err.reason(),
        "Candidate 2 belongs to province H, voting is scoped to S"
    );
    assert!(matches!(
        err,
        Error::Eligibility(EligibilityError::ProvinceMismatch { .. })
    ));

    let voting = service.create_voting(&admin, senate(&[1, 3])).unwrap();
    service.clean(voting).unwrap();
}

#[test]
fn wire_format_submission() {
    let mut rng = ChaCha20Rng::seed_from_u64(1005);
    let service = VotingService::new(Config::default());
    let admin = Actor::admin("admin");
    let voting = service.create_voting(&admin, new_voting("v", 2)).unwrap();
    local_authority(&service, &admin, voting, "local");
    service.add_voter(&admin, voting, VoterId(5)).unwrap();
    service.transition(voting, "start", &admin).unwrap();

    // The public key goes out as JSON, the ballot comes back as JSON
    let pk_json = serde_json::to_string(&service.get_public_key(voting).unwrap()).unwrap();
    let pk: PublicKey = serde_json::from_str(&pk_json).unwrap();
    let c = encrypt(&pk, 2, &mut rng).unwrap();

    let json = format!(
        r#"{{"voting": {}, "voter": 5, "vote": {{"a": "{}", "b": "{}"}}}}"#,
        voting, c.a, c.b
    );
    let submission = BallotSubmission::from_json(&json).unwrap();
    let receipt = service.submit_ballot(submission).unwrap();
    assert_eq!(receipt.receipt, receipt_for(&c));

    service.transition(voting, "stop", &admin).unwrap();
    service.transition(voting, "tally", &admin).unwrap();
    assert_eq!(service.get_tally(voting).unwrap().winners, vec![2]);
}
