use crate::*;
use chrono::Utc;
use log::{error, info, warn};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// The voting core.
///
/// Owns every voting together with its census, ballots and authorities. Each voting sits
/// behind its own lock: ballot submissions share it, lifecycle transitions take it exclusively
/// and only publish their changes once every side effect has succeeded.
pub struct VotingService {
    config: Config,
    coordinator: Coordinator,
    next_id: AtomicU64,
    votings: RwLock<BTreeMap<VotingId, Arc<RwLock<Voting>>>>,
    census: Census,
    store: Arc<dyn BallotStore>,
    candidates: Arc<dyn CandidateDirectory>,
    backends: RwLock<HashMap<Uuid, Arc<dyn Authority>>>,
}

impl VotingService {
    /// A service backed by in-memory ballots and an empty candidate directory.
    pub fn new(config: Config) -> Self {
        Self::with_parts(
            config,
            Arc::new(MemStore::new()),
            Arc::new(MemCandidates::default()),
        )
    }

    pub fn with_parts(
        config: Config,
        store: Arc<dyn BallotStore>,
        candidates: Arc<dyn CandidateDirectory>,
    ) -> Self {
        VotingService {
            coordinator: Coordinator::new(config.clone()),
            config,
            next_id: AtomicU64::new(1),
            votings: RwLock::new(BTreeMap::new()),
            census: Census::new(),
            store,
            candidates,
            backends: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn cell(&self, id: VotingId) -> Result<Arc<RwLock<Voting>>, Error> {
        self.votings
            .read()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| ValidationError::UnknownVoting(id).into())
    }

    /// A snapshot of a voting
    pub fn get_voting(&self, id: VotingId) -> Result<Voting, Error> {
        let cell = self.cell(id)?;
        let voting = cell.read().unwrap().clone();
        Ok(voting)
    }

    /// Create a voting in the CREATED state.
    ///
    /// The question and any category-specific candidate rules are checked before anything is stored.
    pub fn create_voting(&self, actor: &Actor, new: NewVoting) -> Result<VotingId, Error> {
        actor.require_admin("create_voting")?;
        new.validate()?;

        let id = VotingId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let voting = Voting::new(id, new);
        EligibilityGate::new(self.candidates.as_ref()).validate(&voting)?;

        info!("voting {} created: {}", id, voting.name);
        self.votings
            .write()
            .unwrap()
            .insert(id, Arc::new(RwLock::new(voting)));
        Ok(id)
    }

    /// Re-run the eligibility checks against a stored voting.
    pub fn clean(&self, id: VotingId) -> Result<(), Error> {
        let voting = self.get_voting(id)?;
        EligibilityGate::new(self.candidates.as_ref()).validate(&voting)?;
        Ok(())
    }

    /// Register an authority on a voting, choosing an in-process or HTTP backend from its URL.
    pub fn add_authority(
        &self,
        actor: &Actor,
        voting: VotingId,
        mut info: AuthorityInfo,
    ) -> Result<Uuid, Error> {
        info.me = info.me || self.config.is_local(&info.url);
        let existing = self.backends.read().unwrap().get(&info.id).cloned();
        let backend: Arc<dyn Authority> = if let Some(backend) = existing {
            backend
        } else if info.me {
            Arc::new(LocalAuthority::new(info))
        } else {
            Arc::new(RemoteAuthority::new(info, self.config.authority_timeout)?)
        };
        self.attach_authority(actor, voting, backend)
    }

    /// Register an authority with a caller-supplied backend.
    ///
    /// Only allowed while the voting is CREATED. An authority already known to the service keeps
    /// its first backend, along with the key shares it holds for other votings.
    pub fn attach_authority(
        &self,
        actor: &Actor,
        voting: VotingId,
        backend: Arc<dyn Authority>,
    ) -> Result<Uuid, Error> {
        actor.require_admin("add_authority")?;
        let cell = self.cell(voting)?;
        let mut voting = cell.write().unwrap();
        if voting.state != VotingState::Created {
            return Err(ValidationError::AuthoritiesFrozen.into());
        }

        let info = backend.info().clone();
        let id = info.id;
        if voting.get_authority(id).is_none() {
            voting.authorities.push(info);
        }
        self.backends
            .write()
            .unwrap()
            .entry(id)
            .or_insert(backend);
        Ok(id)
    }

    /// Add a voter to a voting's census.
    pub fn add_voter(
        &self,
        actor: &Actor,
        voting: VotingId,
        voter: VoterId,
    ) -> Result<CensusInsert, Error> {
        actor.require_admin("add_voter")?;
        self.cell(voting)?;
        Ok(self.census.add(voting, voter))
    }

    /// Accept a ballot from a voter in the census of a started voting, once.
    pub fn submit_ballot(&self, submission: BallotSubmission) -> Result<BallotReceipt, Error> {
        let cell = self.cell(submission.voting)?;

        // Held until the ballot is stored so a concurrent stop waits for us
        let voting = cell.read().unwrap();
        match voting.state {
            VotingState::Started => (),
            VotingState::Created => return Err(StateError::NotStarted.into()),
            VotingState::Stopped | VotingState::Tallied => {
                return Err(StateError::AlreadyStopped.into())
            }
        }

        self.census.check(submission.voting, submission.voter)?;

        let pk = voting.public_key.as_ref().ok_or(CryptoError::NoPublicKey)?;
        submission.vote.check(pk)?;

        let ballot = EncryptedBallot::from(submission);
        let receipt = BallotReceipt::from(&ballot);
        if let Err(duplicate) = self.store.insert(ballot) {
            warn!("rejected ballot: {}", duplicate);
            return Err(duplicate.into());
        }
        Ok(receipt)
    }

    /// Apply a lifecycle action ("start", "stop" or "tally") to a voting.
    ///
    /// The voting is changed only if the action and all its side effects succeed.
    pub fn transition(
        &self,
        id: VotingId,
        action: &str,
        actor: &Actor,
    ) -> Result<Transition, Error> {
        actor.require_admin(action)?;
        let action: Action = action.parse()?;
        let cell = self.cell(id)?;

        let mut current = cell.write().unwrap();
        let from = current.state;
        let to = action.target(from)?;

        let mut next = current.clone();
        match action {
            Action::Start => {
                if next.question.options.is_empty() {
                    return Err(ValidationError::NoOptions.into());
                }
                let backends = self.backends_for(&next)?;
                next.public_key = Some(self.coordinator.setup(id, &backends)?);
                next.start_date = Some(Utc::now());
            }
            Action::Stop => {
                next.end_date = Some(Utc::now());
            }
            Action::Tally => {
                let backends = self.backends_for(&next)?;
                let ballots = self.store.list(id);
                let result = self.coordinator.tally(&next, &backends, ballots)?;
                next.postproc = Some(result.postproc.clone());
                next.tally = Some(result);
            }
        }
        next.state = to;
        *current = next;

        info!("voting {}: {} -> {}", id, from, to);
        Ok(Transition {
            voting: id,
            action,
            from,
            to,
            message: action.success_message().to_owned(),
        })
    }

    /// Recompute the tally of a tallied voting and check it against the stored one.
    pub fn recount(&self, id: VotingId, actor: &Actor) -> Result<TallyResult, Error> {
        actor.require_admin("recount")?;
        let voting = self.get_voting(id)?;
        let stored = match (&voting.state, &voting.tally) {
            (VotingState::Tallied, Some(tally)) => tally.clone(),
            _ => return Err(ValidationError::TallyNotAvailable(id).into()),
        };

        let backends = self.backends_for(&voting)?;
        let recount = self
            .coordinator
            .tally(&voting, &backends, self.store.list(id))?;

        if !recount.same_count(&stored) {
            error!("voting {}: recount does not match the stored tally", id);
            return Err(ValidationError::RecountMismatch(id).into());
        }
        info!("voting {}: recount matches", id);
        Ok(recount)
    }

    pub fn get_public_key(&self, id: VotingId) -> Result<PublicKey, Error> {
        let voting = self.get_voting(id)?;
        voting
            .public_key
            .ok_or_else(|| CryptoError::NoPublicKey.into())
    }

    pub fn get_tally(&self, id: VotingId) -> Result<TallyResult, Error> {
        let voting = self.get_voting(id)?;
        voting
            .tally
            .ok_or_else(|| ValidationError::TallyNotAvailable(id).into())
    }

    /// Every ballot of a voting. Only available once the voting has stopped.
    pub fn list_ballots(&self, id: VotingId) -> Result<Vec<EncryptedBallot>, Error> {
        let voting = self.get_voting(id)?;
        match voting.state {
            VotingState::Stopped | VotingState::Tallied => Ok(self.store.list(id)),
            _ => Err(ValidationError::BallotsNotFrozen(id).into()),
        }
    }

    fn backends_for(&self, voting: &Voting) -> Result<Vec<Arc<dyn Authority>>, Error> {
        if voting.authorities.is_empty() {
            return Err(AuthorityError::NoAuthorities.into());
        }
        let backends = self.backends.read().unwrap();
        voting
            .authorities
            .iter()
            .map(|info| {
                backends.get(&info.id).cloned().ok_or_else(|| {
                    Error::from(AuthorityError::Unavailable {
                        authority: info.name.clone(),
                        reason: "not registered with this service".to_owned(),
                    })
                })
            })
            .collect()
    }
}
