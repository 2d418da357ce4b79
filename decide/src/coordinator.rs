use crate::*;
use log::{debug, error, info, warn};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

/// Drives the authorities of a voting through key setup and tally.
///
/// Every round-trip to the authorities is bounded by `config.authority_timeout`. Any failure
/// or timeout aborts the whole operation; nothing partial is ever returned.
pub struct Coordinator {
    config: Config,
}

impl Coordinator {
    pub fn new(config: Config) -> Self {
        Coordinator { config }
    }

    /// Generate a key for a voting and deal one share to each authority.
    ///
    /// All authorities are needed to decrypt (`threshold = n`).
    pub fn setup(
        &self,
        voting: VotingId,
        authorities: &[Arc<dyn Authority>],
    ) -> Result<PublicKey, Error> {
        if authorities.is_empty() {
            return Err(AuthorityError::NoAuthorities.into());
        }

        let n = authorities.len();
        let mut rng = rand::thread_rng();
        let (pk, shares) = generate_keypair(self.config.key_bits, n, n, &mut rng)?;
        let shares = Arc::new(shares);

        let job_pk = pk.clone();
        let job_shares = shares.clone();
        let verifications = self.fan_out(authorities, move |i, authority| {
            authority.receive_share(voting, &job_pk, &job_shares[i])
        })?;

        for (i, verification) in verifications.iter().enumerate() {
            if verification != &shares[i].verification {
                let authority = authorities[i].info().name.clone();
                error!("authority {} echoed a wrong share verification", authority);
                return Err(AuthorityError::BadResponse {
                    authority,
                    reason: "share verification mismatch".to_owned(),
                }
                .into());
            }
        }

        info!("voting {} key dealt to {} authorities", voting, n);
        Ok(pk)
    }

    /// Screen, shuffle, decrypt and count the ballots of a stopped voting.
    pub fn tally(
        &self,
        voting: &Voting,
        authorities: &[Arc<dyn Authority>],
        ballots: Vec<EncryptedBallot>,
    ) -> Result<TallyResult, Error> {
        if authorities.is_empty() {
            return Err(AuthorityError::NoAuthorities.into());
        }
        let pk = voting.public_key.clone().ok_or(CryptoError::NoPublicKey)?;
        let mut excluded = Vec::new();

        // Corrupt ballots are left out rather than failing the tally
        let mut ciphers = Vec::with_capacity(ballots.len());
        for ballot in ballots {
            match ballot.vote.check(&pk) {
                Ok(()) => ciphers.push(ballot.vote),
                Err(e) => {
                    let receipt = ballot.receipt();
                    warn!(
                        "voting {}: excluding ballot of voter {} ({}): {}",
                        voting.id, ballot.voter, receipt, e
                    );
                    excluded.push(receipt);
                }
            }
        }

        for authority in authorities {
            ciphers = self.shuffle_with(voting.id, &pk, authority, ciphers)?;
        }

        let threshold = authorities.len();
        let batch = Arc::new(ciphers);
        let job_batch = batch.clone();
        let voting_id = voting.id;
        let partials = self.fan_out(authorities, move |_, authority| {
            authority.partial_decrypt(voting_id, &job_batch)
        })?;

        for (i, shares) in partials.iter().enumerate() {
            if shares.len() != batch.len() {
                let authority = authorities[i].info().name.clone();
                error!(
                    "authority {} returned {} shares for {} ballots",
                    authority,
                    shares.len(),
                    batch.len()
                );
                return Err(AuthorityError::BadResponse {
                    authority,
                    reason: format!("expected {} shares, got {}", batch.len(), shares.len()),
                }
                .into());
            }
        }

        let numbers = voting.question.numbers();
        let mut votes = Vec::with_capacity(batch.len());
        for (j, c) in batch.iter().enumerate() {
            let shares: Vec<DecryptionShare> = partials.iter().map(|p| p[j].clone()).collect();
            match combine_shares(&pk, c, &shares, threshold) {
                Ok(m) if numbers.binary_search(&m).is_ok() => votes.push(m),
                Ok(m) => {
                    let receipt = receipt_for(c);
                    warn!(
                        "voting {}: excluding ballot {} decrypting to unknown option {}",
                        voting.id, receipt, m
                    );
                    excluded.push(receipt);
                }
                Err(DecryptionError::NotAPlaintext) => {
                    let receipt = receipt_for(c);
                    warn!(
                        "voting {}: excluding ballot {} that does not decrypt to an option",
                        voting.id, receipt
                    );
                    excluded.push(receipt);
                }
                Err(e) => {
                    error!("voting {}: cannot merge decryption shares: {}", voting.id, e);
                    return Err(AuthorityError::BadResponse {
                        authority: "all".to_owned(),
                        reason: e.to_string(),
                    }
                    .into());
                }
            }
        }

        let result = TallyResult::tally(&voting.question, votes, excluded);
        info!(
            "voting {} tallied: {} votes counted, {} excluded",
            voting.id,
            result.votes.len(),
            result.excluded.len()
        );
        Ok(result)
    }

    /// One step of the shuffle chain, under the timeout.
    fn shuffle_with(
        &self,
        voting: VotingId,
        pk: &PublicKey,
        authority: &Arc<dyn Authority>,
        ciphers: Vec<Ciphertext>,
    ) -> Result<Vec<Ciphertext>, AuthorityError> {
        let expected = ciphers.len();
        let job_pk = pk.clone();
        let mut shuffled = self.fan_out(std::slice::from_ref(authority), move |_, authority| {
            authority.shuffle(voting, &job_pk, &ciphers)
        })?;
        let shuffled = shuffled.pop().unwrap_or_default();

        if shuffled.len() != expected {
            let name = authority.info().name.clone();
            error!("authority {} changed the ballot count while shuffling", name);
            return Err(AuthorityError::BadResponse {
                authority: name,
                reason: format!("shuffle returned {} of {} ballots", shuffled.len(), expected),
            });
        }
        Ok(shuffled)
    }

    /// Run `job` against every authority on its own thread and wait for all of them.
    ///
    /// Results come back in authority order. The first error, or running past the deadline,
    /// fails the whole call. Threads still running at that point are abandoned.
    fn fan_out<T, F>(
        &self,
        authorities: &[Arc<dyn Authority>],
        job: F,
    ) -> Result<Vec<T>, AuthorityError>
    where
        T: Send + 'static,
        F: Fn(usize, &dyn Authority) -> Result<T, AuthorityError> + Send + Sync + 'static,
    {
        let deadline = Instant::now() + self.config.authority_timeout;
        let job = Arc::new(job);
        let (tx, rx) = mpsc::channel();

        for (i, authority) in authorities.iter().enumerate() {
            let authority = authority.clone();
            let job = job.clone();
            let tx = tx.clone();
            thread::spawn(move || {
                let result = job(i, authority.as_ref());
                // The receiver is gone if we already gave up
                let _ = tx.send((i, result));
            });
        }
        drop(tx);

        let mut results: Vec<Option<T>> = authorities.iter().map(|_| None).collect();
        for _ in 0..authorities.len() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(remaining) {
                Ok((i, Ok(value))) => {
                    debug!("authority {} answered", authorities[i].info().name);
                    results[i] = Some(value);
                }
                Ok((i, Err(e))) => {
                    error!("authority {} failed: {}", authorities[i].info().name, e);
                    return Err(e);
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    error!(
                        "authorities did not answer within {:?}",
                        self.config.authority_timeout
                    );
                    return Err(AuthorityError::Timeout(self.config.authority_timeout));
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }
        }

        // A worker that panicked never sends, leaving a hole
        let mut out = Vec::with_capacity(results.len());
        for (i, result) in results.into_iter().enumerate() {
            match result {
                Some(value) => out.push(value),
                None => {
                    return Err(AuthorityError::Unavailable {
                        authority: authorities[i].info().name.clone(),
                        reason: "worker exited without answering".to_owned(),
                    })
                }
            }
        }
        Ok(out)
    }
}
