use crate::*;
use log::debug;
use num::BigUint;
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::RwLock;

/// A trusted party holding a share of a voting's decryption key.
///
/// Authorities are dealt their share when a voting starts. At tally time each one shuffles the
/// ballots in turn, then all of them partially decrypt the final shuffle.
pub trait Authority: Send + Sync {
    fn info(&self) -> &AuthorityInfo;

    /// Accept a key share for a voting. Returns the share's verification value as the
    /// authority computed it.
    fn receive_share(
        &self,
        voting: VotingId,
        pk: &PublicKey,
        share: &KeyShare,
    ) -> Result<BigUint, AuthorityError>;

    /// Re-encrypt and permute a batch of ballots.
    fn shuffle(
        &self,
        voting: VotingId,
        pk: &PublicKey,
        ballots: &[Ciphertext],
    ) -> Result<Vec<Ciphertext>, AuthorityError>;

    /// One decryption share per ballot, in the same order.
    fn partial_decrypt(
        &self,
        voting: VotingId,
        ballots: &[Ciphertext],
    ) -> Result<Vec<DecryptionShare>, AuthorityError>;
}

/// An authority running inside this process.
pub struct LocalAuthority {
    info: AuthorityInfo,
    shares: RwLock<HashMap<VotingId, (PublicKey, KeyShare)>>,
}

impl LocalAuthority {
    pub fn new(info: AuthorityInfo) -> Self {
        LocalAuthority {
            info,
            shares: RwLock::new(HashMap::new()),
        }
    }

    fn key_for(&self, voting: VotingId) -> Result<(PublicKey, KeyShare), AuthorityError> {
        self.shares
            .read()
            .unwrap()
            .get(&voting)
            .cloned()
            .ok_or_else(|| AuthorityError::Unavailable {
                authority: self.info.name.clone(),
                reason: format!("no key share for voting {}", voting),
            })
    }
}

impl Authority for LocalAuthority {
    fn info(&self) -> &AuthorityInfo {
        &self.info
    }

    fn receive_share(
        &self,
        voting: VotingId,
        pk: &PublicKey,
        share: &KeyShare,
    ) -> Result<BigUint, AuthorityError> {
        debug!(
            "authority {} received share {} for voting {}",
            self.info.name, share.index, voting
        );
        let verification = pk.group().gen_pow(&share.secret);
        self.shares
            .write()
            .unwrap()
            .insert(voting, (pk.clone(), share.clone()));
        Ok(verification)
    }

    fn shuffle(
        &self,
        voting: VotingId,
        pk: &PublicKey,
        ballots: &[Ciphertext],
    ) -> Result<Vec<Ciphertext>, AuthorityError> {
        debug!(
            "authority {} shuffling {} ballots of voting {}",
            self.info.name,
            ballots.len(),
            voting
        );
        let mut rng = rand::thread_rng();
        Ok(shuffle_ballots(pk, ballots, &mut rng))
    }

    fn partial_decrypt(
        &self,
        voting: VotingId,
        ballots: &[Ciphertext],
    ) -> Result<Vec<DecryptionShare>, AuthorityError> {
        let (pk, share) = self.key_for(voting)?;
        debug!(
            "authority {} decrypting {} ballots of voting {}",
            self.info.name,
            ballots.len(),
            voting
        );
        Ok(ballots
            .par_iter()
            .map(|c| partial_decrypt(&share, &pk, c))
            .collect())
    }
}
