use crate::*;
use log::debug;
use num::BigUint;
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

#[derive(Serialize, Deserialize)]
struct SetupRequest {
    pk: PublicKey,
    share: KeyShare,
}

#[derive(Serialize, Deserialize)]
struct SetupResponse {
    #[serde(with = "serde_bigint")]
    verification: BigUint,
}

#[derive(Serialize, Deserialize)]
struct ShuffleRequest {
    pk: PublicKey,
    msgs: Vec<Ciphertext>,
}

#[derive(Serialize, Deserialize)]
struct ShuffleResponse {
    msgs: Vec<Ciphertext>,
}

#[derive(Serialize, Deserialize)]
struct DecryptRequest {
    msgs: Vec<Ciphertext>,
}

#[derive(Serialize, Deserialize)]
struct DecryptResponse {
    shares: Vec<DecryptionShare>,
}

/// An authority reached over HTTP.
///
/// Every call is a JSON `POST` to `{url}/mixnet/{setup,shuffle,decrypt}/{voting}/`.
pub struct RemoteAuthority {
    info: AuthorityInfo,
    client: Client,
}

impl RemoteAuthority {
    pub fn new(info: AuthorityInfo, timeout: Duration) -> Result<Self, AuthorityError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthorityError::Unavailable {
                authority: info.name.clone(),
                reason: e.to_string(),
            })?;
        Ok(RemoteAuthority { info, client })
    }

    fn endpoint(&self, route: &str, voting: VotingId) -> String {
        format!(
            "{}/mixnet/{}/{}/",
            self.info.url.trim_end_matches('/'),
            route,
            voting
        )
    }

    fn post<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        route: &str,
        voting: VotingId,
        body: &Req,
    ) -> Result<Resp, AuthorityError> {
        let url = self.endpoint(route, voting);
        debug!("POST {}", url);

        let unavailable = |reason: String| AuthorityError::Unavailable {
            authority: self.info.name.clone(),
            reason,
        };

        let res = self
            .client
            .post(&url)
            .json(body)
            .send()
            .map_err(|e| unavailable(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            return Err(unavailable(format!("{} returned {}", url, status)));
        }

        res.json().map_err(|e| AuthorityError::BadResponse {
            authority: self.info.name.clone(),
            reason: e.to_string(),
        })
    }
}

impl Authority for RemoteAuthority {
    fn info(&self) -> &AuthorityInfo {
        &self.info
    }

    fn receive_share(
        &self,
        voting: VotingId,
        pk: &PublicKey,
        share: &KeyShare,
    ) -> Result<BigUint, AuthorityError> {
        let body = SetupRequest {
            pk: pk.clone(),
            share: share.clone(),
        };
        let resp: SetupResponse = self.post("setup", voting, &body)?;
        Ok(resp.verification)
    }

    fn shuffle(
        &self,
        voting: VotingId,
        pk: &PublicKey,
        ballots: &[Ciphertext],
    ) -> Result<Vec<Ciphertext>, AuthorityError> {
        let body = ShuffleRequest {
            pk: pk.clone(),
            msgs: ballots.to_vec(),
        };
        let resp: ShuffleResponse = self.post("shuffle", voting, &body)?;
        Ok(resp.msgs)
    }

    fn partial_decrypt(
        &self,
        voting: VotingId,
        ballots: &[Ciphertext],
    ) -> Result<Vec<DecryptionShare>, AuthorityError> {
        let body = DecryptRequest {
            msgs: ballots.to_vec(),
        };
        let resp: DecryptResponse = self.post("decrypt", voting, &body)?;
        Ok(resp.shares)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints() {
        let info = AuthorityInfo::new("remote", "http://auth.example:9000/", false);
        let authority = RemoteAuthority::new(info, Duration::from_secs(1)).unwrap();
        assert_eq!(
            authority.endpoint("decrypt", VotingId(12)),
            "http://auth.example:9000/mixnet/decrypt/12/"
        );
    }

    #[test]
    fn unreachable_authority() {
        // Nothing listens on port 1
        let info = AuthorityInfo::new("gone", "http://127.0.0.1:1", false);
        let authority = RemoteAuthority::new(info, Duration::from_millis(500)).unwrap();
        let err = authority.partial_decrypt(VotingId(1), &[]).unwrap_err();
        match err {
            AuthorityError::Unavailable { authority, .. } => assert_eq!(authority, "gone"),
            other => panic!("unexpected error {:?}", other),
        }
    }
}
