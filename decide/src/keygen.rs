use crate::*;
use num::BigUint;
use rand::{CryptoRng, Rng};

/// An authority's share of a voting's decryption key.
///
/// `verification` is `g^{secret}`; authorities echo it back when they accept a share so the
/// coordinator knows the share arrived intact.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct KeyShare {
    pub index: u32,

    #[serde(with = "serde_bigint")]
    pub secret: BigUint,

    #[serde(with = "serde_bigint")]
    pub verification: BigUint,
}

impl KeyShare {
    /// Recompute `g^{secret}` and compare with the published verification value.
    pub fn verify(&self, pk: &PublicKey) -> bool {
        pk.group().gen_pow(&self.secret) == self.verification
    }
}

/// Generate a key for a voting and deal it out as Shamir shares.
///
/// The full secret never leaves this function. With one share and a threshold of one the
/// single share is the whole key.
pub fn generate_keypair<R: Rng + CryptoRng>(
    bits: usize,
    num_shares: usize,
    threshold: usize,
    rng: &mut R,
) -> Result<(PublicKey, Vec<KeyShare>), KeyGenerationError> {
    let group = Group::with_bits(bits)?;
    let x = group.random_exponent(rng);
    let y = group.gen_pow(&x);

    let shares = deal_secret_shares(&group, &x, num_shares, threshold, rng)?
        .into_iter()
        .map(|(index, secret)| KeyShare {
            index,
            verification: group.gen_pow(&secret),
            secret,
        })
        .collect();

    let public_key = PublicKey {
        p: group.p,
        g: group.g,
        y,
    };

    Ok((public_key, shares))
}
