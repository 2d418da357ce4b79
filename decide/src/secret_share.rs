use crate::*;
use num::traits::{One, Zero};
use num::BigUint;
use rand::{CryptoRng, Rng};
use std::collections::BTreeSet;

/// One authority's partial decryption of a single ciphertext, `a^{x_i} mod p`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DecryptionShare {
    pub index: u32,

    #[serde(with = "serde_bigint")]
    pub value: BigUint,
}

/// Split `secret` into `num_shares` Shamir shares over `Z_q`, any `threshold` of which recover it.
///
/// Returns `(index, f(index))` pairs with indexes starting at 1.
pub fn deal_secret_shares<R: Rng + CryptoRng>(
    group: &Group,
    secret: &BigUint,
    num_shares: usize,
    threshold: usize,
    rng: &mut R,
) -> Result<Vec<(u32, BigUint)>, KeyGenerationError> {
    if num_shares == 0 || threshold == 0 || threshold > num_shares {
        return Err(KeyGenerationError::InvalidThreshold {
            threshold,
            shares: num_shares,
        });
    }

    // f(z) = secret + c_1 z + ... + c_{t-1} z^{t-1}
    let mut coefficients = Vec::with_capacity(threshold);
    coefficients.push(secret % &group.q);
    for _ in 1..threshold {
        coefficients.push(group.random_exponent(rng));
    }

    let shares = (1..=num_shares as u32)
        .map(|index| {
            let z = BigUint::from(index);
            // Horner
            let value = coefficients
                .iter()
                .rev()
                .fold(BigUint::zero(), |acc, c| (acc * &z + c) % &group.q);
            (index, value)
        })
        .collect();

    Ok(shares)
}

/// Lagrange coefficient at zero for `index`, given the full set of participating indexes.
pub fn lagrange_coefficient(q: &BigUint, index: u32, indexes: &[u32]) -> BigUint {
    let mut numerator = BigUint::one();
    let mut denominator = BigUint::one();
    let i = BigUint::from(index);

    for j in indexes.iter().filter(|j| **j != index) {
        let j = BigUint::from(*j);
        numerator = (numerator * &j) % q;
        // j - i mod q
        let diff = ((&j + q) - &i) % q;
        denominator = (denominator * diff) % q;
    }

    let inverse = denominator.modpow(&(q - 2_u32), q);
    (numerator * inverse) % q
}

fn check_indexes(indexes: &[u32], threshold: usize) -> Result<(), DecryptionError> {
    let mut seen = BTreeSet::new();
    for index in indexes {
        if !seen.insert(*index) {
            return Err(DecryptionError::DuplicateShare(*index));
        }
    }
    if indexes.len() < threshold {
        return Err(DecryptionError::InsufficientShares(threshold, indexes.len()));
    }
    Ok(())
}

/// Rebuild the shared secret from at least `threshold` shares.
pub fn recover_secret(
    group: &Group,
    threshold: usize,
    shares: &[(u32, BigUint)],
) -> Result<BigUint, DecryptionError> {
    let indexes: Vec<u32> = shares.iter().map(|(i, _)| *i).collect();
    check_indexes(&indexes, threshold)?;

    let secret = shares.iter().fold(BigUint::zero(), |acc, (index, value)| {
        let lambda = lagrange_coefficient(&group.q, *index, &indexes);
        (acc + value * lambda) % &group.q
    });
    Ok(secret)
}

/// Compute this share's partial decryption of a ciphertext.
pub fn partial_decrypt(share: &KeyShare, pk: &PublicKey, c: &Ciphertext) -> DecryptionShare {
    DecryptionShare {
        index: share.index,
        value: c.a.modpow(&share.secret, &pk.p),
    }
}

/// Merge partial decryptions of one ciphertext into its plaintext option number.
///
/// Interpolates `a^x` in the exponent from any `threshold` distinct shares.
pub fn combine_shares(
    pk: &PublicKey,
    c: &Ciphertext,
    shares: &[DecryptionShare],
    threshold: usize,
) -> Result<u32, DecryptionError> {
    let indexes: Vec<u32> = shares.iter().map(|s| s.index).collect();
    check_indexes(&indexes, threshold)?;

    let group = pk.group();
    let shared = shares.iter().fold(BigUint::one(), |acc, share| {
        let lambda = lagrange_coefficient(&group.q, share.index, &indexes);
        group.mul(&acc, &share.value.modpow(&lambda, &group.p))
    });

    let encoded = group.mul(&c.b, &group.inverse(&shared));
    group.decode(&encoded)
}
