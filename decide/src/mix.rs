use crate::*;
use log::debug;
use rand::seq::SliceRandom;
use rand::{CryptoRng, Rng};

/// A uniformly random permutation of `0..size`.
pub fn generate_permutation<R: Rng + CryptoRng>(size: usize, rng: &mut R) -> Vec<usize> {
    let mut permutation: Vec<usize> = (0..size).collect();
    permutation.shuffle(rng);
    permutation
}

/// Reorder and re-encrypt: output `i` is a fresh encryption of input `permutation[i]`.
///
/// Panics if `permutation` is not a permutation of the input indexes.
pub fn shuffle<R: Rng + CryptoRng>(
    pk: &PublicKey,
    ciphers: &[Ciphertext],
    permutation: &[usize],
    rng: &mut R,
) -> Vec<Ciphertext> {
    assert_eq!(ciphers.len(), permutation.len());
    permutation
        .iter()
        .map(|i| ciphers[*i].reencrypt(pk, rng))
        .collect()
}

/// One mixnet pass over a batch of ballots with a fresh permutation.
pub fn shuffle_ballots<R: Rng + CryptoRng>(
    pk: &PublicKey,
    ciphers: &[Ciphertext],
    rng: &mut R,
) -> Vec<Ciphertext> {
    let permutation = generate_permutation(ciphers.len(), rng);
    let shuffled = shuffle(pk, ciphers, &permutation, rng);
    debug!("shuffled {} ballots", shuffled.len());
    shuffled
}
