use crate::*;
use num::traits::One;
use num::BigUint;
use rand::{CryptoRng, Rng};

/// An ElGamal public key `y = g^x mod p`.
///
/// This is the `{p, g, y}` object published for each started voting.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    #[serde(with = "serde_bigint")]
    pub p: BigUint,

    #[serde(with = "serde_bigint")]
    pub g: BigUint,

    #[serde(with = "serde_bigint")]
    pub y: BigUint,
}

impl PublicKey {
    /// The group this key lives in.
    pub fn group(&self) -> Group {
        let mut group = Group::from_prime(self.p.clone());
        group.g = self.g.clone();
        group
    }

    /// Check a key from outside against the supported groups before using it.
    pub fn validate(&self) -> Result<(), CryptoError> {
        let bits = self.p.bits() as usize;
        let expected = Group::with_bits(bits).map_err(|_| {
            CryptoError::InvalidPublicKey(format!("unsupported {}-bit modulus", bits))
        })?;
        if expected.p != self.p {
            return Err(CryptoError::InvalidPublicKey(
                "modulus is not a known safe prime".to_owned(),
            ));
        }
        if expected.g != self.g {
            return Err(CryptoError::InvalidPublicKey(format!(
                "generator must be {}",
                expected.g
            )));
        }
        if !expected.is_member(&self.y) {
            return Err(CryptoError::InvalidPublicKey(
                "y is not in the key's subgroup".to_owned(),
            ));
        }
        Ok(())
    }
}

/// A full ElGamal private key.
///
/// Votings never hold one of these: the secret only exists as shares spread over the
/// authorities. It is used by the CLI `keygen` command and by tests.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PrivateKey {
    pub public: PublicKey,

    #[serde(with = "serde_bigint")]
    pub x: BigUint,
}

impl PrivateKey {
    /// Generate a fresh key in the group of the given bit strength.
    pub fn generate<R: Rng + CryptoRng>(
        bits: usize,
        rng: &mut R,
    ) -> Result<Self, KeyGenerationError> {
        let group = Group::with_bits(bits)?;
        let x = group.random_exponent(rng);
        let y = group.gen_pow(&x);

        Ok(PrivateKey {
            public: PublicKey {
                p: group.p,
                g: group.g,
                y,
            },
            x,
        })
    }
}

/// An encrypted option number, `(a, b) = (g^r, M·y^r)`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ciphertext {
    #[serde(with = "serde_bigint")]
    pub a: BigUint,

    #[serde(with = "serde_bigint")]
    pub b: BigUint,
}

impl Ciphertext {
    /// Check that both components are in the quadratic-residue subgroup of the key's group.
    pub fn check(&self, pk: &PublicKey) -> Result<(), CryptoError> {
        let group = pk.group();
        if group.is_member(&self.a) && group.is_member(&self.b) {
            Ok(())
        } else {
            Err(DecryptionError::MalformedCiphertext.into())
        }
    }

    /// Component-wise product. Decrypts to the product of the two encoded plaintexts.
    pub fn combine(&self, other: &Ciphertext, pk: &PublicKey) -> Ciphertext {
        Ciphertext {
            a: (&self.a * &other.a) % &pk.p,
            b: (&self.b * &other.b) % &pk.p,
        }
    }

    /// Multiply by a fresh encryption of one, giving an unlinkable ciphertext of the same plaintext.
    pub fn reencrypt<R: Rng + CryptoRng>(&self, pk: &PublicKey, rng: &mut R) -> Ciphertext {
        let group = pk.group();
        let r = group.random_exponent(rng);
        let one = Ciphertext {
            a: group.gen_pow(&r),
            b: pk.y.modpow(&r, &pk.p),
        };
        self.combine(&one, pk)
    }

    /// Canonical byte encoding, used for receipts.
    pub fn to_bytes(&self) -> Vec<u8> {
        format!("{}:{}", self.a, self.b).into_bytes()
    }
}

/// Encrypt an option number under a public key.
pub fn encrypt<R: Rng + CryptoRng>(
    pk: &PublicKey,
    m: u32,
    rng: &mut R,
) -> Result<Ciphertext, CryptoError> {
    let group = pk.group();
    let encoded = group.encode(m)?;
    let r = group.random_exponent(rng);

    Ok(Ciphertext {
        a: group.gen_pow(&r),
        b: group.mul(&encoded, &pk.y.modpow(&r, &pk.p)),
    })
}

/// Decrypt with the full private key.
pub fn decrypt(sk: &PrivateKey, c: &Ciphertext) -> Result<u32, CryptoError> {
    c.check(&sk.public)?;
    let group = sk.public.group();
    let shared = c.a.modpow(&sk.x, &group.p);
    let encoded = group.mul(&c.b, &group.inverse(&shared));
    Ok(group.decode(&encoded)?)
}

/// An encryption of one with no randomness. Only useful as an identity for `combine`.
pub fn identity_ciphertext() -> Ciphertext {
    Ciphertext {
        a: BigUint::one(),
        b: BigUint::one(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn encrypt_decrypt() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let sk = PrivateKey::generate(256, &mut rng).unwrap();

        for m in &[1, 2, 3, 17, 1000, u32::MAX] {
            let c = encrypt(&sk.public, *m, &mut rng).unwrap();
            c.check(&sk.public).unwrap();
            assert_eq!(decrypt(&sk, &c).unwrap(), *m);
        }

        // Same plaintext, different ciphertexts
        let c1 = encrypt(&sk.public, 4, &mut rng).unwrap();
        let c2 = encrypt(&sk.public, 4, &mut rng).unwrap();
        assert_ne!(c1, c2);

        assert_eq!(
            encrypt(&sk.public, 0, &mut rng),
            Err(CryptoError::PlaintextOutOfRange(0))
        );
    }

    #[test]
    fn homomorphic_combine() {
        let mut rng = ChaCha20Rng::seed_from_u64(2);
        let sk = PrivateKey::generate(256, &mut rng).unwrap();

        let c3 = encrypt(&sk.public, 3, &mut rng).unwrap();
        let c5 = encrypt(&sk.public, 5, &mut rng).unwrap();
        let c7 = encrypt(&sk.public, 7, &mut rng).unwrap();

        assert_eq!(decrypt(&sk, &c3.combine(&c5, &sk.public)).unwrap(), 15);
        assert_eq!(decrypt(&sk, &c5.combine(&c7, &sk.public)).unwrap(), 35);
        assert_eq!(
            decrypt(&sk, &identity_ciphertext().combine(&c7, &sk.public)).unwrap(),
            7
        );
    }

    #[test]
    fn reencryption_keeps_plaintext() {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let sk = PrivateKey::generate(512, &mut rng).unwrap();

        let c = encrypt(&sk.public, 42, &mut rng).unwrap();
        let r = c.reencrypt(&sk.public, &mut rng);
        assert_ne!(c, r);
        assert_eq!(decrypt(&sk, &r).unwrap(), 42);
    }

    #[test]
    fn malformed_ciphertexts() {
        let mut rng = ChaCha20Rng::seed_from_u64(4);
        let sk = PrivateKey::generate(256, &mut rng).unwrap();
        let good = encrypt(&sk.public, 2, &mut rng).unwrap();

        let malformed = CryptoError::Decryption(DecryptionError::MalformedCiphertext);

        let zero = Ciphertext {
            a: BigUint::from(0_u32),
            b: good.b.clone(),
        };
        assert_eq!(zero.check(&sk.public), Err(malformed.clone()));

        let too_big = Ciphertext {
            a: good.a.clone(),
            b: &sk.public.p + 1_u32,
        };
        assert_eq!(decrypt(&sk, &too_big), Err(malformed.clone()));

        // p - 1 is never a quadratic residue for a safe prime
        let non_residue = Ciphertext {
            a: &sk.public.p - 1_u32,
            b: good.b,
        };
        assert_eq!(non_residue.check(&sk.public), Err(malformed));
    }

    #[test]
    fn public_key_json() {
        let pk = PublicKey {
            p: BigUint::from(23_u32),
            g: BigUint::from(4_u32),
            y: BigUint::from(9_u32),
        };
        let json = serde_json::to_value(&pk).unwrap();
        assert_eq!(json, serde_json::json!({"p": "23", "g": "4", "y": "9"}));

        let parsed: PublicKey = serde_json::from_str(r#"{"p": 23, "g": "4", "y": 9}"#).unwrap();
        assert_eq!(parsed, pk);
        assert_eq!(parsed.group().q, BigUint::from(11_u32));
    }

    #[test]
    fn validate_public_keys() {
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let sk = PrivateKey::generate(256, &mut rng).unwrap();
        sk.public.validate().unwrap();

        let tiny = PublicKey {
            p: BigUint::from(0_u32),
            g: BigUint::from(4_u32),
            y: BigUint::from(1_u32),
        };
        assert!(matches!(tiny.validate(), Err(CryptoError::InvalidPublicKey(_))));

        let small = PublicKey {
            p: BigUint::from(3_u32),
            ..tiny
        };
        assert!(matches!(small.validate(), Err(CryptoError::InvalidPublicKey(_))));

        let mut off_by_two = sk.public.clone();
        off_by_two.p -= 2_u32;
        assert!(matches!(off_by_two.validate(), Err(CryptoError::InvalidPublicKey(_))));

        let mut outside = sk.public;
        outside.y = &outside.p - 1_u32;
        assert!(matches!(outside.validate(), Err(CryptoError::InvalidPublicKey(_))));
    }
}
