use crate::*;
use num::bigint::RandBigInt;
use num::traits::{Num, One, ToPrimitive, Zero};
use num::BigUint;
use rand::{CryptoRng, Rng};

/// A safe-prime group `p = 2q + 1`, working in the order-`q` subgroup of quadratic residues.
///
/// The generator is always 4, which is a quadratic residue (and so generates the whole
/// subgroup) for every safe prime above 5.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub p: BigUint,
    pub q: BigUint,
    pub g: BigUint,
}

impl Group {
    /// Bit strengths that [`Group::with_bits`] accepts.
    pub fn supported_bits() -> &'static [usize] {
        &[256, 512, 1536, 2048, 3072, 4096]
    }

    /// Look up the fixed group for a bit strength.
    ///
    /// 256 and 512 bits use the largest safe prime below `2^bits`; the larger sizes use
    /// the MODP groups of RFC 3526.
    pub fn with_bits(bits: usize) -> Result<Self, KeyGenerationError> {
        let p = match bits {
            256 => (BigUint::one() << 256_usize) - BigUint::from(36113_u32),
            512 => (BigUint::one() << 512_usize) - BigUint::from(38117_u32),
            1536 => parse_hex(PRIME_HEX_1536),
            2048 => parse_hex(PRIME_HEX_2048),
            3072 => parse_hex(PRIME_HEX_3072),
            4096 => parse_hex(PRIME_HEX_4096),
            _ => return Err(KeyGenerationError::UnsupportedBits(bits)),
        };
        Ok(Group::from_prime(p))
    }

    /// Rebuild the group from a published modulus.
    pub fn from_prime(p: BigUint) -> Self {
        let q = (&p - BigUint::one()) >> 1_usize;
        Group {
            p,
            q,
            g: BigUint::from(4_u32),
        }
    }

    pub fn bits(&self) -> usize {
        self.p.bits() as usize
    }

    /// True iff `x` lies in the quadratic-residue subgroup.
    pub fn is_member(&self, x: &BigUint) -> bool {
        !x.is_zero() && x < &self.p && x.modpow(&self.q, &self.p).is_one()
    }

    /// `g^e mod p`
    pub fn gen_pow(&self, e: &BigUint) -> BigUint {
        self.g.modpow(e, &self.p)
    }

    pub fn mul(&self, a: &BigUint, b: &BigUint) -> BigUint {
        (a * b) % &self.p
    }

    /// Multiplicative inverse mod `p` (Fermat, since `p` is prime).
    pub fn inverse(&self, x: &BigUint) -> BigUint {
        x.modpow(&(&self.p - 2_u32), &self.p)
    }

    /// A uniformly random exponent in `[1, q)`.
    pub fn random_exponent<R: Rng + CryptoRng>(&self, rng: &mut R) -> BigUint {
        rng.gen_biguint_range(&BigUint::one(), &self.q)
    }

    /// Map an option number into the subgroup.
    ///
    /// Exactly one of `m` and `p - m` is a residue because `p ≡ 3 (mod 4)`.
    pub fn encode(&self, m: u32) -> Result<BigUint, CryptoError> {
        let value = BigUint::from(m);
        if m == 0 || value > self.q {
            return Err(CryptoError::PlaintextOutOfRange(m));
        }
        if self.is_member(&value) {
            Ok(value)
        } else {
            Ok(&self.p - value)
        }
    }

    /// Inverse of [`Group::encode`].
    pub fn decode(&self, encoded: &BigUint) -> Result<u32, DecryptionError> {
        if !self.is_member(encoded) {
            return Err(DecryptionError::NotAPlaintext);
        }
        let value = if encoded <= &self.q {
            encoded.clone()
        } else {
            &self.p - encoded
        };
        value
            .to_u32()
            .filter(|m| *m != 0)
            .ok_or(DecryptionError::NotAPlaintext)
    }
}

/// Parse a hex string (which might contain spaces, tabs, or newlines).
/// Only used for the hard-coded constants below, which are known to parse.
fn parse_hex(hex: &str) -> BigUint {
    let digits: String = hex.chars().filter(|c| !c.is_whitespace()).collect();
    BigUint::from_str_radix(&digits, 16).unwrap_or_else(|_| BigUint::zero())
}

// # The groups defined in [IETF RFC 3526](https://tools.ietf.org/html/rfc3526)

/// The prime modulus for the 1536-bit group
const PRIME_HEX_1536: &str = "FFFFFFFF FFFFFFFF C90FDAA2 2168C234 C4C6628B 80DC1CD1
     29024E08 8A67CC74 020BBEA6 3B139B22 514A0879 8E3404DD
     EF9519B3 CD3A431B 302B0A6D F25F1437 4FE1356D 6D51C245
     E485B576 625E7EC6 F44C42E9 A637ED6B 0BFF5CB6 F406B7ED
     EE386BFB 5A899FA5 AE9F2411 7C4B1FE6 49286651 ECE45B3D
     C2007CB8 A163BF05 98DA4836 1C55D39A 69163FA8 FD24CF5F
     83655D23 DCA3AD96 1C62F356 208552BB 9ED52907 7096966D
     670C354E 4ABC9804 F1746C08 CA237327 FFFFFFFF FFFFFFFF";

/// The prime modulus for the 2048-bit group
const PRIME_HEX_2048: &str = "FFFFFFFF FFFFFFFF C90FDAA2 2168C234 C4C6628B 80DC1CD1
     29024E08 8A67CC74 020BBEA6 3B139B22 514A0879 8E3404DD
     EF9519B3 CD3A431B 302B0A6D F25F1437 4FE1356D 6D51C245
     E485B576 625E7EC6 F44C42E9 A637ED6B 0BFF5CB6 F406B7ED
     EE386BFB 5A899FA5 AE9F2411 7C4B1FE6 49286651 ECE45B3D
     C2007CB8 A163BF05 98DA4836 1C55D39A 69163FA8 FD24CF5F
     83655D23 DCA3AD96 1C62F356 208552BB 9ED52907 7096966D
     670C354E 4ABC9804 F1746C08 CA18217C 32905E46 2E36CE3B
     E39E772C 180E8603 9B2783A2 EC07A28F B5C55DF0 6F4C52C9
     DE2BCBF6 95581718 3995497C EA956AE5 15D22618 98FA0510
     15728E5A 8AACAA68 FFFFFFFF FFFFFFFF";

/// The prime modulus for the 3072-bit group
const PRIME_HEX_3072: &str = "FFFFFFFF FFFFFFFF C90FDAA2 2168C234 C4C6628B 80DC1CD1
     29024E08 8A67CC74 020BBEA6 3B139B22 514A0879 8E3404DD
     EF9519B3 CD3A431B 302B0A6D F25F1437 4FE1356D 6D51C245
     E485B576 625E7EC6 F44C42E9 A637ED6B 0BFF5CB6 F406B7ED
     EE386BFB 5A899FA5 AE9F2411 7C4B1FE6 49286651 ECE45B3D
     C2007CB8 A163BF05 98DA4836 1C55D39A 69163FA8 FD24CF5F
     83655D23 DCA3AD96 1C62F356 208552BB 9ED52907 7096966D
     670C354E 4ABC9804 F1746C08 CA18217C 32905E46 2E36CE3B
     E39E772C 180E8603 9B2783A2 EC07A28F B5C55DF0 6F4C52C9
     DE2BCBF6 95581718 3995497C EA956AE5 15D22618 98FA0510
     15728E5A 8AAAC42D AD33170D 04507A33 A85521AB DF1CBA64
     ECFB8504 58DBEF0A 8AEA7157 5D060C7D B3970F85 A6E1E4C7
     ABF5AE8C DB0933D7 1E8C94E0 4A25619D CEE3D226 1AD2EE6B
     F12FFA06 D98A0864 D8760273 3EC86A64 521F2B18 177B200C
     BBE11757 7A615D6C 770988C0 BAD946E2 08E24FA0 74E5AB31
     43DB5BFC E0FD108E 4B82D120 A93AD2CA FFFFFFFF FFFFFFFF";

/// The prime modulus for the 4096-bit group
const PRIME_HEX_4096: &str = "FFFFFFFF FFFFFFFF C90FDAA2 2168C234 C4C6628B 80DC1CD1
     29024E08 8A67CC74 020BBEA6 3B139B22 514A0879 8E3404DD
     EF9519B3 CD3A431B 302B0A6D F25F1437 4FE1356D 6D51C245
     E485B576 625E7EC6 F44C42E9 A637ED6B 0BFF5CB6 F406B7ED
     EE386BFB 5A899FA5 AE9F2411 7C4B1FE6 49286651 ECE45B3D
     C2007CB8 A163BF05 98DA4836 1C55D39A 69163FA8 FD24CF5F
     83655D23 DCA3AD96 1C62F356 208552BB 9ED52907 7096966D
     670C354E 4ABC9804 F1746C08 CA18217C 32905E46 2E36CE3B
     E39E772C 180E8603 9B2783A2 EC07A28F B5C55DF0 6F4C52C9
     DE2BCBF6 95581718 3995497C EA956AE5 15D22618 98FA0510
     15728E5A 8AAAC42D AD33170D 04507A33 A85521AB DF1CBA64
     ECFB8504 58DBEF0A 8AEA7157 5D060C7D B3970F85 A6E1E4C7
     ABF5AE8C DB0933D7 1E8C94E0 4A25619D CEE3D226 1AD2EE6B
     F12FFA06 D98A0864 D8760273 3EC86A64 521F2B18 177B200C
     BBE11757 7A615D6C 770988C0 BAD946E2 08E24FA0 74E5AB31
     43DB5BFC E0FD108E 4B82D120 A9210801 1A723C12 A787E6D7
     88719A10 BDBA5B26 99C32718 6AF4E23C 1A946834 B6150BDA
     2583E9CA 2AD44CE8 DBBBC2DB 04DE8EF9 2E8EFC14 1FBECAA6
     287C5947 4E6BC05D 99B2964F A090C3A2 233BA186 515BE7ED
     1F612970 CEE2D7AF B81BDD76 2170481C D0069127 D5B05AA9
     93B4EA98 8D8FDDC1 86FFB7DC 90A6C08F 4DF435C9 34063199
     FFFFFFFF FFFFFFFF";
