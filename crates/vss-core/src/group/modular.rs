//! Groups over machine-word moduli

use super::Group;
use crate::{Error, Result};
use num_bigint::{BigInt, BigUint};
use num_integer::Integer;
use num_prime::nt_funcs::is_prime64;
use num_traits::ToPrimitive;
use rand::Rng;
use rand_core::RngCore;

/// Order of the default Schnorr subgroup; `2q + 1` is also prime
const SCHNORR_Q: u64 = 2_305_843_009_213_688_669;

/// Generator of the order-q subgroup of Z_p^* (a quadratic residue)
const SCHNORR_G: u64 = 4;

fn add_mod(a: u64, b: u64, m: u64) -> u64 {
    narrow((BigUint::from(a) + b) % m)
}

fn sub_mod(a: u64, b: u64, m: u64) -> u64 {
    narrow((BigInt::from(a) - b).mod_floor(&BigInt::from(m)))
}

fn mul_mod(a: u64, b: u64, m: u64) -> u64 {
    narrow((BigUint::from(a) * b) % m)
}

fn pow_mod(base: u64, exp: u64, m: u64) -> u64 {
    narrow(BigUint::from(base).modpow(&BigUint::from(exp), &BigUint::from(m)))
}

/// `None` when `a` shares a factor with `m`, which for prime `m` means `a == 0`
fn inv_mod(a: u64, m: u64) -> Option<u64> {
    BigUint::from(a).modinv(&BigUint::from(m)).map(narrow)
}

/// Residues modulo a u64 always fit back into a u64
fn narrow<T: ToPrimitive>(value: T) -> u64 {
    value.to_u64().unwrap_or_default()
}

/// Draw a coefficient from `[1, q-1]` and flip its sign half the time
fn random_nonzero<R: RngCore>(rng: &mut R, q: u64) -> u64 {
    let magnitude = rng.gen_range(1..q);
    if rng.gen::<bool>() {
        q - magnitude
    } else {
        magnitude
    }
}

/// Z_q under addition with generator G = 1
///
/// `power(x, e) = x * e mod q`. Discrete logs are trivial here, so
/// commitments hide nothing; the group only demonstrates the homomorphism.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdditiveModQ {
    q: u64,
}

impl AdditiveModQ {
    /// Z_q with G = 1; `q` must be prime
    pub fn new(q: u64) -> Result<Self> {
        if !is_prime64(q) {
            return Err(Error::InvalidConfig(format!("Modulus {} is not prime", q)));
        }
        Ok(Self { q })
    }

    /// Group modulus
    pub fn modulus(&self) -> u64 {
        self.q
    }
}

impl Group for AdditiveModQ {
    type Scalar = u64;
    type Element = u64;

    fn name(&self) -> &'static str {
        "additive-mod-q"
    }

    fn generator(&self) -> u64 {
        1
    }

    fn identity(&self) -> u64 {
        0
    }

    fn combine(&self, a: &u64, b: &u64) -> u64 {
        add_mod(*a, *b, self.q)
    }

    fn inverse(&self, a: &u64) -> u64 {
        sub_mod(0, *a, self.q)
    }

    fn power(&self, base: &u64, exp: &u64) -> u64 {
        mul_mod(*base, *exp, self.q)
    }

    fn max_evaluation_point(&self) -> u64 {
        self.q - 1
    }

    fn scalar_from_u64(&self, value: u64) -> u64 {
        value % self.q
    }

    fn scalar_add(&self, a: &u64, b: &u64) -> u64 {
        add_mod(*a, *b, self.q)
    }

    fn scalar_sub(&self, a: &u64, b: &u64) -> u64 {
        sub_mod(*a, *b, self.q)
    }

    fn scalar_mul(&self, a: &u64, b: &u64) -> u64 {
        mul_mod(*a, *b, self.q)
    }

    fn scalar_inverse(&self, a: &u64) -> Option<u64> {
        inv_mod(*a, self.q)
    }

    fn random_scalar<R: RngCore>(&self, rng: &mut R) -> u64 {
        random_nonzero(rng, self.q)
    }

    fn encode_scalar(&self, scalar: &u64) -> String {
        scalar.to_string()
    }

    fn encode_element(&self, element: &u64) -> String {
        element.to_string()
    }
}

/// Prime-order-q subgroup of Z_p^* for a safe prime p = 2q + 1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchnorrGroup {
    p: u64,
    q: u64,
    g: u64,
}

impl SchnorrGroup {
    /// Subgroup of order `q` generated by `g`
    ///
    /// `q` and `2q + 1` must both be prime and `g` must have order exactly `q`.
    pub fn new(q: u64, g: u64) -> Result<Self> {
        if q >= u64::MAX / 2 {
            return Err(Error::InvalidConfig(format!("Order {} is too large", q)));
        }
        let p = 2 * q + 1;
        if !is_prime64(q) || !is_prime64(p) {
            return Err(Error::InvalidConfig(format!(
                "{} is not a Sophie Germain prime",
                q
            )));
        }
        let g = g % p;
        if g <= 1 || pow_mod(g, q, p) != 1 {
            return Err(Error::InvalidConfig(format!(
                "{} does not generate the order-{} subgroup",
                g, q
            )));
        }
        Ok(Self { p, q, g })
    }

    /// Field modulus p
    pub fn modulus(&self) -> u64 {
        self.p
    }

    /// Subgroup order q
    pub fn order(&self) -> u64 {
        self.q
    }
}

impl Default for SchnorrGroup {
    fn default() -> Self {
        Self {
            p: 2 * SCHNORR_Q + 1,
            q: SCHNORR_Q,
            g: SCHNORR_G,
        }
    }
}

impl Group for SchnorrGroup {
    type Scalar = u64;
    type Element = u64;

    fn name(&self) -> &'static str {
        "schnorr"
    }

    fn generator(&self) -> u64 {
        self.g
    }

    fn identity(&self) -> u64 {
        1
    }

    fn combine(&self, a: &u64, b: &u64) -> u64 {
        mul_mod(*a, *b, self.p)
    }

    fn inverse(&self, a: &u64) -> u64 {
        // zero is not a group element; map it to itself
        inv_mod(*a, self.p).unwrap_or(0)
    }

    fn power(&self, base: &u64, exp: &u64) -> u64 {
        pow_mod(*base, *exp, self.p)
    }

    fn max_evaluation_point(&self) -> u64 {
        self.q - 1
    }

    fn scalar_from_u64(&self, value: u64) -> u64 {
        value % self.q
    }

    fn scalar_add(&self, a: &u64, b: &u64) -> u64 {
        add_mod(*a, *b, self.q)
    }

    fn scalar_sub(&self, a: &u64, b: &u64) -> u64 {
        sub_mod(*a, *b, self.q)
    }

    fn scalar_mul(&self, a: &u64, b: &u64) -> u64 {
        mul_mod(*a, *b, self.q)
    }

    fn scalar_inverse(&self, a: &u64) -> Option<u64> {
        inv_mod(*a, self.q)
    }

    fn random_scalar<R: RngCore>(&self, rng: &mut R) -> u64 {
        random_nonzero(rng, self.q)
    }

    fn encode_scalar(&self, scalar: &u64) -> String {
        scalar.to_string()
    }

    fn encode_element(&self, element: &u64) -> String {
        element.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modular_helpers() {
        assert_eq!(add_mod(u64::MAX - 1, u64::MAX - 1, u64::MAX), u64::MAX - 2);
        assert_eq!(sub_mod(3, 5, 17), 15);
        assert_eq!(sub_mod(0, 0, 17), 0);
        assert_eq!(mul_mod(SCHNORR_Q - 1, SCHNORR_Q - 1, SCHNORR_Q), 1);
        assert_eq!(pow_mod(SCHNORR_G, SCHNORR_Q, 2 * SCHNORR_Q + 1), 1);
        assert_eq!(inv_mod(5, 17), Some(7));
        assert_eq!(inv_mod(0, 17), None);
        assert_eq!(inv_mod(34, 17), None);
    }

    #[test]
    fn test_additive_group_arithmetic() {
        // Z_17 with G = 1: power is multiplication, combine is addition
        let group = AdditiveModQ::new(17).unwrap();
        assert_eq!(group.power(&1, &5), 5);
        assert_eq!(group.power(&3, &6), 1);
        assert_eq!(group.combine(&9, &9), 1);
        assert_eq!(group.inverse(&5), 12);
        assert_eq!(group.inverse(&0), 0);
        assert_eq!(group.scalar_from_u64(18), 1);
    }

    #[test]
    fn test_additive_rejects_composite_modulus() {
        assert!(AdditiveModQ::new(15).is_err());
        assert!(AdditiveModQ::new(561).is_err());
        assert!(AdditiveModQ::new(1).is_err());
        assert_eq!(AdditiveModQ::new(2_147_483_647).unwrap().modulus(), 2_147_483_647);
    }

    #[test]
    fn test_schnorr_parameters() {
        let group = SchnorrGroup::new(11, 4).unwrap();
        assert_eq!(group.modulus(), 23);
        assert_eq!(group.power(&4, &11), 1);

        // 7 * 2 + 1 = 15 is not prime
        assert!(SchnorrGroup::new(7, 4).is_err());
        // 5 is a non-residue mod 23, so its order is 22
        assert!(SchnorrGroup::new(11, 5).is_err());
        assert!(SchnorrGroup::new(11, 1).is_err());

        let default = SchnorrGroup::default();
        assert_eq!(SchnorrGroup::new(default.order(), 4).unwrap(), default);
    }

    #[test]
    fn test_random_scalar_is_nonzero() {
        use rand::SeedableRng;
        let mut rng = rand_chacha::ChaCha20Rng::seed_from_u64(1);
        let group = AdditiveModQ::new(3).unwrap();
        for _ in 0..64 {
            let x = group.random_scalar(&mut rng);
            assert!(x == 1 || x == 2);
        }
    }
}
