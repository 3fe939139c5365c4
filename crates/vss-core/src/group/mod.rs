//! Commutative group abstraction used for Feldman commitments
//!
//! Dealers blind polynomial coefficients as `power(G, a_k)` and verifiers
//! check a share `s` at index `i` with
//!
//! ```text
//! power(G, s) == combine_k power(C_k, i^k)
//! ```
//!
//! which holds because `power` is a homomorphism from the exponent field
//! (scalars modulo the group order) into the group. Scalar arithmetic lives
//! on the group as well so that shares, evaluation and interpolation all
//! happen in the same prime field.

mod modular;
mod secp256k1;

pub use modular::{AdditiveModQ, SchnorrGroup};
pub use secp256k1::Secp256k1;

use rand_core::RngCore;
use std::fmt::Debug;
use zeroize::Zeroize;

/// A finite commutative group of prime order together with its exponent field
pub trait Group: Clone + Debug + Send + Sync + 'static {
    /// Exponent type: an element of the prime field of the group order
    type Scalar: Copy + Eq + Debug + Send + Sync + Zeroize + 'static;

    /// Group element type
    type Element: Clone + Eq + Debug + Send + Sync + 'static;

    /// Short human-readable name for logs and reports
    fn name(&self) -> &'static str;

    /// Commitment base G
    fn generator(&self) -> Self::Element;

    /// Neutral element of `combine`
    fn identity(&self) -> Self::Element;

    /// The group operation
    fn combine(&self, a: &Self::Element, b: &Self::Element) -> Self::Element;

    /// Inverse with respect to `combine`
    fn inverse(&self, a: &Self::Element) -> Self::Element;

    /// `base` combined with itself `exp` times; exponent zero yields the identity
    fn power(&self, base: &Self::Element, exp: &Self::Scalar) -> Self::Element;

    /// Largest `x` such that `1..=x` are distinct nonzero scalars
    fn max_evaluation_point(&self) -> u64;

    /// Embed an integer into the exponent field, reducing it modulo the order
    fn scalar_from_u64(&self, value: u64) -> Self::Scalar;

    /// (a + b) mod order
    fn scalar_add(&self, a: &Self::Scalar, b: &Self::Scalar) -> Self::Scalar;

    /// (a - b) mod order
    fn scalar_sub(&self, a: &Self::Scalar, b: &Self::Scalar) -> Self::Scalar;

    /// (a * b) mod order
    fn scalar_mul(&self, a: &Self::Scalar, b: &Self::Scalar) -> Self::Scalar;

    /// Multiplicative inverse, `None` for zero
    fn scalar_inverse(&self, a: &Self::Scalar) -> Option<Self::Scalar>;

    /// Uniformly random nonzero scalar
    fn random_scalar<R: RngCore>(&self, rng: &mut R) -> Self::Scalar;

    /// Hex/decimal rendering of a scalar
    fn encode_scalar(&self, scalar: &Self::Scalar) -> String;

    /// Hex/decimal rendering of an element
    fn encode_element(&self, element: &Self::Element) -> String;

    /// Additive identity of the exponent field
    fn scalar_zero(&self) -> Self::Scalar {
        self.scalar_from_u64(0)
    }

    /// Multiplicative identity of the exponent field
    fn scalar_one(&self) -> Self::Scalar {
        self.scalar_from_u64(1)
    }

    /// -a mod order
    fn scalar_neg(&self, a: &Self::Scalar) -> Self::Scalar {
        self.scalar_sub(&self.scalar_zero(), a)
    }

    /// Embed an integer only if it is already below the group order
    fn checked_scalar_from_u64(&self, value: u64) -> Option<Self::Scalar> {
        (value <= self.max_evaluation_point()).then(|| self.scalar_from_u64(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn repeated_combine<G: Group>(group: &G, base: &G::Element, times: u64) -> G::Element {
        let mut acc = group.identity();
        for _ in 0..times {
            acc = group.combine(&acc, base);
        }
        acc
    }

    fn check_group_laws<G: Group>(group: &G) {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let g = group.generator();
        let a = group.power(&g, &group.random_scalar(&mut rng));
        let b = group.power(&g, &group.random_scalar(&mut rng));
        let c = group.power(&g, &group.random_scalar(&mut rng));

        assert_eq!(group.combine(&a, &b), group.combine(&b, &a));
        assert_eq!(
            group.combine(&group.combine(&a, &b), &c),
            group.combine(&a, &group.combine(&b, &c))
        );
        assert_eq!(group.combine(&a, &group.identity()), a);
        assert_eq!(group.combine(&a, &group.inverse(&a)), group.identity());

        assert_eq!(group.power(&a, &group.scalar_zero()), group.identity());
        for times in [1u64, 2, 5, 13] {
            assert_eq!(
                group.power(&a, &group.scalar_from_u64(times)),
                repeated_combine(group, &a, times)
            );
        }
    }

    fn check_homomorphism<G: Group>(group: &G) {
        let mut rng = ChaCha20Rng::seed_from_u64(11);
        let g = group.generator();
        let x = group.random_scalar(&mut rng);
        let y = group.random_scalar(&mut rng);

        assert_eq!(
            group.power(&g, &group.scalar_add(&x, &y)),
            group.combine(&group.power(&g, &x), &group.power(&g, &y))
        );
        assert_eq!(
            group.power(&group.power(&g, &x), &y),
            group.power(&g, &group.scalar_mul(&x, &y))
        );
    }

    fn check_field<G: Group>(group: &G) {
        let mut rng = ChaCha20Rng::seed_from_u64(13);
        for _ in 0..16 {
            let x = group.random_scalar(&mut rng);
            assert_ne!(x, group.scalar_zero());
            let inv = group.scalar_inverse(&x).unwrap();
            assert_eq!(group.scalar_mul(&x, &inv), group.scalar_one());
            assert_eq!(group.scalar_add(&x, &group.scalar_neg(&x)), group.scalar_zero());
        }
        assert!(group.scalar_inverse(&group.scalar_zero()).is_none());

        let max = group.max_evaluation_point();
        assert_eq!(
            group.checked_scalar_from_u64(max),
            Some(group.scalar_from_u64(max))
        );
    }

    #[test]
    fn test_additive_mod_q() {
        let group = AdditiveModQ::new(17).unwrap();
        check_group_laws(&group);
        check_homomorphism(&group);
        check_field(&group);
    }

    #[test]
    fn test_schnorr_group() {
        let group = SchnorrGroup::default();
        check_group_laws(&group);
        check_homomorphism(&group);
        check_field(&group);
    }

    #[test]
    fn test_checked_scalar_rejects_values_past_the_order() {
        let group = AdditiveModQ::new(17).unwrap();
        assert_eq!(group.checked_scalar_from_u64(16), Some(16));
        assert_eq!(group.checked_scalar_from_u64(17), None);
        assert_eq!(group.checked_scalar_from_u64(18), None);

        let schnorr = SchnorrGroup::default();
        assert!(schnorr.checked_scalar_from_u64(schnorr.order()).is_none());
        assert!(Secp256k1.checked_scalar_from_u64(u64::MAX).is_some());
    }

    #[test]
    fn test_secp256k1() {
        let group = Secp256k1;
        check_group_laws(&group);
        check_homomorphism(&group);
        check_field(&group);
    }
}
