//! secp256k1 as a commitment group

use super::Group;
use k256::{
    elliptic_curve::{sec1::ToEncodedPoint, Field},
    ProjectivePoint, Scalar,
};
use rand_core::RngCore;

/// The secp256k1 curve group, written additively
///
/// `combine` is point addition and `power` is scalar multiplication, so
/// commitments are hiding under the elliptic-curve discrete log assumption.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Secp256k1;

impl Group for Secp256k1 {
    type Scalar = Scalar;
    type Element = ProjectivePoint;

    fn name(&self) -> &'static str {
        "secp256k1"
    }

    fn generator(&self) -> ProjectivePoint {
        ProjectivePoint::GENERATOR
    }

    fn identity(&self) -> ProjectivePoint {
        ProjectivePoint::IDENTITY
    }

    fn combine(&self, a: &ProjectivePoint, b: &ProjectivePoint) -> ProjectivePoint {
        *a + b
    }

    fn inverse(&self, a: &ProjectivePoint) -> ProjectivePoint {
        -*a
    }

    fn power(&self, base: &ProjectivePoint, exp: &Scalar) -> ProjectivePoint {
        *base * exp
    }

    fn max_evaluation_point(&self) -> u64 {
        u64::MAX
    }

    fn scalar_from_u64(&self, value: u64) -> Scalar {
        Scalar::from(value)
    }

    fn scalar_add(&self, a: &Scalar, b: &Scalar) -> Scalar {
        *a + b
    }

    fn scalar_sub(&self, a: &Scalar, b: &Scalar) -> Scalar {
        *a - b
    }

    fn scalar_mul(&self, a: &Scalar, b: &Scalar) -> Scalar {
        *a * b
    }

    fn scalar_inverse(&self, a: &Scalar) -> Option<Scalar> {
        Option::<Scalar>::from(a.invert())
    }

    fn random_scalar<R: RngCore>(&self, rng: &mut R) -> Scalar {
        loop {
            let scalar = <Scalar as Field>::random(&mut *rng);
            if !bool::from(scalar.is_zero()) {
                return scalar;
            }
        }
    }

    fn encode_scalar(&self, scalar: &Scalar) -> String {
        hex::encode(scalar.to_bytes())
    }

    fn encode_element(&self, element: &ProjectivePoint) -> String {
        hex::encode(element.to_affine().to_encoded_point(true).as_bytes())
    }
}
