//! Secret polynomials, Feldman commitments and Lagrange reconstruction
//!
//! All arithmetic happens in the exponent field of the chosen [`Group`], so
//! evaluation cannot overflow and interpolation divides with modular
//! inverses instead of integer division.

use crate::group::Group;
use crate::{AgentId, Error, Result};
use rand_core::RngCore;
use std::fmt;
use zeroize::Zeroize;

/// Public commitment vector `[power(G, a_0), power(G, a_1), ...]`
pub type Commitments<G> = Vec<<G as Group>::Element>;

/// A dealer's private polynomial `P(x) = a_0 + a_1 x + ... + a_{m-1} x^{m-1}`
///
/// The secret is `P(0) = a_0`. Coefficients are wiped on drop.
pub struct Polynomial<G: Group> {
    coefficients: Vec<G::Scalar>,
}

impl<G: Group> Polynomial<G> {
    /// Polynomial with `count` random nonzero coefficients
    pub fn random<R: RngCore>(group: &G, count: usize, rng: &mut R) -> Self {
        let coefficients = (0..count).map(|_| group.random_scalar(rng)).collect();
        Self { coefficients }
    }

    /// Random polynomial whose constant term is `secret`
    pub fn with_secret<R: RngCore>(
        group: &G,
        secret: G::Scalar,
        count: usize,
        rng: &mut R,
    ) -> Self {
        let mut polynomial = Self::random(group, count, rng);
        if let Some(constant) = polynomial.coefficients.first_mut() {
            *constant = secret;
        }
        polynomial
    }

    /// Polynomial from explicit coefficients, constant term first
    pub fn from_coefficients(coefficients: Vec<G::Scalar>) -> Result<Self> {
        if coefficients.is_empty() {
            return Err(Error::InvalidConfig(
                "Polynomial needs at least one coefficient".into(),
            ));
        }
        Ok(Self { coefficients })
    }

    /// The shared secret P(0)
    pub fn secret(&self) -> G::Scalar {
        self.coefficients[0]
    }

    /// Number of coefficients
    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    /// Whether the polynomial has no coefficients
    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }

    /// Evaluate P(x) with Horner's rule
    pub fn evaluate(&self, group: &G, x: u64) -> G::Scalar {
        let x = group.scalar_from_u64(x);
        self.coefficients
            .iter()
            .rev()
            .fold(group.scalar_zero(), |acc, coeff| {
                group.scalar_add(&group.scalar_mul(&acc, &x), coeff)
            })
    }

    /// Blind every coefficient: `C_k = power(G, a_k)`
    pub fn commit(&self, group: &G) -> Commitments<G> {
        let g = group.generator();
        self.coefficients
            .iter()
            .map(|coeff| group.power(&g, coeff))
            .collect()
    }
}

impl<G: Group> Drop for Polynomial<G> {
    fn drop(&mut self) {
        self.coefficients.zeroize();
    }
}

impl<G: Group> fmt::Debug for Polynomial<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Polynomial")
            .field("coefficients", &format_args!("<{} redacted>", self.len()))
            .finish()
    }
}

/// Commitment-side value of a share at `x`: `combine_k power(C_k, x^k)`
pub fn commitment_accumulator<G: Group>(
    group: &G,
    commitments: &[G::Element],
    x: u64,
) -> G::Element {
    let x = group.scalar_from_u64(x);
    let mut x_power = group.scalar_one();
    let mut accumulator = group.identity();

    for commitment in commitments {
        accumulator = group.combine(&accumulator, &group.power(commitment, &x_power));
        x_power = group.scalar_mul(&x_power, &x);
    }

    accumulator
}

/// Feldman check: `power(G, share) == commitment_accumulator(x)`
pub fn verify_share<G: Group>(
    group: &G,
    commitments: &[G::Element],
    x: u64,
    share: &G::Scalar,
) -> bool {
    let target = group.power(&group.generator(), share);
    target == commitment_accumulator(group, commitments, x)
}

/// Lagrange interpolation of the given points at x = 0
///
/// `P(0) = sum_j y_j * prod_{i != j} x_i / (x_i - x_j)`
pub fn interpolate_at_zero<G: Group>(
    group: &G,
    points: &[(u64, G::Scalar)],
) -> Result<G::Scalar> {
    let xs: Vec<G::Scalar> = points
        .iter()
        .map(|(x, _)| group.scalar_from_u64(*x))
        .collect();

    for (j, x_j) in xs.iter().enumerate() {
        if *x_j == group.scalar_zero() {
            return Err(Error::Crypto(format!(
                "Interpolation point x={} is zero in the field",
                points[j].0
            )));
        }
        if xs[..j].contains(x_j) {
            return Err(Error::DuplicatePoint(points[j].0));
        }
    }

    let mut secret = group.scalar_zero();
    for (j, (_, y_j)) in points.iter().enumerate() {
        let mut numerator = group.scalar_one();
        let mut denominator = group.scalar_one();

        for (i, x_i) in xs.iter().enumerate() {
            if i == j {
                continue;
            }
            numerator = group.scalar_mul(&numerator, x_i);
            denominator = group.scalar_mul(&denominator, &group.scalar_sub(x_i, &xs[j]));
        }

        let weight = group.scalar_mul(
            &numerator,
            &group
                .scalar_inverse(&denominator)
                .ok_or_else(|| Error::Crypto("Lagrange denominator is zero".into()))?,
        );
        secret = group.scalar_add(&secret, &group.scalar_mul(y_j, &weight));
    }

    Ok(secret)
}

/// Recover `subject`'s secret from at least `threshold` shares
///
/// Exactly the first `threshold` points are used.
pub fn reconstruct_secret<G: Group>(
    group: &G,
    subject: AgentId,
    points: &[(u64, G::Scalar)],
    threshold: usize,
) -> Result<G::Scalar> {
    if points.len() < threshold {
        return Err(Error::InsufficientShares {
            subject,
            required: threshold,
            actual: points.len(),
        });
    }
    interpolate_at_zero(group, &points[..threshold])
}
