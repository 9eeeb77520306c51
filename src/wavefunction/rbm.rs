//! Gaussian-binary restricted Boltzmann machine.
//!
//! Continuous visible units carry the particle coordinates, binary hidden
//! units couple to them through the weight matrix:
//!
//!   F(x) = exp(-Σᵢ (xᵢ - aᵢ)² / 2σ²) · Πⱼ (1 + exp(Qⱼ)),
//!   Qⱼ   = bⱼ + Σᵢ xᵢ Wᵢⱼ / σ²
//!
//! Parameters are flattened as visible biases, hidden biases, then the
//! weights in row-major order.

use std::io::Write;

use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use rand_distr::{Normal, StandardNormal};

use super::traits::{ConditionalSampling, QuantumState};
use crate::error::{Result, VmcError};

#[inline]
fn sigmoid(q: f64) -> f64 {
    1.0 / (1.0 + (-q).exp())
}

/// ln(1 + e^q) without overflow for large q.
#[inline]
fn softplus(q: f64) -> f64 {
    if q > 0.0 {
        q + (-q).exp().ln_1p()
    } else {
        q.exp().ln_1p()
    }
}

fn join<'a>(values: impl Iterator<Item = &'a f64>) -> String {
    values.map(|v| v.to_string()).collect::<Vec<_>>().join(" ")
}

#[derive(Clone, Debug)]
pub struct GaussianBinaryRbm {
    n_particles: usize,
    n_dimensions: usize,
    sigma2: f64,
    a: DVector<f64>,
    b: DVector<f64>,
    w: DMatrix<f64>,
    x: DVector<f64>,
    h: DVector<f64>,
    /// Hidden-unit field Q at the current configuration
    q: DVector<f64>,
    log_psi: f64,
}

impl GaussianBinaryRbm {
    /// Build a machine with parameters drawn from N(0, `init_spread`) and
    /// coordinates drawn from U(-0.5, 0.5).
    pub fn new(
        n_particles: usize,
        n_dimensions: usize,
        n_hidden: usize,
        sigma: f64,
        init_spread: f64,
        seed: u64,
    ) -> Result<Self> {
        if n_particles == 0 || n_dimensions == 0 || n_hidden == 0 {
            return Err(VmcError::InvalidParameter(
                "particles, dimensions and hidden units must be positive".into(),
            ));
        }
        if !(sigma > 0.0) || !sigma.is_finite() {
            return Err(VmcError::InvalidParameter(format!("sigma must be positive, got {sigma}")));
        }
        // Normal::new only rejects a non-finite deviation
        if !(init_spread >= 0.0) || !init_spread.is_finite() {
            return Err(VmcError::InvalidParameter(format!(
                "init_spread must be non-negative, got {init_spread}"
            )));
        }
        let normal = Normal::new(0.0, init_spread)
            .map_err(|e| VmcError::InvalidParameter(format!("init_spread {init_spread}: {e}")))?;

        let mut rng = StdRng::seed_from_u64(seed);
        let n_visible = n_particles * n_dimensions;
        let a = DVector::from_distribution(n_visible, &normal, &mut rng);
        let b = DVector::from_distribution(n_hidden, &normal, &mut rng);
        let w = DMatrix::from_distribution(n_visible, n_hidden, &normal, &mut rng);
        let x = DVector::from_fn(n_visible, |_, _| rng.gen_range(-0.5..0.5));

        let mut rbm = Self {
            n_particles,
            n_dimensions,
            sigma2: sigma * sigma,
            a,
            b,
            w,
            x,
            h: DVector::zeros(n_hidden),
            q: DVector::zeros(n_hidden),
            log_psi: 0.0,
        };
        rbm.refresh();
        Ok(rbm)
    }

    pub fn n_visible(&self) -> usize {
        self.a.len()
    }

    pub fn n_hidden(&self) -> usize {
        self.b.len()
    }

    pub fn n_particles(&self) -> usize {
        self.n_particles
    }

    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    pub fn visible_bias(&self) -> &DVector<f64> {
        &self.a
    }

    pub fn hidden_bias(&self) -> &DVector<f64> {
        &self.b
    }

    pub fn weights(&self) -> &DMatrix<f64> {
        &self.w
    }

    pub fn hidden(&self) -> &DVector<f64> {
        &self.h
    }

    /// Q = b + Wᵀx / σ²
    pub fn hidden_field(&self, x: &DVector<f64>) -> DVector<f64> {
        &self.b + self.w.tr_mul(x) / self.sigma2
    }

    /// ln F at `x` given its hidden field `q`.
    pub fn log_amplitude_with(&self, x: &DVector<f64>, q: &DVector<f64>) -> f64 {
        let gaussian = -(x - &self.a).norm_squared() / (2.0 * self.sigma2);
        gaussian + q.iter().map(|&qj| softplus(qj)).sum::<f64>()
    }
}

impl QuantumState for GaussianBinaryRbm {
    fn n_params(&self) -> usize {
        let (m, n) = (self.n_visible(), self.n_hidden());
        m + n + m * n
    }

    fn params(&self) -> DVector<f64> {
        let (m, n) = (self.n_visible(), self.n_hidden());
        let mut p = DVector::<f64>::zeros(self.n_params());
        p.rows_mut(0, m).copy_from(&self.a);
        p.rows_mut(m, n).copy_from(&self.b);
        for i in 0..m {
            for j in 0..n {
                p[m + n + i * n + j] = self.w[(i, j)];
            }
        }
        p
    }

    fn set_params(&mut self, params: &DVector<f64>) -> Result<()> {
        if params.len() != self.n_params() {
            return Err(VmcError::DimensionMismatch {
                expected: self.n_params(),
                found: params.len(),
            });
        }
        let (m, n) = (self.n_visible(), self.n_hidden());
        self.a.copy_from(&params.rows(0, m));
        self.b.copy_from(&params.rows(m, n));
        for i in 0..m {
            for j in 0..n {
                self.w[(i, j)] = params[m + n + i * n + j];
            }
        }
        self.refresh();
        Ok(())
    }

    fn configuration(&self) -> &DVector<f64> {
        &self.x
    }

    fn set_configuration(&mut self, x: DVector<f64>) -> Result<()> {
        if x.len() != self.n_visible() {
            return Err(VmcError::DimensionMismatch {
                expected: self.n_visible(),
                found: x.len(),
            });
        }
        self.x = x;
        self.refresh();
        Ok(())
    }

    fn n_dimensions(&self) -> usize {
        self.n_dimensions
    }

    fn refresh(&mut self) {
        self.q = self.hidden_field(&self.x);
        self.log_psi = self.log_amplitude_with(&self.x, &self.q);
    }

    fn log_amplitude(&self) -> f64 {
        self.log_psi
    }

    fn log_amplitude_of(&self, x: &DVector<f64>) -> f64 {
        let q = self.hidden_field(x);
        self.log_amplitude_with(x, &q)
    }

    fn log_gradient_at(&self, x: &DVector<f64>, factor: f64) -> DVector<f64> {
        let s = self.hidden_field(x).map(sigmoid);
        (&self.w * s - (x - &self.a)) * (factor / self.sigma2)
    }

    fn log_laplacian(&self, factor: f64) -> DVector<f64> {
        let curvature = self.q.map(|q| sigmoid(q) * sigmoid(-q));
        let w2 = self.w.map(|w| w * w);
        (w2 * curvature / (self.sigma2 * self.sigma2)).add_scalar(-1.0 / self.sigma2) * factor
    }

    fn param_log_derivatives(&self, factor: f64) -> DVector<f64> {
        let (m, n) = (self.n_visible(), self.n_hidden());
        let s = self.q.map(sigmoid);
        let mut d = DVector::<f64>::zeros(self.n_params());
        for i in 0..m {
            d[i] = factor * (self.x[i] - self.a[i]) / self.sigma2;
        }
        for j in 0..n {
            d[m + j] = factor * s[j];
        }
        for i in 0..m {
            for j in 0..n {
                d[m + n + i * n + j] = factor * self.x[i] * s[j] / self.sigma2;
            }
        }
        d
    }

    fn dump_params(&self, out: &mut dyn Write) -> Result<()> {
        writeln!(out, "{}", join(self.a.iter()))?;
        writeln!(out, "{}", join(self.b.iter()))?;
        // row-major, matching the flattened parameter order
        writeln!(out, "{}", join(self.w.transpose().iter()))?;
        Ok(())
    }
}

impl ConditionalSampling for GaussianBinaryRbm {
    fn sample_hidden(&mut self, rng: &mut dyn RngCore) {
        for j in 0..self.n_hidden() {
            let p = sigmoid(self.q[j]);
            self.h[j] = if rng.gen::<f64>() < p { 1.0 } else { 0.0 };
        }
    }

    fn sample_visible(&mut self, rng: &mut dyn RngCore) -> Result<()> {
        let sigma = self.sigma2.sqrt();
        let mean = &self.a + &self.w * &self.h;
        let x = mean.map(|mu| {
            let xi: f64 = rng.sample(StandardNormal);
            mu + sigma * xi
        });
        self.set_configuration(x)
    }
}
