//! Gradient of the linear action value with respect to the weight matrix.
//!
//! For `q(s, a) = x(s) · w[:, a]` the gradient is `x(s)` in column `a` and zero
//! elsewhere. [`ClosedFormGradient`] writes that down directly; with the
//! `autodiff` feature, [`BurnGradient`] obtains the same matrix by
//! differentiating the tensor expression with Burn.

use crate::infra::{NUM_SLOTS, TrackError};

/// Weights indexed `[feature][slot]`
pub type WeightMatrix = [[f64; NUM_SLOTS]; NUM_SLOTS];

pub trait QGradient {
    /// d q(features, slot) / d weights
    fn gradient(
        &self,
        features: &[f64; NUM_SLOTS],
        weights: &WeightMatrix,
        slot: usize,
    ) -> Result<WeightMatrix, TrackError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ClosedFormGradient;

impl QGradient for ClosedFormGradient {
    fn gradient(
        &self,
        features: &[f64; NUM_SLOTS],
        _weights: &WeightMatrix,
        slot: usize,
    ) -> Result<WeightMatrix, TrackError> {
        let mut grad = [[0.0; NUM_SLOTS]; NUM_SLOTS];
        for (row, &x) in grad.iter_mut().zip(features.iter()) {
            row[slot] = x;
        }
        Ok(grad)
    }
}

#[cfg(feature = "autodiff")]
mod burn_gradient {
    use burn::tensor::backend::AutodiffBackend;
    use burn::tensor::{Tensor, TensorData};

    use super::{QGradient, WeightMatrix};
    use crate::infra::{NUM_SLOTS, TrackError};

    /// CPU autodiff backend used by default
    pub type AutodiffNdArray = burn::backend::Autodiff<burn::backend::NdArray>;

    /// Gradient through Burn's reverse-mode autodiff
    #[derive(Debug, Clone)]
    pub struct BurnGradient<B: AutodiffBackend> {
        device: B::Device,
    }

    impl<B: AutodiffBackend> BurnGradient<B> {
        pub fn new(device: B::Device) -> Self {
            Self { device }
        }
    }

    impl<B: AutodiffBackend> QGradient for BurnGradient<B> {
        fn gradient(
            &self,
            features: &[f64; NUM_SLOTS],
            weights: &WeightMatrix,
            slot: usize,
        ) -> Result<WeightMatrix, TrackError> {
            let flat: Vec<f32> = weights.iter().flatten().map(|&w| w as f32).collect();
            let w = Tensor::<B, 2>::from_data(
                TensorData::new(flat, [NUM_SLOTS, NUM_SLOTS]),
                &self.device,
            )
            .require_grad();

            let x: Vec<f32> = features.iter().map(|&f| f as f32).collect();
            let x = Tensor::<B, 2>::from_data(TensorData::new(x, [1, NUM_SLOTS]), &self.device);

            // q = x @ w[:, slot]
            let column = w.clone().slice([0..NUM_SLOTS, slot..slot + 1]);
            let q = x.matmul(column).sum();

            let grads = q.backward();
            let grad = w
                .grad(&grads)
                .ok_or_else(|| TrackError::Autodiff("no gradient for the weights".to_string()))?;
            let values: Vec<f32> = grad
                .into_data()
                .to_vec()
                .map_err(|e| TrackError::Autodiff(format!("{:?}", e)))?;

            let mut out = [[0.0; NUM_SLOTS]; NUM_SLOTS];
            for (i, value) in values.into_iter().enumerate() {
                out[i / NUM_SLOTS][i % NUM_SLOTS] = value as f64;
            }
            Ok(out)
        }
    }
}

#[cfg(feature = "autodiff")]
pub use burn_gradient::{AutodiffNdArray, BurnGradient};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_form_selects_column() {
        let features = [1.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0, 1.0];
        let weights = [[1.0; NUM_SLOTS]; NUM_SLOTS];
        let grad = ClosedFormGradient.gradient(&features, &weights, 3).unwrap();

        for (i, row) in grad.iter().enumerate() {
            for (j, &g) in row.iter().enumerate() {
                let expected = if j == 3 { features[i] } else { 0.0 };
                assert_eq!(g, expected);
            }
        }
    }

    #[cfg(feature = "autodiff")]
    #[test]
    fn test_autodiff_matches_closed_form() {
        use burn::backend::ndarray::NdArrayDevice;

        let burn = BurnGradient::<AutodiffNdArray>::new(NdArrayDevice::Cpu);
        let features = [0.0, 1.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0, 1.0];
        let mut weights = [[0.0; NUM_SLOTS]; NUM_SLOTS];
        for (i, row) in weights.iter_mut().enumerate() {
            for (j, w) in row.iter_mut().enumerate() {
                *w = 0.1 * (i as f64) - 0.05 * (j as f64);
            }
        }

        for slot in 0..NUM_SLOTS {
            let expected = ClosedFormGradient.gradient(&features, &weights, slot).unwrap();
            let actual = burn.gradient(&features, &weights, slot).unwrap();
            for i in 0..NUM_SLOTS {
                for j in 0..NUM_SLOTS {
                    assert!((expected[i][j] - actual[i][j]).abs() < 1e-6);
                }
            }
        }
    }
}
