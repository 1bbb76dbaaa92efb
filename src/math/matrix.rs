use rand::Rng;
use serde::{Serialize, Deserialize};
use std::f64::consts::PI;
use std::ops::Mul;

/// Dense row-major matrix used for batched forward passes.
///
/// A batch of `n` samples with `d` features is an `n × d` matrix; a dense
/// layer's weights are `d_in × d_out`, so `batch * weights` yields the
/// pre-activation outputs for the whole batch in one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Vec<f64>>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix {
            rows,
            cols,
            data: vec![vec![0.0; cols]; rows],
        }
    }

    /// Samples a single value from N(0, 1) using the Box-Muller transform.
    fn sample_standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
        // Both uniforms drawn on (0, 1] to avoid log(0).
        let u1: f64 = 1.0 - rng.gen::<f64>();
        let u2: f64 = 1.0 - rng.gen::<f64>();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }

    /// He initialization: samples from N(0, sqrt(2 / rows)).
    ///
    /// Shape: (rows, cols) where `rows` is the fan-in. The caller supplies the
    /// RNG so that a seeded generator gives reproducible weights.
    pub fn he<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Matrix {
        let std_dev = (2.0 / rows.max(1) as f64).sqrt();
        let mut res = Matrix::zeros(rows, cols);
        for row in res.data.iter_mut() {
            for x in row.iter_mut() {
                *x = Matrix::sample_standard_normal(rng) * std_dev;
            }
        }
        res
    }

    /// Builds a matrix from row vectors. An empty `data` gives a 0 × 0 matrix.
    ///
    /// # Panics
    /// Panics if the rows are ragged.
    pub fn from_data(data: Vec<Vec<f64>>) -> Matrix {
        let cols = data.first().map(|r| r.len()).unwrap_or(0);
        assert!(
            data.iter().all(|r| r.len() == cols),
            "Matrix::from_data requires rows of equal length"
        );
        Matrix { rows: data.len(), cols, data }
    }

    pub fn map<F>(&self, functor: F) -> Matrix
    where
        F: Fn(f64) -> f64,
    {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter()
                .map(|row| row.iter().map(|&x| functor(x)).collect())
                .collect(),
        }
    }

    /// Adds `row` to every row of the matrix (bias broadcast).
    ///
    /// # Panics
    /// Panics if `row.len() != self.cols`.
    pub fn add_row(&self, row: &[f64]) -> Matrix {
        assert_eq!(row.len(), self.cols, "broadcast row has the wrong width");
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter()
                .map(|r| r.iter().zip(row).map(|(a, b)| a + b).collect())
                .collect(),
        }
    }

    pub fn into_rows(self) -> Vec<Vec<f64>> {
        self.data
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix { rows: 0, cols: 0, data: vec![] }
    }
}

impl Mul for &Matrix {
    type Output = Matrix;

    fn mul(self, rhs: Self) -> Self::Output {
        if self.cols != rhs.rows {
            panic!("Matrices are of incorrect sizes")
        }

        let mut res = Matrix::zeros(self.rows, rhs.cols);

        for i in 0..res.rows {
            for j in 0..res.cols {
                let mut sum = 0.0;

                for k in 0..self.cols {
                    sum += self.data[i][k] * rhs.data[k][j];
                }

                res.data[i][j] = sum;
            }
        }

        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn product_and_broadcast() {
        let a = Matrix::from_data(vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        let b = Matrix::from_data(vec![vec![1.0], vec![1.0]]);
        let c = (&a * &b).add_row(&[0.5]);
        assert_eq!(c.into_rows(), vec![vec![3.5], vec![7.5]]);
    }

    #[test]
    fn seeded_he_is_reproducible() {
        let a = Matrix::he(4, 3, &mut StdRng::seed_from_u64(7));
        let b = Matrix::he(4, 3, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
        assert_eq!((a.rows, a.cols), (4, 3));
    }

    #[test]
    fn empty_data_is_zero_by_zero() {
        let m = Matrix::from_data(vec![]);
        assert_eq!((m.rows, m.cols), (0, 0));
    }
}
