use crate::error::MatrixError;
use crate::math::matrix::Matrix;
use crate::math::scalar::{cast, Real};

pub struct MseLoss;

impl MseLoss {
    /// Half mean squared error of one sample: `sum((e - p)²) / (2n)`.
    pub fn row_loss<T: Real>(predicted: &[T], expected: &[T]) -> T {
        let n: T = cast(predicted.len() as f64);
        let two = T::one() + T::one();
        predicted
            .iter()
            .zip(expected.iter())
            .map(|(&p, &e)| (e - p) * (e - p))
            .fold(T::zero(), |acc, x| acc + x)
            / (two * n)
    }

    /// Batch loss: the mean of [`MseLoss::row_loss`] over every row.
    pub fn loss<T: Real>(predicted: &Matrix<T>, expected: &Matrix<T>) -> Result<T, MatrixError> {
        predicted.ensure_same_shape(expected, "mse")?;

        let rows: T = cast(predicted.rows() as f64);
        let total = predicted
            .iter_rows()
            .zip(expected.iter_rows())
            .map(|(p, e)| MseLoss::row_loss(p, e))
            .fold(T::zero(), |acc, x| acc + x);
        Ok(total / rows)
    }

    /// Output error `expected - predicted`; the starting point of the
    /// backward pass before it is scaled by the activation derivative.
    pub fn derivative<T: Real>(predicted: &Matrix<T>, expected: &Matrix<T>) -> Result<Matrix<T>, MatrixError> {
        expected.checked_sub(predicted)
    }
}

/// Free-function form of [`MseLoss::loss`].
pub fn mse<T: Real>(predicted: &Matrix<T>, expected: &Matrix<T>) -> Result<T, MatrixError> {
    MseLoss::loss(predicted, expected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    fn m(rows: usize, cols: usize, values: &[f64]) -> Matrix<f64> {
        Matrix::from_flat(rows, cols, values.to_vec()).unwrap()
    }

    #[test]
    fn single_row_halves_the_mean() {
        let a = m(1, 2, &[0.0, 1.0]);
        let y = m(1, 2, &[1.0, 1.0]);
        // (1² + 0²) / (2·2)
        assert_eq!(mse(&a, &y).unwrap(), 0.25);
    }

    #[test]
    fn batch_is_the_mean_of_rows() {
        let a = m(2, 2, &[0.0, 1.0, 0.0, 0.0]);
        let y = m(2, 2, &[1.0, 1.0, 1.0, 1.0]);
        // rows: 0.25 and 0.5
        assert_eq!(mse(&a, &y).unwrap(), 0.375);
    }

    #[test]
    fn identical_inputs_have_zero_loss() {
        let a = m(2, 3, &[0.1, -0.4, 0.9, 2.0, 0.0, -1.0]);
        assert_eq!(mse(&a, &a).unwrap(), 0.0);
    }

    #[test]
    fn shape_mismatch_is_an_error() {
        let err = mse(&m(1, 2, &[0.0, 0.0]), &m(2, 1, &[0.0, 0.0])).unwrap_err();
        assert!(matches!(err, MatrixError::DimensionMismatch { op: "mse", .. }));
    }

    #[test]
    fn derivative_points_towards_the_target() {
        let a = m(1, 2, &[0.2, 0.9]);
        let y = m(1, 2, &[1.0, 0.0]);
        let d = MseLoss::derivative(&a, &y).unwrap();
        assert!(d.at(0, 0) > 0.0 && d.at(0, 1) < 0.0);
    }

    fn permute_rows(a: &Matrix<f64>, order: &[usize]) -> Matrix<f64> {
        Matrix::from_rows(order.iter().map(|&r| a.row(r).to_vec()).collect()).unwrap()
    }

    #[test]
    fn row_order_does_not_change_the_loss() {
        let mut rng = StdRng::seed_from_u64(21);
        let a: Matrix<f64> = Matrix::random_with(6, 3, &mut rng);
        let y: Matrix<f64> = Matrix::random_with(6, 3, &mut rng);

        let mut order: Vec<usize> = (0..6).collect();
        order.shuffle(&mut rng);

        let before = mse(&a, &y).unwrap();
        let after = mse(&permute_rows(&a, &order), &permute_rows(&y, &order)).unwrap();
        assert!((before - after).abs() < 1e-12);
    }

    #[test]
    fn loss_is_never_negative() {
        let mut rng = StdRng::seed_from_u64(22);
        for _ in 0..20 {
            let a: Matrix<f64> = Matrix::random_with(4, 5, &mut rng);
            let y: Matrix<f64> = Matrix::random_with(4, 5, &mut rng);
            assert!(mse(&a, &y).unwrap() >= 0.0);
        }
    }
}
