use std::fmt;
use std::ops::Range;

use rand::prelude::*;

use crate::error::MatrixError;
use crate::math::scalar::{Real, Scalar};

/// Bounds checks on element access are kept in debug/test builds and
/// whenever the `bounds-check` feature is on.
pub const BOUNDS_CHECK: bool = cfg!(any(debug_assertions, feature = "bounds-check"));

/// Row and column count of a matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    pub rows: usize,
    pub cols: usize,
}

impl Shape {
    pub fn new(rows: usize, cols: usize) -> Shape {
        Shape { rows, cols }
    }

    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

impl From<(usize, usize)> for Shape {
    fn from((rows, cols): (usize, usize)) -> Shape {
        Shape { rows, cols }
    }
}

/// Dense, row-major matrix that owns its elements.
///
/// Indices are 0-based. Every matrix has at least one row and one column.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix<T = f64> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: Scalar> Matrix<T> {
    /// A `rows × cols` matrix of zeros.
    ///
    /// # Panics
    /// Panics if either dimension is zero.
    pub fn zeros(rows: usize, cols: usize) -> Matrix<T> {
        if rows == 0 || cols == 0 {
            panic!("{}", MatrixError::Empty(Shape::new(rows, cols)));
        }
        Matrix {
            rows,
            cols,
            data: vec![T::zero(); rows * cols],
        }
    }

    /// Builds a matrix from a flat, row-major list of exactly `rows * cols`
    /// values.
    pub fn from_flat(rows: usize, cols: usize, values: Vec<T>) -> Result<Matrix<T>, MatrixError> {
        if rows == 0 || cols == 0 {
            return Err(MatrixError::Empty(Shape::new(rows, cols)));
        }
        if values.len() != rows * cols {
            return Err(MatrixError::InitializerCount {
                expected: rows * cols,
                actual: values.len(),
            });
        }
        Ok(Matrix { rows, cols, data: values })
    }

    /// Builds a matrix from nested rows; every row must have the same length.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Matrix<T>, MatrixError> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, Vec::len);
        if n_rows == 0 || n_cols == 0 {
            return Err(MatrixError::Empty(Shape::new(n_rows, n_cols)));
        }

        let mut data = Vec::with_capacity(n_rows * n_cols);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != n_cols {
                return Err(MatrixError::RaggedRows {
                    row: i,
                    expected: n_cols,
                    actual: row.len(),
                });
            }
            data.extend(row);
        }

        Ok(Matrix { rows: n_rows, cols: n_cols, data })
    }

    /// The identity matrix. Only square shapes have one.
    pub fn identity(rows: usize, cols: usize) -> Result<Matrix<T>, MatrixError> {
        let shape = Shape::new(rows, cols);
        if rows == 0 || cols == 0 {
            return Err(MatrixError::Empty(shape));
        }
        if !shape.is_square() {
            return Err(MatrixError::NotSquare(shape));
        }

        let mut id = Matrix::zeros(rows, cols);
        for i in 0..rows {
            id.data[i * cols + i] = T::one();
        }
        Ok(id)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> Shape {
        Shape::new(self.rows, self.cols)
    }

    /// Row-major view of every element.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Borrow one row.
    pub fn row(&self, row: usize) -> &[T] {
        self.check_bounds(row, 0);
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// Iterates over rows as slices.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[T]> {
        self.data.chunks_exact(self.cols)
    }

    /// Reads the element at `(row, col)`.
    ///
    /// Out-of-range indices panic while [`BOUNDS_CHECK`] is on. With the
    /// check compiled out, an out-of-range column silently addresses a
    /// neighbouring row and the result is unspecified.
    pub fn at(&self, row: usize, col: usize) -> T {
        self.data[self.flat_index(row, col)]
    }

    /// Mutable access to the element at `(row, col)`; same bounds rules as
    /// [`Matrix::at`].
    pub fn at_mut(&mut self, row: usize, col: usize) -> &mut T {
        let idx = self.flat_index(row, col);
        &mut self.data[idx]
    }

    pub fn set(&mut self, row: usize, col: usize, value: T) {
        *self.at_mut(row, col) = value;
    }

    /// Always-checked element read.
    pub fn try_at(&self, row: usize, col: usize) -> Result<T, MatrixError> {
        if row >= self.rows || col >= self.cols {
            return Err(MatrixError::IndexOutOfRange {
                row,
                col,
                shape: self.shape(),
            });
        }
        Ok(self.data[row * self.cols + col])
    }

    #[inline]
    pub(crate) fn flat_index(&self, row: usize, col: usize) -> usize {
        self.check_bounds(row, col);
        row * self.cols + col
    }

    #[inline]
    fn check_bounds(&self, row: usize, col: usize) {
        if BOUNDS_CHECK && (row >= self.rows || col >= self.cols) {
            panic!(
                "{}",
                MatrixError::IndexOutOfRange {
                    row,
                    col,
                    shape: self.shape(),
                }
            );
        }
    }

    pub fn transpose(&self) -> Matrix<T> {
        let mut res = Matrix::zeros(self.cols, self.rows);

        for i in 0..self.rows {
            for j in 0..self.cols {
                res.data[j * self.rows + i] = self.data[i * self.cols + j];
            }
        }

        res
    }

    /// Applies `functor` to every element, returning a new matrix.
    pub fn map<F>(&self, functor: F) -> Matrix<T>
    where
        F: Fn(T) -> T,
    {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&x| functor(x)).collect(),
        }
    }

    /// Applies `functor` to every element in place.
    pub fn map_in_place<F>(&mut self, functor: F) -> &mut Self
    where
        F: Fn(T) -> T,
    {
        for x in self.data.iter_mut() {
            *x = functor(*x);
        }
        self
    }

    /// Multiplies every element by `k`.
    pub fn scale(&self, k: T) -> Matrix<T> {
        self.map(|x| x * k)
    }

    /// Standard matrix product: `self` is R×K, `rhs` is K×C, the result R×C.
    pub fn dot(&self, rhs: &Matrix<T>) -> Result<Matrix<T>, MatrixError> {
        if self.cols != rhs.rows {
            return Err(MatrixError::DimensionMismatch {
                op: "dot",
                lhs: self.shape(),
                rhs: rhs.shape(),
            });
        }

        let mut res = Matrix::zeros(self.rows, rhs.cols);

        // i-k-j order walks both rhs and the result row-contiguously.
        for i in 0..self.rows {
            let out = &mut res.data[i * rhs.cols..(i + 1) * rhs.cols];
            for k in 0..self.cols {
                let a = self.data[i * self.cols + k];
                let rhs_row = &rhs.data[k * rhs.cols..(k + 1) * rhs.cols];
                for (o, &b) in out.iter_mut().zip(rhs_row) {
                    *o += a * b;
                }
            }
        }

        Ok(res)
    }

    /// Element-wise (Hadamard) product of two same-shape matrices.
    pub fn hadamard(&self, rhs: &Matrix<T>) -> Result<Matrix<T>, MatrixError> {
        self.zip_with(rhs, "hadamard", |a, b| a * b)
    }

    pub fn checked_add(&self, rhs: &Matrix<T>) -> Result<Matrix<T>, MatrixError> {
        self.zip_with(rhs, "add", |a, b| a + b)
    }

    pub fn checked_sub(&self, rhs: &Matrix<T>) -> Result<Matrix<T>, MatrixError> {
        self.zip_with(rhs, "sub", |a, b| a - b)
    }

    fn zip_with<F>(&self, rhs: &Matrix<T>, op: &'static str, f: F) -> Result<Matrix<T>, MatrixError>
    where
        F: Fn(T, T) -> T,
    {
        self.ensure_same_shape(rhs, op)?;
        Ok(Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().zip(&rhs.data).map(|(&a, &b)| f(a, b)).collect(),
        })
    }

    pub(crate) fn ensure_same_shape(&self, rhs: &Matrix<T>, op: &'static str) -> Result<(), MatrixError> {
        if self.shape() != rhs.shape() {
            return Err(MatrixError::DimensionMismatch {
                op,
                lhs: self.shape(),
                rhs: rhs.shape(),
            });
        }
        Ok(())
    }

    /// In-place element-wise combination used by the compound operators.
    pub(crate) fn zip_in_place<F>(&mut self, rhs: &Matrix<T>, op: &'static str, f: F) -> Result<(), MatrixError>
    where
        F: Fn(&mut T, T),
    {
        self.ensure_same_shape(rhs, op)?;
        for (a, &b) in self.data.iter_mut().zip(&rhs.data) {
            f(a, b);
        }
        Ok(())
    }

    /// Copies rows `range` into a new matrix.
    pub fn select_rows(&self, range: Range<usize>) -> Result<Matrix<T>, MatrixError> {
        if range.start >= range.end || range.end > self.rows {
            return Err(MatrixError::IndexOutOfRange {
                row: range.end.max(range.start),
                col: 0,
                shape: self.shape(),
            });
        }
        Ok(Matrix {
            rows: range.len(),
            cols: self.cols,
            data: self.data[range.start * self.cols..range.end * self.cols].to_vec(),
        })
    }

    /// Appends a column filled with `value` (a bias input).
    pub fn with_column(&self, value: T) -> Matrix<T> {
        let mut data = Vec::with_capacity(self.rows * (self.cols + 1));
        for row in self.iter_rows() {
            data.extend_from_slice(row);
            data.push(value);
        }
        Matrix {
            rows: self.rows,
            cols: self.cols + 1,
            data,
        }
    }

    /// Drops the last column. A single-column matrix is returned unchanged
    /// because matrices cannot be empty.
    pub fn without_last_column(&self) -> Matrix<T> {
        if self.cols == 1 {
            return self.clone();
        }
        let data = self
            .iter_rows()
            .flat_map(|row| row[..self.cols - 1].iter().copied())
            .collect();
        Matrix {
            rows: self.rows,
            cols: self.cols - 1,
            data,
        }
    }
}

impl<T: Real> Matrix<T> {
    /// Uniform samples from [-1, 1] drawn from the thread RNG.
    pub fn random(rows: usize, cols: usize) -> Matrix<T> {
        Matrix::random_with(rows, cols, &mut rand::thread_rng())
    }

    /// Uniform samples from [-1, 1] drawn from `rng`.
    pub fn random_with<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Matrix<T> {
        let mut res = Matrix::zeros(rows, cols);
        for x in res.data.iter_mut() {
            *x = crate::math::scalar::cast(rng.gen_range(-1.0..=1.0));
        }
        res
    }
}

/// Free-function form of [`Matrix::dot`].
pub fn dot<T: Scalar>(a: &Matrix<T>, b: &Matrix<T>) -> Result<Matrix<T>, MatrixError> {
    a.dot(b)
}

impl<T: Scalar> fmt::Display for Matrix<T> {
    /// `[[ 0.1,  0.2 ],` / ` [ 0.3,  0.4 ]]`, one decimal for floats.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (r, row) in self.iter_rows().enumerate() {
            f.write_str(if r == 0 { "[[ " } else { " [ " })?;
            for (c, x) in row.iter().enumerate() {
                if c > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{:4.1}", x)?;
            }
            if r + 1 < self.rows {
                f.write_str(" ],\n")?;
            } else {
                f.write_str(" ]]")?;
            }
        }
        Ok(())
    }
}
