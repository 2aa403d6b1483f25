use thiserror::Error;

use crate::math::matrix::Shape;

/// Contract violations raised by the matrix engine.
///
/// Every variant is a caller mistake rather than an environmental fault:
/// there is nothing to retry. Constructors and products return these as
/// `Err`, while the arithmetic operators panic with the same message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MatrixError {
    /// Operand shapes are incompatible for `op`.
    #[error("dimension mismatch in {op}: {lhs} vs {rhs}")]
    DimensionMismatch {
        op: &'static str,
        lhs: Shape,
        rhs: Shape,
    },

    /// An identity was requested for a non-square shape.
    #[error("identity requires a square matrix, got {0}")]
    NotSquare(Shape),

    #[error("index ({row}, {col}) out of range for {shape} matrix")]
    IndexOutOfRange { row: usize, col: usize, shape: Shape },

    /// A flat initializer did not hold exactly rows × cols values.
    #[error("initializer holds {actual} values but the matrix needs {expected}")]
    InitializerCount { expected: usize, actual: usize },

    #[error("row {row} has {actual} columns, expected {expected}")]
    RaggedRows {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// Matrices need at least one row and one column.
    #[error("matrix dimensions must be non-zero, got {0}")]
    Empty(Shape),
}

/// Errors raised while building, configuring or running a network.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error(transparent)]
    Matrix(#[from] MatrixError),

    #[error("a network needs at least one weight matrix")]
    EmptyStack,

    /// Weight `layer` produces `produced` values but weight `layer + 1`
    /// expects `expected` inputs.
    #[error("weight {layer} feeds {produced} inputs into weight {next} which expects {expected}")]
    IncompatibleLayers {
        layer: usize,
        next: usize,
        produced: usize,
        expected: usize,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures while decoding IDX image/label files.
#[derive(Debug, Error)]
pub enum IdxError {
    #[error("{file} file too short: need at least {needed} bytes, got {actual}")]
    Truncated {
        file: &'static str,
        needed: usize,
        actual: usize,
    },

    #[error("{file} file: magic number mismatch (expected {expected:#010x}, got {actual:#010x})")]
    BadMagic {
        file: &'static str,
        expected: u32,
        actual: u32,
    },

    #[error("{file} file declares {count} records, more than the limit of {limit}")]
    TooManyRecords {
        file: &'static str,
        count: usize,
        limit: usize,
    },

    #[error("image dimensions {actual_rows}x{actual_cols} do not match the expected {rows}x{cols}")]
    DimensionMismatch {
        rows: usize,
        cols: usize,
        actual_rows: usize,
        actual_cols: usize,
    },

    #[error("image file declares {images} records but label file declares {labels}")]
    CountMismatch { images: usize, labels: usize },

    #[error("label at index {index} is {label}, out of range for {classes} classes")]
    LabelOutOfRange {
        index: usize,
        label: usize,
        classes: usize,
    },

    /// Declared sizes whose byte count does not fit in `usize`.
    #[error("image file declares {count} records of {rows}x{cols} pixels, too large to address")]
    TooLarge { count: usize, rows: usize, cols: usize },

    #[error("n_classes must be at least 2, got {0}")]
    TooFewClasses(usize),

    /// Zero records or zero-sized images cannot form a matrix.
    #[error("{0} file holds no data")]
    Empty(&'static str),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
