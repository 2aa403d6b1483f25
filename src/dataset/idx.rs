use std::path::Path;

use tracing::debug;

use crate::error::IdxError;
use crate::math::matrix::Matrix;

/// Magic number of an IDX3 (uint8, 3 dimensions) image file.
pub const IMAGE_MAGIC: u32 = 0x0000_0803;
/// Magic number of an IDX1 (uint8, 1 dimension) label file.
pub const LABEL_MAGIC: u32 = 0x0000_0801;
/// Upper bound on the records a single file may declare.
pub const MAX_RECORDS: usize = 1_000_000;

/// Decoded IDX dataset: one image per row of `inputs`, one one-hot row per
/// label in `targets`.
#[derive(Debug, Clone)]
pub struct IdxDataset {
    pub inputs: Matrix<f64>,
    pub targets: Matrix<f64>,
    pub image_rows: usize,
    pub image_cols: usize,
}

/// Parse a pair of IDX binary buffers (image + label) as used by MNIST and
/// its derivatives into matrices suitable for direct use with the training
/// loop.
///
/// # IDX3 image file layout
/// ```text
/// bytes  0-3:   0x00000803  (magic: uint8 data, 3 dimensions)
/// bytes  4-7:   N           (number of images, big-endian u32)
/// bytes  8-11:  rows        (image height in pixels, big-endian u32)
/// bytes 12-15:  cols        (image width in pixels, big-endian u32)
/// bytes 16..:   N * rows * cols bytes, row-major, uint8
/// ```
///
/// # IDX1 label file layout
/// ```text
/// bytes  0-3:   0x00000801  (magic: uint8 data, 1 dimension)
/// bytes  4-7:   N           (number of labels, big-endian u32)
/// bytes  8..:   N bytes, each a class index in [0, n_classes)
/// ```
///
/// Pixels are divided by 255 so inputs lie in `[0, 1]`. When
/// `expected_dims` is given, the image dimensions must match it.
pub fn parse_idx_pair(
    image_bytes: &[u8],
    label_bytes: &[u8],
    n_classes: usize,
    expected_dims: Option<(usize, usize)>,
) -> Result<IdxDataset, IdxError> {
    if n_classes < 2 {
        return Err(IdxError::TooFewClasses(n_classes));
    }

    // ── Image header ────────────────────────────────────────────────────────

    ensure_len("image", image_bytes, 16)?;
    check_magic("image", image_bytes, IMAGE_MAGIC)?;

    let n_items = read_be_u32(image_bytes, 4);
    let rows = read_be_u32(image_bytes, 8);
    let cols = read_be_u32(image_bytes, 12);

    if n_items > MAX_RECORDS {
        return Err(IdxError::TooManyRecords {
            file: "image",
            count: n_items,
            limit: MAX_RECORDS,
        });
    }
    if let Some((want_rows, want_cols)) = expected_dims {
        if (rows, cols) != (want_rows, want_cols) {
            return Err(IdxError::DimensionMismatch {
                rows: want_rows,
                cols: want_cols,
                actual_rows: rows,
                actual_cols: cols,
            });
        }
    }
    if n_items == 0 || rows == 0 || cols == 0 {
        return Err(IdxError::Empty("image"));
    }

    let (n_pixels, data_len, needed) = rows
        .checked_mul(cols)
        .and_then(|n_pixels| {
            let data_len = n_pixels.checked_mul(n_items)?;
            Some((n_pixels, data_len, data_len.checked_add(16)?))
        })
        .ok_or(IdxError::TooLarge {
            count: n_items,
            rows,
            cols,
        })?;
    ensure_len("image", image_bytes, needed)?;

    // ── Label header ────────────────────────────────────────────────────────

    ensure_len("label", label_bytes, 8)?;
    check_magic("label", label_bytes, LABEL_MAGIC)?;

    let label_count = read_be_u32(label_bytes, 4);
    if label_count > MAX_RECORDS {
        return Err(IdxError::TooManyRecords {
            file: "label",
            count: label_count,
            limit: MAX_RECORDS,
        });
    }
    if label_count != n_items {
        return Err(IdxError::CountMismatch {
            images: n_items,
            labels: label_count,
        });
    }
    ensure_len("label", label_bytes, 8 + n_items)?;

    // ── Build inputs ────────────────────────────────────────────────────────

    let pixels: Vec<f64> = image_bytes[16..16 + data_len]
        .iter()
        .map(|&px| px as f64 / 255.0)
        .collect();
    let inputs = Matrix::from_flat(n_items, n_pixels, pixels).map_err(|_| IdxError::Empty("image"))?;

    // ── Build targets (one-hot) ─────────────────────────────────────────────

    let mut targets = Matrix::zeros(n_items, n_classes);
    for (i, &class_idx) in label_bytes[8..8 + n_items].iter().enumerate() {
        let class = class_idx as usize;
        if class >= n_classes {
            return Err(IdxError::LabelOutOfRange {
                index: i,
                label: class,
                classes: n_classes,
            });
        }
        targets.set(i, class, 1.0);
    }

    debug!(records = n_items, rows, cols, classes = n_classes, "decoded idx pair");

    Ok(IdxDataset {
        inputs,
        targets,
        image_rows: rows,
        image_cols: cols,
    })
}

/// Reads both files from disk and parses them with [`parse_idx_pair`].
pub fn read_idx_pair(
    image_path: impl AsRef<Path>,
    label_path: impl AsRef<Path>,
    n_classes: usize,
    expected_dims: Option<(usize, usize)>,
) -> Result<IdxDataset, IdxError> {
    let image_bytes = std::fs::read(image_path)?;
    let label_bytes = std::fs::read(label_path)?;
    parse_idx_pair(&image_bytes, &label_bytes, n_classes, expected_dims)
}

fn ensure_len(file: &'static str, bytes: &[u8], needed: usize) -> Result<(), IdxError> {
    if bytes.len() < needed {
        return Err(IdxError::Truncated {
            file,
            needed,
            actual: bytes.len(),
        });
    }
    Ok(())
}

fn check_magic(file: &'static str, bytes: &[u8], expected: u32) -> Result<(), IdxError> {
    let actual = read_be_u32(bytes, 0) as u32;
    if actual != expected {
        return Err(IdxError::BadMagic { file, expected, actual });
    }
    Ok(())
}

/// Callers have already checked that `bytes` holds `at + 4` bytes.
fn read_be_u32(bytes: &[u8], at: usize) -> usize {
    u32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]) as usize
}
