pub mod idx;
pub mod render;

pub use idx::{parse_idx_pair, read_idx_pair, IdxDataset};
pub use render::render_image;
