// Image processing module - crop-to-fill thumbnails and the encoders behind them
mod crop;
pub mod formats;
mod resize;
mod types;

pub use crop::center_crop_box;
pub use resize::generate_image_thumbnail;
pub use types::{CropBox, ImageSize};
