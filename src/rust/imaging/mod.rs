//! Getting an X-ray from a URL into the tensor layout the model expects.

mod fetch;
mod preprocess;

pub use fetch::{FetchLimits, ImageFetcher};
pub use preprocess::{
    decode, preprocess, to_luminance, to_tensor, IMAGE_HEIGHT, IMAGE_WIDTH, INPUT_SHAPE,
};
