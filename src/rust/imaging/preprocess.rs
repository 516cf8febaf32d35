use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, Luma};
use ndarray::Array4;

use crate::classifier::DiagnosisError;

pub const IMAGE_HEIGHT: u32 = 224;
pub const IMAGE_WIDTH: u32 = 224;

/// Model input shape, NHWC with a single grayscale channel.
pub const INPUT_SHAPE: [usize; 4] = [1, IMAGE_HEIGHT as usize, IMAGE_WIDTH as usize, 1];

/// Decodes raw bytes, guessing the format from their content.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, DiagnosisError> {
    let image = image::load_from_memory(bytes)?;
    if image.width() == 0 || image.height() == 0 {
        return Err(DiagnosisError::EmptyImage);
    }
    Ok(image)
}

/// ITU-R 601-2 luma in 16-bit fixed point; the weights sum to 65536.
fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((u32::from(r) * 19595 + u32::from(g) * 38470 + u32::from(b) * 7471 + 0x8000) >> 16) as u8
}

/// Converts any color type to 8-bit grayscale, ignoring alpha.
pub fn to_luminance(image: &DynamicImage) -> GrayImage {
    let rgb = image.to_rgb8();
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        Luma([luma(r, g, b)])
    })
}

/// Lays a grayscale raster out as a `(1, height, width, 1)` tensor of raw
/// 0..=255 values. No rescaling: the model was trained on unnormalized pixels.
pub fn to_tensor(gray: &GrayImage) -> Array4<f32> {
    let (width, height) = gray.dimensions();
    Array4::from_shape_fn((1, height as usize, width as usize, 1), |(_, y, x, _)| {
        f32::from(gray.get_pixel(x as u32, y as u32)[0])
    })
}

/// Full pipeline: decode, grayscale, nearest-neighbour resize to 224x224, tensor.
pub fn preprocess(bytes: &[u8]) -> Result<Array4<f32>, DiagnosisError> {
    let image = decode(bytes)?;
    let gray = to_luminance(&image);
    let resized = imageops::resize(&gray, IMAGE_WIDTH, IMAGE_HEIGHT, FilterType::Nearest);
    Ok(to_tensor(&resized))
}
