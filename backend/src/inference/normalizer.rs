use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, Luma, RgbImage};
use shared::FeatureScale;

pub const GRID_SIZE: u32 = 8;
pub const FEATURE_LEN: usize = (GRID_SIZE * GRID_SIZE) as usize;

#[derive(Debug, thiserror::Error)]
pub enum PreprocessError {
    #[error("image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },
    #[error("expected {expected} intensities, got {actual}")]
    GridSize { expected: usize, actual: usize },
}

/// The 8x8 grid flattened row-major; the array type pins the length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector(pub [f32; FEATURE_LEN]);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ImageNormalizer {
    scale: FeatureScale,
}

impl ImageNormalizer {
    pub fn new(scale: FeatureScale) -> Self {
        Self { scale }
    }

    pub fn normalize(&self, image: &DynamicImage) -> Result<FeatureVector, PreprocessError> {
        let grid = to_gray_grid(image)?;
        let raw = grid.as_raw();
        if raw.len() != FEATURE_LEN {
            return Err(PreprocessError::GridSize {
                expected: FEATURE_LEN,
                actual: raw.len(),
            });
        }

        let mut features = [0f32; FEATURE_LEN];
        for (slot, &value) in features.iter_mut().zip(raw.iter()) {
            *slot = scale_intensity(value, self.scale);
        }
        Ok(FeatureVector(features))
    }
}

/// Grayscale conversion followed by an 8x8 resample. Each step is skipped
/// when the image already satisfies it.
pub fn to_gray_grid(image: &DynamicImage) -> Result<GrayImage, PreprocessError> {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Err(PreprocessError::EmptyImage { width, height });
    }

    let gray = match image {
        DynamicImage::ImageLuma8(gray) => gray.clone(),
        DynamicImage::ImageLuma16(_)
        | DynamicImage::ImageLumaA8(_)
        | DynamicImage::ImageLumaA16(_) => image.to_luma8(),
        colour => rec601_luma(&colour.to_rgb8()),
    };

    if gray.dimensions() == (GRID_SIZE, GRID_SIZE) {
        Ok(gray)
    } else {
        Ok(imageops::resize(
            &gray,
            GRID_SIZE,
            GRID_SIZE,
            FilterType::CatmullRom,
        ))
    }
}

/// ITU-R 601-2 luma (299/587/114 per mille) in 16-bit fixed point. Alpha is
/// dropped before this point.
fn rec601_luma(rgb: &RgbImage) -> GrayImage {
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let luma = (r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000) >> 16;
        Luma([luma as u8])
    })
}

fn scale_intensity(value: u8, scale: FeatureScale) -> f32 {
    match scale {
        FeatureScale::Raw => value as f32,
        FeatureScale::Digits16 => ((value as f64 / 255.0) * 16.0).round() as f32,
    }
}
