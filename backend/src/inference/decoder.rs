use base64::{Engine as _, engine::general_purpose};
use image::{DynamicImage, ImageError, ImageReader, Limits};
use std::io::Cursor;

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Error decoding image: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("Error reading or preprocessing image: {0}")]
    Image(#[from] ImageError),
}

/// Turns base64 text into a raster. The container format is guessed from the
/// leading bytes; decoding is bounded by the configured dimension limits.
#[derive(Clone)]
pub struct ImageDecoder {
    limits: Limits,
}

impl ImageDecoder {
    pub fn new(max_dimension: u32) -> Self {
        let mut limits = Limits::default();
        limits.max_image_width = Some(max_dimension);
        limits.max_image_height = Some(max_dimension);
        Self { limits }
    }

    pub fn decode(&self, base64_text: &str) -> Result<DynamicImage, DecodeError> {
        let bytes = decode_base64(base64_text)?;
        self.decode_image(&bytes)
    }

    pub fn decode_image(&self, bytes: &[u8]) -> Result<DynamicImage, DecodeError> {
        let mut reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(ImageError::IoError)?;
        reader.limits(self.limits.clone());
        Ok(reader.decode()?)
    }
}

pub fn decode_base64(text: &str) -> Result<Vec<u8>, DecodeError> {
    Ok(general_purpose::STANDARD.decode(text)?)
}
