//! Fixture helpers shared by the inference and route tests.

use base64::{Engine as _, engine::general_purpose};
use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use std::io::Cursor;

pub fn png_bytes(img: &DynamicImage) -> Vec<u8> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .expect("png encoding");
    buf
}

pub fn encode_base64(bytes: &[u8]) -> String {
    general_purpose::STANDARD.encode(bytes)
}

/// An 8x8 grayscale PNG, base64 encoded.
pub fn gray_png_base64(value: u8) -> String {
    let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(8, 8, Luma([value])));
    encode_base64(&png_bytes(&img))
}
