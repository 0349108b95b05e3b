//! Image preprocessing for the tumor classifier
//!
//! Steps:
//! 1. Decode the staged upload (format guessed from magic bytes)
//! 2. Resize to exactly `IMAGE_SIZE` x `IMAGE_SIZE` (2x2 bilinear, no padding)
//! 3. Lay out pixels as an NHWC `f32` tensor `[1, H, W, 3]`, raw 0-255 values
//! 4. Re-encode the resized image as a base64 JPEG preview

use std::io::Cursor;
use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::ValueEnum;
use image::codecs::jpeg::JpegEncoder;
use image::io::Reader as ImageReader;
use image::{ColorType, DynamicImage, Rgb, RgbImage};
use ndarray::Array4;

use crate::error::PredictError;

/// Spatial size expected by the model.
pub const IMAGE_SIZE: u32 = 150;

/// Tensor layout handed to the classifier: `[batch, height, width, channels]`.
pub type ImageTensor = Array4<f32>;

/// Channel order of the model tensor. The preview is always encoded from RGB.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ChannelOrder {
    /// Blue, green, red (the order the model was trained with)
    #[default]
    Bgr,
    Rgb,
}

impl ChannelOrder {
    fn indices(self) -> [usize; 3] {
        match self {
            ChannelOrder::Bgr => [2, 1, 0],
            ChannelOrder::Rgb => [0, 1, 2],
        }
    }
}

/// An upload resized to model dimensions, plus its tensor view.
#[derive(Debug, Clone)]
pub struct PreprocessedImage {
    pixels: RgbImage,
    tensor: ImageTensor,
}

impl PreprocessedImage {
    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    pub fn tensor(&self) -> &ImageTensor {
        &self.tensor
    }

    /// Encode the resized image as JPEG and return it as standard base64.
    pub fn to_base64_jpeg(&self, quality: u8) -> Result<String, PredictError> {
        let mut buffer = Cursor::new(Vec::new());
        let (width, height) = self.pixels.dimensions();
        JpegEncoder::new_with_quality(&mut buffer, quality)
            .encode(self.pixels.as_raw(), width, height, ColorType::Rgb8)
            .map_err(|e| PredictError::Encoding(e.to_string()))?;

        Ok(STANDARD.encode(buffer.into_inner()))
    }
}

/// Decode an image file, detecting the format from its content.
///
/// Failing to open or read the file is a storage error; anything the decoder
/// rejects (including truncated data) is an invalid image.
pub fn load_image(path: &Path) -> Result<DynamicImage, PredictError> {
    let image = ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| PredictError::InvalidImage(e.to_string()))?;

    if image.width() == 0 || image.height() == 0 {
        return Err(PredictError::InvalidImage("image has no pixels".to_string()));
    }
    Ok(image)
}

/// Source coordinate and blend weight for one output coordinate along an axis.
///
/// Pixel centres are aligned (`(dst + 0.5) * scale - 0.5`) and the result is
/// clamped to the image, so only the two nearest source pixels contribute.
fn sample_axis(dst: u32, src_len: u32, dst_len: u32) -> (u32, u32, f32) {
    let scale = src_len as f32 / dst_len as f32;
    let pos = (dst as f32 + 0.5) * scale - 0.5;
    let last = src_len - 1;

    if pos <= 0.0 {
        return (0, 0, 0.0);
    }
    let lo = pos.floor() as u32;
    if lo >= last {
        return (last, last, 0.0);
    }
    (lo, lo + 1, pos - lo as f32)
}

/// Bilinear resize that blends only the 2x2 source neighbours of each output
/// pixel, whatever the scale factor. This is the interpolation the model was
/// trained with; `image`'s Triangle filter widens its kernel on downscale.
pub fn resize_bilinear(src: &RgbImage, width: u32, height: u32) -> RgbImage {
    let (src_w, src_h) = src.dimensions();
    let columns: Vec<_> = (0..width).map(|x| sample_axis(x, src_w, width)).collect();

    RgbImage::from_fn(width, height, |x, y| {
        let (y0, y1, fy) = sample_axis(y, src_h, height);
        let (x0, x1, fx) = columns[x as usize];
        let (p00, p01) = (src.get_pixel(x0, y0), src.get_pixel(x1, y0));
        let (p10, p11) = (src.get_pixel(x0, y1), src.get_pixel(x1, y1));

        let mut out = [0u8; 3];
        for c in 0..3 {
            let top = p00[c] as f32 * (1.0 - fx) + p01[c] as f32 * fx;
            let bottom = p10[c] as f32 * (1.0 - fx) + p11[c] as f32 * fx;
            let value = top * (1.0 - fy) + bottom * fy;
            out[c] = value.round().clamp(0.0, 255.0) as u8;
        }
        Rgb(out)
    })
}

/// Resize to model dimensions and build the batched tensor.
pub fn preprocess(image: &DynamicImage, order: ChannelOrder) -> PreprocessedImage {
    let pixels = resize_bilinear(&image.to_rgb8(), IMAGE_SIZE, IMAGE_SIZE);

    let channels = order.indices();
    let side = IMAGE_SIZE as usize;
    let tensor = Array4::from_shape_fn((1, side, side, 3), |(_, y, x, c)| {
        pixels.get_pixel(x as u32, y as u32)[channels[c]] as f32
    });

    PreprocessedImage { pixels, tensor }
}
