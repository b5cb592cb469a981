use crate::config::{DEFAULT_INPUT_SIZE, InferenceConfig};
use crate::error::PredictError;
use common::{span, span_debug};
use image::{ImageReader, Limits, RgbImage};
use ndarray::{Array, IxDyn};
use std::io::Cursor;
use std::str::FromStr;

/// Largest width or height accepted from an upload
pub const MAX_IMAGE_DIMENSION: u32 = 16_384;

/// Decoder allocation ceiling, enough for a 16-bit RGBA 4K photo
pub const MAX_DECODE_ALLOC: u64 = 128 * 1024 * 1024;

/// Memory layout of the model input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TensorLayout {
    /// `[1, H, W, 3]`, the Keras/TensorFlow convention
    Nhwc,
    /// `[1, 3, H, W]`, the PyTorch convention
    Nchw,
}

impl TensorLayout {
    pub fn input_shape(&self, input_size: u32) -> Vec<usize> {
        let size = input_size as usize;
        match self {
            TensorLayout::Nhwc => vec![1, size, size, 3],
            TensorLayout::Nchw => vec![1, 3, size, size],
        }
    }
}

impl FromStr for TensorLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nhwc" => Ok(Self::Nhwc),
            "nchw" => Ok(Self::Nchw),
            other => Err(format!(
                "{} is not a supported tensor layout. Use either `nhwc` or `nchw`.",
                other
            )),
        }
    }
}

/// Turns an encoded upload into the model's input tensor.
///
/// Pipeline: decode, convert to RGB8, nearest-neighbour resize to a square
/// `input_size`, cast to `f32` (values stay in `0.0..=255.0`), add a batch
/// dimension of one.
#[derive(Debug, Clone, Copy)]
pub struct PreProcessor {
    pub input_size: u32,
    pub layout: TensorLayout,
}

impl PreProcessor {
    pub fn new(input_size: u32, layout: TensorLayout) -> Self {
        Self { input_size, layout }
    }

    pub fn from_config(config: &InferenceConfig) -> Self {
        Self::new(config.input_size, config.layout)
    }

    pub fn input_shape(&self) -> Vec<usize> {
        self.layout.input_shape(self.input_size)
    }

    pub fn prepare(&self, bytes: &[u8]) -> Result<Array<f32, IxDyn>, PredictError> {
        let _s = span!("preprocess_image");

        let rgb = decode_image(bytes)?;

        tracing::trace!(
            width = rgb.width(),
            height = rgb.height(),
            encoded_bytes = bytes.len(),
            "Decoded upload"
        );

        self.prepare_rgb(&rgb)
    }

    pub fn prepare_rgb(&self, rgb: &RgbImage) -> Result<Array<f32, IxDyn>, PredictError> {
        let _s = span_debug!("resize_nearest");

        if rgb.width() == 0 || rgb.height() == 0 {
            return Err(PredictError::Preprocess(format!(
                "image has no pixels ({}x{})",
                rgb.width(),
                rgb.height()
            )));
        }

        let size = self.input_size as usize;
        let xs = nearest_indices(rgb.width(), self.input_size);
        let ys = nearest_indices(rgb.height(), self.input_size);
        let sample = |x: usize, y: usize, c: usize| rgb.get_pixel(xs[x], ys[y]).0[c] as f32;

        let tensor = match self.layout {
            TensorLayout::Nhwc => {
                Array::from_shape_fn((1, size, size, 3), |(_, y, x, c)| sample(x, y, c)).into_dyn()
            }
            TensorLayout::Nchw => {
                Array::from_shape_fn((1, 3, size, size), |(_, c, y, x)| sample(x, y, c)).into_dyn()
            }
        };

        Ok(tensor)
    }
}

/// Source coordinate for each of `out_size` destination coordinates.
///
/// Same mapping as TensorFlow's `ResizeNearestNeighbor` with
/// `align_corners = false` and `half_pixel_centers = false`:
/// `min(floor(dst * in / out), in - 1)`, computed in `f32`.
fn nearest_indices(in_size: u32, out_size: u32) -> Vec<u32> {
    let scale = in_size as f32 / out_size as f32;
    (0..out_size)
        .map(|dst| ((dst as f32 * scale).floor() as u32).min(in_size - 1))
        .collect()
}

impl Default for PreProcessor {
    fn default() -> Self {
        Self::new(DEFAULT_INPUT_SIZE, TensorLayout::Nhwc)
    }
}

/// Decode PNG, JPEG, GIF (first frame) or BMP bytes into RGB8.
///
/// Grayscale and alpha images are converted so every upload yields three
/// channels. Images above [`MAX_IMAGE_DIMENSION`] or needing more than
/// [`MAX_DECODE_ALLOC`] bytes are rejected before their pixels are decoded.
pub fn decode_image(bytes: &[u8]) -> Result<RgbImage, PredictError> {
    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_IMAGE_DIMENSION);
    limits.max_image_height = Some(MAX_IMAGE_DIMENSION);
    limits.max_alloc = Some(MAX_DECODE_ALLOC);

    let mut reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(image::ImageError::IoError)?;
    reader.limits(limits);

    Ok(reader.decode()?.to_rgb8())
}
