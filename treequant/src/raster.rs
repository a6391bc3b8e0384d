//! Abstract pixel access used by the quantization pipeline

use crate::QuantizeError;
use image::{ImageBuffer, Rgb, RgbImage};
use palette::Srgb;
use std::ops::Deref;

/// A rectangular grid of 8-bit RGB pixels
///
/// This is the only view of an image the quantizer needs.
/// Any alpha channel, palette, or grayscale format should be normalized to RGB before reaching this trait.
pub trait Raster {
	/// The number of columns
	fn width(&self) -> u32;

	/// The number of rows
	fn height(&self) -> u32;

	/// The color at column `x` and row `y`
	///
	/// Implementations may panic if `x >= width` or `y >= height`.
	fn get(&self, x: u32, y: u32) -> Srgb<u8>;

	/// The total number of pixels, or `None` if it does not fit in a `u32`
	fn num_pixels(&self) -> Option<u32> {
		self.width().checked_mul(self.height())
	}
}

/// An owned, row-major buffer of Srgb pixels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbRaster {
	/// Number of columns
	width: u32,
	/// Number of rows
	height: u32,
	/// `width * height` pixels, one row after another
	pixels: Vec<Srgb<u8>>,
}

impl RgbRaster {
	/// Wrap a row-major pixel buffer.
	///
	/// Returns [`QuantizeError::DimensionMismatch`] unless `pixels.len() == width * height`.
	pub fn new(width: u32, height: u32, pixels: Vec<Srgb<u8>>) -> Result<Self, QuantizeError> {
		let expected = u64::from(width) * u64::from(height);
		if u64::try_from(pixels.len()).map_or(true, |len| len != expected) {
			return Err(QuantizeError::DimensionMismatch { len: pixels.len(), width, height });
		}

		Ok(Self { width, height, pixels })
	}

	/// Create a raster by calling `f(x, y)` for each pixel
	pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> Srgb<u8>) -> Self {
		let mut pixels = Vec::with_capacity(width as usize * height as usize);
		for y in 0..height {
			for x in 0..width {
				pixels.push(f(x, y));
			}
		}

		Self { width, height, pixels }
	}

	/// The pixels in row-major order
	#[must_use]
	pub fn pixels(&self) -> &[Srgb<u8>] {
		&self.pixels
	}

	/// Take the pixel buffer
	#[must_use]
	pub fn into_pixels(self) -> Vec<Srgb<u8>> {
		self.pixels
	}

	/// Convert into an [`RgbImage`] for encoding with the `image` crate
	#[must_use]
	pub fn into_rgbimage(self) -> RgbImage {
		ImageBuffer::from_fn(self.width, self.height, |x, y| {
			let Srgb { red, green, blue, .. } = self.get(x, y);
			Rgb([red, green, blue])
		})
	}
}

impl Raster for RgbRaster {
	fn width(&self) -> u32 {
		self.width
	}

	fn height(&self) -> u32 {
		self.height
	}

	fn get(&self, x: u32, y: u32) -> Srgb<u8> {
		debug_assert!(x < self.width && y < self.height, "({x}, {y}) is outside {}x{}", self.width, self.height);
		self.pixels[y as usize * self.width as usize + x as usize]
	}
}

impl From<RgbRaster> for RgbImage {
	fn from(raster: RgbRaster) -> Self {
		raster.into_rgbimage()
	}
}

impl<C> Raster for ImageBuffer<Rgb<u8>, C>
where
	C: Deref<Target = [u8]>,
{
	fn width(&self) -> u32 {
		ImageBuffer::width(self)
	}

	fn height(&self) -> u32 {
		ImageBuffer::height(self)
	}

	fn get(&self, x: u32, y: u32) -> Srgb<u8> {
		let Rgb([r, g, b]) = *self.get_pixel(x, y);
		Srgb::new(r, g, b)
	}
}
