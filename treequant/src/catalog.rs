//! Deduplication of raster colors into a catalog of distinct colors

use crate::{QuantizeError, Raster};
use palette::Srgb;
use std::collections::HashMap;

/// The number of possible 24-bit colors
pub(crate) const COLOR_SPACE: usize = 1 << 24;

/// Pack a color into `r + g * 256 + b * 256^2`, a unique value in `0..2^24`
#[must_use]
pub fn packed_id(color: Srgb<u8>) -> u32 {
	u32::from(color.red) | u32::from(color.green) << 8 | u32::from(color.blue) << 16
}

/// How colors are looked up while building a [`ColorCatalog`] and a [`crate::PaletteMap`]
///
/// `Dense` allocates a table covering the entire 24-bit color space (64 MiB of `u32`s),
/// which gives guaranteed O(1) lookups regardless of the image.
/// `Sparse` uses a hash map with memory proportional to the number of distinct colors,
/// trading some lookup speed for a much smaller footprint on images with few colors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ColorLookup {
	/// Direct-address table over all 2^24 packed colors
	#[default]
	Dense,
	/// Hash map from packed color to value
	Sparse,
}

/// A map from packed colors to `u32` values, backed by either strategy of [`ColorLookup`]
#[derive(Debug, Clone)]
pub(crate) enum ColorIndex {
	/// Value + 1 for each packed color, 0 marks an absent color
	Dense(Box<[u32]>),
	/// Packed color -> value
	Sparse(HashMap<u32, u32>),
}

impl ColorIndex {
	/// Create an empty index with the given lookup strategy
	pub(crate) fn new(lookup: ColorLookup) -> Self {
		match lookup {
			// A zeroed allocation is lazily mapped by the OS, so untouched pages cost nothing
			ColorLookup::Dense => Self::Dense(vec![0; COLOR_SPACE].into_boxed_slice()),
			ColorLookup::Sparse => Self::Sparse(HashMap::new()),
		}
	}

	/// The value stored for `key`, if any
	#[inline]
	pub(crate) fn get(&self, key: u32) -> Option<u32> {
		match self {
			Self::Dense(table) => table[key as usize].checked_sub(1),
			Self::Sparse(map) => map.get(&key).copied(),
		}
	}

	/// Store `value` for `key`, replacing any previous value
	///
	/// `value` must be less than `u32::MAX`.
	#[inline]
	pub(crate) fn insert(&mut self, key: u32, value: u32) {
		match self {
			Self::Dense(table) => table[key as usize] = value + 1,
			Self::Sparse(map) => {
				map.insert(key, value);
			},
		}
	}
}

/// The distinct colors of a raster in order of first occurrence
///
/// Each color is identified by its position in the catalog.
/// A catalog belongs to one quantization call; build a new one for every image.
#[derive(Debug, Clone)]
pub struct ColorCatalog {
	/// Distinct colors, indexed by id
	pub(crate) colors: Vec<Srgb<u8>>,
	/// The number of pixels that had each color
	pub(crate) counts: Vec<u32>,
	/// Packed color -> id
	pub(crate) index: ColorIndex,
}

impl ColorCatalog {
	/// Create an empty catalog using the given lookup strategy
	#[must_use]
	pub fn new(lookup: ColorLookup) -> Self {
		Self {
			colors: Vec::new(),
			counts: Vec::new(),
			index: ColorIndex::new(lookup),
		}
	}

	/// Scan every pixel of `raster` once, in row-major order, and collect its distinct colors.
	///
	/// Returns [`QuantizeError::TooManyPixels`] if the raster has more than `u32::MAX` pixels.
	pub fn from_raster(raster: &impl Raster, lookup: ColorLookup) -> Result<Self, QuantizeError> {
		let (width, height) = (raster.width(), raster.height());
		if raster.num_pixels().is_none() {
			return Err(QuantizeError::TooManyPixels { width, height });
		}

		let mut catalog = Self::new(lookup);
		for y in 0..height {
			for x in 0..width {
				let id = catalog.insert_or_get(raster.get(x, y));
				// cannot overflow, since there are at most u32::MAX pixels in total
				catalog.counts[id as usize] += 1;
			}
		}

		Ok(catalog)
	}

	/// Returns the id of `color`, assigning it the next id if it has not been seen before.
	///
	/// Pixel counts are only tracked by [`ColorCatalog::from_raster`].
	pub fn insert_or_get(&mut self, color: Srgb<u8>) -> u32 {
		let key = packed_id(color);
		if let Some(id) = self.index.get(key) {
			id
		} else {
			// len < 2^24 because there are only 2^24 possible colors
			#[allow(clippy::cast_possible_truncation)]
			let id = self.colors.len() as u32;
			self.index.insert(key, id);
			self.colors.push(color);
			self.counts.push(0);
			id
		}
	}

	/// The id of `color`, if it is in the catalog
	#[must_use]
	pub fn id_of(&self, color: Srgb<u8>) -> Option<u32> {
		self.index.get(packed_id(color))
	}

	/// The number of distinct colors
	#[must_use]
	#[allow(clippy::cast_possible_truncation)]
	pub fn len(&self) -> u32 {
		self.colors.len() as u32
	}

	/// Whether the catalog has no colors
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.colors.is_empty()
	}

	/// The color with the given id
	///
	/// # Panics
	/// Panics if `id >= self.len()`.
	#[must_use]
	pub fn color_at(&self, id: u32) -> Srgb<u8> {
		self.colors[id as usize]
	}

	/// All distinct colors, indexed by id
	#[must_use]
	pub fn colors(&self) -> &[Srgb<u8>] {
		&self.colors
	}

	/// The number of pixels of each distinct color, indexed by id
	#[must_use]
	pub fn counts(&self) -> &[u32] {
		&self.counts
	}
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
	use super::*;
	use crate::RgbRaster;

	fn test_raster() -> RgbRaster {
		let a = Srgb::new(10, 20, 30);
		let b = Srgb::new(200, 0, 0);
		let c = Srgb::new(10, 20, 31);
		RgbRaster::new(3, 2, vec![a, b, a, c, c, a]).unwrap()
	}

	#[test]
	fn packed_id_matches_formula() {
		let color = Srgb::new(1, 2, 3);
		assert_eq!(packed_id(color), 1 + 2 * 256 + 3 * 256 * 256);
		assert_eq!(packed_id(Srgb::new(255, 255, 255)), (1 << 24) - 1);
		assert_eq!(packed_id(Srgb::new(0, 0, 0)), 0);
	}

	fn first_occurrence_order(lookup: ColorLookup) {
		let catalog = ColorCatalog::from_raster(&test_raster(), lookup).unwrap();

		assert_eq!(catalog.len(), 3);
		assert_eq!(
			catalog.colors(),
			&[Srgb::new(10, 20, 30), Srgb::new(200, 0, 0), Srgb::new(10, 20, 31)]
		);
		assert_eq!(catalog.counts(), &[3, 1, 2]);
		assert_eq!(catalog.id_of(Srgb::new(10, 20, 31)), Some(2));
		assert_eq!(catalog.id_of(Srgb::new(1, 1, 1)), None);
		assert_eq!(catalog.color_at(1), Srgb::new(200, 0, 0));
	}

	#[test]
	fn dense_first_occurrence_order() {
		first_occurrence_order(ColorLookup::Dense);
	}

	#[test]
	fn sparse_first_occurrence_order() {
		first_occurrence_order(ColorLookup::Sparse);
	}

	#[test]
	fn insert_or_get_returns_existing_id() {
		let mut catalog = ColorCatalog::new(ColorLookup::Sparse);
		assert_eq!(catalog.insert_or_get(Srgb::new(0, 0, 0)), 0);
		assert_eq!(catalog.insert_or_get(Srgb::new(255, 255, 255)), 1);
		assert_eq!(catalog.insert_or_get(Srgb::new(0, 0, 0)), 0);
		assert_eq!(catalog.len(), 2);
	}

	#[test]
	fn dense_index_handles_extreme_keys() {
		let mut index = ColorIndex::new(ColorLookup::Dense);
		let last = packed_id(Srgb::new(255, 255, 255));

		assert_eq!(index.get(0), None);
		index.insert(0, 0);
		index.insert(last, 7);
		assert_eq!(index.get(0), Some(0));
		assert_eq!(index.get(last), Some(7));
	}

	#[test]
	fn empty_raster_gives_empty_catalog() {
		let raster = RgbRaster::new(0, 0, Vec::new()).unwrap();
		let catalog = ColorCatalog::from_raster(&raster, ColorLookup::Dense).unwrap();
		assert!(catalog.is_empty());
	}
}
