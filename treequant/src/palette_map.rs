//! Representative colors for each cluster and remapping of rasters onto them

use crate::{
	catalog::{packed_id, ColorIndex},
	Clusters, ColorCatalog, QuantizeError, Raster, RgbRaster,
};
use palette::Srgb;

/// The componentwise floor of the mean of the given colors
#[allow(clippy::cast_possible_truncation)]
fn mean_color(colors: &[Srgb<u8>], ids: &[u32]) -> Srgb<u8> {
	let (mut r, mut g, mut b) = (0_u64, 0_u64, 0_u64);
	for &id in ids {
		let color = colors[id as usize];
		r += u64::from(color.red);
		g += u64::from(color.green);
		b += u64::from(color.blue);
	}

	let n = ids.len() as u64;
	// the mean of u8 values is a u8
	Srgb::new((r / n) as u8, (g / n) as u8, (b / n) as u8)
}

/// The mapping from every color of a [`ColorCatalog`] to the representative color of its cluster
///
/// Each representative is the componentwise mean of the distinct colors in its cluster,
/// rounded down. Colors are weighted equally no matter how many pixels they cover.
#[derive(Debug, Clone)]
pub struct PaletteMap {
	/// Packed color -> cluster
	index: ColorIndex,
	/// The representative color of each cluster
	palette: Vec<Srgb<u8>>,
	/// The number of pixels in each cluster
	counts: Vec<u32>,
}

impl PaletteMap {
	/// Compute the representative colors of `clusters` and build the color lookup.
	///
	/// The catalog is consumed and its lookup table is reused for the new mapping.
	///
	/// Returns [`QuantizeError::ClusterMismatch`] unless `clusters` assigns exactly one cluster
	/// to every color of `catalog`, as it does when extracted from a tree built on that catalog.
	pub fn new(catalog: ColorCatalog, clusters: &Clusters) -> Result<Self, QuantizeError> {
		// at most 2^24 ids
		#[allow(clippy::cast_possible_truncation)]
		let assigned = clusters.assignments().len() as u32;
		if assigned != catalog.len() {
			return Err(QuantizeError::ClusterMismatch { assigned, colors: catalog.len() });
		}

		let ColorCatalog { colors, counts: color_counts, mut index } = catalog;

		let palette = clusters.iter().map(|ids| mean_color(&colors, ids)).collect::<Vec<_>>();

		let mut counts = vec![0_u32; palette.len()];
		for ((&color, &count), &cluster) in colors.iter().zip(&color_counts).zip(clusters.assignments()) {
			index.insert(packed_id(color), cluster);
			// the sum of all counts is at most the number of pixels, which fits in a u32
			counts[cluster as usize] += count;
		}

		Ok(Self { index, palette, counts })
	}

	/// The representative color of each cluster
	#[must_use]
	pub fn palette(&self) -> &[Srgb<u8>] {
		&self.palette
	}

	/// The number of pixels in each cluster
	#[must_use]
	pub fn counts(&self) -> &[u32] {
		&self.counts
	}

	/// Consume the map, returning the palette and pixel counts
	#[must_use]
	pub fn into_parts(self) -> (Vec<Srgb<u8>>, Vec<u32>) {
		(self.palette, self.counts)
	}

	/// The number of clusters
	#[must_use]
	#[allow(clippy::cast_possible_truncation)]
	pub fn len(&self) -> u32 {
		self.palette.len() as u32
	}

	/// Whether the palette has no colors
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.palette.is_empty()
	}

	/// The cluster of `color`, if it was part of the catalog
	#[must_use]
	pub fn index_of(&self, color: Srgb<u8>) -> Option<u32> {
		self.index.get(packed_id(color))
	}

	/// The representative color for `color`, if it was part of the catalog
	#[must_use]
	pub fn lookup(&self, color: Srgb<u8>) -> Option<Srgb<u8>> {
		self.index_of(color).map(|cluster| self.palette[cluster as usize])
	}

	/// The representative color for `color` or an [`QuantizeError::UnmappedColor`]
	#[inline]
	fn map_color(&self, color: Srgb<u8>) -> Result<Srgb<u8>, QuantizeError> {
		self.lookup(color).ok_or(QuantizeError::UnmappedColor {
			red: color.red,
			green: color.green,
			blue: color.blue,
		})
	}

	/// Replace every pixel of `raster` with its representative color, returning a new raster.
	///
	/// Returns [`QuantizeError::UnmappedColor`] if the raster has a color the map was not built from.
	pub fn apply(&self, raster: &impl Raster) -> Result<RgbRaster, QuantizeError> {
		let (width, height) = (raster.width(), raster.height());
		let mut pixels = Vec::with_capacity(width as usize * height as usize);
		for y in 0..height {
			for x in 0..width {
				pixels.push(self.map_color(raster.get(x, y))?);
			}
		}

		RgbRaster::new(width, height, pixels)
	}

	/// Same as [`PaletteMap::apply`], but rows are remapped in parallel.
	#[cfg(feature = "threads")]
	pub fn apply_par<R: Raster + Sync>(&self, raster: &R) -> Result<RgbRaster, QuantizeError> {
		use rayon::prelude::*;

		let (width, height) = (raster.width(), raster.height());
		let mut pixels = vec![Srgb::new(0, 0, 0); width as usize * height as usize];
		if !pixels.is_empty() {
			pixels
				.par_chunks_mut(width as usize)
				.zip(0..height)
				.try_for_each(|(row, y)| {
					for (x, pixel) in (0..width).zip(row) {
						*pixel = self.map_color(raster.get(x, y))?;
					}
					Ok::<_, QuantizeError>(())
				})?;
		}

		RgbRaster::new(width, height, pixels)
	}
}
