//! Reduce the colors of an image by clustering its distinct colors along a minimum spanning tree.
//!
//! The quantizer runs four stages:
//! 1. [`ColorCatalog`] collects the distinct colors of the image in order of first occurrence.
//! 2. [`SpanningTree`] connects those colors with a minimum spanning tree under Euclidean RGB distance.
//! 3. [`Clusters`] cuts the `k - 1` heaviest tree edges, leaving `k` connected clusters.
//! 4. [`PaletteMap`] replaces each cluster by the mean of its colors and remaps the image.
//!
//! # Examples
//!
//! ## Read an image file and reduce it to 16 colors.
//!
//! ```no_run
//! use treequant::ColorLookup;
//!
//! let image = image::open("some image").unwrap().into_rgb8();
//! let result = treequant::quantize(&image, 16, ColorLookup::Dense).unwrap();
//! result.raster.into_rgbimage().save("some image with 16 colors.png").unwrap();
//! ```
//!
//! ## Run the stages separately to try several values of `k`.
//!
//! ```no_run
//! use treequant::{Clusters, ColorCatalog, ColorLookup, PaletteMap, SpanningTree};
//!
//! let image = image::open("some image").unwrap().into_rgb8();
//! let catalog = ColorCatalog::from_raster(&image, ColorLookup::Sparse).unwrap();
//! let tree = SpanningTree::build(&catalog).unwrap();
//!
//! let coarse = Clusters::extract(&tree, 4).unwrap();
//! let fine = Clusters::extract(&tree, 32).unwrap();
//!
//! let map = PaletteMap::new(catalog, &fine).unwrap();
//! let output = map.apply(&image).unwrap();
//! ```
//!
//! # Arguments
//!
//! ## K
//!
//! This is the number of colors in the output, and must be in `1..=N` where `N` is the number of distinct colors.
//! With `k = N` every color is its own cluster and the output equals the input.
//! With `k = 1` the whole image becomes a single color.
//!
//! Clusters are formed over distinct colors, not over pixels.
//! So, the representative of a cluster is the mean of its distinct colors,
//! and a color covering half of the image counts as much as a color covering a single pixel.
//!
//! ## Lookup
//!
//! [`ColorLookup::Dense`] uses a table covering all 2^24 colors (64 MiB) for guaranteed constant time lookups.
//! [`ColorLookup::Sparse`] uses a hash map instead, which needs far less memory for images with few colors
//! but has slower lookups. Both give identical results.
//!
//! # Running time
//!
//! Building the spanning tree takes O(N^2) time, so images with hundreds of thousands of distinct colors
//! take a while. With the `threads` feature, [`quantize_par`] spreads each step of the tree construction
//! and the final remapping across the rayon thread pool.

#![deny(unsafe_code)]
#![warn(clippy::pedantic, clippy::cargo)]
#![warn(clippy::use_debug, clippy::dbg_macro, clippy::todo, clippy::unimplemented)]
#![warn(clippy::unwrap_used, clippy::unwrap_in_result)]
#![warn(clippy::unneeded_field_pattern, clippy::rest_pat_in_fully_bound_structs)]
#![warn(clippy::unnecessary_self_imports)]
#![warn(clippy::str_to_string, clippy::string_to_string, clippy::string_slice)]
#![warn(missing_docs, clippy::missing_docs_in_private_items, rustdoc::all)]
#![warn(clippy::float_cmp_const, clippy::lossy_float_literal)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::unreadable_literal)]

use palette::Srgb;

mod catalog;
mod cluster;
mod error;
mod mst;
mod palette_map;
mod raster;

pub use catalog::{packed_id, ColorCatalog, ColorLookup};
pub use cluster::Clusters;
pub use error::QuantizeError;
pub use mst::SpanningTree;
pub use palette_map::PaletteMap;
pub use raster::{Raster, RgbRaster};

/// Result from running the quantizer
#[derive(Debug, Clone)]
pub struct Quantized {
	/// The remapped image, with the same dimensions as the input
	pub raster: RgbRaster,
	/// The representative color of each cluster
	pub palette: Vec<Srgb<u8>>,
	/// The number of pixels in each cluster
	pub counts: Vec<u32>,
	/// The number of distinct colors in the input
	pub distinct_colors: u32,
	/// The total edge weight of the minimum spanning tree
	pub mst_weight: f64,
}

/// Check that `k` clusters can be made from the catalog before any tree is built
fn validate(catalog: &ColorCatalog, k: u32) -> Result<(), QuantizeError> {
	let n = catalog.len();
	log::debug!("Found {n} distinct colors");

	if n == 0 {
		Err(QuantizeError::EmptyCatalog)
	} else if k == 0 || k > n {
		Err(QuantizeError::InvalidClusterCount { k, colors: n })
	} else {
		Ok(())
	}
}

/// Run the stages after the catalog has been validated
fn finish(
	catalog: ColorCatalog,
	k: u32,
	build: impl FnOnce(&ColorCatalog) -> Result<SpanningTree, QuantizeError>,
	apply: impl FnOnce(&PaletteMap) -> Result<RgbRaster, QuantizeError>,
) -> Result<Quantized, QuantizeError> {
	let distinct_colors = catalog.len();

	let tree = build(&catalog)?;
	let mst_weight = tree.total_weight();
	log::debug!("Minimum spanning tree has total weight {mst_weight}");

	let clusters = Clusters::extract(&tree, k)?;
	drop(tree);

	let map = PaletteMap::new(catalog, &clusters)?;
	let raster = apply(&map)?;
	let (palette, counts) = map.into_parts();

	Ok(Quantized { raster, palette, counts, distinct_colors, mst_weight })
}

/// Reduce `raster` to `k` colors.
///
/// See the crate documentation for examples and information on each argument.
///
/// # Errors
/// Returns [`QuantizeError::EmptyCatalog`] if the raster has no pixels,
/// [`QuantizeError::InvalidClusterCount`] if `k` is not in `1..=N`,
/// and [`QuantizeError::TooManyPixels`] if the raster has more than `u32::MAX` pixels.
pub fn quantize(raster: &impl Raster, k: u32, lookup: ColorLookup) -> Result<Quantized, QuantizeError> {
	let catalog = ColorCatalog::from_raster(raster, lookup)?;
	validate(&catalog, k)?;
	finish(catalog, k, SpanningTree::build, |map| map.apply(raster))
}

/// Reduce `raster` to `k` colors, building the tree and remapping the raster in parallel.
///
/// The result is identical to [`quantize`].
///
/// # Errors
/// Same as [`quantize`].
#[cfg(feature = "threads")]
pub fn quantize_par<R: Raster + Sync>(raster: &R, k: u32, lookup: ColorLookup) -> Result<Quantized, QuantizeError> {
	let catalog = ColorCatalog::from_raster(raster, lookup)?;
	validate(&catalog, k)?;
	finish(catalog, k, SpanningTree::build_par, |map| map.apply_par(raster))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
	use super::*;
	use rand::{Rng, SeedableRng};

	/// A raster with a few hundred distinct colors, some of them repeated
	fn test_raster(seed: u64) -> RgbRaster {
		let mut rng = rand_xoshiro::Xoshiro256PlusPlus::seed_from_u64(seed);
		let colors = (0..300)
			.map(|_| Srgb::new(rng.gen(), rng.gen(), rng.gen()))
			.collect::<Vec<Srgb<u8>>>();

		RgbRaster::from_fn(40, 30, |_, _| colors[rng.gen_range(0..colors.len())])
	}

	fn chain_raster() -> RgbRaster {
		let (a, b, c, d) = (
			Srgb::new(100, 50, 0),
			Srgb::new(105, 50, 0),
			Srgb::new(113, 50, 0),
			Srgb::new(133, 50, 0),
		);
		RgbRaster::new(4, 2, vec![a, b, c, d, d, c, b, a]).unwrap()
	}

	#[test]
	fn chain_k2() {
		let result = quantize(&chain_raster(), 2, ColorLookup::Dense).unwrap();
		let (abc, d) = (Srgb::new(106, 50, 0), Srgb::new(133, 50, 0));

		assert_eq!(result.distinct_colors, 4);
		assert!((result.mst_weight - 33.0).abs() < 1e-9);
		assert_eq!(result.palette, vec![abc, d]);
		assert_eq!(result.counts, vec![6, 2]);
		assert_eq!(result.raster.pixels(), &[abc, abc, abc, d, d, abc, abc, abc]);
	}

	#[test]
	fn chain_k3() {
		let result = quantize(&chain_raster(), 3, ColorLookup::Sparse).unwrap();
		let (ab, c, d) = (Srgb::new(102, 50, 0), Srgb::new(113, 50, 0), Srgb::new(133, 50, 0));

		assert_eq!(result.palette, vec![ab, c, d]);
		assert_eq!(result.raster.pixels(), &[ab, ab, c, d, d, c, ab, ab]);
	}

	#[test]
	fn k_equals_n_is_identity() {
		let raster = test_raster(1);
		let n = ColorCatalog::from_raster(&raster, ColorLookup::Sparse).unwrap().len();
		let result = quantize(&raster, n, ColorLookup::Dense).unwrap();

		assert_eq!(result.raster, raster);
		assert_eq!(result.palette.len(), n as usize);
	}

	#[test]
	fn k1_is_mean_of_distinct_colors() {
		// black covers 3 pixels and white 1, but each distinct color counts once
		let (black, white) = (Srgb::new(0, 0, 0), Srgb::new(255, 255, 255));
		let raster = RgbRaster::new(2, 2, vec![black, black, black, white]).unwrap();
		let result = quantize(&raster, 1, ColorLookup::Dense).unwrap();

		let gray = Srgb::new(127, 127, 127);
		assert_eq!(result.palette, vec![gray]);
		assert_eq!(result.counts, vec![4]);
		assert!(result.raster.pixels().iter().all(|&pixel| pixel == gray));
	}

	#[test]
	fn output_has_exactly_k_colors() {
		let raster = test_raster(2);
		for k in [1, 2, 7, 64] {
			let result = quantize(&raster, k, ColorLookup::Dense).unwrap();

			let mut catalog = ColorCatalog::new(ColorLookup::Sparse);
			for &pixel in result.raster.pixels() {
				catalog.insert_or_get(pixel);
			}

			// clusters of random colors do not share a mean color
			assert_eq!(catalog.len(), k);
			assert_eq!(result.counts.iter().sum::<u32>(), 40 * 30);
		}
	}

	#[test]
	fn representatives_are_floored_means() {
		let raster = test_raster(3);
		let catalog = ColorCatalog::from_raster(&raster, ColorLookup::Dense).unwrap();
		let tree = SpanningTree::build(&catalog).unwrap();
		let clusters = Clusters::extract(&tree, 10).unwrap();
		let colors = catalog.colors().to_vec();
		let map = PaletteMap::new(catalog, &clusters).unwrap();

		for (members, &representative) in clusters.iter().zip(map.palette()) {
			let n = members.len() as u64;
			let sum = |channel: fn(Srgb<u8>) -> u8| -> u64 {
				members.iter().map(|&id| u64::from(channel(colors[id as usize]))).sum()
			};

			assert_eq!(u64::from(representative.red), sum(|c| c.red) / n);
			assert_eq!(u64::from(representative.green), sum(|c| c.green) / n);
			assert_eq!(u64::from(representative.blue), sum(|c| c.blue) / n);
		}
	}

	#[test]
	fn deterministic() {
		let raster = test_raster(4);

		let first = quantize(&raster, 12, ColorLookup::Dense).unwrap();
		let second = quantize(&raster, 12, ColorLookup::Dense).unwrap();
		assert_eq!(first.raster, second.raster);
		assert_eq!(first.palette, second.palette);

		let clusters = |raster: &RgbRaster| {
			let catalog = ColorCatalog::from_raster(raster, ColorLookup::Dense).unwrap();
			Clusters::extract(&SpanningTree::build(&catalog).unwrap(), 12).unwrap()
		};
		assert_eq!(clusters(&raster), clusters(&raster));
	}

	#[test]
	fn dense_and_sparse_agree() {
		let raster = test_raster(5);
		let dense = quantize(&raster, 20, ColorLookup::Dense).unwrap();
		let sparse = quantize(&raster, 20, ColorLookup::Sparse).unwrap();

		assert_eq!(dense.raster, sparse.raster);
		assert_eq!(dense.palette, sparse.palette);
		assert_eq!(dense.counts, sparse.counts);
	}

	#[test]
	#[cfg(feature = "threads")]
	fn parallel_agrees_with_sequential() {
		let raster = test_raster(6);
		let sequential = quantize(&raster, 20, ColorLookup::Dense).unwrap();
		let parallel = quantize_par(&raster, 20, ColorLookup::Dense).unwrap();

		assert_eq!(sequential.raster, parallel.raster);
		assert_eq!(sequential.palette, parallel.palette);
		#[allow(clippy::float_cmp)]
		{
			assert_eq!(sequential.mst_weight, parallel.mst_weight);
		}
	}

	#[test]
	fn invalid_cluster_counts() {
		let raster = chain_raster();
		for k in [0, 5] {
			assert_eq!(
				quantize(&raster, k, ColorLookup::Sparse).unwrap_err(),
				QuantizeError::InvalidClusterCount { k, colors: 4 }
			);
		}
	}

	#[test]
	fn empty_raster() {
		for (width, height) in [(0, 0), (0, 5), (5, 0)] {
			let raster = RgbRaster::new(width, height, Vec::new()).unwrap();
			assert_eq!(
				quantize(&raster, 1, ColorLookup::Sparse).unwrap_err(),
				QuantizeError::EmptyCatalog
			);
		}
	}

	#[test]
	fn image_buffers_are_rasters() {
		let image = image::RgbImage::from_fn(8, 8, |x, y| {
			if (x + y) % 2 == 0 {
				image::Rgb([255, 0, 0])
			} else {
				image::Rgb([0, 0, 255])
			}
		});
		let result = quantize(&image, 1, ColorLookup::Sparse).unwrap();

		assert_eq!(result.distinct_colors, 2);
		assert_eq!(result.palette, vec![Srgb::new(127, 0, 127)]);
	}
}
