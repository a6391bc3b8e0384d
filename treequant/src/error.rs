//! Error cases shared by every stage of the quantization pipeline

use thiserror::Error;

/// Reasons a quantization call can fail
///
/// Every error is terminal for the call that produced it: no partial output is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantizeError {
	/// The raster contained no pixels, so there are no colors to cluster
	#[error("the image has no pixels and therefore no colors to quantize")]
	EmptyCatalog,

	/// The requested number of colors was zero or more than the number of distinct colors
	#[error("cannot reduce {colors} distinct colors to {k} colors, k must be in 1..={colors}")]
	InvalidClusterCount {
		/// The requested number of clusters
		k: u32,
		/// The number of distinct colors in the image
		colors: u32,
	},

	/// The raster has more pixels than can be counted in a `u32`
	#[error("a {width}x{height} image has more than u32::MAX pixels")]
	TooManyPixels {
		/// Width of the raster
		width: u32,
		/// Height of the raster
		height: u32,
	},

	/// A pixel buffer did not hold exactly `width * height` pixels
	#[error("pixel buffer length {len} does not match dimensions {width}x{height}")]
	DimensionMismatch {
		/// Length of the provided buffer
		len: usize,
		/// Requested width
		width: u32,
		/// Requested height
		height: u32,
	},

	/// The clusters were extracted from a tree over a different number of colors than the catalog holds
	#[error("the clusters cover {assigned} colors but the catalog has {colors} colors")]
	ClusterMismatch {
		/// The number of ids assigned to a cluster
		assigned: u32,
		/// The number of distinct colors in the catalog
		colors: u32,
	},

	/// A palette map was applied to a raster holding a color it was not built from
	#[error("the color ({red},{green},{blue}) is not part of the palette map")]
	UnmappedColor {
		/// Red component
		red: u8,
		/// Green component
		green: u8,
		/// Blue component
		blue: u8,
	},
}
