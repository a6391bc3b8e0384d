//! Specifies the CLI and handles arg parsing

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use treequant::ColorLookup;

/// Supported output formats for the palette colors
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum FormatOutput {
	/// sRGB hexcode
	Hex,
	/// sRGB (r,g,b) triple
	Rgb,
	/// Whitespace with true color background
	Swatch,
}

/// Sort orders for the palette colors
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum SortOutput {
	/// Ascending hue
	H,
	/// Ascending saturation
	S,
	/// Ascending lightness
	L,
	/// Descending number of pixels
	N,
}

/// Ways to colorize the output text
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorizeOutput {
	/// Foreground
	Fg,
	/// Background
	Bg,
}

/// Strategies for looking up colors during quantization
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LookupOption {
	/// A table over every 24-bit color (64 MiB), constant time lookups
	Dense,
	/// A hash map sized to the number of distinct colors
	Sparse,
}

impl From<LookupOption> for ColorLookup {
	fn from(lookup: LookupOption) -> Self {
		match lookup {
			LookupOption::Dense => ColorLookup::Dense,
			LookupOption::Sparse => ColorLookup::Sparse,
		}
	}
}

/// Reduce an image to k colors by cutting the heaviest edges of a minimum spanning tree over its distinct colors.
///
/// The distinct colors of the image are connected by a minimum spanning tree using Euclidean RGB distance.
/// Removing the k - 1 longest edges splits the colors into k clusters,
/// and every pixel is replaced by the average of the colors in its cluster.
#[allow(clippy::struct_excessive_bools)]
#[derive(Parser, Debug)]
#[command(version)]
pub struct Options {
	/// The path to the input image
	pub image: PathBuf,

	/// Where to save the quantized image, the format is chosen by the file extension
	///
	/// If no path is given, only the palette is printed.
	pub save: Option<PathBuf>,

	/// The number of colors to reduce the image to
	///
	/// This must be at least 1 and at most the number of distinct colors in the image.
	#[arg(short, default_value_t = 8)]
	pub k: u32,

	/// How colors are looked up
	///
	/// The dense table gives the fastest lookups at a fixed memory cost,
	/// whereas the sparse map uses memory proportional to the number of distinct colors.
	#[arg(long, default_value = "dense")]
	pub lookup: LookupOption,

	/// The maximum image size, in number of pixels, before a thumbnail is created
	///
	/// Building the spanning tree takes time quadratic in the number of distinct colors,
	/// so this option can be used to trade accuracy for speed on large photos.
	/// Note that the saved image will have the dimensions of the thumbnail.
	#[arg(short = 'p', long, default_value_t = u32::MAX)]
	pub max_pixels: u32,

	/// The format to print the palette colors in
	#[arg(short, long, default_value = "hex")]
	pub output: FormatOutput,

	/// Color the foreground or background for each printed color
	#[arg(short, long)]
	pub colorize: Option<ColorizeOutput>,

	/// The order to print the colors in
	///
	/// The h, s, and l options below refer to Okhsl component values and not the HSL color space.
	#[arg(short, long, default_value = "n")]
	pub sort: SortOutput,

	/// Reverse the printed order of the colors
	#[arg(short, long)]
	pub reverse: bool,

	/// Do not print the palette
	#[arg(long)]
	pub no_palette: bool,

	/// The number of threads to use
	///
	/// A value of 0 lets the thread pool decide, and 1 runs every step on the current thread.
	#[cfg(feature = "threads")]
	#[arg(short, long, default_value_t = 0)]
	pub threads: u8,

	/// Print additional information, such as the number of distinct colors and the time taken by each step
	#[arg(long)]
	pub verbose: bool,
}
