//! Reduce the colors of an image by clustering its distinct colors along a minimum spanning tree.

#![deny(unsafe_code, unsafe_op_in_unsafe_fn)]
#![warn(
    clippy::pedantic,
    clippy::cargo,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,
    clippy::unwrap_in_result,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::string_slice,
    missing_docs,
    clippy::missing_docs_in_private_items,
    rustdoc::all,
    clippy::float_cmp_const,
    clippy::lossy_float_literal
)]
#![allow(
    clippy::doc_markdown,
    clippy::module_name_repetitions,
    clippy::missing_panics_doc,
    clippy::unreadable_literal
)]

mod cli;

#[allow(clippy::wildcard_imports)]
use cli::*;

use std::{
    fmt::{self, Display},
    path::Path,
    process::ExitCode,
    time::Instant,
};

use clap::Parser;
use colored::Colorize;
use image::{DynamicImage, GenericImageView, RgbImage};
use log::{info, LevelFilter};
use palette::{FromColor, Okhsl, Oklab, Srgb};
use treequant::{QuantizeError, Quantized};

/// Record the running time of a function and log the elapsed time
macro_rules! time {
    ($name: literal, $func_call: expr) => {{
        let start = Instant::now();
        let result = $func_call;
        info!("{} took {}ms", $name, start.elapsed().as_millis());
        result
    }};
}

/// Error cases for loading, quantizing, and saving an image
#[derive(Debug)]
enum AppError {
    /// Failed to read or decode the image file
    ImageLoad(image::ImageError),
    /// The image could not be quantized with the given options
    Quantize(QuantizeError),
    /// Failed to encode or write the quantized image
    ImageSave(image::ImageError),
}

impl Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::ImageLoad(e) => write!(f, "Failed to load the image file: {e}"),
            AppError::Quantize(e) => write!(f, "Failed to quantize the image: {e}"),
            AppError::ImageSave(e) => write!(f, "Failed to save the quantized image: {e}"),
        }
    }
}

fn main() -> ExitCode {
    let options = Options::parse();

    init_logger(options.verbose);

    let result = run_quantize_and_print_palette(&options);

    // Returning Result<_> uses Debug printing instead of Display
    if let Err(e) = result {
        eprintln!("{e}");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Log warnings by default, or info with `--verbose`, unless overridden by `RUST_LOG`
fn init_logger(verbose: bool) {
    let level = if verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

/// Builds a thread pool and then runs `quantize_and_print_palette`
#[cfg(feature = "threads")]
fn run_quantize_and_print_palette(options: &Options) -> Result<(), AppError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(usize::from(options.threads))
        .build()
        .expect("initialized thread pool");

    pool.install(|| quantize_and_print_palette(options))
}

/// Runs `quantize_and_print_palette` on a single thread
#[cfg(not(feature = "threads"))]
fn run_quantize_and_print_palette(options: &Options) -> Result<(), AppError> {
    quantize_and_print_palette(options)
}

/// Load an image, quantize it, save the result, and print the palette using the given options
fn quantize_and_print_palette(options: &Options) -> Result<(), AppError> {
    // Input
    let img = time!("Image loading", load_image(&options.image))?;
    let img = generate_thumbnail(img, options.max_pixels);
    let img = img.into_rgb8();

    // Processing
    let result = {
        let start = Instant::now();
        let result = run_quantize(&img, options)?;
        info!(
            "Quantization took {}ms in total",
            start.elapsed().as_millis()
        );
        result
    };

    info!("Distinct colors: {}", result.distinct_colors);
    info!("MST total weight: {}", result.mst_weight);

    // Output
    let Quantized {
        raster,
        palette,
        counts,
        ..
    } = result;

    if let Some(path) = &options.save {
        time!("Image saving", save_image(raster.into_rgbimage(), path))?;
    }

    if !options.no_palette {
        let colors = sorted_colors(&palette, &counts, options);
        print_palette(&colors, options);
    }

    Ok(())
}

/// Load the image at the given path
fn load_image(path: &Path) -> Result<DynamicImage, AppError> {
    image::open(path).map_err(AppError::ImageLoad)
}

/// Save the image to the given path in the format given by its extension
fn save_image(image: RgbImage, path: &Path) -> Result<(), AppError> {
    image.save(path).map_err(AppError::ImageSave)
}

/// Create a thumbnail with at most `max_pixels` pixels if the image has more than `max_pixels` pixels
fn generate_thumbnail(image: DynamicImage, max_pixels: u32) -> DynamicImage {
    // The number of pixels should be < u64::MAX, since image dimensions are (u32, u32)
    let (width, height) = image.dimensions();
    let pixels = u64::from(width) * u64::from(height);
    if pixels <= u64::from(max_pixels) {
        info!("Skipping image thumbnail since pixels was below max pixels");
        image
    } else {
        // (u64 as f64) only gives innaccurate results for very large u64
        // I.e, only when pixels is in the order of quintillions
        #[allow(clippy::cast_precision_loss)]
        let scale = (f64::from(max_pixels) / pixels as f64).sqrt();

        // multiplying by a positive factor < 1
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (thumb_width, thumb_height) = (
            (f64::from(width) * scale) as u32,
            (f64::from(height) * scale) as u32,
        );

        info!("Creating a thumbnail with dimensions {thumb_width}x{thumb_height}");

        time!("Image thumbnail", image.thumbnail(thumb_width, thumb_height))
    }
}

/// Quantize the image on the current thread
#[cfg(not(feature = "threads"))]
fn run_quantize(image: &RgbImage, options: &Options) -> Result<Quantized, AppError> {
    treequant::quantize(image, options.k, options.lookup.into()).map_err(AppError::Quantize)
}

/// Quantize the image, in parallel unless limited to a single thread
#[cfg(feature = "threads")]
fn run_quantize(image: &RgbImage, options: &Options) -> Result<Quantized, AppError> {
    let result = if options.threads == 1 {
        treequant::quantize(image, options.k, options.lookup.into())
    } else {
        treequant::quantize_par(image, options.k, options.lookup.into())
    };

    result.map_err(AppError::Quantize)
}

/// Sort the palette colors by the given metric, using [`Okhsl`] for the h, s, and l orders.
fn sorted_colors(palette: &[Srgb<u8>], counts: &[u32], options: &Options) -> Vec<Srgb<u8>> {
    let mut colors = palette
        .iter()
        .map(|&color| {
            let oklab = Oklab::from_color(color.into_linear::<f32>());
            (color, Okhsl::from_color(oklab))
        })
        .zip(counts)
        .collect::<Vec<_>>();

    match options.sort {
        SortOutput::H => colors.sort_by(|((_, x), _), ((_, y), _)| {
            f32::total_cmp(&x.hue.into_positive_degrees(), &y.hue.into_positive_degrees())
        }),
        SortOutput::S => {
            colors.sort_by(|((_, x), _), ((_, y), _)| f32::total_cmp(&x.saturation, &y.saturation));
        }
        SortOutput::L => {
            colors.sort_by(|((_, x), _), ((_, y), _)| f32::total_cmp(&x.lightness, &y.lightness));
        }
        SortOutput::N => colors.sort_by_key(|&(_, &count)| std::cmp::Reverse(count)),
    }

    if options.reverse {
        colors.reverse();
    }

    colors.into_iter().map(|((color, _), _)| color).collect()
}

/// Print the given colors based off the provided options
fn print_palette(colors: &[Srgb<u8>], options: &Options) {
    match options.output {
        FormatOutput::Hex => color_format_print(colors, options, " ", |color| format!("{color:X}")),

        FormatOutput::Rgb => color_format_print(colors, options, " ", |color| {
            format!("({},{},{})", color.red, color.green, color.blue)
        }),

        FormatOutput::Swatch => print_colors(colors, "", |color| {
            "   "
                .on_truecolor(color.red, color.green, color.blue)
                .to_string()
        }),
    }
}

/// Print a line of colors using the given format
fn print_colors(colors: &[Srgb<u8>], delimiter: &str, format: impl Fn(Srgb<u8>) -> String) {
    println!(
        "{}",
        colors
            .iter()
            .map(|&color| format(color))
            .collect::<Vec<_>>()
            .join(delimiter)
    );
}

/// Format, colorize, and then print the text for all colors
fn color_format_print(
    colors: &[Srgb<u8>],
    options: &Options,
    delimiter: &str,
    format: impl Fn(Srgb<u8>) -> String,
) {
    match options.colorize {
        Some(ColorizeOutput::Fg) => print_colors(colors, delimiter, |color| {
            format(color)
                .truecolor(color.red, color.green, color.blue)
                .to_string()
        }),

        Some(ColorizeOutput::Bg) => print_colors(colors, delimiter, |color| {
            format(color)
                .on_truecolor(color.red, color.green, color.blue)
                .to_string()
        }),

        None => print_colors(colors, delimiter, format),
    }
}
