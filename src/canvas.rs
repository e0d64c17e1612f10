use std::path::{Path, PathBuf};

use anyhow::Context as _;
use image::{DynamicImage, Rgba, RgbaImage, imageops};

use crate::{
    error::{SlidereelError, SlidereelResult},
    options::ResizeRequest,
};

/// Decode every input, pick the target canvas, and write canvas-normalized
/// PNGs into `dir`. Returned paths line up with `sources` by index.
///
/// The target defaults to the largest input's dimensions; a single requested
/// axis scales the other proportionally. Both axes are rounded up to even,
/// which yuv420p output requires.
pub fn prepare_images(
    sources: &[PathBuf],
    resize: &ResizeRequest,
    dir: &Path,
) -> SlidereelResult<Vec<PathBuf>> {
    if sources.is_empty() {
        return Err(SlidereelError::validation("no images provided"));
    }

    let mut decoded = Vec::with_capacity(sources.len());
    let mut max_width = 0u32;
    let mut max_height = 0u32;
    for source in sources {
        let img = image::open(source)
            .with_context(|| format!("failed to decode image '{}'", source.display()))?;
        max_width = max_width.max(img.width());
        max_height = max_height.max(img.height());
        decoded.push(img);
    }

    let (target_width, target_height) = target_dimensions(max_width, max_height, resize)?;

    let mut prepared = Vec::with_capacity(decoded.len());
    for (i, img) in decoded.iter().enumerate() {
        let canvas = fit_to_canvas(img, target_width, target_height);
        let path = dir.join(format!("{:04}.png", i + 1));
        canvas
            .save(&path)
            .with_context(|| format!("failed to write image '{}'", path.display()))?;
        prepared.push(path);
    }

    Ok(prepared)
}

fn even_up(v: u32) -> u32 {
    if v.is_multiple_of(2) { v } else { v + 1 }
}

fn target_dimensions(
    max_width: u32,
    max_height: u32,
    resize: &ResizeRequest,
) -> SlidereelResult<(u32, u32)> {
    if max_width == 0 || max_height == 0 {
        return Err(SlidereelError::validation(
            "could not determine input image dimensions",
        ));
    }

    Ok(match (resize.width, resize.height) {
        (None, None) => (even_up(max_width), even_up(max_height)),
        (Some(width), Some(height)) => (width, height),
        (Some(width), None) => {
            let height = (width as f64 / max_width as f64 * max_height as f64) as u32;
            (width, even_up(height))
        }
        (None, Some(height)) => {
            let width = (height as f64 / max_height as f64 * max_width as f64) as u32;
            (even_up(width), height)
        }
    })
}

/// Contain-fit `img` onto a black canvas of the target size.
fn fit_to_canvas(img: &DynamicImage, target_width: u32, target_height: u32) -> RgbaImage {
    if img.width() == target_width && img.height() == target_height {
        return img.to_rgba8();
    }

    let resized = img.resize(
        target_width,
        target_height,
        imageops::FilterType::Lanczos3,
    );

    let mut canvas = RgbaImage::from_pixel(target_width, target_height, Rgba([0, 0, 0, 255]));
    let x = (target_width - resized.width()) / 2;
    let y = (target_height - resized.height()) / 2;
    imageops::overlay(&mut canvas, &resized.to_rgba8(), x as i64, y as i64);
    canvas
}
