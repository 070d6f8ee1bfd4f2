use std::path::Path;

use fast_image_resize::{self as fir, images::Image as FirImage};

use crate::domain::ColorSummary;

/// Named reference colors an image's tiles are snapped to.
const PALETTE: &[(&str, [u8; 3])] = &[
    ("black", [0, 0, 0]),
    ("grey", [128, 128, 128]),
    ("white", [255, 255, 255]),
    ("red", [220, 30, 30]),
    ("orange", [245, 140, 20]),
    ("gold", [230, 190, 40]),
    ("yellow", [250, 240, 60]),
    ("lime", [150, 220, 40]),
    ("green", [40, 150, 50]),
    ("teal", [20, 140, 140]),
    ("cyan", [60, 210, 230]),
    ("blue", [40, 70, 200]),
    ("purple", [120, 50, 170]),
    ("magenta", [220, 50, 200]),
    ("pink", [245, 160, 190]),
    ("brown", [130, 80, 40]),
];

/// Grid resolution; the summary lists one color name per tile, row-major.
const GRID: u32 = 3;

/// Summarize an image as a 3x3 grid of named colors plus the most and the
/// least saturated tile colors. `None` if the image cannot be decoded.
pub fn color_summary(path: &Path) -> Option<ColorSummary> {
    let img = image::open(path).ok()?;
    let rgb = img.to_rgb8();

    let src = FirImage::from_vec_u8(rgb.width(), rgb.height(), rgb.into_raw(), fir::PixelType::U8x3)
        .ok()?;
    let mut dst = FirImage::new(GRID, GRID, fir::PixelType::U8x3);
    fir::Resizer::new().resize(&src, &mut dst, None).ok()?;

    let tiles: Vec<[u8; 3]> = dst
        .buffer()
        .chunks_exact(3)
        .map(|px| [px[0], px[1], px[2]])
        .collect();

    summarize(&tiles)
}

fn summarize(tiles: &[[u8; 3]]) -> Option<ColorSummary> {
    let named: Vec<(&'static str, [u8; 3])> = tiles
        .iter()
        .map(|&px| (nearest_name(px), px))
        .collect();

    // max_by/min_by return the last/first equal element; compare with the
    // index so ties resolve to the earliest tile either way.
    let vibrant = named
        .iter()
        .enumerate()
        .max_by(|(ia, (_, a)), (ib, (_, b))| {
            saturation(*a).total_cmp(&saturation(*b)).then(ib.cmp(ia))
        })
        .map(|(_, (name, _))| *name)?;
    let muted = named
        .iter()
        .enumerate()
        .min_by(|(ia, (_, a)), (ib, (_, b))| {
            saturation(*a).total_cmp(&saturation(*b)).then(ia.cmp(ib))
        })
        .map(|(_, (name, _))| *name)?;

    Some(ColorSummary {
        names: named.iter().map(|(name, _)| name.to_string()).collect(),
        vibrant: vibrant.to_string(),
        muted: muted.to_string(),
    })
}

fn nearest_name(px: [u8; 3]) -> &'static str {
    PALETTE
        .iter()
        .min_by_key(|(_, reference)| distance_sq(px, *reference))
        .map(|(name, _)| *name)
        .unwrap_or("black")
}

fn distance_sq(a: [u8; 3], b: [u8; 3]) -> u32 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = x as i32 - y as i32;
            (d * d) as u32
        })
        .sum()
}

/// HSV saturation scaled by value, so dark tiles never count as vibrant.
fn saturation(px: [u8; 3]) -> f32 {
    let max = *px.iter().max().unwrap_or(&0) as f32;
    let min = *px.iter().min().unwrap_or(&0) as f32;
    if max == 0.0 {
        return 0.0;
    }
    ((max - min) / max) * (max / 255.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_name() {
        assert_eq!(nearest_name([250, 10, 10]), "red");
        assert_eq!(nearest_name([5, 5, 5]), "black");
        assert_eq!(nearest_name([250, 250, 250]), "white");
        assert_eq!(nearest_name([30, 60, 210]), "blue");
    }

    #[test]
    fn test_summarize_picks_vibrant_and_muted() {
        let tiles = [
            [128, 128, 128],
            [220, 30, 30],
            [130, 130, 130],
            [128, 128, 128],
            [128, 128, 128],
            [128, 128, 128],
            [128, 128, 128],
            [128, 128, 128],
            [128, 128, 128],
        ];
        let summary = summarize(&tiles).unwrap();
        assert_eq!(summary.names.len(), 9);
        assert_eq!(summary.names[1], "red");
        assert_eq!(summary.vibrant, "red");
        assert_eq!(summary.muted, "grey");
    }

    #[test]
    fn test_summarize_empty() {
        assert!(summarize(&[]).is_none());
    }

    #[test]
    fn test_color_summary_of_solid_image() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("blue.png");
        image::RgbImage::from_fn(30, 30, |_, _| image::Rgb([40, 70, 200]))
            .save(&path)
            .unwrap();

        let summary = color_summary(&path).unwrap();
        assert_eq!(summary.names, vec!["blue"; 9]);
        assert_eq!(summary.vibrant, "blue");
        assert_eq!(summary.muted, "blue");
    }

    #[test]
    fn test_color_summary_of_non_image() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("fake.jpg");
        std::fs::write(&path, b"nope").unwrap();
        assert!(color_summary(&path).is_none());
    }
}
