use std::path::Path;

use fast_image_resize::{self as fir, images::Image as FirImage};

use super::exif::read_orientation;

/// Perceptual hash of an image as 32 hex chars: the 64-bit average hash
/// followed by the 64-bit difference hash, both computed on a 9x8
/// grayscale thumbnail taken after EXIF orientation is applied.
///
/// Returns `None` if the image cannot be decoded.
pub fn perceptual_hash(path: &Path) -> Option<String> {
    let pixels = load_9x8_grayscale(path)?;
    Some(format!(
        "{:016x}{:016x}",
        compute_ahash(&pixels),
        compute_dhash(&pixels)
    ))
}

/// Decode with the `image` crate, apply orientation, resize RGB to 9x8,
/// then convert those 72 pixels to grayscale (BT.601).
fn load_9x8_grayscale(path: &Path) -> Option<[u8; 72]> {
    let img = image::open(path).ok()?;
    let rgb = img.to_rgb8();
    let (w, h) = (rgb.width() as usize, rgb.height() as usize);

    let (rgb_data, w, h) = apply_orientation_rgb(rgb.as_raw(), w, h, read_orientation(path));

    let src = FirImage::from_vec_u8(w as u32, h as u32, rgb_data, fir::PixelType::U8x3).ok()?;
    let mut dst = FirImage::new(9, 8, fir::PixelType::U8x3);
    fir::Resizer::new().resize(&src, &mut dst, None).ok()?;

    let rgb_buf = dst.buffer();
    let mut gray = [0u8; 72];
    for (i, px) in gray.iter_mut().enumerate() {
        let r = rgb_buf[i * 3] as f32;
        let g = rgb_buf[i * 3 + 1] as f32;
        let b = rgb_buf[i * 3 + 2] as f32;
        *px = (0.299 * r + 0.587 * g + 0.114 * b) as u8;
    }
    Some(gray)
}

/// Rotate/mirror an RGB buffer per EXIF orientation (1-8).
fn apply_orientation_rgb(buf: &[u8], w: usize, h: usize, orientation: u8) -> (Vec<u8>, usize, usize) {
    if orientation <= 1 || orientation > 8 {
        return (buf.to_vec(), w, h);
    }

    let mut out = vec![0u8; w * h * 3];
    let (new_w, new_h) = if orientation >= 5 { (h, w) } else { (w, h) };

    for y in 0..h {
        for x in 0..w {
            let src_idx = (y * w + x) * 3;
            let (dx, dy) = match orientation {
                2 => (w - 1 - x, y),
                3 => (w - 1 - x, h - 1 - y),
                4 => (x, h - 1 - y),
                5 => (y, x),
                6 => (h - 1 - y, x),
                7 => (h - 1 - y, w - 1 - x),
                8 => (y, w - 1 - x),
                _ => (x, y),
            };
            let dst_idx = (dy * new_w + dx) * 3;
            out[dst_idx..dst_idx + 3].copy_from_slice(&buf[src_idx..src_idx + 3]);
        }
    }
    (out, new_w, new_h)
}

/// Left 8x8 block; bit set when the pixel is at or above the mean.
fn compute_ahash(pixels: &[u8; 72]) -> u64 {
    let mut block = [0u8; 64];
    for row in 0..8 {
        for col in 0..8 {
            block[row * 8 + col] = pixels[row * 9 + col];
        }
    }

    let mean: u64 = block.iter().map(|&p| p as u64).sum::<u64>() / 64;
    let mut hash: u64 = 0;
    for (i, &pixel) in block.iter().enumerate() {
        if pixel as u64 >= mean {
            hash |= 1 << i;
        }
    }
    hash
}

/// One bit per horizontally adjacent pair: set when left is brighter.
fn compute_dhash(pixels: &[u8; 72]) -> u64 {
    let mut hash: u64 = 0;
    let mut bit = 0;
    for row in 0..8 {
        for col in 0..8 {
            if pixels[row * 9 + col] > pixels[row * 9 + col + 1] {
                hash |= 1 << bit;
            }
            bit += 1;
        }
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_images_same_hash() {
        let tmp = tempfile::tempdir().unwrap();
        let a = tmp.path().join("a.jpg");
        let b = tmp.path().join("b.jpg");
        for path in [&a, &b] {
            image::RgbImage::from_fn(64, 64, |x, y| image::Rgb([(x * 4) as u8, (y * 4) as u8, 50]))
                .save(path)
                .unwrap();
        }

        let hash = perceptual_hash(&a).unwrap();
        assert_eq!(hash.len(), 32);
        assert_eq!(hash, perceptual_hash(&b).unwrap());
    }

    #[test]
    fn test_different_images_different_hash() {
        let tmp = tempfile::tempdir().unwrap();
        let gradient = tmp.path().join("gradient.png");
        let checker = tmp.path().join("checker.png");

        image::RgbImage::from_fn(64, 64, |x, _| image::Rgb([(x * 4) as u8, 0, 0]))
            .save(&gradient)
            .unwrap();
        image::RgbImage::from_fn(64, 64, |x, y| {
            if (x / 8 + y / 8) % 2 == 0 {
                image::Rgb([255, 255, 255])
            } else {
                image::Rgb([0, 0, 0])
            }
        })
        .save(&checker)
        .unwrap();

        assert_ne!(perceptual_hash(&gradient), perceptual_hash(&checker));
    }

    #[test]
    fn test_undecodable_file_returns_none() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("broken.jpg");
        std::fs::write(&path, b"this is not a jpeg").unwrap();

        assert!(perceptual_hash(&path).is_none());
        assert!(perceptual_hash(Path::new("/nonexistent/image.jpg")).is_none());
    }

    #[test]
    fn test_ahash_dhash_bright_corner() {
        let mut pixels = [100u8; 72];
        pixels[0] = 200;
        assert_eq!(compute_ahash(&pixels) & 1, 1);
        assert_eq!(compute_dhash(&pixels) & 1, 1);
    }

    #[test]
    fn test_orientation_rotate_90_cw() {
        // 3x1 row [a, b, c] becomes a 1x3 column.
        let buf = vec![1, 1, 1, 2, 2, 2, 3, 3, 3];
        let (out, w, h) = apply_orientation_rgb(&buf, 3, 1, 6);
        assert_eq!((w, h), (1, 3));
        assert_eq!(out, buf);

        let (out, _, _) = apply_orientation_rgb(&buf, 3, 1, 8);
        assert_eq!(out, vec![3, 3, 3, 2, 2, 2, 1, 1, 1]);
    }
}
