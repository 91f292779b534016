use super::super::{ImageSize, generate_image_thumbnail};
use crate::gallery::GalleryError;
use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, ExtendedColorType, ImageBuffer, ImageFormat, LumaA, Rgb, Rgba};
use std::path::Path;
use tempfile::TempDir;

const THUMB: ImageSize = ImageSize {
    width: 200,
    height: 200,
};

fn assert_close(actual: [u8; 3], expected: [u8; 3]) {
    for (a, e) in actual.iter().zip(expected.iter()) {
        assert!(
            (*a as i32 - *e as i32).abs() <= 30,
            "pixel {:?} not close to {:?}",
            actual,
            expected
        );
    }
}

fn rgb_at(path: &Path, x: u32, y: u32) -> [u8; 3] {
    image::open(path).unwrap().to_rgb8().get_pixel(x, y).0
}

#[test]
fn test_landscape_png_becomes_exact_jpeg_thumbnail() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("photo1.png");
    let output = temp.path().join("cache/photo1.jpg");
    std::fs::create_dir_all(output.parent().unwrap()).unwrap();

    let img = ImageBuffer::from_fn(512, 384, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128u8])
    });
    img.save(&source).unwrap();

    let written = generate_image_thumbnail(&source, &output, THUMB, 95).unwrap();

    assert_eq!(written, output);
    let bytes = std::fs::read(&output).unwrap();
    assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
    let thumbnail = image::load_from_memory(&bytes).unwrap();
    assert_eq!((thumbnail.width(), thumbnail.height()), (200, 200));
}

#[test]
fn test_portrait_keeps_the_centre_band() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("tall.png");
    let output = temp.path().join("tall.jpg");

    let img = ImageBuffer::from_fn(100, 300, |_, y| match y {
        0..100 => Rgb([255u8, 0, 0]),
        100..200 => Rgb([0u8, 255, 0]),
        _ => Rgb([0u8, 0, 255]),
    });
    img.save(&source).unwrap();

    generate_image_thumbnail(&source, &output, THUMB, 95).unwrap();

    assert_close(rgb_at(&output, 100, 5), [0, 255, 0]);
    assert_close(rgb_at(&output, 100, 100), [0, 255, 0]);
    assert_close(rgb_at(&output, 100, 194), [0, 255, 0]);
}

#[test]
fn test_transparent_pixels_become_white() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("clear.png");
    let output = temp.path().join("clear.jpg");

    ImageBuffer::from_pixel(64, 64, Rgba([12u8, 34, 56, 0]))
        .save(&source)
        .unwrap();

    generate_image_thumbnail(&source, &output, THUMB, 95).unwrap();

    assert_close(rgb_at(&output, 100, 100), [255, 255, 255]);
}

#[test]
fn test_grey_alpha_is_flattened() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("grey.png");
    let output = temp.path().join("grey.jpg");

    let img = ImageBuffer::from_fn(80, 80, |x, _| {
        if x < 40 {
            LumaA([0u8, 255])
        } else {
            LumaA([0u8, 0])
        }
    });
    img.save(&source).unwrap();

    generate_image_thumbnail(&source, &output, THUMB, 95).unwrap();

    assert_close(rgb_at(&output, 10, 100), [0, 0, 0]);
    assert_close(rgb_at(&output, 190, 100), [255, 255, 255]);
}

#[test]
fn test_palette_with_transparent_index_is_flattened() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("indexed.gif");
    let output = temp.path().join("indexed.jpg");

    // Two opaque colours plus a fully transparent band, so the GIF palette gets a
    // transparent index
    let pixels = ImageBuffer::from_fn(90, 90, |x, _| match x {
        0..30 => Rgba([255u8, 0, 0, 255]),
        30..60 => Rgba([0u8, 0, 255, 255]),
        _ => Rgba([0u8, 255, 0, 0]),
    });
    {
        let file = std::fs::File::create(&source).unwrap();
        let mut encoder = GifEncoder::new(file);
        encoder
            .encode(pixels.as_raw(), 90, 90, ExtendedColorType::Rgba8)
            .unwrap();
    }
    let bytes = std::fs::read(&source).unwrap();
    assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Gif);

    generate_image_thumbnail(&source, &output, THUMB, 95).unwrap();

    let thumbnail = image::open(&output).unwrap();
    assert_eq!((thumbnail.width(), thumbnail.height()), (200, 200));
    assert_eq!(thumbnail.color(), ColorType::Rgb8);
    assert_close(rgb_at(&output, 30, 100), [255, 0, 0]);
    assert_close(rgb_at(&output, 100, 100), [0, 0, 255]);
    assert_close(rgb_at(&output, 170, 100), [255, 255, 255]);
}

/// APP1 segment holding a big-endian TIFF block with a single Orientation tag.
fn exif_orientation_segment(orientation: u16) -> Vec<u8> {
    let mut payload = b"Exif\0\0".to_vec();
    payload.extend_from_slice(b"MM\0\x2A\0\0\0\x08");
    payload.extend_from_slice(&1u16.to_be_bytes());
    payload.extend_from_slice(&0x0112u16.to_be_bytes());
    payload.extend_from_slice(&3u16.to_be_bytes());
    payload.extend_from_slice(&1u32.to_be_bytes());
    payload.extend_from_slice(&orientation.to_be_bytes());
    payload.extend_from_slice(&[0, 0]);
    payload.extend_from_slice(&0u32.to_be_bytes());

    let mut segment = vec![0xFF, 0xE1];
    segment.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    segment.extend_from_slice(&payload);
    segment
}

#[test]
fn test_exif_orientation_is_applied_before_cropping() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("rotated.jpg");
    let output = temp.path().join("cache/rotated.jpg");
    std::fs::create_dir_all(output.parent().unwrap()).unwrap();

    // Left half red, right half blue; orientation 6 turns the left edge into the top
    let img = ImageBuffer::from_fn(40, 20, |x, _| {
        if x < 20 {
            Rgb([255u8, 0, 0])
        } else {
            Rgb([0u8, 0, 255])
        }
    });
    let mut encoded = Vec::new();
    JpegEncoder::new_with_quality(&mut encoded, 95)
        .encode_image(&img)
        .unwrap();
    let mut with_exif = encoded[..2].to_vec();
    with_exif.extend(exif_orientation_segment(6));
    with_exif.extend_from_slice(&encoded[2..]);
    std::fs::write(&source, with_exif).unwrap();

    generate_image_thumbnail(&source, &output, THUMB, 95).unwrap();

    assert_close(rgb_at(&output, 5, 5), [255, 0, 0]);
    assert_close(rgb_at(&output, 5, 194), [0, 0, 255]);
}

#[test]
fn test_corrupt_source_leaves_no_file() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("broken.jpg");
    let cache_dir = temp.path().join("cache");
    let output = cache_dir.join("broken.jpg");
    std::fs::create_dir_all(&cache_dir).unwrap();
    std::fs::write(&source, b"\xFF\xD8 definitely not a jpeg").unwrap();

    let result = generate_image_thumbnail(&source, &output, THUMB, 95);

    assert!(result.is_err());
    assert!(!output.exists());
    assert_eq!(std::fs::read_dir(&cache_dir).unwrap().count(), 0);
}

#[test]
fn test_zero_size_is_rejected() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("a.png");
    ImageBuffer::from_pixel(10, 10, Rgb([1u8, 2, 3]))
        .save(&source)
        .unwrap();

    let result = generate_image_thumbnail(
        &source,
        &temp.path().join("a.jpg"),
        ImageSize {
            width: 0,
            height: 200,
        },
        95,
    );

    assert!(matches!(result, Err(GalleryError::Generation(_))));
}

#[test]
fn test_regenerating_overwrites_in_place() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("again.png");
    let output = temp.path().join("again.jpg");
    ImageBuffer::from_pixel(300, 100, Rgb([40u8, 80, 120]))
        .save(&source)
        .unwrap();

    generate_image_thumbnail(&source, &output, THUMB, 95).unwrap();
    let first = std::fs::read(&output).unwrap();
    generate_image_thumbnail(&source, &output, THUMB, 95).unwrap();
    let second = std::fs::read(&output).unwrap();

    assert_eq!(first, second);
    assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 2);
}
