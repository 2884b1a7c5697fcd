use anyhow::Context;
use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use vistacore::manifest::RawDetection;

const OUTLINE: u32 = 2;

fn class_colour(class: &str) -> Rgb<u8> {
    let hash = class
        .bytes()
        .fold(17u32, |acc, byte| acc.wrapping_mul(31).wrapping_add(u32::from(byte)));
    Rgb([
        96 + (hash % 160) as u8,
        96 + ((hash / 160) % 160) as u8,
        96 + ((hash / 25_600) % 160) as u8,
    ])
}

fn outline_box(image: &mut RgbImage, bbox: [f64; 4], colour: Rgb<u8>) {
    let (width, height) = image.dimensions();
    let clamp_x = |value: f64| (value.max(0.0) as u32).min(width.saturating_sub(1));
    let clamp_y = |value: f64| (value.max(0.0) as u32).min(height.saturating_sub(1));
    let (x1, y1, x2, y2) = (clamp_x(bbox[0]), clamp_y(bbox[1]), clamp_x(bbox[2]), clamp_y(bbox[3]));

    for y in y1..=y2 {
        for x in x1..=x2 {
            let on_edge = x < x1 + OUTLINE
                || x + OUTLINE > x2
                || y < y1 + OUTLINE
                || y + OUTLINE > y2;
            if on_edge {
                image.put_pixel(x, y, colour);
            }
        }
    }
}

/// Renders an annotated frame as JPEG bytes: a gradient backdrop whose tint
/// moves with the frame index, plus one outlined box per detection.
pub fn paint_frame(
    width: u32,
    height: u32,
    frame_index: usize,
    detections: &[RawDetection],
) -> anyhow::Result<Vec<u8>> {
    let tint = ((frame_index * 23) % 96) as u32;
    let mut image = RgbImage::from_fn(width.max(1), height.max(1), |x, y| {
        Rgb([
            (24 + tint + x * 64 / width.max(1)) as u8,
            (24 + y * 64 / height.max(1)) as u8,
            (48 + tint / 2) as u8,
        ])
    });

    for detection in detections {
        outline_box(
            &mut image,
            detection.normalized_bbox(),
            class_colour(&detection.class_name()),
        );
    }

    let mut encoded = Cursor::new(Vec::new());
    image
        .write_to(&mut encoded, ImageFormat::Jpeg)
        .context("encoding synthetic frame")?;
    Ok(encoded.into_inner())
}
