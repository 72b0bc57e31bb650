/// Common test data and builders shared by unit tests
///
/// Images are generated from a fixed-seed pseudo random sequence so encoded
/// sizes are stable between runs.
use image::{DynamicImage, ImageEncoder, RgbImage};
use std::path::Path;

/// A minimal 1x1 PNG image in bytes (67 bytes total)
pub const MINIMAL_PNG_DATA: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D,
    0x49, 0x48, 0x44, 0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01,
    0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4, 0x89, 0x00, 0x00, 0x00,
    0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00, 0x01, 0x00, 0x00,
    0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

/// Gradient with per-pixel noise; compresses poorly, so quality matters
pub fn noisy_rgb_image(width: u32, height: u32) -> RgbImage {
    let mut state: u32 = 0x2545_F491;
    RgbImage::from_fn(width, height, |x, y| {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        let noise = (state & 0x3F) as u8;
        let r = ((x * 255) / width.max(1)) as u8;
        let g = ((y * 255) / height.max(1)) as u8;
        image::Rgb([r.wrapping_add(noise), g.wrapping_add(noise / 2), noise.wrapping_mul(3)])
    })
}

pub fn jpeg_bytes(width: u32, height: u32, quality: u8) -> Vec<u8> {
    let image = noisy_rgb_image(width, height);
    let mut buffer = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality)
        .write_image(image.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .expect("Failed to encode JPEG");
    buffer
}

pub fn write_jpeg(path: &Path, width: u32, height: u32, quality: u8) {
    std::fs::write(path, jpeg_bytes(width, height, quality)).expect("Failed to write JPEG file");
}

pub fn write_png(path: &Path, width: u32, height: u32) {
    DynamicImage::ImageRgb8(noisy_rgb_image(width, height))
        .save_with_format(path, image::ImageFormat::Png)
        .expect("Failed to write PNG file");
}

fn crc32(bytes: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFFu32;
    for byte in bytes {
        crc ^= u32::from(*byte);
        for _ in 0..8 {
            crc = if crc & 1 == 1 { (crc >> 1) ^ 0xEDB8_8320 } else { crc >> 1 };
        }
    }
    !crc
}

fn adler32(bytes: &[u8]) -> u32 {
    let (mut a, mut b) = (1u32, 0u32);
    for byte in bytes {
        a = (a + u32::from(*byte)) % 65521;
        b = (b + a) % 65521;
    }
    (b << 16) | a
}

fn push_chunk(out: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    let start = out.len();
    out.extend_from_slice(kind);
    out.extend_from_slice(data);
    let crc = crc32(&out[start..]);
    out.extend_from_slice(&crc.to_be_bytes());
}

/// 1-bit black/white palette PNG with random pixels, IDAT stored uncompressed.
/// Decoding expands it to RGB, so a straight re-encode comes out larger.
pub fn palette_png_bytes(width: u32, height: u32) -> Vec<u8> {
    let row_bytes = width.div_ceil(8) as usize;
    let mut raw = Vec::with_capacity((row_bytes + 1) * height as usize);
    let mut state: u32 = 0x9E37_79B9;
    for _ in 0..height {
        raw.push(0);
        for _ in 0..row_bytes {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            raw.push((state >> 11) as u8);
        }
    }
    assert!(raw.len() <= usize::from(u16::MAX), "single stored block only");

    let len = raw.len() as u16;
    let mut zlib = vec![0x78, 0x01, 0x01];
    zlib.extend_from_slice(&len.to_le_bytes());
    zlib.extend_from_slice(&(!len).to_le_bytes());
    zlib.extend_from_slice(&raw);
    zlib.extend_from_slice(&adler32(&raw).to_be_bytes());

    let mut ihdr = Vec::new();
    ihdr.extend_from_slice(&width.to_be_bytes());
    ihdr.extend_from_slice(&height.to_be_bytes());
    ihdr.extend_from_slice(&[1, 3, 0, 0, 0]);

    let mut png = b"\x89PNG\r\n\x1a\n".to_vec();
    push_chunk(&mut png, b"IHDR", &ihdr);
    push_chunk(&mut png, b"PLTE", &[0, 0, 0, 255, 255, 255]);
    push_chunk(&mut png, b"IDAT", &zlib);
    push_chunk(&mut png, b"IEND", &[]);
    png
}

/// One page per image; each image is drawn full-page as /Im0 with DCTDecode
pub fn build_pdf(images: Vec<(Vec<u8>, u32, u32)>) -> lopdf::Document {
    use lopdf::{dictionary, Document, Object, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids = Vec::new();

    for (jpeg, width, height) in images {
        let (width, height) = (i64::from(width), i64::from(height));
        let image_id = doc.add_object(
            Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => width,
                    "Height" => height,
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => 8_i64,
                    "Filter" => "DCTDecode",
                },
                jpeg,
            )
            .with_compression(false),
        );
        let content = format!("q {width} 0 0 {height} 0 0 cm /Im0 Do Q");
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => image_id },
            },
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(width),
                Object::Integer(height),
            ],
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_png_data_decodes() {
        let image = image::load_from_memory(MINIMAL_PNG_DATA).unwrap();
        assert_eq!((image.width(), image.height()), (1, 1));
    }

    #[test]
    fn test_palette_png_decodes() {
        let image = image::load_from_memory(&palette_png_bytes(128, 128)).unwrap();
        assert_eq!((image.width(), image.height()), (128, 128));
    }

    #[test]
    fn test_noisy_image_is_deterministic() {
        assert_eq!(noisy_rgb_image(12, 7), noisy_rgb_image(12, 7));
        assert_eq!(jpeg_bytes(16, 16, 80), jpeg_bytes(16, 16, 80));
    }
}
