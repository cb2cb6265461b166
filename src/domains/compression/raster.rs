//! Raster compression strategy: per-image re-encode and downsample.
//!
//! Walks every embedded image, page by page in page order and then in
//! discovery order within the page, picks an encoding from the image's color
//! mode, downsamples high-resolution images, and replaces each stream in
//! place so existing references stay valid.

use std::collections::HashSet;
use std::io::{Cursor, Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::{imageops::FilterType, DynamicImage, GrayImage, Luma, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use super::types::{ColorMode, CompressionSettings, ImageEncoding};
use crate::errors::CompressionError;

/// One embedded image discovered in the document.
struct ImageRef {
    id: ObjectId,
    page: u32,
    index: usize,
}

/// Re-encode every embedded image of a scanned document and serialize the
/// working copy with unreferenced objects dropped and streams deflated.
///
/// Any single image that fails to decode aborts the whole run; a document
/// with only some of its images rewritten is never produced.
pub fn reencode(data: &[u8], settings: &CompressionSettings) -> Result<Vec<u8>, CompressionError> {
    let mut doc = Document::load_mem(data)
        .map_err(|e| CompressionError::InvalidDocument(e.to_string()))?;

    for image_ref in collect_images(&doc) {
        process_image(&mut doc, &image_ref, settings)?;
    }

    doc.prune_objects();
    doc.compress();

    let mut output = Cursor::new(Vec::new());
    doc.save_to(&mut output)
        .map_err(|e| CompressionError::Serialize(e.to_string()))?;

    Ok(output.into_inner())
}

/// Effective DPI used for downsampling decisions: the declared value when
/// present, else the nominal target resolution.
pub(crate) fn effective_dpi(declared: Option<f32>, settings: &CompressionSettings) -> f32 {
    declared.unwrap_or(settings.target_dpi)
}

/// Target pixel dimensions after the DPI check, or `None` when the image is
/// left at its original size. Dimensions are rounded down, never below one
/// pixel.
pub(crate) fn target_dimensions(
    width: u32,
    height: u32,
    declared_dpi: Option<f32>,
    settings: &CompressionSettings,
) -> Option<(u32, u32)> {
    let dpi = effective_dpi(declared_dpi, settings);
    if dpi <= settings.dpi_threshold {
        return None;
    }
    let factor = settings.target_dpi / dpi;
    let new_width = ((width as f32 * factor) as u32).max(1);
    let new_height = ((height as f32 * factor) as u32).max(1);
    Some((new_width, new_height))
}

/// Fixed encoding lookup: bilevel stays lossless, everything else goes lossy.
pub(crate) fn encoding_for(mode: ColorMode, settings: &CompressionSettings) -> ImageEncoding {
    match mode {
        ColorMode::Bilevel => ImageEncoding::Lossless,
        ColorMode::Grayscale | ColorMode::Color => ImageEncoding::Jpeg(settings.jpeg_quality),
    }
}

/// Collect image XObjects across all pages, in page order then discovery
/// order. An image referenced from several pages is listed once, at its
/// first appearance; replacement is by object id, so every reference sees
/// the rewritten stream.
fn collect_images(doc: &Document) -> Vec<ImageRef> {
    let mut seen: HashSet<ObjectId> = HashSet::new();
    let mut images = Vec::new();

    for (page_no, page_id) in doc.get_pages() {
        let mut index = 0;
        for id in page_image_ids(doc, page_id) {
            if seen.insert(id) {
                images.push(ImageRef {
                    id,
                    page: page_no,
                    index,
                });
            }
            index += 1;
        }
    }

    images
}

fn page_image_ids(doc: &Document, page_id: ObjectId) -> Vec<ObjectId> {
    let mut ids = Vec::new();

    let page = match doc.get_dictionary(page_id) {
        Ok(dict) => dict,
        Err(_) => return ids,
    };
    let resources = match page.get(b"Resources").ok().and_then(|r| resolve_dict(doc, r)) {
        Some(dict) => dict,
        None => return ids,
    };
    let xobjects = match resources.get(b"XObject").ok().and_then(|x| resolve_dict(doc, x)) {
        Some(dict) => dict,
        None => return ids,
    };

    for (_, value) in xobjects.iter() {
        if let Object::Reference(id) = value {
            if let Ok(Object::Stream(stream)) = doc.get_object(*id) {
                if name_of(stream.dict.get(b"Subtype").ok()).as_deref() == Some("Image") {
                    ids.push(*id);
                }
            }
        }
    }

    ids
}

fn process_image(
    doc: &mut Document,
    image_ref: &ImageRef,
    settings: &CompressionSettings,
) -> Result<(), CompressionError> {
    let stream = match doc.get_object(image_ref.id) {
        Ok(Object::Stream(stream)) => stream.clone(),
        _ => return Ok(()),
    };

    let decoded = decode_image(doc, &stream).map_err(|reason| CompressionError::ImageDecode {
        page: image_ref.page,
        index: image_ref.index,
        reason,
    })?;

    let mode = if decoded.bits_per_component == 1 {
        ColorMode::Bilevel
    } else {
        match decoded.image {
            DynamicImage::ImageLuma8(_) | DynamicImage::ImageLumaA8(_) => ColorMode::Grayscale,
            _ => ColorMode::Color,
        }
    };

    let mut image = decoded.image;
    if let Some((width, height)) =
        target_dimensions(image.width(), image.height(), decoded.dpi, settings)
    {
        image = image.resize_exact(width, height, FilterType::Lanczos3);
    }

    let replacement = encode_image(&image, encoding_for(mode, settings)).map_err(|reason| {
        CompressionError::ImageEncode {
            page: image_ref.page,
            index: image_ref.index,
            reason,
        }
    })?;

    doc.objects
        .insert(image_ref.id, Object::Stream(replacement));
    Ok(())
}

struct DecodedImage {
    image: DynamicImage,
    bits_per_component: u32,
    /// Resolution declared by the encoded payload, when it carries one.
    dpi: Option<f32>,
}

fn decode_image(doc: &Document, stream: &Stream) -> Result<DecodedImage, String> {
    let width = dict_u32(&stream.dict, b"Width").ok_or("missing /Width")?;
    let height = dict_u32(&stream.dict, b"Height").ok_or("missing /Height")?;
    let bits_per_component = dict_u32(&stream.dict, b"BitsPerComponent").unwrap_or(8);
    let filter = first_filter(&stream.dict);

    match filter.as_deref() {
        Some("DCTDecode") => {
            let image =
                image::load_from_memory_with_format(&stream.content, image::ImageFormat::Jpeg)
                    .map_err(|e| format!("JPEG decode failed: {}", e))?;
            Ok(DecodedImage {
                image,
                bits_per_component: 8,
                dpi: jfif_density_dpi(&stream.content),
            })
        }
        Some("FlateDecode") | None => {
            let raw = match filter {
                Some(_) => {
                    let mut decoder = ZlibDecoder::new(&stream.content[..]);
                    let mut decoded = Vec::new();
                    decoder
                        .read_to_end(&mut decoded)
                        .map_err(|e| format!("FlateDecode failed: {}", e))?;
                    decoded
                }
                None => stream.content.clone(),
            };
            let image = decode_raw(doc, stream, &raw, width, height, bits_per_component)?;
            Ok(DecodedImage {
                image,
                bits_per_component,
                dpi: None,
            })
        }
        Some(other) => Err(format!("unsupported filter {}", other)),
    }
}

/// Raw (uncompressed or deflated) sample data into a `DynamicImage`.
fn decode_raw(
    doc: &Document,
    stream: &Stream,
    raw: &[u8],
    width: u32,
    height: u32,
    bits_per_component: u32,
) -> Result<DynamicImage, String> {
    if bits_per_component == 1 {
        return unpack_bilevel(raw, width, height)
            .map(DynamicImage::ImageLuma8)
            .ok_or_else(|| "bilevel data shorter than declared dimensions".to_string());
    }
    if bits_per_component != 8 {
        return Err(format!("unsupported bits per component {}", bits_per_component));
    }

    let color_space = stream
        .dict
        .get(b"ColorSpace")
        .ok()
        .map(|cs| color_space_name(doc, cs))
        .unwrap_or_else(|| "DeviceRGB".to_string());
    let pixels = (width as usize) * (height as usize);

    match color_space.as_str() {
        "DeviceGray" | "CalGray" => {
            if raw.len() < pixels {
                return Err("grayscale data shorter than declared dimensions".to_string());
            }
            GrayImage::from_raw(width, height, raw[..pixels].to_vec())
                .map(DynamicImage::ImageLuma8)
                .ok_or_else(|| "failed to assemble grayscale image".to_string())
        }
        "DeviceRGB" | "CalRGB" => {
            if raw.len() < pixels * 3 {
                return Err("RGB data shorter than declared dimensions".to_string());
            }
            RgbImage::from_raw(width, height, raw[..pixels * 3].to_vec())
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(|| "failed to assemble RGB image".to_string())
        }
        // No profile decoding; guess the channel count from the data size.
        "ICCBased" => {
            if raw.len() >= pixels * 3 {
                RgbImage::from_raw(width, height, raw[..pixels * 3].to_vec())
                    .map(DynamicImage::ImageRgb8)
                    .ok_or_else(|| "failed to assemble RGB image".to_string())
            } else if raw.len() >= pixels {
                GrayImage::from_raw(width, height, raw[..pixels].to_vec())
                    .map(DynamicImage::ImageLuma8)
                    .ok_or_else(|| "failed to assemble grayscale image".to_string())
            } else {
                Err("ICCBased data shorter than declared dimensions".to_string())
            }
        }
        other => Err(format!("unsupported color space {}", other)),
    }
}

fn encode_image(image: &DynamicImage, encoding: ImageEncoding) -> Result<Stream, String> {
    match encoding {
        ImageEncoding::Lossless => {
            let gray = image.to_luma8();
            let packed = pack_bilevel(&gray);
            let mut encoder = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
            encoder
                .write_all(&packed)
                .map_err(|e| format!("deflate failed: {}", e))?;
            let compressed = encoder
                .finish()
                .map_err(|e| format!("deflate failed: {}", e))?;
            Ok(image_stream(
                gray.width(),
                gray.height(),
                "DeviceGray",
                1,
                "FlateDecode",
                compressed,
            ))
        }
        ImageEncoding::Jpeg(quality) => {
            let (payload, color_space) = match image {
                DynamicImage::ImageLuma8(_) | DynamicImage::ImageLumaA8(_) => (
                    DynamicImage::ImageLuma8(image.to_luma8()),
                    "DeviceGray",
                ),
                _ => (DynamicImage::ImageRgb8(image.to_rgb8()), "DeviceRGB"),
            };
            let mut output = Vec::new();
            let mut encoder = JpegEncoder::new_with_quality(&mut output, quality);
            encoder
                .encode_image(&payload)
                .map_err(|e| format!("JPEG encoding error: {}", e))?;
            Ok(image_stream(
                payload.width(),
                payload.height(),
                color_space,
                8,
                "DCTDecode",
                output,
            ))
        }
    }
}

fn image_stream(
    width: u32,
    height: u32,
    color_space: &str,
    bits_per_component: i64,
    filter: &str,
    content: Vec<u8>,
) -> Stream {
    let mut dict = Dictionary::new();
    dict.set("Type", Object::Name(b"XObject".to_vec()));
    dict.set("Subtype", Object::Name(b"Image".to_vec()));
    dict.set("Width", Object::Integer(width as i64));
    dict.set("Height", Object::Integer(height as i64));
    dict.set("ColorSpace", Object::Name(color_space.as_bytes().to_vec()));
    dict.set("BitsPerComponent", Object::Integer(bits_per_component));
    dict.set("Filter", Object::Name(filter.as_bytes().to_vec()));
    Stream::new(dict, content)
}

/// Expand 1-bit rows (byte-aligned per PDF imaging rules) into 8-bit gray.
fn unpack_bilevel(data: &[u8], width: u32, height: u32) -> Option<GrayImage> {
    let row_bytes = ((width + 7) / 8) as usize;
    if data.len() < row_bytes * height as usize {
        return None;
    }
    let mut image = GrayImage::new(width, height);
    for y in 0..height {
        let row = &data[y as usize * row_bytes..];
        for x in 0..width {
            let bit = (row[(x / 8) as usize] >> (7 - (x % 8))) & 1;
            image.put_pixel(x, y, Luma([if bit == 1 { 255 } else { 0 }]));
        }
    }
    Some(image)
}

/// Pack 8-bit gray back into 1-bit rows, thresholding at mid-gray.
fn pack_bilevel(image: &GrayImage) -> Vec<u8> {
    let (width, height) = image.dimensions();
    let row_bytes = ((width + 7) / 8) as usize;
    let mut packed = vec![0u8; row_bytes * height as usize];
    for y in 0..height {
        for x in 0..width {
            if image.get_pixel(x, y).0[0] >= 128 {
                packed[y as usize * row_bytes + (x / 8) as usize] |= 1 << (7 - (x % 8));
            }
        }
    }
    packed
}

/// Declared resolution of a JPEG payload: the JFIF APP0 density when it is
/// expressed in dots per inch.
fn jfif_density_dpi(data: &[u8]) -> Option<f32> {
    // SOI, APP0 marker, length, "JFIF\0", version, units, Xdensity, Ydensity.
    if data.len() < 18 || data[0..2] != [0xFF, 0xD8] || data[2..4] != [0xFF, 0xE0] {
        return None;
    }
    if &data[6..11] != b"JFIF\0" {
        return None;
    }
    if data[13] != 1 {
        // 0 = aspect ratio only, 2 = dots per cm; neither is a declared DPI.
        return None;
    }
    let x_density = u16::from_be_bytes([data[14], data[15]]);
    if x_density == 0 {
        return None;
    }
    Some(x_density as f32)
}

fn first_filter(dict: &Dictionary) -> Option<String> {
    match dict.get(b"Filter").ok()? {
        Object::Name(name) => Some(String::from_utf8_lossy(name).to_string()),
        Object::Array(parts) => parts.first().and_then(|part| match part {
            Object::Name(name) => Some(String::from_utf8_lossy(name).to_string()),
            _ => None,
        }),
        _ => None,
    }
}

fn color_space_name(doc: &Document, object: &Object) -> String {
    match object {
        Object::Name(name) => String::from_utf8_lossy(name).to_string(),
        Object::Array(parts) => match parts.first() {
            Some(Object::Name(name)) => String::from_utf8_lossy(name).to_string(),
            _ => "Unknown".to_string(),
        },
        Object::Reference(id) => match doc.get_object(*id) {
            Ok(resolved) => color_space_name(doc, resolved),
            Err(_) => "Unknown".to_string(),
        },
        _ => "Unknown".to_string(),
    }
}

fn name_of(object: Option<&Object>) -> Option<String> {
    match object? {
        Object::Name(name) => Some(String::from_utf8_lossy(name).to_string()),
        _ => None,
    }
}

fn dict_u32(dict: &Dictionary, key: &[u8]) -> Option<u32> {
    match dict.get(key).ok()? {
        Object::Integer(n) if *n >= 0 => Some(*n as u32),
        _ => None,
    }
}

fn resolve_dict<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Dictionary> {
    match object {
        Object::Dictionary(dict) => Some(dict),
        Object::Reference(id) => match doc.get_object(*id).ok()? {
            Object::Dictionary(dict) => Some(dict),
            _ => None,
        },
        _ => None,
    }
}
