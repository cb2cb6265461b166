//! End-to-end tests for the compression policy: classification, the vector
//! and raster strategies, and the dispatch between them.

use std::io::{Cursor, Write};

use flate2::write::ZlibEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use pdfdesk::domains::compression::{
    classifier, raster, vector, CompressionService, CompressionSettings, CompressionStrategy,
    DocumentClass, PdfCompressionService,
};
use pdfdesk::errors::CompressionError;

/// One page of a synthesized document: an optional content stream and an
/// optional embedded image.
struct PageSpec {
    content: Option<Vec<u8>>,
    image: Option<(Dictionary, Vec<u8>)>,
}

impl PageSpec {
    fn with_content(content: &[u8]) -> Self {
        Self {
            content: Some(content.to_vec()),
            image: None,
        }
    }

    fn with_image(image: (Dictionary, Vec<u8>)) -> Self {
        Self {
            content: None,
            image: Some(image),
        }
    }
}

fn build_pdf(pages: Vec<PageSpec>) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids: Vec<Object> = Vec::new();
    for spec in pages {
        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        };
        if let Some(content) = spec.content {
            let content_id = doc.add_object(Object::Stream(Stream::new(dictionary! {}, content)));
            page.set("Contents", Object::Reference(content_id));
        }
        if let Some((image_dict, image_data)) = spec.image {
            let image_id = doc.add_object(Object::Stream(Stream::new(image_dict, image_data)));
            page.set(
                "Resources",
                Object::Dictionary(dictionary! {
                    "XObject" => Object::Dictionary(dictionary! {
                        "Im0" => Object::Reference(image_id),
                    }),
                }),
            );
        }
        let page_id = doc.add_object(Object::Dictionary(page));
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
    let catalog_id = doc.add_object(Object::Dictionary(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    }));
    doc.trailer.set("Root", catalog_id);

    let mut output = Cursor::new(Vec::new());
    doc.save_to(&mut output).unwrap();
    output.into_inner()
}

const TEXT_CONTENT: &[u8] = b"BT /F1 24 Tf 100 700 Td (Hello) Tj ET";

/// 1-bit image: packed checkerboard rows, deflated, DeviceGray.
fn bilevel_image(width: u32, height: u32) -> (Dictionary, Vec<u8>) {
    let row_bytes = ((width + 7) / 8) as usize;
    let mut packed = vec![0u8; row_bytes * height as usize];
    for (y, row) in packed.chunks_mut(row_bytes).enumerate() {
        for x in 0..width as usize {
            if (x + y) % 2 == 0 {
                row[x / 8] |= 1 << (7 - (x % 8));
            }
        }
    }

    let mut encoder = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(&packed).unwrap();
    let compressed = encoder.finish().unwrap();

    let dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => width as i64,
        "Height" => height as i64,
        "ColorSpace" => "DeviceGray",
        "BitsPerComponent" => 1,
        "Filter" => "FlateDecode",
    };
    (dict, compressed)
}

/// Overwrite the JFIF APP0 density of an encoded JPEG with a DPI value.
fn set_jfif_dpi(jpeg: &mut [u8], dpi: u16) {
    assert_eq!(&jpeg[0..2], &[0xFF, 0xD8], "fixture is not a JPEG");
    assert_eq!(&jpeg[2..4], &[0xFF, 0xE0], "fixture has no APP0 segment");
    assert_eq!(&jpeg[6..11], b"JFIF\0", "fixture has no JFIF identifier");
    jpeg[13] = 1; // dots per inch
    jpeg[14..16].copy_from_slice(&dpi.to_be_bytes());
    jpeg[16..18].copy_from_slice(&dpi.to_be_bytes());
}

fn jpeg_dict(width: u32, height: u32, color_space: &str) -> Dictionary {
    dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => width as i64,
        "Height" => height as i64,
        "ColorSpace" => color_space,
        "BitsPerComponent" => 8,
        "Filter" => "DCTDecode",
    }
}

fn gray_jpeg_image(width: u32, height: u32, dpi: Option<u16>) -> (Dictionary, Vec<u8>) {
    let mut image = GrayImage::new(width, height);
    for (x, _, pixel) in image.enumerate_pixels_mut() {
        *pixel = Luma([(x % 256) as u8]);
    }
    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, 90)
        .encode_image(&DynamicImage::ImageLuma8(image))
        .unwrap();
    if let Some(dpi) = dpi {
        set_jfif_dpi(&mut jpeg, dpi);
    }
    (jpeg_dict(width, height, "DeviceGray"), jpeg)
}

fn color_jpeg_image(width: u32, height: u32, dpi: Option<u16>) -> (Dictionary, Vec<u8>) {
    let mut image = RgbImage::new(width, height);
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        *pixel = Rgb([(x % 256) as u8, (y % 256) as u8, 128]);
    }
    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, 90)
        .encode_image(&DynamicImage::ImageRgb8(image))
        .unwrap();
    if let Some(dpi) = dpi {
        set_jfif_dpi(&mut jpeg, dpi);
    }
    (jpeg_dict(width, height, "DeviceRGB"), jpeg)
}

/// Resolve each page's first image stream in page order.
fn page_images(doc: &Document) -> Vec<(ObjectId, Stream)> {
    let mut images = Vec::new();
    for (_, page_id) in doc.get_pages() {
        let page = doc.get_dictionary(page_id).unwrap();
        let resources = match page.get(b"Resources") {
            Ok(Object::Dictionary(dict)) => dict.clone(),
            Ok(Object::Reference(id)) => match doc.get_object(*id).unwrap() {
                Object::Dictionary(dict) => dict.clone(),
                _ => continue,
            },
            _ => continue,
        };
        let xobjects = match resources.get(b"XObject").unwrap() {
            Object::Dictionary(dict) => dict.clone(),
            Object::Reference(id) => match doc.get_object(*id).unwrap() {
                Object::Dictionary(dict) => dict.clone(),
                _ => continue,
            },
            _ => continue,
        };
        for (_, value) in xobjects.iter() {
            if let Object::Reference(id) = value {
                if let Ok(Object::Stream(stream)) = doc.get_object(*id) {
                    images.push((*id, stream.clone()));
                }
            }
        }
    }
    images
}

fn stream_dims(stream: &Stream) -> (i64, i64) {
    let width = match stream.dict.get(b"Width").unwrap() {
        Object::Integer(n) => *n,
        _ => panic!("missing width"),
    };
    let height = match stream.dict.get(b"Height").unwrap() {
        Object::Integer(n) => *n,
        _ => panic!("missing height"),
    };
    (width, height)
}

fn filter_name(stream: &Stream) -> String {
    match stream.dict.get(b"Filter").unwrap() {
        Object::Name(name) => String::from_utf8_lossy(name).to_string(),
        _ => panic!("missing filter"),
    }
}

// ---- classification ----

#[test]
fn document_with_content_stream_is_vector() {
    let pdf = build_pdf(vec![PageSpec::with_content(TEXT_CONTENT)]);
    assert_eq!(classifier::classify(&pdf), DocumentClass::Vector);
}

#[test]
fn single_nonempty_content_stream_is_enough() {
    let pdf = build_pdf(vec![
        PageSpec::with_image(bilevel_image(8, 8)),
        PageSpec::with_content(TEXT_CONTENT),
    ]);
    assert_eq!(classifier::classify(&pdf), DocumentClass::Vector);
}

#[test]
fn document_without_content_streams_is_scanned() {
    let pdf = build_pdf(vec![
        PageSpec::with_image(bilevel_image(8, 8)),
        PageSpec::with_image(bilevel_image(8, 8)),
    ]);
    assert_eq!(classifier::classify(&pdf), DocumentClass::Scanned);
}

#[test]
fn empty_content_streams_count_as_scanned() {
    let pdf = build_pdf(vec![PageSpec::with_content(b"")]);
    assert_eq!(classifier::classify(&pdf), DocumentClass::Scanned);
}

// ---- vector strategy ----

#[test]
fn vector_optimize_is_deterministic() {
    let pdf = build_pdf(vec![
        PageSpec::with_content(TEXT_CONTENT),
        PageSpec::with_content(b"0 0 m 100 100 l S"),
    ]);
    let first = vector::optimize(&pdf).unwrap();
    let second = vector::optimize(&pdf).unwrap();
    assert_eq!(first, second);

    let reloaded = Document::load_mem(&first).unwrap();
    assert_eq!(reloaded.get_pages().len(), 2);
}

#[test]
fn vector_optimize_rejects_garbage() {
    assert!(matches!(
        vector::optimize(b"definitely not a pdf"),
        Err(CompressionError::InvalidDocument(_))
    ));
}

// ---- raster strategy ----

#[test]
fn raster_reencode_applies_the_policy_per_image() {
    // Three images: bilevel at nominal DPI, grayscale at 300, color at 600.
    let pdf = build_pdf(vec![
        PageSpec::with_image(bilevel_image(100, 80)),
        PageSpec::with_image(gray_jpeg_image(3000, 2400, Some(300))),
        PageSpec::with_image(color_jpeg_image(600, 600, Some(600))),
    ]);

    let input_doc = Document::load_mem(&pdf).unwrap();
    let input_ids: Vec<ObjectId> = page_images(&input_doc).iter().map(|(id, _)| *id).collect();
    assert_eq!(input_ids.len(), 3);

    let output = raster::reencode(&pdf, &CompressionSettings::default()).unwrap();
    let output_doc = Document::load_mem(&output).unwrap();

    // Page count survives and every image keeps its object identity.
    assert_eq!(output_doc.get_pages().len(), 3);
    let images = page_images(&output_doc);
    let output_ids: Vec<ObjectId> = images.iter().map(|(id, _)| *id).collect();
    assert_eq!(input_ids, output_ids);

    // Bilevel: lossless encoding, dimensions untouched.
    let (_, bilevel) = &images[0];
    assert_eq!(filter_name(bilevel), "FlateDecode");
    assert_eq!(stream_dims(bilevel), (100, 80));
    match bilevel.dict.get(b"BitsPerComponent").unwrap() {
        Object::Integer(bits) => assert_eq!(*bits, 1),
        _ => panic!("missing bits per component"),
    }

    // Grayscale at 300 DPI: downsampled by 150/300 and re-encoded as JPEG.
    let (_, gray) = &images[1];
    assert_eq!(filter_name(gray), "DCTDecode");
    assert_eq!(stream_dims(gray), (1500, 1200));
    let decoded = image::load_from_memory_with_format(&gray.content, image::ImageFormat::Jpeg)
        .unwrap();
    assert_eq!((decoded.width(), decoded.height()), (1500, 1200));

    // Color at 600 DPI: downsampled by 150/600.
    let (_, color) = &images[2];
    assert_eq!(filter_name(color), "DCTDecode");
    assert_eq!(stream_dims(color), (150, 150));
}

#[test]
fn raster_reencode_preserves_bilevel_pixels_exactly() {
    let (dict, original_compressed) = bilevel_image(64, 64);
    let original_packed = {
        use std::io::Read;
        let mut decoder = flate2::read::ZlibDecoder::new(&original_compressed[..]);
        let mut packed = Vec::new();
        decoder.read_to_end(&mut packed).unwrap();
        packed
    };

    let pdf = build_pdf(vec![PageSpec::with_image((dict, original_compressed))]);
    let output = raster::reencode(&pdf, &CompressionSettings::default()).unwrap();
    let output_doc = Document::load_mem(&output).unwrap();

    let (_, stream) = &page_images(&output_doc)[0];
    let roundtripped = {
        use std::io::Read;
        let mut decoder = flate2::read::ZlibDecoder::new(&stream.content[..]);
        let mut packed = Vec::new();
        decoder.read_to_end(&mut packed).unwrap();
        packed
    };
    assert_eq!(original_packed, roundtripped);
}

#[test]
fn images_at_or_below_threshold_keep_their_dimensions() {
    let pdf = build_pdf(vec![
        PageSpec::with_image(gray_jpeg_image(800, 600, Some(200))),
        // No declared resolution: nominal 150 DPI, no downsampling.
        PageSpec::with_image(color_jpeg_image(640, 480, None)),
    ]);

    let output = raster::reencode(&pdf, &CompressionSettings::default()).unwrap();
    let output_doc = Document::load_mem(&output).unwrap();
    let images = page_images(&output_doc);

    assert_eq!(stream_dims(&images[0].1), (800, 600));
    assert_eq!(filter_name(&images[0].1), "DCTDecode");
    assert_eq!(stream_dims(&images[1].1), (640, 480));
    assert_eq!(filter_name(&images[1].1), "DCTDecode");
}

#[test]
fn undecodable_image_aborts_the_whole_run() {
    let bad_dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => 16,
        "Height" => 16,
        "ColorSpace" => "DeviceGray",
        "BitsPerComponent" => 8,
        "Filter" => "CCITTFaxDecode",
    };
    let pdf = build_pdf(vec![
        PageSpec::with_image((bad_dict, vec![0u8; 32])),
        PageSpec::with_image(gray_jpeg_image(100, 100, None)),
    ]);

    match raster::reencode(&pdf, &CompressionSettings::default()) {
        Err(CompressionError::ImageDecode { page, index, .. }) => {
            assert_eq!(page, 1);
            assert_eq!(index, 0);
        }
        other => panic!("expected ImageDecode error, got {:?}", other.map(|_| ())),
    }
}

// ---- dispatch ----

#[tokio::test]
async fn dispatcher_routes_by_classification() {
    let service = PdfCompressionService::new(CompressionSettings::default());

    let vector_pdf = build_pdf(vec![PageSpec::with_content(TEXT_CONTENT)]);
    let outcome = service.compress(vector_pdf).await.unwrap();
    assert_eq!(outcome.strategy, CompressionStrategy::VectorOptimize);
    assert!(!outcome.data.is_empty());

    let scanned_pdf = build_pdf(vec![PageSpec::with_image(bilevel_image(32, 32))]);
    let outcome = service.compress(scanned_pdf).await.unwrap();
    assert_eq!(outcome.strategy, CompressionStrategy::RasterReencode);
    assert!(!outcome.data.is_empty());
}
