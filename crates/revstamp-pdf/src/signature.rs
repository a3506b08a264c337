//! Signature-image stamping
//!
//! Decodes a captured signature PNG and embeds it as a flate-compressed
//! Image XObject, drawn by a small Form XObject that serves as the normal
//! appearance of a Stamp annotation over the target title-block cell.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use revstamp_core::SignatureImage;
use revstamp_core::{EngineError, Rect};

struct DecodedPng {
    width: u32,
    height: u32,
    color_space: &'static [u8],
    pixels: Vec<u8>,
    alpha: Option<Vec<u8>>,
}

fn decode_png(data: &[u8]) -> Result<DecodedPng, EngineError> {
    let decoder = png::Decoder::new(data);
    let mut reader = decoder.read_info().map_err(EngineError::accessor)?;
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf).map_err(EngineError::accessor)?;
    if info.bit_depth != png::BitDepth::Eight {
        return Err(EngineError::Accessor(format!(
            "unsupported signature bit depth: {:?}",
            info.bit_depth
        )));
    }
    buf.truncate(info.buffer_size());

    let (color_space, pixels, alpha) = match info.color_type {
        png::ColorType::Rgb => (b"DeviceRGB".as_slice(), buf, None),
        png::ColorType::Grayscale => (b"DeviceGray".as_slice(), buf, None),
        png::ColorType::Rgba => {
            let mut rgb = Vec::with_capacity(buf.len() / 4 * 3);
            let mut alpha = Vec::with_capacity(buf.len() / 4);
            for px in buf.chunks_exact(4) {
                rgb.extend_from_slice(&px[..3]);
                alpha.push(px[3]);
            }
            (b"DeviceRGB".as_slice(), rgb, Some(alpha))
        }
        png::ColorType::GrayscaleAlpha => {
            let mut gray = Vec::with_capacity(buf.len() / 2);
            let mut alpha = Vec::with_capacity(buf.len() / 2);
            for px in buf.chunks_exact(2) {
                gray.push(px[0]);
                alpha.push(px[1]);
            }
            (b"DeviceGray".as_slice(), gray, Some(alpha))
        }
        other => {
            return Err(EngineError::Accessor(format!(
                "unsupported signature color type: {other:?}"
            )))
        }
    };

    Ok(DecodedPng {
        width: info.width,
        height: info.height,
        color_space,
        pixels,
        alpha,
    })
}

fn flate_compress(data: &[u8]) -> Result<Vec<u8>, EngineError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).map_err(EngineError::accessor)?;
    encoder.finish().map_err(EngineError::accessor)
}

fn image_xobject(
    doc: &mut Document,
    width: u32,
    height: u32,
    color_space: &[u8],
    pixels: &[u8],
    smask: Option<ObjectId>,
) -> Result<ObjectId, EngineError> {
    let mut dict = Dictionary::new();
    dict.set("Type", Object::Name(b"XObject".to_vec()));
    dict.set("Subtype", Object::Name(b"Image".to_vec()));
    dict.set("Width", Object::Integer(width as i64));
    dict.set("Height", Object::Integer(height as i64));
    dict.set("ColorSpace", Object::Name(color_space.to_vec()));
    dict.set("BitsPerComponent", Object::Integer(8));
    dict.set("Filter", Object::Name(b"FlateDecode".to_vec()));
    if let Some(smask) = smask {
        dict.set("SMask", Object::Reference(smask));
    }
    let compressed = flate_compress(pixels)?;
    Ok(doc.add_object(Object::Stream(Stream::new(dict, compressed))))
}

/// Build a Stamp annotation drawing `image` stretched over `rect` and
/// register its objects with the document. The caller wires the returned
/// annotation into the page's `Annots` array.
pub(crate) fn build_stamp(
    doc: &mut Document,
    rect: &Rect,
    image: &SignatureImage,
) -> Result<ObjectId, EngineError> {
    let decoded = decode_png(&image.png)?;

    let smask_id = match &decoded.alpha {
        Some(alpha) => Some(image_xobject(
            doc,
            decoded.width,
            decoded.height,
            b"DeviceGray",
            alpha,
            None,
        )?),
        None => None,
    };
    let image_id = image_xobject(
        doc,
        decoded.width,
        decoded.height,
        decoded.color_space,
        &decoded.pixels,
        smask_id,
    )?;

    // Form XObject scaling the unit image square to the cell size.
    let content = format!("q {} 0 0 {} 0 0 cm /Im0 Do Q", rect.width, rect.height);
    let mut xobjects = Dictionary::new();
    xobjects.set("Im0", Object::Reference(image_id));
    let mut resources = Dictionary::new();
    resources.set("XObject", Object::Dictionary(xobjects));
    let mut form = Dictionary::new();
    form.set("Type", Object::Name(b"XObject".to_vec()));
    form.set("Subtype", Object::Name(b"Form".to_vec()));
    form.set("FormType", Object::Integer(1));
    form.set(
        "BBox",
        Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(rect.width as f32),
            Object::Real(rect.height as f32),
        ]),
    );
    form.set("Resources", Object::Dictionary(resources));
    let form_id = doc.add_object(Object::Stream(Stream::new(form, content.into_bytes())));

    let mut ap = Dictionary::new();
    ap.set("N", Object::Reference(form_id));
    let mut annot = Dictionary::new();
    annot.set("Type", Object::Name(b"Annot".to_vec()));
    annot.set("Subtype", Object::Name(b"Stamp".to_vec()));
    annot.set(
        "Rect",
        Object::Array(vec![
            Object::Real(rect.x as f32),
            Object::Real(rect.y as f32),
            Object::Real(rect.right() as f32),
            Object::Real(rect.top() as f32),
        ]),
    );
    annot.set("F", Object::Integer(4));
    annot.set("AP", Object::Dictionary(ap));
    Ok(doc.add_object(Object::Dictionary(annot)))
}
