//! Positional text extraction within a page rectangle
//!
//! Decodes the page content stream and walks the text-object operators,
//! tracking the text matrix so each shown string can be attributed to a pen
//! position. Only strings whose pen lies inside the query rectangle are
//! collected; everything else on the sheet is ignored.

use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};
use revstamp_core::{EngineError, Rect};

/// Column-major 2D transform [a b c d e f]; e/f carry the translation.
type Matrix = [f64; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

fn multiply(m: &Matrix, n: &Matrix) -> Matrix {
    [
        m[0] * n[0] + m[1] * n[2],
        m[0] * n[1] + m[1] * n[3],
        m[2] * n[0] + m[3] * n[2],
        m[2] * n[1] + m[3] * n[3],
        m[4] * n[0] + m[5] * n[2] + n[4],
        m[4] * n[1] + m[5] * n[3] + n[5],
    ]
}

fn translate(m: &Matrix, tx: f64, ty: f64) -> Matrix {
    multiply(&[1.0, 0.0, 0.0, 1.0, tx, ty], m)
}

fn operand_f64(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(v) => Some(*v as f64),
        Object::Real(v) => Some(*v as f64),
        _ => None,
    }
}

/// Decode a PDF text string: UTF-16BE when BOM-prefixed, UTF-8 when valid,
/// Latin-1 otherwise.
pub(crate) fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        if let Ok(s) = String::from_utf16(&units) {
            return s;
        }
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

fn push_shown_text(out: &mut String, operand: &Object) {
    match operand {
        Object::String(bytes, _) => out.push_str(&decode_pdf_string(bytes)),
        Object::Array(items) => {
            for item in items {
                if let Object::String(bytes, _) = item {
                    out.push_str(&decode_pdf_string(bytes));
                }
            }
        }
        _ => {}
    }
}

/// Extract the text shown inside `rect` on the given page.
///
/// Positions are taken from the text matrix alone; the graphics-state CTM
/// (`cm`) is not tracked, so text drawn under a page-level transform is
/// reported in untransformed coordinates. Drawing sheets from the plotters
/// this engine targets emit their title-block text without such a
/// transform.
pub fn extract_text_in_rect(
    doc: &Document,
    page_id: ObjectId,
    rect: &Rect,
) -> Result<String, EngineError> {
    let content = doc
        .get_page_content(page_id)
        .map_err(EngineError::accessor)?;
    let operations = Content::decode(&content).map_err(EngineError::accessor)?;

    let mut out = String::new();
    let mut tm = IDENTITY;
    let mut tlm = IDENTITY;
    let mut leading = 0.0_f64;

    for op in &operations.operations {
        let operands = &op.operands;
        match op.operator.as_str() {
            "BT" => {
                tm = IDENTITY;
                tlm = IDENTITY;
            }
            "Tm" => {
                if operands.len() == 6 {
                    let mut m = IDENTITY;
                    for (slot, operand) in m.iter_mut().zip(operands) {
                        if let Some(v) = operand_f64(operand) {
                            *slot = v;
                        }
                    }
                    tm = m;
                    tlm = m;
                }
            }
            "Td" | "TD" => {
                if let (Some(tx), Some(ty)) = (
                    operands.first().and_then(operand_f64),
                    operands.get(1).and_then(operand_f64),
                ) {
                    if op.operator == "TD" {
                        leading = -ty;
                    }
                    tlm = translate(&tlm, tx, ty);
                    tm = tlm;
                }
            }
            "TL" => {
                if let Some(l) = operands.first().and_then(operand_f64) {
                    leading = l;
                }
            }
            "T*" => {
                tlm = translate(&tlm, 0.0, -leading);
                tm = tlm;
            }
            "Tj" | "TJ" => {
                if rect.contains_point(tm[4], tm[5]) {
                    for operand in operands {
                        push_shown_text(&mut out, operand);
                    }
                }
            }
            "'" | "\"" => {
                tlm = translate(&tlm, 0.0, -leading);
                tm = tlm;
                if rect.contains_point(tm[4], tm[5]) {
                    for operand in operands {
                        push_shown_text(&mut out, operand);
                    }
                }
            }
            _ => {}
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::create_test_pdf;
    use pretty_assertions::assert_eq;

    fn first_page(doc: &Document) -> ObjectId {
        doc.get_pages().into_values().next().unwrap()
    }

    #[test]
    fn collects_only_text_inside_the_rect() {
        let pdf = create_test_pdf(
            "BT /F1 12 Tf 100 700 Td (Alpha) Tj ET \
             BT /F1 12 Tf 400 100 Td (Beta) Tj ET",
        );
        let doc = Document::load_mem(&pdf).unwrap();
        let page_id = first_page(&doc);

        let near_alpha = Rect::new(80.0, 680.0, 60.0, 40.0);
        assert_eq!(
            extract_text_in_rect(&doc, page_id, &near_alpha).unwrap(),
            "Alpha"
        );

        let near_beta = Rect::new(380.0, 80.0, 60.0, 40.0);
        assert_eq!(
            extract_text_in_rect(&doc, page_id, &near_beta).unwrap(),
            "Beta"
        );

        let elsewhere = Rect::new(0.0, 0.0, 50.0, 50.0);
        assert_eq!(extract_text_in_rect(&doc, page_id, &elsewhere).unwrap(), "");
    }

    #[test]
    fn tracks_td_steps_within_a_text_object() {
        // Two Td steps: the pen ends at (100+10, 700-30)
        let pdf = create_test_pdf(
            "BT /F1 12 Tf 100 700 Td (First) Tj 10 -30 Td (Second) Tj ET",
        );
        let doc = Document::load_mem(&pdf).unwrap();
        let page_id = first_page(&doc);

        let second_only = Rect::new(105.0, 660.0, 20.0, 20.0);
        assert_eq!(
            extract_text_in_rect(&doc, page_id, &second_only).unwrap(),
            "Second"
        );
    }

    #[test]
    fn tracks_tm_and_tj_arrays() {
        let pdf = create_test_pdf(
            "BT /F1 10 Tf 1 0 0 1 250 500 Tm [(Sp)5(lit)] TJ ET",
        );
        let doc = Document::load_mem(&pdf).unwrap();
        let page_id = first_page(&doc);

        let at_tm = Rect::new(240.0, 490.0, 40.0, 20.0);
        assert_eq!(
            extract_text_in_rect(&doc, page_id, &at_tm).unwrap(),
            "Split"
        );
    }

    #[test]
    fn decodes_utf16be_strings() {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in "Rev A".encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        assert_eq!(decode_pdf_string(&bytes), "Rev A");
        assert_eq!(decode_pdf_string(b"plain"), "plain");
        // Latin-1 fallback for non-UTF-8 bytes
        assert_eq!(decode_pdf_string(&[0xE9]), "\u{e9}");
    }
}
