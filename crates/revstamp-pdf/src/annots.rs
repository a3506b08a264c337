//! lopdf-backed [`DrawingPage`] implementation
//!
//! Maps the engine's annotation snapshot/patch model onto the PDF markup
//! annotation dictionaries: `FreeText` for revision rows and text labels,
//! `Line`/`Polygon`/`PolyLine` for geometric marks. Annotation ids are
//! positions within the page's `Annots` array, so a snapshot taken by
//! [`DrawingPage::annotations`] stays valid for patching as long as nothing
//! is deleted, which the engine never does.

use std::collections::HashMap;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use revstamp_core::{
    Annotation, AnnotationKind, AnnotationPatch, DrawingPage, EngineError, NewAnnotation, Rect,
    SubjectTag,
};
use revstamp_core::SignatureImage;

use crate::textrect::{decode_pdf_string, extract_text_in_rect};

pub struct PdfDrawingPage<'a> {
    doc: &'a mut Document,
    page_id: ObjectId,
}

impl<'a> PdfDrawingPage<'a> {
    pub fn new(doc: &'a mut Document, page_id: ObjectId) -> Self {
        Self { doc, page_id }
    }

    /// The page's `Annots` entries, resolved to a flat array. The array
    /// itself may be inline or indirect; entries are usually references.
    fn annot_entries(&self) -> Result<Vec<Object>, EngineError> {
        let page = self
            .doc
            .get_object(self.page_id)
            .and_then(Object::as_dict)
            .map_err(EngineError::accessor)?;
        let entry = match page.get(b"Annots") {
            Ok(entry) => entry,
            Err(_) => return Ok(Vec::new()),
        };
        let array = match entry {
            Object::Reference(id) => self
                .doc
                .get_object(*id)
                .and_then(Object::as_array)
                .map_err(EngineError::accessor)?,
            Object::Array(array) => array,
            other => {
                return Err(EngineError::Accessor(format!(
                    "Annots is not an array: {other:?}"
                )))
            }
        };
        Ok(array.clone())
    }

    fn resolve_dict<'b>(&'b self, entry: &'b Object) -> Result<&'b Dictionary, EngineError> {
        match entry {
            Object::Reference(id) => self
                .doc
                .get_object(*id)
                .and_then(Object::as_dict)
                .map_err(EngineError::accessor),
            Object::Dictionary(dict) => Ok(dict),
            other => Err(EngineError::Accessor(format!(
                "annotation entry is not a dictionary: {other:?}"
            ))),
        }
    }

    /// Raw dictionary of the annotation at `id`, for copying into another
    /// document.
    pub(crate) fn annotation_object(&self, id: usize) -> Result<Dictionary, EngineError> {
        let entries = self.annot_entries()?;
        let entry = entries
            .get(id)
            .ok_or_else(|| EngineError::Accessor(format!("no annotation {id}")))?;
        Ok(self.resolve_dict(entry)?.clone())
    }

    fn snapshot(&self, id: usize, dict: &Dictionary) -> Option<Annotation> {
        let kind = match dict.get(b"Subtype").ok()?.as_name().ok()? {
            b"FreeText" => AnnotationKind::FreeTextNote,
            b"Line" => AnnotationKind::LineMark,
            b"Polygon" | b"PolyLine" => AnnotationKind::PolygonMark,
            _ => return None,
        };
        let rect = dict
            .get(b"Rect")
            .ok()
            .and_then(|obj| rect_from_object(obj))?;
        let contents = dict
            .get(b"Contents")
            .ok()
            .and_then(string_from_object)
            .unwrap_or_default();
        let rich_text = dict.get(b"RC").ok().and_then(string_from_object);
        let color = dict.get(b"C").ok().and_then(color_from_object);
        let subject = dict
            .get(b"Subj")
            .ok()
            .and_then(string_from_object)
            .map(|s| SubjectTag::parse(&s))
            .unwrap_or(SubjectTag::Unspecified);
        Some(Annotation {
            id,
            kind,
            rect,
            contents,
            rich_text,
            color,
            subject,
        })
    }

    fn annot_dict_mut(&mut self, id: usize) -> Result<&mut Dictionary, EngineError> {
        let entries = self.annot_entries()?;
        let entry = entries
            .get(id)
            .ok_or_else(|| EngineError::Accessor(format!("no annotation {id}")))?;
        if let Ok(object_id) = entry.as_reference() {
            return self
                .doc
                .get_object_mut(object_id)
                .and_then(Object::as_dict_mut)
                .map_err(EngineError::accessor);
        }
        // Inline dictionary entry: mutate it inside the Annots array itself,
        // which may in turn live inline in the page dictionary or indirect.
        let array_id = {
            let page = self
                .doc
                .get_object(self.page_id)
                .and_then(Object::as_dict)
                .map_err(EngineError::accessor)?;
            match page.get(b"Annots") {
                Ok(Object::Reference(rid)) => Some(*rid),
                _ => None,
            }
        };
        let array = match array_id {
            Some(rid) => self
                .doc
                .get_object_mut(rid)
                .and_then(Object::as_array_mut)
                .map_err(EngineError::accessor)?,
            None => self
                .doc
                .get_object_mut(self.page_id)
                .and_then(Object::as_dict_mut)
                .map_err(EngineError::accessor)?
                .get_mut(b"Annots")
                .and_then(Object::as_array_mut)
                .map_err(EngineError::accessor)?,
        };
        array
            .get_mut(id)
            .ok_or_else(|| EngineError::Accessor(format!("no annotation {id}")))?
            .as_dict_mut()
            .map_err(EngineError::accessor)
    }

    /// Register a foreign annotation dictionary and wire it into this page.
    /// Nested references (appearance streams, popups) are deep-copied from
    /// `source` with their ids remapped, so nothing in the adopted graph
    /// points back into the source document.
    pub(crate) fn adopt_annotation(
        &mut self,
        source: &Document,
        dict: &Dictionary,
    ) -> Result<(), EngineError> {
        let mut remap = HashMap::new();
        let mut adopted = self.copy_dict(source, dict, &mut remap)?;
        // The page backlink belongs to the source page; copying it would
        // drag the whole source page tree along.
        adopted.remove(b"P");
        let annot_id = self.doc.add_object(Object::Dictionary(adopted));
        self.push_annotation(annot_id)
    }

    fn copy_object(
        &mut self,
        source: &Document,
        object: &Object,
        remap: &mut HashMap<ObjectId, ObjectId>,
    ) -> Result<Object, EngineError> {
        match object {
            Object::Reference(id) => {
                if let Some(new_id) = remap.get(id) {
                    return Ok(Object::Reference(*new_id));
                }
                // Reserve the id before recursing so reference cycles
                // (popup/parent pairs) terminate.
                let new_id = self.doc.new_object_id();
                remap.insert(*id, new_id);
                let target = source.get_object(*id).map_err(EngineError::accessor)?;
                let copied = self.copy_object(source, target, remap)?;
                self.doc.objects.insert(new_id, copied);
                Ok(Object::Reference(new_id))
            }
            Object::Dictionary(dict) => {
                Ok(Object::Dictionary(self.copy_dict(source, dict, remap)?))
            }
            Object::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(self.copy_object(source, item, remap)?);
                }
                Ok(Object::Array(out))
            }
            Object::Stream(stream) => {
                let dict = self.copy_dict(source, &stream.dict, remap)?;
                Ok(Object::Stream(Stream::new(dict, stream.content.clone())))
            }
            other => Ok(other.clone()),
        }
    }

    fn copy_dict(
        &mut self,
        source: &Document,
        dict: &Dictionary,
        remap: &mut HashMap<ObjectId, ObjectId>,
    ) -> Result<Dictionary, EngineError> {
        let mut out = Dictionary::new();
        for (key, value) in dict.iter() {
            let copied = self.copy_object(source, value, remap)?;
            out.set(key.clone(), copied);
        }
        Ok(out)
    }

    fn push_annotation(&mut self, annot_id: ObjectId) -> Result<(), EngineError> {
        // The Annots array may itself be an indirect object.
        let indirect = {
            let page = self
                .doc
                .get_object(self.page_id)
                .and_then(Object::as_dict)
                .map_err(EngineError::accessor)?;
            match page.get(b"Annots") {
                Ok(Object::Reference(id)) => Some(*id),
                _ => None,
            }
        };
        if let Some(array_id) = indirect {
            let array = self
                .doc
                .get_object_mut(array_id)
                .map_err(EngineError::accessor)?;
            if let Object::Array(ref mut entries) = array {
                entries.push(Object::Reference(annot_id));
                return Ok(());
            }
            return Err(EngineError::Accessor("Annots is not an array".into()));
        }
        let page = self
            .doc
            .get_object_mut(self.page_id)
            .and_then(Object::as_dict_mut)
            .map_err(EngineError::accessor)?;
        if let Ok(Object::Array(ref mut entries)) = page.get_mut(b"Annots") {
            entries.push(Object::Reference(annot_id));
        } else {
            page.set("Annots", Object::Array(vec![Object::Reference(annot_id)]));
        }
        Ok(())
    }
}

impl DrawingPage for PdfDrawingPage<'_> {
    fn annotations(&self) -> Result<Vec<Annotation>, EngineError> {
        let entries = self.annot_entries()?;
        let mut out = Vec::new();
        for (id, entry) in entries.iter().enumerate() {
            let Ok(dict) = self.resolve_dict(entry) else {
                continue;
            };
            if let Some(annot) = self.snapshot(id, dict) {
                out.push(annot);
            }
        }
        Ok(out)
    }

    fn extract_text(&self, rect: &Rect) -> Result<String, EngineError> {
        extract_text_in_rect(self.doc, self.page_id, rect)
    }

    fn add_annotation(&mut self, annot: NewAnnotation) -> Result<(), EngineError> {
        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name(b"Annot".to_vec()));
        dict.set("Subtype", Object::Name(b"FreeText".to_vec()));
        dict.set("Rect", rect_to_object(&annot.rect));
        dict.set("Contents", pdf_string(&annot.contents));
        dict.set("DA", pdf_string(&annot.default_appearance));
        dict.set("DS", pdf_string(&annot.default_style));
        dict.set("RC", pdf_string(&annot.rich_text));
        dict.set("M", pdf_string(&annot.created));
        dict.set("CreationDate", pdf_string(&annot.created));
        dict.set("Subj", pdf_string(annot.subject.as_str()));
        dict.set("T", pdf_string(&annot.author));
        // Print flag; fully opaque; left-justified
        dict.set("F", Object::Integer(4));
        dict.set("CA", Object::Real(1.0));
        dict.set("Q", Object::Integer(0));
        let mut border = Dictionary::new();
        border.set("W", Object::Integer(0));
        dict.set("BS", Object::Dictionary(border));
        dict.set(
            "C",
            Object::Array(vec![
                Object::Real(1.0),
                Object::Real(1.0),
                Object::Real(1.0),
            ]),
        );

        let annot_id = self.doc.add_object(Object::Dictionary(dict));
        self.push_annotation(annot_id)
    }

    fn apply_patch(&mut self, patch: AnnotationPatch) -> Result<(), EngineError> {
        let dict = self.annot_dict_mut(patch.id)?;
        if let Some(contents) = &patch.contents {
            dict.set("Contents", pdf_string(contents));
        }
        if let Some(rich_text) = &patch.rich_text {
            dict.set("RC", pdf_string(rich_text));
        }
        if let Some(da) = &patch.default_appearance {
            dict.set("DA", pdf_string(da));
        }
        if let Some(ds) = &patch.default_style {
            dict.set("DS", pdf_string(ds));
        }
        if let Some(color) = patch.color {
            dict.set(
                "C",
                Object::Array(color.iter().map(|&c| Object::Real(c)).collect()),
            );
        }
        if let Some(modified) = &patch.modified {
            dict.set("M", pdf_string(modified));
        }
        Ok(())
    }

    fn place_signature(&mut self, rect: Rect, image: &SignatureImage) -> Result<(), EngineError> {
        let annot_id = crate::signature::build_stamp(self.doc, &rect, image)?;
        self.push_annotation(annot_id)
    }
}

fn object_f64(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(v) => Some(*v as f64),
        Object::Real(v) => Some(*v as f64),
        _ => None,
    }
}

fn rect_from_object(obj: &Object) -> Option<Rect> {
    let array = obj.as_array().ok()?;
    if array.len() != 4 {
        return None;
    }
    let x1 = object_f64(&array[0])?;
    let y1 = object_f64(&array[1])?;
    let x2 = object_f64(&array[2])?;
    let y2 = object_f64(&array[3])?;
    Some(Rect::new(
        x1.min(x2),
        y1.min(y2),
        (x2 - x1).abs(),
        (y2 - y1).abs(),
    ))
}

fn rect_to_object(rect: &Rect) -> Object {
    Object::Array(vec![
        Object::Real(rect.x as f32),
        Object::Real(rect.y as f32),
        Object::Real(rect.right() as f32),
        Object::Real(rect.top() as f32),
    ])
}

fn string_from_object(obj: &Object) -> Option<String> {
    match obj {
        Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
        _ => None,
    }
}

fn color_from_object(obj: &Object) -> Option<[f32; 3]> {
    let array = obj.as_array().ok()?;
    if array.len() != 3 {
        return None;
    }
    let mut triple = [0.0_f32; 3];
    for (slot, component) in triple.iter_mut().zip(array) {
        *slot = object_f64(component)? as f32;
    }
    Some(triple)
}

/// Encode a text string for a PDF dictionary: ASCII stays literal, anything
/// else is written as BOM-prefixed UTF-16BE.
fn pdf_string(s: &str) -> Object {
    if s.is_ascii() {
        return Object::String(s.as_bytes().to_vec(), StringFormat::Literal);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in s.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Literal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::create_test_pdf;
    use lopdf::dictionary;
    use pretty_assertions::assert_eq;

    fn first_page(doc: &Document) -> ObjectId {
        doc.get_pages().into_values().next().unwrap()
    }

    fn new_row(rect: Rect, contents: &str) -> NewAnnotation {
        NewAnnotation {
            rect,
            contents: contents.to_string(),
            rich_text: format!("<p>{contents}</p>"),
            default_appearance: "/Helvetica-Bold 12 Tf 1 0 0 rg".to_string(),
            default_style: "font: Helvetica,sans-serif 12.00pt; color:#FF0000".to_string(),
            subject: SubjectTag::RevisionRow,
            author: "JKO".to_string(),
            created: "D:20260827000000+00'00'".to_string(),
        }
    }

    #[test]
    fn added_annotation_round_trips_through_snapshot() {
        let pdf = create_test_pdf("");
        let mut doc = Document::load_mem(&pdf).unwrap();
        let page_id = first_page(&doc);
        let mut page = PdfDrawingPage::new(&mut doc, page_id);

        let rect = Rect::new(100.0, 200.0, 440.0, 22.5);
        page.add_annotation(new_row(rect, "B.01  2026-08-27  JKO"))
            .unwrap();

        let annots = page.annotations().unwrap();
        assert_eq!(annots.len(), 1);
        let annot = &annots[0];
        assert_eq!(annot.kind, AnnotationKind::FreeTextNote);
        assert_eq!(annot.rect, rect);
        assert_eq!(annot.contents, "B.01  2026-08-27  JKO");
        assert_eq!(annot.subject, SubjectTag::RevisionRow);
        assert!(annot.rich_text.as_deref().unwrap().contains("B.01"));
    }

    #[test]
    fn round_trips_through_save_and_reload() {
        let pdf = create_test_pdf("");
        let mut doc = Document::load_mem(&pdf).unwrap();
        let page_id = first_page(&doc);
        PdfDrawingPage::new(&mut doc, page_id)
            .add_annotation(new_row(Rect::new(10.0, 10.0, 100.0, 20.0), "A"))
            .unwrap();

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        let mut reloaded = Document::load_mem(&bytes).unwrap();
        let page_id = first_page(&reloaded);
        let page = PdfDrawingPage::new(&mut reloaded, page_id);
        let annots = page.annotations().unwrap();
        assert_eq!(annots.len(), 1);
        assert_eq!(annots[0].contents, "A");
    }

    #[test]
    fn patch_updates_only_the_named_fields() {
        let pdf = create_test_pdf("");
        let mut doc = Document::load_mem(&pdf).unwrap();
        let page_id = first_page(&doc);
        let mut page = PdfDrawingPage::new(&mut doc, page_id);
        page.add_annotation(new_row(Rect::new(10.0, 10.0, 100.0, 20.0), "A.01"))
            .unwrap();

        let mut patch = AnnotationPatch::new(0);
        patch.rich_text = Some("<p>accepted</p>".to_string());
        patch.color = Some([0.0, 0.0, 0.0]);
        page.apply_patch(patch).unwrap();

        let annot = &page.annotations().unwrap()[0];
        assert_eq!(annot.contents, "A.01");
        assert_eq!(annot.rich_text.as_deref(), Some("<p>accepted</p>"));
        assert_eq!(annot.color, Some([0.0, 0.0, 0.0]));
    }

    #[test]
    fn snapshot_skips_unsupported_subtypes_but_keeps_array_ids() {
        let pdf = create_test_pdf("");
        let mut doc = Document::load_mem(&pdf).unwrap();
        let page_id = first_page(&doc);

        // A Square annotation at index 0, then a FreeText at index 1.
        let mut square = Dictionary::new();
        square.set("Type", Object::Name(b"Annot".to_vec()));
        square.set("Subtype", Object::Name(b"Square".to_vec()));
        square.set(
            "Rect",
            Object::Array(vec![0.into(), 0.into(), 10.into(), 10.into()]),
        );
        let square_id = doc.add_object(Object::Dictionary(square));
        let mut page = PdfDrawingPage::new(&mut doc, page_id);
        page.push_annotation(square_id).unwrap();
        page.add_annotation(new_row(Rect::new(10.0, 10.0, 100.0, 20.0), "B"))
            .unwrap();

        let annots = page.annotations().unwrap();
        assert_eq!(annots.len(), 1);
        assert_eq!(annots[0].id, 1);

        let mut patch = AnnotationPatch::new(annots[0].id);
        patch.contents = Some("B.01".to_string());
        page.apply_patch(patch).unwrap();
        assert_eq!(page.annotations().unwrap()[0].contents, "B.01");
    }

    #[test]
    fn inline_annotation_dictionaries_are_patchable() {
        let pdf = create_test_pdf("");
        let mut doc = Document::load_mem(&pdf).unwrap();
        let page_id = first_page(&doc);

        // Some writers inline annotation dictionaries into Annots instead
        // of referencing indirect objects.
        let mut inline = Dictionary::new();
        inline.set("Type", Object::Name(b"Annot".to_vec()));
        inline.set("Subtype", Object::Name(b"FreeText".to_vec()));
        inline.set(
            "Rect",
            Object::Array(vec![0.into(), 0.into(), 100.into(), 20.into()]),
        );
        inline.set("Contents", pdf_string("A.01"));
        {
            let page = doc
                .get_object_mut(page_id)
                .unwrap()
                .as_dict_mut()
                .unwrap();
            page.set("Annots", Object::Array(vec![Object::Dictionary(inline)]));
        }

        let mut page = PdfDrawingPage::new(&mut doc, page_id);
        let annots = page.annotations().unwrap();
        assert_eq!(annots.len(), 1);
        assert_eq!(annots[0].contents, "A.01");

        let mut patch = AnnotationPatch::new(annots[0].id);
        patch.contents = Some("A.02".to_string());
        page.apply_patch(patch).unwrap();
        assert_eq!(page.annotations().unwrap()[0].contents, "A.02");
    }

    #[test]
    fn adopted_annotations_remap_appearance_references() {
        let src_pdf = create_test_pdf("");
        let mut source = Document::load_mem(&src_pdf).unwrap();
        let source_page = first_page(&source);

        let form = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "BBox" => vec![0.into(), 0.into(), 46.into(), 16.into()],
            },
            b"q 1 0 0 1 0 0 cm Q".to_vec(),
        );
        let form_id = source.add_object(form);
        let mut annot = Dictionary::new();
        annot.set("Type", Object::Name(b"Annot".to_vec()));
        annot.set("Subtype", Object::Name(b"FreeText".to_vec()));
        annot.set(
            "Rect",
            Object::Array(vec![0.into(), 0.into(), 100.into(), 20.into()]),
        );
        annot.set("Contents", pdf_string("A.01"));
        annot.set("AP", dictionary! { "N" => Object::Reference(form_id) });
        let annot_id = source.add_object(Object::Dictionary(annot));
        PdfDrawingPage::new(&mut source, source_page)
            .push_annotation(annot_id)
            .unwrap();

        let dict = {
            let page = PdfDrawingPage::new(&mut source, source_page);
            page.annotation_object(0).unwrap()
        };

        let dest_pdf = create_test_pdf("");
        let mut dest = Document::load_mem(&dest_pdf).unwrap();
        let dest_page = first_page(&dest);
        PdfDrawingPage::new(&mut dest, dest_page)
            .adopt_annotation(&source, &dict)
            .unwrap();

        // The appearance reference must resolve to a copy of the Form
        // XObject in the adopting document, not to a foreign id.
        let page_dict = dest.get_object(dest_page).unwrap().as_dict().unwrap();
        let annots = page_dict.get(b"Annots").unwrap().as_array().unwrap();
        let adopted_id = annots.last().unwrap().as_reference().unwrap();
        let adopted = dest.get_object(adopted_id).unwrap().as_dict().unwrap();
        let ap = adopted.get(b"AP").unwrap().as_dict().unwrap();
        let form_ref = ap.get(b"N").unwrap().as_reference().unwrap();
        let stream = dest.get_object(form_ref).unwrap().as_stream().unwrap();
        assert_eq!(
            stream.dict.get(b"Subtype").unwrap().as_name().unwrap(),
            b"Form"
        );
        assert_eq!(stream.content, b"q 1 0 0 1 0 0 cm Q".to_vec());
    }

    #[test]
    fn non_ascii_contents_survive_utf16_encoding() {
        let pdf = create_test_pdf("");
        let mut doc = Document::load_mem(&pdf).unwrap();
        let page_id = first_page(&doc);
        let mut page = PdfDrawingPage::new(&mut doc, page_id);
        page.add_annotation(new_row(Rect::new(0.0, 0.0, 50.0, 10.0), "Révision Ø"))
            .unwrap();
        assert_eq!(page.annotations().unwrap()[0].contents, "Révision Ø");
    }

    #[test]
    fn missing_annots_array_yields_empty_snapshot() {
        let pdf = create_test_pdf("");
        let mut doc = Document::load_mem(&pdf).unwrap();
        let page_id = first_page(&doc);
        let page = PdfDrawingPage::new(&mut doc, page_id);
        assert!(page.annotations().unwrap().is_empty());
    }
}
