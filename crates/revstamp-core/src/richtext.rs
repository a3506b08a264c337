//! Retained-markup and appearance generators
//!
//! Pure formatting functions: identical inputs always produce byte-identical
//! output. The XHTML body fragment matches what desktop viewers write into
//! the RC entry, so regenerated annotations render the same as hand-made
//! ones.

use crate::patterns::FONT_SIZE;

pub const DEFAULT_FONT_SIZE: u32 = 12;

/// Font size of the zero-width spacer paragraph prefixed to wide
/// revision-block rows so their baseline lines up with adjacent rows.
const SPACER_FONT_SIZE: u32 = 2;

const BODY_OPEN: &str = concat!(
    "<?xml version=\"1.0\"?>",
    "<body xmlns=\"http://www.w3.org/1999/xhtml\"",
    " xmlns:xfa=\"http://www.xfa.org/schema/xfa-data/1.0/\"",
    " xfa:APIVersion=\"Acrobat:11.0.0\" xfa:spec=\"2.0.2\">"
);
const BODY_CLOSE: &str = "</body>";

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

fn paragraph(font_size: u32, color_hex: &str, text: &str) -> String {
    format!(
        "<p dir=\"ltr\"><span style=\"text-align:left;font-size:{}pt;\
         font-style:normal;font-weight:bold;color:{};font-family:Helvetica\">{}\
         </span></p>",
        font_size,
        color_hex,
        escape_xml(text)
    )
}

/// Minimal styled fragment: a single bold, left-aligned Helvetica paragraph.
pub fn render_markup(font_size: u32, color_hex: &str, text: &str) -> String {
    format!(
        "{}{}{}",
        BODY_OPEN,
        paragraph(font_size, color_hex, text),
        BODY_CLOSE
    )
}

/// Markup for the wide revision-block row: an empty spacer paragraph at a
/// tiny size ahead of the content paragraph normalizes baseline alignment.
pub fn render_revision_block_markup(font_size: u32, color_hex: &str, text: &str) -> String {
    format!(
        "{}{}{}{}",
        BODY_OPEN,
        paragraph(SPACER_FONT_SIZE, color_hex, ""),
        paragraph(font_size, color_hex, text),
        BODY_CLOSE
    )
}

/// Default-appearance descriptor consumed by the document accessor: bold
/// Helvetica at the given size and fill color.
pub fn default_appearance(font_size: u32, color: [f32; 3]) -> String {
    format!(
        "/Helvetica-Bold {} Tf {} {} {} rg",
        font_size, color[0], color[1], color[2]
    )
}

/// Default-style string paired with the retained markup.
pub fn default_style(font_size: u32, color_hex: &str) -> String {
    format!(
        "font: Helvetica,sans-serif {}.00pt; color:{}",
        font_size, color_hex
    )
}

/// Recover the font size from an existing retained-markup fragment, so a
/// regenerated row keeps the size it was stamped with.
pub fn font_size_from_markup(markup: &str) -> Option<u32> {
    FONT_SIZE
        .captures_iter(markup)
        .last()
        .and_then(|caps| caps[1].parse().ok())
}

/// Parse "#RRGGBB" (leading '#' optional) into a [0, 1] triple; malformed
/// input falls back to black.
pub fn parse_hex_color(color: &str) -> [f32; 3] {
    fn channel(pair: &str) -> f32 {
        u8::from_str_radix(pair, 16).unwrap_or(0) as f32 / 255.0
    }
    let hex = color.trim_start_matches('#');
    // str::get keeps multibyte input from slicing mid-character.
    match (hex.get(0..2), hex.get(2..4), hex.get(4..6)) {
        (Some(r), Some(g), Some(b)) => [channel(r), channel(g), channel(b)],
        _ => [0.0, 0.0, 0.0],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn markup_carries_size_color_and_text() {
        let markup = render_markup(14, "#FF0000", "FCR 123456");
        assert!(markup.contains("font-size:14pt"));
        assert!(markup.contains("color:#FF0000"));
        assert!(markup.contains(">FCR 123456</span>"));
        assert!(markup.starts_with("<?xml"));
        assert!(markup.ends_with("</body>"));
    }

    #[test]
    fn revision_block_markup_prefixes_spacer_paragraph() {
        let markup = render_revision_block_markup(12, "#FF0000", "B.01");
        let spacer_at = markup.find("font-size:2pt").unwrap();
        let content_at = markup.find("font-size:12pt").unwrap();
        assert!(spacer_at < content_at);
        assert!(markup.contains(">B.01</span>"));
    }

    #[test]
    fn text_is_xml_escaped() {
        let markup = render_markup(12, "#000000", "fit & weld <3mm>");
        assert!(markup.contains("fit &amp; weld &lt;3mm&gt;"));
    }

    #[test]
    fn appearance_descriptors_are_stable() {
        assert_eq!(
            default_appearance(12, [1.0, 0.0, 0.0]),
            "/Helvetica-Bold 12 Tf 1 0 0 rg"
        );
        assert_eq!(
            default_style(12, "#000000"),
            "font: Helvetica,sans-serif 12.00pt; color:#000000"
        );
    }

    #[test]
    fn font_size_round_trips_through_markup() {
        let markup = render_revision_block_markup(16, "#FF0000", "A");
        // the spacer paragraph comes first; recovery must read the content one
        assert_eq!(font_size_from_markup(&markup), Some(16));
        assert_eq!(font_size_from_markup("no style here"), None);
    }

    #[test]
    fn hex_color_parsing() {
        assert_eq!(parse_hex_color("#FF0000"), [1.0, 0.0, 0.0]);
        assert_eq!(parse_hex_color("000000"), [0.0, 0.0, 0.0]);
        assert_eq!(parse_hex_color("#bad"), [0.0, 0.0, 0.0]);
        // multibyte input must not slice mid-character
        assert_eq!(parse_hex_color("#héllo!"), [0.0, 0.0, 0.0]);
        assert_eq!(parse_hex_color("ééé"), [0.0, 0.0, 0.0]);
    }

    proptest! {
        #[test]
        fn render_markup_is_pure(size in 4u32..40, text in "[ -~]{0,40}") {
            let a = render_markup(size, "#FF0000", &text);
            let b = render_markup(size, "#FF0000", &text);
            prop_assert_eq!(a, b);
        }
    }
}
