//! Anchored grammars for revision-block content and markup tokens

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Revision label: a capital letter with an optional two-digit minor
    /// counter, e.g. "A" or "B.01". Trailing spaces are tolerated because
    /// title-block textboxes often pad their content.
    pub static ref REVISION_LABEL: Regex =
        Regex::new(r"^([A-Z])(?:\.([0-9]{2}))?\s*$").unwrap();

    /// Change-request code: "FCR" (any case) followed by six digits.
    pub static ref CHANGE_REQUEST: Regex =
        Regex::new(r"^[Ff][Cc][Rr]\s*[0-9]{6}\s*$").unwrap();

    /// Hex color token whose red channel is near 0xFF. Markup produced by
    /// common viewers writes the full six-digit token, so matching the
    /// leading byte range 0xF8-0xFF is enough to call it red.
    pub static ref HIGH_RED_TOKEN: Regex =
        Regex::new(r"#[Ff][89A-Fa-f][0-9A-Fa-f]{4}").unwrap();

    /// Font size embedded in a retained-markup span ("font-size:12pt").
    pub static ref FONT_SIZE: Regex =
        Regex::new(r"font-size:([0-9]+)(?:\.[0-9]+)?pt").unwrap();
}

/// The pure-black token that marks formally accepted markup.
pub const BLACK_TOKEN: &str = "#000000";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revision_label_matches_plain_and_suffixed() {
        assert!(REVISION_LABEL.is_match("A"));
        assert!(REVISION_LABEL.is_match("B.01"));
        assert!(REVISION_LABEL.is_match("Z.99  "));
        assert!(!REVISION_LABEL.is_match("a"));
        assert!(!REVISION_LABEL.is_match("A.1"));
        assert!(!REVISION_LABEL.is_match("AB"));
        assert!(!REVISION_LABEL.is_match("A.001"));
    }

    #[test]
    fn revision_label_is_anchored_not_substring() {
        assert!(!REVISION_LABEL.is_match("rev A.01 final"));
        assert!(!REVISION_LABEL.is_match(" A"));
    }

    #[test]
    fn change_request_matches_case_insensitively() {
        assert!(CHANGE_REQUEST.is_match("FCR 123456"));
        assert!(CHANGE_REQUEST.is_match("fcr123456"));
        assert!(CHANGE_REQUEST.is_match("Fcr  123456 "));
        assert!(!CHANGE_REQUEST.is_match("FCR 12345"));
        assert!(!CHANGE_REQUEST.is_match("FCR 1234567"));
        assert!(!CHANGE_REQUEST.is_match("see FCR 123456"));
    }

    #[test]
    fn high_red_token_detection() {
        assert!(HIGH_RED_TOKEN.is_match("color:#FF0000;font"));
        assert!(HIGH_RED_TOKEN.is_match("color:#fa1010"));
        assert!(!HIGH_RED_TOKEN.is_match("color:#000000"));
        assert!(!HIGH_RED_TOKEN.is_match("color:#7F0000"));
    }

    #[test]
    fn font_size_extraction() {
        let caps = FONT_SIZE.captures("style=\"font-size:14pt;color:#000000\"");
        assert_eq!(caps.unwrap().get(1).unwrap().as_str(), "14");
    }
}
