//! Default text preprocessing.
//!
//! Documents arrive as FB2/XML-ish markup or plain text. Before
//! tokenization the pipeline replaces tags with line breaks (so removed
//! markup never glues two unrelated words into a phrase), drops
//! `<description>` and `<binary>` payloads wholesale, decodes character
//! entities and folds typographic apostrophes to `'`.

use std::sync::LazyLock;

use regex::Regex;

/// Markup stripped before tokenization: metadata/binary payloads and
/// opening/closing/processing-instruction tags.
static MARKUP_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?is)<description>.*?</description>",
        r"|<binary .*?</binary>",
        r"|<[a-zA-Z][\w\-]*(?:\s[^\r\n>]*)?/?>",
        r"|</[a-zA-Z][\w\-]*>",
        r"|<\?[a-zA-Z][\w\-]*(?:\s[^\r\n>]*)?\?>",
    ))
    .expect("valid regex")
});

/// Typographic apostrophe variants folded to `'`.
static APOSTROPHE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[\u{2019}\u{2018}\u{0092}`\u{00B4}]").expect("valid regex"));

/// Replaces markup with line breaks and decodes character entities.
pub fn strip_markup(text: &str) -> String {
    let stripped = MARKUP_PATTERN.replace_all(text, "\r\n");
    decode_entities(&stripped)
}

/// Folds typographic apostrophe variants to a plain `'`.
pub fn fix_apostrophes(text: &str) -> String {
    APOSTROPHE_PATTERN.replace_all(text, "'").into_owned()
}

/// Default preprocessing: [`strip_markup`] then [`fix_apostrophes`].
pub fn preprocess_default(text: &str) -> String {
    fix_apostrophes(&strip_markup(text))
}

/// Longest entity body considered, `&#x10FFFF;` being the longest sane one.
const MAX_ENTITY_LEN: usize = 12;

/// Decodes the common named character entities and numeric references.
/// Unrecognized references pass through unchanged.
fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        let body_end = rest[1..].find(';');
        match body_end {
            Some(end) if end > 0 && end <= MAX_ENTITY_LEN => {
                let name = &rest[1..=end];
                if let Some(ch) = entity_char(name) {
                    out.push(ch);
                    rest = &rest[end + 2..];
                } else {
                    out.push('&');
                    rest = &rest[1..];
                }
            }
            _ => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn entity_char(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let body = name.strip_prefix('#')?;
            let code = if let Some(hex) = body.strip_prefix(['x', 'X']) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                body.parse().ok()?
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_become_line_breaks() {
        assert_eq!(strip_markup("a<p>b</p>c"), "a\r\nb\r\nc");
    }

    #[test]
    fn tags_with_attributes_are_stripped() {
        assert_eq!(
            strip_markup(r#"x <img src="y.png"/> z"#),
            "x \r\n z"
        );
    }

    #[test]
    fn description_payload_is_dropped_wholesale() {
        let text = "<description><author>Nobody</author></description>body";
        assert_eq!(strip_markup(text), "\r\nbody");
    }

    #[test]
    fn processing_instructions_are_stripped() {
        assert_eq!(
            strip_markup("<?xml version=\"1.0\"?>text"),
            "\r\ntext"
        );
    }

    #[test]
    fn entities_are_decoded() {
        assert_eq!(strip_markup("Tom &amp; Jerry &#33;"), "Tom & Jerry !");
        assert_eq!(strip_markup("&lt;kept&gt;"), "<kept>");
    }

    #[test]
    fn unknown_entities_pass_through() {
        assert_eq!(strip_markup("R&D; A&B"), "R&D; A&B");
    }

    #[test]
    fn typographic_apostrophes_are_folded() {
        assert_eq!(fix_apostrophes("don\u{2019}t won`t"), "don't won't");
    }

    #[test]
    fn plain_text_is_unchanged() {
        assert_eq!(preprocess_default("just words"), "just words");
    }
}
