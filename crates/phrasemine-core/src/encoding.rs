//! Declared-encoding detection for document bytes.
//!
//! FB2/XML documents name their encoding in the prologue. The detector
//! checks a byte-order mark first, then sniffs the leading bytes for an
//! `encoding="…"` declaration (also through a UTF-16LE view, where the
//! declaration hides behind interleaved NULs). Ambiguity is not an error:
//! the fallback is lossy UTF-8.

use std::sync::LazyLock;

use encoding_rs::Encoding;

/// Number of leading bytes inspected for an encoding declaration.
const SNIFF_LEN: usize = 200;

static DECLARED_BYTES: LazyLock<regex::bytes::Regex> = LazyLock::new(|| {
    regex::bytes::Regex::new(r#"encoding\s*[=:]\s*['"]([^'"]+)['"]"#).expect("valid regex")
});

static DECLARED_TEXT: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r#"encoding\s*[=:]\s*['"]([^'"]+)['"]"#).expect("valid regex")
});

/// Returns the encoding declared in the document header, if any.
pub fn declared_encoding(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = &bytes[..bytes.len().min(SNIFF_LEN)];
    if let Some(caps) = DECLARED_BYTES.captures(head) {
        return Encoding::for_label(caps.get(1)?.as_bytes());
    }
    let (head_utf16, _, _) = encoding_rs::UTF_16LE.decode(head);
    if let Some(caps) = DECLARED_TEXT.captures(&head_utf16) {
        return Encoding::for_label(caps.get(1)?.as_str().as_bytes());
    }
    None
}

/// Decodes document bytes to text.
///
/// Order: byte-order mark, declared encoding, then UTF-8 with lossy
/// replacement.
pub fn decode_text(bytes: &[u8]) -> String {
    let encoding = Encoding::for_bom(bytes)
        .map(|(encoding, _)| encoding)
        .or_else(|| declared_encoding(bytes))
        .unwrap_or(encoding_rs::UTF_8);
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::debug!(
            encoding = encoding.name(),
            "replacement characters during decode"
        );
    }
    text.into_owned()
}
