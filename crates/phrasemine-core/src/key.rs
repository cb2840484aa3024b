//! Canonical phrase keys.
//!
//! A phrase key is an ordered word-id sequence encoded as the decimal ids
//! joined by [`ID_SEPARATOR`]. The separator cannot occur inside a decimal
//! id, so the encoding is reversible: `decode(encode(seq)) == Some(seq)`.

use crate::words::WordId;

/// Separator between word ids inside a phrase key.
pub const ID_SEPARATOR: char = '_';

/// Encodes an id sequence as its canonical key.
pub fn encode(ids: &[WordId]) -> String {
    let mut key = String::new();
    for id in ids {
        if !key.is_empty() {
            key.push(ID_SEPARATOR);
        }
        key.push_str(&id.to_string());
    }
    key
}

/// Decodes a canonical key back into its id sequence.
///
/// Returns `None` for strings not produced by [`encode`].
pub fn decode(key: &str) -> Option<Vec<WordId>> {
    if key.is_empty() {
        return None;
    }
    key.split(ID_SEPARATOR).map(|part| part.parse().ok()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let ids = vec![1, 42, 7, 42];
        assert_eq!(decode(&encode(&ids)), Some(ids));
    }

    #[test]
    fn single_id() {
        assert_eq!(encode(&[9]), "9");
        assert_eq!(decode("9"), Some(vec![9]));
    }

    #[test]
    fn rejects_malformed_keys() {
        assert_eq!(decode(""), None);
        assert_eq!(decode("1__2"), None);
        assert_eq!(decode("1_x"), None);
        assert_eq!(decode("_1"), None);
    }
}
