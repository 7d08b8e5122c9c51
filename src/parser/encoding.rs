//! Single-byte Latin text handling for registry and catalog files.
//!
//! Registry files are produced by legacy systems in a Latin code page.
//! Decoding never fails: every byte maps to a character.

use encoding_rs::WINDOWS_1252;
use std::borrow::Cow;

/// Decode a Latin-encoded byte slice
pub fn decode_latin1(bytes: &[u8]) -> Cow<'_, str> {
    let (text, _had_errors) = WINDOWS_1252.decode_without_bom_handling(bytes);
    text
}

/// Encode text back to the registry code page.
///
/// Characters outside the code page are written as numeric character
/// references.
pub fn encode_latin1(text: &str) -> Cow<'_, [u8]> {
    let (bytes, _encoding, _had_unmappable) = WINDOWS_1252.encode(text);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_accented_bytes() {
        // "Peña" and "Córdoba" in Latin-1
        assert_eq!(decode_latin1(b"Pe\xf1a"), "Peña");
        assert_eq!(decode_latin1(b"C\xf3rdoba"), "Córdoba");
    }

    #[test]
    fn test_encode_is_inverse_of_decode() {
        let raw: &[u8] = b"Jos\xe9|Mu\xf1oz|\xc1lvarez";
        let text = decode_latin1(raw);
        assert_eq!(encode_latin1(&text).as_ref(), raw);
    }

    #[test]
    fn test_ascii_passes_through_borrowed() {
        assert!(matches!(decode_latin1(b"20123456789"), Cow::Borrowed(_)));
    }
}
