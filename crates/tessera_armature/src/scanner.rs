//! Byte-level scanning helpers.

use std::borrow::Cow;

use tessera_carton::CompactString;

/// Character codes for fast comparison
pub mod char_codes {
    pub const TAB: u8 = 0x09;
    pub const NEWLINE: u8 = 0x0A;
    pub const FORM_FEED: u8 = 0x0C;
    pub const CARRIAGE_RETURN: u8 = 0x0D;
    pub const SPACE: u8 = 0x20;
    pub const EXCLAMATION_MARK: u8 = 0x21;
    pub const DOUBLE_QUOTE: u8 = 0x22;
    pub const SINGLE_QUOTE: u8 = 0x27;
    pub const SLASH: u8 = 0x2F;
    pub const LT: u8 = 0x3C;
    pub const EQ: u8 = 0x3D;
    pub const GT: u8 = 0x3E;
}

use char_codes::*;

/// Check if character is whitespace
#[inline]
pub fn is_whitespace(c: u8) -> bool {
    c == SPACE || c == NEWLINE || c == TAB || c == FORM_FEED || c == CARRIAGE_RETURN
}

/// Check if character can start a tag name (a-z, A-Z)
#[inline]
pub fn is_tag_start_char(c: u8) -> bool {
    c.is_ascii_alphabetic()
}

/// Check if character may continue a tag name
#[inline]
pub fn is_tag_name_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'-' || c == b':' || c == b'_' || c == b'.'
}

/// Check if character ends an attribute name
#[inline]
pub fn is_end_of_attr_name(c: u8) -> bool {
    is_whitespace(c) || c == EQ || c == GT || c == SLASH
}

/// Check if character ends an unquoted attribute value
#[inline]
pub fn is_end_of_unquoted_value(c: u8) -> bool {
    is_whitespace(c) || c == GT
}

/// Collapse whitespace runs into single spaces.
///
/// Whitespace-only text containing a newline is dropped entirely.
pub fn condense_whitespace(text: &str) -> Option<CompactString> {
    if text.is_empty() {
        return None;
    }
    if text.bytes().all(is_whitespace) {
        if text.contains('\n') {
            return None;
        }
        return Some(CompactString::new(" "));
    }

    let mut out = CompactString::with_capacity(text.len());
    let mut last_was_space = false;
    for c in text.chars() {
        if c.is_ascii() && is_whitespace(c as u8) {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(c);
            last_was_space = false;
        }
    }
    Some(out)
}

/// Decode character references.
///
/// Named references outside the small built-in table are left untouched.
pub fn decode_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let candidate = &rest[amp..];
        match candidate.find(';') {
            Some(semi) if semi <= 10 => {
                let name = &candidate[1..semi];
                if let Some(decoded) = decode_reference(name) {
                    out.push(decoded);
                    rest = &candidate[semi + 1..];
                    continue;
                }
                out.push('&');
                rest = &candidate[1..];
            }
            _ => {
                out.push('&');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn decode_reference(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let digits = name.strip_prefix('#')?;
            let code = match digits.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => digits.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        }
    }
}

/// Find `needle` in `haystack` ignoring ASCII case.
pub fn find_ignore_ascii_case(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    (0..=haystack.len() - needle.len())
        .find(|&i| haystack[i..i + needle.len()].eq_ignore_ascii_case(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condense() {
        assert_eq!(condense_whitespace("a   b\n c").as_deref(), Some("a b c"));
        assert_eq!(condense_whitespace("  ").as_deref(), Some(" "));
        assert_eq!(condense_whitespace("\n   ").as_deref(), None);
        assert_eq!(condense_whitespace("").as_deref(), None);
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("a &amp; b"), "a & b");
        assert_eq!(decode_entities("&lt;p&gt;"), "<p>");
        assert_eq!(decode_entities("&#65;&#x42;"), "AB");
        assert_eq!(decode_entities("&unknown; &"), "&unknown; &");
        assert!(matches!(decode_entities("plain"), Cow::Borrowed("plain")));
    }

    #[test]
    fn test_find_ignore_case() {
        assert_eq!(find_ignore_ascii_case(b"abc</TEXTAREA>", b"</textarea"), Some(3));
        assert_eq!(find_ignore_ascii_case(b"abc", b"</textarea"), None);
    }
}
