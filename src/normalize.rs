use std::path::Path;

use deunicode::deunicode_char;
use unicode_normalization::UnicodeNormalization;

/// Separator emitted for every run of characters outside `[a-z0-9]`.
const KEY_SEPARATOR: char = '_';

/// Turns arbitrary text into a lookup key.
///
/// The text is NFC-composed, transliterated to ASCII where an equivalent
/// exists, lowercased, and every run of non-alphanumeric characters is
/// collapsed into a single `_`. Leading and trailing separators are removed,
/// so `normalize(normalize(x)) == normalize(x)` holds for every input.
pub fn normalize(text: &str) -> String {
    let composed: String = text.nfc().collect();
    let transliterated = transliterate(&composed);

    let mut key = String::with_capacity(transliterated.len());
    let mut pending_separator = false;
    for ch in transliterated.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_separator && !key.is_empty() {
                key.push(KEY_SEPARATOR);
            }
            pending_separator = false;
            key.push(ch);
        } else {
            pending_separator = true;
        }
    }

    key
}

/// Builds `<normalize(category)>-<normalize(name)>`.
pub fn composite_key(category: &str, name: &str) -> String {
    format!("{}-{}", normalize(category), normalize(name))
}

/// Drops the final extension of a file name (`Amoxil.png` -> `Amoxil`).
///
/// Dot-files keep their name, matching `Path::file_stem`.
pub fn strip_extension(filename: &str) -> &str {
    Path::new(filename)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(filename)
}

// Characters without an ASCII rendition pass through and become separators
// in `normalize`.
fn transliterate(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch.is_ascii() {
            out.push(ch);
            continue;
        }
        match deunicode_char(ch) {
            Some(ascii) if !ascii.is_empty() => out.push_str(ascii),
            _ => out.push(ch),
        }
    }
    out
}
