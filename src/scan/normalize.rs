//! OCR text normalization
//!
//! Rewrites glyphs the engine commonly confuses with digits and collapses
//! whitespace runs. Total function, applied once before candidate
//! extraction.

/// Normalize raw recognition output
///
/// Substitutions: `o`/`O` -> `0`, `l`/`I`/`|` -> `1`, `s`/`S` -> `5`,
/// `b`/`B` -> `6`. Whitespace runs collapse to a single space.
pub fn normalize_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());

    for c in raw.chars() {
        let mapped = match c {
            'o' | 'O' => '0',
            'l' | 'I' | '|' => '1',
            's' | 'S' => '5',
            'b' | 'B' => '6',
            c if c.is_whitespace() => ' ',
            c => c,
        };

        if mapped == ' ' && out.ends_with(' ') {
            continue;
        }
        out.push(mapped);
    }

    out
}
