//! Metrics of the built-in Helvetica font.

/// Helvetica advances (1/1000 em) for WinAnsi codes 32..=126.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // 32-47
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 48-63
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // 64-79
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 80-95
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // 96-111
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 112-126
];

/// Advance of `c` in Helvetica, for printable ASCII.
pub fn helvetica_advance(c: char) -> Option<u16> {
    let code = c as u32;
    if (32..=126).contains(&code) {
        Some(HELVETICA_WIDTHS[(code - 32) as usize])
    } else {
        None
    }
}

/// Whether a base font name is metric-compatible with Helvetica.
pub fn is_helvetica_like(base_font: &str) -> bool {
    let name = base_font
        .rsplit_once('+')
        .map(|(_, rest)| rest)
        .unwrap_or(base_font)
        .to_ascii_lowercase();
    name.starts_with("helvetica") || name.starts_with("arial")
}
