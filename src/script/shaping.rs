//! Contextual joining and visual reordering for Arabic-script text.
//!
//! Letters are replaced by their Arabic Presentation Forms according to
//! their neighbours, lam-alef pairs become ligatures, and the result is
//! reordered into visual left-to-right order so a renderer that always
//! advances rightwards draws it correctly.
//!
//! Shaping is not idempotent: shaped text must not be shaped again.

use std::borrow::Cow;

use unicode_bidi::BidiInfo;
use unicode_normalization::UnicodeNormalization;

use super::contains_rtl_chars;

const ZWNJ: char = '\u{200C}';
const ZWJ: char = '\u{200D}';
const TATWEEL: char = '\u{0640}';
const LAM: char = '\u{0644}';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Joining {
    /// Joins on both sides.
    Dual,
    /// Joins only to the preceding letter.
    Right,
    /// Never joins.
    NonJoining,
}

/// Presentation forms of one letter.
#[derive(Debug, Clone, Copy)]
struct Forms {
    isolated: char,
    final_: char,
    initial: char,
    medial: char,
    joining: Joining,
}

const fn dual(base: u32) -> Forms {
    Forms {
        isolated: cp(base),
        final_: cp(base + 1),
        initial: cp(base + 2),
        medial: cp(base + 3),
        joining: Joining::Dual,
    }
}

const fn right(base: u32) -> Forms {
    Forms {
        isolated: cp(base),
        final_: cp(base + 1),
        initial: cp(base),
        medial: cp(base + 1),
        joining: Joining::Right,
    }
}

const fn cp(v: u32) -> char {
    match char::from_u32(v) {
        Some(c) => c,
        None => '\u{FFFD}',
    }
}

fn forms(c: char) -> Option<Forms> {
    let f = match c {
        '\u{0621}' => Forms {
            isolated: '\u{FE80}',
            final_: '\u{FE80}',
            initial: '\u{FE80}',
            medial: '\u{FE80}',
            joining: Joining::NonJoining,
        },
        '\u{0622}' => right(0xFE81),
        '\u{0623}' => right(0xFE83),
        '\u{0624}' => right(0xFE85),
        '\u{0625}' => right(0xFE87),
        '\u{0626}' => dual(0xFE89),
        '\u{0627}' => right(0xFE8D),
        '\u{0628}' => dual(0xFE8F),
        '\u{0629}' => right(0xFE93),
        '\u{062A}' => dual(0xFE95),
        '\u{062B}' => dual(0xFE99),
        '\u{062C}' => dual(0xFE9D),
        '\u{062D}' => dual(0xFEA1),
        '\u{062E}' => dual(0xFEA5),
        '\u{062F}' => right(0xFEA9),
        '\u{0630}' => right(0xFEAB),
        '\u{0631}' => right(0xFEAD),
        '\u{0632}' => right(0xFEAF),
        '\u{0633}' => dual(0xFEB1),
        '\u{0634}' => dual(0xFEB5),
        '\u{0635}' => dual(0xFEB9),
        '\u{0636}' => dual(0xFEBD),
        '\u{0637}' => dual(0xFEC1),
        '\u{0638}' => dual(0xFEC5),
        '\u{0639}' => dual(0xFEC9),
        '\u{063A}' => dual(0xFECD),
        TATWEEL => Forms {
            isolated: TATWEEL,
            final_: TATWEEL,
            initial: TATWEEL,
            medial: TATWEEL,
            joining: Joining::Dual,
        },
        '\u{0641}' => dual(0xFED1),
        '\u{0642}' => dual(0xFED5),
        '\u{0643}' => dual(0xFED9),
        LAM => dual(0xFEDD),
        '\u{0645}' => dual(0xFEE1),
        '\u{0646}' => dual(0xFEE5),
        '\u{0647}' => dual(0xFEE9),
        '\u{0648}' => right(0xFEED),
        '\u{0649}' => right(0xFEEF),
        '\u{064A}' => dual(0xFEF1),
        '\u{0671}' => right(0xFB50),
        '\u{067E}' => dual(0xFB56),
        '\u{0686}' => dual(0xFB7A),
        '\u{0698}' => right(0xFB8A),
        '\u{06A9}' => dual(0xFB8E),
        '\u{06AF}' => dual(0xFB92),
        '\u{06C0}' => right(0xFBA4),
        '\u{06CC}' => dual(0xFBFC),
        _ => return None,
    };
    Some(f)
}

/// Isolated and final forms of the lam-alef ligatures.
fn lam_alef(alef: char) -> Option<(char, char)> {
    match alef {
        '\u{0622}' => Some(('\u{FEF5}', '\u{FEF6}')),
        '\u{0623}' => Some(('\u{FEF7}', '\u{FEF8}')),
        '\u{0625}' => Some(('\u{FEF9}', '\u{FEFA}')),
        '\u{0627}' => Some(('\u{FEFB}', '\u{FEFC}')),
        _ => None,
    }
}

/// Combining marks do not interrupt joining.
fn is_transparent(c: char) -> bool {
    matches!(c, '\u{0610}'..='\u{061A}' | '\u{064B}'..='\u{065F}' | '\u{0670}' | '\u{06D6}'..='\u{06ED}')
}

fn joining_of(c: char) -> Option<Joining> {
    if c == ZWJ {
        return Some(Joining::Dual);
    }
    forms(c).map(|f| f.joining)
}

/// Nearest non-transparent neighbour in the given direction.
fn neighbour(chars: &[char], index: usize, forward: bool) -> Option<char> {
    let mut i = index;
    loop {
        if forward {
            i += 1;
            if i >= chars.len() {
                return None;
            }
        } else {
            if i == 0 {
                return None;
            }
            i -= 1;
        }
        if !is_transparent(chars[i]) {
            return Some(chars[i]);
        }
    }
}

/// Replace letters with their contextual presentation forms.
fn join(text: &str) -> String {
    let chars: Vec<char> = text.nfc().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let Some(f) = forms(c) else {
            out.push(c);
            i += 1;
            continue;
        };

        let joins_prev = f.joining != Joining::NonJoining
            && matches!(neighbour(&chars, i, false).and_then(joining_of), Some(Joining::Dual));

        if c == LAM {
            let next = chars.get(i + 1).copied();
            if let Some((isolated, final_)) = next.and_then(lam_alef) {
                out.push(if joins_prev { final_ } else { isolated });
                i += 2;
                continue;
            }
        }

        let joins_next = f.joining == Joining::Dual
            && matches!(
                neighbour(&chars, i, true).and_then(joining_of),
                Some(Joining::Dual) | Some(Joining::Right)
            );

        out.push(match (joins_prev, joins_next) {
            (false, false) => f.isolated,
            (true, false) => f.final_,
            (false, true) => f.initial,
            (true, true) => f.medial,
        });
        i += 1;
    }

    out.retain(|ch| ch != ZWNJ && ch != ZWJ);
    out
}

/// Reorder logical text into visual left-to-right order, paragraph by
/// paragraph.
fn reorder(text: &str) -> String {
    let info = BidiInfo::new(text, None);
    let mut out = String::with_capacity(text.len());
    for para in &info.paragraphs {
        let line: Cow<'_, str> = info.reorder_line(para, para.range.clone());
        out.push_str(&line);
    }
    out
}

/// Split logical text into bidi runs in visual order. Each run keeps its
/// logical character order and is flagged when it reads right to left.
pub fn visual_runs(text: &str) -> Vec<(String, bool)> {
    let info = BidiInfo::new(text, None);
    let mut runs = Vec::new();
    for para in &info.paragraphs {
        let (levels, ranges) = info.visual_runs(para, para.range.clone());
        for range in ranges {
            let rtl = levels.get(range.start).map(|l| l.is_rtl()).unwrap_or(false);
            if let Some(run) = text.get(range).filter(|r| !r.is_empty()) {
                runs.push((run.to_string(), rtl));
            }
        }
    }
    runs
}

/// Join and reorder Arabic-script text for display. Any other text is
/// returned unchanged.
pub fn shape_for_display(text: &str) -> String {
    if !contains_rtl_chars(text) {
        return text.to_string();
    }
    reorder(&join(text))
}
