//! Registered TrueType/OpenType fonts and variant selection.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use rustybuzz::{Direction, GlyphInfo, GlyphPosition, UnicodeBuffer};

use crate::error::{Error, Result};
use crate::script::{contains_rtl_chars, shape_for_display, visual_runs};

use super::{builtin_width, estimate_width, is_helvetica_like, TextMeasure};

/// Standard 14 font drawn when no registered font applies.
pub const BUILTIN_FONT: &str = "Helvetica";

/// Originals above this size are treated as headings.
const HEADING_SIZE: f32 = 14.0;

/// One glyph of a shaped line, in visual order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapedGlyph {
    pub gid: u16,
    /// Advance after shaping (kerning included), in font units
    pub advance: i32,
    /// Source text the glyph stands for
    pub text: String,
}

/// A parsed font file kept in memory for measuring and embedding.
#[derive(Debug, Clone)]
pub struct FontFace {
    name: String,
    data: Vec<u8>,
    units_per_em: u16,
    ascender: i16,
    descender: i16,
    cap_height: i16,
    bbox: [i16; 4],
    italic_angle: f32,
}

impl FontFace {
    /// Parse font bytes, failing when they are not a usable face.
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Result<Self> {
        let name = name.into();
        let face = ttf_parser::Face::parse(&data, 0)
            .map_err(|e| Error::Font(format!("{}: {}", name, e)))?;

        let units_per_em = face.units_per_em();
        let rect = face.global_bounding_box();
        let ascender = face.ascender();
        let descender = face.descender();
        let cap_height = face.capital_height().unwrap_or(ascender);
        let italic_angle = face.italic_angle().unwrap_or(0.0);

        Ok(Self {
            name,
            data,
            units_per_em,
            ascender,
            descender,
            cap_height,
            bbox: [rect.x_min, rect.y_min, rect.x_max, rect.y_max],
            italic_angle,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw font program.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn units_per_em(&self) -> u16 {
        self.units_per_em
    }

    pub fn ascender(&self) -> i16 {
        self.ascender
    }

    pub fn descender(&self) -> i16 {
        self.descender
    }

    pub fn cap_height(&self) -> i16 {
        self.cap_height
    }

    /// Font bounding box `[x_min, y_min, x_max, y_max]` in font units.
    pub fn bbox(&self) -> [i16; 4] {
        self.bbox
    }

    pub fn italic_angle(&self) -> f32 {
        self.italic_angle
    }

    fn face(&self) -> Option<ttf_parser::Face<'_>> {
        ttf_parser::Face::parse(&self.data, 0).ok()
    }

    /// Glyph id and advance (font units) for each char; `None` where the
    /// font has no glyph.
    pub fn glyphs(&self, text: &str) -> Vec<(char, Option<(u16, u16)>)> {
        let Some(face) = self.face() else {
            return text.chars().map(|c| (c, None)).collect();
        };
        text.chars()
            .map(|c| {
                let glyph = face.glyph_index(c).map(|gid| {
                    let advance = face.glyph_hor_advance(gid).unwrap_or(0);
                    (gid.0, advance)
                });
                (c, glyph)
            })
            .collect()
    }

    /// Default advance of a glyph in font units.
    pub fn glyph_advance(&self, gid: u16) -> u16 {
        self.face()
            .and_then(|face| face.glyph_hor_advance(ttf_parser::GlyphId(gid)))
            .unwrap_or(0)
    }

    /// Shape a line of logical text with the font's own substitution and
    /// positioning tables. Bidi runs are shaped separately in their own
    /// direction and returned in visual order. `None` when the font cannot
    /// be loaded for shaping.
    pub fn shape(&self, text: &str) -> Option<Vec<ShapedGlyph>> {
        let face = rustybuzz::Face::from_slice(&self.data, 0)?;
        let mut glyphs = Vec::new();
        for (run, rtl) in visual_runs(text) {
            let mut buffer = UnicodeBuffer::new();
            buffer.push_str(&run);
            buffer.set_direction(if rtl {
                Direction::RightToLeft
            } else {
                Direction::LeftToRight
            });
            buffer.guess_segment_properties();
            let output = rustybuzz::shape(&face, &[], buffer);
            glyphs.extend(cluster_glyphs(&run, output.glyph_infos(), output.glyph_positions()));
        }
        Some(glyphs)
    }

    /// Width of logical text at `size` points.
    pub fn measure(&self, text: &str, size: f32) -> f32 {
        match self.shape(text) {
            Some(glyphs) => {
                let scale = size / self.units_per_em.max(1) as f32;
                glyphs.iter().map(|g| g.advance as f32 * scale).sum()
            }
            None if contains_rtl_chars(text) => self.measure_shaped(&shape_for_display(text), size),
            None => self.measure_shaped(text, size),
        }
    }

    /// Width of already shaped text at `size` points, one glyph per char.
    /// Chars without a glyph are estimated.
    pub fn measure_shaped(&self, text: &str, size: f32) -> f32 {
        let scale = size / self.units_per_em.max(1) as f32;
        self.glyphs(text)
            .into_iter()
            .map(|(c, glyph)| match glyph {
                Some((_, advance)) => advance as f32 * scale,
                None => estimate_width(&c.to_string(), size),
            })
            .sum()
    }
}

/// Attach to each glyph the source text of its cluster.
fn cluster_glyphs(text: &str, infos: &[GlyphInfo], positions: &[GlyphPosition]) -> Vec<ShapedGlyph> {
    let mut bounds: Vec<usize> = infos.iter().map(|g| g.cluster as usize).collect();
    bounds.push(text.len());
    bounds.sort_unstable();
    bounds.dedup();

    infos
        .iter()
        .zip(positions)
        .map(|(info, pos)| {
            let start = (info.cluster as usize).min(text.len());
            let end = bounds
                .iter()
                .copied()
                .find(|&b| b > start)
                .unwrap_or(text.len());
            ShapedGlyph {
                gid: info.glyph_id as u16,
                advance: pos.x_advance,
                text: text.get(start..end).unwrap_or_default().to_string(),
            }
        })
        .collect()
}

/// Weight/style variant of a family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontVariant {
    Regular,
    Bold,
    Light,
}

impl FontVariant {
    /// Pick a variant from the original font name and size.
    pub fn for_original(font_name: &str, font_size: f32) -> Self {
        let lower = font_name.to_lowercase();
        if lower.contains("bold") || font_size > HEADING_SIZE {
            FontVariant::Bold
        } else if lower.contains("light") {
            FontVariant::Light
        } else {
            FontVariant::Regular
        }
    }

    fn suffixes(self) -> &'static [&'static str] {
        match self {
            FontVariant::Regular => &["", "-Regular"],
            FontVariant::Bold => &["-Bold"],
            FontVariant::Light => &["-Light"],
        }
    }
}

/// Outcome of font selection for one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontChoice<'a> {
    /// A registered font, by registration name.
    Registered(&'a str),
    /// The built-in standard font.
    Builtin,
}

impl<'a> FontChoice<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            FontChoice::Registered(name) => name,
            FontChoice::Builtin => BUILTIN_FONT,
        }
    }
}

/// Fonts available to the renderer, keyed by registration name.
#[derive(Debug, Clone)]
pub struct FontRegistry {
    fonts: BTreeMap<String, FontFace>,
    default_family: String,
}

impl FontRegistry {
    /// Empty registry whose default family is `default_family`.
    pub fn new(default_family: impl Into<String>) -> Self {
        Self {
            fonts: BTreeMap::new(),
            default_family: default_family.into(),
        }
    }

    pub fn default_family(&self) -> &str {
        &self.default_family
    }

    /// Register a font file under `name`.
    pub fn register<P: AsRef<Path>>(&mut self, name: &str, path: P) -> Result<()> {
        let path = path.as_ref();
        let data = fs::read(path)
            .map_err(|e| Error::Font(format!("{}: {}", path.display(), e)))?;
        self.register_bytes(name, data)
    }

    /// Register in-memory font data under `name`.
    pub fn register_bytes(&mut self, name: &str, data: Vec<u8>) -> Result<()> {
        let face = FontFace::from_bytes(name, data)?;
        log::debug!("Registered font {} ({} units/em)", name, face.units_per_em());
        self.fonts.insert(name.to_string(), face);
        Ok(())
    }

    /// Register every `.ttf`/`.otf` in `dir` by file stem. A missing
    /// directory registers nothing; unreadable fonts are skipped.
    pub fn load_dir<P: AsRef<Path>>(&mut self, dir: P) -> Result<usize> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            log::warn!("Font directory {} not found", dir.display());
            return Ok(0);
        }

        let mut entries: Vec<_> = fs::read_dir(dir)?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .map(|e| e.eq_ignore_ascii_case("ttf") || e.eq_ignore_ascii_case("otf"))
                    .unwrap_or(false)
            })
            .collect();
        entries.sort();

        let mut count = 0;
        for path in entries {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match self.register(stem, &path) {
                Ok(()) => count += 1,
                Err(e) => log::warn!("Skipping font {}: {}", path.display(), e),
            }
        }
        Ok(count)
    }

    /// Registered font names in sorted order.
    pub fn list_available(&self) -> Vec<&str> {
        self.fonts.keys().map(String::as_str).collect()
    }

    pub fn get(&self, name: &str) -> Option<&FontFace> {
        self.fonts.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    fn family_member(&self, family: &str, variant: FontVariant) -> Option<&str> {
        variant.suffixes().iter().find_map(|suffix| {
            let candidate = format!("{}{}", family, suffix);
            self.fonts
                .get_key_value(candidate.as_str())
                .map(|(k, _)| k.as_str())
        })
    }

    /// Font for an element originally set in `original_font` at
    /// `original_size`: the wanted variant of the default family, then its
    /// regular member, then any registered font, then the built-in font.
    pub fn choose(&self, original_font: &str, original_size: f32) -> FontChoice<'_> {
        let variant = FontVariant::for_original(original_font, original_size);
        let family = self.default_family.as_str();

        if let Some(name) = self.family_member(family, variant) {
            return FontChoice::Registered(name);
        }
        if let Some(name) = self.family_member(family, FontVariant::Regular) {
            log::debug!("No {:?} variant of {}, using {}", variant, family, name);
            return FontChoice::Registered(name);
        }
        match self.fonts.keys().next() {
            Some(name) => FontChoice::Registered(name.as_str()),
            None => FontChoice::Builtin,
        }
    }
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::new("Vazirmatn")
    }
}

impl TextMeasure for FontRegistry {
    fn text_width(&self, text: &str, font: &str, size: f32) -> f32 {
        if text.trim().is_empty() {
            return 0.0;
        }
        match self.fonts.get(font) {
            Some(face) => face.measure(text, size),
            None if is_helvetica_like(font) => builtin_width(text, size),
            None => estimate_width(text, size),
        }
    }
}
