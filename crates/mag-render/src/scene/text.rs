//! Font loading, text measurement and line wrapping

use super::node::TextStyle;
use crate::constants::{FALLBACK_ADVANCE_RATIO, FALLBACK_ASCENT_RATIO};
use crate::types::{RenderError, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use ttf_parser::{Face, GlyphId};

#[derive(Debug, Clone)]
pub struct LoadedFont {
    pub name: String,
    pub data: Arc<Vec<u8>>,
}

/// Registered font faces, looked up by normalized family or file name.
/// The first registered face is the default.
#[derive(Debug, Clone, Default)]
pub struct FontBook {
    fonts: Vec<LoadedFont>,
    lookup: HashMap<String, usize>,
}

impl FontBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_dirs(dirs: &[PathBuf]) -> Self {
        let mut book = Self::new();
        for dir in dirs {
            book.register_dir(dir);
        }
        log::debug!("Loaded {} font faces", book.fonts.len());
        book
    }

    pub fn register_dir(&mut self, path: impl AsRef<Path>) {
        let Ok(entries) = fs::read_dir(path.as_ref()) else {
            return;
        };
        let mut paths: Vec<PathBuf> = entries.flatten().map(|e| e.path()).collect();
        // Directory order is platform-defined; keep the default face stable
        paths.sort();
        for path in paths {
            if path.is_file() {
                self.register_file(&path);
            }
        }
    }

    pub fn register_file(&mut self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        let Some(ext) = path.extension().and_then(|v| v.to_str()) else {
            return false;
        };
        let ext = ext.to_ascii_lowercase();
        if ext != "ttf" && ext != "otf" {
            return false;
        }
        let Ok(data) = fs::read(path) else {
            return false;
        };
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("font")
            .to_string();
        self.register_bytes(data, &stem).is_ok()
    }

    pub fn register_bytes(&mut self, data: Vec<u8>, source_name: &str) -> Result<String> {
        let family = {
            let face = Face::parse(&data, 0).map_err(|e| {
                RenderError::Config(format!("invalid font data for {source_name}: {e}"))
            })?;
            family_name(&face)
        };

        let name = family.clone().unwrap_or_else(|| source_name.to_string());
        let index = self.fonts.len();
        self.fonts.push(LoadedFont {
            name: name.clone(),
            data: Arc::new(data),
        });

        for alias in [Some(source_name.to_string()), family].into_iter().flatten() {
            let key = normalize_name(&alias);
            if !key.is_empty() {
                self.lookup.entry(key).or_insert(index);
            }
        }
        Ok(name)
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn resolve(&self, name: Option<&str>) -> Option<&LoadedFont> {
        name.and_then(|n| self.lookup.get(&normalize_name(n)))
            .and_then(|index| self.fonts.get(*index))
            .or_else(|| self.fonts.first())
    }

    /// Advance width of `text` in pixels
    pub fn measure(&self, text: &str, style: &TextStyle) -> f32 {
        let fallback = || text.chars().count() as f32 * style.size * FALLBACK_ADVANCE_RATIO;
        let Some(font) = self.resolve(style.font.as_deref()) else {
            return fallback();
        };
        let Ok(face) = Face::parse(&font.data, 0) else {
            return fallback();
        };
        let upem = face.units_per_em().max(1) as f32;
        let scale = style.size / upem;
        text.chars()
            .map(|ch| glyph_advance(&face, ch).map(|adv| adv as f32 * scale))
            .map(|adv| adv.unwrap_or(style.size * FALLBACK_ADVANCE_RATIO))
            .sum()
    }

    /// Distance from the top of the em box to the baseline
    pub fn ascent(&self, style: &TextStyle) -> f32 {
        self.resolve(style.font.as_deref())
            .and_then(|font| {
                let face = Face::parse(&font.data, 0).ok()?;
                let upem = face.units_per_em().max(1) as f32;
                let asc = face.ascender() as f32;
                let desc = face.descender() as f32;
                // Normalize ascent into the em box so mixed fonts share a baseline
                Some(style.size * asc / (asc - desc).max(1.0).max(upem))
            })
            .unwrap_or(style.size * FALLBACK_ASCENT_RATIO)
    }
}

pub(crate) fn glyph_advance(face: &Face<'_>, ch: char) -> Option<u16> {
    let gid = face.glyph_index(ch)?;
    face.glyph_hor_advance(gid)
}

pub(crate) fn glyph_id(face: &Face<'_>, ch: char) -> Option<GlyphId> {
    face.glyph_index(ch)
}

fn family_name(face: &Face<'_>) -> Option<String> {
    face.names()
        .into_iter()
        .filter(|name| name.name_id == ttf_parser::name_id::FAMILY && name.is_unicode())
        .find_map(|name| name.to_string())
}

fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// A wrapped line and its measured width
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub width: f32,
}

/// Greedy word wrap. Explicit newlines always break; words wider than the
/// line are split between characters.
pub fn wrap_text(fonts: &FontBook, content: &str, style: &TextStyle, max_width: f32) -> Vec<TextLine> {
    let content = if style.uppercase {
        content.to_uppercase()
    } else {
        content.to_string()
    };
    let max_width = max_width.max(style.size);
    let mut lines = Vec::new();

    for paragraph in content.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if fonts.measure(&candidate, style) <= max_width {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if fonts.measure(word, style) <= max_width {
                current = word.to_string();
            } else {
                for ch in word.chars() {
                    current.push(ch);
                    if fonts.measure(&current, style) > max_width && current.chars().count() > 1 {
                        current.pop();
                        lines.push(std::mem::take(&mut current));
                        current.push(ch);
                    }
                }
            }
        }
        lines.push(current);
    }

    // A trailing newline should not add a blank line
    while lines.len() > 1 && lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }

    if let Some(max) = style.max_lines {
        if lines.len() > max {
            lines.truncate(max.max(1));
            if let Some(last) = lines.last_mut() {
                let mut clipped = last.trim_end().to_string();
                while !clipped.is_empty()
                    && fonts.measure(&format!("{clipped}…"), style) > max_width
                {
                    clipped.pop();
                }
                *last = format!("{}…", clipped.trim_end());
            }
        }
    }

    lines
        .into_iter()
        .map(|text| TextLine {
            width: fonts.measure(&text, style),
            text,
        })
        .collect()
}
