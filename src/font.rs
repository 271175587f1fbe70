//! Font loading and glyph atlas packing for the telemetry overlay.
//!
//! The printable ASCII range is rasterised once with fontdue and packed row by
//! row into a single-channel bitmap. [`FontAtlas::layout`] turns a string into
//! pixel-space quads that the backend converts into textured triangles.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use fontdue::{Font, FontSettings};
use glam::Vec2;

use crate::error::{Error, Result};

/// Fonts tried, in order, when no path is given on the command line.
pub const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

const ATLAS_PADDING: u32 = 1;
const INITIAL_ATLAS_SIZE: u32 = 512;

/// Read font bytes from `path`, or from the first system font that exists.
pub fn load_font_data(path: Option<&Path>) -> Result<(PathBuf, Vec<u8>)> {
    if let Some(path) = path {
        return Ok((path.to_path_buf(), std::fs::read(path)?));
    }

    for candidate in SYSTEM_FONT_CANDIDATES.iter().map(Path::new) {
        match std::fs::read(candidate) {
            Ok(data) => return Ok((candidate.to_path_buf(), data)),
            Err(err) => tracing::trace!(path = %candidate.display(), "font not usable: {err}"),
        }
    }
    Err(Error::Font("no system font found; pass one with --font".to_owned()))
}

/// Where a glyph lives in the atlas and how to place it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlyphInfo {
    /// UV rectangle (x, y, width, height) normalised to [0, 1], top-down.
    pub uv: [f32; 4],
    pub width: u32,
    pub height: u32,
    /// Offset of the bitmap's bottom-left corner from the pen position.
    pub offset_x: f32,
    pub offset_y: f32,
    pub advance: f32,
}

/// A positioned glyph in pixel space, y pointing up.
///
/// `uv_min` is the atlas coordinate of the glyph's top-left texel and belongs
/// at `(min.x, max.y)`; `uv_max` belongs at `(max.x, min.y)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlyphQuad {
    pub min: Vec2,
    pub max: Vec2,
    pub uv_min: Vec2,
    pub uv_max: Vec2,
}

/// A rasterised glyph waiting to be packed.
struct RasterGlyph {
    ch: char,
    width: u32,
    height: u32,
    xmin: f32,
    ymin: f32,
    advance: f32,
    bitmap: Vec<u8>,
}

/// A packed glyph atlas with its single-channel coverage bitmap.
pub struct FontAtlas {
    bitmap: Vec<u8>,
    width: u32,
    height: u32,
    glyphs: HashMap<char, GlyphInfo>,
    size: f32,
}

impl FontAtlas {
    /// Rasterise printable ASCII from TTF/OTF bytes at `size` pixels.
    pub fn from_bytes(data: &[u8], size: f32) -> Result<Self> {
        let font = Font::from_bytes(data, FontSettings::default())
            .map_err(|err| Error::Font(err.to_owned()))?;

        let glyphs = (32u8..=126u8)
            .map(char::from)
            .map(|ch| {
                let (metrics, bitmap) = font.rasterize(ch, size);
                RasterGlyph {
                    ch,
                    width: metrics.width as u32,
                    height: metrics.height as u32,
                    xmin: metrics.xmin as f32,
                    ymin: metrics.ymin as f32,
                    advance: metrics.advance_width,
                    bitmap,
                }
            })
            .collect();

        Ok(Self::pack(glyphs, size))
    }

    fn pack(glyphs: Vec<RasterGlyph>, size: f32) -> Self {
        let sizes: Vec<(u32, u32)> = glyphs.iter().map(|g| (g.width, g.height)).collect();
        let (width, height, positions) = pack_rows(&sizes);

        let mut bitmap = vec![0u8; (width * height) as usize];
        let mut infos = HashMap::with_capacity(glyphs.len());

        for (glyph, (x, y)) in glyphs.iter().zip(positions) {
            for row in 0..glyph.height {
                let src = (row * glyph.width) as usize;
                let dst = ((y + row) * width + x) as usize;
                let len = glyph.width as usize;
                bitmap[dst..dst + len].copy_from_slice(&glyph.bitmap[src..src + len]);
            }

            infos.insert(
                glyph.ch,
                GlyphInfo {
                    uv: [
                        x as f32 / width as f32,
                        y as f32 / height as f32,
                        glyph.width as f32 / width as f32,
                        glyph.height as f32 / height as f32,
                    ],
                    width: glyph.width,
                    height: glyph.height,
                    offset_x: glyph.xmin,
                    offset_y: glyph.ymin,
                    advance: glyph.advance,
                },
            );
        }

        Self {
            bitmap,
            width,
            height,
            glyphs: infos,
            size,
        }
    }

    pub fn glyph(&self, c: char) -> Option<&GlyphInfo> {
        self.glyphs.get(&c)
    }

    /// Pixel size the glyphs were rasterised at.
    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major coverage values, `width × height` bytes.
    pub fn bitmap(&self) -> &[u8] {
        &self.bitmap
    }

    /// Lay out `text` with its baseline starting at `(x, y)`, scaled by `scale`.
    ///
    /// Characters missing from the atlas advance by half the font size.
    pub fn layout(&self, text: &str, x: f32, y: f32, scale: f32) -> Vec<GlyphQuad> {
        let mut quads = Vec::with_capacity(text.len());
        let mut pen = x;

        for ch in text.chars() {
            let Some(glyph) = self.glyphs.get(&ch) else {
                pen += self.size * 0.5 * scale;
                continue;
            };

            if glyph.width > 0 && glyph.height > 0 {
                let min = Vec2::new(pen + glyph.offset_x * scale, y + glyph.offset_y * scale);
                let max = min + Vec2::new(glyph.width as f32, glyph.height as f32) * scale;
                quads.push(GlyphQuad {
                    min,
                    max,
                    uv_min: Vec2::new(glyph.uv[0], glyph.uv[1]),
                    uv_max: Vec2::new(glyph.uv[0] + glyph.uv[2], glyph.uv[1] + glyph.uv[3]),
                });
            }
            pen += glyph.advance * scale;
        }
        quads
    }
}

/// Pack rectangles row by row, doubling the smaller atlas side until they fit.
/// Returns the atlas size and each rectangle's top-left corner.
fn pack_rows(sizes: &[(u32, u32)]) -> (u32, u32, Vec<(u32, u32)>) {
    let mut width = INITIAL_ATLAS_SIZE;
    let mut height = INITIAL_ATLAS_SIZE;

    loop {
        if let Some(positions) = try_pack(sizes, width, height) {
            return (width, height, positions);
        }
        if width <= height {
            width *= 2;
        } else {
            height *= 2;
        }
    }
}

fn try_pack(sizes: &[(u32, u32)], width: u32, height: u32) -> Option<Vec<(u32, u32)>> {
    let mut positions = Vec::with_capacity(sizes.len());
    let mut x = ATLAS_PADDING;
    let mut y = ATLAS_PADDING;
    let mut row_height = 0;

    for &(w, h) in sizes {
        if w + 2 * ATLAS_PADDING > width {
            return None;
        }
        if x + w + ATLAS_PADDING > width {
            x = ATLAS_PADDING;
            y += row_height + ATLAS_PADDING;
            row_height = 0;
        }
        if y + h + ATLAS_PADDING > height {
            return None;
        }
        positions.push((x, y));
        x += w + ATLAS_PADDING;
        row_height = row_height.max(h);
    }
    Some(positions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(ch: char, side: u32, fill: u8) -> RasterGlyph {
        RasterGlyph {
            ch,
            width: side,
            height: side,
            xmin: 1.0,
            ymin: -2.0,
            advance: side as f32 + 2.0,
            bitmap: vec![fill; (side * side) as usize],
        }
    }

    fn overlaps(a: (u32, u32, u32, u32), b: (u32, u32, u32, u32)) -> bool {
        a.0 < b.0 + b.2 && b.0 < a.0 + a.2 && a.1 < b.1 + b.3 && b.1 < a.1 + a.3
    }

    #[test]
    fn packed_rectangles_do_not_overlap() {
        let sizes: Vec<(u32, u32)> = (0..200).map(|i| (10 + i % 23, 5 + i % 31)).collect();
        let (width, height, positions) = pack_rows(&sizes);

        let rects: Vec<_> = sizes
            .iter()
            .zip(&positions)
            .map(|(&(w, h), &(x, y))| (x, y, w, h))
            .collect();
        for (i, a) in rects.iter().enumerate() {
            assert!(a.0 + a.2 <= width && a.1 + a.3 <= height);
            for b in &rects[i + 1..] {
                assert!(!overlaps(*a, *b), "{a:?} overlaps {b:?}");
            }
        }
    }

    #[test]
    fn atlas_grows_when_glyphs_do_not_fit() {
        let sizes = vec![(300, 300); 4];
        let (width, height, _) = pack_rows(&sizes);
        assert!(width * height > INITIAL_ATLAS_SIZE * INITIAL_ATLAS_SIZE);
    }

    #[test]
    fn glyph_bitmaps_are_copied_into_place() {
        let atlas = FontAtlas::pack(vec![square('A', 4, 200), square('B', 3, 90)], 16.0);
        let b = atlas.glyph('B').unwrap();
        let x = (b.uv[0] * atlas.width() as f32).round() as u32;
        let y = (b.uv[1] * atlas.height() as f32).round() as u32;
        let index = (y * atlas.width() + x) as usize;
        assert_eq!(atlas.bitmap()[index], 90);
        assert_eq!(atlas.bitmap()[0], 0);
    }

    #[test]
    fn layout_advances_and_scales() {
        let atlas = FontAtlas::pack(vec![square('A', 4, 255), square(' ', 0, 0)], 16.0);
        let quads = atlas.layout("A A", 10.0, 100.0, 0.5);
        assert_eq!(quads.len(), 2);

        let first = quads[0];
        assert_eq!(first.min, Vec2::new(10.5, 99.0));
        assert_eq!(first.max, Vec2::new(12.5, 101.0));

        // 'A' advances 6 and the space 2, both halved.
        assert_eq!(quads[1].min.x - first.min.x, 4.0);
    }

    #[test]
    fn missing_glyphs_use_fallback_advance() {
        let atlas = FontAtlas::pack(vec![square('A', 4, 255)], 16.0);
        let quads = atlas.layout("?A", 0.0, 0.0, 1.0);
        assert_eq!(quads.len(), 1);
        assert_eq!(quads[0].min.x, 8.0 + 1.0);
    }

    #[test]
    fn explicit_missing_font_is_an_io_error() {
        let result = load_font_data(Some(Path::new("/definitely/not/a/font.ttf")));
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
