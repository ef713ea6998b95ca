//! Glyph atlases for overlay text.
//!
//! Printable ASCII is rasterized once with `fontdue`, packed row by row into a
//! single-channel bitmap and uploaded as an `R8Unorm` texture.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use fontdue::{Font, FontSettings};
use thiserror::Error;

use crate::gpu::GpuContext;

/// Fonts tried in order when no font path is configured.
pub const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\segoeui.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

#[derive(Debug, Error)]
pub enum FontError {
    #[error("failed to read font {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse font: {0}")]
    Parse(&'static str),
}

/// Picks the configured font, or the first system candidate that exists.
pub fn resolve_font_path(configured: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = configured {
        return Some(path.to_path_buf());
    }
    SYSTEM_FONT_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
}

/// Information about a single glyph in the font atlas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlyphInfo {
    /// UV rectangle in the atlas (x, y, width, height) normalized to [0, 1].
    pub uv: [f32; 4],
    pub width: u32,
    pub height: u32,
    /// Offset from the cursor position to where the glyph should be drawn.
    pub offset_x: f32,
    pub offset_y: f32,
    /// How far to advance the cursor after this glyph.
    pub advance: f32,
}

const PADDING: u32 = 1;

/// Row-packs rectangles, doubling the smaller atlas side until all fit.
///
/// Returns the atlas size and the top-left corner of each rectangle.
fn pack_rows(sizes: &[(u32, u32)]) -> (u32, u32, Vec<(u32, u32)>) {
    let mut atlas_width = 256u32;
    let mut atlas_height = 256u32;

    loop {
        let mut x = PADDING;
        let mut y = PADDING;
        let mut row_height = 0u32;
        let mut placed = Vec::with_capacity(sizes.len());

        for &(w, h) in sizes {
            if x + w + PADDING > atlas_width {
                x = PADDING;
                y += row_height + PADDING;
                row_height = 0;
            }
            if y + h + PADDING > atlas_height || w + 2 * PADDING > atlas_width {
                break;
            }
            placed.push((x, y));
            x += w + PADDING;
            row_height = row_height.max(h);
        }

        if placed.len() == sizes.len() {
            return (atlas_width, atlas_height, placed);
        }

        if atlas_width <= atlas_height {
            atlas_width *= 2;
        } else {
            atlas_height *= 2;
        }
    }
}

/// CPU side of a font atlas: the packed bitmap plus glyph metrics.
pub struct GlyphAtlas {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    glyphs: HashMap<char, GlyphInfo>,
    size: f32,
    line_height: f32,
}

impl GlyphAtlas {
    /// Rasterizes printable ASCII from TTF/OTF data at `size` pixels.
    pub fn rasterize(font_data: &[u8], size: f32) -> Result<Self, FontError> {
        let font = Font::from_bytes(font_data, FontSettings::default()).map_err(FontError::Parse)?;

        let rasterized: Vec<(char, fontdue::Metrics, Vec<u8>)> = (32u8..=126u8)
            .map(char::from)
            .map(|c| {
                let (metrics, bitmap) = font.rasterize(c, size);
                (c, metrics, bitmap)
            })
            .collect();

        let sizes: Vec<(u32, u32)> = rasterized
            .iter()
            .map(|(_, m, _)| (m.width as u32, m.height as u32))
            .collect();
        let (width, height, placed) = pack_rows(&sizes);

        let mut pixels = vec![0u8; (width * height) as usize];
        let mut glyphs = HashMap::with_capacity(rasterized.len());

        for ((c, metrics, bitmap), (x, y)) in rasterized.iter().zip(placed) {
            let glyph_w = metrics.width as u32;
            let glyph_h = metrics.height as u32;

            for (row, src) in bitmap.chunks_exact(metrics.width.max(1)).enumerate() {
                let dst = ((y + row as u32) * width + x) as usize;
                pixels[dst..dst + src.len()].copy_from_slice(src);
            }

            glyphs.insert(
                *c,
                GlyphInfo {
                    uv: [
                        x as f32 / width as f32,
                        y as f32 / height as f32,
                        glyph_w as f32 / width as f32,
                        glyph_h as f32 / height as f32,
                    ],
                    width: glyph_w,
                    height: glyph_h,
                    offset_x: metrics.xmin as f32,
                    offset_y: metrics.ymin as f32,
                    advance: metrics.advance_width,
                },
            );
        }

        let line_height = font
            .horizontal_line_metrics(size)
            .map(|m| m.new_line_size)
            .unwrap_or(size * 1.2);

        Ok(Self {
            width,
            height,
            pixels,
            glyphs,
            size,
            line_height,
        })
    }

    pub fn glyph(&self, c: char) -> Option<&GlyphInfo> {
        self.glyphs.get(&c)
    }

    /// Pixel size the atlas was rasterized at.
    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn line_height(&self) -> f32 {
        self.line_height
    }

    /// Width of a string in pixels.
    pub fn measure(&self, text: &str) -> f32 {
        text.chars()
            .map(|c| self.glyphs.get(&c).map_or(self.size * 0.5, |g| g.advance))
            .sum()
    }
}

/// A glyph atlas resident on the GPU.
pub struct FontAtlas {
    pub atlas: GlyphAtlas,
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl FontAtlas {
    /// Reads, rasterizes and uploads the font at `path`.
    pub fn from_file(gpu: &GpuContext, path: &Path, size: f32) -> Result<Self, FontError> {
        let data = std::fs::read(path).map_err(|source| FontError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let atlas = GlyphAtlas::rasterize(&data, size)?;
        Ok(Self::upload(gpu, atlas))
    }

    pub fn upload(gpu: &GpuContext, atlas: GlyphAtlas) -> Self {
        let extent = wgpu::Extent3d {
            width: atlas.width,
            height: atlas.height,
            depth_or_array_layers: 1,
        };

        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Font Atlas"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        gpu.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &atlas.pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(atlas.width),
                rows_per_image: Some(atlas.height),
            },
            extent,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Font Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            atlas,
            texture,
            view,
            sampler,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlaps(a: (u32, u32, u32, u32), b: (u32, u32, u32, u32)) -> bool {
        a.0 < b.0 + b.2 && b.0 < a.0 + a.2 && a.1 < b.1 + b.3 && b.1 < a.1 + a.3
    }

    #[test]
    fn packing_keeps_glyphs_apart_and_inside() {
        let sizes: Vec<(u32, u32)> = (0..95).map(|i| (8 + i % 13, 10 + i % 7)).collect();
        let (w, h, placed) = pack_rows(&sizes);
        assert_eq!(placed.len(), sizes.len());

        let rects: Vec<_> = placed
            .iter()
            .zip(&sizes)
            .map(|(&(x, y), &(gw, gh))| (x, y, gw, gh))
            .collect();
        for (i, a) in rects.iter().enumerate() {
            assert!(a.0 + a.2 <= w && a.1 + a.3 <= h);
            for b in &rects[i + 1..] {
                assert!(!overlaps(*a, *b));
            }
        }
    }

    #[test]
    fn packing_grows_for_large_glyphs() {
        let (w, h, placed) = pack_rows(&[(300, 40), (300, 40)]);
        assert_eq!(placed.len(), 2);
        assert!(w >= 302);
        assert!(h >= 40);
    }

    #[test]
    fn configured_font_path_wins() {
        let path = Path::new("/nowhere/font.ttf");
        assert_eq!(resolve_font_path(Some(path)), Some(path.to_path_buf()));
    }

    #[test]
    fn garbage_is_not_a_font() {
        assert!(matches!(
            GlyphAtlas::rasterize(b"definitely not a font", 16.0),
            Err(FontError::Parse(_))
        ));
    }
}
