/// Pixel-space source rectangle inside a texture (origin at the first texel row).
///
/// A zero width or height selects the whole texture along that axis, offset
/// included, so `SourceRect::default()` always means "the full texture".
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct SourceRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Normalized texture coordinates `(u0, v0)` to `(u1, v1)`.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct UvRect {
    pub u0: f32,
    pub v0: f32,
    pub u1: f32,
    pub v1: f32,
}

impl SourceRect {
    #[inline]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Replaces zero extents with the texture extent on the same axis.
    pub fn resolve(self, tex_width: u32, tex_height: u32) -> Self {
        let (x, width) = if self.width == 0 { (0, tex_width) } else { (self.x, self.width) };
        let (y, height) = if self.height == 0 { (0, tex_height) } else { (self.y, self.height) };
        Self { x, y, width, height }
    }

    /// Normalized UVs for a texture of the given size.
    ///
    /// Returns `None` when the texture has a zero extent.
    pub fn uv(self, tex_width: u32, tex_height: u32) -> Option<UvRect> {
        if tex_width == 0 || tex_height == 0 {
            return None;
        }
        let r = self.resolve(tex_width, tex_height);
        let (w, h) = (tex_width as f32, tex_height as f32);
        Some(UvRect {
            u0: r.x as f32 / w,
            v0: r.y as f32 / h,
            u1: (r.x as f32 + r.width as f32) / w,
            v1: (r.y as f32 + r.height as f32) / h,
        })
    }
}

impl UvRect {
    pub const FULL: Self = Self { u0: 0.0, v0: 0.0, u1: 1.0, v1: 1.0 };

    #[inline]
    pub const fn to_array(self) -> [f32; 4] {
        [self.u0, self.v0, self.u1, self.v1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(x: u32, y: u32, w: u32, h: u32) -> SourceRect { SourceRect::new(x, y, w, h) }

    // ── resolve ───────────────────────────────────────────────────────────

    #[test]
    fn resolve_keeps_explicit_rect() {
        assert_eq!(r(4, 8, 16, 32).resolve(64, 64), r(4, 8, 16, 32));
    }

    #[test]
    fn resolve_zero_width_takes_full_row() {
        assert_eq!(r(5, 6, 0, 10).resolve(64, 32), r(0, 6, 64, 10));
    }

    #[test]
    fn resolve_zero_height_takes_full_column() {
        assert_eq!(r(5, 6, 10, 0).resolve(64, 32), r(5, 0, 10, 32));
    }

    // ── uv ────────────────────────────────────────────────────────────────

    #[test]
    fn zero_rect_is_full_texture_regardless_of_offset() {
        assert_eq!(r(0, 0, 0, 0).uv(128, 64), Some(UvRect::FULL));
        assert_eq!(r(17, 3, 0, 0).uv(128, 64), Some(UvRect::FULL));
    }

    #[test]
    fn sub_rect_normalizes_by_texture_size() {
        let uv = r(32, 16, 32, 16).uv(128, 64).unwrap();
        assert_eq!(uv.to_array(), [0.25, 0.25, 0.5, 0.5]);
    }

    #[test]
    fn zero_sized_texture_has_no_uvs() {
        assert_eq!(r(0, 0, 4, 4).uv(0, 16), None);
        assert_eq!(r(0, 0, 4, 4).uv(16, 0), None);
    }
}
