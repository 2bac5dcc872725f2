/// Straight-alpha RGBA color, components nominally in `0.0..=1.0`.
///
/// Scripts send colors as four floats; nothing is clamped here.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct ColorRgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl ColorRgba {
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Default clear color.
    #[inline]
    pub const fn black() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }

    /// Identity tint.
    #[inline]
    pub const fn white() -> Self {
        Self::new(1.0, 1.0, 1.0, 1.0)
    }

    /// Color from exactly four floats in r, g, b, a order.
    pub fn from_slice(v: &[f32]) -> Option<Self> {
        match *v {
            [r, g, b, a] => Some(Self::new(r, g, b, a)),
            _ => None,
        }
    }

    #[inline]
    pub const fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_slice_needs_four_components() {
        assert_eq!(
            ColorRgba::from_slice(&[0.1, 0.2, 0.3, 0.4]),
            Some(ColorRgba::new(0.1, 0.2, 0.3, 0.4))
        );
        assert_eq!(ColorRgba::from_slice(&[1.0, 1.0, 1.0]), None);
    }
}
