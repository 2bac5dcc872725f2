/// 4x4 matrix stored row by row.
///
/// The quad shaders multiply `vec4(pos, 0, 1) * trans`, so a matrix uploaded
/// in this layout transforms positions the way the script author wrote it.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Mat4 {
    pub rows: [[f32; 4]; 4],
}

impl Mat4 {
    pub const IDENTITY: Self = Self {
        rows: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// Builds a matrix from 16 floats in row order.
    ///
    /// Returns `None` if `v` does not hold exactly 16 values.
    pub fn from_slice(v: &[f32]) -> Option<Self> {
        if v.len() != 16 {
            return None;
        }
        let mut rows = [[0.0; 4]; 4];
        for (r, row) in rows.iter_mut().enumerate() {
            row.copy_from_slice(&v[r * 4..r * 4 + 4]);
        }
        Some(Self { rows })
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_slice_keeps_row_order() {
        let v: Vec<f32> = (0..16).map(|i| i as f32).collect();
        let m = Mat4::from_slice(&v).unwrap();
        assert_eq!(m.rows[0], [0.0, 1.0, 2.0, 3.0]);
        assert_eq!(m.rows[3], [12.0, 13.0, 14.0, 15.0]);
    }

    #[test]
    fn from_slice_rejects_wrong_length() {
        assert!(Mat4::from_slice(&[1.0; 15]).is_none());
        assert!(Mat4::from_slice(&[1.0; 17]).is_none());
    }

    #[test]
    fn default_is_identity() {
        assert_eq!(Mat4::default(), Mat4::IDENTITY);
    }
}
