//! Uniform blocks of the builtin quad shaders (std140-compatible).

use bytemuck::{Pod, Zeroable};

use crate::coords::{ColorRgba, Mat4, UvRect};

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct ColoredQuadVs {
    pub trans: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct ColoredQuadFs {
    pub color: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct TexturedQuadVs {
    pub trans: [[f32; 4]; 4],
    pub uvs: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct TexturedQuadFs {
    pub tint: [f32; 4],
}

impl ColoredQuadVs {
    pub fn new(transform: &Mat4) -> Self {
        Self { trans: transform.rows }
    }
}

impl ColoredQuadFs {
    pub fn new(color: ColorRgba) -> Self {
        Self { color: color.to_array() }
    }
}

impl TexturedQuadVs {
    pub fn new(transform: &Mat4, uv: UvRect) -> Self {
        Self {
            trans: transform.rows,
            uvs: uv.to_array(),
        }
    }
}

impl TexturedQuadFs {
    pub fn new(tint: ColorRgba) -> Self {
        Self { tint: tint.to_array() }
    }
}
