use thiserror::Error;

use crate::gfx::{GfxBackend, ImageId, PassDesc, PassId};

use super::slot_map::{Handle, HandleError, HandleKind, Resource, SlotMap};
use super::texture::Texture;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderPassError {
    #[error("attachment: {0}")]
    Attachment(#[from] HandleError),
    #[error("attachment texture has no GPU image")]
    NotInitialized,
    #[error("attachment texture is not a render target")]
    NotRenderTarget,
    #[error("GPU pass creation failed")]
    Gpu,
}

/// Offscreen pass over one color texture and an optional depth/stencil texture.
///
/// The texture handles are borrowed, not owned: the pass must be destroyed
/// before the textures it draws into.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPass {
    pub pass: PassId,
    pub color: Handle<Texture>,
    pub depth_stencil: Option<Handle<Texture>>,
}

impl Resource for RenderPass {
    const KIND: HandleKind = HandleKind::RenderPass;
}

fn attachment_image(
    textures: &SlotMap<Texture>,
    handle: Handle<Texture>,
) -> Result<ImageId, RenderPassError> {
    let tex = textures.get(handle)?;
    if !tex.exists {
        return Err(RenderPassError::NotInitialized);
    }
    if !tex.render_target {
        return Err(RenderPassError::NotRenderTarget);
    }
    Ok(tex.image)
}

impl RenderPass {
    pub fn create(
        gfx: &mut dyn GfxBackend,
        textures: &SlotMap<Texture>,
        color: Handle<Texture>,
        depth_stencil: Option<Handle<Texture>>,
    ) -> Result<Self, RenderPassError> {
        let color_image = attachment_image(textures, color)?;
        let depth_image = match depth_stencil {
            Some(h) => attachment_image(textures, h)?,
            None => ImageId::INVALID,
        };

        let pass = gfx.make_pass(&PassDesc {
            color: color_image,
            depth_stencil: depth_image,
        });
        if !pass.is_valid() {
            return Err(RenderPassError::Gpu);
        }

        Ok(Self {
            pass,
            color,
            depth_stencil,
        })
    }

    pub fn references(&self, texture: Handle<Texture>) -> bool {
        self.color == texture || self.depth_stencil == Some(texture)
    }

    /// True while every attachment still resolves to a live texture.
    pub fn attachments_alive(&self, textures: &SlotMap<Texture>) -> bool {
        let alive = |h: Handle<Texture>| textures.get(h).is_ok_and(|t| t.exists);
        alive(self.color) && self.depth_stencil.is_none_or(alive)
    }

    pub fn destroy(self, gfx: &mut dyn GfxBackend) {
        gfx.destroy_pass(self.pass);
    }
}
