//! Resource objects handed to scripts: textures and render passes, stored in
//! generation-checked slot maps, plus the image decoding seam.

mod decode;
mod render_pass;
mod slot_map;
mod texture;

pub use decode::{DecodeError, DecodedImage, ImageCrateDecoder, ImageDecoder};
pub use render_pass::{RenderPass, RenderPassError};
pub use slot_map::{Handle, HandleError, HandleKind, RawHandle, Resource, SlotMap};
pub use texture::{Texture, TextureDesc, TextureError, TextureFormat};

/// Every resource table of the engine.
#[derive(Default)]
pub struct Resources {
    pub textures: SlotMap<Texture>,
    pub passes: SlotMap<RenderPass>,
}

impl Resources {
    /// Render passes that still point at `texture`.
    pub fn passes_referencing(&self, texture: Handle<Texture>) -> usize {
        self.passes.iter().filter(|(_, p)| p.references(texture)).count()
    }

    /// Total number of live texture and render pass slots.
    pub fn outstanding(&self) -> usize {
        self.textures.len() + self.passes.len()
    }
}
