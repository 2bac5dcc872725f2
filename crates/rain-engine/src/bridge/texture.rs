use std::path::Path;

use crate::engine::EngineState;
use crate::gfx::{PixelFormat, Usage};
use crate::resource::{Texture, TextureDesc, TextureFormat};
use crate::script::Value;

use super::args::Args;
use super::BridgeError;

pub(super) fn alloc(state: &mut EngineState, _args: &Args<'_>) -> Result<Value, BridgeError> {
    let handle = state.resources.textures.insert(Texture::default());
    log::trace!("texture allocated {:?}", handle.raw());
    Ok(Value::Handle(handle.to_bits()))
}

/// `Texture_Init(tex, { render_target, width, height, sample_count, format })`.
pub(super) fn init(state: &mut EngineState, args: &Args<'_>) -> Result<Value, BridgeError> {
    let EngineState {
        renderer, resources, ..
    } = state;
    let handle = args.handle(0, &resources.textures)?;
    let fields = args.record(1)?;

    let format_code = fields.uint("format")?;
    let format = PixelFormat::from_code(format_code).ok_or_else(|| BridgeError::Range {
        index: 1,
        reason: format!("unknown pixel format {format_code}"),
    })?;
    let desc = TextureDesc {
        render_target: fields.bool("render_target")?,
        width: fields.uint("width")?,
        height: fields.uint("height")?,
        sample_count: fields.uint("sample_count")?,
        format,
    };

    let texture = resources.textures.get_mut(handle)?;
    match texture.init(renderer.gfx_mut(), &desc) {
        Ok(()) => Ok(Value::Bool(true)),
        Err(err) => {
            log::error!("Texture_Init: {err}");
            Ok(Value::Bool(false))
        }
    }
}

/// `Texture_FromFile(tex, path, format, usage)`. Failure leaves `exists == false`.
pub(super) fn from_file(state: &mut EngineState, args: &Args<'_>) -> Result<Value, BridgeError> {
    let EngineState {
        renderer,
        resources,
        decoder,
        ..
    } = state;
    let handle = args.handle(0, &resources.textures)?;
    let path = args.text(1)?;

    let format_code = args.uint(2)?;
    let format = TextureFormat::from_code(format_code).ok_or_else(|| BridgeError::Range {
        index: 2,
        reason: format!("unknown texture format {format_code}"),
    })?;
    let usage_code = args.uint(3)?;
    let usage = Usage::from_code(usage_code).ok_or_else(|| BridgeError::Range {
        index: 3,
        reason: format!("unknown usage {usage_code}"),
    })?;

    let texture = resources.textures.get_mut(handle)?;
    let loaded = texture.load_file(
        renderer.gfx_mut(),
        &**decoder,
        Path::new(path.as_str()),
        format,
        usage,
    );
    match loaded {
        Ok(()) => {
            log::debug!(
                "loaded texture '{}' ({}x{} {:?})",
                path.as_str(),
                texture.width,
                texture.height,
                texture.format
            );
            Ok(Value::Bool(true))
        }
        Err(err) => {
            log::error!("failed to load texture '{}': {err}", path.as_str());
            Ok(Value::Bool(false))
        }
    }
}

pub(super) fn get_size(state: &mut EngineState, args: &Args<'_>) -> Result<Value, BridgeError> {
    let textures = &state.resources.textures;
    let texture = textures.get(args.handle(0, textures)?)?;
    let (w, h) = texture.size();
    Ok(Value::Floats(vec![w as f32, h as f32]))
}

pub(super) fn get_format(state: &mut EngineState, args: &Args<'_>) -> Result<Value, BridgeError> {
    let textures = &state.resources.textures;
    let texture = textures.get(args.handle(0, textures)?)?;
    Ok(Value::Int(i64::from(texture.format.code())))
}

/// Releases the GPU image, then the slot. The handle is dead afterwards.
pub(super) fn destroy_and_free(
    state: &mut EngineState,
    args: &Args<'_>,
) -> Result<Value, BridgeError> {
    let EngineState {
        renderer, resources, ..
    } = state;
    let handle = args.handle(0, &resources.textures)?;

    if cfg!(debug_assertions) {
        let referencing = resources.passes_referencing(handle);
        if referencing > 0 {
            log::warn!(
                "texture {:?} destroyed under {referencing} live pass(es); destroy passes first",
                handle.raw()
            );
        }
    }

    let mut texture = resources.textures.remove(handle)?;
    texture.destroy(renderer.gfx_mut());
    Ok(Value::Nil)
}
