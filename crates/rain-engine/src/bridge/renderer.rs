use crate::coords::{ColorRgba, SourceRect};
use crate::engine::EngineState;
use crate::gfx::{PassAction, SamplerId};
use crate::render::BuiltinSampler;
use crate::script::Value;

use super::args::Args;
use super::BridgeError;

pub(super) fn get_builtin_sampler(
    state: &mut EngineState,
    args: &Args<'_>,
) -> Result<Value, BridgeError> {
    let code = args.uint(0)?;
    let which = BuiltinSampler::from_code(code).ok_or_else(|| BridgeError::Range {
        index: 0,
        reason: format!("unknown builtin sampler {code}"),
    })?;
    Ok(Value::Int(i64::from(state.renderer.builtin_sampler(which).0)))
}

/// `Renderer_RenderColoredQuad(color, transform)`.
pub(super) fn render_colored_quad(
    state: &mut EngineState,
    args: &Args<'_>,
) -> Result<Value, BridgeError> {
    let color = args.color(0)?;
    let transform = args.mat4(1)?;
    state.renderer.render_colored_quad(color, &transform);
    Ok(Value::Nil)
}

/// `Renderer_RenderTexturedQuad(tex, sampler, x, y, w, h, transform[, tint])`.
///
/// Negative rectangle components clamp to zero; a zero width or height
/// selects the full texture extent.
pub(super) fn render_textured_quad(
    state: &mut EngineState,
    args: &Args<'_>,
) -> Result<Value, BridgeError> {
    let EngineState {
        renderer, resources, ..
    } = state;
    let handle = args.handle(0, &resources.textures)?;
    let sampler = SamplerId(args.uint(1)?);
    let component =
        |index: usize| -> Result<u32, BridgeError> { Ok(args.float(index)?.max(0.0) as u32) };
    let rect = SourceRect::new(component(2)?, component(3)?, component(4)?, component(5)?);
    let transform = args.mat4(6)?;
    let tint = args.opt_color(7)?.unwrap_or(ColorRgba::white());

    let texture = resources.textures.get(handle)?;
    renderer.render_textured_quad(texture, sampler, rect, tint, &transform);
    Ok(Value::Nil)
}

fn pass_action(args: &Args<'_>, clear_index: usize) -> Result<PassAction, BridgeError> {
    if args.bool(clear_index)? {
        let color = args.opt_color(clear_index + 1)?.unwrap_or(ColorRgba::black());
        Ok(PassAction::clear(color.to_array()))
    } else {
        Ok(PassAction::load())
    }
}

/// `Renderer_BeginPass(pass, clear, color)`.
pub(super) fn begin_pass(state: &mut EngineState, args: &Args<'_>) -> Result<Value, BridgeError> {
    let EngineState {
        renderer, resources, ..
    } = state;
    let handle = args.handle(0, &resources.passes)?;
    let action = pass_action(args, 1)?;

    let pass = resources.passes.get(handle)?;
    if !pass.attachments_alive(&resources.textures) {
        log::error!(
            "Renderer_BeginPass: render pass {:?} uses a texture that no longer exists",
            handle.raw()
        );
        return Ok(Value::Bool(false));
    }
    Ok(Value::Bool(renderer.begin_pass(pass.pass, &action)))
}

/// `Renderer_BeginDefaultPass(clear, color)`.
pub(super) fn begin_default_pass(
    state: &mut EngineState,
    args: &Args<'_>,
) -> Result<Value, BridgeError> {
    let action = pass_action(args, 0)?;
    let (width, height) = state.window.fb_size();
    Ok(Value::Bool(state.renderer.begin_default_pass(&action, width, height)))
}

pub(super) fn end_pass(state: &mut EngineState, _args: &Args<'_>) -> Result<Value, BridgeError> {
    state.renderer.end_pass();
    Ok(Value::Nil)
}
