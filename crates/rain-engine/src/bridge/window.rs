use crate::engine::EngineState;
use crate::script::Value;

use super::args::Args;
use super::marshal::text_out;
use super::BridgeError;

pub(super) fn set_title(state: &mut EngineState, args: &Args<'_>) -> Result<Value, BridgeError> {
    args.window(0)?;
    let title = args.text(1)?;
    state.window.set_title(&title);
    Ok(Value::Nil)
}

pub(super) fn get_title(state: &mut EngineState, args: &Args<'_>) -> Result<Value, BridgeError> {
    args.window(0)?;
    Ok(text_out(state.window.title()))
}

pub(super) fn get_framebuffer_size(
    state: &mut EngineState,
    args: &Args<'_>,
) -> Result<Value, BridgeError> {
    args.window(0)?;
    let (w, h) = state.window.fb_size();
    Ok(Value::Floats(vec![w as f32, h as f32]))
}

pub(super) fn set_framebuffer_size(
    _state: &mut EngineState,
    args: &Args<'_>,
) -> Result<Value, BridgeError> {
    args.window(0)?;
    log::warn!("Window_SetFramebufferSize is not supported; ignored");
    Ok(Value::Nil)
}

pub(super) fn is_key_down(state: &mut EngineState, args: &Args<'_>) -> Result<Value, BridgeError> {
    args.window(0)?;
    let key = args.int(1)?;
    let down = i32::try_from(key).is_ok_and(|k| state.window.is_key_down(k));
    Ok(Value::Bool(down))
}
