use crate::engine::EngineState;
use crate::logging::SCRIPT_TARGET;
use crate::script::Value;

use super::args::{window_handle, Args};
use super::BridgeError;

pub(super) fn debug_log(_state: &mut EngineState, args: &Args<'_>) -> Result<Value, BridgeError> {
    let text = args.text(0)?;
    log::info!(target: SCRIPT_TARGET, "{}", text.as_str());
    Ok(Value::Nil)
}

pub(super) fn get_window(_state: &mut EngineState, _args: &Args<'_>) -> Result<Value, BridgeError> {
    Ok(Value::Handle(window_handle().to_bits()))
}

pub(super) fn get_delta_time(
    state: &mut EngineState,
    _args: &Args<'_>,
) -> Result<Value, BridgeError> {
    Ok(Value::from(state.delta_time))
}
