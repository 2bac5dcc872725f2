use crate::engine::EngineState;
use crate::resource::RenderPass;
use crate::script::Value;

use super::args::Args;
use super::BridgeError;

/// `RenderPass_Alloc(color, depth?)`. The texture handles are remembered, not owned.
pub(super) fn alloc(state: &mut EngineState, args: &Args<'_>) -> Result<Value, BridgeError> {
    let EngineState {
        renderer, resources, ..
    } = state;
    let color = args.handle(0, &resources.textures)?;
    let depth = args.opt_handle(1, &resources.textures)?;

    let pass = RenderPass::create(renderer.gfx_mut(), &resources.textures, color, depth)?;
    let handle = resources.passes.insert(pass);
    Ok(Value::Handle(handle.to_bits()))
}

pub(super) fn destroy_and_free(
    state: &mut EngineState,
    args: &Args<'_>,
) -> Result<Value, BridgeError> {
    let EngineState {
        renderer, resources, ..
    } = state;
    let handle = args.handle(0, &resources.passes)?;
    resources.passes.remove(handle)?.destroy(renderer.gfx_mut());
    Ok(Value::Nil)
}
