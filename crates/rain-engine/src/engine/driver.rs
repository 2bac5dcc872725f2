use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{Context, Result};

use crate::bridge::internal_calls;
use crate::config::ScriptConfig;
use crate::script::{HookKind, Hooks, ScriptRuntime, Value};
use crate::time::DeltaTimer;

use super::state::{EngineState, SharedEngine};

/// Where the driver is in the engine lifecycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Initialized,
    Running,
    Destroying,
    Terminated,
}

impl LifecycleState {
    pub fn can_advance_to(self, next: LifecycleState) -> bool {
        use LifecycleState::*;
        matches!(
            (self, next),
            (Uninitialized, Initialized)
                | (Initialized, Running)
                | (Initialized, Destroying)
                | (Running, Destroying)
                | (Destroying, Terminated)
        )
    }
}

/// Summary of one `Driver::run`.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Loop iterations completed.
    pub frames: u64,
    /// `Entry` was present and invoked.
    pub entry_ran: bool,
    /// `Destroy` was present and invoked.
    pub destroy_ran: bool,
}

/// Frame loop tying the window, the renderer and the script hooks together.
///
/// Teardown order is fixed: `Destroy` hook, script runtime, renderer, window.
pub struct Driver<R: ScriptRuntime> {
    engine: Option<SharedEngine>,
    runtime: R,
    hooks: Hooks,
    state: LifecycleState,
    frame_limit: Option<u64>,
}

impl<R: ScriptRuntime> Driver<R> {
    /// Registers the internal calls, loads the assembly and resolves the hooks.
    pub fn init(engine: EngineState, mut runtime: R, script: &ScriptConfig) -> Result<Self> {
        let engine = Rc::new(RefCell::new(engine));

        runtime
            .register_internal_calls(
                &script.interop_namespace,
                &internal_calls(),
                Rc::clone(&engine),
            )
            .context("failed to register internal calls")?;
        runtime
            .load_assembly(&script.assembly)
            .with_context(|| {
                format!("failed to load script assembly {}", script.assembly.display())
            })?;

        let hooks = Hooks::resolve(&mut runtime, &script.entry_class);
        log::info!("script lifecycle ready (entry class {})", script.entry_class);

        let mut driver = Self {
            engine: Some(engine),
            runtime,
            hooks,
            state: LifecycleState::Uninitialized,
            frame_limit: None,
        };
        driver.transition(LifecycleState::Initialized);
        Ok(driver)
    }

    /// Stops the loop after `frames` iterations even if the window stays open.
    pub fn with_frame_limit(mut self, frames: Option<u64>) -> Self {
        self.frame_limit = frames;
        self
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn hooks(&self) -> Hooks {
        self.hooks
    }

    /// The shared engine context; `None` once torn down.
    pub fn engine(&self) -> Option<&SharedEngine> {
        self.engine.as_ref()
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// Runs `Entry`, the frame loop until the window closes, then tears down.
    pub fn run(mut self) -> RunReport {
        self.transition(LifecycleState::Running);

        let mut report = RunReport {
            entry_ran: self.call_hook(HookKind::Entry, &[]),
            ..RunReport::default()
        };

        let mut timer = DeltaTimer::new(self.with_engine(|s| s.window.get_time()).unwrap_or(0.0));
        loop {
            let closing = self.with_engine(|s| s.window.should_close()).unwrap_or(true);
            if self.with_engine(|s| s.renderer.is_lost()).unwrap_or(false) {
                log::error!("graphics device lost; leaving the frame loop");
                break;
            }
            let limited = self.frame_limit.is_some_and(|limit| report.frames >= limit);
            if closing || limited {
                break;
            }

            let now = self.with_engine(|s| s.window.get_time()).unwrap_or(0.0);
            let frame = timer.tick(now);
            self.with_engine(|s| s.delta_time = frame.dt);

            self.call_hook(HookKind::Update, &[Value::from(frame.dt)]);
            self.with_engine(|s| s.renderer.begin_render());
            self.call_hook(HookKind::Render, &[]);
            self.with_engine(|s| s.renderer.end_render());
            self.with_engine(|s| s.window.frame());

            report.frames += 1;
        }
        log::info!("frame loop finished after {} frames", report.frames);

        report.destroy_ran = self.teardown();
        report
    }

    /// Short borrow of the engine. Never held across a script call.
    fn with_engine<T>(&self, f: impl FnOnce(&mut EngineState) -> T) -> Option<T> {
        let engine = self.engine.as_ref()?;
        match engine.try_borrow_mut() {
            Ok(mut state) => Some(f(&mut state)),
            Err(_) => {
                log::error!("engine state is borrowed outside of an internal call");
                None
            }
        }
    }

    /// Invokes a hook if the assembly defines it. Faults are logged, not propagated.
    fn call_hook(&mut self, kind: HookKind, args: &[Value]) -> bool {
        let Some(method) = self.hooks.get(kind) else {
            return false;
        };
        if let Err(err) = self.runtime.invoke(method, args) {
            log::error!("{} hook failed: {err}", kind.method_name());
        }
        true
    }

    fn transition(&mut self, next: LifecycleState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "illegal lifecycle transition {:?} -> {:?}",
            self.state,
            next
        );
        log::debug!("lifecycle {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Returns whether `Destroy` ran.
    fn teardown(&mut self) -> bool {
        let was_running = self.state == LifecycleState::Running;
        self.transition(LifecycleState::Destroying);

        let destroy_ran = was_running && self.call_hook(HookKind::Destroy, &[]);

        // Drops the runtime's references to the engine.
        self.runtime.shutdown();

        if let Some(engine) = self.engine.take() {
            match Rc::try_unwrap(engine) {
                Ok(cell) => cell.into_inner().shutdown(),
                Err(shared) => {
                    log::warn!(
                        "{} engine reference(s) outlived runtime shutdown; tearing down in place",
                        Rc::strong_count(&shared) - 1
                    );
                    if let Ok(mut state) = shared.try_borrow_mut() {
                        state.release_leaked();
                        state.renderer.deinit();
                    }
                }
            }
        }

        self.transition(LifecycleState::Terminated);
        destroy_ran
    }
}

impl<R: ScriptRuntime> Drop for Driver<R> {
    fn drop(&mut self) {
        if self.state != LifecycleState::Terminated {
            self.teardown();
        }
    }
}
