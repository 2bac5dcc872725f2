//! Shared stubs for the integration tests: a headless engine on the recording
//! backend, a window that reports when it is dropped, and a script runtime
//! whose methods are Rust closures.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;

use rain_engine::bridge::{internal_calls, InternalCallTable};
use rain_engine::gfx::{PixelFormat, RecordingBackend, RecordingProbe};
use rain_engine::script::{MethodId, ScriptError, ScriptRuntime, Value};
use rain_engine::window::{HeadlessWindow, WindowSystem};
use rain_engine::{EngineState, SharedEngine, WindowConfig};

/// Ordered log of lifecycle events seen by the stubs.
pub type Events = Rc<RefCell<Vec<String>>>;

pub fn events() -> Events {
    Rc::new(RefCell::new(Vec::new()))
}

// ── window ───────────────────────────────────────────────────────────────

/// Headless window that logs its own drop and whether the GPU backend was
/// already shut down at that point.
pub struct JournalWindow {
    inner: HeadlessWindow,
    events: Events,
    probe: RecordingProbe,
}

impl WindowSystem for JournalWindow {
    fn should_close(&self) -> bool {
        self.inner.should_close()
    }

    fn frame(&mut self) {
        self.inner.frame();
    }

    fn get_time(&self) -> f32 {
        self.inner.get_time()
    }

    fn fb_size(&self) -> (u32, u32) {
        self.inner.fb_size()
    }

    fn is_key_down(&self, key: i32) -> bool {
        self.inner.is_key_down(key)
    }

    fn title(&self) -> &str {
        self.inner.title()
    }

    fn set_title(&mut self, title: &str) {
        self.inner.set_title(title);
    }

    fn gfx_target(&self) -> Option<Arc<winit::window::Window>> {
        None
    }
}

impl Drop for JournalWindow {
    fn drop(&mut self) {
        self.events
            .borrow_mut()
            .push(format!("window drop; gfx shut down = {}", self.probe.is_shut_down()));
    }
}

/// Engine on a recording backend and a fixed-step headless window
/// (1/60 s per frame) that closes after `frames` frames.
pub fn engine(frames: u64, events: &Events) -> (EngineState, RecordingProbe) {
    window_engine(
        HeadlessWindow::new(&WindowConfig::default())
            .with_fixed_step(1.0 / 60.0)
            .with_frame_budget(frames),
        events,
    )
}

pub fn window_engine(window: HeadlessWindow, events: &Events) -> (EngineState, RecordingProbe) {
    let gfx = RecordingBackend::new();
    let probe = gfx.probe();
    let window = JournalWindow {
        inner: window,
        events: Rc::clone(events),
        probe: probe.clone(),
    };
    let state = EngineState::new(Box::new(window), Box::new(gfx)).expect("engine");
    (state, probe)
}

/// Shared engine for calling internal calls directly, without a driver.
pub fn shared_engine() -> (SharedEngine, RecordingProbe) {
    let (state, probe) = engine(1, &events());
    (Rc::new(RefCell::new(state)), probe)
}

// ── runtime ──────────────────────────────────────────────────────────────

/// What scripted methods see: the registered internal calls.
#[derive(Default)]
pub struct Interop {
    engine: Option<SharedEngine>,
    calls: InternalCallTable,
}

impl Interop {
    pub fn call(&self, name: &str, args: &[Value]) -> Value {
        match &self.engine {
            Some(engine) => self.calls.call(engine, name, args),
            None => Value::Nil,
        }
    }

    pub fn engine(&self) -> &SharedEngine {
        self.engine.as_ref().expect("internal calls registered")
    }
}

type Method = Box<dyn FnMut(&Interop, &[Value]) -> Result<Value, ScriptError>>;

/// `ScriptRuntime` whose assembly is a set of Rust closures under one class.
pub struct ScriptedRuntime {
    class: String,
    methods: Vec<(String, Method)>,
    interop: Interop,
    events: Events,
    probe: Option<RecordingProbe>,
    fail_load: bool,
}

impl ScriptedRuntime {
    pub fn new(class: &str, events: &Events) -> Self {
        Self {
            class: class.to_string(),
            methods: Vec::new(),
            interop: Interop::default(),
            events: Rc::clone(events),
            probe: None,
            fail_load: false,
        }
    }

    pub fn method(
        mut self,
        name: &str,
        f: impl FnMut(&Interop, &[Value]) -> Result<Value, ScriptError> + 'static,
    ) -> Self {
        self.methods.push((format!("{}:{name}", self.class), Box::new(f)));
        self
    }

    /// Records the backend's shutdown state when the runtime shuts down.
    pub fn watching(mut self, probe: RecordingProbe) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn failing_load(mut self) -> Self {
        self.fail_load = true;
        self
    }
}

impl ScriptRuntime for ScriptedRuntime {
    fn load_assembly(&mut self, path: &Path) -> Result<(), ScriptError> {
        if self.fail_load {
            return Err(ScriptError::Load {
                path: path.display().to_string(),
                reason: "refused by test".to_string(),
            });
        }
        self.events.borrow_mut().push("load".to_string());
        Ok(())
    }

    fn register_internal_calls(
        &mut self,
        _namespace: &str,
        calls: &InternalCallTable,
        engine: SharedEngine,
    ) -> Result<(), ScriptError> {
        self.interop = Interop {
            engine: Some(engine),
            calls: calls.clone(),
        };
        Ok(())
    }

    fn resolve(&mut self, name: &str) -> Option<MethodId> {
        self.methods
            .iter()
            .position(|(n, _)| n == name)
            .map(|i| MethodId(i as u32))
    }

    fn invoke(&mut self, method: MethodId, args: &[Value]) -> Result<Value, ScriptError> {
        let (name, f) = self
            .methods
            .get_mut(method.0 as usize)
            .ok_or(ScriptError::UnknownMethod(method))?;
        let short = name.rsplit(':').next().unwrap_or(name.as_str()).to_string();
        self.events.borrow_mut().push(short);
        (**f)(&self.interop, args)
    }

    fn shutdown(&mut self) {
        let gfx_down = self.probe.as_ref().is_some_and(|p| p.is_shut_down());
        self.events
            .borrow_mut()
            .push(format!("runtime shutdown; gfx shut down = {gfx_down}"));
        self.interop.engine = None;
        self.methods.clear();
    }
}

// ── values ───────────────────────────────────────────────────────────────

pub fn identity() -> Value {
    Value::Floats(vec![
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    ])
}

pub fn rgba(r: f32, g: f32, b: f32, a: f32) -> Value {
    Value::Floats(vec![r, g, b, a])
}

pub fn texture_desc(width: u32, height: u32, format: PixelFormat, render_target: bool) -> Value {
    let mut fields = BTreeMap::new();
    fields.insert("render_target".to_string(), Value::Bool(render_target));
    fields.insert("width".to_string(), Value::Int(i64::from(width)));
    fields.insert("height".to_string(), Value::Int(i64::from(height)));
    fields.insert("sample_count".to_string(), Value::Int(1));
    fields.insert("format".to_string(), Value::Int(i64::from(format.code())));
    Value::Record(fields)
}

pub fn handle_bits(value: &Value) -> u64 {
    match value {
        Value::Handle(h) => *h,
        other => panic!("expected a handle, got {other:?}"),
    }
}

/// Allocates and initializes a texture through the bridge.
pub fn make_texture(
    calls: &InternalCallTable,
    engine: &SharedEngine,
    width: u32,
    height: u32,
    format: PixelFormat,
    render_target: bool,
) -> Value {
    let tex = calls.call(engine, "Texture_Alloc", &[]);
    let ok = calls.call(
        engine,
        "Texture_Init",
        &[tex.clone(), texture_desc(width, height, format, render_target)],
    );
    assert_eq!(ok, Value::Bool(true));
    tex
}

pub fn table() -> InternalCallTable {
    internal_calls()
}
