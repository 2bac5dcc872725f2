mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::{engine, events, make_texture, ScriptedRuntime};
use rain_engine::bridge::internal_calls;
use rain_engine::config::WindowConfig;
use rain_engine::gfx::{Call, PixelFormat, RecordingBackend};
use rain_engine::script::Value;
use rain_engine::window::HeadlessWindow;
use rain_engine::{Driver, EngineError, EngineState, LifecycleState, ScriptConfig};

#[test]
fn destroy_then_runtime_then_renderer_then_window() {
    let events = events();
    let (state, probe) = engine(2, &events);
    let runtime = ScriptedRuntime::new("RainEngine.Main", &events)
        .watching(probe.clone())
        .method("Destroy", |_, _| Ok(Value::Nil));

    Driver::init(state, runtime, &ScriptConfig::default()).unwrap().run();

    let log = events.borrow();
    let tail: Vec<&str> = log.iter().rev().take(3).rev().map(String::as_str).collect();
    assert_eq!(
        tail,
        [
            "Destroy",
            "runtime shutdown; gfx shut down = false",
            "window drop; gfx shut down = true",
        ]
    );
    assert!(probe.is_shut_down());
}

#[test]
fn renderer_builtins_go_in_reverse_creation_order() {
    let events = events();
    let (state, probe) = engine(1, &events);
    let runtime = ScriptedRuntime::new("RainEngine.Main", &events);

    Driver::init(state, runtime, &ScriptConfig::default()).unwrap().run();

    let log = probe.calls();
    let created: Vec<u32> = log
        .iter()
        .filter_map(|c| match c {
            Call::MakeShader(id) => Some(id.0),
            Call::MakePipeline(id) => Some(id.0),
            Call::MakeBuffer(id) => Some(id.0),
            Call::MakeSampler(id) => Some(id.0),
            _ => None,
        })
        .collect();
    let mut destroyed: Vec<u32> = log
        .iter()
        .filter_map(|c| match c {
            Call::DestroyShader(id) => Some(id.0),
            Call::DestroyPipeline(id) => Some(id.0),
            Call::DestroyBuffer(id) => Some(id.0),
            Call::DestroySampler(id) => Some(id.0),
            _ => None,
        })
        .collect();
    destroyed.reverse();
    assert_eq!(created.len(), 7);
    assert_eq!(created, destroyed);
    assert_eq!(log.last(), Some(&Call::Shutdown));
}

#[test]
fn destroy_hook_can_still_release_resources() {
    let events = events();
    let (state, probe) = engine(1, &events);
    let texture: Rc<RefCell<Value>> = Rc::default();
    let (entry_tex, destroy_tex) = (Rc::clone(&texture), Rc::clone(&texture));

    let runtime = ScriptedRuntime::new("RainEngine.Main", &events)
        .method("Entry", move |interop, _| {
            let calls = internal_calls();
            *entry_tex.borrow_mut() =
                make_texture(&calls, interop.engine(), 4, 4, PixelFormat::Rgba8, false);
            Ok(Value::Nil)
        })
        .method("Destroy", move |interop, _| {
            let tex = destroy_tex.borrow().clone();
            Ok(interop.call("Texture_DestroyAndFree", &[tex]))
        });

    Driver::init(state, runtime, &ScriptConfig::default()).unwrap().run();

    // Exactly one release: the script's own, not the leak sweep.
    assert_eq!(probe.count(|c| matches!(c, Call::DestroyImage(_))), 1);
}

#[test]
fn dropping_an_unrun_driver_skips_destroy() {
    let events = events();
    let (state, probe) = engine(1, &events);
    let runtime = ScriptedRuntime::new("RainEngine.Main", &events)
        .watching(probe.clone())
        .method("Destroy", |_, _| Ok(Value::Nil));

    let driver = Driver::init(state, runtime, &ScriptConfig::default()).unwrap();
    assert_eq!(driver.state(), LifecycleState::Initialized);
    drop(driver);

    let log = events.borrow();
    assert!(!log.iter().any(|e| e == "Destroy"));
    assert_eq!(log.last().map(String::as_str), Some("window drop; gfx shut down = true"));
}

// ── single instance ──────────────────────────────────────────────────────

#[test]
fn second_engine_fails_while_one_runs() {
    let events = events();
    let (state, _probe) = engine(1, &events);
    let outcome: Rc<RefCell<Option<bool>>> = Rc::default();
    let sink = Rc::clone(&outcome);

    let runtime = ScriptedRuntime::new("RainEngine.Main", &events).method("Entry", move |_, _| {
        let second = EngineState::new(
            Box::new(HeadlessWindow::new(&WindowConfig::default())),
            Box::new(RecordingBackend::new()),
        );
        let rejected = second.err().is_some_and(|e| {
            matches!(e.downcast_ref::<EngineError>(), Some(EngineError::AlreadyRunning))
        });
        *sink.borrow_mut() = Some(rejected);
        Ok(Value::Nil)
    });

    Driver::init(state, runtime, &ScriptConfig::default()).unwrap().run();
    assert_eq!(*outcome.borrow(), Some(true));
}

#[test]
fn reentrant_internal_call_returns_nil() {
    let events = events();
    let (state, _probe) = engine(1, &events);
    let outcome: Rc<RefCell<Option<Value>>> = Rc::default();
    let sink = Rc::clone(&outcome);

    let runtime = ScriptedRuntime::new("RainEngine.Main", &events)
        .method("Entry", move |interop, _| {
            let _held = interop.engine().borrow_mut();
            *sink.borrow_mut() = Some(interop.call("Engine_GetWindow", &[]));
            Ok(Value::Nil)
        });

    Driver::init(state, runtime, &ScriptConfig::default()).unwrap().run();
    assert_eq!(*outcome.borrow(), Some(Value::Nil));
}
