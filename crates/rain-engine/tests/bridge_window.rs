mod common;

use common::{shared_engine, table};
use rain_engine::bridge::window_handle;
use rain_engine::script::Value;

fn window() -> Value {
    Value::Handle(window_handle().to_bits())
}

// ── text ─────────────────────────────────────────────────────────────────

#[test]
fn title_round_trips_byte_identical() {
    let calls = table();
    let (engine, _probe) = shared_engine();
    let title = "Mokosh · 日本語 ✓ (Engine)";

    calls.call(&engine, "Window_SetTitle", &[window(), Value::from(title)]);
    let back = calls.call(&engine, "Window_GetTitle", &[window()]);

    assert_eq!(back, Value::Text(title.as_bytes().to_vec()));
    assert_eq!(engine.borrow().window.title(), title);
}

#[test]
fn invalid_utf8_title_is_replaced_not_rejected() {
    let calls = table();
    let (engine, _probe) = shared_engine();

    calls.call(&engine, "Window_SetTitle", &[window(), Value::Text(vec![b'o', b'k', 0xC3])]);
    assert_eq!(engine.borrow().window.title(), "ok\u{FFFD}");
}

#[test]
fn debug_log_accepts_text() {
    let calls = table();
    let (engine, _probe) = shared_engine();
    assert_eq!(calls.call(&engine, "Debug_Log", &[Value::from("hello")]), Value::Nil);
    assert_eq!(calls.call(&engine, "Debug_Log", &[Value::Int(3)]), Value::Nil);
}

// ── window accessors ─────────────────────────────────────────────────────

#[test]
fn engine_hands_out_the_window_handle() {
    let calls = table();
    let (engine, _probe) = shared_engine();
    let handle = calls.call(&engine, "Engine_GetWindow", &[]);
    assert_eq!(handle, window());

    let size = calls.call(&engine, "Window_GetFramebufferSize", &[handle]);
    assert_eq!(size, Value::Floats(vec![1280.0, 720.0]));
}

#[test]
fn framebuffer_resize_is_ignored() {
    let calls = table();
    let (engine, _probe) = shared_engine();
    calls.call(
        &engine,
        "Window_SetFramebufferSize",
        &[window(), Value::Floats(vec![10.0, 10.0])],
    );
    assert_eq!(engine.borrow().window.fb_size(), (1280, 720));
}

#[test]
fn key_state_is_reported() {
    let calls = table();
    let (engine, _probe) = shared_engine();
    // Nothing is pressed on a headless window.
    assert_eq!(
        calls.call(&engine, "Window_IsKeyDown", &[window(), Value::Int(32)]),
        Value::Bool(false)
    );
    assert_eq!(
        calls.call(&engine, "Window_IsKeyDown", &[window(), Value::Int(i64::MAX)]),
        Value::Bool(false)
    );
}

#[test]
fn bogus_window_handle_is_rejected() {
    let calls = table();
    let (engine, _probe) = shared_engine();
    let bogus = Value::Handle(window_handle().to_bits() + 1);

    assert_eq!(calls.call(&engine, "Window_GetTitle", &[bogus]), Value::Nil);
    assert_eq!(calls.call(&engine, "Window_GetTitle", &[Value::Int(0)]), Value::Nil);
}

#[test]
fn unknown_call_returns_nil() {
    let calls = table();
    let (engine, _probe) = shared_engine();
    assert_eq!(calls.call(&engine, "Gui_Button", &[]), Value::Nil);
}
