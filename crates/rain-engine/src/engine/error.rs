use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// A second `EngineState` was constructed while one is alive on this thread.
    #[error("an engine instance is already running on this thread")]
    AlreadyRunning,
    /// The window has no OS surface for a GPU backend to draw into.
    #[error("window does not provide a GPU surface target")]
    NoGfxTarget,
}
