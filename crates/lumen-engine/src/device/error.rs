/// Failure to create or reach a device resource.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum DeviceError {
    /// No render backend is current on the calling thread.
    #[error("no render context is current on this thread")]
    NoContext,

    /// The current backend is already borrowed further up the stack.
    #[error("render context is already in use")]
    ContextBusy,

    #[error("device allocation failed: {0}")]
    Allocation(String),
}

/// High-level response after a surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; rendering may resume next frame.
    Reconfigured,
    /// Transient error; skip the current frame.
    SkipFrame,
    /// Fatal error (commonly OOM); terminate gracefully.
    Fatal,
}
