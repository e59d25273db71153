//! GPU error types
//!
//! Every lifecycle, binding and draw failure of the GPU object layer is reported
//! through [`GpuError`]. Ordering bugs such as uploading into a buffer that is not
//! bound are surfaced as values instead of silently corrupting GPU state.

use std::ops::Range;

use super::backend::BufferKind;

/// Errors raised by GPU objects, the binding context and the backends.
#[derive(Debug, thiserror::Error)]
pub enum GpuError {
    /// `create()` was called on an object that already owns a handle.
    #[error("'{label}' was already created")]
    AlreadyCreated { label: String },

    /// The object has no GPU handle yet (or it was released).
    #[error("'{label}' has not been created")]
    NotCreated { label: String },

    /// An operation required a bound object of this kind.
    #[error("no {kind:?} buffer is bound, or the bound one is not '{label}'")]
    NotBound { kind: BufferKind, label: String },

    /// A buffer was used as a kind it is not.
    #[error("'{label}' is a {actual:?} buffer, expected {expected:?}")]
    WrongKind {
        label: String,
        expected: BufferKind,
        actual: BufferKind,
    },

    /// Two live uniform buffers were registered at the same binding point.
    #[error("uniform binding point {slot} is held by '{held_by}', cannot bind '{incoming}'")]
    BindingCollision {
        slot: u32,
        held_by: String,
        incoming: String,
    },

    /// A draw was issued without the named object bound.
    #[error("draw requires a bound {0}")]
    MissingBinding(&'static str),

    /// The vertex attribute table does not match the vertex record.
    #[error("vertex layout mismatch: {0}")]
    LayoutMismatch(String),

    /// The requested index range is not inside the bound index buffer.
    #[error("draw range {range:?} exceeds the {available} indices of the bound index buffer")]
    DrawOutOfRange { range: Range<u32>, available: u32 },

    /// A dynamic uniform buffer was not rewritten during the current frame.
    #[error("uniform '{label}' at binding {slot} holds data from a previous frame")]
    StaleUniform { slot: u32, label: String },

    /// The graphics context could not be initialised.
    #[error("graphics context initialisation failed: {0}")]
    Init(String),

    /// A shader module or pipeline failed validation.
    #[error("shader '{label}' rejected: {message}")]
    Shader { label: String, message: String },

    /// The presentation surface failed.
    #[error("surface error: {0}")]
    Surface(String),

    /// Any other backend failure.
    #[error("backend error: {0}")]
    Backend(String),
}
