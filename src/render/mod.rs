//! Render pipeline: validation, temp input handling, renderer invocation.
//!
//! A request moves through the pipeline in a fixed order:
//!
//! ```text
//! arguments ──▶ request::parse ──▶ TempInput::acquire ──▶ Renderer::render
//!                                        │                       │
//!                                        └── removed on drop ◀───┘
//! ```
//!
//! Validation happens before any filesystem or process work; the temp input
//! is removed on every exit path; the renderer's exit status is only trusted
//! together with an output-file existence check.

pub mod error;
pub mod invoker;
pub mod request;
pub mod temp;

pub use error::RenderError;
pub use invoker::Renderer;
pub use request::{GenerateImageRequest, InvalidRequest};
pub use temp::TempInput;
