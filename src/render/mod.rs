//! Server-side rendering
//!
//! [`Engine`] turns a [`RenderRequest`] into an HTML document. Each call
//! becomes a [`RenderTask`] that looks up (or builds) the server and client
//! bundles in the shared cache and evaluates the server bundle in the
//! sandbox.

pub mod engine;
pub mod html;
pub mod request;
pub mod task;
pub mod write_behind;

pub use engine::{Engine, EngineSettings};
pub use html::{render_error_page, render_error_script, render_page, Page};
pub use request::{escape_json_for_script, RenderRequest};
pub use task::{RenderOutput, RenderTask};
pub use write_behind::WriteBehind;
