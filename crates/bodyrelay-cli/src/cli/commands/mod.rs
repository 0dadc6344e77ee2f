//! CLI command handlers. Each command is in its own file.

mod classify;
mod completions;
mod input;
mod send;
mod submit;

pub use classify::run_classify;
pub use completions::{run_completions, run_man};
pub use send::{run_send, SendArgs};
pub use submit::run_submit;
