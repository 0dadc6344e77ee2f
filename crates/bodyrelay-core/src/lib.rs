pub mod config;
pub mod logging;

pub mod chunker;
pub mod classifier;
pub mod driver;
pub mod notify;
pub mod pipeline;
pub mod retry;
pub mod submit;
pub mod transport;
