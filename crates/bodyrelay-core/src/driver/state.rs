use crate::classifier::BodyFormat;

/// Where the driver is in the delivery sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// Chunk `index` is being sent; `attempt` is 1-based.
    Dispatching { index: usize, attempt: u32 },
    /// A chunk ran out of attempts; later chunks are never sent.
    Aborted,
    /// Every chunk was acknowledged with a 2xx.
    Completed,
}

impl DriverState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DriverState::Aborted | DriverState::Completed)
    }
}

/// Mutable state of one pipeline run. Only the driver writes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineState {
    /// Chunk currently being delivered; never decreases.
    pub current_index: usize,
    pub total: usize,
    pub format: BodyFormat,
    /// Flips to true once, on Aborted or Completed.
    pub terminal: bool,
}

/// What a resolved dispatch did to the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Same chunk again, immediately.
    Retry { index: usize, attempt: u32 },
    /// Next chunk, attempt counter back at 1.
    Advance { index: usize },
    Completed,
    /// Chunk `index` failed `attempts` times.
    Aborted { index: usize, attempts: u32 },
    /// Outcome delivered after a terminal state.
    Ignored,
}
