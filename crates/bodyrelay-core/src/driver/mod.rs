//! Sequence driver: the state machine behind ordered, single-flight delivery.
//!
//! The driver owns the pipeline state and decides, after each resolved
//! dispatch, whether to retry the same chunk, advance, or stop. It performs
//! no I/O; the pipeline loop feeds it outcomes one at a time.

mod state;

pub use state::{DriverState, PipelineState, Transition};

use crate::classifier::BodyFormat;
use crate::retry::{FailureKind, RetryDecision, RetryPolicy};

#[derive(Debug, Clone)]
pub struct SequenceDriver {
    pipeline: PipelineState,
    phase: DriverState,
    policy: RetryPolicy,
}

impl SequenceDriver {
    /// Starts at `Dispatching(0, 1)`, or directly at `Completed` when there is nothing to send.
    pub fn new(total: usize, format: BodyFormat, policy: RetryPolicy) -> Self {
        let mut driver = Self {
            pipeline: PipelineState {
                current_index: 0,
                total,
                format,
                terminal: false,
            },
            phase: DriverState::Dispatching {
                index: 0,
                attempt: 1,
            },
            policy,
        };
        if total == 0 {
            driver.finish(DriverState::Completed);
        }
        driver
    }

    pub fn phase(&self) -> DriverState {
        self.phase
    }

    pub fn pipeline(&self) -> &PipelineState {
        &self.pipeline
    }

    /// The `(index, attempt)` to dispatch next, if any.
    pub fn next_dispatch(&self) -> Option<(usize, u32)> {
        match self.phase {
            DriverState::Dispatching { index, attempt } => Some((index, attempt)),
            DriverState::Aborted | DriverState::Completed => None,
        }
    }

    /// Apply the outcome of the active dispatch.
    ///
    /// Outcomes arriving after a terminal state change nothing and return `Transition::Ignored`.
    pub fn resolve(&mut self, outcome: Result<(), FailureKind>) -> Transition {
        let DriverState::Dispatching { index, attempt } = self.phase else {
            return Transition::Ignored;
        };
        match outcome {
            Ok(()) if index + 1 < self.pipeline.total => {
                self.pipeline.current_index = index + 1;
                self.phase = DriverState::Dispatching {
                    index: index + 1,
                    attempt: 1,
                };
                Transition::Advance { index: index + 1 }
            }
            Ok(()) => {
                self.finish(DriverState::Completed);
                Transition::Completed
            }
            Err(kind) => match self.policy.decide(attempt, kind) {
                RetryDecision::Retry { next_attempt } => {
                    self.phase = DriverState::Dispatching {
                        index,
                        attempt: next_attempt,
                    };
                    Transition::Retry {
                        index,
                        attempt: next_attempt,
                    }
                }
                RetryDecision::GiveUp => {
                    self.finish(DriverState::Aborted);
                    Transition::Aborted {
                        index,
                        attempts: attempt,
                    }
                }
            },
        }
    }

    fn finish(&mut self, terminal: DriverState) {
        debug_assert!(terminal.is_terminal());
        self.phase = terminal;
        self.pipeline.terminal = true;
    }
}
