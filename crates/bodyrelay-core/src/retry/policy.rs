/// Classification of a failed attempt for retry purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// No response obtained.
    Transport,
    /// Response with a non-2xx status.
    HttpStatus,
    /// Fault while building the request or handling its result.
    Internal,
}

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Re-dispatch the same chunk immediately with this attempt number.
    Retry { next_attempt: u32 },
    /// Stop; the relay aborts.
    GiveUp,
}

/// Fixed attempt budget per chunk. No backoff, no jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts per chunk (including the first).
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3 }
    }
}

impl RetryPolicy {
    /// Decide what to do after attempt `attempt` (1-based) failed with `kind`.
    pub fn decide(&self, attempt: u32, kind: FailureKind) -> RetryDecision {
        if kind == FailureKind::Internal || attempt >= self.max_attempts {
            return RetryDecision::GiveUp;
        }
        RetryDecision::Retry {
            next_attempt: attempt + 1,
        }
    }
}
