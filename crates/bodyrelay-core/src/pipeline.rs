//! Relay pipeline: classify once, then feed the sequence driver one chunk
//! at a time until it reaches a terminal state.
//!
//! At most one POST is outstanding at any time. The completion callback runs
//! exactly once per run, whatever happens in between; failures are only
//! visible in the log.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::chunker::{total_chunks, ChunkDescriptor};
use crate::classifier::{classify, BodyFormat};
use crate::config::{ConfigError, RelayConfig};
use crate::driver::{DriverState, SequenceDriver, Transition};
use crate::retry::{self, ChunkError, RetryPolicy};
use crate::transport::{ChunkRequest, ChunkResponse, ChunkTransport, CurlTransport, OriginRequest};

/// A captured response and the request that produced it.
#[derive(Debug, Clone, Default)]
pub struct Interception {
    /// Response body; `None` is relayed as an empty body.
    pub body: Option<Vec<u8>>,
    /// Originating request; `None` sends empty metadata headers.
    pub request: Option<OriginRequest>,
}

impl Interception {
    pub fn new(body: Vec<u8>, url: &str, path: &str) -> Self {
        Self {
            body: Some(body),
            request: Some(OriginRequest {
                url: url.to_string(),
                path: path.to_string(),
            }),
        }
    }

    pub fn body(&self) -> &[u8] {
        self.body.as_deref().unwrap_or_default()
    }

    pub fn origin(&self) -> OriginRequest {
        self.request.clone().unwrap_or_default()
    }
}

/// Settings for one pipeline run. Chunk size and attempt budget are never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelaySettings {
    chunk_size: usize,
    policy: RetryPolicy,
}

impl RelaySettings {
    pub fn new(chunk_size: usize, policy: RetryPolicy) -> Result<Self, ConfigError> {
        if chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        if policy.max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        Ok(Self { chunk_size, policy })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }
}

impl TryFrom<&RelayConfig> for RelaySettings {
    type Error = ConfigError;

    fn try_from(cfg: &RelayConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Self::new(cfg.chunk_size, cfg.retry_policy())
    }
}

/// Runs the completion callback when fired, or on drop if never fired.
struct CompletionGuard<F: FnOnce()>(Option<F>);

impl<F: FnOnce()> CompletionGuard<F> {
    fn fire(mut self) {
        if let Some(f) = self.0.take() {
            f();
        }
    }
}

impl<F: FnOnce()> Drop for CompletionGuard<F> {
    fn drop(&mut self) {
        if let Some(f) = self.0.take() {
            f();
        }
    }
}

/// Relay `interception` through `transport`, then call `on_complete` once.
///
/// Blocks the calling thread for the whole run; see `spawn_relay` for async callers.
pub fn relay<T, F>(interception: &Interception, settings: RelaySettings, transport: &mut T, on_complete: F)
where
    T: ChunkTransport + ?Sized,
    F: FnOnce(),
{
    let guard = CompletionGuard(Some(on_complete));
    drive(interception.body(), &interception.origin(), settings, transport);
    guard.fire();
}

/// Run `relay` on a tokio blocking task with a `CurlTransport` built from `cfg`.
///
/// Fails without spawning (and without calling `on_complete`) if `cfg` does not validate.
pub fn spawn_relay<F>(
    interception: Interception,
    cfg: &RelayConfig,
    on_complete: F,
) -> Result<tokio::task::JoinHandle<()>, ConfigError>
where
    F: FnOnce() + Send + 'static,
{
    let settings = RelaySettings::try_from(cfg)?;
    let transport = CurlTransport::from_config(cfg);
    Ok(spawn_relay_with(interception, settings, transport, on_complete))
}

/// Like `spawn_relay` with a caller-supplied transport.
pub fn spawn_relay_with<T, F>(
    interception: Interception,
    settings: RelaySettings,
    mut transport: T,
    on_complete: F,
) -> tokio::task::JoinHandle<()>
where
    T: ChunkTransport + Send + 'static,
    F: FnOnce() + Send + 'static,
{
    tokio::task::spawn_blocking(move || relay(&interception, settings, &mut transport, on_complete))
}

/// Drive the state machine to a terminal state and return it.
pub(crate) fn drive<T>(body: &[u8], origin: &OriginRequest, settings: RelaySettings, transport: &mut T) -> DriverState
where
    T: ChunkTransport + ?Sized,
{
    let format = classify(body);
    let total = total_chunks(body.len(), settings.chunk_size);
    tracing::info!(
        url = %origin.url,
        len = body.len(),
        chunks = total,
        format = %format,
        "relay start"
    );

    let mut driver = SequenceDriver::new(total, format, settings.policy);
    if total == 0 {
        tracing::info!("empty body, nothing to upload");
    }

    while let Some((index, attempt)) = driver.next_dispatch() {
        let outcome = dispatch(body, origin, settings.chunk_size, index, format, transport);
        match &outcome {
            Ok(resp) => tracing::debug!("chunk {} attempt {} uploaded (resp={})", index, attempt, resp.status),
            Err(e) => tracing::warn!("chunk {} attempt {} failed: {}", index, attempt, e),
        }
        let transition = driver.resolve(outcome.as_ref().map(|_| ()).map_err(retry::classify));
        match transition {
            Transition::Retry { .. } | Transition::Advance { .. } | Transition::Ignored => {}
            Transition::Completed => tracing::info!("all {} chunks uploaded successfully", total),
            Transition::Aborted { index, attempts } => {
                tracing::error!("chunk {} failed after {} attempts. abort", index, attempts)
            }
        }
    }
    driver.phase()
}

/// One attempt for chunk `index`. Panics inside the transport become `ChunkError::Internal`.
fn dispatch<T>(
    body: &[u8],
    origin: &OriginRequest,
    chunk_size: usize,
    index: usize,
    format: BodyFormat,
    transport: &mut T,
) -> Result<ChunkResponse, ChunkError>
where
    T: ChunkTransport + ?Sized,
{
    let chunk = ChunkDescriptor::for_index(body, chunk_size, index, format)
        .ok_or_else(|| ChunkError::Internal(format!("chunk {} out of range", index)))?;
    let request = ChunkRequest { chunk, origin };
    let response = panic::catch_unwind(AssertUnwindSafe(|| transport.post(&request)))
        .map_err(|payload| ChunkError::Internal(panic_message(payload.as_ref())))??;
    retry::check_status(response.status, &response.body)?;
    Ok(response)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("transport panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("transport panicked: {}", s)
    } else {
        "transport panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::VecDeque;
    use std::io;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::time::SystemTime;

    enum Step {
        Status(u32),
        TransportError,
        Panic,
    }

    #[derive(Debug)]
    struct Sent {
        index: usize,
        total: usize,
        format: BodyFormat,
        data: Vec<u8>,
    }

    /// Plays back scripted outcomes; 200 once the script runs out.
    #[derive(Default)]
    struct Scripted {
        script: VecDeque<Step>,
        sent: Vec<Sent>,
    }

    impl Scripted {
        fn with(script: Vec<Step>) -> Self {
            Self {
                script: script.into(),
                sent: Vec::new(),
            }
        }

        fn indices(&self) -> Vec<usize> {
            self.sent.iter().map(|s| s.index).collect()
        }
    }

    impl ChunkTransport for Scripted {
        fn post(&mut self, request: &ChunkRequest<'_>) -> Result<ChunkResponse, ChunkError> {
            self.sent.push(Sent {
                index: request.chunk.index,
                total: request.chunk.total_chunks,
                format: request.chunk.format,
                data: request.chunk.data.to_vec(),
            });
            match self.script.pop_front().unwrap_or(Step::Status(200)) {
                Step::Status(status) => Ok(ChunkResponse {
                    status,
                    body: b"ok".to_vec(),
                }),
                Step::TransportError => Err(ChunkError::Transport(curl::Error::new(7))),
                Step::Panic => panic!("malformed response"),
            }
        }
    }

    fn settings(chunk_size: usize) -> RelaySettings {
        RelaySettings::new(chunk_size, RetryPolicy { max_attempts: 3 }).unwrap()
    }

    /// fmt writer that appends into a shared buffer.
    #[derive(Clone, Default)]
    struct LogCapture(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogCapture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Runs `f` under a timestamped fmt subscriber and returns its log lines.
    fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, Vec<String>) {
        let capture = LogCapture::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_timer(SystemTime)
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || writer.clone())
            .finish();
        let out = tracing::subscriber::with_default(subscriber, f);
        let text = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
        (out, text.lines().map(str::to_string).collect())
    }

    /// `2026-10-16T12:00:00.123456Z ...`
    fn starts_with_timestamp(line: &str) -> bool {
        let ts = line.split_whitespace().next().unwrap_or("");
        let b = ts.as_bytes();
        ts.len() >= 20
            && b[..4].iter().all(u8::is_ascii_digit)
            && b[4] == b'-'
            && b[7] == b'-'
            && b[10] == b'T'
            && ts.ends_with('Z')
    }

    fn count(lines: &[String], needle: &str) -> usize {
        lines.iter().filter(|l| l.contains(needle)).count()
    }

    fn body(len: usize) -> Vec<u8> {
        (0u8..251).cycle().take(len).collect()
    }

    /// Runs `relay` and returns how many times the completion callback fired.
    fn run(interception: &Interception, chunk_size: usize, transport: &mut Scripted) -> usize {
        let fired = Cell::new(0);
        relay(interception, settings(chunk_size), transport, || fired.set(fired.get() + 1));
        fired.get()
    }

    #[test]
    fn two_and_a_half_mib_sends_three_sequential_chunks() {
        let mib = 1024 * 1024;
        let data = body(5 * mib / 2);
        let interception = Interception::new(data.clone(), "https://a/x", "/x");
        let mut t = Scripted::default();
        assert_eq!(run(&interception, mib, &mut t), 1);
        assert_eq!(t.indices(), vec![0, 1, 2]);
        assert!(t.sent.iter().all(|s| s.total == 3));
        let sizes: Vec<usize> = t.sent.iter().map(|s| s.data.len()).collect();
        assert_eq!(sizes, vec![mib, mib, mib / 2]);
        let rebuilt: Vec<u8> = t.sent.iter().flat_map(|s| s.data.clone()).collect();
        assert_eq!(rebuilt, data);
    }

    #[test]
    fn empty_or_missing_body_completes_without_network() {
        let mut t = Scripted::default();
        assert_eq!(run(&Interception::default(), 1024, &mut t), 1);
        assert!(t.sent.is_empty());

        let empty = Interception::new(Vec::new(), "https://a/x", "/x");
        assert_eq!(drive(empty.body(), &empty.origin(), settings(1024), &mut t), DriverState::Completed);
        assert!(t.sent.is_empty());
    }

    #[test]
    fn exhausted_chunk_aborts_and_later_chunks_are_never_sent() {
        let interception = Interception::new(body(40), "u", "p");
        let mut t = Scripted::with(vec![
            Step::Status(200),
            Step::Status(500),
            Step::TransportError,
            Step::Status(502),
        ]);
        let state = drive(interception.body(), &interception.origin(), settings(10), &mut t);
        assert_eq!(state, DriverState::Aborted);
        assert_eq!(t.indices(), vec![0, 1, 1, 1]);
    }

    #[test]
    fn retried_success_moves_on() {
        let interception = Interception::new(body(25), "u", "p");
        let mut t = Scripted::with(vec![Step::TransportError, Step::Status(404), Step::Status(201)]);
        let state = drive(interception.body(), &interception.origin(), settings(10), &mut t);
        assert_eq!(state, DriverState::Completed);
        assert_eq!(t.indices(), vec![0, 0, 0, 1, 2]);
    }

    #[test]
    fn panic_in_transport_aborts_without_retry() {
        let interception = Interception::new(body(25), "u", "p");
        let mut t = Scripted::with(vec![Step::Status(200), Step::Panic]);
        let state = drive(interception.body(), &interception.origin(), settings(10), &mut t);
        assert_eq!(state, DriverState::Aborted);
        assert_eq!(t.indices(), vec![0, 1]);
    }

    #[test]
    fn completion_fires_once_for_every_fault_combination() {
        let scripts: Vec<Vec<Step>> = vec![
            vec![],
            vec![Step::TransportError],
            vec![Step::Status(500), Step::Status(500), Step::Status(500)],
            vec![Step::Status(200), Step::Panic],
            vec![Step::TransportError, Step::Status(503), Step::Status(200)],
            vec![Step::Panic],
        ];
        for script in scripts {
            let interception = Interception::new(body(30), "u", "p");
            let mut t = Scripted::with(script);
            assert_eq!(run(&interception, 10, &mut t), 1);
        }
    }

    #[test]
    fn unsendable_header_aborts_before_any_network_call() {
        let interception = Interception::new(body(5), "https://a/\nX-Evil: 1", "/");
        // Port 9 (discard) is never reached: header validation fails first.
        let mut curl = CurlTransport::new(
            "http://127.0.0.1:9/upload",
            "c",
            std::time::Duration::from_millis(50),
            std::time::Duration::from_millis(50),
        );
        let fired = Cell::new(0);
        let state = drive(interception.body(), &interception.origin(), settings(10), &mut curl);
        assert_eq!(state, DriverState::Aborted);
        relay(&interception, settings(10), &mut curl, || fired.set(fired.get() + 1));
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn format_is_fixed_for_the_run() {
        let interception = Interception::new(b"SGVsbG8gd29ybGQh".to_vec(), "u", "p");
        let mut t = Scripted::default();
        run(&interception, 3, &mut t);
        // Chunks like "SGV" are not base64-shaped on their own; the tag comes from the whole body.
        assert!(t.sent.iter().all(|s| s.format == BodyFormat::Base64));
        assert_eq!(t.sent.len(), 6);
    }

    #[test]
    fn completion_fires_even_if_run_unwinds() {
        let fired = Cell::new(0);
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let _guard = CompletionGuard(Some(|| fired.set(fired.get() + 1)));
            panic!("unexpected");
        }));
        assert!(result.is_err());
        assert_eq!(fired.get(), 1);
    }

    #[tokio::test]
    async fn spawn_relay_with_runs_on_blocking_task() {
        let (tx, rx) = std::sync::mpsc::channel();
        let handle = spawn_relay_with(
            Interception::new(body(15), "u", "p"),
            settings(10),
            Scripted::default(),
            move || tx.send(()).unwrap(),
        );
        handle.await.unwrap();
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn zero_chunk_size_cannot_be_configured() {
        assert!(matches!(
            RelaySettings::new(0, RetryPolicy::default()),
            Err(ConfigError::ZeroChunkSize)
        ));
        assert!(matches!(
            RelaySettings::new(10, RetryPolicy { max_attempts: 0 }),
            Err(ConfigError::ZeroAttempts)
        ));
        let mut cfg = RelayConfig::default();
        cfg.chunk_size = 0;
        assert!(matches!(RelaySettings::try_from(&cfg), Err(ConfigError::ZeroChunkSize)));
        cfg.chunk_size = 512;
        let ok = RelaySettings::try_from(&cfg).unwrap();
        assert_eq!(ok.chunk_size(), 512);
        assert_eq!(ok.policy().max_attempts, 3);
    }

    #[tokio::test]
    async fn spawn_relay_refuses_zero_chunk_size() {
        let mut cfg = RelayConfig::default();
        cfg.chunk_size = 0;
        let fired = Arc::new(AtomicBool::new(false));
        let fired_cb = Arc::clone(&fired);
        let res = spawn_relay(Interception::new(body(100), "u", "p"), &cfg, move || {
            fired_cb.store(true, Ordering::SeqCst)
        });
        assert!(matches!(res, Err(ConfigError::ZeroChunkSize)));
        assert!(!fired.load(Ordering::SeqCst));
    }

    #[test]
    fn log_stream_records_start_attempts_and_completion() {
        let interception = Interception::new(body(30), "https://a/x", "/x");
        let mut t = Scripted::with(vec![Step::TransportError]);
        let (state, lines) = capture_logs(|| {
            drive(interception.body(), &interception.origin(), settings(10), &mut t)
        });
        assert_eq!(state, DriverState::Completed);
        assert!(!lines.is_empty());
        assert!(lines.iter().all(|l| starts_with_timestamp(l)), "{:?}", lines);

        let start: Vec<&String> = lines.iter().filter(|l| l.contains("relay start")).collect();
        assert_eq!(start.len(), 1);
        assert!(start[0].contains("chunks=3"));
        assert!(start[0].contains("format=plain"));
        assert!(start[0].contains("len=30"));

        // chunk 0 twice (error, then ok), chunks 1 and 2 once each
        assert_eq!(count(&lines, " attempt "), 4);
        assert_eq!(count(&lines, "chunk 0 attempt 1 failed"), 1);
        assert_eq!(count(&lines, "chunk 0 attempt 2 uploaded (resp=200)"), 1);
        assert_eq!(count(&lines, "all 3 chunks uploaded successfully"), 1);
        assert_eq!(count(&lines, "abort"), 0);
    }

    #[test]
    fn log_stream_records_abort() {
        let interception = Interception::new(body(30), "u", "p");
        let mut t = Scripted::with(vec![
            Step::Status(200),
            Step::Status(500),
            Step::Status(500),
            Step::Status(500),
        ]);
        let (state, lines) = capture_logs(|| {
            drive(interception.body(), &interception.origin(), settings(10), &mut t)
        });
        assert_eq!(state, DriverState::Aborted);
        assert!(lines.iter().all(|l| starts_with_timestamp(l)), "{:?}", lines);
        assert_eq!(count(&lines, " attempt "), 4);
        assert_eq!(count(&lines, "chunk 1 attempt 3 failed: HTTP 500"), 1);
        assert_eq!(count(&lines, "chunk 1 failed after 3 attempts. abort"), 1);
        assert_eq!(count(&lines, "uploaded successfully"), 0);
    }

    #[test]
    fn log_stream_records_empty_body() {
        let empty = Interception::default();
        let mut t = Scripted::default();
        let (state, lines) = capture_logs(|| {
            drive(empty.body(), &empty.origin(), settings(10), &mut t)
        });
        assert_eq!(state, DriverState::Completed);
        assert_eq!(count(&lines, "chunks=0"), 1);
        assert_eq!(count(&lines, "empty body, nothing to upload"), 1);
    }
}
