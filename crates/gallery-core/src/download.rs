//! Asset downloads with bounded retries.
//!
//! A download streams a response body into the destination file. The file is
//! only ever left behind when the whole body was written; a failure in the
//! middle of the copy removes it before the next attempt.
//!
//! Network access and sleeping go through the [`AssetTransport`] and
//! [`Sleeper`] traits so the retry behaviour can be exercised without real
//! sockets or delays.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::StatusCode;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::error::DownloadError;

/// Number of attempts per asset.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Backoff unit; attempt `n` waits `n` units after failing.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);

/// Timeout for a single asset request.
pub const ASSET_TIMEOUT: Duration = Duration::from_secs(30);

/// How often and how patiently a download is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Linear backoff after the given 1-based attempt failed.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

/// Waits between attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeper backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// A response body being streamed.
#[async_trait]
pub trait AssetBody: Send {
    /// Next chunk of the body, `None` at the end.
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, DownloadError>;
}

/// Opens asset URLs.
#[async_trait]
pub trait AssetTransport: Send + Sync {
    /// Send the request. Fails without a body on transport errors and on any
    /// status other than 200.
    async fn open(&self, url: &str) -> Result<Box<dyn AssetBody>, DownloadError>;
}

/// Transport over a reqwest client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

struct HttpBody(reqwest::Response);

#[async_trait]
impl AssetBody for HttpBody {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, DownloadError> {
        self.0
            .chunk()
            .await
            .map_err(|e| DownloadError::Transport(e.to_string()))
    }
}

#[async_trait]
impl AssetTransport for HttpTransport {
    async fn open(&self, url: &str) -> Result<Box<dyn AssetBody>, DownloadError> {
        let response = self
            .http
            .get(url)
            .timeout(ASSET_TIMEOUT)
            .send()
            .await
            .map_err(|e| DownloadError::Transport(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(DownloadError::Status(status.as_u16()));
        }
        Ok(Box::new(HttpBody(response)))
    }
}

/// Downloads single assets to disk.
#[derive(Clone)]
pub struct Downloader {
    transport: Arc<dyn AssetTransport>,
    sleeper: Arc<dyn Sleeper>,
    policy: RetryPolicy,
}

impl std::fmt::Debug for Downloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Downloader")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl Downloader {
    pub fn new(
        transport: Arc<dyn AssetTransport>,
        sleeper: Arc<dyn Sleeper>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            sleeper,
            policy,
        }
    }

    /// Default policy over HTTP with real sleeps.
    pub fn http(http: reqwest::Client) -> Self {
        Self::new(
            Arc::new(HttpTransport::new(http)),
            Arc::new(TokioSleeper),
            RetryPolicy::default(),
        )
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Download `url` into `destination`.
    ///
    /// Returns the last error once every attempt failed. Failing to create
    /// the destination file is not retried.
    pub async fn download(&self, url: &str, destination: &Path) -> Result<(), DownloadError> {
        let mut last_error = None;

        for attempt in 1..=self.policy.max_attempts {
            let mut body = match self.transport.open(url).await {
                Ok(body) => body,
                Err(e) => {
                    debug!(url = %url, attempt, error = %e, "Asset request failed");
                    last_error = Some(e);
                    self.sleeper.sleep(self.policy.backoff(attempt)).await;
                    continue;
                }
            };

            let file = File::create(destination)
                .await
                .map_err(|source| DownloadError::Io {
                    path: destination.to_path_buf(),
                    source,
                })?;

            match copy_body(body.as_mut(), file, destination).await {
                Ok(bytes) => {
                    debug!(path = %destination.display(), bytes, attempt, "Asset downloaded");
                    return Ok(());
                }
                Err(e) => {
                    warn!(path = %destination.display(), attempt, error = %e, "Asset copy failed, removing partial file");
                    remove_partial(destination).await;
                    last_error = Some(e);
                    self.sleeper.sleep(self.policy.backoff(attempt)).await;
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| DownloadError::Transport("no download attempts configured".to_string())))
    }
}

async fn copy_body(
    body: &mut dyn AssetBody,
    mut file: File,
    path: &Path,
) -> Result<u64, DownloadError> {
    let io_error = |source| DownloadError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut written = 0u64;
    while let Some(chunk) = body.next_chunk().await? {
        file.write_all(&chunk).await.map_err(io_error)?;
        written += chunk.len() as u64;
    }
    file.flush().await.map_err(io_error)?;
    Ok(written)
}

async fn remove_partial(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "Failed to remove partial file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Records requested sleeps instead of waiting.
    #[derive(Default)]
    struct RecordingSleeper {
        slept: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.slept.lock().unwrap().push(duration);
        }
    }

    /// What one scripted attempt does.
    enum Step {
        Fail(u16),
        Body(Vec<&'static str>),
        /// Sends these chunks, then breaks the stream.
        Broken(Vec<&'static str>),
    }

    struct ScriptedBody {
        chunks: VecDeque<&'static str>,
        broken: bool,
    }

    #[async_trait]
    impl AssetBody for ScriptedBody {
        async fn next_chunk(&mut self) -> Result<Option<Bytes>, DownloadError> {
            match self.chunks.pop_front() {
                Some(chunk) => Ok(Some(Bytes::from_static(chunk.as_bytes()))),
                None if self.broken => Err(DownloadError::Transport("connection reset".to_string())),
                None => Ok(None),
            }
        }
    }

    struct ScriptedTransport {
        steps: Mutex<VecDeque<Step>>,
        opened: Mutex<usize>,
    }

    impl ScriptedTransport {
        fn new(steps: Vec<Step>) -> Self {
            Self {
                steps: Mutex::new(steps.into()),
                opened: Mutex::new(0),
            }
        }

        fn opened(&self) -> usize {
            *self.opened.lock().unwrap()
        }
    }

    #[async_trait]
    impl AssetTransport for ScriptedTransport {
        async fn open(&self, _url: &str) -> Result<Box<dyn AssetBody>, DownloadError> {
            *self.opened.lock().unwrap() += 1;
            match self.steps.lock().unwrap().pop_front() {
                Some(Step::Fail(status)) => Err(DownloadError::Status(status)),
                Some(Step::Body(chunks)) => Ok(Box::new(ScriptedBody {
                    chunks: chunks.into(),
                    broken: false,
                })),
                Some(Step::Broken(chunks)) => Ok(Box::new(ScriptedBody {
                    chunks: chunks.into(),
                    broken: true,
                })),
                None => Err(DownloadError::Transport("script exhausted".to_string())),
            }
        }
    }

    fn downloader(transport: Arc<ScriptedTransport>, sleeper: Arc<RecordingSleeper>) -> Downloader {
        Downloader::new(transport, sleeper, RetryPolicy::default())
    }

    #[test]
    fn test_linear_backoff() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.backoff(1), Duration::from_millis(500));
        assert_eq!(policy.backoff(2), Duration::from_millis(1000));
        assert_eq!(policy.backoff(3), Duration::from_millis(1500));
    }

    #[tokio::test]
    async fn test_success_first_attempt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("001.jpg");
        let transport = Arc::new(ScriptedTransport::new(vec![Step::Body(vec!["abc", "def"])]));
        let sleeper = Arc::new(RecordingSleeper::default());

        downloader(transport.clone(), sleeper.clone())
            .download("http://assets/1.jpg", &path)
            .await
            .unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"abcdef");
        assert_eq!(transport.opened(), 1);
        assert!(sleeper.slept.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_persistent_failure_uses_three_attempts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("001.jpg");
        let transport = Arc::new(ScriptedTransport::new(vec![
            Step::Fail(500),
            Step::Fail(502),
            Step::Fail(503),
        ]));
        let sleeper = Arc::new(RecordingSleeper::default());

        let err = downloader(transport.clone(), sleeper.clone())
            .download("http://assets/1.jpg", &path)
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::Status(503)));
        assert_eq!(transport.opened(), 3);
        assert_eq!(
            *sleeper.slept.lock().unwrap(),
            vec![
                Duration::from_millis(500),
                Duration::from_millis(1000),
                Duration::from_millis(1500)
            ]
        );
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_broken_stream_removes_partial_and_retries_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("002.png");
        let transport = Arc::new(ScriptedTransport::new(vec![
            Step::Broken(vec!["half"]),
            Step::Body(vec!["whole body"]),
        ]));
        let sleeper = Arc::new(RecordingSleeper::default());

        downloader(transport.clone(), sleeper.clone())
            .download("http://assets/2.png", &path)
            .await
            .unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"whole body");
        assert_eq!(transport.opened(), 2);
        assert_eq!(*sleeper.slept.lock().unwrap(), vec![Duration::from_millis(500)]);
    }

    #[tokio::test]
    async fn test_broken_stream_every_attempt_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("003.gif");
        let transport = Arc::new(ScriptedTransport::new(vec![
            Step::Broken(vec!["a"]),
            Step::Broken(vec!["ab"]),
            Step::Broken(vec!["abc"]),
        ]));
        let sleeper = Arc::new(RecordingSleeper::default());

        let err = downloader(transport.clone(), sleeper)
            .download("http://assets/3.gif", &path)
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::Transport(_)));
        assert_eq!(transport.opened(), 3);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_uncreatable_destination_is_not_retried() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("001.jpg");
        let transport = Arc::new(ScriptedTransport::new(vec![
            Step::Body(vec!["x"]),
            Step::Body(vec!["x"]),
        ]));
        let sleeper = Arc::new(RecordingSleeper::default());

        let err = downloader(transport.clone(), sleeper)
            .download("http://assets/1.jpg", &path)
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::Io { .. }));
        assert_eq!(transport.opened(), 1);
        assert!(!path.exists());
    }
}
