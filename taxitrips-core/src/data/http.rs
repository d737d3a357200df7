//! HTTP transport over a blocking reqwest client.
//!
//! Streams the response body straight into a `.part` file. Retries are off by
//! default; with `max_retries > 0`, network errors, 429 and 5xx responses are
//! retried with exponential backoff.

use std::path::Path;
use std::time::Duration;

use super::transport::{write_atomically, FetchError, Transport};

/// Backoff stops doubling after this many retries (500 ms base gives 32 s).
const MAX_BACKOFF_EXPONENT: u32 = 6;

pub struct HttpTransport {
    client: reqwest::blocking::Client,
    max_retries: u32,
    base_delay: Duration,
}

impl HttpTransport {
    pub fn new(max_retries: u32) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            // Monthly files run to hundreds of megabytes.
            .timeout(Duration::from_secs(30 * 60))
            .user_agent(concat!("taxitrips/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_retries,
            base_delay: Duration::from_millis(500),
        })
    }

    /// Delay before retry number `attempt` (1-based): doubles per attempt, capped.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(MAX_BACKOFF_EXPONENT);
        self.base_delay.saturating_mul(1 << exponent)
    }

    fn fetch_once(&self, url: &str, destination: &Path) -> Result<(), FetchError> {
        let mut resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        write_atomically(destination, |file| {
            resp.copy_to(file)
                .map(|_| ())
                .map_err(|e| FetchError::Network(format!("body read failed for {url}: {e}")))
        })
    }
}

impl Transport for HttpTransport {
    fn name(&self) -> &str {
        "http"
    }

    fn fetch(&self, source: &str, destination: &Path) -> Result<(), FetchError> {
        let mut attempt = 0;
        loop {
            match self.fetch_once(source, destination) {
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = self.backoff_delay(attempt);
                    tracing::debug!(source, attempt, error = %e, "retrying after {delay:?}");
                    std::thread::sleep(delay);
                }
                result => return result,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// One-route HTTP server answering every request with a fixed status and body.
    struct StubServer {
        url: String,
        hits: Arc<AtomicUsize>,
    }

    impl StubServer {
        fn start(status: u16, body: &'static [u8]) -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            let addr = listener.local_addr().unwrap();
            let hits = Arc::new(AtomicUsize::new(0));
            let counter = Arc::clone(&hits);

            std::thread::spawn(move || {
                for stream in listener.incoming() {
                    let Ok(mut stream) = stream else { break };
                    let mut request = Vec::new();
                    let mut chunk = [0u8; 1024];
                    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                        match stream.read(&mut chunk) {
                            Ok(0) | Err(_) => break,
                            Ok(n) => request.extend_from_slice(&chunk[..n]),
                        }
                    }
                    counter.fetch_add(1, Ordering::SeqCst);
                    let head = format!(
                        "HTTP/1.1 {status} Stub\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                        body.len()
                    );
                    let _ = stream.write_all(head.as_bytes());
                    let _ = stream.write_all(body);
                    let _ = stream.flush();
                }
            });

            Self {
                url: format!("http://{addr}/yellow_tripdata_2024-01.parquet"),
                hits,
            }
        }

        fn hits(&self) -> usize {
            self.hits.load(Ordering::SeqCst)
        }
    }

    fn transport(max_retries: u32) -> HttpTransport {
        let mut transport = HttpTransport::new(max_retries).unwrap();
        transport.client = reqwest::blocking::Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap();
        transport.base_delay = Duration::from_millis(1);
        transport
    }

    fn dest_in(dir: &tempfile::TempDir) -> std::path::PathBuf {
        dir.path().join("yellow_tripdata_2024-01.parquet")
    }

    #[test]
    fn success_streams_body_to_destination() {
        let server = StubServer::start(200, b"PAR1 monthly bytes");
        let dir = tempfile::tempdir().unwrap();
        let dest = dest_in(&dir);

        transport(2).fetch(&server.url, &dest).unwrap();

        assert_eq!(server.hits(), 1);
        assert_eq!(std::fs::read(&dest).unwrap(), b"PAR1 monthly bytes");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn server_error_is_retried_up_to_the_limit() {
        let server = StubServer::start(503, b"unavailable");
        let dir = tempfile::tempdir().unwrap();
        let dest = dest_in(&dir);

        let err = transport(2).fetch(&server.url, &dest).unwrap_err();

        assert!(matches!(err, FetchError::Status { status: 503, .. }), "got {err:?}");
        assert_eq!(server.hits(), 3);
        assert!(!dest.exists());
    }

    #[test]
    fn rate_limit_is_retried() {
        let server = StubServer::start(429, b"");
        let dir = tempfile::tempdir().unwrap();

        let err = transport(1).fetch(&server.url, &dest_in(&dir)).unwrap_err();

        assert!(matches!(err, FetchError::Status { status: 429, .. }));
        assert_eq!(server.hits(), 2);
    }

    #[test]
    fn not_found_is_not_retried() {
        let server = StubServer::start(404, b"");
        let dir = tempfile::tempdir().unwrap();
        let dest = dest_in(&dir);

        let err = transport(2).fetch(&server.url, &dest).unwrap_err();

        assert!(matches!(err, FetchError::NotFound(_)), "got {err:?}");
        assert_eq!(server.hits(), 1);
        assert!(!dest.exists());
    }

    #[test]
    fn client_error_is_not_retried() {
        let server = StubServer::start(403, b"forbidden");
        let dir = tempfile::tempdir().unwrap();
        let dest = dest_in(&dir);

        let err = transport(2).fetch(&server.url, &dest).unwrap_err();

        assert!(matches!(err, FetchError::Status { status: 403, .. }), "got {err:?}");
        assert_eq!(server.hits(), 1);
        assert!(!dest.exists());
    }

    #[test]
    fn no_retries_by_default() {
        let server = StubServer::start(503, b"");
        let dir = tempfile::tempdir().unwrap();

        let err = transport(0).fetch(&server.url, &dest_in(&dir)).unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(server.hits(), 1);
    }

    #[test]
    fn connection_failure_is_network_error_and_leaves_no_file() {
        // Port 1 on loopback refuses connections.
        let url = "http://127.0.0.1:1/yellow_tripdata_2024-01.parquet";
        let dir = tempfile::tempdir().unwrap();
        let dest = dest_in(&dir);

        let err = transport(0).fetch(url, &dest).unwrap_err();

        assert!(matches!(err, FetchError::Network(_)), "got {err:?}");
        assert!(!dest.exists());
    }

    #[test]
    fn backoff_doubles_then_caps() {
        let transport = HttpTransport::new(0).unwrap();

        assert_eq!(transport.backoff_delay(1), Duration::from_millis(500));
        assert_eq!(transport.backoff_delay(2), Duration::from_millis(1000));
        assert_eq!(transport.backoff_delay(7), Duration::from_secs(32));
        assert_eq!(transport.backoff_delay(40), Duration::from_secs(32));
        assert_eq!(transport.backoff_delay(u32::MAX), Duration::from_secs(32));
    }
}
