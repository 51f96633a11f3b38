// src/app/fetcher.rs
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info};

use super::types::{FetchId, FetchMsg, FetchOutcome, MetadataPatch, RecordHandle, Unavailable};
use crate::config::AppConfig;
use crate::error::Result;

/// Called from the worker thread after a message is queued, so the UI loop
/// can wake up and drain it.
pub type Waker = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Deserialize)]
struct OmdbResponse {
    #[serde(rename = "Poster", default)]
    poster: String,
    #[serde(rename = "Plot", default)]
    plot: String,
}

/// Best-effort OMDb lookup. Every failure is reported as
/// `FetchOutcome::Unavailable`, never as an error.
pub struct MetadataFetcher {
    client: Client,
    api_key: Option<String>,
    endpoint: String,
}

impl MetadataFetcher {
    pub fn new(cfg: &AppConfig) -> Result<Self> {
        Self::with_settings(
            cfg.omdb_api_key.clone(),
            cfg.omdb_endpoint.clone(),
            cfg.fetch_timeout,
        )
    }

    pub fn with_settings(
        api_key: Option<String>,
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent("medialib/fetch")
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            endpoint: endpoint.into(),
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Blocking; call from a worker thread.
    pub fn fetch(&self, title: &str) -> FetchOutcome {
        match self.lookup(title) {
            Ok(patch) => FetchOutcome::Fetched(patch),
            Err(reason) => FetchOutcome::Unavailable(reason),
        }
    }

    fn lookup(&self, title: &str) -> std::result::Result<MetadataPatch, Unavailable> {
        let key = self.api_key.as_deref().ok_or(Unavailable::MissingApiKey)?;
        let title = title.trim();
        if title.is_empty() {
            return Err(Unavailable::EmptyTitle);
        }

        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[("t", title), ("apikey", key), ("plot", "short")])
            .send()
            .map_err(classify)?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(Unavailable::HttpStatus(status.as_u16()));
        }

        let body = resp.text().map_err(classify)?;
        let parsed: OmdbResponse = serde_json::from_str(&body)
            .map_err(|e| Unavailable::MalformedBody(e.to_string()))?;

        Ok(MetadataPatch {
            poster_url: Some(parsed.poster),
            plot: Some(parsed.plot),
        })
    }
}

fn classify(err: reqwest::Error) -> Unavailable {
    if err.is_timeout() {
        Unavailable::Timeout
    } else {
        Unavailable::Network(err.to_string())
    }
}

pub struct FetchJob {
    pub id: FetchId,
    pub handle: RecordHandle,
    pub title: String,
}

// Sends `Finished` when the worker ends, including by panic.
struct FinishGuard {
    id: FetchId,
    tx: Sender<FetchMsg>,
    waker: Option<Waker>,
}

impl Drop for FinishGuard {
    fn drop(&mut self) {
        let _ = self.tx.send(FetchMsg::Finished { id: self.id });
        if let Some(wake) = &self.waker {
            wake();
        }
    }
}

/// Run one lookup on its own thread. The result comes back over `tx` as
/// `FetchMsg::Done`, followed by `FetchMsg::Finished`.
pub fn dispatch(
    fetcher: Arc<MetadataFetcher>,
    job: FetchJob,
    tx: Sender<FetchMsg>,
    waker: Option<Waker>,
) -> JoinHandle<()> {
    debug!("dispatching metadata fetch {:?} for {:?}", job.id, job.title);
    std::thread::spawn(move || {
        let guard = FinishGuard {
            id: job.id,
            tx,
            waker,
        };
        let outcome = fetcher.fetch(&job.title);
        match &outcome {
            FetchOutcome::Fetched(_) => info!("metadata fetched for {:?}", job.title),
            FetchOutcome::Unavailable(why) => {
                info!("metadata unavailable for {:?}: {why}", job.title)
            }
        }
        let _ = guard.tx.send(FetchMsg::Done {
            id: job.id,
            handle: job.handle,
            outcome,
        });
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;

    fn http_response(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    /// Serve exactly one canned response; the join handle yields the request head.
    fn serve_once(response: String) -> (String, std::thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut req = Vec::new();
            let mut buf = [0u8; 4096];
            while !req.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                req.extend_from_slice(&buf[..n]);
            }
            stream.write_all(response.as_bytes()).unwrap();
            String::from_utf8_lossy(&req).into_owned()
        });
        (format!("http://{addr}/"), handle)
    }

    fn fetcher(key: Option<&str>, endpoint: &str) -> MetadataFetcher {
        MetadataFetcher::with_settings(key.map(String::from), endpoint, Duration::from_secs(5))
            .unwrap()
    }

    #[test]
    fn missing_key_is_unavailable_without_request() {
        let f = fetcher(None, "http://127.0.0.1:1/");
        assert!(!f.has_api_key());
        assert_eq!(
            f.fetch("Alien"),
            FetchOutcome::Unavailable(Unavailable::MissingApiKey)
        );
        let blank = fetcher(Some("  "), "http://127.0.0.1:1/");
        assert!(!blank.has_api_key());
    }

    #[test]
    fn empty_title_is_unavailable() {
        let f = fetcher(Some("k"), "http://127.0.0.1:1/");
        assert_eq!(
            f.fetch("   "),
            FetchOutcome::Unavailable(Unavailable::EmptyTitle)
        );
    }

    #[test]
    fn ok_response_becomes_patch() {
        let body = r#"{"Title":"Blade Runner","Poster":"https://img/br.jpg","Plot":"A blade runner must pursue replicants.","Response":"True"}"#;
        let (endpoint, server) = serve_once(http_response("200 OK", body));

        let out = fetcher(Some("secret"), &endpoint).fetch("Blade Runner");
        assert_eq!(
            out,
            FetchOutcome::Fetched(MetadataPatch {
                poster_url: Some("https://img/br.jpg".into()),
                plot: Some("A blade runner must pursue replicants.".into()),
            })
        );

        let request = server.join().unwrap();
        let line = request.lines().next().unwrap();
        assert!(line.starts_with("GET /?"), "{line}");
        assert!(line.contains("t=Blade+Runner"), "{line}");
        assert!(line.contains("apikey=secret"), "{line}");
        assert!(line.contains("plot=short"), "{line}");
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let (endpoint, server) = serve_once(http_response("200 OK", r#"{"Response":"True"}"#));
        let out = fetcher(Some("k"), &endpoint).fetch("Obscure");
        let patch = out.patch().unwrap();
        assert_eq!(patch.poster_url.as_deref(), Some(""));
        assert_eq!(patch.plot.as_deref(), Some(""));
        server.join().unwrap();
    }

    #[test]
    fn non_200_is_unavailable() {
        let (endpoint, server) =
            serve_once(http_response("401 Unauthorized", r#"{"Error":"Invalid API key!"}"#));
        assert_eq!(
            fetcher(Some("bad"), &endpoint).fetch("Alien"),
            FetchOutcome::Unavailable(Unavailable::HttpStatus(401))
        );
        server.join().unwrap();
    }

    #[test]
    fn garbage_body_is_unavailable() {
        let (endpoint, server) = serve_once(http_response("200 OK", "<html>oops</html>"));
        let out = fetcher(Some("k"), &endpoint).fetch("Alien");
        assert!(matches!(
            out,
            FetchOutcome::Unavailable(Unavailable::MalformedBody(_))
        ));
        server.join().unwrap();
    }

    #[test]
    fn refused_connection_is_unavailable() {
        let addr = {
            let l = TcpListener::bind("127.0.0.1:0").unwrap();
            l.local_addr().unwrap()
        };
        let out = fetcher(Some("k"), &format!("http://{addr}/")).fetch("Alien");
        assert!(matches!(
            out,
            FetchOutcome::Unavailable(Unavailable::Network(_) | Unavailable::Timeout)
        ));
    }

    #[test]
    fn silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let server = std::thread::spawn(move || {
            // accept, then say nothing until the client has given up
            let (_stream, _) = listener.accept().unwrap();
            let _ = release_rx.recv_timeout(Duration::from_secs(10));
        });

        let f = MetadataFetcher::with_settings(
            Some("k".into()),
            format!("http://{addr}/"),
            Duration::from_millis(300),
        )
        .unwrap();
        assert_eq!(
            f.fetch("Alien"),
            FetchOutcome::Unavailable(Unavailable::Timeout)
        );

        release_tx.send(()).unwrap();
        server.join().unwrap();
    }

    #[test]
    fn dispatch_reports_done_then_finished() {
        let f = Arc::new(fetcher(None, "http://127.0.0.1:1/"));
        let (tx, rx) = mpsc::channel();
        let woke = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&woke);
        let waker: Waker = Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let job = FetchJob {
            id: FetchId(7),
            handle: RecordHandle(3),
            title: "Alien".into(),
        };
        dispatch(f, job, tx, Some(waker)).join().unwrap();

        match rx.recv().unwrap() {
            FetchMsg::Done { id, handle, outcome } => {
                assert_eq!(id, FetchId(7));
                assert_eq!(handle, RecordHandle(3));
                assert_eq!(outcome, FetchOutcome::Unavailable(Unavailable::MissingApiKey));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(rx.recv().unwrap(), FetchMsg::Finished { id } if id == FetchId(7)));
        assert_eq!(woke.load(Ordering::SeqCst), 1);
    }
}
