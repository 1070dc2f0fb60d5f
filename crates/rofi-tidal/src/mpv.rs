/// One-shot mpv IPC client.
///
/// Every call opens the control socket, writes one JSON line, does a single
/// bounded read and closes again:
///
/// ```text
///   send_command(["get_property", "pause"])
///         │
///         ├── connect   /tmp/rofi_tidal_mpv.sock
///         ├── write     {"command":["get_property","pause"]}\n
///         └── read      ≤ 4096 bytes → one JSON object {"error": ..., "data": ...}
/// ```
///
/// There is no length framing.  A reply longer than the buffer is cut off and
/// fails to parse, which callers see as "player unreachable".
use serde_json::{json, Value};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tracing::debug;

/// Size of the single receive.  Kept small on purpose; see module docs.
pub const READ_BUF_SIZE: usize = 4096;

const IPC_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    #[error("mpv socket {0} does not exist")]
    NoSocket(PathBuf),
    #[error("mpv connect failed: {0}")]
    Connect(#[source] std::io::Error),
    #[error("mpv IPC I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("mpv IPC timed out")]
    Timeout,
    #[error("mpv closed the connection without replying")]
    Closed,
    #[error("mpv reply is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("mpv error: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone)]
pub struct IpcClient {
    socket: PathBuf,
}

impl IpcClient {
    pub fn new(socket: impl Into<PathBuf>) -> Self {
        Self {
            socket: socket.into(),
        }
    }

    pub async fn connect(&self) -> Result<UnixStream, IpcError> {
        if !self.socket.exists() {
            return Err(IpcError::NoSocket(self.socket.clone()));
        }
        UnixStream::connect(&self.socket)
            .await
            .map_err(IpcError::Connect)
    }

    /// Raw exchange: the decoded reply object, whatever its `error` field says.
    pub async fn exchange(&self, command: &Value) -> Result<Value, IpcError> {
        let mut raw = serde_json::to_string(&json!({ "command": command }))?;
        raw.push('\n');

        let roundtrip = async {
            let mut stream = self.connect().await?;
            stream.write_all(raw.as_bytes()).await?;

            let mut buf = vec![0u8; READ_BUF_SIZE];
            let n = stream.read(&mut buf).await?;
            if n == 0 {
                return Err(IpcError::Closed);
            }
            let reply: Value = serde_json::from_slice(trim_ascii(&buf[..n]))?;
            Ok(reply)
        };

        tokio::time::timeout(IPC_TIMEOUT, roundtrip)
            .await
            .map_err(|_| IpcError::Timeout)?
    }

    /// Like [`exchange`](Self::exchange) but anything other than
    /// `"error": "success"` is an error too.
    pub async fn request(&self, command: &Value) -> Result<Value, IpcError> {
        let reply = self.exchange(command).await?;
        match reply.get("error").and_then(Value::as_str) {
            Some("success") => Ok(reply),
            Some(other) => Err(IpcError::Rejected(other.to_string())),
            None => Err(IpcError::Rejected("reply has no error field".to_string())),
        }
    }

    /// Fire a command; every failure collapses to `None`.
    pub async fn send_command(&self, command: Value) -> Option<Value> {
        match self.exchange(&command).await {
            Ok(reply) => Some(reply),
            Err(e) => {
                debug!("mpv: {} -> unreachable ({})", command, e);
                None
            }
        }
    }

    /// `data` of a `get_property` reply, only when mpv reported success.
    pub async fn get_property(&self, name: &str) -> Option<Value> {
        match self.request(&json!(["get_property", name])).await {
            Ok(mut reply) => reply.get_mut("data").map(Value::take),
            Err(e) => {
                debug!("mpv: get_property {} -> none ({})", name, e);
                None
            }
        }
    }
}

fn trim_ascii(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &bytes[start..end]
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, BufReader};
    use tokio::net::UnixListener;

    /// Minimal stand-in for mpv: answers each connection's first line with
    /// `reply(request)` and records what it was sent.
    pub(crate) struct FakeMpv {
        pub dir: tempfile::TempDir,
        pub received: std::sync::Arc<std::sync::Mutex<Vec<Value>>>,
    }

    impl FakeMpv {
        pub(crate) fn socket(&self) -> PathBuf {
            self.dir.path().join("mpv.sock")
        }

        pub(crate) fn spawn<F>(reply: F) -> Self
        where
            F: Fn(&Value) -> String + Send + 'static,
        {
            let dir = tempfile::tempdir().unwrap();
            let listener = UnixListener::bind(dir.path().join("mpv.sock")).unwrap();
            let received = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
            let log = received.clone();
            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    let (read_half, mut write_half) = stream.into_split();
                    let mut line = String::new();
                    let mut reader = BufReader::new(read_half);
                    if reader.read_line(&mut line).await.is_err() {
                        continue;
                    }
                    let request: Value = serde_json::from_str(line.trim()).unwrap_or(Value::Null);
                    let answer = reply(&request);
                    log.lock().unwrap().push(request);
                    let _ = write_half.write_all(answer.as_bytes()).await;
                }
            });
            Self { dir, received }
        }
    }

    #[tokio::test]
    async fn test_get_property_returns_data_on_success() {
        let mpv = FakeMpv::spawn(|_| "{\"data\":\"Intro - Band\",\"error\":\"success\"}\n".into());
        let client = IpcClient::new(mpv.socket());

        let title = client.get_property("media-title").await;
        assert_eq!(title, Some(Value::from("Intro - Band")));

        let sent = mpv.received.lock().unwrap().clone();
        assert_eq!(sent, vec![json!({ "command": ["get_property", "media-title"] })]);
    }

    #[tokio::test]
    async fn test_get_property_ignores_data_on_error() {
        let mpv = FakeMpv::spawn(|_| {
            "{\"data\":null,\"error\":\"property unavailable\"}\n".into()
        });
        let client = IpcClient::new(mpv.socket());
        assert_eq!(client.get_property("media-title").await, None);
        assert!(matches!(
            client.request(&json!(["get_property", "pause"])).await,
            Err(IpcError::Rejected(e)) if e == "property unavailable"
        ));
    }

    #[tokio::test]
    async fn test_missing_socket_is_unreachable() {
        let dir = tempfile::tempdir().unwrap();
        let client = IpcClient::new(dir.path().join("absent.sock"));
        assert!(matches!(client.connect().await, Err(IpcError::NoSocket(_))));
        assert_eq!(client.send_command(json!(["quit"])).await, None);
        assert_eq!(client.get_property("pause").await, None);
    }

    #[tokio::test]
    async fn test_oversized_reply_is_not_returned() {
        let big = "x".repeat(READ_BUF_SIZE * 2);
        let mpv = FakeMpv::spawn(move |_| {
            format!("{{\"data\":\"{}\",\"error\":\"success\"}}\n", big)
        });
        let client = IpcClient::new(mpv.socket());
        assert_eq!(client.get_property("metadata").await, None);
        assert!(matches!(
            client.exchange(&json!(["get_property", "metadata"])).await,
            Err(IpcError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_malformed_reply_is_unreachable() {
        let mpv = FakeMpv::spawn(|_| "not json at all\n".into());
        let client = IpcClient::new(mpv.socket());
        assert_eq!(client.send_command(json!(["cycle", "pause"])).await, None);
    }

    #[test]
    fn test_trim_ascii() {
        assert_eq!(trim_ascii(b"  {}\n"), b"{}");
        assert_eq!(trim_ascii(b"\n\n"), b"");
    }
}
