use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::capability::Capability;
use crate::core::config::data::{ProviderDescriptor, ProviderKind, DEFAULT_TIMEOUT_MS};
use crate::core::providers::ProviderClient;
use crate::core::request::{
    ErrorKind, GenerationRequest, GenerationResult, Payload, ProviderFailure,
};

pub fn descriptor(id: &str, capability: Capability) -> ProviderDescriptor {
    ProviderDescriptor {
        id: id.to_string(),
        display_name: format!("Test {id}"),
        capability,
        kind: ProviderKind::OpenaiChat,
        endpoint: "https://api.test.com/v1".to_string(),
        requires_credential: false,
        credential_env: None,
        timeout_ms: DEFAULT_TIMEOUT_MS,
        model: None,
        enabled: None,
    }
}

pub fn http_descriptor(
    id: &str,
    capability: Capability,
    kind: ProviderKind,
    endpoint: &str,
) -> ProviderDescriptor {
    ProviderDescriptor {
        kind,
        endpoint: endpoint.to_string(),
        ..descriptor(id, capability)
    }
}

/// HTTP client that never routes through a proxy from the environment.
pub fn test_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("test client should build")
}

/// A provider with a fixed outcome that counts its invocations.
pub struct MockProvider {
    descriptor: ProviderDescriptor,
    outcome: GenerationResult,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockProvider {
    pub fn succeeding(id: &str, capability: Capability, payload: Payload) -> Arc<Self> {
        Arc::new(Self {
            descriptor: descriptor(id, capability),
            outcome: GenerationResult::Success(payload),
            delay: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(id: &str, capability: Capability, kind: ErrorKind) -> Arc<Self> {
        Arc::new(Self {
            descriptor: descriptor(id, capability),
            outcome: GenerationResult::Failure(ProviderFailure::new(kind, format!("{id} failed"))),
            delay: None,
            calls: AtomicUsize::new(0),
        })
    }

    /// A provider that takes `delay` to answer with `payload`.
    pub fn slow(id: &str, capability: Capability, payload: Payload, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            descriptor: descriptor(id, capability),
            outcome: GenerationResult::Success(payload),
            delay: Some(delay),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderClient for MockProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn invoke(
        &self,
        _request: &GenerationRequest,
        _cancel: &CancellationToken,
    ) -> GenerationResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.outcome.clone()
    }
}

/// Echoes the request prompt back, tagged with the provider id.
pub struct EchoProvider {
    descriptor: ProviderDescriptor,
}

impl EchoProvider {
    pub fn new(id: &str, capability: Capability) -> Arc<Self> {
        Arc::new(Self {
            descriptor: descriptor(id, capability),
        })
    }
}

#[async_trait]
impl ProviderClient for EchoProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn invoke(
        &self,
        request: &GenerationRequest,
        _cancel: &CancellationToken,
    ) -> GenerationResult {
        let target = request
            .parameter(crate::core::request::params::TARGET_LANGUAGE)
            .map(|lang| format!("[{lang}] "))
            .unwrap_or_default();
        GenerationResult::Success(Payload::Text(format!("{target}{}", request.prompt())))
    }
}

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub request_line: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn method(&self) -> &str {
        self.request_line.split(' ').next().unwrap_or_default()
    }

    /// Request target including any query string.
    pub fn target(&self) -> &str {
        self.request_line.split(' ').nth(1).unwrap_or_default()
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("request body should be JSON")
    }
}

pub struct MockResponse {
    status: u16,
    content_type: String,
    body: Vec<u8>,
}

impl MockResponse {
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self {
            status,
            content_type: "application/json".to_string(),
            body: body.to_string().into_bytes(),
        }
    }

    pub fn bytes(status: u16, content_type: &str, body: &[u8]) -> Self {
        Self {
            status,
            content_type: content_type.to_string(),
            body: body.to_vec(),
        }
    }

    pub fn text(status: u16, body: &str) -> Self {
        Self::bytes(status, "text/plain", body.as_bytes())
    }
}

/// Loopback HTTP server that answers one scripted response per connection.
pub struct MockServer {
    pub base_url: String,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
    task: JoinHandle<Result<(), String>>,
}

impl MockServer {
    pub async fn start(responses: Vec<MockResponse>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("listener should bind");
        let addr = listener.local_addr().expect("local addr should resolve");
        let captured = Arc::new(Mutex::new(Vec::new()));
        let captured_for_server = Arc::clone(&captured);

        let task = tokio::spawn(async move {
            for response in responses {
                let (mut stream, _) = listener.accept().await.map_err(|err| err.to_string())?;
                let (request_line, headers, body) = read_http_request(&mut stream).await?;
                captured_for_server.lock().await.push(CapturedRequest {
                    request_line,
                    headers,
                    body,
                });

                let head = format!(
                    "HTTP/1.1 {} Mock\r\ncontent-type: {}\r\ncontent-length: {}\r\n\
                     connection: close\r\n\r\n",
                    response.status,
                    response.content_type,
                    response.body.len()
                );
                stream
                    .write_all(head.as_bytes())
                    .await
                    .map_err(|err| err.to_string())?;
                stream
                    .write_all(&response.body)
                    .await
                    .map_err(|err| err.to_string())?;
                stream.shutdown().await.map_err(|err| err.to_string())?;
            }
            Ok::<(), String>(())
        });

        Self {
            base_url: format!("http://{addr}"),
            captured,
            task,
        }
    }

    /// Wait for every scripted response to be served and return what the
    /// server saw.
    pub async fn finish(self) -> Vec<CapturedRequest> {
        self.task
            .await
            .expect("mock server task should join")
            .expect("mock server should succeed");
        self.captured.lock().await.clone()
    }

    pub async fn captured(&self) -> Vec<CapturedRequest> {
        self.captured.lock().await.clone()
    }
}

/// A server that accepts connections and never answers.
pub async fn silent_server() -> (String, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener should bind");
    let addr = listener.local_addr().expect("local addr should resolve");
    let task = tokio::spawn(async move {
        let mut open = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            open.push(stream);
        }
    });
    (format!("http://{addr}"), task)
}

async fn read_http_request(
    stream: &mut TcpStream,
) -> Result<(String, Vec<(String, String)>, Vec<u8>), String> {
    let mut buffer = Vec::new();
    let mut header_end = None;
    while header_end.is_none() {
        let mut chunk = [0_u8; 1024];
        let read = stream
            .read(&mut chunk)
            .await
            .map_err(|err| err.to_string())?;
        if read == 0 {
            return Err("Unexpected EOF while reading HTTP headers".to_string());
        }
        buffer.extend_from_slice(&chunk[..read]);
        header_end = buffer
            .windows(4)
            .position(|window| window == b"\r\n\r\n")
            .map(|index| index + 4);
    }

    let header_end = header_end.expect("header end should exist");
    let header_text =
        std::str::from_utf8(&buffer[..header_end]).map_err(|err| err.to_string())?;
    let mut lines = header_text.split("\r\n").filter(|line| !line.is_empty());
    let request_line = lines
        .next()
        .ok_or_else(|| "Missing HTTP request line".to_string())?
        .to_string();

    let mut headers = Vec::new();
    let mut content_length = 0_usize;
    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim().to_string();
        if name.eq_ignore_ascii_case("content-length") {
            content_length = value.parse::<usize>().map_err(|err| err.to_string())?;
        }
        headers.push((name.to_string(), value));
    }

    let mut body = buffer[header_end..].to_vec();
    while body.len() < content_length {
        let mut chunk = vec![0_u8; content_length - body.len()];
        let read = stream
            .read(&mut chunk)
            .await
            .map_err(|err| err.to_string())?;
        if read == 0 {
            return Err("Unexpected EOF while reading HTTP body".to_string());
        }
        body.extend_from_slice(&chunk[..read]);
    }
    body.truncate(content_length);

    Ok((request_line, headers, body))
}
