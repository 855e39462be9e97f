use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::error::TransportError;
use super::wire::{AskRequest, AskResponse, GraphInfoResponse, HealthReport};
use super::GraphService;
use crate::config::Config;
use crate::state::{AssistantReply, DashboardStats};

const JSON: &str = "application/json";

/// HTTP client for the GraphRAG reasoning service
#[derive(Clone)]
pub struct GraphRagClient {
    client: Client,
    base_url: String,
}

impl GraphRagClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Build a client honouring the configured base URL and timeout
    pub fn from_config(config: &Config) -> Result<Self, TransportError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: config.base_url().to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, TransportError> {
        let url = self.endpoint(path);
        debug!(%url, "GET");

        let response = self.client.get(&url).header(ACCEPT, JSON).send().await?;
        decode(response).await
    }
}

/// Reject non-success statuses, then parse the body
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, TransportError> {
    let status = response.status();
    if !status.is_success() {
        warn!(%status, url = %response.url(), "reasoning service returned an error status");
        return Err(TransportError::Status { status: status.as_u16() });
    }

    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

#[async_trait]
impl GraphService for GraphRagClient {
    async fn query(&self, text: &str) -> Result<AssistantReply, TransportError> {
        let url = self.endpoint("/ask");
        debug!(%url, "POST");

        let response = self
            .client
            .post(&url)
            .header(ACCEPT, JSON)
            .json(&AskRequest { query: text })
            .send()
            .await?;

        let body: AskResponse = decode(response).await?;
        Ok(body.into())
    }

    async fn fetch_stats(&self) -> Result<DashboardStats, TransportError> {
        let body: GraphInfoResponse = self.get("/graph-info").await?;
        Ok(body.into())
    }

    async fn health(&self) -> Result<HealthReport, TransportError> {
        self.get("/").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::sync::mpsc;

    /// One-route HTTP server answering every request with a canned response
    /// and reporting the raw request text it received
    struct TestServer {
        addr: SocketAddr,
        requests: mpsc::UnboundedReceiver<String>,
        handle: tokio::task::JoinHandle<()>,
    }

    impl TestServer {
        async fn start(status_line: &'static str, body: &'static str) -> Self {
            Self::start_with_delay(status_line, body, Duration::ZERO).await
        }

        async fn start_with_delay(status_line: &'static str, body: &'static str, delay: Duration) -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            let (tx, requests) = mpsc::unbounded_channel();

            let handle = tokio::spawn(async move {
                while let Ok((mut socket, _)) = listener.accept().await {
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        let request = read_request(&mut socket).await;
                        let _ = tx.send(request);
                        tokio::time::sleep(delay).await;

                        let response = format!(
                            "HTTP/1.1 {}\r\n\
                             Content-Type: application/json\r\n\
                             Content-Length: {}\r\n\
                             Connection: close\r\n\
                             \r\n\
                             {}",
                            status_line,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
            });

            Self { addr, requests, handle }
        }

        fn url(&self) -> String {
            format!("http://{}", self.addr)
        }
    }

    impl Drop for TestServer {
        fn drop(&mut self) {
            self.handle.abort();
        }
    }

    /// Read headers plus a Content-Length body so the client never sees a reset
    async fn read_request(socket: &mut TcpStream) -> String {
        let mut data = Vec::new();
        let mut buf = [0u8; 1024];

        loop {
            let n = socket.read(&mut buf).await.unwrap_or(0);
            if n == 0 {
                break;
            }
            data.extend_from_slice(&buf[..n]);

            let text = String::from_utf8_lossy(&data);
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if data.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }

        String::from_utf8_lossy(&data).into_owned()
    }

    #[tokio::test]
    async fn test_query_posts_json_and_maps_reply() {
        let mut server = TestServer::start(
            "200 OK",
            r#"{"answer":"Christopher Nolan","tool_calls":[{"tool":"graph_lookup"}],"reasoning":[],"context_used":1,"execution_time":0.8}"#,
        )
        .await;
        let client = GraphRagClient::new(&format!("{}/", server.url()));

        let reply = client.query("Who directed Inception?").await.unwrap();
        assert_eq!(reply.content, "Christopher Nolan");
        assert_eq!(reply.tool_calls.len(), 1);
        assert_eq!(reply.tool_calls[0].tool_name, "graph_lookup");
        assert_eq!(reply.execution_time_secs, Some(0.8));

        let request = server.requests.recv().await.unwrap();
        assert!(request.starts_with("POST /ask HTTP/1.1"));
        assert!(request.to_ascii_lowercase().contains("content-type: application/json"));
        assert!(request.ends_with(r#"{"query":"Who directed Inception?"}"#));
    }

    #[tokio::test]
    async fn test_fetch_stats_maps_counts() {
        let mut server = TestServer::start(
            "200 OK",
            r#"{"total_movies":500,"total_people":1200,"total_genres":20,"total_relationships":8000}"#,
        )
        .await;
        let client = GraphRagClient::new(&server.url());

        let stats = client.fetch_stats().await.unwrap();
        assert_eq!(stats.movie_count, 500);
        assert_eq!(stats.entity_count, 1200);
        assert_eq!(stats.genre_count, 20);
        assert_eq!(stats.relationship_count, 8000);

        let request = server.requests.recv().await.unwrap();
        assert!(request.starts_with("GET /graph-info HTTP/1.1"));
    }

    #[tokio::test]
    async fn test_health_probe() {
        let server = TestServer::start(
            "200 OK",
            r#"{"status":"healthy","neo4j_connected":true,"llm_available":true}"#,
        )
        .await;
        let client = GraphRagClient::new(&server.url());

        assert!(client.health().await.unwrap().is_healthy());
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let server = TestServer::start(
            "503 Service Unavailable",
            r#"{"detail":"Agent system not initialized"}"#,
        )
        .await;
        let client = GraphRagClient::new(&server.url());

        let err = client.query("x").await.unwrap_err();
        assert!(matches!(err, TransportError::Status { status: 503 }));
    }

    #[tokio::test]
    async fn test_unparsable_body_is_a_decode_error() {
        let server = TestServer::start("200 OK", "<html>proxy error</html>").await;
        let client = GraphRagClient::new(&server.url());

        let err = client.fetch_stats().await.unwrap_err();
        assert!(matches!(err, TransportError::Decode(_)));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_a_network_error() {
        // Bind then drop to get a port with nothing listening
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };
        let client = GraphRagClient::new(&format!("http://{addr}"));

        let err = client.query("x").await.unwrap_err();
        assert!(matches!(err, TransportError::Network(_) | TransportError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_configured_timeout_applies() {
        let server = TestServer::start_with_delay("200 OK", "{}", Duration::from_secs(5)).await;
        let config = Config {
            api_base_url: server.url(),
            request_timeout_secs: Some(1),
        };
        let client = GraphRagClient::from_config(&config).unwrap();

        let err = client.fetch_stats().await.unwrap_err();
        assert!(matches!(err, TransportError::Timeout(_)));
    }

    #[test]
    fn test_base_url_is_normalised() {
        let client = GraphRagClient::new("http://localhost:8000/api//");
        assert_eq!(client.base_url(), "http://localhost:8000/api");
        assert_eq!(client.endpoint("/ask"), "http://localhost:8000/api/ask");
    }
}
