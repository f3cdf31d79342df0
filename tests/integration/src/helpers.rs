//! Test helpers for integration tests
//!
//! Provides utilities for spawning test servers, making HTTP requests,
//! and driving WebSocket clients.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use pos_common::AppConfig;
use pos_realtime::protocol::Envelope;
use pos_realtime::{create_app, create_gateway_state, GatewayState};
use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::fixtures::TEST_SECRET;

/// How long a client waits for an expected frame
pub const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Test server instance that manages lifecycle
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    pub state: GatewayState,
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a new test server with the shared test secret
    pub async fn start() -> Result<Self> {
        Self::start_with_config(AppConfig::for_tests(Some(TEST_SECRET))).await
    }

    /// Start a test server with custom config
    pub async fn start_with_config(config: AppConfig) -> Result<Self> {
        pos_common::try_init_tracing().ok();

        let state = create_gateway_state(config)?;
        let app = create_app(state.clone());

        // Ephemeral port
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            addr,
            client,
            state,
            _handle: handle,
        })
    }

    /// Get base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// WebSocket URL carrying `token` as a query parameter
    pub fn ws_url(&self, token: &str) -> String {
        format!("ws://{}/ws?token={}", self.addr, token)
    }

    /// Connect with a query-string token and wait for the welcome frame
    pub async fn connect(&self, token: &str) -> Result<(WsClient, Envelope)> {
        let mut client = WsClient::connect(&self.ws_url(token)).await?;
        let welcome = client.recv_event("connection:welcome").await?;
        Ok((client, welcome))
    }

    /// Connect with an `Authorization: Bearer` header instead of the query string
    pub async fn connect_with_header(&self, token: &str) -> Result<(WsClient, Envelope)> {
        let mut request = format!("ws://{}/ws", self.addr).into_client_request()?;
        request.headers_mut().insert(
            "Authorization",
            HeaderValue::from_str(&format!("Bearer {token}"))?,
        );
        let (stream, _) = connect_async(request).await?;
        let mut client = WsClient { stream };
        let welcome = client.recv_event("connection:welcome").await?;
        Ok((client, welcome))
    }

    /// Attempt a connection expected to be refused; returns the HTTP status and body
    pub async fn connect_rejected(&self, url: &str) -> Result<(u16, Value)> {
        match connect_async(url).await {
            Ok(_) => anyhow::bail!("Connection unexpectedly accepted"),
            Err(tungstenite::Error::Http(response)) => {
                let status = response.status().as_u16();
                let body = response
                    .body()
                    .as_deref()
                    .map(serde_json::from_slice::<Value>)
                    .transpose()?
                    .unwrap_or(Value::Null);
                Ok((status, body))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.get(&url).send().await?)
    }

    /// Make a GET request with auth token
    pub async fn get_auth(&self, path: &str, token: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.get(&url).bearer_auth(token).send().await?)
    }

    /// Make a POST request with auth token
    pub async fn post_auth<T: Serialize>(
        &self,
        path: &str,
        token: &str,
        body: &T,
    ) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await?)
    }

    /// Wait until the server tracks exactly `count` connections
    pub async fn wait_for_connections(&self, count: usize) -> Result<()> {
        wait_until(|| self.state.manager().connection_count() == count)
            .await
            .with_context(|| {
                format!(
                    "Expected {count} connections, have {}",
                    self.state.manager().connection_count()
                )
            })
    }
}

/// Poll `condition` until it holds or the receive timeout passes
pub async fn wait_until(mut condition: impl FnMut() -> bool) -> Result<()> {
    let deadline = tokio::time::Instant::now() + RECV_TIMEOUT;
    while !condition() {
        if tokio::time::Instant::now() >= deadline {
            anyhow::bail!("Timed out waiting for condition");
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    Ok(())
}

/// WebSocket client speaking the `{event, data}` frame format
pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsClient {
    /// Open a connection without waiting for any frame
    pub async fn connect(url: &str) -> Result<Self> {
        let (stream, _) = connect_async(url).await?;
        Ok(Self { stream })
    }

    /// Send an event
    pub async fn send(&mut self, event: &str, data: Value) -> Result<()> {
        let frame = Envelope::new(event, data).to_json()?;
        self.stream.send(Message::Text(frame)).await?;
        Ok(())
    }

    /// Send raw text
    pub async fn send_raw(&mut self, text: &str) -> Result<()> {
        self.stream.send(Message::Text(text.to_string())).await?;
        Ok(())
    }

    /// Receive the next event frame, or `None` once the server closes
    pub async fn next(&mut self, wait: Duration) -> Result<Option<Envelope>> {
        loop {
            let msg = tokio::time::timeout(wait, self.stream.next())
                .await
                .context("Timed out waiting for frame")?;

            match msg {
                None | Some(Ok(Message::Close(_))) => return Ok(None),
                Some(Ok(Message::Text(text))) => return Ok(Some(Envelope::from_json(&text)?)),
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
            }
        }
    }

    /// Receive the next event frame
    pub async fn recv(&mut self) -> Result<Envelope> {
        self.next(RECV_TIMEOUT)
            .await?
            .context("Connection closed while waiting for frame")
    }

    /// Skip frames until one named `event` arrives
    pub async fn recv_event(&mut self, event: &str) -> Result<Envelope> {
        loop {
            let frame = self.recv().await?;
            if frame.event == event {
                return Ok(frame);
            }
        }
    }

    /// Whether no event frame arrives within `wait`
    pub async fn is_silent(&mut self, wait: Duration) -> bool {
        matches!(
            tokio::time::timeout(wait, self.stream.next()).await,
            Err(_) | Ok(None) | Ok(Some(Ok(Message::Close(_))))
        )
    }

    /// Close the connection
    pub async fn close(mut self) -> Result<()> {
        self.stream.close(None).await?;
        Ok(())
    }
}

/// Assert response status and parse JSON body
pub async fn assert_json<T: DeserializeOwned>(
    response: Response,
    expected_status: StatusCode,
) -> Result<T> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!("Expected status {expected_status}, got {status}. Body: {body}");
    }
    Ok(response.json().await?)
}

/// Assert response status only
pub async fn assert_status(response: Response, expected_status: StatusCode) -> Result<()> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!("Expected status {expected_status}, got {status}. Body: {body}");
    }
    Ok(())
}
