//! Typed client for issuing log-driver requests against a running plugin.
//!
//! The daemon side of the protocol, used by integration tests and by hosts
//! that drive a plugin directly.  One client holds one HTTP/1.1 connection;
//! requests are issued sequentially over it.

use std::net::SocketAddr;
use std::path::Path;

use hyper::body::Bytes;
use hyper::client::conn::http1::{self, SendRequest};
use hyper::header;
use hyper::{Body, Method, Request, StatusCode};
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpStream, UnixStream};
use tracing::debug;

use crate::error::{ErrorResponse, LogDriverError};
use crate::handler::{
    ACTIVATE_PATH, CAPABILITIES_PATH, PLUGIN_CONTENT_TYPE, READ_LOGS_PATH, START_LOGGING_PATH,
    STOP_LOGGING_PATH,
};
use crate::types::{
    CapabilitiesResponse, LogMessage, PluginManifest, ReadLogsRequest, StartLoggingRequest,
    StopLoggingRequest,
};

/// A lightweight plugin client that sends requests over a single HTTP/1.1
/// connection and decodes the daemon wire format back into crate types.
pub struct PluginClient {
    sender: SendRequest<Body>,
}

impl PluginClient {
    /// Connect to the plugin socket at `path`.
    pub async fn connect_unix(path: impl AsRef<Path>) -> Result<Self, LogDriverError> {
        let path = path.as_ref();
        let stream = UnixStream::connect(path)
            .await
            .map_err(|e| LogDriverError::TransportError(format!("connect {}: {e}", path.display())))?;
        debug!(path = %path.display(), "plugin connection established");
        Self::handshake(stream).await
    }

    /// Connect to a plugin listening on TCP at `addr`.
    pub async fn connect_tcp(addr: SocketAddr) -> Result<Self, LogDriverError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| LogDriverError::TransportError(format!("connect {addr}: {e}")))?;
        debug!(%addr, "plugin connection established");
        Self::handshake(stream).await
    }

    async fn handshake<S>(io: S) -> Result<Self, LogDriverError>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (sender, connection) = http1::handshake(io).await.map_err(LogDriverError::transport)?;
        // Drive the connection until the client goes away.
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                debug!(error = %e, "plugin connection closed with error");
            }
        });
        Ok(Self { sender })
    }

    /// Perform the activation handshake and return the plugin's manifest.
    pub async fn activate(&mut self) -> Result<PluginManifest, LogDriverError> {
        let bytes = self.post(ACTIVATE_PATH, None).await?;
        serde_json::from_slice(&bytes).map_err(LogDriverError::transport)
    }

    /// Ask the plugin to begin capturing a container's log stream.
    pub async fn start_logging(&mut self, req: &StartLoggingRequest) -> Result<(), LogDriverError> {
        let bytes = self.post(START_LOGGING_PATH, Some(encode(req)?)).await?;
        check_empty(&bytes)
    }

    /// Ask the plugin to stop capturing a previously started stream.
    pub async fn stop_logging(&mut self, req: &StopLoggingRequest) -> Result<(), LogDriverError> {
        let bytes = self.post(STOP_LOGGING_PATH, Some(encode(req)?)).await?;
        check_empty(&bytes)
    }

    /// Read back captured log lines for a container.
    pub async fn read_logs(
        &mut self,
        req: &ReadLogsRequest,
    ) -> Result<Vec<LogMessage>, LogDriverError> {
        let bytes = self.post(READ_LOGS_PATH, Some(encode(req)?)).await?;
        // Success is a message array; failure shares the 200 status and is
        // told apart by the `{"Err": ...}` shape.
        match serde_json::from_slice::<Vec<LogMessage>>(&bytes) {
            Ok(messages) => Ok(messages),
            Err(_) => {
                let err: ErrorResponse =
                    serde_json::from_slice(&bytes).map_err(LogDriverError::transport)?;
                Err(LogDriverError::DriverError(err.err))
            }
        }
    }

    /// Query the capabilities the plugin advertises.
    pub async fn capabilities(&mut self) -> Result<CapabilitiesResponse, LogDriverError> {
        let bytes = self.post(CAPABILITIES_PATH, None).await?;
        serde_json::from_slice(&bytes).map_err(LogDriverError::transport)
    }

    /// Issue one POST and return the response body, rejecting non-200
    /// statuses (decode failures and unknown routes on the plugin side).
    async fn post(
        &mut self,
        path: &str,
        payload: Option<Vec<u8>>,
    ) -> Result<Bytes, LogDriverError> {
        let body = payload.map_or_else(Body::empty, Body::from);
        let request = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(header::HOST, "localhost")
            .header(header::CONTENT_TYPE, PLUGIN_CONTENT_TYPE)
            .body(body)
            .map_err(LogDriverError::internal)?;

        self.sender
            .ready()
            .await
            .map_err(LogDriverError::transport)?;
        let response = self
            .sender
            .send_request(request)
            .await
            .map_err(LogDriverError::transport)?;
        let status = response.status();
        let bytes = hyper::body::to_bytes(response.into_body())
            .await
            .map_err(LogDriverError::transport)?;
        debug!(path, %status, "plugin response received");

        if status != StatusCode::OK {
            return Err(LogDriverError::TransportError(format!(
                "unexpected status {status}: {}",
                String::from_utf8_lossy(&bytes)
            )));
        }
        Ok(bytes)
    }
}

fn encode<T: Serialize>(payload: &T) -> Result<Vec<u8>, LogDriverError> {
    serde_json::to_vec(payload).map_err(LogDriverError::internal)
}

/// Decode an empty-success-or-error body, surfacing the `{"Err": ...}` shape
/// as a typed error.
fn check_empty(bytes: &[u8]) -> Result<(), LogDriverError> {
    let payload: ErrorResponse =
        serde_json::from_slice(bytes).map_err(LogDriverError::transport)?;
    if payload.err.is_empty() {
        Ok(())
    } else {
        Err(LogDriverError::DriverError(payload.err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_success() {
        assert!(check_empty(b"{}").is_ok());
    }

    #[test]
    fn err_payload_is_driver_error() {
        let result = check_empty(br#"{"Err": "fifo vanished"}"#);
        match result {
            Err(LogDriverError::DriverError(msg)) => assert_eq!(msg, "fifo vanished"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn garbage_body_is_transport_error() {
        assert!(matches!(
            check_empty(b"not json"),
            Err(LogDriverError::TransportError(_))
        ));
    }
}
