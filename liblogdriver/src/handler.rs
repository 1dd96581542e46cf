//! Fixed route table of the log-driver plugin protocol and the dispatch from
//! each route to the [`LogDriver`] trait.
//!
//! Every route accepts a single JSON request body.  Decode failures
//! short-circuit with a 400 before the driver is invoked; driver failures are
//! re-encoded as the `{"Err": ...}` payload with a 200 status, since the
//! daemon distinguishes success from failure by payload shape.

use std::sync::Arc;

use hyper::header::{self, HeaderValue};
use hyper::{Body, Request, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::driver::LogDriver;
use crate::error::{ErrorResponse, LogDriverError};
use crate::types::{ReadLogsRequest, StartLoggingRequest, StopLoggingRequest};

/// Manifest returned by the activation handshake.
pub const LOG_DRIVER_MANIFEST: &str = r#"{"Implements": ["LogDriver"]}"#;

/// Media type carried by every plugin response.
pub const PLUGIN_CONTENT_TYPE: &str = "application/vnd.docker.plugins.v1.1+json";

/// Plugin activation handshake route.
pub const ACTIVATE_PATH: &str = "/Plugin.Activate";
/// Start-logging route.
pub const START_LOGGING_PATH: &str = "/LogDriver.StartLogging";
/// Stop-logging route.
pub const STOP_LOGGING_PATH: &str = "/LogDriver.StopLogging";
/// Read-logs route.
pub const READ_LOGS_PATH: &str = "/LogDriver.ReadLogs";
/// Capabilities route.
pub const CAPABILITIES_PATH: &str = "/LogDriver.Capabilities";

/// Forwards requests and responses between the daemon and the driver.
pub struct PluginHandler<D> {
    driver: Arc<D>,
}

impl<D: LogDriver> PluginHandler<D> {
    /// Initialize the request handler with a driver implementation.
    pub fn new(driver: D) -> Self {
        Self {
            driver: Arc::new(driver),
        }
    }

    /// Map a request to the correct trait method call and wrap the result in
    /// the wire format the daemon expects.
    #[instrument(skip_all, fields(path = %req.uri().path()))]
    pub async fn handle(&self, req: Request<Body>) -> Response<Body> {
        debug!("plugin request received");

        // The path is cloned out so the request can be consumed by decoding.
        let path = req.uri().path().to_owned();
        match path.as_str() {
            // The handshake is answered by the adapter itself; the driver is
            // never consulted.
            ACTIVATE_PATH => json_response(LOG_DRIVER_MANIFEST.as_bytes().to_vec()),

            START_LOGGING_PATH => {
                let req: StartLoggingRequest = match decode_request(req).await {
                    Ok(r) => r,
                    Err(resp) => return resp,
                };
                match self.driver.start_logging(req).await {
                    Ok(()) => empty_response(),
                    Err(e) => error_response(&e),
                }
            }

            STOP_LOGGING_PATH => {
                let req: StopLoggingRequest = match decode_request(req).await {
                    Ok(r) => r,
                    Err(resp) => return resp,
                };
                match self.driver.stop_logging(req).await {
                    Ok(()) => empty_response(),
                    Err(e) => error_response(&e),
                }
            }

            READ_LOGS_PATH => {
                let req: ReadLogsRequest = match decode_request(req).await {
                    Ok(r) => r,
                    Err(resp) => return resp,
                };
                match self.driver.read_logs(req).await {
                    Ok(messages) => encode_response(&messages),
                    Err(e) => error_response(&e),
                }
            }

            // Capabilities takes no input; the request body is ignored.
            CAPABILITIES_PATH => encode_response(&self.driver.capabilities().await),

            other => {
                warn!(path = other, "unknown plugin route");
                plain_response(StatusCode::NOT_FOUND, "unknown route".to_owned())
            }
        }
    }
}

/// Decode a JSON request body into `T`.
///
/// Failures short-circuit with a 400 response carried in the `Err` arm, so
/// callers return it without touching the driver.
async fn decode_request<T: DeserializeOwned>(req: Request<Body>) -> Result<T, Response<Body>> {
    let body = match hyper::body::to_bytes(req.into_body()).await {
        Ok(b) => b,
        Err(e) => {
            return Err(plain_response(
                StatusCode::BAD_REQUEST,
                format!("read request body: {e}"),
            ));
        }
    };
    serde_json::from_slice(&body).map_err(|e| {
        debug!(error = %e, "request decode failed");
        plain_response(StatusCode::BAD_REQUEST, format!("decode request: {e}"))
    })
}

/// Serialize `value` into a 200 response with the plugin media type.
fn encode_response<T: Serialize>(value: &T) -> Response<Body> {
    match serde_json::to_vec(value) {
        Ok(payload) => json_response(payload),
        Err(e) => plain_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("encode response: {e}"),
        ),
    }
}

/// The empty success body: `{}`.
fn empty_response() -> Response<Body> {
    json_response(b"{}".to_vec())
}

/// A driver failure, flattened into the `{"Err": ...}` payload with a 200
/// status.
fn error_response(e: &LogDriverError) -> Response<Body> {
    debug!(error = %e, "driver returned error");
    encode_response(&ErrorResponse::from(e))
}

fn json_response(payload: Vec<u8>) -> Response<Body> {
    let mut resp = Response::new(Body::from(payload));
    resp.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(PLUGIN_CONTENT_TYPE),
    );
    resp
}

fn plain_response(status: StatusCode, msg: String) -> Response<Body> {
    let mut resp = Response::new(Body::from(msg));
    *resp.status_mut() = status;
    resp
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CapabilitiesResponse, ContainerInfo, LogMessage};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;

    /// Records every call so tests can assert whether the driver was reached.
    #[derive(Default)]
    struct RecordingDriver {
        started: Mutex<Vec<String>>,
        stopped: Mutex<Vec<String>>,
        fail_start: bool,
        messages: Vec<LogMessage>,
    }

    #[async_trait]
    impl LogDriver for RecordingDriver {
        async fn start_logging(&self, req: StartLoggingRequest) -> Result<(), LogDriverError> {
            if self.fail_start {
                return Err(LogDriverError::AlreadyLogging(req.file));
            }
            self.started.lock().unwrap().push(req.file);
            Ok(())
        }

        async fn stop_logging(&self, req: StopLoggingRequest) -> Result<(), LogDriverError> {
            self.stopped.lock().unwrap().push(req.file);
            Ok(())
        }

        async fn read_logs(
            &self,
            _req: ReadLogsRequest,
        ) -> Result<Vec<LogMessage>, LogDriverError> {
            if self.messages.is_empty() {
                return Err(LogDriverError::ReadLogsUnsupported);
            }
            Ok(self.messages.clone())
        }

        async fn capabilities(&self) -> CapabilitiesResponse {
            CapabilitiesResponse {
                read_logs: !self.messages.is_empty(),
            }
        }
    }

    fn post(path: &str, body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(path)
            .body(body.into())
            .unwrap()
    }

    fn start_body(file: &str) -> String {
        serde_json::to_string(&StartLoggingRequest {
            file: file.into(),
            info: ContainerInfo {
                container_id: "deadbeef".into(),
                ..Default::default()
            },
        })
        .unwrap()
    }

    async fn body_json(resp: Response<Body>) -> serde_json::Value {
        let bytes = hyper::body::to_bytes(resp.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn activate_returns_manifest() {
        let handler = PluginHandler::new(RecordingDriver::default());
        let resp = handler.handle(post(ACTIVATE_PATH, Body::empty())).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            PLUGIN_CONTENT_TYPE
        );
        let v = body_json(resp).await;
        assert_eq!(v["Implements"][0], "LogDriver");
    }

    #[tokio::test]
    async fn start_logging_success_is_empty_object() {
        let handler = PluginHandler::new(RecordingDriver::default());
        let resp = handler
            .handle(post(START_LOGGING_PATH, start_body("/run/fifo-1")))
            .await;

        assert_eq!(resp.status(), StatusCode::OK);
        let v = body_json(resp).await;
        assert_eq!(v, serde_json::json!({}));
        assert_eq!(
            *handler.driver.started.lock().unwrap(),
            vec!["/run/fifo-1".to_owned()]
        );
    }

    #[tokio::test]
    async fn driver_error_keeps_ok_status() {
        let handler = PluginHandler::new(RecordingDriver {
            fail_start: true,
            ..Default::default()
        });
        let resp = handler
            .handle(post(START_LOGGING_PATH, start_body("/run/fifo-1")))
            .await;

        // The daemon inspects the payload shape, not the status code.
        assert_eq!(resp.status(), StatusCode::OK);
        let v = body_json(resp).await;
        assert_eq!(v["Err"], "logging already started for /run/fifo-1");
    }

    #[tokio::test]
    async fn malformed_body_short_circuits_without_driver() {
        let handler = PluginHandler::new(RecordingDriver::default());
        let resp = handler
            .handle(post(START_LOGGING_PATH, "{not json"))
            .await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(handler.driver.started.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_required_field_is_a_decode_failure() {
        let handler = PluginHandler::new(RecordingDriver::default());
        // No "File" field.
        let resp = handler
            .handle(post(START_LOGGING_PATH, r#"{"Info": {"ContainerID": "x"}}"#))
            .await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(handler.driver.started.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn stop_logging_reaches_driver() {
        let handler = PluginHandler::new(RecordingDriver::default());
        let resp = handler
            .handle(post(STOP_LOGGING_PATH, r#"{"File": "/run/fifo-1"}"#))
            .await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            *handler.driver.stopped.lock().unwrap(),
            vec!["/run/fifo-1".to_owned()]
        );
    }

    #[tokio::test]
    async fn read_logs_returns_typed_payload() {
        let handler = PluginHandler::new(RecordingDriver {
            messages: vec![LogMessage {
                line: "hello".into(),
                source: "stdout".into(),
                timestamp: Utc::now(),
                partial: false,
            }],
            ..Default::default()
        });
        let resp = handler
            .handle(post(
                READ_LOGS_PATH,
                r#"{"ReadConfig": {}, "Info": {"ContainerID": "deadbeef"}}"#,
            ))
            .await;

        assert_eq!(resp.status(), StatusCode::OK);
        let v = body_json(resp).await;
        assert_eq!(v[0]["Line"], "hello");
        assert_eq!(v[0]["Source"], "stdout");
    }

    #[tokio::test]
    async fn read_logs_unsupported_is_err_payload() {
        let handler = PluginHandler::new(RecordingDriver::default());
        let resp = handler
            .handle(post(
                READ_LOGS_PATH,
                r#"{"ReadConfig": {}, "Info": {"ContainerID": "deadbeef"}}"#,
            ))
            .await;

        assert_eq!(resp.status(), StatusCode::OK);
        let v = body_json(resp).await;
        assert_eq!(v["Err"], "log reading is not supported by this driver");
    }

    #[tokio::test]
    async fn capabilities_ignores_body() {
        let handler = PluginHandler::new(RecordingDriver::default());
        // Whatever the body contains, capabilities never decodes it.
        let resp = handler
            .handle(post(CAPABILITIES_PATH, "{not json"))
            .await;

        assert_eq!(resp.status(), StatusCode::OK);
        let v = body_json(resp).await;
        assert_eq!(v["ReadLogs"], false);
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let handler = PluginHandler::new(RecordingDriver::default());
        let resp = handler
            .handle(post("/LogDriver.Flush", Body::empty()))
            .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
