//! HTTP client for the platform REST API.

use std::time::Duration;

use bytes::Bytes;
use http::header::{ACCEPT, CONTENT_TYPE, HOST, USER_AGENT};
use http::{Method, Request, Uri};
use http_body_util::{BodyExt, Full};
use serde::de::DeserializeOwned;
use tracing::debug;

use xrepl_core::*;
use xrepl_editor::{ApiFuture, ReplicationApi};
use xrepl_task::{StatusFuture, StatusSource};

use crate::wire::*;

/// Header carrying the API token.
const AUTH_HEADER: &str = "X-AUTH-YW-API-TOKEN";

/// Platform API client. Cheap to clone.
#[derive(Debug, Clone)]
pub struct HttpClient {
    /// `host:port` to connect to.
    address: String,
    /// Path prefix from the base URL, without trailing slash.
    prefix: String,
    customer_id: String,
    api_token: Option<String>,
    timeout: Duration,
}

impl HttpClient {
    /// Build a client from the `[api]` config section.
    pub fn new(config: &ApiConfig) -> Result<Self, ConfigError> {
        let uri: Uri = config
            .base_url
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("api.base_url: {e}")))?;
        if uri.scheme_str() != Some("http") {
            return Err(ConfigError::Invalid(
                "api.base_url must use http://".to_string(),
            ));
        }
        let host = uri
            .host()
            .ok_or_else(|| ConfigError::Invalid("api.base_url has no host".to_string()))?;
        let port = uri.port_u16().unwrap_or(80);

        Ok(Self {
            address: format!("{host}:{port}"),
            prefix: uri.path().trim_end_matches('/').to_string(),
            customer_id: config.customer_id.clone(),
            api_token: config.api_token.clone(),
            timeout: config.request_timeout(),
        })
    }

    fn customer_path(&self, rest: &str) -> String {
        format!("{}/api/v1/customers/{}/{rest}", self.prefix, self.customer_id)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let body = self.send(Method::GET, path, None).await?;
        decode(&body)
    }

    /// Send one request, bounded by the configured timeout.
    async fn send(&self, method: Method, path: &str, body: Option<Vec<u8>>) -> ApiResult<Bytes> {
        match tokio::time::timeout(self.timeout, self.exchange(method.clone(), path, body)).await {
            Ok(result) => result,
            Err(_) => {
                debug!(%method, %path, "request timed out");
                Err(ApiError::Timeout)
            }
        }
    }

    async fn exchange(&self, method: Method, path: &str, body: Option<Vec<u8>>) -> ApiResult<Bytes> {
        let stream = tokio::net::TcpStream::connect(&self.address)
            .await
            .map_err(|e| transport("connect", e))?;

        let io = hyper_util::rt::TokioIo::new(stream);
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(|e| transport("handshake", e))?;

        // Drive the connection in the background.
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                debug!(error = %e, "connection closed with error");
            }
        });

        let mut builder = Request::builder()
            .method(method.clone())
            .uri(path)
            .header(HOST, &self.address)
            .header(USER_AGENT, concat!("xrepl/", env!("CARGO_PKG_VERSION")))
            .header(ACCEPT, "application/json");
        if let Some(token) = &self.api_token {
            builder = builder.header(AUTH_HEADER, token);
        }
        let req = match body {
            Some(bytes) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Full::new(Bytes::from(bytes))),
            None => builder.body(Full::new(Bytes::new())),
        }
        .map_err(|e| transport("build request", e))?;

        let resp = sender
            .send_request(req)
            .await
            .map_err(|e| transport("send", e))?;
        let status = resp.status();
        let bytes = resp
            .into_body()
            .collect()
            .await
            .map_err(|e| transport("read body", e))?
            .to_bytes();

        debug!(%method, %path, %status, "platform response");
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: error_message(&bytes),
            });
        }
        Ok(bytes)
    }
}

fn transport(stage: &str, e: impl std::fmt::Display) -> ApiError {
    ApiError::Transport(format!("{stage}: {e}"))
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> ApiResult<T> {
    serde_json::from_slice(body).map_err(|e| ApiError::Decode(e.to_string()))
}

impl ReplicationApi for HttpClient {
    fn fetch_tables<'a>(&'a self, cluster_id: &'a str) -> ApiFuture<'a, Vec<TableDescriptor>> {
        Box::pin(async move {
            let path = self.customer_path(&format!("universes/{cluster_id}/tables"));
            let tables: Vec<WireTable> = self.get_json(&path).await?;
            Ok(tables.into_iter().map(Into::into).collect())
        })
    }

    fn fetch_group<'a>(&'a self, group_id: &'a str) -> ApiFuture<'a, ReplicationGroup> {
        Box::pin(async move {
            let path = self.customer_path(&format!("xcluster_configs/{group_id}"));
            let group: WireGroup = self.get_json(&path).await?;
            Ok(group.into())
        })
    }

    fn update_membership<'a>(
        &'a self,
        update: &'a MembershipUpdate,
    ) -> ApiFuture<'a, TaskAccepted> {
        Box::pin(async move {
            let path = self.customer_path(&format!("xcluster_configs/{}", update.group_id));
            let edit = WireEdit {
                tables: update.tables.iter().cloned().collect(),
            };
            let body = serde_json::to_vec(&edit).map_err(|e| ApiError::Decode(e.to_string()))?;
            let resp = self.send(Method::PUT, &path, Some(body)).await?;
            let accepted: WireTaskAccepted = decode(&resp)?;
            Ok(TaskAccepted {
                task_id: accepted.task_uuid,
            })
        })
    }
}

impl StatusSource for HttpClient {
    fn task_status<'a>(&'a self, task_id: &'a str) -> StatusFuture<'a> {
        Box::pin(async move {
            let path = self.customer_path(&format!("tasks/{task_id}"));
            let progress: WireTaskProgress = self.get_json(&path).await?;
            Ok(progress.task_status())
        })
    }
}
