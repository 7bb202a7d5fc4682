use std::fmt;
use std::io;

use async_trait::async_trait;
use drivex_store::{ByteStream, ListRequest, RemoteStore, StoreError, StoreResult};
use drivex_types::{Node, NodeMetadata};
use futures::{StreamExt, TryStreamExt};
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::{Body, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::config::HttpConfig;
use crate::endpoints::{list_params, Endpoints};
use crate::error::{HttpError, HttpResult};

/// Content type announced for a resumable upload's payload.
const UPLOAD_CONTENT_TYPE: &str = "X-Upload-Content-Type";

#[derive(Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<Node>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// `RemoteStore` over the Drive v3 REST API.
///
/// Metadata calls share a whole-request timeout. Downloads only time out
/// when the body stalls, and upload bodies are never cut off: the store
/// answers a session PUT only after the last byte, however long that takes.
pub struct HttpRemoteStore {
    api: reqwest::Client,
    media: reqwest::Client,
    upload: reqwest::Client,
    endpoints: Endpoints,
    token: String,
}

impl HttpRemoteStore {
    /// Build a client from `config`. The token must already be present;
    /// apply [`HttpConfig::with_env`] first to honor the environment.
    pub fn new(config: &HttpConfig) -> HttpResult<Self> {
        let token = config
            .access_token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or(HttpError::MissingToken)?;
        let builder = || {
            reqwest::Client::builder()
                .connect_timeout(config.connect_timeout())
                .user_agent(config.user_agent.clone())
        };
        Ok(Self {
            api: builder().timeout(config.timeout()).build()?,
            media: builder().read_timeout(config.timeout()).build()?,
            upload: builder().build()?,
            endpoints: Endpoints::new(&config.api_base, &config.upload_base)?,
            token,
        })
    }

    /// Send `request`; non-success statuses become `StoreError`s.
    async fn send(&self, request: RequestBuilder, id: Option<&str>) -> StoreResult<Response> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(transport)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(StoreError::from_api_message(
            status.as_u16(),
            api_message(&body),
            id,
        ))
    }

    async fn json<T: DeserializeOwned>(&self, request: RequestBuilder, id: Option<&str>) -> StoreResult<T> {
        let bytes = self
            .send(request, id)
            .await?
            .bytes()
            .await
            .map_err(transport)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl fmt::Debug for HttpRemoteStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRemoteStore")
            .field("endpoints", &self.endpoints)
            .finish_non_exhaustive()
    }
}

fn transport(e: reqwest::Error) -> StoreError {
    StoreError::Transport(e.to_string())
}

/// The store's error message from a JSON error body, or the body itself.
fn api_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => envelope.error.message,
        Err(_) => body.trim().to_string(),
    }
}

fn content_stream(response: Response) -> ByteStream {
    response.bytes_stream().map_err(io::Error::other).boxed()
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn list(&self, request: &ListRequest) -> StoreResult<Vec<Node>> {
        debug!(query = %request.query, page_size = request.page_size, "files.list");
        let req = self
            .api
            .get(self.endpoints.files())
            .query(&list_params(request));
        let list: FileList = self.json(req, None).await?;
        Ok(list.files)
    }

    async fn get(&self, id: &str, fields: Option<&str>) -> StoreResult<Node> {
        debug!(id, "files.get");
        let mut req = self.api.get(self.endpoints.file(id));
        if let Some(fields) = fields {
            req = req.query(&[("fields", fields)]);
        }
        self.json(req, Some(id)).await
    }

    async fn get_media(&self, id: &str) -> StoreResult<ByteStream> {
        debug!(id, "files.get media");
        let req = self
            .media
            .get(self.endpoints.file(id))
            .query(&[("alt", "media")]);
        Ok(content_stream(self.send(req, Some(id)).await?))
    }

    async fn export(&self, id: &str, mime_type: &str) -> StoreResult<ByteStream> {
        debug!(id, mime_type, "files.export");
        let req = self
            .media
            .get(self.endpoints.export(id))
            .query(&[("mimeType", mime_type)]);
        Ok(content_stream(self.send(req, Some(id)).await?))
    }

    async fn create(&self, metadata: &NodeMetadata, fields: &str) -> StoreResult<Node> {
        debug!(name = %metadata.name, "files.create");
        let req = self
            .api
            .post(self.endpoints.files())
            .query(&[("fields", fields)])
            .json(metadata);
        self.json(req, None).await
    }

    async fn create_resumable(&self, metadata: &NodeMetadata, fields: &str) -> StoreResult<String> {
        debug!(name = %metadata.name, "files.create resumable");
        let req = self
            .api
            .post(self.endpoints.upload_files())
            .query(&[("uploadType", "resumable"), ("fields", fields)])
            .header(UPLOAD_CONTENT_TYPE, metadata.mime_type.as_str())
            .json(metadata);
        let response = self.send(req, None).await?;
        response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .ok_or_else(|| StoreError::InvalidSession("response has no Location header".into()))
    }

    async fn upload_session(
        &self,
        session_url: &str,
        mime_type: &str,
        body: ByteStream,
    ) -> StoreResult<Node> {
        debug!(mime_type, "upload session put");
        let req = self
            .upload
            .put(session_url)
            .header(CONTENT_TYPE, mime_type)
            .body(Body::wrap_stream(body));
        self.json(req, None).await
    }

    async fn update(&self, id: &str, patch: &Value, fields: &str) -> StoreResult<Node> {
        debug!(id, "files.update");
        let req = self
            .api
            .patch(self.endpoints.file(id))
            .query(&[("fields", fields)])
            .json(patch);
        self.json(req, Some(id)).await
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        debug!(id, "files.delete");
        self.send(self.api.delete(self.endpoints.file(id)), Some(id))
            .await?;
        Ok(())
    }

    async fn about(&self, fields: &str) -> StoreResult<Value> {
        debug!(fields, "about.get");
        let req = self
            .api
            .get(self.endpoints.about())
            .query(&[("fields", fields)]);
        self.json(req, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_message_from_json_envelope() {
        let body = r#"{"error":{"code":403,"message":"Use Export with Docs Editors files."}}"#;
        assert_eq!(api_message(body), "Use Export with Docs Editors files.");
    }

    #[test]
    fn api_message_falls_back_to_body() {
        assert_eq!(api_message("  Bad Gateway \n"), "Bad Gateway");
    }

    #[test]
    fn export_required_is_recognized_from_body() {
        let body = r#"{"error":{"code":403,"message":"Only files with binary content can be downloaded. Use Export with Docs Editors files."}}"#;
        let e = StoreError::from_api_message(403, api_message(body), Some("doc"));
        assert!(matches!(e, StoreError::ExportRequired { .. }));
    }

    #[test]
    fn missing_token_is_rejected() {
        let err = HttpRemoteStore::new(&HttpConfig::default()).unwrap_err();
        assert!(matches!(err, HttpError::MissingToken));
    }

    #[test]
    fn builds_with_token() {
        let config = HttpConfig {
            access_token: Some("t".into()),
            ..Default::default()
        };
        let store = HttpRemoteStore::new(&config).unwrap();
        assert!(format!("{store:?}").contains("HttpRemoteStore"));
        assert!(!format!("{store:?}").contains("\"t\""));
    }

    #[test]
    fn file_list_tolerates_missing_files() {
        let list: FileList = serde_json::from_str("{}").unwrap();
        assert!(list.files.is_empty());
    }

    // ------------------------------------------------------------------
    // Against a local one-shot HTTP server
    // ------------------------------------------------------------------

    use std::time::Duration;

    use bytes::Bytes;
    use drivex_types::NodeMetadata;
    use futures::stream;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    /// A request as the server saw it.
    struct Received {
        head: String,
        body: Vec<u8>,
    }

    fn position(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }

    fn dechunk(mut data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        loop {
            let line_end = position(data, b"\r\n").unwrap();
            let size_line = std::str::from_utf8(&data[..line_end]).unwrap();
            let size = usize::from_str_radix(size_line.trim(), 16).unwrap();
            data = &data[line_end + 2..];
            if size == 0 {
                return out;
            }
            out.extend_from_slice(&data[..size]);
            data = &data[size + 2..];
        }
    }

    async fn read_request(socket: &mut TcpStream) -> Received {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        let head_end = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before the request head");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = position(&buf, b"\r\n\r\n") {
                break pos + 4;
            }
        };
        let head = String::from_utf8_lossy(&buf[..head_end]).to_ascii_lowercase();
        let mut rest = buf[head_end..].to_vec();
        let length = head
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .map(|v| v.trim().parse::<usize>().unwrap());
        let body = if head.contains("transfer-encoding: chunked") {
            while !rest.ends_with(b"0\r\n\r\n") {
                let n = socket.read(&mut chunk).await.unwrap();
                assert!(n > 0, "connection closed inside a chunked body");
                rest.extend_from_slice(&chunk[..n]);
            }
            dechunk(&rest)
        } else {
            let length = length.unwrap_or(0);
            while rest.len() < length {
                let n = socket.read(&mut chunk).await.unwrap();
                assert!(n > 0, "connection closed inside the body");
                rest.extend_from_slice(&chunk[..n]);
            }
            rest
        };
        Received { head, body }
    }

    fn response(status: &str, headers: &[(&str, &str)], body: &str) -> Vec<u8> {
        let mut r = format!(
            "HTTP/1.1 {status}\r\ncontent-length: {}\r\nconnection: close\r\n",
            body.len()
        );
        for (name, value) in headers {
            r.push_str(&format!("{name}: {value}\r\n"));
        }
        r.push_str("\r\n");
        r.push_str(body);
        r.into_bytes()
    }

    /// Accept one connection, read one request, answer with `parts`
    /// written `gap` apart.
    async fn serve_once(parts: Vec<Vec<u8>>, gap: Duration) -> (String, JoinHandle<Received>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let task = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let received = read_request(&mut socket).await;
            for (i, part) in parts.iter().enumerate() {
                if i > 0 {
                    tokio::time::sleep(gap).await;
                }
                socket.write_all(part).await.unwrap();
                socket.flush().await.unwrap();
            }
            let _ = socket.shutdown().await;
            received
        });
        (base, task)
    }

    fn store_at(base: &str, timeout_secs: u64) -> HttpRemoteStore {
        HttpRemoteStore::new(&HttpConfig {
            api_base: base.to_string(),
            upload_base: base.to_string(),
            access_token: Some("tok".into()),
            timeout_secs,
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn resumable_create_returns_location() {
        let reply = response("200 OK", &[("location", "http://upload.test/session/abc")], "");
        let (base, server) = serve_once(vec![reply], Duration::ZERO).await;
        let store = store_at(&base, 10);

        let meta = NodeMetadata::new("r.txt", "text/plain").with_parent("p1");
        let url = store.create_resumable(&meta, "id,name").await.unwrap();
        assert_eq!(url, "http://upload.test/session/abc");

        let received = server.await.unwrap();
        assert!(received.head.starts_with("post /files?uploadtype=resumable"));
        assert!(received.head.contains("authorization: bearer tok"));
        assert!(received.head.contains("x-upload-content-type: text/plain"));
        let sent: NodeMetadata = serde_json::from_slice(&received.body).unwrap();
        assert_eq!(sent, meta);
    }

    #[tokio::test]
    async fn resumable_create_without_location_is_invalid_session() {
        let (base, server) = serve_once(vec![response("200 OK", &[], "{}")], Duration::ZERO).await;
        let store = store_at(&base, 10);
        let err = store
            .create_resumable(&NodeMetadata::new("r.txt", "text/plain"), "id")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidSession(_)));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn forbidden_media_read_maps_to_export_required() {
        let body = r#"{"error":{"code":403,"message":"Only files with binary content can be downloaded. Use Export with Docs Editors files."}}"#;
        let reply = response("403 Forbidden", &[("content-type", "application/json")], body);
        let (base, server) = serve_once(vec![reply], Duration::ZERO).await;
        let store = store_at(&base, 10);

        match store.get_media("doc").await {
            Err(StoreError::ExportRequired { id, .. }) => assert_eq!(id, "doc"),
            other => panic!("expected ExportRequired, got {:?}", other.err()),
        }
        let received = server.await.unwrap();
        assert!(received.head.starts_with("get /files/doc?alt=media"));
    }

    #[tokio::test]
    async fn slow_upload_body_outlasts_timeout_and_arrives_intact() {
        let reply = response("200 OK", &[], r#"{"id":"x","name":"r.txt"}"#);
        let (base, server) = serve_once(vec![reply], Duration::ZERO).await;
        let store = store_at(&base, 1);

        let body = stream::iter(["chunk-1 ", "chunk-2 ", "chunk-3"])
            .then(|part| async move {
                tokio::time::sleep(Duration::from_millis(600)).await;
                Ok::<_, io::Error>(Bytes::from(part))
            })
            .boxed();
        let node = store
            .upload_session(&format!("{base}/session/abc"), "application/octet-stream", body)
            .await
            .unwrap();
        assert_eq!(node.id, "x");

        let received = server.await.unwrap();
        assert!(received.head.starts_with("put /session/abc"));
        assert!(received.head.contains("content-type: application/octet-stream"));
        assert_eq!(received.body, b"chunk-1 chunk-2 chunk-3");
    }

    #[tokio::test]
    async fn download_times_out_only_when_idle() {
        let head = b"HTTP/1.1 200 OK\r\ncontent-length: 10\r\nconnection: close\r\n\r\n".to_vec();
        let parts = vec![head, b"hello".to_vec(), b"world".to_vec()];
        let (base, server) = serve_once(parts, Duration::from_millis(600)).await;
        let store = store_at(&base, 1);

        let content: Vec<Bytes> = store
            .get_media("f")
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        assert_eq!(content.concat(), b"helloworld");
        server.await.unwrap();
    }
}
