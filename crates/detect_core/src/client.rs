//! Blocking HTTP backend for the classification service.

use crate::config::{AppConfig, ConfigError};
use crate::staging::FALLBACK_MIME;
use crate::submission::{AnalysisBackend, RemoteReply, TransportError, UPLOAD_FIELD, UploadRequest};
use reqwest::blocking::{Client, multipart};
use std::time::Duration;

/// Posts staged files to `{base}/analyze/{category}` as multipart forms.
#[derive(Debug, Clone)]
pub struct HttpAnalysisClient {
    client: Client,
    base_url: String,
}

impl HttpAnalysisClient {
    /// `timeout` of `None` leaves the request unbounded.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(cfg: &AppConfig) -> Result<Self, ConfigError> {
        let base = cfg.base_url()?;
        Self::new(base, cfg.request_timeout()).map_err(ConfigError::Client)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Endpoint for a category; the id is percent-encoded as one path segment.
    pub fn endpoint(&self, category_id: &str) -> String {
        format!(
            "{}/analyze/{}",
            self.base_url,
            urlencoding::encode(category_id)
        )
    }
}

impl AnalysisBackend for HttpAnalysisClient {
    fn analyze(&self, request: &UploadRequest) -> Result<RemoteReply, TransportError> {
        let file = &request.file;
        let mime = if file.mime_type.parse::<mime_guess::mime::Mime>().is_ok() {
            file.mime_type.as_str()
        } else {
            FALLBACK_MIME
        };
        let part = multipart::Part::bytes(file.content.to_vec())
            .file_name(file.name.clone())
            .mime_str(mime)?;
        let form = multipart::Form::new().part(UPLOAD_FIELD, part);
        let url = self.endpoint(&request.category_id);
        tracing::info!("POST {url} ({} bytes)", file.size_bytes);
        let response = self.client.post(&url).multipart(form).send()?;
        let status = response.status().as_u16();
        let body = response.bytes()?.to_vec();
        tracing::debug!("{url} answered HTTP {status} with {} bytes", body.len());
        Ok(RemoteReply { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::staging::FileDescriptor;
    use std::io::{ErrorKind, Read, Write};
    use std::net::TcpListener;
    use std::sync::Arc;
    use std::thread;

    fn request(category_id: &str) -> UploadRequest {
        UploadRequest {
            category_id: category_id.to_string(),
            file: FileDescriptor::from_bytes("scan.jpg", "image/jpeg", Arc::from(vec![7u8; 64])),
        }
    }

    /// Accepts one connection, captures the raw request and answers with `body`.
    fn one_shot_server(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, thread::JoinHandle<Vec<u8>>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let base = format!("http://{}", listener.local_addr().expect("addr"));
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept");
            stream
                .set_read_timeout(Some(Duration::from_millis(500)))
                .expect("timeout");
            let mut captured = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                match stream.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        captured.extend_from_slice(&buf[..n]);
                        if captured.ends_with(b"--\r\n") || captured.ends_with(b"0\r\n\r\n") {
                            break;
                        }
                    }
                    Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                        break;
                    }
                    Err(e) => panic!("read failed: {e}"),
                }
            }
            let reply = format!(
                "{status_line}\r\nContent-Type: application/json\r\n\
                 Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(reply.as_bytes()).expect("write");
            captured
        });
        (base, handle)
    }

    #[test]
    fn endpoint_trims_slashes_and_encodes_id() {
        let client = HttpAnalysisClient::new("http://localhost:5000/", None).expect("client");
        assert_eq!(client.endpoint("breast"), "http://localhost:5000/analyze/breast");
        assert_eq!(
            client.endpoint("lung colon/x"),
            "http://localhost:5000/analyze/lung%20colon%2Fx"
        );
    }

    #[test]
    fn posts_multipart_file_field_and_returns_reply() {
        let (base, server) = one_shot_server(
            "HTTP/1.1 200 OK",
            r#"{"cancerDetected": true, "confidence": 0.87}"#,
        );
        let client = HttpAnalysisClient::new(&base, Some(Duration::from_secs(5))).expect("client");
        let reply = client.analyze(&request("breast")).expect("reply");
        assert_eq!(reply.status, 200);
        assert_eq!(
            reply.body,
            br#"{"cancerDetected": true, "confidence": 0.87}"#.to_vec()
        );

        let captured = String::from_utf8_lossy(&server.join().expect("server")).to_string();
        assert!(captured.starts_with("POST /analyze/breast "));
        assert!(captured.contains("multipart/form-data; boundary="));
        assert!(captured.contains(r#"name="file"; filename="scan.jpg""#));
        assert!(captured.contains("Content-Type: image/jpeg"));
    }

    #[test]
    fn non_success_status_is_returned_not_raised() {
        let (base, server) = one_shot_server(
            "HTTP/1.1 500 Internal Server Error",
            r#"{"error": "model unavailable"}"#,
        );
        let client = HttpAnalysisClient::new(&base, Some(Duration::from_secs(5))).expect("client");
        let reply = client.analyze(&request("brain")).expect("reply");
        assert_eq!(reply.status, 500);
        server.join().expect("server");
    }

    #[test]
    fn unreachable_server_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let base = format!("http://{}", listener.local_addr().expect("addr"));
        drop(listener);
        let client = HttpAnalysisClient::new(&base, Some(Duration::from_secs(5))).expect("client");
        let err = client.analyze(&request("brain")).unwrap_err();
        assert!(matches!(err, TransportError::Http(_)));
    }
}
