//! HTTP client submitting the payload to the coverage service.

use std::path::Path;

use reqwest::multipart;
use serde::Deserialize;

use crate::error::SubmitError;

/// Default submission endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://coveralls.io/api/v1/jobs";

/// Acknowledgement returned by the coverage service.
#[derive(Debug, Clone, Deserialize)]
pub struct CoverallsResponse {
    /// Informational message from the service.
    #[serde(default)]
    pub message: String,
    /// Whether the service itself reported a failure.
    #[serde(default)]
    pub error: bool,
    /// URL of the processed coverage result, when available.
    #[serde(default)]
    pub url: Option<String>,
}

/// Single-attempt submission client.
///
/// Retry policy, if any, belongs to the caller; this client performs one
/// upload and classifies the outcome as either a processing failure (the
/// service responded, but not with a success) or an I/O failure (the
/// service could not be reached).
pub struct CoverallsClient {
    endpoint: String,
    http: reqwest::Client,
}

impl CoverallsClient {
    /// Creates a client for `endpoint`.
    #[must_use]
    pub fn new(endpoint: &str) -> Self {
        Self { endpoint: endpoint.to_string(), http: reqwest::Client::new() }
    }

    /// Uploads the payload file as a multipart request and interprets the
    /// response.
    ///
    /// # Errors
    ///
    /// [`SubmitError::Io`] when the payload cannot be read or the request
    /// cannot be completed; [`SubmitError::Processing`] when the service
    /// responds with anything other than a parseable success body.
    pub async fn submit(&self, payload: &Path) -> Result<CoverallsResponse, SubmitError> {
        let bytes = std::fs::read(payload).map_err(|err| SubmitError::Io(Box::new(err)))?;
        let part = multipart::Part::bytes(bytes)
            .file_name("coveralls.json")
            .mime_str("application/json")
            .map_err(|err| SubmitError::Processing(err.to_string()))?;
        let form = multipart::Form::new().part("json_file", part);

        let response = self
            .http
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|err| SubmitError::Io(Box::new(err)))?;
        let status = response.status();
        let body = response.text().await.map_err(|err| SubmitError::Io(Box::new(err)))?;

        match serde_json::from_str::<CoverallsResponse>(&body) {
            Ok(parsed) if status.is_success() && !parsed.error => Ok(parsed),
            Ok(parsed) => Err(SubmitError::Processing(format!(
                "service reported failure ({status}): {}",
                parsed.message
            ))),
            Err(_) => Err(SubmitError::Processing(format!(
                "uninterpretable response ({status}): {}",
                body.chars().take(200).collect::<String>()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    /// Serves exactly one canned HTTP response on a local port.
    fn one_shot_server(status_line: &str, body: &str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        std::thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                // Drain the request headers and body before answering.
                let mut buffer = [0_u8; 4096];
                let mut request = Vec::new();
                loop {
                    match stream.read(&mut buffer) {
                        Ok(0) => break,
                        Ok(n) => {
                            request.extend_from_slice(&buffer[..n]);
                            if let Some(headers_end) =
                                request.windows(4).position(|w| w == b"\r\n\r\n")
                            {
                                let headers = String::from_utf8_lossy(&request[..headers_end]);
                                let content_length = headers
                                    .lines()
                                    .find_map(|line| {
                                        line.to_ascii_lowercase()
                                            .strip_prefix("content-length:")
                                            .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                                    })
                                    .unwrap_or(0);
                                if request.len() >= headers_end + 4 + content_length {
                                    break;
                                }
                            }
                        }
                        Err(_) => break,
                    }
                }
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{addr}/api/v1/jobs")
    }

    fn payload_file(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let path = dir.path().join("coveralls.json");
        std::fs::write(&path, "{\"source_files\":[]}").unwrap();
        path
    }

    #[tokio::test]
    async fn successful_submission_returns_message_and_url() {
        let endpoint = one_shot_server(
            "HTTP/1.1 200 OK",
            "{\"message\":\"Job #42\",\"url\":\"https://example.com/builds/42\"}",
        );
        let dir = tempfile::tempdir().unwrap();

        let client = CoverallsClient::new(&endpoint);
        let response = client.submit(&payload_file(&dir)).await.unwrap();
        assert_eq!(response.message, "Job #42");
        assert_eq!(response.url.as_deref(), Some("https://example.com/builds/42"));
    }

    #[tokio::test]
    async fn non_json_body_is_a_processing_failure() {
        let endpoint = one_shot_server("HTTP/1.1 200 OK", "<html>oops</html>");
        let dir = tempfile::tempdir().unwrap();

        let client = CoverallsClient::new(&endpoint);
        let err = client.submit(&payload_file(&dir)).await.unwrap_err();
        assert!(matches!(err, SubmitError::Processing(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn service_error_body_is_a_processing_failure() {
        let endpoint = one_shot_server(
            "HTTP/1.1 422 Unprocessable Entity",
            "{\"message\":\"Couldn't find a repository\",\"error\":true}",
        );
        let dir = tempfile::tempdir().unwrap();

        let client = CoverallsClient::new(&endpoint);
        let err = client.submit(&payload_file(&dir)).await.unwrap_err();
        match err {
            SubmitError::Processing(message) => {
                assert!(message.contains("Couldn't find a repository"));
            }
            SubmitError::Io(_) => panic!("expected a processing failure"),
        }
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_an_io_failure() {
        // Port 1 is reserved and refuses connections.
        let client = CoverallsClient::new("http://127.0.0.1:1/api/v1/jobs");
        let dir = tempfile::tempdir().unwrap();

        let err = client.submit(&payload_file(&dir)).await.unwrap_err();
        assert!(matches!(err, SubmitError::Io(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn missing_payload_file_is_an_io_failure() {
        let client = CoverallsClient::new(DEFAULT_ENDPOINT);
        let err = client
            .submit(std::path::Path::new("/nonexistent/coveralls.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::Io(_)));
    }
}
