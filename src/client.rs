/// Prediction client
///
/// Uploads a picked image to the classification endpoint as a single
/// multipart POST and turns the JSON answer into a `PredictionResult`.

use std::time::Duration;

use log::{debug, info};
use reqwest::header::ACCEPT;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::state::catalog::Species;
use crate::state::data::{PickedImage, PredictionResult};

/// Text shown for every kind of prediction failure
pub const FAILURE_MESSAGE: &str = "Failed to predict.";

/// Everything that can go wrong between reading the image and parsing the answer
///
/// Details are only logged; the screen shows `FAILURE_MESSAGE` for all of them.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PredictError {
    #[error("cannot read image {location}: {reason}")]
    UnreadableImage { location: String, reason: String },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("server answered with status {0}")]
    Status(u16),

    #[error("malformed response body: {0}")]
    Malformed(String),

    #[error("response has no class")]
    MissingClass,

    #[error("confidence {0} is not a fraction in 0..=1")]
    InvalidConfidence(f64),
}

impl From<reqwest::Error> for PredictError {
    fn from(err: reqwest::Error) -> Self {
        PredictError::Transport(err.to_string())
    }
}

/// Body returned by the classification server
#[derive(Debug, Deserialize)]
struct PredictionResponse {
    class: Option<String>,
    confidence: Option<Confidence>,
}

/// Some deployments send the confidence as a string ("0.87")
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Confidence {
    Number(f64),
    Text(String),
}

impl Confidence {
    fn value(&self) -> Result<f64, PredictError> {
        match self {
            Confidence::Number(value) => Ok(*value),
            Confidence::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| PredictError::Malformed(format!("confidence {text:?}"))),
        }
    }
}

/// HTTP client bound to one base endpoint
#[derive(Debug, Clone)]
pub struct PredictionClient {
    http: reqwest::Client,
    base_url: String,
}

impl PredictionClient {
    /// Create a client for `base_url` (e.g. "http://127.0.0.1:8000/predict")
    ///
    /// No timeout is applied unless one is given.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, PredictError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// The URL a prediction for `species` is posted to
    pub fn endpoint(&self, species: Option<&Species>) -> String {
        match species {
            Some(species) => format!("{}/{}", self.base_url, species.value),
            None => self.base_url.clone(),
        }
    }

    /// Upload `image` and classify it
    pub async fn predict(
        &self,
        image: &PickedImage,
        species: Option<&Species>,
    ) -> Result<PredictionResult, PredictError> {
        let path = image.local_path().ok_or_else(|| PredictError::UnreadableImage {
            location: image.location.clone(),
            reason: "unsupported location scheme".to_string(),
        })?;

        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| PredictError::UnreadableImage {
                location: image.location.clone(),
                reason: e.to_string(),
            })?;

        let part = Part::bytes(bytes)
            .file_name(image.file_name.clone())
            .mime_str(&image.mime_type)?;
        let form = Form::new().part("file", part);

        let url = self.endpoint(species);
        debug!("📤 Uploading {} to {}", image.file_name, url);

        let response = self
            .http
            .post(&url)
            .header(ACCEPT, "application/json")
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PredictError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let result = parse_response(&body)?;

        info!(
            "🌿 {} -> {} ({:.3})",
            image.file_name, result.label, result.confidence
        );
        Ok(result)
    }
}

/// Parse a successful response body
///
/// A missing or empty `class` is a failure even when the status was 2xx.
pub fn parse_response(body: &str) -> Result<PredictionResult, PredictError> {
    let response: PredictionResponse =
        serde_json::from_str(body).map_err(|e| PredictError::Malformed(e.to_string()))?;

    let label = match response.class {
        Some(class) if !class.trim().is_empty() => class,
        _ => return Err(PredictError::MissingClass),
    };

    let confidence = response
        .confidence
        .ok_or_else(|| PredictError::Malformed("missing confidence".to_string()))?
        .value()?;

    if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
        return Err(PredictError::InvalidConfidence(confidence));
    }

    Ok(PredictionResult { label, confidence })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::catalog;
    use crate::state::data::PickedImage;
    use std::io::Write;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve exactly one canned response and hand back the raw request
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let request = read_request(&mut stream).await;
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            let _ = stream.shutdown().await;
            request
        });

        (format!("http://{addr}/predict"), handle)
    }

    async fn read_request(stream: &mut tokio::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
                let length = head
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|value| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn leaf_file() -> (tempfile::NamedTempFile, PickedImage) {
        let mut file = tempfile::Builder::new().suffix(".jpg").tempfile().unwrap();
        file.write_all(b"not really a jpeg").unwrap();
        let image = PickedImage {
            location: format!("file://{}", file.path().display()),
            file_name: "leaf.jpg".to_string(),
            mime_type: "image/jpeg".to_string(),
            extra: None,
            base64: None,
        };
        (file, image)
    }

    #[test]
    fn test_parse_response() {
        let result = parse_response(r#"{"class":"early_blight","confidence":0.87}"#).unwrap();
        assert_eq!(result.label, "early_blight");
        assert_eq!(result.confidence, 0.87);
    }

    #[test]
    fn test_parse_response_accepts_text_confidence() {
        let result = parse_response(r#"{"class":"healthy","confidence":"0.5"}"#).unwrap();
        assert_eq!(result.confidence, 0.5);
    }

    #[test]
    fn test_parse_response_requires_class() {
        assert_eq!(
            parse_response(r#"{"confidence":0.9}"#),
            Err(PredictError::MissingClass)
        );
        assert_eq!(
            parse_response(r#"{"class":"","confidence":0.9}"#),
            Err(PredictError::MissingClass)
        );
    }

    #[test]
    fn test_parse_response_rejects_percentages() {
        assert_eq!(
            parse_response(r#"{"class":"late_blight","confidence":87.0}"#),
            Err(PredictError::InvalidConfidence(87.0))
        );
    }

    #[test]
    fn test_parse_response_malformed() {
        assert!(matches!(
            parse_response("<html>oops</html>"),
            Err(PredictError::Malformed(_))
        ));
        assert!(matches!(
            parse_response(r#"{"class":"healthy"}"#),
            Err(PredictError::Malformed(_))
        ));
    }

    #[test]
    fn test_endpoint() {
        let client = PredictionClient::new("http://localhost:8000/predict/", None).unwrap();
        assert_eq!(client.endpoint(None), "http://localhost:8000/predict");

        let tomato = catalog::find("tomato").unwrap();
        assert_eq!(
            client.endpoint(Some(&tomato)),
            "http://localhost:8000/predict/tomato"
        );
    }

    #[tokio::test]
    async fn test_predict_posts_multipart_file() {
        let (url, server) =
            serve_once("200 OK", r#"{"class":"early_blight","confidence":0.87}"#).await;
        let client = PredictionClient::new(&url, None).unwrap();
        let (_file, image) = leaf_file();
        let tomato = catalog::find("tomato").unwrap();

        let result = client.predict(&image, Some(&tomato)).await.unwrap();
        assert_eq!(result.label, "early_blight");
        assert_eq!(result.confidence, 0.87);

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /predict/tomato HTTP/1.1"));

        let lowered = request.to_lowercase();
        assert!(lowered.contains("accept: application/json"));
        assert!(lowered.contains("content-type: multipart/form-data"));
        assert!(request.contains(r#"name="file"; filename="leaf.jpg""#));
        assert!(request.contains("not really a jpeg"));
    }

    #[tokio::test]
    async fn test_predict_without_species_uses_base_url() {
        let (url, server) = serve_once("200 OK", r#"{"class":"healthy","confidence":0.99}"#).await;
        let client = PredictionClient::new(&url, None).unwrap();
        let (_file, image) = leaf_file();

        client.predict(&image, None).await.unwrap();

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /predict HTTP/1.1"));
    }

    #[tokio::test]
    async fn test_predict_server_error() {
        let (url, _server) = serve_once("500 Internal Server Error", r#"{"detail":"boom"}"#).await;
        let client = PredictionClient::new(&url, None).unwrap();
        let (_file, image) = leaf_file();

        let err = client.predict(&image, None).await.unwrap_err();
        assert_eq!(err, PredictError::Status(500));
    }

    #[tokio::test]
    async fn test_predict_success_without_class_fails() {
        let (url, _server) = serve_once("200 OK", r#"{"detail":"no leaf found"}"#).await;
        let client = PredictionClient::new(&url, None).unwrap();
        let (_file, image) = leaf_file();

        let err = client.predict(&image, None).await.unwrap_err();
        assert_eq!(err, PredictError::MissingClass);
    }

    #[tokio::test]
    async fn test_predict_unreachable_server() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = PredictionClient::new(&format!("http://{addr}/predict"), None).unwrap();
        let (_file, image) = leaf_file();

        let err = client.predict(&image, None).await.unwrap_err();
        assert!(matches!(err, PredictError::Transport(_)));
    }

    #[tokio::test]
    async fn test_predict_missing_file() {
        let client = PredictionClient::new("http://127.0.0.1:9/predict", None).unwrap();
        let image = PickedImage {
            location: "file:///nonexistent/leaf.jpg".to_string(),
            file_name: "leaf.jpg".to_string(),
            mime_type: "image/jpeg".to_string(),
            extra: None,
            base64: None,
        };

        let err = client.predict(&image, None).await.unwrap_err();
        assert!(matches!(err, PredictError::UnreadableImage { .. }));
    }
}
