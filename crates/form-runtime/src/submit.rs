use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use form_spec::{AnswerMap, LiveFiles};
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please try again.";
pub const REJECTED_FALLBACK_MESSAGE: &str = "Submission failed";

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("submission request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("submission response is not valid: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("failed to read attachment '{path}': {source}")]
    Attachment {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A file sent under the id of the input that holds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Everything posted to the delivery endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionPayload {
    pub fields: Vec<(String, String)>,
    pub files: Vec<FilePart>,
}

impl SubmissionPayload {
    /// Access key and subject first, then every stored answer with lists flattened.
    pub fn from_answers(access_key: &str, subject: &str, answers: &AnswerMap) -> Self {
        let mut fields = vec![
            ("access_key".to_string(), access_key.to_string()),
            ("subject".to_string(), subject.to_string()),
        ];
        fields.extend(
            answers
                .iter()
                .map(|(id, value)| (id.clone(), value.to_field_text())),
        );
        Self {
            fields,
            files: Vec::new(),
        }
    }

    /// Reads the bytes of every live file now, not from stored markers.
    pub async fn attach_files(&mut self, files: &LiveFiles) -> Result<(), TransportError> {
        for (field, paths) in files {
            for path in paths {
                let bytes = tokio::fs::read(path)
                    .await
                    .map_err(|source| TransportError::Attachment {
                        path: path.clone(),
                        source,
                    })?;
                let file_name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| field.clone());
                self.files.push(FilePart {
                    field: field.clone(),
                    file_name,
                    bytes,
                });
            }
        }
        Ok(())
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn into_form(self) -> Form {
        let mut form = Form::new();
        for (name, value) in self.fields {
            form = form.text(name, value);
        }
        for file in self.files {
            let part = Part::bytes(file.bytes).file_name(file.file_name);
            form = form.part(file.field, part);
        }
        form
    }
}

/// Structured reply from the delivery endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SubmitResponse {
    pub fn parse(body: &str) -> Result<Self, TransportError> {
        serde_json::from_str(body).map_err(TransportError::Decode)
    }
}

/// Delivers a payload and returns the endpoint's structured reply.
pub trait Transport {
    fn send(
        &self,
        payload: SubmissionPayload,
    ) -> impl Future<Output = Result<SubmitResponse, TransportError>>;
}

/// Multipart POST over `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Transport for HttpTransport {
    async fn send(&self, payload: SubmissionPayload) -> Result<SubmitResponse, TransportError> {
        debug!(
            endpoint = %self.endpoint,
            fields = payload.fields.len(),
            files = payload.files.len(),
            "posting submission"
        );
        let response = self
            .client
            .post(&self.endpoint)
            .multipart(payload.into_form())
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), "submission response received");
        SubmitResponse::parse(&body)
    }
}

/// Result of one submit attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Delivered,
    Rejected(String),
    /// Another submission was still in flight; nothing was sent.
    AlreadyInFlight,
}

/// Sends submissions one at a time: {idle, submitting}.
#[derive(Debug)]
pub struct SubmissionClient<T> {
    transport: T,
    in_flight: AtomicBool,
}

struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl<T: Transport> SubmissionClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn submit(
        &self,
        payload: SubmissionPayload,
    ) -> Result<SubmitOutcome, TransportError> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            debug!("submission already in flight");
            return Ok(SubmitOutcome::AlreadyInFlight);
        }
        let _guard = InFlight(&self.in_flight);
        match self.transport.send(payload).await {
            Ok(response) if response.success => {
                info!("submission delivered");
                Ok(SubmitOutcome::Delivered)
            }
            Ok(response) => {
                let message = response
                    .message
                    .filter(|message| !message.is_empty())
                    .unwrap_or_else(|| REJECTED_FALLBACK_MESSAGE.to_string());
                warn!(%message, "submission rejected");
                Ok(SubmitOutcome::Rejected(message))
            }
            Err(err) => {
                warn!(error = %err, "submission transport failed");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use form_spec::AnswerValue;
    use std::cell::Cell;

    struct CountingTransport {
        calls: Cell<usize>,
        response: SubmitResponse,
    }

    impl Transport for CountingTransport {
        async fn send(
            &self,
            _payload: SubmissionPayload,
        ) -> Result<SubmitResponse, TransportError> {
            self.calls.set(self.calls.get() + 1);
            tokio::task::yield_now().await;
            Ok(self.response.clone())
        }
    }

    fn counting(success: bool, message: Option<&str>) -> CountingTransport {
        CountingTransport {
            calls: Cell::new(0),
            response: SubmitResponse {
                success,
                message: message.map(str::to_string),
            },
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn double_submit_sends_once() {
        let client = SubmissionClient::new(counting(true, None));
        let (first, second) = tokio::join!(
            client.submit(SubmissionPayload::default()),
            client.submit(SubmissionPayload::default())
        );
        assert_eq!(first.expect("first"), SubmitOutcome::Delivered);
        assert_eq!(second.expect("second"), SubmitOutcome::AlreadyInFlight);
        assert_eq!(client.transport().calls.get(), 1);
        assert!(!client.is_submitting());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn rejection_uses_server_message_or_fallback() {
        let client = SubmissionClient::new(counting(false, Some("Invalid access key")));
        assert_eq!(
            client.submit(SubmissionPayload::default()).await.expect("submit"),
            SubmitOutcome::Rejected("Invalid access key".into())
        );
        let client = SubmissionClient::new(counting(false, None));
        assert_eq!(
            client.submit(SubmissionPayload::default()).await.expect("submit"),
            SubmitOutcome::Rejected("Submission failed".into())
        );
        assert!(!client.is_submitting());
    }

    #[test]
    fn payload_flattens_lists_after_fixed_fields() {
        let mut answers = AnswerMap::new();
        answers.insert(
            "platforms".into(),
            AnswerValue::List(vec!["Web".into(), "iOS".into()]),
        );
        answers.insert("company".into(), "Acme".into());
        let payload = SubmissionPayload::from_answers("key-123", "Subject", &answers);
        assert_eq!(payload.fields[0], ("access_key".into(), "key-123".into()));
        assert_eq!(payload.fields[1], ("subject".into(), "Subject".into()));
        assert_eq!(payload.field("platforms"), Some("Web, iOS"));
        assert_eq!(payload.field("company"), Some("Acme"));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn attaches_live_file_bytes() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("brief.txt");
        std::fs::write(&path, b"scope").expect("write");
        let mut files = LiveFiles::new();
        files.insert("brief".into(), vec![path]);
        let mut payload = SubmissionPayload::default();
        payload.attach_files(&files).await.expect("attach");
        assert_eq!(
            payload.files,
            vec![FilePart {
                field: "brief".into(),
                file_name: "brief.txt".into(),
                bytes: b"scope".to_vec(),
            }]
        );
    }

    #[test]
    fn unparseable_reply_is_a_transport_error() {
        assert!(matches!(
            SubmitResponse::parse("<html>502</html>"),
            Err(TransportError::Decode(_))
        ));
        let reply = SubmitResponse::parse(r#"{"success": true}"#).expect("parse");
        assert!(reply.success);
    }
}
