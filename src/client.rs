//! Platform client facade
//!
//! One handle owning the session and the flows the view layer drives.

use crate::assessment::AssessmentForm;
use crate::assistant::{AssistantContext, AssistantSession};
use crate::auth::{AuthProfile, Authenticator};
use crate::config::ClientConfig;
use crate::download::{DocumentSink, SavedDocument, TemplateDownloader, TemplateNaming};
use crate::session::{FileTokenStore, SessionStore};
use crate::transport::{HttpTransport, LoggingTransport, NormalizedError, Transport};
use crate::upload;
use serde_json::Value;
use std::sync::Arc;
use tokio::task::JoinHandle;

pub type SharedTransport = Arc<dyn Transport>;
pub type SharedSink = Arc<dyn DocumentSink>;

/// Entry point for the view layer
pub struct PlatformClient {
    config: ClientConfig,
    session: SessionStore,
    transport: SharedTransport,
    auth: Authenticator<SharedTransport>,
    assistant: AssistantSession<SharedTransport>,
    assessment: AssessmentForm<SharedTransport>,
    downloader: Arc<TemplateDownloader<SharedTransport, SharedSink>>,
}

impl PlatformClient {
    /// Build an HTTP-backed client.
    ///
    /// When `config.token_file` is set, a token saved there is restored.
    ///
    /// # Errors
    /// Fails only if the HTTP client cannot be constructed.
    pub fn new(config: ClientConfig, sink: SharedSink) -> Result<Self, reqwest::Error> {
        let session = match &config.token_file {
            Some(path) => SessionStore::with_token_store(Arc::new(FileTokenStore::new(path))),
            None => SessionStore::new(),
        };
        let http = HttpTransport::new(config.base_url.clone(), config.timeout, session.clone())?;

        tracing::info!(
            base_url = %config.base_url,
            session_id = %session.id(),
            "Platform client ready"
        );
        Ok(Self::with_transport(
            config,
            session,
            Arc::new(LoggingTransport::new(http)),
            sink,
        ))
    }

    /// Build around an existing transport and session
    #[must_use]
    pub fn with_transport(
        config: ClientConfig,
        session: SessionStore,
        transport: SharedTransport,
        sink: SharedSink,
    ) -> Self {
        let context = AssistantContext::new(config.level.clone(), config.major.clone());
        let naming = TemplateNaming::new(
            config.template_prefix.clone(),
            config.template_extension.clone(),
        );

        Self {
            auth: Authenticator::new(transport.clone(), session.clone()),
            assistant: AssistantSession::new(session.clone(), transport.clone(), context),
            assessment: AssessmentForm::new(transport.clone()),
            downloader: Arc::new(TemplateDownloader::new(transport.clone(), sink, naming)),
            config,
            session,
            transport,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    #[must_use]
    pub fn assistant(&self) -> &AssistantSession<SharedTransport> {
        &self.assistant
    }

    #[must_use]
    pub fn assessment(&self) -> &AssessmentForm<SharedTransport> {
        &self.assessment
    }

    /// # Errors
    /// See [`Authenticator::login`].
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthProfile, NormalizedError> {
        self.auth.login(username, password).await
    }

    /// Sign out. Refused while the assistant is mid-reply, so the
    /// transcript is not cleared under an in-flight exchange.
    ///
    /// # Errors
    /// Validation error while a chat message is in flight.
    pub fn logout(&self) -> Result<(), NormalizedError> {
        self.assistant.sign_out()?;
        tracing::info!(session_id = %self.session.id(), "Signed out");
        Ok(())
    }

    /// # Errors
    /// See [`TemplateDownloader::download_document`].
    pub async fn download_document(&self, level: &str, unit: &str) -> Result<SavedDocument, NormalizedError> {
        self.downloader.download_document(level, unit).await
    }

    /// Start a download in the background. Failures are logged.
    ///
    /// Must be called from within a tokio runtime.
    #[allow(clippy::must_use_candidate)]
    pub fn spawn_download(&self, level: impl Into<String>, unit: impl Into<String>) -> JoinHandle<()> {
        let downloader = Arc::clone(&self.downloader);
        let (level, unit) = (level.into(), unit.into());
        tokio::spawn(async move {
            if let Err(e) = downloader.download_document(&level, &unit).await {
                tracing::warn!(
                    level = %level,
                    unit = %unit,
                    kind = e.kind.as_str(),
                    error = %e.message,
                    "Template download failed"
                );
            }
        })
    }

    /// # Errors
    /// See [`upload::upload_file`].
    pub async fn upload_file(&self, filename: &str, bytes: Vec<u8>) -> Result<Value, NormalizedError> {
        upload::upload_file(&self.transport, filename, bytes).await
    }
}
