//! BTEC platform client core
//!
//! Request/response handling, error normalization, auth-token propagation,
//! the assistant conversation, assessment submission and template downloads
//! for the learning platform's front end. The view layer holds a
//! [`PlatformClient`] and reads state back from it.

pub mod assessment;
pub mod assistant;
pub mod auth;
pub mod client;
pub mod config;
pub mod download;
pub mod logging;
pub mod session;
pub mod transport;
pub mod upload;

#[cfg(test)]
mod testing;

pub use assessment::{AssessmentForm, AssessmentResult};
pub use assistant::{AssistantContext, AssistantSession, AssistantState, Exchange};
pub use auth::{AuthProfile, Authenticator};
pub use client::PlatformClient;
pub use config::ClientConfig;
pub use download::{DocumentSink, FsDocumentSink, SavedDocument, TemplateDownloader};
pub use session::{Message, Role, SessionStore};
pub use transport::{ErrorKind, HttpTransport, NormalizedError, RequestContext, ResponseBody, Transport};
