//! Assistant session manager
//!
//! Drives one request/response exchange per user message and keeps the
//! transcript in append order.
//!
//! ```text
//! Idle / Failed --send--> Sending --reply--> Idle
//!                                 --error--> Failed
//! ```
//!
//! A send while `Sending` is rejected before anything is written, so the
//! transcript can never interleave two exchanges.

mod decode;

#[cfg(test)]
mod proptests;

pub use decode::{decode_reply, AssistantReply, ReplyShape};

use crate::session::{Message, Role, SessionStore};
use crate::transport::{NormalizedError, RequestContext, Transport};
use serde_json::json;
use std::sync::{Mutex, MutexGuard, PoisonError};

pub const ASSISTANT_PATH: &str = "/api/v1/assistant/";

/// Transcript text shown when an exchange fails. Error details only go to logs.
pub const FALLBACK_REPLY: &str = "Sorry, something went wrong. Please try again.";

const EMPTY_MESSAGE: &str = "Message cannot be empty";
const BUSY: &str = "The assistant is still answering the previous message";
const ABANDONED: &str = "Request abandoned before the reply arrived";

/// Conversation phase
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AssistantState {
    #[default]
    Idle,
    Sending,
    /// Idle, but the last exchange failed
    Failed { error: NormalizedError },
}

impl AssistantState {
    #[must_use]
    pub fn is_sending(&self) -> bool {
        matches!(self, AssistantState::Sending)
    }
}

/// Level and major sent along with each question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantContext {
    pub level: String,
    pub major: String,
}

impl AssistantContext {
    #[must_use]
    pub fn new(level: impl Into<String>, major: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            major: major.into(),
        }
    }
}

/// Outcome of a completed exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exchange {
    Answered(Message),
    /// The fallback reply was appended; `error` is what actually happened
    Failed {
        fallback: Message,
        error: NormalizedError,
    },
}

impl Exchange {
    /// The assistant message this exchange appended
    #[must_use]
    pub fn message(&self) -> &Message {
        match self {
            Exchange::Answered(message) | Exchange::Failed { fallback: message, .. } => message,
        }
    }
}

struct Inner {
    state: AssistantState,
    context: AssistantContext,
}

/// Conversation with the platform assistant
pub struct AssistantSession<T> {
    session: SessionStore,
    transport: T,
    inner: Mutex<Inner>,
}

impl<T: Transport> AssistantSession<T> {
    #[must_use]
    pub fn new(session: SessionStore, transport: T, context: AssistantContext) -> Self {
        Self {
            session,
            transport,
            inner: Mutex::new(Inner {
                state: AssistantState::Idle,
                context,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn state(&self) -> AssistantState {
        self.lock().state.clone()
    }

    #[must_use]
    pub fn is_sending(&self) -> bool {
        self.lock().state.is_sending()
    }

    /// Error from the most recent exchange, if it failed
    #[must_use]
    pub fn last_error(&self) -> Option<NormalizedError> {
        match &self.lock().state {
            AssistantState::Failed { error } => Some(error.clone()),
            _ => None,
        }
    }

    #[must_use]
    pub fn context(&self) -> AssistantContext {
        self.lock().context.clone()
    }

    #[must_use]
    pub fn transcript(&self) -> Vec<Message> {
        self.session.transcript()
    }

    /// Change the level/major used for subsequent questions
    ///
    /// # Errors
    /// Validation error while a message is in flight.
    pub fn set_context(&self, context: AssistantContext) -> Result<(), NormalizedError> {
        let mut inner = self.lock();
        if inner.state.is_sending() {
            return Err(NormalizedError::validation(BUSY));
        }
        inner.context = context;
        Ok(())
    }

    /// Send one user message and wait for the assistant's reply.
    ///
    /// The user message is appended before the call goes out. Exactly one
    /// assistant message follows, whether the call succeeds or not. If the
    /// returned future is dropped before the reply arrives, the fallback is
    /// appended and the state becomes `Failed`.
    ///
    /// # Errors
    /// Validation error, with no transcript change, if the text is blank or
    /// another message is still in flight.
    pub async fn send(&self, user_text: &str) -> Result<Exchange, NormalizedError> {
        if user_text.trim().is_empty() {
            return Err(NormalizedError::validation(EMPTY_MESSAGE));
        }

        let context = {
            let mut inner = self.lock();
            if inner.state.is_sending() {
                tracing::debug!(session_id = %self.session.id(), "Rejected send while busy");
                return Err(NormalizedError::validation(BUSY));
            }
            inner.state = AssistantState::Sending;
            self.session.append_message(Role::User, user_text, Vec::new());
            inner.context.clone()
        };

        let mut guard = SendingGuard { owner: self, armed: true };

        let request = RequestContext::post(ASSISTANT_PATH)
            .with_json(json!({
                "question": user_text,
                "level": context.level,
                "major": context.major,
            }))
            .authenticated();

        let outcome = match self.transport.execute(request).await {
            Ok(body) => body
                .into_json()
                .ok_or_else(|| NormalizedError::decode("Assistant reply was not JSON"))
                .and_then(|value| decode_reply(&value)),
            Err(e) => Err(e),
        };

        let exchange = {
            let mut inner = self.lock();
            match outcome {
                Ok(reply) => {
                    tracing::debug!(
                        session_id = %self.session.id(),
                        shape = reply.shape.text_field(),
                        sources = reply.sources.len(),
                        "Assistant answered"
                    );
                    let message =
                        self.session
                            .append_message(Role::Assistant, reply.text, reply.sources);
                    inner.state = AssistantState::Idle;
                    Exchange::Answered(message)
                }
                Err(error) => {
                    tracing::warn!(
                        session_id = %self.session.id(),
                        kind = error.kind.as_str(),
                        status = ?error.http_status,
                        error = %error.message,
                        "Assistant exchange failed"
                    );
                    let fallback =
                        self.session
                            .append_message(Role::Assistant, FALLBACK_REPLY, Vec::new());
                    inner.state = AssistantState::Failed {
                        error: error.clone(),
                    };
                    Exchange::Failed { fallback, error }
                }
            }
        };

        guard.armed = false;
        Ok(exchange)
    }

    /// Clear the transcript and return to `Idle`.
    ///
    /// # Errors
    /// Validation error while a message is in flight.
    pub fn reset(&self) -> Result<(), NormalizedError> {
        self.reset_with(SessionStore::clear_transcript)
    }

    /// Like [`reset`](Self::reset), but the token and its durable copy go too
    pub(crate) fn sign_out(&self) -> Result<(), NormalizedError> {
        self.reset_with(SessionStore::clear)
    }

    // The busy check and the clear share one critical section so no send
    // can start in between.
    fn reset_with(&self, clear: impl FnOnce(&SessionStore)) -> Result<(), NormalizedError> {
        let mut inner = self.lock();
        if inner.state.is_sending() {
            return Err(NormalizedError::validation(BUSY));
        }
        clear(&self.session);
        inner.state = AssistantState::Idle;
        Ok(())
    }
}

/// Closes an exchange whose `send` future was dropped mid-flight
struct SendingGuard<'a, T: Transport> {
    owner: &'a AssistantSession<T>,
    armed: bool,
}

impl<T: Transport> Drop for SendingGuard<'_, T> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        tracing::warn!(session_id = %self.owner.session.id(), "Assistant send abandoned");
        let mut inner = self.owner.lock();
        self.owner
            .session
            .append_message(Role::Assistant, FALLBACK_REPLY, Vec::new());
        inner.state = AssistantState::Failed {
            error: NormalizedError::host(ABANDONED),
        };
    }
}
