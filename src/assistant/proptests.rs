//! Property-based tests for transcript ordering
//!
//! Whatever mix of successes and failures the transport produces:
//! - every accepted send adds exactly one user and one assistant message
//! - user and assistant messages alternate in append order
//! - sequence numbers strictly increase
//! - user text is stored verbatim

use super::*;
use crate::testing::MockTransport;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Outcome {
    Answer(String, Vec<String>),
    Fail(u16),
    Offline,
}

fn arb_outcome() -> impl Strategy<Value = Outcome> {
    prop_oneof![
        (
            "[a-zA-Z0-9 .,]{0,60}",
            proptest::collection::vec("[a-zA-Z0-9 ]{1,20}", 0..4)
        )
            .prop_map(|(text, sources)| Outcome::Answer(text, sources)),
        (400u16..600).prop_map(Outcome::Fail),
        Just(Outcome::Offline),
    ]
}

fn arb_user_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9?]{1,10}( [a-zA-Z0-9?]{1,10}){0,5}"
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #[test]
    fn prop_transcript_alternates(
        turns in proptest::collection::vec((arb_user_text(), arb_outcome()), 1..12)
    ) {
        let transport = MockTransport::new();
        for (_, outcome) in &turns {
            match outcome {
                Outcome::Answer(text, sources) => {
                    transport.queue_json(json!({ "answer": text, "sources": sources }));
                }
                Outcome::Fail(status) => {
                    transport.queue_error(NormalizedError::http_status(*status, "boom"));
                }
                Outcome::Offline => transport.queue_error(NormalizedError::network("connection failed")),
            }
        }

        let assistant = AssistantSession::new(
            SessionStore::new(),
            transport,
            AssistantContext::new("L2", "Business"),
        );

        let rt = runtime();
        for (text, outcome) in &turns {
            let exchange = rt.block_on(assistant.send(text)).unwrap();
            match (outcome, &exchange) {
                (Outcome::Answer(expected, sources), Exchange::Answered(message)) => {
                    prop_assert_eq!(&message.text, expected);
                    prop_assert_eq!(&message.sources, sources);
                }
                (Outcome::Fail(_) | Outcome::Offline, Exchange::Failed { fallback, .. }) => {
                    prop_assert_eq!(fallback.text.as_str(), FALLBACK_REPLY);
                }
                _ => prop_assert!(false, "outcome {:?} produced {:?}", outcome, exchange),
            }
            prop_assert!(!assistant.is_sending());
        }

        let transcript = assistant.transcript();
        prop_assert_eq!(transcript.len(), turns.len() * 2);

        for (i, pair) in transcript.chunks(2).enumerate() {
            prop_assert_eq!(pair[0].role, Role::User);
            prop_assert_eq!(&pair[0].text, &turns[i].0);
            prop_assert_eq!(pair[1].role, Role::Assistant);
        }

        for window in transcript.windows(2) {
            prop_assert!(window[0].sent_at < window[1].sent_at);
        }
    }

    #[test]
    fn prop_rejected_sends_leave_no_trace(blank in "[ \t\n]{0,8}") {
        let assistant = AssistantSession::new(
            SessionStore::new(),
            MockTransport::new(),
            AssistantContext::new("L2", "Business"),
        );
        let err = runtime().block_on(assistant.send(&blank)).unwrap_err();
        prop_assert!(err.is_validation());
        prop_assert!(assistant.transcript().is_empty());
        prop_assert_eq!(assistant.state(), AssistantState::Idle);
    }
}
