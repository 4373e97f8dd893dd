//! Assistant reply decoding
//!
//! The assistant endpoint has answered under more than one field name over
//! time. Each known shape is tried in a fixed order; anything else is a
//! decode error rather than a silently empty answer.

use crate::transport::NormalizedError;
use serde_json::Value;

/// Decoded assistant reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantReply {
    pub text: String,
    pub sources: Vec<String>,
    pub shape: ReplyShape,
}

/// Known reply layouts, in the order they are tried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyShape {
    /// `{ "answer": "..." }`
    Answer,
    /// `{ "response": "..." }`
    Response,
}

impl ReplyShape {
    pub const ALL: [ReplyShape; 2] = [ReplyShape::Answer, ReplyShape::Response];

    #[must_use]
    pub fn text_field(self) -> &'static str {
        match self {
            ReplyShape::Answer => "answer",
            ReplyShape::Response => "response",
        }
    }
}

/// Where citations may live, in the order they are tried
const SOURCE_PATHS: [&[&str]; 2] = [&["sources"], &["meta", "sources"]];

/// Decode a JSON reply into text plus citations
///
/// # Errors
/// `Decode` if the reply is not an object, carries no known text field, or a
/// known field has the wrong type.
pub fn decode_reply(value: &Value) -> Result<AssistantReply, NormalizedError> {
    if !value.is_object() {
        return Err(NormalizedError::decode("Assistant reply is not a JSON object"));
    }

    let mut matched = None;
    for shape in ReplyShape::ALL {
        match value.get(shape.text_field()) {
            None | Some(Value::Null) => {}
            Some(Value::String(text)) => {
                matched = Some((shape, text.clone()));
                break;
            }
            Some(_) => {
                return Err(NormalizedError::decode(format!(
                    "Assistant reply field '{}' is not text",
                    shape.text_field()
                )));
            }
        }
    }

    let Some((shape, text)) = matched else {
        return Err(NormalizedError::decode("Assistant reply has no answer text"));
    };

    Ok(AssistantReply {
        text,
        sources: decode_sources(value)?,
        shape,
    })
}

fn decode_sources(value: &Value) -> Result<Vec<String>, NormalizedError> {
    for path in SOURCE_PATHS {
        let found = path.iter().try_fold(value, |node, key| node.get(key));
        match found {
            None | Some(Value::Null) => {}
            Some(Value::Array(items)) => {
                return items
                    .iter()
                    .map(|item| {
                        item.as_str().map(str::to_string).ok_or_else(|| {
                            NormalizedError::decode("Assistant sources must be strings")
                        })
                    })
                    .collect();
            }
            Some(_) => {
                return Err(NormalizedError::decode(format!(
                    "Assistant sources at '{}' is not a list",
                    path.join(".")
                )));
            }
        }
    }
    Ok(Vec::new())
}
