//! Wire envelope parsing and serialization.
//!
//! Every frame exchanged with the remote is a JSON object with a `kind`
//! discriminator. Inbound frames are either requests (`kind: "req"`, carrying
//! an `id` the response must echo as `req_id`) or events (`kind: "event"`).
//! Outbound frames are responses and events.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ProtoError, Result};

/// A request received from the remote.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestMessage {
    /// Request id, echoed back as `req_id` in the response.
    pub id: u32,
    /// Message discriminator used for dispatch.
    pub msg: String,
    /// Request payload; `Value::Null` when absent.
    pub msg_data: Value,
}

/// An event received from the remote.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundEvent {
    /// Event discriminator used for dispatch.
    pub msg: String,
    /// Event payload; `Value::Null` when absent.
    pub msg_data: Value,
}

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    Request(RequestMessage),
    Event(InboundEvent),
}

/// A response sent to the remote.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseMessage {
    kind: &'static str,
    pub req_id: u32,
    pub msg: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub msg_data: Value,
}

impl ResponseMessage {
    /// Build a response envelope.
    pub fn new(req_id: u32, msg: impl Into<String>, code: u16, msg_data: Value) -> Self {
        Self {
            kind: "resp",
            req_id,
            msg: msg.into(),
            code,
            msg_data,
        }
    }

    /// Generic success result with no payload.
    pub fn ok(req_id: u32) -> Self {
        Self::new(req_id, crate::messages::response::RESULT, 200, Value::Null)
    }

    /// Generic not-found result.
    pub fn not_found(req_id: u32) -> Self {
        Self::new(req_id, crate::messages::response::RESULT, 404, Value::Null)
    }

    /// Generic bad-request result, used when a request payload does not parse.
    pub fn bad_request(req_id: u32) -> Self {
        Self::new(req_id, crate::messages::response::RESULT, 400, Value::Null)
    }

    /// Handshake confirmation. The protocol has no real credential check;
    /// this envelope simply acknowledges the connection.
    pub fn authentication(req_id: u32) -> Self {
        Self::new(
            req_id,
            crate::messages::response::AUTHENTICATION,
            200,
            Value::Null,
        )
    }
}

/// An event sent to the remote.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundEvent {
    kind: &'static str,
    pub msg: String,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub msg_data: Value,
}

impl OutboundEvent {
    /// Build an event envelope.
    pub fn new(msg: impl Into<String>, msg_data: Value) -> Self {
        Self {
            kind: "event",
            msg: msg.into(),
            msg_data,
        }
    }
}

/// Any frame headed for the wire.
#[derive(Debug, Clone)]
pub enum OutboundFrame {
    Response(ResponseMessage),
    Event(OutboundEvent),
}

impl From<ResponseMessage> for OutboundFrame {
    fn from(resp: ResponseMessage) -> Self {
        OutboundFrame::Response(resp)
    }
}

impl From<OutboundEvent> for OutboundFrame {
    fn from(event: OutboundEvent) -> Self {
        OutboundFrame::Event(event)
    }
}

impl OutboundFrame {
    /// Message discriminator of the wrapped frame, for logging.
    pub fn msg(&self) -> &str {
        match self {
            OutboundFrame::Response(resp) => &resp.msg,
            OutboundFrame::Event(event) => &event.msg,
        }
    }

    /// Whether this frame is an event (as opposed to a response).
    ///
    /// Standby suppression applies to events only; responses always go out.
    pub fn is_event(&self) -> bool {
        matches!(self, OutboundFrame::Event(_))
    }
}

/// Raw envelope shape shared by all inbound frames.
#[derive(Debug, Deserialize)]
struct RawEnvelope {
    kind: String,
    id: Option<u32>,
    msg: String,
    #[serde(default)]
    msg_data: Value,
}

/// Decode one inbound frame.
///
/// Fails with [`ProtoError::MalformedMessage`] when the text is not valid
/// JSON or lacks the envelope fields, and with [`ProtoError::UnknownKind`]
/// for discriminators other than `req` and `event`. Either way the caller
/// drops the frame and keeps the connection open.
pub fn decode(raw: &str) -> Result<InboundFrame> {
    let envelope: RawEnvelope =
        serde_json::from_str(raw).map_err(|source| ProtoError::MalformedMessage { source })?;

    match envelope.kind.as_str() {
        "req" => {
            let id = envelope.id.ok_or(ProtoError::MissingField("id"))?;
            Ok(InboundFrame::Request(RequestMessage {
                id,
                msg: envelope.msg,
                msg_data: envelope.msg_data,
            }))
        }
        "event" => Ok(InboundFrame::Event(InboundEvent {
            msg: envelope.msg,
            msg_data: envelope.msg_data,
        })),
        _ => Err(ProtoError::UnknownKind(envelope.kind)),
    }
}

/// Encode one outbound frame to its wire text.
///
/// Never fails for well-formed internal structures; an `Err` here is a
/// programming error the writer logs before dropping the frame.
pub fn encode(frame: &OutboundFrame) -> Result<String> {
    let text = match frame {
        OutboundFrame::Response(resp) => serde_json::to_string(resp),
        OutboundFrame::Event(event) => serde_json::to_string(event),
    };
    text.map_err(ProtoError::Encode)
}
