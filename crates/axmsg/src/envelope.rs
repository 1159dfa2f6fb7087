use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::{AxError, Result};

/// Version tag carried in the `axmsg` field of every record.
pub const PROTOCOL_VERSION: u64 = 1;

/// Role tags understood by this crate.
pub mod role {
    pub const TICK: &str = "tick";
    pub const CHECK: &str = "check";
    pub const CHECK_SUCCESS: &str = "check-success";
}

/// Command modifiers for request actions.
pub mod command {
    pub const ADD_PROCESSOR_NAME: &str = "add-processor-name";
}

// ─── Schema marker ────────────────────────────────────────────────────────

/// The `axmsg` field. Serializes as [`PROTOCOL_VERSION`] and refuses to
/// deserialize from anything else.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchemaMarker;

impl Serialize for SchemaMarker {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u64(PROTOCOL_VERSION)
    }
}

impl<'de> Deserialize<'de> for SchemaMarker {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let version = u64::deserialize(deserializer)?;
        if version == PROTOCOL_VERSION {
            Ok(SchemaMarker)
        } else {
            Err(de::Error::custom(format!(
                "unsupported axmsg version {version}, expected {PROTOCOL_VERSION}"
            )))
        }
    }
}

// ─── Action ───────────────────────────────────────────────────────────────

/// The single message unit exchanged over pipeline pipes.
///
/// The payload is kept as raw JSON until a typed view is requested through
/// [`Action::payload_as`], so records with roles this crate does not know can
/// still be logged or forwarded. Payloads of the roles in [`role`] are
/// nevertheless checked against their shape when a record is decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawAction", rename_all = "camelCase")]
pub struct Action {
    pub axmsg: SchemaMarker,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_id: Option<u64>,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub payload: Value,
}

/// Whether an action opens a request or is an event/reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Request(u64),
    Response(u64),
}

impl Action {
    /// A request action expecting a reply, correlated by `id`.
    pub fn request<P: RolePayload>(id: u64, payload: &P) -> Result<Self> {
        Ok(Self {
            axmsg: SchemaMarker,
            request_id: Some(id),
            response_id: None,
            role: P::ROLE.to_string(),
            command: None,
            payload: serde_json::to_value(payload).map_err(AxError::Encode)?,
        })
    }

    /// An unsolicited event or sequence-correlated reply.
    pub fn response<P: RolePayload>(id: u64, payload: &P) -> Result<Self> {
        Ok(Self {
            axmsg: SchemaMarker,
            request_id: None,
            response_id: Some(id),
            role: P::ROLE.to_string(),
            command: None,
            payload: serde_json::to_value(payload).map_err(AxError::Encode)?,
        })
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn kind(&self) -> Option<ActionKind> {
        match (self.request_id, self.response_id) {
            (Some(id), None) => Some(ActionKind::Request(id)),
            (None, Some(id)) => Some(ActionKind::Response(id)),
            _ => None,
        }
    }

    /// The correlation id, whichever side carries it.
    pub fn id(&self) -> Option<u64> {
        self.request_id.or(self.response_id)
    }

    /// Interpret the payload as `P`. Fails if the action's role is not `P::ROLE`.
    pub fn payload_as<P: RolePayload>(&self) -> Result<P> {
        if self.role != P::ROLE {
            return Err(AxError::RoleMismatch {
                role: self.role.clone(),
                requested: P::ROLE,
            });
        }
        P::deserialize(&self.payload).map_err(|e| AxError::Malformed {
            line: self.payload.to_string(),
            source: e,
        })
    }
}

/// Wire shape before the envelope invariants are checked.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAction {
    axmsg: SchemaMarker,
    request_id: Option<u64>,
    response_id: Option<u64>,
    role: String,
    command: Option<String>,
    #[serde(default)]
    payload: Value,
}

impl TryFrom<RawAction> for Action {
    type Error = String;

    fn try_from(raw: RawAction) -> std::result::Result<Self, Self::Error> {
        match (raw.request_id, raw.response_id) {
            (Some(_), Some(_)) => {
                return Err("requestId and responseId are mutually exclusive".into())
            }
            (None, None) => return Err("one of requestId or responseId is required".into()),
            _ => {}
        }

        match raw.role.as_str() {
            role::TICK => check_shape::<Date>(&raw.payload)?,
            role::CHECK => check_shape::<Check>(&raw.payload)?,
            role::CHECK_SUCCESS => check_shape::<Success>(&raw.payload)?,
            _ => {}
        }

        Ok(Action {
            axmsg: raw.axmsg,
            request_id: raw.request_id,
            response_id: raw.response_id,
            role: raw.role,
            command: raw.command,
            payload: raw.payload,
        })
    }
}

fn check_shape<P: RolePayload>(payload: &Value) -> std::result::Result<(), String> {
    P::deserialize(payload)
        .map(|_| ())
        .map_err(|e| format!("invalid '{}' payload: {e}", P::ROLE))
}

// ─── Payloads ─────────────────────────────────────────────────────────────

/// A payload type bound to the role that announces it.
pub trait RolePayload: Serialize + DeserializeOwned {
    const ROLE: &'static str;
}

/// `role = "tick"` — one simulated calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Date {
    pub day: u32,
    pub month: u32,
    pub year: i32,
    pub weekday: String,
}

impl RolePayload for Date {
    const ROLE: &'static str = role::TICK;
}

/// `role = "check"` — processor discovery, empty on request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Check {
    pub processors: Vec<String>,
}

impl RolePayload for Check {
    const ROLE: &'static str = role::CHECK;
}

/// `role = "check-success"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Success {
    pub success: bool,
}

impl RolePayload for Success {
    const ROLE: &'static str = role::CHECK_SUCCESS;
}

// ─── Codec ────────────────────────────────────────────────────────────────

/// Serialize `action` as one JSON object followed by a single `\n`.
pub fn encode(action: &Action) -> Result<Vec<u8>> {
    let mut buf = serde_json::to_vec(action).map_err(AxError::Encode)?;
    buf.push(b'\n');
    Ok(buf)
}

/// Parse one record, with or without its terminator.
pub fn decode(bytes: &[u8]) -> Result<Action> {
    serde_json::from_slice(bytes).map_err(|e| AxError::malformed(bytes, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tick() -> Action {
        Action::response(
            7,
            &Date {
                day: 29,
                month: 2,
                year: 2024,
                weekday: "Thursday".into(),
            },
        )
        .unwrap()
    }

    #[test]
    fn encode_emits_one_terminated_line() {
        let bytes = encode(&tick()).unwrap();
        assert_eq!(bytes.last(), Some(&b'\n'));
        assert_eq!(bytes.iter().filter(|b| **b == b'\n').count(), 1);
    }

    #[test]
    fn encode_uses_wire_field_names() {
        let bytes = encode(&tick()).unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            value,
            json!({
                "axmsg": 1,
                "responseId": 7,
                "role": "tick",
                "payload": {"day": 29, "month": 2, "year": 2024, "weekday": "Thursday"}
            })
        );
    }

    #[test]
    fn decode_restores_encoded_action() {
        let request = Action::request(3, &Check::default())
            .unwrap()
            .with_command(command::ADD_PROCESSOR_NAME);
        for action in [tick(), request] {
            let decoded = decode(&encode(&action).unwrap()).unwrap();
            assert_eq!(decoded, action);
        }
    }

    #[test]
    fn decode_rejects_invalid_json() {
        let err = decode(b"{not json").unwrap_err();
        let AxError::Malformed { line, .. } = err else {
            panic!("expected Malformed")
        };
        assert_eq!(line, "{not json");
    }

    #[test]
    fn decode_requires_schema_marker() {
        let err = decode(br#"{"responseId":1,"role":"x"}"#).unwrap_err();
        assert!(err.to_string().contains("axmsg"), "{err}");
    }

    #[test]
    fn decode_rejects_other_protocol_versions() {
        let err = decode(br#"{"axmsg":2,"responseId":1,"role":"x"}"#).unwrap_err();
        assert!(err.to_string().contains("unsupported axmsg version 2"), "{err}");
    }

    #[test]
    fn decode_rejects_payload_not_matching_role() {
        let line = br#"{"axmsg":1,"requestId":1,"role":"check","payload":{"success":true}}"#;
        let err = decode(line).unwrap_err();
        assert!(err.to_string().contains("invalid 'check' payload"), "{err}");
    }

    #[test]
    fn decode_rejects_both_or_neither_correlation_id() {
        assert!(decode(br#"{"axmsg":1,"role":"x"}"#).is_err());
        assert!(decode(br#"{"axmsg":1,"requestId":1,"responseId":2,"role":"x"}"#).is_err());
    }

    #[test]
    fn decode_keeps_unknown_role_payload_untouched() {
        let line = br#"{"axmsg":1,"responseId":4,"role":"weather","payload":{"temp":21.5}}"#;
        let action = decode(line).unwrap();
        assert_eq!(action.role, "weather");
        assert_eq!(action.payload, json!({"temp": 21.5}));
        assert_eq!(action.kind(), Some(ActionKind::Response(4)));
    }

    #[test]
    fn payload_as_checks_role() {
        let err = tick().payload_as::<Check>().unwrap_err();
        assert!(matches!(
            err,
            AxError::RoleMismatch { ref role, requested: "check" } if role == "tick"
        ));
        assert_eq!(tick().payload_as::<Date>().unwrap().day, 29);
    }

    #[test]
    fn check_reply_exposes_processor_names() {
        let line = br#"{"axmsg":1,"requestId":1,"role":"check","payload":{"processors":["a","b"]}}"#;
        let action = decode(line).unwrap();
        assert_eq!(action.id(), Some(1));
        assert_eq!(action.payload_as::<Check>().unwrap().processors, ["a", "b"]);
    }
}
