//! Client attribution context.
//!
//! A [`ClientContext`] describes who is on the other end of a live session:
//! which application, device and user, plus the session/request identifiers
//! the client chose to share and the IP address it connected from. It is
//! built from the websocket handshake and then updated by in-band `config`
//! messages for the lifetime of the session.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Context fields that can be supplied either by header or in-band config.
///
/// Each entry is `(config key, header name)`.
pub const CONTEXT_FIELDS: [(&str, &str); 6] = [
    ("app", "x-app-name"),
    ("client_id", "x-client-id"),
    ("device", "x-device-id"),
    ("user_id", "x-user-id"),
    ("session_id", "x-session-id"),
    ("request_id", "x-request-id"),
];

/// Attribution metadata for one live session.
///
/// Every field is optional. Values supplied in-band override header-derived
/// values for the same field (last write wins). When no client id is known
/// after a merge, the source IP stands in for it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientContext {
    /// Calling application name.
    pub app: Option<String>,
    /// Stable client identifier.
    pub client_id: Option<String>,
    /// Device identifier.
    pub device: Option<String>,
    /// End-user identifier.
    pub user_id: Option<String>,
    /// Client-side session identifier (distinct from the proxy session id).
    pub session_id: Option<String>,
    /// Client-side request identifier.
    pub request_id: Option<String>,
    /// Resolved source IP address.
    pub ip: Option<String>,
    /// Config fields this proxy does not interpret, kept verbatim.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

impl ClientContext {
    /// Set a known context field by its config key.
    ///
    /// Returns `false` when `key` is not one of the known fields.
    pub fn set_field(&mut self, key: &str, value: String) -> bool {
        let slot = match key {
            "app" => &mut self.app,
            "client_id" => &mut self.client_id,
            "device" => &mut self.device,
            "user_id" => &mut self.user_id,
            "session_id" => &mut self.session_id,
            "request_id" => &mut self.request_id,
            _ => return false,
        };
        *slot = Some(value);
        true
    }

    /// Merge an in-band config payload into this context.
    ///
    /// Known fields with a scalar value overwrite the current value; null
    /// or absent fields leave it untouched. Unknown fields, and known fields
    /// whose value is an array or object, are kept in [`extra`](Self::extra).
    pub fn merge_config(&mut self, payload: &Map<String, Value>) {
        for (key, value) in payload {
            if value.is_null() {
                continue;
            }
            let is_known = CONTEXT_FIELDS.iter().any(|(field, _)| field == key);
            if is_known {
                if let Some(text) = value_as_string(value) {
                    self.set_field(key, text);
                } else {
                    debug!(field = %key, "Non-scalar context value kept in extra");
                    self.extra.insert(key.clone(), value.clone());
                }
            } else {
                self.extra.insert(key.clone(), value.clone());
            }
        }
        self.apply_client_id_fallback();
    }

    /// Use the source IP as client id when no client id is known.
    pub fn apply_client_id_fallback(&mut self) {
        if self.client_id.is_none() {
            self.client_id.clone_from(&self.ip);
        }
    }
}

/// Render a scalar JSON value as a context string.
///
/// Strings are taken as-is; numbers and booleans use their JSON spelling.
/// Arrays and objects are not meaningful as attribution values.
fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("payload must be an object"),
        }
    }

    #[test]
    fn test_merge_overrides_known_fields() {
        let mut ctx = ClientContext {
            app: Some("header-app".to_string()),
            ..Default::default()
        };

        ctx.merge_config(&payload(json!({"app": "config-app", "user_id": "u-1"})));

        assert_eq!(ctx.app.as_deref(), Some("config-app"));
        assert_eq!(ctx.user_id.as_deref(), Some("u-1"));
    }

    #[test]
    fn test_merge_ignores_null_values() {
        let mut ctx = ClientContext {
            device: Some("phone".to_string()),
            ..Default::default()
        };

        ctx.merge_config(&payload(json!({"device": null})));

        assert_eq!(ctx.device.as_deref(), Some("phone"));
    }

    #[test]
    fn test_merge_keeps_unknown_fields() {
        let mut ctx = ClientContext::default();

        ctx.merge_config(&payload(json!({"locale": "de-DE", "app": "demo"})));

        assert_eq!(ctx.extra.get("locale"), Some(&json!("de-DE")));
        assert_eq!(ctx.app.as_deref(), Some("demo"));
    }

    #[test]
    fn test_non_scalar_known_field_is_kept_in_extra() {
        let mut ctx = ClientContext {
            app: Some("header-app".to_string()),
            ..Default::default()
        };

        ctx.merge_config(&payload(json!({"app": ["a"], "device": {"model": "x1"}})));

        assert_eq!(ctx.app.as_deref(), Some("header-app"));
        assert_eq!(ctx.device, None);
        assert_eq!(ctx.extra.get("app"), Some(&json!(["a"])));
        assert_eq!(ctx.extra.get("device"), Some(&json!({"model": "x1"})));
    }

    #[test]
    fn test_numeric_ids_are_stringified() {
        let mut ctx = ClientContext::default();

        ctx.merge_config(&payload(json!({"user_id": 42})));

        assert_eq!(ctx.user_id.as_deref(), Some("42"));
    }

    #[test]
    fn test_client_id_falls_back_to_ip() {
        let mut ctx = ClientContext {
            ip: Some("198.51.100.7".to_string()),
            ..Default::default()
        };

        ctx.merge_config(&Map::new());

        assert_eq!(ctx.client_id.as_deref(), Some("198.51.100.7"));
    }

    #[test]
    fn test_explicit_client_id_wins_over_ip() {
        let mut ctx = ClientContext {
            ip: Some("198.51.100.7".to_string()),
            ..Default::default()
        };

        ctx.merge_config(&payload(json!({"client_id": "kiosk-3"})));

        assert_eq!(ctx.client_id.as_deref(), Some("kiosk-3"));
    }
}
