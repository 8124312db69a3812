//! Client context extraction from connection metadata.

use serde_json::{Map, Value};

use crate::domain::{CONTEXT_FIELDS, ClientContext};
use crate::ports::ConnectionMetadata;

/// Build a [`ClientContext`] from the handshake and an optional config payload.
///
/// Header values seed the known fields; the payload, when given, overrides
/// them. Pure: the same inputs always produce the same context.
pub fn extract_client_context(
    metadata: &ConnectionMetadata,
    payload: Option<&Map<String, Value>>,
) -> ClientContext {
    let mut context = ClientContext {
        ip: resolve_client_ip(metadata),
        ..ClientContext::default()
    };

    for (field, header) in CONTEXT_FIELDS {
        if let Some(value) = metadata.header(header).map(str::trim) {
            if !value.is_empty() {
                context.set_field(field, value.to_string());
            }
        }
    }

    match payload {
        Some(payload) => context.merge_config(payload),
        None => context.apply_client_id_fallback(),
    }

    context
}

/// Resolve the originating client IP.
///
/// Precedence: first `X-Forwarded-For` entry, then the first `for=` of
/// `Forwarded`, then `X-Real-IP`, then the direct peer address.
pub fn resolve_client_ip(metadata: &ConnectionMetadata) -> Option<String> {
    metadata
        .header("x-forwarded-for")
        .and_then(first_forwarded_for)
        .or_else(|| metadata.header("forwarded").and_then(parse_forwarded_for))
        .or_else(|| metadata.header("x-real-ip").and_then(non_empty))
        .or_else(|| metadata.peer_addr.map(|addr| addr.ip().to_string()))
}

fn first_forwarded_for(value: &str) -> Option<String> {
    value.split(',').next().and_then(non_empty)
}

/// Extract the first `for=` node from an RFC 7239 `Forwarded` header.
fn parse_forwarded_for(value: &str) -> Option<String> {
    value
        .split(',')
        .flat_map(|element| element.split(';'))
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("for"))
        .and_then(|(_, node)| normalize_forwarded_node(node))
}

/// Strip quotes and IPv6 brackets from a `for=` node.
fn normalize_forwarded_node(node: &str) -> Option<String> {
    let node = node.trim().trim_matches(|c| c == '"' || c == '\'');
    let node = match node.strip_prefix('[') {
        // "[v6]" or "[v6]:port"
        Some(rest) => rest.split(']').next().unwrap_or(rest),
        None => node,
    };
    non_empty(node)
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::net::SocketAddr;

    fn peer() -> SocketAddr {
        "192.0.2.10:51000".parse().unwrap()
    }

    #[test]
    fn test_forwarded_for_first_entry_wins() {
        let meta = ConnectionMetadata::new()
            .with_header("X-Forwarded-For", "203.0.113.5, 70.41.3.18")
            .with_header("X-Real-IP", "10.0.0.1")
            .with_peer_addr(peer());

        let ctx = extract_client_context(&meta, None);

        assert_eq!(ctx.ip.as_deref(), Some("203.0.113.5"));
        assert_eq!(ctx.client_id.as_deref(), Some("203.0.113.5"));
    }

    #[test]
    fn test_rfc7239_forwarded_ipv6() {
        let meta = ConnectionMetadata::new()
            .with_header("Forwarded", "for=\"[2001:db8::1]\";proto=https")
            .with_peer_addr(peer());

        assert_eq!(resolve_client_ip(&meta).as_deref(), Some("2001:db8::1"));
    }

    #[test]
    fn test_rfc7239_forwarded_with_port_and_case() {
        let meta = ConnectionMetadata::new()
            .with_header("Forwarded", "proto=http;For=\"[2001:db8::2]:4711\", for=198.51.100.1");

        assert_eq!(resolve_client_ip(&meta).as_deref(), Some("2001:db8::2"));
    }

    #[test]
    fn test_real_ip_then_peer() {
        let meta = ConnectionMetadata::new()
            .with_header("X-Real-IP", " 10.0.0.1 ")
            .with_peer_addr(peer());
        assert_eq!(resolve_client_ip(&meta).as_deref(), Some("10.0.0.1"));

        let meta = ConnectionMetadata::new().with_peer_addr(peer());
        assert_eq!(resolve_client_ip(&meta).as_deref(), Some("192.0.2.10"));

        assert_eq!(resolve_client_ip(&ConnectionMetadata::new()), None);
    }

    #[test]
    fn test_empty_forwarding_headers_are_skipped() {
        let meta = ConnectionMetadata::new()
            .with_header("X-Forwarded-For", " ")
            .with_header("Forwarded", "for=")
            .with_header("X-Real-IP", "10.0.0.9");

        assert_eq!(resolve_client_ip(&meta).as_deref(), Some("10.0.0.9"));
    }

    #[test]
    fn test_headers_seed_context_fields() {
        let meta = ConnectionMetadata::new()
            .with_header("X-App-Name", "kiosk")
            .with_header("X-Client-Id", "c-1")
            .with_header("X-Device-Id", "dev-9")
            .with_header("X-User-Id", "u-7")
            .with_header("X-Session-Id", "s-3")
            .with_header("X-Request-Id", "r-5")
            .with_peer_addr(peer());

        let ctx = extract_client_context(&meta, None);

        assert_eq!(ctx.app.as_deref(), Some("kiosk"));
        assert_eq!(ctx.client_id.as_deref(), Some("c-1"));
        assert_eq!(ctx.device.as_deref(), Some("dev-9"));
        assert_eq!(ctx.user_id.as_deref(), Some("u-7"));
        assert_eq!(ctx.session_id.as_deref(), Some("s-3"));
        assert_eq!(ctx.request_id.as_deref(), Some("r-5"));
        assert_eq!(ctx.ip.as_deref(), Some("192.0.2.10"));
    }

    #[test]
    fn test_payload_overrides_headers() {
        let meta = ConnectionMetadata::new().with_header("X-App-Name", "from-header");
        let payload = json!({"app": "from-config"});

        let ctx = extract_client_context(&meta, payload.as_object());

        assert_eq!(ctx.app.as_deref(), Some("from-config"));
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let meta = ConnectionMetadata::new()
            .with_header("X-Forwarded-For", "203.0.113.5")
            .with_header("X-User-Id", "u-1");

        assert_eq!(
            extract_client_context(&meta, None),
            extract_client_context(&meta, None)
        );
    }
}
