//! Realtime page notifications over the socket.io websocket transport.

mod channel;

pub(crate) use channel::connect;

use crate::models::{Page, UserRef};
use serde::{Deserialize, Deserializer};
use strum::{Display, EnumString, IntoStaticStr};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString, IntoStaticStr)]
pub(crate) enum PageChannel {
    #[strum(serialize = "page:create")]
    Create,
    #[strum(serialize = "page:update")]
    Update,
    #[strum(serialize = "page:delete")]
    Delete,
    #[strum(serialize = "page:editingWithHackmd")]
    EditingWithExternal,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct RealtimeEvent {
    pub channel: PageChannel,
    /// Session that caused the event, echoed back by the server.
    pub socket_client_id: Option<String>,
    pub page: Page,
    pub user: Option<UserRef>,
}

#[derive(Deserialize)]
struct EventPayload {
    #[serde(rename = "socketClientId", default, deserialize_with = "string_or_number")]
    socket_client_id: Option<String>,
    page: Page,
    #[serde(default)]
    user: Option<UserRef>,
}

// Older servers send the client id as a number.
fn string_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let v = Option::<serde_json::Value>::deserialize(d)?;
    Ok(match v {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// One engine.io text frame, as far as this client cares.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Frame {
    /// Handshake; carries the ping interval the client must honor.
    Open { ping_interval_ms: i32 },
    Ping,
    Pong,
    Event(RealtimeEvent),
    /// Anything else: connect acks, events on other channels, malformed input.
    Ignored,
}

pub(crate) const PING_FRAME: &str = "2";
pub(crate) const PONG_FRAME: &str = "3";

#[derive(Deserialize)]
struct Handshake {
    #[serde(rename = "pingInterval", default = "default_ping_interval")]
    ping_interval: i32,
}

fn default_ping_interval() -> i32 {
    25_000
}

pub(crate) fn parse_frame(text: &str) -> Frame {
    let mut chars = text.chars();
    let Some(kind) = chars.next() else {
        return Frame::Ignored;
    };
    let rest = chars.as_str();

    match kind {
        '0' => serde_json::from_str::<Handshake>(rest)
            .map(|h| Frame::Open {
                ping_interval_ms: h.ping_interval,
            })
            .unwrap_or(Frame::Ignored),
        '2' => Frame::Ping,
        '3' => Frame::Pong,
        '4' => parse_socketio_packet(rest),
        _ => Frame::Ignored,
    }
}

fn parse_socketio_packet(packet: &str) -> Frame {
    // Only EVENT packets on the default namespace: `2[...]`, optionally with an ack id.
    let Some(body) = packet.strip_prefix('2') else {
        return Frame::Ignored;
    };
    let body = body.trim_start_matches(|c: char| c.is_ascii_digit());
    if !body.starts_with('[') {
        return Frame::Ignored;
    }

    let Ok((name, payload)) = serde_json::from_str::<(String, serde_json::Value)>(body) else {
        return Frame::Ignored;
    };
    match decode_event(&name, payload) {
        Some(ev) => Frame::Event(ev),
        None => Frame::Ignored,
    }
}

pub(crate) fn decode_event(name: &str, payload: serde_json::Value) -> Option<RealtimeEvent> {
    let channel = name.parse::<PageChannel>().ok()?;
    let payload: EventPayload = match serde_json::from_value(payload) {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(channel = name, error = %e, "malformed realtime payload");
            return None;
        }
    };

    Some(RealtimeEvent {
        channel,
        socket_client_id: payload.socket_client_id,
        page: payload.page,
        user: payload.user,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_open_frame() {
        let f = parse_frame(r#"0{"sid":"abc","upgrades":[],"pingInterval":20000,"pingTimeout":5000}"#);
        assert_eq!(f, Frame::Open { ping_interval_ms: 20000 });
    }

    #[test]
    fn test_parse_ping_pong_and_connect_ack() {
        assert_eq!(parse_frame("2"), Frame::Ping);
        assert_eq!(parse_frame("3"), Frame::Pong);
        assert_eq!(parse_frame("40"), Frame::Ignored);
        assert_eq!(parse_frame(""), Frame::Ignored);
    }

    #[test]
    fn test_parse_page_update_event() {
        let text = r#"42["page:update",{"socketClientId":"s2","page":{"_id":"p1","path":"/a","revision":{"_id":"r2"},"revisionHackmdSynced":"r1","hasDraftOnHackmd":false},"user":{"name":"bob"}}]"#;
        let Frame::Event(ev) = parse_frame(text) else {
            panic!("expected an event frame");
        };
        assert_eq!(ev.channel, PageChannel::Update);
        assert_eq!(ev.socket_client_id.as_deref(), Some("s2"));
        assert_eq!(ev.page.path, "/a");
        assert_eq!(ev.page.revision.id, "r2");
        assert_eq!(ev.user.map(|u| u.name).as_deref(), Some("bob"));
    }

    #[test]
    fn test_numeric_socket_client_id_is_stringified() {
        let payload = serde_json::json!({
            "socketClientId": 4242,
            "page": {"path": "/a", "revision": {"_id": "r1"}}
        });
        let ev = decode_event("page:create", payload).expect("should decode");
        assert_eq!(ev.socket_client_id.as_deref(), Some("4242"));
        assert!(ev.user.is_none());
    }

    #[test]
    fn test_editing_channel_name() {
        let ev = decode_event(
            "page:editingWithHackmd",
            serde_json::json!({"page": {"path": "/a", "revision": {"_id": "r1"}, "hasDraftOnHackmd": true}}),
        )
        .expect("should decode");
        assert_eq!(ev.channel, PageChannel::EditingWithExternal);
        assert!(ev.page.has_draft_on_hackmd);
    }

    #[test]
    fn test_unknown_channel_and_bad_payload_are_ignored() {
        assert_eq!(parse_frame(r#"42["comment:create",{"page":{}}]"#), Frame::Ignored);
        assert_eq!(parse_frame(r#"42["page:update",{"nope":1}]"#), Frame::Ignored);
        assert_eq!(parse_frame(r#"42/admin,["page:update",{}]"#), Frame::Ignored);
    }
}
