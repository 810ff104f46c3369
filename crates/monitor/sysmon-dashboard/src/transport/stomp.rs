//! Minimal STOMP 1.2 frame codec
//!
//! Only the client side of the subscribe flow is covered: CONNECT, SUBSCRIBE
//! and DISCONNECT are encoded; CONNECTED, MESSAGE, RECEIPT and ERROR are
//! decoded. Frames are text, terminated by NUL. A bare EOL is a heart-beat.

use crate::{DashboardError, Result};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StompCommand {
    Connect,
    Connected,
    Subscribe,
    Unsubscribe,
    Disconnect,
    Message,
    Receipt,
    Error,
}

impl StompCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connect => "CONNECT",
            Self::Connected => "CONNECTED",
            Self::Subscribe => "SUBSCRIBE",
            Self::Unsubscribe => "UNSUBSCRIBE",
            Self::Disconnect => "DISCONNECT",
            Self::Message => "MESSAGE",
            Self::Receipt => "RECEIPT",
            Self::Error => "ERROR",
        }
    }

    fn parse(s: &str) -> Result<Self> {
        match s {
            "CONNECT" | "STOMP" => Ok(Self::Connect),
            "CONNECTED" => Ok(Self::Connected),
            "SUBSCRIBE" => Ok(Self::Subscribe),
            "UNSUBSCRIBE" => Ok(Self::Unsubscribe),
            "DISCONNECT" => Ok(Self::Disconnect),
            "MESSAGE" => Ok(Self::Message),
            "RECEIPT" => Ok(Self::Receipt),
            "ERROR" => Ok(Self::Error),
            other => Err(DashboardError::Protocol(format!("unknown STOMP command '{}'", other))),
        }
    }

    /// CONNECT and CONNECTED headers are not escaped
    fn escapes_headers(&self) -> bool {
        !matches!(self, Self::Connect | Self::Connected)
    }
}

impl fmt::Display for StompCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub command: StompCommand,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Frame {
    pub fn new(command: StompCommand) -> Self {
        Self {
            command,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn connect(host: &str) -> Self {
        Self::new(StompCommand::Connect)
            .header("accept-version", "1.1,1.2")
            .header("host", host)
            .header("heart-beat", "0,0")
    }

    pub fn subscribe(id: &str, destination: &str) -> Self {
        Self::new(StompCommand::Subscribe)
            .header("id", id)
            .header("destination", destination)
            .header("ack", "auto")
    }

    pub fn disconnect() -> Self {
        Self::new(StompCommand::Disconnect)
    }

    /// First value of a header. Repeated headers keep the first occurrence.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn encode(&self) -> String {
        let escape = self.command.escapes_headers();
        let mut out = String::with_capacity(64 + self.body.len());
        out.push_str(self.command.as_str());
        out.push('\n');
        for (name, value) in &self.headers {
            if escape {
                out.push_str(&escape_header(name));
                out.push(':');
                out.push_str(&escape_header(value));
            } else {
                out.push_str(name);
                out.push(':');
                out.push_str(value);
            }
            out.push('\n');
        }
        out.push('\n');
        out.push_str(&self.body);
        out.push('\0');
        out
    }
}

/// Decode every frame in a WebSocket text message. Heart-beats yield no frames.
pub fn decode(message: &str) -> Result<Vec<Frame>> {
    let mut frames = Vec::new();
    for chunk in message.split('\0') {
        let chunk = chunk.trim_start_matches(|c| c == '\r' || c == '\n');
        if chunk.is_empty() {
            continue;
        }
        frames.push(decode_frame(chunk)?);
    }
    Ok(frames)
}

fn decode_frame(raw: &str) -> Result<Frame> {
    let (head, body) = match raw.find("\n\n") {
        Some(idx) => (&raw[..idx], &raw[idx + 2..]),
        None => match raw.find("\r\n\r\n") {
            Some(idx) => (&raw[..idx], &raw[idx + 4..]),
            None => (raw, ""),
        },
    };

    let mut lines = head.lines();
    let command_line = lines
        .next()
        .ok_or_else(|| DashboardError::Protocol("empty STOMP frame".to_string()))?;
    let command = StompCommand::parse(command_line.trim_end_matches('\r'))?;

    let mut headers = Vec::new();
    for line in lines {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }
        let (name, value) = line.split_once(':').ok_or_else(|| {
            DashboardError::Protocol(format!("malformed STOMP header '{}'", line))
        })?;
        if command.escapes_headers() {
            headers.push((unescape_header(name)?, unescape_header(value)?));
        } else {
            headers.push((name.to_string(), value.to_string()));
        }
    }

    Ok(Frame {
        command,
        headers,
        body: body.to_string(),
    })
}

fn escape_header(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            ':' => out.push_str("\\c"),
            c => out.push(c),
        }
    }
    out
}

fn unescape_header(s: &str) -> Result<String> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('c') => out.push(':'),
            other => {
                return Err(DashboardError::Protocol(format!(
                    "invalid STOMP header escape '\\{}'",
                    other.map(String::from).unwrap_or_default()
                )))
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_connect() {
        let frame = Frame::connect("localhost");
        assert_eq!(
            frame.encode(),
            "CONNECT\naccept-version:1.1,1.2\nhost:localhost\nheart-beat:0,0\n\n\0"
        );
    }

    #[test]
    fn test_encode_subscribe() {
        let frame = Frame::subscribe("sub-0", "/topic/metrics");
        assert_eq!(
            frame.encode(),
            "SUBSCRIBE\nid:sub-0\ndestination:/topic/metrics\nack:auto\n\n\0"
        );
    }

    #[test]
    fn test_decode_message_with_json_body() {
        let raw = "MESSAGE\ndestination:/topic/new-task\ncontent-type:application/json\nsubscription:sub-7\nmessage-id:abc-1\ncontent-length:9\n\n{\"id\":42}\0";
        let frames = decode(raw).unwrap();
        assert_eq!(frames.len(), 1);

        let frame = &frames[0];
        assert_eq!(frame.command, StompCommand::Message);
        assert_eq!(frame.get("destination"), Some("/topic/new-task"));
        assert_eq!(frame.get("subscription"), Some("sub-7"));
        assert_eq!(frame.body, "{\"id\":42}");
    }

    #[test]
    fn test_decode_heartbeats_and_multiple_frames() {
        assert!(decode("\n").unwrap().is_empty());

        let raw = "CONNECTED\nversion:1.2\nheart-beat:0,0\n\n\0\nRECEIPT\nreceipt-id:77\n\n\0";
        let frames = decode(raw).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].command, StompCommand::Connected);
        assert_eq!(frames[0].get("version"), Some("1.2"));
        assert_eq!(frames[1].get("receipt-id"), Some("77"));
    }

    #[test]
    fn test_header_escaping() {
        let frame = Frame::new(StompCommand::Subscribe).header("x", "a:b\nc\\d");
        let encoded = frame.encode();
        assert!(encoded.contains("x:a\\cb\\nc\\\\d\n"));

        let decoded = decode(&encoded).unwrap();
        assert_eq!(decoded[0].get("x"), Some("a:b\nc\\d"));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode("HELLO\n\n\0"), Err(DashboardError::Protocol(_))));
        assert!(matches!(
            decode("MESSAGE\nno-colon-here\n\n\0"),
            Err(DashboardError::Protocol(_))
        ));
        assert!(matches!(
            decode("MESSAGE\nbad:\\t\n\n\0"),
            Err(DashboardError::Protocol(_))
        ));
    }

    #[test]
    fn test_decode_error_frame() {
        let frames = decode("ERROR\nmessage:access denied\n\nDetails\0").unwrap();
        assert_eq!(frames[0].command, StompCommand::Error);
        assert_eq!(frames[0].get("message"), Some("access denied"));
        assert_eq!(frames[0].body, "Details");
    }
}
