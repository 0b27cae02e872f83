//! Inbound message and event types

use serde::{Serialize, Serializer};

/// `MsgType` discriminator shared by inbound messages and replies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MsgType {
    Text,
    Image,
    Voice,
    Video,
    Location,
    Link,
    Event,
    Music,
    News,
    /// Kind this crate does not model; the raw value is kept.
    Unknown(String),
}

impl MsgType {
    pub fn as_str(&self) -> &str {
        match self {
            MsgType::Text => "text",
            MsgType::Image => "image",
            MsgType::Voice => "voice",
            MsgType::Video => "video",
            MsgType::Location => "location",
            MsgType::Link => "link",
            MsgType::Event => "event",
            MsgType::Music => "music",
            MsgType::News => "news",
            MsgType::Unknown(raw) => raw,
        }
    }
}

impl From<&str> for MsgType {
    fn from(s: &str) -> Self {
        match s {
            "text" => MsgType::Text,
            "image" => MsgType::Image,
            "voice" => MsgType::Voice,
            "video" => MsgType::Video,
            "location" => MsgType::Location,
            "link" => MsgType::Link,
            "event" => MsgType::Event,
            "music" => MsgType::Music,
            "news" => MsgType::News,
            other => MsgType::Unknown(other.to_string()),
        }
    }
}

impl Serialize for MsgType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Value of the `Event` field on `MsgType=event` pushes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    Subscribe,
    Unsubscribe,
    /// QR code scanned by an existing follower.
    Scan,
    /// Periodic location report.
    Location,
    Click,
    View,
    Other(String),
}

impl EventType {
    pub fn as_str(&self) -> &str {
        match self {
            EventType::Subscribe => "subscribe",
            EventType::Unsubscribe => "unsubscribe",
            EventType::Scan => "SCAN",
            EventType::Location => "LOCATION",
            EventType::Click => "CLICK",
            EventType::View => "VIEW",
            EventType::Other(raw) => raw,
        }
    }
}

impl From<&str> for EventType {
    fn from(s: &str) -> Self {
        match s {
            "subscribe" => EventType::Subscribe,
            "unsubscribe" => EventType::Unsubscribe,
            "SCAN" => EventType::Scan,
            "LOCATION" => EventType::Location,
            "CLICK" => EventType::Click,
            "VIEW" => EventType::View,
            other => EventType::Other(other.to_string()),
        }
    }
}

impl Serialize for EventType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Fields present on every inbound message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Header {
    /// Official account that received the message.
    pub to_user_name: String,
    /// Follower's open id.
    pub from_user_name: String,
    pub create_time: i64,
    pub msg_type: MsgType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub event: EventType,
    pub event_key: String,
    pub ticket: String,
    /// Only on `LOCATION` events.
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub precision: Option<f64>,
}

impl Event {
    pub fn new(event: EventType) -> Self {
        Self {
            event,
            event_key: String::new(),
            ticket: String::new(),
            latitude: None,
            longitude: None,
            precision: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum RequestBody {
    Text {
        content: String,
    },
    Image {
        media_id: String,
        pic_url: String,
    },
    Voice {
        media_id: String,
        format: String,
        /// Speech recognition result, when enabled on the account.
        recognition: Option<String>,
    },
    Video {
        media_id: String,
        thumb_media_id: String,
    },
    Location {
        x: f64,
        y: f64,
        scale: i32,
        label: String,
    },
    Link {
        title: String,
        description: String,
        url: String,
    },
    Event(Event),
    Unknown,
}

impl RequestBody {
    /// Discriminator implied by the variant. `None` for `Unknown`, whose
    /// discriminator only lives in the header.
    pub fn msg_type(&self) -> Option<MsgType> {
        Some(match self {
            RequestBody::Text { .. } => MsgType::Text,
            RequestBody::Image { .. } => MsgType::Image,
            RequestBody::Voice { .. } => MsgType::Voice,
            RequestBody::Video { .. } => MsgType::Video,
            RequestBody::Location { .. } => MsgType::Location,
            RequestBody::Link { .. } => MsgType::Link,
            RequestBody::Event(_) => MsgType::Event,
            RequestBody::Unknown => return None,
        })
    }
}

/// A decoded inbound message or event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Request {
    pub header: Header,
    /// Present on user messages, absent on events.
    pub msg_id: Option<i64>,
    pub body: RequestBody,
}

impl Request {
    /// Build a request whose header discriminator follows `body`.
    pub fn new(
        to_user_name: impl Into<String>,
        from_user_name: impl Into<String>,
        create_time: i64,
        body: RequestBody,
    ) -> Self {
        let msg_type = body
            .msg_type()
            .unwrap_or_else(|| MsgType::Unknown(String::new()));
        Self {
            header: Header {
                to_user_name: to_user_name.into(),
                from_user_name: from_user_name.into(),
                create_time,
                msg_type,
            },
            msg_id: None,
            body,
        }
    }

    pub fn with_msg_id(mut self, msg_id: i64) -> Self {
        self.msg_id = Some(msg_id);
        self
    }

    pub fn msg_type(&self) -> &MsgType {
        &self.header.msg_type
    }

    pub fn event(&self) -> Option<&Event> {
        match &self.body {
            RequestBody::Event(event) => Some(event),
            _ => None,
        }
    }
}
