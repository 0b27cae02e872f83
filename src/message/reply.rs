//! Passive reply builder
//!
//! A reply addresses the follower who sent the request, from the account
//! that received it. Exactly one message is carried; setting a new one
//! replaces whatever was set before.

use super::request::{MsgType, Request};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Music {
    pub title: String,
    pub description: String,
    pub music_url: String,
    pub hq_music_url: String,
    pub thumb_media_id: String,
}

/// One entry of a news (article list) reply.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Article {
    pub title: String,
    pub description: String,
    pub pic_url: String,
    pub url: String,
}

impl Article {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        pic_url: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            pic_url: pic_url.into(),
            url: url.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyMessage {
    Text {
        content: String,
    },
    Image {
        media_id: String,
    },
    Voice {
        media_id: String,
    },
    Video {
        media_id: String,
        title: String,
        description: String,
    },
    Music(Music),
    News(Vec<Article>),
}

impl ReplyMessage {
    pub fn msg_type(&self) -> MsgType {
        match self {
            ReplyMessage::Text { .. } => MsgType::Text,
            ReplyMessage::Image { .. } => MsgType::Image,
            ReplyMessage::Voice { .. } => MsgType::Voice,
            ReplyMessage::Video { .. } => MsgType::Video,
            ReplyMessage::Music(_) => MsgType::Music,
            ReplyMessage::News(_) => MsgType::News,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub to_user_name: String,
    pub from_user_name: String,
    pub create_time: i64,
    msg: Option<ReplyMessage>,
}

impl Reply {
    pub fn new(
        to_user_name: impl Into<String>,
        from_user_name: impl Into<String>,
        create_time: i64,
    ) -> Self {
        Self {
            to_user_name: to_user_name.into(),
            from_user_name: from_user_name.into(),
            create_time,
            msg: None,
        }
    }

    /// Empty reply to `request`, addressed back to its sender and stamped
    /// with the current time.
    pub fn to_request(request: &Request) -> Self {
        Self::new(
            request.header.from_user_name.clone(),
            request.header.to_user_name.clone(),
            chrono::Utc::now().timestamp(),
        )
    }

    pub fn message(&self) -> Option<&ReplyMessage> {
        self.msg.as_ref()
    }

    pub fn msg_type(&self) -> Option<MsgType> {
        self.msg.as_ref().map(ReplyMessage::msg_type)
    }

    /// Replace the carried message.
    pub fn set_message(&mut self, msg: ReplyMessage) -> &mut Self {
        self.msg = Some(msg);
        self
    }

    pub fn clear(&mut self) -> &mut Self {
        self.msg = None;
        self
    }

    pub fn text(&mut self, content: impl Into<String>) -> &mut Self {
        self.set_message(ReplyMessage::Text {
            content: content.into(),
        })
    }

    pub fn image(&mut self, media_id: impl Into<String>) -> &mut Self {
        self.set_message(ReplyMessage::Image {
            media_id: media_id.into(),
        })
    }

    pub fn voice(&mut self, media_id: impl Into<String>) -> &mut Self {
        self.set_message(ReplyMessage::Voice {
            media_id: media_id.into(),
        })
    }

    pub fn video(
        &mut self,
        media_id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> &mut Self {
        self.set_message(ReplyMessage::Video {
            media_id: media_id.into(),
            title: title.into(),
            description: description.into(),
        })
    }

    pub fn music(&mut self, music: Music) -> &mut Self {
        self.set_message(ReplyMessage::Music(music))
    }

    pub fn news(&mut self, articles: Vec<Article>) -> &mut Self {
        self.set_message(ReplyMessage::News(articles))
    }
}
