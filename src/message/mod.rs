//! Message model and XML codec
//!
//! Inbound requests are a closed set of variants behind a shared header;
//! replies carry exactly one message. Both are encoded in the platform's
//! `<xml>` envelope.

pub mod codec;
pub mod reply;
pub mod request;

pub use codec::{
    decode_encrypted, decode_reply, decode_request, encode_encrypted, encode_reply,
    encode_request, EncryptedEnvelope,
};
pub use reply::{Article, Music, Reply, ReplyMessage};
pub use request::{Event, EventType, Header, MsgType, Request, RequestBody};
