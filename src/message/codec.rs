//! XML envelope codec
//!
//! Decoding goes through a flat serde view of every field the platform may
//! send, then dispatches on `MsgType`. Encoding writes events directly so
//! string fields can be emitted as CDATA the way the platform does.

use std::fmt::Display;

use quick_xml::events::{BytesCData, BytesEnd, BytesStart, BytesText, Event as XmlEvent};
use quick_xml::Writer;
use serde::Deserialize;

use super::reply::{Article, Music, Reply, ReplyMessage};
use super::request::{Event, EventType, Header, MsgType, Request, RequestBody};
use crate::error::{Result, WebhookError};

const ROOT: &str = "xml";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawEnvelope {
    to_user_name: String,
    from_user_name: String,
    create_time: i64,
    msg_type: String,
    msg_id: Option<i64>,

    content: Option<String>,
    pic_url: Option<String>,
    media_id: Option<String>,
    format: Option<String>,
    recognition: Option<String>,
    thumb_media_id: Option<String>,
    #[serde(rename = "Location_X")]
    location_x: Option<f64>,
    #[serde(rename = "Location_Y")]
    location_y: Option<f64>,
    scale: Option<i32>,
    label: Option<String>,
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,

    event: Option<String>,
    event_key: Option<String>,
    ticket: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    precision: Option<f64>,

    // Reply-only nested elements
    image: Option<RawMedia>,
    voice: Option<RawMedia>,
    video: Option<RawVideo>,
    music: Option<RawMusic>,
    article_count: Option<usize>,
    articles: Option<RawArticles>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawMedia {
    media_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawVideo {
    media_id: Option<String>,
    title: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawMusic {
    title: Option<String>,
    description: Option<String>,
    music_url: Option<String>,
    #[serde(rename = "HQMusicUrl")]
    hq_music_url: Option<String>,
    thumb_media_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawArticles {
    #[serde(rename = "item", default)]
    items: Vec<RawArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawArticle {
    title: Option<String>,
    description: Option<String>,
    pic_url: Option<String>,
    url: Option<String>,
}

/// Outer envelope of an encrypted request, or of an encrypted reply.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EncryptedEnvelope {
    #[serde(default)]
    pub to_user_name: String,
    pub encrypt: String,
    pub msg_signature: Option<String>,
    pub time_stamp: Option<String>,
    pub nonce: Option<String>,
}

fn parse_envelope<'de, T: Deserialize<'de>>(xml: &'de [u8]) -> Result<T> {
    let text = std::str::from_utf8(xml).map_err(|e| WebhookError::Decode(e.to_string()))?;
    Ok(quick_xml::de::from_str(text)?)
}

/// Decode a plaintext inbound message. Unrecognised kinds become
/// [`RequestBody::Unknown`].
pub fn decode_request(xml: &[u8]) -> Result<Request> {
    let raw: RawEnvelope = parse_envelope(xml)?;
    let msg_type = MsgType::from(raw.msg_type.as_str());

    let body = match msg_type {
        MsgType::Text => RequestBody::Text {
            content: raw.content.unwrap_or_default(),
        },
        MsgType::Image => RequestBody::Image {
            media_id: raw.media_id.unwrap_or_default(),
            pic_url: raw.pic_url.unwrap_or_default(),
        },
        MsgType::Voice => RequestBody::Voice {
            media_id: raw.media_id.unwrap_or_default(),
            format: raw.format.unwrap_or_default(),
            recognition: raw.recognition,
        },
        MsgType::Video => RequestBody::Video {
            media_id: raw.media_id.unwrap_or_default(),
            thumb_media_id: raw.thumb_media_id.unwrap_or_default(),
        },
        MsgType::Location => RequestBody::Location {
            x: raw.location_x.unwrap_or_default(),
            y: raw.location_y.unwrap_or_default(),
            scale: raw.scale.unwrap_or_default(),
            label: raw.label.unwrap_or_default(),
        },
        MsgType::Link => RequestBody::Link {
            title: raw.title.unwrap_or_default(),
            description: raw.description.unwrap_or_default(),
            url: raw.url.unwrap_or_default(),
        },
        MsgType::Event => RequestBody::Event(Event {
            event: EventType::from(raw.event.as_deref().unwrap_or_default()),
            event_key: raw.event_key.unwrap_or_default(),
            ticket: raw.ticket.unwrap_or_default(),
            latitude: raw.latitude,
            longitude: raw.longitude,
            precision: raw.precision,
        }),
        // Music and news only flow outwards.
        MsgType::Music | MsgType::News | MsgType::Unknown(_) => RequestBody::Unknown,
    };

    let msg_type = match body {
        RequestBody::Unknown => MsgType::Unknown(raw.msg_type),
        _ => msg_type,
    };

    Ok(Request {
        header: Header {
            to_user_name: raw.to_user_name,
            from_user_name: raw.from_user_name,
            create_time: raw.create_time,
            msg_type,
        },
        msg_id: raw.msg_id,
        body,
    })
}

/// Decode a reply envelope, as produced by [`encode_reply`].
pub fn decode_reply(xml: &[u8]) -> Result<Reply> {
    let raw: RawEnvelope = parse_envelope(xml)?;

    let msg = match MsgType::from(raw.msg_type.as_str()) {
        MsgType::Text => ReplyMessage::Text {
            content: raw.content.unwrap_or_default(),
        },
        MsgType::Image => ReplyMessage::Image {
            media_id: missing(raw.image, "Image")?.media_id.unwrap_or_default(),
        },
        MsgType::Voice => ReplyMessage::Voice {
            media_id: missing(raw.voice, "Voice")?.media_id.unwrap_or_default(),
        },
        MsgType::Video => {
            let video = missing(raw.video, "Video")?;
            ReplyMessage::Video {
                media_id: video.media_id.unwrap_or_default(),
                title: video.title.unwrap_or_default(),
                description: video.description.unwrap_or_default(),
            }
        }
        MsgType::Music => {
            let music = missing(raw.music, "Music")?;
            ReplyMessage::Music(Music {
                title: music.title.unwrap_or_default(),
                description: music.description.unwrap_or_default(),
                music_url: music.music_url.unwrap_or_default(),
                hq_music_url: music.hq_music_url.unwrap_or_default(),
                thumb_media_id: music.thumb_media_id.unwrap_or_default(),
            })
        }
        MsgType::News => {
            let items = raw.articles.map(|a| a.items).unwrap_or_default();
            if let Some(count) = raw.article_count {
                if count != items.len() {
                    return Err(WebhookError::Decode(format!(
                        "ArticleCount {} but {} items",
                        count,
                        items.len()
                    )));
                }
            }
            ReplyMessage::News(
                items
                    .into_iter()
                    .map(|item| Article {
                        title: item.title.unwrap_or_default(),
                        description: item.description.unwrap_or_default(),
                        pic_url: item.pic_url.unwrap_or_default(),
                        url: item.url.unwrap_or_default(),
                    })
                    .collect(),
            )
        }
        other => {
            return Err(WebhookError::Decode(format!(
                "unsupported reply type {:?}",
                other.as_str()
            )))
        }
    };

    let mut reply = Reply::new(raw.to_user_name, raw.from_user_name, raw.create_time);
    reply.set_message(msg);
    Ok(reply)
}

fn missing<T>(value: Option<T>, element: &str) -> Result<T> {
    value.ok_or_else(|| WebhookError::Decode(format!("reply is missing <{}>", element)))
}

/// Decode the outer envelope of an encrypted message.
pub fn decode_encrypted(xml: &[u8]) -> Result<EncryptedEnvelope> {
    parse_envelope(xml)
}

/// Streaming writer for `<xml>` envelopes.
struct EnvelopeWriter {
    inner: Writer<Vec<u8>>,
}

impl EnvelopeWriter {
    fn new() -> Result<Self> {
        let mut w = Self {
            inner: Writer::new(Vec::new()),
        };
        w.open(ROOT)?;
        Ok(w)
    }

    fn write(&mut self, event: XmlEvent<'_>) -> Result<()> {
        self.inner
            .write_event(event)
            .map_err(|e| WebhookError::Encode(e.to_string()))
    }

    fn open(&mut self, name: &str) -> Result<()> {
        self.write(XmlEvent::Start(BytesStart::new(name)))
    }

    fn close(&mut self, name: &str) -> Result<()> {
        self.write(XmlEvent::End(BytesEnd::new(name)))
    }

    fn string(&mut self, name: &str, value: &str) -> Result<()> {
        self.open(name)?;
        // A literal "]]>" is split across adjacent sections, which the
        // reader joins back together.
        let mut rest = value;
        while let Some(at) = rest.find("]]>") {
            self.write(XmlEvent::CData(BytesCData::new(&rest[..at + 2])))?;
            rest = &rest[at + 2..];
        }
        self.write(XmlEvent::CData(BytesCData::new(rest)))?;
        self.close(name)
    }

    fn number(&mut self, name: &str, value: impl Display) -> Result<()> {
        self.open(name)?;
        self.write(XmlEvent::Text(BytesText::new(&value.to_string())))?;
        self.close(name)
    }

    fn header(&mut self, to: &str, from: &str, create_time: i64, msg_type: &MsgType) -> Result<()> {
        self.string("ToUserName", to)?;
        self.string("FromUserName", from)?;
        self.number("CreateTime", create_time)?;
        self.string("MsgType", msg_type.as_str())
    }

    fn finish(mut self) -> Result<Vec<u8>> {
        self.close(ROOT)?;
        Ok(self.inner.into_inner())
    }
}

/// Encode a reply. Fails if no message has been set.
pub fn encode_reply(reply: &Reply) -> Result<Vec<u8>> {
    let msg = reply
        .message()
        .ok_or_else(|| WebhookError::Encode("reply has no message set".into()))?;

    let mut w = EnvelopeWriter::new()?;
    w.header(
        &reply.to_user_name,
        &reply.from_user_name,
        reply.create_time,
        &msg.msg_type(),
    )?;

    match msg {
        ReplyMessage::Text { content } => w.string("Content", content)?,
        ReplyMessage::Image { media_id } => {
            w.open("Image")?;
            w.string("MediaId", media_id)?;
            w.close("Image")?;
        }
        ReplyMessage::Voice { media_id } => {
            w.open("Voice")?;
            w.string("MediaId", media_id)?;
            w.close("Voice")?;
        }
        ReplyMessage::Video {
            media_id,
            title,
            description,
        } => {
            w.open("Video")?;
            w.string("MediaId", media_id)?;
            w.string("Title", title)?;
            w.string("Description", description)?;
            w.close("Video")?;
        }
        ReplyMessage::Music(music) => {
            w.open("Music")?;
            w.string("Title", &music.title)?;
            w.string("Description", &music.description)?;
            w.string("MusicUrl", &music.music_url)?;
            w.string("HQMusicUrl", &music.hq_music_url)?;
            w.string("ThumbMediaId", &music.thumb_media_id)?;
            w.close("Music")?;
        }
        ReplyMessage::News(articles) => {
            w.number("ArticleCount", articles.len())?;
            w.open("Articles")?;
            for article in articles {
                w.open("item")?;
                w.string("Title", &article.title)?;
                w.string("Description", &article.description)?;
                w.string("PicUrl", &article.pic_url)?;
                w.string("Url", &article.url)?;
                w.close("item")?;
            }
            w.close("Articles")?;
        }
    }

    w.finish()
}

/// Encode an inbound message in the shape the platform pushes it.
pub fn encode_request(request: &Request) -> Result<Vec<u8>> {
    let h = &request.header;
    let mut w = EnvelopeWriter::new()?;
    w.header(&h.to_user_name, &h.from_user_name, h.create_time, &h.msg_type)?;

    match &request.body {
        RequestBody::Text { content } => w.string("Content", content)?,
        RequestBody::Image { media_id, pic_url } => {
            w.string("PicUrl", pic_url)?;
            w.string("MediaId", media_id)?;
        }
        RequestBody::Voice {
            media_id,
            format,
            recognition,
        } => {
            w.string("MediaId", media_id)?;
            w.string("Format", format)?;
            if let Some(recognition) = recognition {
                w.string("Recognition", recognition)?;
            }
        }
        RequestBody::Video {
            media_id,
            thumb_media_id,
        } => {
            w.string("MediaId", media_id)?;
            w.string("ThumbMediaId", thumb_media_id)?;
        }
        RequestBody::Location { x, y, scale, label } => {
            w.number("Location_X", x)?;
            w.number("Location_Y", y)?;
            w.number("Scale", scale)?;
            w.string("Label", label)?;
        }
        RequestBody::Link {
            title,
            description,
            url,
        } => {
            w.string("Title", title)?;
            w.string("Description", description)?;
            w.string("Url", url)?;
        }
        RequestBody::Event(event) => {
            w.string("Event", event.event.as_str())?;
            w.string("EventKey", &event.event_key)?;
            w.string("Ticket", &event.ticket)?;
            if let Some(latitude) = event.latitude {
                w.number("Latitude", latitude)?;
            }
            if let Some(longitude) = event.longitude {
                w.number("Longitude", longitude)?;
            }
            if let Some(precision) = event.precision {
                w.number("Precision", precision)?;
            }
        }
        RequestBody::Unknown => {}
    }

    if let Some(msg_id) = request.msg_id {
        w.number("MsgId", msg_id)?;
    }

    w.finish()
}

/// Encode the encrypted reply envelope.
pub fn encode_encrypted(
    encrypt: &str,
    msg_signature: &str,
    timestamp: &str,
    nonce: &str,
) -> Result<Vec<u8>> {
    let mut w = EnvelopeWriter::new()?;
    w.string("Encrypt", encrypt)?;
    w.string("MsgSignature", msg_signature)?;
    w.string("TimeStamp", timestamp)?;
    w.string("Nonce", nonce)?;
    w.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_str(bytes: &[u8]) -> &str {
        std::str::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_decode_text_message() {
        let xml = "<xml><ToUserName><![CDATA[gh_account]]></ToUserName>\
            <FromUserName><![CDATA[follower]]></FromUserName>\
            <CreateTime>1348831860</CreateTime>\
            <MsgType><![CDATA[text]]></MsgType>\
            <Content><![CDATA[this is a test]]></Content>\
            <MsgId>1234567890123456</MsgId></xml>";
        let req = decode_request(xml.as_bytes()).unwrap();
        assert_eq!(req.header.to_user_name, "gh_account");
        assert_eq!(req.header.from_user_name, "follower");
        assert_eq!(req.header.create_time, 1348831860);
        assert_eq!(req.msg_id, Some(1234567890123456));
        assert_eq!(
            req.body,
            RequestBody::Text {
                content: "this is a test".into()
            }
        );
    }

    #[test]
    fn test_decode_subscribe_event() {
        let xml = "<xml><ToUserName><![CDATA[gh_account]]></ToUserName>\
            <FromUserName><![CDATA[follower]]></FromUserName>\
            <CreateTime>123456789</CreateTime>\
            <MsgType><![CDATA[event]]></MsgType>\
            <Event><![CDATA[subscribe]]></Event></xml>";
        let req = decode_request(xml.as_bytes()).unwrap();
        let event = req.event().unwrap();
        assert_eq!(event.event, EventType::Subscribe);
        assert_eq!(event.event.as_str(), "subscribe");
        assert_eq!(event.event_key, "");
        assert_eq!(event.ticket, "");
        assert_eq!(req.msg_id, None);
    }

    #[test]
    fn test_decode_scan_event() {
        let xml = "<xml><ToUserName><![CDATA[gh_account]]></ToUserName>\
            <FromUserName><![CDATA[follower]]></FromUserName>\
            <CreateTime>123456789</CreateTime>\
            <MsgType><![CDATA[event]]></MsgType>\
            <Event><![CDATA[SCAN]]></Event>\
            <EventKey><![CDATA[SCENE_VALUE]]></EventKey>\
            <Ticket><![CDATA[TICKET]]></Ticket></xml>";
        let event = decode_request(xml.as_bytes()).unwrap().event().cloned().unwrap();
        assert_eq!(event.event, EventType::Scan);
        assert_eq!(event.event_key, "SCENE_VALUE");
        assert_eq!(event.ticket, "TICKET");
    }

    #[test]
    fn test_decode_location_message() {
        let xml = "<xml><ToUserName><![CDATA[gh_account]]></ToUserName>\
            <FromUserName><![CDATA[follower]]></FromUserName>\
            <CreateTime>1351776360</CreateTime>\
            <MsgType><![CDATA[location]]></MsgType>\
            <Location_X>23.134521</Location_X>\
            <Location_Y>113.358803</Location_Y>\
            <Scale>20</Scale>\
            <Label><![CDATA[somewhere]]></Label>\
            <MsgId>1234567890123456</MsgId></xml>";
        let req = decode_request(xml.as_bytes()).unwrap();
        assert_eq!(
            req.body,
            RequestBody::Location {
                x: 23.134521,
                y: 113.358803,
                scale: 20,
                label: "somewhere".into(),
            }
        );
    }

    #[test]
    fn test_unknown_kind_is_not_an_error() {
        let xml = "<xml><ToUserName><![CDATA[a]]></ToUserName>\
            <FromUserName><![CDATA[b]]></FromUserName>\
            <CreateTime>1</CreateTime>\
            <MsgType><![CDATA[shortvideo]]></MsgType>\
            <MediaId><![CDATA[m]]></MediaId></xml>";
        let req = decode_request(xml.as_bytes()).unwrap();
        assert_eq!(req.body, RequestBody::Unknown);
        assert_eq!(req.msg_type(), &MsgType::Unknown("shortvideo".into()));
    }

    #[test]
    fn test_malformed_xml_fails() {
        for xml in ["not xml at all", "<xml><ToUserName>a</ToUserName>", ""] {
            let err = decode_request(xml.as_bytes()).unwrap_err();
            assert!(matches!(err, WebhookError::Decode(_)), "{:?}", xml);
        }
    }

    #[test]
    fn test_missing_header_fails() {
        let xml = "<xml><ToUserName>a</ToUserName><MsgType>text</MsgType></xml>";
        assert!(matches!(
            decode_request(xml.as_bytes()),
            Err(WebhookError::Decode(_))
        ));
    }

    #[test]
    fn test_request_round_trip_all_variants() {
        let mut location_event = Event::new(EventType::Location);
        location_event.latitude = Some(23.137466);
        location_event.longitude = Some(113.352425);
        location_event.precision = Some(119.385040);

        let mut scan = Event::new(EventType::Scan);
        scan.event_key = "123123".into();
        scan.ticket = "TICKET".into();

        let bodies = vec![
            RequestBody::Text {
                content: " padded text ".into(),
            },
            RequestBody::Image {
                media_id: "media".into(),
                pic_url: "http://example.com/p.jpg".into(),
            },
            RequestBody::Voice {
                media_id: "media".into(),
                format: "amr".into(),
                recognition: Some("hello".into()),
            },
            RequestBody::Video {
                media_id: "media".into(),
                thumb_media_id: "thumb".into(),
            },
            RequestBody::Location {
                x: -23.5,
                y: 113.25,
                scale: 15,
                label: "label".into(),
            },
            RequestBody::Link {
                title: "title".into(),
                description: "a < b & c".into(),
                url: "http://example.com/?a=1&b=2".into(),
            },
            RequestBody::Event(scan),
            RequestBody::Event(location_event),
        ];

        for body in bodies {
            let req = Request::new("gh_account", "follower", 1_700_000_000, body)
                .with_msg_id(42);
            let xml = encode_request(&req).unwrap();
            assert_eq!(decode_request(&xml).unwrap(), req, "{}", as_str(&xml));
        }

        let mut unknown = Request::new("a", "b", 5, RequestBody::Unknown);
        unknown.header.msg_type = MsgType::Unknown("miniprogrampage".into());
        let xml = encode_request(&unknown).unwrap();
        assert_eq!(decode_request(&xml).unwrap(), unknown);
    }

    fn sample_replies() -> Vec<Reply> {
        let messages = vec![
            ReplyMessage::Text {
                content: "hello".into(),
            },
            ReplyMessage::Image {
                media_id: "image-id".into(),
            },
            ReplyMessage::Voice {
                media_id: "voice-id".into(),
            },
            ReplyMessage::Video {
                media_id: "video-id".into(),
                title: "title".into(),
                description: "desc".into(),
            },
            ReplyMessage::Music(Music {
                title: "song".into(),
                description: "desc".into(),
                music_url: "http://example.com/a.mp3".into(),
                hq_music_url: "http://example.com/a-hq.mp3".into(),
                thumb_media_id: "thumb".into(),
            }),
            ReplyMessage::News(vec![
                Article::new("first", "one", "http://example.com/1.jpg", "http://example.com/1"),
                Article::new("second", "two", "http://example.com/2.jpg", "http://example.com/2"),
            ]),
        ];
        messages
            .into_iter()
            .map(|msg| {
                let mut reply = Reply::new("follower", "gh_account", 1_700_000_000);
                reply.set_message(msg);
                reply
            })
            .collect()
    }

    #[test]
    fn test_reply_round_trip_all_variants() {
        for reply in sample_replies() {
            let xml = encode_reply(&reply).unwrap();
            assert_eq!(decode_reply(&xml).unwrap(), reply, "{}", as_str(&xml));
        }
    }

    #[test]
    fn test_text_reply_shape() {
        let req = Request::new(
            "gh_account",
            "follower",
            1,
            RequestBody::Text {
                content: "hi".into(),
            },
        );
        let mut reply = Reply::to_request(&req);
        reply.text("hello");
        let xml = encode_reply(&reply).unwrap();
        let text = as_str(&xml);
        assert!(text.starts_with("<xml><ToUserName><![CDATA[follower]]></ToUserName>"));
        assert!(text.contains("<FromUserName><![CDATA[gh_account]]></FromUserName>"));
        assert!(text.contains("<MsgType><![CDATA[text]]></MsgType>"));
        assert!(text.contains("<Content><![CDATA[hello]]></Content>"));

        let decoded = decode_reply(&xml).unwrap();
        assert_eq!(
            decoded.message(),
            Some(&ReplyMessage::Text {
                content: "hello".into()
            })
        );
    }

    #[test]
    fn test_image_reply_nests_media_id() {
        let mut reply = Reply::new("a", "b", 1);
        reply.image("media-1");
        let xml = encode_reply(&reply).unwrap();
        assert!(as_str(&xml).contains("<Image><MediaId><![CDATA[media-1]]></MediaId></Image>"));
    }

    #[test]
    fn test_news_reply_count_and_order() {
        let reply = sample_replies().pop().unwrap();
        let xml = encode_reply(&reply).unwrap();
        let text = as_str(&xml);
        assert!(text.contains("<ArticleCount>2</ArticleCount>"));
        assert_eq!(text.matches("<item>").count(), 2);
        let first = text.find("<![CDATA[first]]>").unwrap();
        let second = text.find("<![CDATA[second]]>").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_only_last_variant_encoded() {
        let mut reply = Reply::new("a", "b", 1);
        reply.video("v", "t", "d").text("final");
        let text = String::from_utf8(encode_reply(&reply).unwrap()).unwrap();
        assert!(!text.contains("<Video>"));
        assert!(text.contains("<Content><![CDATA[final]]></Content>"));
    }

    #[test]
    fn test_empty_reply_fails() {
        let reply = Reply::new("a", "b", 1);
        assert!(matches!(encode_reply(&reply), Err(WebhookError::Encode(_))));
    }

    #[test]
    fn test_cdata_terminator_in_content() {
        let mut reply = Reply::new("a", "b", 1);
        reply.text("tricky ]]> content");
        let xml = encode_reply(&reply).unwrap();
        assert_eq!(decode_reply(&xml).unwrap(), reply);

        reply.text("  x ]]> y  ");
        let xml = encode_reply(&reply).unwrap();
        let text = String::from_utf8(xml.clone()).unwrap();
        assert!(text.contains("<Content><![CDATA[  x ]]]]><![CDATA[> y  ]]></Content>"));
        assert_eq!(decode_reply(&xml).unwrap(), reply);
    }

    #[test]
    fn test_surrounding_whitespace_survives() {
        let mut reply = Reply::new("a", "b", 1);
        reply.text("  padded  ");
        let xml = encode_reply(&reply).unwrap();
        assert_eq!(decode_reply(&xml).unwrap(), reply);
    }

    #[test]
    fn test_news_count_mismatch_rejected() {
        let xml = "<xml><ToUserName>a</ToUserName><FromUserName>b</FromUserName>\
            <CreateTime>1</CreateTime><MsgType>news</MsgType>\
            <ArticleCount>3</ArticleCount>\
            <Articles><item><Title>x</Title></item></Articles></xml>";
        assert!(matches!(
            decode_reply(xml.as_bytes()),
            Err(WebhookError::Decode(_))
        ));
    }

    #[test]
    fn test_encrypted_envelope() {
        let inbound = "<xml><ToUserName><![CDATA[gh_account]]></ToUserName>\
            <Encrypt><![CDATA[c2VjcmV0]]></Encrypt></xml>";
        let env = decode_encrypted(inbound.as_bytes()).unwrap();
        assert_eq!(env.to_user_name, "gh_account");
        assert_eq!(env.encrypt, "c2VjcmV0");
        assert_eq!(env.msg_signature, None);

        let xml = encode_encrypted("c2VjcmV0", "sig", "1409659813", "nonce").unwrap();
        let env = decode_encrypted(&xml).unwrap();
        assert_eq!(env.encrypt, "c2VjcmV0");
        assert_eq!(env.msg_signature.as_deref(), Some("sig"));
        assert_eq!(env.time_stamp.as_deref(), Some("1409659813"));
        assert_eq!(env.nonce.as_deref(), Some("nonce"));
    }

    #[test]
    fn test_encrypted_envelope_requires_payload() {
        let xml = "<xml><ToUserName>gh_account</ToUserName></xml>";
        assert!(decode_encrypted(xml.as_bytes()).is_err());
    }
}
