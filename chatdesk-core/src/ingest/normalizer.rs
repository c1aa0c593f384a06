// File: src/ingest/normalizer.rs
//
// Maps the protocol's tagged content union onto the canonical
// `MessageEnvelope`. The mapping is deterministic: first match by content
// tag wins, and unmatched tags still yield an (empty) envelope so no
// inbound event is ever silently dropped.

use chatdesk_common::models::{MediaKind, MessageEnvelope};

use crate::sessions::{GROUP_ADDRESS_SUFFIX, RawContent, RawMessage, USER_ADDRESS_SUFFIX};

/// Strips the network suffix from a raw address, yielding the canonical
/// contact number and whether the address was a group.
pub fn parse_address(raw: &str) -> (String, bool) {
    if let Some(number) = raw.strip_suffix(GROUP_ADDRESS_SUFFIX) {
        (number.to_string(), true)
    } else if let Some(number) = raw.strip_suffix(USER_ADDRESS_SUFFIX) {
        (number.to_string(), false)
    } else {
        (raw.to_string(), false)
    }
}

fn map_content(content: &RawContent) -> (Option<String>, Option<MediaKind>) {
    match content {
        RawContent::Conversation(text) => (Some(text.clone()), Some(MediaKind::Chat)),
        RawContent::ExtendedText(text) => (Some(text.clone()), Some(MediaKind::Chat)),
        RawContent::Image { caption } => (caption.clone(), Some(MediaKind::Image)),
        RawContent::Video { caption } => (caption.clone(), Some(MediaKind::Video)),
        RawContent::Audio { ptt: true } => (None, Some(MediaKind::Ptt)),
        RawContent::Audio { ptt: false } => (None, Some(MediaKind::Audio)),
        RawContent::Document { filename } => (filename.clone(), Some(MediaKind::Document)),
        RawContent::Sticker => (None, Some(MediaKind::Sticker)),
        RawContent::Location { lat, lon } => {
            (Some(format!("{},{}", lat, lon)), Some(MediaKind::Location))
        }
        RawContent::ContactCard { display_name } => (display_name.clone(), Some(MediaKind::Vcard)),
        RawContent::Unknown => (None, None),
    }
}

/// Converts one raw protocol message into the canonical envelope.
pub fn normalize(raw: &RawMessage) -> MessageEnvelope {
    let (number, is_group) = parse_address(&raw.remote_address);
    let (body, media_kind) = map_content(&raw.content);

    MessageEnvelope {
        external_id: raw.external_id.clone(),
        remote_address: number,
        is_group,
        from_self: raw.from_self,
        push_name: raw.push_name.clone(),
        body,
        media_kind,
        timestamp: raw.timestamp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn raw(content: RawContent) -> RawMessage {
        RawMessage {
            external_id: "ABC123".into(),
            remote_address: "5511999990000@s.whatsapp.net".into(),
            from_self: false,
            push_name: Some("Ana".into()),
            timestamp: Utc::now(),
            content,
        }
    }

    #[test]
    fn parses_individual_address() {
        let (number, is_group) = parse_address("5511999990000@s.whatsapp.net");
        assert_eq!(number, "5511999990000");
        assert!(!is_group);
    }

    #[test]
    fn parses_group_address() {
        let (number, is_group) = parse_address("123456789-987654@g.us");
        assert_eq!(number, "123456789-987654");
        assert!(is_group);
    }

    #[test]
    fn plain_conversation_maps_to_chat() {
        let env = normalize(&raw(RawContent::Conversation("Hi".into())));
        assert_eq!(env.body.as_deref(), Some("Hi"));
        assert_eq!(env.media_kind, Some(MediaKind::Chat));
    }

    #[test]
    fn extended_text_maps_to_chat() {
        let env = normalize(&raw(RawContent::ExtendedText("quoted".into())));
        assert_eq!(env.body.as_deref(), Some("quoted"));
        assert_eq!(env.media_kind, Some(MediaKind::Chat));
    }

    #[test]
    fn captionless_image_has_null_body() {
        let env = normalize(&raw(RawContent::Image { caption: None }));
        assert_eq!(env.body, None);
        assert_eq!(env.media_kind, Some(MediaKind::Image));
    }

    #[test]
    fn audio_splits_on_ptt_flag() {
        let env = normalize(&raw(RawContent::Audio { ptt: true }));
        assert_eq!(env.media_kind, Some(MediaKind::Ptt));
        assert_eq!(env.body, None);

        let env = normalize(&raw(RawContent::Audio { ptt: false }));
        assert_eq!(env.media_kind, Some(MediaKind::Audio));
    }

    #[test]
    fn location_renders_lat_lon_body() {
        let env = normalize(&raw(RawContent::Location {
            lat: -23.55,
            lon: -46.63,
        }));
        assert_eq!(env.body.as_deref(), Some("-23.55,-46.63"));
        assert_eq!(env.media_kind, Some(MediaKind::Location));
    }

    #[test]
    fn vcard_uses_display_name() {
        let env = normalize(&raw(RawContent::ContactCard {
            display_name: Some("Bob".into()),
        }));
        assert_eq!(env.body.as_deref(), Some("Bob"));
        assert_eq!(env.media_kind, Some(MediaKind::Vcard));
    }

    #[test]
    fn unknown_content_is_recorded_empty_not_dropped() {
        let env = normalize(&raw(RawContent::Unknown));
        assert_eq!(env.body, None);
        assert_eq!(env.media_kind, None);
    }
}
