//! Version-2 ANCS parsing: a single TLV-encoded buffer from the Ringly ANCS-v2 characteristic.
//! Unlike v1, no fragment reassembly is needed; the whole notification arrives in one
//! characteristic value, prefaced by a short-message declaration of how many attributes of each
//! kind to expect (see [`crate::message::Message::AncsV2DescriptorWritten`]).
//!
//! Grounded on `RLYANCSV2Parser.h`'s combined `parseData:withNotificationAttributeCount:
//! applicationAttributeCount:error:` entry point: both attribute groups are validated against
//! caller-declared counts in one pass, rather than as two independently-parsed buffers.

use crate::ancs::{AncsCategory, AncsDate, AncsNotification, AncsVersion};
use crate::error::AncsV2Error;

const NOTIFICATION_ATTRIBUTES_COMMAND_ID: u8 = 0;
const APPLICATION_ATTRIBUTES_COMMAND_ID: u8 = 1;

const ATTR_APP_ID: u8 = 0;
const ATTR_TITLE: u8 = 1;
const ATTR_MESSAGE: u8 = 3;
const ATTR_DATE: u8 = 5;

/// Parses a complete v2 notification, given the attribute counts declared by the preceding
/// descriptor message.
///
/// Layout: `[notif_command_id, (notification_attribute_count × TLV), app_command_id,
/// (application_attribute_count × TLV)]`, where each TLV is `[attr_id:1, len:2 LE, value:len]`.
/// Unlike v1, there is no inline category/flags byte; `category` is not carried on the wire for
/// v2 and is reported as `AncsCategory::Other`, and `flags` is always `None` (the ANCS flags
/// bitfield is a v1-only concept). The buffer must be consumed exactly: reading fewer or more
/// TLVs than declared, or leaving trailing bytes, is `IncorrectDataSize`. Title and date are
/// mandatory attributes; everything else is optional. Application attributes are structurally
/// validated (count and length) but not otherwise reflected in the returned notification, since
/// `AncsNotification` only tracks the app identifier already carried by the
/// notification-attributes section.
pub fn parse_notification(
    buffer: &[u8],
    notification_attribute_count: usize,
    application_attribute_count: usize,
) -> Result<AncsNotification, AncsV2Error> {
    let mut cursor = buffer;

    let command_id = take_u8(&mut cursor).ok_or(AncsV2Error::IncorrectDataSize)?;
    if command_id != NOTIFICATION_ATTRIBUTES_COMMAND_ID {
        return Err(AncsV2Error::InvalidNotificationAttributesCommandIdentifier);
    }

    let mut title = None;
    let mut message = None;
    let mut app_id = String::new();
    let mut date = None;

    for _ in 0..notification_attribute_count {
        let (attr_id, value) = take_tlv(&mut cursor).ok_or(AncsV2Error::IncorrectDataSize)?;
        match attr_id {
            ATTR_APP_ID => app_id = String::from_utf8_lossy(value).into_owned(),
            ATTR_TITLE => title = Some(String::from_utf8_lossy(value).into_owned()),
            ATTR_MESSAGE => message = Some(String::from_utf8_lossy(value).into_owned()),
            ATTR_DATE => date = Some(parse_date_attribute(value).ok_or(AncsV2Error::IncorrectDataSize)?),
            _ => {} // unknown attribute, ignored
        }
    }

    let app_command_id = take_u8(&mut cursor).ok_or(AncsV2Error::IncorrectDataSize)?;
    if app_command_id != APPLICATION_ATTRIBUTES_COMMAND_ID {
        return Err(AncsV2Error::InvalidApplicationAttributesCommandIdentifier);
    }
    for _ in 0..application_attribute_count {
        take_tlv(&mut cursor).ok_or(AncsV2Error::IncorrectDataSize)?;
    }

    if !cursor.is_empty() {
        return Err(AncsV2Error::IncorrectDataSize);
    }

    let title = title.ok_or(AncsV2Error::MissingTitle)?;
    let date = date.ok_or(AncsV2Error::MissingDate)?;

    Ok(AncsNotification {
        version: AncsVersion::V2,
        category: AncsCategory::Other,
        flags: None,
        title,
        message,
        app_id,
        date: Some(date),
    })
}

/// The ANCS date attribute is a `YYYYMMDD'T'HHMMSS` ASCII timestamp per Apple's spec.
fn parse_date_attribute(value: &[u8]) -> Option<AncsDate> {
    let s = std::str::from_utf8(value).ok()?;
    if s.len() < 15 {
        return None;
    }
    let year: u16 = s.get(0..4)?.parse().ok()?;
    let month: u8 = s.get(4..6)?.parse().ok()?;
    let day: u8 = s.get(6..8)?.parse().ok()?;
    // s[8] is the 'T' separator.
    let hour: u8 = s.get(9..11)?.parse().ok()?;
    let minute: u8 = s.get(11..13)?.parse().ok()?;
    Some(AncsDate {
        year,
        month,
        day,
        hour,
        minute,
    })
}

fn take_u8(cursor: &mut &[u8]) -> Option<u8> {
    let (&b, rest) = cursor.split_first()?;
    *cursor = rest;
    Some(b)
}

fn take_u16_le(cursor: &mut &[u8]) -> Option<u16> {
    if cursor.len() < 2 {
        return None;
    }
    let v = u16::from_le_bytes([cursor[0], cursor[1]]);
    *cursor = &cursor[2..];
    Some(v)
}

fn take_n<'a>(cursor: &mut &'a [u8], n: usize) -> Option<&'a [u8]> {
    if cursor.len() < n {
        return None;
    }
    let (value, rest) = cursor.split_at(n);
    *cursor = rest;
    Some(value)
}

fn take_tlv<'a>(cursor: &mut &'a [u8]) -> Option<(u8, &'a [u8])> {
    let attr_id = take_u8(cursor)?;
    let len = take_u16_le(cursor)?;
    let value = take_n(cursor, len as usize)?;
    Some((attr_id, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attribute(id: u8, value: &[u8]) -> Vec<u8> {
        let mut out = vec![id];
        out.extend_from_slice(&(value.len() as u16).to_le_bytes());
        out.extend_from_slice(value);
        out
    }

    fn minimal_buffer() -> Vec<u8> {
        let mut buf = vec![NOTIFICATION_ATTRIBUTES_COMMAND_ID];
        buf.extend(attribute(ATTR_TITLE, b"Boss"));
        buf.extend(attribute(ATTR_MESSAGE, b"Where are you"));
        buf.extend(attribute(ATTR_DATE, b"20260728T120000"));
        buf.push(APPLICATION_ATTRIBUTES_COMMAND_ID);
        buf
    }

    #[test]
    fn parses_a_minimal_notification() {
        let buf = minimal_buffer();
        let notif = parse_notification(&buf, 3, 0).unwrap();
        assert_eq!(notif.category, AncsCategory::Other);
        assert!(notif.flags.is_none());
        assert_eq!(notif.title, "Boss");
        assert_eq!(notif.message.as_deref(), Some("Where are you"));
        assert_eq!(
            notif.date,
            Some(AncsDate {
                year: 2026,
                month: 7,
                day: 28,
                hour: 12,
                minute: 0,
            })
        );
    }

    #[test]
    fn attribute_order_does_not_affect_the_result() {
        let mut buf = vec![NOTIFICATION_ATTRIBUTES_COMMAND_ID];
        buf.extend(attribute(ATTR_DATE, b"20260728T120000"));
        buf.extend(attribute(ATTR_MESSAGE, b"Where are you"));
        buf.extend(attribute(ATTR_TITLE, b"Boss"));
        buf.push(APPLICATION_ATTRIBUTES_COMMAND_ID);

        let notif = parse_notification(&buf, 3, 0).unwrap();
        assert_eq!(notif.title, "Boss");
        assert_eq!(notif.message.as_deref(), Some("Where are you"));
    }

    #[test]
    fn missing_title_is_an_error() {
        let mut buf = vec![NOTIFICATION_ATTRIBUTES_COMMAND_ID];
        buf.extend(attribute(ATTR_DATE, b"20260728T120000"));
        buf.push(APPLICATION_ATTRIBUTES_COMMAND_ID);
        assert_eq!(
            parse_notification(&buf, 1, 0),
            Err(AncsV2Error::MissingTitle)
        );
    }

    #[test]
    fn missing_date_is_an_error() {
        let mut buf = vec![NOTIFICATION_ATTRIBUTES_COMMAND_ID];
        buf.extend(attribute(ATTR_TITLE, b"Boss"));
        buf.push(APPLICATION_ATTRIBUTES_COMMAND_ID);
        assert_eq!(
            parse_notification(&buf, 1, 0),
            Err(AncsV2Error::MissingDate)
        );
    }

    #[test]
    fn wrong_notification_command_identifier_is_rejected() {
        let buf = vec![9, 0, 0, APPLICATION_ATTRIBUTES_COMMAND_ID];
        assert_eq!(
            parse_notification(&buf, 0, 0),
            Err(AncsV2Error::InvalidNotificationAttributesCommandIdentifier)
        );
    }

    #[test]
    fn wrong_application_command_identifier_is_rejected() {
        let buf = vec![NOTIFICATION_ATTRIBUTES_COMMAND_ID, 9];
        assert_eq!(
            parse_notification(&buf, 0, 0),
            Err(AncsV2Error::InvalidApplicationAttributesCommandIdentifier)
        );
    }

    #[test]
    fn declared_count_mismatch_is_incorrect_data_size() {
        // Buffer has one TLV but caller declares two are expected.
        let mut buf = vec![NOTIFICATION_ATTRIBUTES_COMMAND_ID];
        buf.extend(attribute(ATTR_TITLE, b"Boss"));
        buf.push(APPLICATION_ATTRIBUTES_COMMAND_ID);
        assert_eq!(
            parse_notification(&buf, 2, 0),
            Err(AncsV2Error::IncorrectDataSize)
        );
    }

    #[test]
    fn trailing_bytes_beyond_declared_counts_are_incorrect_data_size() {
        let mut buf = minimal_buffer();
        buf.push(0xFF); // stray trailing byte
        assert_eq!(
            parse_notification(&buf, 3, 0),
            Err(AncsV2Error::IncorrectDataSize)
        );
    }

    #[test]
    fn truncated_buffer_is_incorrect_data_size() {
        let buf = vec![NOTIFICATION_ATTRIBUTES_COMMAND_ID];
        assert_eq!(
            parse_notification(&buf, 0, 0),
            Err(AncsV2Error::IncorrectDataSize)
        );
    }
}
