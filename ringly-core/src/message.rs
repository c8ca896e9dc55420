//! Inbound short-message parsing: the peripheral reports state changes and
//! asynchronous events on the Ringly message characteristic as small tagged buffers, distinct
//! from the outbound command encoding in [`crate::commands`]. Every message starts with a type
//! byte; everything after it is that message's payload, mostly ASCII digits or CSV ASCII
//! numbers rather than raw binary.
//!
//! Grounded on the full callback surface of `RLYPeripheralObserver.h` and the message-type table
//! in `RLYPeripheralEnumerations+Internal.h`: each variant here corresponds to one delegate
//! method the original peripheral object would have invoked directly, and each type byte is the
//! exact (non-sequential) firmware value from that table, not a renumbering. Here, decoding a
//! `Message` is a pure function; dispatching the resulting variant to observers is the caller's
//! job (`Peripheral::handle_message`), matching the "keep the codec pure, keep delivery at the
//! edge" split already used by [`crate::commands`].

use crate::types::{Color, ShutdownReason, Vibration};

const TYPE_ANCS_V2_DESCRIPTOR: u8 = 4;
const TYPE_TIMER_TRIGGERED: u8 = 5;
const TYPE_APPLICATION_SETTING: u8 = 6;
const TYPE_CONTACT_SETTING: u8 = 7;
const TYPE_APPLICATION_ERROR: u8 = 8;
const TYPE_GPIO_PIN_REPORT: u8 = 9;
const TYPE_KEYFRAME_CALLBACK: u8 = 11;
const TYPE_TAP: u8 = 48;
const TYPE_SLEEP_SHUTDOWN: u8 = 49;
const TYPE_LOW_BATTERY_SHUTDOWN: u8 = 50;
const TYPE_BONDED: u8 = 51;
const TYPE_CLEAR_BOND_CONFIRMATION: u8 = 57;

/// Marker bytes distinguishing the three (or, following the fuller observer surface, four) wire
/// shapes that both application-setting and contact-setting confirmations can take. The firmware
/// headers document only the shapes themselves ("confirmed", "deleted", "cleared", and — per the
/// richer Objective-C observer protocol — "failed"), not concrete byte values for telling them
/// apart, so this is a deliberate choice rather than a recovered constant: an empty payload is
/// unambiguous for "deleted", and `0xFF`/`0xFE` lead bytes are outside the valid fragment-index
/// range `Color` and `Vibration` would otherwise occupy, so they can't collide with a real
/// "confirmed" payload.
const SETTING_CLEARED_MARKER: u8 = 0xFF;
const SETTING_FAILED_MARKER: u8 = 0xFE;

/// A single confirmation shape shared by both application-setting and contact-setting
/// confirmations: fragment index, color, and (for application settings only) vibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SettingConfirmation {
    pub fragment: u8,
    pub color: Color,
    pub vibration: Option<Vibration>,
}

/// The decoded form of one inbound short message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// The user tapped the peripheral; `count` is the number of taps, read as ASCII digits.
    ReceivedTaps { count: u32 },
    ShuttingDown(ShutdownReason),
    BondComplete,
    /// A new ANCS v2 notification is ready; the two counts tell the caller how many TLV
    /// attributes of each kind to expect from the subsequent notification-attributes read (see
    /// [`crate::ancs_v2::parse_notification`]).
    AncsV2DescriptorWritten {
        notification_attribute_count: u32,
        application_attribute_count: u32,
    },
    TimerTriggered,
    KeyframeCompleted,
    ApplicationSettingConfirmed(SettingConfirmation),
    ApplicationSettingDeleted,
    ApplicationSettingsCleared,
    ApplicationSettingFailed { fragment: u8 },
    ContactSettingConfirmed(SettingConfirmation),
    ContactSettingDeleted,
    ContactSettingsCleared,
    ContactSettingFailed { fragment: u8 },
    ClearBondConfirmed,
    /// The peripheral reset after an application error; the error code, line number, and
    /// filename live on a separate characteristic and are not part of this message's payload.
    ApplicationErrorReset,
    GpioPinReport { pin: u8, level: bool },
    /// A message type byte the core doesn't recognize. Carries the raw payload through
    /// unmodified rather than discarding it, so a caller on a newer firmware revision can still
    /// inspect or log it.
    Unsupported { message_type: u8, payload: Vec<u8> },
}

impl Message {
    /// Decodes one message from `[type_byte, payload...]`. A malformed or too-short payload for
    /// a recognized type still decodes, falling back to [`Message::Unsupported`], rather than
    /// erroring: the wire protocol has no way to signal "that message was corrupt," so treating
    /// it as unknown is the closest honest answer.
    pub fn decode(bytes: &[u8]) -> Option<Message> {
        let (&message_type, payload) = bytes.split_first()?;
        Some(Self::decode_known(message_type, payload).unwrap_or_else(|| Message::Unsupported {
            message_type,
            payload: payload.to_vec(),
        }))
    }

    fn decode_known(message_type: u8, payload: &[u8]) -> Option<Message> {
        match message_type {
            TYPE_TAP => Some(Message::ReceivedTaps {
                count: parse_ascii_decimal(payload)?,
            }),
            TYPE_SLEEP_SHUTDOWN => Some(Message::ShuttingDown(ShutdownReason::Idle)),
            TYPE_LOW_BATTERY_SHUTDOWN => Some(Message::ShuttingDown(ShutdownReason::Battery)),
            TYPE_BONDED => Some(Message::BondComplete),
            TYPE_ANCS_V2_DESCRIPTOR => {
                let text = std::str::from_utf8(payload).ok()?;
                let (notif, app) = text.split_once(',')?;
                Some(Message::AncsV2DescriptorWritten {
                    notification_attribute_count: parse_ascii_decimal(notif.as_bytes())?,
                    application_attribute_count: parse_ascii_decimal(app.as_bytes())?,
                })
            }
            TYPE_TIMER_TRIGGERED => Some(Message::TimerTriggered),
            TYPE_KEYFRAME_CALLBACK => Some(Message::KeyframeCompleted),
            TYPE_APPLICATION_SETTING => decode_setting(payload, true, SettingShapes {
                confirmed: Message::ApplicationSettingConfirmed,
                deleted: Message::ApplicationSettingDeleted,
                cleared: Message::ApplicationSettingsCleared,
                failed: |fragment| Message::ApplicationSettingFailed { fragment },
            }),
            TYPE_CONTACT_SETTING => decode_setting(payload, false, SettingShapes {
                confirmed: Message::ContactSettingConfirmed,
                deleted: Message::ContactSettingDeleted,
                cleared: Message::ContactSettingsCleared,
                failed: |fragment| Message::ContactSettingFailed { fragment },
            }),
            TYPE_CLEAR_BOND_CONFIRMATION => Some(Message::ClearBondConfirmed),
            TYPE_APPLICATION_ERROR => Some(Message::ApplicationErrorReset),
            TYPE_GPIO_PIN_REPORT => {
                if payload.len() < 2 {
                    return None;
                }
                Some(Message::GpioPinReport {
                    pin: payload[0],
                    level: payload[1] != 0,
                })
            }
            _ => None,
        }
    }
}

struct SettingShapes<C, F> {
    confirmed: C,
    deleted: Message,
    cleared: Message,
    failed: F,
}

fn decode_setting<C, F>(payload: &[u8], has_vibration: bool, shapes: SettingShapes<C, F>) -> Option<Message>
where
    C: FnOnce(SettingConfirmation) -> Message,
    F: FnOnce(u8) -> Message,
{
    match payload {
        [] => Some(shapes.deleted),
        [marker] if *marker == SETTING_CLEARED_MARKER => Some(shapes.cleared),
        [marker, fragment] if *marker == SETTING_FAILED_MARKER => Some((shapes.failed)(*fragment)),
        _ => decode_setting_confirmation(payload, has_vibration).map(shapes.confirmed),
    }
}

fn decode_setting_confirmation(payload: &[u8], has_vibration: bool) -> Option<SettingConfirmation> {
    if payload.len() < 4 {
        return None;
    }
    let fragment = payload[0];
    let color = Color::new(payload[1], payload[2], payload[3]);
    let vibration = if has_vibration {
        Some(Vibration::from_wire(*payload.get(4)?)?)
    } else {
        None
    };
    Some(SettingConfirmation {
        fragment,
        color,
        vibration,
    })
}

/// Parses a non-empty run of ASCII digit bytes (`b'0'..=b'9'`) as an unsigned decimal number.
fn parse_ascii_decimal(bytes: &[u8]) -> Option<u32> {
    if bytes.is_empty() {
        return None;
    }
    let mut value: u32 = 0;
    for &b in bytes {
        if !b.is_ascii_digit() {
            return None;
        }
        value = value.checked_mul(10)?.checked_add((b - b'0') as u32)?;
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_tap_count_from_ascii_digit() {
        // Scenario 2: [48, '3'] -> received_taps(count = 3).
        let msg = Message::decode(&[TYPE_TAP, b'3']).unwrap();
        assert_eq!(msg, Message::ReceivedTaps { count: 3 });
    }

    #[test]
    fn decodes_multi_digit_tap_count() {
        let msg = Message::decode(&[TYPE_TAP, b'1', b'2']).unwrap();
        assert_eq!(msg, Message::ReceivedTaps { count: 12 });
    }

    #[test]
    fn sleep_and_battery_shutdown_are_distinct_type_bytes() {
        assert_eq!(
            Message::decode(&[TYPE_SLEEP_SHUTDOWN]).unwrap(),
            Message::ShuttingDown(ShutdownReason::Idle)
        );
        assert_eq!(
            Message::decode(&[TYPE_LOW_BATTERY_SHUTDOWN]).unwrap(),
            Message::ShuttingDown(ShutdownReason::Battery)
        );
    }

    #[test]
    fn decodes_ancs_v2_descriptor_csv() {
        let msg = Message::decode(&[TYPE_ANCS_V2_DESCRIPTOR, b'2', b',', b'1']).unwrap();
        assert_eq!(
            msg,
            Message::AncsV2DescriptorWritten {
                notification_attribute_count: 2,
                application_attribute_count: 1,
            }
        );
    }

    #[test]
    fn decodes_application_setting_confirmation_with_vibration() {
        let bytes = [
            TYPE_APPLICATION_SETTING,
            2,   // fragment
            10, 20, 30, // color
            1,   // vibration = OnePulse
        ];
        let msg = Message::decode(&bytes).unwrap();
        assert_eq!(
            msg,
            Message::ApplicationSettingConfirmed(SettingConfirmation {
                fragment: 2,
                color: Color::new(10, 20, 30),
                vibration: Some(Vibration::OnePulse),
            })
        );
    }

    #[test]
    fn decodes_application_setting_deleted_as_empty_payload() {
        let msg = Message::decode(&[TYPE_APPLICATION_SETTING]).unwrap();
        assert_eq!(msg, Message::ApplicationSettingDeleted);
    }

    #[test]
    fn decodes_application_settings_cleared_marker() {
        let msg = Message::decode(&[TYPE_APPLICATION_SETTING, SETTING_CLEARED_MARKER]).unwrap();
        assert_eq!(msg, Message::ApplicationSettingsCleared);
    }

    #[test]
    fn decodes_application_setting_failed_marker() {
        let msg = Message::decode(&[TYPE_APPLICATION_SETTING, SETTING_FAILED_MARKER, 3]).unwrap();
        assert_eq!(msg, Message::ApplicationSettingFailed { fragment: 3 });
    }

    #[test]
    fn decodes_contact_setting_confirmation_without_vibration() {
        let bytes = [TYPE_CONTACT_SETTING, 1, 5, 6, 7];
        let msg = Message::decode(&bytes).unwrap();
        assert_eq!(
            msg,
            Message::ContactSettingConfirmed(SettingConfirmation {
                fragment: 1,
                color: Color::new(5, 6, 7),
                vibration: None,
            })
        );
    }

    #[test]
    fn decodes_clear_bond_confirmation() {
        assert_eq!(
            Message::decode(&[TYPE_CLEAR_BOND_CONFIRMATION]).unwrap(),
            Message::ClearBondConfirmed
        );
    }

    #[test]
    fn decodes_application_error_reset_as_bare_marker() {
        assert_eq!(
            Message::decode(&[TYPE_APPLICATION_ERROR]).unwrap(),
            Message::ApplicationErrorReset
        );
    }

    #[test]
    fn unrecognized_type_becomes_unsupported() {
        let msg = Message::decode(&[99, 1, 2, 3]).unwrap();
        assert_eq!(
            msg,
            Message::Unsupported {
                message_type: 99,
                payload: vec![1, 2, 3],
            }
        );
    }

    #[test]
    fn truncated_known_payload_falls_back_to_unsupported() {
        // TYPE_TAP needs at least 1 ASCII digit; give it zero.
        let msg = Message::decode(&[TYPE_TAP]).unwrap();
        assert_eq!(
            msg,
            Message::Unsupported {
                message_type: TYPE_TAP,
                payload: vec![],
            }
        );
    }

    #[test]
    fn empty_buffer_does_not_decode() {
        assert_eq!(Message::decode(&[]), None);
    }
}
