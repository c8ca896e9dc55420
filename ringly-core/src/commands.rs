//! The outbound command encoder.
//!
//! Every command serializes to `[metadata_byte, type_byte, length_byte, payload...]`. The
//! length byte counts only the payload. `Command::encode` is canonical: semantically identical
//! commands always produce identical bytes, which is what makes the worked-example tests below
//! meaningful.

use crate::types::{Color, ColorKeyframe, KeyframeCommand, Vibration, VibrationBehavior, VibrationKeyframe};
use crate::util::truncate_utf8;

/// The fixed metadata byte prepended to every encoded command.
pub const COMMAND_METADATA_BYTE: u8 = 0xA5;

/// The wire type byte for each command variant. `None` is the preset table's reserved zero slot;
/// this crate never constructs it. Gaps in the rest of the sequence (18, 22, 25 in the original
/// firmware's `RLYCommandTypePreset` table) are preserved rather than compacted, since a firmware
/// update could still send the retired codes and a future one could reuse them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CommandType {
    None = 0,
    LedVibration = 1,
    FirmwareReset = 2,
    EnterDfu = 3,
    DeepSleep = 4,
    ClearBonds = 5,
    AdvertisingName = 6,
    MobileOs = 7,
    DateTime = 8,
    ChargeMode = 9,
    SleepMode = 10,
    LoggingQuery = 11,
    RfScanTestAppSwitch = 12,
    DisconnectVibration = 13,
    ConnectionLed = 14,
    HardwareVersion = 15,
    TapParameters = 16,
    ApplicationSettings = 17,
    ContactSettings = 19,
    ContactsMode = 20,
    ConnectionLedResponse = 21,
    AncsTimeoutAlert = 23,
    Keyframe = 24,
    NotificationPinLed = 26,
    ClearApplicationSettings = 27,
    ClearContactSettings = 28,
    NoAction = 29,
}

impl CommandType {
    pub fn wire_value(self) -> u8 {
        self as u8
    }
}

/// Add or delete semantics shared by `ApplicationSettings` and `ContactSettings`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingsMode {
    Add,
    Delete,
}

impl SettingsMode {
    fn wire_value(self) -> u8 {
        match self {
            Self::Add => 0,
            Self::Delete => 1,
        }
    }
}

/// `ContactsMode` command payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactsMode {
    AdditionalColor,
    ContactsOnly,
    Disabled,
}

impl ContactsMode {
    fn wire_value(self) -> u8 {
        match self {
            Self::AdditionalColor => 0,
            Self::ContactsOnly => 1,
            Self::Disabled => 0xFF,
        }
    }
}

/// `MobileOS` command payload's OS type byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MobileOsType {
    None,
    Ios,
    Android,
}

impl MobileOsType {
    fn wire_value(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Ios => 1,
            Self::Android => 2,
        }
    }
}

/// The `EnterDFU` timeout code. Values 0..7 map to {30, 5, 10, 15, 20, 25, 35, 40} seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DfuTimeout(u8);

const DFU_TIMEOUT_SECONDS: [u16; 8] = [30, 5, 10, 15, 20, 25, 35, 40];

impl DfuTimeout {
    /// Builds a `DfuTimeout` from its wire code (0..=7). Returns `None` for out-of-range codes.
    pub fn from_code(code: u8) -> Option<Self> {
        (code < 8).then_some(Self(code))
    }

    /// Builds a `DfuTimeout` from the nearest supported number of seconds.
    pub fn from_seconds(seconds: u16) -> Option<Self> {
        DFU_TIMEOUT_SECONDS
            .iter()
            .position(|&s| s == seconds)
            .map(|code| Self(code as u8))
    }

    pub fn seconds(self) -> u16 {
        DFU_TIMEOUT_SECONDS[self.0 as usize]
    }

    fn wire_value(self) -> u8 {
        self.0
    }
}

/// A six-field date/time, as written by the `DateTime` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateTimeFields {
    pub year_offset_from_2000: u8,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

/// The ten opaque bytes of the `TapParameters` command. Fields 5-10 have no documented
/// semantics upstream and are preserved as an opaque passthrough — do not attempt to
/// interpret them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TapParameters {
    pub threshold: u8,
    pub time_limit: u8,
    pub latency: u8,
    pub window: u8,
    pub opaque: [u8; 6],
}

/// `DisconnectVibration` command payload. A `wait_time_sec` of `0` or `>= 240` disables it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DisconnectVibration {
    pub behavior: VibrationBehavior,
    pub wait_time_sec: u8,
    pub backoff_min: u8,
}

/// `ApplicationSettings` command payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ApplicationSettings {
    pub mode: SettingsMode,
    pub color: Color,
    pub vibration: Vibration,
    pub app_id: String,
}

/// `ContactSettings` command payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContactSettings {
    pub mode: SettingsMode,
    pub color: Color,
    pub contact_name: String,
}

/// The tagged union over every outbound command.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Command {
    LedVibration {
        color: crate::types::ColorBehavior,
        vibration: VibrationBehavior,
    },
    FirmwareReset,
    EnterDfu(DfuTimeout),
    DeepSleep,
    ClearBonds,
    AdvertisingName {
        short_name: [u8; 4],
        diamond_club: bool,
    },
    MobileOs {
        os_type: MobileOsType,
        factory_mode: bool,
    },
    DateTime(DateTimeFields),
    ChargeMode(u8),
    SleepMode(u8),
    LoggingQuery,
    RfScanTestAppSwitch,
    DisconnectVibration(DisconnectVibration),
    ConnectionLed(u8),
    HardwareVersion,
    TapParameters(TapParameters),
    ApplicationSettings(ApplicationSettings),
    ContactSettings(ContactSettings),
    ContactsMode(ContactsMode),
    ConnectionLedResponse(u8),
    AncsTimeoutAlert(u8),
    Keyframe(KeyframeCommand),
    NotificationPinLed(u8),
    ClearApplicationSettings,
    ClearContactSettings,
    NoAction,
}

impl Command {
    /// Maximum payload size allowed for the variable-length app-id/contact-name fields so that
    /// the encoded command still fits in the wire's single-byte length field.
    const MAX_PAYLOAD_LEN: usize = 255;

    fn command_type(&self) -> CommandType {
        match self {
            Self::LedVibration { .. } => CommandType::LedVibration,
            Self::FirmwareReset => CommandType::FirmwareReset,
            Self::EnterDfu(_) => CommandType::EnterDfu,
            Self::DeepSleep => CommandType::DeepSleep,
            Self::ClearBonds => CommandType::ClearBonds,
            Self::AdvertisingName { .. } => CommandType::AdvertisingName,
            Self::MobileOs { .. } => CommandType::MobileOs,
            Self::DateTime(_) => CommandType::DateTime,
            Self::ChargeMode(_) => CommandType::ChargeMode,
            Self::SleepMode(_) => CommandType::SleepMode,
            Self::LoggingQuery => CommandType::LoggingQuery,
            Self::RfScanTestAppSwitch => CommandType::RfScanTestAppSwitch,
            Self::DisconnectVibration(_) => CommandType::DisconnectVibration,
            Self::ConnectionLed(_) => CommandType::ConnectionLed,
            Self::HardwareVersion => CommandType::HardwareVersion,
            Self::TapParameters(_) => CommandType::TapParameters,
            Self::ApplicationSettings(_) => CommandType::ApplicationSettings,
            Self::ContactSettings(_) => CommandType::ContactSettings,
            Self::ContactsMode(_) => CommandType::ContactsMode,
            Self::ConnectionLedResponse(_) => CommandType::ConnectionLedResponse,
            Self::AncsTimeoutAlert(_) => CommandType::AncsTimeoutAlert,
            Self::Keyframe(_) => CommandType::Keyframe,
            Self::NotificationPinLed(_) => CommandType::NotificationPinLed,
            Self::ClearApplicationSettings => CommandType::ClearApplicationSettings,
            Self::ClearContactSettings => CommandType::ClearContactSettings,
            Self::NoAction => CommandType::NoAction,
        }
    }

    fn encode_payload(&self, out: &mut Vec<u8>) {
        match self {
            Self::LedVibration { color, vibration } => {
                color.encode(out);
                vibration.encode(out);
            }
            Self::FirmwareReset
            | Self::DeepSleep
            | Self::ClearBonds
            | Self::LoggingQuery
            | Self::RfScanTestAppSwitch
            | Self::HardwareVersion
            | Self::ClearApplicationSettings
            | Self::ClearContactSettings
            | Self::NoAction => {}
            Self::EnterDfu(timeout) => out.push(timeout.wire_value()),
            Self::AdvertisingName {
                short_name,
                diamond_club,
            } => {
                out.extend_from_slice(short_name);
                out.push(*diamond_club as u8);
            }
            Self::MobileOs {
                os_type,
                factory_mode,
            } => {
                out.push(os_type.wire_value());
                out.push(*factory_mode as u8);
            }
            Self::DateTime(fields) => {
                out.push(fields.year_offset_from_2000);
                out.push(fields.month);
                out.push(fields.day);
                out.push(fields.hour);
                out.push(fields.minute);
                out.push(fields.second);
            }
            Self::ChargeMode(v) | Self::SleepMode(v) | Self::ConnectionLed(v) => out.push(*v),
            Self::DisconnectVibration(d) => {
                d.behavior.encode(out);
                out.push(d.wait_time_sec);
                out.push(d.backoff_min);
            }
            Self::TapParameters(t) => {
                out.push(t.threshold);
                out.push(t.time_limit);
                out.push(t.latency);
                out.push(t.window);
                out.extend_from_slice(&t.opaque);
            }
            Self::ApplicationSettings(s) => {
                out.push(s.mode.wire_value());
                out.push(s.color.r);
                out.push(s.color.g);
                out.push(s.color.b);
                out.push(s.vibration.to_wire());
                let remaining = Self::MAX_PAYLOAD_LEN - out.len();
                out.extend_from_slice(truncate_utf8(&s.app_id, remaining).as_bytes());
            }
            Self::ContactSettings(s) => {
                out.push(s.mode.wire_value());
                out.push(s.color.r);
                out.push(s.color.g);
                out.push(s.color.b);
                let remaining = Self::MAX_PAYLOAD_LEN - out.len();
                out.extend_from_slice(truncate_utf8(&s.contact_name, remaining).as_bytes());
            }
            Self::ContactsMode(mode) => out.push(mode.wire_value()),
            Self::ConnectionLedResponse(v) | Self::AncsTimeoutAlert(v) | Self::NotificationPinLed(v) => {
                out.push(*v)
            }
            Self::Keyframe(kf) => {
                out.push(kf.color_keyframes.len() as u8);
                for c in &kf.color_keyframes {
                    c.encode(out);
                }
                out.push(kf.vibration_keyframes.len() as u8);
                for v in &kf.vibration_keyframes {
                    v.encode(out);
                }
                out.push(kf.repeat_count);
            }
        }
    }

    /// Encodes this command to its full wire form: `[metadata, type, length, payload...]`.
    pub fn encode(&self) -> Vec<u8> {
        let mut payload = Vec::new();
        self.encode_payload(&mut payload);
        let mut out = Vec::with_capacity(payload.len() + 3);
        out.push(COMMAND_METADATA_BYTE);
        out.push(self.command_type().wire_value());
        out.push(payload.len() as u8);
        out.extend_from_slice(&payload);
        out
    }
}
