//! Plain data types shared across the wire codecs and the peripheral model: color, vibration,
//! keyframes, battery/pairing/ANCS enumerations, and the appearance lookup table.

/// An adapter-assigned identifier for one physical peripheral, opaque to the core. Stands in for
/// a `CBPeripheral` identity without committing to any one platform's identifier shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerId(u64);

impl PeerId {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// An RGB color. `(0, 0, 0)` means "no color / disabled" on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const NONE: Color = Color { r: 0, g: 0, b: 0 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }
}

/// Vibration intensity, ordered from "none" to "four pulses".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Vibration {
    None = 0,
    OnePulse = 1,
    TwoPulses = 2,
    ThreePulses = 3,
    FourPulses = 4,
}

impl Vibration {
    pub fn from_wire(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::None),
            1 => Some(Self::OnePulse),
            2 => Some(Self::TwoPulses),
            3 => Some(Self::ThreePulses),
            4 => Some(Self::FourPulses),
            _ => None,
        }
    }

    pub fn to_wire(self) -> u8 {
        self as u8
    }
}

/// The unit (in milliseconds) that every on/off duration byte in this protocol is counted in.
pub const MILLIS_PER_UNIT: u32 = 10;

/// A vibration behavior: pulse count, motor power, and on/off durations (in `MILLIS_PER_UNIT`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VibrationBehavior {
    pub count: u8,
    pub power: u8,
    pub on_duration: u8,
    pub off_duration: u8,
}

impl VibrationBehavior {
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.push(self.count);
        out.push(self.power);
        out.push(self.on_duration);
        out.push(self.off_duration);
    }

    pub fn decode(bytes: &[u8]) -> Option<(Self, &[u8])> {
        if bytes.len() < 4 {
            return None;
        }
        let behavior = Self {
            count: bytes[0],
            power: bytes[1],
            on_duration: bytes[2],
            off_duration: bytes[3],
        };
        Some((behavior, &bytes[4..]))
    }
}

/// A color behavior: pulse count, primary/secondary color, delay, and on/off durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorBehavior {
    pub count: u8,
    pub primary: Color,
    pub secondary: Color,
    pub delay: u8,
    pub on_duration: u8,
    pub off_duration: u8,
}

impl ColorBehavior {
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.push(self.count);
        out.push(self.primary.r);
        out.push(self.primary.g);
        out.push(self.primary.b);
        out.push(self.secondary.r);
        out.push(self.secondary.g);
        out.push(self.secondary.b);
        out.push(self.delay);
        out.push(self.on_duration);
        out.push(self.off_duration);
    }

    pub fn decode(bytes: &[u8]) -> Option<(Self, &[u8])> {
        if bytes.len() < 10 {
            return None;
        }
        let behavior = Self {
            count: bytes[0],
            primary: Color::new(bytes[1], bytes[2], bytes[3]),
            secondary: Color::new(bytes[4], bytes[5], bytes[6]),
            delay: bytes[7],
            on_duration: bytes[8],
            off_duration: bytes[9],
        };
        Some((behavior, &bytes[10..]))
    }
}

/// A single keyframe's payload: either a color or a vibration motor-power byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyframePayload {
    Color(Color),
    VibrationPower(u8),
}

/// A color keyframe: timestamp byte, color, and an "interpolate to next" flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorKeyframe {
    pub timestamp: u8,
    pub color: Color,
    pub interpolate_to_next: bool,
}

impl ColorKeyframe {
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.push(self.timestamp);
        out.push(self.color.r);
        out.push(self.color.g);
        out.push(self.color.b);
        out.push(self.interpolate_to_next as u8);
    }

    pub fn decode(bytes: &[u8]) -> Option<(Self, &[u8])> {
        if bytes.len() < 5 {
            return None;
        }
        let kf = Self {
            timestamp: bytes[0],
            color: Color::new(bytes[1], bytes[2], bytes[3]),
            interpolate_to_next: bytes[4] != 0,
        };
        Some((kf, &bytes[5..]))
    }
}

/// A vibration keyframe: timestamp byte, motor power, and an "interpolate to next" flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VibrationKeyframe {
    pub timestamp: u8,
    pub power: u8,
    pub interpolate_to_next: bool,
}

impl VibrationKeyframe {
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.push(self.timestamp);
        out.push(self.power);
        out.push(self.interpolate_to_next as u8);
    }

    pub fn decode(bytes: &[u8]) -> Option<(Self, &[u8])> {
        if bytes.len() < 3 {
            return None;
        }
        let kf = Self {
            timestamp: bytes[0],
            power: bytes[1],
            interpolate_to_next: bytes[2] != 0,
        };
        Some((kf, &bytes[3..]))
    }
}

/// The payload of a `Keyframe` command: two parallel keyframe lists and a repeat count.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyframeCommand {
    pub color_keyframes: Vec<ColorKeyframe>,
    pub vibration_keyframes: Vec<VibrationKeyframe>,
    pub repeat_count: u8,
}

/// Tri-state support for a firmware-version-gated feature (MAC address, chip/bootloader/
/// softdevice version, …). See `RLYPeripheralDeviceInformation.h`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FeatureSupport {
    #[default]
    Undetermined,
    Unsupported,
    Supported,
}

/// The peripheral's connection state, as tracked locally (not the adapter's live GATT state).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Pairing assurance level. `AssumedPaired`/`AssumedUnpaired` come from a caller's prior
/// knowledge (e.g. "retrieve peripheral, assume paired"); `Paired`/`Unpaired` come from an
/// on-wire confirmation (the bond-complete short message).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PairState {
    #[default]
    AssumedUnpaired,
    Unpaired,
    AssumedPaired,
    Paired,
}

impl PairState {
    /// Invariant (a) of the data model: `paired == pairState ∈ {AssumedPaired, Paired}`.
    pub fn is_paired(self) -> bool {
        matches!(self, Self::AssumedPaired | Self::Paired)
    }
}

/// Whether ANCS notifications are relayed from the phone (v1) or handled on-device (v2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AncsNotificationMode {
    #[default]
    Unknown,
    PhoneForwarded,
    AutonomousOnDevice,
}

/// Why the peripheral last reported shutting down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ShutdownReason {
    #[default]
    None,
    Battery,
    Idle,
}

/// Battery charge state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatteryState {
    NotCharging,
    Charging,
    Charged,
    Error,
}

impl BatteryState {
    pub fn from_wire(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::NotCharging),
            1 => Some(Self::Charging),
            2 => Some(Self::Charged),
            3 => Some(Self::Error),
            _ => None,
        }
    }

    pub fn is_charging(self) -> bool {
        matches!(self, Self::Charging)
    }

    pub fn is_charging_or_charged(self) -> bool {
        matches!(self, Self::Charging | Self::Charged)
    }
}

/// The peripheral's physical appearance, derived from the 4-character short name embedded in
/// its advertised name (`RLY-<SHORT>-<MAC4>`). Grounded on `RLYPeripheralDeviceInformation.h`;
/// see `DESIGN.md` for the short-name table this enumerates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeripheralStyle {
    Daydream,
    Aurora,
    Eclipse,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeripheralType {
    Ring,
    Bracelet,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeripheralBand {
    Leather,
    Silicone,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeripheralStone {
    RoundCut,
    EmeraldCut,
    None,
    Unknown,
}

/// Appearance derived from a 4-character short name, e.g. `"DAYD"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Appearance {
    pub style: PeripheralStyle,
    pub kind: PeripheralType,
    pub band: PeripheralBand,
    pub stone: PeripheralStone,
}

/// Looks up appearance by the 4-character short name embedded in the advertised name.
/// Unrecognized short names resolve to every field's `Unknown` variant rather than failing,
/// since new hardware SKUs may ship before the app is updated with their short name.
pub fn appearance_for_short_name(short_name: &str) -> Appearance {
    match short_name {
        "DAYD" => Appearance {
            style: PeripheralStyle::Daydream,
            kind: PeripheralType::Ring,
            band: PeripheralBand::Unknown,
            stone: PeripheralStone::RoundCut,
        },
        "AURO" => Appearance {
            style: PeripheralStyle::Aurora,
            kind: PeripheralType::Ring,
            band: PeripheralBand::Unknown,
            stone: PeripheralStone::EmeraldCut,
        },
        "ECLI" => Appearance {
            style: PeripheralStyle::Eclipse,
            kind: PeripheralType::Bracelet,
            band: PeripheralBand::Leather,
            stone: PeripheralStone::None,
        },
        "STAR" => Appearance {
            style: PeripheralStyle::Eclipse,
            kind: PeripheralType::Bracelet,
            band: PeripheralBand::Silicone,
            stone: PeripheralStone::None,
        },
        _ => Appearance {
            style: PeripheralStyle::Unknown,
            kind: PeripheralType::Unknown,
            band: PeripheralBand::Unknown,
            stone: PeripheralStone::Unknown,
        },
    }
}

/// Splits a Ringly advertised name of the form `"RLY-<SHORT>-<MAC4>"` into its 4-character short
/// name and the last four hex digits of the peripheral's MAC address. Recovery-mode peripherals
/// advertise under a different name entirely and will not match this shape, so a non-matching
/// name returns `None` rather than a best-effort partial parse.
pub fn parse_advertised_name(name: &str) -> Option<(String, String)> {
    let mut parts = name.splitn(3, '-');
    let prefix = parts.next()?;
    let short_name = parts.next()?;
    let last_four_mac = parts.next()?;
    if prefix != "RLY" || parts.next().is_some() {
        return None;
    }
    if short_name.len() != 4 || last_four_mac.len() != 4 {
        return None;
    }
    Some((short_name.to_string(), last_four_mac.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_none_is_all_zero() {
        assert!(Color::NONE.is_none());
        assert!(!Color::new(1, 0, 0).is_none());
    }

    #[test]
    fn vibration_wire_roundtrip() {
        for v in [
            Vibration::None,
            Vibration::OnePulse,
            Vibration::TwoPulses,
            Vibration::ThreePulses,
            Vibration::FourPulses,
        ] {
            assert_eq!(Vibration::from_wire(v.to_wire()), Some(v));
        }
    }

    #[test]
    fn pair_state_matches_paired_invariant() {
        assert!(PairState::AssumedPaired.is_paired());
        assert!(PairState::Paired.is_paired());
        assert!(!PairState::Unpaired.is_paired());
        assert!(!PairState::AssumedUnpaired.is_paired());
    }

    #[test]
    fn known_short_name_resolves_appearance() {
        let a = appearance_for_short_name("DAYD");
        assert_eq!(a.style, PeripheralStyle::Daydream);
    }

    #[test]
    fn unknown_short_name_is_unknown_not_an_error() {
        let a = appearance_for_short_name("ZZZZ");
        assert_eq!(a.style, PeripheralStyle::Unknown);
    }

    #[test]
    fn color_behavior_roundtrip() {
        let cb = ColorBehavior {
            count: 2,
            primary: Color::new(0x10, 0x20, 0x30),
            secondary: Color::NONE,
            delay: 0,
            on_duration: 8,
            off_duration: 4,
        };
        let mut bytes = Vec::new();
        cb.encode(&mut bytes);
        let (decoded, rest) = ColorBehavior::decode(&bytes).unwrap();
        assert_eq!(decoded, cb);
        assert!(rest.is_empty());
    }

    #[test]
    fn parses_short_name_and_last_four_mac_from_advertised_name() {
        let (short_name, last_four_mac) = parse_advertised_name("RLY-DAYD-ABCD").unwrap();
        assert_eq!(short_name, "DAYD");
        assert_eq!(last_four_mac, "ABCD");
        assert_eq!(appearance_for_short_name(&short_name).style, PeripheralStyle::Daydream);
    }

    #[test]
    fn non_ringly_advertised_names_do_not_parse() {
        assert_eq!(parse_advertised_name("recovery-bootloader"), None);
        assert_eq!(parse_advertised_name("RLY-DAYD"), None);
        assert_eq!(parse_advertised_name("RLY-DAYD-ABCD-EXTRA"), None);
    }
}
