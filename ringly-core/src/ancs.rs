//! Shared ANCS (Apple Notification Center Service) notification types, consumed by both the
//! v1 fragment assembler ([`crate::ancs_v1`]) and the v2 TLV parser ([`crate::ancs_v2`]).

/// The category of an incoming notification, collapsing Apple's reserved/future range into
/// [`AncsCategory::Other`] rather than failing to parse unknown categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AncsCategory {
    Other,
    IncomingCall,
    MissedCall,
    Voicemail,
    Social,
    Schedule,
    Email,
    News,
    HealthAndFitness,
    BusinessAndFinance,
    Location,
    Entertainment,
}

impl AncsCategory {
    pub fn from_wire(byte: u8) -> Self {
        match byte {
            1 => Self::IncomingCall,
            2 => Self::MissedCall,
            3 => Self::Voicemail,
            5 => Self::Social,
            6 => Self::Schedule,
            7 => Self::Email,
            8 => Self::News,
            9 => Self::HealthAndFitness,
            10 => Self::BusinessAndFinance,
            11 => Self::Location,
            12 => Self::Entertainment,
            // 0, 4, 13+ and anything else collapse to Other.
            _ => Self::Other,
        }
    }
}

/// The 5 documented ANCS notification flag bits (`NSNotificationFlag*` in Apple's ANCS spec).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AncsFlags {
    pub silent: bool,
    pub important: bool,
    pub pre_existing: bool,
    pub positive_action: bool,
    pub negative_action: bool,
}

impl AncsFlags {
    pub fn from_wire(byte: u8) -> Self {
        Self {
            silent: byte & 0b0000_0001 != 0,
            important: byte & 0b0000_0010 != 0,
            pre_existing: byte & 0b0000_0100 != 0,
            positive_action: byte & 0b0000_1000 != 0,
            negative_action: byte & 0b0001_0000 != 0,
        }
    }

    pub fn to_wire(self) -> u8 {
        (self.silent as u8)
            | (self.important as u8) << 1
            | (self.pre_existing as u8) << 2
            | (self.positive_action as u8) << 3
            | (self.negative_action as u8) << 4
    }
}

/// Which wire format produced an [`AncsNotification`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AncsVersion {
    /// Fragmented, phone-forwarded notifications (see [`crate::ancs_v1`]).
    V1,
    /// TLV-encoded, assembled on-device (see [`crate::ancs_v2`]).
    V2,
}

/// The date of a notification, as reported by ANCS. Minute resolution; v1 notifications carry
/// only day/hour/minute on the wire; year and month come from a reference date supplied by the
/// caller (see [`crate::ancs_v1::Ancs1AssemblerConfig`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AncsDate {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
}

/// A fully assembled ANCS notification, regardless of which wire version produced it.
///
/// `message` and `flags` are optional: `message` is absent when the firmware didn't include one,
/// and `flags` is only ever populated for a v1 peripheral with `includeFlags` enabled (see
/// [`crate::ancs_v1::Ancs1AssemblerConfig`]) on application firmware newer than `1.4.3`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AncsNotification {
    pub version: AncsVersion,
    pub category: AncsCategory,
    pub flags: Option<AncsFlags>,
    pub title: String,
    pub message: Option<String>,
    pub app_id: String,
    pub date: Option<AncsDate>,
}

impl Default for AncsCategory {
    fn default() -> Self {
        Self::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_categories_collapse_to_other() {
        assert_eq!(AncsCategory::from_wire(0), AncsCategory::Other);
        assert_eq!(AncsCategory::from_wire(4), AncsCategory::Other);
        assert_eq!(AncsCategory::from_wire(200), AncsCategory::Other);
    }

    #[test]
    fn flags_roundtrip_through_wire() {
        let flags = AncsFlags {
            silent: true,
            important: false,
            pre_existing: true,
            positive_action: false,
            negative_action: true,
        };
        assert_eq!(AncsFlags::from_wire(flags.to_wire()), flags);
    }
}
