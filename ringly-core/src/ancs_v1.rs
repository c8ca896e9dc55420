//! Version-1 ANCS assembly: the phone forwards raw ANCS notifications as a stream of fixed-size
//! fragments over the Ringly ANCS-v1 characteristic, keyed by a header byte. This module
//! reassembles fragments into a complete [`crate::ancs::AncsNotification`].
//!
//! Grounded on the fragmented-notification handling implied by
//! `RLYPeripheralObserver.h`'s `didReceiveANCSNotification`, which receives only a fully
//! assembled notification: the assembly step itself belongs to the central/app layer upstream
//! of the delegate callback, which this module now owns directly. `RLYANCSV1Parser.h` confirms
//! the shape of the public surface (`appendData:`, `includeFlags`, a year/month reference date)
//! but — being a header with no implementation file behind it — says nothing about the
//! in-flight wire layout. The layout below (day/hour/minute prefix, NUL-terminated message text,
//! trailing flags byte gated on `includeFlags`) is this module's own documented choice; see
//! `DESIGN.md` for the reasoning.
//!
//! Version 1 never transmits a notification category, title, or application identifier — those
//! fields come back as defaults (`AncsCategory::Other`, empty strings) on every v1 notification.

use crate::ancs::{AncsCategory, AncsDate, AncsNotification, AncsVersion};
use crate::error::AncsV1Error;
use chrono::Datelike;

/// Configuration for a single [`AncsV1Assembler`] instance, mirroring the `includeFlags`
/// property and the year/month reference date supplied to the original parser's designated
/// initializer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ancs1AssemblerConfig {
    /// When set, an extra flags byte is expected after the message-text terminator.
    pub include_flags: bool,
    /// The year and month to stamp onto every assembled notification, since v1 notifications
    /// only carry day/hour/minute on the wire.
    pub reference: ReferenceDate,
}

/// The reference date used to expand the v1 wire format's day/hour/minute date into a full
/// calendar date. The wire format has no year or month field at all; the app supplies "now" (or
/// a fixed reference) at assembler-construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceDate {
    pub year: u16,
    pub month: u8,
}

impl ReferenceDate {
    /// The reference date as of "now", for assemblers constructed without a caller-supplied
    /// fixed date.
    pub fn now() -> Self {
        let today = chrono::Local::now().date_naive();
        Self {
            year: today.year() as u16,
            month: today.month() as u8,
        }
    }
}

/// Assembles v1 ANCS fragments into complete notifications. One assembler instance per
/// connected peripheral; fragments for a different header byte than the in-flight one are
/// rejected rather than silently discarded, since a dropped fragment should surface as an error
/// the caller can log, not get swallowed.
#[derive(Debug)]
pub struct AncsV1Assembler {
    config: Ancs1AssemblerConfig,
    in_flight: Option<InFlight>,
}

#[derive(Debug)]
struct InFlight {
    header: u8,
    buffer: Vec<u8>,
}

const DATE_PREFIX_LEN: usize = 3;

impl AncsV1Assembler {
    pub fn new(config: Ancs1AssemblerConfig) -> Self {
        Self {
            config,
            in_flight: None,
        }
    }

    /// Feeds one fragment, `[header_byte, chunk...]`. Returns `Ok(Some(notification))` once a
    /// complete notification has been assembled, `Ok(None)` if more fragments are still
    /// expected, or an error if this fragment doesn't belong to the in-flight assembly.
    pub fn feed(&mut self, fragment: &[u8]) -> Result<Option<AncsNotification>, AncsV1Error> {
        let (&header, rest) = fragment.split_first().ok_or(AncsV1Error::InvalidHeader)?;

        match &mut self.in_flight {
            None => {
                self.in_flight = Some(InFlight {
                    header,
                    buffer: rest.to_vec(),
                });
            }
            Some(flight) => {
                if flight.header != header {
                    self.in_flight = None;
                    return Err(AncsV1Error::DifferentHeader);
                }
                flight.buffer.extend_from_slice(rest);
            }
        }

        let flight = self.in_flight.as_ref().expect("just inserted above");
        if flight.buffer.len() <= DATE_PREFIX_LEN {
            return Ok(None);
        }

        let Some(terminator) = flight.buffer[DATE_PREFIX_LEN..].iter().position(|&b| b == 0) else {
            return Ok(None);
        };
        let message_end = DATE_PREFIX_LEN + terminator;
        let needed = message_end + 1 + if self.config.include_flags { 1 } else { 0 };
        if flight.buffer.len() < needed {
            return Ok(None);
        }

        let flight = self.in_flight.take().expect("checked above");
        Ok(Some(decode_assembled(
            &flight.buffer,
            message_end,
            self.config,
        )))
    }

    /// Discards any partially assembled notification, e.g. after a disconnect.
    pub fn reset(&mut self) {
        self.in_flight = None;
    }
}

fn decode_assembled(buffer: &[u8], message_end: usize, config: Ancs1AssemblerConfig) -> AncsNotification {
    let date = AncsDate {
        year: config.reference.year,
        month: config.reference.month,
        day: buffer[0],
        hour: buffer[1],
        minute: buffer[2],
    };
    let message = String::from_utf8_lossy(&buffer[DATE_PREFIX_LEN..message_end]).into_owned();
    let flags = config
        .include_flags
        .then(|| buffer.get(message_end + 1).copied())
        .flatten()
        .map(crate::ancs::AncsFlags::from_wire);

    AncsNotification {
        version: AncsVersion::V1,
        category: AncsCategory::Other,
        flags,
        title: String::new(),
        message: Some(message),
        app_id: String::new(),
        date: Some(date),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ancs::AncsFlags;

    const REF: ReferenceDate = ReferenceDate { year: 2026, month: 7 };

    fn config(include_flags: bool) -> Ancs1AssemblerConfig {
        Ancs1AssemblerConfig {
            include_flags,
            reference: REF,
        }
    }

    #[test]
    fn assembles_message_split_across_fragments_with_flags() {
        // header 0x02, date bytes day=0/hour=0/minute=0, message "hello" split "hel" + "lo",
        // NUL terminator, then flags byte 0x03 = {Silent, Important}.
        let mut asm = AncsV1Assembler::new(config(true));
        let first = [0x02, 0, 0, 0, b'h', b'e', b'l'];
        assert_eq!(asm.feed(&first).unwrap(), None);

        let second = [0x02, b'l', b'o', 0x00, 0x03];
        let notif = asm.feed(&second).unwrap().unwrap();
        assert_eq!(notif.message.as_deref(), Some("hello"));
        assert_eq!(notif.flags, Some(AncsFlags::from_wire(0x03)));
        assert!(notif.flags.unwrap().silent);
        assert!(notif.flags.unwrap().important);
    }

    #[test]
    fn no_flags_byte_expected_when_include_flags_is_disabled() {
        let mut asm = AncsV1Assembler::new(config(false));
        let fragment = [0x01, 0, 0, 0, b'h', b'i', 0x00];
        let notif = asm.feed(&fragment).unwrap().unwrap();
        assert_eq!(notif.message.as_deref(), Some("hi"));
        assert_eq!(notif.flags, None);
    }

    #[test]
    fn wire_date_is_combined_with_the_reference_year_and_month() {
        let mut asm = AncsV1Assembler::new(config(false));
        // day = 10, hour = 14, minute = 30, matching "day 10, 14:30".
        let fragment = [0x05, 10, 14, 30, b'x', 0x00];
        let notif = asm.feed(&fragment).unwrap().unwrap();
        assert_eq!(
            notif.date,
            Some(AncsDate {
                year: 2026,
                month: 7,
                day: 10,
                hour: 14,
                minute: 30,
            })
        );
    }

    #[test]
    fn mismatched_header_is_rejected_and_discards_the_buffer() {
        let mut asm = AncsV1Assembler::new(config(false));
        let first = [0x01, 0, 0, 0, b'h'];
        asm.feed(&first).unwrap();

        let wrong = [0x02, b'x'];
        assert_eq!(asm.feed(&wrong), Err(AncsV1Error::DifferentHeader));

        // The mismatched buffer was discarded; a fresh header now starts a new assembly.
        let restart = [0x02, 0, 0, 0, b'y', 0x00];
        assert!(asm.feed(&restart).unwrap().is_some());
    }

    #[test]
    fn empty_fragment_is_invalid_header() {
        let mut asm = AncsV1Assembler::new(config(false));
        assert_eq!(asm.feed(&[]), Err(AncsV1Error::InvalidHeader));
    }

    #[test]
    fn reset_clears_partial_assembly() {
        let mut asm = AncsV1Assembler::new(config(false));
        let first = [0x01, 0, 0, 0, b'h'];
        asm.feed(&first).unwrap();
        asm.reset();
        // A different header now succeeds since nothing is in flight.
        let next = [0x02, 0, 0, 0, b'z', 0x00];
        assert!(asm.feed(&next).unwrap().is_some());
    }
}
