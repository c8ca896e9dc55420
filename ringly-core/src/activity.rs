//! Activity-tracking sample decoding. Each sample is 5 bytes: a 23-bit packed
//! minute-of-epoch timestamp plus a walking-steps byte and a running-steps byte. A `minute` of
//! `0` is a firmware-reset marker: the record is still parsed (and must still pass a well-formed
//! buffer through without error), but it does not produce a sample. An entirely empty buffer is
//! the read-completion marker, not an error.

use crate::error::{ActivityDateRangeError, ActivityError};
use crate::util::{pack_minute_23, unpack_minute_23};

const SAMPLE_LEN: usize = 5;

/// A 23-bit minute-of-epoch timestamp, as packed on the wire by [`crate::util::pack_minute_23`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActivityDate(u32);

impl ActivityDate {
    pub const MAX_MINUTE: u32 = (1 << 23) - 1;

    pub fn new(minute: u32) -> Result<Self, ActivityDateRangeError> {
        if minute > Self::MAX_MINUTE {
            return Err(ActivityDateRangeError { value: minute });
        }
        Ok(Self(minute))
    }

    pub fn minute(self) -> u32 {
        self.0
    }

    fn to_wire(self) -> [u8; 3] {
        pack_minute_23(self.0)
    }

    fn from_wire(bytes: [u8; 3]) -> Result<Self, ActivityDateRangeError> {
        Self::new(unpack_minute_23(bytes))
    }
}

/// One activity sample: a timestamp, a walking-steps count, and a running-steps count. `total`
/// is derived rather than stored on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActivitySample {
    pub date: ActivityDate,
    pub walking: u8,
    pub running: u8,
}

impl ActivitySample {
    pub fn total(&self) -> u16 {
        self.walking as u16 + self.running as u16
    }

    pub fn encode(&self) -> [u8; SAMPLE_LEN] {
        let date_bytes = self.date.to_wire();
        [
            date_bytes[0],
            date_bytes[1],
            date_bytes[2],
            self.walking,
            self.running,
        ]
    }
}

/// Decodes a buffer of concatenated 5-byte records. An empty buffer means "no more samples, read
/// complete" and decodes to an empty `Vec`, not an error. Records whose packed minute is `0` are
/// parsed (so a malformed length still fails, and an out-of-range minute in a later record still
/// surfaces) but contribute no entry to the returned `Vec`, since the firmware uses minute `0` as
/// its "unused slot" sentinel rather than a real sample.
pub fn decode_samples(buffer: &[u8]) -> Result<Vec<ActivitySample>, ActivityError> {
    if buffer.is_empty() {
        return Ok(Vec::new());
    }
    if buffer.len() % SAMPLE_LEN != 0 {
        return Err(ActivityError::IncorrectDataLength);
    }

    let mut out = Vec::with_capacity(buffer.len() / SAMPLE_LEN);
    for chunk in buffer.chunks_exact(SAMPLE_LEN) {
        let date_bytes = [chunk[0], chunk[1], chunk[2]];
        let minute = unpack_minute_23(date_bytes);
        if minute == 0 {
            continue;
        }
        let date = ActivityDate::from_wire(date_bytes).map_err(ActivityError::DateError)?;
        out.push(ActivitySample {
            date,
            walking: chunk[3],
            running: chunk[4],
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_buffer_is_completion_not_an_error() {
        assert_eq!(decode_samples(&[]).unwrap(), Vec::new());
    }

    #[test]
    fn length_not_divisible_by_five_is_an_error() {
        assert_eq!(
            decode_samples(&[1, 2, 3, 4]),
            Err(ActivityError::IncorrectDataLength)
        );
    }

    #[test]
    fn zero_minute_records_are_parsed_but_produce_no_sample() {
        let mut buf = vec![0, 0, 0, 99, 1]; // minute == 0, dropped from the output
        let sample = ActivitySample {
            date: ActivityDate::new(100).unwrap(),
            walking: 7,
            running: 3,
        };
        buf.extend_from_slice(&sample.encode());
        let samples = decode_samples(&buf).unwrap();
        assert_eq!(samples, vec![sample]);
    }

    #[test]
    fn date_out_of_range_is_rejected() {
        assert!(ActivityDate::new(ActivityDate::MAX_MINUTE + 1).is_err());
        assert!(ActivityDate::new(ActivityDate::MAX_MINUTE).is_ok());
    }

    #[test]
    fn out_of_range_minute_in_a_record_surfaces_date_error() {
        // minute = 0x80_00_00, one past the 23-bit range.
        let buf = [0x00, 0x00, 0x80, 1, 1];
        assert_eq!(
            decode_samples(&buf),
            Err(ActivityError::DateError(ActivityDateRangeError {
                value: 0x80_00_00
            }))
        );
    }

    #[test]
    fn sample_roundtrips_through_wire() {
        let sample = ActivitySample {
            date: ActivityDate::new(12345).unwrap(),
            walking: 7,
            running: 3,
        };
        let encoded = sample.encode();
        let decoded = decode_samples(&encoded).unwrap();
        assert_eq!(decoded, vec![sample]);
        assert_eq!(sample.total(), 10);
    }

    #[test]
    fn decodes_the_two_record_buffer_from_the_worked_example() {
        let buf = [0x0A, 0x00, 0x00, 7, 3, 0x0B, 0x00, 0x00, 0, 0];
        let samples = decode_samples(&buf).unwrap();
        assert_eq!(
            samples,
            vec![
                ActivitySample {
                    date: ActivityDate::new(10).unwrap(),
                    walking: 7,
                    running: 3,
                },
                ActivitySample {
                    date: ActivityDate::new(11).unwrap(),
                    walking: 0,
                    running: 0,
                },
            ]
        );
    }
}
