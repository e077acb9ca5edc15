//! Timezone and location values, plus the pure parts of location
//! resolution: the stored descriptor format and zip normalisation.

use serde::{Deserialize, Serialize};

/// Hours from UTC plus whether the zone observes daylight saving time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimezoneInfo {
  pub offset:  i32,
  pub has_dst: bool,
}

impl TimezoneInfo {
  pub fn new(offset: i32, has_dst: bool) -> Self { Self { offset, has_dst } }

  /// The `"<offset>_<hasDst>"` form stored on a contact row.
  pub fn to_descriptor(&self) -> String {
    format!("{}_{}", self.offset, u8::from(self.has_dst))
  }

  /// Parse a stored descriptor such as `"-5_1"`.
  ///
  /// The flag segment means DST only when it is exactly `"1"`; a missing flag
  /// reads as no DST. Returns `None` when the offset is not a base-10
  /// integer so callers can fall through to the next source.
  pub fn parse_descriptor(descriptor: &str) -> Option<Self> {
    let (offset, flag) = match descriptor.split_once('_') {
      Some((offset, rest)) => {
        (offset, rest.split('_').next().unwrap_or_default())
      }
      None => (descriptor, ""),
    };
    let offset = offset.trim().parse::<i32>().ok()?;
    Some(Self { offset, has_dst: flag == "1" })
  }
}

/// A contact's resolved location.
///
/// `city` and `state` are only known when they were cached on the contact or
/// came from the zip directory; the static zip table never carries them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
  pub timezone_offset: i32,
  pub has_dst:         bool,
  pub city:            Option<String>,
  pub state:           Option<String>,
}

impl Location {
  pub fn timezone(&self) -> TimezoneInfo {
    TimezoneInfo::new(self.timezone_offset, self.has_dst)
  }
}

impl From<TimezoneInfo> for Location {
  fn from(tz: TimezoneInfo) -> Self {
    Self {
      timezone_offset: tz.offset,
      has_dst:         tz.has_dst,
      city:            None,
      state:           None,
    }
  }
}

/// Reduce a postal code to its leading 5-digit prefix.
///
/// Any `-XXXX` extension is stripped first. Returns `None` when what remains
/// does not start with five ASCII digits.
pub fn main_zip(zip: &str) -> Option<&str> {
  let base = zip.split('-').next().unwrap_or_default().trim();
  let prefix = base.get(..5)?;
  prefix.bytes().all(|b| b.is_ascii_digit()).then_some(prefix)
}
