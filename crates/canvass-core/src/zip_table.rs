//! Static zip-prefix → timezone table.
//!
//! Covers US zip ranges that lie entirely inside one timezone. Ranges that
//! straddle a zone boundary (parts of TN, KY, IN, the Dakotas, west Texas,
//! north Idaho, …) are left out on purpose: a miss here sends the lookup to
//! the zip directory, which knows the exact zone per zip.

use crate::location::TimezoneInfo;

/// `(first_zip, last_zip, utc_offset, observes_dst)`, sorted and disjoint.
const ZIP_TIMEZONES: &[(u32, u32, i32, bool)] = &[
  (500, 599, -5, true),       // Holtsville, NY
  (600, 999, -4, false),      // Puerto Rico, US Virgin Islands
  (1000, 8999, -5, true),     // New England, New Jersey
  (10000, 14999, -5, true),   // New York
  (15000, 19699, -5, true),   // Pennsylvania
  (19700, 19999, -5, true),   // Delaware
  (20000, 20599, -5, true),   // District of Columbia
  (20600, 21999, -5, true),   // Maryland
  (22000, 24699, -5, true),   // Virginia
  (24700, 26899, -5, true),   // West Virginia
  (27000, 28999, -5, true),   // North Carolina
  (29000, 29999, -5, true),   // South Carolina
  (30000, 31999, -5, true),   // Georgia
  (32000, 32399, -5, true),   // Florida, east of the Apalachicola
  (32400, 32599, -6, true),   // Florida panhandle
  (32600, 34999, -5, true),   // Florida peninsula
  (35000, 36999, -6, true),   // Alabama
  (37000, 37299, -6, true),   // Middle Tennessee
  (38000, 38599, -6, true),   // West Tennessee
  (38600, 39799, -6, true),   // Mississippi
  (39800, 39999, -5, true),   // South Georgia
  (43000, 45999, -5, true),   // Ohio
  (48000, 49799, -5, true),   // Lower Michigan
  (50000, 52899, -6, true),   // Iowa
  (53000, 54999, -6, true),   // Wisconsin
  (55000, 56799, -6, true),   // Minnesota
  (59000, 59999, -7, true),   // Montana
  (60000, 62999, -6, true),   // Illinois
  (63000, 65899, -6, true),   // Missouri
  (66000, 67699, -6, true),   // Kansas, east of the mountain counties
  (68000, 68999, -6, true),   // Eastern Nebraska
  (70000, 71499, -6, true),   // Louisiana
  (71600, 72999, -6, true),   // Arkansas
  (73000, 74999, -6, true),   // Oklahoma
  (75000, 79799, -6, true),   // Texas, east of El Paso
  (80000, 81699, -7, true),   // Colorado
  (82000, 83199, -7, true),   // Wyoming
  (83200, 83499, -7, true),   // Southern Idaho
  (84000, 84799, -7, true),   // Utah
  (85000, 86499, -7, false),  // Arizona
  (87000, 88499, -7, true),   // New Mexico
  (88900, 89899, -8, true),   // Nevada
  (90000, 96199, -8, true),   // California
  (96700, 96899, -10, false), // Hawaii
  (97000, 97899, -8, true),   // Oregon
  (98000, 99499, -8, true),   // Washington
  (99500, 99999, -9, true),   // Alaska
];

/// Look up a 5-digit zip prefix. Returns `None` for anything that is not a
/// number or falls outside the single-zone ranges above.
pub fn lookup(prefix: &str) -> Option<TimezoneInfo> {
  let zip: u32 = prefix.parse().ok()?;
  let idx = ZIP_TIMEZONES.partition_point(|&(_, last, _, _)| last < zip);
  let &(first, _, offset, has_dst) = ZIP_TIMEZONES.get(idx)?;
  (zip >= first).then(|| TimezoneInfo::new(offset, has_dst))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn ranges_are_sorted_and_disjoint() {
    for pair in ZIP_TIMEZONES.windows(2) {
      let (a, b) = (pair[0], pair[1]);
      assert!(a.0 <= a.1, "inverted range {a:?}");
      assert!(a.1 < b.0, "overlap between {a:?} and {b:?}");
    }
  }

  #[test]
  fn finds_known_zones() {
    assert_eq!(lookup("10001"), Some(TimezoneInfo::new(-5, true)));
    assert_eq!(lookup("60614"), Some(TimezoneInfo::new(-6, true)));
    assert_eq!(lookup("85004"), Some(TimezoneInfo::new(-7, false)));
    assert_eq!(lookup("94110"), Some(TimezoneInfo::new(-8, true)));
    assert_eq!(lookup("96813"), Some(TimezoneInfo::new(-10, false)));
    assert_eq!(lookup("00901"), Some(TimezoneInfo::new(-4, false)));
  }

  #[test]
  fn range_edges_are_inclusive() {
    assert_eq!(lookup("32399"), Some(TimezoneInfo::new(-5, true)));
    assert_eq!(lookup("32400"), Some(TimezoneInfo::new(-6, true)));
  }

  #[test]
  fn split_zone_prefixes_miss() {
    // Knoxville, TN and El Paso, TX straddle zone lines.
    assert_eq!(lookup("37902"), None);
    assert_eq!(lookup("79901"), None);
    assert_eq!(lookup("abcde"), None);
  }
}
