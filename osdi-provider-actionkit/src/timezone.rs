//! Postal code to timezone resolution, plus the wall-clock conversion
//! ActionKit needs for `starts_at`/`ends_at`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use osdi_core::{OsdiError, OsdiResult};

/// Format ActionKit expects for event times.
pub const AK_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub trait TimezoneLookup: Send + Sync {
    fn lookup(&self, postal_code: &str) -> Option<Tz>;
}

/// US ZIP code lookup keyed on the three-digit prefix.
///
/// Prefixes that straddle a zone line resolve to the zone covering most of
/// the prefix area.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipPrefixTimezones;

// Inclusive ZIP3 ranges, sorted by start.
const ZIP3_ZONES: &[(u16, u16, Tz)] = &[
    (5, 5, Tz::America__New_York),
    (6, 9, Tz::America__Puerto_Rico),
    (10, 299, Tz::America__New_York),
    (300, 323, Tz::America__New_York),
    (324, 325, Tz::America__Chicago),
    (326, 349, Tz::America__New_York),
    (350, 372, Tz::America__Chicago),
    (373, 379, Tz::America__New_York),
    (380, 397, Tz::America__Chicago),
    (398, 419, Tz::America__New_York),
    (420, 427, Tz::America__Chicago),
    (430, 459, Tz::America__New_York),
    (460, 462, Tz::America__Indiana__Indianapolis),
    (463, 464, Tz::America__Chicago),
    (465, 479, Tz::America__Indiana__Indianapolis),
    (480, 499, Tz::America__Detroit),
    (500, 576, Tz::America__Chicago),
    (577, 577, Tz::America__Denver),
    (580, 588, Tz::America__Chicago),
    (590, 599, Tz::America__Denver),
    (600, 689, Tz::America__Chicago),
    (690, 693, Tz::America__Denver),
    (700, 797, Tz::America__Chicago),
    (798, 799, Tz::America__Denver),
    (800, 831, Tz::America__Denver),
    (832, 834, Tz::America__Boise),
    (835, 835, Tz::America__Los_Angeles),
    (836, 837, Tz::America__Boise),
    (838, 838, Tz::America__Los_Angeles),
    (840, 847, Tz::America__Denver),
    (850, 865, Tz::America__Phoenix),
    (870, 885, Tz::America__Denver),
    (889, 961, Tz::America__Los_Angeles),
    (967, 968, Tz::Pacific__Honolulu),
    (969, 969, Tz::Pacific__Guam),
    (970, 994, Tz::America__Los_Angeles),
    (995, 999, Tz::America__Anchorage),
];

impl TimezoneLookup for ZipPrefixTimezones {
    fn lookup(&self, postal_code: &str) -> Option<Tz> {
        let prefix = postal_code.trim().get(..3)?;
        if !prefix.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let zip3: u16 = prefix.parse().ok()?;

        ZIP3_ZONES
            .iter()
            .find(|(start, end, _)| (*start..=*end).contains(&zip3))
            .map(|(_, _, tz)| *tz)
    }
}

/// Render an OSDI date as ActionKit wall-clock time in `tz`.
///
/// Input without an offset is taken as local time in `tz`; input with an
/// offset is converted into `tz`. Without a zone, local input passes
/// through and offset input is rendered in UTC.
pub fn to_ak_datetime(input: &str, tz: Option<Tz>) -> OsdiResult<String> {
    let input = input.trim();

    if let Ok(instant) = DateTime::parse_from_rfc3339(input) {
        let formatted = match tz {
            Some(tz) => instant.with_timezone(&tz).format(AK_DATETIME_FORMAT).to_string(),
            None => instant.naive_utc().format(AK_DATETIME_FORMAT).to_string(),
        };
        return Ok(formatted);
    }

    let local = parse_local(input).ok_or_else(|| OsdiError::InvalidDate(input.to_string()))?;

    let formatted = match tz.and_then(|tz| tz.from_local_datetime(&local).earliest()) {
        Some(zoned) => zoned.format(AK_DATETIME_FORMAT).to_string(),
        None => local.format(AK_DATETIME_FORMAT).to_string(),
    };
    Ok(formatted)
}

fn parse_local(input: &str) -> Option<NaiveDateTime> {
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
