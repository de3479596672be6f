use crate::error::IntakeError;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Filename timestamp layouts, tried in order. Each requires a different
/// separator layout, so at most one can parse a given prefix. The length
/// is the exact prefix width in characters.
const FILENAME_LAYOUTS: &[(&str, usize)] = &[
    ("%Y-%m-%d_%H-%M-%S", 19),
    ("%Y%m%d_%H%M%S", 15),
    ("%Y%m%d%H%M%S", 14),
];

fn prefix_chars(input: &str, len: usize) -> Option<&str> {
    let mut indices = input.char_indices();
    let (end, ch) = indices.nth(len - 1)?;
    Some(&input[..end + ch.len_utf8()])
}

/// Parse an embedded recording timestamp from a filename prefix.
pub fn embedded_timestamp(filename: &str) -> Option<NaiveDateTime> {
    for (layout, len) in FILENAME_LAYOUTS {
        let Some(prefix) = prefix_chars(filename, *len) else {
            continue;
        };
        if let Ok(parsed) = NaiveDateTime::parse_from_str(prefix, layout) {
            return Some(parsed);
        }
    }
    None
}

pub fn has_embedded_timestamp(filename: &str) -> bool {
    embedded_timestamp(filename).is_some()
}

fn localize(naive: NaiveDateTime, tz: Tz, filename: &str) -> Result<DateTime<Tz>, IntakeError> {
    tz.from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| IntakeError::InvalidMetadata(filename.to_string()))
}

fn earliest_storage_instant(
    created: Option<DateTime<Utc>>,
    modified: Option<DateTime<Utc>>,
) -> Option<DateTime<Utc>> {
    // Bulk uploads inflate the creation time to the upload instant, so the
    // earlier of the two is the better recording estimate. On a tie the
    // creation time stands (`<=`).
    match (created, modified) {
        (Some(c), Some(m)) => Some(if c <= m { c } else { m }),
        (Some(c), None) => Some(c),
        (None, Some(m)) => Some(m),
        (None, None) => None,
    }
}

/// Derive the authoritative recording instant for a file.
///
/// A filename-embedded timestamp wins outright and is read as civil time
/// in `tz`; otherwise the earlier of the storage timestamps is used. With
/// neither source available resolution is a hard failure for the file.
pub fn resolve(
    filename: &str,
    created: Option<DateTime<Utc>>,
    modified: Option<DateTime<Utc>>,
    tz: Tz,
) -> Result<DateTime<Tz>, IntakeError> {
    if let Some(naive) = embedded_timestamp(filename) {
        return localize(naive, tz, filename);
    }

    earliest_storage_instant(created, modified)
        .map(|instant| instant.with_timezone(&tz))
        .ok_or_else(|| IntakeError::InvalidMetadata(filename.to_string()))
}
