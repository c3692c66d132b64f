//! Detection message parsing
//!
//! The upstream producer packs named fields into a single text blob:
//! `key=value` segments joined by `" --- "`. Values may themselves contain
//! `=` (URLs with query strings do), so each segment splits on the FIRST `=`
//! only. This split contract is a hard constraint of the producer's format;
//! do not switch to a global split.

use std::collections::HashMap;

use crate::validator::FIELD_SEPARATOR;

/// Marker appended by the producer to the day's first detection of a species
const FIRST_TIME_MARKER: &str = " (first time today)";

/// Parse a detection message into a field map.
///
/// Pure and validation-free; missing keys are the consumers' problem.
/// Duplicate keys keep the last occurrence. A segment with no `=` maps the
/// whole segment to the empty string.
pub fn parse_fields(message: &str) -> HashMap<String, String> {
    let message = message.strip_suffix(FIRST_TIME_MARKER).unwrap_or(message);

    let mut fields = HashMap::new();
    for segment in message.split(FIELD_SEPARATOR) {
        match segment.split_once('=') {
            Some((key, value)) => fields.insert(key.to_string(), value.to_string()),
            None => fields.insert(segment.to_string(), String::new()),
        };
    }

    fields
}
