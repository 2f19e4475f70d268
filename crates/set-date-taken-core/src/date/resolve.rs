use super::taken::parse_date_taken;
use super::{DateValue, FixedDate, TimeOfDay};

/// Where the time of day of a resolved date came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSource {
    Original,
    Digitized,
    Modified,
    Midnight,
}

/// Build the date to stamp on one file.
///
/// The time of day comes from the first usable source in order: the
/// original date-time tag, the digitized date-time tag, the file's
/// modification time, then midnight. `modified` is only called when neither
/// tag is usable. The calendar date is always `fixed`, whatever the sources
/// said. The result may still be invalid (e.g. Feb 29 in a non-leap year),
/// so callers must check [`DateValue::is_valid`].
pub fn resolve(
    fixed: FixedDate,
    original: Option<&str>,
    digitized: Option<&str>,
    modified: impl FnOnce() -> Option<TimeOfDay>,
) -> (DateValue, TimeSource) {
    let (time, source) = match taken_time(original) {
        Some(t) => (t, TimeSource::Original),
        None => match taken_time(digitized) {
            Some(t) => (t, TimeSource::Digitized),
            None => match modified() {
                Some(t) => (t, TimeSource::Modified),
                None => (TimeOfDay::MIDNIGHT, TimeSource::Midnight),
            },
        },
    };
    (fixed.at(time), source)
}

/// Time of day of a tag value, if it parses to a valid date-time.
pub fn taken_time(text: Option<&str>) -> Option<TimeOfDay> {
    let parsed = parse_date_taken(text?);
    parsed.is_valid().then(|| parsed.time_of_day())
}
