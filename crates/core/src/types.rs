/// Clip identifiers are opaque document ids from the clip store.
pub type ClipId = String;

/// Offsets and durations into a source video, in (fractional) seconds.
pub type Seconds = f64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
