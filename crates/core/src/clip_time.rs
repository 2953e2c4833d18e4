//! Clip time-range validation.
//!
//! Inspects a clip's recorded start/end offsets and classifies the range as
//! clean or as exactly one [`ValidationFinding`] with a typed reason and a
//! triage [`Severity`]. Used for retroactive auditing of stored clips; the
//! fail-fast check applied when a clip is authored lives elsewhere.
//!
//! Rules are evaluated in a fixed order and the first match wins, so every
//! flagged clip carries a single, unambiguous diagnosis.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{ClipId, Seconds};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Shortest duration a testimony clip may have.
pub const MIN_DURATION_SECONDS: Seconds = 5.0;

/// Hard upper bound on clip duration (30 minutes).
pub const MAX_DURATION_SECONDS: Seconds = 1800.0;

/// Soft bound above which a clip is reported as unusually long.
///
/// Equal to [`MAX_DURATION_SECONDS`], which leaves the soft check off until
/// `CLIP_SUSPICIOUS_LONG_SECS` lowers it.
pub const SUSPICIOUS_LONG_DURATION_SECONDS: Seconds = MAX_DURATION_SECONDS;

/// Start offsets past this point (3 hours) are treated as data-entry errors.
pub const MAX_PLAUSIBLE_START_SECONDS: Seconds = 10_800.0;

/// Fallback clip length used when a repair has to guess an end time.
pub const DEFAULT_REPAIR_DURATION_SECONDS: Seconds = 300.0;

/// Environment variable overriding [`MIN_DURATION_SECONDS`].
pub const ENV_MIN_DURATION: &str = "CLIP_MIN_DURATION_SECS";
/// Environment variable overriding [`MAX_DURATION_SECONDS`].
pub const ENV_MAX_DURATION: &str = "CLIP_MAX_DURATION_SECS";
/// Environment variable overriding [`SUSPICIOUS_LONG_DURATION_SECONDS`].
pub const ENV_SUSPICIOUS_LONG: &str = "CLIP_SUSPICIOUS_LONG_SECS";
/// Environment variable overriding [`MAX_PLAUSIBLE_START_SECONDS`].
pub const ENV_MAX_PLAUSIBLE_START: &str = "CLIP_MAX_PLAUSIBLE_START_SECS";
/// Environment variable overriding [`DEFAULT_REPAIR_DURATION_SECONDS`].
pub const ENV_DEFAULT_REPAIR_DURATION: &str = "CLIP_DEFAULT_REPAIR_DURATION_SECS";

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

/// The full set of limits used by validation and repair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipTimeThresholds {
    pub min_duration_seconds: Seconds,
    pub max_duration_seconds: Seconds,
    pub suspicious_long_duration_seconds: Seconds,
    pub max_plausible_start_seconds: Seconds,
    pub default_repair_duration_seconds: Seconds,
}

impl Default for ClipTimeThresholds {
    fn default() -> Self {
        Self {
            min_duration_seconds: MIN_DURATION_SECONDS,
            max_duration_seconds: MAX_DURATION_SECONDS,
            suspicious_long_duration_seconds: SUSPICIOUS_LONG_DURATION_SECONDS,
            max_plausible_start_seconds: MAX_PLAUSIBLE_START_SECONDS,
            default_repair_duration_seconds: DEFAULT_REPAIR_DURATION_SECONDS,
        }
    }
}

impl ClipTimeThresholds {
    /// Check that the limits are finite, positive and consistently ordered.
    ///
    /// Requires `min < suspicious <= max`; setting `suspicious == max`
    /// disables the soft long-duration check. The repair fallback duration
    /// must itself be a valid clip length.
    pub fn validate(&self) -> Result<(), CoreError> {
        let named = [
            ("min_duration_seconds", self.min_duration_seconds),
            ("max_duration_seconds", self.max_duration_seconds),
            (
                "suspicious_long_duration_seconds",
                self.suspicious_long_duration_seconds,
            ),
            (
                "max_plausible_start_seconds",
                self.max_plausible_start_seconds,
            ),
            (
                "default_repair_duration_seconds",
                self.default_repair_duration_seconds,
            ),
        ];
        for (name, value) in named {
            if !value.is_finite() || value <= 0.0 {
                return Err(CoreError::Validation(format!(
                    "{name} must be a positive number of seconds, got {value}"
                )));
            }
        }
        if self.min_duration_seconds >= self.suspicious_long_duration_seconds {
            return Err(CoreError::Validation(format!(
                "min_duration_seconds ({}) must be below suspicious_long_duration_seconds ({})",
                self.min_duration_seconds, self.suspicious_long_duration_seconds
            )));
        }
        if self.suspicious_long_duration_seconds > self.max_duration_seconds {
            return Err(CoreError::Validation(format!(
                "suspicious_long_duration_seconds ({}) must not exceed max_duration_seconds ({})",
                self.suspicious_long_duration_seconds, self.max_duration_seconds
            )));
        }
        if self.default_repair_duration_seconds < self.min_duration_seconds
            || self.default_repair_duration_seconds > self.max_duration_seconds
        {
            return Err(CoreError::Validation(format!(
                "default_repair_duration_seconds ({}) must lie within [{}, {}]",
                self.default_repair_duration_seconds,
                self.min_duration_seconds,
                self.max_duration_seconds
            )));
        }
        Ok(())
    }

    /// Build thresholds from a key lookup, falling back to the defaults.
    ///
    /// The lookup is usually `|key| std::env::var(key).ok()`; taking a
    /// closure keeps this crate free of process-environment access.
    ///
    /// | Key                                  | Default  |
    /// |--------------------------------------|----------|
    /// | `CLIP_MIN_DURATION_SECS`             | `5`      |
    /// | `CLIP_MAX_DURATION_SECS`             | `1800`   |
    /// | `CLIP_SUSPICIOUS_LONG_SECS`          | max      |
    /// | `CLIP_MAX_PLAUSIBLE_START_SECS`      | `10800`  |
    /// | `CLIP_DEFAULT_REPAIR_DURATION_SECS`  | `300`    |
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let max_duration_seconds =
            parse_override(&lookup, ENV_MAX_DURATION, defaults.max_duration_seconds)?;
        let thresholds = Self {
            min_duration_seconds: parse_override(
                &lookup,
                ENV_MIN_DURATION,
                defaults.min_duration_seconds,
            )?,
            max_duration_seconds,
            // Unset, the soft limit follows the hard one and stays off.
            suspicious_long_duration_seconds: parse_override(
                &lookup,
                ENV_SUSPICIOUS_LONG,
                max_duration_seconds,
            )?,
            max_plausible_start_seconds: parse_override(
                &lookup,
                ENV_MAX_PLAUSIBLE_START,
                defaults.max_plausible_start_seconds,
            )?,
            default_repair_duration_seconds: parse_override(
                &lookup,
                ENV_DEFAULT_REPAIR_DURATION,
                defaults.default_repair_duration_seconds,
            )?,
        };
        thresholds.validate()?;
        Ok(thresholds)
    }
}

fn parse_override<F>(lookup: &F, key: &str, default: Seconds) -> Result<Seconds, CoreError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw.trim().parse::<Seconds>().map_err(|_| {
            CoreError::Validation(format!("{key} must be a number of seconds, got '{raw}'"))
        }),
        _ => Ok(default),
    }
}

// ---------------------------------------------------------------------------
// Input record
// ---------------------------------------------------------------------------

/// One of the two recorded time fields of a clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeField {
    Start,
    End,
}

impl TimeField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::End => "end",
        }
    }
}

impl std::fmt::Display for TimeField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The strict time-range shape the validator works on.
///
/// Raw documents are converted into this shape by
/// [`crate::clip_normalize::normalize_clip_document`]; any field that was
/// missing or unparseable there is zeroed and listed in `coerced_fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipTimeRecord {
    pub id: ClipId,
    pub start_time_seconds: Seconds,
    pub end_time_seconds: Seconds,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coerced_fields: Vec<TimeField>,
}

impl ClipTimeRecord {
    pub fn new(id: impl Into<ClipId>, start_time_seconds: Seconds, end_time_seconds: Seconds) -> Self {
        Self {
            id: id.into(),
            start_time_seconds,
            end_time_seconds,
            episode: None,
            title: None,
            coerced_fields: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Signed duration `end - start`.
    pub fn duration_seconds(&self) -> Seconds {
        self.end_time_seconds - self.start_time_seconds
    }

    /// Label used in diagnostic messages: the title when present, else the id.
    pub fn label(&self) -> &str {
        match self.title.as_deref() {
            Some(title) if !title.trim().is_empty() => title,
            _ => &self.id,
        }
    }
}

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// Triage priority of a finding. Ordered `High > Medium > Low`.
///
/// Variants are declared lowest first so the derived `Ord` is the
/// severity order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// All severities, most severe first.
    pub const ALL: [Severity; 3] = [Severity::High, Severity::Medium, Severity::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Parse a severity string. Returns `None` for unknown values.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Finding kind
// ---------------------------------------------------------------------------

/// Reason code of a finding. Variants are declared in rule order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FindingKind {
    NegativeDuration,
    ZeroDuration,
    TooShort,
    TooLong,
    SuspiciouslyLong,
    StartOutOfRange,
}

impl FindingKind {
    /// All kinds, in rule evaluation order.
    pub const ALL: [FindingKind; 6] = [
        FindingKind::NegativeDuration,
        FindingKind::ZeroDuration,
        FindingKind::TooShort,
        FindingKind::TooLong,
        FindingKind::SuspiciouslyLong,
        FindingKind::StartOutOfRange,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NegativeDuration => "NEGATIVE_DURATION",
            Self::ZeroDuration => "ZERO_DURATION",
            Self::TooShort => "TOO_SHORT",
            Self::TooLong => "TOO_LONG",
            Self::SuspiciouslyLong => "SUSPICIOUSLY_LONG",
            Self::StartOutOfRange => "START_OUT_OF_RANGE",
        }
    }

    /// Parse a reason code. Returns `None` for unknown values.
    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }

    /// The fixed severity attached to this kind.
    pub fn severity(&self) -> Severity {
        match self {
            Self::NegativeDuration | Self::ZeroDuration | Self::TooLong => Severity::High,
            Self::TooShort | Self::StartOutOfRange => Severity::Medium,
            Self::SuspiciouslyLong => Severity::Low,
        }
    }
}

impl std::fmt::Display for FindingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Finding
// ---------------------------------------------------------------------------

/// Values the finding was computed from.
///
/// Consumed by the repair heuristics and the admin UI. Times are the values
/// after coercion, so a coerced field shows up here as `0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FindingDetails {
    pub start_time_seconds: Seconds,
    pub end_time_seconds: Seconds,
    pub duration_seconds: Seconds,
    /// The limit that was crossed, for kinds that have one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold_seconds: Option<Seconds>,
    /// Fields that were missing, non-numeric or non-finite and read as `0`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coerced_fields: Vec<TimeField>,
}

/// A single diagnosis for one clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationFinding {
    pub clip_id: ClipId,
    pub kind: FindingKind,
    pub severity: Severity,
    pub message: String,
    pub details: FindingDetails,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate one clip's time range.
///
/// Returns `None` when the clip passes. Never panics: non-finite times are
/// read as `0` and reported in [`FindingDetails::coerced_fields`].
pub fn validate_clip_time(
    record: &ClipTimeRecord,
    thresholds: &ClipTimeThresholds,
) -> Option<ValidationFinding> {
    let mut coerced_fields = record.coerced_fields.clone();
    let start = finite_or_zero(record.start_time_seconds, TimeField::Start, &mut coerced_fields);
    let end = finite_or_zero(record.end_time_seconds, TimeField::End, &mut coerced_fields);
    let duration = end - start;
    let label = record.label();

    let (kind, threshold_seconds, mut message) = if duration < 0.0 {
        (
            FindingKind::NegativeDuration,
            None,
            format!(
                "{label}: end time {end}s is before start time {start}s \
                 (duration {duration}s); start and end look swapped"
            ),
        )
    } else if duration == 0.0 {
        (
            FindingKind::ZeroDuration,
            None,
            format!("{label}: start and end are both {start}s; the clip has no duration"),
        )
    } else if duration < thresholds.min_duration_seconds {
        let min = thresholds.min_duration_seconds;
        (
            FindingKind::TooShort,
            Some(min),
            format!("{label}: duration {duration}s is below the {min}s minimum"),
        )
    } else if duration > thresholds.max_duration_seconds {
        let max = thresholds.max_duration_seconds;
        (
            FindingKind::TooLong,
            Some(max),
            format!("{label}: duration {duration}s exceeds the {max}s maximum"),
        )
    } else if duration > thresholds.suspicious_long_duration_seconds {
        let soft = thresholds.suspicious_long_duration_seconds;
        (
            FindingKind::SuspiciouslyLong,
            Some(soft),
            format!("{label}: duration {duration}s is longer than {soft}s, unusual for a testimony"),
        )
    } else if start > thresholds.max_plausible_start_seconds {
        let limit = thresholds.max_plausible_start_seconds;
        (
            FindingKind::StartOutOfRange,
            Some(limit),
            format!("{label}: start offset {start}s is beyond {limit}s, likely a data-entry error"),
        )
    } else {
        return None;
    };

    if !coerced_fields.is_empty() {
        let names: Vec<&str> = coerced_fields.iter().map(TimeField::as_str).collect();
        message.push_str(&format!(
            " (missing or non-numeric {} read as 0)",
            names.join("/")
        ));
    }

    Some(ValidationFinding {
        clip_id: record.id.clone(),
        kind,
        severity: kind.severity(),
        message,
        details: FindingDetails {
            start_time_seconds: start,
            end_time_seconds: end,
            duration_seconds: duration,
            threshold_seconds,
            coerced_fields,
        },
    })
}

/// Convenience wrapper: `true` when the clip produces no finding.
pub fn is_clean(record: &ClipTimeRecord, thresholds: &ClipTimeThresholds) -> bool {
    validate_clip_time(record, thresholds).is_none()
}

fn finite_or_zero(value: Seconds, field: TimeField, coerced: &mut Vec<TimeField>) -> Seconds {
    if value.is_finite() {
        value
    } else {
        if !coerced.contains(&field) {
            coerced.push(field);
        }
        0.0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
