//! Schema version resolution and the migration ladder.
//!
//! Migration is strictly forward, one step at a time, through an ordered
//! sequence of pure `Doc -> Doc` functions until the canonical version is
//! reached. Each step rewrites only the fields it owns and passes every
//! other field through unchanged; a field belonging to another schema
//! generation fails the step rather than being guessed at.

use std::collections::BTreeMap;

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, Time};

use crate::document::Doc;
use crate::error::{ConfigError, VersionError};
use crate::model::Version;

const DATE_FORMAT: &[time::format_description::FormatItem<'static>] =
    format_description!("[year]-[month]-[day]");

/// Detect the declared schema version and migrate the document to the
/// canonical version. Returns the canonical document and the resolved
/// (canonical) version.
pub fn resolve(doc: Doc) -> Result<(Doc, Version), ConfigError> {
    let declared = detect(&doc)?;
    let mut map = match doc {
        Doc::Map(m) => m,
        other => {
            return Err(ConfigError::Structure {
                field: "document".to_string(),
                expected: "mapping",
                got: other.kind_name(),
            })
        }
    };

    let mut version = declared;
    while version < Version::CANONICAL {
        (map, version) = match version {
            Version::V1_0 => (migrate_1_0_to_1_1(map)?, Version::V1_1),
            Version::V1_1 => (migrate_1_1_to_2_0(map)?, Version::V2_0),
            other => {
                return Err(VersionError::Unsupported {
                    tag: other.to_string(),
                }
                .into())
            }
        };
        map.insert("version".to_string(), Doc::Str(version.to_string()));
    }

    Ok((Doc::Map(map), version))
}

/// Read the version tag. Absence defaults to the oldest supported
/// version; string, float, and integer scalars are accepted.
fn detect(doc: &Doc) -> Result<Version, ConfigError> {
    let tag = match doc.get("version") {
        None => return Ok(Version::OLDEST),
        Some(Doc::Str(s)) => s.clone(),
        Some(Doc::Float(f)) if f.fract() == 0.0 => format!("{}.0", f),
        Some(Doc::Float(f)) => format!("{}", f),
        Some(Doc::Int(i)) => format!("{}.0", i),
        Some(other) => {
            return Err(VersionError::Malformed {
                tag: other.kind_name().to_string(),
            }
            .into())
        }
    };

    let parsed = parse_tag(&tag).ok_or_else(|| VersionError::Malformed { tag: tag.clone() })?;
    if !Version::SUPPORTED.contains(&parsed) {
        return Err(VersionError::Unsupported { tag }.into());
    }
    Ok(parsed)
}

fn parse_tag(tag: &str) -> Option<Version> {
    let (major, minor) = tag.split_once('.')?;
    // Reject signs and whitespace that u32::from_str would tolerate.
    if !is_plain_digits(major) || !is_plain_digits(minor) {
        return None;
    }
    Some(Version {
        major: major.parse().ok()?,
        minor: minor.parse().ok()?,
    })
}

fn is_plain_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

/// v1.0 -> v1.1: the mandatory `day`/`month`/`year` integer triple is
/// replaced by a single explicit `createdAt` date field.
fn migrate_1_0_to_1_1(mut map: BTreeMap<String, Doc>) -> Result<BTreeMap<String, Doc>, ConfigError> {
    if map.contains_key("createdAt") {
        return Err(VersionError::MixedFields {
            version: "1.0".to_string(),
            field: "createdAt".to_string(),
        }
        .into());
    }

    let mut parts = [0i64; 3];
    for (slot, field) in parts.iter_mut().zip(["day", "month", "year"]) {
        let value = map
            .get(field)
            .filter(|d| !d.is_null())
            .ok_or_else(|| ConfigError::MissingField {
                field: field.to_string(),
            })?
            .as_int(field)?;
        if value <= 0 {
            return Err(VersionError::InvalidDatePart {
                field: field.to_string(),
            }
            .into());
        }
        *slot = value;
    }
    let [day, month, year] = parts;

    map.remove("day");
    map.remove("month");
    map.remove("year");
    map.insert(
        "createdAt".to_string(),
        Doc::Str(format!("{:04}-{:02}-{:02}", year, month, day)),
    );
    Ok(map)
}

/// v1.1 -> v2.0: `createdAt` is normalized to a validated date-only
/// representation and the validity window bounds to RFC 3339 instants.
fn migrate_1_1_to_2_0(mut map: BTreeMap<String, Doc>) -> Result<BTreeMap<String, Doc>, ConfigError> {
    for legacy in ["day", "month", "year"] {
        if map.contains_key(legacy) {
            return Err(VersionError::MixedFields {
                version: "1.1".to_string(),
                field: legacy.to_string(),
            }
            .into());
        }
    }

    let created = map
        .get("createdAt")
        .filter(|d| !d.is_null())
        .ok_or_else(|| ConfigError::MissingField {
            field: "createdAt".to_string(),
        })?
        .as_str("createdAt")?
        .to_string();
    let date = parse_date("createdAt", &created)?;
    map.insert(
        "createdAt".to_string(),
        Doc::Str(date.format(DATE_FORMAT).map_err(|_| {
            VersionError::InvalidDate {
                field: "createdAt".to_string(),
                value: created.clone(),
            }
        })?),
    );

    for field in ["starts", "ends"] {
        if let Some(raw) = map.get(field).filter(|d| !d.is_null()) {
            let text = raw.as_str(field)?.to_string();
            let instant = parse_instant(field, &text)?;
            map.insert(
                field.to_string(),
                Doc::Str(instant.format(&Rfc3339).map_err(|_| {
                    VersionError::InvalidInstant {
                        field: field.to_string(),
                        value: text.clone(),
                    }
                })?),
            );
        }
    }

    Ok(map)
}

/// Parse a `YYYY-MM-DD` date field. Shared with the canonical parser.
pub(crate) fn parse_date(field: &str, value: &str) -> Result<Date, ConfigError> {
    Date::parse(value, DATE_FORMAT).map_err(|_| {
        VersionError::InvalidDate {
            field: field.to_string(),
            value: value.to_string(),
        }
        .into()
    })
}

/// Parse an instant field: RFC 3339, or a bare date taken as midnight UTC.
pub(crate) fn parse_instant(field: &str, value: &str) -> Result<OffsetDateTime, ConfigError> {
    if let Ok(dt) = OffsetDateTime::parse(value, &Rfc3339) {
        return Ok(dt);
    }
    if let Ok(date) = Date::parse(value, DATE_FORMAT) {
        return Ok(date.with_time(Time::MIDNIGHT).assume_utc());
    }
    Err(VersionError::InvalidInstant {
        field: field.to_string(),
        value: value.to_string(),
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(v: serde_json::Value) -> Doc {
        Doc::from_json(v)
    }

    #[test]
    fn missing_tag_defaults_to_oldest_and_migrates_to_canonical() {
        let input = doc(serde_json::json!({
            "day": 31, "month": 8, "year": 2024
        }));
        let (out, version) = resolve(input).unwrap();
        assert_eq!(version, Version::CANONICAL);
        assert_eq!(out.get("createdAt"), Some(&Doc::Str("2024-08-31".into())));
        assert!(out.get("day").is_none());
    }

    #[test]
    fn float_and_string_tags_both_parse() {
        for v in [serde_json::json!(1.0), serde_json::json!("1.0")] {
            let input = doc(serde_json::json!({
                "version": v, "day": 1, "month": 1, "year": 2024
            }));
            let (_, version) = resolve(input).unwrap();
            assert_eq!(version, Version::V2_0);
        }
    }

    #[test]
    fn malformed_tag_is_a_version_error() {
        let err = resolve(doc(serde_json::json!({ "version": "1.x" }))).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid version tag '1.x': expected 'major.minor' with non-negative integers"
        );
    }

    #[test]
    fn unsupported_tag_is_rejected() {
        let err = resolve(doc(serde_json::json!({ "version": "3.0" }))).unwrap_err();
        assert_eq!(
            err.to_string(),
            "unsupported version '3.0': supported versions are 1.0, 1.1, 2.0"
        );
    }

    #[test]
    fn v1_0_with_created_at_is_mixed_fields() {
        let err = resolve(doc(serde_json::json!({
            "version": "1.0", "day": 1, "month": 1, "year": 2024,
            "createdAt": "2024-01-01"
        })))
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "mixed version fields: a 1.0 document must not contain 'createdAt'"
        );
    }

    #[test]
    fn v1_1_with_legacy_date_parts_is_mixed_fields() {
        let err = resolve(doc(serde_json::json!({
            "version": "1.1", "createdAt": "2024-08-30", "day": 30
        })))
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "mixed version fields: a 1.1 document must not contain 'day'"
        );
    }

    #[test]
    fn v1_0_requires_all_three_date_parts() {
        let err = resolve(doc(serde_json::json!({ "day": 1, "year": 2024 }))).unwrap_err();
        assert_eq!(err.to_string(), "missing required field 'month'");
    }

    #[test]
    fn non_positive_date_part_is_rejected() {
        let err = resolve(doc(serde_json::json!({
            "day": 0, "month": 1, "year": 2024
        })))
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid value for 'day': expected a positive integer"
        );
    }

    #[test]
    fn validity_window_bounds_normalize_to_instants() {
        let (out, _) = resolve(doc(serde_json::json!({
            "version": "1.1",
            "createdAt": "2024-08-30",
            "starts": "2024-09-01",
            "ends": "2024-12-31T23:59:59Z"
        })))
        .unwrap();
        assert_eq!(out.get("starts"), Some(&Doc::Str("2024-09-01T00:00:00Z".into())));
        assert_eq!(out.get("ends"), Some(&Doc::Str("2024-12-31T23:59:59Z".into())));
    }

    #[test]
    fn invalid_calendar_date_fails_fast() {
        let err = resolve(doc(serde_json::json!({
            "version": "1.1", "createdAt": "2024-13-40"
        })))
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid date '2024-13-40' for 'createdAt': expected YYYY-MM-DD"
        );
    }

    #[test]
    fn untouched_fields_pass_through_unchanged() {
        let (out, _) = resolve(doc(serde_json::json!({
            "day": 1, "month": 2, "year": 2024,
            "saasName": "petclinic",
            "features": { "chat": { "type": "CAPABILITY" } }
        })))
        .unwrap();
        assert_eq!(out.get("saasName"), Some(&Doc::Str("petclinic".into())));
        assert!(out.get("features").is_some());
    }
}
