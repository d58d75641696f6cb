//! Normalization pipeline for untrusted schedule data.
//!
//! Every byte entering the store (local cache, remote blob, file import)
//! lands here first as a `serde_json::Value` and is narrowed field by field.
//! Nothing in this module panics or returns an error: a record is either
//! repaired into a well-formed value or dropped, and the caller decides the
//! fallback policy.

use std::collections::BTreeSet;

use chrono::Utc;
use serde_json::Value;
use tracing::warn;

use crate::models::course::{MAX_DAY, MAX_ROW, MAX_WEEK, MIN_DAY, MIN_ROW, MIN_WEEK};
use crate::models::semester::{REASON_INIT, REASON_RECOVERED, new_snapshot_id};
use crate::models::{CURRENT_STORE_VERSION, Course, CourseType, Semester, Snapshot, StoreDocument};

/// Name given to the synthetic semester created when a pre-multi-semester
/// payload (a bare course array) is upgraded.
pub const LEGACY_IMPORT_NAME: &str = "Legacy 导入学期";

fn to_int(value: &Value) -> Option<i64> {
    let num = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !num.is_finite() {
        return None;
    }
    Some(num.trunc() as i64)
}

fn non_blank(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn normalize_weeks(value: Option<&Value>) -> Vec<u8> {
    let Some(items) = value.and_then(Value::as_array) else {
        return Vec::new();
    };
    let weeks: BTreeSet<u8> = items
        .iter()
        .filter_map(to_int)
        .filter(|w| (MIN_WEEK..=MAX_WEEK).contains(w))
        .map(|w| w as u8)
        .collect();
    weeks.into_iter().collect()
}

fn normalize_type(value: Option<&Value>) -> CourseType {
    match value.and_then(Value::as_str) {
        Some("ssr") => CourseType::Ssr,
        _ => CourseType::Normal,
    }
}

/// Validates and repairs a single untrusted record into a [`Course`].
///
/// Coercion happens before validation: numeric-looking strings are accepted
/// for `day`/`row`/`weeks` and truncated to integers, out-of-range week
/// entries are dropped individually. The record as a whole is rejected when
/// the name is blank, day/row are missing or out of range, or no valid week
/// survives filtering.
pub fn normalize_course(value: &Value, fallback_id: &str) -> Option<Course> {
    let obj = value.as_object()?;

    let name = non_blank(obj.get("name"))?.to_string();
    let day = to_int(obj.get("day")?)?;
    let row = to_int(obj.get("row")?)?;
    let weeks = normalize_weeks(obj.get("weeks"));

    if weeks.is_empty() {
        return None;
    }
    if !(MIN_DAY..=MAX_DAY).contains(&day) || !(MIN_ROW..=MAX_ROW).contains(&row) {
        return None;
    }

    let course_type = normalize_type(obj.get("type"));
    let id = non_blank(obj.get("id"))
        .map(str::to_string)
        .unwrap_or_else(|| fallback_id.to_string());
    let color = non_blank(obj.get("color"))
        .map(str::to_string)
        .unwrap_or_else(|| course_type.default_color().to_string());
    let location = non_blank(obj.get("location")).map(str::to_string);

    Some(Course {
        id,
        name,
        day: day as u8,
        row: row as u8,
        weeks,
        course_type,
        color,
        location,
    })
}

/// Runs [`normalize_course`] across an untrusted list, dropping invalid
/// entries silently. Partial success is the designed behavior: 50 records
/// with 3 malformed entries yield 47 courses, not a batch failure.
pub fn normalize_courses(value: &Value) -> Vec<Course> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };
    let stamp = Utc::now().timestamp_millis();
    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| normalize_course(item, &format!("imported-{stamp}-{index}")))
        .collect()
}

fn normalize_snapshot(value: &Value, now: &str) -> Option<Snapshot> {
    let obj = value.as_object()?;
    Some(Snapshot {
        id: obj
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(new_snapshot_id),
        created_at: obj
            .get("createdAt")
            .and_then(Value::as_str)
            .unwrap_or(now)
            .to_string(),
        reason: obj
            .get("reason")
            .and_then(Value::as_str)
            .unwrap_or(REASON_RECOVERED)
            .to_string(),
        courses: normalize_courses(obj.get("courses").unwrap_or(&Value::Null)),
    })
}

/// Validates a list of untrusted semester records. Non-object entries are
/// excluded, not replaced with stubs. Each surviving semester is guaranteed
/// at least one snapshot: if none survive normalization, a synthetic
/// initializing snapshot of the current courses is injected.
pub fn normalize_semesters(value: &Value) -> Vec<Semester> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };
    let now = Utc::now().to_rfc3339();

    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let obj = item.as_object()?;
            let courses = normalize_courses(obj.get("courses").unwrap_or(&Value::Null));
            let name = non_blank(obj.get("name"))
                .map(str::to_string)
                .unwrap_or_else(|| format!("学期 {}", index + 1));
            let id = non_blank(obj.get("id"))
                .map(str::to_string)
                .unwrap_or_else(|| format!("semester-{}", index + 1));

            let mut snapshots: Vec<Snapshot> = obj
                .get("snapshots")
                .and_then(Value::as_array)
                .map(|raw| {
                    raw.iter()
                        .filter_map(|snap| normalize_snapshot(snap, &now))
                        .collect()
                })
                .unwrap_or_default();

            if snapshots.is_empty() {
                snapshots.push(Snapshot {
                    id: new_snapshot_id(),
                    created_at: now.clone(),
                    reason: REASON_INIT.to_string(),
                    courses: courses.clone(),
                });
            }

            Some(Semester {
                id,
                name,
                courses,
                snapshots,
                created_at: obj
                    .get("createdAt")
                    .and_then(Value::as_str)
                    .unwrap_or(&now)
                    .to_string(),
                updated_at: obj
                    .get("updatedAt")
                    .and_then(Value::as_str)
                    .unwrap_or(&now)
                    .to_string(),
            })
        })
        .collect()
}

/// The version gate: parses raw persisted text into a well-formed
/// [`StoreDocument`], or `None` when the text cannot be trusted.
///
/// A bare JSON array is the pre-multi-semester legacy format and gets
/// wrapped into a single synthetic semester (seeded with `default_data`
/// when the array normalizes to nothing). An object with a `version`
/// newer than [`CURRENT_STORE_VERSION`] is rejected outright rather than
/// misread; the caller falls back to last-known-good data.
pub fn parse_store(text: &str, default_data: &[Course]) -> Option<StoreDocument> {
    let parsed: Value = serde_json::from_str(text).ok()?;

    if parsed.is_array() {
        let legacy = normalize_courses(&parsed);
        let courses = if legacy.is_empty() {
            default_data.to_vec()
        } else {
            legacy
        };
        let semester = Semester::new(LEGACY_IMPORT_NAME, courses);
        return Some(StoreDocument {
            version: CURRENT_STORE_VERSION,
            active_semester_id: semester.id.clone(),
            semesters: vec![semester],
        });
    }

    let obj = parsed.as_object()?;

    if let Some(version) = obj.get("version").and_then(Value::as_i64) {
        if version > CURRENT_STORE_VERSION as i64 {
            warn!("unsupported store version: {}", version);
            return None;
        }
    }

    let semesters = normalize_semesters(obj.get("semesters").unwrap_or(&Value::Null));
    if semesters.is_empty() {
        return None;
    }

    let active_semester_id = obj
        .get("activeSemesterId")
        .and_then(Value::as_str)
        .filter(|id| semesters.iter().any(|s| s.id == *id))
        .unwrap_or(&semesters[0].id)
        .to_string();

    Some(StoreDocument {
        version: CURRENT_STORE_VERSION,
        active_semester_id,
        semesters,
    })
}

/// Parses text expected to hold a bare course array. A nonempty array that
/// normalizes to nothing is treated as garbage, not as an empty schedule.
pub fn parse_course_list(text: &str) -> Option<Vec<Course>> {
    let parsed: Value = serde_json::from_str(text).ok()?;
    let items = parsed.as_array()?;
    let normalized = normalize_courses(&parsed);
    if !items.is_empty() && normalized.is_empty() {
        return None;
    }
    Some(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_course_accepts_clean_record() {
        let value = json!({
            "id": "1",
            "name": "算法",
            "day": 0,
            "row": 3,
            "weeks": [9, 10, 11, 12, 13, 14, 15, 16],
            "type": "normal",
        });
        let course = normalize_course(&value, "fallback").expect("valid record");
        assert_eq!(course.id, "1");
        assert_eq!(course.name, "算法");
        assert_eq!(course.weeks, vec![9, 10, 11, 12, 13, 14, 15, 16]);
        assert_eq!(course.course_type, CourseType::Normal);
        assert_eq!(course.color, CourseType::Normal.default_color());
        assert_eq!(course.location, None);
    }

    #[test]
    fn test_normalize_course_coerces_numeric_strings() {
        let value = json!({
            "name": "统计",
            "day": "1",
            "row": 3.9,
            "weeks": ["1", 2.7, "junk", 99, 2],
        });
        let course = normalize_course(&value, "fb").expect("coercible record");
        assert_eq!(course.day, 1);
        assert_eq!(course.row, 3);
        // Parsed, truncated, deduplicated, filtered, ascending.
        assert_eq!(course.weeks, vec![1, 2]);
        assert_eq!(course.id, "fb");
    }

    #[test]
    fn test_normalize_course_rejections() {
        assert!(normalize_course(&json!("not an object"), "fb").is_none());
        assert!(normalize_course(&json!({"day": 0, "row": 0, "weeks": [1]}), "fb").is_none());
        assert!(
            normalize_course(&json!({"name": "  ", "day": 0, "row": 0, "weeks": [1]}), "fb")
                .is_none()
        );
        assert!(
            normalize_course(&json!({"name": "x", "day": 6, "row": 0, "weeks": [1]}), "fb")
                .is_none()
        );
        assert!(
            normalize_course(&json!({"name": "x", "day": 0, "row": -1, "weeks": [1]}), "fb")
                .is_none()
        );
        // All weeks filtered out rejects the record, not just the weeks.
        assert!(
            normalize_course(&json!({"name": "x", "day": 0, "row": 0, "weeks": [0, 17]}), "fb")
                .is_none()
        );
    }

    #[test]
    fn test_normalize_course_ssr_defaults() {
        let value = json!({"name": "交响", "day": 2, "row": 2, "weeks": [1], "type": "ssr"});
        let course = normalize_course(&value, "fb").unwrap();
        assert_eq!(course.course_type, CourseType::Ssr);
        assert_eq!(course.color, CourseType::Ssr.default_color());

        // Anything but the exact tag is a normal course.
        let value = json!({"name": "x", "day": 0, "row": 0, "weeks": [1], "type": "SSR"});
        assert_eq!(normalize_course(&value, "fb").unwrap().course_type, CourseType::Normal);
    }

    #[test]
    fn test_normalize_course_trims_location() {
        let value = json!({"name": "x", "day": 0, "row": 0, "weeks": [1], "location": "  教三 201  "});
        assert_eq!(normalize_course(&value, "fb").unwrap().location.as_deref(), Some("教三 201"));

        let value = json!({"name": "x", "day": 0, "row": 0, "weeks": [1], "location": "   "});
        assert_eq!(normalize_course(&value, "fb").unwrap().location, None);
    }

    #[test]
    fn test_normalize_courses_partial_failure() {
        let mut records = Vec::new();
        for i in 0..47 {
            records.push(json!({"name": format!("课程{i}"), "day": 0, "row": 0, "weeks": [1]}));
        }
        records.push(json!({"name": "", "day": 0, "row": 0, "weeks": [1]}));
        records.push(json!({"name": "x", "day": 99, "row": 0, "weeks": [1]}));
        records.push(json!({"name": "x", "day": 0, "row": 0, "weeks": []}));

        let courses = normalize_courses(&Value::Array(records));
        assert_eq!(courses.len(), 47);
        for course in &courses {
            assert!(!course.name.is_empty());
            assert!(course.day <= 5 && course.row <= 5);
            assert!(!course.weeks.is_empty());
        }
    }

    #[test]
    fn test_normalize_courses_non_array_is_empty() {
        assert!(normalize_courses(&json!({"0": "not a list"})).is_empty());
        assert!(normalize_courses(&Value::Null).is_empty());
    }

    #[test]
    fn test_normalize_courses_fallback_ids_are_unique() {
        let records = json!([
            {"name": "a", "day": 0, "row": 0, "weeks": [1]},
            {"name": "b", "day": 0, "row": 0, "weeks": [1]},
        ]);
        let courses = normalize_courses(&records);
        assert_eq!(courses.len(), 2);
        assert_ne!(courses[0].id, courses[1].id);
    }

    #[test]
    fn test_normalize_semesters_injects_init_snapshot() {
        let value = json!([
            {"id": "s1", "name": "2026年1学期", "courses": [
                {"name": "算法", "day": 0, "row": 3, "weeks": [9]},
            ]},
        ]);
        let semesters = normalize_semesters(&value);
        assert_eq!(semesters.len(), 1);
        assert_eq!(semesters[0].snapshots.len(), 1);
        assert_eq!(semesters[0].snapshots[0].reason, REASON_INIT);
        assert_eq!(semesters[0].snapshots[0].courses, semesters[0].courses);
    }

    #[test]
    fn test_normalize_semesters_drops_garbage_entries() {
        let value = json!([42, "semester", null, {"name": "真实学期"}]);
        let semesters = normalize_semesters(&value);
        assert_eq!(semesters.len(), 1);
        assert_eq!(semesters[0].name, "真实学期");
    }

    #[test]
    fn test_normalize_semesters_defaults_name_by_index() {
        let semesters = normalize_semesters(&json!([{}, {}]));
        assert_eq!(semesters[0].name, "学期 1");
        assert_eq!(semesters[1].name, "学期 2");
    }

    #[test]
    fn test_normalize_semesters_recovers_snapshot_reason() {
        let value = json!([
            {"name": "s", "snapshots": [
                {"courses": [{"name": "x", "day": 0, "row": 0, "weeks": [1]}]},
                "corrupted entry",
            ]},
        ]);
        let semesters = normalize_semesters(&value);
        assert_eq!(semesters[0].snapshots.len(), 1);
        assert_eq!(semesters[0].snapshots[0].reason, REASON_RECOVERED);
    }

    #[test]
    fn test_parse_store_rejects_garbage() {
        assert!(parse_store("not json at all", &[]).is_none());
        assert!(parse_store("42", &[]).is_none());
        assert!(parse_store("\"just a string\"", &[]).is_none());
    }

    #[test]
    fn test_parse_store_version_fail_closed() {
        let text = json!({
            "version": 999,
            "activeSemesterId": "s1",
            "semesters": [{"id": "s1", "name": "s", "courses": []}],
        })
        .to_string();
        assert!(parse_store(&text, &[]).is_none());
    }

    #[test]
    fn test_parse_store_legacy_array_upgrade() {
        let text = json!([{"name": "X", "day": 0, "row": 0, "weeks": [1]}]).to_string();
        let store = parse_store(&text, &[]).expect("legacy upgrade");
        assert_eq!(store.version, CURRENT_STORE_VERSION);
        assert_eq!(store.semesters.len(), 1);
        assert_eq!(store.semesters[0].name, LEGACY_IMPORT_NAME);
        assert_eq!(store.semesters[0].courses.len(), 1);
        assert_eq!(store.semesters[0].courses[0].name, "X");
        assert_eq!(store.active_semester_id, store.semesters[0].id);
    }

    #[test]
    fn test_parse_store_legacy_empty_array_falls_back_to_defaults() {
        let defaults = crate::defaults::default_courses();
        let store = parse_store("[]", &defaults).expect("default seeded");
        assert_eq!(store.semesters[0].courses, defaults);
    }

    #[test]
    fn test_parse_store_rejects_zero_valid_semesters() {
        let text = json!({"version": 8, "semesters": []}).to_string();
        assert!(parse_store(&text, &[]).is_none());
        let text = json!({"version": 8, "semesters": "nope"}).to_string();
        assert!(parse_store(&text, &[]).is_none());
    }

    #[test]
    fn test_parse_store_resolves_dangling_active_id() {
        let text = json!({
            "version": 8,
            "activeSemesterId": "missing",
            "semesters": [{"id": "s1", "name": "s"}],
        })
        .to_string();
        let store = parse_store(&text, &[]).unwrap();
        assert_eq!(store.active_semester_id, "s1");
    }

    #[test]
    fn test_parse_store_round_trip_is_identity() {
        let text = json!({
            "version": 8,
            "activeSemesterId": "s1",
            "semesters": [{
                "id": "s1",
                "name": "2026年1学期",
                "courses": [{
                    "id": "1", "name": "算法", "day": 0, "row": 3,
                    "weeks": [9, 10, 11, 12, 13, 14, 15, 16], "type": "normal",
                    "color": "bg-emerald-100 text-emerald-700 border-emerald-200",
                }],
                "snapshots": [{
                    "id": "snap-1", "createdAt": "2026-01-01T00:00:00+00:00",
                    "reason": "初始化",
                    "courses": [{
                        "id": "1", "name": "算法", "day": 0, "row": 3,
                        "weeks": [9, 10, 11, 12, 13, 14, 15, 16], "type": "normal",
                        "color": "bg-emerald-100 text-emerald-700 border-emerald-200",
                    }],
                }],
                "createdAt": "2026-01-01T00:00:00+00:00",
                "updatedAt": "2026-01-01T00:00:00+00:00",
            }],
        })
        .to_string();

        let first = parse_store(&text, &[]).expect("well-formed store");
        let serialized = serde_json::to_string(&first).expect("serialize");
        let second = parse_store(&serialized, &[]).expect("round trip");
        assert_eq!(first, second);
        assert_eq!(second.semesters[0].name, "2026年1学期");
        assert_eq!(second.semesters[0].snapshots.len(), 1);
        assert_eq!(second.semesters[0].courses[0].name, "算法");
    }

    #[test]
    fn test_parse_course_list_guards() {
        assert!(parse_course_list("{}").is_none());
        assert!(parse_course_list("garbage").is_none());
        // Nonempty array where nothing survives is garbage, not an empty list.
        assert!(parse_course_list("[1, 2, 3]").is_none());
        assert_eq!(parse_course_list("[]").unwrap().len(), 0);
        let text = json!([{"name": "X", "day": 0, "row": 0, "weeks": [1]}]).to_string();
        assert_eq!(parse_course_list(&text).unwrap().len(), 1);
    }
}
