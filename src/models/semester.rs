use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Course;

/// Hard cap on per-semester history; the oldest entries are evicted.
pub const SNAPSHOT_LIMIT: usize = 30;

pub const REASON_INIT: &str = "初始化";
pub const REASON_UPDATE: &str = "课程更新";
pub const REASON_RESET: &str = "重置到默认数据";
pub const REASON_VOID_DOWNLOAD: &str = "Void Drop 下载覆盖";
pub const REASON_RECOVERED: &str = "历史快照";

/// Immutable point-in-time copy of a semester's course list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub id: String,
    pub created_at: String,
    pub reason: String,
    pub courses: Vec<Course>,
}

/// A named, independent timeline of schedule data with its own history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Semester {
    pub id: String,
    pub name: String,
    pub courses: Vec<Course>,
    pub snapshots: Vec<Snapshot>,
    pub created_at: String,
    pub updated_at: String,
}

pub fn new_semester_id() -> String {
    let now = Utc::now();
    let term = if now.month() >= 8 { 1 } else { 2 };
    let rand = Uuid::new_v4().simple().to_string();
    format!("{}-{}-{}", now.year(), term, &rand[..4])
}

pub fn new_snapshot_id() -> String {
    let rand = Uuid::new_v4().simple().to_string();
    format!("snap-{}-{}", Utc::now().timestamp_millis(), &rand[..4])
}

impl Semester {
    /// Creates a semester seeded with one initializing snapshot, so the
    /// "at least one snapshot" invariant holds from birth.
    pub fn new(name: impl Into<String>, courses: Vec<Course>) -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            id: new_semester_id(),
            name: name.into(),
            snapshots: vec![Snapshot {
                id: new_snapshot_id(),
                created_at: now.clone(),
                reason: REASON_INIT.to_string(),
                courses: courses.clone(),
            }],
            courses,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Value-producing course replacement: prepends a snapshot tagged with
    /// `reason`, evicts history beyond [`SNAPSHOT_LIMIT`] and refreshes
    /// `updated_at`. The caller is responsible for no-op suppression.
    pub fn with_courses(&self, reason: impl Into<String>, courses: Vec<Course>) -> Self {
        let now = Utc::now().to_rfc3339();
        let mut snapshots = Vec::with_capacity(self.snapshots.len() + 1);
        snapshots.push(Snapshot {
            id: new_snapshot_id(),
            created_at: now.clone(),
            reason: reason.into(),
            courses: courses.clone(),
        });
        snapshots.extend(self.snapshots.iter().cloned());
        snapshots.truncate(SNAPSHOT_LIMIT);

        Self {
            id: self.id.clone(),
            name: self.name.clone(),
            courses,
            snapshots,
            created_at: self.created_at.clone(),
            updated_at: now,
        }
    }

    pub fn find_snapshot(&self, snapshot_id: &str) -> Option<&Snapshot> {
        self.snapshots.iter().find(|s| s.id == snapshot_id)
    }
}
