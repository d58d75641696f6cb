//! The in-memory state container and its mutation API.
//!
//! Every operation is a copy-on-write transform over the previous document
//! value; nothing mutates a semester or course in place. After a mutation
//! commits, the document is written back to storage fire-and-forget — a
//! failed write never unwinds the in-memory state.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;
use unicode_normalization::UnicodeNormalization;

use crate::models::semester::{REASON_RESET, REASON_UPDATE};
use crate::models::{CURRENT_STORE_VERSION, Course, Semester, StoreDocument};
use crate::normalize::{parse_course_list, parse_store};
use crate::storage::{Storage, backup};

pub const FALLBACK_SEMESTER_NAME: &str = "未命名学期";

/// Result of a user-initiated Void Drop import.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct VoidDropImport {
    pub ok: bool,
    pub count: usize,
}

/// Builds the document used on first run: one semester seeded from the
/// built-in dataset.
pub fn default_document(default_data: &[Course]) -> StoreDocument {
    let semester = Semester::new(crate::defaults::DEFAULT_SEMESTER_NAME, default_data.to_vec());
    StoreDocument {
        version: CURRENT_STORE_VERSION,
        active_semester_id: semester.id.clone(),
        semesters: vec![semester],
    }
}

/// Case/width-insensitive fold used to compare semester names: trim, NFKC,
/// lowercase. Internal whitespace is left alone.
pub fn fold_semester_name(name: &str) -> String {
    name.trim().nfkc().collect::<String>().to_lowercase()
}

fn unique_semester_name(base: &str, semesters: &[Semester]) -> String {
    let trimmed = base.trim();
    let trimmed = if trimmed.is_empty() { FALLBACK_SEMESTER_NAME } else { trimmed };
    let existing: HashSet<&str> = semesters.iter().map(|s| s.name.as_str()).collect();
    if !existing.contains(trimmed) {
        return trimmed.to_string();
    }
    let mut n = 2;
    loop {
        let candidate = format!("{trimmed} ({n})");
        if !existing.contains(candidate.as_str()) {
            return candidate;
        }
        n += 1;
    }
}

/// Insertion order carries no meaning, so two lists holding the same course
/// multiset are the same schedule.
fn same_courses(a: &[Course], b: &[Course]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let key = |c: &Course| serde_json::to_string(c).unwrap_or_default();
    let mut left: Vec<String> = a.iter().map(key).collect();
    let mut right: Vec<String> = b.iter().map(key).collect();
    left.sort();
    right.sort();
    left == right
}

pub struct CoursesStore {
    document: StoreDocument,
    default_data: Vec<Course>,
    storage: Arc<dyn Storage>,
    storage_key: String,
}

impl CoursesStore {
    pub fn new(
        storage: Arc<dyn Storage>,
        storage_key: impl Into<String>,
        default_data: Vec<Course>,
        document: StoreDocument,
    ) -> Self {
        Self {
            document,
            default_data,
            storage,
            storage_key: storage_key.into(),
        }
    }

    /// Store over a fresh default document, bypassing bootstrap.
    pub fn with_defaults(
        storage: Arc<dyn Storage>,
        storage_key: impl Into<String>,
        default_data: Vec<Course>,
    ) -> Self {
        let document = default_document(&default_data);
        Self::new(storage, storage_key, default_data, document)
    }

    pub fn document(&self) -> &StoreDocument {
        &self.document
    }

    pub fn semesters(&self) -> &[Semester] {
        &self.document.semesters
    }

    pub fn active_semester(&self) -> &Semester {
        self.document.active_semester()
    }

    pub fn courses(&self) -> &[Course] {
        &self.active_semester().courses
    }

    /// Replaces the active semester's course list, recording a history
    /// snapshot. No-op when the course multiset is unchanged, so repeated
    /// saves of the same schedule do not spam the history.
    pub fn update_courses(&mut self, next: Vec<Course>) {
        let active = self.document.active_semester();
        if same_courses(&active.courses, &next) {
            debug!("update_courses: unchanged, skipping snapshot");
            return;
        }
        let updated = active.with_courses(REASON_UPDATE, next);
        self.commit_semester(updated);
    }

    /// Replaces the active semester's courses with the built-in dataset.
    pub fn reset_courses(&mut self) {
        let next = self.default_data.clone();
        let updated = self.document.active_semester().with_courses(REASON_RESET, next);
        self.commit_semester(updated);
    }

    /// Switches the open semester; silently ignored for unknown ids.
    pub fn set_active_semester(&mut self, semester_id: &str) {
        if !self.document.semesters.iter().any(|s| s.id == semester_id) {
            debug!("set_active_semester: unknown id {}", semester_id);
            return;
        }
        self.document.active_semester_id = semester_id.to_string();
        self.persist();
    }

    /// Creates a new semester (name de-duplicated against existing ones),
    /// prepends it and makes it active. Returns the new semester's id.
    pub fn create_semester_from_courses(&mut self, name: &str, courses: Vec<Course>) -> String {
        let fallback = format!("学期 {}", self.document.semesters.len() + 1);
        let desired = if name.trim().is_empty() { fallback } else { name.trim().to_string() };
        let unique = unique_semester_name(&desired, &self.document.semesters);

        let semester = Semester::new(unique, courses);
        let id = semester.id.clone();
        self.document.semesters.insert(0, semester);
        self.document.active_semester_id = id.clone();
        self.persist();
        id
    }

    /// Applies a snapshot's frozen course list back onto the active
    /// semester. The restore itself is recorded as a new snapshot, so
    /// history keeps moving forward. No-op for unknown snapshot ids.
    pub fn restore_snapshot_to_active(&mut self, snapshot_id: &str) {
        let active = self.document.active_semester();
        let Some(snapshot) = active.find_snapshot(snapshot_id) else {
            debug!("restore_snapshot_to_active: unknown snapshot {}", snapshot_id);
            return;
        };
        let reason = format!("回溯到 {}", snapshot.created_at);
        let updated = active.with_courses(reason, snapshot.courses.clone());
        self.commit_semester(updated);
    }

    /// Materializes a snapshot as a brand-new semester instead of touching
    /// the active one. Non-destructive exploration of history.
    pub fn restore_snapshot_as_new_semester(&mut self, snapshot_id: &str, name: Option<&str>) {
        let active = self.document.active_semester();
        let Some(snapshot) = active.find_snapshot(snapshot_id) else {
            debug!("restore_snapshot_as_new_semester: unknown snapshot {}", snapshot_id);
            return;
        };
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}-回溯副本", active.name));
        let courses = snapshot.courses.clone();
        self.create_semester_from_courses(&name, courses);
    }

    /// Bridge for spreadsheet import: a detected term name that differs from
    /// the open semester (after name folding) creates a new timeline entry
    /// rather than overwriting unrelated data; otherwise this is an update.
    pub fn import_from_external(&mut self, courses: Vec<Course>, semester_name: Option<&str>) {
        if let Some(raw) = semester_name {
            let imported = fold_semester_name(raw);
            let active = fold_semester_name(&self.document.active_semester().name);
            if !imported.is_empty() && imported != active {
                self.create_semester_from_courses(raw, courses);
                return;
            }
        }
        self.update_courses(courses);
    }

    /// Serializes the whole document for upload to a Void Drop channel.
    pub fn export_for_void_drop(&self) -> String {
        self.serialize()
    }

    /// Accepts text from a Void Drop channel: a full store replaces the
    /// document (after backing up the current one), a bare course list
    /// merges into the active semester. Neither parsing → `ok: false`.
    pub fn import_from_void_drop_payload(&mut self, text: &str) -> VoidDropImport {
        if let Some(parsed) = parse_store(text, &self.default_data) {
            backup(
                self.storage.as_ref(),
                &self.storage_key,
                &self.serialize(),
                "void_replace_backup",
            );
            let count = parsed.total_courses();
            self.document = parsed;
            self.persist();
            return VoidDropImport { ok: true, count };
        }

        if let Some(courses) = parse_course_list(text) {
            let count = courses.len();
            self.update_courses(courses);
            return VoidDropImport { ok: true, count };
        }

        VoidDropImport { ok: false, count: 0 }
    }

    fn commit_semester(&mut self, semester: Semester) {
        // Replace the element matching id, keep the others.
        self.document.semesters = self
            .document
            .semesters
            .iter()
            .map(|s| if s.id == semester.id { semester.clone() } else { s.clone() })
            .collect();
        self.persist();
    }

    fn serialize(&self) -> String {
        serde_json::to_string(&self.document).unwrap_or_default()
    }

    fn persist(&self) {
        self.storage.write(&self.storage_key, &self.serialize());
    }
}
