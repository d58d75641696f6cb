use serde::{Deserialize, Serialize};

use crate::models::Semester;

/// Schema version of the persisted document. The version gate refuses to
/// read anything newer than this.
pub const CURRENT_STORE_VERSION: u32 = 8;

/// The whole persisted document: every semester plus which one is open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreDocument {
    pub version: u32,
    pub active_semester_id: String,
    pub semesters: Vec<Semester>,
}

impl StoreDocument {
    pub fn active_semester(&self) -> &Semester {
        self.semesters
            .iter()
            .find(|s| s.id == self.active_semester_id)
            .unwrap_or(&self.semesters[0])
    }

    pub fn total_courses(&self) -> usize {
        self.semesters.iter().map(|s| s.courses.len()).sum()
    }
}
