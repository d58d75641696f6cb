use serde::{Deserialize, Serialize};

pub const MIN_DAY: i64 = 0;
pub const MAX_DAY: i64 = 5;
pub const MIN_ROW: i64 = 0;
pub const MAX_ROW: i64 = 5;
pub const MIN_WEEK: i64 = 1;
pub const MAX_WEEK: i64 = 16;

pub const DEFAULT_COLOR_NORMAL: &str = "bg-blue-100 text-blue-700 border-blue-200";
pub const DEFAULT_COLOR_SSR: &str = "bg-rose-100 text-rose-700 border-rose-200";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseType {
    Normal,
    Ssr,
}

impl CourseType {
    pub fn default_color(self) -> &'static str {
        match self {
            CourseType::Normal => DEFAULT_COLOR_NORMAL,
            CourseType::Ssr => DEFAULT_COLOR_SSR,
        }
    }
}

/// One scheduled class occurrence on the weekly grid.
///
/// `day` is 0=Mon..5=Sat, `row` is the time-slot index 0..=5, `weeks` the
/// ascending, deduplicated teaching weeks in 1..=16. A course with an empty
/// name, empty weeks or out-of-range day/row is never constructed; the
/// normalizer rejects such records outright.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub name: String,
    pub day: u8,
    pub row: u8,
    pub weeks: Vec<u8>,
    #[serde(rename = "type")]
    pub course_type: CourseType,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}
