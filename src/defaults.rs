//! Built-in seed data used on first run and as the bottom of the
//! remote → local → defaults fallback chain.

use crate::models::{Course, CourseType};

pub const DEFAULT_SEMESTER_NAME: &str = "2026年1学期";

fn weeks(start: u8, end: u8) -> Vec<u8> {
    (start..=end).collect()
}

fn course(
    id: &str,
    name: &str,
    day: u8,
    row: u8,
    weeks: Vec<u8>,
    course_type: CourseType,
    color: &str,
) -> Course {
    Course {
        id: id.to_string(),
        name: name.to_string(),
        day,
        row,
        weeks,
        course_type,
        color: color.to_string(),
        location: None,
    }
}

/// The stock schedule shown before the user has imported anything.
pub fn default_courses() -> Vec<Course> {
    vec![
        // Monday
        course("1", "大数据", 0, 0, weeks(9, 16), CourseType::Normal, "bg-blue-100 text-blue-700 border-blue-200"),
        course("2", "数据库", 0, 2, weeks(1, 8), CourseType::Normal, "bg-indigo-100 text-indigo-700 border-indigo-200"),
        course("3", "商务数分", 0, 2, weeks(9, 16), CourseType::Normal, "bg-purple-100 text-purple-700 border-purple-200"),
        course("4", "算法", 0, 3, weeks(9, 16), CourseType::Normal, "bg-emerald-100 text-emerald-700 border-emerald-200"),
        course("5", "工程经济", 0, 4, weeks(1, 8), CourseType::Normal, "bg-orange-100 text-orange-700 border-orange-200"),
        course("6", "大数据基础设施", 0, 4, weeks(9, 16), CourseType::Ssr, "bg-rose-100 text-rose-700 border-rose-200"),
        course("7", "AI创业", 0, 5, weeks(9, 16), CourseType::Ssr, "bg-rose-100 text-rose-700 border-rose-200"),
        // Tuesday
        course("8", "供应链", 1, 0, weeks(9, 16), CourseType::Normal, "bg-cyan-100 text-cyan-700 border-cyan-200"),
        course("9", "口语", 1, 1, vec![1, 3, 5, 7, 9, 11, 13, 15], CourseType::Normal, "bg-yellow-100 text-yellow-700 border-yellow-200"),
        course("10", "幸福学", 1, 2, weeks(11, 16), CourseType::Ssr, "bg-rose-100 text-rose-700 border-rose-200"),
        course("11", "统计", 1, 3, weeks(1, 8), CourseType::Normal, "bg-slate-200 text-slate-700 border-slate-300"),
        course("12", "信息资源", 1, 3, weeks(9, 16), CourseType::Normal, "bg-teal-100 text-teal-700 border-teal-200"),
        course("13", "职业", 1, 5, weeks(1, 4), CourseType::Normal, "bg-gray-100 text-gray-600 border-gray-200"),
        // Wednesday
        course("14", "大数据", 2, 0, weeks(9, 16), CourseType::Normal, "bg-blue-100 text-blue-700 border-blue-200"),
        course("15", "日本文学", 2, 1, vec![1, 2, 3, 4, 6, 7, 8, 9, 11, 12, 13, 14, 16], CourseType::Ssr, "bg-pink-100 text-pink-700 border-pink-200"),
        course("16", "交响", 2, 2, weeks(1, 16), CourseType::Ssr, "bg-rose-100 text-rose-700 border-rose-200"),
        course("17", "形势与政策", 2, 3, weeks(5, 8), CourseType::Normal, "bg-red-50 text-red-700 border-red-200"),
        course("18", "算法", 2, 3, weeks(9, 16), CourseType::Normal, "bg-emerald-100 text-emerald-700 border-emerald-200"),
        // Thursday
        course("19", "供应链", 3, 0, weeks(9, 16), CourseType::Normal, "bg-cyan-100 text-cyan-700 border-cyan-200"),
        course("20", "商务数分", 3, 1, weeks(9, 16), CourseType::Normal, "bg-purple-100 text-purple-700 border-purple-200"),
        course("21", "数据库", 3, 2, weeks(1, 8), CourseType::Normal, "bg-indigo-100 text-indigo-700 border-indigo-200"),
    ]
}
