pub mod course;
pub mod semester;
pub mod store;

pub use course::{Course, CourseType};
pub use semester::{Semester, Snapshot};
pub use store::{CURRENT_STORE_VERSION, StoreDocument};
