pub mod defaults;
pub mod error;
pub mod models;
pub mod normalize;
pub mod services;
pub mod storage;
pub mod store;
pub mod void;

pub use error::AppError;
pub use models::{CURRENT_STORE_VERSION, Course, CourseType, Semester, Snapshot, StoreDocument};
pub use store::{CoursesStore, VoidDropImport};
