pub mod study;

pub use study::{ReviewCardInput, StudyError, StudyService};
