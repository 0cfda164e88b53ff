//! Subsystems built on the core: the catalog and progress stores, the student read
//! surfaces, and quiz grading.

pub mod catalog;
pub mod progress;
pub mod quiz;
pub mod student;
