//! Virtual-user load test for the EduCode API.
//!
//! Each virtual user repeatedly logs in, reads its profile and course list,
//! then either browses a course's activities or, as an instructor without
//! courses, creates one. Every step is timed and recorded as a named check;
//! nothing a single iteration does can fail the run.
pub mod checks;
pub mod client;
pub mod config;
pub mod logging;
pub mod runner;
pub mod scenario;
pub mod statistics;

#[cfg(test)]
pub(crate) mod test_support;
