//! Batch CSV surface: submissions in, one outcome row per submission out.

pub mod outcome_writer;
pub mod submission_reader;
