//! Timetable server.
//!
//! Builds printable-style timetables from transit schedule records: which
//! stops a timetable shows and in what order, which trips run, where a
//! vehicle continues as another route, and the notes that go with them.

pub mod batch;
pub mod cache;
pub mod domain;
pub mod engine;
pub mod store;
pub mod web;
