//! Web layer for the timetable server.
//!
//! Serves built timetable pages, their stats and the start-up batch report
//! as JSON.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::{AppState, SharedStore};
