//! Domain types for schedule records.
//!
//! This module contains the feed records the timetable engine reads and the
//! value types (service times, weekday masks) it computes with. Value types
//! enforce their invariants at construction time, so code that receives them
//! can trust their validity.

mod calendar;
mod frequency;
mod note;
mod stop;
mod time;
mod timetable;
mod trip;

pub use calendar::{
    Calendar, CalendarException, DayMask, ExceptionType, InvalidDate, InvalidDayMask,
    format_feed_date, parse_feed_date,
};
pub use frequency::Frequency;
pub use note::{Note, NoteReference};
pub use stop::{Route, Stop};
pub use time::{SECONDS_PER_DAY, ServiceTime, TimeError};
pub use timetable::{Orientation, StopOrderEntry, TimetableDefinition, TimetablePageRecord};
pub use trip::{BoardingRule, RawTrip, StopTime};
