//! The alarm event type (spec §3, "Event (E)").
//!
//! The source's intrusive `next` link is dropped in favor of single ownership
//! by the event log's deque (see spec §9, "Intrusive linked list of events");
//! callers iterate borrowed references under the log's RW-lock instead.

use crate::flags::EventFlags;
use crate::status::Status;

/// An immutable record appended to a host's event log at a status
/// transition, or synthesized inline by the repeating-alarm emitter.
#[derive(Debug, Clone)]
pub struct Event {
    pub unique_id: u64,
    pub alarm_id: u64,
    pub alarm_event_id: u64,
    pub when: i64,
    pub name: String,
    pub chart: String,
    pub family: String,
    pub exec: String,
    pub recipient: String,
    pub duration: i64,
    pub non_clear_duration: i64,
    pub old_value: f64,
    pub new_value: f64,
    pub old_status: Status,
    pub new_status: Status,
    pub source: String,
    pub units: String,
    pub info: String,
    pub delay: i64,
    pub flags: EventFlags,
    pub exec_run_timestamp: i64,
    pub exec_code: i32,
    pub last_repeat: i64,
}
