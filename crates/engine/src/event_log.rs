//! The per-host alarm event log (spec §3 "Event log (L)", §4.7, §9).
//!
//! The source's intrusive, shared-ownership `next` list is replaced by a
//! `VecDeque<Event>` under a single `RwLock`, owned solely by the log
//! (spec §9). Entries are newest-first: `push_front` on append, so walking
//! the deque from index 0 walks from newest to oldest, exactly like walking
//! `next` from the head in the source.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use health_core::Event;

pub struct EventLog {
    entries: RwLock<VecDeque<Event>>,
    max: usize,
    next_unique_id: AtomicU64,
}

impl EventLog {
    pub fn new(max: usize) -> Self {
        Self {
            entries: RwLock::new(VecDeque::new()),
            max,
            next_unique_id: AtomicU64::new(1),
        }
    }

    pub fn max(&self) -> usize {
        self.max
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Assigns the next host-monotonic `unique_id` and prepends the event
    /// (P1: strictly greater than every previously appended id for this
    /// host).
    pub fn append(&self, mut event: Event) -> u64 {
        let id = self.next_unique_id.fetch_add(1, Ordering::SeqCst);
        event.unique_id = id;
        self.entries.write().unwrap().push_front(event);
        id
    }

    pub fn head_unique_id(&self) -> u64 {
        self.entries
            .read()
            .unwrap()
            .front()
            .map(|e| e.unique_id)
            .unwrap_or(0)
    }

    /// Clones every entry with `unique_id >= last_processed_id`, newest
    /// first. The deque is sorted descending by `unique_id`, so this can
    /// stop at the first entry below the threshold.
    pub fn snapshot_since(&self, last_processed_id: u64) -> Vec<Event> {
        self.entries
            .read()
            .unwrap()
            .iter()
            .take_while(|e| e.unique_id >= last_processed_id)
            .cloned()
            .collect()
    }

    /// `first_waiting` per spec §4.8 step 1/2: starts at the current head's
    /// id (or 0 if the log is empty), then is lowered to the smallest
    /// `unique_id` among entries that are neither `Processed` nor `Updated`
    /// within the `>= last_processed_id` range.
    pub fn compute_first_waiting(&self, last_processed_id: u64) -> u64 {
        let entries = self.entries.read().unwrap();
        let mut first_waiting = entries.front().map(|e| e.unique_id).unwrap_or(0);
        for e in entries.iter() {
            if e.unique_id < last_processed_id {
                break;
            }
            if e.flags.processed || e.flags.updated {
                continue;
            }
            first_waiting = first_waiting.min(e.unique_id);
        }
        first_waiting
    }

    /// Dedup lookup for §4.8's `execute`: the most recent (by position, i.e.
    /// by descending `unique_id`) event for `alarm_id` with `ExecRun` set,
    /// searching strictly older than `before_unique_id` (or from the head
    /// when `None`, used by the repeat emitter which has no log entry of
    /// its own to anchor from).
    pub fn most_recent_notified(&self, alarm_id: u64, before_unique_id: Option<u64>) -> Option<Event> {
        let entries = self.entries.read().unwrap();
        let start = match before_unique_id {
            Some(id) => entries.iter().position(|e| e.unique_id == id).map(|i| i + 1).unwrap_or(entries.len()),
            None => 0,
        };
        entries
            .iter()
            .skip(start)
            .find(|e| e.alarm_id == alarm_id && e.flags.exec_run)
            .cloned()
    }

    /// Applies `mutator` to the entry with `unique_id`, if still present
    /// (it may have been trimmed between the snapshot and the update).
    pub fn update_event(&self, unique_id: u64, mutator: impl FnOnce(&mut Event)) {
        let mut entries = self.entries.write().unwrap();
        if let Some(e) = entries.iter_mut().find(|e| e.unique_id == unique_id) {
            mutator(e);
        }
    }

    /// Reload coordinator hook (§4.9): marks every non-`Removed` event
    /// `Updated`, suppressing notifications for state the reload is about
    /// to replace.
    pub fn mark_updated_all_except_removed(&self) {
        let mut entries = self.entries.write().unwrap();
        for e in entries.iter_mut() {
            if e.new_status != health_core::Status::Removed {
                e.flags.updated = true;
            }
        }
    }

    /// Retains the newest `max * 2/3` entries when `count > max` (§4.7,
    /// §9's double-free note: this implementation frees each trimmed entry
    /// exactly once, via `VecDeque::truncate`'s normal drop).
    pub fn trim(&self) -> usize {
        let mut entries = self.entries.write().unwrap();
        if entries.len() > self.max {
            let target = self.max * 2 / 3;
            entries.truncate(target);
        }
        entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use health_core::Status;

    fn event(alarm_id: u64, new_status: Status) -> Event {
        Event {
            unique_id: 0,
            alarm_id,
            alarm_event_id: 0,
            when: 0,
            name: String::new(),
            chart: String::new(),
            family: String::new(),
            exec: String::new(),
            recipient: String::new(),
            duration: 0,
            non_clear_duration: 0,
            old_value: 0.0,
            new_value: 0.0,
            old_status: Status::Clear,
            new_status,
            source: String::new(),
            units: String::new(),
            info: String::new(),
            delay: 0,
            flags: Default::default(),
            exec_run_timestamp: 0,
            exec_code: 0,
            last_repeat: 0,
        }
    }

    #[test]
    fn append_assigns_strictly_increasing_ids() {
        let log = EventLog::new(100);
        let a = log.append(event(1, Status::Warning));
        let b = log.append(event(1, Status::Critical));
        assert!(b > a);
    }

    #[test]
    fn trim_preserves_newest_two_thirds() {
        let log = EventLog::new(100);
        for i in 0..150 {
            log.append(event(i, Status::Warning));
        }
        log.trim();
        assert_eq!(log.len(), 66);
        let newest = log.snapshot_since(0);
        // Newest-first: the front entry must be the very last one appended.
        assert_eq!(newest.first().unwrap().alarm_id, 149);
    }

    #[test]
    fn most_recent_notified_scans_toward_the_tail() {
        let log = EventLog::new(100);
        let mut e1 = event(7, Status::Warning);
        e1.flags.exec_run = true;
        let id1 = log.append(e1);
        let mut e2 = event(7, Status::Critical);
        e2.flags.exec_run = true;
        let id2 = log.append(e2);

        let found = log.most_recent_notified(7, Some(id2)).unwrap();
        assert_eq!(found.unique_id, id1);
        assert_eq!(found.new_status, Status::Warning);

        assert!(log.most_recent_notified(7, Some(id1)).is_none());
    }

    #[test]
    fn compute_first_waiting_skips_processed_entries() {
        let log = EventLog::new(100);
        let mut e1 = event(1, Status::Warning);
        e1.flags.processed = true;
        let _id1 = log.append(e1);
        let id2 = log.append(event(1, Status::Critical));

        assert_eq!(log.compute_first_waiting(0), id2);
    }
}
