use std::collections::VecDeque;

use super::types::LogEntry;

/// Default number of entries an acceptor retains
pub const DEFAULT_LOG_CAPACITY: usize = 100;

/// Default number of entries returned by a status query
pub const DEFAULT_STATUS_LOG_LIMIT: usize = 20;

/// Bounded event log, newest entry first.
///
/// Inserting into a full log evicts the oldest entry. The log is owned by a
/// single acceptor and only mutated from inside that acceptor's actor, so it
/// needs no locking of its own.
#[derive(Debug, Clone)]
pub struct EventLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Insert an entry at the head, trimming from the tail past capacity
    pub fn push(&mut self, entry: LogEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
    }

    /// Up to `limit` newest entries, newest first
    pub fn recent(&self, limit: usize) -> Vec<LogEntry> {
        self.entries.iter().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paxos::types::EventType;

    fn entry(n: i64) -> LogEntry {
        LogEntry::new(EventType::Election, format!("event {}", n), n, -1)
    }

    #[test]
    fn test_push_keeps_newest_first() {
        let mut log = EventLog::default();
        log.push(entry(1));
        log.push(entry(2));
        log.push(entry(3));

        let recent = log.recent(DEFAULT_STATUS_LOG_LIMIT);
        let numbers: Vec<i64> = recent.iter().map(|e| e.proposal_number).collect();
        assert_eq!(numbers, vec![3, 2, 1]);
    }

    #[test]
    fn test_evicts_oldest_past_capacity() {
        let mut log = EventLog::default();
        for n in 1..=DEFAULT_LOG_CAPACITY as i64 {
            log.push(entry(n));
        }
        assert_eq!(log.len(), DEFAULT_LOG_CAPACITY);

        // The 101st insert evicts entry 1
        log.push(entry(101));
        assert_eq!(log.len(), DEFAULT_LOG_CAPACITY);

        let all = log.recent(usize::MAX);
        assert_eq!(all.first().unwrap().proposal_number, 101);
        assert_eq!(all.last().unwrap().proposal_number, 2);
    }

    #[test]
    fn test_recent_is_capped() {
        let mut log = EventLog::default();
        for n in 1..=50 {
            log.push(entry(n));
        }

        let recent = log.recent(DEFAULT_STATUS_LOG_LIMIT);
        assert_eq!(recent.len(), DEFAULT_STATUS_LOG_LIMIT);
        assert_eq!(recent[0].proposal_number, 50);
        assert_eq!(recent[19].proposal_number, 31);
    }

    #[test]
    fn test_recent_on_short_log() {
        let mut log = EventLog::new(5);
        log.push(entry(1));
        assert_eq!(log.recent(20).len(), 1);
        assert!(!log.is_empty());
    }
}
