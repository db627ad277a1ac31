use std::collections::HashMap;
use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use crate::ChangeEvent;
use crate::OrderStatus;
use crate::Table;

/// Identity of one observed change: the same row reaching the same status.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub table: Table,
    pub row_id: String,
    pub status: Option<OrderStatus>,
}

impl DedupKey {
    pub fn of(event: &ChangeEvent) -> Self {
        Self {
            table: event.table,
            row_id: event.row_id().to_string(),
            status: event.new_status(),
        }
    }
}

struct DedupTable {
    seen: HashMap<DedupKey, Instant>,
    /// Insertion order, oldest first. May hold keys already refreshed.
    order: VecDeque<(DedupKey, Instant)>,
}

/// Time-windowed, size-bounded memory of recently dispatched changes.
///
/// Redeliveries from a reconnecting feed and replays of the same change are
/// recognised for `window`; beyond `capacity` entries the oldest are
/// forgotten first.
pub struct Deduplicator {
    window: Duration,
    capacity: usize,
    table: Mutex<DedupTable>,
}

impl Deduplicator {
    pub fn new(
        window: Duration,
        capacity: usize,
    ) -> Self {
        Self {
            window,
            capacity: capacity.max(1),
            table: Mutex::new(DedupTable {
                seen: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    /// Records `key` and returns `true` when it was not seen within the
    /// window.
    pub fn first_seen(
        &self,
        key: DedupKey,
    ) -> bool {
        let now = Instant::now();
        let mut table = self.table.lock();
        self.evict(&mut table, now);

        if let Some(at) = table.seen.get(&key) {
            if now.duration_since(*at) < self.window {
                return false;
            }
        }

        while table.seen.len() >= self.capacity {
            match table.order.pop_front() {
                Some((oldest, at)) => {
                    if table.seen.get(&oldest) == Some(&at) {
                        table.seen.remove(&oldest);
                    }
                }
                None => break,
            }
        }

        table.seen.insert(key.clone(), now);
        table.order.push_back((key, now));
        true
    }

    pub fn len(&self) -> usize {
        self.table.lock().seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn evict(
        &self,
        table: &mut DedupTable,
        now: Instant,
    ) {
        while let Some((_, at)) = table.order.front() {
            if now.duration_since(*at) < self.window {
                break;
            }
            if let Some((key, at)) = table.order.pop_front() {
                if table.seen.get(&key) == Some(&at) {
                    table.seen.remove(&key);
                }
            }
        }
    }
}
