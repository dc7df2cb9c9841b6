// src/queue/ready_queue.rs

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use tracing::debug;

use crate::queue::task::TaskId;
use crate::types::TaskPriority;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct ReadyEntry {
    priority: TaskPriority,
    /// Arrival sequence; breaks ties between equal priorities (FIFO).
    seq: u64,
    id: TaskId,
}

/// Priority-ordered queue of task ids whose dependencies are satisfied.
///
/// Semantics:
/// - Entries pop in ascending priority value (`Critical` first).
/// - Equal priorities pop in arrival order. A re-enqueued task (retry) gets a
///   fresh sequence number and therefore queues behind its peers.
/// - An id is held at most once; pushing an id that is already queued is a
///   no-op.
///
/// Removal only forgets the id; its heap entry is dropped when it surfaces.
#[derive(Debug, Default)]
pub struct ReadyQueue {
    heap: BinaryHeap<Reverse<ReadyEntry>>,
    /// Queued ids and the sequence number of their live heap entry.
    live: HashMap<TaskId, u64>,
    next_seq: u64,
}

impl ReadyQueue {
    pub(crate) fn len(&self) -> usize {
        self.live.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.live.contains_key(id)
    }

    /// Enqueue `id` at `priority`. Returns `false` if it was already queued.
    pub fn push(&mut self, priority: TaskPriority, id: impl Into<TaskId>) -> bool {
        let id = id.into();
        if self.contains(&id) {
            debug!(task = %id, "task already in ready queue; ignoring push");
            return false;
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.live.insert(id.clone(), seq);
        self.heap.push(Reverse(ReadyEntry { priority, seq, id }));
        true
    }

    /// Pop the highest-priority, earliest-arrived entry.
    pub fn pop(&mut self) -> Option<(TaskPriority, TaskId)> {
        while let Some(Reverse(entry)) = self.heap.pop() {
            if self.is_live(&entry) {
                self.live.remove(&entry.id);
                return Some((entry.priority, entry.id));
            }
        }
        None
    }

    /// Drop `id` from the queue (e.g. on cancellation). Returns whether it was
    /// present.
    pub fn remove(&mut self, id: &str) -> bool {
        if self.live.remove(id).is_none() {
            return false;
        }
        // Keep dead entries from outnumbering live ones.
        if self.heap.len() > 2 * self.live.len() + 16 {
            let live = &self.live;
            self.heap
                .retain(|Reverse(e)| live.get(&e.id) == Some(&e.seq));
        }
        true
    }

    /// Queued ids in pop order (for diagnostics and tests).
    pub fn ordered_ids(&self) -> Vec<TaskId> {
        let mut entries: Vec<&ReadyEntry> = self
            .heap
            .iter()
            .map(|Reverse(e)| e)
            .filter(|e| self.is_live(e))
            .collect();
        entries.sort();
        entries.into_iter().map(|e| e.id.clone()).collect()
    }

    fn is_live(&self, entry: &ReadyEntry) -> bool {
        self.live.get(&entry.id) == Some(&entry.seq)
    }
}
