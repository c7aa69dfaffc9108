use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use logitrack_core::RecordId;
use tokio::sync::oneshot;

/// Per-record FIFO for mutating calls.
///
/// A [`Ticket`] is taken synchronously when a call is initiated; it becomes
/// ready once every earlier ticket for the same id has been dropped. This
/// makes the end state follow the order calls were initiated in, whatever
/// order their responses would otherwise arrive in.
#[derive(Debug, Default, Clone)]
pub struct MutationQueue {
    lanes: Arc<Mutex<HashMap<RecordId, Lane>>>,
}

#[derive(Debug)]
struct Lane {
    /// Released when the most recently issued ticket is dropped.
    tail: oneshot::Receiver<()>,
    outstanding: usize,
}

impl MutationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lanes(&self) -> MutexGuard<'_, HashMap<RecordId, Lane>> {
        self.lanes.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn enqueue(&self, id: &RecordId) -> Ticket {
        let (release, tail) = oneshot::channel();
        let mut lanes = self.lanes();
        let previous = match lanes.get_mut(id) {
            Some(lane) => {
                lane.outstanding += 1;
                Some(std::mem::replace(&mut lane.tail, tail))
            }
            None => {
                lanes.insert(
                    id.clone(),
                    Lane {
                        tail,
                        outstanding: 1,
                    },
                );
                None
            }
        };
        Ticket {
            id: id.clone(),
            wait: previous,
            _release: release,
            lanes: Arc::clone(&self.lanes),
        }
    }

    /// Whether any call for `id` is queued or running.
    pub fn is_busy(&self, id: &RecordId) -> bool {
        self.lanes().contains_key(id)
    }

    pub fn busy_ids(&self) -> Vec<RecordId> {
        let mut ids: Vec<RecordId> = self.lanes().keys().cloned().collect();
        ids.sort();
        ids
    }
}

/// A place in a record's queue. Dropping it lets the next call proceed.
#[derive(Debug)]
pub struct Ticket {
    id: RecordId,
    wait: Option<oneshot::Receiver<()>>,
    _release: oneshot::Sender<()>,
    lanes: Arc<Mutex<HashMap<RecordId, Lane>>>,
}

impl Ticket {
    /// Wait for every earlier call on this record to finish.
    pub async fn ready(&mut self) {
        // Polled by reference so a cancelled wait can be resumed.
        if let Some(previous) = self.wait.as_mut() {
            // An error only means the sender was dropped, which is the signal.
            let _ = previous.await;
            self.wait = None;
        }
    }
}

impl Drop for Ticket {
    fn drop(&mut self) {
        let mut lanes = self.lanes.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(lane) = lanes.get_mut(&self.id) {
            lane.outstanding -= 1;
            if lane.outstanding == 0 {
                lanes.remove(&self.id);
            }
        }
    }
}
