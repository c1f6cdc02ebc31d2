use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};

struct State<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// Thread-safe double-ended queue used as a producer/consumer channel.
///
/// Inserts never block and never fail. `pop_front` blocks the caller until an
/// element is available; it only returns `None` once the channel has been
/// closed *and* drained, which is what lets a consumer thread be shut down
/// while idle.
///
/// There is no capacity bound: producers that outpace the consumer grow the
/// queue without limit.
pub struct ConcurrentChannel<T> {
    state: Mutex<State<T>>,
    new_data: Condvar,
}

impl<T> ConcurrentChannel<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                items: VecDeque::new(),
                closed: false,
            }),
            new_data: Condvar::new(),
        }
    }

    /// Inserts `item` at the front and wakes one waiting consumer.
    pub fn push_front(&self, item: T) {
        self.insert(|items| items.push_front(item));
    }

    /// Inserts `item` at the back and wakes one waiting consumer.
    pub fn push_back(&self, item: T) {
        self.insert(|items| items.push_back(item));
    }

    /// Removes and returns the front element, blocking while the channel is empty.
    ///
    /// Returns `None` only when the channel is closed and has no elements left.
    pub fn pop_front(&self) -> Option<T> {
        let mut state = self.state.lock();
        loop {
            if let Some(item) = state.items.pop_front() {
                return Some(item);
            }
            if state.closed {
                return None;
            }
            // Re-checked on every wake: spurious wake-ups and `clear()` must not
            // hand out an element that is not there.
            self.new_data.wait(&mut state);
        }
    }

    /// Non-blocking variant of [`pop_front`](Self::pop_front).
    pub fn try_pop_front(&self) -> Option<T> {
        self.state.lock().items.pop_front()
    }

    /// Drops every queued element. Waiters are not woken.
    pub fn clear(&self) {
        self.state.lock().items.clear();
    }

    /// Closes the channel and wakes every waiter.
    ///
    /// Elements still queued remain available to `pop_front`; once they are
    /// drained, consumers observe `None` instead of blocking.
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.new_data.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }

    fn insert(&self, op: impl FnOnce(&mut VecDeque<T>)) {
        {
            let mut state = self.state.lock();
            op(&mut state.items);
        }
        self.new_data.notify_one();
    }
}

impl<T> Default for ConcurrentChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}
