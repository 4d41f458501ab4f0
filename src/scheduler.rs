//! Virtual event loop: timers and animation frames on a manual clock.
//!
//! The page scripts only ever suspend in three places: `setTimeout`,
//! `setInterval` and `requestAnimationFrame`. The [`Scheduler`] models all
//! three as data. Tasks are values of a caller-chosen type `T` (the engine's
//! task enum), so nothing scheduled ever holds a borrow of the document.
//!
//! ## Ordering
//!
//! - Timers run in `(due_at, insertion order)` order.
//! - Interval timers are re-armed with the same [`TimerId`] after each run,
//!   so clearing the id stops future runs.
//! - Animation frames fire on fixed ticks (multiples of `frame_ms`). All
//!   frames requested before a tick run at that tick with the tick time as
//!   their timestamp; frames requested while running go to the next tick.
//! - When a timer and a frame tick fall on the same millisecond the timer
//!   runs first, then the frames due at that tick.

use thiserror::Error;

pub type TimerId = u64;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error(
        "event loop exceeded {limit} steps (possible runaway interval): now_ms={now_ms}, pending_timers={pending}"
    )]
    StepLimit {
        limit: usize,
        now_ms: u64,
        pending: usize,
    },
}

#[derive(Debug, Clone)]
struct ScheduledTask<T> {
    id: TimerId,
    due_at: u64,
    order: u64,
    interval_ms: Option<u64>,
    task: T,
}

/// Snapshot of a queued timer, for inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTimer {
    pub id: TimerId,
    pub due_at: u64,
    pub interval_ms: Option<u64>,
}

/// Work that became ready when the clock moved.
#[derive(Debug, PartialEq)]
pub enum Ready<T> {
    Timer(T),
    /// Every frame callback due at one tick, with the tick timestamp.
    Frames { timestamp: u64, tasks: Vec<T> },
}

#[derive(Debug)]
pub struct Scheduler<T> {
    now_ms: u64,
    next_id: TimerId,
    next_order: u64,
    frame_ms: u64,
    step_limit: usize,
    queue: Vec<ScheduledTask<T>>,
    frames: Vec<T>,
    /// Latest tick already passed, with or without frames to flush.
    flushed_tick: u64,
}

impl<T: Clone> Scheduler<T> {
    pub fn new(frame_ms: u64, step_limit: usize) -> Self {
        Self {
            now_ms: 0,
            next_id: 1,
            next_order: 0,
            frame_ms: frame_ms.max(1),
            step_limit,
            queue: Vec::new(),
            frames: Vec::new(),
            flushed_tick: 0,
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn frame_ms(&self) -> u64 {
        self.frame_ms
    }

    pub fn step_limit(&self) -> usize {
        self.step_limit
    }

    pub fn set_timeout(&mut self, delay_ms: u64, task: T) -> TimerId {
        self.push(delay_ms, None, task)
    }

    pub fn set_interval(&mut self, interval_ms: u64, task: T) -> TimerId {
        let interval_ms = interval_ms.max(1);
        self.push(interval_ms, Some(interval_ms), task)
    }

    /// Remove a queued timer. Returns whether it was pending.
    pub fn clear(&mut self, id: TimerId) -> bool {
        let before = self.queue.len();
        self.queue.retain(|t| t.id != id);
        self.queue.len() != before
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.queue.iter().any(|t| t.id == id)
    }

    pub fn request_frame(&mut self, task: T) {
        self.frames.push(task);
    }

    pub fn pending_timers(&self) -> Vec<PendingTimer> {
        let mut timers: Vec<_> = self
            .queue
            .iter()
            .map(|t| (t.due_at, t.order, t))
            .collect();
        timers.sort_by_key(|(due, order, _)| (*due, *order));
        timers
            .into_iter()
            .map(|(_, _, t)| PendingTimer {
                id: t.id,
                due_at: t.due_at,
                interval_ms: t.interval_ms,
            })
            .collect()
    }

    pub fn pending_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_empty() && self.frames.is_empty()
    }

    fn push(&mut self, delay_ms: u64, interval_ms: Option<u64>, task: T) -> TimerId {
        let id = self.next_id;
        self.next_id += 1;
        let order = self.bump_order();
        self.queue.push(ScheduledTask {
            id,
            due_at: self.now_ms.saturating_add(delay_ms),
            order,
            interval_ms,
            task,
        });
        id
    }

    fn bump_order(&mut self) -> u64 {
        let order = self.next_order;
        self.next_order += 1;
        order
    }

    fn next_timer_index(&self, limit: u64) -> Option<usize> {
        self.queue
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due_at <= limit)
            .min_by_key(|(_, t)| (t.due_at, t.order))
            .map(|(idx, _)| idx)
    }

    fn next_frame_tick(&self) -> Option<u64> {
        if self.frames.is_empty() {
            return None;
        }
        if self.now_ms % self.frame_ms == 0 && self.now_ms > self.flushed_tick {
            return Some(self.now_ms);
        }
        Some((self.now_ms / self.frame_ms + 1) * self.frame_ms)
    }

    /// Move the clock forward. Ticks crossed with no frames queued count as
    /// flushed.
    fn move_clock(&mut self, to: u64) {
        self.now_ms = self.now_ms.max(to);
        if self.frames.is_empty() {
            self.flushed_tick = self.now_ms / self.frame_ms * self.frame_ms;
        }
    }

    fn pop_timer(&mut self, idx: usize, due: u64) -> Ready<T> {
        let mut scheduled = self.queue.remove(idx);
        self.move_clock(due);
        let task = scheduled.task.clone();
        if let Some(interval) = scheduled.interval_ms {
            scheduled.due_at = self.now_ms + interval;
            scheduled.order = self.bump_order();
            self.queue.push(scheduled);
        }
        Ready::Timer(task)
    }

    fn flush_frames(&mut self, tick: u64) -> Ready<T> {
        self.now_ms = tick;
        self.flushed_tick = tick;
        Ready::Frames {
            timestamp: tick,
            tasks: std::mem::take(&mut self.frames),
        }
    }

    /// Pop the next piece of ready work due at or before `until`, moving the
    /// clock to its due time. When nothing is due, the clock moves to
    /// `until` and `None` is returned.
    pub fn pop_next(&mut self, until: u64) -> Option<Ready<T>> {
        let timer = self
            .next_timer_index(until)
            .map(|idx| (self.queue[idx].due_at, idx));
        let frame_tick = self.next_frame_tick().filter(|tick| *tick <= until);

        match (timer, frame_tick) {
            (Some((due, idx)), Some(tick)) if due <= tick => Some(self.pop_timer(idx, due)),
            (Some((due, idx)), None) => Some(self.pop_timer(idx, due)),
            (_, Some(tick)) => Some(self.flush_frames(tick)),
            (None, None) => {
                self.move_clock(until);
                None
            }
        }
    }

    pub fn step_limit_error(&self) -> SchedulerError {
        SchedulerError::StepLimit {
            limit: self.step_limit,
            now_ms: self.now_ms,
            pending: self.queue.len(),
        }
    }
}
