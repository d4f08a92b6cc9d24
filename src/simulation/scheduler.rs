use std::time::Duration;

/// Handle to a scheduled tick, used to cancel it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickHandle(u64);

#[derive(Debug, Clone, Copy)]
struct PendingTick {
    handle: TickHandle,
    due: Duration,
}

/// Delayed tick continuation driven by an external clock.
///
/// At most one tick is pending at a time; scheduling a new one replaces it.
/// The clock only moves when the owner calls `advance`, and a pending tick
/// fires exactly once, on the first `advance` that reaches its due time.
#[derive(Debug, Default)]
pub struct TickScheduler {
    now: Duration,
    pending: Option<PendingTick>,
    next_handle: u64,
}

impl TickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time elapsed on the scheduler's clock.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn schedule(&mut self, after: Duration) -> TickHandle {
        let handle = TickHandle(self.next_handle);
        self.next_handle += 1;
        self.pending = Some(PendingTick {
            handle,
            due: self.now + after,
        });
        handle
    }

    /// Cancel `handle` if it is still pending. Returns whether anything was cancelled.
    pub fn cancel(&mut self, handle: TickHandle) -> bool {
        match self.pending {
            Some(p) if p.handle == handle => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel_all(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Remaining time before the pending tick fires.
    pub fn time_until_due(&self) -> Option<Duration> {
        self.pending.map(|p| p.due.saturating_sub(self.now))
    }

    /// Move the clock forward. Returns the handle of the tick that came due, if any.
    pub fn advance(&mut self, dt: Duration) -> Option<TickHandle> {
        self.now += dt;
        match self.pending {
            Some(p) if p.due <= self.now => {
                self.pending = None;
                Some(p.handle)
            }
            _ => None,
        }
    }
}
