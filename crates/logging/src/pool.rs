//! Reuse of per-call log events.
//!
//! Events are handed out as [`PooledEvent`] guards. Dropping a guard clears
//! the event and returns it to a bounded lock-free queue, so the record
//! allocations of one call are reused by the next. Neither acquiring nor
//! releasing ever blocks: an empty pool allocates and a full pool drops.

use std::error::Error;
use std::fmt;
use std::mem;
use std::ops::{Deref, DerefMut};

use crossbeam::queue::ArrayQueue;
use record::{Level, LogEvent};
use time::OffsetDateTime;

use crate::Router;

/// Idle events kept by [`Router::new`].
pub const DEFAULT_POOL_CAPACITY: usize = 64;

/// Bounded pool of cleared events.
///
/// # Examples
///
/// ```
/// use logging::EventPool;
/// use record::Level;
///
/// let pool = EventPool::new(2);
/// let mut event = pool.acquire(Level::Info);
/// event.set_message("reused");
/// pool.release(event);
///
/// assert_eq!(pool.len(), 1);
/// assert!(pool.acquire(Level::Debug).message().is_empty());
/// ```
pub struct EventPool {
    idle: ArrayQueue<LogEvent>,
}

impl EventPool {
    /// Creates a pool keeping at most `capacity` idle events. A zero
    /// capacity is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            idle: ArrayQueue::new(capacity.max(1)),
        }
    }

    /// Takes an idle event, or allocates one, stamped with `level` and the
    /// current UTC time.
    pub fn acquire(&self, level: Level) -> LogEvent {
        let now = OffsetDateTime::now_utc();
        match self.idle.pop() {
            Some(mut event) => {
                event.set_level(level);
                event.set_timestamp(now);
                event
            }
            None => LogEvent::at(level, now),
        }
    }

    /// Clears `event` and keeps it for reuse unless the pool is full.
    pub fn release(&self, mut event: LogEvent) {
        event.clear();
        // a full pool drops the event
        let _ = self.idle.push(event);
    }

    /// Number of idle events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.idle.len()
    }

    /// Reports whether no idle event is available.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.idle.is_empty()
    }

    /// Maximum number of idle events kept.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.idle.capacity()
    }
}

impl fmt::Debug for EventPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventPool")
            .field("idle", &self.idle.len())
            .field("capacity", &self.idle.capacity())
            .finish()
    }
}

/// Scoped ownership of a pooled event.
///
/// The guard derefs to [`LogEvent`]. Dropping it clears the event and
/// returns it to the owning router's pool; [`PooledEvent::dispatch`] routes
/// the event first.
#[must_use = "dropping the guard releases the event without dispatching it"]
pub struct PooledEvent<'r> {
    router: &'r Router,
    event: LogEvent,
}

impl<'r> PooledEvent<'r> {
    pub(crate) const fn new(router: &'r Router, event: LogEvent) -> Self {
        Self { router, event }
    }

    /// Unwinds `error` into the linked error slot through the router's
    /// unwinder.
    pub fn attach_error(&mut self, error: &(dyn Error + 'static)) -> &mut Self {
        self.router.attach_error(&mut self.event, error);
        self
    }

    /// Dispatches the event through the owning router, then releases it.
    pub fn dispatch(mut self) {
        self.router.dispatch(&mut self.event);
    }
}

impl Deref for PooledEvent<'_> {
    type Target = LogEvent;

    fn deref(&self) -> &Self::Target {
        &self.event
    }
}

impl DerefMut for PooledEvent<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.event
    }
}

impl Drop for PooledEvent<'_> {
    fn drop(&mut self) {
        let placeholder = LogEvent::at(Level::Debug, OffsetDateTime::UNIX_EPOCH);
        self.router
            .pool()
            .release(mem::replace(&mut self.event, placeholder));
    }
}

impl fmt::Debug for PooledEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PooledEvent").field(&self.event).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use encoding::TemplateEncoder;
    use logging_sink::MemorySink;
    use record::Field;

    use super::*;

    #[test]
    fn acquire_allocates_when_empty() {
        let pool = EventPool::new(4);
        assert!(pool.is_empty());
        let event = pool.acquire(Level::Warning);
        assert_eq!(event.level(), Level::Warning);
        assert!(pool.is_empty());
    }

    #[test]
    fn release_clears_and_keeps_allocations() {
        let pool = EventPool::new(4);
        let mut event = pool.acquire(Level::Info);
        event.set_message("first");
        event.push_field(Field::u8("attempt", 1));
        pool.release(event);

        let reused = pool.acquire(Level::Error);
        assert_eq!(reused.level(), Level::Error);
        assert!(reused.message().is_empty());
        assert!(reused.error().is_none());
    }

    #[test]
    fn full_pool_drops_released_events() {
        let pool = EventPool::new(1);
        pool.release(LogEvent::new(Level::Info));
        pool.release(LogEvent::new(Level::Info));
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.capacity(), 1);
    }

    #[test]
    fn zero_capacity_is_raised() {
        assert_eq!(EventPool::new(0).capacity(), 1);
    }

    #[test]
    fn guard_returns_event_on_drop() {
        let router = Router::new().with_pool_capacity(2);
        {
            let mut event = router.acquire(Level::Info);
            event.set_message("never sent");
        }
        assert_eq!(router.pool().len(), 1);
        assert!(router.acquire(Level::Info).message().is_empty());
    }

    #[test]
    fn guard_dispatch_routes_then_releases() {
        let sink = Arc::new(MemorySink::new());
        let router = Router::new();
        router
            .register()
            .with_encoder(TemplateEncoder::new("{{m}}"))
            .write_to([Arc::clone(&sink)])
            .build()
            .unwrap();

        let mut event = router.acquire(Level::Info);
        event.set_message("sent once");
        event.dispatch();

        assert_eq!(sink.contents(), b"sent once");
        assert_eq!(router.pool().len(), 1);
    }

    #[test]
    fn guards_are_usable_across_threads() {
        let sink = Arc::new(MemorySink::new());
        let router = Arc::new(Router::new().with_pool_capacity(8));
        router
            .register()
            .with_encoder(TemplateEncoder::new("{{m}}\n"))
            .write_to([Arc::clone(&sink)])
            .build()
            .unwrap();

        let handles: Vec<_> = (0..4)
            .map(|worker| {
                let router = Arc::clone(&router);
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        let mut event = router.acquire(Level::Info);
                        event.set_message(format!("worker {worker}"));
                        event.dispatch();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(sink.write_count(), 100);
        assert!(router.pool().len() <= 8);
    }
}
