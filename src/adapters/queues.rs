//! Queue-backed port adapters.
//!
//! Bridge the arbiter's output ports onto the static inter-task queues.
//! Send failures are already logged by [`EventQueue::post`]; the adapters
//! only decide what happens next, which is always "carry on".

use embedded_hal::delay::DelayNs;

use crate::app::ports::{KeySource, LedSink, TicketSink};
use crate::events::{Indicator, KeyEvent, KeyQueue, LedCommand, LedQueue, Ticket, TicketQueue};

/// `LedSink` that forwards level commands to the I/O task.
pub struct QueueLedSink<'q> {
    queue: &'q LedQueue,
}

impl<'q> QueueLedSink<'q> {
    pub fn new(queue: &'q LedQueue) -> Self {
        Self { queue }
    }
}

impl LedSink for QueueLedSink<'_> {
    fn set_level(&mut self, indicator: Indicator, on: bool) {
        let _ = self.queue.post(LedCommand { indicator, on });
    }
}

/// Call-request notifier: hands tickets to the reporter task.
pub struct TicketNotifier<'q> {
    queue: &'q TicketQueue,
}

impl<'q> TicketNotifier<'q> {
    pub fn new(queue: &'q TicketQueue) -> Self {
        Self { queue }
    }
}

impl TicketSink for TicketNotifier<'_> {
    fn notify(&mut self, ticket: Ticket) {
        let _ = self.queue.post(ticket);
    }
}

/// `KeySource` over the key queue with a millisecond-granular wait.
pub struct QueueKeySource<'q, D> {
    queue: &'q KeyQueue,
    delay: D,
}

impl<'q, D: DelayNs> QueueKeySource<'q, D> {
    pub fn new(queue: &'q KeyQueue, delay: D) -> Self {
        Self { queue, delay }
    }
}

impl<D: DelayNs> KeySource for QueueKeySource<'_, D> {
    fn next_key(&mut self, wait_ms: u32) -> Option<KeyEvent> {
        self.queue.take_within(wait_ms, &mut self.delay)
    }
}
