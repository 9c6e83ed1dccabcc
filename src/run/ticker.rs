//! Poll scheduling for a running simulation.
//!
//! The ticker never calls the server itself. It hands out a [`PollTicket`]
//! when a poll is due and later decides whether the matching response still
//! counts. Cancelling or restarting bumps the generation, so responses to
//! polls issued before that point are recognised as stale.

use std::time::{Duration, Instant};

/// Proof that a poll was issued by the current generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollTicket(u64);

#[derive(Debug, Clone)]
pub struct PollTicker {
    interval: Duration,
    generation: u64,
    active: bool,
    next_due: Option<Instant>,
    in_flight: Option<u64>,
}

impl PollTicker {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            generation: 0,
            active: false,
            next_due: None,
            in_flight: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Begin a new polling generation; the first poll is due one interval later
    pub fn start(&mut self, now: Instant) {
        self.generation += 1;
        self.active = true;
        self.in_flight = None;
        self.next_due = Some(now + self.interval);
    }

    /// Stop polling and invalidate every outstanding ticket
    pub fn cancel(&mut self) {
        self.generation += 1;
        self.active = false;
        self.in_flight = None;
        self.next_due = None;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.next_due
    }

    /// Issue a ticket if a poll is due and none is in flight
    pub fn poll_due(&mut self, now: Instant) -> Option<PollTicket> {
        if !self.active || self.in_flight.is_some() {
            return None;
        }
        match self.next_due {
            Some(due) if now >= due => {
                self.next_due = Some(now + self.interval);
                self.in_flight = Some(self.generation);
                Some(PollTicket(self.generation))
            }
            _ => None,
        }
    }

    /// Settle a ticket. Returns false when its response must be ignored.
    pub fn accept(&mut self, ticket: PollTicket) -> bool {
        if self.active && ticket.0 == self.generation && self.in_flight == Some(ticket.0) {
            self.in_flight = None;
            true
        } else {
            false
        }
    }
}
