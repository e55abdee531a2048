//! Newest-request-wins ordering
//!
//! Every outgoing poll takes a ticket from a [`Sequencer`]; the result is
//! applied to a [`Sequenced`] value only if its ticket is newer than the one
//! that produced the current value. Responses therefore win by request
//! order, not arrival order.

use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};

/// Issues strictly increasing request tickets (first ticket is 1)
#[derive(Debug, Default)]
pub struct Sequencer {
    issued: AtomicU64,
}

impl Sequencer {
    /// Create a sequencer
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the next ticket
    pub fn next(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Latest ticket handed out (0 before the first)
    pub fn latest(&self) -> u64 {
        self.issued.load(Ordering::SeqCst)
    }
}

/// A value together with the ticket of the request that produced it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sequenced<T> {
    applied: u64,
    value: T,
}

impl<T> Sequenced<T> {
    /// Wrap an initial value (ticket 0)
    pub fn new(value: T) -> Self {
        Self { applied: 0, value }
    }

    /// Replace the value if `ticket` is newer than the applied one
    ///
    /// Returns whether the value was replaced.
    pub fn apply(&mut self, ticket: u64, value: T) -> bool {
        if ticket <= self.applied {
            tracing::debug!(
                ticket = ticket,
                applied = self.applied,
                "Discarding stale response"
            );
            return false;
        }
        self.applied = ticket;
        self.value = value;
        true
    }

    /// Ticket of the request that produced the current value
    pub fn applied_ticket(&self) -> u64 {
        self.applied
    }

    /// Current value
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Mutable access that keeps the ticket
    pub fn value_mut(&mut self) -> &mut T {
        &mut self.value
    }

    /// Unwrap the value
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> Deref for Sequenced<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tickets_increase() {
        let seq = Sequencer::new();
        assert_eq!(seq.latest(), 0);
        assert_eq!(seq.next(), 1);
        assert_eq!(seq.next(), 2);
        assert_eq!(seq.latest(), 2);
    }

    #[test]
    fn test_newer_ticket_applies() {
        let mut value = Sequenced::new(0);
        assert!(value.apply(1, 10));
        assert!(value.apply(3, 30));
        assert_eq!(*value, 30);
        assert_eq!(value.applied_ticket(), 3);
    }

    #[test]
    fn test_stale_ticket_is_discarded() {
        let seq = Sequencer::new();
        let older = seq.next();
        let newer = seq.next();

        let mut value = Sequenced::new("initial");
        // Newer request resolves first
        assert!(value.apply(newer, "newer"));
        // Older response arrives late and must not win
        assert!(!value.apply(older, "older"));
        assert_eq!(*value.value(), "newer");
    }

    #[test]
    fn test_duplicate_ticket_is_discarded() {
        let mut value = Sequenced::new(1);
        assert!(value.apply(5, 2));
        assert!(!value.apply(5, 3));
        assert_eq!(value.into_inner(), 2);
    }

    #[test]
    fn test_value_mut_keeps_ticket() {
        let mut value = Sequenced::new(vec![1]);
        value.apply(2, vec![1, 2]);
        value.value_mut().push(3);
        assert_eq!(value.applied_ticket(), 2);
        assert_eq!(value.len(), 3);
    }
}
