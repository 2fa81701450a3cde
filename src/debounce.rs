// Search Debounce
//
// *Le Temporisateur* (The Timer) - Collapses a burst of edits into one committed value

use std::time::Duration;
use tokio::time::Instant;

/// Single-slot debouncer.
///
/// Holds at most one pending value and one deadline. Every push replaces both,
/// so only the last value of a burst is ever committed.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    window: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    /// Create a debouncer with the given quiescence window
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    /// Quiescence window
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Record an edit at `now`, restarting the window
    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.window));
    }

    /// Deadline of the pending value, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, deadline)| *deadline)
    }

    /// Whether a value is waiting to be committed
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Take the pending value if its window has elapsed at `now`
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, deadline)) if now >= *deadline => self.pending.take().map(|(value, _)| value),
            _ => None,
        }
    }

    /// Sleep until the pending deadline and take the value.
    ///
    /// Returns `None` immediately when nothing is pending.
    pub async fn settle(&mut self) -> Option<T> {
        let deadline = self.deadline()?;
        tokio::time::sleep_until(deadline).await;
        self.poll(deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(300);

    #[test]
    fn test_burst_commits_last_value_once() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(WINDOW);

        debouncer.push("a", start);
        debouncer.push("ab", start + Duration::from_millis(100));
        debouncer.push("abc", start + Duration::from_millis(200));

        assert_eq!(debouncer.poll(start + Duration::from_millis(450)), None);
        assert_eq!(debouncer.poll(start + Duration::from_millis(500)), Some("abc"));
        assert_eq!(debouncer.poll(start + Duration::from_millis(900)), None);
    }

    #[test]
    fn test_nothing_commits_before_window() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(WINDOW);
        debouncer.push(1, start);
        assert_eq!(debouncer.poll(start + Duration::from_millis(299)), None);
        assert!(debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_waits_out_the_window() {
        let mut debouncer = Debouncer::new(WINDOW);
        let start = Instant::now();
        debouncer.push("abc".to_string(), start);

        assert_eq!(debouncer.settle().await.as_deref(), Some("abc"));
        assert!(Instant::now() >= start + WINDOW);
        assert_eq!(debouncer.settle().await, None);
    }
}
