//! Instance lifecycle state machine.

use std::sync::Mutex;

/// Externally visible state of a webview instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Constructed, not yet running.
    Created,
    /// The run loop is live.
    Running,
    /// Parked with native resources released or hidden.
    Hibernated,
    /// Gone for good. Every later operation is a silent no-op.
    Destroyed,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Created => "created",
            LifecycleState::Running => "running",
            LifecycleState::Hibernated => "hibernated",
            LifecycleState::Destroyed => "destroyed",
        }
    }
}

/// Serializes state transitions for one instance.
///
/// Destroy races are resolved here: exactly one caller wins the
/// transition to Destroyed and runs teardown, everyone else sees a
/// no-op.
pub struct Lifecycle {
    state: Mutex<LifecycleState>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LifecycleState::Created),
        }
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.lock().unwrap()
    }

    pub fn is_destroyed(&self) -> bool {
        self.state() == LifecycleState::Destroyed
    }

    /// Created or Hibernated becomes Running. False in any other state.
    pub fn start_running(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        match *state {
            LifecycleState::Created | LifecycleState::Hibernated => {
                *state = LifecycleState::Running;
                true
            }
            _ => false,
        }
    }

    /// Running becomes Hibernated. False in any other state.
    pub fn hibernate(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        if *state == LifecycleState::Running {
            *state = LifecycleState::Hibernated;
            true
        } else {
            false
        }
    }

    /// Marks the instance Destroyed. True only for the caller that made
    /// the transition.
    pub fn destroy(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        if *state == LifecycleState::Destroyed {
            false
        } else {
            *state = LifecycleState::Destroyed;
            true
        }
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_full_walk() {
        let lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.state(), LifecycleState::Created);
        assert!(lifecycle.start_running());
        assert_eq!(lifecycle.state(), LifecycleState::Running);
        assert!(lifecycle.hibernate());
        assert_eq!(lifecycle.state(), LifecycleState::Hibernated);
        assert!(lifecycle.start_running());
        assert!(lifecycle.destroy());
        assert_eq!(lifecycle.state(), LifecycleState::Destroyed);
    }

    #[test]
    fn test_invalid_transitions_are_refused() {
        let lifecycle = Lifecycle::new();
        // Hibernate only applies while running.
        assert!(!lifecycle.hibernate());
        assert!(lifecycle.start_running());
        // Running twice changes nothing.
        assert!(!lifecycle.start_running());
        assert!(lifecycle.destroy());
        assert!(!lifecycle.start_running());
        assert!(!lifecycle.hibernate());
    }

    #[test]
    fn test_destroy_wins_exactly_once() {
        let lifecycle = Arc::new(Lifecycle::new());
        let winners: Vec<_> = (0..8)
            .map(|_| {
                let lifecycle = lifecycle.clone();
                thread::spawn(move || lifecycle.destroy())
            })
            .map(|handle| handle.join().unwrap())
            .collect();
        assert_eq!(winners.iter().filter(|&&won| won).count(), 1);
        assert!(lifecycle.is_destroyed());
    }
}
