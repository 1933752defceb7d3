//! Resilience supervisor
//!
//! Keeps the last batch alive across host re-renders. Only the detachment
//! of the isolation surface triggers a replay, never an arbitrary mutation,
//! since injecting is itself a mutation.

use std::cell::Cell;
use std::rc::Rc;

use crate::error::DomError;

/// Source of structural-change notifications from the host document
///
/// The host delivers each notification by calling
/// `Annotator::on_structural_change`.
pub trait ChangeNotifier {
    fn observe(&mut self) -> Result<(), DomError>;
    fn disconnect(&mut self);
    fn is_observing(&self) -> bool;
}

/// Notifier driven by hand, for hosts without a mutation feed and for tests
///
/// Clones share state, so a test can keep a handle after giving one to the
/// annotator.
#[derive(Debug, Clone, Default)]
pub struct ManualNotifier {
    observing: Rc<Cell<bool>>,
    observe_calls: Rc<Cell<usize>>,
}

impl ManualNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe_calls(&self) -> usize {
        self.observe_calls.get()
    }
}

impl ChangeNotifier for ManualNotifier {
    fn observe(&mut self) -> Result<(), DomError> {
        self.observing.set(true);
        self.observe_calls.set(self.observe_calls.get() + 1);
        Ok(())
    }

    fn disconnect(&mut self) {
        self.observing.set(false);
    }

    fn is_observing(&self) -> bool {
        self.observing.get()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Idle,
    Watching,
    Replaying,
}

pub struct Supervisor {
    state: SupervisorState,
    notifier: Box<dyn ChangeNotifier>,
    replays: usize,
}

impl Supervisor {
    pub fn new(notifier: Box<dyn ChangeNotifier>) -> Self {
        Self {
            state: SupervisorState::Idle,
            notifier,
            replays: 0,
        }
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    pub fn replay_count(&self) -> usize {
        self.replays
    }

    /// Start watching after a successful injection
    pub fn arm(&mut self) {
        match self.state {
            SupervisorState::Watching => {}
            SupervisorState::Replaying => self.state = SupervisorState::Watching,
            SupervisorState::Idle => {
                if !self.notifier.is_observing() {
                    if let Err(e) = self.notifier.observe() {
                        tracing::warn!("Could not watch document for changes: {}", e);
                        return;
                    }
                }
                self.state = SupervisorState::Watching;
            }
        }
    }

    /// Stop watching; safe to call in any state
    pub fn disarm(&mut self) {
        if self.notifier.is_observing() {
            self.notifier.disconnect();
        }
        self.state = SupervisorState::Idle;
    }

    /// Whether a notification should replay the batch
    pub fn should_replay(&self, surface_attached: bool) -> bool {
        self.state == SupervisorState::Watching && !surface_attached
    }

    pub fn begin_replay(&mut self) {
        self.state = SupervisorState::Replaying;
        self.replays += 1;
    }

    /// Return to watching, or go idle when the replay could not rebuild the
    /// surface so a broken host cannot keep re-triggering us.
    pub fn finish_replay(&mut self, surface_rebuilt: bool) {
        if surface_rebuilt {
            self.state = SupervisorState::Watching;
        } else {
            tracing::warn!("Replay could not rebuild the isolation surface; stopped watching");
            self.disarm();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_machine() {
        let notifier = ManualNotifier::new();
        let mut supervisor = Supervisor::new(Box::new(notifier.clone()));
        assert_eq!(supervisor.state(), SupervisorState::Idle);
        assert!(!supervisor.should_replay(false));

        supervisor.arm();
        assert_eq!(supervisor.state(), SupervisorState::Watching);
        assert!(notifier.is_observing());
        assert!(!supervisor.should_replay(true));
        assert!(supervisor.should_replay(false));

        supervisor.begin_replay();
        assert_eq!(supervisor.state(), SupervisorState::Replaying);
        assert!(!supervisor.should_replay(false));

        supervisor.finish_replay(true);
        assert_eq!(supervisor.state(), SupervisorState::Watching);
        assert_eq!(supervisor.replay_count(), 1);

        supervisor.disarm();
        assert_eq!(supervisor.state(), SupervisorState::Idle);
        assert!(!notifier.is_observing());
    }

    #[test]
    fn test_arm_is_idempotent() {
        let notifier = ManualNotifier::new();
        let mut supervisor = Supervisor::new(Box::new(notifier.clone()));
        supervisor.arm();
        supervisor.arm();
        assert_eq!(notifier.observe_calls(), 1);
    }

    #[test]
    fn test_failed_replay_goes_idle() {
        let notifier = ManualNotifier::new();
        let mut supervisor = Supervisor::new(Box::new(notifier.clone()));
        supervisor.arm();
        supervisor.begin_replay();
        supervisor.finish_replay(false);

        assert_eq!(supervisor.state(), SupervisorState::Idle);
        assert!(!notifier.is_observing());
    }

    struct Refusing;

    impl ChangeNotifier for Refusing {
        fn observe(&mut self) -> Result<(), DomError> {
            Err(DomError::Host("observer unavailable".into()))
        }
        fn disconnect(&mut self) {}
        fn is_observing(&self) -> bool {
            false
        }
    }

    #[test]
    fn test_arm_stays_idle_when_observe_fails() {
        let mut supervisor = Supervisor::new(Box::new(Refusing));
        supervisor.arm();
        assert_eq!(supervisor.state(), SupervisorState::Idle);
    }
}
