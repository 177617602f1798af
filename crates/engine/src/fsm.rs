use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use tracing::debug;

use crate::app::DrawList;

/// One named behavior of a state machine.
///
/// `Actor` is the data the machine drives; `Env` is whatever else a tick needs
/// (input, world) and is borrowed only for the duration of a call. `update`
/// reports a transition instead of performing it, so a state can never
/// transition twice in one tick.
pub trait State {
    type Key: Copy + Eq + Hash + Debug;
    type Actor;
    type Env<'e>;

    fn enter<'e>(&mut self, _actor: &mut Self::Actor, _env: &mut Self::Env<'e>) {}

    fn exit<'e>(&mut self, _actor: &mut Self::Actor, _env: &mut Self::Env<'e>) {}

    fn update<'e>(
        &mut self,
        actor: &mut Self::Actor,
        env: &mut Self::Env<'e>,
        dt: f32,
    ) -> Option<Self::Key>;

    fn render(&self, _actor: &Self::Actor, _frame: &mut DrawList) {}
}

pub struct StateMachine<S: State> {
    states: HashMap<S::Key, S>,
    current: Option<S::Key>,
}

impl<S: State> Default for StateMachine<S> {
    fn default() -> Self {
        Self {
            states: HashMap::new(),
            current: None,
        }
    }
}

impl<S: State> StateMachine<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `state` under `key`, replacing any earlier registration.
    pub fn add(&mut self, key: S::Key, state: S) {
        self.states.insert(key, state);
    }

    pub fn current(&self) -> Option<S::Key> {
        self.current
    }

    pub fn is_registered(&self, key: S::Key) -> bool {
        self.states.contains_key(&key)
    }

    /// Exits the current state (if any) and enters `key`. Re-entering the
    /// current state is allowed and runs both hooks.
    ///
    /// # Panics
    ///
    /// Panics if `key` was never registered; that is a wiring bug.
    pub fn change<'e>(&mut self, key: S::Key, actor: &mut S::Actor, env: &mut S::Env<'e>) {
        assert!(
            self.is_registered(key),
            "state machine has no state registered for {key:?}"
        );

        let previous = self.current;
        if let Some(state) = previous.and_then(|current| self.states.get_mut(&current)) {
            state.exit(actor, env);
        }
        self.current = Some(key);
        if let Some(state) = self.states.get_mut(&key) {
            state.enter(actor, env);
        }
        debug!(from = ?previous, to = ?key, "state_changed");
    }

    /// Runs the current state's update and applies at most one transition.
    pub fn update<'e>(&mut self, actor: &mut S::Actor, env: &mut S::Env<'e>, dt: f32) {
        let Some(current) = self.current else {
            return;
        };
        let next = self
            .states
            .get_mut(&current)
            .and_then(|state| state.update(actor, env, dt));
        if let Some(next) = next {
            self.change(next, actor, env);
        }
    }

    pub fn render(&self, actor: &S::Actor, frame: &mut DrawList) {
        if let Some(state) = self.current.and_then(|current| self.states.get(&current)) {
            state.render(actor, frame);
        }
    }
}
