//! Worker lifecycle state machine.
//!
//! Planning is pure: given the current state and an event, [`Lifecycle::plan`]
//! returns the state to enter and the effects the controller must carry out.
//! Once the effects have run, [`Lifecycle::settle`] resolves an in-progress
//! state to its outcome.
//!
//! ```text
//! Parsed --Install--> Installing --ok--> Installed --Activate--> Activating --ok--> Active
//!                          \--err--> Redundant              \--err--> Redundant
//! ```

use http::Method;
use serde::Serialize;

use crate::Error;

/// Where a worker is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    Parsed,
    Installing,
    Installed,
    Activating,
    Active,
    Redundant,
}

/// Events delivered by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Install,
    Activate,
    Fetch { method: Method },
}

/// Side effects the controller executes, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Open (create if absent) the named generation.
    OpenGeneration(String),
    /// Fetch every shell route and store them all, or none.
    PrimeShell(Vec<String>),
    /// Activate immediately instead of waiting for existing clients to close.
    SkipWaiting,
    /// Delete every generation except the named one.
    PurgeStaleGenerations { keep: String },
    /// Take control of already-open clients without a reload.
    ClaimClients,
    /// Network first, cache as fallback.
    Intercept,
    /// Straight to the network; the cache is neither read nor written.
    Passthrough,
}

/// Result of planning an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: Lifecycle,
    pub effects: Vec<Effect>,
}

impl Lifecycle {
    /// Plan the handling of `event` for a worker owning `version`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidTransition` for lifecycle events that do not
    /// apply in the current state. Fetch events are always accepted.
    pub fn plan(self, event: &Event, version: &str, shell_routes: &[String]) -> Result<Transition, Error> {
        match (self, event) {
            (Lifecycle::Parsed, Event::Install) => Ok(Transition {
                next: Lifecycle::Installing,
                effects: vec![
                    Effect::OpenGeneration(version.to_string()),
                    Effect::PrimeShell(shell_routes.to_vec()),
                    Effect::SkipWaiting,
                ],
            }),
            (Lifecycle::Installed, Event::Activate) => Ok(Transition {
                next: Lifecycle::Activating,
                effects: vec![Effect::PurgeStaleGenerations { keep: version.to_string() }, Effect::ClaimClients],
            }),
            (state, Event::Fetch { method }) => {
                let effect =
                    if state.controls_clients() && *method == Method::GET { Effect::Intercept } else { Effect::Passthrough };
                Ok(Transition { next: state, effects: vec![effect] })
            }
            (state, event) => Err(Error::InvalidTransition { event: event.clone(), state }),
        }
    }

    /// Resolve an in-progress state once its effects have run.
    pub fn settle(self, succeeded: bool) -> Lifecycle {
        match (self, succeeded) {
            (Lifecycle::Installing, true) => Lifecycle::Installed,
            (Lifecycle::Activating, true) => Lifecycle::Active,
            (Lifecycle::Installing | Lifecycle::Activating, false) => Lifecycle::Redundant,
            (state, _) => state,
        }
    }

    /// Whether fetches are intercepted in this state.
    pub fn controls_clients(self) -> bool {
        self == Lifecycle::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn routes() -> Vec<String> {
        vec!["/".to_string(), "/feed".to_string()]
    }

    #[test]
    fn test_install_plan() {
        let t = Lifecycle::Parsed.plan(&Event::Install, "v2", &routes()).unwrap();
        assert_eq!(t.next, Lifecycle::Installing);
        assert_eq!(
            t.effects,
            vec![Effect::OpenGeneration("v2".to_string()), Effect::PrimeShell(routes()), Effect::SkipWaiting]
        );
    }

    #[test]
    fn test_activate_plan() {
        let t = Lifecycle::Installed.plan(&Event::Activate, "v2", &routes()).unwrap();
        assert_eq!(t.next, Lifecycle::Activating);
        assert_eq!(
            t.effects,
            vec![Effect::PurgeStaleGenerations { keep: "v2".to_string() }, Effect::ClaimClients]
        );
    }

    #[test]
    fn test_activate_before_install_rejected() {
        let result = Lifecycle::Parsed.plan(&Event::Activate, "v2", &routes());
        assert!(matches!(result, Err(Error::InvalidTransition { state: Lifecycle::Parsed, .. })));
    }

    #[test]
    fn test_reinstall_rejected() {
        for state in [Lifecycle::Installing, Lifecycle::Installed, Lifecycle::Active, Lifecycle::Redundant] {
            assert!(state.plan(&Event::Install, "v2", &routes()).is_err());
        }
    }

    #[test]
    fn test_fetch_intercepted_only_when_active() {
        let get = Event::Fetch { method: Method::GET };
        let t = Lifecycle::Active.plan(&get, "v2", &[]).unwrap();
        assert_eq!(t.next, Lifecycle::Active);
        assert_eq!(t.effects, vec![Effect::Intercept]);

        let t = Lifecycle::Installed.plan(&get, "v2", &[]).unwrap();
        assert_eq!(t.next, Lifecycle::Installed);
        assert_eq!(t.effects, vec![Effect::Passthrough]);
    }

    #[test]
    fn test_non_get_fetch_passes_through() {
        for method in [Method::POST, Method::PUT, Method::DELETE, Method::HEAD] {
            let t = Lifecycle::Active.plan(&Event::Fetch { method }, "v2", &[]).unwrap();
            assert_eq!(t.effects, vec![Effect::Passthrough]);
        }
    }

    #[test]
    fn test_settle() {
        assert_eq!(Lifecycle::Installing.settle(true), Lifecycle::Installed);
        assert_eq!(Lifecycle::Installing.settle(false), Lifecycle::Redundant);
        assert_eq!(Lifecycle::Activating.settle(true), Lifecycle::Active);
        assert_eq!(Lifecycle::Activating.settle(false), Lifecycle::Redundant);
        assert_eq!(Lifecycle::Active.settle(false), Lifecycle::Active);
    }
}
