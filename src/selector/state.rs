//! Per-level selection state and the transition function.
//!
//! Every change goes through [`SelectorState::apply`]. Side effects
//! (directory fetches, projections into the form) are returned as
//! [`Effect`]s for the caller to carry out.

use serde::Serialize;
use tracing::{debug, warn};

use crate::location::{Level, LocationError, LocationOption, OptionsKey};

/// Tags one fetch with the request it was issued for.
///
/// A response is only applied while its level still waits on the same
/// ticket; anything else is stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub key: OptionsKey,
    pub seq: u64,
}

impl Ticket {
    pub fn level(&self) -> Level {
        self.key.level()
    }
}

/// State of one dropdown.
#[derive(Debug, Clone, PartialEq)]
pub enum LevelState {
    /// No parent selected; control disabled.
    Idle,
    /// Fetch in flight for this level.
    Loading { ticket: Ticket },
    /// Options available. `selected`, when set, is one of `options`.
    Loaded {
        options: Vec<LocationOption>,
        selected: Option<String>,
    },
}

impl LevelState {
    fn selected(&self) -> Option<&str> {
        match self {
            Self::Loaded { selected, .. } => selected.as_deref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Action {
    LoadTopLevel,
    Select {
        level: Level,
        /// `None` or empty clears the level.
        code: Option<String>,
    },
    Resolved {
        ticket: Ticket,
        result: Result<Vec<LocationOption>, LocationError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Fetch the options named by the ticket, then feed back `Resolved`.
    Fetch(Ticket),
    /// Write (or clear) a display name in the consuming form.
    Project { level: Level, name: Option<String> },
}

/// Caller-contract violations on `Select`. State is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectError {
    #[error("{0} options are not loaded yet")]
    LevelNotReady(Level),
    #[error("'{code}' is not one of the loaded {level} options")]
    UnknownCode { level: Level, code: String },
}

/// Selected codes, one per level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub province: Option<String>,
    pub municipality: Option<String>,
    pub barangay: Option<String>,
}

/// The whole selector: three levels plus the ticket counter.
#[derive(Debug, Clone)]
pub struct SelectorState {
    levels: [LevelState; 3],
    next_seq: u64,
}

impl Default for SelectorState {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectorState {
    pub fn new() -> Self {
        Self {
            levels: [LevelState::Idle, LevelState::Idle, LevelState::Idle],
            next_seq: 0,
        }
    }

    fn slot(level: Level) -> usize {
        level.index() as usize - 1
    }

    pub fn level(&self, level: Level) -> &LevelState {
        &self.levels[Self::slot(level)]
    }

    fn level_mut(&mut self, level: Level) -> &mut LevelState {
        &mut self.levels[Self::slot(level)]
    }

    pub fn is_loading(&self, level: Level) -> bool {
        matches!(self.level(level), LevelState::Loading { .. })
    }

    /// Whether the control for `level` accepts input.
    pub fn is_enabled(&self, level: Level) -> bool {
        matches!(self.level(level), LevelState::Loaded { .. })
    }

    /// Currently loaded options; empty unless the level is loaded.
    pub fn options(&self, level: Level) -> &[LocationOption] {
        match self.level(level) {
            LevelState::Loaded { options, .. } => options,
            _ => &[],
        }
    }

    pub fn selected(&self, level: Level) -> Option<&str> {
        self.level(level).selected()
    }

    pub fn selection(&self) -> Selection {
        Selection {
            province: self.selected(Level::Province).map(str::to_string),
            municipality: self.selected(Level::Municipality).map(str::to_string),
            barangay: self.selected(Level::Barangay).map(str::to_string),
        }
    }

    /// Whether a response for `ticket` would still be applied.
    pub fn is_current(&self, ticket: &Ticket) -> bool {
        matches!(self.level(ticket.level()), LevelState::Loading { ticket: t } if t == ticket)
    }

    /// Check an action against the caller contract without applying it.
    /// Only a non-empty `Select` can fail: its level must be loaded and the
    /// code must be one of the loaded options.
    pub fn check(&self, action: &Action) -> Result<(), SelectError> {
        match action {
            Action::Select {
                level,
                code: Some(code),
            } if !code.is_empty() => self.option_name(*level, code).map(|_| ()),
            _ => Ok(()),
        }
    }

    /// [`check`](Self::check), then [`apply`](Self::apply).
    pub fn try_apply(&mut self, action: Action) -> Result<Vec<Effect>, SelectError> {
        self.check(&action)?;
        Ok(self.apply(action))
    }

    /// The single transition function. A `Select` that fails
    /// [`check`](Self::check) is logged and changes nothing.
    pub fn apply(&mut self, action: Action) -> Vec<Effect> {
        let effects = match action {
            Action::LoadTopLevel => self.load_top_level(),
            Action::Select { level, code } => match code.filter(|c| !c.is_empty()) {
                Some(code) => self.select(level, code),
                None => self.clear(level),
            },
            Action::Resolved { ticket, result } => {
                self.resolve(ticket, result);
                Vec::new()
            }
        };
        debug_assert!(self.is_consistent());
        effects
    }

    fn option_name(&self, level: Level, code: &str) -> Result<String, SelectError> {
        match self.level(level) {
            LevelState::Loaded { options, .. } => options
                .iter()
                .find(|o| o.code == code)
                .map(|o| o.name.clone())
                .ok_or_else(|| SelectError::UnknownCode {
                    level,
                    code: code.to_string(),
                }),
            _ => Err(SelectError::LevelNotReady(level)),
        }
    }

    fn issue(&mut self, key: OptionsKey) -> Ticket {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        Ticket { key, seq }
    }

    fn load_top_level(&mut self) -> Vec<Effect> {
        let mut effects: Vec<Effect> = Level::ALL
            .iter()
            .filter(|l| self.selected(**l).is_some())
            .map(|l| Effect::Project { level: *l, name: None })
            .collect();

        for level in Level::Province.deeper() {
            *self.level_mut(level) = LevelState::Idle;
        }
        let ticket = self.issue(OptionsKey::Provinces);
        *self.level_mut(Level::Province) = LevelState::Loading {
            ticket: ticket.clone(),
        };
        effects.push(Effect::Fetch(ticket));
        effects
    }

    fn select(&mut self, level: Level, code: String) -> Vec<Effect> {
        let name = match self.option_name(level, &code) {
            Ok(name) => name,
            Err(e) => {
                warn!(error = %e, "ignoring selection");
                return Vec::new();
            }
        };
        if let LevelState::Loaded { selected, .. } = self.level_mut(level) {
            *selected = Some(code.clone());
        }

        let mut effects = vec![Effect::Project {
            level,
            name: Some(name),
        }];
        effects.extend(self.reset_below(level));

        if let Some(child) = level.child() {
            let key = match child {
                Level::Municipality => OptionsKey::Municipalities(code),
                _ => OptionsKey::Barangays(code),
            };
            let ticket = self.issue(key);
            *self.level_mut(child) = LevelState::Loading {
                ticket: ticket.clone(),
            };
            effects.push(Effect::Fetch(ticket));
        }
        effects
    }

    fn clear(&mut self, level: Level) -> Vec<Effect> {
        if let LevelState::Loaded { selected, .. } = self.level_mut(level) {
            *selected = None;
        }
        let mut effects = vec![Effect::Project { level, name: None }];
        effects.extend(self.reset_below(level));
        effects
    }

    /// Drop options and selections below `level`; in-flight fetches for
    /// those levels become stale.
    fn reset_below(&mut self, level: Level) -> Vec<Effect> {
        level
            .deeper()
            .map(|deeper| {
                *self.level_mut(deeper) = LevelState::Idle;
                Effect::Project {
                    level: deeper,
                    name: None,
                }
            })
            .collect()
    }

    fn resolve(&mut self, ticket: Ticket, result: Result<Vec<LocationOption>, LocationError>) {
        if !self.is_current(&ticket) {
            debug!(level = %ticket.level(), seq = ticket.seq, key = %ticket.key, "discarding stale options");
            return;
        }

        let options = match result {
            Ok(options) => options,
            Err(e) => {
                warn!(level = %ticket.level(), key = %ticket.key, error = %e, "failed to load options");
                Vec::new()
            }
        };
        *self.level_mut(ticket.level()) = LevelState::Loaded {
            options,
            selected: None,
        };
    }

    /// No orphaned deeper selection, and every selected code is loaded.
    pub fn is_consistent(&self) -> bool {
        let mut parent_selected = true;
        for level in Level::ALL {
            let state = self.level(level);
            if !parent_selected && !matches!(state, LevelState::Idle) {
                return false;
            }
            if let LevelState::Loaded {
                options,
                selected: Some(code),
            } = state
            {
                if !options.iter().any(|o| &o.code == code) {
                    return false;
                }
            }
            parent_selected = state.selected().is_some();
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alpha_beta() -> Vec<LocationOption> {
        vec![LocationOption::new("01", "Alpha"), LocationOption::new("02", "Beta")]
    }

    fn fetch_ticket(effects: &[Effect]) -> Option<Ticket> {
        effects.iter().find_map(|e| match e {
            Effect::Fetch(t) => Some(t.clone()),
            _ => None,
        })
    }

    fn select(state: &mut SelectorState, level: Level, code: &str) -> Vec<Effect> {
        state
            .try_apply(Action::Select {
                level,
                code: Some(code.to_string()),
            })
            .unwrap()
    }

    fn settle(state: &mut SelectorState, ticket: Ticket, options: Vec<LocationOption>) {
        let effects = state.apply(Action::Resolved {
            ticket,
            result: Ok(options),
        });
        assert!(effects.is_empty());
    }

    /// Provinces loaded with Alpha/Beta.
    fn loaded() -> SelectorState {
        let mut state = SelectorState::new();
        let effects = state.apply(Action::LoadTopLevel);
        settle(&mut state, fetch_ticket(&effects).unwrap(), alpha_beta());
        state
    }

    #[test]
    fn test_initial_state_idle() {
        let state = SelectorState::new();
        for level in Level::ALL {
            assert_eq!(state.level(level), &LevelState::Idle);
            assert!(!state.is_enabled(level));
            assert!(!state.is_loading(level));
        }
        assert!(state.is_consistent());
    }

    #[test]
    fn test_load_top_level_issues_province_fetch() {
        let mut state = SelectorState::new();
        let effects = state.apply(Action::LoadTopLevel);
        let ticket = fetch_ticket(&effects).unwrap();
        assert_eq!(ticket.key, OptionsKey::Provinces);
        assert!(state.is_loading(Level::Province));
        assert_eq!(effects.len(), 1);

        settle(&mut state, ticket, alpha_beta());
        assert!(!state.is_loading(Level::Province));
        assert_eq!(state.options(Level::Province), alpha_beta().as_slice());
    }

    #[test]
    fn test_select_projects_name_and_fetches_child() {
        let mut state = loaded();
        let effects = select(&mut state, Level::Province, "02");

        assert_eq!(
            effects[0],
            Effect::Project {
                level: Level::Province,
                name: Some("Beta".into())
            }
        );
        let fetches: Vec<_> = effects.iter().filter(|e| matches!(e, Effect::Fetch(_))).collect();
        assert_eq!(fetches.len(), 1);
        assert_eq!(
            fetch_ticket(&effects).unwrap().key,
            OptionsKey::Municipalities("02".into())
        );
        assert!(state.is_loading(Level::Municipality));
        assert_eq!(state.selected(Level::Province), Some("02"));
    }

    #[test]
    fn test_changing_top_level_resets_deeper() {
        let mut state = loaded();
        let effects = select(&mut state, Level::Province, "01");
        settle(
            &mut state,
            fetch_ticket(&effects).unwrap(),
            vec![LocationOption::new("0101", "Town")],
        );
        let effects = select(&mut state, Level::Municipality, "0101");
        settle(
            &mut state,
            fetch_ticket(&effects).unwrap(),
            vec![LocationOption::new("0101001", "Poblacion")],
        );
        select(&mut state, Level::Barangay, "0101001");
        assert_eq!(state.selected(Level::Barangay), Some("0101001"));

        let effects = select(&mut state, Level::Province, "02");
        assert_eq!(state.selected(Level::Municipality), None);
        assert_eq!(state.selected(Level::Barangay), None);
        assert!(state.options(Level::Municipality).is_empty());
        assert!(state.options(Level::Barangay).is_empty());
        assert_eq!(state.level(Level::Barangay), &LevelState::Idle);
        assert!(effects.contains(&Effect::Project {
            level: Level::Barangay,
            name: None
        }));
        assert!(state.is_consistent());
    }

    #[test]
    fn test_clear_level() {
        let mut state = loaded();
        select(&mut state, Level::Province, "01");

        let effects = state.apply(Action::Select {
            level: Level::Province,
            code: Some(String::new()),
        });
        assert_eq!(
            effects,
            vec![
                Effect::Project { level: Level::Province, name: None },
                Effect::Project { level: Level::Municipality, name: None },
                Effect::Project { level: Level::Barangay, name: None },
            ]
        );
        assert_eq!(state.selected(Level::Province), None);
        assert!(state.is_enabled(Level::Province));
        assert_eq!(state.level(Level::Municipality), &LevelState::Idle);
    }

    #[test]
    fn test_failed_fetch_leaves_empty_enabled_level() {
        let mut state = loaded();
        let effects = select(&mut state, Level::Province, "01");
        state.apply(Action::Resolved {
            ticket: fetch_ticket(&effects).unwrap(),
            result: Err(LocationError::Network("timeout".into())),
        });

        assert!(!state.is_loading(Level::Municipality));
        assert!(state.is_enabled(Level::Municipality));
        assert!(state.options(Level::Municipality).is_empty());
    }

    #[test]
    fn test_stale_response_discarded() {
        let mut state = loaded();
        let first = fetch_ticket(&select(&mut state, Level::Province, "01")).unwrap();
        let second = fetch_ticket(&select(&mut state, Level::Province, "02")).unwrap();
        assert!(!state.is_current(&first));

        settle(&mut state, second, vec![LocationOption::new("0201", "Beta Town")]);
        settle(&mut state, first, vec![LocationOption::new("0101", "Alpha Town")]);

        assert_eq!(state.options(Level::Municipality)[0].name, "Beta Town");
    }

    #[test]
    fn test_stale_response_while_still_loading() {
        let mut state = loaded();
        let first = fetch_ticket(&select(&mut state, Level::Province, "01")).unwrap();
        select(&mut state, Level::Province, "02");

        // Old response arrives first; level keeps waiting for the new one
        settle(&mut state, first, vec![LocationOption::new("0101", "Alpha Town")]);
        assert!(state.is_loading(Level::Municipality));
        assert!(state.options(Level::Municipality).is_empty());
    }

    #[test]
    fn test_response_after_parent_cleared_discarded() {
        let mut state = loaded();
        let ticket = fetch_ticket(&select(&mut state, Level::Province, "01")).unwrap();
        state.apply(Action::Select {
            level: Level::Province,
            code: None,
        });

        settle(&mut state, ticket, vec![LocationOption::new("0101", "Alpha Town")]);
        assert_eq!(state.level(Level::Municipality), &LevelState::Idle);
        assert!(state.options(Level::Municipality).is_empty());
        assert!(state.is_consistent());
    }

    #[test]
    fn test_reselecting_same_code_refetches() {
        let mut state = loaded();
        let a = fetch_ticket(&select(&mut state, Level::Province, "01")).unwrap();
        let b = fetch_ticket(&select(&mut state, Level::Province, "01")).unwrap();
        assert_eq!(a.key, b.key);
        assert_ne!(a.seq, b.seq);
        assert!(state.is_current(&b));
        assert!(!state.is_current(&a));
    }

    #[test]
    fn test_select_unknown_code_rejected() {
        let mut state = loaded();
        let err = state
            .try_apply(Action::Select {
                level: Level::Province,
                code: Some("99".into()),
            })
            .unwrap_err();
        assert_eq!(
            err,
            SelectError::UnknownCode {
                level: Level::Province,
                code: "99".into()
            }
        );
        assert_eq!(state.selected(Level::Province), None);
    }

    #[test]
    fn test_apply_ignores_invalid_select() {
        let mut state = loaded();
        select(&mut state, Level::Province, "01");

        let effects = state.apply(Action::Select {
            level: Level::Province,
            code: Some("99".into()),
        });
        assert!(effects.is_empty());
        assert_eq!(state.selected(Level::Province), Some("01"));
        assert!(state.is_loading(Level::Municipality));
    }

    #[test]
    fn test_check_accepts_clears_and_loads() {
        let state = SelectorState::new();
        assert_eq!(state.check(&Action::LoadTopLevel), Ok(()));
        assert_eq!(
            state.check(&Action::Select {
                level: Level::Barangay,
                code: None,
            }),
            Ok(())
        );
    }

    #[test]
    fn test_select_on_idle_level_rejected() {
        let mut state = loaded();
        let err = state
            .try_apply(Action::Select {
                level: Level::Municipality,
                code: Some("0101".into()),
            })
            .unwrap_err();
        assert_eq!(err, SelectError::LevelNotReady(Level::Municipality));
    }

    #[test]
    fn test_barangay_selection_issues_no_fetch() {
        let mut state = loaded();
        let t = fetch_ticket(&select(&mut state, Level::Province, "01")).unwrap();
        settle(&mut state, t, vec![LocationOption::new("0101", "Town")]);
        let t = fetch_ticket(&select(&mut state, Level::Municipality, "0101")).unwrap();
        assert_eq!(t.key, OptionsKey::Barangays("0101".into()));
        settle(&mut state, t, vec![LocationOption::new("0101001", "Poblacion")]);

        let effects = select(&mut state, Level::Barangay, "0101001");
        assert_eq!(
            effects,
            vec![Effect::Project {
                level: Level::Barangay,
                name: Some("Poblacion".into())
            }]
        );
        assert_eq!(
            state.selection(),
            Selection {
                province: Some("01".into()),
                municipality: Some("0101".into()),
                barangay: Some("0101001".into()),
            }
        );
    }

    #[test]
    fn test_reload_top_level_clears_projections() {
        let mut state = loaded();
        select(&mut state, Level::Province, "02");
        let effects = state.apply(Action::LoadTopLevel);
        assert_eq!(
            effects[0],
            Effect::Project {
                level: Level::Province,
                name: None
            }
        );
        assert!(state.is_loading(Level::Province));
        assert_eq!(state.level(Level::Municipality), &LevelState::Idle);
    }

    #[test]
    fn test_invariants_hold_over_selection_sequence() {
        let mut state = loaded();
        for code in ["01", "02", "", "02", "01"] {
            let effects = state.apply(Action::Select {
                level: Level::Province,
                code: Some(code.to_string()),
            });
            if let Some(t) = fetch_ticket(&effects) {
                settle(&mut state, t, vec![LocationOption::new(format!("{}01", code), "Town")]);
                select(&mut state, Level::Municipality, &format!("{}01", code));
            }
            assert!(state.is_consistent());
            assert_eq!(state.selected(Level::Barangay), None);
        }
    }
}
