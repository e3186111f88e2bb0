//! Async driver around [`SelectorState`].
//!
//! Carries out the reducer's effects: projections go straight to the
//! address sink, fetches go to the directory. `select_level` and
//! `load_top_level` run a full cycle; `begin_*` / `settle` let an event
//! loop keep several fetches in flight and feed results back in any order.

use tracing::debug;

use crate::address::AddressSink;
use crate::location::{Directory, Level, LocationError, LocationOption};

use super::state::{Action, Effect, SelectError, Selection, SelectorState, Ticket};

pub struct CascadingSelector<D, S> {
    state: SelectorState,
    directory: D,
    sink: S,
}

impl<D: Directory, S: AddressSink> CascadingSelector<D, S> {
    pub fn new(directory: D, sink: S) -> Self {
        Self {
            state: SelectorState::new(),
            directory,
            sink,
        }
    }

    /// Fetch the province list. Failures are logged and leave the list
    /// empty; nothing is returned to the caller.
    pub async fn load_top_level(&mut self) {
        if let Some(ticket) = self.begin_load_top_level() {
            self.resolve(ticket).await;
        }
    }

    /// Select `code` at `level` (or clear it with `None`/empty), then load
    /// the next level's options if there is one.
    pub async fn select_level(&mut self, level: Level, code: Option<&str>) -> Result<(), SelectError> {
        if let Some(ticket) = self.begin_select(level, code)? {
            self.resolve(ticket).await;
        }
        Ok(())
    }

    pub fn begin_load_top_level(&mut self) -> Option<Ticket> {
        let effects = self.state.apply(Action::LoadTopLevel);
        self.dispatch(effects)
    }

    /// Apply a selection and its projections. Returns the ticket of the
    /// fetch the caller must run, if any.
    pub fn begin_select(&mut self, level: Level, code: Option<&str>) -> Result<Option<Ticket>, SelectError> {
        let effects = self.state.try_apply(Action::Select {
            level,
            code: code.map(str::to_string),
        })?;
        Ok(self.dispatch(effects))
    }

    /// Run the fetch for `ticket` without touching selector state.
    pub async fn fetch(&self, ticket: &Ticket) -> Result<Vec<LocationOption>, LocationError> {
        self.directory.list(&ticket.key).await
    }

    /// Feed a fetch result back. Returns false when the result was stale
    /// and discarded.
    pub fn settle(&mut self, ticket: Ticket, result: Result<Vec<LocationOption>, LocationError>) -> bool {
        let current = self.state.is_current(&ticket);
        let effects = self.state.apply(Action::Resolved { ticket, result });
        self.dispatch(effects);
        current
    }

    /// Fetch and settle in one step.
    pub async fn resolve(&mut self, ticket: Ticket) -> bool {
        let result = self.fetch(&ticket).await;
        self.settle(ticket, result)
    }

    fn dispatch(&mut self, effects: Vec<Effect>) -> Option<Ticket> {
        let mut fetch = None;
        for effect in effects {
            match effect {
                Effect::Project { level, name } => self.sink.project(level, name.as_deref()),
                Effect::Fetch(ticket) => {
                    debug!(level = %ticket.level(), key = %ticket.key, seq = ticket.seq, "fetch issued");
                    fetch = Some(ticket);
                }
            }
        }
        fetch
    }

    pub fn is_loading(&self, level: Level) -> bool {
        self.state.is_loading(level)
    }

    pub fn is_enabled(&self, level: Level) -> bool {
        self.state.is_enabled(level)
    }

    pub fn options(&self, level: Level) -> &[LocationOption] {
        self.state.options(level)
    }

    pub fn selected(&self, level: Level) -> Option<&str> {
        self.state.selected(level)
    }

    pub fn selection(&self) -> Selection {
        self.state.selection()
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}
