//! Cascading province → municipality → barangay selector.

pub mod controller;
pub mod pick;
pub mod state;

pub use controller::CascadingSelector;
pub use pick::{pick, PickError, PickOutput};
pub use state::{Action, Effect, LevelState, SelectError, Selection, SelectorState, Ticket};
