//! Non-interactive walk down the cascade, as run by `locality pick`.

use serde::Serialize;

use crate::address::AddressFields;
use crate::location::{match_option, Directory, Level, LocationOption};

use super::controller::CascadingSelector;
use super::state::{SelectError, Selection};

#[derive(Debug, Serialize)]
pub struct PickOutput {
    pub selection: Selection,
    pub address: AddressFields,
}

#[derive(Debug, thiserror::Error)]
pub enum PickError {
    #[error("--{level} requires --{parent}")]
    MissingParent { level: Level, parent: Level },
    #[error("No {0} options available (directory unreachable?)")]
    NoOptions(Level),
    #[error("No {level} matches '{query}'. Available:{}", list_options(.available))]
    NoMatch {
        level: Level,
        query: String,
        available: Vec<LocationOption>,
    },
    #[error(transparent)]
    Select(#[from] SelectError),
}

/// Select each queried level in turn. A query is a code or a (fuzzy) name,
/// matched against the options that level actually loaded.
///
/// Every deeper query needs its parent's query; a gap is an error rather
/// than a silently shorter address.
pub async fn pick<D: Directory>(directory: D, queries: &[Option<String>; 3]) -> Result<PickOutput, PickError> {
    for (level, query) in Level::ALL.into_iter().zip(queries) {
        let Some(parent) = level.parent() else { continue };
        if query.is_some() && queries[parent.index() as usize - 1].is_none() {
            return Err(PickError::MissingParent { level, parent });
        }
    }

    let mut selector = CascadingSelector::new(directory, AddressFields::default());
    selector.load_top_level().await;

    for (level, query) in Level::ALL.into_iter().zip(queries) {
        // No gaps, so nothing deeper is queried either
        let Some(query) = query else { break };

        let options = selector.options(level);
        if options.is_empty() {
            return Err(PickError::NoOptions(level));
        }
        let code = match match_option(options, query) {
            Some(option) => option.code.clone(),
            None => {
                return Err(PickError::NoMatch {
                    level,
                    query: query.clone(),
                    available: options.to_vec(),
                })
            }
        };

        selector.select_level(level, Some(&code)).await?;
    }

    Ok(PickOutput {
        selection: selector.selection(),
        address: selector.into_sink(),
    })
}

fn list_options(options: &[LocationOption]) -> String {
    let mut msg = String::new();
    for opt in options.iter().take(10) {
        msg.push_str(&format!("\n    {}  {}", opt.code, opt.name));
    }
    if options.len() > 10 {
        msg.push_str(&format!("\n    ... and {} more", options.len() - 10));
    }
    msg
}
