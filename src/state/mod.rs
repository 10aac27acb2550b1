//! Dashboard state and its URL representation.

mod field;
mod query;
mod url;

pub use field::{Field, FieldValue, PredictionFilter, ScoreFn, ScoreRange, SortDirection};
pub use query::{QueryState, StateOverrides};
#[cfg(target_arch = "wasm32")]
pub use self::url::BrowserUrl;
pub use self::url::{MemoryUrl, UrlMode, UrlStore};
