//! Where the query string lives.
//!
//! The browser keeps it in `location.search` and rewrites it with
//! `history.replaceState` so state changes never pile up back-button entries.
//! Tests and embedded panels use [`MemoryUrl`].

use std::cell::RefCell;
use std::rc::Rc;

/// How a [`super::QueryState`] interacts with the URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UrlMode {
    /// Read on construction, replace on every accepted write.
    #[default]
    Sync,
    /// Never read or write the URL (embedded figure panels).
    Ignore,
}

/// Read/replace access to a query string, without the leading `?`.
pub trait UrlStore {
    fn read_query(&self) -> String;
    fn replace_query(&self, query: &str);
}

/// In-memory query string. Clones share the same string.
#[derive(Debug, Clone, Default)]
pub struct MemoryUrl {
    query: Rc<RefCell<String>>,
    writes: Rc<RefCell<usize>>,
}

impl MemoryUrl {
    pub fn new(query: &str) -> Self {
        Self {
            query: Rc::new(RefCell::new(query.trim_start_matches('?').to_string())),
            writes: Rc::default(),
        }
    }

    pub fn current(&self) -> String {
        self.query.borrow().clone()
    }

    /// Number of replace calls so far.
    pub fn write_count(&self) -> usize {
        *self.writes.borrow()
    }
}

impl UrlStore for MemoryUrl {
    fn read_query(&self) -> String {
        self.current()
    }

    fn replace_query(&self, query: &str) {
        *self.query.borrow_mut() = query.to_string();
        *self.writes.borrow_mut() += 1;
    }
}

/// The page's own URL.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserUrl;

#[cfg(target_arch = "wasm32")]
impl UrlStore for BrowserUrl {
    fn read_query(&self) -> String {
        web_sys::window()
            .and_then(|w| w.location().search().ok())
            .map(|s| s.trim_start_matches('?').to_string())
            .unwrap_or_default()
    }

    fn replace_query(&self, query: &str) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let Ok(history) = window.history() else {
            log::warn!("No history object; URL left unchanged");
            return;
        };
        let path = window.location().pathname().unwrap_or_default();
        let url = format!("{}?{}", path, query);
        if let Err(e) = history.replace_state_with_url(&wasm_bindgen::JsValue::NULL, "", Some(&url))
        {
            log::warn!("Failed to replace URL: {:?}", e);
        }
    }
}
