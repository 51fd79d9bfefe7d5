//! Client-side navigation used by forced logout

use super::host;
use crate::error::NavigationError;
use std::cell::RefCell;
use std::rc::Rc;

/// Performs full-page navigation
pub trait Navigator {
    fn navigate(&self, path: &str) -> Result<(), NavigationError>;
}

/// Navigates by assigning `window.location.href`
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserNavigator;

impl BrowserNavigator {
    pub const fn new() -> Self {
        Self
    }
}

impl Navigator for BrowserNavigator {
    fn navigate(&self, path: &str) -> Result<(), NavigationError> {
        let window = host::window().ok_or(NavigationError::Unavailable)?;
        window
            .location()
            .set_href(path)
            .map_err(|e| NavigationError::rejected(path, format!("{e:?}")))
    }
}

/// Records requested paths instead of navigating
#[derive(Clone, Debug, Default)]
pub struct RecordingNavigator {
    visited: Rc<RefCell<Vec<String>>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every path requested so far, oldest first
    pub fn visited(&self) -> Vec<String> {
        self.visited.borrow().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.visited.borrow().last().cloned()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, path: &str) -> Result<(), NavigationError> {
        self.visited.borrow_mut().push(path.to_string());
        Ok(())
    }
}
