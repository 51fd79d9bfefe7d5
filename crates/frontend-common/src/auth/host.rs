//! Host context the auth store runs in

use web_sys::Window;

/// Whether the code runs with access to a page's storage and navigation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HostContext {
    /// A browsing context: `localStorage` and `location` are usable
    Browser,
    /// A server-side rendering pass or any host without a window
    Server,
}

impl HostContext {
    /// Detect the host context once, at page startup
    pub fn detect() -> Self {
        if window().is_some() {
            Self::Browser
        } else {
            Self::Server
        }
    }

    pub const fn is_browser(self) -> bool {
        matches!(self, Self::Browser)
    }
}

/// The page's window, if there is one.
///
/// Imported browser functions panic outside wasm32, so native builds never
/// have a window.
#[cfg(target_arch = "wasm32")]
pub(crate) fn window() -> Option<Window> {
    web_sys::window()
}

#[cfg(not(target_arch = "wasm32"))]
pub(crate) const fn window() -> Option<Window> {
    None
}
