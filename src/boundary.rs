// Render Error Boundary
//
// *Le Garde-fou* (The Guardrail) - Contains a panicking render and replaces its subtree with a static fallback

use crate::errors::LeRecoError;
use serde::Serialize;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::error;

/// Static replacement shown after a render failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fallback {
    /// Heading
    pub title: String,

    /// Body text
    pub detail: String,
}

impl Default for Fallback {
    fn default() -> Self {
        Self {
            title: "Something went wrong".to_string(),
            detail: "Please try refreshing the page".to_string(),
        }
    }
}

/// Output of a guarded render
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Rendered<T> {
    /// The subtree rendered normally
    View(T),

    /// The subtree failed at some point and is replaced for good
    Fallback(Fallback),
}

/// Error boundary around one subtree.
///
/// Once a render panics the boundary stays tripped: later renders return the
/// fallback without calling the closure.
#[derive(Debug, Default)]
pub struct ErrorBoundary {
    fallback: Fallback,
    caught: Option<LeRecoError>,
}

impl ErrorBoundary {
    /// Boundary with the default fallback
    pub fn new() -> Self {
        Self::default()
    }

    /// Boundary with a caller-supplied fallback
    pub fn with_fallback(fallback: Fallback) -> Self {
        Self {
            fallback,
            caught: None,
        }
    }

    /// Whether a render has failed
    pub fn has_error(&self) -> bool {
        self.caught.is_some()
    }

    /// The failure that tripped the boundary
    pub fn caught(&self) -> Option<&LeRecoError> {
        self.caught.as_ref()
    }

    /// Run `render`, containing any panic
    pub fn render<T>(&mut self, render: impl FnOnce() -> T) -> Rendered<T> {
        if self.caught.is_some() {
            return Rendered::Fallback(self.fallback.clone());
        }

        match catch_unwind(AssertUnwindSafe(render)) {
            Ok(view) => Rendered::View(view),
            Err(payload) => {
                let err = LeRecoError::render_error(panic_message(payload.as_ref()));
                error!("ErrorBoundary caught an error: {}", err);
                self.caught = Some(err);
                Rendered::Fallback(self.fallback.clone())
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
