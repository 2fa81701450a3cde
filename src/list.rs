// Recommendation List
//
// *La Liste* (The List) - Render description of the accumulated feed and the infinite-scroll trigger

use crate::query::{FetchKind, PaginatedQuery, QueryState};
use crate::types::{Class, Recommendation};
use serde::Serialize;

/// Message shown when a result set is loaded but empty
pub const EMPTY_MESSAGE: &str = "No recommendations found";

/// Badge color for a severity class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityColor {
    /// Critical
    Red,
    /// High
    Orange,
    /// Medium
    Yellow,
    /// Low
    Green,
}

impl From<Class> for SeverityColor {
    fn from(class: Class) -> Self {
        match class {
            Class::Critical => SeverityColor::Red,
            Class::High => SeverityColor::Orange,
            Class::Medium => SeverityColor::Yellow,
            Class::Low => SeverityColor::Green,
        }
    }
}

/// Archive affordance offered on a card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ArchiveAction {
    /// Item is active; the action archives it
    Archive,

    /// Item is archived; the action restores it
    Restore,
}

impl ArchiveAction {
    /// Target `archived` value when the action is taken
    pub fn target(self) -> bool {
        matches!(self, ArchiveAction::Archive)
    }
}

/// One rendered recommendation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Card {
    /// Recommendation id, the mutation target
    pub id: String,
    /// Title
    pub title: String,
    /// Description
    pub description: String,
    /// Ranking score
    pub score: f64,
    /// Provider badges
    pub providers: Vec<String>,
    /// Framework badges (framework names)
    pub frameworks: Vec<String>,
    /// Severity badge
    pub class: Class,
    /// Severity badge color
    pub color: SeverityColor,
    /// Archive toggle
    pub action: ArchiveAction,
}

impl From<&Recommendation> for Card {
    fn from(rec: &Recommendation) -> Self {
        Self {
            id: rec.id.clone(),
            title: rec.title.clone(),
            description: rec.description.clone(),
            score: rec.score,
            providers: rec.providers.iter().map(|p| p.as_str().to_string()).collect(),
            frameworks: rec.frameworks.iter().map(|f| f.name.clone()).collect(),
            class: rec.class,
            color: rec.class.into(),
            action: if rec.archived {
                ArchiveAction::Restore
            } else {
                ArchiveAction::Archive
            },
        }
    }
}

/// What follows the last card
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Footer {
    /// More pages exist; visibility of this marker requests the next one.
    /// After a failed next page it stays mounted and carries the error, and
    /// bringing it back into view retries the same cursor.
    Sentinel {
        /// Error text of the failed next page, if any
        error: Option<String>,
    },

    /// Next page in flight
    LoadingSkeleton,

    /// End of the result set
    End,
}

/// Render description of the list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ListView {
    /// First page pending
    Skeletons {
        /// Number of placeholders
        count: usize,
    },

    /// First page failed
    Failed {
        /// Error text
        message: String,
    },

    /// Loaded, nothing matched
    Empty {
        /// Message shown
        message: &'static str,
    },

    /// Loaded items
    Items {
        /// Cards in feed order
        cards: Vec<Card>,

        /// Trailing element
        footer: Footer,
    },
}

impl ListView {
    /// Render the engine's current state
    pub fn render(engine: &PaginatedQuery, skeleton_count: usize) -> Self {
        let items = engine.items();

        match engine.state() {
            QueryState::Idle | QueryState::Loading => {
                return ListView::Skeletons {
                    count: skeleton_count,
                }
            }
            QueryState::Error {
                message,
                during: FetchKind::FirstPage,
            } if items.is_empty() => {
                return ListView::Failed {
                    message: message.clone(),
                }
            }
            _ => {}
        }

        if items.is_empty() {
            return ListView::Empty {
                message: EMPTY_MESSAGE,
            };
        }

        let footer = match engine.state() {
            QueryState::LoadingMore => Footer::LoadingSkeleton,
            _ if !engine.has_more() => Footer::End,
            QueryState::Error { message, .. } => Footer::Sentinel {
                error: Some(message.clone()),
            },
            _ => Footer::Sentinel { error: None },
        };

        ListView::Items {
            cards: items.into_iter().map(Card::from).collect(),
            footer,
        }
    }

    /// Whether a sentinel is currently rendered
    pub fn has_sentinel(&self) -> bool {
        matches!(
            self,
            ListView::Items {
                footer: Footer::Sentinel { .. },
                ..
            }
        )
    }

    /// Cards, if any are shown
    pub fn cards(&self) -> &[Card] {
        match self {
            ListView::Items { cards, .. } => cards,
            _ => &[],
        }
    }
}

/// Turns raw sentinel visibility samples into load-more triggers.
///
/// Fires once per not-visible to visible transition; staying visible or
/// flapping within one visible stretch never fires twice.
#[derive(Debug, Clone, Default)]
pub struct SentinelTracker {
    visible: bool,
}

impl SentinelTracker {
    /// Tracker starting off-screen
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a visibility sample. Returns `true` on a rising edge.
    pub fn observe(&mut self, visible: bool) -> bool {
        let rising = visible && !self.visible;
        self.visible = visible;
        rising
    }

    /// Forget the last sample, e.g. when the sentinel is unmounted
    pub fn reset(&mut self) {
        self.visible = false;
    }

    /// Last observed visibility
    pub fn is_visible(&self) -> bool {
        self.visible
    }
}
