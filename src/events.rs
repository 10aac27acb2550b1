//! Events exchanged over the dashboard bus.

use si_raster::RasterBuffer;

use crate::results::Placeholder;

/// Name under which handlers are bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A result placeholder scrolled into view for the first time.
    ResultOnScreen,
    /// The annotation layer was cleared.
    MaskReset,
    /// A brush stroke changed the annotation layer.
    MaskChanged,
    /// The user asked to rank the current annotation.
    MaskSubmit,
    /// The pointer entered a ranked prediction's bar or badge.
    RankedHover,
    /// The pointer left the ranked panel's bars and badges.
    RankedHoverEnd,
    /// A result card was clicked.
    ResultSelected,
}

/// Payload of a ranked-panel hover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightEvent {
    /// Position in the ranked list of the item that was hovered.
    pub list_position: usize,
    /// Position in the ranked list whose score the hovered bar shows.
    pub source_position: usize,
    /// Whether the hovered bar is the item's own score.
    pub is_own_score: bool,
}

/// An event with its payload.
#[derive(Debug, Clone)]
pub enum DashboardEvent {
    ResultOnScreen { slot: Placeholder },
    MaskReset,
    MaskChanged,
    /// Carries a snapshot of the annotation layer.
    MaskSubmit { annotation: RasterBuffer },
    RankedHover(HighlightEvent),
    RankedHoverEnd,
    ResultSelected { id: String },
}

impl DashboardEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            DashboardEvent::ResultOnScreen { .. } => EventKind::ResultOnScreen,
            DashboardEvent::MaskReset => EventKind::MaskReset,
            DashboardEvent::MaskChanged => EventKind::MaskChanged,
            DashboardEvent::MaskSubmit { .. } => EventKind::MaskSubmit,
            DashboardEvent::RankedHover(_) => EventKind::RankedHover,
            DashboardEvent::RankedHoverEnd => EventKind::RankedHoverEnd,
            DashboardEvent::ResultSelected { .. } => EventKind::ResultSelected,
        }
    }
}
