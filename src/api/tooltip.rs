use serde::{Deserialize, Serialize};

/// Tooltip instruction for the host.
///
/// Positions are surface coordinates, margins included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TooltipEvent {
    Show {
        entity_id: String,
        display_name: String,
        x: f64,
        y: f64,
    },
    Hide,
}

impl TooltipEvent {
    #[must_use]
    pub fn is_show(&self) -> bool {
        matches!(self, Self::Show { .. })
    }
}
