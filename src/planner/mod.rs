//! The itinerary request lifecycle and the map/list selection it drives.

pub mod lifecycle;
pub mod selection;
pub mod task;
pub mod thinking;

pub use lifecycle::{NoticeLevel, Phase, Planner, PriceLookup, SaveStatus};
pub use selection::{Highlight, SelectionState};
