use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThinkingStep {
    pub label: &'static str,
    pub duration: Duration,
}

/// Progress narrative shown while an itinerary is being generated. The request
/// itself is only dispatched once every step has had its full duration.
pub const THINKING_STEPS: &[ThinkingStep] = &[
    ThinkingStep {
        label: "Analyzing your request... 🧠",
        duration: Duration::from_millis(1500),
    },
    ThinkingStep {
        label: "Consulting global travel logs... 🗺️",
        duration: Duration::from_millis(2000),
    },
    ThinkingStep {
        label: "Crafting your unique blueprint... ✨",
        duration: Duration::from_millis(2000),
    },
];

/// Time after submit at which step `index` becomes visible.
pub fn step_offset(steps: &[ThinkingStep], index: usize) -> Duration {
    steps.iter().take(index).map(|s| s.duration).sum()
}

pub fn total_duration(steps: &[ThinkingStep]) -> Duration {
    steps.iter().map(|s| s.duration).sum()
}
