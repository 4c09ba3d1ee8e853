//! Three-step accessibility onboarding: mobility, sensory comfort, dietary
//! needs. The wizard is pure state; the TUI drives it and submits the result
//! through [`submit_profile`].

use crate::backend::Backend;
use crate::errors::CliError;
use crate::model::OnboardingProfile;

pub const SLIDER_MAX: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OnboardingStep {
    Mobility,
    Sensory,
    Dietary,
}

impl OnboardingStep {
    pub const ALL: [OnboardingStep; 3] = [
        OnboardingStep::Mobility,
        OnboardingStep::Sensory,
        OnboardingStep::Dietary,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn title(self) -> &'static str {
        match self {
            OnboardingStep::Mobility => "Mobility Needs",
            OnboardingStep::Sensory => "Sensory Preferences",
            OnboardingStep::Dietary => "Dietary Needs",
        }
    }

    pub fn subtitle(self) -> &'static str {
        match self {
            OnboardingStep::Mobility => "Let us know how we can make your journey easier.",
            OnboardingStep::Sensory => "We'll help you find places that match your comfort.",
            OnboardingStep::Dietary => {
                "Let us know about any allergies or dietary restrictions."
            }
        }
    }

    fn prev(self) -> Option<Self> {
        match self {
            OnboardingStep::Mobility => None,
            OnboardingStep::Sensory => Some(OnboardingStep::Mobility),
            OnboardingStep::Dietary => Some(OnboardingStep::Sensory),
        }
    }

    fn next(self) -> Option<Self> {
        match self {
            OnboardingStep::Mobility => Some(OnboardingStep::Sensory),
            OnboardingStep::Sensory => Some(OnboardingStep::Dietary),
            OnboardingStep::Dietary => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MobilityToggle {
    Wheelchair,
    AvoidStairs,
    FrequentRests,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slider {
    Noise,
    Visual,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OnboardingWizard {
    step: OnboardingStep,
    profile: OnboardingProfile,
    tag_input: String,
    saving: bool,
}

impl Default for OnboardingWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl OnboardingWizard {
    pub fn new() -> Self {
        Self {
            step: OnboardingStep::Mobility,
            profile: OnboardingProfile::default(),
            tag_input: String::new(),
            saving: false,
        }
    }

    pub fn step(&self) -> OnboardingStep {
        self.step
    }

    pub fn profile(&self) -> &OnboardingProfile {
        &self.profile
    }

    pub fn tag_input(&self) -> &str {
        &self.tag_input
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn back(&mut self) {
        if let Some(prev) = self.step.prev() {
            self.step = prev;
        }
    }

    pub fn next(&mut self) {
        if let Some(next) = self.step.next() {
            self.step = next;
        }
    }

    pub fn toggle(&mut self, which: MobilityToggle) {
        let mobility = &mut self.profile.mobility;
        let flag = match which {
            MobilityToggle::Wheelchair => &mut mobility.wheelchair,
            MobilityToggle::AvoidStairs => &mut mobility.avoid_stairs,
            MobilityToggle::FrequentRests => &mut mobility.frequent_rests,
        };
        *flag = !*flag;
    }

    pub fn slider(&self, which: Slider) -> u8 {
        match which {
            Slider::Noise => self.profile.sensory.noise,
            Slider::Visual => self.profile.sensory.visual,
        }
    }

    pub fn set_slider(&mut self, which: Slider, value: i32) {
        let value = value.clamp(0, i32::from(SLIDER_MAX)) as u8;
        match which {
            Slider::Noise => self.profile.sensory.noise = value,
            Slider::Visual => self.profile.sensory.visual = value,
        }
    }

    pub fn nudge_slider(&mut self, which: Slider, delta: i32) {
        let current = i32::from(self.slider(which));
        self.set_slider(which, current + delta);
    }

    pub fn push_tag_char(&mut self, c: char) {
        self.tag_input.push(c);
    }

    pub fn pop_tag_char(&mut self) {
        self.tag_input.pop();
    }

    /// Append the trimmed tag input. Blank input is ignored; duplicates are
    /// kept.
    pub fn add_tag(&mut self) -> bool {
        let tag = self.tag_input.trim();
        if tag.is_empty() {
            return false;
        }
        self.profile.dietary.push(tag.to_string());
        self.tag_input.clear();
        true
    }

    pub fn remove_tag(&mut self, index: usize) -> Option<String> {
        (index < self.profile.dietary.len()).then(|| self.profile.dietary.remove(index))
    }

    /// Hand out the profile for submission. Only available on the last step,
    /// and only once until [`save_failed`](Self::save_failed) re-arms it.
    pub fn finish(&mut self) -> Option<OnboardingProfile> {
        if self.step != OnboardingStep::Dietary || self.saving {
            return None;
        }
        self.saving = true;
        Some(self.profile.clone())
    }

    pub fn save_failed(&mut self) {
        self.saving = false;
    }
}

pub async fn submit_profile<B>(
    backend: &B,
    token: &str,
    profile: &OnboardingProfile,
) -> Result<(), CliError>
where
    B: Backend + Sync,
{
    tracing::info!(
        dietary = profile.dietary.len(),
        wheelchair = profile.mobility.wheelchair,
        "saving onboarding profile"
    );
    backend.save_profile(token, profile).await
}

/// Whether the wizard should open for this principal. Any failure of the
/// check keeps it closed.
pub async fn needs_onboarding<B>(backend: &B, token: Option<&str>) -> bool
where
    B: Backend + Sync,
{
    let Some(token) = token else {
        return false;
    };
    match backend.check_onboarding(token).await {
        Ok(onboarded) => !onboarded,
        Err(err) => {
            tracing::warn!(error = %err, "onboarding check failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake::{Call, FakeBackend};

    #[test]
    fn navigation_is_clamped_at_both_ends() {
        let mut wizard = OnboardingWizard::new();
        wizard.back();
        assert_eq!(wizard.step(), OnboardingStep::Mobility);
        wizard.next();
        wizard.next();
        wizard.next();
        assert_eq!(wizard.step(), OnboardingStep::Dietary);
        assert_eq!(wizard.step().index(), 2);
    }

    #[test]
    fn back_and_next_keep_edits() {
        let mut wizard = OnboardingWizard::new();
        wizard.toggle(MobilityToggle::Wheelchair);
        wizard.next();
        wizard.set_slider(Slider::Noise, 35);
        wizard.back();
        assert!(wizard.profile().mobility.wheelchair);
        wizard.next();
        wizard.next();
        wizard.back();
        assert_eq!(wizard.slider(Slider::Noise), 35);
    }

    #[test]
    fn sliders_clamp_to_range() {
        let mut wizard = OnboardingWizard::new();
        wizard.set_slider(Slider::Visual, 140);
        assert_eq!(wizard.slider(Slider::Visual), 100);
        wizard.nudge_slider(Slider::Visual, -250);
        assert_eq!(wizard.slider(Slider::Visual), 0);
        wizard.nudge_slider(Slider::Noise, 10);
        assert_eq!(wizard.slider(Slider::Noise), 10);
    }

    #[test]
    fn tags_are_trimmed_and_duplicates_allowed() {
        let mut wizard = OnboardingWizard::new();
        for c in "  peanuts ".chars() {
            wizard.push_tag_char(c);
        }
        assert!(wizard.add_tag());
        assert_eq!(wizard.tag_input(), "");
        "peanuts".chars().for_each(|c| wizard.push_tag_char(c));
        wizard.add_tag();
        "   ".chars().for_each(|c| wizard.push_tag_char(c));
        assert!(!wizard.add_tag());
        assert_eq!(wizard.profile().dietary, vec!["peanuts", "peanuts"]);

        assert_eq!(wizard.remove_tag(0).as_deref(), Some("peanuts"));
        assert_eq!(wizard.remove_tag(5), None);
        assert_eq!(wizard.profile().dietary.len(), 1);
    }

    #[test]
    fn finish_only_on_last_step_and_once() {
        let mut wizard = OnboardingWizard::new();
        assert!(wizard.finish().is_none());
        wizard.next();
        wizard.next();
        assert!(wizard.finish().is_some());
        assert!(wizard.is_saving());
        assert!(wizard.finish().is_none());
        wizard.save_failed();
        assert!(wizard.finish().is_some());
    }

    #[tokio::test]
    async fn full_walkthrough_posts_one_profile_with_every_edit() {
        let backend = FakeBackend::default();
        let mut wizard = OnboardingWizard::new();

        wizard.toggle(MobilityToggle::AvoidStairs);
        wizard.toggle(MobilityToggle::FrequentRests);
        wizard.next();
        wizard.set_slider(Slider::Noise, 20);
        wizard.set_slider(Slider::Visual, 80);
        wizard.next();
        "gluten".chars().for_each(|c| wizard.push_tag_char(c));
        wizard.add_tag();

        let profile = wizard.finish().unwrap();
        submit_profile(&backend, "tok", &profile).await.unwrap();
        assert!(wizard.finish().is_none());

        let calls = backend.call_kinds();
        assert_eq!(calls.len(), 1);
        let Call::SaveProfile { token, profile } = &calls[0] else {
            panic!("unexpected {:?}", calls[0]);
        };
        assert_eq!(token, "tok");
        assert!(!profile.mobility.wheelchair);
        assert!(profile.mobility.avoid_stairs);
        assert!(profile.mobility.frequent_rests);
        assert_eq!((profile.sensory.noise, profile.sensory.visual), (20, 80));
        assert_eq!(profile.dietary, vec!["gluten"]);
    }

    #[tokio::test]
    async fn onboarding_check_gates_the_wizard() {
        let backend = FakeBackend::default();
        assert!(!needs_onboarding(&backend, None).await);
        assert!(backend.calls().is_empty());
        assert!(needs_onboarding(&backend, Some("tok")).await);

        let mut done = FakeBackend::default();
        done.onboarded = true;
        assert!(!needs_onboarding(&done, Some("tok")).await);
    }
}
