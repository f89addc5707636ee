//! Runtime-toggleable render effects

use log::info;

/// Effect switches read by the renderer once per frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EffectFlags {
    /// Barrel distortion + chromatic fringe in the post pass.
    pub apply_distortion: bool,
    pub use_lighting: bool,
    /// Two-sided lighting: back-facing fragments use the flipped normal.
    pub dual_lighting: bool,
}

/// Discrete toggle events produced by input adapters and the HUD.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectToggle {
    SetDistortion(bool),
    SetLighting(bool),
    ToggleDualLighting,
    /// Distortion and lighting off. Dual lighting keeps its state.
    DisableAll,
}

impl EffectFlags {
    /// Applies one toggle; returns whether any flag changed.
    pub fn apply(&mut self, toggle: EffectToggle) -> bool {
        let before = *self;
        match toggle {
            EffectToggle::SetDistortion(on) => self.apply_distortion = on,
            EffectToggle::SetLighting(on) => self.use_lighting = on,
            EffectToggle::ToggleDualLighting => self.dual_lighting = !self.dual_lighting,
            EffectToggle::DisableAll => {
                self.apply_distortion = false;
                self.use_lighting = false;
            }
        }

        let changed = before != *self;
        if changed {
            info!(
                "Effects: distortion={} lighting={} dual_lighting={}",
                self.apply_distortion, self.use_lighting, self.dual_lighting
            );
        }
        changed
    }

    pub fn apply_all<I>(&mut self, toggles: I) -> bool
    where
        I: IntoIterator<Item = EffectToggle>,
    {
        toggles
            .into_iter()
            .fold(false, |changed, toggle| self.apply(toggle) | changed)
    }
}
