//! HUD overlay
//!
//! A small egui panel drawn over the distorted frame: frame rate, camera pose
//! and the effect switches. Edits made in the panel come back as
//! [`EffectToggle`]s so they take the same path as keyboard toggles.

use std::time::{Duration, Instant};

use egui::{Color32, Context, FontFamily, FontId, Stroke, Style, Visuals};

use crate::camera::FlyCamera;
use crate::effects::{EffectFlags, EffectToggle};

/// Frames counted over one-second windows.
#[derive(Debug, Clone)]
pub struct FpsCounter {
    window_start: Instant,
    frames: u32,
    fps: f32,
}

impl FpsCounter {
    const WINDOW: Duration = Duration::from_secs(1);

    pub fn new(now: Instant) -> Self {
        Self {
            window_start: now,
            frames: 0,
            fps: 0.0,
        }
    }

    /// Counts one frame. Returns the new rate when a window closes.
    pub fn tick(&mut self, now: Instant) -> Option<f32> {
        self.frames += 1;
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < Self::WINDOW {
            return None;
        }
        self.fps = self.frames as f32 / elapsed.as_secs_f32();
        self.frames = 0;
        self.window_start = now;
        Some(self.fps)
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }
}

pub struct Hud {
    visible: bool,
}

impl Hud {
    pub fn new(ctx: &Context) -> Self {
        Self::apply_theme(ctx);
        Self { visible: true }
    }

    fn apply_theme(ctx: &Context) {
        let mut style = Style::default();
        style.spacing.item_spacing = egui::vec2(6.0, 4.0);
        style.spacing.button_padding = egui::vec2(8.0, 4.0);

        let mut visuals = Visuals::dark();
        let primary = Color32::from_rgb(100, 180, 255);
        let surface = Color32::from_rgba_unmultiplied(20, 20, 28, 210);

        visuals.panel_fill = surface;
        visuals.window_fill = surface;
        visuals.window_stroke = Stroke::new(1.0, Color32::from_gray(60));
        visuals.widgets.inactive.bg_fill = Color32::from_rgb(45, 45, 50);
        visuals.widgets.active.bg_fill = primary;
        visuals.selection.bg_fill = primary;

        style
            .text_styles
            .insert(egui::TextStyle::Body, FontId::new(14.0, FontFamily::Proportional));
        style
            .text_styles
            .insert(egui::TextStyle::Monospace, FontId::new(13.0, FontFamily::Monospace));

        ctx.set_style(style);
        ctx.set_visuals(visuals);
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }

    /// Lays out the panel. Returns the toggles for whatever switches were
    /// flipped this frame.
    pub fn render(
        &mut self,
        ctx: &Context,
        fps: f32,
        camera: &FlyCamera,
        flags: &EffectFlags,
    ) -> Vec<EffectToggle> {
        let mut toggles = Vec::new();
        if !self.visible {
            return toggles;
        }

        egui::Window::new("HUD")
            .anchor(egui::Align2::LEFT_TOP, egui::vec2(12.0, 12.0))
            .resizable(false)
            .collapsible(false)
            .title_bar(false)
            .show(ctx, |ui| {
                ui.label(egui::RichText::new(format!("{fps:.0} fps")).strong());
                ui.separator();

                let pos = camera.position();
                ui.monospace(format!("pos   {:6.2} {:6.2} {:6.2}", pos.x, pos.y, pos.z));
                ui.monospace(format!(
                    "yaw {:7.1}  pitch {:5.1}",
                    camera.yaw(),
                    camera.pitch()
                ));
                ui.monospace(format!("fov   {:5.1}", camera.zoom()));
                ui.separator();

                let mut distortion = flags.apply_distortion;
                if ui.checkbox(&mut distortion, "Lens distortion  [1]").changed() {
                    toggles.push(EffectToggle::SetDistortion(distortion));
                }
                let mut lighting = flags.use_lighting;
                if ui.checkbox(&mut lighting, "Lighting  [2]").changed() {
                    toggles.push(EffectToggle::SetLighting(lighting));
                }
                let mut dual = flags.dual_lighting;
                if ui.checkbox(&mut dual, "Dual-sided lighting  [3]").changed() {
                    toggles.push(EffectToggle::ToggleDualLighting);
                }
                if ui.button("All off  [Backspace]").clicked() {
                    toggles.push(EffectToggle::DisableAll);
                }

                ui.separator();
                ui.label(
                    egui::RichText::new("WASD move  Space/Shift up/down  Tab mouse  H hide")
                        .size(11.0)
                        .weak(),
                );
            });

        toggles
    }
}
