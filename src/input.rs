//! Input handling module
//!
//! Translates keyboard, mouse and gamepad input into camera intents and effect
//! toggles. Nothing here touches the camera or the renderer directly; the app
//! drains one [`FrameInput`] per frame and applies it.

use std::collections::HashSet;

use gilrs::{Button, Event, EventType, Gilrs};
use glam::Vec2;
use log::{debug, info};
use winit::event::{ElementState, KeyEvent, MouseScrollDelta};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::camera::Direction;
use crate::effects::EffectToggle;

/// Pixel-delta scroll events are divided by this to get wheel "lines".
const PIXELS_PER_SCROLL_LINE: f32 = 20.0;
/// Zoom applied per second with a trigger fully pressed, in degrees.
const TRIGGER_ZOOM_RATE: f32 = 60.0;
const STICK_DEADZONE: f32 = 0.15;

/// Discrete actions that are not camera or effect related.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Exit,
    ToggleCursorCapture,
    ToggleHud,
}

/// Everything the input layer collected since the previous frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameInput {
    /// Movement direction with a speed factor in [0, 1].
    pub moves: Vec<(Direction, f32)>,
    /// Look delta in pixels; +y pitches up.
    pub look: Vec2,
    /// Scroll lines; positive zooms in.
    pub scroll: f32,
    pub toggles: Vec<EffectToggle>,
    pub commands: Vec<Command>,
}

/// Accumulates device input between frames
pub struct InputState {
    gilrs: Option<Gilrs>,
    held_keys: HashSet<KeyCode>,
    pending: FrameInput,
    left_stick: Vec2,
    right_stick: Vec2,
    bumper_up: bool,
    bumper_down: bool,
    zoom_in: bool,
    zoom_out: bool,
}

impl InputState {
    pub fn new() -> Self {
        let gilrs = match Gilrs::new() {
            Ok(g) => {
                info!("Gamepad system initialized");
                Some(g)
            }
            Err(e) => {
                info!("No gamepad support: {:?}", e);
                None
            }
        };
        Self::with_gamepad(gilrs)
    }

    fn with_gamepad(gilrs: Option<Gilrs>) -> Self {
        Self {
            gilrs,
            held_keys: HashSet::new(),
            pending: FrameInput::default(),
            left_stick: Vec2::ZERO,
            right_stick: Vec2::ZERO,
            bumper_up: false,
            bumper_down: false,
            zoom_in: false,
            zoom_out: false,
        }
    }

    pub fn handle_keyboard_input(&mut self, event: &KeyEvent) {
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };

        match event.state {
            ElementState::Pressed => {
                // Held keys repeat; only the first press fires one-shot actions.
                if self.held_keys.insert(code) && !event.repeat {
                    self.on_key_pressed(code);
                }
            }
            ElementState::Released => {
                self.held_keys.remove(&code);
            }
        }
    }

    fn on_key_pressed(&mut self, code: KeyCode) {
        let pending = &mut self.pending;
        match code {
            KeyCode::Digit1 => pending.toggles.push(EffectToggle::SetDistortion(true)),
            KeyCode::Digit2 => pending.toggles.push(EffectToggle::SetLighting(true)),
            KeyCode::Digit3 => pending.toggles.push(EffectToggle::ToggleDualLighting),
            KeyCode::Backspace => pending.toggles.push(EffectToggle::DisableAll),
            KeyCode::Escape => pending.commands.push(Command::Exit),
            KeyCode::Tab => pending.commands.push(Command::ToggleCursorCapture),
            KeyCode::KeyH => pending.commands.push(Command::ToggleHud),
            _ => {}
        }
    }

    /// Raw mouse motion; `dy` grows downward like screen coordinates.
    pub fn handle_mouse_motion(&mut self, dx: f64, dy: f64) {
        self.pending.look += Vec2::new(dx as f32, -dy as f32);
    }

    pub fn handle_scroll(&mut self, delta: MouseScrollDelta) {
        self.pending.scroll += match delta {
            MouseScrollDelta::LineDelta(_, y) => y,
            MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / PIXELS_PER_SCROLL_LINE,
        };
    }

    /// Focus loss: keys released elsewhere never reach us.
    pub fn release_all(&mut self) {
        self.held_keys.clear();
    }

    /// Poll for gamepad events
    pub fn poll_gamepad(&mut self) {
        // Collect events first to avoid borrow checker issues
        let events: Vec<_> = if let Some(gilrs) = &mut self.gilrs {
            let mut events = Vec::new();
            while let Some(Event { event, .. }) = gilrs.next_event() {
                events.push(event);
            }
            events
        } else {
            Vec::new()
        };

        for event in events {
            debug!("Gamepad: {:?}", event);
            match event {
                EventType::ButtonPressed(button, _) => self.handle_button(button, true),
                EventType::ButtonReleased(button, _) => self.handle_button(button, false),
                EventType::AxisChanged(axis, value, _) => self.handle_axis(axis, value),
                _ => {}
            }
        }
    }

    fn handle_button(&mut self, button: Button, pressed: bool) {
        match button {
            Button::LeftTrigger => self.bumper_down = pressed,
            Button::RightTrigger => self.bumper_up = pressed,
            Button::LeftTrigger2 => self.zoom_out = pressed,
            Button::RightTrigger2 => self.zoom_in = pressed,
            _ if !pressed => {}
            Button::DPadUp => self.pending.toggles.push(EffectToggle::SetDistortion(true)),
            Button::West => self.pending.toggles.push(EffectToggle::SetLighting(true)),
            Button::North => self.pending.toggles.push(EffectToggle::ToggleDualLighting),
            Button::DPadDown => self.pending.toggles.push(EffectToggle::DisableAll),
            Button::Select => self.pending.commands.push(Command::ToggleHud),
            _ => {}
        }
    }

    fn handle_axis(&mut self, axis: gilrs::Axis, value: f32) {
        // Apply deadzone
        let value = if value.abs() < STICK_DEADZONE { 0.0 } else { value };

        match axis {
            gilrs::Axis::LeftStickX => self.left_stick.x = value,
            gilrs::Axis::LeftStickY => self.left_stick.y = value,
            gilrs::Axis::RightStickX => self.right_stick.x = value,
            gilrs::Axis::RightStickY => self.right_stick.y = value,
            _ => {}
        }
    }

    /// Drains the input gathered for this frame. Held keys and sticks turn
    /// into movement for `dt` seconds.
    pub fn take_frame(&mut self, dt: f32, look_rate: f32) -> FrameInput {
        let mut frame = std::mem::take(&mut self.pending);

        const KEY_MOVES: [(KeyCode, Direction); 6] = [
            (KeyCode::KeyW, Direction::Forward),
            (KeyCode::KeyS, Direction::Backward),
            (KeyCode::KeyA, Direction::Left),
            (KeyCode::KeyD, Direction::Right),
            (KeyCode::Space, Direction::Up),
            (KeyCode::ShiftLeft, Direction::Down),
        ];
        for (key, direction) in KEY_MOVES {
            if self.held_keys.contains(&key) {
                frame.moves.push((direction, 1.0));
            }
        }

        let stick = self.left_stick;
        for (value, positive, negative) in [
            (stick.y, Direction::Forward, Direction::Backward),
            (stick.x, Direction::Right, Direction::Left),
        ] {
            if value > 0.0 {
                frame.moves.push((positive, value.min(1.0)));
            } else if value < 0.0 {
                frame.moves.push((negative, (-value).min(1.0)));
            }
        }
        if self.bumper_up {
            frame.moves.push((Direction::Up, 1.0));
        }
        if self.bumper_down {
            frame.moves.push((Direction::Down, 1.0));
        }

        frame.look += self.right_stick * look_rate * dt;

        let zoom_axis = f32::from(u8::from(self.zoom_in)) - f32::from(u8::from(self.zoom_out));
        frame.scroll += zoom_axis * TRIGGER_ZOOM_RATE * dt;

        frame
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> InputState {
        InputState::with_gamepad(None)
    }

    fn press(input: &mut InputState, code: KeyCode) {
        input.held_keys.insert(code);
        input.on_key_pressed(code);
    }

    #[test]
    fn held_keys_become_moves() {
        let mut state = input();
        press(&mut state, KeyCode::KeyW);
        press(&mut state, KeyCode::ShiftLeft);
        let frame = state.take_frame(0.016, 600.0);
        assert_eq!(
            frame.moves,
            vec![(Direction::Forward, 1.0), (Direction::Down, 1.0)]
        );
        // Still held next frame.
        assert_eq!(state.take_frame(0.016, 600.0).moves.len(), 2);
        state.release_all();
        assert!(state.take_frame(0.016, 600.0).moves.is_empty());
    }

    #[test]
    fn toggle_keys_fire_once() {
        let mut state = input();
        press(&mut state, KeyCode::Digit1);
        press(&mut state, KeyCode::Digit3);
        press(&mut state, KeyCode::Backspace);
        let frame = state.take_frame(0.016, 600.0);
        assert_eq!(
            frame.toggles,
            vec![
                EffectToggle::SetDistortion(true),
                EffectToggle::ToggleDualLighting,
                EffectToggle::DisableAll,
            ]
        );
        assert!(state.take_frame(0.016, 600.0).toggles.is_empty());
    }

    #[test]
    fn mouse_motion_accumulates_with_inverted_y() {
        let mut state = input();
        state.handle_mouse_motion(3.0, 4.0);
        state.handle_mouse_motion(1.0, -10.0);
        let frame = state.take_frame(0.016, 600.0);
        assert_eq!(frame.look, Vec2::new(4.0, 6.0));
        assert_eq!(state.take_frame(0.016, 600.0).look, Vec2::ZERO);
    }

    #[test]
    fn scroll_lines_and_pixels() {
        let mut state = input();
        state.handle_scroll(MouseScrollDelta::LineDelta(0.0, 2.0));
        state.handle_scroll(MouseScrollDelta::PixelDelta(
            winit::dpi::PhysicalPosition::new(0.0, -20.0),
        ));
        assert_eq!(state.take_frame(0.016, 600.0).scroll, 1.0);
    }

    #[test]
    fn sticks_and_triggers() {
        let mut state = input();
        state.handle_axis(gilrs::Axis::LeftStickY, -0.5);
        state.handle_axis(gilrs::Axis::LeftStickX, 0.05);
        state.handle_axis(gilrs::Axis::RightStickX, 1.0);
        state.handle_button(Button::RightTrigger2, true);
        let frame = state.take_frame(0.5, 600.0);
        assert_eq!(frame.moves, vec![(Direction::Backward, 0.5)]);
        assert_eq!(frame.look, Vec2::new(300.0, 0.0));
        assert_eq!(frame.scroll, 30.0);
    }

    #[test]
    fn gamepad_buttons_map_to_toggles_on_press_only() {
        let mut state = input();
        state.handle_button(Button::North, true);
        state.handle_button(Button::North, false);
        state.handle_button(Button::Select, true);
        let frame = state.take_frame(0.016, 600.0);
        assert_eq!(frame.toggles, vec![EffectToggle::ToggleDualLighting]);
        assert_eq!(frame.commands, vec![Command::ToggleHud]);
    }

    #[test]
    fn escape_requests_exit() {
        let mut state = input();
        press(&mut state, KeyCode::Escape);
        assert_eq!(state.take_frame(0.016, 600.0).commands, vec![Command::Exit]);
    }
}
