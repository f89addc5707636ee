//! Procedural "desktop" image shown on the ring screen.
//!
//! A flat background with one application window, a few lines of fake text, a
//! button, a bouncing red dot and sparse white noise (about 5 in 256 pixels).
//! Regenerated every frame into the same buffer.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Fixed-size RGBA8 frame source.
pub struct DesktopPayload {
    width: u32,
    height: u32,
    frame: u64,
    pixels: Vec<u8>,
    rng: StdRng,
}

const BACKGROUND: [u8; 3] = [30, 30, 40];
const WINDOW: [u8; 3] = [200, 200, 210];
const TEXT: [u8; 3] = [0, 0, 0];
const BUTTON: [u8; 3] = [70, 130, 200];
const DOT: [u8; 3] = [220, 80, 60];
const NOISE: [u8; 3] = [255, 255, 255];
/// A pixel turns to noise when its random byte exceeds this.
const NOISE_THRESHOLD: u8 = 250;

impl DesktopPayload {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_seed(width, height, rand::random())
    }

    /// Same as [`DesktopPayload::new`] with a reproducible noise sequence.
    pub fn with_seed(width: u32, height: u32, seed: u64) -> Self {
        Self {
            width,
            height,
            frame: 0,
            pixels: vec![0; width as usize * height as usize * 4],
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Renders the next frame and returns its pixels (row 0 first).
    pub fn next_frame(&mut self) -> &[u8] {
        self.frame += 1;
        let (w, h) = (self.width as i64, self.height as i64);

        for y in 0..h {
            for x in 0..w {
                let color = if self.rng.random::<u8>() > NOISE_THRESHOLD {
                    NOISE
                } else {
                    desktop_color(x, y, w, h)
                };
                let idx = ((y * w + x) * 4) as usize;
                self.pixels[idx..idx + 3].copy_from_slice(&color);
                self.pixels[idx + 3] = 255;
            }
        }

        self.draw_dot();
        &self.pixels
    }

    fn draw_dot(&mut self) {
        let t = self.frame as f32;
        let (w, h) = (self.width as i64, self.height as i64);
        let cx = w / 2 + (50.0 * (t * 0.05).sin()) as i64;
        let cy = h / 2 + (30.0 * (t * 0.03).cos()) as i64;
        let radius = 20 + (5.0 * (t * 0.1).sin()) as i64;

        for y in (cy - radius).max(0)..=(cy + radius).min(h - 1) {
            for x in (cx - radius).max(0)..=(cx + radius).min(w - 1) {
                let (dx, dy) = (x - cx, y - cy);
                if dx * dx + dy * dy <= radius * radius {
                    let idx = ((y * w + x) * 4) as usize;
                    self.pixels[idx..idx + 3].copy_from_slice(&DOT);
                }
            }
        }
    }
}

fn desktop_color(x: i64, y: i64, w: i64, h: i64) -> [u8; 3] {
    let in_window = x > w / 4 && x < 3 * w / 4 && y > h / 4 && y < 3 * h / 4;
    if !in_window {
        return BACKGROUND;
    }

    let in_content =
        x > w / 4 + 20 && x < 3 * w / 4 - 20 && y > h / 4 + 40 && y < 3 * h / 4 - 20;
    if !in_content {
        return WINDOW;
    }

    let mut color = WINDOW;
    if y % 20 < 15 && x > w / 4 + 40 && x < 3 * w / 4 - 40 {
        color = TEXT;
    }
    if y > 3 * h / 4 - 50 && y < 3 * h / 4 - 30 && x > w / 2 - 40 && x < w / 2 + 40 {
        color = BUTTON;
    }
    color
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel(frame: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
        let idx = ((y * width + x) * 4) as usize;
        [frame[idx], frame[idx + 1], frame[idx + 2], frame[idx + 3]]
    }

    #[test]
    fn payload_is_rgba8_of_fixed_size() {
        let mut desktop = DesktopPayload::new(64, 48);
        assert_eq!(desktop.next_frame().len(), 64 * 48 * 4);
        assert_eq!(desktop.next_frame().len(), 64 * 48 * 4);
        assert_eq!(desktop.frame(), 2);
    }

    #[test]
    fn every_pixel_is_opaque() {
        let mut desktop = DesktopPayload::new(32, 32);
        assert!(desktop.next_frame().chunks(4).all(|px| px[3] == 255));
    }

    #[test]
    fn layout_has_background_and_window() {
        let mut desktop = DesktopPayload::new(1024, 768);
        let frame = desktop.next_frame().to_vec();
        let corner = pixel(&frame, 1024, 1, 1);
        assert!(corner[..3] == BACKGROUND || corner[..3] == NOISE);
        // Window title bar strip, above the content area.
        let bar = pixel(&frame, 1024, 300, 200);
        assert!(bar[..3] == WINDOW || bar[..3] == NOISE);
    }

    #[test]
    fn dot_is_drawn_near_center() {
        let mut desktop = DesktopPayload::new(1024, 768);
        let frame = desktop.next_frame().to_vec();
        let cx = 512 + (50.0 * 0.05f32.sin()) as u32;
        let cy = 384 + (30.0 * 0.03f32.cos()) as u32;
        assert_eq!(pixel(&frame, 1024, cx, cy)[..3], DOT);
    }

    #[test]
    fn noise_is_sparse() {
        let mut desktop = DesktopPayload::with_seed(256, 256, 7);
        let lit = desktop
            .next_frame()
            .chunks(4)
            .filter(|px| px[..3] == NOISE)
            .count();
        // 5/256 of 65536 pixels is 1280.
        assert!(lit > 1000 && lit < 1560, "{lit} noise pixels");
    }

    #[test]
    fn noise_follows_seed() {
        let first = DesktopPayload::with_seed(64, 64, 42).next_frame().to_vec();
        let second = DesktopPayload::with_seed(64, 64, 42).next_frame().to_vec();
        let other = DesktopPayload::with_seed(64, 64, 43).next_frame().to_vec();
        assert_eq!(first, second);
        assert_ne!(first, other);
    }

    #[test]
    fn noise_changes_between_frames() {
        let mut desktop = DesktopPayload::with_seed(64, 64, 1);
        let first = desktop.next_frame().to_vec();
        assert_ne!(desktop.next_frame(), &first[..]);
    }
}
