use std::collections::HashSet;

use crate::physics::ClimbInput;

/// Logical keys the climb reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    Jump,
    Pause,
}

impl Key {
    /// Map a DOM-style key code onto a climb key.
    pub fn from_code(code: &str) -> Option<Key> {
        match code {
            "ArrowLeft" | "KeyA" => Some(Key::Left),
            "ArrowRight" | "KeyD" => Some(Key::Right),
            "Space" | "ArrowUp" | "KeyW" => Some(Key::Jump),
            "Escape" | "KeyP" => Some(Key::Pause),
            _ => None,
        }
    }
}

/// Horizontal drag distance (px) below which a drag reads as neutral.
pub const DRAG_DEAD_ZONE: f32 = 12.0;
/// Device tilt (degrees) below which tilt reads as neutral.
pub const TILT_DEAD_ZONE: f32 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Drag {
    origin_x: f32,
    current_x: f32,
}

/// Merges keyboard, pointer drag and device tilt into one [`ClimbInput`] per tick.
///
/// Keyboard wins over drag, drag over tilt. Tilt is ignored entirely while a
/// drag is in progress.
#[derive(Debug, Clone, Default)]
pub struct InputMapper {
    keys_down: HashSet<Key>,
    jump_pressed: bool,
    pause_pressed: bool,
    drag: Option<Drag>,
    tilt: Option<f32>,
}

impl InputMapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_down(&mut self, key: Key) {
        // Auto-repeat must not create new edges.
        if self.keys_down.insert(key) {
            match key {
                Key::Jump => self.jump_pressed = true,
                Key::Pause => self.pause_pressed = true,
                Key::Left | Key::Right => {},
            }
        }
    }

    pub fn key_up(&mut self, key: Key) {
        self.keys_down.remove(&key);
    }

    pub fn drag_start(&mut self, x: f32) {
        self.drag = Some(Drag {
            origin_x: x,
            current_x: x,
        });
    }

    pub fn drag_move(&mut self, x: f32) {
        if let Some(drag) = self.drag.as_mut() {
            drag.current_x = x;
        }
    }

    pub fn drag_end(&mut self) {
        self.drag = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Latest left/right tilt in degrees (negative is left). `None` when the
    /// device has no sensor.
    pub fn set_tilt(&mut self, degrees: Option<f32>) {
        self.tilt = degrees.filter(|d| d.is_finite());
    }

    fn axis(&self) -> f32 {
        let keyboard = match (
            self.keys_down.contains(&Key::Left),
            self.keys_down.contains(&Key::Right),
        ) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        };
        if keyboard != 0.0 {
            return keyboard;
        }
        if let Some(drag) = self.drag {
            return dead_zone_sign(drag.current_x - drag.origin_x, DRAG_DEAD_ZONE);
        }
        self.tilt
            .map(|t| dead_zone_sign(t, TILT_DEAD_ZONE))
            .unwrap_or(0.0)
    }

    /// Current intent. Press edges are consumed.
    pub fn sample(&mut self) -> ClimbInput {
        let input = ClimbInput {
            axis: self.axis(),
            jump_pressed: self.jump_pressed,
            jump_held: self.keys_down.contains(&Key::Jump),
            pause_pressed: self.pause_pressed,
        };
        self.jump_pressed = false;
        self.pause_pressed = false;
        input
    }
}

fn dead_zone_sign(value: f32, dead_zone: f32) -> f32 {
    if value.abs() < dead_zone {
        0.0
    } else {
        value.signum()
    }
}
