use std::collections::HashSet;

use glam::Vec2;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Tracks input state for keyboard and mouse.
///
/// Besides the raw cursor position, the pointer is kept in normalized device
/// coordinates (`[-1, 1]` on both axes, +y up), computed from the viewport
/// size current when the cursor moved. The latest move wins.
pub struct Input {
    keys_down: HashSet<KeyCode>,
    keys_pressed: HashSet<KeyCode>,
    mouse_buttons_down: HashSet<MouseButton>,
    mouse_buttons_pressed: HashSet<MouseButton>,
    mouse_buttons_released: HashSet<MouseButton>,
    mouse_position: Vec2,
    mouse_delta: Vec2,
    scroll_delta: Vec2,
    viewport: Vec2,
    pointer_ndc: Vec2,
}

impl Default for Input {
    fn default() -> Self {
        Self {
            keys_down: HashSet::new(),
            keys_pressed: HashSet::new(),
            mouse_buttons_down: HashSet::new(),
            mouse_buttons_pressed: HashSet::new(),
            mouse_buttons_released: HashSet::new(),
            mouse_position: Vec2::ZERO,
            mouse_delta: Vec2::ZERO,
            scroll_delta: Vec2::ZERO,
            viewport: Vec2::ONE,
            pointer_ndc: Vec2::ZERO,
        }
    }
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call at the end of each frame to reset per-frame state.
    pub fn begin_frame(&mut self) {
        self.keys_pressed.clear();
        self.mouse_buttons_pressed.clear();
        self.mouse_buttons_released.clear();
        self.mouse_delta = Vec2::ZERO;
        self.scroll_delta = Vec2::ZERO;
    }

    /// Sets the viewport size used to normalize later cursor moves.
    ///
    /// Zero sizes (minimized window) are ignored.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.viewport = Vec2::new(width as f32, height as f32);
        }
    }

    /// Process a window event and update input state.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    match event.state {
                        ElementState::Pressed => {
                            if !self.keys_down.contains(&key) {
                                self.keys_pressed.insert(key);
                            }
                            self.keys_down.insert(key);
                        }
                        ElementState::Released => {
                            self.keys_down.remove(&key);
                        }
                    }
                }
            }
            WindowEvent::MouseInput { state, button, .. } => match state {
                ElementState::Pressed => self.press_button(*button),
                ElementState::Released => self.release_button(*button),
            },
            WindowEvent::CursorMoved { position, .. } => {
                self.set_cursor(position.x as f32, position.y as f32);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let d = match delta {
                    winit::event::MouseScrollDelta::LineDelta(x, y) => Vec2::new(*x, *y),
                    winit::event::MouseScrollDelta::PixelDelta(pos) => {
                        Vec2::new(pos.x as f32, pos.y as f32) / 120.0
                    }
                };
                self.scroll_delta += d;
            }
            _ => {}
        }
    }

    /// Moves the cursor to window coordinates `(x, y)`.
    pub fn set_cursor(&mut self, x: f32, y: f32) {
        let new_pos = Vec2::new(x, y);
        self.mouse_delta += new_pos - self.mouse_position;
        self.mouse_position = new_pos;
        self.pointer_ndc = Vec2::new(
            x / self.viewport.x * 2.0 - 1.0,
            -(y / self.viewport.y) * 2.0 + 1.0,
        );
    }

    pub fn press_button(&mut self, button: MouseButton) {
        if !self.mouse_buttons_down.contains(&button) {
            self.mouse_buttons_pressed.insert(button);
        }
        self.mouse_buttons_down.insert(button);
    }

    pub fn release_button(&mut self, button: MouseButton) {
        self.mouse_buttons_down.remove(&button);
        self.mouse_buttons_released.insert(button);
    }

    /// Returns true if the key was pressed this frame.
    pub fn key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Returns true if the mouse button is currently held down.
    pub fn mouse_down(&self, button: MouseButton) -> bool {
        self.mouse_buttons_down.contains(&button)
    }

    /// Returns true if the mouse button was pressed this frame.
    pub fn mouse_pressed(&self, button: MouseButton) -> bool {
        self.mouse_buttons_pressed.contains(&button)
    }

    /// Returns true if the mouse button was released this frame.
    pub fn mouse_released(&self, button: MouseButton) -> bool {
        self.mouse_buttons_released.contains(&button)
    }

    /// Current mouse position in window coordinates.
    pub fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }

    /// Mouse movement delta this frame.
    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    /// Scroll wheel delta this frame (in "lines").
    pub fn scroll_delta(&self) -> Vec2 {
        self.scroll_delta
    }

    /// Last pointer position in normalized device coordinates.
    pub fn pointer_ndc(&self) -> Vec2 {
        self.pointer_ndc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_starts_at_center() {
        assert_eq!(Input::new().pointer_ndc(), Vec2::ZERO);
    }

    #[test]
    fn pointer_normalizes_against_viewport() {
        let mut input = Input::new();
        input.set_viewport(800, 600);

        input.set_cursor(0.0, 0.0);
        assert_eq!(input.pointer_ndc(), Vec2::new(-1.0, 1.0));

        input.set_cursor(800.0, 600.0);
        assert_eq!(input.pointer_ndc(), Vec2::new(1.0, -1.0));

        input.set_cursor(400.0, 300.0);
        assert_eq!(input.pointer_ndc(), Vec2::ZERO);
    }

    #[test]
    fn resize_applies_to_later_moves_only() {
        let mut input = Input::new();
        input.set_viewport(800, 600);
        input.set_cursor(200.0, 150.0);
        let before = input.pointer_ndc();

        input.set_viewport(400, 300);
        assert_eq!(input.pointer_ndc(), before);

        input.set_cursor(200.0, 150.0);
        assert_eq!(input.pointer_ndc(), Vec2::ZERO);
    }

    #[test]
    fn zero_viewport_is_ignored() {
        let mut input = Input::new();
        input.set_viewport(100, 100);
        input.set_viewport(0, 0);
        input.set_cursor(50.0, 50.0);
        assert_eq!(input.pointer_ndc(), Vec2::ZERO);
    }

    #[test]
    fn button_press_is_per_frame() {
        let mut input = Input::new();
        input.press_button(MouseButton::Left);
        assert!(input.mouse_pressed(MouseButton::Left));
        input.begin_frame();
        assert!(!input.mouse_pressed(MouseButton::Left));
        assert!(input.mouse_down(MouseButton::Left));
        input.release_button(MouseButton::Left);
        assert!(input.mouse_released(MouseButton::Left));
        assert!(!input.mouse_down(MouseButton::Left));
    }
}
