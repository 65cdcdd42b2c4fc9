use std::collections::HashSet;

use glam::Vec2;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};

/// Pointer state accumulated between frames.
#[derive(Debug, Default)]
pub struct Input {
    buttons_down: HashSet<MouseButton>,
    cursor: Option<Vec2>,
    pointer_delta: Vec2,
    scroll_delta: Vec2,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call at the end of each frame to reset per-frame state.
    pub fn begin_frame(&mut self) {
        self.pointer_delta = Vec2::ZERO;
        self.scroll_delta = Vec2::ZERO;
    }

    /// Process a window event and update input state.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::MouseInput { state, button, .. } => match state {
                ElementState::Pressed => {
                    self.buttons_down.insert(*button);
                }
                ElementState::Released => {
                    self.buttons_down.remove(button);
                }
            },
            WindowEvent::CursorMoved { position, .. } => {
                let new_pos = Vec2::new(position.x as f32, position.y as f32);
                if let Some(old) = self.cursor {
                    self.pointer_delta += new_pos - old;
                }
                self.cursor = Some(new_pos);
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.scroll_delta += match delta {
                    MouseScrollDelta::LineDelta(x, y) => Vec2::new(*x, *y),
                    MouseScrollDelta::PixelDelta(pos) => {
                        Vec2::new(pos.x as f32, pos.y as f32) / 120.0
                    }
                };
            }
            WindowEvent::Focused(false) => {
                self.buttons_down.clear();
            }
            _ => {}
        }
    }

    /// Returns true if the mouse button is currently held down.
    pub fn mouse_down(&self, button: MouseButton) -> bool {
        self.buttons_down.contains(&button)
    }

    /// Cursor position in physical window pixels, if the cursor is inside the window.
    pub fn cursor(&self) -> Option<Vec2> {
        self.cursor
    }

    /// Cursor movement this frame, in physical pixels.
    pub fn pointer_delta(&self) -> Vec2 {
        self.pointer_delta
    }

    /// Scroll wheel delta this frame (in "lines", positive y scrolls away from the user).
    pub fn scroll_delta(&self) -> Vec2 {
        self.scroll_delta
    }

    /// Feeds a synthetic drag; used by controller tests.
    #[cfg(test)]
    pub(crate) fn simulate_drag(&mut self, button: MouseButton, delta: Vec2) {
        self.buttons_down.insert(button);
        self.pointer_delta += delta;
    }

    #[cfg(test)]
    pub(crate) fn simulate_scroll(&mut self, lines: f32) {
        self.scroll_delta.y += lines;
    }
}
