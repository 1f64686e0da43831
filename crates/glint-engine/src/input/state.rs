use std::collections::HashMap;

use super::types::{Button, ButtonState, InputEvent, Modifiers};

/// Level and edge counters of one key or mouse button.
///
/// `presses` and `releases` count transitions since the last poll, so a tap
/// that starts and ends between two polls is still observable.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct ButtonRecord {
    pub down: bool,
    pub presses: u32,
    pub releases: u32,
}

/// Input state of a single window.
///
/// Events are folded in with [`InputState::apply_event`]; edge counters and
/// per-poll text are cleared by [`InputState::begin_poll`].
#[derive(Debug, Default)]
pub struct InputState {
    buttons: HashMap<Button, ButtonRecord>,
    cursor: (f64, f64),
    scroll: (f64, f64),
    text: String,
    modifiers: Modifiers,
    focused: bool,
}

impl InputState {
    /// Starts a new poll: edge counters go to zero and pending text is dropped.
    /// Levels, cursor and cumulative scroll are kept.
    pub fn begin_poll(&mut self) {
        for record in self.buttons.values_mut() {
            record.presses = 0;
            record.releases = 0;
        }
        self.text.clear();
    }

    pub fn apply_event(&mut self, ev: &InputEvent) {
        match ev {
            InputEvent::Button {
                button,
                state,
                repeat,
            } => {
                let record = self.buttons.entry(*button).or_default();
                match state {
                    ButtonState::Pressed => {
                        record.down = true;
                        if !repeat {
                            record.presses += 1;
                        }
                    }
                    ButtonState::Released => {
                        record.down = false;
                        record.releases += 1;
                    }
                }
            }

            InputEvent::CursorMoved { x, y } => {
                self.cursor = (*x, *y);
            }

            InputEvent::Scroll { dx, dy } => {
                self.scroll.0 += dx;
                self.scroll.1 += dy;
            }

            InputEvent::Text(text) => self.text.push_str(text),

            InputEvent::ModifiersChanged(m) => self.modifiers = *m,

            InputEvent::Focused(focused) => {
                self.focused = *focused;
                if !*focused {
                    // Releases may never arrive once focus is gone.
                    for record in self.buttons.values_mut() {
                        record.down = false;
                    }
                }
            }
        }
    }

    pub fn record(&self, button: impl Into<Button>) -> ButtonRecord {
        self.buttons
            .get(&button.into())
            .copied()
            .unwrap_or_default()
    }

    /// Whether the button is held right now.
    pub fn down(&self, button: impl Into<Button>) -> bool {
        self.record(button).down
    }

    /// Whether the button went down at least once since the last poll.
    pub fn pressed(&self, button: impl Into<Button>) -> bool {
        self.record(button).presses > 0
    }

    /// Whether the button went up at least once since the last poll.
    pub fn released(&self, button: impl Into<Button>) -> bool {
        self.record(button).releases > 0
    }

    pub fn presses(&self, button: impl Into<Button>) -> u32 {
        self.record(button).presses
    }

    pub fn releases(&self, button: impl Into<Button>) -> u32 {
        self.record(button).releases
    }

    /// Cursor position in logical pixels, relative to the window's top-left.
    pub fn cursor(&self) -> (f64, f64) {
        self.cursor
    }

    /// Scroll accumulated since the window opened.
    pub fn scroll(&self) -> (f64, f64) {
        self.scroll
    }

    /// Text typed since the last poll.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn focused(&self) -> bool {
        self.focused
    }
}
