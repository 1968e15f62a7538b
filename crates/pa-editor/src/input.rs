//! Input abstraction layer.
//!
//! Pointer events arrive in canvas space: relative to the page origin and
//! already divided by the viewport scale.

/// Keyboard modifier state at the time of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

/// A normalized pointer event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Pointer pressed. `on_canvas` is false when the press landed on an
    /// existing shape rather than the bare page canvas.
    PointerDown {
        x: f64,
        y: f64,
        on_canvas: bool,
        modifiers: Modifiers,
    },

    PointerMove { x: f64, y: f64, modifiers: Modifiers },

    PointerUp { x: f64, y: f64 },
}

impl InputEvent {
    pub fn down(x: f64, y: f64) -> Self {
        Self::PointerDown {
            x,
            y,
            on_canvas: true,
            modifiers: Modifiers::default(),
        }
    }

    pub fn moved(x: f64, y: f64) -> Self {
        Self::PointerMove {
            x,
            y,
            modifiers: Modifiers::default(),
        }
    }

    pub fn up(x: f64, y: f64) -> Self {
        Self::PointerUp { x, y }
    }

    /// Convert a position reported in page pixels into canvas space.
    pub fn unscaled(self, scale: f64) -> Self {
        match self {
            Self::PointerDown {
                x,
                y,
                on_canvas,
                modifiers,
            } => Self::PointerDown {
                x: x / scale,
                y: y / scale,
                on_canvas,
                modifiers,
            },
            Self::PointerMove { x, y, modifiers } => Self::PointerMove {
                x: x / scale,
                y: y / scale,
                modifiers,
            },
            Self::PointerUp { x, y } => Self::PointerUp {
                x: x / scale,
                y: y / scale,
            },
        }
    }

    pub fn position(&self) -> kurbo::Point {
        match *self {
            Self::PointerDown { x, y, .. } | Self::PointerMove { x, y, .. } | Self::PointerUp { x, y } => {
                kurbo::Point::new(x, y)
            }
        }
    }
}

/// A key press as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyEvent {
    pub key: String,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

impl KeyEvent {
    pub fn plain(key: &str) -> Self {
        Self {
            key: key.to_string(),
            ..Self::default()
        }
    }
}
