//! Gamepad state block carried inside every batch record

use bytemuck::{Pod, Zeroable};
use static_assertions::const_assert_eq;
use wavelink::consts::GAMEPAD_BUTTON_COUNT;

/// Gamepad buttons, in record order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum GamepadButton {
    /// D-pad down
    Down = 0,
    /// D-pad left
    Left,
    /// D-pad up
    Up,
    /// D-pad right
    Right,
    /// Left bumper
    Lb,
    /// Right bumper
    Rb,
    /// Back / select
    Back,
    /// Start
    Start,
    /// A
    A,
    /// B
    B,
    /// X
    X,
    /// Y
    Y,
}

/// Stick and trigger readings pushed downstream with the parameters.
///
/// Buttons are stored as one byte each so the block matches the C layout
/// of twelve `bool`s followed by six `f64`s (64 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GamepadCommand {
    buttons: [u8; GAMEPAD_BUTTON_COUNT],
    _pad: [u8; 4],
    /// Left stick X/Y
    pub axis_left: [f64; 2],
    /// Right stick X/Y
    pub axis_right: [f64; 2],
    /// Left trigger
    pub lt: f64,
    /// Right trigger
    pub rt: f64,
}

const_assert_eq!(std::mem::size_of::<GamepadCommand>(), 64);

impl Default for GamepadCommand {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl GamepadCommand {
    /// All buttons released, sticks centred, triggers at rest.
    pub fn new() -> Self {
        Self::zeroed()
    }

    /// Reset every field to zero.
    pub fn reset(&mut self) {
        *self = Self::zeroed();
    }

    /// Whether `button` is pressed.
    #[inline]
    pub fn pressed(&self, button: GamepadButton) -> bool {
        self.buttons[button as usize] != 0
    }

    /// Press or release `button`.
    #[inline]
    pub fn set_pressed(&mut self, button: GamepadButton, pressed: bool) {
        self.buttons[button as usize] = u8::from(pressed);
    }
}
