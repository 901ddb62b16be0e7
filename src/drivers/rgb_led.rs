//! RGB LED demo device.
//!
//! Three discrete LEDs (red, green, blue) on `embedded-hal` output pins.
//! The board wires them active-low: driving a pin low lights its LED.
//!
//! RPC arguments arrive as `"ON OFF ON "`: one token per channel in
//! R, G, B order. `ON` and `OFF` switch the channel; a missing or
//! unrecognised token leaves it as it was.
//!
//! ## Dual-target design
//!
//! On hardware: any `OutputPin` from the board's HAL.
//! On host/test: [`SimPin`] tracks the pin level in memory.

use core::convert::Infallible;
use core::fmt;

use embedded_hal::digital::{ErrorType, OutputPin};

/// One of the three colour channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    pub const ALL: [Self; 3] = [Self::Red, Self::Green, Self::Blue];
}

/// Logical on/off state of all three channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LedState {
    pub red: bool,
    pub green: bool,
    pub blue: bool,
}

impl LedState {
    pub fn get(&self, ch: Channel) -> bool {
        match ch {
            Channel::Red => self.red,
            Channel::Green => self.green,
            Channel::Blue => self.blue,
        }
    }

    fn set(&mut self, ch: Channel, on: bool) {
        match ch {
            Channel::Red => self.red = on,
            Channel::Green => self.green = on,
            Channel::Blue => self.blue = on,
        }
    }
}

/// `"ON OFF ON"`.
impl fmt::Display for LedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let word = |on: bool| if on { "ON" } else { "OFF" };
        write!(f, "{} {} {}", word(self.red), word(self.green), word(self.blue))
    }
}

/// Active-low RGB LED over three output pins.
pub struct RgbLed<R, G, B> {
    red: R,
    green: G,
    blue: B,
    state: LedState,
}

impl<R, G, B, E> RgbLed<R, G, B>
where
    R: OutputPin<Error = E>,
    G: OutputPin<Error = E>,
    B: OutputPin<Error = E>,
{
    /// Take the pins and switch every channel off.
    pub fn new(red: R, green: G, blue: B) -> Result<Self, E> {
        let mut led = Self {
            red,
            green,
            blue,
            state: LedState::default(),
        };
        led.all_off()?;
        Ok(led)
    }

    pub fn state(&self) -> LedState {
        self.state
    }

    pub fn turn_on(&mut self, ch: Channel) -> Result<(), E> {
        self.drive(ch, true)
    }

    pub fn turn_off(&mut self, ch: Channel) -> Result<(), E> {
        self.drive(ch, false)
    }

    pub fn all_on(&mut self) -> Result<(), E> {
        Channel::ALL.into_iter().try_for_each(|ch| self.turn_on(ch))
    }

    pub fn all_off(&mut self) -> Result<(), E> {
        Channel::ALL.into_iter().try_for_each(|ch| self.turn_off(ch))
    }

    /// Apply an `"ON OFF ON "` argument string, returning the new state.
    pub fn apply(&mut self, args: &str) -> Result<LedState, E> {
        for (ch, token) in Channel::ALL.into_iter().zip(args.split(' ').filter(|t| !t.is_empty())) {
            match token {
                "ON" => self.turn_on(ch)?,
                "OFF" => self.turn_off(ch)?,
                _ => {}
            }
        }
        Ok(self.state)
    }

    fn drive(&mut self, ch: Channel, on: bool) -> Result<(), E> {
        // Active-low.
        match (ch, on) {
            (Channel::Red, true) => self.red.set_low()?,
            (Channel::Red, false) => self.red.set_high()?,
            (Channel::Green, true) => self.green.set_low()?,
            (Channel::Green, false) => self.green.set_high()?,
            (Channel::Blue, true) => self.blue.set_low()?,
            (Channel::Blue, false) => self.blue.set_high()?,
        }
        self.state.set(ch, on);
        Ok(())
    }

    /// Release the pins.
    pub fn release(self) -> (R, G, B) {
        (self.red, self.green, self.blue)
    }
}

// ── Host pin ────────────────────────────────────────────────────

/// In-memory output pin for host builds and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimPin {
    high: bool,
}

impl SimPin {
    /// A pin idling high (LED dark on an active-low board).
    pub const fn new() -> Self {
        Self { high: true }
    }

    pub fn is_high(&self) -> bool {
        self.high
    }
}

impl Default for SimPin {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorType for SimPin {
    type Error = Infallible;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.high = true;
        Ok(())
    }
}
