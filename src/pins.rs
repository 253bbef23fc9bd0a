//! Fixed routing of the output compare units to Arduino pins.

use crate::registers::Channel;

/// I/O port holding an output compare pin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Port {
    B,
    E,
    H,
    L,
}

/// An output compare pin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutputPin {
    /// Arduino pin number.
    pub pin: u8,
    pub channel: Channel,
    pub port: Port,
    /// Bit within the port's data direction register.
    pub bit: u8,
}

impl OutputPin {
    const fn new(pin: u8, channel: Channel, port: Port, bit: u8) -> Self {
        Self {
            pin,
            channel,
            port,
            bit,
        }
    }

    /// Mask for the pin's bit in its port registers.
    #[must_use]
    pub const fn mask(&self) -> u8 {
        1 << self.bit
    }
}

/// Arduino Mega (ATmega2560).
pub mod mega {
    use super::{OutputPin, Port};
    use crate::registers::Channel;

    pub const TIMER1: &[OutputPin] = &[
        OutputPin::new(11, Channel::A, Port::B, 5),
        OutputPin::new(12, Channel::B, Port::B, 6),
        OutputPin::new(13, Channel::C, Port::B, 7),
    ];

    pub const TIMER3: &[OutputPin] = &[
        OutputPin::new(5, Channel::A, Port::E, 3),
        OutputPin::new(2, Channel::B, Port::E, 4),
        OutputPin::new(3, Channel::C, Port::E, 5),
    ];

    pub const TIMER4: &[OutputPin] = &[
        OutputPin::new(6, Channel::A, Port::H, 3),
        OutputPin::new(7, Channel::B, Port::H, 4),
        OutputPin::new(8, Channel::C, Port::H, 5),
    ];

    pub const TIMER5: &[OutputPin] = &[
        OutputPin::new(46, Channel::A, Port::L, 3),
        OutputPin::new(45, Channel::B, Port::L, 4),
        OutputPin::new(44, Channel::C, Port::L, 5),
    ];
}

/// Arduino Uno and Nano (ATmega328P).
pub mod uno {
    use super::{OutputPin, Port};
    use crate::registers::Channel;

    pub const TIMER1: &[OutputPin] = &[
        OutputPin::new(9, Channel::A, Port::B, 1),
        OutputPin::new(10, Channel::B, Port::B, 2),
    ];
}
