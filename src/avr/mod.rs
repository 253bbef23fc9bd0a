//! Bindings to the ATmega timer peripherals.

pub mod tc;
pub mod usart;
pub mod vector;

use crate::{channel::TimerChannel, clock::BoardClock, hal::pac};

/// Timer1, driving pins 11, 12 and 13 on the Mega or 9 and 10 on the Uno.
pub type Timer1 = TimerChannel<pac::TC1, BoardClock>;

/// Timer3, driving pins 5, 2 and 3.
#[cfg(feature = "atmega2560")]
pub type Timer3 = TimerChannel<pac::TC3, BoardClock>;

/// Timer4, driving pins 6, 7 and 8.
#[cfg(feature = "atmega2560")]
pub type Timer4 = TimerChannel<pac::TC4, BoardClock>;

/// Timer5, driving pins 46, 45 and 44.
#[cfg(feature = "atmega2560")]
pub type Timer5 = TimerChannel<pac::TC5, BoardClock>;
