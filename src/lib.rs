#![cfg_attr(not(test), no_std)]

//! Interval interrupts and phase and frequency correct PWM on the 16-bit
//! timers of the ATmega2560 (Timer1, 3, 4 and 5) and ATmega328P (Timer1).

#[cfg(all(feature = "atmega2560", feature = "atmega328p"))]
compile_error!("Select exactly one of the `atmega2560` and `atmega328p` features.");

#[cfg(all(
    target_arch = "avr",
    not(any(feature = "atmega2560", feature = "atmega328p"))
))]
compile_error!("Select the target chip with the `atmega2560` or `atmega328p` feature.");

pub mod channel;
pub mod clock;
pub mod pins;
pub mod prescaler;
pub mod pwm;
pub mod registers;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

#[cfg(target_arch = "avr")]
pub mod avr;

#[cfg(target_arch = "avr")]
pub use atmega_hal as hal;

pub use channel::TimerChannel;
pub use prescaler::{PeriodSetting, Prescaler};
pub use registers::{Channel, TimerRegisters};
