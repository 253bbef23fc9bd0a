use cfg_if::cfg_if;

cfg_if! {
    if #[cfg(target_arch = "avr")] {
        pub use avr_hal_generic::clock::{Clock, MHz8, MHz16};
    } else {
        /// Oscillator frequency known at compile time.
        pub trait Clock {
            /// Frequency in Hz.
            const FREQ: u32;
        }

        /// 16 MHz oscillator.
        #[derive(Clone, Copy, Debug)]
        pub struct MHz16;

        impl Clock for MHz16 {
            const FREQ: u32 = 16_000_000;
        }

        /// 8 MHz oscillator.
        #[derive(Clone, Copy, Debug)]
        pub struct MHz8;

        impl Clock for MHz8 {
            const FREQ: u32 = 8_000_000;
        }
    }
}

/// Board clock rate.
pub type BoardClock = MHz16;
