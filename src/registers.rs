use crate::{pins::OutputPin, prescaler::Prescaler};

/// Output compare unit of a 16-bit timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channel {
    A,
    B,
    C,
}

/// Register level operations of one 16-bit timer/counter.
///
/// Implemented for the PAC peripherals on AVR and by
/// [`MockTimer`](crate::mock::MockTimer) for host tests.
pub trait TimerRegisters {
    /// Pins wired to this timer's output compare units.
    fn outputs(&self) -> &'static [OutputPin];

    /// Look up the output bound to an Arduino pin number.
    fn output(&self, pin: u8) -> Option<&'static OutputPin> {
        self.outputs().iter().find(|o| o.pin == pin)
    }

    /// Select phase and frequency correct PWM with `ICRn` as TOP and stop the
    /// clock. All outputs are disconnected.
    fn set_phase_frequency_correct(&mut self);

    /// Write the TOP value.
    fn set_top(&mut self, top: u16);

    /// Replace the clock select bits, starting the counter.
    fn set_clock_select(&mut self, prescaler: Prescaler);

    /// Clear the clock select bits, halting the counter.
    fn stop_clock(&mut self);

    /// Write the live counter.
    fn set_counter(&mut self, value: u16);

    /// Write the compare register of `channel`.
    fn set_compare(&mut self, channel: Channel, value: u16);

    /// Drive the pin as an output and clear it on compare match.
    fn connect_output(&mut self, output: &OutputPin);

    /// Disconnect the compare unit from the pin. Direction and compare value
    /// are left alone.
    fn disconnect_output(&mut self, output: &OutputPin);

    /// Store the function run by this timer's overflow vector.
    fn set_overflow_handler(&mut self, handler: fn());

    /// Set or clear `TOIEn`.
    fn set_overflow_interrupt(&mut self, enable: bool);

    /// Set the global interrupt flag.
    ///
    /// # Safety
    ///
    /// Must not be called inside a critical section, since pending handlers
    /// run as soon as the flag is set.
    unsafe fn enable_interrupts(&mut self);
}
