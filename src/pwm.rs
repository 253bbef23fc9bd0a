use core::convert::Infallible;

use embedded_hal::pwm::{ErrorType, SetDutyCycle};

use crate::registers::{Channel, TimerRegisters};

/// One output compare pin of a [`TimerChannel`](crate::TimerChannel).
///
/// Duty is expressed in timer ticks with TOP as the maximum, giving the full
/// resolution of the current period.
pub struct PwmOutput<'a, R> {
    regs: &'a mut R,
    channel: Channel,
    top: u16,
}

impl<'a, R: TimerRegisters> PwmOutput<'a, R> {
    pub(crate) fn new(regs: &'a mut R, channel: Channel, top: u16) -> Self {
        Self { regs, channel, top }
    }

    /// Compare unit driven by this output.
    pub fn channel(&self) -> Channel {
        self.channel
    }
}

impl<R> ErrorType for PwmOutput<'_, R> {
    type Error = Infallible;
}

impl<R: TimerRegisters> SetDutyCycle for PwmOutput<'_, R> {
    fn max_duty_cycle(&self) -> u16 {
        // Must not be zero, even for a degenerate zero-length period.
        self.top.max(1)
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        self.regs.set_compare(self.channel, duty.min(self.top));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use embedded_hal::pwm::SetDutyCycle;

    use super::PwmOutput;
    use crate::{mock::MockTimer, pins::mega, registers::Channel};

    #[test]
    fn duty_is_limited_to_top() {
        let mut regs = MockTimer::new(mega::TIMER4);
        let mut out = PwmOutput::new(&mut regs, Channel::B, 400);
        out.set_duty_cycle(1000).unwrap();
        assert_eq!(regs.compare(Channel::B), 400);
    }

    #[test]
    fn fraction() {
        let mut regs = MockTimer::new(mega::TIMER4);
        let mut out = PwmOutput::new(&mut regs, Channel::A, 400);
        out.set_duty_cycle_fraction(3, 4).unwrap();
        out.set_duty_cycle_fully_off().unwrap();
        assert_eq!(regs.compare(Channel::A), 0);

        let mut out = PwmOutput::new(&mut regs, Channel::A, 400);
        out.set_duty_cycle_fraction(3, 4).unwrap();
        assert_eq!(regs.compare(Channel::A), 300);
    }

    #[test]
    fn zero_top_reports_nonzero_maximum() {
        let mut regs = MockTimer::new(mega::TIMER4);
        let out = PwmOutput::new(&mut regs, Channel::C, 0);
        assert_eq!(out.max_duty_cycle(), 1);
    }
}
