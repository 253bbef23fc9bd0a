use core::marker::PhantomData;

use crate::{
    clock::Clock,
    prescaler::{PeriodSetting, Prescaler},
    pwm::PwmOutput,
    registers::TimerRegisters,
};

/// A 16-bit timer running in phase and frequency correct PWM mode.
///
/// Generates an overflow interrupt once per period and PWM on the timer's
/// output compare pins. Pins are identified by their Arduino numbers;
/// operations on a pin the timer does not drive do nothing.
pub struct TimerChannel<R, CLOCK> {
    regs: R,
    setting: PeriodSetting,
    _clock: PhantomData<CLOCK>,
}

impl<R, CLOCK> TimerChannel<R, CLOCK>
where
    R: TimerRegisters,
    CLOCK: Clock,
{
    /// Take over a timer and [`initialize`](Self::initialize) it.
    ///
    /// The counter is left stopped.
    pub fn new(regs: R, micros: u32) -> Self {
        let mut timer = Self {
            regs,
            setting: PeriodSetting::MAX,
            _clock: PhantomData,
        };
        timer.initialize(micros);
        timer
    }

    /// Put the timer into phase and frequency correct mode with the given
    /// period. The counter is left stopped.
    pub fn initialize(&mut self, micros: u32) {
        // Writing the mode clears the clock select bits.
        self.regs.set_phase_frequency_correct();
        self.setting = PeriodSetting::resolve(CLOCK::FREQ, micros);
        self.regs.set_top(self.setting.top);
    }

    /// Change the period, keeping TOP within 16 bits.
    ///
    /// Periods beyond the hardware limit are clamped to the longest
    /// supported one. The counter runs afterwards. Compare values are not
    /// rescaled, so duties need to be set again.
    pub fn set_period(&mut self, micros: u32) {
        self.setting = PeriodSetting::resolve(CLOCK::FREQ, micros);
        self.regs.set_top(self.setting.top);
        self.regs.set_clock_select(self.setting.prescaler);
    }

    /// Set the duty of `pin` as a 10-bit fraction of the period.
    pub fn set_pwm_duty(&mut self, pin: u8, duty: u16) {
        if let Some(output) = self.regs.output(pin) {
            let value = self.setting.compare_value(duty);
            self.regs.set_compare(output.channel, value);
        }
    }

    /// Start PWM on `pin`.
    ///
    /// A non-zero `micros` changes the period first; zero keeps the current
    /// one.
    pub fn enable_pwm(&mut self, pin: u8, duty: u16, micros: u32) {
        if micros > 0 {
            self.set_period(micros);
        }
        if let Some(output) = self.regs.output(pin) {
            self.regs.connect_output(output);
        }
        self.set_pwm_duty(pin, duty);
        self.start();
    }

    /// Disconnect `pin` from the timer. The pin falls back to its port value.
    pub fn disable_pwm(&mut self, pin: u8) {
        if let Some(output) = self.regs.output(pin) {
            self.regs.disconnect_output(output);
        }
    }

    /// Run `handler` on every overflow and start the timer.
    ///
    /// A non-zero `micros` changes the period first; zero keeps the current
    /// one. Interrupts are enabled globally.
    ///
    /// # Safety
    ///
    /// Must not be called inside a critical section: enabling interrupts
    /// there would let handlers run while the section's borrows are live.
    pub unsafe fn attach_interrupt(&mut self, handler: fn(), micros: u32) {
        if micros > 0 {
            self.set_period(micros);
        }
        self.regs.set_overflow_handler(handler);
        self.regs.set_overflow_interrupt(true);
        // SAFETY: Forwarded to the caller.
        unsafe { self.regs.enable_interrupts() };
        self.start();
    }

    /// Stop delivering overflow interrupts of this timer.
    pub fn detach_interrupt(&mut self) {
        self.regs.set_overflow_interrupt(false);
    }

    /// Resume counting with the current prescaler.
    pub fn start(&mut self) {
        self.regs.set_clock_select(self.setting.prescaler);
    }

    /// Halt the counter. Counter and TOP are preserved.
    pub fn stop(&mut self) {
        self.regs.stop_clock();
    }

    /// Reset the counter to zero.
    pub fn restart(&mut self) {
        self.regs.set_counter(0);
    }

    /// Current clock divider.
    pub fn prescaler(&self) -> Prescaler {
        self.setting.prescaler
    }

    /// Current TOP value.
    pub fn top(&self) -> u16 {
        self.setting.top
    }

    /// Current prescaler and TOP.
    pub fn setting(&self) -> PeriodSetting {
        self.setting
    }

    /// Period actually generated, after truncation and clamping.
    pub fn period_micros(&self) -> u32 {
        self.setting.period_micros(CLOCK::FREQ)
    }

    /// Borrow one output pin as an [`embedded_hal::pwm::SetDutyCycle`]
    /// implementation. The pin must have been enabled with
    /// [`enable_pwm`](Self::enable_pwm) to produce a signal.
    pub fn pwm_output(&mut self, pin: u8) -> Option<PwmOutput<'_, R>> {
        let output = self.regs.output(pin)?;
        Some(PwmOutput::new(&mut self.regs, output.channel, self.setting.top))
    }

    /// Borrow the underlying registers.
    pub fn registers(&self) -> &R {
        &self.regs
    }

    /// Mutably borrow the underlying registers, bypassing the driver state.
    pub fn registers_mut(&mut self) -> &mut R {
        &mut self.regs
    }

    /// Release the underlying registers.
    pub fn free(self) -> R {
        self.regs
    }
}

#[cfg(test)]
mod tests {
    use core::sync::atomic::{AtomicU8, Ordering};

    use super::TimerChannel;
    use crate::{
        clock::MHz16,
        mock::MockTimer,
        pins::{mega, uno},
        prescaler::Prescaler,
        registers::Channel,
    };

    type Timer = TimerChannel<MockTimer, MHz16>;

    fn timer(micros: u32) -> Timer {
        Timer::new(MockTimer::new(mega::TIMER1), micros)
    }

    #[test]
    fn initialize_leaves_counter_stopped() {
        let t = timer(1000);
        let regs = t.registers();
        assert!(regs.phase_frequency_correct());
        assert_eq!(regs.clock_select(), 0);
        assert_eq!(regs.top(), 8000);
        assert_eq!(t.prescaler(), Prescaler::Direct);
        assert!(!regs.overflow_interrupt_enabled());
        assert_eq!(regs.clock_starts(), 0);
        assert_eq!(regs.counter(), 0);
    }

    #[test]
    fn initialize_stops_running_timer() {
        let mut t = timer(1000);
        t.start();
        t.registers_mut().advance(10);
        t.initialize(1_000_000);

        let regs = t.registers();
        assert_eq!(regs.clock_select(), 0);
        assert_eq!(regs.clock_starts(), 1);
        assert_eq!(regs.top(), 31250);
        assert_eq!(t.prescaler(), Prescaler::Prescale256);

        t.start();
        assert_eq!(t.registers().clock_select(), Prescaler::Prescale256.bits());
    }

    #[test]
    fn set_period_replaces_clock_select() {
        let mut t = timer(1000);
        t.set_period(1_000_000);
        assert_eq!(t.registers().clock_select(), Prescaler::Prescale256.bits());
        assert_eq!(t.registers().top(), 31250);

        t.set_period(20_000);
        assert_eq!(t.registers().clock_select(), Prescaler::Prescale8.bits());
        assert_eq!(t.registers().top(), 20000);
        assert_eq!(t.period_micros(), 20_000);
    }

    #[test]
    fn set_period_clamps() {
        let mut t = timer(1000);
        t.set_period(60_000_000);
        assert_eq!(t.top(), 65535);
        assert_eq!(t.prescaler(), Prescaler::Prescale1024);
        assert_eq!(t.registers().clock_select(), Prescaler::Prescale1024.bits());
    }

    #[test]
    fn duty_is_scaled_to_top() {
        let mut t = timer(1000);
        t.set_pwm_duty(11, 512);
        t.set_pwm_duty(12, 256);
        t.set_pwm_duty(13, 1023);
        let regs = t.registers();
        assert_eq!(regs.compare(Channel::A), 4000);
        assert_eq!(regs.compare(Channel::B), 2000);
        assert_eq!(regs.compare(Channel::C), 7992);
    }

    #[test]
    fn unknown_pin_is_ignored() {
        let mut t = timer(1000);
        t.set_pwm_duty(9, 512);
        t.enable_pwm(9, 512, 0);
        t.disable_pwm(9);
        let regs = t.registers();
        for channel in [Channel::A, Channel::B, Channel::C] {
            assert_eq!(regs.compare(channel), 0);
            assert!(!regs.output_connected(channel));
        }
        assert!(t.pwm_output(9).is_none());
    }

    #[test]
    fn uno_timer1_has_two_outputs() {
        let mut t = TimerChannel::<MockTimer, MHz16>::new(MockTimer::new(uno::TIMER1), 1000);
        t.enable_pwm(9, 512, 0);
        t.enable_pwm(10, 256, 0);
        t.enable_pwm(13, 768, 0);
        t.set_pwm_duty(11, 768);

        let regs = t.registers();
        assert_eq!(regs.compare(Channel::A), 4000);
        assert_eq!(regs.compare(Channel::B), 2000);
        assert_eq!(regs.compare(Channel::C), 0);
        assert!(regs.output_connected(Channel::A));
        assert!(regs.output_connected(Channel::B));
        assert!(!regs.output_connected(Channel::C));
        assert!(regs.is_output(&uno::TIMER1[0]));
        assert!(regs.is_output(&uno::TIMER1[1]));
        assert!(!regs.is_output(&mega::TIMER1[2]));
        assert_eq!(t.pwm_output(10).map(|o| o.channel()), Some(Channel::B));
        assert!(t.pwm_output(13).is_none());

        t.disable_pwm(13);
        assert!(t.registers().output_connected(Channel::A));
        t.disable_pwm(9);
        assert!(!t.registers().output_connected(Channel::A));
    }

    #[test]
    fn enable_and_disable_pwm() {
        let mut t = timer(1000);
        t.enable_pwm(12, 768, 2000);

        let regs = t.registers();
        assert_eq!(regs.top(), 16000);
        assert_eq!(regs.compare(Channel::B), 12000);
        assert!(regs.output_connected(Channel::B));
        assert!(!regs.output_connected(Channel::A));
        assert!(regs.is_output(&mega::TIMER1[1]));
        assert_eq!(regs.clock_select(), Prescaler::Direct.bits());

        t.disable_pwm(12);
        let regs = t.registers();
        assert!(!regs.output_connected(Channel::B));
        assert!(regs.is_output(&mega::TIMER1[1]));
        assert_eq!(regs.compare(Channel::B), 12000);
    }

    #[test]
    fn enable_pwm_with_zero_period_keeps_period() {
        let mut t = timer(5000);
        t.enable_pwm(11, 512, 0);
        assert_eq!(t.top(), 40000);
        assert_eq!(t.registers().compare(Channel::A), 20000);
    }

    #[test]
    fn stop_start_restores_clock_select() {
        let mut t = timer(1_000_000);
        t.start();
        let running = t.registers().clock_select();
        assert_eq!(running, Prescaler::Prescale256.bits());

        t.stop();
        t.stop();
        assert_eq!(t.registers().clock_select(), 0);

        t.start();
        t.start();
        assert_eq!(t.registers().clock_select(), running);
        assert_eq!(t.top(), 31250);
    }

    #[test]
    fn stop_preserves_counter() {
        let mut t = timer(1000);
        t.start();
        t.registers_mut().advance(1234);
        t.stop();
        t.registers_mut().advance(100);
        assert_eq!(t.registers().counter(), 1234);
    }

    #[test]
    fn restart_only_resets_counter() {
        let mut t = timer(1_000_000);
        t.start();
        t.registers_mut().advance(500);
        t.restart();
        t.restart();

        let regs = t.registers();
        assert_eq!(regs.counter(), 0);
        assert_eq!(regs.top(), 31250);
        assert_eq!(regs.clock_select(), Prescaler::Prescale256.bits());
    }

    static FIRST: AtomicU8 = AtomicU8::new(0);
    static SECOND: AtomicU8 = AtomicU8::new(0);

    fn first() {
        FIRST.fetch_add(1, Ordering::Relaxed);
    }

    fn second() {
        SECOND.fetch_add(1, Ordering::Relaxed);
    }

    #[test]
    fn reattached_handler_replaces_old_one() {
        let mut t = timer(1000);
        // SAFETY: Not inside a critical section.
        unsafe { t.attach_interrupt(first, 0) };
        let regs = t.registers();
        assert!(regs.overflow_interrupt_enabled());
        assert!(regs.interrupts_enabled());
        assert_eq!(regs.clock_select(), Prescaler::Direct.bits());

        t.registers_mut().overflow();
        assert_eq!(FIRST.load(Ordering::Relaxed), 1);

        t.detach_interrupt();
        assert!(!t.registers().overflow_interrupt_enabled());
        assert!(t.registers().interrupts_enabled());
        t.registers_mut().overflow();
        assert_eq!(FIRST.load(Ordering::Relaxed), 1);

        // SAFETY: Not inside a critical section.
        unsafe { t.attach_interrupt(second, 4000) };
        assert_eq!(t.top(), 32000);
        t.registers_mut().overflow();
        assert_eq!(FIRST.load(Ordering::Relaxed), 1);
        assert_eq!(SECOND.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn pwm_output_handle() {
        use embedded_hal::pwm::SetDutyCycle;

        let mut t = timer(1000);
        t.enable_pwm(13, 0, 0);

        let mut out = t.pwm_output(13).unwrap();
        assert_eq!(out.max_duty_cycle(), 8000);
        out.set_duty_cycle_percent(25).unwrap();
        assert_eq!(t.registers().compare(Channel::C), 2000);

        let mut out = t.pwm_output(13).unwrap();
        out.set_duty_cycle_fully_on().unwrap();
        assert_eq!(t.registers().compare(Channel::C), 8000);
    }

    #[test]
    fn free_returns_registers() {
        let t = timer(1000);
        let regs = t.free();
        assert_eq!(regs.top(), 8000);
    }
}
