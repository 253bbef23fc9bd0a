//! Simulated timer registers for testing without hardware.

use crate::{
    pins::{OutputPin, Port},
    prescaler::Prescaler,
    registers::{Channel, TimerRegisters},
};

const CS_MASK: u8 = 0b0000_0111;
const WGM3: u8 = 1 << 4;
const TOIE: u8 = 1 << 0;

/// `COMnx1` bit of a channel in `TCCRnA`.
const fn com1(channel: Channel) -> u8 {
    match channel {
        Channel::A => 1 << 7,
        Channel::B => 1 << 5,
        Channel::C => 1 << 3,
    }
}

const fn port_index(port: Port) -> usize {
    match port {
        Port::B => 0,
        Port::E => 1,
        Port::H => 2,
        Port::L => 3,
    }
}

/// Register file of one 16-bit timer plus the bits of the surrounding MCU it
/// touches.
#[derive(Debug)]
pub struct MockTimer {
    outputs: &'static [OutputPin],
    tccra: u8,
    tccrb: u8,
    tcnt: u16,
    icr: u16,
    ocr: [u16; 3],
    timsk: u8,
    ddr: [u8; 4],
    global_interrupts: bool,
    handler: Option<fn()>,
    clock_starts: u32,
}

impl MockTimer {
    /// Registers in their power-on state.
    pub fn new(outputs: &'static [OutputPin]) -> Self {
        Self {
            outputs,
            tccra: 0,
            tccrb: 0,
            tcnt: 0,
            icr: 0,
            ocr: [0; 3],
            timsk: 0,
            ddr: [0; 4],
            global_interrupts: false,
            handler: None,
            clock_starts: 0,
        }
    }

    /// Raw `CSn2:0` bits.
    pub fn clock_select(&self) -> u8 {
        self.tccrb & CS_MASK
    }

    /// Number of writes that selected a clock source.
    pub fn clock_starts(&self) -> u32 {
        self.clock_starts
    }

    pub fn is_running(&self) -> bool {
        self.clock_select() != 0
    }

    pub fn phase_frequency_correct(&self) -> bool {
        self.tccra & 0b11 == 0 && self.tccrb & (0b11 << 3) == WGM3
    }

    pub fn top(&self) -> u16 {
        self.icr
    }

    pub fn counter(&self) -> u16 {
        self.tcnt
    }

    pub fn compare(&self, channel: Channel) -> u16 {
        self.ocr[channel as usize]
    }

    pub fn output_connected(&self, channel: Channel) -> bool {
        self.tccra & com1(channel) != 0
    }

    /// Whether the pin's data direction bit is set.
    pub fn is_output(&self, output: &OutputPin) -> bool {
        self.ddr[port_index(output.port)] & output.mask() != 0
    }

    pub fn overflow_interrupt_enabled(&self) -> bool {
        self.timsk & TOIE != 0
    }

    pub fn interrupts_enabled(&self) -> bool {
        self.global_interrupts
    }

    /// Count `ticks` prescaled clock edges. Nothing happens while stopped.
    pub fn advance(&mut self, ticks: u16) {
        if self.is_running() {
            self.tcnt = self.tcnt.wrapping_add(ticks);
        }
    }

    /// Simulate the counter reaching BOTTOM, running the overflow vector if
    /// the interrupt is enabled.
    pub fn overflow(&mut self) {
        if !self.is_running() {
            return;
        }
        self.tcnt = 0;
        if self.global_interrupts && self.overflow_interrupt_enabled() {
            if let Some(handler) = self.handler {
                handler();
            }
        }
    }
}

impl TimerRegisters for MockTimer {
    fn outputs(&self) -> &'static [OutputPin] {
        self.outputs
    }

    fn set_phase_frequency_correct(&mut self) {
        self.tccra = 0;
        self.tccrb = WGM3;
    }

    fn set_top(&mut self, top: u16) {
        self.icr = top;
    }

    fn set_clock_select(&mut self, prescaler: Prescaler) {
        self.tccrb = (self.tccrb & !CS_MASK) | prescaler.bits();
        self.clock_starts += 1;
    }

    fn stop_clock(&mut self) {
        self.tccrb &= !CS_MASK;
    }

    fn set_counter(&mut self, value: u16) {
        self.tcnt = value;
    }

    fn set_compare(&mut self, channel: Channel, value: u16) {
        self.ocr[channel as usize] = value;
    }

    fn connect_output(&mut self, output: &OutputPin) {
        self.ddr[port_index(output.port)] |= output.mask();
        self.tccra |= com1(output.channel);
    }

    fn disconnect_output(&mut self, output: &OutputPin) {
        self.tccra &= !com1(output.channel);
    }

    fn set_overflow_handler(&mut self, handler: fn()) {
        self.handler = Some(handler);
    }

    fn set_overflow_interrupt(&mut self, enable: bool) {
        if enable {
            self.timsk |= TOIE;
        } else {
            self.timsk &= !TOIE;
        }
    }

    unsafe fn enable_interrupts(&mut self) {
        self.global_interrupts = true;
    }
}

#[cfg(test)]
mod tests {
    use super::MockTimer;
    use crate::{pins::mega, prescaler::Prescaler, registers::TimerRegisters};

    #[test]
    fn clock_select_does_not_touch_mode() {
        let mut regs = MockTimer::new(mega::TIMER3);
        regs.set_phase_frequency_correct();
        regs.set_clock_select(Prescaler::Prescale1024);
        regs.set_clock_select(Prescaler::Prescale8);
        assert_eq!(regs.clock_select(), 0b010);
        assert!(regs.phase_frequency_correct());

        regs.stop_clock();
        assert!(!regs.is_running());
        assert!(regs.phase_frequency_correct());
        assert_eq!(regs.clock_starts(), 2);
    }

    #[test]
    fn handler_needs_both_interrupt_flags() {
        use core::sync::atomic::{AtomicU8, Ordering};

        static CALLS: AtomicU8 = AtomicU8::new(0);
        fn count() {
            CALLS.fetch_add(1, Ordering::Relaxed);
        }

        let mut regs = MockTimer::new(mega::TIMER4);
        regs.set_clock_select(Prescaler::Direct);
        regs.set_overflow_handler(count);
        regs.set_overflow_interrupt(true);
        regs.overflow();
        assert_eq!(CALLS.load(Ordering::Relaxed), 0);

        // SAFETY: Not inside a critical section.
        unsafe { regs.enable_interrupts() };
        regs.overflow();
        assert_eq!(CALLS.load(Ordering::Relaxed), 1);

        regs.set_overflow_interrupt(false);
        regs.overflow();
        assert_eq!(CALLS.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn output_lookup() {
        let regs = MockTimer::new(mega::TIMER5);
        assert_eq!(regs.output(44).map(|o| o.bit), Some(5));
        assert_eq!(regs.output(46).map(|o| o.bit), Some(3));
        assert!(regs.output(11).is_none());
    }
}
