//! [`TimerRegisters`] for the 16-bit timer/counter peripherals.

use avr_device::interrupt;

use super::vector::{self, OverflowVector};
use crate::{
    hal::pac,
    pins::{OutputPin, Port},
    prescaler::Prescaler,
    registers::{Channel, TimerRegisters},
};

/// Set the data direction bit of an output compare pin.
fn set_output_direction(output: &OutputPin) {
    let mask = output.mask();

    // The port registers are shared with every other pin of the port.
    interrupt::free(|_| unsafe {
        match output.port {
            Port::B => {
                (*pac::PORTB::ptr())
                    .ddrb()
                    .modify(|r, w| w.bits(r.bits() | mask));
            }
            #[cfg(feature = "atmega2560")]
            Port::E => {
                (*pac::PORTE::ptr())
                    .ddre()
                    .modify(|r, w| w.bits(r.bits() | mask));
            }
            #[cfg(feature = "atmega2560")]
            Port::H => {
                (*pac::PORTH::ptr())
                    .ddrh()
                    .modify(|r, w| w.bits(r.bits() | mask));
            }
            #[cfg(feature = "atmega2560")]
            Port::L => {
                (*pac::PORTL::ptr())
                    .ddrl()
                    .modify(|r, w| w.bits(r.bits() | mask));
            }
            #[allow(unreachable_patterns)]
            _ => {}
        }
    });
}

fn register_handler(vector: &OverflowVector, handler: fn()) {
    interrupt::free(|cs| vector.register(cs, handler));
}

macro_rules! impl_timer_registers {
    (
        timer: $TC:ident,
        outputs: $outputs:expr,
        vector: $vector:expr,
        tccra: $tccra:ident,
        tccrb: $tccrb:ident,
        tcnt: $tcnt:ident,
        icr: $icr:ident,
        timsk: $timsk:ident,
        toie: $toie:ident,
        cs: $cs:ident,
        wgm: $wgm:ident,
        channels: { $($ch:ident => ($ocr:ident, $com:ident)),+ $(,)? },
    ) => {
        impl TimerRegisters for pac::$TC {
            fn outputs(&self) -> &'static [OutputPin] {
                $outputs
            }

            fn set_phase_frequency_correct(&mut self) {
                self.$tccra().reset();
                // WGMn3 set, clock stopped.
                self.$tccrb().write(|w| unsafe { w.$wgm().bits(0b10) });
            }

            fn set_top(&mut self, top: u16) {
                self.$icr().write(|w| unsafe { w.bits(top) });
            }

            fn set_clock_select(&mut self, prescaler: Prescaler) {
                self.$tccrb().modify(|_, w| match prescaler {
                    Prescaler::Direct => w.$cs().direct(),
                    Prescaler::Prescale8 => w.$cs().prescale_8(),
                    Prescaler::Prescale64 => w.$cs().prescale_64(),
                    Prescaler::Prescale256 => w.$cs().prescale_256(),
                    Prescaler::Prescale1024 => w.$cs().prescale_1024(),
                });
            }

            fn stop_clock(&mut self) {
                self.$tccrb().modify(|_, w| w.$cs().no_clock());
            }

            fn set_counter(&mut self, value: u16) {
                self.$tcnt().write(|w| unsafe { w.bits(value) });
            }

            fn set_compare(&mut self, channel: Channel, value: u16) {
                match channel {
                    $(Channel::$ch => {
                        self.$ocr().write(|w| unsafe { w.bits(value) });
                    })+
                    #[allow(unreachable_patterns)]
                    _ => {}
                }
            }

            fn connect_output(&mut self, output: &OutputPin) {
                set_output_direction(output);
                match output.channel {
                    $(Channel::$ch => {
                        self.$tccra().modify(|_, w| w.$com().match_clear());
                    })+
                    #[allow(unreachable_patterns)]
                    _ => {}
                }
            }

            fn disconnect_output(&mut self, output: &OutputPin) {
                match output.channel {
                    $(Channel::$ch => {
                        self.$tccra().modify(|_, w| w.$com().disconnected());
                    })+
                    #[allow(unreachable_patterns)]
                    _ => {}
                }
            }

            fn set_overflow_handler(&mut self, handler: fn()) {
                register_handler(&$vector, handler);
            }

            fn set_overflow_interrupt(&mut self, enable: bool) {
                self.$timsk().modify(|_, w| w.$toie().bit(enable));
            }

            unsafe fn enable_interrupts(&mut self) {
                // SAFETY: The caller guarantees no critical section is active.
                unsafe { interrupt::enable() };
            }
        }
    };
}

#[cfg(feature = "atmega2560")]
impl_timer_registers! {
    timer: TC1,
    outputs: crate::pins::mega::TIMER1,
    vector: vector::TIMER1_OVF,
    tccra: tccr1a,
    tccrb: tccr1b,
    tcnt: tcnt1,
    icr: icr1,
    timsk: timsk1,
    toie: toie1,
    cs: cs1,
    wgm: wgm1,
    channels: {
        A => (ocr1a, com1a),
        B => (ocr1b, com1b),
        C => (ocr1c, com1c),
    },
}

#[cfg(feature = "atmega2560")]
impl_timer_registers! {
    timer: TC3,
    outputs: crate::pins::mega::TIMER3,
    vector: vector::TIMER3_OVF,
    tccra: tccr3a,
    tccrb: tccr3b,
    tcnt: tcnt3,
    icr: icr3,
    timsk: timsk3,
    toie: toie3,
    cs: cs3,
    wgm: wgm3,
    channels: {
        A => (ocr3a, com3a),
        B => (ocr3b, com3b),
        C => (ocr3c, com3c),
    },
}

#[cfg(feature = "atmega2560")]
impl_timer_registers! {
    timer: TC4,
    outputs: crate::pins::mega::TIMER4,
    vector: vector::TIMER4_OVF,
    tccra: tccr4a,
    tccrb: tccr4b,
    tcnt: tcnt4,
    icr: icr4,
    timsk: timsk4,
    toie: toie4,
    cs: cs4,
    wgm: wgm4,
    channels: {
        A => (ocr4a, com4a),
        B => (ocr4b, com4b),
        C => (ocr4c, com4c),
    },
}

#[cfg(feature = "atmega2560")]
impl_timer_registers! {
    timer: TC5,
    outputs: crate::pins::mega::TIMER5,
    vector: vector::TIMER5_OVF,
    tccra: tccr5a,
    tccrb: tccr5b,
    tcnt: tcnt5,
    icr: icr5,
    timsk: timsk5,
    toie: toie5,
    cs: cs5,
    wgm: wgm5,
    channels: {
        A => (ocr5a, com5a),
        B => (ocr5b, com5b),
        C => (ocr5c, com5c),
    },
}

#[cfg(feature = "atmega328p")]
impl_timer_registers! {
    timer: TC1,
    outputs: crate::pins::uno::TIMER1,
    vector: vector::TIMER1_OVF,
    tccra: tccr1a,
    tccrb: tccr1b,
    tcnt: tcnt1,
    icr: icr1,
    timsk: timsk1,
    toie: toie1,
    cs: cs1,
    wgm: wgm1,
    channels: {
        A => (ocr1a, com1a),
        B => (ocr1b, com1b),
    },
}
