use nano_fmt::NanoWrite;

use crate::clock::BoardClock;
use crate::hal::{pac, port};

#[cfg(feature = "atmega2560")]
use port::{PE0 as RX, PE1 as TX};
#[cfg(feature = "atmega328p")]
use port::{PD0 as RX, PD1 as TX};

/// Polled writer on `USART0`, used for reporting.
pub struct Usart0 {
    p: pac::USART0,
}

type Baudrate = avr_hal_generic::usart::Baudrate<BoardClock>;

impl Usart0 {
    /// Create new instance from raw hardware. The frame format is left at
    /// its 8N1 reset value.
    #[must_use]
    pub fn new<IMODE: port::mode::InputMode>(
        p: pac::USART0,
        _rx: port::Pin<port::mode::Input<IMODE>, RX>,
        _tx: port::Pin<port::mode::Output, TX>,
        baudrate: u32,
    ) -> Self {
        let baudrate = Baudrate::new(baudrate);
        p.ubrr0().write(|w| unsafe { w.bits(baudrate.ubrr) });
        p.ucsr0a().write(|w| w.u2x0().bit(baudrate.u2x));

        // Enable receiver and transmitter.
        p.ucsr0b().write(|w| w.txen0().set_bit().rxen0().set_bit());

        Self { p }
    }
}

impl NanoWrite for Usart0 {
    fn write_byte(&mut self, b: u8) {
        while self.p.ucsr0a().read().udre0().bit_is_clear() {}

        self.p.udr0().write(|w| unsafe { w.bits(b) });
    }
}
