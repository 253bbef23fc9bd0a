#![cfg_attr(target_arch = "avr", no_std, no_main, feature(abi_avr_interrupt))]

//! Demo firmware: a servo style signal with an overflow tick on Timer1 and,
//! on the Mega, a swept 1 kHz signal on Timer3. Settings and ticks are
//! reported over `USART0`.

#[cfg(not(target_arch = "avr"))]
fn main() {
    eprintln!("megatimers: the demo firmware only runs on AVR targets");
}

#[cfg(target_arch = "avr")]
mod firmware {
    use avr_device::interrupt::{self, CriticalSection, Mutex};
    use core::cell::Cell;
    use nano_fmt::{NanoDisplay, NanoWrite};
    use panic_halt as _;

    use megatimers::{
        avr::{usart::Usart0, vector, Timer1},
        hal, PeriodSetting,
    };

    /// UART baud rate.
    const BAUDRATE: u32 = 57600;

    /// Servo frame length (in microseconds).
    const SERVO_PERIOD: u32 = 20_000;

    /// 1.5ms pulse, servo centered.
    const SERVO_CENTER: u16 = 77;

    #[cfg(feature = "atmega2560")]
    const SERVO_PIN: u8 = 11;
    #[cfg(feature = "atmega328p")]
    const SERVO_PIN: u8 = 9;

    /// Overflows between two reports, one second.
    const TICKS_PER_REPORT: u16 = 50;

    #[cfg(feature = "atmega2560")]
    const TONE_PERIOD: u32 = 1_000;
    #[cfg(feature = "atmega2560")]
    const TONE_PIN: u8 = 5;

    /// Number of Timer1 overflows.
    static TICKS: Mutex<Cell<u16>> = Mutex::new(Cell::new(0));

    fn on_tick() {
        interrupt::free(|cs| {
            let ticks = TICKS.borrow(cs);
            ticks.set(ticks.get().wrapping_add(1));
        });
    }

    #[cfg_attr(feature = "atmega2560", avr_device::interrupt(atmega2560))]
    #[cfg_attr(feature = "atmega328p", avr_device::interrupt(atmega328p))]
    fn TIMER1_OVF() {
        // SAFETY: We are inside a blocking interrupt.
        let cs = unsafe { CriticalSection::new() };
        vector::TIMER1_OVF.dispatch(cs);
    }

    #[cfg(feature = "atmega2560")]
    #[avr_device::interrupt(atmega2560)]
    fn TIMER3_OVF() {
        // SAFETY: We are inside a blocking interrupt.
        let cs = unsafe { CriticalSection::new() };
        vector::TIMER3_OVF.dispatch(cs);
    }

    #[cfg(feature = "atmega2560")]
    #[avr_device::interrupt(atmega2560)]
    fn TIMER4_OVF() {
        // SAFETY: We are inside a blocking interrupt.
        let cs = unsafe { CriticalSection::new() };
        vector::TIMER4_OVF.dispatch(cs);
    }

    #[cfg(feature = "atmega2560")]
    #[avr_device::interrupt(atmega2560)]
    fn TIMER5_OVF() {
        // SAFETY: We are inside a blocking interrupt.
        let cs = unsafe { CriticalSection::new() };
        vector::TIMER5_OVF.dispatch(cs);
    }

    /// Log the resolved setting of a timer.
    fn report_setting<W>(w: &mut W, name: &str, setting: PeriodSetting, micros: u32)
    where
        W: NanoWrite,
    {
        name.fmt(w);
        w.write_str(": ");
        setting.fmt(w);
        w.write_str(", period ");
        micros.fmt(w);
        w.write_str("us\r\n");
    }

    #[hal::entry]
    fn main() -> ! {
        let dp = hal::Peripherals::take().unwrap();
        let pins = hal::pins!(dp);

        #[cfg(feature = "atmega2560")]
        let mut serial = Usart0::new(
            dp.USART0,
            pins.pe0.into_pull_up_input(),
            pins.pe1.into_output(),
            BAUDRATE,
        );
        #[cfg(feature = "atmega328p")]
        let mut serial = Usart0::new(
            dp.USART0,
            pins.pd0.into_pull_up_input(),
            pins.pd1.into_output(),
            BAUDRATE,
        );

        serial.write_str("megatimers demo\r\n");

        let mut timer1 = Timer1::new(dp.TC1, SERVO_PERIOD);
        timer1.enable_pwm(SERVO_PIN, SERVO_CENTER, 0);
        report_setting(&mut serial, "timer1", timer1.setting(), timer1.period_micros());

        #[cfg(feature = "atmega2560")]
        let mut timer3 = {
            let mut timer3 = megatimers::avr::Timer3::new(dp.TC3, TONE_PERIOD);
            timer3.enable_pwm(TONE_PIN, 0, 0);
            report_setting(&mut serial, "timer3", timer3.setting(), timer3.period_micros());
            timer3
        };
        #[cfg(feature = "atmega2560")]
        let mut tone_percent = 0u8;

        // SAFETY: Not inside a critical section and any non-atomic operations have been completed
        // at this point.
        unsafe { timer1.attach_interrupt(on_tick, 0) };

        let mut last_ticks = 0u16;
        loop {
            // Sleep until the next interrupt.
            dp.CPU.smcr().modify(|_, w| w.sm().idle().se().set_bit());
            avr_device::asm::sleep();
            dp.CPU.smcr().modify(|_, w| w.se().clear_bit());

            let ticks = interrupt::free(|cs| TICKS.borrow(cs).get());
            if ticks == last_ticks || ticks % TICKS_PER_REPORT != 0 {
                continue;
            }
            last_ticks = ticks;

            "ticks ".fmt(&mut serial);
            ticks.fmt(&mut serial);
            serial.write_str("\r\n");

            #[cfg(feature = "atmega2560")]
            {
                use embedded_hal::pwm::SetDutyCycle;

                tone_percent = (tone_percent + 10) % 100;
                if let Some(mut tone) = timer3.pwm_output(TONE_PIN) {
                    let _ = tone.set_duty_cycle_percent(tone_percent);
                }
            }
        }
    }
}
