//! Period and duty arithmetic shared by every timer.
//!
//! In phase and frequency correct mode the counter runs up to TOP and back
//! down to BOTTOM, so one period lasts `2 * TOP` prescaled clock ticks.

use nano_fmt::{NanoDisplay, NanoWrite};

/// Number of distinct values of a 16-bit counter.
pub const RESOLUTION: u32 = 1 << 16;

/// Duty value corresponding to a 100% output.
pub const DUTY_FULL_SCALE: u16 = 1 << DUTY_BITS;

/// Width of the duty fraction accepted by the PWM operations.
pub const DUTY_BITS: u32 = 10;

const MICROS_PER_SECOND: u64 = 1_000_000;

/// Timer clock divider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Prescaler {
    Direct,
    Prescale8,
    Prescale64,
    Prescale256,
    Prescale1024,
}

impl Prescaler {
    /// All dividers in the order they are tried.
    pub const ALL: [Prescaler; 5] = [
        Prescaler::Direct,
        Prescaler::Prescale8,
        Prescaler::Prescale64,
        Prescaler::Prescale256,
        Prescaler::Prescale1024,
    ];

    /// Division factor applied to the CPU clock.
    #[must_use]
    pub const fn divisor(self) -> u32 {
        1 << self.shift()
    }

    /// Value of the `CSn2:0` clock select bits.
    #[must_use]
    pub const fn bits(self) -> u8 {
        match self {
            Prescaler::Direct => 0b001,
            Prescaler::Prescale8 => 0b010,
            Prescaler::Prescale64 => 0b011,
            Prescaler::Prescale256 => 0b100,
            Prescaler::Prescale1024 => 0b101,
        }
    }

    /// Decode the clock select bits. Returns `None` for a stopped clock or an
    /// external clock source.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits & 0b111 {
            0b001 => Some(Prescaler::Direct),
            0b010 => Some(Prescaler::Prescale8),
            0b011 => Some(Prescaler::Prescale64),
            0b100 => Some(Prescaler::Prescale256),
            0b101 => Some(Prescaler::Prescale1024),
            _ => None,
        }
    }

    const fn shift(self) -> u32 {
        match self {
            Prescaler::Direct => 0,
            Prescaler::Prescale8 => 3,
            Prescaler::Prescale64 => 6,
            Prescaler::Prescale256 => 8,
            Prescaler::Prescale1024 => 10,
        }
    }
}

impl NanoDisplay for Prescaler {
    fn fmt<F: NanoWrite>(self, f: &mut F) {
        f.write_str("clk/");
        self.divisor().fmt(f);
    }
}

/// Clock divider and TOP value realising a period.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PeriodSetting {
    pub prescaler: Prescaler,
    pub top: u16,
}

impl PeriodSetting {
    /// Find the smallest prescaler for which the period fits into the 16-bit
    /// TOP register.
    ///
    /// Periods longer than the hardware can express are clamped to the
    /// maximum TOP with the largest prescaler.
    #[must_use]
    pub fn resolve(clock_hz: u32, micros: u32) -> Self {
        // The counter turns around at TOP, so a full period is two ramps.
        let cycles = u64::from(clock_hz) * u64::from(micros) / (2 * MICROS_PER_SECOND);

        Prescaler::ALL
            .into_iter()
            .find_map(|prescaler| {
                let top = cycles >> prescaler.shift();
                (top < u64::from(RESOLUTION)).then_some(Self {
                    prescaler,
                    top: top as u16,
                })
            })
            .unwrap_or(Self::MAX)
    }

    /// Longest period the hardware can generate.
    pub const MAX: Self = Self {
        prescaler: Prescaler::Prescale1024,
        top: (RESOLUTION - 1) as u16,
    };

    /// Period produced by this setting in microseconds, truncated.
    #[must_use]
    pub fn period_micros(self, clock_hz: u32) -> u32 {
        let ticks = 2 * u64::from(self.top) * u64::from(self.prescaler.divisor());
        (ticks * MICROS_PER_SECOND / u64::from(clock_hz)) as u32
    }

    /// Compare register value for a 10-bit duty fraction of TOP.
    ///
    /// Duty values above full scale saturate, so the result never exceeds
    /// TOP.
    #[must_use]
    pub fn compare_value(self, duty: u16) -> u16 {
        let duty = duty.min(DUTY_FULL_SCALE);
        ((u32::from(self.top) * u32::from(duty)) >> DUTY_BITS) as u16
    }
}

impl NanoDisplay for PeriodSetting {
    fn fmt<F: NanoWrite>(self, f: &mut F) {
        self.prescaler.fmt(f);
        f.write_str(" top=");
        self.top.fmt(f);
    }
}
