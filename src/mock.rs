//! Test doubles for the hardware primitives.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, InputPin};

use crate::controls::NotificationRegistry;
use crate::lines::{ButtonLine, ButtonPins, Line, NotificationSource, QuadraturePins};

// ── Pins ─────────────────────────────────────────────────────────────

/// Input pin with a level set by the test.
#[derive(Debug, Clone, Copy)]
pub struct MockPin {
    high: bool,
}

impl MockPin {
    /// Idle pulled-up line (reads high).
    pub fn idle() -> Self {
        Self { high: true }
    }

    pub fn set_low(&mut self) {
        self.high = false;
    }
}

impl ErrorType for MockPin {
    type Error = Infallible;
}

impl InputPin for MockPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.high)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.high)
    }
}

impl embedded_hal_async::digital::Wait for MockPin {
    async fn wait_for_high(&mut self) -> Result<(), Self::Error> {
        if !self.high {
            core::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn wait_for_low(&mut self) -> Result<(), Self::Error> {
        if self.high {
            core::future::pending::<()>().await;
        }
        Ok(())
    }

    // The level never moves while a test is awaiting, so no edge arrives.
    async fn wait_for_rising_edge(&mut self) -> Result<(), Self::Error> {
        core::future::pending().await
    }

    async fn wait_for_falling_edge(&mut self) -> Result<(), Self::Error> {
        core::future::pending().await
    }

    async fn wait_for_any_edge(&mut self) -> Result<(), Self::Error> {
        core::future::pending().await
    }
}

/// Error raised by [`FaultyPin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinFault;

impl embedded_hal::digital::Error for PinFault {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}

/// Pin that reads low until `fail` is set, then errors on every read.
#[derive(Debug, Clone, Copy)]
pub struct FaultyPin {
    pub fail: bool,
}

impl ErrorType for FaultyPin {
    type Error = PinFault;
}

impl InputPin for FaultyPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        if self.fail {
            Err(PinFault)
        } else {
            Ok(false)
        }
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

/// Six idle (released) button pins.
pub fn idle_buttons() -> ButtonPins<MockPin> {
    ButtonPins {
        fast_left: MockPin::idle(),
        slow_left: MockPin::idle(),
        slow_right: MockPin::idle(),
        fast_right: MockPin::idle(),
        stop: MockPin::idle(),
        rotary_switch: MockPin::idle(),
    }
}

/// Button pins with only `line` held down.
pub fn buttons_pressing(line: ButtonLine) -> ButtonPins<MockPin> {
    let mut pins = idle_buttons();
    pins.line_mut(line).set_low();
    pins
}

/// Encoder pins with the given phase A level and phase B low (falling edge).
pub fn encoder_falling(phase_a_high: bool) -> QuadraturePins<MockPin> {
    let mut pins = QuadraturePins {
        phase_a: MockPin::idle(),
        phase_b: MockPin::idle(),
    };
    if !phase_a_high {
        pins.phase_a.set_low();
    }
    pins.phase_b.set_low();
    pins
}

// ── Delays ───────────────────────────────────────────────────────────

/// Delay that returns immediately and records the total requested time.
#[derive(Debug, Default)]
pub struct RecordingDelay {
    pub total_ns: u64,
    pub calls: usize,
}

impl embedded_hal::delay::DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += ns as u64;
        self.calls += 1;
    }
}

impl embedded_hal_async::delay::DelayNs for RecordingDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.total_ns += ns as u64;
        self.calls += 1;
    }
}

// ── Registry ─────────────────────────────────────────────────────────

/// Registry that records registrations and can be told to refuse one.
#[derive(Debug, Default)]
pub struct RecordingRegistry {
    pub registered: [Option<(NotificationSource, usize)>; 4],
    pub count: usize,
    pub refuse: Option<NotificationSource>,
}

impl NotificationRegistry for RecordingRegistry {
    type Error = NotificationSource;

    fn register(
        &mut self,
        source: NotificationSource,
        lines: &'static [Line],
    ) -> Result<(), Self::Error> {
        if self.refuse == Some(source) {
            return Err(source);
        }
        self.registered[self.count] = Some((source, lines.len()));
        self.count += 1;
        Ok(())
    }
}
