//! Sticky, debounced capture of the six operator buttons.
//!
//! Every notification on the button group waits a short settle interval,
//! samples all six lines and ORs each "is pressed" reading into a sticky
//! counter. The foreground loop drains the counters, which copies and resets
//! them in one critical section.
//!
//! Counters latch "pressed since the last drain". Several presses, or a
//! button held across several notifications, all collapse into the same
//! non-zero value; press count and duration are not recorded.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_futures::select::select_array;
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::{Duration, Instant};
use embedded_hal::digital::InputPin;
use embedded_hal_async::digital::Wait;

use crate::config::ControlsConfig;
use crate::error::ControlsError;
use crate::lines::{ButtonLine, ButtonPins};

/// Sticky press accumulators, one per [`ButtonLine`].
///
/// A counter is either zero ("not pressed since the last drain") or non-zero
/// ("pressed at least once").
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonStates {
    pub fast_left: u32,
    pub slow_left: u32,
    pub slow_right: u32,
    pub fast_right: u32,
    pub stop: u32,
    pub rotary_press: u32,
}

impl ButtonStates {
    /// The counter for `line`.
    pub fn get(&self, line: ButtonLine) -> u32 {
        match line {
            ButtonLine::FastLeft => self.fast_left,
            ButtonLine::SlowLeft => self.slow_left,
            ButtonLine::SlowRight => self.slow_right,
            ButtonLine::FastRight => self.fast_right,
            ButtonLine::Stop => self.stop,
            ButtonLine::RotarySwitch => self.rotary_press,
        }
    }

    fn counter_mut(&mut self, line: ButtonLine) -> &mut u32 {
        match line {
            ButtonLine::FastLeft => &mut self.fast_left,
            ButtonLine::SlowLeft => &mut self.slow_left,
            ButtonLine::SlowRight => &mut self.slow_right,
            ButtonLine::FastRight => &mut self.fast_right,
            ButtonLine::Stop => &mut self.stop,
            ButtonLine::RotarySwitch => &mut self.rotary_press,
        }
    }

    /// Returns `true` if `line` was pressed since the last drain.
    pub fn is_pressed(&self, line: ButtonLine) -> bool {
        self.get(line) != 0
    }

    /// Returns `true` if any button was pressed since the last drain.
    pub fn any_pressed(&self) -> bool {
        ButtonLine::ALL.iter().any(|&line| self.is_pressed(line))
    }

    /// Iterate over the lines that were pressed, in field order.
    pub fn pressed(&self) -> impl Iterator<Item = ButtonLine> + '_ {
        ButtonLine::ALL
            .into_iter()
            .filter(move |&line| self.is_pressed(line))
    }

    fn merge(&mut self, sample: &ButtonSample) {
        for line in ButtonLine::ALL {
            *self.counter_mut(line) |= sample.is_active(line) as u32;
        }
    }
}

/// Instantaneous "is pressed" readings of all six lines from one notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonSample {
    active: [bool; ButtonLine::COUNT],
}

impl ButtonSample {
    /// Sample every button line. Active level is low.
    ///
    /// # Errors
    /// Returns the first pin read failure; nothing is sampled partially.
    pub fn from_pins<P: InputPin>(pins: &mut ButtonPins<P>) -> Result<Self, P::Error> {
        let mut sample = Self::default();
        for line in ButtonLine::ALL {
            sample.active[line.index()] = pins.line_mut(line).is_low()?;
        }
        Ok(sample)
    }

    /// A sample with `line` marked active in addition to the existing ones.
    pub fn with(mut self, line: ButtonLine) -> Self {
        self.active[line.index()] = true;
        self
    }

    /// Returns `true` if `line` read as pressed.
    pub fn is_active(&self, line: ButtonLine) -> bool {
        self.active[line.index()]
    }
}

impl<P: Wait> ButtonPins<P> {
    /// Wait until any line reads differently from `last`.
    ///
    /// Each line waits for the level opposite to its reading in `last`, so a
    /// line that changed after `last` was taken resolves at once. Re-arming
    /// on edges instead would miss a press that begins between the sample and
    /// the re-arm.
    pub async fn wait_for_change(&mut self, last: &ButtonSample) -> Result<(), P::Error> {
        let ButtonPins {
            fast_left,
            slow_left,
            slow_right,
            fast_right,
            stop,
            rotary_switch,
        } = self;

        let (result, _) = select_array([
            level_change(fast_left, last.is_active(ButtonLine::FastLeft)),
            level_change(slow_left, last.is_active(ButtonLine::SlowLeft)),
            level_change(slow_right, last.is_active(ButtonLine::SlowRight)),
            level_change(fast_right, last.is_active(ButtonLine::FastRight)),
            level_change(stop, last.is_active(ButtonLine::Stop)),
            level_change(rotary_switch, last.is_active(ButtonLine::RotarySwitch)),
        ])
        .await;
        result
    }
}

/// Pressed lines wait for release (high), released lines for press (low).
async fn level_change<P: Wait>(pin: &mut P, pressed: bool) -> Result<(), P::Error> {
    if pressed {
        pin.wait_for_high().await
    } else {
        pin.wait_for_low().await
    }
}

#[derive(Clone, Copy, Default)]
struct CaptureState {
    states: ButtonStates,
    /// Start of a pending deferred settle window, if any.
    settle_started: Option<Instant>,
}

/// Interrupt-safe sticky button accumulator.
///
/// Written from the button-group handler, drained from the foreground loop.
/// Both sides go through a critical section, so a drain never sees part of a
/// single notification's six-way update.
pub struct ButtonCapture {
    state: Mutex<CriticalSectionRawMutex, Cell<CaptureState>>,
    settle_delay_us: u32,
}

impl ButtonCapture {
    /// Create an empty accumulator using `config.settle_delay_us`.
    pub const fn new(config: ControlsConfig) -> Self {
        Self {
            state: Mutex::new(Cell::new(CaptureState {
                states: ButtonStates {
                    fast_left: 0,
                    slow_left: 0,
                    slow_right: 0,
                    fast_right: 0,
                    stop: 0,
                    rotary_press: 0,
                },
                settle_started: None,
            })),
            settle_delay_us: config.settle_delay_us,
        }
    }

    fn settle_delay(&self) -> Duration {
        Duration::from_micros(self.settle_delay_us as u64)
    }

    // -----------------------------------------------------------------------
    // Handler side
    // -----------------------------------------------------------------------

    /// OR one notification's readings into the sticky counters.
    pub fn accumulate(&self, sample: ButtonSample) {
        self.state.lock(|cell| {
            let mut state = cell.get();
            state.states.merge(&sample);
            cell.set(state);
        });
    }

    /// Button-group notification handler with a blocking settle.
    ///
    /// Waits the settle interval, samples all six lines and accumulates them.
    /// Intended for platforms whose interrupt handlers may busy-wait ~1 ms.
    ///
    /// # Errors
    /// [`ControlsError::Pin`] if a line could not be read; the accumulator is
    /// left untouched.
    pub fn on_change<P, D>(
        &self,
        pins: &mut ButtonPins<P>,
        delay: &mut D,
    ) -> Result<ButtonSample, ControlsError<P::Error>>
    where
        P: InputPin,
        D: embedded_hal::delay::DelayNs,
    {
        delay.delay_us(self.settle_delay_us);
        self.sample_and_accumulate(pins)
    }

    /// Button-group notification handler with an awaited settle.
    ///
    /// Same contract as [`on_change`](Self::on_change) for handlers that run
    /// as executor tasks and must not busy-wait.
    pub async fn on_change_async<P, D>(
        &self,
        pins: &mut ButtonPins<P>,
        delay: &mut D,
    ) -> Result<ButtonSample, ControlsError<P::Error>>
    where
        P: InputPin,
        D: embedded_hal_async::delay::DelayNs,
    {
        delay.delay_us(self.settle_delay_us).await;
        self.sample_and_accumulate(pins)
    }

    fn sample_and_accumulate<P: InputPin>(
        &self,
        pins: &mut ButtonPins<P>,
    ) -> Result<ButtonSample, ControlsError<P::Error>> {
        let sample = ButtonSample::from_pins(pins)?;
        self.accumulate(sample);
        Ok(sample)
    }

    // -----------------------------------------------------------------------
    // Deferred settle
    // -----------------------------------------------------------------------

    /// Record a button-group edge without sampling.
    ///
    /// Opens a settle window at `now` unless one is already pending; further
    /// edges inside the window do not extend it. The sample itself is taken
    /// later by [`poll_settled`](Self::poll_settled).
    pub fn notify(&self, now: Instant) {
        self.state.lock(|cell| {
            let mut state = cell.get();
            if state.settle_started.is_none() {
                state.settle_started = Some(now);
                cell.set(state);
            }
        });
    }

    /// Sample and accumulate once a pending settle window has elapsed.
    ///
    /// Returns `Ok(true)` if a sample was taken. The window is closed before
    /// sampling, so an edge arriving during the sample opens a new one.
    ///
    /// # Errors
    /// [`ControlsError::Pin`] if a line could not be read. The window is
    /// reopened at `now` so the sample is retried after another settle.
    pub fn poll_settled<P: InputPin>(
        &self,
        now: Instant,
        pins: &mut ButtonPins<P>,
    ) -> Result<bool, ControlsError<P::Error>> {
        let settle = self.settle_delay();
        let due = self.state.lock(|cell| {
            let mut state = cell.get();
            match state.settle_started {
                Some(started) if now.saturating_duration_since(started) >= settle => {
                    state.settle_started = None;
                    cell.set(state);
                    true
                }
                _ => false,
            }
        });

        if !due {
            return Ok(false);
        }

        match self.sample_and_accumulate(pins) {
            Ok(_) => Ok(true),
            Err(e) => {
                self.notify(now);
                Err(e)
            }
        }
    }

    /// Returns `true` while a deferred settle window is open.
    pub fn settle_pending(&self) -> bool {
        self.state.lock(|cell| cell.get().settle_started.is_some())
    }

    // -----------------------------------------------------------------------
    // Foreground side
    // -----------------------------------------------------------------------

    /// Copy all six counters and reset them, as one indivisible step.
    pub fn drain(&self) -> ButtonStates {
        self.state.lock(|cell| {
            let mut state = cell.get();
            let drained = state.states;
            state.states = ButtonStates::default();
            cell.set(state);
            drained
        })
    }

    /// [`drain`](Self::drain) into caller-provided storage.
    pub fn drain_into(&self, out: &mut ButtonStates) {
        *out = self.drain();
    }
}

impl Default for ButtonCapture {
    fn default() -> Self {
        Self::new(ControlsConfig::DEFAULT)
    }
}
