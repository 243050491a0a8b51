//! Quadrature decoding of the jog encoder into signed detent counts.
//!
//! Decoding happens on the falling edge of phase B only: phase A high counts
//! one detent forward, phase A low one detent back (times the configured
//! [`EncoderDirection`](crate::EncoderDirection)). Rising edges are ignored.
//!
//! # Rate limit
//!
//! A falling edge is accepted only if more than the minimum inter-detent time
//! has passed since the previous falling edge, **accepted or not**. A burst of
//! closely spaced edges therefore keeps pushing the window forward instead of
//! letting its first edge through:
//!
//! ```text
//! edge (ms):   0     3     10    12    20
//! elapsed:     -     3     7     2     8      (threshold 5)
//! accepted:    yes   no    yes   no    yes
//! ```
//!
//! Elapsed time is counted in whole milliseconds (`Instant::as_millis()`
//! differences), so edges at 0 µs and 5 500 µs are 5 ms apart and the second
//! one is rejected.
//!
//! This handler has no blocking delay; quadrature edges can arrive in quick
//! succession.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::Instant;
use embedded_hal::digital::InputPin;

use crate::config::ControlsConfig;
use crate::error::ControlsError;
use crate::lines::QuadraturePins;

#[derive(Clone, Copy)]
struct RotaryState {
    turns: i32,
    /// Time of the most recent phase B falling edge. `None` until the first.
    last_detent: Option<Instant>,
}

/// Interrupt-safe signed detent accumulator.
///
/// Written from the phase B edge handler, drained from the foreground loop.
pub struct RotaryAccumulator {
    state: Mutex<CriticalSectionRawMutex, Cell<RotaryState>>,
    min_interval_ms: u64,
    sign: i32,
}

impl RotaryAccumulator {
    /// Create an empty accumulator from the rotary part of `config`.
    pub const fn new(config: ControlsConfig) -> Self {
        Self {
            state: Mutex::new(Cell::new(RotaryState {
                turns: 0,
                last_detent: None,
            })),
            min_interval_ms: config.min_detent_interval_ms,
            sign: config.encoder_direction.sign(),
        }
    }

    /// Phase B change handler on already-sampled levels.
    ///
    /// Returns the signed contribution added to the accumulator: `0` for a
    /// rising edge or a rate-limited falling edge.
    pub fn on_phase_b_change(&self, now: Instant, phase_b_low: bool, phase_a_high: bool) -> i32 {
        if !phase_b_low {
            return 0;
        }

        let step = if phase_a_high { self.sign } else { -self.sign };

        self.state.lock(|cell| {
            let mut state = cell.get();
            let accepted = match state.last_detent {
                Some(last) => {
                    now.as_millis().saturating_sub(last.as_millis()) > self.min_interval_ms
                }
                None => true,
            };
            // Every falling edge moves the window, accepted or not.
            state.last_detent = Some(now);
            let delta = if accepted { step } else { 0 };
            state.turns = state.turns.saturating_add(delta);
            cell.set(state);

            #[cfg(feature = "defmt")]
            defmt::trace!("rotary edge: delta={} turns={}", delta, state.turns);

            delta
        })
    }

    /// Phase B change handler: sample both phases, then decode.
    ///
    /// # Errors
    /// [`ControlsError::Pin`] if either phase could not be read; the edge is
    /// dropped and the rate-limit window is not moved.
    pub fn on_edge<P: InputPin>(
        &self,
        now: Instant,
        pins: &mut QuadraturePins<P>,
    ) -> Result<i32, ControlsError<P::Error>> {
        let phase_b_low = pins.phase_b.is_low()?;
        if !phase_b_low {
            return Ok(0);
        }
        let phase_a_high = pins.phase_a.is_high()?;
        Ok(self.on_phase_b_change(now, phase_b_low, phase_a_high))
    }

    /// Read the net detent count since the last drain and reset it to zero,
    /// as one indivisible step.
    pub fn drain(&self) -> i32 {
        self.state.lock(|cell| {
            let mut state = cell.get();
            let turns = state.turns;
            state.turns = 0;
            cell.set(state);
            turns
        })
    }
}

impl Default for RotaryAccumulator {
    fn default() -> Self {
        Self::new(ControlsConfig::DEFAULT)
    }
}
