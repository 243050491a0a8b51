//! Process-wide control accumulators and the operations the motion loop uses.
//!
//! The two accumulators are zero at start-up and live for the whole run of
//! the controller. Notification handlers reach them through
//! [`button_capture()`] and [`rotary_accumulator()`]; the foreground loop only
//! drains them through [`get_button_states()`] and [`get_rotary_turns()`].
//! The two drains are independent critical sections, so no ordering between
//! a button drain and a rotary drain is implied.
//!
//! The process-wide set is built from [`CONTROLS_CONFIG`], so its timing and
//! encoder polarity are fixed when the crate is compiled.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::buttons::{ButtonCapture, ButtonStates};
use crate::config::{ControlsConfig, CONTROLS_CONFIG};
use crate::error::ControlsError;
use crate::lines::{Line, NotificationSource};
use crate::rotary::RotaryAccumulator;

static CONTROLS: Controls = Controls::new(CONTROLS_CONFIG);
static ATTACHED: Mutex<CriticalSectionRawMutex, Cell<bool>> = Mutex::new(Cell::new(false));

/// Platform hook for routing line changes to the control handlers.
///
/// An implementation arranges for `source`'s handler to run whenever any of
/// `lines` changes level: by unmasking a pin-change interrupt group, by
/// spawning a task that awaits the edge, or similar.
pub trait NotificationRegistry {
    type Error;

    fn register(
        &mut self,
        source: NotificationSource,
        lines: &'static [Line],
    ) -> Result<(), Self::Error>;
}

/// One button accumulator and one rotary accumulator sharing a config.
pub struct Controls {
    buttons: ButtonCapture,
    rotary: RotaryAccumulator,
    config: ControlsConfig,
}

impl Controls {
    pub const fn new(config: ControlsConfig) -> Self {
        Self {
            buttons: ButtonCapture::new(config),
            rotary: RotaryAccumulator::new(config),
            config,
        }
    }

    pub fn config(&self) -> &ControlsConfig {
        &self.config
    }

    pub fn buttons(&self) -> &ButtonCapture {
        &self.buttons
    }

    pub fn rotary(&self) -> &RotaryAccumulator {
        &self.rotary
    }

    /// See [`get_button_states()`].
    pub fn get_button_states(&self, states: &mut ButtonStates) {
        self.buttons.drain_into(states);
    }

    /// See [`get_rotary_turns()`].
    pub fn get_rotary_turns(&self) -> i32 {
        self.rotary.drain()
    }
}

/// The process-wide accumulators.
pub fn global_controls() -> &'static Controls {
    &CONTROLS
}

/// The button accumulator, for the button-group handler.
pub fn button_capture() -> &'static ButtonCapture {
    CONTROLS.buttons()
}

/// The rotary accumulator, for the phase B handler.
pub fn rotary_accumulator() -> &'static RotaryAccumulator {
    CONTROLS.rotary()
}

/// Register the button-group and phase B notification sources.
///
/// Call once during start-up.
///
/// # Errors
/// * [`ControlsError::AlreadyAttached`] on any call after a successful one
/// * [`ControlsError::Registration`] if the platform refused a source. The
///   attach guard is released, but sources registered before the refusal
///   stay registered; whether a later call can succeed is up to the registry.
pub fn attach_control_interrupts<R: NotificationRegistry>(
    registry: &mut R,
) -> Result<(), ControlsError<R::Error>> {
    let claimed = ATTACHED.lock(|attached| !attached.replace(true));
    if !claimed {
        return Err(ControlsError::AlreadyAttached);
    }

    #[cfg(feature = "defmt")]
    defmt::debug!("attaching handlers for controls");

    for source in [NotificationSource::ButtonGroup, NotificationSource::RotaryPhaseB] {
        if let Err(e) = registry.register(source, source.lines()) {
            ATTACHED.lock(|attached| attached.set(false));
            return Err(ControlsError::Registration(e));
        }
    }

    Ok(())
}

/// Copy the sticky button states pressed since the last call into `states`,
/// then reset them.
pub fn get_button_states(states: &mut ButtonStates) {
    CONTROLS.get_button_states(states);
}

/// Net signed encoder detents since the last call; resets the count.
pub fn get_rotary_turns() -> i32 {
    CONTROLS.get_rotary_turns()
}

#[cfg(test)]
mod tests {
    use embassy_time::Instant;

    use super::*;
    use crate::config::EncoderDirection;
    use crate::lines::ButtonLine;
    use crate::mock::{buttons_pressing, encoder_falling, RecordingDelay, RecordingRegistry};

    // Each process-wide static is exercised by exactly one test, since tests
    // run in parallel.

    #[test]
    fn attach_registers_both_sources_once() {
        let mut refusing = RecordingRegistry {
            refuse: Some(NotificationSource::RotaryPhaseB),
            ..Default::default()
        };
        assert_eq!(
            attach_control_interrupts(&mut refusing),
            Err(ControlsError::Registration(NotificationSource::RotaryPhaseB))
        );
        // The button group went through before the refusal and is not undone.
        assert_eq!(refusing.count, 1);
        assert_eq!(
            refusing.registered[0],
            Some((NotificationSource::ButtonGroup, ButtonLine::COUNT))
        );

        let mut registry = RecordingRegistry::default();
        assert_eq!(attach_control_interrupts(&mut registry), Ok(()));
        assert_eq!(registry.count, 2);
        assert_eq!(
            registry.registered[0],
            Some((NotificationSource::ButtonGroup, ButtonLine::COUNT))
        );
        assert_eq!(
            registry.registered[1],
            Some((NotificationSource::RotaryPhaseB, 1))
        );

        let mut again = RecordingRegistry::default();
        assert_eq!(
            attach_control_interrupts(&mut again),
            Err(ControlsError::AlreadyAttached)
        );
        assert_eq!(again.count, 0);
    }

    #[test]
    fn global_button_drain() {
        let mut delay = RecordingDelay::default();
        button_capture()
            .on_change(&mut buttons_pressing(ButtonLine::FastLeft), &mut delay)
            .unwrap();
        button_capture()
            .on_change(&mut buttons_pressing(ButtonLine::Stop), &mut delay)
            .unwrap();

        let mut states = ButtonStates::default();
        get_button_states(&mut states);
        assert!(states.is_pressed(ButtonLine::FastLeft));
        assert!(states.is_pressed(ButtonLine::Stop));
        assert_eq!(states.pressed().count(), 2);

        get_button_states(&mut states);
        assert_eq!(states, ButtonStates::default());
    }

    #[test]
    fn global_rotary_drain() {
        let rotary = rotary_accumulator();
        rotary
            .on_edge(Instant::from_millis(0), &mut encoder_falling(true))
            .unwrap();
        rotary
            .on_edge(Instant::from_millis(20), &mut encoder_falling(true))
            .unwrap();

        let sign = CONTROLS_CONFIG.encoder_direction.sign();
        assert_eq!(get_rotary_turns(), 2 * sign);
        assert_eq!(get_rotary_turns(), 0);
    }

    #[test]
    fn global_set_uses_build_config() {
        assert_eq!(global_controls().config(), &CONTROLS_CONFIG);
    }

    #[test]
    fn reversed_set_negates_drained_turns() {
        static REVERSED: Controls = Controls::new(ControlsConfig {
            encoder_direction: EncoderDirection::Reversed,
            ..ControlsConfig::DEFAULT
        });

        REVERSED
            .rotary()
            .on_edge(Instant::from_millis(0), &mut encoder_falling(true))
            .unwrap();
        REVERSED
            .rotary()
            .on_edge(Instant::from_millis(20), &mut encoder_falling(true))
            .unwrap();
        REVERSED
            .rotary()
            .on_edge(Instant::from_millis(40), &mut encoder_falling(false))
            .unwrap();

        assert_eq!(REVERSED.get_rotary_turns(), -1);
        assert_eq!(REVERSED.get_rotary_turns(), 0);
    }
}
