//! mill-hw-interface
//!
//! Operator input firmware for the milling-table controller on the Raspberry
//! Pi Pico 2. Wires the `mill-controls` accumulators to real pins:
//!
//! 1. A button is pressed (or the encoder shaft is pushed).
//! 2. The button task wakes when any of the six button lines leaves the level
//!    it had at the previous sample, lets the contacts settle for 1 ms and ORs
//!    the sampled levels into the sticky button accumulator.
//! 3. The encoder is turned; the rotary task wakes on a phase B edge and
//!    decodes the detent into the signed rotary accumulator.
//! 4. The foreground loop drains both accumulators every 10 ms. Jogging and
//!    feedrate handling live in the motion layer, which is not part of this
//!    firmware; drained input is only logged here.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::block::ImageDef;
use embassy_rp::gpio::{Input, Pull};
use embassy_time::{Delay, Duration, Instant, Ticker};
use {defmt_rtt as _, panic_probe as _};

use mill_controls::{
    attach_control_interrupts, button_capture, get_button_states, get_rotary_turns,
    rotary_accumulator, ButtonPins, ButtonSample, ButtonStates, Line, NotificationRegistry,
    NotificationSource, QuadraturePins, CONTROLS_CONFIG,
};

// ---------------------------------------------------------------------------
// Boot block
// ---------------------------------------------------------------------------

/// Tell the RP2350 Boot ROM about our application.
#[link_section = ".start_block"]
#[used]
pub static IMAGE_DEF: ImageDef = embassy_rp::block::ImageDef::secure_exe();

// ---------------------------------------------------------------------------
// Type aliases and constants
// ---------------------------------------------------------------------------

/// Every control line is a pulled-up GPIO input.
type ControlPin = Input<'static>;

/// Foreground drain cadence.
const FOREGROUND_PERIOD: Duration = Duration::from_millis(10);

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// Button-group handler.
///
/// RP2350 GPIO interrupts are per pin, so the coalesced "any button line
/// changed" notification is rebuilt by racing a wait on all six lines. The
/// waits are on levels relative to the last sample, since an edge wait armed
/// after sampling would not see a press that started in between.
/// The settle delay is awaited, not busy-waited.
#[embassy_executor::task]
async fn button_task(mut pins: ButtonPins<ControlPin>) {
    info!("Button capture task started");
    let mut delay = Delay;
    // Buttons held at boot are not a press until they are released and
    // pressed again.
    let mut last = ButtonSample::from_pins(&mut pins).unwrap_or_default();

    loop {
        if pins.wait_for_change(&last).await.is_err() {
            warn!("Button wait failed");
        }

        match button_capture().on_change_async(&mut pins, &mut delay).await {
            Ok(sample) => {
                trace!("button sample: {}", sample);
                last = sample;
            }
            Err(_) => warn!("Button sample failed; notification dropped"),
        }
    }
}

/// Phase B handler. No delay here: detents can arrive a few ms apart.
#[embassy_executor::task]
async fn rotary_task(mut pins: QuadraturePins<ControlPin>) {
    info!("Rotary capture task started");

    loop {
        pins.phase_b.wait_for_any_edge().await;

        if let Err(_) = rotary_accumulator().on_edge(Instant::now(), &mut pins) {
            warn!("Encoder sample failed; edge dropped");
        }
    }
}

// ---------------------------------------------------------------------------
// Notification registration
// ---------------------------------------------------------------------------

#[derive(Debug, Format)]
enum RegistryError {
    /// The pins for this source were already handed to a task.
    PinsTaken,
}

/// Registers a notification source by spawning the task that awaits its
/// edges. Each source's pins can be handed out once, so a source that was
/// registered stays registered and a second attempt reports `PinsTaken`.
struct TaskRegistry {
    spawner: Spawner,
    buttons: Option<ButtonPins<ControlPin>>,
    encoder: Option<QuadraturePins<ControlPin>>,
}

impl NotificationRegistry for TaskRegistry {
    type Error = RegistryError;

    fn register(
        &mut self,
        source: NotificationSource,
        lines: &'static [Line],
    ) -> Result<(), Self::Error> {
        debug!("Registering {} on {} lines", source, lines.len());

        match source {
            NotificationSource::ButtonGroup => {
                let pins = self.buttons.take().ok_or(RegistryError::PinsTaken)?;
                self.spawner.spawn(unwrap!(button_task(pins)));
            }
            NotificationSource::RotaryPhaseB => {
                let pins = self.encoder.take().ok_or(RegistryError::PinsTaken)?;
                self.spawner.spawn(unwrap!(rotary_task(pins)));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Default::default());
    info!("mill-hw-interface starting");

    let config = CONTROLS_CONFIG;
    info!(
        "Settle {} us, min detent interval {} ms, encoder {}",
        config.settle_delay_us, config.min_detent_interval_ms, config.encoder_direction
    );

    // —— Pin assignments ————————————————————————————————————————————————————
    // FAST_LEFT  → GP13     SLOW_LEFT  → GP12     SLOW_RIGHT → GP11
    // FAST_RIGHT → GP10     STOP       → GP9      ROTARY_SW  → GP8
    // ROTARY_A   → GP7      ROTARY_B   → GP6
    // All active-low, pull-up enabled.
    // ———————————————————————————————————————————————————————————————————————

    let buttons = ButtonPins {
        fast_left: Input::new(p.PIN_13, Pull::Up),
        slow_left: Input::new(p.PIN_12, Pull::Up),
        slow_right: Input::new(p.PIN_11, Pull::Up),
        fast_right: Input::new(p.PIN_10, Pull::Up),
        stop: Input::new(p.PIN_9, Pull::Up),
        rotary_switch: Input::new(p.PIN_8, Pull::Up),
    };

    let encoder = QuadraturePins {
        phase_a: Input::new(p.PIN_7, Pull::Up),
        phase_b: Input::new(p.PIN_6, Pull::Up),
    };

    // —— Handler registration ———————————————————————————————————————————————

    let mut registry = TaskRegistry {
        spawner,
        buttons: Some(buttons),
        encoder: Some(encoder),
    };

    // No handlers means the drains below can only ever return zero.
    if let Err(e) = attach_control_interrupts(&mut registry) {
        error!("Failed to attach control handlers: {}", e);
        return;
    }

    info!("Control handlers attached");

    // —— Foreground loop ————————————————————————————————————————————————————

    let mut ticker = Ticker::every(FOREGROUND_PERIOD);
    let mut states = ButtonStates::default();

    loop {
        ticker.next().await;

        get_button_states(&mut states);
        let turns = get_rotary_turns();

        for line in states.pressed() {
            info!("Button pressed: {}", line);
        }
        if turns != 0 {
            info!("Rotary: {} detents", turns);
        }
    }
}
