//! Operator input capture for a milling-table motion controller.
//!
//! This crate turns edge notifications from five jog/stop push-buttons and a
//! rotary quadrature encoder (with integrated push-button) into debounced,
//! atomically drained snapshots for the foreground motion-control loop.
//!
//! # Architecture
//!
//! Two independent accumulators, each with exactly one writer (its edge
//! handler) and one reader/resetter (its drain):
//!
//! - **[`ButtonCapture`]** — sticky "pressed since last drain" flags for the
//!   six buttons, sampled after a settle delay on every group-change
//!   notification.
//! - **[`RotaryAccumulator`]** — signed detent count decoded on the falling
//!   edge of phase B, rate-limited by a minimum inter-detent time.
//!
//! Both keep their state inside a critical-section mutex, so a drain is
//! indivisible with respect to the handlers on every target that provides a
//! `critical-section` implementation.
//!
//! The process-wide accumulators and the operations the motion loop calls
//! live in [`controls`]:
//!
//! ```ignore
//! use mill_controls::{attach_control_interrupts, get_button_states, get_rotary_turns, ButtonStates};
//!
//! attach_control_interrupts(&mut registry)?;
//!
//! loop {
//!     let mut buttons = ButtonStates::default();
//!     get_button_states(&mut buttons);
//!     let turns = get_rotary_turns();
//!     // feed `buttons` / `turns` into the motion layer
//! }
//! ```
//!
//! # Features
//!
//! - **`defmt`** — structured logging from the handlers and
//!   [`defmt::Format`] implementations on the public types.
//! - **`reverse-encoder`** — build the process-wide rotary accumulator with
//!   [`EncoderDirection::Reversed`] (see [`CONTROLS_CONFIG`]).

#![no_std]

pub mod buttons;
pub mod config;
pub mod controls;
pub mod error;
pub mod lines;
pub mod rotary;

#[cfg(test)]
mod mock;

pub use buttons::{ButtonCapture, ButtonSample, ButtonStates};
pub use config::{ControlsConfig, EncoderDirection, CONTROLS_CONFIG};
pub use controls::{
    attach_control_interrupts, button_capture, get_button_states, get_rotary_turns,
    global_controls, rotary_accumulator, Controls, NotificationRegistry,
};
pub use error::ControlsError;
pub use lines::{ButtonLine, ButtonPins, EncoderLine, Line, NotificationSource, QuadraturePins};
pub use rotary::RotaryAccumulator;
