//! Error types for control input capture.

use core::fmt;

/// Errors surfaced by the capture layer.
///
/// Drains never fail; these only come out of the sampling helpers and the
/// one-time registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlsError<E> {
    /// Reading a digital input line failed.
    Pin(E),

    /// The platform refused to register a notification source.
    Registration(E),

    /// [`attach_control_interrupts`](crate::attach_control_interrupts) was
    /// already called successfully.
    AlreadyAttached,
}

// Allow ergonomic `?` propagation from raw pin errors.
impl<E> From<E> for ControlsError<E> {
    fn from(error: E) -> Self {
        ControlsError::Pin(error)
    }
}

impl<E: fmt::Debug> fmt::Display for ControlsError<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ControlsError::Pin(e) => write!(f, "Input pin error: {:?}", e),
            ControlsError::Registration(e) => write!(f, "Notification registration failed: {:?}", e),
            ControlsError::AlreadyAttached => write!(f, "Control handlers already attached"),
        }
    }
}

#[cfg(feature = "defmt")]
impl<E: defmt::Format> defmt::Format for ControlsError<E> {
    fn format(&self, f: defmt::Formatter) {
        match self {
            ControlsError::Pin(e) => defmt::write!(f, "Input pin error: {}", e),
            ControlsError::Registration(e) => defmt::write!(f, "Notification registration failed: {}", e),
            ControlsError::AlreadyAttached => defmt::write!(f, "Control handlers already attached"),
        }
    }
}
