//! Physical input lines and the notification sources they feed.
//!
//! Lines are named explicitly rather than as bits in a port mask; a platform
//! maps each [`Line`] to its own pin numbering when it registers the
//! [`NotificationSource`]s.
//!
//! ```text
//! ButtonGroup  (any change):  FastLeft SlowLeft SlowRight FastRight Stop RotarySwitch
//! RotaryPhaseB (any change):  PhaseB            (PhaseA is sampled, never notified)
//! ```

/// One of the six operator push-buttons.
///
/// Declaration order matches the field order of
/// [`ButtonStates`](crate::ButtonStates).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonLine {
    FastLeft,
    SlowLeft,
    SlowRight,
    FastRight,
    Stop,
    /// Push-button integrated in the rotary encoder shaft.
    RotarySwitch,
}

impl ButtonLine {
    /// Number of button lines.
    pub const COUNT: usize = 6;

    /// All button lines, in field order.
    pub const ALL: [ButtonLine; Self::COUNT] = [
        ButtonLine::FastLeft,
        ButtonLine::SlowLeft,
        ButtonLine::SlowRight,
        ButtonLine::FastRight,
        ButtonLine::Stop,
        ButtonLine::RotarySwitch,
    ];

    /// Position of this line in [`ButtonLine::ALL`].
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// One of the two quadrature phases of the rotary encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncoderLine {
    PhaseA,
    PhaseB,
}

/// Any input line consumed by the capture layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Line {
    Button(ButtonLine),
    Encoder(EncoderLine),
}

const BUTTON_GROUP_LINES: [Line; ButtonLine::COUNT] = [
    Line::Button(ButtonLine::FastLeft),
    Line::Button(ButtonLine::SlowLeft),
    Line::Button(ButtonLine::SlowRight),
    Line::Button(ButtonLine::FastRight),
    Line::Button(ButtonLine::Stop),
    Line::Button(ButtonLine::RotarySwitch),
];

const ROTARY_PHASE_B_LINES: [Line; 1] = [Line::Encoder(EncoderLine::PhaseB)];

/// A hardware notification source and the handler it drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NotificationSource {
    /// A single coalesced notification for a level change on any button line.
    /// The handler cannot tell which line changed and re-samples all six.
    ButtonGroup,
    /// A level change on the encoder's phase B line.
    RotaryPhaseB,
}

impl NotificationSource {
    /// The lines whose level changes raise this notification.
    pub const fn lines(self) -> &'static [Line] {
        match self {
            NotificationSource::ButtonGroup => &BUTTON_GROUP_LINES,
            NotificationSource::RotaryPhaseB => &ROTARY_PHASE_B_LINES,
        }
    }
}

/// The six button inputs, one per [`ButtonLine`].
///
/// All buttons are wired with pull-ups: a pressed button reads low.
#[derive(Debug)]
pub struct ButtonPins<P> {
    pub fast_left: P,
    pub slow_left: P,
    pub slow_right: P,
    pub fast_right: P,
    pub stop: P,
    pub rotary_switch: P,
}

impl<P> ButtonPins<P> {
    /// Mutable access to the pin wired to `line`.
    pub fn line_mut(&mut self, line: ButtonLine) -> &mut P {
        match line {
            ButtonLine::FastLeft => &mut self.fast_left,
            ButtonLine::SlowLeft => &mut self.slow_left,
            ButtonLine::SlowRight => &mut self.slow_right,
            ButtonLine::FastRight => &mut self.fast_right,
            ButtonLine::Stop => &mut self.stop,
            ButtonLine::RotarySwitch => &mut self.rotary_switch,
        }
    }
}

/// The two encoder phase inputs, pulled up like the buttons.
#[derive(Debug)]
pub struct QuadraturePins<P> {
    pub phase_a: P,
    pub phase_b: P,
}
