//! Capture timing and encoder polarity.

use embassy_time::Duration;

/// Direction multiplier applied to every accepted detent.
///
/// Flip to [`Reversed`](EncoderDirection::Reversed) when the encoder is
/// mounted so that clockwise turns come out negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncoderDirection {
    /// Phase A high on a phase B falling edge counts `+1`.
    #[default]
    Normal,
    /// Phase A high on a phase B falling edge counts `-1`.
    Reversed,
}

impl EncoderDirection {
    /// The polarity as a signed multiplier.
    pub const fn sign(self) -> i32 {
        match self {
            EncoderDirection::Normal => 1,
            EncoderDirection::Reversed => -1,
        }
    }
}

/// Configuration shared by the button and rotary capture paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlsConfig {
    /// Settle time between a button notification and sampling the lines.
    /// Default: 1000 µs.
    pub settle_delay_us: u32,
    /// Phase B falling edges closer together than this (or exactly this far
    /// apart) are not counted as a new detent. Default: 5 ms.
    pub min_detent_interval_ms: u64,
    /// Default: [`EncoderDirection::Normal`].
    pub encoder_direction: EncoderDirection,
}

impl ControlsConfig {
    /// 1 ms settle, 5 ms minimum detent interval, normal polarity.
    pub const DEFAULT: Self = Self {
        settle_delay_us: 1000,
        min_detent_interval_ms: 5,
        encoder_direction: EncoderDirection::Normal,
    };

    /// Settle interval as a [`Duration`].
    pub const fn settle_delay(&self) -> Duration {
        Duration::from_micros(self.settle_delay_us as u64)
    }

    /// Minimum inter-detent time as a [`Duration`].
    pub const fn min_detent_interval(&self) -> Duration {
        Duration::from_millis(self.min_detent_interval_ms)
    }
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Configuration of the process-wide accumulators behind
/// [`get_button_states`](crate::get_button_states) and
/// [`get_rotary_turns`](crate::get_rotary_turns).
///
/// Fixed at build time. The `reverse-encoder` feature selects
/// [`EncoderDirection::Reversed`] for encoders mounted the other way round.
pub const CONTROLS_CONFIG: ControlsConfig = ControlsConfig {
    encoder_direction: if cfg!(feature = "reverse-encoder") {
        EncoderDirection::Reversed
    } else {
        EncoderDirection::Normal
    },
    ..ControlsConfig::DEFAULT
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tuning() {
        let config = ControlsConfig::default();
        assert_eq!(config.settle_delay_us, 1000);
        assert_eq!(config.min_detent_interval_ms, 5);
        assert_eq!(config.encoder_direction, EncoderDirection::Normal);
        assert_eq!(config.settle_delay(), Duration::from_micros(1000));
        assert_eq!(config.min_detent_interval(), Duration::from_millis(5));
    }

    #[test]
    fn direction_sign() {
        assert_eq!(EncoderDirection::Normal.sign(), 1);
        assert_eq!(EncoderDirection::Reversed.sign(), -1);
    }

    #[test]
    fn build_config_follows_reverse_encoder_feature() {
        let expected = if cfg!(feature = "reverse-encoder") {
            EncoderDirection::Reversed
        } else {
            EncoderDirection::Normal
        };
        assert_eq!(CONTROLS_CONFIG.encoder_direction, expected);
        assert_eq!(CONTROLS_CONFIG.settle_delay_us, ControlsConfig::DEFAULT.settle_delay_us);
        assert_eq!(
            CONTROLS_CONFIG.min_detent_interval_ms,
            ControlsConfig::DEFAULT.min_detent_interval_ms
        );
    }
}
