//! Core configuration.

/// ADC/SBC behaviour while the D flag is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DecimalMode {
    /// D is stored and pushed but arithmetic stays binary (2A03-style).
    #[default]
    Disabled,
    /// NMOS BCD adjust. Flag outcomes are not verified against hardware.
    Nmos,
}

/// Build-time options for a [`Mos6502`](crate::Mos6502).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Mos6502Config {
    pub decimal: DecimalMode,
}

impl Mos6502Config {
    /// Configuration with NMOS decimal arithmetic enabled.
    #[must_use]
    pub const fn nmos() -> Self {
        Self {
            decimal: DecimalMode::Nmos,
        }
    }
}
