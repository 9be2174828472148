//! GP pin numbering, GPIO direction and logic level.

/// One of the MCP2221's four general-purpose pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GpPin {
    /// GP0.
    Gp0,
    /// GP1.
    Gp1,
    /// GP2.
    Gp2,
    /// GP3.
    Gp3,
}

impl GpPin {
    /// Index of the pin, `0..=3`.
    pub fn index(self) -> usize {
        match self {
            GpPin::Gp0 => 0,
            GpPin::Gp1 => 1,
            GpPin::Gp2 => 2,
            GpPin::Gp3 => 3,
        }
    }
}

impl std::fmt::Display for GpPin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GP{}", self.index())
    }
}

/// GPIO pin level setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicLevel {
    /// Logic high.
    High,
    /// Logic low.
    Low,
}

impl From<bool> for LogicLevel {
    fn from(value: bool) -> Self {
        if value { Self::High } else { Self::Low }
    }
}

impl From<LogicLevel> for bool {
    fn from(value: LogicLevel) -> Self {
        matches!(value, LogicLevel::High)
    }
}

/// GPIO pin direction.
///
/// The MCP2221 encodes input as a set bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioDirection {
    /// Digital input.
    Input,
    /// Digital output.
    Output,
}

impl From<bool> for GpioDirection {
    fn from(value: bool) -> Self {
        if value { Self::Input } else { Self::Output }
    }
}

impl From<GpioDirection> for bool {
    fn from(value: GpioDirection) -> Self {
        matches!(value, GpioDirection::Input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pin_index_and_name() {
        assert_eq!(GpPin::Gp3.index(), 3);
        assert_eq!(GpPin::Gp2.to_string(), "GP2");
    }

    #[test]
    fn direction_bit_is_set_for_input() {
        assert!(bool::from(GpioDirection::Input));
        assert_eq!(GpioDirection::from(false), GpioDirection::Output);
    }
}
