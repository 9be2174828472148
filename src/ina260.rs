//! INA260 power sensor addressing and die ID register decoding.

/// Default 7-bit address of the INA260 (A0 and A1 tied to GND).
pub const DEFAULT_ADDRESS: u8 = 0x40;

/// Die ID register, holding the device ID and silicon revision.
pub const DIE_ID_REGISTER: u8 = 0xFF;

/// The INA260 registers are all 16 bits wide.
pub const REGISTER_LENGTH: usize = 2;

/// Contents of the die ID register.
///
/// The INA260 sends register values most-significant byte first. The low four bits
/// are the revision and the high twelve bits the device ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DieId {
    revision: u8,
    device_id: u16,
}

impl DieId {
    /// Split a raw register value into its fields.
    pub fn from_register(value: u16) -> Self {
        Self {
            revision: (value & 0x0F) as u8,
            device_id: value >> 4,
        }
    }

    /// Decode the two bytes read from the register.
    pub fn from_be_bytes(bytes: [u8; REGISTER_LENGTH]) -> Self {
        Self::from_register(u16::from_be_bytes(bytes))
    }

    /// Recombine the fields into the raw register value.
    pub fn to_register(self) -> u16 {
        (self.device_id << 4) | u16::from(self.revision)
    }

    /// Silicon revision, `0..=15`.
    pub fn revision(self) -> u8 {
        self.revision
    }

    /// Device ID, `0..=4095`.
    pub fn device_id(self) -> u16 {
        self.device_id
    }
}

/// Format a field in decimal, hexadecimal and binary for logging.
pub fn field_line(label: &str, value: u16) -> String {
    format!("{label:<9} = {value:3} {{0x{value:4X}}} [0b{value:16b}]")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_sample_register() {
        let die = DieId::from_be_bytes([0x24, 0x90]);
        assert_eq!(die.to_register(), 0x2490);
        assert_eq!(die.to_register(), 9360);
        assert_eq!(die.revision(), 0);
        assert_eq!(die.device_id(), 0x249);
        assert_eq!(die.device_id(), 585);
    }

    #[test]
    fn decode_all_ones() {
        let die = DieId::from_be_bytes([0xFF, 0xFF]);
        assert_eq!(die.revision(), 15);
        assert_eq!(die.device_id(), 4095);
    }

    #[test]
    fn fields_recombine_for_every_value() {
        for value in 0..=u16::MAX {
            let die = DieId::from_register(value);
            assert_eq!(u16::from(die.revision()), value & 0x0F);
            assert_eq!(die.device_id(), value >> 4);
            assert_eq!(die.to_register(), value);
        }
    }

    #[test]
    fn bytes_are_msb_first() {
        assert_eq!(DieId::from_be_bytes([0x22, 0x70]).device_id(), 0x227);
        assert_eq!(DieId::from_be_bytes([0x70, 0x22]).revision(), 2);
    }

    #[test]
    fn log_line_format() {
        assert_eq!(
            field_line("Revision", 0),
            "Revision  =   0 {0x   0} [0b               0]"
        );
        assert_eq!(
            field_line("Device ID", 0x227),
            "Device ID = 551 {0x 227} [0b      1000100111]"
        );
    }
}
