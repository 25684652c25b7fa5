//! Byte-stepped shift register shared by the generator and the checker.
//!
//! The register is LSB-first internally. Wire bytes are bit-reversed
//! relative to that order, see [`to_wire`].

use crate::variant::PnVariant;

/// All-ones seed. The all-zero state is a fixed point and never used.
pub const SEED: u32 = 0xFFFF_FFFF;

/// Convert between register bit order and transmission bit order.
#[inline]
pub fn to_wire(byte: u8) -> u8 {
    byte.reverse_bits()
}

/// LFSR state for one variant.
///
/// 23 bits of state plus 8 injected bits fit in a `u32`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftRegister {
    state: u32,
    variant: PnVariant,
}

impl ShiftRegister {
    /// Create a register seeded to all-ones.
    pub fn new(variant: PnVariant) -> Self {
        Self {
            state: SEED,
            variant,
        }
    }

    /// Reseed to all-ones.
    pub fn reseed(&mut self) {
        self.state = SEED;
    }

    /// Apply the variant mask in place and return the masked value.
    #[inline]
    pub fn mask(&mut self) -> u32 {
        self.state &= self.variant.mask();
        self.state
    }

    /// Mask, then compute the feedback byte for the current state.
    #[inline]
    pub fn predict(&mut self) -> u8 {
        let masked = self.mask();
        self.variant.feedback(masked)
    }

    /// Inject a byte above the register width and drop the 8 consumed bits.
    #[inline]
    pub fn advance(&mut self, injected: u8) {
        let masked = self.mask();
        self.state = (masked + ((injected as u32) << self.variant.width())) >> 8;
    }

    /// Raw register contents (not necessarily masked).
    pub fn state(&self) -> u32 {
        self.state
    }

    pub fn variant(&self) -> PnVariant {
        self.variant
    }

    /// Switch taps without touching the state.
    pub fn set_variant(&mut self, variant: PnVariant) {
        self.variant = variant;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_wire() {
        assert_eq!(to_wire(0x01), 0x80);
        assert_eq!(to_wire(0x07), 0xE0);
        assert_eq!(to_wire(0xFF), 0xFF);
        assert_eq!(to_wire(0x00), 0x00);
        for b in 0..=255u8 {
            assert_eq!(to_wire(to_wire(b)), b);
        }
    }

    #[test]
    fn test_seed() {
        let mut reg = ShiftRegister::new(PnVariant::Pn11);
        assert_eq!(reg.state(), SEED);
        assert_eq!(reg.mask(), 0x7FF);
    }

    #[test]
    fn test_advance_pn11_first_steps() {
        let mut reg = ShiftRegister::new(PnVariant::Pn11);
        let fb = reg.predict();
        assert_eq!(fb, 0x00);
        reg.advance(fb);
        assert_eq!(reg.state(), 0x07);

        let fb = reg.predict();
        assert_eq!(fb, 0x06);
        reg.advance(fb);
        assert_eq!(reg.state(), 0x30);
    }

    #[test]
    fn test_advance_masks_first() {
        let mut reg = ShiftRegister::new(PnVariant::Pn23);
        reg.advance(0xFF);
        // (0x7FFFFF + (0xFF << 23)) >> 8
        assert_eq!(reg.state(), 0x7F_FFFF);
        assert!(reg.state() < (1 << 31));
    }

    #[test]
    fn test_reseed_and_set_variant() {
        let mut reg = ShiftRegister::new(PnVariant::Pn15);
        reg.advance(0x12);
        reg.set_variant(PnVariant::Pn23);
        assert_eq!(reg.variant(), PnVariant::Pn23);
        assert_ne!(reg.state(), SEED);
        reg.reseed();
        assert_eq!(reg.state(), SEED);
    }
}
