//! Pattern Generator — fill outgoing buffers with an O.150 PN sequence
//!
//! Produces the next N bytes of the selected sequence into a buffer owned
//! by the caller. The register carries across calls, so the stream is one
//! continuous sequence no matter how it is chunked.
//!
//! ## Example
//!
//! ```rust
//! use pnbert_core::generator::PatternGenerator;
//! use pnbert_core::variant::PnVariant;
//!
//! let mut gen = PatternGenerator::new(PnVariant::Pn11);
//! let mut buf = [0u8; 4];
//! gen.fill(&mut buf);
//! assert_eq!(&buf[..3], &[0xFF, 0xE0, 0x0C]);
//! assert_eq!(gen.bits_transmitted(), 32);
//! ```

use crate::error::{checked_len, BertResult};
use crate::register::{to_wire, ShiftRegister};
use crate::variant::PnVariant;

/// PRBS byte generator.
#[derive(Debug, Clone)]
pub struct PatternGenerator {
    register: ShiftRegister,
    bits_transmitted: u64,
}

impl PatternGenerator {
    /// Create a generator at the start of its sequence.
    pub fn new(variant: PnVariant) -> Self {
        Self {
            register: ShiftRegister::new(variant),
            bits_transmitted: 0,
        }
    }

    /// Produce the next wire byte and advance the register.
    #[inline]
    pub fn next_byte(&mut self) -> u8 {
        let masked = self.register.mask();
        let raw = masked as u8;
        let feedback = self.register.variant().feedback(masked);
        self.register.advance(feedback);
        self.bits_transmitted = self.bits_transmitted.wrapping_add(8);
        to_wire(raw)
    }

    /// Overwrite every byte of `buffer` with the next part of the sequence.
    pub fn fill(&mut self, buffer: &mut [u8]) {
        for byte in buffer.iter_mut() {
            *byte = self.next_byte();
        }
    }

    /// Fill the first `length` bytes of `buffer`.
    ///
    /// Fails without writing anything if `length` exceeds the buffer.
    pub fn fill_len(&mut self, buffer: &mut [u8], length: usize) -> BertResult<()> {
        let length = checked_len(length, buffer.len())?;
        self.fill(&mut buffer[..length]);
        Ok(())
    }

    /// Allocate and return the next `n` bytes.
    pub fn generate(&mut self, n: usize) -> Vec<u8> {
        let mut out = vec![0u8; n];
        self.fill(&mut out);
        out
    }

    /// Rewind to the fixed seed and clear the counter.
    pub fn reset(&mut self) {
        self.register.reseed();
        self.bits_transmitted = 0;
        tracing::debug!(variant = %self.variant(), "generator reset");
    }

    /// Select a variant. Register and counter are left as they are.
    pub fn set_variant(&mut self, variant: PnVariant) {
        self.register.set_variant(variant);
    }

    /// Select a variant by raw code, falling back to PN11 on unknown codes.
    pub fn set_variant_code(&mut self, code: u32) {
        self.set_variant(PnVariant::from_code_or_default(code));
    }

    pub fn variant(&self) -> PnVariant {
        self.register.variant()
    }

    /// Bits written since the last reset.
    pub fn bits_transmitted(&self) -> u64 {
        self.bits_transmitted
    }
}

impl Default for PatternGenerator {
    fn default() -> Self {
        Self::new(PnVariant::default())
    }
}
