//! PN Sequence Variants — ITU-T O.150 register widths and feedback taps
//!
//! Each variant defines how an 8-bit feedback byte is derived from the
//! current register value. The register advances one byte (8 bit
//! positions) per step.
//!
//! | Variant | Width | Mask       | Tap A        | Tap B                |
//! |---------|-------|------------|--------------|----------------------|
//! | PN11    | 11    | `0x7FF`    | `reg & 0xFF` | `(reg & 0x3FC) >> 2` |
//! | PN15    | 15    | `0x7FFF`   | `reg & 0xFF` | `(reg & 0x1FE) >> 1` |
//! | PN23    | 23    | `0x7FFFFF` | `reg & 0xFF` | `(reg & 0x1FE0) >> 5`|
//!
//! The feedback byte is `tapA ^ tapB`.
//!
//! ## Example
//!
//! ```rust
//! use pnbert_core::variant::PnVariant;
//!
//! let pn = PnVariant::Pn15;
//! assert_eq!(pn.width(), 15);
//! assert_eq!(pn.mask(), 0x7FFF);
//! assert_eq!(pn.period(), 32_767);
//!
//! // Unsupported codes resolve to PN11
//! assert_eq!(PnVariant::from_code_or_default(9), PnVariant::Pn11);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{BertError, BertResult};

/// Low tap window, shared by every variant.
const TAP_A_MASK: u32 = 0xFF;

/// PRBS polynomial family member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PnVariant {
    /// 2^11 - 1 test pattern
    Pn11 = 11,
    /// 2^15 - 1 test pattern
    Pn15 = 15,
    /// 2^23 - 1 test pattern
    Pn23 = 23,
}

impl PnVariant {
    /// All supported variants, shortest period first.
    pub const ALL: [PnVariant; 3] = [PnVariant::Pn11, PnVariant::Pn15, PnVariant::Pn23];

    /// Create a variant from its raw code (the register width).
    pub fn from_code(code: u32) -> BertResult<Self> {
        match code {
            11 => Ok(Self::Pn11),
            15 => Ok(Self::Pn15),
            23 => Ok(Self::Pn23),
            _ => Err(BertError::InvalidVariant(code)),
        }
    }

    /// Create a variant from its raw code, falling back to PN11.
    pub fn from_code_or_default(code: u32) -> Self {
        Self::from_code(code).unwrap_or_else(|e| {
            tracing::warn!("{}, defaulting to {}", e, Self::default());
            Self::default()
        })
    }

    /// Raw code (equal to the register width).
    pub fn code(&self) -> u32 {
        *self as u32
    }

    /// Register width in bits.
    pub fn width(&self) -> u32 {
        *self as u32
    }

    /// `(1 << width) - 1`
    pub fn mask(&self) -> u32 {
        (1u32 << self.width()) - 1
    }

    /// Sequence period in bits (2^width - 1).
    pub fn period(&self) -> u64 {
        (1u64 << self.width()) - 1
    }

    /// High tap window and its alignment shift.
    #[inline]
    fn tap_b(&self) -> (u32, u32) {
        match self {
            Self::Pn11 => (0x3FC, 2),
            Self::Pn15 => (0x1FE, 1),
            Self::Pn23 => (0x1FE0, 5),
        }
    }

    /// Feedback byte for an already-masked register value.
    #[inline]
    pub fn feedback(&self, masked: u32) -> u8 {
        let (tap_b_mask, tap_b_shift) = self.tap_b();
        let tap_a = masked & TAP_A_MASK;
        let tap_b = (masked & tap_b_mask) >> tap_b_shift;
        (tap_a ^ tap_b) as u8
    }
}

impl fmt::Display for PnVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PN{}", self.width())
    }
}

impl Default for PnVariant {
    fn default() -> Self {
        Self::Pn11
    }
}

impl FromStr for PnVariant {
    type Err = BertError;

    /// Accepts "PN11", "pn11" or a bare width such as "11".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let digits = s
            .strip_prefix("PN")
            .or_else(|| s.strip_prefix("pn"))
            .or_else(|| s.strip_prefix("Pn"))
            .unwrap_or(s);
        let code = digits
            .parse::<u32>()
            .map_err(|_| BertError::Config(format!("unknown PN variant '{}'", s)))?;
        Self::from_code(code)
    }
}

impl TryFrom<u32> for PnVariant {
    type Error = BertError;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        Self::from_code(code)
    }
}
