//! # PN BERT Core
//!
//! Pseudorandom binary sequence engine for bit error rate testing of a
//! digital link, using the ITU-T O.150 PN11, PN15 and PN23 patterns.
//!
//! - **Generator**: fills outgoing byte buffers with a continuous PN stream
//! - **Checker**: locks onto a received PN stream and counts bit errors
//!   and loss-of-sync events
//!
//! Both sides share the same byte-stepped register and tap table. The
//! transport that owns the buffers, talks to hardware and schedules
//! transfers lives outside this crate.
//!
//! ## Signal Flow
//!
//! ```text
//! TX: PatternGenerator::fill(buf) → transport → channel
//! RX: channel → transport → PatternChecker::check(buf) → counters
//! ```
//!
//! ## Example
//!
//! ```rust
//! use pnbert_core::prelude::*;
//!
//! let mut gen = PatternGenerator::new(PnVariant::Pn23);
//! let mut checker = PatternChecker::new(PnVariant::Pn23);
//!
//! let mut buf = vec![0u8; 2048];
//! for _ in 0..10 {
//!     gen.fill(&mut buf);
//!     checker.check(&buf);
//! }
//!
//! assert!(checker.is_synced());
//! assert_eq!(checker.total_bit_errors(), 0);
//! println!("{}", checker.stats());
//! ```

pub mod checker;
pub mod config;
pub mod error;
pub mod generator;
pub mod logging;
pub mod register;
pub mod variant;

pub use checker::{CheckerConfig, CheckerStats, PatternChecker, SyncState, WindowPolicy};
pub use config::BertConfig;
pub use error::{BertError, BertResult};
pub use generator::PatternGenerator;
pub use variant::PnVariant;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::checker::{
        CheckerConfig, CheckerStats, PatternChecker, PatternCheckerBuilder, SyncState,
        WindowPolicy,
    };
    pub use crate::config::BertConfig;
    pub use crate::error::{BertError, BertResult};
    pub use crate::generator::PatternGenerator;
    pub use crate::variant::PnVariant;
}
