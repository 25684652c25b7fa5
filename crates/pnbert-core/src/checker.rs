//! Pattern Checker — synchronize to a received PN stream and count bit errors
//!
//! Consumes received bytes, acquires lock on the expected O.150 sequence
//! and, once locked, counts bit errors and loss-of-sync events.
//!
//! ## Synchronization
//!
//! ```text
//!              11 consecutive byte matches
//!   UNSYNCED ──────────────────────────────▶ SYNCED
//!      ▲                                        │
//!      └────── > 20 errors in one window ───────┘
//! ```
//!
//! While unsynced the register is fed with the received bytes, so the
//! prediction tracks the incoming stream and acquisition is retried on
//! every byte. Once synced the register free-runs on its own prediction,
//! like the generator, and every differing bit counts as an error.
//!
//! ## Example
//!
//! ```rust
//! use pnbert_core::checker::PatternChecker;
//! use pnbert_core::generator::PatternGenerator;
//! use pnbert_core::variant::PnVariant;
//!
//! let mut gen = PatternGenerator::new(PnVariant::Pn11);
//! let mut buf = [0u8; 100];
//! gen.fill(&mut buf);
//!
//! let mut checker = PatternChecker::new(PnVariant::Pn11);
//! checker.check(&buf);
//! assert!(checker.is_synced());
//! assert_eq!(checker.total_bit_errors(), 0);
//! assert_eq!(checker.bits_received(), 800);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{checked_len, BertResult};
use crate::register::{to_wire, ShiftRegister};
use crate::variant::PnVariant;

/// Checker lock state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    Unsynced,
    Synced,
}

impl Default for SyncState {
    fn default() -> Self {
        SyncState::Unsynced
    }
}

/// How the window error count behaves at a window boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowPolicy {
    /// Clear the count at every boundary, on sync loss and while unsynced.
    Reset,
    /// Never clear the count except on `reset_state`. Matches legacy
    /// O.150 checkers bit for bit, including the eventual spurious sync
    /// loss on long runs at a low error rate.
    Cumulative,
}

impl Default for WindowPolicy {
    fn default() -> Self {
        WindowPolicy::Reset
    }
}

/// Acquisition and sync-loss thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckerConfig {
    /// Lock once the consecutive match count exceeds this value.
    pub lock_threshold: u32,
    /// Window boundary once the window byte count exceeds this value.
    pub window_length: u32,
    /// Declare sync loss once window errors exceed this value.
    pub window_error_limit: u64,
    /// Window error accounting.
    pub window_policy: WindowPolicy,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            lock_threshold: 10,
            window_length: 10,
            window_error_limit: 20,
            window_policy: WindowPolicy::default(),
        }
    }
}

/// Point-in-time copy of the checker counters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CheckerStats {
    pub variant: PnVariant,
    pub synced: bool,
    pub bits_received: u64,
    pub bits_received_in_sync: u64,
    pub total_bit_errors: u64,
    pub sync_loss_count: u64,
}

impl CheckerStats {
    /// Bit error rate over the bits checked while in sync.
    pub fn ber(&self) -> f64 {
        if self.bits_received_in_sync == 0 {
            return 0.0;
        }
        self.total_bit_errors as f64 / self.bits_received_in_sync as f64
    }

    /// One-line report.
    pub fn summary(&self) -> String {
        format!(
            "{}: bits in {} | synced bits {} | errors {} | BER {:.3e} | synced {} | sync losses {}",
            self.variant,
            self.bits_received,
            self.bits_received_in_sync,
            self.total_bit_errors,
            self.ber(),
            if self.synced { "yes" } else { "no" },
            self.sync_loss_count,
        )
    }
}

impl fmt::Display for CheckerStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

/// Synchronizing PRBS checker.
#[derive(Debug, Clone)]
pub struct PatternChecker {
    config: CheckerConfig,
    register: ShiftRegister,
    state: SyncState,
    bits_received: u64,
    bits_received_in_sync: u64,
    total_bit_errors: u64,
    sync_loss_count: u64,
    /// Consecutive matching bytes, only meaningful while unsynced.
    sync_weight: u32,
    /// Window progress, only meaningful while synced.
    window_bytes: u32,
    window_errors: u64,
}

impl PatternChecker {
    /// Create an unsynced checker with default thresholds.
    pub fn new(variant: PnVariant) -> Self {
        Self::with_config(variant, CheckerConfig::default())
    }

    /// Create an unsynced checker with explicit thresholds.
    pub fn with_config(variant: PnVariant, config: CheckerConfig) -> Self {
        Self {
            config,
            register: ShiftRegister::new(variant),
            state: SyncState::Unsynced,
            bits_received: 0,
            bits_received_in_sync: 0,
            total_bit_errors: 0,
            sync_loss_count: 0,
            sync_weight: 0,
            window_bytes: 0,
            window_errors: 0,
        }
    }

    pub fn builder() -> PatternCheckerBuilder {
        PatternCheckerBuilder::default()
    }

    /// Check every byte of `buffer`.
    pub fn check(&mut self, buffer: &[u8]) {
        for &byte in buffer {
            self.check_byte(byte);
        }
    }

    /// Check the first `length` bytes of `buffer`.
    ///
    /// Fails without consuming anything if `length` exceeds the buffer.
    pub fn check_len(&mut self, buffer: &[u8], length: usize) -> BertResult<()> {
        let length = checked_len(length, buffer.len())?;
        self.check(&buffer[..length]);
        Ok(())
    }

    #[inline]
    fn check_byte(&mut self, byte: u8) {
        self.bits_received = self.bits_received.wrapping_add(8);

        let predicted = self.register.predict();
        let data = to_wire(byte);

        match self.state {
            SyncState::Unsynced => {
                self.window_bytes = 0;
                if self.config.window_policy == WindowPolicy::Reset {
                    self.window_errors = 0;
                }

                if data == predicted {
                    self.sync_weight = self.sync_weight.saturating_add(1);
                    if self.sync_weight > self.config.lock_threshold {
                        self.state = SyncState::Synced;
                        self.sync_weight = 0;
                        tracing::info!(
                            variant = %self.register.variant(),
                            bits_received = self.bits_received,
                            "PN sync acquired"
                        );
                    }
                } else {
                    self.sync_weight = 0;
                }

                // Track the incoming stream directly
                self.register.advance(data);
            }
            SyncState::Synced => {
                self.bits_received_in_sync = self.bits_received_in_sync.wrapping_add(8);

                let errors = (data ^ predicted).count_ones() as u64;
                self.total_bit_errors = self.total_bit_errors.wrapping_add(errors);
                self.window_errors = self.window_errors.wrapping_add(errors);

                if self.window_bytes > self.config.window_length {
                    self.window_bytes = 0;
                    let window_errors = self.window_errors;
                    if self.config.window_policy == WindowPolicy::Reset {
                        self.window_errors = 0;
                    }
                    if window_errors > self.config.window_error_limit {
                        self.state = SyncState::Unsynced;
                        self.sync_loss_count = self.sync_loss_count.wrapping_add(1);
                        self.sync_weight = 0;
                        tracing::warn!(
                            variant = %self.register.variant(),
                            window_errors,
                            sync_losses = self.sync_loss_count,
                            "PN sync lost"
                        );
                    }
                } else {
                    self.window_bytes = self.window_bytes.saturating_add(1);
                }

                self.register.advance(predicted);
            }
        }
    }

    /// Return to the initial unsynced state with all counters cleared.
    pub fn reset_state(&mut self) {
        self.register.reseed();
        self.state = SyncState::Unsynced;
        self.bits_received = 0;
        self.bits_received_in_sync = 0;
        self.total_bit_errors = 0;
        self.sync_loss_count = 0;
        self.sync_weight = 0;
        self.window_bytes = 0;
        self.window_errors = 0;
        tracing::debug!(variant = %self.variant(), "checker reset");
    }

    /// Select a variant. State and counters are left as they are.
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

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    pub fn sync_state(&self) -> SyncState {
        self.state
    }

    pub fn is_synced(&self) -> bool {
        self.state == SyncState::Synced
    }

    /// All bits consumed, in either state.
    pub fn bits_received(&self) -> u64 {
        self.bits_received
    }

    /// Bits compared against the prediction while synced.
    pub fn bits_received_in_sync(&self) -> u64 {
        self.bits_received_in_sync
    }

    pub fn total_bit_errors(&self) -> u64 {
        self.total_bit_errors
    }

    pub fn sync_loss_count(&self) -> u64 {
        self.sync_loss_count
    }

    pub fn stats(&self) -> CheckerStats {
        CheckerStats {
            variant: self.variant(),
            synced: self.is_synced(),
            bits_received: self.bits_received,
            bits_received_in_sync: self.bits_received_in_sync,
            total_bit_errors: self.total_bit_errors,
            sync_loss_count: self.sync_loss_count,
        }
    }
}

impl Default for PatternChecker {
    fn default() -> Self {
        Self::new(PnVariant::default())
    }
}

/// Builder for PatternChecker
#[derive(Default)]
pub struct PatternCheckerBuilder {
    variant: PnVariant,
    config: CheckerConfig,
}

impl PatternCheckerBuilder {
    pub fn variant(mut self, variant: PnVariant) -> Self {
        self.variant = variant;
        self
    }

    /// Variant by raw code; unknown codes resolve to PN11.
    pub fn variant_code(mut self, code: u32) -> Self {
        self.variant = PnVariant::from_code_or_default(code);
        self
    }

    pub fn lock_threshold(mut self, matches: u32) -> Self {
        self.config.lock_threshold = matches;
        self
    }

    pub fn window_length(mut self, bytes: u32) -> Self {
        self.config.window_length = bytes;
        self
    }

    pub fn window_error_limit(mut self, errors: u64) -> Self {
        self.config.window_error_limit = errors;
        self
    }

    pub fn window_policy(mut self, policy: WindowPolicy) -> Self {
        self.config.window_policy = policy;
        self
    }

    pub fn config(mut self, config: CheckerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> PatternChecker {
        PatternChecker::with_config(self.variant, self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BertError;
    use crate::generator::PatternGenerator;
    use rand::{Rng, RngCore, SeedableRng};

    /// Index of the byte on which a fresh PN11/PN15 checker locks.
    const LOCK_INDEX: usize = 12;

    fn stream(variant: PnVariant, len: usize) -> Vec<u8> {
        PatternGenerator::new(variant).generate(len)
    }

    #[test]
    fn test_pn11_100_bytes() {
        let data = stream(PnVariant::Pn11, 100);
        let mut checker = PatternChecker::new(PnVariant::Pn11);
        checker.check(&data);
        assert!(checker.is_synced());
        assert_eq!(checker.total_bit_errors(), 0);
        assert_eq!(checker.bits_received(), 800);
        assert_eq!(checker.bits_received_in_sync(), (100 - LOCK_INDEX as u64 - 1) * 8);
        assert_eq!(checker.sync_loss_count(), 0);
    }

    #[test]
    fn test_lock_point() {
        for variant in [PnVariant::Pn11, PnVariant::Pn15] {
            let data = stream(variant, 64);
            let mut checker = PatternChecker::new(variant);
            checker.check(&data[..LOCK_INDEX]);
            assert!(!checker.is_synced(), "{variant} locked early");
            checker.check(&data[LOCK_INDEX..=LOCK_INDEX]);
            assert!(checker.is_synced(), "{variant} did not lock");
        }
    }

    #[test]
    fn test_round_trip_all_variants() {
        for variant in PnVariant::ALL {
            let data = stream(variant, 20_000);
            let mut checker = PatternChecker::new(variant);
            checker.check(&data[..14]);
            assert!(checker.is_synced(), "{variant} not locked after 14 bytes");
            checker.check(&data[14..]);
            assert!(checker.is_synced());
            assert_eq!(checker.total_bit_errors(), 0);
            assert_eq!(checker.sync_loss_count(), 0);
            assert_eq!(checker.bits_received(), 160_000);
            assert!(checker.bits_received_in_sync() >= 160_000 - 14 * 8);
        }
    }

    #[test]
    fn test_chunked_matches_one_shot() {
        let mut data = stream(PnVariant::Pn23, 5000);
        data[1000] ^= 0x10;
        data[3000] ^= 0xFF;

        let mut one_shot = PatternChecker::new(PnVariant::Pn23);
        one_shot.check(&data);

        let mut rng = rand::rngs::StdRng::seed_from_u64(0x0150);
        let mut chunked = PatternChecker::new(PnVariant::Pn23);
        let mut offset = 0;
        while offset < data.len() {
            let n = rng.gen_range(0..=97).min(data.len() - offset);
            chunked.check(&data[offset..offset + n]);
            offset += n;
        }
        assert_eq!(one_shot.stats(), chunked.stats());
        assert_eq!(chunked.total_bit_errors(), 9);
    }

    #[test]
    fn test_single_bit_error() {
        let mut data = stream(PnVariant::Pn11, 200);
        data[50] ^= 0x04;
        let mut checker = PatternChecker::new(PnVariant::Pn11);
        checker.check(&data[..50]);
        assert!(checker.is_synced());
        assert_eq!(checker.total_bit_errors(), 0);

        checker.check(&data[50..]);
        assert_eq!(checker.total_bit_errors(), 1);
        assert!(checker.is_synced());
        assert_eq!(checker.sync_loss_count(), 0);
    }

    #[test]
    fn test_sync_loss_at_window_boundary() {
        let mut data = stream(PnVariant::Pn11, 200);
        for b in &mut data[LOCK_INDEX + 1..] {
            *b = !*b;
        }
        let mut checker = PatternChecker::new(PnVariant::Pn11);
        checker.check(&data[..=LOCK_INDEX]);
        assert!(checker.is_synced());

        // First window boundary falls on the 12th synced byte
        checker.check(&data[LOCK_INDEX + 1..LOCK_INDEX + 12]);
        assert!(checker.is_synced());
        assert_eq!(checker.sync_loss_count(), 0);
        assert_eq!(checker.total_bit_errors(), 88);

        checker.check(&data[LOCK_INDEX + 12..LOCK_INDEX + 13]);
        assert!(!checker.is_synced());
        assert_eq!(checker.sync_loss_count(), 1);
        assert_eq!(checker.total_bit_errors(), 96);

        // An inverted stream never reacquires
        checker.check(&data[LOCK_INDEX + 13..]);
        assert!(!checker.is_synced());
        assert_eq!(checker.sync_loss_count(), 1);
        assert_eq!(checker.total_bit_errors(), 96);
    }

    #[test]
    fn test_error_limit_is_exclusive() {
        let run = |errors_in_window: u32| {
            let mut data = stream(PnVariant::Pn11, 100);
            let mut left = errors_in_window;
            for b in &mut data[LOCK_INDEX + 1..LOCK_INDEX + 13] {
                let n = left.min(8);
                *b ^= (0xFFu16 >> (8 - n)) as u8;
                left -= n;
            }
            let mut checker = PatternChecker::new(PnVariant::Pn11);
            checker.check(&data);
            checker
        };

        let at_limit = run(20);
        assert_eq!(at_limit.total_bit_errors(), 20);
        assert!(at_limit.is_synced());
        assert_eq!(at_limit.sync_loss_count(), 0);

        let over_limit = run(21);
        assert_eq!(over_limit.sync_loss_count(), 1);
    }

    #[test]
    fn test_random_bytes_never_lock() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(0xBE27);
        let mut checker = PatternChecker::new(PnVariant::Pn23);
        let mut buf = [0u8; 256];
        for _ in 0..256 {
            rng.fill_bytes(&mut buf);
            checker.check(&buf);
            assert!(!checker.is_synced());
        }
        assert_eq!(checker.bits_received(), 256 * 256 * 8);
        assert_eq!(checker.bits_received_in_sync(), 0);
        assert_eq!(checker.total_bit_errors(), 0);
    }

    #[test]
    fn test_wrong_variant_never_locks() {
        let data = stream(PnVariant::Pn15, 8192);
        let mut checker = PatternChecker::new(PnVariant::Pn11);
        checker.check(&data);
        assert!(!checker.is_synced());

        let data = stream(PnVariant::Pn11, 8192);
        let mut checker = PatternChecker::new(PnVariant::Pn23);
        checker.check(&data);
        assert!(!checker.is_synced());
    }

    #[test]
    fn test_reacquires_after_slip() {
        // Drop a byte mid-stream: errors pile up, sync is lost, then regained
        let mut data = stream(PnVariant::Pn15, 2000);
        data.remove(500);
        let mut checker = PatternChecker::new(PnVariant::Pn15);
        checker.check(&data);
        assert_eq!(checker.sync_loss_count(), 1);
        assert!(checker.is_synced());
    }

    /// One flipped bit at the start of every window for 21 windows.
    fn low_rate_stream() -> Vec<u8> {
        let mut data = stream(PnVariant::Pn11, 288);
        for w in 0..21 {
            data[LOCK_INDEX + 1 + 12 * w] ^= 0x01;
        }
        data
    }

    #[test]
    fn test_reset_policy_tolerates_low_rate() {
        let data = low_rate_stream();
        let mut checker = PatternChecker::new(PnVariant::Pn11);
        checker.check(&data);
        assert!(checker.is_synced());
        assert_eq!(checker.total_bit_errors(), 21);
        assert_eq!(checker.sync_loss_count(), 0);
    }

    #[test]
    fn test_cumulative_policy_accumulates() {
        let data = low_rate_stream();
        let mut checker = PatternChecker::builder()
            .variant(PnVariant::Pn11)
            .window_policy(WindowPolicy::Cumulative)
            .build();

        // 21st window boundary is byte 264
        checker.check(&data[..264]);
        assert!(checker.is_synced());
        checker.check(&data[264..265]);
        assert!(!checker.is_synced());
        assert_eq!(checker.sync_loss_count(), 1);

        // Clean data relocks at byte 275, then trips again at the next boundary
        checker.check(&data[265..287]);
        assert!(checker.is_synced());
        checker.check(&data[287..288]);
        assert!(!checker.is_synced());
        assert_eq!(checker.sync_loss_count(), 2);
        assert_eq!(checker.total_bit_errors(), 21);
    }

    #[test]
    fn test_custom_lock_threshold() {
        let data = stream(PnVariant::Pn11, 16);
        let mut checker = PatternChecker::builder().lock_threshold(3).build();
        checker.check(&data[..5]);
        assert!(!checker.is_synced());
        checker.check(&data[5..6]);
        assert!(checker.is_synced());
    }

    #[test]
    fn test_check_len() {
        let data = stream(PnVariant::Pn11, 100);
        let mut checker = PatternChecker::new(PnVariant::Pn11);
        checker.check_len(&data, 0).unwrap();
        assert_eq!(checker.bits_received(), 0);

        let err = checker.check_len(&data, 101).unwrap_err();
        assert_eq!(err, BertError::BufferTooShort { expected: 101, actual: 100 });
        assert_eq!(checker.bits_received(), 0);

        checker.check_len(&data, 100).unwrap();
        assert!(checker.is_synced());
        assert_eq!(checker.bits_received(), 800);
    }

    #[test]
    fn test_reset_state_is_idempotent() {
        let data = stream(PnVariant::Pn11, 300);
        let mut reference = PatternChecker::new(PnVariant::Pn11);
        reference.check(&data);

        let mut checker = PatternChecker::new(PnVariant::Pn11);
        let mut noisy = data.clone();
        for b in noisy.iter_mut().skip(20) {
            *b ^= 0x81;
        }
        checker.check(&noisy);
        assert!(checker.total_bit_errors() > 0);

        checker.reset_state();
        checker.reset_state();
        assert!(!checker.is_synced());
        assert_eq!(checker.sync_state(), SyncState::Unsynced);
        assert_eq!(checker.bits_received(), 0);
        assert_eq!(checker.bits_received_in_sync(), 0);
        assert_eq!(checker.total_bit_errors(), 0);
        assert_eq!(checker.sync_loss_count(), 0);

        checker.check(&data);
        assert_eq!(checker.stats(), reference.stats());
    }

    #[test]
    fn test_set_variant_code_fallback() {
        let mut checker = PatternChecker::new(PnVariant::Pn23);
        checker.set_variant_code(42);
        assert_eq!(checker.variant(), PnVariant::Pn11);
        checker.set_variant(PnVariant::Pn15);
        assert_eq!(checker.variant(), PnVariant::Pn15);

        let built = PatternChecker::builder().variant_code(3).build();
        assert_eq!(built.variant(), PnVariant::Pn11);
    }

    #[test]
    fn test_stats_summary() {
        let mut data = stream(PnVariant::Pn11, 1013);
        data[500] ^= 0x01;
        let mut checker = PatternChecker::new(PnVariant::Pn11);
        checker.check(&data);

        let stats = checker.stats();
        assert!(stats.synced);
        assert_eq!(stats.bits_received_in_sync, 8000);
        assert!((stats.ber() - 1.0 / 8000.0).abs() < 1e-12);

        let s = stats.summary();
        assert!(s.starts_with("PN11:"));
        assert!(s.contains("errors 1"));
        assert!(s.contains("synced yes"));
        assert_eq!(s, stats.to_string());
    }

    #[test]
    fn test_stats_ber_empty() {
        let checker = PatternChecker::default();
        assert_eq!(checker.stats().ber(), 0.0);
        assert!(checker.stats().summary().contains("synced no"));
    }

    #[test]
    fn test_config_serde_defaults() {
        let config: CheckerConfig = serde_yaml::from_str("window_policy: cumulative").unwrap();
        assert_eq!(config.window_policy, WindowPolicy::Cumulative);
        assert_eq!(config.lock_threshold, 10);
        assert_eq!(config.window_length, 10);
        assert_eq!(config.window_error_limit, 20);
    }
}
