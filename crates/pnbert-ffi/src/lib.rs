//! # pnbert FFI - C Bindings for the PN BERT engine
//!
//! C-compatible surface for transports written in C, C++ or any host
//! language with a C FFI. The transport owns the buffers and hands them
//! in with a length; the engine never allocates or retains them.
//!
//! ## Building
//!
//! ```bash
//! cargo build --release -p pnbert-ffi
//! ```
//!
//! This generates `libpnbert.so` and `libpnbert.a`.
//!
//! ## Usage from C
//!
//! ```c
//! #include <pnbert.h>
//!
//! int main() {
//!     pnbert_generator_t* tx = pnbert_generator_new(23);
//!     pnbert_checker_t* rx = pnbert_checker_new(23);
//!     unsigned char buf[2048];
//!
//!     for (int i = 0; i < 10; i++) {
//!         pnbert_generator_fill(tx, buf, sizeof(buf));
//!         pnbert_checker_check(rx, buf, sizeof(buf));
//!     }
//!
//!     printf("synced=%d errors=%llu\n",
//!            pnbert_checker_is_synced(rx),
//!            pnbert_checker_total_bit_errors(rx));
//!
//!     pnbert_checker_free(rx);
//!     pnbert_generator_free(tx);
//! }
//! ```
//!
//! Variant codes are register widths: 11, 15 or 23. Any other code selects PN11.

use std::ffi::c_char;
use std::slice;

use pnbert_core::{PatternChecker, PatternGenerator, PnVariant};

// =============================================================================
// Types
// =============================================================================

/// Status codes returned by pnbert functions
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PnbertError {
    /// Success (no error)
    Ok = 0,
    /// Null handle, or null buffer with a non-zero length
    NullPointer = 1,
    /// Invalid size
    InvalidSize = 2,
}

/// Opaque generator handle
pub struct PnbertGenerator {
    inner: PatternGenerator,
}

/// Opaque checker handle
pub struct PnbertChecker {
    inner: PatternChecker,
}

/// Get library version string
///
/// Returns a null-terminated string like "0.1.0"
#[no_mangle]
pub extern "C" fn pnbert_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr() as *const c_char
}

// =============================================================================
// Generator
// =============================================================================

/// Create a generator at the start of its sequence
#[no_mangle]
pub extern "C" fn pnbert_generator_new(variant: u32) -> *mut PnbertGenerator {
    let variant = PnVariant::from_code_or_default(variant);
    tracing::debug!(%variant, "ffi generator created");
    Box::into_raw(Box::new(PnbertGenerator {
        inner: PatternGenerator::new(variant),
    }))
}

/// Free a generator
///
/// # Safety
/// `gen` must be null or a pointer returned by `pnbert_generator_new`
#[no_mangle]
pub unsafe extern "C" fn pnbert_generator_free(gen: *mut PnbertGenerator) {
    if !gen.is_null() {
        drop(Box::from_raw(gen));
    }
}

/// Fill `len` bytes of `buffer` with the next part of the sequence
///
/// # Safety
/// - `gen` must be valid
/// - `buffer` must point to at least `len` writable bytes
#[no_mangle]
pub unsafe extern "C" fn pnbert_generator_fill(
    gen: *mut PnbertGenerator,
    buffer: *mut u8,
    len: usize,
) -> PnbertError {
    if gen.is_null() {
        return PnbertError::NullPointer;
    }
    if len == 0 {
        return PnbertError::Ok;
    }
    if buffer.is_null() {
        return PnbertError::NullPointer;
    }

    let buf = slice::from_raw_parts_mut(buffer, len);
    (*gen).inner.fill(buf);
    PnbertError::Ok
}

/// Rewind to the fixed seed and clear the counter
///
/// # Safety
/// `gen` must be null or valid
#[no_mangle]
pub unsafe extern "C" fn pnbert_generator_reset(gen: *mut PnbertGenerator) -> PnbertError {
    if gen.is_null() {
        return PnbertError::NullPointer;
    }
    (*gen).inner.reset();
    PnbertError::Ok
}

/// Select a variant by code. Does not reset.
///
/// # Safety
/// `gen` must be null or valid
#[no_mangle]
pub unsafe extern "C" fn pnbert_generator_set_variant(
    gen: *mut PnbertGenerator,
    variant: u32,
) -> PnbertError {
    if gen.is_null() {
        return PnbertError::NullPointer;
    }
    (*gen).inner.set_variant_code(variant);
    PnbertError::Ok
}

/// Current variant code, or 0 for a null handle
///
/// # Safety
/// `gen` must be null or valid
#[no_mangle]
pub unsafe extern "C" fn pnbert_generator_variant(gen: *const PnbertGenerator) -> u32 {
    if gen.is_null() {
        return 0;
    }
    (*gen).inner.variant().code()
}

/// # Safety
/// `gen` must be null or valid
#[no_mangle]
pub unsafe extern "C" fn pnbert_generator_bits_transmitted(gen: *const PnbertGenerator) -> u64 {
    if gen.is_null() {
        return 0;
    }
    (*gen).inner.bits_transmitted()
}

// =============================================================================
// Checker
// =============================================================================

/// Create an unsynced checker with default thresholds
#[no_mangle]
pub extern "C" fn pnbert_checker_new(variant: u32) -> *mut PnbertChecker {
    let variant = PnVariant::from_code_or_default(variant);
    tracing::debug!(%variant, "ffi checker created");
    Box::into_raw(Box::new(PnbertChecker {
        inner: PatternChecker::new(variant),
    }))
}

/// Free a checker
///
/// # Safety
/// `checker` must be null or a pointer returned by `pnbert_checker_new`
#[no_mangle]
pub unsafe extern "C" fn pnbert_checker_free(checker: *mut PnbertChecker) {
    if !checker.is_null() {
        drop(Box::from_raw(checker));
    }
}

/// Check `len` received bytes
///
/// # Safety
/// - `checker` must be valid
/// - `buffer` must point to at least `len` readable bytes
#[no_mangle]
pub unsafe extern "C" fn pnbert_checker_check(
    checker: *mut PnbertChecker,
    buffer: *const u8,
    len: usize,
) -> PnbertError {
    if checker.is_null() {
        return PnbertError::NullPointer;
    }
    if len == 0 {
        return PnbertError::Ok;
    }
    if buffer.is_null() {
        return PnbertError::NullPointer;
    }

    let buf = slice::from_raw_parts(buffer, len);
    (*checker).inner.check(buf);
    PnbertError::Ok
}

/// Return to the unsynced state with all counters cleared
///
/// # Safety
/// `checker` must be null or valid
#[no_mangle]
pub unsafe extern "C" fn pnbert_checker_reset(checker: *mut PnbertChecker) -> PnbertError {
    if checker.is_null() {
        return PnbertError::NullPointer;
    }
    (*checker).inner.reset_state();
    PnbertError::Ok
}

/// Select a variant by code. Does not reset.
///
/// # Safety
/// `checker` must be null or valid
#[no_mangle]
pub unsafe extern "C" fn pnbert_checker_set_variant(
    checker: *mut PnbertChecker,
    variant: u32,
) -> PnbertError {
    if checker.is_null() {
        return PnbertError::NullPointer;
    }
    (*checker).inner.set_variant_code(variant);
    PnbertError::Ok
}

/// Current variant code, or 0 for a null handle
///
/// # Safety
/// `checker` must be null or valid
#[no_mangle]
pub unsafe extern "C" fn pnbert_checker_variant(checker: *const PnbertChecker) -> u32 {
    if checker.is_null() {
        return 0;
    }
    (*checker).inner.variant().code()
}

/// # Safety
/// `checker` must be null or valid
#[no_mangle]
pub unsafe extern "C" fn pnbert_checker_is_synced(checker: *const PnbertChecker) -> bool {
    if checker.is_null() {
        return false;
    }
    (*checker).inner.is_synced()
}

/// # Safety
/// `checker` must be null or valid
#[no_mangle]
pub unsafe extern "C" fn pnbert_checker_bits_received(checker: *const PnbertChecker) -> u64 {
    if checker.is_null() {
        return 0;
    }
    (*checker).inner.bits_received()
}

/// # Safety
/// `checker` must be null or valid
#[no_mangle]
pub unsafe extern "C" fn pnbert_checker_bits_received_in_sync(
    checker: *const PnbertChecker,
) -> u64 {
    if checker.is_null() {
        return 0;
    }
    (*checker).inner.bits_received_in_sync()
}

/// # Safety
/// `checker` must be null or valid
#[no_mangle]
pub unsafe extern "C" fn pnbert_checker_total_bit_errors(checker: *const PnbertChecker) -> u64 {
    if checker.is_null() {
        return 0;
    }
    (*checker).inner.total_bit_errors()
}

/// # Safety
/// `checker` must be null or valid
#[no_mangle]
pub unsafe extern "C" fn pnbert_checker_sync_loss_count(checker: *const PnbertChecker) -> u64 {
    if checker.is_null() {
        return 0;
    }
    (*checker).inner.sync_loss_count()
}
