//! Secret-handling helpers: wiping buffers and comparing without timing leaks.

use subtle::ConstantTimeEq;
use zeroize::Zeroize;

/// Overwrite a sensitive buffer with zeroes.
///
/// Best effort: the write is not optimised away, but copies made
/// elsewhere (reallocations, swapped pages) are out of reach.
pub fn secure_zero<T: Zeroize + ?Sized>(buffer: &mut T) {
    buffer.zeroize();
}

/// Branch-free equality for secret material such as verifiers.
///
/// Slices of different length compare unequal; the length itself is
/// not treated as secret.
pub fn constant_time_equals(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}
