/*!
 * Compiler Optimization Hints
 * Branch hints for the wait/wake hot paths
 */

/// Hint that this branch is likely to be taken
///
/// On nightly (feature `nightly`) this lowers to `llvm.expect`; on stable it
/// returns the value unchanged and only documents the hot path.
#[inline(always)]
#[must_use]
pub fn likely(b: bool) -> bool {
    #[cfg(feature = "nightly")]
    {
        unsafe { std::intrinsics::likely(b) }
    }
    #[cfg(not(feature = "nightly"))]
    {
        b
    }
}

/// Hint that this branch is unlikely to be taken (error and timeout paths)
#[inline(always)]
#[must_use]
pub fn unlikely(b: bool) -> bool {
    #[cfg(feature = "nightly")]
    {
        unsafe { std::intrinsics::unlikely(b) }
    }
    #[cfg(not(feature = "nightly"))]
    {
        b
    }
}
