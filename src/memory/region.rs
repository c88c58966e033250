/*!
 * Shared Memory Regions
 *
 * Byte ranges that synchronized words bind into. The crate never allocates
 * or maps shared memory for cross-process use; callers bring their own mapping
 * and describe it through [`SharedRegion`].
 *
 * # Ownership
 *
 * Words keep an `Arc<dyn SharedRegion>` for their whole lifetime, so the
 * region outlives every word bound to it. Validation at bind time goes
 * through a short-lived [`RegionView`] borrow that is released before bind
 * returns.
 */

use crate::core::errors::BindError;
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ptr::NonNull;
use std::sync::atomic::AtomicU32;
use std::sync::Arc;

/// Size of a synchronized word in bytes
pub const WORD_SIZE: usize = mem::size_of::<u32>();

/// Required alignment of a synchronized word
pub const WORD_ALIGN: usize = mem::align_of::<AtomicU32>();

/// A memory region that can host synchronized words
///
/// # Safety
///
/// Implementors guarantee that `as_ptr()` is non-null, stays the same for the
/// lifetime of `self`, and is valid for atomic reads and writes of `len()`
/// bytes from any thread (and, for shared mappings, any process) for as long
/// as `self` is alive. The bytes must not be reachable through a plain `&[u8]`
/// or `&mut [u8]` anywhere else while words are bound.
pub unsafe trait SharedRegion: Send + Sync + 'static {
    /// Base address of the region
    fn as_ptr(&self) -> *mut u8;

    /// Length of the region in bytes
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow the region for validation
    ///
    /// The view lives only as long as the borrow of `self`; anything that must
    /// outlive it has to hold its own `Arc` to the region.
    fn view(&self) -> RegionView<'_> {
        RegionView {
            base: self.as_ptr(),
            len: self.len(),
            _region: PhantomData,
        }
    }
}

/// Scoped view of a region's base address and length
#[derive(Debug, Clone, Copy)]
pub struct RegionView<'a> {
    base: *mut u8,
    len: usize,
    _region: PhantomData<&'a ()>,
}

impl RegionView<'_> {
    pub fn base(&self) -> *mut u8 {
        self.base
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Locate the word at `offset`, checking size and alignment
    ///
    /// Size is checked first, so a region that is both too small and
    /// misaligned reports `RegionTooSmall`.
    pub fn word_at(&self, offset: usize) -> Result<NonNull<AtomicU32>, BindError> {
        let too_small = BindError::RegionTooSmall {
            len: self.len,
            offset,
        };
        match offset.checked_add(WORD_SIZE) {
            Some(end) if end <= self.len => {}
            _ => return Err(too_small),
        }

        let address = (self.base as usize).wrapping_add(offset);
        if address % WORD_ALIGN != 0 {
            return Err(BindError::Misaligned { address });
        }

        // In bounds of a non-null region, so the sum cannot wrap to null
        NonNull::new(self.base.wrapping_add(offset).cast::<AtomicU32>()).ok_or(too_small)
    }
}

/// Heap-allocated, zero-initialized region
///
/// Process-local: usable across threads, not across processes. Useful for
/// in-process coordination and tests.
pub struct HeapRegion {
    words: Box<[AtomicU32]>,
    len: usize,
}

impl HeapRegion {
    /// Allocate `len` zeroed bytes with word alignment
    pub fn new(len: usize) -> Self {
        let words = (0..len.div_ceil(WORD_SIZE))
            .map(|_| AtomicU32::new(0))
            .collect();
        Self { words, len }
    }

    /// Allocate room for exactly `count` words
    ///
    /// # Panics
    ///
    /// Panics with a capacity overflow when `count` words exceed the address
    /// space, like `Vec::with_capacity`.
    pub fn with_words(count: usize) -> Self {
        Self::new(count.saturating_mul(WORD_SIZE))
    }
}

impl fmt::Debug for HeapRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeapRegion")
            .field("base", &self.as_ptr())
            .field("len", &self.len)
            .finish()
    }
}

// SAFETY: the boxed atomics never move, are non-null (dangling-but-aligned for
// an empty box, which has len 0), and are only touched through atomics.
unsafe impl SharedRegion for HeapRegion {
    fn as_ptr(&self) -> *mut u8 {
        self.words.as_ptr().cast::<u8>().cast_mut()
    }

    fn len(&self) -> usize {
        self.len
    }
}

/// A sub-range of another region that keeps its parent alive
pub struct SubRegion {
    parent: Arc<dyn SharedRegion>,
    offset: usize,
    len: usize,
}

impl SubRegion {
    /// Carve `len` bytes starting at `offset` out of `parent`
    pub fn new(
        parent: Arc<dyn SharedRegion>,
        offset: usize,
        len: usize,
    ) -> Result<Self, BindError> {
        match offset.checked_add(len) {
            Some(end) if end <= parent.len() => Ok(Self {
                parent,
                offset,
                len,
            }),
            _ => Err(BindError::RegionTooSmall {
                len: parent.len(),
                offset,
            }),
        }
    }

    pub fn parent(&self) -> &Arc<dyn SharedRegion> {
        &self.parent
    }

    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl fmt::Debug for SubRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubRegion")
            .field("base", &self.as_ptr())
            .field("offset", &self.offset)
            .field("len", &self.len)
            .finish()
    }
}

// SAFETY: the range was checked against the parent at construction and the
// parent is retained, so the parent's guarantees carry over.
unsafe impl SharedRegion for SubRegion {
    fn as_ptr(&self) -> *mut u8 {
        self.parent.as_ptr().wrapping_add(self.offset)
    }

    fn len(&self) -> usize {
        self.len
    }
}

/// Caller-described region, kept alive by an arbitrary owner value
///
/// This is the adapter for memory the crate does not allocate: an `mmap` of a
/// POSIX shared memory object, a buffer exported by an embedding runtime, etc.
/// The owner is dropped together with the region.
pub struct RawRegion {
    base: NonNull<u8>,
    len: usize,
    _owner: Box<dyn Any + Send + Sync>,
}

impl RawRegion {
    /// Describe `len` bytes at `base`, owned by `owner`
    ///
    /// # Safety
    ///
    /// `base` must be valid for atomic reads and writes of `len` bytes, from
    /// every thread, for as long as `owner` is alive, and must not move.
    pub unsafe fn new<O>(base: NonNull<u8>, len: usize, owner: O) -> Self
    where
        O: Send + Sync + 'static,
    {
        Self {
            base,
            len,
            _owner: Box::new(owner),
        }
    }
}

impl fmt::Debug for RawRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawRegion")
            .field("base", &self.base)
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

// SAFETY: the constructor's contract makes the memory usable from any thread
// while the owner (held here) is alive.
unsafe impl Send for RawRegion {}
unsafe impl Sync for RawRegion {}

// SAFETY: upheld by the caller of `RawRegion::new`.
unsafe impl SharedRegion for RawRegion {
    fn as_ptr(&self) -> *mut u8 {
        self.base.as_ptr()
    }

    fn len(&self) -> usize {
        self.len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::Ordering;

    #[test]
    fn test_heap_region_layout() {
        let region = HeapRegion::new(10);
        assert_eq!(region.len(), 10);
        assert_eq!(region.as_ptr() as usize % WORD_ALIGN, 0);
        assert_eq!(region.words.len(), 3);
        assert!(region.words.iter().all(|w| w.load(Ordering::Relaxed) == 0));
    }

    #[test]
    #[should_panic(expected = "capacity overflow")]
    fn test_with_words_overflow_panics() {
        HeapRegion::with_words(usize::MAX);
    }

    #[test]
    fn test_view_rejects_short_region() {
        let region = HeapRegion::new(3);
        assert_eq!(
            region.view().word_at(0),
            Err(BindError::RegionTooSmall { len: 3, offset: 0 })
        );
    }

    #[test]
    fn test_view_rejects_offset_past_end() {
        let region = HeapRegion::with_words(2);
        assert!(region.view().word_at(4).is_ok());
        assert!(matches!(
            region.view().word_at(5),
            Err(BindError::RegionTooSmall { .. })
        ));
        assert!(matches!(
            region.view().word_at(usize::MAX),
            Err(BindError::RegionTooSmall { .. })
        ));
    }

    #[test]
    fn test_view_rejects_misaligned_offset() {
        let region = HeapRegion::with_words(2);
        let base = region.as_ptr() as usize;
        assert_eq!(
            region.view().word_at(2),
            Err(BindError::Misaligned { address: base + 2 })
        );
    }

    #[test]
    fn test_sub_region_bounds() {
        let parent: Arc<dyn SharedRegion> = Arc::new(HeapRegion::new(8));
        let sub = SubRegion::new(parent.clone(), 1, 4).unwrap();
        assert_eq!(sub.len(), 4);
        assert_eq!(sub.as_ptr() as usize, parent.as_ptr() as usize + 1);

        assert!(SubRegion::new(parent.clone(), 6, 4).is_err());
        assert!(SubRegion::new(parent, usize::MAX, 1).is_err());
    }

    #[test]
    fn test_raw_region_retains_owner() {
        let backing = Arc::new(HeapRegion::with_words(1));
        let base = NonNull::new(backing.as_ptr()).unwrap();
        let raw = unsafe { RawRegion::new(base, 4, backing.clone()) };
        assert_eq!(Arc::strong_count(&backing), 2);

        drop(raw);
        assert_eq!(Arc::strong_count(&backing), 1);
    }
}
