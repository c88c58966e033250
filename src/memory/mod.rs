/*!
 * Memory Module
 * Regions that synchronized words bind into
 */

pub mod region;

pub use region::{HeapRegion, RawRegion, RegionView, SharedRegion, SubRegion, WORD_ALIGN, WORD_SIZE};
