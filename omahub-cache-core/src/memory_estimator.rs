use serde::Serialize;

/// Size charged for a value whose JSON encoding cannot be produced.
pub const FALLBACK_ENTRY_SIZE: usize = 1024;

/// Estimates the byte footprint of a cached value.
///
/// The estimate is the length of the value's compact JSON encoding. Values
/// that cannot be encoded (for example a map keyed by tuples) are charged
/// [`FALLBACK_ENTRY_SIZE`] bytes instead of failing the write.
///
/// # Examples
///
/// ```
/// use omahub_cache_core::{estimate_size, FALLBACK_ENTRY_SIZE};
/// use std::collections::HashMap;
///
/// assert_eq!(estimate_size(&"abc"), 5); // "abc" with quotes
/// assert_eq!(estimate_size(&vec![1, 2, 3]), 7); // [1,2,3]
///
/// let mut unencodable = HashMap::new();
/// unencodable.insert((1u8, 2u8), "x");
/// assert_eq!(estimate_size(&unencodable), FALLBACK_ENTRY_SIZE);
/// ```
pub fn estimate_size<T: Serialize + ?Sized>(value: &T) -> usize {
    let mut counter = ByteCounter(0);
    match serde_json::to_writer(&mut counter, value) {
        Ok(()) => counter.0,
        Err(e) => {
            log::debug!("size estimate fell back to {FALLBACK_ENTRY_SIZE} bytes: {e}");
            FALLBACK_ENTRY_SIZE
        }
    }
}

// Counts bytes without materialising the encoded buffer.
struct ByteCounter(usize);

impl std::io::Write for ByteCounter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0 += buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
