use std::fmt;

/// A non-null cell value.
///
/// The buffer is allocated once when the cell is built and never grows. The reported
/// length starts at the buffer size and may only shrink.
#[derive(Clone)]
pub struct CellValue {
    buf: Box<[u8]>,
    len: usize,
}

/// A nullable cell; `None` is SQL NULL.
pub type Cell = Option<CellValue>;

impl CellValue {
    /// Copy `bytes` into a freshly allocated cell buffer.
    #[must_use]
    pub fn new(bytes: &[u8]) -> Self {
        Self::from_vec(bytes.to_vec())
    }

    /// Take ownership of `bytes` as the cell buffer.
    #[must_use]
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        let buf = bytes.into_boxed_slice();
        let len = buf.len();
        Self { buf, len }
    }

    /// The bytes currently reported by the cell.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Reported length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Size of the buffer allocated when the cell was built.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Address of the cell buffer; stable for the life of the cell.
    #[must_use]
    pub fn as_ptr(&self) -> *const u8 {
        self.buf.as_ptr()
    }

    /// Lossy UTF-8 view, handy for text-format results.
    #[must_use]
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(self.as_bytes()).into_owned()
    }

    pub(crate) fn buffer_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }

    /// Update the reported length. Returns `false` (and leaves the cell untouched)
    /// if `len` exceeds the allocated buffer.
    pub(crate) fn set_len(&mut self, len: usize) -> bool {
        if len > self.buf.len() {
            return false;
        }
        self.len = len;
        true
    }
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for CellValue {}

impl fmt::Debug for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(self.as_bytes()) {
            Ok(text) => write!(f, "{text:?}"),
            Err(_) => write!(f, "{:?}", self.as_bytes()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shrinking_keeps_buffer() {
        let mut cell = CellValue::new(b"ciphertext");
        let ptr = cell.as_ptr();
        assert!(cell.set_len(5));
        assert_eq!(cell.as_bytes(), b"ciphe");
        assert_eq!(cell.capacity(), 10);
        assert_eq!(cell.as_ptr(), ptr);
    }

    #[test]
    fn cannot_grow_past_capacity() {
        let mut cell = CellValue::new(b"abc");
        assert!(!cell.set_len(4));
        assert_eq!(cell.len(), 3);
        // Growing back within the original allocation is allowed.
        assert!(cell.set_len(1));
        assert!(cell.set_len(3));
        assert_eq!(cell.as_bytes(), b"abc");
    }

    #[test]
    fn equality_uses_reported_bytes() {
        let mut long = CellValue::new(b"abcdef");
        long.set_len(3);
        assert_eq!(long, CellValue::new(b"abc"));
    }
}
