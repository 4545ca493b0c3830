//! Linear memory

use cadenza_primitives::U256;

/// Byte-addressable memory that grows in 32-byte words.
///
/// Reads past the current length return zero bytes. Growth is requested with
/// [`Memory::extend`] after its gas has been charged.
#[derive(Clone, Debug, Default)]
pub struct Memory {
    data: Vec<u8>,
}

/// Round a byte length up to a whole number of words
#[inline]
pub fn word_aligned(len: usize) -> usize {
    len.div_ceil(32).saturating_mul(32)
}

impl Memory {
    /// Create new empty memory
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Current size in bytes (always a multiple of 32)
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if nothing has been touched yet
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Grow to cover `[offset, offset + size)`; a zero size never grows
    pub fn extend(&mut self, offset: usize, size: usize) {
        if size == 0 {
            return;
        }
        let end = word_aligned(offset.saturating_add(size));
        if end > self.data.len() {
            self.data.resize(end, 0);
        }
    }

    /// Copy `size` bytes starting at `offset`, zero-filled past the end
    pub fn read(&self, offset: usize, size: usize) -> Vec<u8> {
        let mut out = vec![0u8; size];
        if offset < self.data.len() {
            let end = offset.saturating_add(size).min(self.data.len());
            out[..end - offset].copy_from_slice(&self.data[offset..end]);
        }
        out
    }

    /// Write `size` bytes at `offset`: `bytes` first, then zeros if `bytes`
    /// is shorter. Grows memory as needed.
    pub fn write(&mut self, offset: usize, size: usize, bytes: &[u8]) {
        if size == 0 {
            return;
        }
        self.extend(offset, size);
        let copied = bytes.len().min(size);
        self.data[offset..offset + copied].copy_from_slice(&bytes[..copied]);
        self.data[offset + copied..offset + size].fill(0);
    }

    /// Load a 32-byte word
    pub fn load_word(&self, offset: usize) -> U256 {
        U256::from_big_endian(&self.read(offset, 32))
    }

    /// Store a 32-byte word
    pub fn store_word(&mut self, offset: usize, value: U256) {
        let mut buf = [0u8; 32];
        value.to_big_endian(&mut buf);
        self.write(offset, 32, &buf);
    }

    /// Store a single byte
    pub fn store_byte(&mut self, offset: usize, value: u8) {
        self.write(offset, 1, &[value]);
    }

    /// Copy within memory; regions may overlap (MCOPY)
    pub fn copy_within(&mut self, dest: usize, src: usize, size: usize) {
        if size == 0 {
            return;
        }
        self.extend(dest.max(src), size);
        self.data.copy_within(src..src + size, dest);
    }

    /// Raw contents
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}
