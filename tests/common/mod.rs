//! Record construction helpers shared by the integration tests.
//!
//! `RecordBuf` writes fields at the offsets published by the `layout` modules, acting
//! as the byte-level encoder for the scenario tests: encode a record, decode it through
//! the public API, compare against the intended values.

use archscope::detail::layout;

/// A zero-initialized raw record with little-endian field writers.
pub struct RecordBuf {
    data: Vec<u8>,
}

#[allow(dead_code)]
impl RecordBuf {
    /// A record with room for the header plus `payload_size` architecture bytes.
    pub fn new(payload_size: usize) -> Self {
        RecordBuf {
            data: vec![0u8; layout::ARCH_DETAIL + payload_size],
        }
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    pub fn put_u8(&mut self, offset: usize, value: u8) -> &mut Self {
        self.data[offset] = value;
        self
    }

    pub fn put_u16(&mut self, offset: usize, value: u16) -> &mut Self {
        self.data[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
        self
    }

    pub fn put_u32(&mut self, offset: usize, value: u32) -> &mut Self {
        self.data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
        self
    }

    pub fn put_i32(&mut self, offset: usize, value: i32) -> &mut Self {
        self.data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
        self
    }

    pub fn put_u64(&mut self, offset: usize, value: u64) -> &mut Self {
        self.data[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
        self
    }

    pub fn put_i64(&mut self, offset: usize, value: i64) -> &mut Self {
        self.data[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
        self
    }

    pub fn put_f64(&mut self, offset: usize, value: f64) -> &mut Self {
        self.data[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
        self
    }

    /// Fill the header's regs-read array and count.
    pub fn regs_read(&mut self, ids: &[u16]) -> &mut Self {
        for (index, &id) in ids.iter().enumerate() {
            self.put_u16(layout::REGS_READ + index * 2, id);
        }
        self.put_u8(layout::REGS_READ_COUNT, ids.len() as u8)
    }

    /// Fill the header's regs-write array and count.
    pub fn regs_write(&mut self, ids: &[u16]) -> &mut Self {
        for (index, &id) in ids.iter().enumerate() {
            self.put_u16(layout::REGS_WRITE + index * 2, id);
        }
        self.put_u8(layout::REGS_WRITE_COUNT, ids.len() as u8)
    }

    /// Fill the header's groups array and count.
    pub fn groups(&mut self, ids: &[u8]) -> &mut Self {
        for (index, &id) in ids.iter().enumerate() {
            self.put_u8(layout::GROUPS + index, id);
        }
        self.put_u8(layout::GROUPS_COUNT, ids.len() as u8)
    }

    pub fn writeback(&mut self, value: bool) -> &mut Self {
        self.put_u8(layout::WRITEBACK, u8::from(value))
    }
}
