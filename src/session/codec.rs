//! Byte codec over the session's logical streams
//!
//! Writers append to the out-buffer (flushed by [`Session::write`]);
//! readers consume the in-buffer through the cursor, pulling one DATA
//! packet from the wire when it runs short.
//!
//! Integers come in two encodings. Raw: exactly `size` bytes in the
//! requested endianness. Compressed: one length byte holding the count of
//! significant big-endian bytes (the sign OR-ed in as 0x80 for negative
//! values), then those bytes; zero is a single 0x00. `size == 1` always
//! writes one raw byte, compression or not.
//!
//! Byte strings (CLR) use a single length byte up to 0xFC; longer values
//! use the 0xFE-introduced chunked form terminated by a zero-length chunk.

use bytes::BufMut;

use crate::constants::clr;
use crate::error::{Error, Result};
use crate::session::Session;

/// Strip leading zero bytes of a big-endian representation
fn significant_bytes(be: &[u8; 8]) -> &[u8] {
    let start = be.iter().position(|&b| b != 0).unwrap_or(8);
    &be[start..]
}

impl Session {
    // =========================================================================
    // Writers
    // =========================================================================

    /// Append a single byte to the out-stream
    pub fn put_byte(&mut self, value: u8) {
        self.out_buffer.put_u8(value);
    }

    /// Append raw bytes to the out-stream
    pub fn put_bytes(&mut self, data: &[u8]) {
        self.out_buffer.put_slice(data);
    }

    /// Append an unsigned integer.
    ///
    /// `size` must be 1, 2, 4 or 8; anything else is a programmer error.
    pub fn put_uint(&mut self, number: u64, size: u8, big_endian: bool, compress: bool) {
        assert!(
            matches!(size, 1 | 2 | 4 | 8),
            "integer width must be 1, 2, 4 or 8"
        );
        if size == 1 {
            self.out_buffer.put_u8(number as u8);
            return;
        }
        if compress {
            let be = number.to_be_bytes();
            let sig = significant_bytes(&be);
            let n = sig.len().min(size as usize);
            if n == 0 {
                self.out_buffer.put_u8(0);
            } else {
                self.out_buffer.put_u8(n as u8);
                self.out_buffer.put_slice(&sig[sig.len() - n..]);
            }
        } else {
            match (size, big_endian) {
                (2, true) => self.out_buffer.put_u16(number as u16),
                (2, false) => self.out_buffer.put_u16_le(number as u16),
                (4, true) => self.out_buffer.put_u32(number as u32),
                (4, false) => self.out_buffer.put_u32_le(number as u32),
                (8, true) => self.out_buffer.put_u64(number),
                _ => self.out_buffer.put_u64_le(number),
            }
        }
    }

    /// Append a signed integer. Compressed negative values carry the sign
    /// in the length byte and encode the magnitude.
    pub fn put_int(&mut self, number: i64, size: u8, big_endian: bool, compress: bool) {
        assert!(
            matches!(size, 1 | 2 | 4 | 8),
            "integer width must be 1, 2, 4 or 8"
        );
        if size == 1 {
            self.out_buffer.put_u8(number as u8);
            return;
        }
        if compress {
            let be = number.unsigned_abs().to_be_bytes();
            let sig = significant_bytes(&be);
            let n = sig.len().min(size as usize);
            if n == 0 {
                self.out_buffer.put_u8(0);
            } else {
                let mut len_byte = n as u8;
                if number < 0 {
                    len_byte |= 0x80;
                }
                self.out_buffer.put_u8(len_byte);
                self.out_buffer.put_slice(&sig[sig.len() - n..]);
            }
        } else {
            match (size, big_endian) {
                (2, true) => self.out_buffer.put_i16(number as i16),
                (2, false) => self.out_buffer.put_i16_le(number as i16),
                (4, true) => self.out_buffer.put_i32(number as i32),
                (4, false) => self.out_buffer.put_i32_le(number as i32),
                (8, true) => self.out_buffer.put_i64(number),
                _ => self.out_buffer.put_i64_le(number),
            }
        }
    }

    /// Append a length-prefixed byte string
    pub fn put_clr(&mut self, data: &[u8]) {
        let len = data.len();
        if len > clr::MAX_INLINE {
            self.out_buffer.put_u8(clr::LONG_INDICATOR);
            let chunk_size = self.clr_chunk_size.max(1);
            let big_chunks = self.use_big_clr_chunks;
            for chunk in data.chunks(chunk_size) {
                if big_chunks {
                    self.put_int(chunk.len() as i64, 4, true, true);
                } else {
                    self.out_buffer.put_u8(chunk.len() as u8);
                }
                self.out_buffer.put_slice(chunk);
            }
            self.out_buffer.put_u8(0);
        } else if len == 0 {
            self.out_buffer.put_u8(0);
        } else {
            self.out_buffer.put_u8(len as u8);
            self.out_buffer.put_slice(data);
        }
    }

    /// Append a string as a CLR
    pub fn put_string(&mut self, data: &str) {
        self.put_clr(data.as_bytes());
    }

    /// Append a key/value pair with a numeric tag. Empty keys and values
    /// collapse to a single zero byte.
    pub fn put_key_val(&mut self, key: &[u8], val: &[u8], num: u8) {
        if key.is_empty() {
            self.out_buffer.put_u8(0);
        } else {
            self.put_uint(key.len() as u64, 4, true, true);
            self.put_clr(key);
        }
        if val.is_empty() {
            self.out_buffer.put_u8(0);
        } else {
            self.put_uint(val.len() as u64, 4, true, true);
            self.put_clr(val);
        }
        self.put_int(num as i64, 4, true, true);
    }

    /// String convenience over [`Session::put_key_val`]
    pub fn put_key_val_string(&mut self, key: &str, val: &str, num: u8) {
        self.put_key_val(key.as_bytes(), val.as_bytes(), num);
    }

    // =========================================================================
    // Readers
    // =========================================================================

    /// Read one byte from the in-stream
    pub async fn get_byte(&mut self) -> Result<u8> {
        let rb = self.read(1).await?;
        Ok(rb[0])
    }

    /// Read raw bytes from the in-stream
    pub async fn get_bytes(&mut self, length: usize) -> Result<Vec<u8>> {
        self.read(length).await
    }

    /// Read an integer. For `compress` the wire length byte overrides
    /// `size` and the value is big-endian regardless of `big_endian`.
    pub async fn get_int64(
        &mut self,
        size: usize,
        compress: bool,
        big_endian: bool,
    ) -> Result<i64> {
        let mut size = size;
        let mut big_endian = big_endian;
        let mut negative = false;
        if compress {
            let len_byte = self.get_byte().await?;
            size = (len_byte & 0x7F) as usize;
            negative = len_byte & 0x80 != 0;
            big_endian = true;
        }
        if size == 0 {
            return Ok(0);
        }
        if size > 8 {
            return Err(Error::BufferUnderflow {
                needed: size,
                available: 8,
            });
        }
        let rb = self.read(size).await?;
        let mut temp = [0u8; 8];
        let value = if big_endian {
            temp[8 - size..].copy_from_slice(&rb);
            i64::from_be_bytes(temp)
        } else {
            temp[..size].copy_from_slice(&rb);
            i64::from_le_bytes(temp)
        };
        Ok(if negative { -value } else { value })
    }

    /// Narrow variant of [`Session::get_int64`]
    pub async fn get_int(&mut self, size: usize, compress: bool, big_endian: bool) -> Result<i32> {
        Ok(self.get_int64(size, compress, big_endian).await? as i32)
    }

    /// Read a length-prefixed byte string
    pub async fn get_clr(&mut self) -> Result<Vec<u8>> {
        let size = self.get_byte().await?;
        if size == 0 || size == clr::NULL_INDICATOR {
            return Ok(Vec::new());
        }
        if size != clr::LONG_INDICATOR {
            return self.read(size as usize).await;
        }

        let mut output = Vec::new();
        if !self.use_big_clr_chunks {
            loop {
                let h = self.get_byte().await?;
                if h == 0 {
                    break;
                }
                if h == clr::NULL_INDICATOR {
                    // legacy server variant: a null-terminated run follows
                    loop {
                        let b = self.get_byte().await?;
                        if b == 0 {
                            break;
                        }
                        output.push(b);
                        if output.len() >= clr::ESCAPE_RUN_CAP {
                            break;
                        }
                    }
                    break;
                }
                if h as usize > self.clr_chunk_size {
                    return Err(Error::InvalidChunkSize(h));
                }
                let chunk = self.read(h as usize).await?;
                output.extend_from_slice(&chunk);
            }
        } else {
            loop {
                let chunk_len = self.get_int(4, true, true).await?;
                if chunk_len <= 0 {
                    break;
                }
                let chunk = self.read(chunk_len as usize).await?;
                output.extend_from_slice(&chunk);
            }
        }
        Ok(output)
    }

    /// Read a length-described chunk: a 4-byte compressed declared length
    /// followed by a CLR body, truncated to the declared length
    pub async fn get_dlc(&mut self) -> Result<Vec<u8>> {
        let length = self.get_int(4, true, true).await?;
        if length <= 0 {
            return Ok(Vec::new());
        }
        let mut output = self.get_clr().await?;
        output.truncate(length as usize);
        Ok(output)
    }

    /// Read a key/value pair with its numeric tag
    pub async fn get_key_val(&mut self) -> Result<(Vec<u8>, Vec<u8>, i32)> {
        let key = self.get_dlc().await?;
        let val = self.get_dlc().await?;
        let num = self.get_int(4, true, true).await?;
        Ok((key, val, num))
    }

    /// Read up to `max_size` bytes as a NUL-terminated string. With a NUL
    /// at offset `k > 0` the cursor lands just past it; without one the
    /// whole window is consumed.
    pub async fn get_null_term_string(&mut self, max_size: usize) -> Result<String> {
        let old_index = self.index;
        let temp = self.read(max_size).await?;
        match temp.iter().position(|&b| b == 0) {
            Some(k) if k > 0 => {
                self.index = old_index + k + 1;
                Ok(String::from_utf8_lossy(&temp[..k]).into_owned())
            }
            _ => Ok(String::from_utf8_lossy(&temp).into_owned()),
        }
    }

    /// Read a CLR and keep its first `length` bytes as a string
    pub async fn get_string(&mut self, length: usize) -> Result<String> {
        let data = self.get_clr().await?;
        let end = length.min(data.len());
        Ok(String::from_utf8_lossy(&data[..end]).into_owned())
    }
}
