//! Positionable byte cursors over in-memory buffers.
//!
//! [`ReadCursor`] is a borrowing view with a position and an endianness
//! flag; all typed accessors check bounds against the view's extent.
//! Nested structures (sequence items, pixel data fragments, the file meta
//! group) are parsed through [`ReadCursor::sub_cursor`], so a corrupt
//! nested length can never run past the parent's declared extent.
//!
//! [`WriteCursor`] owns a growable buffer; all typed writes are
//! infallible, and nested content can be built in a scratch cursor and
//! appended with [`WriteCursor::concat`] once its length is known.

use byteordered::byteorder::{BigEndian, ByteOrder, LittleEndian};
use byteordered::Endianness;
use snafu::{ensure, Backtrace, Snafu};

/// Error raised when a cursor operation would cross
/// the bounds of the underlying view.
#[derive(Debug, Snafu)]
#[snafu(display(
    "Access of {} bytes past cursor bounds ({} remaining)",
    requested,
    remaining
))]
pub struct OutOfRange {
    /// The number of bytes requested.
    pub requested: usize,
    /// The number of bytes that were actually available.
    pub remaining: usize,
    /// The generated backtrace, if available.
    pub backtrace: Backtrace,
}

type Result<T, E = OutOfRange> = std::result::Result<T, E>;

/// A bounded, positioned reader over a byte slice.
#[derive(Debug, Clone)]
pub struct ReadCursor<'a> {
    data: &'a [u8],
    pos: usize,
    endianness: Endianness,
}

macro_rules! impl_read {
    ($name: ident, $typ: ty, $width: literal, $method: ident) => {
        /// Read one value of the respective type
        /// at the current position, advancing the cursor.
        pub fn $name(&mut self) -> Result<$typ> {
            let bytes = self.take($width)?;
            Ok(match self.endianness {
                Endianness::Little => LittleEndian::$method(bytes),
                Endianness::Big => BigEndian::$method(bytes),
            })
        }
    };
}

impl<'a> ReadCursor<'a> {
    /// Create a cursor over the full extent of the given slice.
    pub fn new(data: &'a [u8], endianness: Endianness) -> Self {
        ReadCursor {
            data,
            pos: 0,
            endianness,
        }
    }

    /// The total extent of this cursor's view, in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the view is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The current position, in bytes from the start of the view.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// The number of bytes between the position and the end of the view.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Whether there are any bytes left to read.
    #[inline]
    pub fn has_more(&self) -> bool {
        self.pos < self.data.len()
    }

    /// Whether the position has reached the end of the view.
    #[inline]
    pub fn at_end(&self) -> bool {
        !self.has_more()
    }

    /// The endianness applied by the typed accessors.
    #[inline]
    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Change the endianness applied by the typed accessors.
    pub fn set_endianness(&mut self, endianness: Endianness) {
        self.endianness = endianness;
    }

    /// Borrow the next `len` bytes and advance past them.
    pub fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        ensure!(
            len <= self.remaining(),
            OutOfRangeSnafu {
                requested: len,
                remaining: self.remaining(),
            }
        );
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// Advance the position by `len` bytes without reading them.
    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.take(len).map(|_| ())
    }

    /// Copy the next `len` bytes into an owned vector.
    pub fn read_vec(&mut self, len: usize) -> Result<Vec<u8>> {
        self.take(len).map(<[u8]>::to_vec)
    }

    /// Fill the given buffer from the current position.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let bytes = self.take(buf.len())?;
        buf.copy_from_slice(bytes);
        Ok(())
    }

    /// Read one byte, advancing the cursor.
    pub fn read_u8(&mut self) -> Result<u8> {
        self.take(1).map(|b| b[0])
    }

    /// Read one signed byte, advancing the cursor.
    pub fn read_i8(&mut self) -> Result<i8> {
        self.read_u8().map(|b| b as i8)
    }

    impl_read!(read_u16, u16, 2, read_u16);
    impl_read!(read_i16, i16, 2, read_i16);
    impl_read!(read_u32, u32, 4, read_u32);
    impl_read!(read_i32, i32, 4, read_i32);
    impl_read!(read_f32, f32, 4, read_f32);
    impl_read!(read_f64, f64, 8, read_f64);

    /// Inspect the byte at the given offset from the current position,
    /// without advancing.
    pub fn peek_u8(&self, offset: usize) -> Result<u8> {
        ensure!(
            offset < self.remaining(),
            OutOfRangeSnafu {
                requested: offset + 1,
                remaining: self.remaining(),
            }
        );
        Ok(self.data[self.pos + offset])
    }

    /// Obtain a bounded child cursor over the next `len` bytes,
    /// advancing this cursor past them.
    /// The child shares the parent's buffer and endianness
    /// but cannot access bytes beyond its extent.
    pub fn sub_cursor(&mut self, len: usize) -> Result<ReadCursor<'a>> {
        let endianness = self.endianness;
        self.take(len).map(|data| ReadCursor {
            data,
            pos: 0,
            endianness,
        })
    }
}

/// A growing, positioned writer over an owned byte buffer.
#[derive(Debug, Clone)]
pub struct WriteCursor {
    buf: Vec<u8>,
    endianness: Endianness,
}

macro_rules! impl_write {
    ($name: ident, $typ: ty, $width: literal, $method: ident) => {
        /// Append one value of the respective type in the cursor's
        /// endianness.
        pub fn $name(&mut self, value: $typ) {
            let mut bytes = [0u8; $width];
            match self.endianness {
                Endianness::Little => LittleEndian::$method(&mut bytes, value),
                Endianness::Big => BigEndian::$method(&mut bytes, value),
            }
            self.buf.extend_from_slice(&bytes);
        }
    };
}

impl WriteCursor {
    /// Create an empty write cursor.
    pub fn new(endianness: Endianness) -> Self {
        WriteCursor {
            buf: Vec::new(),
            endianness,
        }
    }

    /// Create an empty write cursor with a pre-allocated capacity.
    pub fn with_capacity(capacity: usize, endianness: Endianness) -> Self {
        WriteCursor {
            buf: Vec::with_capacity(capacity),
            endianness,
        }
    }

    /// The number of bytes written so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been written yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The endianness applied by the typed writers.
    #[inline]
    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Change the endianness applied by the typed writers.
    pub fn set_endianness(&mut self, endianness: Endianness) {
        self.endianness = endianness;
    }

    /// Append one byte.
    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    /// Append one signed byte.
    pub fn write_i8(&mut self, value: i8) {
        self.buf.push(value as u8);
    }

    impl_write!(write_u16, u16, 2, write_u16);
    impl_write!(write_i16, i16, 2, write_i16);
    impl_write!(write_u32, u32, 4, write_u32);
    impl_write!(write_i32, i32, 4, write_i32);
    impl_write!(write_f32, f32, 4, write_f32);
    impl_write!(write_f64, f64, 8, write_f64);

    /// Append a run of raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Append everything written to another cursor.
    pub fn concat(&mut self, other: WriteCursor) {
        self.buf.extend_from_slice(&other.buf);
    }

    /// View the written bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Consume the cursor, yielding the written buffer.
    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }
}
