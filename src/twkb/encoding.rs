use crate::error::Error;
use byteorder::WriteBytesExt;
use std::io::Write;

/// A varint never spans more than 10 bytes (64 bits / 7 bits per byte).
const MAX_VARINT_LEN: usize = 10;

/// Forward-only reader over a TWKB buffer.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Cursor { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn read_u8(&mut self) -> Result<u8, Error> {
        let b = *self.buf.get(self.pos).ok_or(Error::Truncated(self.pos))?;
        self.pos += 1;
        Ok(b)
    }

    /// Base-128 little-endian varint.
    pub fn read_var_u64(&mut self) -> Result<u64, Error> {
        let start = self.pos;
        let mut r: u64 = 0;
        for i in 0..MAX_VARINT_LEN {
            let b = self.read_u8()?;
            // only the lowest bit of the tenth byte still fits into 64 bits
            if i == MAX_VARINT_LEN - 1 && b > 0x01 {
                return Err(Error::Malformed(format!(
                    "varint at offset {} overflows 64 bits",
                    start
                )));
            }
            r |= ((b & 0x7f) as u64) << (i * 7);
            if b < 0x80 {
                return Ok(r);
            }
        }
        Err(Error::Malformed(format!(
            "varint at offset {} is longer than {} bytes",
            start, MAX_VARINT_LEN
        )))
    }

    /// Zigzag-encoded signed varint.
    pub fn read_var_i64(&mut self) -> Result<i64, Error> {
        self.read_var_u64().map(zigzag_decode)
    }

    pub fn read_var_i32(&mut self) -> Result<i32, Error> {
        let start = self.pos;
        let v = self.read_var_i64()?;
        i32::try_from(v).map_err(|_| {
            Error::Malformed(format!("varint at offset {} does not fit in 32 bits", start))
        })
    }

    /// Reads an unsigned varint used as an element count.
    pub fn read_count(&mut self) -> Result<usize, Error> {
        let start = self.pos;
        let n = self.read_var_u64()?;
        usize::try_from(n)
            .map_err(|_| Error::Malformed(format!("count {} at offset {} is too large", n, start)))
    }
}

pub fn zigzag_decode(n: u64) -> i64 {
    ((n >> 1) as i64) ^ (-((n & 1) as i64))
}

pub fn zigzag_encode(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

pub fn write_var_u64<W: Write + ?Sized>(w: &mut W, mut n: u64) -> Result<(), Error> {
    while n >= 0x80 {
        w.write_u8((n as u8 & 0x7f) | 0x80)?;
        n >>= 7;
    }
    w.write_u8(n as u8)?;
    Ok(())
}

pub fn write_var_i64<W: Write + ?Sized>(w: &mut W, n: i64) -> Result<(), Error> {
    write_var_u64(w, zigzag_encode(n))
}

/// Turns an accumulated integer back into an ordinate, `value * 10^-precision`.
///
/// Positive precisions divide by an exact power of ten, so integers that were
/// quantized from multiples of `10^-precision` come back unchanged.
pub fn descale(value: i64, precision: i32) -> f64 {
    if precision >= 0 {
        value as f64 / 10f64.powi(precision)
    } else {
        value as f64 * 10f64.powi(-precision)
    }
}

/// Inverse of [`descale`], rounding half away from zero.
pub fn quantize(value: f64, precision: i32) -> i64 {
    let scaled = if precision >= 0 {
        value * 10f64.powi(precision)
    } else {
        value / 10f64.powi(-precision)
    };
    scaled.round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn varint(bytes: &[u8]) -> Result<u64, Error> {
        Cursor::new(bytes).read_var_u64()
    }

    #[test]
    fn test_read_var_u64() {
        assert_eq!(varint(&[0x00]).unwrap(), 0);
        assert_eq!(varint(&[0x7f]).unwrap(), 127);
        assert_eq!(varint(&[0x80, 0x01]).unwrap(), 128);
        // 200000, the x ordinate of POINT(1 2) at precision 5
        assert_eq!(varint(&[0xc0, 0x9a, 0x0c]).unwrap(), 200000);
        assert_eq!(
            varint(&[0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x01]).unwrap(),
            u64::MAX
        );
    }

    #[test]
    fn test_read_var_u64_advances_cursor() {
        let mut cursor = Cursor::new(&[0xc0, 0x9a, 0x0c, 0x04]);
        cursor.read_var_u64().unwrap();
        assert_eq!(cursor.position(), 3);
        assert_eq!(cursor.remaining(), 1);
        assert_eq!(cursor.read_var_u64().unwrap(), 4);
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn test_read_var_u64_truncated() {
        assert!(matches!(varint(&[]), Err(Error::Truncated(0))));
        assert!(matches!(varint(&[0x80, 0x80]), Err(Error::Truncated(2))));
    }

    #[test]
    fn test_read_var_u64_too_long() {
        let bytes = [0x80u8; 11];
        assert!(matches!(varint(&bytes), Err(Error::Malformed(_))));
        // tenth byte carrying more than the 64th bit
        let bytes = [0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x02];
        assert!(matches!(varint(&bytes), Err(Error::Malformed(_))));
    }

    #[test]
    fn test_zigzag() {
        let decoded: Vec<i64> = (0..5).map(zigzag_decode).collect();
        assert_eq!(decoded, vec![0, -1, 1, -2, 2]);
        assert_eq!(zigzag_decode(u64::MAX), i64::MIN);
        for n in [0, -1, 1, i64::MAX, i64::MIN, 200000, -400000] {
            assert_eq!(zigzag_decode(zigzag_encode(n)), n);
        }
    }

    #[test]
    fn test_read_var_i32() {
        assert_eq!(Cursor::new(&[0x03]).read_var_i32().unwrap(), -2);
        let too_big = [0xff, 0xff, 0xff, 0xff, 0x7f];
        assert!(matches!(
            Cursor::new(&too_big).read_var_i32(),
            Err(Error::Malformed(_))
        ));
    }

    #[test]
    fn test_read_count() {
        assert_eq!(Cursor::new(&[0x02]).read_count().unwrap(), 2);
    }

    #[test]
    fn test_write_varint() {
        let mut buf = Vec::new();
        write_var_u64(&mut buf, 200000).unwrap();
        assert_eq!(buf, vec![0xc0, 0x9a, 0x0c]);

        let mut buf = Vec::new();
        write_var_i64(&mut buf, -400000).unwrap();
        assert_eq!(buf, vec![0xff, 0xe9, 0x30]);

        let mut buf = Vec::new();
        write_var_u64(&mut buf, u64::MAX).unwrap();
        assert_eq!(buf.len(), 10);
        assert_eq!(Cursor::new(&buf).read_var_u64().unwrap(), u64::MAX);
    }

    #[test]
    fn test_scale() {
        assert_eq!(descale(100000, 5), 1.0);
        assert_eq!(descale(-203, 1), -20.3);
        assert_eq!(descale(2, -1), 20.0);
        assert_eq!(quantize(10.12, 1), 101);
        assert_eq!(quantize(-0.5, 0), -1);
        assert_eq!(quantize(-22.34, -1), -2);
    }
}
