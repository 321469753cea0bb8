//! Read and write geometries in [Tiny WKB](https://github.com/TWKB/Specification/blob/master/twkb.md) format.
//!
//! TWKB is the compact encoding PostGIS produces with `ST_AsTWKB`: ordinates are
//! scaled to integers, delta coded against the previous point and written as
//! zigzag varints.
//!
//! ```rust
//! use postgis_twkb::twkb::{self, TwkbRead};
//!
//! // SELECT encode(ST_AsTWKB('LINESTRING(1 2,3 4)'::geometry, 5), 'hex')
//! let bytes = [0xa2, 0x00, 0x02, 0xc0, 0x9a, 0x0c, 0x80, 0xb5, 0x18, 0x80, 0xb5, 0x18, 0x80, 0xb5, 0x18];
//! let line = twkb::LineString::read_twkb(&bytes).unwrap();
//! assert_eq!(line.coords.get(1).map(|c| (c.x, c.y)), Some((3.0, 4.0)));
//! ```

pub mod encoding;
pub mod header;
pub mod point;
mod geometry;
pub mod writer;

use crate::error::Error;
pub use encoding::Cursor;
pub use geometry::*;
pub use header::{BBox, GeometryType, Header};
pub use point::{read_coordinates, Accumulator, Coord, CoordSeq, PointType};
pub use writer::{to_twkb, write_twkb, TwkbGeometry, WriteOptions};

// --- Traits

pub trait TwkbRead: Sized {
    fn read_twkb(raw: &[u8]) -> Result<Self, Error>;
}

impl TwkbRead for Geometry {
    fn read_twkb(raw: &[u8]) -> Result<Self, Error> {
        read(raw)
    }
}

/// Decodes one geometry from the start of `bytes`. Trailing bytes are ignored.
pub fn read(bytes: &[u8]) -> Result<Geometry, Error> {
    decode_geometry(&mut Cursor::new(bytes), 0)
}

/// Decodes only the top-level header.
pub fn read_header(bytes: &[u8]) -> Result<Header, Error> {
    Header::decode(&mut Cursor::new(bytes))
}
