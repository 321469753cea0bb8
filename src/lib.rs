//! Read and write PostGIS geometries in TWKB format, with [rust-postgres](https://github.com/sfackler/rust-postgres) support.
//!
//! ```rust,no_run
//! use postgres::{Client, NoTls};
//! use postgis_twkb::twkb;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut client = Client::connect("host=localhost user=postgres", NoTls)?;
//! for row in &client.query("SELECT ST_AsTWKB(geom, 5) FROM busstops", &[])? {
//!     let stop: twkb::Point = row.get(0);
//!     println!("{}, {}", stop.x(), stop.y());
//! }
//!
//! let line = twkb::read(&[0x02, 0x00, 0x02, 0x02, 0x04, 0x04, 0x04])?;
//! client.execute(
//!     "INSERT INTO routes (geom) VALUES (ST_GeomFromTWKB($1))",
//!     &[&line.as_twkb(twkb::WriteOptions::with_precision(5))],
//! )?;
//! # Ok(())
//! # }
//! ```
//!
//! Geometries convert to and from [`geo_types`] through `TryFrom` / `From`.

pub mod error;
pub mod twkb;
mod postgis;
mod conversion;

pub use twkb::{read, read_header, to_twkb, Geometry, TwkbRead, WriteOptions};
