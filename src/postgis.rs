//! `bytea` support for rust-postgres.
//!
//! `ST_AsTWKB` returns `bytea`, and `ST_GeomFromTWKB` takes one, so TWKB values
//! travel as plain byte strings.

use crate::twkb::{self, Geometry, TwkbGeometry, TwkbRead, WriteOptions};
use bytes::{BufMut, BytesMut};
use postgres_types::{accepts, to_sql_checked, FromSql, IsNull, ToSql, Type};
use std::error::Error;
use tracing::debug;

macro_rules! impl_from_sql {
    ($geotype:ty) => {
        impl<'a> FromSql<'a> for $geotype {
            fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
                <$geotype>::read_twkb(raw).map_err(|e| {
                    debug!(sql_type = %ty, error = %e, "TWKB conversion failed");
                    format!("cannot convert {} to {}: {}", ty, stringify!($geotype), e).into()
                })
            }

            accepts!(BYTEA);
        }
    };
}

impl_from_sql!(Geometry);
impl_from_sql!(twkb::Point);
impl_from_sql!(twkb::LineString);
impl_from_sql!(twkb::Polygon);
impl_from_sql!(twkb::MultiPoint);
impl_from_sql!(twkb::MultiLineString);
impl_from_sql!(twkb::MultiPolygon);
impl_from_sql!(twkb::GeometryCollection);

impl ToSql for TwkbGeometry<'_> {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        if let Err(e) = self.write_twkb(&mut out.writer()) {
            debug!(sql_type = %ty, error = %e, "TWKB conversion failed");
            return Err(Box::new(e));
        }
        Ok(IsNull::No)
    }

    accepts!(BYTEA);
    to_sql_checked!();
}

/// Writes with [`WriteOptions::default`], i.e. precision 0: ordinates are
/// rounded to whole units, so `10.12` is sent as `10`. Bind
/// `geom.as_twkb(WriteOptions::with_precision(..))` to keep decimals.
impl ToSql for Geometry {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        self.as_twkb(WriteOptions::default()).to_sql(ty, out)
    }

    accepts!(BYTEA);
    to_sql_checked!();
}
