use crate::error::Error;
use crate::twkb::encoding::*;
use crate::twkb::point::{Coord, PointType};
use byteorder::WriteBytesExt;
use std::fmt;
use std::io::Write;

const BBOX_FLAG: u8 = 0b0000_0001;
const SIZE_FLAG: u8 = 0b0000_0010;
const IDLIST_FLAG: u8 = 0b0000_0100;
const EXTENDED_DIMS_FLAG: u8 = 0b0000_1000;
const EMPTY_FLAG: u8 = 0b0001_0000;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default, Hash)]
pub enum GeometryType {
    #[default]
    Point = 1,
    LineString = 2,
    Polygon = 3,
    MultiPoint = 4,
    MultiLineString = 5,
    MultiPolygon = 6,
    GeometryCollection = 7,
}

impl GeometryType {
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl TryFrom<u8> for GeometryType {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self, Error> {
        Ok(match code {
            1 => GeometryType::Point,
            2 => GeometryType::LineString,
            3 => GeometryType::Polygon,
            4 => GeometryType::MultiPoint,
            5 => GeometryType::MultiLineString,
            6 => GeometryType::MultiPolygon,
            7 => GeometryType::GeometryCollection,
            _ => return Err(Error::UnsupportedGeometryType(code)),
        })
    }
}

impl fmt::Display for GeometryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GeometryType::Point => "POINT",
            GeometryType::LineString => "LINESTRING",
            GeometryType::Polygon => "POLYGON",
            GeometryType::MultiPoint => "MULTIPOINT",
            GeometryType::MultiLineString => "MULTILINESTRING",
            GeometryType::MultiPolygon => "MULTIPOLYGON",
            GeometryType::GeometryCollection => "GEOMETRYCOLLECTION",
        })
    }
}

/// Bounding box as stored in the header, already scaled to ordinates.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(PartialEq, Clone, Copy, Debug, Default)]
pub struct BBox {
    pub min: Coord,
    pub max: Coord,
}

/// Per-geometry TWKB header.
///
/// ```text
/// type_and_prec     byte
/// metadata_header   byte
/// [extended_dims]   byte
/// [size]            uvarint
/// [bounds]          bbox
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(PartialEq, Clone, Debug, Default)]
pub struct Header {
    pub geometry_type: GeometryType,
    /// Decimal digits of the X/Y ordinates, `-8..=7`.
    pub precision: i8,
    pub has_ids: bool,
    pub is_empty: bool,
    pub has_z: bool,
    pub has_m: bool,
    pub z_precision: u8,
    pub m_precision: u8,
    /// Byte length of the rest of the geometry, if the encoder included it.
    pub size: Option<u64>,
    pub bbox: Option<BBox>,
}

impl Header {
    pub fn decode(raw: &mut Cursor) -> Result<Header, Error> {
        let type_and_prec = raw.read_u8()?;
        let geometry_type = GeometryType::try_from(type_and_prec & 0x0F)?;
        let precision = zigzag_decode((type_and_prec >> 4) as u64) as i8;

        let metadata = raw.read_u8()?;
        let mut header = Header {
            geometry_type,
            precision,
            has_ids: metadata & IDLIST_FLAG != 0,
            is_empty: metadata & EMPTY_FLAG != 0,
            ..Default::default()
        };
        if metadata & EXTENDED_DIMS_FLAG != 0 {
            let ext = raw.read_u8()?;
            header.has_z = ext & 0b0001 != 0;
            header.has_m = ext & 0b0010 != 0;
            header.z_precision = (ext & 0x1C) >> 2;
            header.m_precision = (ext & 0xE0) >> 5;
        }
        if metadata & SIZE_FLAG != 0 {
            header.size = Some(raw.read_var_u64()?);
        }
        if metadata & BBOX_FLAG != 0 {
            header.bbox = Some(header.read_bbox(raw)?);
        }
        Ok(header)
    }

    fn read_bbox(&self, raw: &mut Cursor) -> Result<BBox, Error> {
        let precisions = self.axis_precisions();
        let mut min = [0f64; 4];
        let mut max = [0f64; 4];
        for axis in 0..self.point_type().dimension() {
            let lo = raw.read_var_i64()?;
            let delta = raw.read_var_i64()?;
            min[axis] = descale(lo, precisions[axis]);
            max[axis] = descale(lo.wrapping_add(delta), precisions[axis]);
        }
        Ok(BBox {
            min: self.coord_from_axes(&min),
            max: self.coord_from_axes(&max),
        })
    }

    pub fn encode<W: Write + ?Sized>(&self, w: &mut W) -> Result<(), Error> {
        let precision = self.precision as i64;
        w.write_u8((zigzag_encode(precision) as u8) << 4 | self.geometry_type.code())?;

        let has_ext = self.has_z || self.has_m;
        let mut metadata = 0;
        if self.bbox.is_some() {
            metadata |= BBOX_FLAG;
        }
        if self.size.is_some() {
            metadata |= SIZE_FLAG;
        }
        if self.has_ids {
            metadata |= IDLIST_FLAG;
        }
        if has_ext {
            metadata |= EXTENDED_DIMS_FLAG;
        }
        if self.is_empty {
            metadata |= EMPTY_FLAG;
        }
        w.write_u8(metadata)?;

        if has_ext {
            let mut ext = (self.has_z as u8) | (self.has_m as u8) << 1;
            ext |= (self.z_precision & 0x07) << 2;
            ext |= (self.m_precision & 0x07) << 5;
            w.write_u8(ext)?;
        }
        if let Some(size) = self.size {
            write_var_u64(w, size)?;
        }
        if let Some(bbox) = &self.bbox {
            let precisions = self.axis_precisions();
            let min = self.axes_from_coord(&bbox.min);
            let max = self.axes_from_coord(&bbox.max);
            for axis in 0..self.point_type().dimension() {
                let lo = quantize(min[axis], precisions[axis]);
                let hi = quantize(max[axis], precisions[axis]);
                write_var_i64(w, lo)?;
                write_var_i64(w, hi.wrapping_sub(lo))?;
            }
        }
        Ok(())
    }

    pub fn point_type(&self) -> PointType {
        PointType::from_flags(self.has_z, self.has_m)
    }

    /// Decimal precision of each axis in ordinate order x, y, [z], [m].
    pub fn axis_precisions(&self) -> [i32; 4] {
        let xy = self.precision as i32;
        let z = self.z_precision as i32;
        let m = self.m_precision as i32;
        if self.has_z {
            [xy, xy, z, m]
        } else {
            [xy, xy, m, 0]
        }
    }

    pub(crate) fn coord_from_axes(&self, axes: &[f64; 4]) -> Coord {
        let (z, m) = match self.point_type() {
            PointType::Point => (None, None),
            PointType::PointZ => (Some(axes[2]), None),
            PointType::PointM => (None, Some(axes[2])),
            PointType::PointZM => (Some(axes[2]), Some(axes[3])),
        };
        Coord {
            x: axes[0],
            y: axes[1],
            z,
            m,
        }
    }

    pub(crate) fn axes_from_coord(&self, c: &Coord) -> [f64; 4] {
        let z = c.z.unwrap_or(0.0);
        let m = c.m.unwrap_or(0.0);
        if self.has_z {
            [c.x, c.y, z, m]
        } else {
            [c.x, c.y, m, 0.0]
        }
    }
}
