//! TWKB output, with the options of PostGIS `ST_AsTWKB`.

use crate::error::Error;
use crate::twkb::encoding::*;
use crate::twkb::geometry::*;
use crate::twkb::header::{BBox, Header};
use crate::twkb::point::{Accumulator, CoordSeq};
use std::io::Write;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
pub struct WriteOptions {
    /// Decimal digits kept for X and Y, `-8..=7`.
    pub precision: i8,
    /// Decimal digits kept for Z, `0..=7`.
    pub z_precision: u8,
    /// Decimal digits kept for M, `0..=7`.
    pub m_precision: u8,
    pub include_size: bool,
    pub include_bbox: bool,
}

impl WriteOptions {
    pub fn with_precision(precision: i8) -> Self {
        WriteOptions {
            precision,
            ..Default::default()
        }
    }

    fn validate(&self) -> Result<(), Error> {
        if !(-8..=7).contains(&self.precision) {
            return Err(Error::Write(format!(
                "precision {} outside -8..=7",
                self.precision
            )));
        }
        if self.z_precision > 7 || self.m_precision > 7 {
            return Err(Error::Write(format!(
                "z/m precision {}/{} above 7",
                self.z_precision, self.m_precision
            )));
        }
        Ok(())
    }
}

/// Borrowed geometry together with the options to encode it with.
///
/// Implements `ToSql`, so a geometry can be bound as a `bytea` parameter.
#[derive(Debug, Clone, Copy)]
pub struct TwkbGeometry<'a> {
    pub geom: &'a Geometry,
    pub options: WriteOptions,
}

impl TwkbGeometry<'_> {
    pub fn write_twkb<W: Write + ?Sized>(&self, w: &mut W) -> Result<(), Error> {
        write_twkb(w, self.geom, &self.options)
    }

    pub fn to_twkb(&self) -> Result<Vec<u8>, Error> {
        to_twkb(self.geom, &self.options)
    }
}

impl Geometry {
    pub fn as_twkb(&self, options: WriteOptions) -> TwkbGeometry<'_> {
        TwkbGeometry {
            geom: self,
            options,
        }
    }
}

pub fn to_twkb(geom: &Geometry, options: &WriteOptions) -> Result<Vec<u8>, Error> {
    let mut buf = Vec::new();
    write_twkb(&mut buf, geom, options)?;
    Ok(buf)
}

pub fn write_twkb<W: Write + ?Sized>(
    w: &mut W,
    geom: &Geometry,
    options: &WriteOptions,
) -> Result<(), Error> {
    options.validate()?;
    write_geometry(w, geom, options)
}

fn write_geometry<W: Write + ?Sized>(
    w: &mut W,
    geom: &Geometry,
    options: &WriteOptions,
) -> Result<(), Error> {
    let point_type = geom.point_type();
    let mut header = Header {
        geometry_type: geom.geometry_type(),
        precision: options.precision,
        has_ids: false,
        is_empty: has_no_parts(geom),
        has_z: point_type.has_z(),
        has_m: point_type.has_m(),
        z_precision: if point_type.has_z() {
            options.z_precision
        } else {
            0
        },
        m_precision: if point_type.has_m() {
            options.m_precision
        } else {
            0
        },
        size: None,
        bbox: None,
    };

    let mut body = Vec::new();
    if !header.is_empty {
        header.has_ids = ids_of(geom).is_some();
        write_body(&mut body, geom, &header, options)?;
        if options.include_bbox {
            header.bbox = bounds(geom, &header);
        }
    }

    let mut head = Vec::new();
    header.encode(&mut head)?;
    if options.include_size {
        // the size covers the bbox and the body, not the leading header bytes
        let prefix = 2 + (header.has_z || header.has_m) as usize;
        header.size = Some((head.len() - prefix + body.len()) as u64);
        head.clear();
        header.encode(&mut head)?;
    }
    w.write_all(&head)?;
    w.write_all(&body)?;
    Ok(())
}

fn has_no_parts(geom: &Geometry) -> bool {
    match geom {
        Geometry::Point(g) => g.is_empty(),
        Geometry::LineString(g) => g.is_empty(),
        Geometry::Polygon(g) => g.rings.is_empty(),
        Geometry::MultiPoint(g) => g.points.is_empty(),
        Geometry::MultiLineString(g) => g.lines.is_empty(),
        Geometry::MultiPolygon(g) => g.polygons.is_empty(),
        Geometry::GeometryCollection(g) => g.geometries.is_empty(),
    }
}

fn ids_of(geom: &Geometry) -> Option<&Vec<i64>> {
    match geom {
        Geometry::MultiPoint(g) => g.ids.as_ref(),
        Geometry::MultiLineString(g) => g.ids.as_ref(),
        Geometry::MultiPolygon(g) => g.ids.as_ref(),
        Geometry::GeometryCollection(g) => g.ids.as_ref(),
        _ => None,
    }
}

fn write_body<W: Write + ?Sized>(
    w: &mut W,
    geom: &Geometry,
    header: &Header,
    options: &WriteOptions,
) -> Result<(), Error> {
    let mut acc = Accumulator::new(header.point_type());
    match geom {
        Geometry::Point(g) => write_coords(w, &g.coords, header, &mut acc)?,
        Geometry::LineString(g) => write_line(w, &g.coords, header, &mut acc)?,
        Geometry::Polygon(g) => write_polygon(w, &g.rings, header, &mut acc)?,
        Geometry::MultiPoint(g) => {
            write_parts_header(w, g.points.len(), g.ids.as_ref())?;
            for point in &g.points {
                if point.is_empty() {
                    return Err(Error::Write("MULTIPOINT member is empty".into()));
                }
                write_coords(w, &point.coords, header, &mut acc)?;
            }
        }
        Geometry::MultiLineString(g) => {
            write_parts_header(w, g.lines.len(), g.ids.as_ref())?;
            for line in &g.lines {
                write_line(w, &line.coords, header, &mut acc)?;
            }
        }
        Geometry::MultiPolygon(g) => {
            write_parts_header(w, g.polygons.len(), g.ids.as_ref())?;
            for poly in &g.polygons {
                write_polygon(w, &poly.rings, header, &mut acc)?;
            }
        }
        Geometry::GeometryCollection(g) => {
            write_parts_header(w, g.geometries.len(), g.ids.as_ref())?;
            for member in &g.geometries {
                write_geometry(w, member, options)?;
            }
        }
    }
    Ok(())
}

fn write_parts_header<W: Write + ?Sized>(
    w: &mut W,
    nparts: usize,
    ids: Option<&Vec<i64>>,
) -> Result<(), Error> {
    write_var_u64(w, nparts as u64)?;
    if let Some(ids) = ids {
        if ids.len() != nparts {
            return Err(Error::Write(format!(
                "{} ids for {} parts",
                ids.len(),
                nparts
            )));
        }
        for id in ids {
            write_var_i64(w, *id)?;
        }
    }
    Ok(())
}

fn write_line<W: Write + ?Sized>(
    w: &mut W,
    coords: &CoordSeq,
    header: &Header,
    acc: &mut Accumulator,
) -> Result<(), Error> {
    write_var_u64(w, coords.len() as u64)?;
    write_coords(w, coords, header, acc)
}

fn write_polygon<W: Write + ?Sized>(
    w: &mut W,
    rings: &[CoordSeq],
    header: &Header,
    acc: &mut Accumulator,
) -> Result<(), Error> {
    write_var_u64(w, rings.len() as u64)?;
    for ring in rings {
        write_line(w, ring, header, acc)?;
    }
    Ok(())
}

fn write_coords<W: Write + ?Sized>(
    w: &mut W,
    coords: &CoordSeq,
    header: &Header,
    acc: &mut Accumulator,
) -> Result<(), Error> {
    let precisions = header.axis_precisions();
    let dim = header.point_type().dimension();
    for coord in coords.iter() {
        let axes = header.axes_from_coord(&coord);
        for axis in 0..dim {
            let value = quantize(axes[axis], precisions[axis]);
            write_var_i64(w, acc.delta_to(axis, value))?;
        }
    }
    Ok(())
}

/// Extent of all coordinates in the header's axes, snapped to its precision.
fn bounds(geom: &Geometry, header: &Header) -> Option<BBox> {
    let precisions = header.axis_precisions();
    let dim = header.point_type().dimension();
    let mut min = [i64::MAX; 4];
    let mut max = [i64::MIN; 4];
    let mut seen = false;
    for_each_seq(geom, &mut |seq: &CoordSeq| {
        for coord in seq.iter() {
            let axes = header.axes_from_coord(&coord);
            for axis in 0..dim {
                let value = quantize(axes[axis], precisions[axis]);
                min[axis] = min[axis].min(value);
                max[axis] = max[axis].max(value);
            }
            seen = true;
        }
    });
    if !seen {
        return None;
    }
    let mut lo = [0f64; 4];
    let mut hi = [0f64; 4];
    for axis in 0..dim {
        lo[axis] = descale(min[axis], precisions[axis]);
        hi[axis] = descale(max[axis], precisions[axis]);
    }
    Some(BBox {
        min: header.coord_from_axes(&lo),
        max: header.coord_from_axes(&hi),
    })
}

fn for_each_seq(geom: &Geometry, f: &mut dyn FnMut(&CoordSeq)) {
    match geom {
        Geometry::Point(g) => f(&g.coords),
        Geometry::LineString(g) => f(&g.coords),
        Geometry::Polygon(g) => {
            for ring in &g.rings {
                f(ring);
            }
        }
        Geometry::MultiPoint(g) => {
            for point in &g.points {
                f(&point.coords);
            }
        }
        Geometry::MultiLineString(g) => {
            for line in &g.lines {
                f(&line.coords);
            }
        }
        Geometry::MultiPolygon(g) => {
            for ring in g.polygons.iter().flat_map(|p| p.rings.iter()) {
                f(ring);
            }
        }
        Geometry::GeometryCollection(g) => {
            for member in &g.geometries {
                for_each_seq(member, f);
            }
        }
    }
}
