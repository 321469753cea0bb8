use crate::error::Error;
use crate::twkb::encoding::{descale, Cursor};
use crate::twkb::header::Header;
use std::fmt;

/// Dimensionality of a coordinate.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default, Hash)]
pub enum PointType {
    #[default]
    Point,
    PointZ,
    PointM,
    PointZM,
}

impl PointType {
    pub fn from_flags(has_z: bool, has_m: bool) -> Self {
        match (has_z, has_m) {
            (false, false) => PointType::Point,
            (true, false) => PointType::PointZ,
            (false, true) => PointType::PointM,
            (true, true) => PointType::PointZM,
        }
    }

    pub fn has_z(&self) -> bool {
        matches!(self, PointType::PointZ | PointType::PointZM)
    }

    pub fn has_m(&self) -> bool {
        matches!(self, PointType::PointM | PointType::PointZM)
    }

    /// Number of ordinates per coordinate, 2 to 4.
    pub fn dimension(&self) -> usize {
        2 + self.has_z() as usize + self.has_m() as usize
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(PartialEq, Clone, Copy, Debug, Default)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
    pub m: Option<f64>,
}

impl Coord {
    pub fn new(x: f64, y: f64) -> Self {
        Coord {
            x,
            y,
            z: None,
            m: None,
        }
    }

    pub fn point_type(&self) -> PointType {
        PointType::from_flags(self.z.is_some(), self.m.is_some())
    }
}

impl From<(f64, f64)> for Coord {
    fn from((x, y): (f64, f64)) -> Self {
        Coord::new(x, y)
    }
}

impl From<(f64, f64, f64)> for Coord {
    fn from((x, y, z): (f64, f64, f64)) -> Self {
        Coord {
            x,
            y,
            z: Some(z),
            m: None,
        }
    }
}

impl From<(f64, f64, f64, f64)> for Coord {
    fn from((x, y, z, m): (f64, f64, f64, f64)) -> Self {
        Coord {
            x,
            y,
            z: Some(z),
            m: Some(m),
        }
    }
}

/// Coordinates stored as one flat ordinate array, `point_type.dimension()`
/// ordinates per coordinate in x, y, [z], [m] order.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(PartialEq, Clone, Debug, Default)]
pub struct CoordSeq {
    point_type: PointType,
    ordinates: Vec<f64>,
}

impl CoordSeq {
    pub fn new(point_type: PointType) -> Self {
        CoordSeq {
            point_type,
            ordinates: Vec::new(),
        }
    }

    pub fn with_capacity(point_type: PointType, capacity: usize) -> Self {
        CoordSeq {
            point_type,
            ordinates: Vec::with_capacity(capacity * point_type.dimension()),
        }
    }

    pub fn from_ordinates(point_type: PointType, ordinates: Vec<f64>) -> Result<Self, Error> {
        if !ordinates.len().is_multiple_of(point_type.dimension()) {
            return Err(Error::Other(format!(
                "{} ordinates do not make whole {:?} coordinates",
                ordinates.len(),
                point_type
            )));
        }
        Ok(CoordSeq {
            point_type,
            ordinates,
        })
    }

    pub fn point_type(&self) -> PointType {
        self.point_type
    }

    pub fn dimension(&self) -> usize {
        self.point_type.dimension()
    }

    pub fn len(&self) -> usize {
        self.ordinates.len() / self.dimension()
    }

    pub fn is_empty(&self) -> bool {
        self.ordinates.is_empty()
    }

    pub fn ordinates(&self) -> &[f64] {
        &self.ordinates
    }

    pub fn get(&self, index: usize) -> Option<Coord> {
        let dim = self.dimension();
        self.ordinates
            .get(index * dim..(index + 1) * dim)
            .map(|o| self.coord_at(o))
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = Coord> + '_ {
        self.ordinates
            .chunks_exact(self.dimension())
            .map(|o| self.coord_at(o))
    }

    /// Appends a coordinate; ordinates the sequence does not carry are
    /// dropped and missing ones are filled with 0.
    pub fn push(&mut self, coord: Coord) {
        self.ordinates.push(coord.x);
        self.ordinates.push(coord.y);
        if self.point_type.has_z() {
            self.ordinates.push(coord.z.unwrap_or(0.0));
        }
        if self.point_type.has_m() {
            self.ordinates.push(coord.m.unwrap_or(0.0));
        }
    }

    fn coord_at(&self, o: &[f64]) -> Coord {
        let (z, m) = match self.point_type {
            PointType::Point => (None, None),
            PointType::PointZ => (Some(o[2]), None),
            PointType::PointM => (None, Some(o[2])),
            PointType::PointZM => (Some(o[2]), Some(o[3])),
        };
        Coord {
            x: o[0],
            y: o[1],
            z,
            m,
        }
    }
}

impl fmt::Display for CoordSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, c) in self.ordinates.chunks_exact(self.dimension()).enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            let ords: Vec<String> = c.iter().map(|v| v.to_string()).collect();
            f.write_str(&ords.join(" "))?;
        }
        Ok(())
    }
}

/// Running absolute position used to undo delta coding, one integer per axis.
///
/// Starts at zero for every geometry header and carries over between rings and
/// parts of the same geometry.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Accumulator {
    values: [i64; 4],
    dimension: usize,
}

impl Accumulator {
    pub fn new(point_type: PointType) -> Self {
        Accumulator {
            values: [0; 4],
            dimension: point_type.dimension(),
        }
    }

    pub fn values(&self) -> &[i64] {
        &self.values[..self.dimension]
    }

    /// Adds `delta` to `axis` and returns the new absolute value.
    pub fn advance(&mut self, axis: usize, delta: i64) -> i64 {
        self.values[axis] = self.values[axis].wrapping_add(delta);
        self.values[axis]
    }

    /// Returns the delta from the current position to `value` and moves there.
    pub fn delta_to(&mut self, axis: usize, value: i64) -> i64 {
        let delta = value.wrapping_sub(self.values[axis]);
        self.values[axis] = value;
        delta
    }
}

/// Reads `count` delta-coded coordinates.
pub fn read_coordinates(
    raw: &mut Cursor,
    header: &Header,
    acc: &mut Accumulator,
    count: usize,
) -> Result<CoordSeq, Error> {
    let point_type = header.point_type();
    if header.is_empty || count == 0 {
        return Ok(CoordSeq::new(point_type));
    }
    let dim = point_type.dimension();
    let precisions = header.axis_precisions();
    // every ordinate takes at least one byte
    let mut seq = CoordSeq::with_capacity(point_type, count.min(raw.remaining() / dim));
    for _ in 0..count {
        for (axis, &precision) in precisions.iter().enumerate().take(dim) {
            let value = acc.advance(axis, raw.read_var_i64()?);
            seq.ordinates.push(descale(value, precision));
        }
    }
    Ok(seq)
}
