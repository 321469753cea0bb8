use crate::error::Error;
use crate::twkb::encoding::Cursor;
use crate::twkb::header::{GeometryType, Header};
use crate::twkb::point::*;
use crate::twkb::{read, TwkbRead};
use std::fmt;

/// Collections nested deeper than this are rejected as malformed.
const MAX_NESTING: usize = 64;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(PartialEq, Clone, Debug, Default)]
pub struct Point {
    /// Zero coordinates for `POINT EMPTY`, one otherwise.
    pub coords: CoordSeq,
}

impl Point {
    pub fn new(coord: Coord) -> Self {
        let mut coords = CoordSeq::with_capacity(coord.point_type(), 1);
        coords.push(coord);
        Point { coords }
    }

    pub fn empty(point_type: PointType) -> Self {
        Point {
            coords: CoordSeq::new(point_type),
        }
    }

    pub fn coord(&self) -> Option<Coord> {
        self.coords.get(0)
    }

    /// X ordinate, `NaN` for an empty point.
    pub fn x(&self) -> f64 {
        self.coord().map_or(f64::NAN, |c| c.x)
    }

    /// Y ordinate, `NaN` for an empty point.
    pub fn y(&self) -> f64 {
        self.coord().map_or(f64::NAN, |c| c.y)
    }

    pub fn point_type(&self) -> PointType {
        self.coords.point_type()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(PartialEq, Clone, Debug, Default)]
pub struct LineString {
    pub coords: CoordSeq,
}

impl LineString {
    pub fn new(coords: CoordSeq) -> Self {
        LineString { coords }
    }

    pub fn point_type(&self) -> PointType {
        self.coords.point_type()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }
}

/// Polygon as a list of rings, the first one being the shell.
///
/// Rings are kept exactly as encoded, closure is not checked.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(PartialEq, Clone, Debug, Default)]
pub struct Polygon {
    pub rings: Vec<CoordSeq>,
    pub point_type: PointType,
}

impl Polygon {
    pub fn new(point_type: PointType) -> Self {
        Polygon {
            rings: Vec::new(),
            point_type,
        }
    }

    pub fn shell(&self) -> Option<&CoordSeq> {
        self.rings.first()
    }

    pub fn holes(&self) -> &[CoordSeq] {
        self.rings.get(1..).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.rings.iter().all(CoordSeq::is_empty)
    }
}

macro_rules! multi_geometry_type {
    ($geotype:ident contains $itemtype:ident named $itemname:ident) => {
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[derive(PartialEq, Clone, Debug, Default)]
        pub struct $geotype {
            pub $itemname: Vec<$itemtype>,
            /// Per-part identifiers, when the encoder wrote an id list.
            pub ids: Option<Vec<i64>>,
            pub point_type: PointType,
        }

        impl $geotype {
            pub fn new(point_type: PointType) -> Self {
                $geotype {
                    $itemname: Vec::new(),
                    ids: None,
                    point_type,
                }
            }

            pub fn is_empty(&self) -> bool {
                self.$itemname.iter().all($itemtype::is_empty)
            }
        }
    };
}

multi_geometry_type!(MultiPoint contains Point named points);
multi_geometry_type!(MultiLineString contains LineString named lines);
multi_geometry_type!(MultiPolygon contains Polygon named polygons);
multi_geometry_type!(GeometryCollection contains Geometry named geometries);

/// Generic TWKB geometry.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(PartialEq, Clone, Debug)]
pub enum Geometry {
    Point(Point),
    LineString(LineString),
    Polygon(Polygon),
    MultiPoint(MultiPoint),
    MultiLineString(MultiLineString),
    MultiPolygon(MultiPolygon),
    GeometryCollection(GeometryCollection),
}

impl Geometry {
    /// Empty value of the given kind.
    pub fn empty(geometry_type: GeometryType, point_type: PointType) -> Self {
        match geometry_type {
            GeometryType::Point => Geometry::Point(Point::empty(point_type)),
            GeometryType::LineString => {
                Geometry::LineString(LineString::new(CoordSeq::new(point_type)))
            }
            GeometryType::Polygon => Geometry::Polygon(Polygon::new(point_type)),
            GeometryType::MultiPoint => Geometry::MultiPoint(MultiPoint::new(point_type)),
            GeometryType::MultiLineString => {
                Geometry::MultiLineString(MultiLineString::new(point_type))
            }
            GeometryType::MultiPolygon => Geometry::MultiPolygon(MultiPolygon::new(point_type)),
            GeometryType::GeometryCollection => {
                Geometry::GeometryCollection(GeometryCollection::new(point_type))
            }
        }
    }

    pub fn geometry_type(&self) -> GeometryType {
        match self {
            Geometry::Point(_) => GeometryType::Point,
            Geometry::LineString(_) => GeometryType::LineString,
            Geometry::Polygon(_) => GeometryType::Polygon,
            Geometry::MultiPoint(_) => GeometryType::MultiPoint,
            Geometry::MultiLineString(_) => GeometryType::MultiLineString,
            Geometry::MultiPolygon(_) => GeometryType::MultiPolygon,
            Geometry::GeometryCollection(_) => GeometryType::GeometryCollection,
        }
    }

    pub fn point_type(&self) -> PointType {
        match self {
            Geometry::Point(g) => g.point_type(),
            Geometry::LineString(g) => g.point_type(),
            Geometry::Polygon(g) => g.point_type,
            Geometry::MultiPoint(g) => g.point_type,
            Geometry::MultiLineString(g) => g.point_type,
            Geometry::MultiPolygon(g) => g.point_type,
            Geometry::GeometryCollection(g) => g.point_type,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Geometry::Point(g) => g.is_empty(),
            Geometry::LineString(g) => g.is_empty(),
            Geometry::Polygon(g) => g.is_empty(),
            Geometry::MultiPoint(g) => g.is_empty(),
            Geometry::MultiLineString(g) => g.is_empty(),
            Geometry::MultiPolygon(g) => g.is_empty(),
            Geometry::GeometryCollection(g) => g.is_empty(),
        }
    }
}

macro_rules! impl_geometry_variant {
    ($geotype:ident) => {
        impl From<$geotype> for Geometry {
            fn from(geom: $geotype) -> Self {
                Geometry::$geotype(geom)
            }
        }

        impl TryFrom<Geometry> for $geotype {
            type Error = Error;

            fn try_from(geom: Geometry) -> Result<Self, Error> {
                match geom {
                    Geometry::$geotype(g) => Ok(g),
                    other => Err(Error::UnexpectedGeometryType {
                        expected: GeometryType::$geotype,
                        found: other.geometry_type(),
                    }),
                }
            }
        }

        impl TwkbRead for $geotype {
            fn read_twkb(raw: &[u8]) -> Result<Self, Error> {
                $geotype::try_from(read(raw)?)
            }
        }
    };
}

impl_geometry_variant!(Point);
impl_geometry_variant!(LineString);
impl_geometry_variant!(Polygon);
impl_geometry_variant!(MultiPoint);
impl_geometry_variant!(MultiLineString);
impl_geometry_variant!(MultiPolygon);
impl_geometry_variant!(GeometryCollection);

// --- decoding

/// Decodes one geometry, header included, with a fresh accumulator.
pub(crate) fn decode_geometry(raw: &mut Cursor, depth: usize) -> Result<Geometry, Error> {
    if depth > MAX_NESTING {
        return Err(Error::Malformed(format!(
            "geometry collections nested deeper than {} levels",
            MAX_NESTING
        )));
    }
    let header = Header::decode(raw)?;
    let point_type = header.point_type();
    if header.is_empty {
        return Ok(Geometry::empty(header.geometry_type, point_type));
    }
    let mut acc = Accumulator::new(point_type);
    let geom = match header.geometry_type {
        GeometryType::Point => Geometry::Point(Point {
            coords: read_coordinates(raw, &header, &mut acc, 1)?,
        }),
        GeometryType::LineString => Geometry::LineString(read_line(raw, &header, &mut acc)?),
        GeometryType::Polygon => Geometry::Polygon(read_polygon(raw, &header, &mut acc)?),
        GeometryType::MultiPoint => {
            // npoints           uvarint
            // [idlist]          varint[]
            // pointarray        varint[]
            let npoints = raw.read_count()?;
            let ids = read_idlist(raw, &header, npoints)?;
            let mut points = Vec::with_capacity(bounded(npoints, raw));
            for _ in 0..npoints {
                points.push(Point {
                    coords: read_coordinates(raw, &header, &mut acc, 1)?,
                });
            }
            Geometry::MultiPoint(MultiPoint {
                points,
                ids,
                point_type,
            })
        }
        GeometryType::MultiLineString => {
            let nlines = raw.read_count()?;
            let ids = read_idlist(raw, &header, nlines)?;
            let mut lines = Vec::with_capacity(bounded(nlines, raw));
            for _ in 0..nlines {
                lines.push(read_line(raw, &header, &mut acc)?);
            }
            Geometry::MultiLineString(MultiLineString {
                lines,
                ids,
                point_type,
            })
        }
        GeometryType::MultiPolygon => {
            let npolygons = raw.read_count()?;
            let ids = read_idlist(raw, &header, npolygons)?;
            let mut polygons = Vec::with_capacity(bounded(npolygons, raw));
            for _ in 0..npolygons {
                polygons.push(read_polygon(raw, &header, &mut acc)?);
            }
            Geometry::MultiPolygon(MultiPolygon {
                polygons,
                ids,
                point_type,
            })
        }
        GeometryType::GeometryCollection => {
            // every member carries its own header, precision and dimensions
            let ngeoms = raw.read_count()?;
            let ids = read_idlist(raw, &header, ngeoms)?;
            let mut geometries = Vec::with_capacity(bounded(ngeoms, raw));
            for _ in 0..ngeoms {
                geometries.push(decode_geometry(raw, depth + 1)?);
            }
            Geometry::GeometryCollection(GeometryCollection {
                geometries,
                ids,
                point_type,
            })
        }
    };
    Ok(geom)
}

fn read_line(raw: &mut Cursor, header: &Header, acc: &mut Accumulator) -> Result<LineString, Error> {
    // npoints           uvarint
    // pointarray        varint[]
    let npoints = raw.read_count()?;
    Ok(LineString {
        coords: read_coordinates(raw, header, acc, npoints)?,
    })
}

fn read_polygon(raw: &mut Cursor, header: &Header, acc: &mut Accumulator) -> Result<Polygon, Error> {
    // nrings            uvarint
    // npoints[0]        uvarint
    // pointarray[0]     varint[]
    // ...
    let nrings = raw.read_count()?;
    let mut rings = Vec::with_capacity(bounded(nrings, raw));
    for _ in 0..nrings {
        let npoints = raw.read_count()?;
        rings.push(read_coordinates(raw, header, acc, npoints)?);
    }
    Ok(Polygon {
        rings,
        point_type: header.point_type(),
    })
}

fn read_idlist(raw: &mut Cursor, header: &Header, size: usize) -> Result<Option<Vec<i64>>, Error> {
    if !header.has_ids {
        return Ok(None);
    }
    let mut ids = Vec::with_capacity(bounded(size, raw));
    for _ in 0..size {
        ids.push(raw.read_var_i64()?);
    }
    Ok(Some(ids))
}

/// Caps a pre-allocation at the bytes left, each element needs at least one.
fn bounded(count: usize, raw: &Cursor) -> usize {
    count.min(raw.remaining())
}

// --- WKT output

fn dimension_tag(point_type: PointType) -> &'static str {
    match point_type {
        PointType::Point => "",
        PointType::PointZ => " Z",
        PointType::PointM => " M",
        PointType::PointZM => " ZM",
    }
}

fn fmt_rings(f: &mut fmt::Formatter<'_>, rings: &[CoordSeq]) -> fmt::Result {
    f.write_str("(")?;
    for (i, ring) in rings.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        write!(f, "({})", ring)?;
    }
    f.write_str(")")
}

impl fmt::Display for Geometry {
    /// Formats the geometry as WKT, e.g. `POINT(1 2)` or `LINESTRING Z EMPTY`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.geometry_type(), dimension_tag(self.point_type()))?;
        if self.is_empty() {
            return f.write_str(" EMPTY");
        }
        match self {
            Geometry::Point(g) => write!(f, "({})", g.coords),
            Geometry::LineString(g) => write!(f, "({})", g.coords),
            Geometry::Polygon(g) => fmt_rings(f, &g.rings),
            Geometry::MultiPoint(g) => {
                let points: Vec<String> = g.points.iter().map(|p| format!("({})", p.coords)).collect();
                write!(f, "({})", points.join(","))
            }
            Geometry::MultiLineString(g) => {
                let lines: Vec<String> = g.lines.iter().map(|l| format!("({})", l.coords)).collect();
                write!(f, "({})", lines.join(","))
            }
            Geometry::MultiPolygon(g) => {
                f.write_str("(")?;
                for (i, poly) in g.polygons.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    fmt_rings(f, &poly.rings)?;
                }
                f.write_str(")")
            }
            Geometry::GeometryCollection(g) => {
                let geoms: Vec<String> = g.geometries.iter().map(|g| g.to_string()).collect();
                write!(f, "({})", geoms.join(","))
            }
        }
    }
}

#[cfg(test)]
#[rustfmt::skip]
mod tests {
    use super::*;

    fn decode(hexstr: &str) -> Result<Geometry, Error> {
        let twkb = hex::decode(hexstr).unwrap();
        decode_geometry(&mut Cursor::new(&twkb), 0)
    }

    fn wkt(hexstr: &str) -> String {
        decode(hexstr).unwrap().to_string()
    }

    #[test]
    fn test_read_point() {
        assert_eq!(wkt("01001427"), "POINT(10 -20)"); // SELECT encode(ST_AsTWKB('POINT(10 -20)'::geometry), 'hex')
        assert_eq!(wkt("0108011427c601"), "POINT Z(10 -20 99)"); // SELECT encode(ST_AsTWKB('POINT(10 -20 99)'::geometry), 'hex')
        assert_eq!(wkt("2100ca019503"), "POINT(10.1 -20.3)"); // SELECT encode(ST_AsTWKB('POINT(10.12 -20.34)'::geometry, 1), 'hex')
        assert_eq!(wkt("11000203"), "POINT(10 -20)"); // SELECT encode(ST_AsTWKB('POINT(11.12 -22.34)'::geometry, -1), 'hex')
        assert_eq!(wkt("0110"), "POINT EMPTY"); // SELECT encode(ST_AsTWKB('POINT EMPTY'::geometry), 'hex')
        assert_eq!(wkt("a10080897aff91f401"), "POINT(10 -20)"); // SELECT encode(ST_AsTWKB('SRID=4326;POINT(10 -20)'::geometry), 'hex')

        let point = Point::try_from(decode("0110").unwrap()).unwrap();
        assert!(point.is_empty());
        assert!(point.x().is_nan());
    }

    #[test]
    fn test_read_point_m() {
        // ext byte 0x02: M only
        let geom = decode("010802020406").unwrap();
        let point = Point::try_from(geom).unwrap();
        assert_eq!(point.point_type(), PointType::PointM);
        assert_eq!(point.coords.dimension(), 3);
        assert_eq!(point.coord(), Some(Coord { x: 1.0, y: 2.0, z: None, m: Some(3.0) }));
    }

    #[test]
    fn test_read_line() {
        assert_eq!(wkt("02000214271326"), "LINESTRING(10 -20,0 -1)"); // SELECT encode(ST_AsTWKB('LINESTRING (10 -20, -0 -0.5)'::geometry), 'hex')
        assert_eq!(wkt("220002c8018f03c7018603"), "LINESTRING(10 -20,0 -0.5)"); // SELECT encode(ST_AsTWKB('LINESTRING (10 -20, -0 -0.5)'::geometry, 1), 'hex')
        assert_eq!(wkt("0210"), "LINESTRING EMPTY"); // SELECT encode(ST_AsTWKB('LINESTRING EMPTY'::geometry), 'hex')
    }

    #[test]
    fn test_read_polygon() {
        // SELECT encode(ST_AsTWKB('POLYGON ((0 0, 2 0, 2 2, 0 2, 0 0),(10 10, -2 10, -2 -2, 10 -2, 10 10))'::geometry), 'hex')
        let poly = Polygon::try_from(decode("03000205000004000004030000030514141700001718000018").unwrap()).unwrap();
        assert_eq!(poly.rings.len(), 2);
        assert_eq!(poly.shell().unwrap().to_string(), "0 0,2 0,2 2,0 2,0 0");
        // the second ring continues from the last point of the shell
        assert_eq!(poly.holes()[0].to_string(), "10 10,-2 10,-2 -2,10 -2,10 10");

        assert_eq!(wkt("0310"), "POLYGON EMPTY");
    }

    #[test]
    fn test_read_polygon_unclosed_ring() {
        // ring of three points whose last point differs from the first
        let poly = Polygon::try_from(decode("03000103000004000004").unwrap()).unwrap();
        assert_eq!(poly.shell().unwrap().to_string(), "0 0,2 0,2 2");
    }

    #[test]
    fn test_read_multipoint() {
        // SELECT encode(ST_AsTWKB('MULTIPOINT ((10 -20), (0 -0.5))'::geometry), 'hex')
        let geom = decode("04000214271326").unwrap();
        assert_eq!(geom.to_string(), "MULTIPOINT((10 -20),(0 -1))");
        let points = MultiPoint::try_from(geom).unwrap();
        assert_eq!(points.ids, None);
        assert_eq!(points.points[1].y(), -1.0);
    }

    #[test]
    fn test_read_multipoint_ids() {
        // MULTIPOINT((10 -20),(0 -1)) with ids 5 and -1
        let points = MultiPoint::try_from(decode("0404020a0114271326").unwrap()).unwrap();
        assert_eq!(points.ids, Some(vec![5, -1]));
        assert_eq!(points.points.len(), 2);
        assert_eq!(points.points[0].x(), 10.0);
    }

    #[test]
    fn test_read_multiline() {
        // SELECT encode(ST_AsTWKB('MULTILINESTRING ((10 -20, 0 -0.5), (0 0, 2 0))'::geometry), 'hex')
        assert_eq!(wkt("05000202142713260200020400"), "MULTILINESTRING((10 -20,0 -1),(0 0,2 0))");
        assert_eq!(wkt("0510"), "MULTILINESTRING EMPTY");
    }

    #[test]
    fn test_read_multipolygon() {
        // SELECT encode(ST_AsTWKB('MULTIPOLYGON (((0 0, 2 0, 2 2, 0 2, 0 0)), ((10 10, -2 10, -2 -2, 10 -2, 10 10)))'::geometry), 'hex')
        assert_eq!(
            wkt("060002010500000400000403000003010514141700001718000018"),
            "MULTIPOLYGON(((0 0,2 0,2 2,0 2,0 0)),((10 10,-2 10,-2 -2,10 -2,10 10)))"
        );
        assert_eq!(wkt("0610"), "MULTIPOLYGON EMPTY");
    }

    #[test]
    fn test_read_geometrycollection() {
        assert_eq!(wkt("a70001a100c09a0c80b518"), "GEOMETRYCOLLECTION(POINT(1 2))");
        // members restart delta coding
        let gc = GeometryCollection::try_from(decode("0700020100020402000202040404").unwrap()).unwrap();
        assert_eq!(gc.geometries.len(), 2);
        assert_eq!(gc.geometries[0].to_string(), "POINT(1 2)");
        assert_eq!(gc.geometries[1].to_string(), "LINESTRING(1 2,3 4)");
        assert_eq!(wkt("0710"), "GEOMETRYCOLLECTION EMPTY");
    }

    #[test]
    fn test_read_nested_too_deep() {
        let mut hexstr = "070001".repeat(MAX_NESTING + 1);
        hexstr.push_str("0100");
        assert!(matches!(decode(&hexstr), Err(Error::Malformed(_))));

        let mut hexstr = "070001".repeat(MAX_NESTING);
        hexstr.push_str("01000204");
        assert!(decode(&hexstr).is_ok());
    }

    #[test]
    fn test_read_huge_count() {
        // a corrupt count must fail on missing bytes, not on allocation
        assert!(matches!(decode("0200ffffffffffffffff7f"), Err(Error::Truncated(_))));
    }

    #[test]
    fn test_empty_constructors() {
        for code in 1..=7 {
            let geometry_type = GeometryType::try_from(code).unwrap();
            let geom = Geometry::empty(geometry_type, PointType::PointZ);
            assert!(geom.is_empty());
            assert_eq!(geom.geometry_type(), geometry_type);
            assert_eq!(geom.point_type(), PointType::PointZ);
        }
    }

    #[test]
    fn test_unexpected_type() {
        let res = LineString::try_from(decode("01000204").unwrap());
        assert!(matches!(
            res,
            Err(Error::UnexpectedGeometryType { expected: GeometryType::LineString, found: GeometryType::Point })
        ));
    }
}
