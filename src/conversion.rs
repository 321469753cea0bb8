//! Conversions between TWKB geometries and [`geo_types`].
//!
//! `geo_types` is two-dimensional, so Z and M are dropped on the way out and
//! everything coming in is plain XY.

use crate::error::Error;
use crate::twkb::{
    Coord, CoordSeq, Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint,
    MultiPolygon, Point, PointType, Polygon,
};
use geo_types::geometry as geo;

// --- TWKB to geo-types

fn to_geo_coord(c: Coord) -> geo::Coord<f64> {
    geo::Coord { x: c.x, y: c.y }
}

fn to_geo_line(coords: &CoordSeq) -> geo::LineString<f64> {
    geo::LineString(coords.iter().map(to_geo_coord).collect())
}

fn to_geo_polygon(poly: &Polygon) -> geo::Polygon<f64> {
    let exterior = poly.shell().map(to_geo_line).unwrap_or_else(|| geo::LineString(Vec::new()));
    let interiors = poly.holes().iter().map(to_geo_line).collect();
    geo::Polygon::new(exterior, interiors)
}

impl TryFrom<&Point> for geo::Point<f64> {
    type Error = Error;

    fn try_from(point: &Point) -> Result<Self, Error> {
        point
            .coord()
            .map(|c| geo::Point(to_geo_coord(c)))
            .ok_or_else(|| Error::Other("geo_types::Point cannot be empty".into()))
    }
}

impl From<&LineString> for geo::LineString<f64> {
    fn from(line: &LineString) -> Self {
        to_geo_line(&line.coords)
    }
}

/// Rings are closed by `geo_types` if the encoding left them open.
impl From<&Polygon> for geo::Polygon<f64> {
    fn from(poly: &Polygon) -> Self {
        to_geo_polygon(poly)
    }
}

impl TryFrom<Geometry> for geo::Geometry<f64> {
    type Error = Error;

    fn try_from(geom: Geometry) -> Result<Self, Error> {
        Ok(match geom {
            Geometry::Point(g) => geo::Geometry::Point((&g).try_into()?),
            Geometry::LineString(g) => geo::Geometry::LineString((&g).into()),
            Geometry::Polygon(g) => geo::Geometry::Polygon((&g).into()),
            Geometry::MultiPoint(g) => geo::Geometry::MultiPoint(geo::MultiPoint(
                g.points.iter().map(geo::Point::<f64>::try_from).collect::<Result<_, _>>()?,
            )),
            Geometry::MultiLineString(g) => geo::Geometry::MultiLineString(geo::MultiLineString(
                g.lines.iter().map(geo::LineString::<f64>::from).collect(),
            )),
            Geometry::MultiPolygon(g) => geo::Geometry::MultiPolygon(geo::MultiPolygon(
                g.polygons.iter().map(geo::Polygon::<f64>::from).collect(),
            )),
            Geometry::GeometryCollection(g) => {
                geo::Geometry::GeometryCollection(geo::GeometryCollection(
                    g.geometries
                        .into_iter()
                        .map(geo::Geometry::try_from)
                        .collect::<Result<_, _>>()?,
                ))
            }
        })
    }
}

// --- geo-types to TWKB

fn from_geo_line(line: &geo::LineString<f64>) -> CoordSeq {
    let mut seq = CoordSeq::with_capacity(PointType::Point, line.0.len());
    for c in &line.0 {
        seq.push(Coord::new(c.x, c.y));
    }
    seq
}

fn from_geo_polygon(poly: &geo::Polygon<f64>) -> Polygon {
    let mut rings = vec![from_geo_line(poly.exterior())];
    rings.extend(poly.interiors().iter().map(from_geo_line));
    Polygon {
        rings,
        point_type: PointType::Point,
    }
}

impl From<&geo::Point<f64>> for Point {
    fn from(point: &geo::Point<f64>) -> Self {
        Point::new(Coord::new(point.x(), point.y()))
    }
}

impl From<&geo::Geometry<f64>> for Geometry {
    fn from(geom: &geo::Geometry<f64>) -> Self {
        match geom {
            geo::Geometry::Point(p) => Geometry::Point(p.into()),
            geo::Geometry::Line(l) => {
                let mut seq = CoordSeq::with_capacity(PointType::Point, 2);
                seq.push(Coord::new(l.start.x, l.start.y));
                seq.push(Coord::new(l.end.x, l.end.y));
                Geometry::LineString(LineString::new(seq))
            }
            geo::Geometry::LineString(l) => Geometry::LineString(LineString::new(from_geo_line(l))),
            geo::Geometry::Polygon(p) => Geometry::Polygon(from_geo_polygon(p)),
            geo::Geometry::MultiPoint(mp) => Geometry::MultiPoint(MultiPoint {
                points: mp.0.iter().map(Point::from).collect(),
                ids: None,
                point_type: PointType::Point,
            }),
            geo::Geometry::MultiLineString(ml) => Geometry::MultiLineString(MultiLineString {
                lines: ml.0.iter().map(|l| LineString::new(from_geo_line(l))).collect(),
                ids: None,
                point_type: PointType::Point,
            }),
            geo::Geometry::MultiPolygon(mp) => Geometry::MultiPolygon(MultiPolygon {
                polygons: mp.0.iter().map(from_geo_polygon).collect(),
                ids: None,
                point_type: PointType::Point,
            }),
            geo::Geometry::GeometryCollection(gc) => {
                Geometry::GeometryCollection(GeometryCollection {
                    geometries: gc.0.iter().map(Geometry::from).collect(),
                    ids: None,
                    point_type: PointType::Point,
                })
            }
            geo::Geometry::Rect(r) => Geometry::Polygon(from_geo_polygon(&r.to_polygon())),
            geo::Geometry::Triangle(t) => Geometry::Polygon(from_geo_polygon(&t.to_polygon())),
        }
    }
}

#[cfg(test)]
#[rustfmt::skip]
mod tests {
    use super::*;
    use crate::twkb::{read, to_twkb, GeometryType, WriteOptions};
    use geo_types::{coord, line_string, point, polygon};

    fn hex_read(hexstr: &str) -> Geometry {
        read(&hex::decode(hexstr).unwrap()).unwrap()
    }

    #[test]
    fn test_to_geo_point() {
        let geom = geo::Geometry::try_from(hex_read("01000204")).unwrap();
        assert_eq!(geom, geo::Geometry::Point(point!(x: 1.0, y: 2.0)));

        // Z and M are dropped
        let geom = geo::Geometry::try_from(hex_read("01080302040608")).unwrap();
        assert_eq!(geom, geo::Geometry::Point(point!(x: 1.0, y: 2.0)));

        assert!(matches!(geo::Geometry::try_from(hex_read("a110")), Err(Error::Other(_))));
    }

    #[test]
    fn test_to_geo_line() {
        let geom = geo::Geometry::try_from(hex_read("a20002c09a0c80b51880b51880b518")).unwrap();
        assert_eq!(geom, geo::Geometry::LineString(line_string![(x: 1.0, y: 2.0), (x: 3.0, y: 4.0)]));
    }

    #[test]
    fn test_to_geo_polygon() {
        let geom = geo::Geometry::try_from(hex_read("a3000104c09a0c80b51880b51880b51880b51880b518ffe930ffe930")).unwrap();
        let expected = polygon![(x: 1.0, y: 2.0), (x: 3.0, y: 4.0), (x: 5.0, y: 6.0), (x: 1.0, y: 2.0)];
        assert_eq!(geom, geo::Geometry::Polygon(expected));

        // open ring (0 0,2 0,2 2) gets closed
        let poly = Polygon::try_from(hex_read("03000103000004000004")).unwrap();
        let geo_poly = geo::Polygon::from(&poly);
        assert_eq!(geo_poly.exterior().0.len(), 4);
        assert_eq!(geo_poly.exterior().0[3], coord! { x: 0.0, y: 0.0 });

        let empty = geo::Polygon::from(&Polygon::new(PointType::Point));
        assert!(empty.exterior().0.is_empty());
    }

    #[test]
    fn test_to_geo_collection() {
        let geom = geo::Geometry::try_from(hex_read("0700020100020402000202040404")).unwrap();
        let expected = geo::GeometryCollection(vec![
            geo::Geometry::Point(point!(x: 1.0, y: 2.0)),
            geo::Geometry::LineString(line_string![(x: 1.0, y: 2.0), (x: 3.0, y: 4.0)]),
        ]);
        assert_eq!(geom, geo::Geometry::GeometryCollection(expected));

        let multi = geo::Geometry::try_from(hex_read("0404020a0114271326")).unwrap();
        assert_eq!(multi, geo::Geometry::MultiPoint(geo::MultiPoint(vec![point!(x: 10.0, y: -20.0), point!(x: 0.0, y: -1.0)])));
    }

    #[test]
    fn test_from_geo() {
        let line = geo::Geometry::LineString(line_string![(x: 1.0, y: 2.0), (x: 3.0, y: 4.0)]);
        let geom = Geometry::from(&line);
        assert_eq!(geom.to_string(), "LINESTRING(1 2,3 4)");
        assert_eq!(hex::encode(to_twkb(&geom, &WriteOptions::with_precision(5)).unwrap()), "a20002c09a0c80b51880b51880b518");

        let l = geo::Geometry::Line(geo::Line::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 1.0, y: 1.0 }));
        assert_eq!(Geometry::from(&l).to_string(), "LINESTRING(0 0,1 1)");

        let rect = geo::Geometry::Rect(geo::Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 2.0, y: 1.0 }));
        let poly = Polygon::try_from(Geometry::from(&rect)).unwrap();
        assert_eq!(poly.rings.len(), 1);
        assert_eq!(poly.rings[0].len(), 5);

        let tri = geo::Geometry::Triangle(geo::Triangle::new(
            coord! { x: 0.0, y: 0.0 }, coord! { x: 1.0, y: 0.0 }, coord! { x: 0.0, y: 1.0 },
        ));
        assert_eq!(Geometry::from(&tri).geometry_type(), GeometryType::Polygon);
    }

    #[test]
    fn test_geo_round_trip() {
        let poly = polygon!(
            exterior: [(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 0.0)],
            interiors: [[(x: 1.0, y: 1.0), (x: 2.0, y: 1.0), (x: 2.0, y: 2.0), (x: 1.0, y: 1.0)]]
        );
        let collection = geo::Geometry::GeometryCollection(geo::GeometryCollection(vec![
            geo::Geometry::Polygon(poly.clone()),
            geo::Geometry::MultiPolygon(geo::MultiPolygon(vec![poly])),
            geo::Geometry::MultiLineString(geo::MultiLineString(vec![line_string![(x: -3.5, y: 2.25), (x: 4.0, y: 4.0)]])),
        ]));
        let twkb = to_twkb(&Geometry::from(&collection), &WriteOptions::with_precision(2)).unwrap();
        let back = geo::Geometry::try_from(read(&twkb).unwrap()).unwrap();
        assert_eq!(back, collection);
    }
}
