use crate::rollcall::*;

use std::collections::HashMap;

use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde_json::Map as JSMap;
use vote_geo::tables::{fips_state, state_fips};

#[derive(Debug, Clone, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, Clone, Deserialize)]
struct Feature {
    properties: Option<JSMap<String, JSValue>>,
    geometry: Option<GeometryJs>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
enum GeometryJs {
    Polygon {
        coordinates: Vec<Vec<Vec<f64>>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Vec<f64>>>>,
    },
    #[serde(other)]
    Unsupported,
}

fn ring(points: &[Vec<f64>]) -> Result<LineString<f64>, String> {
    points
        .iter()
        .map(|p| match p.as_slice() {
            [x, y, ..] => Ok(Coord { x: *x, y: *y }),
            _ => Err(format!("position with {} coordinates", p.len())),
        })
        .collect::<Result<Vec<Coord<f64>>, String>>()
        .map(LineString::from)
}

fn polygon(rings: &[Vec<Vec<f64>>]) -> Result<Polygon<f64>, String> {
    let (exterior, interiors) = match rings.split_first() {
        Some(x) => x,
        None => return Err("polygon without rings".to_string()),
    };
    let interiors = interiors
        .iter()
        .map(|r| ring(r))
        .collect::<Result<Vec<_>, String>>()?;
    Ok(Polygon::new(ring(exterior)?, interiors))
}

fn to_multi_polygon(geometry: &GeometryJs) -> Result<Option<MultiPolygon<f64>>, String> {
    match geometry {
        GeometryJs::Polygon { coordinates } => Ok(Some(MultiPolygon::new(vec![polygon(
            coordinates,
        )?]))),
        GeometryJs::MultiPolygon { coordinates } => {
            let polys = coordinates
                .iter()
                .map(|p| polygon(p))
                .collect::<Result<Vec<_>, String>>()?;
            Ok(Some(MultiPolygon::new(polys)))
        }
        GeometryJs::Unsupported => Ok(None),
    }
}

// Census files are not consistent about strings and numbers.
fn property(props: &JSMap<String, JSValue>, key: &str) -> Option<String> {
    match props.get(key) {
        Some(JSValue::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(JSValue::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// The key of a state feature: its postal code, or its FIPS code as a fallback.
fn state_key(props: &JSMap<String, JSValue>) -> Option<String> {
    property(props, "STUSPS")
        .or_else(|| property(props, "STATEFP").and_then(|fp| fips_state(&fp).map(String::from)))
        .map(|s| s.to_ascii_uppercase())
        .filter(|s| state_fips(s).is_some())
}

/// The GEOID of a district feature, from `GEOID` or from `STATEFP` and the
/// district field of the vintage (`CD116FP`, `CD118FP`, ...).
///
/// The "ZZ" districts of the Census (water areas) have no key.
fn district_key(props: &JSMap<String, JSValue>) -> Option<(String, String)> {
    let (statefp, district) = match property(props, "GEOID") {
        Some(geoid) if geoid.len() >= 3 && geoid.is_char_boundary(2) => {
            let (fp, d) = geoid.split_at(2);
            (fp.to_string(), d.to_string())
        }
        _ => {
            let statefp = property(props, "STATEFP")?;
            let cd_field = props.keys().find(|k| {
                k.len() > 4
                    && k.starts_with("CD")
                    && k.ends_with("FP")
                    && k[2..k.len() - 2].chars().all(|c| c.is_ascii_digit())
            })?;
            (statefp, property(props, cd_field)?)
        }
    };
    let statefp = format!("{:0>2}", statefp);
    fips_state(&statefp)?;
    let district = normalize_district(&district)?;
    Some((statefp.clone(), format!("{}{}", statefp, district)))
}

/// Reads the boundaries of the chamber from a GeoJSON feature collection.
///
/// States are keyed by postal code, districts by their 5-digit GEOID. Features of
/// the excluded states, and features without a usable key, are dropped. Several
/// features with the same key are merged into one entity.
pub fn read_geometry(
    path: &str,
    chamber: Chamber,
    excluded: &[String],
) -> BMapResult<Vec<GeometryEntity>> {
    info!("Reading {} geometry from {:?}", chamber, path);
    let contents = fs::read_to_string(path).context(OpeningGeometrySnafu { path })?;
    let entities = parse_geometry(&contents, path, chamber, excluded)?;
    info!("Read {} entities from {:?}", entities.len(), path);
    Ok(entities)
}

pub fn parse_geometry(
    contents: &str,
    path: &str,
    chamber: Chamber,
    excluded: &[String],
) -> MapResult<Vec<GeometryEntity>> {
    let fc: FeatureCollection =
        serde_json::from_str(contents).context(ParsingGeometrySnafu { path })?;
    let is_excluded = |postal: &str| excluded.iter().any(|e| e.eq_ignore_ascii_case(postal));

    let mut entities: Vec<GeometryEntity> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut dropped: u64 = 0;
    for (idx, feature) in fc.features.iter().enumerate() {
        let empty = JSMap::new();
        let props = feature.properties.as_ref().unwrap_or(&empty);
        let (postal, key, display_name) = match chamber {
            Chamber::Senate => match state_key(props) {
                Some(postal) => {
                    let name = property(props, "NAME").unwrap_or_else(|| postal.clone());
                    (postal.clone(), postal, name)
                }
                None => {
                    debug!("parse_geometry: feature {} has no state code", idx);
                    dropped += 1;
                    continue;
                }
            },
            Chamber::House => match district_key(props) {
                Some((statefp, geoid)) => {
                    let postal = fips_state(&statefp).unwrap_or_default().to_string();
                    let name = property(props, "NAMELSAD")
                        .or_else(|| property(props, "NAME"))
                        .map(|n| format!("{} {}", postal, n))
                        .unwrap_or_else(|| geoid.clone());
                    (postal, geoid, name)
                }
                None => {
                    debug!("parse_geometry: feature {} has no district key", idx);
                    dropped += 1;
                    continue;
                }
            },
        };
        if is_excluded(&postal) {
            continue;
        }
        let boundary = match &feature.geometry {
            Some(g) => match to_multi_polygon(g) {
                Ok(Some(mp)) => mp,
                Ok(None) => {
                    warn!("Feature {} ({}) is not a polygon, skipping", idx, key);
                    dropped += 1;
                    continue;
                }
                Err(reason) => {
                    return InvalidGeometrySnafu {
                        path,
                        reason: format!("feature {} ({}): {}", idx, key, reason),
                    }
                    .fail();
                }
            },
            None => MultiPolygon::new(vec![]),
        };
        match positions.get(&key) {
            Some(&pos) => {
                debug!("parse_geometry: merging feature {} into {}", idx, key);
                entities[pos].boundary.0.extend(boundary.0);
            }
            None => {
                positions.insert(key.clone(), entities.len());
                entities.push(GeometryEntity {
                    geo_key: GeoKey::new(key),
                    boundary,
                    display_name,
                });
            }
        }
    }
    if dropped > 0 {
        warn!("{} features of {} could not be keyed and were dropped", dropped, path);
    }
    Ok(entities)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Centroid;

    const SQUARE: &str = r#"{"type":"Polygon","coordinates":[[[0,0],[2,0],[2,2],[0,2],[0,0]]]}"#;

    fn collection(features: &[(&str, &str)]) -> String {
        let fs: Vec<String> = features
            .iter()
            .map(|(props, geom)| {
                format!(
                    r#"{{"type":"Feature","properties":{},"geometry":{}}}"#,
                    props, geom
                )
            })
            .collect();
        format!(r#"{{"type":"FeatureCollection","features":[{}]}}"#, fs.join(","))
    }

    fn keys(entities: &[GeometryEntity]) -> Vec<&str> {
        entities.iter().map(|e| e.geo_key.as_str()).collect()
    }

    #[test]
    fn states_with_exclusions() {
        let contents = collection(&[
            (r#"{"STUSPS":"CA","NAME":"California"}"#, SQUARE),
            (r#"{"STUSPS":"DC","NAME":"District of Columbia"}"#, SQUARE),
            (r#"{"STATEFP":"48","NAME":"Texas"}"#, SQUARE),
            (r#"{"NAME":"Nowhere"}"#, SQUARE),
        ]);
        let excluded = vec!["DC".to_string()];
        let entities = parse_geometry(&contents, "s.json", Chamber::Senate, &excluded).unwrap();
        assert_eq!(keys(&entities), vec!["CA", "TX"]);
        assert_eq!(entities[0].display_name, "California");
        let c = entities[0].boundary.centroid().unwrap();
        assert_eq!((c.x(), c.y()), (1.0, 1.0));
    }

    #[test]
    fn district_keys() {
        let contents = collection(&[
            (r#"{"GEOID":"0612","NAMELSAD":"Congressional District 12"}"#, SQUARE),
            (r#"{"STATEFP":"56","CD118FP":"00"}"#, SQUARE),
            (r#"{"STATEFP":"06","CD116FP":"ZZ"}"#, SQUARE),
            (r#"{"GEOID":"15001"}"#, SQUARE),
            (r#"{"GEOID":"36010"}"#, SQUARE),
        ]);
        let excluded = vec!["HI".to_string()];
        let entities = parse_geometry(&contents, "d.json", Chamber::House, &excluded).unwrap();
        assert_eq!(keys(&entities), vec!["06012", "56000", "36010"]);
        assert_eq!(entities[0].display_name, "CA Congressional District 12");
        assert_eq!(entities[1].display_name, "56000");
    }

    #[test]
    fn merges_multi_part_features() {
        let other = r#"{"type":"MultiPolygon","coordinates":[[[[5,5],[6,5],[6,6],[5,6],[5,5]]],[[[7,7],[8,7],[8,8],[7,8],[7,7]]]]}"#;
        let contents = collection(&[
            (r#"{"STUSPS":"MI"}"#, SQUARE),
            (r#"{"STUSPS":"MI"}"#, other),
        ]);
        let entities = parse_geometry(&contents, "s.json", Chamber::Senate, &[]).unwrap();
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].boundary.0.len(), 3);
    }

    #[test]
    fn invalid_geometry() {
        let bad = r#"{"type":"Polygon","coordinates":[[[0],[2,0],[2,2],[0,0]]]}"#;
        let contents = collection(&[(r#"{"STUSPS":"CA"}"#, bad)]);
        let res = parse_geometry(&contents, "s.json", Chamber::Senate, &[]);
        assert!(matches!(res, Err(MapError::InvalidGeometry { .. })));

        let res = parse_geometry("not json", "s.json", Chamber::Senate, &[]);
        assert!(matches!(res, Err(MapError::ParsingGeometry { .. })));
    }

    #[test]
    fn missing_file() {
        let res = read_geometry("/nonexistent/states.geojson", Chamber::Senate, &[]);
        assert!(matches!(
            res.map_err(|e| *e),
            Err(MapError::OpeningGeometry { .. })
        ));
    }
}
