//! OSM map-extract parsing.
//!
//! Ski-area extracts are small enough that a line-oriented scan over the XML
//! beats pulling in a full XML parser: nodes are collected into an id map,
//! then each `<way>` block is classified from its tags and resolved into a
//! point sequence.
//!
//! Classification rules, accreted against real resorts:
//! - `piste:difficulty` or `piste:type=downhill` marks a trail
//! - `piste:type` backcountry/nordic/skitour, `landuse=grass`, and
//!   `natural=grassland` mark terrain to exclude
//! - `gladed=yes`, `leaf_type`, and the literals "glade"/"Glade"/
//!   "Tree Skiing" add one difficulty modifier point (once per way);
//!   `gladed=no` retracts it for mapped woods that are not actually skied
//!   as glades
//! - `leaf_type`, `area=yes`, and `natural=wood` mark area geometry
//! - `aerialway` marks a lift, except zip lines and stations

use std::collections::{HashMap, HashSet};
use std::path::Path;

use log::{info, warn};

use crate::error::{PisteMapError, Result};
use crate::TrailPoint;

/// One classified way with its node refs resolved to points.
#[derive(Debug, Clone)]
pub struct OsmWay {
    pub name: String,
    pub id: String,
    pub points: Vec<TrailPoint>,
    pub difficulty_modifier: i32,
    pub is_area: bool,
}

/// Every trail and lift found in one extract.
#[derive(Debug, Clone, Default)]
pub struct ParsedOsm {
    pub trails: Vec<OsmWay>,
    pub lifts: Vec<OsmWay>,
}

#[derive(Debug, Default)]
struct WayAttributes {
    name: String,
    id: String,
    node_refs: Vec<String>,
    is_trail: bool,
    is_lift: bool,
    is_glade: bool,
    is_backcountry: bool,
    is_area: bool,
    glade_override: bool,
    difficulty_modifier: i32,
}

/// Extract the value of `key="..."` from a line, matching on a preceding
/// space so `id` never matches `uid`.
fn attribute<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let marker = format!(" {}=\"", key);
    let start = line.find(&marker)? + marker.len();
    let rest = &line[start..];
    let end = rest.find('"')?;
    Some(&rest[..end])
}

fn apply_tag_line(line: &str, way: &mut WayAttributes) {
    if line.contains("<nd") {
        if let Some(node_ref) = attribute(line, "ref") {
            if !node_ref.is_empty() {
                way.node_refs.push(node_ref.to_string());
            }
        }
    }
    if line.contains("<tag k=\"name\"") {
        if let Some(name) = attribute(line, "v") {
            way.name = name.to_string();
        }
    }
    if line.contains("<tag k=\"piste:difficulty\"") {
        way.is_trail = true;
    }
    if line.contains("<tag k=\"piste:type\"") {
        if line.contains("downhill") {
            way.is_trail = true;
        }
        if line.contains("backcountry") || line.contains("nordic") || line.contains("skitour") {
            way.is_backcountry = true;
        }
    }
    if line.contains("<tag k=\"landuse\" v=\"grass\"/>")
        || line.contains("<tag k=\"natural\" v=\"grassland\"/>")
    {
        way.is_backcountry = true;
    }
    if line.contains("<tag k=\"gladed\" v=\"yes\"/>") && !way.is_glade {
        way.difficulty_modifier += 1;
        way.is_glade = true;
    }
    if line.contains("<tag k=\"gladed\" v=\"no\"/>") {
        way.glade_override = true;
    }
    if line.contains("<tag k=\"leaf_type\"") {
        if !way.is_glade {
            way.difficulty_modifier += 1;
            way.is_glade = true;
        }
        way.is_area = true;
    }
    if line.contains("<tag k=\"area\" v=\"yes\"/>") || line.contains("<tag k=\"natural\" v=\"wood\"/>") {
        way.is_area = true;
    }
    if (line.contains("glade") || line.contains("Glade") || line.contains("Tree Skiing"))
        && !way.is_glade
    {
        way.difficulty_modifier += 1;
        way.is_glade = true;
    }
    if line.contains("<tag k=\"aerialway\"")
        && !line.contains("v=\"zip_line\"")
        && !line.contains("v=\"station\"")
    {
        way.is_lift = true;
    }
}

/// Assign a unique display key: blank names become ` _N`, collisions get a
/// `_N` suffix. The counter is shared so suffixes never repeat either.
fn unique_name(raw: &str, used: &mut HashSet<String>, counter: &mut u32) -> String {
    let mut name = if raw.is_empty() {
        let name = format!(" _{}", counter);
        *counter += 1;
        name
    } else {
        raw.to_string()
    };
    if used.contains(&name) {
        name = format!("{}_{}", name, counter);
        *counter += 1;
    }
    used.insert(name.clone());
    name
}

/// Parse an extract's full text into classified, point-resolved ways.
///
/// `blacklist` drops the listed way ids; with `whitelist_mode` the same list
/// instead drops everything NOT listed.
pub fn parse_osm(content: &str, blacklist: &[String], whitelist_mode: bool) -> ParsedOsm {
    let mut nodes: HashMap<String, TrailPoint> = HashMap::new();
    let mut parsed = ParsedOsm::default();
    let mut used_names: HashSet<String> = HashSet::new();
    let mut name_counter: u32 = 0;
    let mut current: Option<WayAttributes> = None;

    for line in content.lines() {
        if line.contains("<node") {
            if let (Some(id), Some(lat), Some(lon)) = (
                attribute(line, "id"),
                attribute(line, "lat"),
                attribute(line, "lon"),
            ) {
                match (lat.parse::<f64>(), lon.parse::<f64>()) {
                    (Ok(lat), Ok(lon)) => {
                        nodes.insert(id.to_string(), TrailPoint::new(lat, lon));
                    }
                    _ => warn!("Unparseable node coordinates: {}", line.trim()),
                }
            }
            continue;
        }

        if line.contains("<way") {
            let id = attribute(line, "id").unwrap_or_default().to_string();
            let listed = blacklist.iter().any(|entry| *entry == id);
            let excluded = if whitelist_mode { !listed } else { listed };
            current = if excluded {
                None
            } else {
                Some(WayAttributes {
                    id,
                    ..WayAttributes::default()
                })
            };
            continue;
        }

        if line.contains("</way>") {
            let Some(mut way) = current.take() else {
                continue;
            };
            if way.glade_override && way.is_glade {
                way.difficulty_modifier -= 1;
            }

            let points: Vec<TrailPoint> = way
                .node_refs
                .iter()
                .filter_map(|node_ref| {
                    let point = nodes.get(node_ref).copied();
                    if point.is_none() {
                        warn!("Way {} references unknown node {}", way.id, node_ref);
                    }
                    point
                })
                .collect();

            if way.is_trail && !way.is_backcountry {
                let name = unique_name(&way.name, &mut used_names, &mut name_counter);
                parsed.trails.push(OsmWay {
                    name,
                    id: way.id.clone(),
                    points: points.clone(),
                    difficulty_modifier: way.difficulty_modifier,
                    is_area: way.is_area,
                });
            }
            if way.is_lift {
                let name = unique_name(&way.name, &mut used_names, &mut name_counter);
                parsed.lifts.push(OsmWay {
                    name,
                    id: way.id,
                    points,
                    difficulty_modifier: 0,
                    is_area: false,
                });
            }
            continue;
        }

        if let Some(way) = current.as_mut() {
            apply_tag_line(line, way);
        }
    }

    info!(
        "Parsed {} trails and {} lifts from extract",
        parsed.trails.len(),
        parsed.lifts.len()
    );
    parsed
}

/// Read and parse an extract from disk.
pub fn parse_osm_file(path: &Path, blacklist: &[String], whitelist_mode: bool) -> Result<ParsedOsm> {
    let content = std::fs::read_to_string(path).map_err(|err| PisteMapError::ParseError {
        path: path.display().to_string(),
        message: err.to_string(),
    })?;
    Ok(parse_osm(&content, blacklist, whitelist_mode))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NODES: &str = r#"
  <node id="1" lat="44.5000" lon="-72.7800"/>
  <node id="2" lat="44.5010" lon="-72.7800"/>
  <node id="3" lat="44.5020" lon="-72.7810"/>
"#;

    fn extract(ways: &str) -> String {
        format!("<osm>\n{}{}\n</osm>", NODES, ways)
    }

    #[test]
    fn test_trail_with_difficulty_tag() {
        let osm = extract(
            r#"  <way id="100">
    <nd ref="1"/>
    <nd ref="2"/>
    <tag k="name" v="nosedive"/>
    <tag k="piste:difficulty" v="expert"/>
  </way>"#,
        );
        let parsed = parse_osm(&osm, &[], false);
        assert_eq!(parsed.trails.len(), 1);
        let trail = &parsed.trails[0];
        assert_eq!(trail.name, "nosedive");
        assert_eq!(trail.id, "100");
        assert_eq!(trail.points.len(), 2);
        assert_eq!(trail.points[0], TrailPoint::new(44.5000, -72.7800));
        assert_eq!(trail.difficulty_modifier, 0);
        assert!(!trail.is_area);
    }

    #[test]
    fn test_backcountry_excluded() {
        let osm = extract(
            r#"  <way id="100">
    <nd ref="1"/>
    <tag k="piste:type" v="downhill"/>
    <tag k="piste:type" v="backcountry"/>
  </way>"#,
        );
        let parsed = parse_osm(&osm, &[], false);
        assert!(parsed.trails.is_empty());
    }

    #[test]
    fn test_glade_modifier_applied_once() {
        // Both the tag and the name would match; the modifier still lands once
        let osm = extract(
            r#"  <way id="100">
    <nd ref="1"/>
    <tag k="name" v="tres_amigos_glade"/>
    <tag k="piste:difficulty" v="expert"/>
    <tag k="gladed" v="yes"/>
  </way>"#,
        );
        let parsed = parse_osm(&osm, &[], false);
        assert_eq!(parsed.trails[0].difficulty_modifier, 1);
    }

    #[test]
    fn test_gladed_no_retracts_modifier() {
        let osm = extract(
            r#"  <way id="100">
    <nd ref="1"/>
    <tag k="piste:difficulty" v="easy"/>
    <tag k="leaf_type" v="broadleaved"/>
    <tag k="gladed" v="no"/>
  </way>"#,
        );
        let parsed = parse_osm(&osm, &[], false);
        let trail = &parsed.trails[0];
        assert_eq!(trail.difficulty_modifier, 0);
        // leaf_type still marks area geometry
        assert!(trail.is_area);
    }

    #[test]
    fn test_lift_classification() {
        let osm = extract(
            r#"  <way id="200">
    <nd ref="1"/>
    <nd ref="3"/>
    <tag k="name" v="fourrunner quad"/>
    <tag k="aerialway" v="chair_lift"/>
  </way>
  <way id="201">
    <nd ref="1"/>
    <tag k="aerialway" v="zip_line"/>
  </way>"#,
        );
        let parsed = parse_osm(&osm, &[], false);
        assert_eq!(parsed.lifts.len(), 1);
        assert_eq!(parsed.lifts[0].name, "fourrunner quad");
    }

    #[test]
    fn test_blacklist_and_whitelist() {
        let ways = r#"  <way id="100">
    <nd ref="1"/>
    <tag k="name" v="nosedive"/>
    <tag k="piste:difficulty" v="expert"/>
  </way>
  <way id="101">
    <nd ref="2"/>
    <tag k="name" v="chin clip"/>
    <tag k="piste:difficulty" v="advanced"/>
  </way>"#;
        let osm = extract(ways);
        let list = vec!["100".to_string()];

        let blacklisted = parse_osm(&osm, &list, false);
        assert_eq!(blacklisted.trails.len(), 1);
        assert_eq!(blacklisted.trails[0].name, "chin clip");

        let whitelisted = parse_osm(&osm, &list, true);
        assert_eq!(whitelisted.trails.len(), 1);
        assert_eq!(whitelisted.trails[0].name, "nosedive");
    }

    #[test]
    fn test_blank_and_duplicate_names() {
        let ways = r#"  <way id="100">
    <nd ref="1"/>
    <tag k="piste:difficulty" v="easy"/>
  </way>
  <way id="101">
    <nd ref="2"/>
    <tag k="name" v="standard"/>
    <tag k="piste:difficulty" v="easy"/>
  </way>
  <way id="102">
    <nd ref="3"/>
    <tag k="name" v="standard"/>
    <tag k="piste:difficulty" v="easy"/>
  </way>"#;
        let parsed = parse_osm(&extract(ways), &[], false);
        let names: Vec<_> = parsed.trails.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names[0], " _0");
        assert_eq!(names[1], "standard");
        assert_eq!(names[2], "standard_1");
    }

    #[test]
    fn test_unknown_node_ref_skipped() {
        let osm = extract(
            r#"  <way id="100">
    <nd ref="1"/>
    <nd ref="999"/>
    <tag k="piste:difficulty" v="easy"/>
  </way>"#,
        );
        let parsed = parse_osm(&osm, &[], false);
        assert_eq!(parsed.trails[0].points.len(), 1);
    }

    #[test]
    fn test_missing_file_is_parse_error() {
        let result = parse_osm_file(Path::new("/nonexistent/resort.osm"), &[], false);
        assert!(matches!(result, Err(PisteMapError::ParseError { .. })));
    }
}
