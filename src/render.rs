//! SVG map and comparison chart rendering.
//!
//! The trail map is drawn straight into an SVG string with `<path>` and
//! `<text>` elements; there is no drawing library in between. Trails are
//! colored by tier, gladed trails are dashed, areas get a translucent fill
//! plus an outline, lifts are grey, and each sufficiently long trail
//! carries a rotated name label resolved by the `label` module.
//!
//! Map coordinates are plain latitude/longitude mirrored per the chosen
//! [`MapOrientation`], then uniformly scaled into the pixel canvas. No
//! projection: at ski-area extents the distortion is below a stroke width.

use std::fmt::Write;

use log::{info, warn};

use crate::label::place_label;
use crate::mountain::{Mountain, MountainSummary, TrailRecord};
use crate::{format_name, Bounds, TrailPoint};

/// Lift stroke color.
const LIFT_COLOR: &str = "grey";

/// Legend entries beyond the tier colors.
const GLADED_LEGEND_LABEL: &str = "Gladed";

/// Data attribution line at the bottom of every map.
const SOURCE_CREDIT: &str = "Sources: USGS and OpenStreetMap";

/// Which way the mountain faces, i.e. which compass direction points down
/// the hill toward the viewer.
///
/// The downhill direction becomes "toward the bottom of the page", the way
/// resort trail maps are drawn; west-facing is the Vermont default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapOrientation {
    WestFacing,
    EastFacing,
    SouthFacing,
    NorthFacing,
}

impl MapOrientation {
    /// (lat_mirror, lon_mirror, flip_lat_lon) for the plot transform.
    fn transform(&self) -> (f64, f64, bool) {
        match self {
            MapOrientation::WestFacing => (1.0, -1.0, false),
            MapOrientation::EastFacing => (-1.0, 1.0, false),
            MapOrientation::SouthFacing => (1.0, 1.0, true),
            MapOrientation::NorthFacing => (-1.0, -1.0, true),
        }
    }

    /// Whether latitude runs along the vertical page axis.
    pub fn flip_lat_lon(&self) -> bool {
        self.transform().2
    }
}

/// Rendering knobs with sensible print-like defaults.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Canvas scale in pixels per kilometer of terrain.
    pub pixels_per_km: f64,

    /// Padding around the drawing area, in pixels.
    pub padding: f64,

    /// Trail and lift stroke width, in pixels.
    pub stroke_width: f64,

    /// Label font size, in pixels.
    pub label_font_size: f64,

    /// Minimum trail length to receive a name label, in meters. Short
    /// trails render but stay unlabeled so the map does not clutter.
    pub min_labeled_trail_length: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            pixels_per_km: 400.0,
            padding: 40.0,
            stroke_width: 2.0,
            label_font_size: 11.0,
            min_labeled_trail_length: 200.0,
        }
    }
}

/// Escape text for embedding in SVG attribute values and element content.
fn xml_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

/// Lat/lon to canvas pixels for one orientation.
struct Projection {
    lat_mirror: f64,
    lon_mirror: f64,
    flip: bool,
    min_x: f64,
    max_y: f64,
    scale: f64,
    offset_x: f64,
    offset_y: f64,
}

impl Projection {
    /// Mirrored plot coordinates, before pixel fitting.
    fn plot(&self, point: &TrailPoint) -> (f64, f64) {
        if self.flip {
            (
                point.longitude * self.lon_mirror,
                point.latitude * self.lat_mirror,
            )
        } else {
            (
                point.latitude * self.lat_mirror,
                point.longitude * self.lon_mirror,
            )
        }
    }

    /// Canvas pixel position (y grows downward).
    fn pixel(&self, point: &TrailPoint) -> (f64, f64) {
        let (x, y) = self.plot(point);
        (
            self.offset_x + (x - self.min_x) * self.scale,
            self.offset_y + (self.max_y - y) * self.scale,
        )
    }
}

fn fit_projection(
    bounds: &Bounds,
    orientation: MapOrientation,
    config: &RenderConfig,
    inner_w: f64,
    inner_h: f64,
    top: f64,
) -> Projection {
    let (lat_mirror, lon_mirror, flip) = orientation.transform();
    let mut projection = Projection {
        lat_mirror,
        lon_mirror,
        flip,
        min_x: f64::MAX,
        max_y: f64::MIN,
        scale: 1.0,
        offset_x: config.padding,
        offset_y: top,
    };

    let mut max_x = f64::MIN;
    let mut min_y = f64::MAX;
    let corners = [
        TrailPoint::new(bounds.min_lat, bounds.min_lon),
        TrailPoint::new(bounds.min_lat, bounds.max_lon),
        TrailPoint::new(bounds.max_lat, bounds.min_lon),
        TrailPoint::new(bounds.max_lat, bounds.max_lon),
    ];
    for corner in &corners {
        let (x, y) = projection.plot(corner);
        projection.min_x = projection.min_x.min(x);
        max_x = max_x.max(x);
        min_y = min_y.min(y);
        projection.max_y = projection.max_y.max(y);
    }

    let span_x = (max_x - projection.min_x).max(1e-12);
    let span_y = (projection.max_y - min_y).max(1e-12);
    projection.scale = (inner_w / span_x).min(inner_h / span_y);

    // Center the terrain in the drawing area
    projection.offset_x += (inner_w - span_x * projection.scale) / 2.0;
    projection.offset_y += (inner_h - span_y * projection.scale) / 2.0;

    projection
}

/// Build the SVG `d` attribute for a point sequence.
fn path_d(points: &[TrailPoint], projection: &Projection, close: bool) -> Option<String> {
    if points.len() < 2 {
        return None;
    }
    let mut d = points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let (x, y) = projection.pixel(p);
            let cmd = if i == 0 { "M" } else { "L" };
            format!("{cmd} {:.1} {:.1}", x, y)
        })
        .collect::<Vec<_>>()
        .join(" ");
    if close {
        d.push_str(" Z");
    }
    Some(d)
}

fn write_trail(out: &mut String, trail: &TrailRecord, projection: &Projection, config: &RenderConfig) {
    let color = trail.tier().color();
    let dash = if trail.difficulty_modifier > 0 {
        r#" stroke-dasharray="6 4""#
    } else {
        ""
    };

    let Some(d) = path_d(&trail.line.points, projection, trail.is_area) else {
        warn!("Trail '{}' has too few points to draw", trail.name);
        return;
    };

    if trail.is_area {
        // Translucent wash plus an outline; the rating still comes from the
        // centerline, the perimeter is just what the skier sees on paper.
        let _ = writeln!(
            out,
            r#"    <path d="{}" fill="{}" fill-opacity="0.1" stroke="none"/>"#,
            d, color,
        );
        let _ = writeln!(
            out,
            r#"    <path d="{}" fill="none" stroke="{}" stroke-width="{}"{}/>"#,
            d, color, config.stroke_width, dash,
        );
    } else {
        let _ = writeln!(
            out,
            r#"    <path d="{}" fill="none" stroke="{}" stroke-width="{}"{}/>"#,
            d, color, config.stroke_width, dash,
        );
    }
}

fn write_trail_label(
    out: &mut String,
    trail: &TrailRecord,
    projection: &Projection,
    config: &RenderConfig,
) {
    if trail.line.length() <= config.min_labeled_trail_length {
        return;
    }

    let text = trail.map_label();
    let placement = place_label(&trail.line.points, text.chars().count(), projection.flip);
    let anchor = match trail.line.points.get(placement.index) {
        Some(point) => point,
        None => return,
    };
    let (x, y) = projection.pixel(anchor);

    // Extreme trails draw gold; gold text on white is unreadable
    let color = match trail.tier().color() {
        "gold" => "black",
        other => other,
    };

    // SVG rotation is clockwise while the placement angle is measured in
    // y-up plot coordinates
    let _ = writeln!(
        out,
        r#"    <text x="{:.1}" y="{:.1}" font-size="{}" fill="{}" text-anchor="middle" dominant-baseline="middle" transform="rotate({:.1} {:.1} {:.1})">{}</text>"#,
        x,
        y,
        config.label_font_size,
        color,
        -placement.angle_degrees,
        x,
        y,
        xml_escape(&text),
    );
}

fn write_legend(out: &mut String, x_center: f64, y: f64, config: &RenderConfig) {
    use crate::difficulty::Tier;

    let entries: Vec<(&str, &str, bool)> = Tier::all()
        .iter()
        .map(|tier| (tier.color(), tier.label(), false))
        .chain(std::iter::once(("black", GLADED_LEGEND_LABEL, true)))
        .collect();

    // Three columns, two rows
    let columns = 3;
    let cell_w = 110.0;
    let cell_h = 16.0;
    let x_start = x_center - (columns as f64 * cell_w) / 2.0;

    let _ = writeln!(out, r#"  <g font-size="{}" font-family="sans-serif">"#, config.label_font_size);
    for (i, (color, label, dotted)) in entries.iter().enumerate() {
        let cx = x_start + (i % columns) as f64 * cell_w;
        let cy = y + (i / columns) as f64 * cell_h;
        let dash = if *dotted { r#" stroke-dasharray="2 3""# } else { "" };
        let _ = writeln!(
            out,
            r#"    <line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="{}" stroke-width="2"{}/>"#,
            cx,
            cy,
            cx + 24.0,
            cy,
            color,
            dash,
        );
        let _ = writeln!(
            out,
            r#"    <text x="{:.1}" y="{:.1}" dominant-baseline="middle">{}</text>"#,
            cx + 30.0,
            cy,
            label,
        );
    }
    let _ = writeln!(out, "  </g>");
}

/// Render the full trail map for one mountain.
///
/// The canvas size follows the terrain's ground extent (swapping axes for
/// north/south-facing maps) so the aspect ratio stays honest.
pub fn render_map(mountain: &Mountain, orientation: MapOrientation, config: &RenderConfig) -> String {
    let title_band = 40.0;
    let legend_band = 56.0;

    let Some(bounds) = mountain.bounds() else {
        warn!("Nothing to draw for '{}'", mountain.name);
        let mut out = String::new();
        let _ = writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        let _ = writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="200" height="100" viewBox="0 0 200 100">"#
        );
        let _ = writeln!(out, "</svg>");
        return out;
    };

    let (north_south_km, east_west_km) = bounds.extent_km();
    // Unflipped maps put latitude on the horizontal axis
    let (width_km, height_km) = if orientation.flip_lat_lon() {
        (east_west_km, north_south_km)
    } else {
        (north_south_km, east_west_km)
    };

    let inner_w = (width_km * config.pixels_per_km).max(100.0);
    let inner_h = (height_km * config.pixels_per_km).max(100.0);
    let width = inner_w + 2.0 * config.padding;
    let height = inner_h + 2.0 * config.padding + title_band + legend_band;

    let projection = fit_projection(
        &bounds,
        orientation,
        config,
        inner_w,
        inner_h,
        title_band + config.padding,
    );

    let mut out = String::new();
    let _ = writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{:.0}" height="{:.0}" viewBox="0 0 {:.0} {:.0}">"#,
        width, height, width, height,
    );
    let _ = writeln!(
        out,
        r#"  <rect width="{:.0}" height="{:.0}" fill="white"/>"#,
        width, height,
    );

    if !mountain.name.is_empty() {
        // Title scales with the terrain so small areas don't get shouted at
        let title_size = (width_km * 10.0).clamp(5.0, 25.0);
        let _ = writeln!(
            out,
            r#"  <text x="{:.1}" y="{:.1}" font-size="{:.0}" font-family="sans-serif" text-anchor="middle">{}</text>"#,
            width / 2.0,
            title_band / 2.0 + 8.0,
            title_size,
            xml_escape(&format_name(&mountain.name)),
        );
    }

    // Lifts under the trails, trails under the labels
    let _ = writeln!(out, r#"  <g id="lifts">"#);
    for lift in &mountain.lifts {
        if let Some(d) = path_d(&lift.points, &projection, false) {
            let _ = writeln!(
                out,
                r#"    <path d="{}" fill="none" stroke="{}" stroke-width="{}"/>"#,
                d, LIFT_COLOR, config.stroke_width,
            );
        }
    }
    let _ = writeln!(out, "  </g>");

    let _ = writeln!(out, r#"  <g id="trails">"#);
    for trail in &mountain.trails {
        write_trail(&mut out, trail, &projection, config);
    }
    let _ = writeln!(out, "  </g>");

    let _ = writeln!(out, r#"  <g id="labels" font-family="sans-serif">"#);
    for trail in &mountain.trails {
        write_trail_label(&mut out, trail, &projection, config);
    }
    let _ = writeln!(out, "  </g>");

    // No room for a readable legend on very small areas
    if width_km >= 0.5 {
        write_legend(
            &mut out,
            width / 2.0,
            height - legend_band - config.padding / 2.0 + 16.0,
            config,
        );
    }
    let _ = writeln!(
        out,
        r##"  <text x="{:.1}" y="{:.1}" font-size="9" font-family="sans-serif" text-anchor="middle" fill="#555">{}</text>"##,
        width / 2.0,
        height - 6.0,
        SOURCE_CREDIT,
    );

    let _ = writeln!(out, "</svg>");
    info!(
        "Rendered map for '{}': {} trails, {} lifts",
        mountain.name,
        mountain.trails.len(),
        mountain.lifts.len()
    );
    out
}

// ---------------------------------------------------------------------------
// Comparison charts
// ---------------------------------------------------------------------------

fn write_bar_chart(
    out: &mut String,
    title: &str,
    rows: &[(&str, f64)],
    y_offset: f64,
    width: f64,
) -> f64 {
    let bar_height = 16.0;
    let row_gap = 6.0;
    let label_width = 160.0;
    let value_gap = 6.0;
    let chart_left = label_width + 10.0;
    let chart_width = width - chart_left - 60.0;

    let max_value = rows
        .iter()
        .map(|(_, v)| *v)
        .fold(0.0f64, f64::max)
        .max(1e-12);

    let _ = writeln!(
        out,
        r#"  <text x="{:.1}" y="{:.1}" font-size="16" font-weight="bold">{}</text>"#,
        10.0,
        y_offset + 16.0,
        xml_escape(title),
    );

    let mut y = y_offset + 32.0;
    for (name, value) in rows {
        let bar = (value / max_value) * chart_width;
        let _ = writeln!(
            out,
            r#"  <text x="{:.1}" y="{:.1}" dominant-baseline="middle" text-anchor="end">{}</text>"#,
            label_width,
            y + bar_height / 2.0,
            xml_escape(name),
        );
        let _ = writeln!(
            out,
            r#"  <rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="steelblue"/>"#,
            chart_left, y, bar, bar_height,
        );
        let _ = writeln!(
            out,
            r#"  <text x="{:.1}" y="{:.1}" dominant-baseline="middle">{:.1}</text>"#,
            chart_left + bar + value_gap,
            y + bar_height / 2.0,
            value,
        );
        y += bar_height + row_gap;
    }
    y + 16.0
}

/// Render the cross-mountain comparison: one chart ranking mountains by
/// difficulty (hardest first) and one by beginner-friendliness (easiest
/// first).
pub fn render_comparison_charts(summaries: &[MountainSummary]) -> String {
    let width = 640.0;
    let chart_height = 32.0 + summaries.len() as f64 * 22.0 + 16.0;
    let height = chart_height * 2.0 + 20.0;

    let mut by_difficulty: Vec<&MountainSummary> = summaries.iter().collect();
    by_difficulty.sort_by(|a, b| {
        b.difficulty
            .partial_cmp(&a.difficulty)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut by_ease: Vec<&MountainSummary> = summaries.iter().collect();
    by_ease.sort_by(|a, b| {
        a.ease
            .partial_cmp(&b.ease)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut out = String::new();
    let _ = writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{:.0}" height="{:.0}" viewBox="0 0 {:.0} {:.0}" font-family="sans-serif" font-size="12">"#,
        width, height, width, height,
    );
    let _ = writeln!(
        out,
        r#"  <rect width="{:.0}" height="{:.0}" fill="white"/>"#,
        width, height,
    );

    let difficulty_rows: Vec<(String, f64)> = by_difficulty
        .iter()
        .map(|s| (format_name(&s.mountain), s.difficulty))
        .collect();
    let rows: Vec<(&str, f64)> = difficulty_rows
        .iter()
        .map(|(n, v)| (n.as_str(), *v))
        .collect();
    let next_y = write_bar_chart(&mut out, "Most Difficult Mountains", &rows, 10.0, width);

    let ease_rows: Vec<(String, f64)> = by_ease
        .iter()
        .map(|s| (format_name(&s.mountain), s.ease))
        .collect();
    let rows: Vec<(&str, f64)> = ease_rows.iter().map(|(n, v)| (n.as_str(), *v)).collect();
    write_bar_chart(&mut out, "Most Beginner-Friendly Mountains", &rows, next_y, width);

    let _ = writeln!(out, "</svg>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::densify::fill_point_gaps;
    use crate::mountain::{AnalyzedTrack, LiftRecord, TrailRecord};

    /// A ~550 m straight trail descending steadily, long enough to label.
    fn steep_trail(name: &str, modifier: i32, is_area: bool) -> TrailRecord {
        let sparse: Vec<TrailPoint> = (0..6)
            .map(|i| TrailPoint::new(44.500 + 0.001 * i as f64, -72.780))
            .collect();
        let (points, _) = fill_point_gaps(&sparse, None, 15.0);
        let elevations: Vec<f64> = (0..points.len())
            .map(|i| 1200.0 - 6.0 * i as f64)
            .collect();
        let line = AnalyzedTrack::derive(name, points, elevations, 1).unwrap();
        TrailRecord {
            name: name.to_string(),
            way_id: "1".to_string(),
            difficulty_modifier: modifier,
            is_area,
            line,
            centerline: None,
        }
    }

    fn sample_mountain() -> Mountain {
        Mountain {
            name: "spruce_peak".to_string(),
            trails: vec![steep_trail("nosedive", 0, false)],
            lifts: vec![LiftRecord {
                name: "big_spruce".to_string(),
                way_id: "9".to_string(),
                points: vec![
                    TrailPoint::new(44.500, -72.781),
                    TrailPoint::new(44.505, -72.781),
                ],
            }],
        }
    }

    #[test]
    fn test_map_basic_structure() {
        let svg = render_map(
            &sample_mountain(),
            MapOrientation::WestFacing,
            &RenderConfig::default(),
        );
        assert!(svg.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(svg.contains(r#"xmlns="http://www.w3.org/2000/svg""#));
        assert!(svg.contains("Spruce Peak"));
        assert!(svg.contains(SOURCE_CREDIT));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_trail_and_lift_strokes() {
        let svg = render_map(
            &sample_mountain(),
            MapOrientation::WestFacing,
            &RenderConfig::default(),
        );
        assert!(svg.contains(r#"stroke="grey""#));
        // A steady descent lands in one of the tier colors
        let colored = ["green", "royalblue", "black", "red", "gold"]
            .iter()
            .any(|c| svg.contains(&format!(r#"stroke="{}""#, c)));
        assert!(colored);
    }

    #[test]
    fn test_gladed_trail_is_dashed() {
        let mut mountain = sample_mountain();
        mountain.trails[0].difficulty_modifier = 1;
        let svg = render_map(
            &mountain,
            MapOrientation::WestFacing,
            &RenderConfig::default(),
        );
        assert!(svg.contains("stroke-dasharray"));
    }

    #[test]
    fn test_area_gets_fill_and_outline() {
        let mut mountain = sample_mountain();
        mountain.trails[0].is_area = true;
        let svg = render_map(
            &mountain,
            MapOrientation::WestFacing,
            &RenderConfig::default(),
        );
        assert!(svg.contains(r#"fill-opacity="0.1""#));
        // Closed outline
        assert!(svg.contains("Z\" fill=\"none\""));
    }

    #[test]
    fn test_long_trail_labeled_short_trail_not() {
        let svg = render_map(
            &sample_mountain(),
            MapOrientation::WestFacing,
            &RenderConfig::default(),
        );
        assert!(svg.contains("Nosedive"));
        assert!(svg.contains('\u{00b0}'));

        let mut short = sample_mountain();
        short.trails[0].line.points.truncate(3);
        let svg = render_map(
            &short,
            MapOrientation::WestFacing,
            &RenderConfig::default(),
        );
        assert!(!svg.contains("Nosedive"));
    }

    #[test]
    fn test_legend_lists_all_tiers() {
        let svg = render_map(
            &sample_mountain(),
            MapOrientation::WestFacing,
            &RenderConfig::default(),
        );
        for label in ["Easy", "Intermediate", "Advanced", "Expert", "Extreme", "Gladed"] {
            assert!(svg.contains(label), "legend missing {}", label);
        }
    }

    #[test]
    fn test_orientation_swaps_canvas_axes() {
        let mountain = sample_mountain();
        let west = render_map(
            &mountain,
            MapOrientation::WestFacing,
            &RenderConfig::default(),
        );
        let south = render_map(
            &mountain,
            MapOrientation::SouthFacing,
            &RenderConfig::default(),
        );
        // The trail runs north-south: wide west-facing, tall south-facing
        let width_of = |svg: &str| {
            let start = svg.find("width=\"").unwrap() + 7;
            let end = svg[start..].find('"').unwrap();
            svg[start..start + end].parse::<f64>().unwrap()
        };
        assert!(width_of(&west) > width_of(&south));
    }

    #[test]
    fn test_empty_mountain_renders_valid_svg() {
        let empty = Mountain {
            name: "nowhere".to_string(),
            trails: Vec::new(),
            lifts: Vec::new(),
        };
        let svg = render_map(&empty, MapOrientation::WestFacing, &RenderConfig::default());
        assert!(svg.contains("</svg>"));
        assert!(!svg.contains("<path"));
    }

    #[test]
    fn test_name_is_escaped() {
        let mut mountain = sample_mountain();
        mountain.name = "bob's <hill>".to_string();
        let svg = render_map(
            &mountain,
            MapOrientation::WestFacing,
            &RenderConfig::default(),
        );
        assert!(svg.contains("&lt;hill&gt;"));
        assert!(!svg.contains("<hill>"));
    }

    #[test]
    fn test_comparison_charts_rank_both_ways() {
        let summaries = vec![
            MountainSummary {
                mountain: "stowe".to_string(),
                difficulty: 32.4,
                ease: 11.2,
                vertical_drop: 702.0,
                trail_count: 48,
                lift_count: 9,
            },
            MountainSummary {
                mountain: "bolton_valley".to_string(),
                difficulty: 25.0,
                ease: 8.1,
                vertical_drop: 500.0,
                trail_count: 30,
                lift_count: 5,
            },
        ];
        let svg = render_comparison_charts(&summaries);
        assert!(svg.contains("Most Difficult Mountains"));
        assert!(svg.contains("Most Beginner-Friendly Mountains"));
        // Hardest first in the difficulty chart
        let stowe = svg.find("Stowe").unwrap();
        let bolton = svg.find("Bolton Valley").unwrap();
        assert!(stowe < bolton);
        // Easiest-first chart puts Bolton before Stowe's second mention
        let second_stowe = svg.rfind("Stowe").unwrap();
        let second_bolton = svg.rfind("Bolton Valley").unwrap();
        assert!(second_bolton < second_stowe);
    }
}
