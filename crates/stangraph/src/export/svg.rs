//! SVG export with an in-process layered layout.
//!
//! Nodes are assigned to layers with the Sugiyama method from the
//! rust-sugiyama crate and drawn with the svg crate. A dependency always sits
//! in a layer above the variables that use it. Variables without any edge
//! are lined up in a final row.

use std::{collections::HashMap, f32::consts::SQRT_2, panic};

use log::{debug, trace};
use rust_sugiyama::configure::Config;
use svg::{Document, node::element as svg_element};

use stangraph_core::identifier::Id;

use super::{Error, ExportStyle, Exporter};
use crate::{
    config::NodeShape,
    render::{RenderedGraph, RenderedNode},
};

const MARKER_ID: &str = "arrow";

/// Average glyph width relative to the font size.
const CHAR_WIDTH_RATIO: f32 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Point {
    x: f32,
    y: f32,
}

/// Half the width and height of a node outline.
#[derive(Debug, Clone, Copy)]
struct Extent {
    half_width: f32,
    half_height: f32,
}

/// A node position in layout units: layer index and horizontal offset.
#[derive(Debug, Clone, Copy)]
struct GridPosition {
    column: f32,
    layer: usize,
}

/// The SVG exporter.
pub struct SvgExporter {
    style: ExportStyle,

    /// Padding between a label and its outline
    text_padding: f32,

    /// Horizontal spacing between nodes
    horizontal_spacing: f32,

    /// Vertical spacing between layers
    vertical_spacing: f32,

    /// Empty border around the drawing
    margin: f32,

    /// Extra room for self-loops to the right of a node
    loop_size: f32,
}

impl SvgExporter {
    pub(crate) fn new(style: ExportStyle) -> Self {
        Self {
            style,
            text_padding: 8.0,
            horizontal_spacing: 40.0,
            vertical_spacing: 60.0,
            margin: 20.0,
            loop_size: 24.0,
        }
    }

    fn extent(&self, node: &RenderedNode) -> Extent {
        let font_size = self.style.font_size() as f32;
        let text_width = node.label().chars().count() as f32 * font_size * CHAR_WIDTH_RATIO;
        let width = text_width + 2.0 * self.text_padding;
        let height = font_size + 2.0 * self.text_padding;

        let (width, height) = match node.shape() {
            NodeShape::Box => (width, height),
            // Smallest ellipse through the corners of the label box.
            NodeShape::Ellipse => (width * SQRT_2, height * SQRT_2),
            NodeShape::Circle => {
                let diameter = width.hypot(height);
                (diameter, diameter)
            }
        };

        Extent {
            half_width: width / 2.0,
            half_height: height / 2.0,
        }
    }

    /// Computes the center of every node, in the order of `graph.nodes()`.
    fn layout(&self, graph: &RenderedGraph, extents: &[Extent]) -> Result<Vec<Point>, Error> {
        let grid = grid_positions(graph)?;

        let max_half_width = extents.iter().map(|e| e.half_width).fold(0.0, f32::max);
        let max_half_height = extents.iter().map(|e| e.half_height).fold(0.0, f32::max);
        let column_width = 2.0 * max_half_width + self.horizontal_spacing;
        let row_height = 2.0 * max_half_height + self.vertical_spacing;

        Ok(grid
            .iter()
            .map(|position| Point {
                x: self.margin + max_half_width + position.column * column_width,
                y: self.margin + max_half_height + position.layer as f32 * row_height,
            })
            .collect())
    }

    fn document_size(&self, centers: &[Point], extents: &[Extent]) -> (f32, f32) {
        let (right, bottom) = centers.iter().zip(extents).fold(
            (self.margin, self.margin),
            |(right, bottom), (center, extent)| {
                (
                    right.max(center.x + extent.half_width + self.loop_size),
                    bottom.max(center.y + extent.half_height),
                )
            },
        );
        (right + self.margin, bottom + self.margin)
    }

    fn marker_definitions(&self) -> svg_element::Definitions {
        let color = self.style.edge_color();
        let marker = svg_element::Marker::new()
            .set("id", MARKER_ID)
            .set("viewBox", "0 0 10 10")
            .set("refX", 9)
            .set("refY", 5)
            .set("markerWidth", 6)
            .set("markerHeight", 6)
            .set("orient", "auto")
            .add(
                svg_element::Path::new()
                    .set("d", "M 0 0 L 10 5 L 0 10 z")
                    .set("fill", color.to_rgb_hex())
                    .set("fill-opacity", color.alpha()),
            );
        svg_element::Definitions::new().add(marker)
    }

    fn draw_node(&self, node: &RenderedNode, center: Point, extent: Extent) -> svg_element::Group {
        let color = self.style.node_color();
        let outline: Box<dyn svg::Node> = match node.shape() {
            NodeShape::Circle => Box::new(
                svg_element::Circle::new()
                    .set("cx", center.x)
                    .set("cy", center.y)
                    .set("r", extent.half_width),
            ),
            NodeShape::Ellipse => Box::new(
                svg_element::Ellipse::new()
                    .set("cx", center.x)
                    .set("cy", center.y)
                    .set("rx", extent.half_width)
                    .set("ry", extent.half_height),
            ),
            NodeShape::Box => Box::new(
                svg_element::Rectangle::new()
                    .set("x", center.x - extent.half_width)
                    .set("y", center.y - extent.half_height)
                    .set("width", 2.0 * extent.half_width)
                    .set("height", 2.0 * extent.half_height),
            ),
        };

        let text = svg_element::Text::new(node.label())
            .set("x", center.x)
            .set("y", center.y)
            .set("text-anchor", "middle")
            .set("dominant-baseline", "central")
            .set("font-family", "sans-serif")
            .set("stroke", "none")
            .set("font-size", self.style.font_size() as f32)
            .set("fill", color.to_rgb_hex())
            .set("fill-opacity", color.alpha());

        svg_element::Group::new()
            .set("id", format!("node-{}", node.id()))
            .set("fill", "white")
            .set("stroke", color.to_rgb_hex())
            .set("stroke-opacity", color.alpha())
            .add(outline)
            .add(text)
    }

    fn edge_path(&self, data: String) -> svg_element::Path {
        let color = self.style.edge_color();
        svg_element::Path::new()
            .set("d", data)
            .set("fill", "none")
            .set("stroke", color.to_rgb_hex())
            .set("stroke-opacity", color.alpha())
            .set("marker-end", format!("url(#{MARKER_ID})"))
    }

    fn draw_edge(
        &self,
        from: (Point, Extent, NodeShape),
        to: (Point, Extent, NodeShape),
    ) -> svg_element::Path {
        let start = boundary(from.0, from.1, from.2, to.0);
        let end = boundary(to.0, to.1, to.2, from.0);
        self.edge_path(format!("M {} {} L {} {}", start.x, start.y, end.x, end.y))
    }

    /// A loop on the right-hand side of the node.
    fn draw_self_loop(&self, center: Point, extent: Extent) -> svg_element::Path {
        let x = center.x + extent.half_width * 0.9;
        let top = center.y - extent.half_height / 3.0;
        let bottom = center.y + extent.half_height / 3.0;
        let reach = x + self.loop_size;
        self.edge_path(format!(
            "M {x} {top} C {reach} {} {reach} {} {x} {bottom}",
            center.y - extent.half_height,
            center.y + extent.half_height
        ))
    }
}

impl Exporter for SvgExporter {
    fn export_graph(&self, graph: &RenderedGraph) -> Result<Vec<u8>, Error> {
        let extents: Vec<Extent> = graph.nodes().iter().map(|node| self.extent(node)).collect();
        let centers = self.layout(graph, &extents)?;
        let (width, height) = self.document_size(&centers, &extents);

        let index_of: HashMap<Id, usize> = graph
            .nodes()
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id(), index))
            .collect();
        let placed = |id: Id| {
            index_of
                .get(&id)
                .map(|&index| (centers[index], extents[index], graph.nodes()[index].shape()))
        };

        let mut doc = Document::new()
            .set("viewBox", format!("0 0 {width} {height}"))
            .set("width", width)
            .set("height", height);

        if let Some(background) = self.style.background_color() {
            doc = doc.add(
                svg_element::Rectangle::new()
                    .set("width", "100%")
                    .set("height", "100%")
                    .set("fill", background.to_rgb_hex())
                    .set("fill-opacity", background.alpha()),
            );
        }
        doc = doc.add(self.marker_definitions());

        let mut edges = svg_element::Group::new().set("class", "edges");
        for edge in graph.edges() {
            let (Some(from), Some(to)) = (placed(edge.from()), placed(edge.to())) else {
                trace!(from = edge.from().to_string(), to = edge.to().to_string(); "Skipping edge to unknown node");
                continue;
            };
            edges = if edge.is_self_loop() {
                edges.add(self.draw_self_loop(from.0, from.1))
            } else {
                edges.add(self.draw_edge(from, to))
            };
        }

        let mut nodes = svg_element::Group::new().set("class", "nodes");
        for ((node, &center), &extent) in graph.nodes().iter().zip(&centers).zip(&extents) {
            nodes = nodes.add(self.draw_node(node, center, extent));
        }

        debug!(
            nodes = graph.nodes().len(),
            edges = graph.edges().len(),
            width,
            height;
            "SVG document built"
        );

        Ok(doc.add(edges).add(nodes).to_string().into_bytes())
    }
}

/// Point where the segment from `center` toward `toward` leaves the outline.
fn boundary(center: Point, extent: Extent, shape: NodeShape, toward: Point) -> Point {
    let dx = toward.x - center.x;
    let dy = toward.y - center.y;
    if dx == 0.0 && dy == 0.0 {
        return center;
    }

    let scale = match shape {
        NodeShape::Box => {
            let horizontal = extent.half_width / dx.abs();
            let vertical = extent.half_height / dy.abs();
            horizontal.min(vertical)
        }
        NodeShape::Circle | NodeShape::Ellipse => {
            1.0 / ((dx / extent.half_width).powi(2) + (dy / extent.half_height).powi(2)).sqrt()
        }
    };

    Point {
        x: center.x + dx * scale,
        y: center.y + dy * scale,
    }
}

/// Assigns a layer and column to every node of `graph`.
fn grid_positions(graph: &RenderedGraph) -> Result<Vec<GridPosition>, Error> {
    let count = graph.nodes().len();
    let index_of: HashMap<Id, u32> = graph
        .nodes()
        .iter()
        .zip(0u32..)
        .map(|(node, index)| (node.id(), index))
        .collect();

    let mut edges: Vec<(u32, u32)> = Vec::new();
    for edge in graph.edges().iter().filter(|edge| !edge.is_self_loop()) {
        if let (Some(&from), Some(&to)) = (index_of.get(&edge.from()), index_of.get(&edge.to())) {
            if !edges.contains(&(from, to)) {
                edges.push((from, to));
            }
        }
    }

    let mut raw: Vec<Option<(f32, f32)>> = vec![None; count];
    if !edges.is_empty() {
        debug!(
            nodes = count,
            edges = edges.len();
            "Applying Sugiyama algorithm"
        );
        place_components(&mut raw, sugiyama(edges.clone())?);
        orient_downwards(&mut raw, &edges);
    }

    let layers = distinct_sorted(raw.iter().flatten().map(|&(_, y)| y));
    let unit = column_unit(&raw);

    let mut positions = Vec::with_capacity(count);
    let mut isolated = 0usize;
    for slot in &raw {
        positions.push(match slot {
            Some((x, y)) => GridPosition {
                column: x / unit,
                layer: layers.iter().position(|&layer| (layer - y).abs() < f32::EPSILON).unwrap_or(0),
            },
            None => {
                isolated += 1;
                GridPosition {
                    column: (isolated - 1) as f32,
                    layer: layers.len(),
                }
            }
        });
    }

    Ok(positions)
}

/// Runs rust-sugiyama and returns `(node, x, y)` per connected component.
fn sugiyama(edges: Vec<(u32, u32)>) -> Result<Vec<Vec<(u32, f32, f32)>>, Error> {
    let layouts = panic::catch_unwind(move || {
        let config = Config {
            minimum_length: 1,
            ..Default::default()
        };
        rust_sugiyama::from_edges(&edges, &config)
    });

    match layouts {
        Ok(results) if !results.is_empty() => Ok(results
            .iter()
            .map(|(coords, _, _)| {
                coords
                    .iter()
                    .filter_map(|&(id, (x, y))| {
                        u32::try_from(id).ok().map(|id| (id, x as f32, y as f32))
                    })
                    .collect()
            })
            .collect()),
        Ok(_) => Err(Error::Layout(
            "Rust-sugiyama returned empty layout results".to_string(),
        )),
        Err(err) => {
            let message = if let Some(panic_msg) = err.downcast_ref::<String>() {
                format!("Rust-sugiyama layout engine panicked: {panic_msg}")
            } else {
                "Rust-sugiyama layout engine panicked with unknown error".to_string()
            };
            Err(Error::Layout(message))
        }
    }
}

/// Stores the coordinates of each component, components side by side.
fn place_components(raw: &mut [Option<(f32, f32)>], components: Vec<Vec<(u32, f32, f32)>>) {
    let mut offset = 0.0;
    for component in components {
        let min_x = component.iter().map(|&(_, x, _)| x).fold(f32::INFINITY, f32::min);
        let max_x = component.iter().map(|&(_, x, _)| x).fold(f32::NEG_INFINITY, f32::max);
        if !min_x.is_finite() {
            continue;
        }
        for (id, x, y) in component {
            if let Some(slot) = raw.get_mut(id as usize) {
                *slot = Some((x - min_x + offset, y));
            }
        }
        offset += max_x - min_x + 1.0;
    }
}

/// Flips the vertical axis when dependencies ended up below their users.
fn orient_downwards(raw: &mut [Option<(f32, f32)>], edges: &[(u32, u32)]) {
    let upside_down = edges.iter().find_map(|&(from, to)| {
        let (_, from_y) = raw.get(from as usize).copied().flatten()?;
        let (_, to_y) = raw.get(to as usize).copied().flatten()?;
        (from_y != to_y).then_some(from_y > to_y)
    });
    if upside_down == Some(true) {
        for (_, y) in raw.iter_mut().flatten() {
            *y = -*y;
        }
    }
}

fn distinct_sorted(values: impl Iterator<Item = f32>) -> Vec<f32> {
    let mut values: Vec<f32> = values.collect();
    values.sort_by(f32::total_cmp);
    values.dedup_by(|a, b| (*a - *b).abs() < f32::EPSILON);
    values
}

/// Smallest horizontal gap between two nodes of the same layer.
fn column_unit(raw: &[Option<(f32, f32)>]) -> f32 {
    let mut by_layer: Vec<(f32, f32)> = raw.iter().flatten().copied().collect();
    by_layer.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.total_cmp(&b.0)));
    by_layer
        .windows(2)
        .filter(|pair| (pair[0].1 - pair[1].1).abs() < f32::EPSILON)
        .map(|pair| pair[1].0 - pair[0].0)
        .filter(|&gap| gap > f32::EPSILON)
        .fold(None, |unit: Option<f32>, gap| Some(unit.map_or(gap, |unit| unit.min(gap))))
        .unwrap_or(1.0)
}
