//! Layered left-to-right flow layout: longest-path layering, barycenter
//! ordering with collision resolution, and proportional node/ribbon sizing.
//!
//! Pure geometry. Given the same graph and parameters the output is
//! bit-identical across invocations; nothing here touches the DOM.

use std::collections::HashMap;

use super::types::{FlowGraph, InvalidGraphError};

/// Tunable layout parameters.
#[derive(Clone, Debug)]
pub struct LayoutParams {
	pub width: f64,
	pub height: f64,
	pub node_width: f64,
	pub node_padding: f64,
	pub iterations: usize,
}

impl Default for LayoutParams {
	fn default() -> Self {
		Self {
			width: 800.0,
			height: 600.0,
			node_width: 15.0,
			node_padding: 10.0,
			iterations: 6,
		}
	}
}

impl LayoutParams {
	/// Drawing extent `(x0, y0, x1, y1)`, inset by the viewbox margins.
	fn extent(&self) -> (f64, f64, f64, f64) {
		(1.0, 1.0, self.width - 1.0, self.height - 5.0)
	}
}

/// A stage rectangle positioned by a layout pass.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutNode {
	pub id: String,
	pub group: u32,
	/// Total throughput: max of incoming and outgoing flow sums.
	pub value: f64,
	/// Topological column, 0 = leftmost.
	pub depth: usize,
	pub x0: f64,
	pub y0: f64,
	pub x1: f64,
	pub y1: f64,
}

impl LayoutNode {
	pub fn center_y(&self) -> f64 {
		(self.y0 + self.y1) / 2.0
	}

	pub fn contains(&self, x: f64, y: f64) -> bool {
		x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
	}
}

/// A ribbon anchored on its source's right edge and its target's left edge.
/// `sy`/`ty` are the spine centers at each anchor.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutLink {
	pub source: usize,
	pub target: usize,
	pub value: f64,
	pub width: f64,
	pub sx: f64,
	pub sy: f64,
	pub tx: f64,
	pub ty: f64,
}

impl LayoutLink {
	/// Point on the ribbon spine at parameter `t` in `[0, 1]`. The spine is a
	/// cubic bezier whose control points sit at the horizontal midline, the
	/// same curve the renderer strokes.
	pub fn point_at(&self, t: f64) -> (f64, f64) {
		let mx = (self.sx + self.tx) / 2.0;
		let u = 1.0 - t;
		let x = u * u * u * self.sx
			+ 3.0 * u * u * t * mx
			+ 3.0 * u * t * t * mx
			+ t * t * t * self.tx;
		let y = (u * u * u + 3.0 * u * u * t) * self.sy + (3.0 * u * t * t + t * t * t) * self.ty;
		(x, y)
	}
}

/// Derived geometry for one render pass. Never cached across renders.
#[derive(Clone, Debug, PartialEq)]
pub struct SankeyLayout {
	pub nodes: Vec<LayoutNode>,
	pub links: Vec<LayoutLink>,
}

/// Validate `graph` and compute node rectangles and ribbon anchors.
pub fn compute(graph: &FlowGraph, params: &LayoutParams) -> Result<SankeyLayout, InvalidGraphError> {
	let links = validate(graph)?;
	let n = graph.nodes.len();

	let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); n];
	let mut incoming: Vec<Vec<usize>> = vec![Vec::new(); n];
	for (li, &(src, tgt, _)) in links.iter().enumerate() {
		outgoing[src].push(li);
		incoming[tgt].push(li);
	}

	let depths = layer(graph, &links, &outgoing)?;
	let max_depth = depths.iter().copied().max().unwrap_or(0);

	let (ex0, ey0, ex1, ey1) = params.extent();
	let kx = if max_depth > 0 {
		(ex1 - ex0 - params.node_width) / max_depth as f64
	} else {
		0.0
	};

	let mut nodes: Vec<LayoutNode> = graph
		.nodes
		.iter()
		.zip(&depths)
		.map(|(node, &depth)| {
			let x0 = ex0 + depth as f64 * kx;
			LayoutNode {
				id: node.id.clone(),
				group: node.group,
				value: 0.0,
				depth,
				x0,
				y0: 0.0,
				x1: x0 + params.node_width,
				y1: 0.0,
			}
		})
		.collect();

	for i in 0..n {
		let in_sum: f64 = incoming[i].iter().map(|&li| links[li].2).sum();
		let out_sum: f64 = outgoing[i].iter().map(|&li| links[li].2).sum();
		nodes[i].value = in_sum.max(out_sum);
	}

	let mut columns: Vec<Vec<usize>> = vec![Vec::new(); max_depth + 1];
	for (i, &depth) in depths.iter().enumerate() {
		columns[depth].push(i);
	}

	// Vertical scale: the tightest column determines pixels per unit of flow.
	let ky = columns
		.iter()
		.filter_map(|col| {
			let sum: f64 = col.iter().map(|&i| nodes[i].value).sum();
			if sum > 0.0 {
				Some((ey1 - ey0 - (col.len() - 1) as f64 * params.node_padding) / sum)
			} else {
				None
			}
		})
		.fold(f64::INFINITY, f64::min);
	let ky = if ky.is_finite() { ky } else { 0.0 };

	for col in &columns {
		let mut y = ey0;
		for &i in col {
			nodes[i].y0 = y;
			nodes[i].y1 = y + nodes[i].value * ky;
			y = nodes[i].y1 + params.node_padding;
		}
	}

	let mut alpha = 1.0;
	for _ in 0..params.iterations {
		alpha *= 0.99;
		relax(&mut nodes, &columns, &links, &incoming, alpha, false);
		resolve_collisions(&mut nodes, &columns, params, ey0, ey1);
		relax(&mut nodes, &columns, &links, &outgoing, alpha, true);
		resolve_collisions(&mut nodes, &columns, params, ey0, ey1);
	}

	let layout_links = place_links(&nodes, &links, &outgoing, &incoming, ky);

	Ok(SankeyLayout {
		nodes,
		links: layout_links,
	})
}

/// Resolve link endpoints and reject malformed input.
fn validate(graph: &FlowGraph) -> Result<Vec<(usize, usize, f64)>, InvalidGraphError> {
	if graph.nodes.is_empty() {
		return Err(InvalidGraphError::EmptyGraph);
	}

	let mut index: HashMap<&str, usize> = HashMap::with_capacity(graph.nodes.len());
	for (i, node) in graph.nodes.iter().enumerate() {
		if index.insert(node.id.as_str(), i).is_some() {
			return Err(InvalidGraphError::DuplicateNode(node.id.clone()));
		}
	}

	graph
		.links
		.iter()
		.map(|link| {
			let src = *index
				.get(link.source.as_str())
				.ok_or_else(|| InvalidGraphError::DanglingLink(link.source.clone()))?;
			let tgt = *index
				.get(link.target.as_str())
				.ok_or_else(|| InvalidGraphError::DanglingLink(link.target.clone()))?;
			if !(link.value > 0.0 && link.value.is_finite()) {
				return Err(InvalidGraphError::NonPositiveValue {
					source: link.source.clone(),
					target: link.target.clone(),
					value: link.value,
				});
			}
			Ok((src, tgt, link.value))
		})
		.collect()
}

/// Longest-path layering via Kahn's algorithm; sinks are justified to the
/// deepest column. Errs on cycles instead of rendering them unusably.
fn layer(
	graph: &FlowGraph,
	links: &[(usize, usize, f64)],
	outgoing: &[Vec<usize>],
) -> Result<Vec<usize>, InvalidGraphError> {
	let n = graph.nodes.len();
	let mut in_degree = vec![0usize; n];
	for &(_, tgt, _) in links {
		in_degree[tgt] += 1;
	}

	let mut depths = vec![0usize; n];
	let mut queue: Vec<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
	let mut head = 0;
	while head < queue.len() {
		let i = queue[head];
		head += 1;
		for &li in &outgoing[i] {
			let tgt = links[li].1;
			depths[tgt] = depths[tgt].max(depths[i] + 1);
			in_degree[tgt] -= 1;
			if in_degree[tgt] == 0 {
				queue.push(tgt);
			}
		}
	}

	if head < n {
		let stuck = (0..n)
			.find(|&i| in_degree[i] > 0)
			.expect("unprocessed node with no remaining in-degree");
		return Err(InvalidGraphError::Cycle(graph.nodes[stuck].id.clone()));
	}

	let max_depth = depths.iter().copied().max().unwrap_or(0);
	for i in 0..n {
		if outgoing[i].is_empty() {
			depths[i] = max_depth;
		}
	}
	Ok(depths)
}

/// One barycenter sweep: pull each node toward the flow-weighted center of
/// its counterparts on the adjacent side, damped by `alpha`.
fn relax(
	nodes: &mut [LayoutNode],
	columns: &[Vec<usize>],
	links: &[(usize, usize, f64)],
	adjacency: &[Vec<usize>],
	alpha: f64,
	right_to_left: bool,
) {
	let sweep: Vec<&Vec<usize>> = if right_to_left {
		columns.iter().rev().collect()
	} else {
		columns.iter().collect()
	};

	for col in sweep {
		for &i in col {
			if adjacency[i].is_empty() {
				continue;
			}
			let mut weighted = 0.0;
			let mut total = 0.0;
			for &li in &adjacency[i] {
				let (src, tgt, value) = links[li];
				let other = if right_to_left { tgt } else { src };
				weighted += nodes[other].center_y() * value;
				total += value;
			}
			let dy = (weighted / total - nodes[i].center_y()) * alpha;
			nodes[i].y0 += dy;
			nodes[i].y1 += dy;
		}
	}
}

/// Re-stack each column so no rectangles overlap, keeping everything inside
/// the vertical extent.
fn resolve_collisions(
	nodes: &mut [LayoutNode],
	columns: &[Vec<usize>],
	params: &LayoutParams,
	ey0: f64,
	ey1: f64,
) {
	for col in columns {
		let mut order: Vec<usize> = col.clone();
		order.sort_by(|&a, &b| nodes[a].y0.total_cmp(&nodes[b].y0));

		let mut y = ey0;
		for &i in &order {
			let dy = y - nodes[i].y0;
			if dy > 0.0 {
				nodes[i].y0 += dy;
				nodes[i].y1 += dy;
			}
			y = nodes[i].y1 + params.node_padding;
		}

		// Pushed past the bottom; walk back up.
		let overflow = y - params.node_padding - ey1;
		if overflow > 0.0 {
			let mut y = ey1;
			for &i in order.iter().rev() {
				let dy = nodes[i].y1 - y;
				if dy > 0.0 {
					nodes[i].y0 -= dy;
					nodes[i].y1 -= dy;
				}
				y = nodes[i].y0 - params.node_padding;
			}
		}
	}
}

/// Assign ribbon widths and stack anchors along each node edge, ordered by
/// the counterpart's vertical position. Parallel links stay independent.
fn place_links(
	nodes: &[LayoutNode],
	links: &[(usize, usize, f64)],
	outgoing: &[Vec<usize>],
	incoming: &[Vec<usize>],
	ky: f64,
) -> Vec<LayoutLink> {
	let mut placed: Vec<LayoutLink> = links
		.iter()
		.map(|&(src, tgt, value)| LayoutLink {
			source: src,
			target: tgt,
			value,
			width: value * ky,
			sx: nodes[src].x1,
			sy: 0.0,
			tx: nodes[tgt].x0,
			ty: 0.0,
		})
		.collect();

	for (i, node) in nodes.iter().enumerate() {
		let mut out: Vec<usize> = outgoing[i].clone();
		out.sort_by(|&a, &b| nodes[links[a].1].y0.total_cmp(&nodes[links[b].1].y0));
		let mut y = node.y0;
		for li in out {
			placed[li].sy = y + placed[li].width / 2.0;
			y += placed[li].width;
		}

		let mut inc: Vec<usize> = incoming[i].clone();
		inc.sort_by(|&a, &b| nodes[links[a].0].y0.total_cmp(&nodes[links[b].0].y0));
		let mut y = node.y0;
		for li in inc {
			placed[li].ty = y + placed[li].width / 2.0;
			y += placed[li].width;
		}
	}

	placed
}

#[cfg(test)]
mod tests {
	use super::super::types::{FlowGraph, FlowLink, FlowNode};
	use super::*;

	fn node(id: &str, group: u32) -> FlowNode {
		FlowNode {
			id: id.into(),
			group,
		}
	}

	fn link(source: &str, target: &str, value: f64) -> FlowLink {
		FlowLink {
			source: source.into(),
			target: target.into(),
			value,
		}
	}

	fn fan_out() -> FlowGraph {
		FlowGraph {
			nodes: vec![node("A", 1), node("B", 2), node("C", 2)],
			links: vec![link("A", "B", 5.0), link("A", "C", 3.0)],
		}
	}

	fn find<'a>(layout: &'a SankeyLayout, id: &str) -> &'a LayoutNode {
		layout
			.nodes
			.iter()
			.find(|n| n.id == id)
			.unwrap_or_else(|| panic!("missing node {id}"))
	}

	#[test]
	fn source_height_proportional_to_outgoing_flow() {
		let layout = compute(&fan_out(), &LayoutParams::default()).unwrap();
		let a = find(&layout, "A");
		let b = find(&layout, "B");
		let c = find(&layout, "C");

		// A carries 8 units; B and C split it 5:3.
		let a_height = a.y1 - a.y0;
		let ky = a_height / 8.0;
		assert!(ky > 0.0);
		assert!((b.y1 - b.y0 - 5.0 * ky).abs() < 1e-9);
		assert!((c.y1 - c.y0 - 3.0 * ky).abs() < 1e-9);
	}

	#[test]
	fn ribbon_widths_follow_flow_ratio() {
		let layout = compute(&fan_out(), &LayoutParams::default()).unwrap();
		let ab = &layout.links[0];
		let ac = &layout.links[1];
		assert!((ab.width / ac.width - 5.0 / 3.0).abs() < 1e-9);
	}

	#[test]
	fn layout_is_deterministic() {
		let graph = fan_out();
		let params = LayoutParams::default();
		let first = compute(&graph, &params).unwrap();
		let second = compute(&graph, &params).unwrap();
		assert_eq!(first, second);
	}

	#[test]
	fn ribbon_anchors_land_on_node_boundaries() {
		let layout = compute(&fan_out(), &LayoutParams::default()).unwrap();
		for link in &layout.links {
			let src = &layout.nodes[link.source];
			let tgt = &layout.nodes[link.target];
			assert_eq!(link.sx, src.x1);
			assert_eq!(link.tx, tgt.x0);
			assert!(link.sy - link.width / 2.0 >= src.y0 - 1e-9);
			assert!(link.sy + link.width / 2.0 <= src.y1 + 1e-9);
			assert!(link.ty - link.width / 2.0 >= tgt.y0 - 1e-9);
			assert!(link.ty + link.width / 2.0 <= tgt.y1 + 1e-9);
		}
	}

	#[test]
	fn spine_endpoints_match_anchors() {
		let layout = compute(&fan_out(), &LayoutParams::default()).unwrap();
		for link in &layout.links {
			let (x0, y0) = link.point_at(0.0);
			let (x1, y1) = link.point_at(1.0);
			assert!((x0 - link.sx).abs() < 1e-9 && (y0 - link.sy).abs() < 1e-9);
			assert!((x1 - link.tx).abs() < 1e-9 && (y1 - link.ty).abs() < 1e-9);
		}
	}

	#[test]
	fn columns_ordered_by_topological_depth() {
		let graph = FlowGraph {
			nodes: vec![node("A", 1), node("B", 1), node("C", 1), node("D", 1)],
			links: vec![
				link("A", "B", 1.0),
				link("B", "C", 1.0),
				link("C", "D", 2.0),
				link("A", "C", 1.0),
			],
		};
		let layout = compute(&graph, &LayoutParams::default()).unwrap();
		assert_eq!(find(&layout, "A").depth, 0);
		assert_eq!(find(&layout, "B").depth, 1);
		assert_eq!(find(&layout, "C").depth, 2);
		assert_eq!(find(&layout, "D").depth, 3);
		assert!(find(&layout, "A").x1 <= find(&layout, "B").x0);
		assert!(find(&layout, "C").x1 <= find(&layout, "D").x0);
	}

	#[test]
	fn sinks_justified_to_deepest_column() {
		// B is a sink reachable in one hop but the chain reaches depth 2.
		let graph = FlowGraph {
			nodes: vec![node("A", 1), node("B", 1), node("C", 1), node("D", 1)],
			links: vec![
				link("A", "B", 1.0),
				link("A", "C", 1.0),
				link("C", "D", 1.0),
			],
		};
		let layout = compute(&graph, &LayoutParams::default()).unwrap();
		assert_eq!(find(&layout, "B").depth, 2);
		assert_eq!(find(&layout, "D").depth, 2);
	}

	#[test]
	fn parallel_links_stay_independent() {
		let graph = FlowGraph {
			nodes: vec![node("A", 1), node("B", 2)],
			links: vec![link("A", "B", 2.0), link("A", "B", 3.0)],
		};
		let layout = compute(&graph, &LayoutParams::default()).unwrap();
		assert_eq!(layout.links.len(), 2);
		let a = find(&layout, "A");
		assert!((a.value - 5.0).abs() < 1e-9);
		// Stacked, not merged: anchors must not coincide.
		assert!(layout.links[0].sy != layout.links[1].sy);
		let widths_sum = layout.links[0].width + layout.links[1].width;
		assert!((widths_sum - (a.y1 - a.y0)).abs() < 1e-9);
	}

	#[test]
	fn disconnected_subgraphs_lay_out_independently() {
		let graph = FlowGraph {
			nodes: vec![node("A", 1), node("B", 1), node("X", 2), node("Y", 2)],
			links: vec![link("A", "B", 1.0), link("X", "Y", 4.0)],
		};
		let layout = compute(&graph, &LayoutParams::default()).unwrap();
		assert_eq!(find(&layout, "A").depth, 0);
		assert_eq!(find(&layout, "X").depth, 0);
		assert_eq!(find(&layout, "B").depth, 1);
		assert_eq!(find(&layout, "Y").depth, 1);
	}

	#[test]
	fn nodes_stay_inside_extent() {
		let graph = FlowGraph {
			nodes: vec![
				node("A", 1),
				node("B", 2),
				node("C", 2),
				node("D", 3),
				node("E", 3),
			],
			links: vec![
				link("A", "B", 4.0),
				link("A", "C", 6.0),
				link("B", "D", 4.0),
				link("C", "E", 6.0),
			],
		};
		let params = LayoutParams::default();
		let layout = compute(&graph, &params).unwrap();
		for n in &layout.nodes {
			assert!(n.y0 >= 1.0 - 1e-9);
			assert!(n.y1 <= params.height - 5.0 + 1e-9);
			assert!(n.x0 >= 1.0 - 1e-9);
			assert!(n.x1 <= params.width - 1.0 + 1e-9);
			assert!(n.y1 >= n.y0);
		}
	}

	#[test]
	fn empty_graph_rejected() {
		let graph = FlowGraph::default();
		assert_eq!(
			compute(&graph, &LayoutParams::default()),
			Err(InvalidGraphError::EmptyGraph)
		);
	}

	#[test]
	fn dangling_link_rejected() {
		let graph = FlowGraph {
			nodes: vec![node("A", 1)],
			links: vec![link("A", "missing", 1.0)],
		};
		assert_eq!(
			compute(&graph, &LayoutParams::default()),
			Err(InvalidGraphError::DanglingLink("missing".into()))
		);
	}

	#[test]
	fn duplicate_node_id_rejected() {
		let graph = FlowGraph {
			nodes: vec![node("A", 1), node("A", 2)],
			links: vec![],
		};
		assert_eq!(
			compute(&graph, &LayoutParams::default()),
			Err(InvalidGraphError::DuplicateNode("A".into()))
		);
	}

	#[test]
	fn non_positive_value_rejected() {
		for bad in [0.0, -3.0, f64::NAN] {
			let graph = FlowGraph {
				nodes: vec![node("A", 1), node("B", 1)],
				links: vec![link("A", "B", bad)],
			};
			assert!(matches!(
				compute(&graph, &LayoutParams::default()),
				Err(InvalidGraphError::NonPositiveValue { .. })
			));
		}
	}

	#[test]
	fn cycle_rejected() {
		let graph = FlowGraph {
			nodes: vec![node("A", 1), node("B", 1), node("C", 1)],
			links: vec![
				link("A", "B", 1.0),
				link("B", "C", 1.0),
				link("C", "A", 1.0),
			],
		};
		assert!(matches!(
			compute(&graph, &LayoutParams::default()),
			Err(InvalidGraphError::Cycle(_))
		));
	}
}
