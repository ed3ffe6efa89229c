use super::layout::{self, LayoutParams, SankeyLayout};
use super::types::{FlowGraph, InvalidGraphError};

/// Strip reserved below the diagram for the group legend.
pub const LEGEND_HEIGHT: f64 = 28.0;

/// Spine samples used when hit-testing a ribbon.
const RIBBON_HIT_SAMPLES: usize = 24;

/// What the pointer is currently over.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HoverTarget {
	Node(usize),
	Link(usize),
}

#[derive(Clone, Debug, Default)]
pub struct HoverState {
	pub target: Option<HoverTarget>,
	pub prev_target: Option<HoverTarget>,
	pub highlight_t: f64,
	pub pointer_x: f64,
	pub pointer_y: f64,
}

pub struct SankeyState {
	pub graph: FlowGraph,
	pub layout: SankeyLayout,
	pub params: LayoutParams,
	pub hover: HoverState,
	pub width: f64,
	pub height: f64,
}

impl SankeyState {
	/// Validate the graph and run the initial layout pass.
	pub fn new(graph: &FlowGraph, width: f64, height: f64) -> Result<Self, InvalidGraphError> {
		let params = LayoutParams {
			width,
			height: (height - LEGEND_HEIGHT).max(0.0),
			..LayoutParams::default()
		};
		let layout = layout::compute(graph, &params)?;
		Ok(Self {
			graph: graph.clone(),
			layout,
			params,
			hover: HoverState::default(),
			width,
			height,
		})
	}

	/// Recompute the layout from scratch for a new surface size.
	pub fn resize(&mut self, width: f64, height: f64) -> Result<(), InvalidGraphError> {
		self.width = width;
		self.height = height;
		self.params.width = width;
		self.params.height = (height - LEGEND_HEIGHT).max(0.0);
		self.layout = layout::compute(&self.graph, &self.params)?;
		Ok(())
	}

	/// Nodes draw on top of ribbons, so they win the hit test.
	pub fn hit_test(&self, x: f64, y: f64) -> Option<HoverTarget> {
		for (i, node) in self.layout.nodes.iter().enumerate() {
			if node.contains(x, y) {
				return Some(HoverTarget::Node(i));
			}
		}
		for (i, link) in self.layout.links.iter().enumerate() {
			let half = link.width.max(1.0) / 2.0;
			let mut prev = link.point_at(0.0);
			for s in 1..=RIBBON_HIT_SAMPLES {
				let next = link.point_at(s as f64 / RIBBON_HIT_SAMPLES as f64);
				if dist_sq_to_segment(x, y, prev, next) <= half * half {
					return Some(HoverTarget::Link(i));
				}
				prev = next;
			}
		}
		None
	}

	/// Idempotent; rapid enter/leave events resolve to the last one.
	pub fn set_hover(&mut self, target: Option<HoverTarget>, px: f64, py: f64) {
		self.hover.pointer_x = px;
		self.hover.pointer_y = py;
		if self.hover.target == target {
			return;
		}

		// Keep the old target around so emphasis can fade back out.
		if target.is_none() {
			self.hover.prev_target = self.hover.target.take();
		} else {
			self.hover.prev_target = None;
		}
		self.hover.target = target;
	}

	pub fn is_emphasized(&self, target: HoverTarget) -> bool {
		self.hover.target == Some(target) || self.hover.prev_target == Some(target)
	}

	pub fn has_active_highlight(&self) -> bool {
		self.hover.target.is_some() || self.hover.prev_target.is_some()
	}

	/// Ease the emphasis level toward its target each frame.
	pub fn tick(&mut self, dt: f64) {
		let (target, speed) = if self.hover.target.is_some() {
			(1.0, 1.8)
		} else {
			(0.0, 1.26)
		};
		self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt;

		if self.hover.target.is_none() && self.hover.highlight_t < 0.01 {
			self.hover.highlight_t = 0.0;
			self.hover.prev_target = None;
		}
	}
}

fn dist_sq_to_segment(px: f64, py: f64, (ax, ay): (f64, f64), (bx, by): (f64, f64)) -> f64 {
	let (dx, dy) = (bx - ax, by - ay);
	let len_sq = dx * dx + dy * dy;
	let t = if len_sq > 0.0 {
		(((px - ax) * dx + (py - ay) * dy) / len_sq).clamp(0.0, 1.0)
	} else {
		0.0
	};
	let (cx, cy) = (ax + t * dx, ay + t * dy);
	let (ex, ey) = (px - cx, py - cy);
	ex * ex + ey * ey
}

#[cfg(test)]
mod tests {
	use super::super::types::{FlowLink, FlowNode};
	use super::*;

	fn sample_state() -> SankeyState {
		let graph = FlowGraph {
			nodes: vec![
				FlowNode {
					id: "A".into(),
					group: 1,
				},
				FlowNode {
					id: "B".into(),
					group: 2,
				},
				FlowNode {
					id: "C".into(),
					group: 2,
				},
			],
			links: vec![
				FlowLink {
					source: "A".into(),
					target: "B".into(),
					value: 5.0,
				},
				FlowLink {
					source: "A".into(),
					target: "C".into(),
					value: 3.0,
				},
			],
		};
		SankeyState::new(&graph, 800.0, 600.0).unwrap()
	}

	#[test]
	fn invalid_graph_rejected_at_construction() {
		let graph = FlowGraph {
			nodes: vec![FlowNode {
				id: "A".into(),
				group: 1,
			}],
			links: vec![FlowLink {
				source: "A".into(),
				target: "ghost".into(),
				value: 1.0,
			}],
		};
		assert_eq!(
			SankeyState::new(&graph, 800.0, 600.0).err(),
			Some(InvalidGraphError::DanglingLink("ghost".into()))
		);
	}

	#[test]
	fn hit_test_finds_node_rect() {
		let state = sample_state();
		let a = &state.layout.nodes[0];
		let (cx, cy) = ((a.x0 + a.x1) / 2.0, a.center_y());
		assert_eq!(state.hit_test(cx, cy), Some(HoverTarget::Node(0)));
	}

	#[test]
	fn hit_test_finds_ribbon_spine() {
		let state = sample_state();
		let (mx, my) = state.layout.links[0].point_at(0.5);
		assert_eq!(state.hit_test(mx, my), Some(HoverTarget::Link(0)));
	}

	#[test]
	fn hit_test_prefers_node_over_ribbon_anchor() {
		let state = sample_state();
		let link = &state.layout.links[0];
		// The anchor sits on A's right edge, inside A's rectangle.
		assert_eq!(
			state.hit_test(link.sx, link.sy),
			Some(HoverTarget::Node(link.source))
		);
	}

	#[test]
	fn hit_test_misses_empty_space() {
		let state = sample_state();
		assert_eq!(state.hit_test(400.0, 1000.0), None);
	}

	#[test]
	fn resize_recomputes_layout() {
		let mut state = sample_state();
		let before = state.layout.clone();
		state.resize(400.0, 300.0).unwrap();
		assert_ne!(state.layout, before);
		assert!(state.layout.nodes.iter().all(|n| n.x1 <= 399.0 + 1e-9));
	}

	#[test]
	fn hover_enter_then_leave_restores_initial_state() {
		let mut state = sample_state();
		state.set_hover(Some(HoverTarget::Link(1)), 300.0, 200.0);
		for _ in 0..30 {
			state.tick(0.016);
		}
		assert!(state.hover.highlight_t > 0.5);
		assert!(state.is_emphasized(HoverTarget::Link(1)));

		state.set_hover(None, 300.0, 200.0);
		for _ in 0..400 {
			state.tick(0.016);
		}
		assert_eq!(state.hover.target, None);
		assert_eq!(state.hover.prev_target, None);
		assert_eq!(state.hover.highlight_t, 0.0);
		assert!(!state.has_active_highlight());
	}

	#[test]
	fn rapid_hover_changes_last_event_wins() {
		let mut state = sample_state();
		state.set_hover(Some(HoverTarget::Node(0)), 10.0, 10.0);
		state.set_hover(Some(HoverTarget::Link(0)), 20.0, 20.0);
		state.set_hover(Some(HoverTarget::Node(1)), 30.0, 30.0);
		assert_eq!(state.hover.target, Some(HoverTarget::Node(1)));
		assert_eq!(state.hover.prev_target, None);
		assert!(!state.is_emphasized(HoverTarget::Node(0)));
	}
}
