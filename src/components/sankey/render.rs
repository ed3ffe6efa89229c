use web_sys::CanvasRenderingContext2d;

use super::scale::ColorScale;
use super::state::{HoverTarget, LEGEND_HEIGHT, SankeyState};

const LABEL_COLOR: &str = "#333333";
const NODE_STROKE: &str = "#000000";

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

/// Draw one full frame: background, ribbons, node rectangles, labels, the
/// legend strip, and the hover tooltip. Clears everything drawn previously.
pub fn render(state: &SankeyState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str("#ffffff");
	ctx.fill_rect(0.0, 0.0, state.width, state.height);

	// Seed group colors in node order so the mapping is stable per pass.
	let mut scale = ColorScale::new();
	let colors: Vec<&'static str> = state
		.layout
		.nodes
		.iter()
		.map(|n| scale.color(n.group))
		.collect();

	let t = if state.has_active_highlight() {
		ease_out_cubic(state.hover.highlight_t)
	} else {
		0.0
	};
	draw_links(state, ctx, &colors, t);
	draw_nodes(state, ctx, &colors, t);
	draw_labels(state, ctx);
	draw_legend(state, ctx, &mut scale);
	draw_tooltip(state, ctx);
}

fn draw_links(state: &SankeyState, ctx: &CanvasRenderingContext2d, colors: &[&str], t: f64) {
	for (i, link) in state.layout.links.iter().enumerate() {
		let alpha = if state.is_emphasized(HoverTarget::Link(i)) {
			0.5 + 0.3 * t
		} else {
			0.5
		};

		ctx.set_global_alpha(alpha);
		ctx.set_stroke_style_str(colors[link.source]);
		ctx.set_line_width(link.width.max(1.0));

		let mx = (link.sx + link.tx) / 2.0;
		ctx.begin_path();
		ctx.move_to(link.sx, link.sy);
		ctx.bezier_curve_to(mx, link.sy, mx, link.ty, link.tx, link.ty);
		ctx.stroke();
	}
	ctx.set_global_alpha(1.0);
}

fn draw_nodes(state: &SankeyState, ctx: &CanvasRenderingContext2d, colors: &[&str], t: f64) {
	for (i, node) in state.layout.nodes.iter().enumerate() {
		let (w, h) = (node.x1 - node.x0, node.y1 - node.y0);
		ctx.set_fill_style_str(colors[i]);
		ctx.fill_rect(node.x0, node.y0, w, h);

		let stroke = if state.is_emphasized(HoverTarget::Node(i)) {
			0.5 + 1.5 * t
		} else {
			0.5
		};
		ctx.set_stroke_style_str(NODE_STROKE);
		ctx.set_line_width(stroke);
		ctx.stroke_rect(node.x0, node.y0, w, h);
	}
}

fn draw_labels(state: &SankeyState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(LABEL_COLOR);
	ctx.set_font("bold 12px sans-serif");
	ctx.set_text_baseline("middle");

	let mid = state.width / 2.0;
	for node in &state.layout.nodes {
		// Labels flip sides at the canvas midline so they stay inside.
		let (x, align) = if node.x0 < mid {
			(node.x1 + 6.0, "left")
		} else {
			(node.x0 - 6.0, "right")
		};
		ctx.set_text_align(align);
		let _ = ctx.fill_text(&node.id, x, node.center_y());
	}
	ctx.set_text_align("left");
}

fn draw_legend(state: &SankeyState, ctx: &CanvasRenderingContext2d, scale: &mut ColorScale) {
	let y = state.height - LEGEND_HEIGHT / 2.0;
	ctx.set_font("11px sans-serif");
	ctx.set_text_baseline("middle");
	ctx.set_text_align("left");

	let groups = scale.groups().to_vec();
	let mut x = 8.0;
	for group in groups {
		ctx.set_fill_style_str(scale.color(group));
		ctx.fill_rect(x, y - 6.0, 12.0, 12.0);

		let label = format!("Stage {group}");
		ctx.set_fill_style_str(LABEL_COLOR);
		let _ = ctx.fill_text(&label, x + 16.0, y);
		let width = ctx
			.measure_text(&label)
			.map(|m| m.width())
			.unwrap_or(48.0);
		x += 16.0 + width + 14.0;
	}
}

fn draw_tooltip(state: &SankeyState, ctx: &CanvasRenderingContext2d) {
	let Some(target) = state.hover.target else {
		return;
	};

	let lines = match target {
		HoverTarget::Link(i) => {
			let link = &state.layout.links[i];
			let src = &state.layout.nodes[link.source];
			let tgt = &state.layout.nodes[link.target];
			[
				format!("{} \u{2192} {}", src.id, tgt.id),
				format!("Value: {}", link.value),
			]
		}
		HoverTarget::Node(i) => {
			let node = &state.layout.nodes[i];
			[node.id.clone(), format!("Value: {}", node.value)]
		}
	};

	ctx.set_font("12px sans-serif");
	let text_width = lines
		.iter()
		.map(|line| ctx.measure_text(line).map(|m| m.width()).unwrap_or(80.0))
		.fold(0.0, f64::max);
	let (pad, line_height) = (8.0, 16.0);
	let (box_w, box_h) = (
		text_width + pad * 2.0,
		line_height * lines.len() as f64 + pad * 2.0,
	);

	// Offset from the pointer, clamped onto the canvas.
	let x = (state.hover.pointer_x + 12.0).min(state.width - box_w - 2.0).max(2.0);
	let y = (state.hover.pointer_y + 12.0).min(state.height - box_h - 2.0).max(2.0);

	ctx.set_fill_style_str("#ffffff");
	ctx.fill_rect(x, y, box_w, box_h);
	ctx.set_stroke_style_str(LABEL_COLOR);
	ctx.set_line_width(1.0);
	ctx.stroke_rect(x, y, box_w, box_h);

	ctx.set_fill_style_str(LABEL_COLOR);
	ctx.set_text_align("left");
	ctx.set_text_baseline("middle");
	for (i, line) in lines.iter().enumerate() {
		let _ = ctx.fill_text(line, x + pad, y + pad + line_height * (i as f64 + 0.5));
	}
}
