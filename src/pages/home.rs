use leptos::prelude::*;

use crate::components::sankey::{FlowGraph, FlowLink, FlowNode, SankeyCanvas};

fn node(id: &str, group: u32) -> FlowNode {
	FlowNode {
		id: id.into(),
		group,
	}
}

fn flow(source: &str, target: &str, value: f64) -> FlowLink {
	FlowLink {
		source: source.into(),
		target: target.into(),
		value,
	}
}

/// The fixed narrative-flow dataset: how an initial report propagates through
/// economic, political, and public channels toward eventual outcomes.
fn narrative_flow_data() -> FlowGraph {
	FlowGraph {
		nodes: vec![
			node("Initial Report", 1),
			node("Economic Impact", 2),
			node("Political Response", 3),
			node("Public Reaction", 4),
			node("Expert Analysis", 5),
			node("Policy Proposal", 3),
			node("Market Response", 2),
			node("Social Media", 4),
			node("Opposition View", 3),
			node("International Perspective", 6),
			node("Historical Context", 5),
			node("Future Implications", 2),
		],
		links: vec![
			// Initial triggers
			flow("Initial Report", "Economic Impact", 5.0),
			flow("Initial Report", "Political Response", 8.0),
			flow("Initial Report", "Public Reaction", 6.0),
			// Economic flow
			flow("Economic Impact", "Market Response", 7.0),
			flow("Economic Impact", "Expert Analysis", 4.0),
			// Political flow
			flow("Political Response", "Policy Proposal", 6.0),
			flow("Political Response", "Opposition View", 5.0),
			// Public reaction flow
			flow("Public Reaction", "Social Media", 9.0),
			// Analysis and context
			flow("Expert Analysis", "Historical Context", 4.0),
			flow("Expert Analysis", "Future Implications", 5.0),
			// Policy outcomes
			flow("Policy Proposal", "Future Implications", 3.0),
			flow("Policy Proposal", "International Perspective", 2.0),
			// Market outcomes
			flow("Market Response", "Future Implications", 4.0),
			// Social influence
			flow("Social Media", "Opposition View", 3.0),
		],
	}
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let graph_data = Signal::derive(narrative_flow_data);

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="flow-panel">
				<div class="flow-header">
					<h1>"Narrative Flow Analysis"</h1>
					<p class="subtitle">
						"Information flow from initial report to various outcomes"
					</p>
				</div>
				<SankeyCanvas data=graph_data width=Some(800.0) height=Some(600.0) />
			</div>
		</ErrorBoundary>
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::sankey::layout::{self, LayoutParams};

	#[test]
	fn narrative_dataset_lays_out_cleanly() {
		let graph = narrative_flow_data();
		let layout = layout::compute(&graph, &LayoutParams::default()).unwrap();
		assert_eq!(layout.nodes.len(), 12);
		assert_eq!(layout.links.len(), 14);

		// "Initial Report" fans out 19 units from the leftmost column.
		let root = layout
			.nodes
			.iter()
			.find(|n| n.id == "Initial Report")
			.unwrap();
		assert_eq!(root.depth, 0);
		assert!((root.value - 19.0).abs() < 1e-9);
	}
}
