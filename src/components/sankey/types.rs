/// A named stage in the flow. `group` tags the stage category for coloring.
#[derive(Clone, Debug, PartialEq)]
pub struct FlowNode {
	pub id: String,
	pub group: u32,
}

/// A weighted directed flow between two stages, referenced by id.
#[derive(Clone, Debug, PartialEq)]
pub struct FlowLink {
	pub source: String,
	pub target: String,
	pub value: f64,
}

/// An immutable directed acyclic flow graph, supplied at construction time.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FlowGraph {
	pub nodes: Vec<FlowNode>,
	pub links: Vec<FlowLink>,
}

/// Rejected before layout; the canvas is cleared and nothing is drawn.
#[derive(Clone, Debug, PartialEq)]
pub enum InvalidGraphError {
	EmptyGraph,
	DuplicateNode(String),
	DanglingLink(String),
	NonPositiveValue {
		source: String,
		target: String,
		value: f64,
	},
	Cycle(String),
}

// Display/Error are implemented by hand because `thiserror` treats a field
// named `source` as the error's cause, which `String` cannot be.
impl std::fmt::Display for InvalidGraphError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::EmptyGraph => write!(f, "graph has no nodes"),
			Self::DuplicateNode(id) => write!(f, "duplicate node id `{id}`"),
			Self::DanglingLink(id) => write!(f, "link references unknown node id `{id}`"),
			Self::NonPositiveValue {
				source,
				target,
				value,
			} => write!(
				f,
				"link `{source}` -> `{target}` has non-positive value {value}"
			),
			Self::Cycle(id) => write!(f, "cycle detected through node `{id}`"),
		}
	}
}

impl std::error::Error for InvalidGraphError {}
