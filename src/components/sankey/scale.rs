//! Ordinal color scale over the category-10 palette.

/// d3's `schemeCategory10`.
pub const CATEGORY10: &[&str] = &[
	"#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
	"#bcbd22", "#17becf",
];

/// Assigns palette colors to group tags in first-seen order, so the mapping
/// is stable for the lifetime of a render pass.
#[derive(Clone, Debug, Default)]
pub struct ColorScale {
	seen: Vec<u32>,
}

impl ColorScale {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn color(&mut self, group: u32) -> &'static str {
		let idx = match self.seen.iter().position(|&g| g == group) {
			Some(idx) => idx,
			None => {
				self.seen.push(group);
				self.seen.len() - 1
			}
		};
		CATEGORY10[idx % CATEGORY10.len()]
	}

	/// Groups in assignment order, for the legend row.
	pub fn groups(&self) -> &[u32] {
		&self.seen
	}
}
