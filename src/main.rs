use leptos::prelude::*;
use narrative_flow_canvas::{App, init_logging};

fn main() {
	init_logging();
	mount_to_body(App);
}
