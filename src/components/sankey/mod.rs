mod component;
pub mod layout;
mod render;
pub mod scale;
mod state;
mod types;

pub use component::SankeyCanvas;
pub use types::{FlowGraph, FlowLink, FlowNode, InvalidGraphError};
