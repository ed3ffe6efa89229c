pub mod sankey;
