//! Console output for plans, graphs and catalogues

pub mod console;
