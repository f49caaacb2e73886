pub mod ssa_graph;

pub use ssa_graph::{ChiCause, DefKind, DefSite, Definition, SsaGraph};
