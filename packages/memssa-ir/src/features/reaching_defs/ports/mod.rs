pub mod reaching_definitions;

pub use reaching_definitions::ReachingDefinitions;
