pub mod initialization;
pub mod value_facts;

pub use initialization::Initialization;
pub use value_facts::{flatten_phis, value_facts, ValueFacts};
