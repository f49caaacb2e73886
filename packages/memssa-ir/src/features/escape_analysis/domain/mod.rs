pub mod escape_state;

pub use escape_state::{EscapeSet, EscapeState};
