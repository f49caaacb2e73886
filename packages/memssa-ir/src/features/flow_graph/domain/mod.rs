pub mod cfg;

pub use cfg::{BasicBlock, BlockKind, Cfg, Edge, EdgeKind, Operation, StoreKind, UseSite};
