//! Custom assertions for test verification
//!
//! `reported_uses` is the uninitialized-use check a detector would run on
//! top of the query API: a use is reported when some path may read a
//! never-written value and the location was not handed to a callee first.

use memssa_ir::{EscapeState, Initialization, MemorySsa, ReachingDefinitions, UseId};

pub fn is_reported(ssa: &MemorySsa, use_id: UseId) -> bool {
    ssa.initialization(use_id).may_be_uninitialized()
        && ssa
            .escape_state_at(use_id)
            .map_or(false, |state| state < EscapeState::ArgEscape)
}

/// Display names of the reported uses, in program order
pub fn reported_uses(ssa: &MemorySsa) -> Vec<String> {
    ssa.cfg()
        .uses
        .iter()
        .filter(|site| is_reported(ssa, site.id))
        .map(|site| site.location.to_string())
        .collect()
}

pub fn assert_reported(ssa: &MemorySsa, expected: &[&str]) {
    let reported = reported_uses(ssa);
    pretty_assertions::assert_eq!(
        reported,
        expected.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
        "reported uses of {}",
        ssa.name()
    );
}

/// Last use of the location named `name`
pub fn last_use(ssa: &MemorySsa, name: &str) -> UseId {
    *ssa
        .uses_of(name)
        .last()
        .unwrap_or_else(|| panic!("{} has no use of {}", ssa.name(), name))
}

pub fn assert_initialization(ssa: &MemorySsa, name: &str, expected: Initialization) {
    let use_id = last_use(ssa, name);
    assert_eq!(
        ssa.initialization(use_id),
        expected,
        "initialization of the last use of {} in {}",
        name,
        ssa.name()
    );
}
