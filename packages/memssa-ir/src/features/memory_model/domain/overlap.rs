//! Overlap classification between two abstract locations
//!
//! Pure and symmetric. Paths are compared element by element over their
//! common prefix:
//!
//! - a definitely different element (other field, other constant index,
//!   disjoint byte range) makes the locations Disjoint
//! - an element that may or may not be the same (unknown index, partially
//!   intersecting bytes, field vs byte range) makes them Partial
//! - otherwise equal paths are Exact and a strict prefix is Total
//!
//! Different variables never overlap. Every other pair of different roots
//! (variable vs pointee, two pointees, anything vs unknown memory) may alias
//! and is Partial.

use serde::{Deserialize, Serialize};

use super::location::{AbstractLocation, IndexKind, LocationRoot, PathElem};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Overlap {
    /// Same location
    Exact,
    /// One location contains the other
    Total,
    /// May share memory, cannot be proved either way
    Partial,
    /// Never share memory
    Disjoint,
}

impl Overlap {
    pub fn overlaps(self) -> bool {
        self != Overlap::Disjoint
    }
}

enum ElemRelation {
    Same,
    /// Same shape, may or may not be the same element
    Maybe,
    /// Different shapes: later elements are not comparable
    Incomparable,
    Different,
}

fn compare_elems(a: &PathElem, b: &PathElem) -> ElemRelation {
    match (a, b) {
        (PathElem::Field(x), PathElem::Field(y)) => {
            if x == y {
                ElemRelation::Same
            } else {
                ElemRelation::Different
            }
        }
        (PathElem::Index(x), PathElem::Index(y)) => match (x, y) {
            (IndexKind::Const(i), IndexKind::Const(j)) => {
                if i == j {
                    ElemRelation::Same
                } else {
                    ElemRelation::Different
                }
            }
            (IndexKind::Unknown(s), IndexKind::Unknown(t)) if s == t => ElemRelation::Same,
            _ => ElemRelation::Maybe,
        },
        (
            PathElem::Bytes {
                offset: oa,
                len: la,
            },
            PathElem::Bytes {
                offset: ob,
                len: lb,
            },
        ) => {
            let end_a = oa.saturating_add(*la);
            let end_b = ob.saturating_add(*lb);
            if oa == ob && la == lb {
                ElemRelation::Same
            } else if end_a <= *ob || end_b <= *oa {
                ElemRelation::Different
            } else {
                ElemRelation::Incomparable
            }
        }
        _ => ElemRelation::Incomparable,
    }
}

/// Classify how two locations overlap
pub fn classify(a: &AbstractLocation, b: &AbstractLocation) -> Overlap {
    match (&a.root, &b.root) {
        (LocationRoot::Var(x), LocationRoot::Var(y)) if x != y => return Overlap::Disjoint,
        (ra, rb) if ra != rb => return Overlap::Partial,
        _ => {}
    }

    let mut maybe = false;
    for (ea, eb) in a.path.iter().zip(&b.path) {
        match compare_elems(ea, eb) {
            ElemRelation::Same => {}
            ElemRelation::Maybe => maybe = true,
            ElemRelation::Incomparable => return Overlap::Partial,
            ElemRelation::Different => return Overlap::Disjoint,
        }
    }

    if maybe {
        Overlap::Partial
    } else if a.path.len() == b.path.len() {
        Overlap::Exact
    } else {
        Overlap::Total
    }
}
