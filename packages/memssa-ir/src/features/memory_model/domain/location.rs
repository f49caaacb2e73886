//! Abstract memory locations
//!
//! A location is a root plus a flat path of field / index / byte-range
//! elements. Nested containment (struct of struct of array) is a longer
//! path, never a nested type, so containment is a path-prefix question.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationRoot {
    /// A named variable of the procedure (or a global)
    Var(String),
    /// Memory reached through the named pointer variable
    Pointee(String),
    /// Memory reached through a pointer expression that has no name,
    /// tagged with its access site
    Unknown(u32),
}

impl LocationRoot {
    pub fn var_name(&self) -> Option<&str> {
        match self {
            LocationRoot::Var(name) => Some(name),
            _ => None,
        }
    }

    /// Pointee and unknown roots may be reached by code outside the procedure
    pub fn is_external(&self) -> bool {
        !matches!(self, LocationRoot::Var(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    Const(i64),
    /// Non-constant index, tagged with its access site
    Unknown(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathElem {
    Field(String),
    Index(IndexKind),
    /// Byte range viewed through a narrower type
    Bytes { offset: u64, len: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AbstractLocation {
    pub root: LocationRoot,
    pub path: Vec<PathElem>,
}

impl AbstractLocation {
    pub fn var(name: impl Into<String>) -> Self {
        Self {
            root: LocationRoot::Var(name.into()),
            path: Vec::new(),
        }
    }

    pub fn pointee(pointer: impl Into<String>) -> Self {
        Self {
            root: LocationRoot::Pointee(pointer.into()),
            path: Vec::new(),
        }
    }

    pub fn unknown(site: u32) -> Self {
        Self {
            root: LocationRoot::Unknown(site),
            path: Vec::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.path.push(PathElem::Field(name.into()));
        self
    }

    pub fn index(mut self, index: IndexKind) -> Self {
        self.path.push(PathElem::Index(index));
        self
    }

    pub fn const_index(self, index: i64) -> Self {
        self.index(IndexKind::Const(index))
    }

    pub fn bytes(mut self, offset: u64, len: u64) -> Self {
        self.path.push(PathElem::Bytes { offset, len });
        self
    }

    /// The whole variable or pointee object
    pub fn is_whole_object(&self) -> bool {
        self.path.is_empty()
    }

    /// Whole location of the named variable (`p`, never `p.f`)
    pub fn is_whole_var(&self, name: &str) -> bool {
        self.path.is_empty() && self.root.var_name() == Some(name)
    }

    /// Syntactic containment: same root and `self.path` is a prefix of `other.path`
    pub fn is_prefix_of(&self, other: &AbstractLocation) -> bool {
        self.root == other.root
            && self.path.len() <= other.path.len()
            && self.path.iter().zip(&other.path).all(|(a, b)| a == b)
    }

    /// Strictly enclosed by `self`
    pub fn strictly_contains(&self, other: &AbstractLocation) -> bool {
        self.path.len() < other.path.len() && self.is_prefix_of(other)
    }

    /// Move `self` from under `from` to under `to`
    ///
    /// Used to mirror sub-locations across an aggregate copy. Returns `None`
    /// when `self` is not inside `from`.
    pub fn rebase(&self, from: &AbstractLocation, to: &AbstractLocation) -> Option<Self> {
        if !from.is_prefix_of(self) {
            return None;
        }
        let mut path = to.path.clone();
        path.extend_from_slice(&self.path[from.path.len()..]);
        Some(Self {
            root: to.root.clone(),
            path,
        })
    }
}

impl fmt::Display for LocationRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationRoot::Var(name) => write!(f, "{}", name),
            LocationRoot::Pointee(name) => write!(f, "(*{})", name),
            LocationRoot::Unknown(site) => write!(f, "(*?{})", site),
        }
    }
}

impl fmt::Display for AbstractLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)?;
        for elem in &self.path {
            match elem {
                PathElem::Field(name) => write!(f, ".{}", name)?,
                PathElem::Index(IndexKind::Const(k)) => write!(f, "[{}]", k)?,
                PathElem::Index(IndexKind::Unknown(site)) => write!(f, "[?{}]", site)?,
                PathElem::Bytes { offset, len } => write!(f, "{{{}+{}}}", offset, len)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(AbstractLocation::var("x").to_string(), "x");
        assert_eq!(
            AbstractLocation::pointee("p").const_index(0).field("x").to_string(),
            "(*p)[0].x"
        );
        assert_eq!(
            AbstractLocation::var("a").index(IndexKind::Unknown(3)).to_string(),
            "a[?3]"
        );
        assert_eq!(AbstractLocation::var("x").bytes(0, 1).to_string(), "x{0+1}");
    }

    #[test]
    fn test_prefix_and_rebase() {
        let a = AbstractLocation::var("a");
        let ax = AbstractLocation::var("a").field("x");
        let b = AbstractLocation::var("b");

        assert!(a.is_prefix_of(&ax));
        assert!(a.strictly_contains(&ax));
        assert!(!ax.strictly_contains(&ax));
        assert!(!b.is_prefix_of(&ax));
        assert_eq!(ax.rebase(&a, &b), Some(AbstractLocation::var("b").field("x")));
        assert_eq!(b.rebase(&a, &b), None);
    }
}
