//! Variable scope of a procedure
//!
//! Names are unique per procedure, so the scope is a flat map. A name that is
//! read but never declared is a global the front-end did not hand over; it is
//! treated like an `extern` variable.

use ahash::AHashMap;

use super::ast::{Procedure, Storage};
use super::types::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarOrigin {
    Param,
    Local(Storage),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarInfo {
    pub ty: Type,
    pub origin: VarOrigin,
}

impl VarInfo {
    /// Holds a value on procedure entry (parameter, static, extern)
    pub fn starts_defined(&self) -> bool {
        !matches!(self.origin, VarOrigin::Local(Storage::Auto))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Scope {
    vars: AHashMap<String, VarInfo>,
}

impl Scope {
    pub fn from_procedure(proc: &Procedure) -> Self {
        let mut vars = AHashMap::new();
        for param in &proc.params {
            vars.insert(
                param.name.clone(),
                VarInfo {
                    ty: param.ty.clone(),
                    origin: VarOrigin::Param,
                },
            );
        }
        for decl in proc.local_decls() {
            vars.insert(
                decl.name.clone(),
                VarInfo {
                    ty: decl.ty.clone(),
                    origin: VarOrigin::Local(decl.storage),
                },
            );
        }
        Self { vars }
    }

    pub fn get(&self, name: &str) -> Option<&VarInfo> {
        self.vars.get(name)
    }

    pub fn type_of(&self, name: &str) -> Option<&Type> {
        self.vars.get(name).map(|info| &info.ty)
    }

    /// Undeclared names are globals and start defined
    pub fn starts_defined(&self, name: &str) -> bool {
        self.vars.get(name).map_or(true, VarInfo::starts_defined)
    }

    /// Visible to every callee without its address being passed (extern or undeclared)
    pub fn is_global(&self, name: &str) -> bool {
        match self.vars.get(name) {
            Some(info) => info.origin == VarOrigin::Local(Storage::Extern),
            None => true,
        }
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::procedure::domain::{Stmt, VarDecl};

    #[test]
    fn test_storage_decides_entry_state() {
        let proc = Procedure::new("f").param("n", Type::int()).body(vec![
            Stmt::decl("a", Type::int()),
            Stmt::Decl {
                var: VarDecl::new("s", Type::int()).storage(Storage::Static),
                init: None,
            },
            Stmt::Decl {
                var: VarDecl::new("e", Type::int()).storage(Storage::Extern),
                init: None,
            },
        ]);
        let scope = Scope::from_procedure(&proc);

        assert_eq!(scope.len(), 4);
        assert!(scope.starts_defined("n"));
        assert!(!scope.starts_defined("a"));
        assert!(scope.starts_defined("s"));
        assert!(scope.starts_defined("e"));
        assert!(scope.starts_defined("some_global"));
        assert!(scope.is_global("e"));
        assert!(scope.is_global("some_global"));
        assert!(!scope.is_global("s"));
        assert!(!scope.is_global("n"));
    }
}
