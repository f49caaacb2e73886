//! Resolved type information handed over by the front-end
//!
//! Only what location containment needs: sizes for byte reinterpretation,
//! struct fields for aggregate copies, element/pointee types for indexing.
//! Struct and typedef names are resolved through a [`TypeTable`].

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Typedef chains longer than this are treated as cyclic and left opaque
const MAX_TYPEDEF_DEPTH: usize = 64;

const POINTER_SIZE: u64 = 8;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Type {
    /// Arithmetic or enum type of a known size in bytes
    Scalar { name: String, size: u64 },
    Pointer { pointee: Box<Type> },
    Array { element: Box<Type>, len: Option<u64> },
    /// Named struct, fields come from the type table
    Struct { name: String },
    /// Named typedef, target comes from the type table
    Typedef { name: String },
    Void,
    /// Type whose layout the front-end could not provide
    Opaque { name: String },
}

impl Type {
    pub fn scalar(name: impl Into<String>, size: u64) -> Self {
        Type::Scalar {
            name: name.into(),
            size,
        }
    }

    pub fn int() -> Self {
        Self::scalar("int", 4)
    }

    pub fn char() -> Self {
        Self::scalar("char", 1)
    }

    pub fn bool() -> Self {
        Self::scalar("bool", 1)
    }

    pub fn pointer_to(pointee: Type) -> Self {
        Type::Pointer {
            pointee: Box::new(pointee),
        }
    }

    pub fn array_of(element: Type, len: Option<u64>) -> Self {
        Type::Array {
            element: Box::new(element),
            len,
        }
    }

    pub fn named_struct(name: impl Into<String>) -> Self {
        Type::Struct { name: name.into() }
    }

    pub fn typedef(name: impl Into<String>) -> Self {
        Type::Typedef { name: name.into() }
    }

    pub fn opaque(name: impl Into<String>) -> Self {
        Type::Opaque { name: name.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructDef {
    pub name: String,
    pub fields: Vec<FieldDef>,
}

impl StructDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Builder: Append a field
    pub fn field(mut self, name: impl Into<String>, ty: Type) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            ty,
        });
        self
    }
}

/// Struct and typedef definitions visible to one or more procedures
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeTable {
    structs: AHashMap<String, StructDef>,
    typedefs: AHashMap<String, Type>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: Register a struct definition
    pub fn with_struct(mut self, def: StructDef) -> Self {
        self.add_struct(def);
        self
    }

    /// Builder: Register a typedef
    pub fn with_typedef(mut self, name: impl Into<String>, target: Type) -> Self {
        self.typedefs.insert(name.into(), target);
        self
    }

    pub fn add_struct(&mut self, def: StructDef) {
        self.structs.insert(def.name.clone(), def);
    }

    pub fn struct_def(&self, name: &str) -> Option<&StructDef> {
        self.structs.get(name)
    }

    /// Strip typedefs until a non-typedef type is reached
    ///
    /// Unknown or cyclic typedefs resolve to [`Type::Opaque`].
    pub fn resolve(&self, ty: &Type) -> Type {
        let mut current = ty;
        for _ in 0..MAX_TYPEDEF_DEPTH {
            match current {
                Type::Typedef { name } => match self.typedefs.get(name) {
                    Some(target) => current = target,
                    None => return Type::opaque(name.clone()),
                },
                other => return other.clone(),
            }
        }
        Type::opaque("<typedef cycle>")
    }

    /// Structural equivalence after typedef resolution at every level
    pub fn equivalent(&self, a: &Type, b: &Type) -> bool {
        self.equivalent_depth(a, b, 0)
    }

    fn equivalent_depth(&self, a: &Type, b: &Type, depth: usize) -> bool {
        if depth > MAX_TYPEDEF_DEPTH {
            return false;
        }
        match (self.resolve(a), self.resolve(b)) {
            (Type::Pointer { pointee: pa }, Type::Pointer { pointee: pb }) => {
                self.equivalent_depth(&pa, &pb, depth + 1)
            }
            (
                Type::Array {
                    element: ea,
                    len: la,
                },
                Type::Array {
                    element: eb,
                    len: lb,
                },
            ) => la == lb && self.equivalent_depth(&ea, &eb, depth + 1),
            (ra, rb) => ra == rb,
        }
    }

    /// Size in bytes, `None` for void, opaque or incomplete types
    pub fn size_of(&self, ty: &Type) -> Option<u64> {
        self.size_of_depth(ty, 0)
    }

    fn size_of_depth(&self, ty: &Type, depth: usize) -> Option<u64> {
        if depth > MAX_TYPEDEF_DEPTH {
            return None;
        }
        match self.resolve(ty) {
            Type::Scalar { size, .. } => Some(size),
            Type::Pointer { .. } => Some(POINTER_SIZE),
            Type::Array { element, len } => {
                let len = len?;
                self.size_of_depth(&element, depth + 1)
                    .map(|elem| elem.saturating_mul(len))
            }
            Type::Struct { name } => {
                let def = self.structs.get(&name)?;
                def.fields.iter().try_fold(0u64, |acc, field| {
                    self.size_of_depth(&field.ty, depth + 1)
                        .map(|size| acc.saturating_add(size))
                })
            }
            Type::Void | Type::Opaque { .. } | Type::Typedef { .. } => None,
        }
    }

    /// Fields of a struct type, `None` if the type is not a known struct
    pub fn fields_of(&self, ty: &Type) -> Option<&[FieldDef]> {
        match self.resolve(ty) {
            Type::Struct { name } => self.structs.get(&name).map(|def| def.fields.as_slice()),
            _ => None,
        }
    }

    pub fn field_type(&self, ty: &Type, field: &str) -> Option<Type> {
        self.fields_of(ty)?
            .iter()
            .find(|f| f.name == field)
            .map(|f| f.ty.clone())
    }

    pub fn pointee(&self, ty: &Type) -> Option<Type> {
        match self.resolve(ty) {
            Type::Pointer { pointee } => Some(*pointee),
            _ => None,
        }
    }

    pub fn element(&self, ty: &Type) -> Option<Type> {
        match self.resolve(ty) {
            Type::Array { element, .. } => Some(*element),
            _ => None,
        }
    }

    pub fn is_pointer(&self, ty: &Type) -> bool {
        matches!(self.resolve(ty), Type::Pointer { .. })
    }

    pub fn is_array(&self, ty: &Type) -> bool {
        matches!(self.resolve(ty), Type::Array { .. })
    }

    /// Struct or array: assignment between two of these is an aggregate copy
    pub fn is_aggregate(&self, ty: &Type) -> bool {
        matches!(self.resolve(ty), Type::Struct { .. } | Type::Array { .. })
    }
}
