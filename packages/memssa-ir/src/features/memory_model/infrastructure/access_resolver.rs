//! Access resolution: lvalue expression → canonical abstract location
//!
//! Resolution is purely structural. It does not emit operations; instead it
//! reports the sub-expressions whose *values* are needed to compute the
//! address (the pointer in `p->f`, the index in `a[i]`), which the flow
//! graph builder lowers before the access itself.
//!
//! Folding rules:
//! - `*&x`, `(&x)[0]`, `(&s)->f` are `x`, `x`, `s.f`; no address escapes
//! - `*p` and `p[0]` are both `(*p)[0]`, `p->f` is `(*p)[0].f`
//! - `((char*)&x)[k]` is `x{k+1}` when the narrower view fits inside `x`
//! - anything that cannot be placed inside its object degrades to the
//!   whole object and carries a [`NoteReason`]

use crate::features::memory_model::domain::{AbstractLocation, IndexKind};
use crate::features::procedure::domain::{BinaryOp, Expr, Scope, Type, TypeTable};
use crate::shared::models::NoteReason;

/// Resolved lvalue
#[derive(Debug, Clone)]
pub struct Access<'e> {
    pub location: AbstractLocation,
    /// Static type of the accessed object, when known
    pub ty: Option<Type>,
    /// Set when the access was widened to its enclosing object
    pub degraded: Option<NoteReason>,
    /// Sub-expressions evaluated (as values) to form the address
    pub operands: Vec<&'e Expr>,
}

impl<'e> Access<'e> {
    fn new(location: AbstractLocation, ty: Option<Type>) -> Self {
        Self {
            location,
            ty,
            degraded: None,
            operands: Vec::new(),
        }
    }

    fn degrade(mut self, reason: NoteReason) -> Self {
        if self.degraded.is_none() {
            tracing::debug!(location = %self.location, %reason, "access degraded to whole object");
            self.degraded = Some(reason);
        }
        self.ty = None;
        self
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }
}

pub struct AccessResolver<'a> {
    types: &'a TypeTable,
    scope: &'a Scope,
    next_site: u32,
}

impl<'a> AccessResolver<'a> {
    pub fn new(types: &'a TypeTable, scope: &'a Scope) -> Self {
        Self {
            types,
            scope,
            next_site: 0,
        }
    }

    fn fresh_site(&mut self) -> u32 {
        let site = self.next_site;
        self.next_site += 1;
        site
    }

    /// Resolve an lvalue expression
    pub fn resolve<'e>(&mut self, expr: &'e Expr) -> Access<'e> {
        match expr {
            Expr::Var(name) => Access::new(
                AbstractLocation::var(name.clone()),
                self.scope.type_of(name).cloned(),
            ),
            Expr::Member {
                base,
                field,
                arrow: false,
            } => {
                let access = self.resolve(base);
                self.select_field(access, field)
            }
            Expr::Member {
                base,
                field,
                arrow: true,
            } => {
                let access = self.deref(base, IndexKind::Const(0), None);
                self.select_field(access, field)
            }
            Expr::Deref(pointer) => self.deref(pointer, IndexKind::Const(0), None),
            Expr::Index { base, index } => {
                let (kind, index_operand) = match index.as_constant() {
                    Some(k) => (IndexKind::Const(k), None),
                    None => (IndexKind::Unknown(self.fresh_site()), Some(index.as_ref())),
                };
                if self.is_array_lvalue(base) {
                    let mut access = self.resolve(base);
                    if !access.is_degraded() {
                        let element = access.ty.as_ref().and_then(|ty| self.types.element(ty));
                        access.location = access.location.index(kind);
                        access.ty = element;
                    }
                    access.operands.extend(index_operand);
                    access
                } else {
                    self.deref(base, kind, index_operand)
                }
            }
            Expr::Cast { expr, .. } => self.resolve(expr),
            _ => {
                let site = self.fresh_site();
                let mut access = Access::new(AbstractLocation::unknown(site), None);
                access.operands.push(expr);
                access.degrade(NoteReason::UnknownPointerBase)
            }
        }
    }

    fn select_field<'e>(&self, access: Access<'e>, field: &str) -> Access<'e> {
        if access.is_degraded() {
            return access;
        }
        match access
            .ty
            .as_ref()
            .and_then(|ty| self.types.field_type(ty, field))
        {
            Some(field_ty) => {
                let mut access = access;
                access.location = access.location.field(field);
                access.ty = Some(field_ty);
                access
            }
            // Pointee and unknown memory have no declared layout to check against
            None if access.location.root.is_external() && access.ty.is_none() => {
                let mut access = access;
                access.location = access.location.field(field);
                access
            }
            None => access.degrade(NoteReason::UnknownField(field.to_string())),
        }
    }

    /// Location of `pointer[index]`
    fn deref<'e>(
        &mut self,
        pointer: &'e Expr,
        index: IndexKind,
        index_operand: Option<&'e Expr>,
    ) -> Access<'e> {
        let (inner, cast) = strip_casts(pointer);
        let view = cast.and_then(|ty| self.types.pointee(ty));

        let mut access = match inner {
            Expr::AddrOf(object) => {
                let object = self.resolve(object);
                self.rederive(object, view, index)
            }
            Expr::Binary {
                op: op @ (BinaryOp::Add | BinaryOp::Sub),
                lhs,
                rhs,
            } if cast.is_none() && self.is_pointer_like(lhs) => {
                let (shifted, offset_operand) = match (index, rhs.as_constant()) {
                    (IndexKind::Const(i), Some(k)) => {
                        let k = if *op == BinaryOp::Sub { -k } else { k };
                        (IndexKind::Const(i.saturating_add(k)), None)
                    }
                    _ => (IndexKind::Unknown(self.fresh_site()), Some(rhs.as_ref())),
                };
                let mut access = self.deref(lhs, shifted, None);
                access.operands.extend(offset_operand);
                access
            }
            _ if self.is_array_lvalue(inner) => {
                let array = self.resolve(inner);
                let element = array.ty.as_ref().and_then(|ty| self.types.element(ty));
                match (view, element) {
                    (Some(view), Some(element)) if !self.types.equivalent(&view, &element) => {
                        self.reinterpret(array, &view, index)
                    }
                    (_, element) => self.index_into(array, index, element),
                }
            }
            // `*p++`, `*(p = q)`: the pointer moves, the offset is unknown
            Expr::Update(target) | Expr::Assign { lhs: target, .. } => match target.as_ref() {
                Expr::Var(name) => {
                    let site = self.fresh_site();
                    let mut access = self.pointee_access(name, IndexKind::Unknown(site), view);
                    access.operands.push(pointer);
                    access
                }
                _ => self.unknown_target(pointer, index, view),
            },
            Expr::Var(name) => {
                let mut access = self.pointee_access(name, index, view);
                access.operands.push(pointer);
                access
            }
            _ => self.unknown_target(pointer, index, view),
        };
        access.operands.extend(index_operand);
        access
    }

    fn pointee_access<'e>(&self, pointer: &str, index: IndexKind, view: Option<Type>) -> Access<'e> {
        let pointee = view.or_else(|| {
            self.scope
                .type_of(pointer)
                .and_then(|ty| self.types.pointee(ty))
        });
        Access::new(AbstractLocation::pointee(pointer).index(index), pointee)
    }

    fn unknown_target<'e>(
        &mut self,
        pointer: &'e Expr,
        index: IndexKind,
        view: Option<Type>,
    ) -> Access<'e> {
        let site = self.fresh_site();
        let mut access = Access::new(AbstractLocation::unknown(site).index(index), view);
        access.operands.push(pointer);
        access
    }

    /// `(&object)[index]`, possibly viewed through another pointee type
    fn rederive<'e>(&self, object: Access<'e>, view: Option<Type>, index: IndexKind) -> Access<'e> {
        if object.is_degraded() {
            return object;
        }
        let same_type = match (&view, &object.ty) {
            (None, _) => true,
            (Some(view), Some(ty)) => self.types.equivalent(view, ty),
            (Some(_), None) => false,
        };
        if same_type {
            return match index {
                IndexKind::Const(0) => object,
                _ => object.degrade(NoteReason::OutOfRange),
            };
        }
        match view {
            Some(view) => self.reinterpret(object, &view, index),
            None => object.degrade(NoteReason::Reinterpretation),
        }
    }

    /// Element `index` of `object` viewed as an array of `view`
    fn reinterpret<'e>(&self, object: Access<'e>, view: &Type, index: IndexKind) -> Access<'e> {
        let sizes = (
            self.types.size_of(view),
            object.ty.as_ref().and_then(|ty| self.types.size_of(ty)),
        );
        match (index, sizes) {
            (IndexKind::Const(k), (Some(len), Some(total))) if k >= 0 && len > 0 => {
                let offset = (k as u64).saturating_mul(len);
                if offset.saturating_add(len) <= total {
                    if len == total {
                        let mut object = object;
                        object.ty = Some(view.clone());
                        return object;
                    }
                    let mut object = object;
                    object.location = object.location.bytes(offset, len);
                    object.ty = Some(view.clone());
                    object
                } else {
                    object.degrade(NoteReason::OutOfRange)
                }
            }
            _ => object.degrade(NoteReason::Reinterpretation),
        }
    }

    fn index_into<'e>(
        &self,
        array: Access<'e>,
        index: IndexKind,
        element: Option<Type>,
    ) -> Access<'e> {
        if array.is_degraded() {
            return array;
        }
        let mut array = array;
        array.location = array.location.index(index);
        array.ty = element;
        array
    }

    fn is_array_lvalue(&self, expr: &Expr) -> bool {
        matches!(
            expr,
            Expr::Var(_) | Expr::Member { .. } | Expr::Index { .. } | Expr::Deref(_)
        ) && self
            .static_type(expr)
            .map_or(false, |ty| self.types.is_array(&ty))
    }

    fn is_pointer_like(&self, expr: &Expr) -> bool {
        match self.static_type(expr) {
            Some(ty) => self.types.is_pointer(&ty) || self.types.is_array(&ty),
            None => true,
        }
    }

    /// Best-effort static type of an expression, without side effects
    pub fn static_type(&self, expr: &Expr) -> Option<Type> {
        match expr {
            Expr::Int(_) => Some(Type::int()),
            Expr::Str(_) => Some(Type::pointer_to(Type::char())),
            Expr::Var(name) => self.scope.type_of(name).cloned(),
            Expr::Member { base, field, arrow } => {
                let base_ty = self.static_type(base)?;
                let object = if *arrow {
                    self.types.pointee(&base_ty)?
                } else {
                    base_ty
                };
                self.types.field_type(&object, field)
            }
            Expr::Index { base, .. } => {
                let base_ty = self.static_type(base)?;
                self.types
                    .element(&base_ty)
                    .or_else(|| self.types.pointee(&base_ty))
            }
            Expr::Deref(pointer) => {
                let pointer_ty = self.static_type(pointer)?;
                self.types
                    .pointee(&pointer_ty)
                    .or_else(|| self.types.element(&pointer_ty))
            }
            Expr::AddrOf(object) => self.static_type(object).map(Type::pointer_to),
            Expr::Cast { ty, .. } => Some(ty.clone()),
            Expr::Binary { op, lhs, rhs } => match op {
                BinaryOp::Add | BinaryOp::Sub => {
                    let lhs_ty = self.static_type(lhs);
                    match &lhs_ty {
                        Some(ty) if self.types.is_pointer(ty) => lhs_ty,
                        Some(ty) if self.types.is_array(ty) => {
                            self.types.element(ty).map(Type::pointer_to)
                        }
                        _ => self.static_type(rhs),
                    }
                }
                _ => Some(Type::int()),
            },
            Expr::Assign { lhs, .. } => self.static_type(lhs),
            Expr::Update(target) => self.static_type(target),
            Expr::Conditional { then_expr, .. } => self.static_type(then_expr),
            Expr::Unary { expr, .. } => self.static_type(expr),
            Expr::Logical { .. } => Some(Type::bool()),
            Expr::Call { .. } | Expr::InitList(_) => None,
        }
    }

    /// Aggregate-typed lvalue expression: assignment from it is a copy
    pub fn is_aggregate_lvalue(&self, expr: &Expr) -> bool {
        matches!(
            expr,
            Expr::Var(_) | Expr::Member { .. } | Expr::Index { .. } | Expr::Deref(_)
        ) && self
            .static_type(expr)
            .map_or(false, |ty| self.types.is_aggregate(&ty))
    }

    /// Array-typed object used as a value decays to its address
    pub fn decays_to_pointer(&self, expr: &Expr) -> bool {
        self.is_array_lvalue(expr)
    }
}

/// Strip casts, returning the innermost expression and the outermost cast type
fn strip_casts(expr: &Expr) -> (&Expr, Option<&Type>) {
    let mut outer = None;
    let mut current = expr;
    while let Expr::Cast { ty, expr } = current {
        if outer.is_none() {
            outer = Some(ty);
        }
        current = expr;
    }
    (current, outer)
}
