/*
 * CFG Builder
 *
 * Lowers a procedure's statement tree into basic blocks of primitive memory
 * operations (load, store, copy, address-taken, call, opaque).
 *
 * Lowering rules:
 * - if / while / for are test-before, do-while is test-after: the body end
 *   flows into the condition, the condition owns the back-edge
 * - `continue` targets the loop header (while), the condition (do-while)
 *   or the step block (for)
 * - `&&`, `||`, `?:` become explicit branch blocks in condition and value
 *   context alike
 * - literal-constant conditions only get their feasible edge
 * - code after goto / return / break / continue starts a block without
 *   predecessors; only a label makes it reachable again
 * - switch bodies use C-style case labels with fall-through
 */

use ahash::{AHashMap, AHashSet};
use thiserror::Error;

use crate::config::AnalysisConfig;
use crate::features::flow_graph::domain::{
    BasicBlock, BlockKind, Cfg, Edge, EdgeKind, Operation, StoreKind, UseSite,
};
use crate::features::memory_model::domain::AbstractLocation;
use crate::features::memory_model::infrastructure::{Access, AccessResolver};
use crate::features::procedure::domain::{
    BinaryOp, Expr, LogicalOp, Procedure, Scope, Stmt, Storage, TypeTable, UnaryOp, VarDecl,
};
use crate::shared::models::{BlockId, NoteReason, PrecisionNote, ProgramPoint, UseId};

/// Structural errors: the procedure cannot be lowered and is skipped
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CfgError {
    #[error("goto to undefined label '{0}'")]
    UnresolvedLabel(String),

    #[error("label '{0}' defined more than once")]
    DuplicateLabel(String),

    #[error("'break' outside of a loop or switch")]
    BreakOutsideLoop,

    #[error("'continue' outside of a loop")]
    ContinueOutsideLoop,

    #[error("'case {0}' outside of a switch")]
    CaseOutsideSwitch(i64),

    #[error("'default' outside of a switch")]
    DefaultOutsideSwitch,

    #[error("duplicate 'default' in switch")]
    DuplicateDefault,

    #[error("duplicate 'case {0}' in switch")]
    DuplicateCase(i64),

    #[error("procedure needs more than {limit} blocks")]
    TooManyBlocks { limit: usize },
}

pub type CfgResult<T> = Result<T, CfgError>;

/// Build the flow graph of one procedure
pub fn build_cfg(proc: &Procedure, types: &TypeTable, config: &AnalysisConfig) -> CfgResult<Cfg> {
    let scope = Scope::from_procedure(proc);
    let lowered = {
        let mut builder = CfgBuilder::new(types, &scope, config)?;
        builder.lower_body(&proc.body)?;
        builder.finish()?
    };

    let mut cfg = Cfg {
        name: proc.name.clone(),
        blocks: lowered.blocks,
        uses: lowered.uses,
        scope,
        notes: lowered.notes,
    };
    mark_reachable(&mut cfg);

    tracing::debug!(
        procedure = %cfg.name,
        blocks = cfg.len(),
        edges = cfg.edge_count(),
        uses = cfg.uses.len(),
        unreachable = cfg.blocks.iter().filter(|b| !b.reachable).count(),
        "CFG built"
    );
    Ok(cfg)
}

/// Flag every block reachable from entry
fn mark_reachable(cfg: &mut Cfg) {
    let mut worklist = vec![Cfg::ENTRY];
    while let Some(id) = worklist.pop() {
        let block = &mut cfg.blocks[id.index()];
        if block.reachable {
            continue;
        }
        block.reachable = true;
        worklist.extend(block.successor_ids());
    }
}

#[derive(Debug, Clone, Copy)]
struct Target {
    block: BlockId,
    kind: EdgeKind,
}

impl Target {
    fn new(block: BlockId, kind: EdgeKind) -> Self {
        Self { block, kind }
    }
}

enum JumpScope {
    Loop {
        break_to: BlockId,
        continue_to: BlockId,
    },
    Switch {
        break_to: BlockId,
        dispatch: BlockId,
        has_default: bool,
        cases: AHashSet<i64>,
    },
}

impl JumpScope {
    fn break_to(&self) -> BlockId {
        match self {
            JumpScope::Loop { break_to, .. } | JumpScope::Switch { break_to, .. } => *break_to,
        }
    }
}

struct LabelState {
    block: BlockId,
    defined: bool,
}

struct Lowered {
    blocks: Vec<BasicBlock>,
    uses: Vec<UseSite>,
    notes: Vec<PrecisionNote>,
}

struct CfgBuilder<'a> {
    config: &'a AnalysisConfig,
    resolver: AccessResolver<'a>,
    blocks: Vec<BasicBlock>,
    /// Block receiving the next operation, `None` right after a jump
    current: Option<BlockId>,
    jump_scopes: Vec<JumpScope>,
    labels: AHashMap<String, LabelState>,
    label_order: Vec<String>,
    uses: Vec<UseSite>,
    notes: Vec<PrecisionNote>,
    /// Locations whose address was taken, in emission order
    address_log: Vec<AbstractLocation>,
}

impl<'a> CfgBuilder<'a> {
    fn new(types: &'a TypeTable, scope: &'a Scope, config: &'a AnalysisConfig) -> CfgResult<Self> {
        let mut builder = Self {
            config,
            resolver: AccessResolver::new(types, scope),
            blocks: Vec::new(),
            current: None,
            jump_scopes: Vec::new(),
            labels: AHashMap::new(),
            label_order: Vec::new(),
            uses: Vec::new(),
            notes: Vec::new(),
            address_log: Vec::new(),
        };
        let entry = builder.new_block(BlockKind::Entry)?;
        builder.new_block(BlockKind::Exit)?;
        builder.current = Some(entry);
        Ok(builder)
    }

    fn finish(self) -> CfgResult<Lowered> {
        for name in &self.label_order {
            if self.labels.get(name).map_or(false, |state| !state.defined) {
                return Err(CfgError::UnresolvedLabel(name.clone()));
            }
        }
        Ok(Lowered {
            blocks: self.blocks,
            uses: self.uses,
            notes: self.notes,
        })
    }

    // ------------------------------------------------------------------
    // Blocks and edges
    // ------------------------------------------------------------------

    fn new_block(&mut self, kind: BlockKind) -> CfgResult<BlockId> {
        if self.blocks.len() >= self.config.max_blocks {
            return Err(CfgError::TooManyBlocks {
                limit: self.config.max_blocks,
            });
        }
        let id = BlockId::new(self.blocks.len());
        self.blocks.push(BasicBlock::new(id, kind));
        Ok(id)
    }

    fn add_edge(&mut self, from: BlockId, to: BlockId, kind: EdgeKind) {
        let source = &mut self.blocks[from.index()];
        if source.successor_ids().any(|target| target == to) {
            return;
        }
        source.successors.push(Edge { target: to, kind });
        self.blocks[to.index()].predecessors.push(from);
    }

    fn ensure_current(&mut self) -> CfgResult<BlockId> {
        match self.current {
            Some(block) => Ok(block),
            None => {
                let block = self.new_block(BlockKind::Body)?;
                self.current = Some(block);
                Ok(block)
            }
        }
    }

    /// Fall through from the current block (if any) into `target`
    fn fall_into(&mut self, target: BlockId, kind: EdgeKind) {
        if let Some(current) = self.current.take() {
            self.add_edge(current, target, kind);
        }
    }

    fn jump(&mut self, target: BlockId) -> CfgResult<()> {
        let current = self.ensure_current()?;
        self.add_edge(current, target, EdgeKind::Jump);
        self.current = None;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------

    fn emit(&mut self, op: Operation) -> CfgResult<ProgramPoint> {
        let block = self.ensure_current()?;
        let ops = &mut self.blocks[block.index()].ops;
        ops.push(op);
        Ok(ProgramPoint::new(block, ops.len() - 1))
    }

    fn emit_load(&mut self, location: AbstractLocation) -> CfgResult<()> {
        let use_id = UseId::new(self.uses.len());
        let point = self.emit(Operation::Load {
            location: location.clone(),
            use_id,
        })?;
        self.uses.push(UseSite {
            id: use_id,
            location,
            point,
        });
        Ok(())
    }

    fn emit_store(&mut self, access: &Access<'_>, kind: StoreKind) -> CfgResult<()> {
        let point = self.emit(Operation::Store {
            location: access.location.clone(),
            kind,
            weak: access.is_degraded(),
        })?;
        if let Some(reason) = &access.degraded {
            self.note(point, &access.location, reason.clone());
        }
        Ok(())
    }

    fn emit_address_taken(&mut self, location: AbstractLocation) -> CfgResult<()> {
        self.address_log.push(location.clone());
        self.emit(Operation::AddressTaken { location })?;
        Ok(())
    }

    fn note(&mut self, point: ProgramPoint, location: &AbstractLocation, reason: NoteReason) {
        self.notes.push(PrecisionNote {
            point: Some(point),
            location: location.to_string(),
            reason,
        });
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn lower_body(&mut self, body: &[Stmt]) -> CfgResult<()> {
        self.lower_stmts(body)?;
        self.fall_into(Cfg::EXIT, EdgeKind::Sequential);
        Ok(())
    }

    fn lower_stmts(&mut self, stmts: &[Stmt]) -> CfgResult<()> {
        for stmt in stmts {
            self.lower_stmt(stmt)?;
        }
        Ok(())
    }

    fn lower_stmt(&mut self, stmt: &Stmt) -> CfgResult<()> {
        match stmt {
            Stmt::Decl { var, init } => self.lower_decl(var, init.as_ref()),
            Stmt::Expr(expr) => self.lower_value(expr),
            Stmt::Block(stmts) => self.lower_stmts(stmts),
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => self.lower_if(cond, then_branch, else_branch.as_deref()),
            Stmt::While { cond, body } => self.lower_while(cond, body),
            Stmt::DoWhile { body, cond } => self.lower_do_while(body, cond),
            Stmt::For {
                init,
                cond,
                step,
                body,
            } => self.lower_for(init.as_deref(), cond.as_ref(), step.as_ref(), body),
            Stmt::Switch { scrutinee, body } => self.lower_switch(scrutinee, body),
            Stmt::Case(value) => self.lower_case_label(Some(*value)),
            Stmt::Default => self.lower_case_label(None),
            Stmt::Break => {
                let target = self
                    .jump_scopes
                    .last()
                    .map(JumpScope::break_to)
                    .ok_or(CfgError::BreakOutsideLoop)?;
                self.jump(target)
            }
            Stmt::Continue => {
                let target = self
                    .jump_scopes
                    .iter()
                    .rev()
                    .find_map(|scope| match scope {
                        JumpScope::Loop { continue_to, .. } => Some(*continue_to),
                        JumpScope::Switch { .. } => None,
                    })
                    .ok_or(CfgError::ContinueOutsideLoop)?;
                self.jump(target)
            }
            Stmt::Return(value) => {
                if let Some(value) = value {
                    self.lower_value(value)?;
                }
                let current = self.ensure_current()?;
                self.add_edge(current, Cfg::EXIT, EdgeKind::Return);
                self.current = None;
                Ok(())
            }
            Stmt::Goto(label) => {
                let target = self.label_block(label)?;
                self.jump(target)
            }
            Stmt::Label(name) => self.lower_label(name),
            Stmt::Asm { operands } => self.lower_asm(operands),
        }
    }

    fn lower_decl(&mut self, var: &VarDecl, init: Option<&Expr>) -> CfgResult<()> {
        // static and extern objects are initialized before entry
        if var.storage != Storage::Auto {
            return Ok(());
        }
        match init {
            Some(init) => {
                let target = Expr::Var(var.name.clone());
                self.lower_assignment(&target, init, None, StoreKind::Init)
            }
            None => Ok(()),
        }
    }

    fn lower_if(
        &mut self,
        cond: &Expr,
        then_branch: &[Stmt],
        else_branch: Option<&[Stmt]>,
    ) -> CfgResult<()> {
        let then_block = self.new_block(BlockKind::Body)?;
        let else_block = match else_branch {
            Some(_) => Some(self.new_block(BlockKind::Body)?),
            None => None,
        };
        let join = self.new_block(BlockKind::Join)?;

        self.lower_condition(
            cond,
            Target::new(then_block, EdgeKind::TrueBranch),
            Target::new(else_block.unwrap_or(join), EdgeKind::FalseBranch),
        )?;

        self.current = Some(then_block);
        self.lower_stmts(then_branch)?;
        self.fall_into(join, EdgeKind::Sequential);

        if let (Some(block), Some(stmts)) = (else_block, else_branch) {
            self.current = Some(block);
            self.lower_stmts(stmts)?;
            self.fall_into(join, EdgeKind::Sequential);
        }

        self.current = Some(join);
        Ok(())
    }

    fn lower_loop_body(
        &mut self,
        body: &[Stmt],
        break_to: BlockId,
        continue_to: BlockId,
    ) -> CfgResult<()> {
        self.jump_scopes.push(JumpScope::Loop {
            break_to,
            continue_to,
        });
        let result = self.lower_stmts(body);
        self.jump_scopes.pop();
        result
    }

    fn lower_while(&mut self, cond: &Expr, body: &[Stmt]) -> CfgResult<()> {
        let header = self.new_block(BlockKind::LoopHeader)?;
        let body_block = self.new_block(BlockKind::Body)?;
        let exit = self.new_block(BlockKind::Join)?;

        self.fall_into(header, EdgeKind::Sequential);
        self.current = Some(header);
        self.lower_condition(
            cond,
            Target::new(body_block, EdgeKind::TrueBranch),
            Target::new(exit, EdgeKind::FalseBranch),
        )?;

        self.current = Some(body_block);
        self.lower_loop_body(body, exit, header)?;
        self.fall_into(header, EdgeKind::LoopBack);

        self.current = Some(exit);
        Ok(())
    }

    fn lower_do_while(&mut self, body: &[Stmt], cond: &Expr) -> CfgResult<()> {
        let body_block = self.new_block(BlockKind::LoopHeader)?;
        let cond_block = self.new_block(BlockKind::Condition)?;
        let exit = self.new_block(BlockKind::Join)?;

        self.fall_into(body_block, EdgeKind::Sequential);
        self.current = Some(body_block);
        self.lower_loop_body(body, exit, cond_block)?;
        self.fall_into(cond_block, EdgeKind::Sequential);

        self.current = Some(cond_block);
        self.lower_condition(
            cond,
            Target::new(body_block, EdgeKind::LoopBack),
            Target::new(exit, EdgeKind::FalseBranch),
        )?;

        self.current = Some(exit);
        Ok(())
    }

    fn lower_for(
        &mut self,
        init: Option<&Stmt>,
        cond: Option<&Expr>,
        step: Option<&Expr>,
        body: &[Stmt],
    ) -> CfgResult<()> {
        if let Some(init) = init {
            self.lower_stmt(init)?;
        }

        let header = self.new_block(BlockKind::LoopHeader)?;
        let body_block = self.new_block(BlockKind::Body)?;
        let step_block = self.new_block(BlockKind::Body)?;
        let exit = self.new_block(BlockKind::Join)?;

        self.fall_into(header, EdgeKind::Sequential);
        self.current = Some(header);
        match cond {
            Some(cond) => self.lower_condition(
                cond,
                Target::new(body_block, EdgeKind::TrueBranch),
                Target::new(exit, EdgeKind::FalseBranch),
            )?,
            None => self.fall_into(body_block, EdgeKind::Sequential),
        }

        self.current = Some(body_block);
        self.lower_loop_body(body, exit, step_block)?;
        self.fall_into(step_block, EdgeKind::Sequential);

        self.current = Some(step_block);
        if let Some(step) = step {
            self.lower_value(step)?;
        }
        self.fall_into(header, EdgeKind::LoopBack);

        self.current = Some(exit);
        Ok(())
    }

    fn lower_switch(&mut self, scrutinee: &Expr, body: &[Stmt]) -> CfgResult<()> {
        self.lower_value(scrutinee)?;
        let dispatch = self.ensure_current()?;
        self.mark_condition(dispatch);
        let exit = self.new_block(BlockKind::Join)?;

        // Statements before the first label are dead
        self.current = None;
        self.jump_scopes.push(JumpScope::Switch {
            break_to: exit,
            dispatch,
            has_default: false,
            cases: AHashSet::new(),
        });
        let result = self.lower_stmts(body);
        let scope = self.jump_scopes.pop();
        result?;

        self.fall_into(exit, EdgeKind::Sequential);
        if let Some(JumpScope::Switch {
            has_default: false,
            ..
        }) = scope
        {
            self.add_edge(dispatch, exit, EdgeKind::FalseBranch);
        }

        self.current = Some(exit);
        Ok(())
    }

    fn lower_case_label(&mut self, value: Option<i64>) -> CfgResult<()> {
        let outside = || match value {
            Some(v) => CfgError::CaseOutsideSwitch(v),
            None => CfgError::DefaultOutsideSwitch,
        };
        let scope = self
            .jump_scopes
            .iter_mut()
            .rev()
            .find(|scope| matches!(scope, JumpScope::Switch { .. }))
            .ok_or_else(outside)?;

        let dispatch = match scope {
            JumpScope::Switch {
                dispatch,
                has_default,
                cases,
                ..
            } => {
                match value {
                    Some(v) if !cases.insert(v) => return Err(CfgError::DuplicateCase(v)),
                    None if *has_default => return Err(CfgError::DuplicateDefault),
                    None => *has_default = true,
                    Some(_) => {}
                }
                *dispatch
            }
            JumpScope::Loop { .. } => return Err(outside()),
        };

        let block = self.new_block(BlockKind::SwitchCase)?;
        self.fall_into(block, EdgeKind::Sequential);
        self.add_edge(dispatch, block, EdgeKind::Case);
        self.current = Some(block);
        Ok(())
    }

    fn label_block(&mut self, name: &str) -> CfgResult<BlockId> {
        if let Some(state) = self.labels.get(name) {
            return Ok(state.block);
        }
        let block = self.new_block(BlockKind::Label)?;
        self.labels.insert(
            name.to_string(),
            LabelState {
                block,
                defined: false,
            },
        );
        self.label_order.push(name.to_string());
        Ok(block)
    }

    fn lower_label(&mut self, name: &str) -> CfgResult<()> {
        let block = self.label_block(name)?;
        if let Some(state) = self.labels.get_mut(name) {
            if state.defined {
                return Err(CfgError::DuplicateLabel(name.to_string()));
            }
            state.defined = true;
        }
        self.fall_into(block, EdgeKind::Sequential);
        self.current = Some(block);
        Ok(())
    }

    fn lower_asm(&mut self, operands: &[Expr]) -> CfgResult<()> {
        let mut locations = Vec::new();
        for operand in operands {
            if is_lvalue(operand) {
                let access = self.resolver.resolve(operand);
                self.lower_operands(&access)?;
                self.emit_address_taken(access.location.clone())?;
                locations.push(access.location);
            } else {
                self.lower_value(operand)?;
            }
        }
        self.emit(Operation::Opaque {
            operands: locations,
        })?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn mark_condition(&mut self, block: BlockId) {
        let block = &mut self.blocks[block.index()];
        if block.kind == BlockKind::Body {
            block.kind = BlockKind::Condition;
        }
    }

    /// Lower `expr` as a branch condition
    fn lower_condition(&mut self, expr: &Expr, on_true: Target, on_false: Target) -> CfgResult<()> {
        match expr {
            Expr::Logical {
                op: LogicalOp::And,
                lhs,
                rhs,
            } => {
                let rhs_block = self.new_block(BlockKind::Condition)?;
                self.lower_condition(lhs, Target::new(rhs_block, EdgeKind::TrueBranch), on_false)?;
                self.current = Some(rhs_block);
                self.lower_condition(rhs, on_true, on_false)
            }
            Expr::Logical {
                op: LogicalOp::Or,
                lhs,
                rhs,
            } => {
                let rhs_block = self.new_block(BlockKind::Condition)?;
                self.lower_condition(lhs, on_true, Target::new(rhs_block, EdgeKind::FalseBranch))?;
                self.current = Some(rhs_block);
                self.lower_condition(rhs, on_true, on_false)
            }
            Expr::Unary {
                op: UnaryOp::Not,
                expr,
            } => self.lower_condition(expr, on_false, on_true),
            _ => {
                let constant = if self.config.fold_constant_conditions {
                    expr.as_constant()
                } else {
                    None
                };
                let current = match constant {
                    Some(_) => self.ensure_current()?,
                    None => {
                        self.lower_value(expr)?;
                        self.ensure_current()?
                    }
                };
                match constant {
                    Some(0) => self.add_edge(current, on_false.block, on_false.kind),
                    Some(_) => self.add_edge(current, on_true.block, on_true.kind),
                    None => {
                        self.mark_condition(current);
                        self.add_edge(current, on_true.block, on_true.kind);
                        self.add_edge(current, on_false.block, on_false.kind);
                    }
                }
                self.current = None;
                Ok(())
            }
        }
    }

    fn lower_operands(&mut self, access: &Access<'_>) -> CfgResult<()> {
        for operand in &access.operands {
            self.lower_value(operand)?;
        }
        Ok(())
    }

    /// Lower `expr` for its value (and side effects)
    fn lower_value(&mut self, expr: &Expr) -> CfgResult<()> {
        match expr {
            Expr::Int(_) | Expr::Str(_) => Ok(()),
            Expr::Var(_) | Expr::Member { .. } | Expr::Index { .. } | Expr::Deref(_) => {
                let decays = self.resolver.decays_to_pointer(expr);
                let access = self.resolver.resolve(expr);
                self.lower_operands(&access)?;
                if decays {
                    self.emit_address_taken(access.location)
                } else {
                    self.emit_load(access.location)
                }
            }
            Expr::AddrOf(object) => self.lower_address_of(object),
            Expr::Cast { expr, .. } | Expr::Unary { expr, .. } => self.lower_value(expr),
            Expr::Binary { lhs, rhs, .. } => {
                self.lower_value(lhs)?;
                self.lower_value(rhs)
            }
            Expr::Logical { .. } => {
                let join = self.new_block(BlockKind::Join)?;
                self.lower_condition(
                    expr,
                    Target::new(join, EdgeKind::TrueBranch),
                    Target::new(join, EdgeKind::FalseBranch),
                )?;
                self.current = Some(join);
                Ok(())
            }
            Expr::Conditional {
                cond,
                then_expr,
                else_expr,
            } => {
                let then_block = self.new_block(BlockKind::Body)?;
                let else_block = self.new_block(BlockKind::Body)?;
                let join = self.new_block(BlockKind::Join)?;
                self.lower_condition(
                    cond,
                    Target::new(then_block, EdgeKind::TrueBranch),
                    Target::new(else_block, EdgeKind::FalseBranch),
                )?;
                self.current = Some(then_block);
                self.lower_value(then_expr)?;
                self.fall_into(join, EdgeKind::Sequential);
                self.current = Some(else_block);
                self.lower_value(else_expr)?;
                self.fall_into(join, EdgeKind::Sequential);
                self.current = Some(join);
                Ok(())
            }
            Expr::Assign { op, lhs, rhs } => self.lower_assignment(lhs, rhs, *op, StoreKind::Assign),
            Expr::Update(target) => {
                let access = self.resolver.resolve(target);
                self.lower_operands(&access)?;
                self.emit_load(access.location.clone())?;
                self.emit_store(&access, StoreKind::Update)
            }
            Expr::Call {
                callee,
                args,
                pure,
            } => self.lower_call(callee, args, *pure),
            Expr::InitList(items) => {
                for item in items {
                    self.lower_value(item)?;
                }
                Ok(())
            }
        }
    }

    fn lower_address_of(&mut self, object: &Expr) -> CfgResult<()> {
        match object {
            // `&*p` is `p`
            Expr::Deref(pointer) => self.lower_value(pointer),
            _ => {
                let access = self.resolver.resolve(object);
                self.lower_operands(&access)?;
                self.emit_address_taken(access.location)
            }
        }
    }

    fn lower_assignment(
        &mut self,
        lhs: &Expr,
        rhs: &Expr,
        op: Option<BinaryOp>,
        kind: StoreKind,
    ) -> CfgResult<()> {
        if op.is_none() {
            if let Expr::InitList(items) = rhs {
                for item in items {
                    self.lower_value(item)?;
                }
                let access = self.resolver.resolve(lhs);
                self.lower_operands(&access)?;
                return self.emit_store(&access, kind);
            }

            if self.resolver.is_aggregate_lvalue(lhs) && self.resolver.is_aggregate_lvalue(rhs) {
                let src = self.resolver.resolve(rhs);
                self.lower_operands(&src)?;
                self.emit_load(src.location.clone())?;
                let dst = self.resolver.resolve(lhs);
                self.lower_operands(&dst)?;
                if src.is_degraded() || dst.is_degraded() {
                    return self.emit_store(&dst, kind);
                }
                self.emit(Operation::Copy {
                    dst: dst.location,
                    src: src.location,
                })?;
                return Ok(());
            }
        }

        self.lower_value(rhs)?;
        let access = self.resolver.resolve(lhs);
        self.lower_operands(&access)?;
        let kind = match op {
            Some(_) => {
                self.emit_load(access.location.clone())?;
                StoreKind::Update
            }
            None => kind,
        };
        self.emit_store(&access, kind)
    }

    fn lower_call(&mut self, callee: &str, args: &[Expr], pure: bool) -> CfgResult<()> {
        let mark = self.address_log.len();
        for arg in args {
            self.lower_value(arg)?;
        }
        let arg_addresses = self.address_log.split_off(mark);
        let pure = pure || self.config.is_pure_callee(callee);
        self.emit(Operation::Call {
            callee: callee.to_string(),
            pure,
            arg_addresses,
        })?;
        Ok(())
    }
}

fn is_lvalue(expr: &Expr) -> bool {
    matches!(
        expr,
        Expr::Var(_) | Expr::Member { .. } | Expr::Index { .. } | Expr::Deref(_)
    )
}
