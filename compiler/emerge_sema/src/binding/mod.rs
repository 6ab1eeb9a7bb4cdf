//! The binding layer: declarations turned into analyzable entities.
//!
//! [`Program::build`] allocates every entity of a compilation unit up front
//! in arenas addressed by typed handles ([`FnId`], [`VarId`], [`BaseId`],
//! ...), registers base types and type parameters with the
//! [`TypeRegistry`], and links lexical scopes. Nothing is resolved while
//! building, so entities may refer to each other in any order.
//!
//! Analysis then runs through the three-phase protocol
//! ([`PhaseTracker`](crate::phase::PhaseTracker)); everything a phase derives
//! is stored in write-once cells on the entity.

mod accessor;
mod attributes;
mod base_type;
mod build;
mod effects;
mod expr;
mod flow;
mod function;
mod ids;
mod import;
mod invocation;
mod overload;
mod resolve;
mod scope;
mod type_param;
mod variable;

use rustc_hash::FxHashMap;

use emerge_ir::{FileId, Name, PackagePath, SharedInterner, StringLookup};
use emerge_types::{AccessSite, BaseTypeId, TypeRef, TypeRegistry};

use crate::phase::CycleGuard;
use crate::AnalysisConfig;

pub use attributes::AttributeList;
pub use base_type::{BoundBaseType, MemberVariable};
pub use expr::ResolvedInvocation;
pub use function::{BoundFunction, FunctionKind};
pub use ids::{BaseId, ExprId, FileIdx, FnId, ImportId, OverloadSetId, ScopeId, StmtId, VarId};
pub use import::BoundImport;
pub use overload::BoundOverloadSet;
pub use type_param::BoundTypeParam;
pub use variable::{BoundVariable, VariableKind};

pub(crate) use expr::{BoundExpr, BoundStmt};
pub(crate) use scope::Scope;

/// Identity of a computation that may recurse into itself.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub(crate) enum Entity {
    Variable(VarId),
    FunctionBody(FnId),
    ThrowBehavior(FnId),
    Supertypes(BaseId),
}

/// A source file of the unit.
#[derive(Clone, Debug)]
pub struct FileInfo {
    pub file: FileId,
    pub package: PackagePath,
    pub(crate) scope: ScopeId,
    pub(crate) imports: Vec<ImportId>,
}

impl FileInfo {
    pub fn access_site(&self) -> AccessSite {
        AccessSite::new(self.file, self.package.clone())
    }
}

/// Every bound entity of one compilation unit.
pub struct Program {
    names: SharedInterner,
    reg: TypeRegistry,
    config: AnalysisConfig,
    files: Vec<FileInfo>,
    scopes: Vec<Scope>,
    functions: Vec<BoundFunction>,
    variables: Vec<BoundVariable>,
    base_types: Vec<BoundBaseType>,
    overload_sets: Vec<BoundOverloadSet>,
    imports: Vec<BoundImport>,
    exprs: Vec<BoundExpr>,
    stmts: Vec<BoundStmt>,
    globals: Vec<VarId>,
    top_level_functions: Vec<FnId>,
    top_level_overload_sets: Vec<OverloadSetId>,
    globals_by_name: FxHashMap<Name, Vec<VarId>>,
    functions_by_name: FxHashMap<Name, Vec<FnId>>,
    base_by_type: FxHashMap<BaseTypeId, BaseId>,
    cycles: CycleGuard<Entity>,
}

impl Program {
    pub fn registry(&self) -> &TypeRegistry {
        &self.reg
    }

    pub fn names(&self) -> &SharedInterner {
        &self.names
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn files(&self) -> &[FileInfo] {
        &self.files
    }

    pub fn function(&self, id: FnId) -> &BoundFunction {
        &self.functions[id.index()]
    }

    pub fn variable(&self, id: VarId) -> &BoundVariable {
        &self.variables[id.index()]
    }

    pub fn base_type(&self, id: BaseId) -> &BoundBaseType {
        &self.base_types[id.index()]
    }

    pub fn overload_set(&self, id: OverloadSetId) -> &BoundOverloadSet {
        &self.overload_sets[id.index()]
    }

    pub fn import(&self, id: ImportId) -> &BoundImport {
        &self.imports[id.index()]
    }

    pub fn imports(&self) -> impl Iterator<Item = ImportId> + '_ {
        (0..self.imports.len()).map(ImportId::from_index)
    }

    pub fn globals(&self) -> &[VarId] {
        &self.globals
    }

    pub fn top_level_functions(&self) -> &[FnId] {
        &self.top_level_functions
    }

    pub fn top_level_overload_sets(&self) -> &[OverloadSetId] {
        &self.top_level_overload_sets
    }

    pub fn base_types(&self) -> impl Iterator<Item = BaseId> + '_ {
        (0..self.base_types.len()).map(BaseId::from_index)
    }

    /// Top-level functions named `name`, in declaration order.
    pub fn functions_named(&self, name: &str) -> Vec<FnId> {
        self.names
            .get(name)
            .and_then(|n| self.functions_by_name.get(&n))
            .cloned()
            .unwrap_or_default()
    }

    pub fn global_named(&self, name: &str) -> Option<VarId> {
        let name = self.names.get(name)?;
        self.globals_by_name.get(&name)?.first().copied()
    }

    pub fn base_type_named(&self, name: &str) -> Option<BaseId> {
        let name = self.names.get(name)?;
        self.reg
            .lookup(name)
            .iter()
            .find_map(|id| self.base_by_type.get(id).copied())
    }

    /// The source declaration behind a registered base type, if any.
    pub fn base_of(&self, id: BaseTypeId) -> Option<BaseId> {
        self.base_by_type.get(&id).copied()
    }

    /// Type of a variable as inferred in phase 2; `None` when unknown.
    pub fn variable_type(&self, id: VarId) -> Option<TypeRef> {
        self.variable(id).ty.get().cloned().flatten()
    }

    pub fn return_type(&self, id: FnId) -> Option<TypeRef> {
        self.function(id).return_type.get().cloned().flatten()
    }

    pub fn initializer(&self, id: VarId) -> Option<ExprId> {
        self.variable(id).init
    }

    pub fn expression_type(&self, id: ExprId) -> Option<TypeRef> {
        self.exprs[id.index()].ty.get().cloned().flatten()
    }

    /// Overload chosen for an invocation expression.
    pub fn invocation(&self, id: ExprId) -> Option<&ResolvedInvocation> {
        self.exprs[id.index()].invocation()
    }

    pub(crate) fn text(&self, name: Name) -> &str {
        StringLookup::lookup(&self.names, name)
    }

    pub(crate) fn file(&self, idx: FileIdx) -> &FileInfo {
        &self.files[idx.index()]
    }

    pub(crate) fn expr(&self, id: ExprId) -> &BoundExpr {
        &self.exprs[id.index()]
    }

    pub(crate) fn stmt(&self, id: StmtId) -> &BoundStmt {
        &self.stmts[id.index()]
    }

    pub(crate) fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }
}

impl std::fmt::Debug for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Program")
            .field("files", &self.files.len())
            .field("functions", &self.functions.len())
            .field("variables", &self.variables.len())
            .field("base_types", &self.base_types.len())
            .field("overload_sets", &self.overload_sets.len())
            .finish_non_exhaustive()
    }
}
