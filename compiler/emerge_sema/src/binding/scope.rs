//! Lexical scopes and name lookup.
//!
//! Scopes form a tree: file, base type, function, then one block scope per
//! block plus one more after every local variable declaration, so a local
//! is only visible to the statements that follow it. Loop bodies sit in a
//! loop scope, which also holds the cursor of a `for` loop.

use emerge_ir::Name;
use emerge_types::TypeParamId;

use super::{FileIdx, Program, ScopeId, VarId};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum ScopeKind {
    File,
    BaseType,
    Function,
    Loop,
    Block,
}

#[derive(Debug)]
pub(crate) struct Scope {
    pub parent: Option<ScopeId>,
    pub kind: ScopeKind,
    pub file: FileIdx,
    pub type_params: Vec<(Name, TypeParamId)>,
    pub variables: Vec<(Name, VarId)>,
}

impl Scope {
    pub fn new(kind: ScopeKind, parent: Option<ScopeId>, file: FileIdx) -> Self {
        Scope {
            parent,
            kind,
            file,
            type_params: Vec::new(),
            variables: Vec::new(),
        }
    }
}

impl Program {
    /// `scope` and its ancestors, innermost first.
    pub(crate) fn scope_chain(&self, scope: ScopeId) -> impl Iterator<Item = (ScopeId, &Scope)> + '_ {
        std::iter::successors(Some(scope), |id| self.scope(*id).parent).map(|id| (id, self.scope(id)))
    }

    pub(crate) fn lookup_type_param(&self, scope: ScopeId, name: Name) -> Option<TypeParamId> {
        self.scope_chain(scope).find_map(|(_, s)| {
            s.type_params
                .iter()
                .rev()
                .find_map(|(n, p)| (*n == name).then_some(*p))
        })
    }

    /// The variable `name` refers to from `scope`: locals and parameters
    /// first, then the globals in the file's namespace.
    pub(crate) fn lookup_variable(&self, scope: ScopeId, name: Name) -> Option<VarId> {
        let local = self.scope_chain(scope).find_map(|(_, s)| {
            s.variables
                .iter()
                .rev()
                .find_map(|(n, v)| (*n == name).then_some(*v))
        });
        local.or_else(|| {
            let file = self.scope(scope).file;
            self.globals_by_name.get(&name)?.iter().copied().find(|global| {
                let package = &self.file(self.variable(*global).file).package;
                self.is_in_namespace(file, package, name)
            })
        })
    }

    /// Whether `scope` is inside a loop body of the same function.
    pub(crate) fn is_in_loop(&self, scope: ScopeId) -> bool {
        self.scope_chain(scope)
            .map(|(_, s)| s.kind)
            .take_while(|kind| !matches!(kind, ScopeKind::Function | ScopeKind::File))
            .any(|kind| kind == ScopeKind::Loop)
    }

    /// A variable named like `var` declared before it within the same
    /// function, or among its parameters.
    pub(crate) fn earlier_local(&self, scope: ScopeId, var: VarId, name: Name) -> Option<VarId> {
        for (_, s) in self.scope_chain(scope) {
            if let Some((_, found)) = s.variables.iter().find(|(n, v)| *n == name && *v != var) {
                return Some(*found);
            }
            if matches!(s.kind, ScopeKind::Function) {
                break;
            }
        }
        None
    }
}
