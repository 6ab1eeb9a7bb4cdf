//! Imports: which foreign declarations a file can name unqualified.

use std::rc::Rc;

use emerge_diagnostic::{Diagnostic, ErrorCode};
use emerge_ir::{Name, PackagePath, Span};
use emerge_types::Visibility;

use crate::decl::ImportSymbols;
use crate::phase::PhaseTracker;
use crate::InternalCompilerError;

use super::{FileIdx, ImportId, Program};

#[derive(Debug)]
pub struct BoundImport {
    pub package: PackagePath,
    pub span: Span,
    pub(crate) symbols: ImportSymbols,
    pub(crate) file: FileIdx,
    pub(crate) phases: PhaseTracker,
}

impl BoundImport {
    fn covers(&self, name: Name) -> bool {
        match &self.symbols {
            ImportSymbols::All => true,
            ImportSymbols::Names(names) => names.iter().any(|(n, _)| *n == name),
        }
    }
}

impl Program {
    /// Whether a declaration `name` of `package` can be referred to by its
    /// simple name from `file`: its own package, the core package, or
    /// imported.
    pub(crate) fn is_in_namespace(&self, file: FileIdx, package: &PackagePath, name: Name) -> bool {
        let info = self.file(file);
        info.package == *package
            || package == self.reg.core_package()
            || info.imports.iter().any(|id| {
                let import = self.import(*id);
                import.package == *package && import.covers(name)
            })
    }

    fn package_exists(&self, package: &PackagePath) -> bool {
        package == self.reg.core_package() || self.files.iter().any(|f| f.package == *package)
    }

    /// Visibility of every top-level declaration `name` in `package`.
    fn package_symbols(&self, package: &PackagePath, name: Name) -> Vec<Visibility> {
        let in_package = |file: FileIdx| self.file(file).package == *package;
        let functions = self
            .functions_by_name
            .get(&name)
            .into_iter()
            .flatten()
            .map(|f| self.function(*f))
            .filter(|f| in_package(f.file))
            .map(|f| f.visibility.clone());
        let globals = self
            .globals_by_name
            .get(&name)
            .into_iter()
            .flatten()
            .map(|v| self.variable(*v))
            .filter(|v| in_package(v.file))
            .map(|v| v.visibility.clone());
        let types = self
            .reg
            .lookup(name)
            .iter()
            .map(|id| self.reg.base(*id))
            .filter(|def| def.package == *package)
            .map(|def| def.visibility.clone());
        functions.chain(globals).chain(types).collect()
    }

    pub fn import_phase1(&self, id: ImportId) -> Result<Rc<[Diagnostic]>, InternalCompilerError> {
        let import = self.import(id);
        import.phases.phase1(|| {
            let package = import.package.display(&self.names);
            if !self.package_exists(&import.package) {
                return Ok(vec![Diagnostic::error(ErrorCode::E1018)
                    .with_message(format!("package `{package}` does not exist"))
                    .with_label(import.span, "unknown package")]);
            }
            let mut out = Vec::new();
            if let ImportSymbols::Names(names) = &import.symbols {
                for (name, span) in names {
                    if self.package_symbols(&import.package, *name).is_empty() {
                        out.push(
                            Diagnostic::error(ErrorCode::E1019)
                                .with_message(format!("package `{package}` does not declare `{}`", self.text(*name)))
                                .with_label(*span, "unknown symbol"),
                        );
                    }
                }
            }
            Ok(out)
        })
    }

    pub fn import_phase2(&self, id: ImportId) -> Result<Rc<[Diagnostic]>, InternalCompilerError> {
        self.import(id).phases.phase2(|| Ok(Vec::new()))
    }

    /// Every symbol imported by name must be accessible from the importing
    /// file through at least one of its declarations.
    pub fn import_phase3(&self, id: ImportId) -> Result<Rc<[Diagnostic]>, InternalCompilerError> {
        let import = self.import(id);
        import.phases.phase3(self.config.run_phase3_after_errors, || {
            let ImportSymbols::Names(names) = &import.symbols else {
                return Ok(Vec::new());
            };
            let access = self.file(import.file).access_site();
            let mut out = Vec::new();
            for (name, span) in names {
                let symbols = self.package_symbols(&import.package, *name);
                if symbols.iter().any(|v| v.is_accessible_from(&access)) {
                    continue;
                }
                if let Some(first) = symbols.first() {
                    out.extend(first.validate_access_from(&access, *span, &format!("`{}`", self.text(*name))));
                }
            }
            Ok(out)
        })
    }
}
