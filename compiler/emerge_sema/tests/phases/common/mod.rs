//! Declaration-tree builders for whole-unit tests.
//!
//! Every span handed out is fresh, so diagnostics never collapse in the sink
//! and each one can be traced back to the node that produced it.

use std::cell::Cell;

use emerge_diagnostic::ErrorCode;
use emerge_ir::{FileId, Name, PackagePath, SharedInterner, Span};
use emerge_sema::decl::{
    BlockDecl, BodyDecl, ExprDecl, FunctionDecl, Item, ParamDecl, SourceFile, StmtDecl, TypeExpr, VariableDecl,
};
use emerge_sema::{Analysis, AnalysisConfig, CompilationUnit};

pub struct Source {
    names: SharedInterner,
    file: SourceFile,
    /// Files of other packages, analyzed alongside `file`.
    libraries: Vec<SourceFile>,
    next: Cell<u32>,
}

impl Source {
    /// One file in package `app`.
    pub fn new() -> Self {
        emerge_sema::tracing_setup::init_tracing();
        let names = SharedInterner::new();
        let file = SourceFile::new(FileId::new(0), PackagePath::new([names.intern("app")]));
        Source {
            names,
            file,
            libraries: Vec::new(),
            next: Cell::new(1),
        }
    }

    /// `a.b.c` as a package path.
    pub fn package(&self, path: &str) -> PackagePath {
        PackagePath::new(path.split('.').map(|segment| self.name(segment)))
    }

    /// A second file, in package `package`, holding `items`.
    pub fn library(&mut self, package: &str, items: Vec<Item>) {
        let id = FileId::new(u32::try_from(self.libraries.len() + 1).unwrap_or(u32::MAX));
        let mut file = SourceFile::new(id, self.package(package));
        file.items = items;
        self.libraries.push(file);
    }

    pub fn name(&self, text: &str) -> Name {
        self.names.intern(text)
    }

    pub fn span(&self) -> Span {
        let n = self.next.get();
        self.next.set(n + 1);
        Span::new(FileId::new(0), n * 10, n * 10 + 5)
    }

    pub fn ty(&self, text: &str) -> TypeExpr {
        TypeExpr::named(self.name(text), self.span())
    }

    pub fn param(&self, name: &str, ty: &str) -> ParamDecl {
        ParamDecl::new(self.name(name), Some(self.ty(ty)), self.span())
    }

    pub fn function(&self, name: &str) -> FunctionDecl {
        FunctionDecl::new(self.name(name), self.span())
    }

    pub fn global(&self, name: &str) -> VariableDecl {
        VariableDecl::new(self.name(name), self.span())
    }

    pub fn ident(&self, name: &str) -> ExprDecl {
        ExprDecl::ident(self.name(name), self.span())
    }

    pub fn int(&self, value: i64) -> ExprDecl {
        ExprDecl::int(value, self.span())
    }

    pub fn call(&self, name: &str, args: Vec<ExprDecl>) -> ExprDecl {
        ExprDecl::call(self.name(name), args, self.span())
    }

    pub fn block(&self, statements: Vec<StmtDecl>) -> BlockDecl {
        BlockDecl::new(statements, self.span())
    }

    pub fn block_body(&self, statements: Vec<StmtDecl>) -> BodyDecl {
        BodyDecl::Block(self.block(statements))
    }

    pub fn ret(&self, value: ExprDecl) -> StmtDecl {
        StmtDecl::Return {
            value: Some(value),
            span: self.span(),
        }
    }

    pub fn assign(&self, target: ExprDecl, value: ExprDecl) -> StmtDecl {
        StmtDecl::Assign {
            target,
            value,
            span: self.span(),
        }
    }

    pub fn item(&mut self, item: impl Into<Item>) {
        self.file.items.push(item.into());
    }

    pub fn unit(self) -> CompilationUnit {
        self.unit_with(AnalysisConfig::default())
    }

    pub fn unit_with(self, config: AnalysisConfig) -> CompilationUnit {
        let mut files = vec![self.file];
        files.extend(self.libraries);
        CompilationUnit::new(self.names, config, files)
    }

    pub fn analyze(self) -> Analysis {
        analyze(self.unit())
    }

    pub fn analyze_with(self, config: AnalysisConfig) -> Analysis {
        analyze(self.unit_with(config))
    }
}

pub fn analyze(unit: CompilationUnit) -> Analysis {
    match unit.analyze() {
        Ok(analysis) => analysis,
        Err(error) => panic!("internal compiler error: {error}"),
    }
}

pub fn codes(analysis: &Analysis) -> Vec<ErrorCode> {
    analysis.diagnostics().iter().map(|d| d.code).collect()
}
