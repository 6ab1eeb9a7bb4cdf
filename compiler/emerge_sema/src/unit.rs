//! The compilation-unit driver.

use std::rc::Rc;

use emerge_diagnostic::{Diagnosis, Diagnostic, ErrorGuaranteed};
use emerge_ir::SharedInterner;

use crate::binding::{BaseId, FnId, ImportId, OverloadSetId, Program, VarId};
use crate::decl::SourceFile;
use crate::phase::Phase;
use crate::{AnalysisConfig, InternalCompilerError};

/// Source files analyzed together.
#[derive(Debug)]
pub struct CompilationUnit {
    program: Program,
}

/// A program after all three phases, with everything they reported.
#[derive(Debug)]
pub struct Analysis {
    program: Program,
    diagnosis: Diagnosis,
}

/// Top-level entity the driver walks.
#[derive(Copy, Clone, Debug)]
enum Root {
    Import(ImportId),
    BaseType(BaseId),
    Global(VarId),
    Function(FnId),
    OverloadSet(OverloadSetId),
}

impl CompilationUnit {
    pub fn new(names: SharedInterner, config: AnalysisConfig, sources: Vec<SourceFile>) -> Self {
        CompilationUnit {
            program: Program::build(names, config, sources),
        }
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Run phase 1 of every entity, then phase 2, then phase 3.
    ///
    /// Members are driven by their base type. Diagnostics are collected in
    /// phase order into a sink configured by
    /// [`AnalysisConfig::diagnostics`].
    #[tracing::instrument(level = "debug", skip_all, fields(files = self.program.files().len()))]
    pub fn analyze(self) -> Result<Analysis, InternalCompilerError> {
        let program = self.program;
        let mut diagnosis = Diagnosis::with_config(program.config().diagnostics.clone());
        let roots = roots(&program);

        for phase in [Phase::One, Phase::Two, Phase::Three] {
            let mark = diagnosis.mark();
            for root in &roots {
                diagnosis.extend(run_phase(&program, *root, phase)?.iter().cloned());
            }
            tracing::debug!(%phase, reported = diagnosis.since(mark).len(), "phase finished");
        }
        Ok(Analysis { program, diagnosis })
    }
}

fn roots(program: &Program) -> Vec<Root> {
    program
        .imports()
        .map(Root::Import)
        .chain(program.base_types().map(Root::BaseType))
        .chain(program.globals().iter().copied().map(Root::Global))
        .chain(program.top_level_functions().iter().copied().map(Root::Function))
        .chain(program.top_level_overload_sets().iter().copied().map(Root::OverloadSet))
        .collect()
}

fn run_phase(program: &Program, root: Root, phase: Phase) -> Result<Rc<[Diagnostic]>, InternalCompilerError> {
    match (root, phase) {
        (Root::Import(id), Phase::One) => program.import_phase1(id),
        (Root::Import(id), Phase::Two) => program.import_phase2(id),
        (Root::Import(id), Phase::Three) => program.import_phase3(id),
        (Root::BaseType(id), Phase::One) => program.base_type_phase1(id),
        (Root::BaseType(id), Phase::Two) => program.base_type_phase2(id),
        (Root::BaseType(id), Phase::Three) => program.base_type_phase3(id),
        (Root::Global(id), Phase::One) => program.variable_phase1(id),
        (Root::Global(id), Phase::Two) => program.variable_phase2(id),
        (Root::Global(id), Phase::Three) => program.variable_phase3(id),
        (Root::Function(id), Phase::One) => program.function_phase1(id),
        (Root::Function(id), Phase::Two) => program.function_phase2(id),
        (Root::Function(id), Phase::Three) => program.function_phase3(id),
        (Root::OverloadSet(id), Phase::One) => program.overload_set_phase1(id),
        (Root::OverloadSet(id), Phase::Two) => program.overload_set_phase2(id),
        (Root::OverloadSet(id), Phase::Three) => program.overload_set_phase3(id),
    }
}

impl Analysis {
    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.diagnosis.as_slice()
    }

    pub fn diagnosis(&self) -> &Diagnosis {
        &self.diagnosis
    }

    /// Proof that an error was reported, if one was; lowering should not
    /// proceed then.
    pub fn has_errors(&self) -> Option<ErrorGuaranteed> {
        self.diagnosis.has_errors()
    }

    pub fn into_parts(self) -> (Program, Diagnosis) {
        (self.program, self.diagnosis)
    }
}
