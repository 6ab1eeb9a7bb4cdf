//! Analysis configuration.

use emerge_diagnostic::DiagnosticConfig;

/// Knobs for one [`CompilationUnit`](crate::CompilationUnit) run.
#[derive(Clone, Debug)]
pub struct AnalysisConfig {
    /// Run phase 3 of functions and variables even when phase 1 or 2 of the
    /// same entity reported errors. Base types never do.
    pub run_phase3_after_errors: bool,
    /// `W3001` for type names that start lowercase or with an underscore.
    pub lint_naming: bool,
    /// `W3006` for intersection types that can be written shorter.
    pub lint_simplifiable_types: bool,
    /// Sink settings. Analysis keeps every error by default; a limit only
    /// makes sense for a front end that renders them.
    pub diagnostics: DiagnosticConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            run_phase3_after_errors: true,
            lint_naming: true,
            lint_simplifiable_types: true,
            diagnostics: DiagnosticConfig::default().with_error_limit(0),
        }
    }
}

impl AnalysisConfig {
    #[must_use]
    pub fn with_run_phase3_after_errors(mut self, run: bool) -> Self {
        self.run_phase3_after_errors = run;
        self
    }

    #[must_use]
    pub fn with_lint_naming(mut self, enabled: bool) -> Self {
        self.lint_naming = enabled;
        self
    }

    #[must_use]
    pub fn with_lint_simplifiable_types(mut self, enabled: bool) -> Self {
        self.lint_simplifiable_types = enabled;
        self
    }

    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: DiagnosticConfig) -> Self {
        self.diagnostics = diagnostics;
        self
    }
}
