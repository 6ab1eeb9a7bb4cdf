//! The diagnostics sink.
//!
//! Append-only: findings are never removed or reordered once accepted.
//! Features:
//! - Exact-duplicate suppression (the same finding reached through two
//!   analysis paths is reported once)
//! - Error limit with a single "too many errors" marker
//! - Optional suppression of consecutive (follow-up) findings

use rustc_hash::FxHashSet;

use emerge_ir::Span;

use crate::{Diagnostic, ErrorCode, ErrorGuaranteed, Severity};

/// Configuration for the sink.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct DiagnosticConfig {
    /// Maximum number of errors before further errors are dropped (0 = unlimited).
    pub error_limit: usize,
    /// Drop findings equal to one already accepted.
    pub deduplicate: bool,
    /// Keep findings of [`Severity::Consecutive`].
    pub keep_consecutive: bool,
}

impl Default for DiagnosticConfig {
    fn default() -> Self {
        DiagnosticConfig {
            error_limit: 100,
            deduplicate: true,
            keep_consecutive: true,
        }
    }
}

impl DiagnosticConfig {
    /// Keep everything; used by tests that count raw findings.
    pub fn unlimited() -> Self {
        DiagnosticConfig {
            error_limit: 0,
            deduplicate: false,
            keep_consecutive: true,
        }
    }

    #[must_use]
    pub fn with_error_limit(mut self, limit: usize) -> Self {
        self.error_limit = limit;
        self
    }

    #[must_use]
    pub fn with_deduplicate(mut self, deduplicate: bool) -> Self {
        self.deduplicate = deduplicate;
        self
    }

    #[must_use]
    pub fn with_keep_consecutive(mut self, keep: bool) -> Self {
        self.keep_consecutive = keep;
        self
    }
}

/// Ordered, append-only collection of findings.
#[derive(Clone, Debug, Default)]
pub struct Diagnosis {
    findings: Vec<Diagnostic>,
    seen: FxHashSet<Diagnostic>,
    error_count: usize,
    limit_reached: bool,
    config: DiagnosticConfig,
}

impl Diagnosis {
    pub fn new() -> Self {
        Self::with_config(DiagnosticConfig::default())
    }

    pub fn with_config(config: DiagnosticConfig) -> Self {
        Diagnosis {
            findings: Vec::new(),
            seen: FxHashSet::default(),
            error_count: 0,
            limit_reached: false,
            config,
        }
    }

    pub fn config(&self) -> &DiagnosticConfig {
        &self.config
    }

    /// Add a finding.
    ///
    /// Returns `true` if it was accepted, `false` if it was filtered.
    pub fn add(&mut self, diag: Diagnostic) -> bool {
        if diag.severity == Severity::Consecutive && !self.config.keep_consecutive {
            return false;
        }

        let is_error = diag.is_error();
        if is_error && self.limit_reached {
            return false;
        }

        if self.config.deduplicate {
            if self.seen.contains(&diag) {
                tracing::trace!(code = %diag.code, "dropping duplicate diagnostic");
                return false;
            }
            self.seen.insert(diag.clone());
        }

        tracing::debug!(code = %diag.code, severity = %diag.severity, "{}", diag.message);
        self.findings.push(diag);

        if is_error {
            self.error_count += 1;
            if self.config.error_limit > 0 && self.error_count >= self.config.error_limit {
                self.limit_reached = true;
                let span = self
                    .findings
                    .last()
                    .and_then(Diagnostic::primary_span)
                    .unwrap_or(Span::DUMMY);
                self.findings.push(too_many_errors(self.config.error_limit, span));
            }
        }

        true
    }

    /// Add every finding in order.
    pub fn extend(&mut self, diags: impl IntoIterator<Item = Diagnostic>) {
        for diag in diags {
            self.add(diag);
        }
    }

    /// Proof that errors were reported, if any were.
    pub fn has_errors(&self) -> Option<ErrorGuaranteed> {
        ErrorGuaranteed::from_error_count(self.error_count)
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn limit_reached(&self) -> bool {
        self.limit_reached
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.findings.iter()
    }

    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.findings
    }

    /// Number of findings accepted so far; pass to [`Diagnosis::since`].
    pub fn mark(&self) -> usize {
        self.findings.len()
    }

    /// Findings accepted after `mark`.
    pub fn since(&self, mark: usize) -> &[Diagnostic] {
        self.findings.get(mark..).unwrap_or(&[])
    }

    /// Number of findings with the given code.
    pub fn count_of(&self, code: ErrorCode) -> usize {
        self.findings.iter().filter(|d| d.code == code).count()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.findings
    }
}

impl<'a> IntoIterator for &'a Diagnosis {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.findings.iter()
    }
}

/// Create a "too many errors" diagnostic.
#[cold]
pub fn too_many_errors(limit: usize, span: Span) -> Diagnostic {
    Diagnostic::error(ErrorCode::E9001)
        .with_message(format!("stopped reporting after {limit} errors"))
        .with_label(span, "error limit reached here")
        .with_note("raise the error limit in the diagnostic configuration")
}
