//! Overload selection for invocations.
//!
//! Every candidate with a fitting parameter count is evaluated by unifying
//! its parameter types, with its type parameters opened for inference,
//! against the argument types. Candidates that unify without errors are
//! legal. With no legal candidate, the failing arguments of each candidate
//! are compared with the parameter positions at which all candidates are
//! disjoint: a candidate that only fails elsewhere is the one the author
//! meant, and its diagnostics are reported.

use emerge_diagnostic::{Diagnostic, ErrorCode};
use emerge_ir::{Name, Span};
use emerge_types::{TypeArgument, TypeParamId, TypeRef, TypeUnification};

use crate::InternalCompilerError;

use super::expr::{BoundExpr, BoundExprKind, ExprContext, Resolution, ResolvedInvocation};
use super::{ExprId, FnId, FunctionKind, Program, ScopeId};

/// Operands of a call, the receiver first when there is one.
struct Call<'a> {
    name: Name,
    with_receiver: bool,
    operands: &'a [TypeRef],
    spans: &'a [Span],
    explicit: Option<&'a [TypeArgument]>,
}

/// One candidate checked against the arguments.
#[derive(Debug)]
struct Evaluation {
    function: FnId,
    unification: TypeUnification,
    /// Argument positions that failed to unify.
    erroneous: Vec<usize>,
    return_type: Option<TypeRef>,
}

impl Program {
    pub(crate) fn analyze_invocation(
        &self,
        id: ExprId,
        ctx: &ExprContext,
        out: &mut Vec<Diagnostic>,
    ) -> Result<Option<TypeRef>, InternalCompilerError> {
        let expr = self.expr(id);
        let BoundExprKind::Invocation {
            receiver,
            name,
            type_args,
            args,
        } = &expr.kind
        else {
            return Ok(None);
        };

        let mut operand_types = Vec::with_capacity(args.len() + 1);
        let mut operand_spans = Vec::with_capacity(args.len() + 1);
        for operand in receiver.iter().chain(args) {
            operand_types.push(self.analyze_expr(*operand, ctx, None, out)?);
            operand_spans.push(self.expr(*operand).span);
        }
        let explicit: Option<Vec<TypeArgument>> = type_args.as_ref().map(|args| {
            args.iter()
                .map(|arg| TypeArgument {
                    variance: arg.variance,
                    ty: self.resolve_type(expr.scope, &arg.ty),
                    span: arg.span,
                })
                .collect()
        });
        let Some(operand_types) = operand_types.into_iter().collect::<Option<Vec<TypeRef>>>() else {
            return Ok(None);
        };

        let receiver_ty = receiver.map(|_| &operand_types[0]);
        let candidates = self.invocation_candidates(expr.scope, *name, receiver_ty);
        if candidates.is_empty() {
            out.push(
                Diagnostic::error(ErrorCode::E1013)
                    .with_message(format!("there is no function named `{}`", self.text(*name)))
                    .with_label(expr.span, "unresolved invocation"),
            );
            return Ok(None);
        }
        let call = Call {
            name: *name,
            with_receiver: receiver.is_some(),
            operands: &operand_types,
            spans: &operand_spans,
            explicit: explicit.as_deref(),
        };
        Ok(self.select_overload(expr, &call, &candidates, ctx, out)?.and_then(|(_, ty)| ty))
    }

    /// An operator applied to operands of a type that does not implement it
    /// intrinsically: `lhs.plus(rhs)` and friends. The chosen function must
    /// be declared `operator`.
    pub(crate) fn analyze_operator(
        &self,
        expr: &BoundExpr,
        function: &str,
        symbol: &str,
        operands: &[(TypeRef, Span)],
        ctx: &ExprContext,
        out: &mut Vec<Diagnostic>,
    ) -> Result<Option<TypeRef>, InternalCompilerError> {
        let name = self.names.intern(function);
        let (types, spans): (Vec<TypeRef>, Vec<Span>) = operands.iter().cloned().unzip();
        let candidates = self.invocation_candidates(expr.scope, name, types.first());
        if candidates.is_empty() {
            let operand = types.first().map_or_else(String::new, |ty| self.reg.render(ty));
            out.push(
                Diagnostic::error(ErrorCode::E1021)
                    .with_message(format!("operator `{symbol}` is not declared for `{operand}`"))
                    .with_label(expr.span, "unsupported operator")
                    .with_suggestion(format!("declare an `operator` function `{function}`")),
            );
            return Ok(None);
        }
        let call = Call {
            name,
            with_receiver: true,
            operands: &types,
            spans: &spans,
            explicit: None,
        };
        let Some((chosen, ty)) = self.select_overload(expr, &call, &candidates, ctx, out)? else {
            return Ok(None);
        };
        if !self.function(chosen).attributes.operator {
            out.push(
                Diagnostic::error(ErrorCode::E1022)
                    .with_message(format!(
                        "`{symbol}` invokes {}, which is not declared `operator`",
                        self.describe_function(chosen)
                    ))
                    .with_label(expr.span, "not an operator")
                    .with_secondary_label(self.function(chosen).span, "declared here"),
            );
        }
        Ok(ty)
    }

    /// Pick the overload among `candidates` and record it on `expr`.
    ///
    /// Returns the chosen function and its return type, or `None` when no
    /// overload could be chosen; every failure is reported to `out`.
    fn select_overload(
        &self,
        expr: &BoundExpr,
        call: &Call<'_>,
        candidates: &[FnId],
        ctx: &ExprContext,
        out: &mut Vec<Diagnostic>,
    ) -> Result<Option<(FnId, Option<TypeRef>)>, InternalCompilerError> {
        let text = self.text(call.name);
        let operand_types = call.operands;
        let applicable: Vec<FnId> = candidates
            .iter()
            .copied()
            .filter(|c| {
                let f = self.function(*c);
                f.params.len() == operand_types.len()
                    && (!call.with_receiver || f.kind == FunctionKind::TopLevel || self.declares_receiver(*c))
            })
            .collect();
        if applicable.is_empty() {
            out.push(
                Diagnostic::error(ErrorCode::E1013)
                    .with_message(format!(
                        "no overload of `{text}` takes {} argument(s)",
                        operand_types.len()
                    ))
                    .with_label(expr.span, "unresolved invocation")
                    .with_note(self.describe_candidates(candidates)),
            );
            return Ok(None);
        }

        let evaluations = applicable
            .iter()
            .map(|c| self.evaluate_candidate(*c, operand_types, call.spans, call.explicit, expr.span))
            .collect::<Result<Vec<_>, _>>()?;
        let legal: Vec<&Evaluation> = evaluations.iter().filter(|e| !e.unification.has_errors()).collect();

        let (chosen, ty) = match legal.as_slice() {
            [only] => {
                out.extend(only.unification.diagnostics().iter().cloned());
                (*only, only.return_type.clone())
            }
            [first, ..] => {
                out.push(
                    Diagnostic::error(ErrorCode::E1014)
                        .with_message(format!("the invocation of `{text}` matches more than one overload"))
                        .with_label(expr.span, "ambiguous")
                        .with_note(self.describe_candidates(&legal.iter().map(|e| e.function).collect::<Vec<_>>())),
                );
                (*first, first.return_type.clone())
            }
            [] => {
                let disjoint = self.disjoint_parameter_indices(&applicable);
                let plausible: Vec<&Evaluation> = evaluations
                    .iter()
                    .filter(|e| evaluations.len() == 1 || !e.erroneous.iter().any(|i| disjoint.contains(i)))
                    .collect();
                if let [only] = plausible.as_slice() {
                    out.extend(only.unification.diagnostics().iter().cloned());
                    (*only, only.return_type.clone())
                } else {
                    let args: Vec<String> = operand_types.iter().map(|t| self.reg.render(t)).collect();
                    out.push(
                        Diagnostic::error(ErrorCode::E1013)
                            .with_message(format!(
                                "no overload of `{text}` accepts arguments ({})",
                                args.join(", ")
                            ))
                            .with_label(expr.span, "unresolved invocation")
                            .with_note(self.describe_candidates(&applicable)),
                    );
                    (&evaluations[0], None)
                }
            }
        };

        let callee = self.function(chosen.function);
        if let Some(denied) =
            callee
                .visibility
                .validate_access_from(&ctx.access, expr.span, &self.describe_function(chosen.function))
        {
            out.push(denied);
        }
        tracing::trace!(caller = ?ctx.function, callee = ?chosen.function, "invocation resolved");
        let _ = expr.resolution.set(Resolution::Invocation(ResolvedInvocation {
            function: chosen.function,
            bindings: chosen.unification.bindings(&self.reg),
            return_type: chosen.return_type.clone(),
        }));
        Ok(Some((chosen.function, ty)))
    }

    /// Constructors of a type named `name`, member functions of the
    /// receiver's type and its ancestors, then top-level functions.
    /// Constructors and top-level functions must be in the namespace of the
    /// file `scope` belongs to.
    fn invocation_candidates(&self, scope: ScopeId, name: Name, receiver: Option<&TypeRef>) -> Vec<FnId> {
        let file = self.scope(scope).file;
        let mut candidates: Vec<FnId> = Vec::new();
        match receiver {
            None => {
                for base in self.reg.lookup(name) {
                    if !self.is_in_namespace(file, &self.reg.base(*base).package, name) {
                        continue;
                    }
                    if let Some(bound) = self.base_of(*base) {
                        candidates.extend(&self.base_type(bound).constructors);
                    }
                }
            }
            Some(receiver) => {
                if let Some(base) = receiver.non_null_view().nominal_base() {
                    for ancestor in self.reg.ancestors(base) {
                        let Some(bound) = self.base_of(ancestor) else {
                            continue;
                        };
                        let nearer = candidates.len();
                        for member in &self.base_type(bound).member_functions {
                            let f = self.function(*member);
                            // a nearer declaration with the same arity overrides this one
                            let overridden = candidates[..nearer]
                                .iter()
                                .any(|c| self.function(*c).params.len() == f.params.len());
                            if f.name == name && !overridden {
                                candidates.push(*member);
                            }
                        }
                    }
                }
            }
        }
        if let Some(top_level) = self.functions_by_name.get(&name) {
            candidates.extend(top_level.iter().copied().filter(|f| {
                let package = &self.file(self.function(*f).file).package;
                self.is_in_namespace(file, package, name)
            }));
        }
        candidates
    }

    fn evaluate_candidate(
        &self,
        candidate: FnId,
        operands: &[TypeRef],
        spans: &[Span],
        explicit: Option<&[TypeArgument]>,
        span: Span,
    ) -> Result<Evaluation, InternalCompilerError> {
        let f = self.function(candidate);
        let own: Vec<TypeParamId> = f.type_params.iter().map(|p| p.id).collect();
        let mut unification =
            TypeUnification::from_explicit(&self.reg, &f.all_type_params, &own, explicit, span, true);
        let mut erroneous = Vec::new();
        for (index, ((param, operand), operand_span)) in f.params.iter().zip(operands).zip(spans).enumerate() {
            let Some(param_ty) = self.declared_type(*param) else {
                continue;
            };
            let before = unification.clone();
            unification = self.reg.unify(
                &param_ty.with_type_variables(&f.all_type_params),
                operand,
                *operand_span,
                unification,
            );
            if unification.has_errors_since(&before) {
                erroneous.push(index);
            }
        }
        let return_type = self.callee_return_type(candidate)?.map(|ret| {
            ret.with_type_variables(&f.all_type_params)
                .instantiate_free_variables(&self.reg, &unification)
                .at(span)
        });
        Ok(Evaluation {
            function: candidate,
            unification,
            erroneous,
            return_type,
        })
    }

    fn describe_candidates(&self, candidates: &[FnId]) -> String {
        let signatures: Vec<String> = candidates
            .iter()
            .map(|c| {
                let f = self.function(*c);
                let params: Vec<String> = f
                    .params
                    .iter()
                    .map(|p| {
                        self.declared_type(*p)
                            .map_or_else(|| "?".to_owned(), |ty| self.reg.render(&ty))
                    })
                    .collect();
                format!("{}({})", self.text(f.name), params.join(", "))
            })
            .collect();
        format!("candidates are: {}", signatures.join("; "))
    }
}
