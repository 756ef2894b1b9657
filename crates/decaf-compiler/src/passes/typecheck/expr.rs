//! Expression typing.

use decaf_ast::{BinaryOp, Decl, Expr, ExprKind, FnDecl, Ident, OpCategory, UnaryOp};
use decaf_core::{DataType, LookingFor, SemanticError};

use super::TypeCheckPass;

impl<'a, 'ast> TypeCheckPass<'a, 'ast> {
    /// Compute, record and return the type of `expr`.
    pub(super) fn expr(&mut self, expr: &'ast Expr<'ast>) -> DataType {
        let ty = self.infer(expr);
        self.annotations.set_type(expr, ty.clone());
        self.output.expressions += 1;
        ty
    }

    fn infer(&mut self, expr: &'ast Expr<'ast>) -> DataType {
        match expr.kind {
            ExprKind::IntConst(_) => DataType::Int,
            ExprKind::DoubleConst(_) => DataType::Double,
            ExprKind::BoolConst(_) => DataType::Bool,
            ExprKind::StringConst(_) => DataType::String,
            ExprKind::Null => DataType::Null,
            ExprKind::ReadInteger => DataType::Int,
            ExprKind::ReadLine => DataType::String,
            ExprKind::Binary { op, left, right } => self.binary(expr, op, left, right),
            ExprKind::Unary { op, operand } => self.unary(expr, op, operand),
            ExprKind::Assign { target, value } => {
                let left = self.expr(target);
                let right = self.expr(value);
                if !self.compatible(&left, &right) {
                    self.error(SemanticError::IncompatibleOperands {
                        op: "=".to_string(),
                        left: left.clone(),
                        right,
                        span: expr.span,
                    });
                }
                left
            }
            ExprKind::This => match self.scopes.lookup_enclosing_class() {
                Some(class) => DataType::named(class.name()),
                None => {
                    self.error(SemanticError::ThisOutsideClassScope { span: expr.span });
                    DataType::Error
                }
            },
            ExprKind::ArrayAccess { base, subscript } => {
                let base_ty = self.expr(base);
                let subscript_ty = self.expr(subscript);
                if subscript_ty != DataType::Int && !subscript_ty.is_error() {
                    self.error(SemanticError::SubscriptNotInteger {
                        span: subscript.span,
                    });
                }
                match base_ty {
                    DataType::Array(elem) => *elem,
                    DataType::Error => DataType::Error,
                    _ => {
                        self.error(SemanticError::BracketsOnNonArray { span: expr.span });
                        DataType::Error
                    }
                }
            }
            ExprKind::FieldAccess { base: None, field } => self.variable(field),
            ExprKind::FieldAccess {
                base: Some(base),
                field,
            } => self.member_field(base, field),
            ExprKind::Call { base, method, args } => self.call(base, method, args),
            ExprKind::New { class } => match self.annotations.decl_of(class) {
                Some(Decl::Class(_)) => DataType::named(class.name),
                _ => DataType::Error,
            },
            ExprKind::NewArray { size, elem } => {
                let size_ty = self.expr(size);
                if size_ty != DataType::Int && !size_ty.is_error() {
                    self.error(SemanticError::NewArraySizeNotInteger { span: size.span });
                }
                match self.annotations.resolve_type(elem) {
                    DataType::Error => DataType::Error,
                    elem => DataType::array_of(elem),
                }
            }
            ExprKind::Postfix { op, target } => match self.expr(target) {
                DataType::Int => DataType::Int,
                DataType::Error => DataType::Error,
                operand => {
                    self.error(SemanticError::IncompatibleOperand {
                        op: op.as_str().to_string(),
                        operand,
                        span: expr.span,
                    });
                    DataType::Error
                }
            },
        }
    }

    fn binary(
        &mut self,
        expr: &'ast Expr<'ast>,
        op: BinaryOp,
        left: &'ast Expr<'ast>,
        right: &'ast Expr<'ast>,
    ) -> DataType {
        let l = self.expr(left);
        let r = self.expr(right);
        let either_error = l.is_error() || r.is_error();
        let numeric = matches!(
            (&l, &r),
            (DataType::Int, DataType::Int) | (DataType::Double, DataType::Double)
        );
        let (valid, result) = match op.category() {
            OpCategory::Arithmetic => {
                let result = if numeric { l.clone() } else { DataType::Error };
                (numeric, result)
            }
            OpCategory::Relational => (numeric, DataType::Bool),
            OpCategory::Equality => (
                self.compatible(&l, &r) || self.compatible(&r, &l),
                DataType::Bool,
            ),
            OpCategory::Logical => (
                l == DataType::Bool && r == DataType::Bool,
                DataType::Bool,
            ),
        };
        if !valid && !either_error {
            self.error(SemanticError::IncompatibleOperands {
                op: op.as_str().to_string(),
                left: l,
                right: r,
                span: expr.span,
            });
        }
        result
    }

    fn unary(&mut self, expr: &'ast Expr<'ast>, op: UnaryOp, operand: &'ast Expr<'ast>) -> DataType {
        let ty = self.expr(operand);
        let (valid, result) = match op {
            UnaryOp::Neg => {
                let numeric = matches!(ty, DataType::Int | DataType::Double);
                let result = if numeric { ty.clone() } else { DataType::Error };
                (numeric, result)
            }
            UnaryOp::Not => (ty == DataType::Bool, DataType::Bool),
        };
        if !valid && !ty.is_error() {
            self.error(SemanticError::IncompatibleOperand {
                op: op.as_str().to_string(),
                operand: ty,
                span: expr.span,
            });
        }
        result
    }

    /// A bare identifier in expression position.
    fn variable(&mut self, field: Ident<'ast>) -> DataType {
        match self.annotations.decl_of(field) {
            Some(Decl::Var(var)) => self.annotations.resolve_type(var.ty),
            Some(_) => {
                self.error(SemanticError::IdentifierNotDeclared {
                    name: field.name.to_string(),
                    reason: LookingFor::Variable,
                    span: field.span,
                });
                DataType::Error
            }
            None => DataType::Error,
        }
    }

    /// `base.field`. Fields are only reachable from code inside a class
    /// related to the base type.
    fn member_field(&mut self, base: &'ast Expr<'ast>, field: Ident<'ast>) -> DataType {
        let base_ty = self.expr(base);
        if base_ty.is_error() {
            return DataType::Error;
        }
        let not_found = |base: DataType| SemanticError::FieldNotFoundInBase {
            field: field.name.to_string(),
            base,
            span: field.span,
        };
        let Some(owner) = base_ty.name() else {
            self.error(not_found(base_ty));
            return DataType::Error;
        };
        let Some(Decl::Var(_)) = self.scopes.lookup_field(owner, field.name) else {
            self.error(not_found(base_ty));
            return DataType::Error;
        };
        let Some(enclosing) = self.scopes.lookup_enclosing_class() else {
            self.error(SemanticError::InaccessibleField {
                field: field.name.to_string(),
                base: base_ty,
                span: field.span,
            });
            return DataType::Error;
        };
        let current = DataType::named(enclosing.name());
        let Some(Decl::Var(var)) = self.scopes.lookup_field(enclosing.name(), field.name) else {
            self.error(not_found(current));
            return DataType::Error;
        };
        if self.compatible(&current, &base_ty) || self.compatible(&base_ty, &current) {
            self.annotations.bind(field, Decl::Var(var));
            self.annotations.resolve_type(var.ty)
        } else {
            self.error(SemanticError::InaccessibleField {
                field: field.name.to_string(),
                base: base_ty,
                span: field.span,
            });
            DataType::Error
        }
    }

    fn call(
        &mut self,
        base: Option<&'ast Expr<'ast>>,
        method: Ident<'ast>,
        args: &'ast [&'ast Expr<'ast>],
    ) -> DataType {
        let base_ty = base.map(|base| self.expr(base));
        let arg_tys: Vec<DataType> = args.iter().map(|&arg| self.expr(arg)).collect();

        let callee = match base_ty {
            None => self.annotations.function_of(method),
            Some(DataType::Error) => return DataType::Error,
            Some(DataType::Array(_)) if method.name == "length" => {
                if !args.is_empty() {
                    self.error(SemanticError::NumArgsMismatch {
                        name: method.name.to_string(),
                        expected: 0,
                        given: args.len(),
                        span: method.span,
                    });
                }
                return DataType::Int;
            }
            Some(base_ty) => {
                let found = base_ty
                    .name()
                    .and_then(|owner| self.scopes.lookup_field(owner, method.name));
                match found {
                    Some(Decl::Function(func)) => {
                        self.annotations.bind(method, Decl::Function(func));
                        Some(func)
                    }
                    _ => {
                        self.error(SemanticError::FieldNotFoundInBase {
                            field: method.name.to_string(),
                            base: base_ty,
                            span: method.span,
                        });
                        return DataType::Error;
                    }
                }
            }
        };

        match callee {
            Some(func) => {
                self.arguments(func, method, args, &arg_tys);
                self.annotations.resolve_type(func.return_type)
            }
            None => DataType::Error,
        }
    }

    fn arguments(
        &mut self,
        func: &'ast FnDecl<'ast>,
        method: Ident<'ast>,
        args: &'ast [&'ast Expr<'ast>],
        arg_tys: &[DataType],
    ) {
        if func.formals.len() != args.len() {
            self.error(SemanticError::NumArgsMismatch {
                name: method.name.to_string(),
                expected: func.formals.len(),
                given: args.len(),
                span: method.span,
            });
            return;
        }
        for (i, (formal, (arg, given))) in func.formals.iter().zip(args.iter().zip(arg_tys)).enumerate() {
            let expected = self.annotations.resolve_type(formal.ty);
            if !self.compatible(&expected, given) {
                self.error(SemanticError::ArgMismatch {
                    index: i + 1,
                    given: given.clone(),
                    expected,
                    span: arg.span,
                });
            }
        }
    }
}
