//! Statement checking.

use decaf_ast::{Expr, Stmt};
use decaf_core::{DataType, SemanticError};

use super::TypeCheckPass;

impl<'a, 'ast> TypeCheckPass<'a, 'ast> {
    pub(super) fn stmt(&mut self, stmt: Stmt<'ast>) {
        match stmt {
            Stmt::Block(block) => self.block(block),
            Stmt::If(s) => {
                self.test(s.test);
                self.stmt(s.then_branch);
                if let Some(else_branch) = s.else_branch {
                    self.stmt(else_branch);
                }
            }
            Stmt::While(s) => {
                self.test(s.test);
                self.breakable_body(s.body);
            }
            Stmt::For(s) => {
                if let Some(init) = s.init {
                    self.expr(init);
                }
                self.test(s.test);
                if let Some(step) = s.step {
                    self.expr(step);
                }
                self.breakable_body(s.body);
            }
            Stmt::Switch(s) => {
                self.expr(s.scrutinee);
                self.breakable += 1;
                for case in s.cases {
                    for &stmt in case.stmts {
                        self.stmt(stmt);
                    }
                }
                self.breakable -= 1;
            }
            Stmt::Break(s) => {
                if self.breakable == 0 {
                    self.error(SemanticError::BreakOutsideLoop { span: s.span });
                }
            }
            Stmt::Return(s) => {
                let given = match s.value {
                    Some(value) => self.expr(value),
                    None => DataType::Void,
                };
                let expected = self.return_type.clone();
                if !self.compatible(&expected, &given) {
                    self.error(SemanticError::ReturnMismatch {
                        given,
                        expected,
                        span: s.span,
                    });
                }
            }
            Stmt::Print(s) => {
                for (i, &arg) in s.args.iter().enumerate() {
                    let given = self.expr(arg);
                    if !matches!(
                        given,
                        DataType::Int | DataType::Bool | DataType::String | DataType::Error
                    ) {
                        self.error(SemanticError::PrintArgMismatch {
                            index: i + 1,
                            given,
                            span: arg.span,
                        });
                    }
                }
            }
            Stmt::Expr(e) => {
                self.expr(e);
            }
        }
    }

    fn breakable_body(&mut self, body: Stmt<'ast>) {
        self.breakable += 1;
        self.stmt(body);
        self.breakable -= 1;
    }

    /// Check the test of an `if`, `while` or `for`.
    fn test(&mut self, test: &'ast Expr<'ast>) {
        let ty = self.expr(test);
        if ty != DataType::Bool && !ty.is_error() {
            self.error(SemanticError::TestNotBoolean { span: test.span });
        }
    }
}
