//! Statement lowering.

use decaf_ast::{ForStmt, IfStmt, Stmt, SwitchStmt, WhileStmt};
use decaf_core::{CodegenError, DataType};

use super::CodeGenerator;
use crate::emit::Builtin;
use crate::tac::TacOp;

impl<'a, 'ast> CodeGenerator<'a, 'ast> {
    pub(super) fn stmt(&mut self, stmt: Stmt<'ast>) -> Result<(), CodegenError> {
        match stmt {
            Stmt::Block(block) => self.block(block),
            Stmt::If(s) => self.if_stmt(s),
            Stmt::While(s) => self.while_stmt(s),
            Stmt::For(s) => self.for_stmt(s),
            Stmt::Switch(s) => self.switch_stmt(s),
            Stmt::Break(_) => self.emitter.emit_break(),
            Stmt::Return(s) => {
                let value = s.value.map(|value| self.value(value)).transpose()?;
                self.emitter.ret(value);
                Ok(())
            }
            Stmt::Print(s) => {
                for &arg in s.args {
                    let builtin = match self.type_of(arg) {
                        DataType::Int => Builtin::PrintInt,
                        DataType::Bool => Builtin::PrintBool,
                        DataType::String => Builtin::PrintString,
                        DataType::Double => {
                            return Err(CodegenError::UnsupportedDouble { span: arg.span });
                        }
                        other => {
                            return Err(CodegenError::internal(format!(
                                "cannot print a value of type {other}"
                            )));
                        }
                    };
                    let value = self.value(arg)?;
                    self.emitter.builtin(builtin, &[value])?;
                }
                Ok(())
            }
            Stmt::Expr(e) => self.eval(e).map(|_| ()),
        }
    }

    /// ```text
    ///     IfZ test Goto else
    ///     [then]
    ///     Goto end
    /// else:
    ///     [else]
    /// end:
    /// ```
    fn if_stmt(&mut self, s: &'ast IfStmt<'ast>) -> Result<(), CodegenError> {
        let test = self.value(s.test)?;
        let else_label = self.emitter.new_label();
        self.emitter.if_zero(test, &else_label);
        self.stmt(s.then_branch)?;
        match s.else_branch {
            Some(else_branch) => {
                let end = self.emitter.new_label();
                self.emitter.goto(&end);
                self.emitter.label(&else_label);
                self.stmt(else_branch)?;
                self.emitter.label(&end);
            }
            None => self.emitter.label(&else_label),
        }
        Ok(())
    }

    /// ```text
    /// top:
    ///     IfZ test Goto end
    ///     [body]
    ///     Goto top
    /// end:
    /// ```
    fn while_stmt(&mut self, s: &'ast WhileStmt<'ast>) -> Result<(), CodegenError> {
        let top = self.emitter.new_label();
        let end = self.emitter.new_label();
        self.emitter.label(&top);
        let test = self.value(s.test)?;
        self.emitter.if_zero(test, &end);
        self.loop_body(s.body, &end)?;
        self.emitter.goto(&top);
        self.emitter.label(&end);
        Ok(())
    }

    fn for_stmt(&mut self, s: &'ast ForStmt<'ast>) -> Result<(), CodegenError> {
        if let Some(init) = s.init {
            self.eval(init)?;
        }
        let top = self.emitter.new_label();
        let end = self.emitter.new_label();
        self.emitter.label(&top);
        let test = self.value(s.test)?;
        self.emitter.if_zero(test, &end);
        self.loop_body(s.body, &end)?;
        if let Some(step) = s.step {
            self.eval(step)?;
        }
        self.emitter.goto(&top);
        self.emitter.label(&end);
        Ok(())
    }

    fn loop_body(&mut self, body: Stmt<'ast>, end: &str) -> Result<(), CodegenError> {
        self.emitter.enter_breakable(end);
        let result = self.stmt(body);
        self.emitter.exit_breakable();
        result
    }

    /// Compare-and-jump for every case value, a jump to the default case
    /// (or the end), then the case bodies in order so control falls through
    /// from one case to the next.
    fn switch_stmt(&mut self, s: &'ast SwitchStmt<'ast>) -> Result<(), CodegenError> {
        let scrutinee = self.value(s.scrutinee)?;
        let end = self.emitter.new_label();
        let labels: Vec<String> = s.cases.iter().map(|_| self.emitter.new_label()).collect();

        let mut default = None;
        for (case, label) in s.cases.iter().zip(&labels) {
            match case.value {
                Some(value) => {
                    let constant = self.emitter.load_constant(value);
                    let differs = self.emitter.binary(TacOp::Ne, scrutinee.clone(), constant);
                    self.emitter.if_zero(differs, label);
                }
                None => default = Some(label.as_str()),
            }
        }
        self.emitter.goto(default.unwrap_or(end.as_str()));

        self.emitter.enter_breakable(&end);
        for (case, label) in s.cases.iter().zip(&labels) {
            self.emitter.label(label);
            for &stmt in case.stmts {
                if let Err(err) = self.stmt(stmt) {
                    self.emitter.exit_breakable();
                    return Err(err);
                }
            }
        }
        self.emitter.exit_breakable();
        self.emitter.label(&end);
        Ok(())
    }
}
