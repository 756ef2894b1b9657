//! Expression lowering.
//!
//! Every intermediate value lands in a fresh temporary. Variables are read
//! in place; fields and array elements go through a [`Place`], which is
//! loaded when its value is needed and stored through on assignment.

use decaf_ast::{BinaryOp, Decl, Expr, ExprKind, Ident, NodeId, PostfixOp, UnaryOp};
use decaf_core::{CodegenError, DataType, WORD_SIZE};

use super::{BAD_ARRAY_SIZE, CodeGenerator, SUBSCRIPT_OUT_OF_BOUNDS, function_label};
use crate::emit::Builtin;
use crate::tac::{Location, TacOp};

/// Where an lvalue lives.
#[derive(Debug, Clone)]
enum Place {
    /// A variable's own slot, or a field reached through the implicit `this`.
    Slot(Location),
    /// The word `offset` bytes past the address held in `pointer`.
    Element { pointer: Location, offset: i32 },
}

impl<'a, 'ast> CodeGenerator<'a, 'ast> {
    /// Lower an expression that must produce a value.
    pub(super) fn value(&mut self, expr: &'ast Expr<'ast>) -> Result<Location, CodegenError> {
        self.eval(expr)?.ok_or_else(|| {
            CodegenError::internal(format!("expression at {} has no value", expr.span))
        })
    }

    /// Lower an expression, returning where its value is, if it has one.
    pub(super) fn eval(&mut self, expr: &'ast Expr<'ast>) -> Result<Option<Location>, CodegenError> {
        if self.type_of(expr) == DataType::Double {
            return Err(CodegenError::UnsupportedDouble { span: expr.span });
        }
        let location = match expr.kind {
            ExprKind::IntConst(value) => self.emitter.load_constant(value),
            ExprKind::BoolConst(value) => self.emitter.load_constant(i32::from(value)),
            ExprKind::Null => self.emitter.load_constant(0),
            ExprKind::StringConst(value) => self.emitter.load_string(value),
            ExprKind::DoubleConst(_) => {
                return Err(CodegenError::UnsupportedDouble { span: expr.span });
            }
            ExprKind::Binary { op, left, right } => self.binary(op, left, right)?,
            ExprKind::Unary { op, operand } => {
                let value = self.value(operand)?;
                let zero = self.emitter.load_constant(0);
                match op {
                    UnaryOp::Neg => self.emitter.binary(TacOp::Sub, zero, value),
                    UnaryOp::Not => self.emitter.binary(TacOp::Eq, zero, value),
                }
            }
            ExprKind::Assign { target, value } => {
                let place = self.place(target)?;
                let value = self.value(value)?;
                self.store(&place, value.clone());
                value
            }
            ExprKind::This => self.this_location()?,
            ExprKind::ArrayAccess { .. } | ExprKind::FieldAccess { .. } => {
                let place = self.place(expr)?;
                self.load(place)
            }
            ExprKind::Call { base, method, args } => return self.call(expr, base, method, args),
            ExprKind::New { class } => {
                let layout = self.layout.class(class.name).ok_or_else(|| {
                    CodegenError::internal(format!("no layout for class '{}'", class.name))
                })?;
                let size = self.emitter.load_constant(layout.instance_size());
                let object = self.alloc(size)?;
                let vtable = self.emitter.load_label(class.name);
                self.emitter.store(object.clone(), vtable, 0);
                object
            }
            ExprKind::NewArray { size, .. } => self.new_array(size)?,
            ExprKind::ReadInteger => self.builtin_value(Builtin::ReadInteger, &[])?,
            ExprKind::ReadLine => self.builtin_value(Builtin::ReadLine, &[])?,
            ExprKind::Postfix { op, target } => {
                let place = self.place(target)?;
                let current = self.load(place.clone());
                let snapshot = self.emitter.temp();
                self.emitter.assign(snapshot.clone(), current.clone());
                let one = self.emitter.load_constant(1);
                let op = match op {
                    PostfixOp::Increment => TacOp::Add,
                    PostfixOp::Decrement => TacOp::Sub,
                };
                let updated = self.emitter.binary(op, current, one);
                self.store(&place, updated);
                snapshot
            }
        };
        Ok(Some(location))
    }

    fn binary(
        &mut self,
        op: BinaryOp,
        left: &'ast Expr<'ast>,
        right: &'ast Expr<'ast>,
    ) -> Result<Location, CodegenError> {
        let strings = self.type_of(left) == DataType::String && self.type_of(right) == DataType::String;
        let l = self.value(left)?;
        let r = self.value(right)?;
        match op {
            BinaryOp::Equal | BinaryOp::NotEqual if strings => {
                let equal = self.builtin_value(Builtin::StringEqual, &[l, r])?;
                if op == BinaryOp::Equal {
                    Ok(equal)
                } else {
                    let zero = self.emitter.load_constant(0);
                    Ok(self.emitter.binary(TacOp::Eq, zero, equal))
                }
            }
            _ => Ok(self.emitter.binary(op.into(), l, r)),
        }
    }

    fn this_location(&self) -> Result<Location, CodegenError> {
        self.this
            .clone()
            .ok_or_else(|| CodegenError::internal("'this' outside a method"))
    }

    fn builtin_value(&mut self, builtin: Builtin, args: &[Location]) -> Result<Location, CodegenError> {
        self.emitter.builtin(builtin, args)?.ok_or_else(|| {
            CodegenError::internal(format!("{} returns no value", builtin.label()))
        })
    }

    fn alloc(&mut self, bytes: Location) -> Result<Location, CodegenError> {
        self.builtin_value(Builtin::Alloc, &[bytes])
    }

    // ==========================================================================
    // Places
    // ==========================================================================

    fn place(&mut self, expr: &'ast Expr<'ast>) -> Result<Place, CodegenError> {
        match expr.kind {
            ExprKind::FieldAccess { base: None, field } => {
                let var = self.variable(field)?;
                if let Some(slot) = self.slots.get(&var) {
                    return Ok(Place::Slot(slot.clone()));
                }
                let offset = self.field_offset(field)?;
                let this = self.this_location()?;
                Ok(Place::Slot(Location::based(this, offset, field.name)))
            }
            ExprKind::FieldAccess {
                base: Some(base),
                field,
            } => {
                let pointer = self.value(base)?;
                let offset = self.field_offset(field)?;
                Ok(Place::Element { pointer, offset })
            }
            ExprKind::ArrayAccess { base, subscript } => {
                let array = self.value(base)?;
                let index = self.value(subscript)?;
                self.bounds_check(array.clone(), index.clone())?;
                let word = self.emitter.load_constant(WORD_SIZE);
                let scaled = self.emitter.binary(TacOp::Mul, index, word.clone());
                let offset = self.emitter.binary(TacOp::Add, scaled, word);
                let pointer = self.emitter.binary(TacOp::Add, array, offset);
                Ok(Place::Element { pointer, offset: 0 })
            }
            _ => Err(CodegenError::internal(format!(
                "expression at {} is not assignable",
                expr.span
            ))),
        }
    }

    fn variable(&self, ident: Ident<'ast>) -> Result<NodeId, CodegenError> {
        match self.annotations.decl_of(ident) {
            Some(Decl::Var(var)) => Ok(var.id),
            _ => Err(CodegenError::internal(format!(
                "'{}' at {} is not bound to a variable",
                ident.name, ident.span
            ))),
        }
    }

    fn field_offset(&self, field: Ident<'ast>) -> Result<i32, CodegenError> {
        let var = self.variable(field)?;
        self.layout.field_offset(var).ok_or_else(|| {
            CodegenError::internal(format!("'{}' at {} is not a field", field.name, field.span))
        })
    }

    fn load(&mut self, place: Place) -> Location {
        match place {
            Place::Slot(location) => location,
            Place::Element { pointer, offset } => self.emitter.load(pointer, offset),
        }
    }

    fn store(&mut self, place: &Place, value: Location) {
        match place {
            Place::Slot(location) => self.emitter.assign(location.clone(), value),
            Place::Element { pointer, offset } => self.emitter.store(pointer.clone(), value, *offset),
        }
    }

    // ==========================================================================
    // Arrays
    // ==========================================================================

    /// Halt unless `0 <= index < length`.
    fn bounds_check(&mut self, array: Location, index: Location) -> Result<(), CodegenError> {
        let zero = self.emitter.load_constant(0);
        let negative = self.emitter.binary(TacOp::Lt, index.clone(), zero.clone());
        let length = self.emitter.load(array, 0);
        let below = self.emitter.binary(TacOp::Lt, index, length);
        let past_end = self.emitter.binary(TacOp::Eq, below, zero);
        let invalid = self.emitter.binary(TacOp::Or, negative, past_end);
        let ok = self.emitter.new_label();
        self.emitter.if_zero(invalid, &ok);
        self.emitter.runtime_error(SUBSCRIPT_OUT_OF_BOUNDS)?;
        self.emitter.label(&ok);
        Ok(())
    }

    /// Allocate `size + 1` words and store the length in the first.
    fn new_array(&mut self, size: &'ast Expr<'ast>) -> Result<Location, CodegenError> {
        let length = self.value(size)?;
        let one = self.emitter.load_constant(1);
        let too_small = self.emitter.binary(TacOp::Lt, length.clone(), one.clone());
        let ok = self.emitter.new_label();
        self.emitter.if_zero(too_small, &ok);
        self.emitter.runtime_error(BAD_ARRAY_SIZE)?;
        self.emitter.label(&ok);
        let words = self.emitter.binary(TacOp::Add, length.clone(), one);
        let word = self.emitter.load_constant(WORD_SIZE);
        let bytes = self.emitter.binary(TacOp::Mul, words, word);
        let array = self.alloc(bytes)?;
        self.emitter.store(array.clone(), length, 0);
        Ok(array)
    }

    // ==========================================================================
    // Calls
    // ==========================================================================

    fn call(
        &mut self,
        expr: &'ast Expr<'ast>,
        base: Option<&'ast Expr<'ast>>,
        method: Ident<'ast>,
        args: &'ast [&'ast Expr<'ast>],
    ) -> Result<Option<Location>, CodegenError> {
        if let Some(base) = base
            && self.type_of(base).is_array()
            && method.name == "length"
        {
            let array = self.value(base)?;
            return Ok(Some(self.emitter.load(array, 0)));
        }

        let callee = self.annotations.function_of(method).ok_or_else(|| {
            CodegenError::internal(format!("call to '{}' at {} is unresolved", method.name, expr.span))
        })?;
        let has_return = self.annotations.resolve_type(callee.return_type) != DataType::Void;
        let slot = self.layout.method_slot(callee.id);

        let receiver = match base {
            Some(base) => {
                if let DataType::Named(name) = self.type_of(base)
                    && self.layout.class(&name).is_none()
                {
                    return Err(CodegenError::UnsupportedInterfaceCall {
                        interface: name,
                        method: method.name.to_string(),
                        span: expr.span,
                    });
                }
                Some(self.value(base)?)
            }
            None if slot.is_some() => Some(self.this_location()?),
            None => None,
        };

        let values = args
            .iter()
            .map(|&arg| self.value(arg))
            .collect::<Result<Vec<_>, _>>()?;

        match (receiver, slot) {
            (Some(receiver), Some(slot)) => {
                let vtable = self.emitter.load(receiver.clone(), 0);
                let addr = self.emitter.load(vtable, WORD_SIZE * slot as i32);
                for value in values.iter().rev() {
                    self.emitter.push_param(value.clone());
                }
                self.emitter.push_param(receiver);
                let result = self.emitter.call_address(addr, has_return);
                self.emitter.pop_params(WORD_SIZE * (values.len() as i32 + 1));
                Ok(result)
            }
            (None, _) => {
                for value in values.iter().rev() {
                    self.emitter.push_param(value.clone());
                }
                let result = self.emitter.call_label(&function_label(method.name), has_return);
                self.emitter.pop_params(WORD_SIZE * values.len() as i32);
                Ok(result)
            }
            (Some(_), None) => Err(CodegenError::internal(format!(
                "'{}' at {} has no vtable slot",
                method.name, expr.span
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::generate;
    use bumpalo::Bump;
    use decaf_ast::{AstBuilder, BinaryOp, PostfixOp};
    use decaf_core::{CodegenError, DecafError};

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(|l| l.trim().to_string()).collect()
    }

    #[test]
    fn arithmetic_uses_fresh_temps() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let sum = b.binary(BinaryOp::Add, b.int(1), b.binary(BinaryOp::Mul, b.int(2), b.int(3)));
        let body = b.block(&[b.var("x", b.int_type())], &[b.expr_stmt(b.assign(b.var_ref("x"), sum))]);
        let program = b.program(&[b.function("main", b.void_type(), &[], Some(body))]);

        let tac = generate(program).unwrap().to_string();
        assert_eq!(
            lines(&tac),
            [
                "main:",
                "BeginFunc 24",
                "_tmp0 = 1",
                "_tmp1 = 2",
                "_tmp2 = 3",
                "_tmp3 = _tmp1 * _tmp2",
                "_tmp4 = _tmp0 + _tmp3",
                "x = _tmp4",
                "EndFunc",
            ]
        );
    }

    #[test]
    fn string_inequality_uses_runtime_compare() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let ne = b.binary(BinaryOp::NotEqual, b.string("a"), b.string("b"));
        let body = b.block(&[], &[b.print_stmt(&[ne])]);
        let program = b.program(&[b.function("main", b.void_type(), &[], Some(body))]);

        let tac = generate(program).unwrap().to_string();
        let lines = lines(&tac);
        assert!(lines.contains(&"_tmp2 = LCall _StringEqual".to_string()));
        assert!(lines.contains(&"_tmp4 = _tmp3 == _tmp2".to_string()));
    }

    #[test]
    fn object_construction_stores_vtable() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let body = b.block(
            &[b.var("p", b.named_type("Pair"))],
            &[b.expr_stmt(b.assign(b.var_ref("p"), b.new_object("Pair")))],
        );
        let program = b.program(&[
            b.class(
                "Pair",
                None,
                &[],
                &[b.var_decl("a", b.int_type()), b.var_decl("b", b.int_type())],
            ),
            b.function("main", b.void_type(), &[], Some(body)),
        ]);

        let tac = generate(program).unwrap().to_string();
        let lines = lines(&tac);
        let start = lines.iter().position(|l| l == "_tmp0 = 12").unwrap();
        assert_eq!(
            &lines[start..start + 7],
            [
                "_tmp0 = 12",
                "PushParam _tmp0",
                "_tmp1 = LCall _Alloc",
                "PopParams 4",
                "_tmp2 = Pair",
                "*(_tmp1) = _tmp2",
                "p = _tmp1",
            ]
        );
    }

    #[test]
    fn method_call_dispatches_through_vtable() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let n = b.var("n", b.int_type());
        let add = b.function("Add", b.int_type(), &[n], Some(b.block(&[], &[b.return_stmt(Some(b.var_ref("n")))])));
        let first = b.function("First", b.void_type(), &[], Some(b.block(&[], &[])));
        let call = b.method_call(b.var_ref("c"), "Add", &[b.int(7)]);
        let body = b.block(&[b.var("c", b.named_type("Calc"))], &[b.print_stmt(&[call])]);
        let program = b.program(&[
            b.class("Calc", None, &[], &[first, add]),
            b.function("main", b.void_type(), &[], Some(body)),
        ]);

        let tac = generate(program).unwrap().to_string();
        let lines = lines(&tac);
        let start = lines.iter().position(|l| l == "_tmp0 = 7").unwrap();
        assert_eq!(
            &lines[start..start + 7],
            [
                "_tmp0 = 7",
                "_tmp1 = *(c)",
                "_tmp2 = *(_tmp1 + 4)",
                "PushParam _tmp0",
                "PushParam c",
                "_tmp3 = ACall _tmp2",
                "PopParams 8",
            ]
        );
    }

    #[test]
    fn implicit_this_call_and_field() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let get = b.function(
            "Get",
            b.int_type(),
            &[],
            Some(b.block(&[], &[b.return_stmt(Some(b.var_ref("count")))])),
        );
        let twice = b.function(
            "Twice",
            b.int_type(),
            &[],
            Some(b.block(
                &[],
                &[b.return_stmt(Some(b.binary(BinaryOp::Add, b.call("Get", &[]), b.call("Get", &[]))))],
            )),
        );
        let program = b.program(&[
            b.class("Counter", None, &[], &[b.var_decl("count", b.int_type()), get, twice]),
            b.function("main", b.void_type(), &[], Some(b.block(&[], &[]))),
        ]);

        let tac = generate(program).unwrap().to_string();
        let lines = lines(&tac);
        assert!(lines.contains(&"Return count".to_string()));
        assert!(lines.contains(&"PushParam this".to_string()));
        assert!(lines.contains(&"_tmp0 = *(this)".to_string()));
    }

    #[test]
    fn array_access_is_bounds_checked() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let body = b.block(
            &[b.var("a", b.array_type(b.int_type()))],
            &[
                b.expr_stmt(b.assign(b.var_ref("a"), b.new_array(b.int(3), b.int_type()))),
                b.expr_stmt(b.assign(b.index(b.var_ref("a"), b.int(0)), b.int(9))),
                b.print_stmt(&[b.method_call(b.var_ref("a"), "length", &[])]),
            ],
        );
        let program = b.program(&[b.function("main", b.void_type(), &[], Some(body))]);

        let tac = generate(program).unwrap().to_string();
        assert!(tac.contains("\"Decaf runtime error: Array size is <= 0\\n\""));
        assert!(tac.contains("\"Decaf runtime error: Array subscript out of bounds\\n\""));
        assert_eq!(tac.matches("LCall _Halt").count(), 2);
        assert!(tac.contains("= *(a)\n"));
    }

    #[test]
    fn postfix_yields_old_value() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let inc = b.postfix(PostfixOp::Increment, b.var_ref("i"));
        let body = b.block(&[b.var("i", b.int_type())], &[b.print_stmt(&[inc])]);
        let program = b.program(&[b.function("main", b.void_type(), &[], Some(body))]);

        let tac = generate(program).unwrap().to_string();
        assert_eq!(
            lines(&tac)[2..7],
            [
                "_tmp0 = i",
                "_tmp1 = 1",
                "_tmp2 = i + _tmp1",
                "i = _tmp2",
                "PushParam _tmp0",
            ]
        );
    }

    #[test]
    fn interface_calls_are_unsupported() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let area = b.function(
            "Area",
            b.int_type(),
            &[],
            Some(b.block(&[], &[b.return_stmt(Some(b.int(1)))])),
        );
        let body = b.block(
            &[b.var("s", b.named_type("Shape"))],
            &[
                b.expr_stmt(b.assign(b.var_ref("s"), b.new_object("Square"))),
                b.print_stmt(&[b.method_call(b.var_ref("s"), "Area", &[])]),
            ],
        );
        let program = b.program(&[
            b.interface("Shape", &[b.prototype("Area", b.int_type(), &[])]),
            b.class("Square", None, &["Shape"], &[area]),
            b.function("main", b.void_type(), &[], Some(body)),
        ]);

        assert!(matches!(
            generate(program),
            Err(DecafError::Codegen(CodegenError::UnsupportedInterfaceCall { .. }))
        ));
    }
}
