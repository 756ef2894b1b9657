//! End-to-end compilation: layout, three-address code and assembly.

use decaf::ast::{Decl, Stmt, VarDecl};
use decaf::compiler::{LayoutPass, ProgramLayout};
use decaf::prelude::*;

fn main_with<'ast>(
    b: &AstBuilder<'ast>,
    decls: &[&'ast VarDecl<'ast>],
    stmts: &[Stmt<'ast>],
) -> Decl<'ast> {
    let body = b.block(decls, stmts);
    b.function("main", b.void_type(), &[], Some(body))
}

fn empty_method<'ast>(b: &AstBuilder<'ast>, name: &str) -> Decl<'ast> {
    b.function(name, b.void_type(), &[], Some(b.block(&[], &[])))
}

fn compile(program: &Program<'_>, output: OutputFormat) -> CompilationResult {
    let options = CompilerOptions::default().with_output(output);
    Compiler::new(options).compile(program).unwrap()
}

fn layout<'ast>(program: &Program<'ast>) -> ProgramLayout<'ast> {
    let analysis = Compiler::default().analyze(program);
    assert!(analysis.is_clean(), "{:?}", analysis.diagnostics);
    LayoutPass::new(&analysis.hierarchy).run(program).unwrap()
}

/// `Animal { legs, Speak }`, `Dog extends Animal { Speak, Fetch }` and a main that
/// calls `Speak` through an `Animal` variable holding a `Dog`.
fn animals<'ast>(b: &AstBuilder<'ast>) -> &'ast Program<'ast> {
    let animal = b.class(
        "Animal",
        None,
        &[],
        &[b.var_decl("legs", b.int_type()), empty_method(b, "Speak")],
    );
    let dog = b.class(
        "Dog",
        Some("Animal"),
        &[],
        &[empty_method(b, "Speak"), empty_method(b, "Fetch")],
    );
    let pet = b.var("pet", b.named_type("Animal"));
    let main = main_with(
        b,
        &[pet],
        &[
            b.expr_stmt(b.assign(b.var_ref("pet"), b.new_object("Dog"))),
            b.expr_stmt(b.method_call(b.var_ref("pet"), "Speak", &[])),
        ],
    );
    b.program(&[animal, dog, main])
}

#[test]
fn override_keeps_the_inherited_slot() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let program = animals(&b);

    let layout = layout(program);
    let dog = layout.class("Dog").unwrap();
    assert_eq!(dog.slot_of("Speak"), Some(0));
    assert_eq!(dog.slot_of("Fetch"), Some(1));
    assert_eq!(dog.vtable_labels(), ["_Dog.Speak", "_Dog.Fetch"]);
    assert_eq!(dog.field_offset("legs"), Some(4));
    assert_eq!(dog.instance_size(), 8);
    assert_eq!(layout.class("Animal").unwrap().vtable_labels(), ["_Animal.Speak"]);
}

#[test]
fn virtual_call_goes_through_the_vtable() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let program = animals(&b);

    let tac = compile(program, OutputFormat::ThreeAddress).output.unwrap();
    assert!(tac.contains("VTable Dog =\n\t_Dog.Speak,\n\t_Dog.Fetch,\n;"));
    assert!(tac.contains("LCall _Alloc"));
    assert!(tac.contains("ACall"));
    // Speak is slot 0, so its address sits at the start of the vtable.
    assert!(tac.contains("= *(_tmp"));
    assert!(!tac.contains("LCall _Dog.Speak"));
}

#[test]
fn fields_extend_the_base_layout() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let a = b.class("A", None, &[], &[b.var_decl("a", b.int_type())]);
    let bb = b.class("B", Some("A"), &[], &[b.var_decl("b", b.int_type())]);
    let c = b.class("C", Some("B"), &[], &[b.var_decl("c", b.int_type())]);
    let program = b.program(&[c, bb, a, main_with(&b, &[], &[])]);

    let layout = layout(program);
    let c = layout.class("C").unwrap();
    assert_eq!(c.field_offset("a"), Some(4));
    assert_eq!(c.field_offset("b"), Some(8));
    assert_eq!(c.field_offset("c"), Some(12));
    assert_eq!(c.instance_size(), 16);
    assert_eq!(layout.class("A").unwrap().instance_size(), 8);
}

#[test]
fn globals_live_in_the_global_segment() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let first = b.var_decl("first", b.int_type());
    let second = b.var_decl("second", b.bool_type());
    let main = main_with(
        &b,
        &[],
        &[b.expr_stmt(b.assign(b.var_ref("second"), b.bool(true)))],
    );
    let program = b.program(&[first, second, main]);

    assert_eq!(layout(program).global_size(), 8);
    let asm = compile(program, OutputFormat::Assembly).output.unwrap();
    assert!(asm.contains("sw $t2, 4($gp)\t# spill second from $t2 to $gp+4"));
}

#[test]
fn missing_main_produces_no_code() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let helper = b.function("helper", b.void_type(), &[], Some(b.block(&[], &[])));
    let program = b.program(&[helper]);

    let result = compile(program, OutputFormat::Assembly);
    assert!(result.output.is_none());
    assert_eq!(result.diagnostics.into_vec(), vec![SemanticError::NoMainFound]);
}

#[test]
fn output_is_deterministic() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let program = animals(&b);

    let first = compile(program, OutputFormat::Assembly).output.unwrap();
    let second = compile(program, OutputFormat::Assembly).output.unwrap();
    assert_eq!(first, second);
}

#[test]
fn arrays_carry_runtime_checks() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let xs = b.var("xs", b.array_type(b.int_type()));
    let main = main_with(
        &b,
        &[xs],
        &[
            b.expr_stmt(b.assign(b.var_ref("xs"), b.new_array(b.int(3), b.int_type()))),
            b.expr_stmt(b.assign(b.index(b.var_ref("xs"), b.int(0)), b.int(9))),
            b.print_stmt(&[b.method_call(b.var_ref("xs"), "length", &[])]),
        ],
    );
    let program = b.program(&[main]);

    let asm = compile(program, OutputFormat::Assembly).output.unwrap();
    assert!(asm.contains("Decaf runtime error: Array size is <= 0\\n"));
    assert!(asm.contains("Decaf runtime error: Array subscript out of bounds\\n"));
    assert!(asm.contains("jal _Halt"));
    assert!(asm.contains("jal _PrintInt"));
}

#[test]
fn string_equality_calls_the_runtime() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let line = b.var("line", b.string_type());
    let main = main_with(
        &b,
        &[line],
        &[
            b.expr_stmt(b.assign(b.var_ref("line"), b.read_line())),
            b.if_stmt(
                b.binary(BinaryOp::NotEqual, b.var_ref("line"), b.string("quit")),
                b.print_stmt(&[b.var_ref("line")]),
                None,
            ),
        ],
    );
    let program = b.program(&[main]);

    let tac = compile(program, OutputFormat::ThreeAddress).output.unwrap();
    assert!(tac.contains("LCall _ReadLine"));
    assert!(tac.contains("LCall _StringEqual"));
    assert!(tac.contains("LCall _PrintString"));
}

#[test]
fn double_values_are_rejected_by_the_back_end() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let d = b.var("d", b.double_type());
    let main = main_with(
        &b,
        &[d],
        &[b.expr_stmt(b.assign(b.var_ref("d"), b.double(1.5)))],
    );
    let program = b.program(&[main]);

    let err = Compiler::default().compile(program).unwrap_err();
    assert!(matches!(
        err,
        DecafError::Codegen(CodegenError::UnsupportedDouble { .. })
    ));
}

#[test]
fn interface_calls_are_rejected_by_the_back_end() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let draw = b.prototype("Draw", b.void_type(), &[]);
    let shape = b.interface("Shape", &[draw]);
    let square = b.class("Square", None, &["Shape"], &[empty_method(&b, "Draw")]);
    let s = b.var("s", b.named_type("Shape"));
    let main = main_with(
        &b,
        &[s],
        &[
            b.expr_stmt(b.assign(b.var_ref("s"), b.new_object("Square"))),
            b.expr_stmt(b.method_call(b.var_ref("s"), "Draw", &[])),
        ],
    );
    let program = b.program(&[shape, square, main]);

    let err = Compiler::default().compile(program).unwrap_err();
    assert!(matches!(
        err,
        DecafError::Codegen(CodegenError::UnsupportedInterfaceCall { ref interface, .. })
            if interface == "Shape"
    ));
}

#[test]
fn assembly_frames_match_the_calling_convention() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let n = b.var("n", b.int_type());
    let twice = b.function(
        "twice",
        b.int_type(),
        &[n],
        Some(b.block(
            &[],
            &[b.return_stmt(Some(b.binary(BinaryOp::Mul, b.var_ref("n"), b.int(2))))],
        )),
    );
    let main = main_with(&b, &[], &[b.print_stmt(&[b.call("twice", &[b.int(21)])])]);
    let program = b.program(&[twice, main]);

    let asm = compile(program, OutputFormat::Assembly).output.unwrap();
    assert!(asm.contains("  _twice:\n"));
    assert!(asm.contains("lw $t0, 4($fp)\t# fill n to $t0 from $fp+4"));
    assert!(asm.contains("jal _twice"));
    assert!(asm.contains("move $v0, $t2\t\t# assign return value into $v0"));
    assert!(asm.contains("add $sp, $sp, 4\t# pop params off stack"));
}
