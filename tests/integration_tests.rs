//! End-to-end tests: hand-built trees through resolution, checking, code
//! generation and execution.

use fool::ast::{ClassDecl, Declaration, Expr, ExprKind, MethodDecl, Param, Program, Type};
use fool::{Error, Options, Outcome, Phase, VmError, VmFlags};

fn run(program: Program) -> Outcome {
    match fool::run(program, &Options::default()) {
        Ok(outcome) => outcome,
        Err(err) => panic!("program failed: {err}"),
    }
}

fn top(program: Program) -> i32 {
    run(program).stack_top.expect("a value on the stack")
}

fn int_var(name: &str, value: i32) -> Declaration {
    Declaration::var(name, Type::Int, Expr::int(value))
}

fn method(name: &str, ret: Type, body: Expr) -> MethodDecl {
    MethodDecl::new(name, ret, vec![], vec![], body)
}

/// `fun fact:int (n:int) = if n <= 1 then 1 else n * fact(n - 1)`
fn factorial() -> Declaration {
    Declaration::fun(
        "fact",
        Type::Int,
        vec![Param::new("n", Type::Int)],
        vec![],
        Expr::if_then_else(
            Expr::less_eq(Expr::id("n"), Expr::int(1)),
            Expr::int(1),
            Expr::mul(
                Expr::id("n"),
                Expr::call("fact", vec![Expr::sub(Expr::id("n"), Expr::int(1))]),
            ),
        ),
    )
}

// ============================================================================
// Basic programs
// ============================================================================

#[test]
fn test_variable_sum() {
    let program = Program::new(
        vec![int_var("x", 5)],
        Expr::add(Expr::id("x"), Expr::int(3)),
    );
    let result = fool::compile(program.clone(), &Options::default()).unwrap();
    assert!(result.is_ok());
    assert_eq!(result.ty, Some(Type::Int));

    assert_eq!(top(program), 8);
}

#[test]
fn test_print_shows_value() {
    let out = run(Program::expr(Expr::print(Expr::mul(Expr::int(6), Expr::int(7)))));
    assert_eq!(out.printed, vec![42]);
    assert_eq!(out.stack_top, Some(42));
}

#[test]
fn test_conditionals() {
    let cond = Program::expr(Expr::if_then_else(
        Expr::bool(true),
        Expr::int(1),
        Expr::int(2),
    ));
    assert_eq!(top(cond), 1);

    let mixed = Program::expr(Expr::if_then_else(
        Expr::bool(true),
        Expr::int(1),
        Expr::bool(false),
    ));
    let result = fool::compile(mixed.clone(), &Options::default()).unwrap();
    assert_eq!(result.ty, Some(Type::Int));
    assert_eq!(top(mixed), 1);

    let else_taken = Program::expr(Expr::if_then_else(
        Expr::bool(false),
        Expr::int(1),
        Expr::int(2),
    ));
    assert_eq!(top(else_taken), 2);
}

#[test]
fn test_comparisons() {
    assert_eq!(top(Program::expr(Expr::eq(Expr::int(3), Expr::int(3)))), 1);
    assert_eq!(top(Program::expr(Expr::eq(Expr::int(3), Expr::int(4)))), 0);
    assert_eq!(top(Program::expr(Expr::less_eq(Expr::int(3), Expr::int(3)))), 1);
    assert_eq!(top(Program::expr(Expr::less_eq(Expr::int(4), Expr::int(3)))), 0);
    assert_eq!(top(Program::expr(Expr::greater_eq(Expr::int(5), Expr::int(3)))), 1);
    assert_eq!(top(Program::expr(Expr::greater_eq(Expr::int(2), Expr::int(3)))), 0);
}

#[test]
fn test_comparison_operands_run_left_to_right() {
    let ops: [fn(Expr, Expr) -> Expr; 3] = [Expr::greater_eq, Expr::less_eq, Expr::eq];
    for op in ops {
        let program = Program::expr(op(
            Expr::print(Expr::int(1)),
            Expr::print(Expr::int(2)),
        ));
        assert_eq!(run(program).printed, vec![1, 2]);
    }

    let inside_function = Program::new(
        vec![Declaration::fun(
            "ge",
            Type::Int,
            vec![Param::new("a", Type::Int), Param::new("b", Type::Int)],
            vec![],
            Expr::if_then_else(
                Expr::greater_eq(Expr::print(Expr::id("a")), Expr::print(Expr::id("b"))),
                Expr::int(10),
                Expr::int(20),
            ),
        )],
        Expr::add(
            Expr::call("ge", vec![Expr::int(3), Expr::int(4)]),
            Expr::call("ge", vec![Expr::int(4), Expr::int(4)]),
        ),
    );
    let out = run(inside_function);
    assert_eq!(out.printed, vec![3, 4, 4, 4]);
    assert_eq!(out.stack_top, Some(30));
}

#[test]
fn test_boolean_operators() {
    assert_eq!(
        top(Program::expr(Expr::not(Expr::eq(Expr::int(1), Expr::int(2))))),
        1
    );
    assert_eq!(
        top(Program::expr(Expr::and(Expr::bool(true), Expr::bool(false)))),
        0
    );
    assert_eq!(
        top(Program::expr(Expr::or(Expr::bool(false), Expr::bool(true)))),
        1
    );
}

#[test]
fn test_boolean_operators_short_circuit() {
    let divide_by_zero = || Expr::eq(Expr::div(Expr::int(1), Expr::int(0)), Expr::int(0));

    let and = Program::expr(Expr::and(Expr::bool(false), divide_by_zero()));
    assert_eq!(top(and), 0);

    let or = Program::expr(Expr::or(Expr::bool(true), divide_by_zero()));
    assert_eq!(top(or), 1);

    let evaluated = Program::expr(Expr::and(Expr::bool(true), divide_by_zero()));
    assert!(matches!(
        fool::run(evaluated, &Options::default()),
        Err(Error::Vm(VmError::DivisionByZero { .. }))
    ));
}

// ============================================================================
// Functions and scoping
// ============================================================================

#[test]
fn test_recursion() {
    let program = Program::new(vec![factorial()], Expr::call("fact", vec![Expr::int(5)]));
    assert_eq!(top(program), 120);
}

#[test]
fn test_recursion_keeps_caller_locals() {
    let caller = Declaration::fun(
        "caller",
        Type::Int,
        vec![],
        vec![int_var("keep", 100)],
        Expr::add(
            Expr::call("fact", vec![Expr::int(3)]),
            Expr::id("keep"),
        ),
    );
    let program = Program::new(
        vec![factorial(), caller, int_var("after", 1000)],
        Expr::add(Expr::call("caller", vec![]), Expr::id("after")),
    );
    assert_eq!(top(program), 1106);
}

#[test]
fn test_parameter_shadows_global() {
    let program = Program::new(
        vec![
            int_var("x", 1),
            Declaration::fun(
                "f",
                Type::Int,
                vec![Param::new("x", Type::Int)],
                vec![],
                Expr::id("x"),
            ),
        ],
        Expr::add(Expr::call("f", vec![Expr::int(5)]), Expr::id("x")),
    );
    assert_eq!(top(program), 6);
}

#[test]
fn test_local_shadows_global() {
    let program = Program::new(
        vec![
            int_var("x", 1),
            Declaration::fun("g", Type::Int, vec![], vec![int_var("x", 9)], Expr::id("x")),
        ],
        Expr::call("g", vec![]),
    );
    assert_eq!(top(program), 9);
}

#[test]
fn test_nested_functions_follow_static_chain() {
    // fun f(a) = let fun g(b) = let fun h(c) = a * 100 + b * 10 + c in h(3) in g(2)
    let h = Declaration::fun(
        "h",
        Type::Int,
        vec![Param::new("c", Type::Int)],
        vec![],
        Expr::add(
            Expr::add(
                Expr::mul(Expr::id("a"), Expr::int(100)),
                Expr::mul(Expr::id("b"), Expr::int(10)),
            ),
            Expr::id("c"),
        ),
    );
    let g = Declaration::fun(
        "g",
        Type::Int,
        vec![Param::new("b", Type::Int)],
        vec![h],
        Expr::call("h", vec![Expr::int(3)]),
    );
    let f = Declaration::fun(
        "f",
        Type::Int,
        vec![Param::new("a", Type::Int)],
        vec![g],
        Expr::call("g", vec![Expr::int(2)]),
    );
    let program = Program::new(vec![f], Expr::call("f", vec![Expr::int(1)]));
    assert_eq!(top(program), 123);
}

#[test]
fn test_inner_function_reads_outer_local_and_global() {
    let inner = Declaration::fun(
        "inner",
        Type::Int,
        vec![Param::new("b", Type::Int)],
        vec![],
        Expr::add(Expr::add(Expr::id("local"), Expr::id("b")), Expr::id("g")),
    );
    let outer = Declaration::fun(
        "outer",
        Type::Int,
        vec![],
        vec![int_var("local", 20), inner],
        Expr::call("inner", vec![Expr::int(3)]),
    );
    let program = Program::new(
        vec![int_var("g", 100), outer],
        Expr::call("outer", vec![]),
    );
    assert_eq!(top(program), 123);
}

#[test]
fn test_function_parameter_is_called() {
    // fun apply(f: (int) -> int, v: int) = f(v)
    let apply = Declaration::fun(
        "apply",
        Type::Int,
        vec![
            Param::new("f", Type::arrow(vec![Type::Int], Type::Int)),
            Param::new("v", Type::Int),
        ],
        vec![],
        Expr::call("f", vec![Expr::id("v")]),
    );
    let program = Program::new(vec![apply], Expr::int(0));
    let result = fool::compile(program, &Options::default()).unwrap();
    assert!(result.is_ok(), "{}", result.diagnostics);
}

// ============================================================================
// Classes and objects
// ============================================================================

fn account() -> ClassDecl {
    ClassDecl::new("Account")
        .field("balance", Type::Int)
        .method(method("get", Type::Int, Expr::id("balance")))
        .method(MethodDecl::new(
            "deposit",
            Type::Int,
            vec![Param::new("amount", Type::Int)],
            vec![],
            Expr::add(Expr::id("balance"), Expr::id("amount")),
        ))
}

#[test]
fn test_method_call_reads_field() {
    let program = Program::new(
        vec![
            account().into(),
            Declaration::var(
                "acc",
                Type::class_ref("Account"),
                Expr::new_object("Account", vec![Expr::int(100)]),
            ),
        ],
        Expr::method_call("acc", "deposit", vec![Expr::int(50)]),
    );
    assert_eq!(top(program), 150);
}

#[test]
fn test_inherited_field_read() {
    let classes = || -> Vec<Declaration> {
        vec![
            ClassDecl::new("A").field("f", Type::Int).into(),
            ClassDecl::new("B").extends("A").into(),
        ]
    };

    let mut decls = classes();
    decls.push(Declaration::var(
        "b",
        Type::class_ref("B"),
        Expr::new_object("B", vec![Expr::int(5)]),
    ));
    assert_eq!(top(Program::new(decls, Expr::field("b", "f"))), 5);

    // A B is usable where an A is expected.
    let mut decls = classes();
    decls.push(Declaration::var(
        "a",
        Type::class_ref("A"),
        Expr::new_object("B", vec![Expr::int(5)]),
    ));
    assert_eq!(top(Program::new(decls, Expr::field("a", "f"))), 5);

    // But not the other way round.
    let mut decls = classes();
    decls.push(
        Declaration::var(
            "b",
            Type::class_ref("B"),
            Expr::new_object("A", vec![Expr::int(5)]),
        )
        .at(3),
    );
    let result = fool::compile(Program::new(decls, Expr::int(0)), &Options::default()).unwrap();
    assert_eq!(result.diagnostics.type_errors(), 1);
    assert_eq!(result.diagnostics.iter().next().map(|d| d.line), Some(3));
    assert!(result.bytecode.is_none());
}

#[test]
fn test_fields_keep_declaration_order() {
    let point = ClassDecl::new("P")
        .field("x", Type::Int)
        .field("y", Type::Int)
        .field("z", Type::Int);
    let program = Program::new(
        vec![
            point.into(),
            Declaration::var(
                "p",
                Type::class_ref("P"),
                Expr::new_object("P", vec![Expr::int(1), Expr::int(2), Expr::int(3)]),
            ),
        ],
        Expr::add(
            Expr::mul(Expr::field("p", "x"), Expr::int(100)),
            Expr::add(
                Expr::mul(Expr::field("p", "y"), Expr::int(10)),
                Expr::field("p", "z"),
            ),
        ),
    );
    assert_eq!(top(program), 123);
}

#[test]
fn test_dynamic_dispatch() {
    let base = ClassDecl::new("A")
        .method(method("who", Type::Int, Expr::int(1)))
        .method(method("base", Type::Int, Expr::int(10)));
    let derived = ClassDecl::new("B")
        .extends("A")
        .method(method("who", Type::Int, Expr::int(2)));

    let program = |class: &str| {
        Program::new(
            vec![
                base.clone().into(),
                derived.clone().into(),
                Declaration::var(
                    "a",
                    Type::class_ref("A"),
                    Expr::new_object(class, vec![]),
                ),
            ],
            Expr::add(
                Expr::method_call("a", "who", vec![]),
                Expr::method_call("a", "base", vec![]),
            ),
        )
    };
    assert_eq!(top(program("A")), 11);
    assert_eq!(top(program("B")), 12);
}

#[test]
fn test_method_calls_sibling_method() {
    let counter = ClassDecl::new("C")
        .field("v", Type::Int)
        .method(method(
            "quad",
            Type::Int,
            Expr::add(Expr::call("twice", vec![]), Expr::call("twice", vec![])),
        ))
        .method(method(
            "twice",
            Type::Int,
            Expr::add(Expr::id("v"), Expr::id("v")),
        ));
    let program = Program::new(
        vec![
            counter.into(),
            Declaration::var(
                "c",
                Type::class_ref("C"),
                Expr::new_object("C", vec![Expr::int(3)]),
            ),
        ],
        Expr::method_call("c", "quad", vec![]),
    );
    assert_eq!(top(program), 12);
}

#[test]
fn test_method_reads_global() {
    let reader = ClassDecl::new("R").method(method(
        "read",
        Type::Int,
        Expr::add(Expr::id("k"), Expr::call("double", vec![Expr::id("k")])),
    ));
    let double = Declaration::fun(
        "double",
        Type::Int,
        vec![Param::new("n", Type::Int)],
        vec![],
        Expr::mul(Expr::id("n"), Expr::int(2)),
    );
    let program = Program::new(
        vec![
            int_var("k", 7),
            double,
            reader.into(),
            Declaration::var("r", Type::class_ref("R"), Expr::new_object("R", vec![])),
        ],
        Expr::method_call("r", "read", vec![]),
    );
    assert_eq!(top(program), 21);
}

#[test]
fn test_method_with_locals_and_parameters() {
    let calc = ClassDecl::new("Calc")
        .field("base", Type::Int)
        .method(MethodDecl::new(
            "scaled",
            Type::Int,
            vec![Param::new("by", Type::Int)],
            vec![int_var("offset", 4)],
            Expr::add(Expr::mul(Expr::id("base"), Expr::id("by")), Expr::id("offset")),
        ));
    let program = Program::new(
        vec![
            calc.into(),
            Declaration::var(
                "c",
                Type::class_ref("Calc"),
                Expr::new_object("Calc", vec![Expr::int(5)]),
            ),
        ],
        Expr::method_call("c", "scaled", vec![Expr::int(3)]),
    );
    assert_eq!(top(program), 19);
}

#[test]
fn test_objects_as_arguments() {
    let take = Declaration::fun(
        "take",
        Type::Int,
        vec![Param::new("acc", Type::class_ref("Account"))],
        vec![],
        Expr::method_call("acc", "get", vec![]),
    );
    let program = Program::new(
        vec![
            account().into(),
            take,
            Declaration::var(
                "first",
                Type::class_ref("Account"),
                Expr::new_object("Account", vec![Expr::int(1)]),
            ),
            Declaration::var(
                "second",
                Type::class_ref("Account"),
                Expr::new_object("Account", vec![Expr::int(2)]),
            ),
        ],
        Expr::add(
            Expr::call("take", vec![Expr::id("first")]),
            Expr::mul(Expr::call("take", vec![Expr::id("second")]), Expr::int(10)),
        ),
    );
    assert_eq!(top(program), 21);
}

#[test]
fn test_null_comparisons() {
    let program = |init: Expr| {
        Program::new(
            vec![
                ClassDecl::new("A").field("f", Type::Int).into(),
                Declaration::var("a", Type::class_ref("A"), init),
            ],
            Expr::eq(Expr::id("a"), Expr::null()),
        )
    };
    assert_eq!(top(program(Expr::null())), 1);
    assert_eq!(top(program(Expr::new_object("A", vec![Expr::int(0)]))), 0);
}

#[test]
fn test_branch_join_of_classes() {
    let program = Program::new(
        vec![
            ClassDecl::new("A").into(),
            ClassDecl::new("B").extends("A").into(),
            ClassDecl::new("C").extends("A").into(),
            Declaration::var(
                "x",
                Type::class_ref("A"),
                Expr::if_then_else(
                    Expr::bool(true),
                    Expr::new_object("B", vec![]),
                    Expr::new_object("C", vec![]),
                ),
            ),
        ],
        Expr::int(0),
    );
    let result = fool::compile(program, &Options::default()).unwrap();
    assert!(result.is_ok(), "{}", result.diagnostics);
}

// ============================================================================
// Offsets
// ============================================================================

#[test]
fn test_override_reuses_offsets() {
    let base = ClassDecl::new("A")
        .field("x", Type::Int)
        .field("y", Type::Int)
        .method(method("m", Type::Int, Expr::int(0)))
        .method(method("n", Type::Int, Expr::int(0)));
    let derived = ClassDecl::new("B")
        .extends("A")
        .field("z", Type::Int)
        .field("x", Type::Bool)
        .method(method("n", Type::Int, Expr::int(1)))
        .method(method("o", Type::Int, Expr::int(2)));

    let result = fool::compile(
        Program::new(vec![base.into(), derived.into()], Expr::int(0)),
        &Options::default(),
    )
    .unwrap();
    assert!(result.is_ok(), "{}", result.diagnostics);

    let Declaration::Class(b) = &result.program.declarations[1] else {
        panic!("expected class B");
    };
    let fields: Vec<_> = b.fields.iter().map(|f| (f.name.as_str(), f.offset)).collect();
    assert_eq!(fields, vec![("z", -3), ("x", -1)]);
    let methods: Vec<_> = b.methods.iter().map(|m| (m.name.as_str(), m.offset)).collect();
    assert_eq!(methods, vec![("n", 1), ("o", 2)]);
}

#[test]
fn test_overridden_field_is_initialized_in_place() {
    let base = ClassDecl::new("A").field("x", Type::Int).field("y", Type::Int);
    let derived = ClassDecl::new("B").extends("A").field("x", Type::Bool);
    let program = Program::new(
        vec![
            base.into(),
            derived.into(),
            Declaration::var(
                "b",
                Type::class_ref("B"),
                Expr::new_object("B", vec![Expr::bool(true), Expr::int(7)]),
            ),
        ],
        Expr::add(Expr::field("b", "x"), Expr::field("b", "y")),
    );
    assert_eq!(top(program), 8);
}

// ============================================================================
// Diagnostics
// ============================================================================

#[test]
fn test_undeclared_function_reports_once() {
    let program = Program::expr(Expr::call("missing", vec![Expr::int(1)]).at(4));
    let result = fool::compile(program, &Options::default()).unwrap();

    assert_eq!(result.diagnostics.scope_errors(), 1);
    assert_eq!(result.diagnostics.type_errors(), 0);
    assert!(result.bytecode.is_none());

    let diagnostic = result.diagnostics.iter().next().unwrap();
    assert_eq!(diagnostic.phase, Phase::ScopeResolution);
    assert_eq!(diagnostic.line, 4);
}

#[test]
fn test_duplicate_declaration_keeps_first() {
    let program = Program::new(
        vec![
            Declaration::var("x", Type::Bool, Expr::bool(true)).at(1),
            int_var("x", 5).at(2),
        ],
        Expr::not(Expr::id("x")),
    );
    let result = fool::compile(program, &Options::default()).unwrap();

    assert_eq!(result.diagnostics.scope_errors(), 1);
    // `not x` checks because `x` is still the boolean.
    assert_eq!(result.diagnostics.type_errors(), 0);
    assert_eq!(result.ty, Some(Type::Bool));

    let ExprKind::Not(operand) = &result.program.body.kind else {
        panic!("expected not");
    };
    let ExprKind::Id(x) = &operand.kind else {
        panic!("expected identifier");
    };
    assert_eq!(x.resolution.as_ref().map(|r| r.entry.offset), Some(-2));
}

#[test]
fn test_both_phases_report() {
    let program = Program::new(
        vec![Declaration::var("b", Type::Bool, Expr::int(3)).at(1)],
        Expr::add(Expr::id("ghost").at(2), Expr::bool(true)),
    );
    let err = fool::run(program, &Options::default()).unwrap_err();
    let diagnostics = err.diagnostics().expect("compilation diagnostics");

    assert_eq!(diagnostics.scope_errors(), 1);
    assert_eq!(diagnostics.type_errors(), 1);
    assert!(
        err.to_string()
            .ends_with("You had 1 symbol table errors and 1 type checking errors.")
    );
}

#[test]
fn test_wrong_arity_and_argument_type() {
    let add = Declaration::fun(
        "add",
        Type::Int,
        vec![Param::new("a", Type::Int), Param::new("b", Type::Int)],
        vec![],
        Expr::add(Expr::id("a"), Expr::id("b")),
    );
    let calls = [
        vec![Expr::int(1)],
        vec![Expr::int(1), Expr::int(2), Expr::int(3)],
    ];
    for args in calls {
        let program = Program::new(vec![add.clone()], Expr::call("add", args));
        let result = fool::compile(program, &Options::default()).unwrap();
        assert_eq!(result.diagnostics.type_errors(), 1);
    }

    let program = Program::new(
        vec![ClassDecl::new("A").into(), add],
        Expr::call("add", vec![Expr::new_object("A", vec![]), Expr::int(2)]),
    );
    let result = fool::compile(program, &Options::default()).unwrap();
    let message = &result.diagnostics.iter().next().unwrap().message;
    assert!(message.contains("1-th parameter"), "{message}");
}

// ============================================================================
// Machine limits
// ============================================================================

fn endless() -> Program {
    Program::new(
        vec![Declaration::fun(
            "forever",
            Type::Int,
            vec![],
            vec![],
            Expr::call("forever", vec![]),
        )],
        Expr::call("forever", vec![]),
    )
}

#[test]
fn test_runaway_recursion_exhausts_memory() {
    let options = Options {
        memory_size: 200,
        ..Options::default()
    };
    assert!(matches!(
        fool::run(endless(), &options),
        Err(Error::Vm(VmError::MemoryOutOfBounds { .. }))
    ));

    let strict = Options {
        vm_flags: VmFlags::CHECK_COLLISION,
        ..options
    };
    assert!(matches!(
        fool::run(endless(), &strict),
        Err(Error::Vm(VmError::HeapStackCollision { .. }))
    ));
}

#[test]
fn test_step_limit() {
    let options = Options {
        max_steps: Some(1_000),
        ..Options::default()
    };
    assert!(matches!(
        fool::run(endless(), &options),
        Err(Error::Vm(VmError::StepLimitExceeded { limit: 1_000 }))
    ));
}
