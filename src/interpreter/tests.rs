//! Unit tests for the interpreter.

use std::{cell::RefCell, rc::Rc};

use bigdecimal::BigDecimal;
use pretty_assertions::assert_eq;

use crate::{
    ast::{
        ast::{Field, Method, Source},
        expressions::{BinaryOp, Expr},
        statements::Stmt,
    },
    environment::{
        types::{Function, TypeRegistry, Variable},
        value::{Native, Value},
    },
    errors::errors::{Error, ErrorImpl},
    interpreter::interpreter::{divide_decimal, Flow, Interpreter},
    type_checker::{
        type_checker::type_check,
        typed_ast::{TypedExpr, TypedMethod, TypedSource, TypedStmt},
    },
};

fn decimal(text: &str) -> BigDecimal {
    text.parse().unwrap()
}

fn run(registry: &TypeRegistry, source: Source) -> Result<Value, Error> {
    let typed = type_check(registry, source)?;
    Interpreter::new(registry).run(&typed)
}

fn run_main(statements: Vec<Stmt>) -> Result<Value, Error> {
    let registry = TypeRegistry::new();
    run(
        &registry,
        Source::new(vec![], vec![Method::new("main", &[], Some("Integer"), statements)]),
    )
}

fn int(value: i64) -> Expr {
    Expr::literal(value)
}

#[test]
fn test_return_sum() {
    let registry = TypeRegistry::new();
    let result = run_main(vec![Stmt::Return(Expr::binary(BinaryOp::Add, int(1), int(1)))]).unwrap();
    assert_eq!(result, Value::integer(&registry, 2));
}

#[test]
fn test_main_without_return_is_nil() {
    let registry = TypeRegistry::new();
    let result = run_main(vec![Stmt::declaration("x", None, Some(int(1)))]).unwrap();
    assert_eq!(result, Value::nil(&registry));
}

#[test]
fn test_print_writes_to_output() {
    let registry = TypeRegistry::new();
    let source = Source::new(
        vec![Field::new("greeting", None, Some(Expr::literal("Hello")))],
        vec![Method::new(
            "main",
            &[],
            Some("Integer"),
            vec![
                Stmt::Expression(Expr::call(
                    "print",
                    vec![Expr::binary(BinaryOp::Add, Expr::access("greeting"), Expr::literal(", World!"))],
                )),
                Stmt::Expression(Expr::call("print", vec![Expr::literal(BigDecimal::from(2))])),
                Stmt::Expression(Expr::call("print", vec![Expr::nil()])),
                Stmt::Return(int(0)),
            ],
        )],
    );
    let typed = type_check(&registry, source).unwrap();

    let buffer = Rc::new(RefCell::new(Vec::<u8>::new()));
    let result = Interpreter::new(&registry)
        .with_output(buffer.clone())
        .run(&typed)
        .unwrap();

    assert_eq!(result, Value::integer(&registry, 0));
    assert_eq!(
        String::from_utf8(buffer.borrow().clone()).unwrap(),
        "Hello, World!\n2\nnil\n"
    );
}

#[test]
fn test_fields_and_assignment() {
    let registry = TypeRegistry::new();
    let source = Source::new(
        vec![
            Field::new("count", Some("Integer"), Some(int(10))),
            Field::new("unset", Some("Integer"), None),
        ],
        vec![
            Method::new(
                "bump",
                &[("by", "Integer")],
                None,
                vec![Stmt::assignment(
                    Expr::access("count"),
                    Expr::binary(BinaryOp::Add, Expr::access("count"), Expr::access("by")),
                )],
            ),
            Method::new(
                "main",
                &[],
                Some("Integer"),
                vec![
                    Stmt::Expression(Expr::call("bump", vec![int(5)])),
                    Stmt::Expression(Expr::call("bump", vec![int(7)])),
                    Stmt::Return(Expr::access("count")),
                ],
            ),
        ],
    );

    assert_eq!(run(&registry, source).unwrap(), Value::integer(&registry, 22));
}

#[test]
fn test_recursion() {
    let registry = TypeRegistry::new();
    let factorial = Method::new(
        "factorial",
        &[("n", "Integer")],
        Some("Integer"),
        vec![
            Stmt::if_else(
                Expr::binary(BinaryOp::LessEqual, Expr::access("n"), int(1)),
                vec![Stmt::Return(int(1))],
                vec![],
            ),
            Stmt::Return(Expr::binary(
                BinaryOp::Multiply,
                Expr::access("n"),
                Expr::call("factorial", vec![Expr::binary(BinaryOp::Subtract, Expr::access("n"), int(1))]),
            )),
        ],
    );
    let main = Method::new(
        "main",
        &[],
        Some("Integer"),
        vec![Stmt::Return(Expr::call("factorial", vec![int(20)]))],
    );

    let result = run(&registry, Source::new(vec![], vec![factorial, main])).unwrap();
    assert_eq!(result, Value::integer(&registry, 2_432_902_008_176_640_000_i64));
}

#[test]
fn test_while_loop_and_local_scope() {
    let registry = TypeRegistry::new();
    let result = run_main(vec![
        Stmt::declaration("i", None, Some(int(0))),
        Stmt::declaration("total", None, Some(int(0))),
        Stmt::while_loop(
            Expr::binary(BinaryOp::Less, Expr::access("i"), int(5)),
            vec![
                Stmt::declaration("step", None, Some(Expr::access("i"))),
                Stmt::assignment(
                    Expr::access("total"),
                    Expr::binary(BinaryOp::Add, Expr::access("total"), Expr::access("step")),
                ),
                Stmt::assignment(Expr::access("i"), Expr::binary(BinaryOp::Add, Expr::access("i"), int(1))),
            ],
        ),
        Stmt::Return(Expr::access("total")),
    ])
    .unwrap();

    assert_eq!(result, Value::integer(&registry, 10));
}

#[test]
fn test_while_local_is_gone_after_loop() {
    let registry = TypeRegistry::new();
    let builtins = registry.builtins();
    let mut interpreter = Interpreter::new(&registry);
    interpreter.define_variable("go", Value::boolean(&registry, true)).unwrap();

    let go = Variable::new("go", "go", builtins.boolean);
    let local = Variable::new("local", "local", builtins.integer);
    let statement = TypedStmt::While {
        condition: TypedExpr::access(None, go.clone()),
        statements: vec![
            TypedStmt::Declaration {
                variable: local,
                value: Some(TypedExpr::literal(1, builtins.integer)),
            },
            TypedStmt::Assignment {
                receiver: TypedExpr::access(None, go),
                value: TypedExpr::literal(false, builtins.boolean),
            },
        ],
    };

    assert_eq!(interpreter.execute(&statement).unwrap(), Flow::Normal);
    let error = interpreter.lookup_variable("local").unwrap_err();
    assert_eq!(error.get_error_name(), "UnknownSymbolError");
}

#[test]
fn test_return_from_nested_blocks() {
    let registry = TypeRegistry::new();
    let result = run_main(vec![
        Stmt::while_loop(
            Expr::literal(true),
            vec![Stmt::if_else(Expr::literal(true), vec![Stmt::Return(int(7))], vec![])],
        ),
        Stmt::Return(int(0)),
    ])
    .unwrap();

    assert_eq!(result, Value::integer(&registry, 7));
}

#[test]
fn test_for_over_sequence() {
    let registry = TypeRegistry::new();
    let builtins = registry.builtins();
    let source = Source::new(
        vec![Field::new("total", None, Some(int(0)))],
        vec![Method::new(
            "main",
            &[],
            Some("Integer"),
            vec![
                Stmt::for_each(
                    "n",
                    Expr::access("numbers"),
                    vec![Stmt::assignment(
                        Expr::access("total"),
                        Expr::binary(BinaryOp::Add, Expr::access("total"), Expr::access("n")),
                    )],
                ),
                Stmt::Return(Expr::access("total")),
            ],
        )],
    );

    let mut type_checker = crate::type_checker::type_checker::TypeChecker::new(&registry);
    type_checker
        .define_variable(Variable::new("numbers", "numbers", builtins.integer_iterable))
        .unwrap();
    let typed = type_checker.check_source(&source).unwrap();

    let mut interpreter = Interpreter::new(&registry);
    let numbers = (1..=4).map(|n| Value::integer(&registry, n)).collect();
    interpreter
        .define_variable("numbers", Value::sequence(&registry, numbers))
        .unwrap();

    assert_eq!(interpreter.run(&typed).unwrap(), Value::integer(&registry, 10));
}

#[test]
fn test_short_circuit_skips_right_side() {
    let registry = TypeRegistry::new();
    let builtins = registry.builtins();
    let mut interpreter = Interpreter::new(&registry);
    let undefined = TypedExpr::access(None, Variable::new("undefined", "undefined", builtins.boolean));

    let and = TypedExpr::binary(
        BinaryOp::And,
        TypedExpr::literal(false, builtins.boolean),
        undefined.clone(),
        builtins.boolean,
    );
    assert_eq!(interpreter.evaluate(&and).unwrap(), Value::boolean(&registry, false));

    let or = TypedExpr::binary(
        BinaryOp::Or,
        TypedExpr::literal(true, builtins.boolean),
        undefined.clone(),
        builtins.boolean,
    );
    assert_eq!(interpreter.evaluate(&or).unwrap(), Value::boolean(&registry, true));

    let evaluated = TypedExpr::binary(
        BinaryOp::Or,
        TypedExpr::literal(false, builtins.boolean),
        undefined,
        builtins.boolean,
    );
    let error = interpreter.evaluate(&evaluated).unwrap_err();
    assert_eq!(error.get_error_name(), "UnknownSymbolError");
}

#[test]
fn test_division() {
    let registry = TypeRegistry::new();

    let result = run_main(vec![Stmt::Return(Expr::binary(BinaryOp::Divide, int(7), int(2)))]).unwrap();
    assert_eq!(result, Value::integer(&registry, 3));

    let result = run_main(vec![Stmt::Return(Expr::binary(BinaryOp::Divide, int(-7), int(2)))]).unwrap();
    assert_eq!(result, Value::integer(&registry, -3));

    let error = run_main(vec![Stmt::Return(Expr::binary(BinaryOp::Divide, int(5), int(0)))]).unwrap_err();
    assert_eq!(error.get_error_name(), "DivisionByZeroError");
}

#[test]
fn test_decimal_division_rounds_half_even() {
    assert_eq!(divide_decimal(&decimal("1.2"), &decimal("3.4")).unwrap(), decimal("0.4"));
    assert_eq!(divide_decimal(&decimal("1.0"), &decimal("4")).unwrap(), decimal("0.2"));
    assert_eq!(divide_decimal(&decimal("3.0"), &decimal("4")).unwrap(), decimal("0.8"));
    assert_eq!(divide_decimal(&decimal("-1.0"), &decimal("4")).unwrap(), decimal("-0.2"));
    assert_eq!(divide_decimal(&decimal("10"), &decimal("4")).unwrap(), decimal("2"));
    assert_eq!(divide_decimal(&decimal("1.00"), &decimal("3")).unwrap(), decimal("0.33"));

    let error = divide_decimal(&decimal("1.0"), &decimal("0.0")).unwrap_err();
    assert_eq!(error.get_internal_error(), &ErrorImpl::DivisionByZero);
}

#[test]
fn test_comparisons_and_equality() {
    let registry = TypeRegistry::new();
    let builtins = registry.builtins();
    let mut interpreter = Interpreter::new(&registry);

    let compare = |operator, left: TypedExpr, right: TypedExpr| {
        TypedExpr::binary(operator, left, right, builtins.boolean)
    };
    let text = |value: &str| TypedExpr::literal(value, builtins.string);

    let less = compare(BinaryOp::Less, text("apple"), text("banana"));
    assert_eq!(interpreter.evaluate(&less).unwrap(), Value::boolean(&registry, true));

    let equal = compare(BinaryOp::Equal, text("a"), text("a"));
    assert_eq!(interpreter.evaluate(&equal).unwrap(), Value::boolean(&registry, true));

    let not_equal = compare(
        BinaryOp::NotEqual,
        TypedExpr::literal(1, builtins.integer),
        TypedExpr::literal(decimal("1.0"), builtins.decimal),
    );
    assert_eq!(interpreter.evaluate(&not_equal).unwrap(), Value::boolean(&registry, true));

    let scaled = compare(
        BinaryOp::Equal,
        TypedExpr::literal(decimal("1.0"), builtins.decimal),
        TypedExpr::literal(decimal("1.00"), builtins.decimal),
    );
    assert_eq!(interpreter.evaluate(&scaled).unwrap(), Value::boolean(&registry, false));

    let same_scale = compare(
        BinaryOp::Equal,
        TypedExpr::literal(decimal("1.50"), builtins.decimal),
        TypedExpr::literal(decimal("1.50"), builtins.decimal),
    );
    assert_eq!(interpreter.evaluate(&same_scale).unwrap(), Value::boolean(&registry, true));

    let ordered = compare(
        BinaryOp::Less,
        TypedExpr::literal(decimal("1.0"), builtins.decimal),
        TypedExpr::literal(decimal("1.05"), builtins.decimal),
    );
    assert_eq!(interpreter.evaluate(&ordered).unwrap(), Value::boolean(&registry, true));

    let mismatched = compare(
        BinaryOp::Greater,
        TypedExpr::literal(1, builtins.integer),
        text("1"),
    );
    let error = interpreter.evaluate(&mismatched).unwrap_err();
    assert_eq!(error.get_error_name(), "TypeMismatchError");
}

#[test]
fn test_string_concatenation_and_members() {
    let registry = TypeRegistry::new();
    let result = run(
        &registry,
        Source::new(
            vec![],
            vec![Method::new(
                "main",
                &[],
                Some("Integer"),
                vec![
                    Stmt::declaration(
                        "text",
                        None,
                        Some(Expr::binary(BinaryOp::Add, Expr::literal("value: "), int(12))),
                    ),
                    Stmt::declaration(
                        "part",
                        None,
                        Some(Expr::method(Expr::access("text"), "slice", vec![int(7), int(9)])),
                    ),
                    Stmt::if_else(
                        Expr::binary(
                            BinaryOp::Equal,
                            Expr::access("part"),
                            Expr::method(int(12), "stringify", vec![]),
                        ),
                        vec![Stmt::Return(Expr::field(Expr::access("text"), "length"))],
                        vec![],
                    ),
                    Stmt::Return(int(-1)),
                ],
            )],
        ),
    )
    .unwrap();

    assert_eq!(result, Value::integer(&registry, 9));
}

#[test]
fn test_slice_out_of_bounds() {
    let error = run_main(vec![
        Stmt::declaration(
            "part",
            None,
            Some(Expr::method(Expr::literal("abc"), "slice", vec![int(2), int(5)])),
        ),
        Stmt::Return(int(0)),
    ])
    .unwrap_err();

    assert_eq!(error.get_error_name(), "IndexOutOfBoundsError");
}

#[test]
fn test_evaluation_order() {
    let registry = TypeRegistry::new();
    let builtins = registry.builtins();
    let buffer = Rc::new(RefCell::new(Vec::<u8>::new()));
    let mut interpreter = Interpreter::new(&registry).with_output(buffer.clone());

    let print = Function::new("print", "System.out.println", vec![builtins.any], builtins.nil);
    let logged = |text: &str| {
        TypedExpr::call(
            None,
            vec![TypedExpr::literal(text, builtins.string)],
            print.clone(),
        )
    };
    let record = Function::new("record", "record", vec![builtins.any, builtins.any], builtins.nil);
    interpreter
        .define_function("record", 2, Rc::new(|registry: &TypeRegistry, _: &[Value]| -> Result<Value, Error> {
            Ok(Value::nil(registry))
        }))
        .unwrap();

    let call = TypedExpr::call(None, vec![logged("first"), logged("second")], record);
    interpreter.evaluate(&call).unwrap();

    assert_eq!(String::from_utf8(buffer.borrow().clone()).unwrap(), "first\nsecond\n");
}

#[test]
fn test_supplied_object_members() {
    let mut registry = TypeRegistry::new();
    let builtins = *registry.builtins();
    let point = registry.register_type("Point", "Point", None).unwrap();
    registry
        .define_field(point, Variable::new("x", "x", builtins.integer))
        .unwrap();
    registry
        .define_method(point, Function::new("double", "twice", vec![builtins.any], builtins.integer))
        .unwrap();

    let mut interpreter = Interpreter::new(&registry);
    let object = interpreter.create_object(point, Native::Nil);
    interpreter
        .define_member_variable(&object, "x", Value::integer(&registry, 4))
        .unwrap();
    interpreter
        .define_member_function(
            &object,
            "double",
            0,
            Rc::new(|registry: &TypeRegistry, _: &[Value]| -> Result<Value, Error> {
                Ok(Value::integer(registry, 8))
            }),
        )
        .unwrap();
    interpreter.define_variable("origin", object).unwrap();

    let origin = TypedExpr::access(None, Variable::new("origin", "origin", point));
    let x = Variable::new("x", "x", builtins.integer);
    let assignment = TypedStmt::Assignment {
        receiver: TypedExpr::access(Some(origin.clone()), x.clone()),
        value: TypedExpr::literal(5, builtins.integer),
    };
    interpreter.execute(&assignment).unwrap();

    let read = TypedExpr::access(Some(origin.clone()), x);
    assert_eq!(interpreter.evaluate(&read).unwrap(), Value::integer(&registry, 5));

    let double = TypedExpr::call(
        Some(origin),
        vec![],
        Function::new("double", "twice", vec![builtins.any], builtins.integer),
    );
    assert_eq!(interpreter.evaluate(&double).unwrap(), Value::integer(&registry, 8));
}

#[test]
fn test_field_assignment_needs_members() {
    let registry = TypeRegistry::new();
    let builtins = registry.builtins();
    let mut interpreter = Interpreter::new(&registry);

    let assignment = TypedStmt::Assignment {
        receiver: TypedExpr::access(
            Some(TypedExpr::literal("abc", builtins.string)),
            Variable::new("length", "length()", builtins.integer),
        ),
        value: TypedExpr::literal(1, builtins.integer),
    };
    let error = interpreter.execute(&assignment).unwrap_err();
    assert_eq!(error.get_error_name(), "UnknownSymbolError");
}

#[test]
fn test_missing_main_at_runtime() {
    let registry = TypeRegistry::new();
    let source = TypedSource {
        fields: vec![],
        methods: vec![TypedMethod {
            parameters: vec![],
            statements: vec![],
            function: Function::new("helper", "helper", vec![], registry.builtins().nil),
        }],
    };

    let error = Interpreter::new(&registry).run(&source).unwrap_err();
    assert_eq!(error.get_error_name(), "UnknownSymbolError");
}
