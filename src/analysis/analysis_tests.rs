use super::*;
use crate::diagnostics::{error_count, Severity};
use crate::parser;
use pretty_assertions::assert_eq;

fn check_source(source: &str) -> Analysis {
    let mut reader = Reader::new("test", source);
    let program = parser::parse(&mut reader).expect("the test program should parse");
    check(&program)
}

fn rendered(analysis: &Analysis) -> Vec<String> {
    analysis
        .diagnostics
        .iter()
        .map(|m| format!("{}: {}", m.severity, m.text))
        .collect()
}

fn every_expression_is_typed(statements: &[Statement<Option<Type>>]) -> bool {
    fn exp_typed(exp: &Exp<Option<Type>>) -> bool {
        let children = match &exp.kind {
            ExpKind::Identifier(_) | ExpKind::Boolean(_) | ExpKind::Integer(_) => true,
            ExpKind::ArrayLiteral(parts) => parts.iter().all(exp_typed),
            ExpKind::Arithmetic(_, left, right)
            | ExpKind::Compare(_, left, right)
            | ExpKind::Logical(_, left, right) => exp_typed(left) && exp_typed(right),
            ExpKind::Call(call) => call.arguments.iter().all(exp_typed),
            ExpKind::LogicalNot(argument) => exp_typed(argument),
        };
        children && exp.meta.is_some()
    }

    statements.iter().all(|statement| match &statement.kind {
        StatementKind::Define(define) => exp_typed(&define.value),
        StatementKind::Assign(assign) => exp_typed(&assign.value),
        StatementKind::Do(do_function) => do_function.call.arguments.iter().all(exp_typed),
        StatementKind::If(if_statement) => {
            exp_typed(&if_statement.condition)
                && every_expression_is_typed(&if_statement.if_true)
                && every_expression_is_typed(&if_statement.if_false)
        }
        StatementKind::While(while_statement) => {
            exp_typed(&while_statement.condition)
                && every_expression_is_typed(&while_statement.body)
        }
        StatementKind::ReturnVoid => true,
        StatementKind::Return(return_statement) => exp_typed(&return_statement.value),
    })
}

#[test]
fn reports_undefined_identifier() {
    let analysis = check_source("function main() : void {\n  do print(x)\n}\n");
    assert_eq!(rendered(&analysis), vec!["error: Undefined identifier x."]);

    let message = &analysis.diagnostics[0];
    assert_eq!((message.location.line(), message.location.column()), (2, 12));
}

#[test]
fn reports_mismatched_arithmetic_arguments() {
    let analysis = check_source("function main() : void {\n  do print(1 + true)\n}\n");
    assert_eq!(
        rendered(&analysis),
        vec![
            "error: Mismatched arguments to arithmetic operator. Left argument has type integer, but right argument has type boolean."
        ]
    );
}

#[test]
fn warns_when_shadowing_an_outer_definition() {
    let analysis = check_source(
        "function main() : void {\n  let x = 1\n  if (true) {\n    let x = 2\n    do print(x)\n  }\n}\n",
    );
    assert_eq!(
        rendered(&analysis),
        vec![
            "warning: Definition of x shadows an existing definition.",
            "note: x was previously declared here.",
        ]
    );
    assert_eq!(error_count(&analysis.diagnostics), 0);

    // The warning points at the inner definition, the note at the outer one.
    assert_eq!(analysis.diagnostics[0].location.line(), 4);
    assert_eq!(analysis.diagnostics[1].location.line(), 2);
}

#[test]
fn warns_when_discarding_a_return_value() {
    let analysis = check_source(
        "function f() : integer {\n  return 1\n}\n\nfunction main() : void {\n  do f()\n}\n",
    );
    assert_eq!(
        rendered(&analysis),
        vec!["warning: Discarding return value of type integer in call to f."]
    );
}

#[test]
fn reports_ambiguous_array_literals() {
    let analysis = check_source("function main() : void {\n  let xs = [1, true]\n}\n");
    assert_eq!(
        rendered(&analysis),
        vec![
            "error: Ambiguous type for array.",
            "note: Expression of type boolean.",
            "note: Expression of type integer.",
        ]
    );
    // The error points at the literal itself.
    assert_eq!(
        (
            analysis.diagnostics[0].location.line(),
            analysis.diagnostics[0].location.column()
        ),
        (2, 12)
    );
}

#[test]
fn reports_redefinition_with_a_note() {
    let analysis = check_source("function main() : void {\n  let x = 1\n  let x = 2\n}\n");
    assert_eq!(
        rendered(&analysis),
        vec![
            "error: Redefinition of variable x.",
            "note: x was previously declared here.",
        ]
    );
}

#[test]
fn recovers_from_assignment_without_let() {
    let analysis = check_source("function main() : void {\n  x = 1\n  do print(x)\n}\n");
    assert_eq!(
        rendered(&analysis),
        vec!["error: Assignment to undefined variable x. Did you mean to write let?"]
    );
}

#[test]
fn reports_assignment_type_mismatch() {
    let analysis = check_source("function main() : void {\n  let x = 1\n  x = true\n}\n");
    assert_eq!(
        rendered(&analysis),
        vec![
            "error: Type mismatch in assignment: x has type integer, but expression yields type boolean.",
            "note: x is declared here.",
        ]
    );
}

#[test]
fn rejects_unsuitable_variable_types() {
    let analysis = check_source("function main() : void {\n  let x = print(1)\n}\n");
    assert_eq!(
        rendered(&analysis),
        vec![
            "error: Assignment expression in definition yields type void, which is not a suitable type for a variable."
        ]
    );
}

#[test]
fn validates_return_statements_against_the_signature() {
    let analysis = check_source("function f() : integer {\n  return true\n}\n");
    assert_eq!(
        rendered(&analysis),
        vec![
            "error: Type mismatch in return statement: f has return type integer but expression has type boolean."
        ]
    );

    let analysis = check_source("function f() : integer {\n  return\n}\n");
    assert_eq!(
        rendered(&analysis),
        vec!["error: Cannot return without a value: f has return type integer."]
    );
}

#[test]
fn validates_calls() {
    let analysis = check_source("function main() : void {\n  do print(1, 2)\n}\n");
    assert_eq!(
        rendered(&analysis),
        vec![
            "error: print expects 1 arguments but 2 were provided.",
            "note: print is declared here.",
        ]
    );
    assert_eq!(analysis.diagnostics[1].location.input_name(), "builtin");

    let analysis = check_source("function main() : void {\n  let x = 1\n  do x()\n}\n");
    assert_eq!(
        rendered(&analysis),
        vec![
            "error: x is not of function type.",
            "note: x is declared here.",
        ]
    );

    let analysis = check_source("function main() : void {\n  do print(true)\n}\n");
    assert_eq!(
        rendered(&analysis),
        vec![
            "error: Type mismatch for parameter 0 of call to print. Expected type is integer but the actual type is boolean."
        ]
    );
}

#[test]
fn rejects_non_boolean_conditions() {
    let analysis = check_source("function main() : void {\n  if (1) {}\n}\n");
    assert_eq!(
        rendered(&analysis),
        vec!["error: Condition for if statement has type integer, not boolean."]
    );

    let analysis = check_source("function main() : void {\n  while (1) {}\n}\n");
    assert_eq!(
        rendered(&analysis),
        vec!["error: Condition for while statement has type integer, not boolean."]
    );
}

#[test]
fn rejects_operators_on_unsupported_types() {
    let analysis = check_source("function main() : void {\n  let x = [1] + [2]\n}\n");
    assert_eq!(
        rendered(&analysis),
        vec!["error: Cannot use this operator with [integer]."]
    );

    let analysis = check_source("function main() : void {\n  let x = [1] == [2]\n}\n");
    assert_eq!(
        rendered(&analysis),
        vec!["error: [integer] is not equality comparable."]
    );

    let analysis = check_source("function main() : void {\n  let x = true < false\n}\n");
    assert_eq!(
        rendered(&analysis),
        vec!["error: boolean is not an ordered type."]
    );
}

#[test]
fn reports_every_independent_error_in_one_pass() {
    let analysis = check_source(
        "function f() : void {\n  do print(a)\n}\n\nfunction g() : void {\n  do print(b)\n}\n",
    );
    assert_eq!(
        rendered(&analysis),
        vec![
            "error: Undefined identifier a.",
            "error: Undefined identifier b.",
        ]
    );
}

#[test]
fn reports_duplicate_function_and_parameter_names() {
    let analysis =
        check_source("function f() : void {}\n\nfunction f() : void {}\n");
    assert_eq!(
        rendered(&analysis),
        vec![
            "error: Redefinition of name f.",
            "note: f previously declared here.",
        ]
    );

    let analysis = check_source("function f(x : integer, x : integer) : void {}\n");
    assert_eq!(
        rendered(&analysis),
        vec![
            "error: Multiple parameters called x.",
            "note: Previous definition is here.",
        ]
    );
}

#[test]
fn collected_types_are_closed_under_subterms() {
    let analysis = check_source("function main() : void {\n  let xs = [1, 2]\n}\n");
    assert_eq!(
        analysis.types,
        vec![
            Type::Void,
            Type::Boolean,
            Type::Integer,
            Type::Array(Box::new(Type::Integer)),
        ]
    );
    for ty in &analysis.types {
        if let Type::Array(element) = ty {
            assert!(analysis.types.contains(element));
        }
    }
}

#[test]
fn error_free_programs_are_fully_annotated() {
    let analysis = check_source(
        "function main() : void {\n  let i = 0\n  while (i < 3) {\n    do print(i)\n    i = i + 1\n  }\n}\n",
    );
    assert!(analysis.diagnostics.is_empty());
    for function in &analysis.program.functions {
        assert!(every_expression_is_typed(&function.body));
    }
}

#[test]
fn checking_is_a_fixpoint() {
    let mut reader = Reader::new("test", "function main() : void {\n  do print(40 + 2)\n}\n");
    let program = parser::parse(&mut reader).expect("the test program should parse");
    let first = check(&program);
    let second = check(&program);
    assert!(first.diagnostics.is_empty());
    assert_eq!(first.diagnostics, second.diagnostics);
    assert_eq!(first.program, second.program);
    assert_eq!(first.types, second.types);
}

#[test]
fn severities_follow_the_reporting_policy() {
    let analysis = check_source(
        "function main() : void {\n  let x = 1\n  if (true) {\n    let x = 2\n    do print(y)\n  }\n}\n",
    );
    let severities: Vec<Severity> = analysis.diagnostics.iter().map(|m| m.severity).collect();
    assert_eq!(
        severities,
        vec![Severity::Warning, Severity::Note, Severity::Error]
    );
    assert_eq!(error_count(&analysis.diagnostics), 1);
}
