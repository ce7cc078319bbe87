use super::*;
use crate::analysis;
use crate::parser;
use crate::reader::Reader;
use pretty_assertions::assert_eq;

fn compile_source(source: &str) -> String {
    let mut reader = Reader::new("test", source);
    let program = parser::parse(&mut reader).expect("the test program should parse");
    let analysis = analysis::check(&program);
    assert!(
        analysis.diagnostics.is_empty(),
        "unexpected diagnostics: {:?}",
        analysis.diagnostics
    );
    compile(&analysis.program)
}

#[test]
fn emits_a_complete_translation_unit() {
    let translated = compile_source("function main() : integer {\n  return 0\n}\n");
    let expected = format!("\n{HEADER}int_least64_t gel_main() {{\n  return 0;\n}}\n{FOOTER}");
    assert_eq!(translated, expected);
}

#[test]
fn emits_the_while_loop_program() {
    let translated = compile_source(
        "function main() : void {\n  let i = 0\n  while (i < 3) {\n    do print(i)\n    i = i + 1\n  }\n}\n",
    );
    let body = "void gel_main() {\n  int_least64_t gel_i = 0;\n  while ((gel_i < 3)) {\n    gel_print(gel_i);\n    gel_i = (gel_i + 1);\n  }\n}\n";
    let expected = format!("\n{HEADER}{body}\n{FOOTER}");
    assert_eq!(translated, expected);
}

#[test]
fn prefixes_identifiers_and_maps_primitives() {
    let translated = compile_source(
        "function f(b : boolean, n : integer) : boolean {\n  return b && n == 0\n}\n",
    );
    assert!(translated.contains("bool gel_f(bool gel_b, int_least64_t gel_n) {"));
    assert!(translated.contains("  return (gel_b && (gel_n == 0));\n"));
}

#[test]
fn always_emits_both_if_branches() {
    let translated = compile_source(
        "function main() : void {\n  if (true) {\n    do print(1)\n  }\n}\n",
    );
    assert!(translated.contains(
        "  if (true) {\n    gel_print(1);\n  } else {\n  }\n"
    ));
}

#[test]
fn parenthesises_every_binary_subexpression() {
    let translated = compile_source(
        "function main() : void {\n  do print(1 + 2 * 3 - 4)\n}\n",
    );
    assert!(translated.contains("gel_print(((1 + (2 * 3)) - 4));"));
}

#[test]
fn separates_functions_with_a_blank_line() {
    let translated = compile_source(
        "function f() : void {}\n\nfunction main() : void {\n  do f()\n}\n",
    );
    assert!(translated.contains("void gel_f() {\n}\n\nvoid gel_main() {\n  gel_f();\n}\n"));
}

#[test]
fn emits_chained_else_if_as_nested_ifs() {
    let translated = compile_source(
        "function f(x : boolean) : integer {\n  if (x) {\n    return 1\n  } else if (x) {\n    return 2\n  } else {\n    return 3\n  }\n}\n",
    );
    let expected_body = "  if (gel_x) {\n    return 1;\n  } else {\n    if (gel_x) {\n      return 2;\n    } else {\n      return 3;\n    }\n  }\n";
    assert!(translated.contains(expected_body));
}
