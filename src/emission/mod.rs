#[cfg(test)]
mod emission_tests;

use crate::ast::*;

use std::fmt;

const HEADER: &str = "\
// Generated by the gel compiler.
#include <stdbool.h>
#include <stdint.h>
#include <stdio.h>

void gel_print(int_least64_t number) { printf(\"%d\\n\", number); }

// Start of user code.
";

const FOOTER: &str = "\
// End of user code.

int main() { return gel_main(); }
";

/// Translate an annotated program to a self-contained C11 translation
/// unit. The tree is assumed well formed: a missing expression type, a
/// function type in value position, or an array reaching this point is a
/// programmer error in the caller and aborts.
pub fn compile(program: &AnnotatedProgram) -> String {
    format!("\n{HEADER}{}\n{FOOTER}", CProgram(program))
}

struct Spaces(usize);

impl fmt::Display for Spaces {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:width$}", "", width = self.0)
    }
}

// Every user identifier carries a fixed prefix so that it can never
// collide with a C keyword or with the runtime preamble.
struct CName<'a>(&'a str);

impl fmt::Display for CName<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gel_{}", self.0)
    }
}

struct CType<'a>(&'a Type);

impl fmt::Display for CType<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Type::Void => f.write_str("void"),
            Type::Boolean => f.write_str("bool"),
            Type::Integer => f.write_str("int_least64_t"),
            Type::Array(_) => panic!("no C translation for array types"),
            Type::Function(_) => panic!("no function types should reach the emitter"),
        }
    }
}

impl fmt::Display for Arithmetic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => f.write_str("+"),
            Self::Divide => f.write_str("/"),
            Self::Multiply => f.write_str("*"),
            Self::Subtract => f.write_str("-"),
        }
    }
}

impl fmt::Display for Compare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equal => f.write_str("=="),
            Self::GreaterOrEqual => f.write_str(">="),
            Self::GreaterThan => f.write_str(">"),
            Self::LessOrEqual => f.write_str("<="),
            Self::LessThan => f.write_str("<"),
            Self::NotEqual => f.write_str("!="),
        }
    }
}

impl fmt::Display for Logical {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And => f.write_str("&&"),
            Self::Or => f.write_str("||"),
        }
    }
}

struct CExp<'a>(&'a Exp<Option<Type>>);

impl fmt::Display for CExp<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.kind {
            ExpKind::Identifier(name) => write!(f, "{}", CName(name)),
            ExpKind::Boolean(value) => f.write_str(if *value { "true" } else { "false" }),
            ExpKind::Integer(value) => write!(f, "{value}"),
            ExpKind::ArrayLiteral(_) => panic!("no C translation for array literals"),
            // Parentheses around every binary sub-expression preserve the
            // source precedence without recomputing it.
            ExpKind::Arithmetic(op, left, right) => {
                write!(f, "({} {op} {})", CExp(left), CExp(right))
            }
            ExpKind::Compare(op, left, right) => {
                write!(f, "({} {op} {})", CExp(left), CExp(right))
            }
            ExpKind::Logical(op, left, right) => {
                write!(f, "({} {op} {})", CExp(left), CExp(right))
            }
            ExpKind::Call(call) => write!(f, "{}", CCall(call)),
            ExpKind::LogicalNot(argument) => write!(f, "!{}", CExp(argument)),
        }
    }
}

struct CCall<'a>(&'a FunctionCall<Option<Type>>);

impl fmt::Display for CCall<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", CName(&self.0.function.name))?;
        for (i, argument) in self.0.arguments.iter().enumerate() {
            if i != 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", CExp(argument))?;
        }
        f.write_str(")")
    }
}

struct CStatement<'a> {
    statement: &'a Statement<Option<Type>>,
    indent: usize,
}

impl fmt::Display for CStatement<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let indent = Spaces(self.indent);
        match &self.statement.kind {
            StatementKind::Define(define) => {
                let ty = define
                    .variable
                    .meta
                    .as_ref()
                    .expect("no type for variable definition");
                writeln!(
                    f,
                    "{indent}{} {} = {};",
                    CType(ty),
                    CName(&define.variable.name),
                    CExp(&define.value)
                )
            }
            StatementKind::Assign(assign) => {
                writeln!(
                    f,
                    "{indent}{} = {};",
                    CName(&assign.variable.name),
                    CExp(&assign.value)
                )
            }
            StatementKind::Do(do_function) => {
                writeln!(f, "{indent}{};", CCall(&do_function.call))
            }
            StatementKind::If(if_statement) => {
                writeln!(f, "{indent}if ({}) {{", CExp(&if_statement.condition))?;
                write!(
                    f,
                    "{}",
                    CStatements {
                        statements: &if_statement.if_true,
                        indent: self.indent + 2,
                    }
                )?;
                writeln!(f, "{indent}}} else {{")?;
                write!(
                    f,
                    "{}",
                    CStatements {
                        statements: &if_statement.if_false,
                        indent: self.indent + 2,
                    }
                )?;
                writeln!(f, "{indent}}}")
            }
            StatementKind::While(while_statement) => {
                writeln!(f, "{indent}while ({}) {{", CExp(&while_statement.condition))?;
                write!(
                    f,
                    "{}",
                    CStatements {
                        statements: &while_statement.body,
                        indent: self.indent + 2,
                    }
                )?;
                writeln!(f, "{indent}}}")
            }
            StatementKind::ReturnVoid => writeln!(f, "{indent}return;"),
            StatementKind::Return(return_statement) => {
                writeln!(f, "{indent}return {};", CExp(&return_statement.value))
            }
        }
    }
}

struct CStatements<'a> {
    statements: &'a [Statement<Option<Type>>],
    indent: usize,
}

impl fmt::Display for CStatements<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for statement in self.statements {
            write!(
                f,
                "{}",
                CStatement {
                    statement,
                    indent: self.indent,
                }
            )?;
        }
        Ok(())
    }
}

struct CFunction<'a>(&'a DefineFunction<Option<Type>>);

impl fmt::Display for CFunction<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}(", CType(&self.0.ty.return_type), CName(&self.0.name))?;
        for (i, parameter) in self.0.parameters.iter().enumerate() {
            if i != 0 {
                f.write_str(", ")?;
            }
            write!(f, "{} {}", CType(&parameter.ty), CName(&parameter.name))?;
        }
        writeln!(f, ") {{")?;
        write!(
            f,
            "{}",
            CStatements {
                statements: &self.0.body,
                indent: 2,
            }
        )?;
        writeln!(f, "}}")
    }
}

struct CProgram<'a>(&'a AnnotatedProgram);

impl fmt::Display for CProgram<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, function) in self.0.functions.iter().enumerate() {
            if i != 0 {
                f.write_str("\n")?;
            }
            write!(f, "{}", CFunction(function))?;
        }
        Ok(())
    }
}
