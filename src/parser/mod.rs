mod parse_error;

use crate::ast::*;
use crate::reader::{Location, Reader};
pub use parse_error::{ParseError, Result};

const RESERVED: [&str; 11] = [
    "boolean", "else", "false", "function", "if", "integer", "let", "return", "true", "void",
    "while",
];

/// Parse a whole program: one or more function definitions separated by
/// blank lines, with `#` comment lines allowed between them.
pub fn parse(reader: &mut Reader) -> Result<ParsedProgram> {
    let mut functions = Vec::new();
    loop {
        while reader.consume("\n") {}
        if reader.starts_with("#") {
            skip_comment(reader);
            continue;
        }
        if reader.empty() {
            break;
        }
        functions.push(parse_function(reader)?);
    }
    if functions.is_empty() {
        return Err(ParseError::new(
            reader.location(),
            "Unexpected end of input.",
        ));
    }
    Ok(Program { functions })
}

fn skip_comment(reader: &mut Reader) {
    let rest = reader.remaining();
    let length = rest.find('\n').unwrap_or(rest.len());
    reader.advance(length);
}

fn expect(reader: &mut Reader, token: &str) -> Result<()> {
    if reader.consume(token) {
        Ok(())
    } else if reader.empty() {
        Err(ParseError::new(
            reader.location(),
            "Unexpected end of input.",
        ))
    } else {
        Err(ParseError::new(
            reader.location(),
            format!("Expected {token:?}."),
        ))
    }
}

/// `[A-Za-z][A-Za-z0-9]*`, excluding the reserved words.
fn parse_name(reader: &mut Reader) -> Result<String> {
    let location = reader.location();
    let rest = reader.remaining();
    let length = rest
        .bytes()
        .position(|b| !b.is_ascii_alphanumeric())
        .unwrap_or(rest.len());
    let name = &rest[..length];
    if name.is_empty() || !name.as_bytes()[0].is_ascii_alphabetic() {
        return Err(ParseError::new(
            location,
            format!("Invalid identifier: {name}"),
        ));
    }
    if RESERVED.contains(&name) {
        return Err(ParseError::new(
            location,
            format!("Reserved word {name} used as an identifier."),
        ));
    }
    let name = name.to_owned();
    reader.advance(length);
    Ok(name)
}

fn parse_type(reader: &mut Reader) -> Result<Type> {
    if reader.consume("void") {
        Ok(Type::Void)
    } else if reader.consume("boolean") {
        Ok(Type::Boolean)
    } else if reader.consume("integer") {
        Ok(Type::Integer)
    } else {
        Err(ParseError::new(reader.location(), "Expected type."))
    }
}

fn parse_function(reader: &mut Reader) -> Result<DefineFunction<()>> {
    let location = reader.location();
    if !reader.consume("function ") {
        return Err(ParseError::new(
            location,
            "Unexpected trailing characters.",
        ));
    }
    let name = parse_name(reader)?;
    expect(reader, "(")?;
    let mut parameters = Vec::new();
    if !reader.consume(")") {
        loop {
            let parameter_location = reader.location();
            let parameter_name = parse_name(reader)?;
            expect(reader, " : ")?;
            let parameter_type = parse_type(reader)?;
            parameters.push(Parameter {
                location: parameter_location,
                name: parameter_name,
                ty: parameter_type,
            });
            if reader.consume(", ") {
                continue;
            }
            if !reader.consume(")") {
                return Err(ParseError::new(reader.location(), "Missing ')'."));
            }
            break;
        }
    }
    expect(reader, " : ")?;
    let return_type = parse_type(reader)?;
    expect(reader, " ")?;
    let body = parse_block(reader, 0)?;
    let ty = FunctionType {
        return_type,
        parameters: parameters.iter().map(|p| p.ty.clone()).collect(),
    };
    Ok(DefineFunction {
        location,
        name,
        ty,
        parameters,
        body,
    })
}

/// Parse a brace block whose header sits at `indent` spaces. Body lines
/// must be indented exactly two spaces further; the closing brace returns
/// to the header's indentation. The empty block is the literal `{}`.
fn parse_block(reader: &mut Reader, indent: usize) -> Result<Vec<Statement<()>>> {
    expect(reader, "{")?;
    if reader.consume("}") {
        return Ok(Vec::new());
    }
    expect(reader, "\n")?;

    let close = format!("{}{}", " ".repeat(indent), '}');
    let inner = " ".repeat(indent + 2);
    let mut statements = Vec::new();
    loop {
        if reader.empty() {
            return Err(ParseError::new(
                reader.location(),
                "Unexpected end of input.",
            ));
        }
        if reader.consume(&close) {
            break;
        }
        if !reader.consume(&inner) || reader.starts_with(" ") {
            return Err(ParseError::new(reader.location(), "Bad indentation."));
        }
        if reader.starts_with("#") {
            skip_comment(reader);
            expect(reader, "\n")?;
            continue;
        }
        let statement = parse_statement(reader, indent + 2)?;
        expect(reader, "\n")?;
        statements.push(statement);
    }
    Ok(statements)
}

fn parse_statement(reader: &mut Reader, indent: usize) -> Result<Statement<()>> {
    let location = reader.location();
    if reader.consume("let ") {
        let variable_location = reader.location();
        let name = parse_name(reader)?;
        expect(reader, " = ")?;
        let value = parse_expression(reader)?;
        return Ok(Statement {
            location,
            kind: StatementKind::Define(DefineVariable {
                variable: Identifier {
                    location: variable_location,
                    meta: (),
                    name,
                },
                value,
            }),
        });
    }
    if reader.consume("do ") {
        let call = parse_call(reader)?;
        return Ok(Statement {
            location,
            kind: StatementKind::Do(DoFunction { call }),
        });
    }
    if reader.consume("if (") {
        return parse_if(reader, location, indent);
    }
    if reader.consume("while (") {
        let condition = parse_expression(reader)?;
        expect(reader, ") ")?;
        let body = parse_block(reader, indent)?;
        return Ok(Statement {
            location,
            kind: StatementKind::While(While { condition, body }),
        });
    }
    // `return` only when the keyword is not a prefix of a longer name.
    if reader.starts_with("return")
        && !matches!(reader.remaining().as_bytes().get(6), Some(b) if b.is_ascii_alphanumeric())
    {
        reader.advance(6);
        if reader.consume(" ") {
            let value = parse_expression(reader)?;
            return Ok(Statement {
                location,
                kind: StatementKind::Return(Return { value }),
            });
        }
        return Ok(Statement {
            location,
            kind: StatementKind::ReturnVoid,
        });
    }
    let name = parse_name(reader)?;
    expect(reader, " = ")?;
    let value = parse_expression(reader)?;
    Ok(Statement {
        location: location.clone(),
        kind: StatementKind::Assign(Assign {
            variable: Identifier {
                location,
                meta: (),
                name,
            },
            value,
        }),
    })
}

// `if (` has already been consumed. A trailing ` else if (` recurses so
// that chained conditions nest inside the false branch.
fn parse_if(reader: &mut Reader, location: Location, indent: usize) -> Result<Statement<()>> {
    let condition = parse_expression(reader)?;
    expect(reader, ") ")?;
    let if_true = parse_block(reader, indent)?;
    let if_false = if reader.consume(" else ") {
        let else_location = reader.location();
        if reader.consume("if (") {
            vec![parse_if(reader, else_location, indent)?]
        } else {
            parse_block(reader, indent)?
        }
    } else {
        Vec::new()
    };
    Ok(Statement {
        location,
        kind: StatementKind::If(If {
            condition,
            if_true,
            if_false,
        }),
    })
}

fn parse_call(reader: &mut Reader) -> Result<FunctionCall<()>> {
    let location = reader.location();
    let name = parse_name(reader)?;
    expect(reader, "(")?;
    let arguments = parse_call_arguments(reader)?;
    Ok(FunctionCall {
        function: Identifier {
            location,
            meta: (),
            name,
        },
        arguments,
    })
}

// `(` has already been consumed.
fn parse_call_arguments(reader: &mut Reader) -> Result<Vec<Exp<()>>> {
    let mut arguments = Vec::new();
    if reader.consume(")") {
        return Ok(arguments);
    }
    loop {
        arguments.push(parse_expression(reader)?);
        if reader.consume(", ") {
            continue;
        }
        if reader.consume(")") {
            break;
        }
        return Err(ParseError::new(reader.location(), "Missing ')'."));
    }
    Ok(arguments)
}

// Binary operators are only recognised with a single space on either side,
// which keeps tokenisation unambiguous without a lexer. One function per
// precedence level, loosest binding first.

fn parse_expression(reader: &mut Reader) -> Result<Exp<()>> {
    let mut left = parse_conjunction(reader)?;
    while reader.consume(" || ") {
        let right = parse_conjunction(reader)?;
        let location = left.location.clone();
        left = Exp::new(
            location,
            ExpKind::Logical(Logical::Or, Box::new(left), Box::new(right)),
        );
    }
    Ok(left)
}

fn parse_conjunction(reader: &mut Reader) -> Result<Exp<()>> {
    let mut left = parse_comparison(reader)?;
    while reader.consume(" && ") {
        let right = parse_comparison(reader)?;
        let location = left.location.clone();
        left = Exp::new(
            location,
            ExpKind::Logical(Logical::And, Box::new(left), Box::new(right)),
        );
    }
    Ok(left)
}

// Comparisons do not associate: at most one per expression level.
fn parse_comparison(reader: &mut Reader) -> Result<Exp<()>> {
    let left = parse_sum(reader)?;
    let operation = if reader.consume(" == ") {
        Compare::Equal
    } else if reader.consume(" != ") {
        Compare::NotEqual
    } else if reader.consume(" <= ") {
        Compare::LessOrEqual
    } else if reader.consume(" >= ") {
        Compare::GreaterOrEqual
    } else if reader.consume(" < ") {
        Compare::LessThan
    } else if reader.consume(" > ") {
        Compare::GreaterThan
    } else {
        return Ok(left);
    };
    let right = parse_sum(reader)?;
    let location = left.location.clone();
    Ok(Exp::new(
        location,
        ExpKind::Compare(operation, Box::new(left), Box::new(right)),
    ))
}

fn parse_sum(reader: &mut Reader) -> Result<Exp<()>> {
    let mut left = parse_product(reader)?;
    loop {
        let operation = if reader.consume(" + ") {
            Arithmetic::Add
        } else if reader.consume(" - ") {
            Arithmetic::Subtract
        } else {
            return Ok(left);
        };
        let right = parse_product(reader)?;
        let location = left.location.clone();
        left = Exp::new(
            location,
            ExpKind::Arithmetic(operation, Box::new(left), Box::new(right)),
        );
    }
}

fn parse_product(reader: &mut Reader) -> Result<Exp<()>> {
    let mut left = parse_unary(reader)?;
    loop {
        let operation = if reader.consume(" * ") {
            Arithmetic::Multiply
        } else if reader.consume(" / ") {
            Arithmetic::Divide
        } else {
            return Ok(left);
        };
        let right = parse_unary(reader)?;
        let location = left.location.clone();
        left = Exp::new(
            location,
            ExpKind::Arithmetic(operation, Box::new(left), Box::new(right)),
        );
    }
}

fn parse_unary(reader: &mut Reader) -> Result<Exp<()>> {
    let location = reader.location();
    if reader.consume("!") {
        let argument = parse_unary(reader)?;
        return Ok(Exp::new(location, ExpKind::LogicalNot(Box::new(argument))));
    }
    parse_term(reader)
}

fn parse_term(reader: &mut Reader) -> Result<Exp<()>> {
    let location = reader.location();
    if reader.empty() {
        return Err(ParseError::new(location, "Unexpected end of input."));
    }
    if reader.consume("(") {
        let expression = parse_expression(reader)?;
        if !reader.consume(")") {
            return Err(ParseError::new(reader.location(), "Missing ')'."));
        }
        return Ok(expression);
    }
    if reader.consume("[") {
        let mut parts = Vec::new();
        if !reader.consume("]") {
            loop {
                parts.push(parse_expression(reader)?);
                if reader.consume(", ") {
                    continue;
                }
                if reader.consume("]") {
                    break;
                }
                return Err(ParseError::new(reader.location(), "Missing ']'."));
            }
        }
        return Ok(Exp::new(location, ExpKind::ArrayLiteral(parts)));
    }
    let front = reader.front().expect("checked non-empty above");
    if front == '-' || front.is_ascii_digit() {
        return parse_integer(reader);
    }
    if front.is_ascii_alphabetic() {
        return parse_identifier_expression(reader);
    }
    Err(ParseError::new(location, "Illegal token."))
}

/// An optional `-` followed by decimal digits. The value accumulates
/// negated and flips at the end, so the minimum 64-bit integer has a
/// literal spelling; out-of-range literals wrap rather than abort.
fn parse_integer(reader: &mut Reader) -> Result<Exp<()>> {
    let location = reader.location();
    let negative = reader.consume("-");
    let rest = reader.remaining();
    let length = rest
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(rest.len());
    if length == 0 {
        return Err(ParseError::new(location, "Illegal token."));
    }
    let mut value: i64 = 0;
    for byte in rest[..length].bytes() {
        value = value.wrapping_mul(10).wrapping_sub(i64::from(byte - b'0'));
    }
    if !negative {
        value = value.wrapping_neg();
    }
    reader.advance(length);
    Ok(Exp::new(location, ExpKind::Integer(value)))
}

// The caller has seen an alphabetic character: a boolean literal, an
// identifier, or a call when `(` follows the name directly.
fn parse_identifier_expression(reader: &mut Reader) -> Result<Exp<()>> {
    let location = reader.location();
    let rest = reader.remaining();
    let length = rest
        .bytes()
        .position(|b| !b.is_ascii_alphanumeric())
        .unwrap_or(rest.len());
    let name = &rest[..length];
    match name {
        "true" => {
            reader.advance(length);
            Ok(Exp::new(location, ExpKind::Boolean(true)))
        }
        "false" => {
            reader.advance(length);
            Ok(Exp::new(location, ExpKind::Boolean(false)))
        }
        _ if RESERVED.contains(&name) => Err(ParseError::new(
            location,
            format!("Reserved word {name} used as an identifier."),
        )),
        _ => {
            let name = name.to_owned();
            reader.advance(length);
            if reader.consume("(") {
                let arguments = parse_call_arguments(reader)?;
                return Ok(Exp::new(
                    location.clone(),
                    ExpKind::Call(FunctionCall {
                        function: Identifier {
                            location,
                            meta: (),
                            name,
                        },
                        arguments,
                    }),
                ));
            }
            Ok(Exp::new(location, ExpKind::Identifier(name)))
        }
    }
}
