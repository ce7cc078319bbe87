#[cfg(test)]
mod analysis_tests;

use crate::ast::*;
use crate::diagnostics::Message;
use crate::reader::{Location, Reader};

use std::collections::{BTreeMap, BTreeSet};

/// Which (operator, type) combinations the language accepts.
pub struct Operators {
    pub arithmetic: BTreeSet<(Arithmetic, Type)>,
    pub equality_comparable: BTreeSet<Type>,
    pub ordered: BTreeSet<Type>,
}

/// Checker-owned state threaded down the recursion: the operator tables,
/// the diagnostics in emission order, and the set of types the program
/// uses, closed under subterms and in insertion order.
pub struct GlobalContext {
    operators: Operators,
    diagnostics: Vec<Message>,
    types: Vec<Type>,
}

impl GlobalContext {
    fn initial() -> Self {
        let arithmetic = [
            Arithmetic::Add,
            Arithmetic::Divide,
            Arithmetic::Multiply,
            Arithmetic::Subtract,
        ]
        .into_iter()
        .map(|op| (op, Type::Integer))
        .collect();
        Self {
            operators: Operators {
                arithmetic,
                equality_comparable: BTreeSet::from([Type::Boolean, Type::Integer]),
                ordered: BTreeSet::from([Type::Integer]),
            },
            diagnostics: Vec::new(),
            types: vec![Type::Void, Type::Boolean, Type::Integer],
        }
    }

    fn error(&mut self, location: Location, text: impl Into<String>) {
        self.diagnostics.push(Message::error(location, text));
    }

    fn warning(&mut self, location: Location, text: impl Into<String>) {
        self.diagnostics.push(Message::warning(location, text));
    }

    fn note(&mut self, location: Location, text: impl Into<String>) {
        self.diagnostics.push(Message::note(location, text));
    }

    /// Record a type the emitter will need. Child types are added first,
    /// so the collected set is always closed under subterms.
    fn add_type(&mut self, ty: &Type) {
        if self.types.contains(ty) {
            return;
        }
        match ty {
            Type::Array(element) => self.add_type(element),
            Type::Function(function) => {
                self.add_type(&function.return_type);
                for parameter in &function.parameters {
                    self.add_type(parameter);
                }
            }
            Type::Void | Type::Boolean | Type::Integer => {}
        }
        self.types.push(ty.clone());
    }
}

/// One binding. The type is absent when the expression that defined the
/// name failed to type.
#[derive(Debug, Clone)]
pub struct Entry {
    pub location: Location,
    pub ty: Option<Type>,
}

/// A binding environment with an optional parent, forming a chain that
/// mirrors lexical nesting. Definition only consults this scope; lookup
/// walks the whole chain.
pub struct Scope<'p> {
    parent: Option<&'p Scope<'p>>,
    bindings: BTreeMap<String, Entry>,
}

impl<'p> Scope<'p> {
    pub fn new() -> Self {
        Self {
            parent: None,
            bindings: BTreeMap::new(),
        }
    }

    pub fn nested(parent: &'p Scope<'p>) -> Self {
        Self {
            parent: Some(parent),
            bindings: BTreeMap::new(),
        }
    }

    pub fn define(&mut self, name: String, entry: Entry) -> bool {
        if self.bindings.contains_key(&name) {
            return false;
        }
        self.bindings.insert(name, entry);
        true
    }

    pub fn lookup(&self, name: &str) -> Option<&Entry> {
        if let Some(entry) = self.bindings.get(name) {
            return Some(entry);
        }
        self.parent?.lookup(name)
    }
}

impl Default for Scope<'_> {
    fn default() -> Self {
        Self::new()
    }
}

// The signature of the function whose body is being checked, for
// validating its return statements.
struct FunctionContext<'a> {
    name: &'a str,
    ty: &'a FunctionType,
}

/// Everything the check produced. The caller decides success by the
/// absence of error-severity diagnostics; the annotated program is only
/// meaningful to the emitter in that case.
pub struct Analysis {
    pub program: AnnotatedProgram,
    pub diagnostics: Vec<Message>,
    pub types: Vec<Type>,
}

/// Check a parsed program against a fresh environment containing only the
/// `print` builtin. Never stops at the first problem: every function,
/// statement, and sub-expression is visited so that all independent
/// errors surface in one pass.
pub fn check(program: &ParsedProgram) -> Analysis {
    let mut ctx = GlobalContext::initial();
    let mut scope = Scope::new();

    let builtins = Reader::new("builtin", "<native code>");
    scope.define(
        "print".to_owned(),
        Entry {
            location: builtins.location(),
            ty: Some(Type::Function(Box::new(FunctionType {
                return_type: Type::Void,
                parameters: vec![Type::Integer],
            }))),
        },
    );

    let functions = program
        .functions
        .iter()
        .map(|function| check_function(function, &mut ctx, &mut scope))
        .collect();

    Analysis {
        program: Program { functions },
        diagnostics: ctx.diagnostics,
        types: ctx.types,
    }
}

fn check_function(
    definition: &DefineFunction<()>,
    ctx: &mut GlobalContext,
    scope: &mut Scope,
) -> DefineFunction<Option<Type>> {
    let name = &definition.name;
    let entry = Entry {
        location: definition.location.clone(),
        ty: Some(Type::Function(Box::new(definition.ty.clone()))),
    };
    if !scope.define(name.clone(), entry) {
        let previous = scope
            .lookup(name)
            .expect("a failed definition leaves the previous binding in place")
            .clone();
        ctx.error(
            definition.location.clone(),
            format!("Redefinition of name {name}."),
        );
        ctx.note(
            previous.location,
            format!("{name} previously declared here."),
        );
    }

    let mut function_scope = Scope::nested(scope);
    for parameter in &definition.parameters {
        let entry = Entry {
            location: parameter.location.clone(),
            ty: Some(parameter.ty.clone()),
        };
        if !function_scope.define(parameter.name.clone(), entry) {
            let previous = function_scope
                .lookup(&parameter.name)
                .expect("a failed definition leaves the previous binding in place")
                .clone();
            ctx.error(
                parameter.location.clone(),
                format!("Multiple parameters called {}.", parameter.name),
            );
            ctx.note(previous.location, "Previous definition is here.");
        }
    }

    let function = FunctionContext {
        name,
        ty: &definition.ty,
    };
    let body = check_statements(&definition.body, ctx, &function, &mut function_scope);

    DefineFunction {
        location: definition.location.clone(),
        name: name.clone(),
        ty: definition.ty.clone(),
        parameters: definition.parameters.clone(),
        body,
    }
}

fn check_statements(
    statements: &[Statement<()>],
    ctx: &mut GlobalContext,
    function: &FunctionContext,
    scope: &mut Scope,
) -> Vec<Statement<Option<Type>>> {
    statements
        .iter()
        .map(|statement| check_statement(statement, ctx, function, scope))
        .collect()
}

fn check_statement(
    statement: &Statement<()>,
    ctx: &mut GlobalContext,
    function: &FunctionContext,
    scope: &mut Scope,
) -> Statement<Option<Type>> {
    let kind = match &statement.kind {
        StatementKind::Define(define) => check_define(define, &statement.location, ctx, scope),
        StatementKind::Assign(assign) => check_assign(assign, &statement.location, ctx, scope),
        StatementKind::Do(do_function) => {
            let (call, return_type) = check_call(&do_function.call, ctx, scope);
            if let Some(ty) = return_type {
                if ty != Type::Void {
                    ctx.warning(
                        statement.location.clone(),
                        format!(
                            "Discarding return value of type {ty} in call to {}.",
                            call.function.name
                        ),
                    );
                }
            }
            StatementKind::Do(DoFunction { call })
        }
        StatementKind::If(if_statement) => {
            let condition = check_expression(&if_statement.condition, ctx, scope);
            if let Some(ty) = condition.ty() {
                if *ty != Type::Boolean {
                    ctx.error(
                        condition.location.clone(),
                        format!("Condition for if statement has type {ty}, not boolean."),
                    );
                }
            }
            let mut true_scope = Scope::nested(scope);
            let if_true = check_statements(&if_statement.if_true, ctx, function, &mut true_scope);
            let mut false_scope = Scope::nested(scope);
            let if_false =
                check_statements(&if_statement.if_false, ctx, function, &mut false_scope);
            StatementKind::If(If {
                condition,
                if_true,
                if_false,
            })
        }
        StatementKind::While(while_statement) => {
            let condition = check_expression(&while_statement.condition, ctx, scope);
            if let Some(ty) = condition.ty() {
                if *ty != Type::Boolean {
                    ctx.error(
                        condition.location.clone(),
                        format!("Condition for while statement has type {ty}, not boolean."),
                    );
                }
            }
            let mut body_scope = Scope::nested(scope);
            let body = check_statements(&while_statement.body, ctx, function, &mut body_scope);
            StatementKind::While(While { condition, body })
        }
        StatementKind::ReturnVoid => {
            if function.ty.return_type != Type::Void {
                ctx.error(
                    statement.location.clone(),
                    format!(
                        "Cannot return without a value: {} has return type {}.",
                        function.name, function.ty.return_type
                    ),
                );
            }
            StatementKind::ReturnVoid
        }
        StatementKind::Return(return_statement) => {
            let value = check_expression(&return_statement.value, ctx, scope);
            if let Some(ty) = value.ty() {
                if *ty != function.ty.return_type {
                    ctx.error(
                        statement.location.clone(),
                        format!(
                            "Type mismatch in return statement: {} has return type {} but expression has type {ty}.",
                            function.name, function.ty.return_type
                        ),
                    );
                }
            }
            StatementKind::Return(Return { value })
        }
    };
    Statement {
        location: statement.location.clone(),
        kind,
    }
}

fn check_define(
    define: &DefineVariable<()>,
    location: &Location,
    ctx: &mut GlobalContext,
    scope: &mut Scope,
) -> StatementKind<Option<Type>> {
    let value = check_expression(&define.value, ctx, scope);
    let value_type = value.meta.clone();
    if let Some(ty) = &value_type {
        if !ty.is_value_type() {
            ctx.error(
                location.clone(),
                format!(
                    "Assignment expression in definition yields type {ty}, which is not a suitable type for a variable."
                ),
            );
        }
    }

    let name = &define.variable.name;
    // Defining can succeed while still hiding a name from a surrounding
    // scope. That is not a bug, but it deserves a warning.
    let previous = scope.lookup(name).cloned();
    let entry = Entry {
        location: location.clone(),
        ty: value_type.clone(),
    };
    if scope.define(name.clone(), entry) {
        if let Some(previous) = previous {
            ctx.warning(
                location.clone(),
                format!("Definition of {name} shadows an existing definition."),
            );
            ctx.note(
                previous.location,
                format!("{name} was previously declared here."),
            );
        }
    } else {
        let previous = previous.expect("a failed definition implies a previous binding");
        ctx.error(location.clone(), format!("Redefinition of variable {name}."));
        ctx.note(
            previous.location,
            format!("{name} was previously declared here."),
        );
    }

    StatementKind::Define(DefineVariable {
        variable: Identifier {
            location: define.variable.location.clone(),
            meta: value_type,
            name: name.clone(),
        },
        value,
    })
}

fn check_assign(
    assign: &Assign<()>,
    location: &Location,
    ctx: &mut GlobalContext,
    scope: &mut Scope,
) -> StatementKind<Option<Type>> {
    let value = check_expression(&assign.value, ctx, scope);
    let value_type = value.meta.clone();
    let name = &assign.variable.name;

    let entry = match scope.lookup(name).cloned() {
        Some(entry) => entry,
        None => {
            ctx.error(
                location.clone(),
                format!("Assignment to undefined variable {name}. Did you mean to write let?"),
            );
            // Assume a definition was intended, so later uses of the name
            // do not cascade into more errors.
            let entry = Entry {
                location: location.clone(),
                ty: value_type.clone(),
            };
            scope.define(name.clone(), entry.clone());
            entry
        }
    };

    if let (Some(expected), Some(actual)) = (&entry.ty, &value_type) {
        if expected != actual {
            ctx.error(
                location.clone(),
                format!(
                    "Type mismatch in assignment: {name} has type {expected}, but expression yields type {actual}."
                ),
            );
            ctx.note(entry.location.clone(), format!("{name} is declared here."));
        }
    }

    StatementKind::Assign(Assign {
        variable: Identifier {
            location: assign.variable.location.clone(),
            meta: entry.ty,
            name: name.clone(),
        },
        value,
    })
}

fn check_expression(exp: &Exp<()>, ctx: &mut GlobalContext, scope: &Scope) -> Exp<Option<Type>> {
    let location = exp.location.clone();
    let (meta, kind) = match &exp.kind {
        ExpKind::Identifier(name) => {
            let meta = match scope.lookup(name) {
                Some(entry) => entry.ty.clone(),
                None => {
                    ctx.error(location.clone(), format!("Undefined identifier {name}."));
                    None
                }
            };
            (meta, ExpKind::Identifier(name.clone()))
        }
        ExpKind::Boolean(value) => {
            ctx.add_type(&Type::Boolean);
            (Some(Type::Boolean), ExpKind::Boolean(*value))
        }
        ExpKind::Integer(value) => {
            ctx.add_type(&Type::Integer);
            (Some(Type::Integer), ExpKind::Integer(*value))
        }
        ExpKind::ArrayLiteral(parts) => {
            let mut checked = Vec::with_capacity(parts.len());
            let mut exemplars: BTreeMap<Type, Location> = BTreeMap::new();
            for part in parts {
                let part = check_expression(part, ctx, scope);
                if let Some(ty) = part.ty() {
                    exemplars
                        .entry(ty.clone())
                        .or_insert_with(|| part.location.clone());
                }
                checked.push(part);
            }
            let meta = if exemplars.len() == 1 {
                let element = exemplars
                    .into_keys()
                    .next()
                    .expect("one exemplar is present");
                let ty = Type::Array(Box::new(element));
                ctx.add_type(&ty);
                Some(ty)
            } else {
                if exemplars.len() > 1 {
                    ctx.error(location.clone(), "Ambiguous type for array.");
                    for (ty, exemplar_location) in &exemplars {
                        ctx.note(exemplar_location.clone(), format!("Expression of type {ty}."));
                    }
                }
                None
            };
            (meta, ExpKind::ArrayLiteral(checked))
        }
        ExpKind::Arithmetic(operation, left, right) => {
            let left = check_expression(left, ctx, scope);
            let right = check_expression(right, ctx, scope);
            let meta = match (left.ty(), right.ty()) {
                // Without an argument type there is nothing to infer.
                (None, None) => None,
                (Some(left_type), Some(right_type)) if left_type != right_type => {
                    ctx.error(
                        location.clone(),
                        format!(
                            "Mismatched arguments to arithmetic operator. Left argument has type {left_type}, but right argument has type {right_type}."
                        ),
                    );
                    None
                }
                (Some(ty), _) | (_, Some(ty)) => {
                    let inferred = ty.clone();
                    ctx.add_type(&inferred);
                    if !ctx
                        .operators
                        .arithmetic
                        .contains(&(*operation, inferred.clone()))
                    {
                        ctx.error(
                            location.clone(),
                            format!("Cannot use this operator with {inferred}."),
                        );
                    }
                    Some(inferred)
                }
            };
            (
                meta,
                ExpKind::Arithmetic(*operation, Box::new(left), Box::new(right)),
            )
        }
        ExpKind::Compare(operation, left, right) => {
            ctx.add_type(&Type::Boolean);
            let left = check_expression(left, ctx, scope);
            let right = check_expression(right, ctx, scope);
            match (left.ty(), right.ty()) {
                (None, None) => {}
                (Some(left_type), Some(right_type)) if left_type != right_type => {
                    ctx.error(
                        location.clone(),
                        format!(
                            "Mismatched arguments to comparison operator. Left argument has type {left_type}, but right argument has type {right_type}."
                        ),
                    );
                }
                (Some(ty), _) | (_, Some(ty)) => {
                    if operation.is_equality() {
                        if !ctx.operators.equality_comparable.contains(ty) {
                            ctx.error(
                                location.clone(),
                                format!("{ty} is not equality comparable."),
                            );
                        }
                    } else if !ctx.operators.ordered.contains(ty) {
                        ctx.error(location.clone(), format!("{ty} is not an ordered type."));
                    }
                }
            }
            (
                Some(Type::Boolean),
                ExpKind::Compare(*operation, Box::new(left), Box::new(right)),
            )
        }
        ExpKind::Logical(operation, left, right) => {
            let left = check_expression(left, ctx, scope);
            let right = check_expression(right, ctx, scope);
            if let Some(ty) = left.ty() {
                if *ty != Type::Boolean {
                    ctx.error(
                        location.clone(),
                        format!(
                            "Left argument to logical operation has type {ty}, which is not a boolean type."
                        ),
                    );
                }
            }
            if let Some(ty) = right.ty() {
                if *ty != Type::Boolean {
                    ctx.error(
                        location.clone(),
                        format!(
                            "Right argument to logical operation has type {ty}, which is not a boolean type."
                        ),
                    );
                }
            }
            ctx.add_type(&Type::Boolean);
            (
                Some(Type::Boolean),
                ExpKind::Logical(*operation, Box::new(left), Box::new(right)),
            )
        }
        ExpKind::Call(call) => {
            let (call, return_type) = check_call(call, ctx, scope);
            (return_type, ExpKind::Call(call))
        }
        ExpKind::LogicalNot(argument) => {
            ctx.add_type(&Type::Boolean);
            let argument = check_expression(argument, ctx, scope);
            if let Some(ty) = argument.ty() {
                if *ty != Type::Boolean {
                    ctx.error(
                        argument.location.clone(),
                        format!("Argument to logical negation is of type {ty}, not boolean."),
                    );
                }
            }
            (Some(Type::Boolean), ExpKind::LogicalNot(Box::new(argument)))
        }
    };
    Exp {
        location,
        meta,
        kind,
    }
}

/// Check a call and return its annotated form along with its result type,
/// which is absent whenever the callee or the arity is wrong. Arguments
/// are visited on every path so that they still contribute diagnostics.
fn check_call(
    call: &FunctionCall<()>,
    ctx: &mut GlobalContext,
    scope: &Scope,
) -> (FunctionCall<Option<Type>>, Option<Type>) {
    let name = &call.function.name;
    let callee_location = &call.function.location;

    let Some(entry) = scope.lookup(name).cloned() else {
        ctx.error(
            callee_location.clone(),
            format!("Undefined identifier {name}."),
        );
        let arguments = check_arguments(&call.arguments, ctx, scope);
        return (annotate_call(call, None, arguments), None);
    };

    let Some(function_type) = entry.ty.as_ref().and_then(Type::as_function).cloned() else {
        ctx.error(
            callee_location.clone(),
            format!("{name} is not of function type."),
        );
        ctx.note(entry.location.clone(), format!("{name} is declared here."));
        let arguments = check_arguments(&call.arguments, ctx, scope);
        return (annotate_call(call, entry.ty, arguments), None);
    };

    if call.arguments.len() != function_type.parameters.len() {
        ctx.error(
            callee_location.clone(),
            format!(
                "{name} expects {} arguments but {} were provided.",
                function_type.parameters.len(),
                call.arguments.len()
            ),
        );
        ctx.note(entry.location.clone(), format!("{name} is declared here."));
        let arguments = check_arguments(&call.arguments, ctx, scope);
        return (annotate_call(call, entry.ty, arguments), None);
    }

    let return_type = function_type.return_type.clone();
    ctx.add_type(&return_type);

    let mut arguments = Vec::with_capacity(call.arguments.len());
    for (i, (argument, parameter)) in call
        .arguments
        .iter()
        .zip(&function_type.parameters)
        .enumerate()
    {
        let argument = check_expression(argument, ctx, scope);
        if let Some(ty) = argument.ty() {
            if ty != parameter {
                ctx.error(
                    argument.location.clone(),
                    format!(
                        "Type mismatch for parameter {i} of call to {name}. Expected type is {parameter} but the actual type is {ty}."
                    ),
                );
            }
        }
        arguments.push(argument);
    }

    (annotate_call(call, entry.ty, arguments), Some(return_type))
}

fn check_arguments(
    arguments: &[Exp<()>],
    ctx: &mut GlobalContext,
    scope: &Scope,
) -> Vec<Exp<Option<Type>>> {
    arguments
        .iter()
        .map(|argument| check_expression(argument, ctx, scope))
        .collect()
}

fn annotate_call(
    call: &FunctionCall<()>,
    callee_type: Option<Type>,
    arguments: Vec<Exp<Option<Type>>>,
) -> FunctionCall<Option<Type>> {
    FunctionCall {
        function: Identifier {
            location: call.function.location.clone(),
            meta: callee_type,
            name: call.function.name.clone(),
        },
        arguments,
    }
}
