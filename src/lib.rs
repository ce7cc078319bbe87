/*!
A compiler for gel, a tiny statically typed imperative language whose
programs are sequences of top-level function definitions. The compiler
reads a program, checks it, and translates it to a C translation unit
that a host C compiler turns into an executable.

## Compilation stages

1. **Reading** - [Reader](reader::Reader) is a cursor over the source text
   which tracks the byte offset, line, and column of every position, and
   hands out [Location](reader::Location) snapshots that outlive it.
2. **Parsing** - [parse](parser::parse) is a hand-written recursive-descent
   parser working directly on the character stream; the indentation-
   sensitive grammar needs no separate lexer. Any syntax error raises a
   single fatal [ParseError](parser::ParseError).
3. **Checking** - [check](analysis::check) resolves names against a scope
   chain, infers a type for every expression, and accumulates
   [Message](diagnostics::Message) diagnostics instead of stopping at the
   first problem. It produces the annotated tree the emitter consumes and
   the set of types the program uses.
4. **Emission** - [compile](emission::compile) translates the annotated
   tree to C with deterministic ordering and formatting. From this stage
   on, a malformed tree means a bug in the compiler and aborts via
   [panic!] rather than producing a diagnostic.

The binary drives these stages over standard input, writes
`.gel-output.c`, and shells out to gcc to build and run the result.
*/

#![deny(unused_must_use)]
#![warn(clippy::pedantic)]
#![allow(clippy::wildcard_imports)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::return_self_not_must_use)]

pub mod analysis;
pub mod ast;
pub mod diagnostics;
pub mod emission;
pub mod parser;
pub mod reader;
