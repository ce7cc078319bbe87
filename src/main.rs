use std::fs;
use std::io::{self, IsTerminal, Read};
use std::process::{exit, Command};

use anyhow::{Context, Result};
use clap::Parser as _;
use termcolor::{ColorChoice, StandardStream};

use gelc::analysis;
use gelc::diagnostics;
use gelc::emission;
use gelc::parser;
use gelc::reader::Reader;

/// Compiler for the gel language. Reads a program from standard input,
/// writes `.gel-output.c`, then compiles and runs it.
#[derive(clap::Parser)]
struct Args {
    /// Stop after parsing and dump the parsed tree
    #[arg(long)]
    parse: bool,

    /// Stop after semantic analysis and dump the annotated tree
    #[arg(long)]
    check: bool,

    /// Write the generated C file but do not compile or run it
    #[arg(long)]
    emit: bool,

    /// When to colour diagnostics
    #[arg(long, value_enum, default_value = "auto")]
    color: Color,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum Color {
    Auto,
    Always,
    Never,
}

impl Color {
    fn choice(self) -> ColorChoice {
        match self {
            Self::Always => ColorChoice::Always,
            Self::Never => ColorChoice::Never,
            Self::Auto => {
                if io::stderr().is_terminal() {
                    ColorChoice::Auto
                } else {
                    ColorChoice::Never
                }
            }
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut source = String::new();
    io::stdin()
        .read_to_string(&mut source)
        .context("failed to read the program from stdin")?;

    let mut stderr = StandardStream::stderr(args.color.choice());

    let mut reader = Reader::new("stdin", source);
    let program = match parser::parse(&mut reader) {
        Ok(program) => program,
        Err(error) => {
            let messages = [error.message().clone()];
            diagnostics::report(&mut stderr, &messages)?;
            exit(1);
        }
    };

    if args.parse {
        dbg!(&program);
        return Ok(());
    }

    let analysis = analysis::check(&program);
    let errors = diagnostics::report(&mut stderr, &analysis.diagnostics)?;
    if errors > 0 {
        exit(1);
    }

    if args.check {
        dbg!(&analysis.program);
        return Ok(());
    }

    let translated = emission::compile(&analysis.program);
    fs::write(".gel-output.c", translated).context("failed to write .gel-output.c")?;

    if args.emit {
        return Ok(());
    }

    let status = Command::new("gcc")
        .arg(".gel-output.c")
        .arg("-o")
        .arg(".gel-output")
        .status()
        .context("failed to run the C compiler")?;
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }

    let status = Command::new("./.gel-output")
        .status()
        .context("failed to run the compiled program")?;
    exit(status.code().unwrap_or(1));
}
