use std::io::{Read, Write};

use miette::{IntoDiagnostic, Result};

struct Args {
    mode: Mode,
    input: clio::Input,
    output: clio::Output,
}

enum Mode {
    Full,
    DumpAst,
    Tac,
}

impl Args {
    fn help() -> String {
        let help = r#"_Usage_: *tacc* [mode] <input> [-o output]

_Arguments_:
    *mode*        Output selection, one of:
                    *-dump-ast*   Print the AST and stop before analysis
                    *-tac*        Print only the generated TAC
                    *-help*       Print this help message
                  With no mode, print the AST and then the TAC.
    *input*       Input file, use - for stdin
    *-o output*   Output file, use - or omit for stdout"#;

        markup(help)
    }

    /// Parse command line arguments, return Err if failed.
    fn try_parse() -> Result<Self, String> {
        let mut args = std::env::args_os();
        args.next(); // skip program name

        let mut mode = Mode::Full;
        let mut input = None;
        let mut output = None;

        while let Some(arg) = args.next() {
            match arg.to_str() {
                Some("-dump-ast") => mode = Mode::DumpAst,
                Some("-tac") => mode = Mode::Tac,
                Some("-help") => {
                    // Print help message and exit
                    println!("{}", Self::help());
                    std::process::exit(0);
                }
                Some("-o") => {
                    output = Some(args.next().unwrap_or_else(|| "-".into()));
                }
                Some(s) if s.starts_with('-') && s.len() > 1 => {
                    return Err(format!("invalid argument: {}", s));
                }
                _ => {
                    if input.is_some() {
                        return Err(format!(
                            "unexpected argument: {}",
                            arg.to_string_lossy()
                        ));
                    }
                    input = Some(arg);
                }
            }
        }

        let input = input.ok_or("missing argument `input`")?;
        let input = clio::Input::new(&input).map_err(|err| err.to_string())?;

        // No output specified, use stdout
        let output = output.unwrap_or_else(|| "-".into());
        let output = clio::Output::new(&output).map_err(|err| err.to_string())?;

        Ok(Self {
            mode,
            input,
            output,
        })
    }

    /// Parse command line arguments, print help message and exit if failed.
    fn parse() -> Self {
        Self::try_parse().unwrap_or_else(|err| {
            eprintln!("{}: {}", markup("_Error_"), err);
            eprintln!("{}", Self::help());
            std::process::exit(1);
        })
    }
}

fn main() -> Result<()> {
    miette::set_panic_hook();

    // Parse command line arguments
    let mut args = Args::parse();

    // Read input
    let mut input = String::new();
    args.input.read_to_string(&mut input).into_diagnostic()?;

    // Generate output
    match args.mode {
        Mode::DumpAst => {
            let ast = tacc::parse(&input)?;
            write!(args.output, "{}", ast).into_diagnostic()?;
        }
        Mode::Tac => {
            let tac = tacc::compile(&input)?;
            write!(args.output, "{}", tacc::irgen::tac::render(&tac)).into_diagnostic()?;
        }
        Mode::Full => {
            let ast = tacc::parse(&input)?;
            write!(args.output, "{}", ast).into_diagnostic()?;
            tacc::check(&ast)?;
            let tac = tacc::irgen::IrGenerator::new().generate(&ast)?;
            write!(args.output, "{}", tacc::irgen::tac::render(&tac)).into_diagnostic()?;
        }
    }

    Ok(())
}

/// Simple markup for help message.
///
/// * `_underline_`
/// * `*bold*`
fn markup(s: &str) -> String {
    use owo_colors::*;
    use regex::{Captures, Regex};

    Regex::new(r"_(?P<underline>.*?)_|\*(?P<bold>.*?)\*")
        .unwrap()
        .replace_all(s, |caps: &Captures| {
            if let Some(s) = caps.name("bold") {
                return s
                    .as_str()
                    .if_supports_color(Stream::Stdout, |s| s.bold())
                    .to_string();
            }
            if let Some(s) = caps.name("underline") {
                return s
                    .as_str()
                    .if_supports_color(Stream::Stdout, |&s| s.bold().underline().to_string())
                    .to_string();
            }
            unreachable!()
        })
        .into_owned()
}
