//! tidemark CLI: parse Markdown and dump the block tree.

use std::io::{self, Read, Write};
use std::process::ExitCode;

fn main() -> io::Result<ExitCode> {
    let args: Vec<String> = std::env::args().collect();

    let input = if args.len() > 1 && args[1] != "-" {
        std::fs::read_to_string(&args[1])?
    } else {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    };

    match tidemark::parse(&input) {
        Ok(blocks) => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{blocks:#?}")?;
            Ok(ExitCode::SUCCESS)
        }
        Err(errors) => {
            let mut stderr = io::stderr().lock();
            for error in &errors {
                writeln!(stderr, "{}", tidemark::error_to_string(error))?;
            }
            Ok(ExitCode::FAILURE)
        }
    }
}
