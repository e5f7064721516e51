use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use elfline::event::{Event, Severity};
use elfline::get_symbols;

fn main() -> ExitCode {
    env_logger::init();

    let path = match read_path_from_stdin() {
        Some(path) => path,
        None => {
            eprintln!("usage: pipe or type a path to an ELF file on stdin");
            return ExitCode::FAILURE;
        }
    };

    let filters = vec!["POUS.c".to_string()];
    let mut sink = |event: Event| print_event(&event);

    match get_symbols(&path, &filters, None, &mut sink) {
        Ok(rows) => {
            for row in &rows {
                println!(
                    "file={}, address={}, line={}, is_stmt={}, basic_block={}, view={}",
                    row.file, row.address, row.line, row.is_stmt, row.basic_block, row.view
                );
            }
            println!("completed successfully, code: 0");
            ExitCode::SUCCESS
        }
        Err(err) => {
            let code = elfline::error::get_symbols_exit_code(&err);
            println!("completed with code: {code}");
            ExitCode::from(code.unsigned_abs() as u8)
        }
    }
}

fn read_path_from_stdin() -> Option<PathBuf> {
    print!("Enter the root path to the ELF file: ");
    io::stdout().flush().ok()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).ok()?;
    let trimmed = line.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(PathBuf::from(trimmed))
    }
}

fn print_event(event: &Event) {
    println!("[CALLBACK]{}{}", event.severity.label(), event.message);
    if event.severity == Severity::Err {
        log::error!("{}", event.message);
    }
}
