use std::path::PathBuf;
use std::process;

use clap::Parser as ClapParser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use slatelox::Lox;

/// A tree-walking interpreter for a small Lox-family scripting language.
#[derive(ClapParser)]
#[command(name = "slatelox", version, about)]
struct Args {
    /// Script to run. Omit to start an interactive prompt.
    script: Option<PathBuf>,

    /// Directories to search for imported modules, tried in order. Defaults
    /// to the script's own directory when running a file.
    search_dirs: Vec<PathBuf>,
}

fn main() {
    let args = Args::parse();

    let mut lox = Lox::new(args.search_dirs);

    match args.script {
        Some(path) => {
            let code = lox.run_file(&path);
            process::exit(code);
        }
        None => run_prompt(&mut lox),
    }
}

fn run_prompt(lox: &mut Lox) {
    let history_path = home::home_dir().map(|home| home.join(".slatelox_history"));

    let mut editor = DefaultEditor::new().expect("terminal to support line editing");
    if let Some(path) = &history_path {
        let _ = editor.load_history(path);
    }

    loop {
        match editor.readline("> ") {
            Ok(line) => {
                let _ = editor.add_history_entry(line.as_str());
                lox.run_line(&line);
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Readline error: {e}");
                break;
            }
        }
    }

    if let Some(path) = &history_path {
        let _ = editor.save_history(path);
    }
}
