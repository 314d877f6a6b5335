pub mod command;
pub mod parse;

use std::io::stdout;
use std::path::PathBuf;

use colored::*;
use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use reedline::{DefaultPrompt, DefaultPromptSegment, FileBackedHistory, Reedline, Signal};

use crate::shell::command::{execute_command, Command, Mounted};
use crate::shell::parse::parse_command;

pub fn start_shell() {
    boot_banner();

    let username = whoami::username();
    let hostname = whoami::hostname();
    let mut state: Option<Mounted> = None;

    println!(
        "{}",
        "Type 'help' for available commands. Use ↑↓ for history, Tab for auto-completion.\n"
            .bright_black()
    );

    let history_path = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".blockfs_history");

    let mut line_editor = Reedline::create();
    if let Ok(history) = FileBackedHistory::with_file(100, history_path) {
        line_editor = line_editor.with_history(Box::new(history));
    }

    let commands: Vec<String> = [
        "help", "mount", "umount", "ls", "cd", "pwd", "touch", "mkdir", "rmdir", "rm", "mv",
        "dump", "cpin", "cpout", "exit",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    let completer = reedline::DefaultCompleter::new_with_wordlen(commands, 2);
    line_editor = line_editor.with_completer(Box::new(completer));

    loop {
        let left = match &state {
            Some(m) => format!("{}@{}:{}", username, hostname, m.session.cwd_name),
            None => format!("{}@{}", username, hostname),
        };
        let prompt = DefaultPrompt::new(
            DefaultPromptSegment::Basic(left),
            DefaultPromptSegment::Basic("BlockFS".to_string()),
        );

        match line_editor.read_line(&prompt) {
            Ok(Signal::Success(buffer)) => {
                let trimmed = buffer.trim();
                if trimmed.is_empty() {
                    continue;
                }

                match parse_command(trimmed) {
                    Some(cmd) => {
                        execute_command(&cmd, &mut state);
                        if matches!(cmd, Command::Exit) {
                            break;
                        }
                    }
                    None => println!(
                        "{}",
                        "Unknown command or missing argument. Type 'help' for the command list."
                            .yellow()
                    ),
                }
            }
            Ok(Signal::CtrlC) => {
                println!();
                continue;
            }
            Ok(Signal::CtrlD) => {
                execute_command(&Command::Umount, &mut state);
                break;
            }
            Err(e) => {
                println!("Error reading line: {}", e);
                break;
            }
        }
    }

    println!("{}", "Bye!".bright_yellow());
}

fn boot_banner() {
    let mut stdout = stdout();
    let _ = execute!(stdout, Clear(ClearType::All), cursor::MoveTo(0, 0));
    println!("{}", "BlockFS shell".bright_cyan().bold());
}
