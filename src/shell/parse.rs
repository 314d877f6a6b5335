use crate::shell::command::Command;

pub fn parse_command(input: &str) -> Option<Command> {
    let tokens: Vec<&str> = input.trim().split_ascii_whitespace().collect();
    if tokens.is_empty() {
        return None;
    }

    let cmd = tokens[0];
    let args = &tokens[1..];

    match cmd {
        "help" => Some(Command::Help),
        "mount" => args.first().map(|&p| Command::Mount(p.to_string())),
        "umount" => Some(Command::Umount),
        "touch" => args.first().map(|&n| Command::Touch(n.to_string())),
        "mkdir" => args.first().map(|&n| Command::Mkdir(n.to_string())),
        "rmdir" => args.first().map(|&n| Command::Rmdir(n.to_string())),
        "rm" => args.first().map(|&n| Command::Rm(n.to_string())),
        "mv" => {
            if args.len() == 2 {
                Some(Command::Mv(args[0].to_string(), args[1].to_string()))
            } else {
                None
            }
        }
        "ls" => Some(Command::Ls(args.first().map(|&n| n.to_string()))),
        "cd" => Some(Command::Cd(args.first().map(|&n| n.to_string()))),
        "pwd" => Some(Command::Pwd),
        "dump" => Some(Command::Dump),
        "cpin" => {
            if args.len() == 2 {
                Some(Command::Cpin(args[0].to_string(), args[1].to_string()))
            } else {
                None
            }
        }
        "cpout" => {
            if args.len() == 2 {
                Some(Command::Cpout(args[0].to_string(), args[1].to_string()))
            } else {
                None
            }
        }
        "exit" | "quit" => Some(Command::Exit),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_with_and_without_arguments() {
        assert!(matches!(parse_command("ls"), Some(Command::Ls(None))));
        assert!(matches!(parse_command("ls sub"), Some(Command::Ls(Some(_)))));
        assert!(matches!(parse_command("cd"), Some(Command::Cd(None))));
        assert!(matches!(
            parse_command("  mv a b  "),
            Some(Command::Mv(_, _))
        ));
        assert!(parse_command("mv onlyone").is_none());
        assert!(parse_command("mkdir").is_none());
        assert!(parse_command("frobnicate").is_none());
        assert!(parse_command("").is_none());
    }
}
