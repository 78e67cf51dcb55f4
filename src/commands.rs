/// Outcome of interpreting a line submitted in the chat view.
#[derive(Debug, PartialEq, Eq)]
pub enum CommandResult {
    /// Nothing to do (blank input).
    Continue,
    /// Terminate the session without contacting the API.
    Exit,
    /// Forward the (trimmed) text as a chat message.
    ProcessAsMessage(String),
}

pub fn process_input(input: &str) -> CommandResult {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return CommandResult::Continue;
    }
    if trimmed.eq_ignore_ascii_case("exit") {
        return CommandResult::Exit;
    }
    CommandResult::ProcessAsMessage(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_is_case_insensitive() {
        assert_eq!(process_input("exit"), CommandResult::Exit);
        assert_eq!(process_input("EXIT"), CommandResult::Exit);
        assert_eq!(process_input("Exit"), CommandResult::Exit);
    }

    #[test]
    fn exit_ignores_surrounding_whitespace() {
        assert_eq!(process_input("  exit  "), CommandResult::Exit);
    }

    #[test]
    fn blank_input_is_ignored() {
        assert_eq!(process_input(""), CommandResult::Continue);
        assert_eq!(process_input("   "), CommandResult::Continue);
    }

    #[test]
    fn ordinary_text_is_forwarded_trimmed() {
        assert_eq!(
            process_input("  hello bot  "),
            CommandResult::ProcessAsMessage("hello bot".to_string())
        );
    }

    #[test]
    fn text_containing_exit_is_not_a_command() {
        assert_eq!(
            process_input("exit strategy"),
            CommandResult::ProcessAsMessage("exit strategy".to_string())
        );
    }
}
