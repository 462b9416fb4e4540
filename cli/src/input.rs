//! Line-oriented input: slash commands and composer text.

/// What a single line of input asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputLine {
    Quit,
    Help,
    /// `/draft`: show what would be sent.
    ShowDraft,
    /// `/image <path>`: attach a local image file.
    AttachImage(String),
    /// `/paste <text>`: behave like a clipboard paste of `text`.
    Paste(String),
    RemoveImage,
    /// A line ending in `\`: append it (without the backslash) plus a newline, do not submit.
    Continue(String),
    /// Append the line and submit the composer. An empty line submits what is already there.
    Submit(String),
    UnknownCommand(String),
}

pub const HELP_TEXT: &str = "\
Type a message and press Enter to send. End a line with \\ to continue on the next line.
  /image <path>     attach an image file
  /paste <text>     paste text or an image path
  /remove-image     drop the staged image
  /draft            show the unsent message
  /quit             leave";

pub fn parse_line(line: &str) -> InputLine {
    let line = line.strip_suffix('\r').unwrap_or(line);

    if let Some(command) = line.strip_prefix('/') {
        let (name, arg) = match command.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (command.trim_end(), ""),
        };
        match name {
            "quit" | "exit" => return InputLine::Quit,
            "help" => return InputLine::Help,
            "draft" => return InputLine::ShowDraft,
            "image" if !arg.is_empty() => return InputLine::AttachImage(arg.to_string()),
            "paste" => return InputLine::Paste(arg.to_string()),
            "remove-image" => return InputLine::RemoveImage,
            // `//text` sends a literal leading slash.
            _ if name.starts_with('/') => {
                return InputLine::Submit(command.to_string());
            }
            _ => return InputLine::UnknownCommand(line.to_string()),
        }
    }

    match line.strip_suffix('\\') {
        Some(head) => InputLine::Continue(format!("{head}\n")),
        None => InputLine::Submit(line.to_string()),
    }
}
