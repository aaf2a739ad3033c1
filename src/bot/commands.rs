/// Comandos de texto reconocidos por el bot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Join,
    /// Argumento tal cual lo escribió el usuario (puede estar vacío)
    Play(String),
    Queue,
    Skip,
    Leave,
    Help,
}

impl Command {
    /// Parses `<prefix><keyword> [argument]`.
    ///
    /// The keyword is case-insensitive and must be the whole first token;
    /// anything else yields `None` and is ignored by the bot.
    pub fn parse(prefix: &str, content: &str) -> Option<Self> {
        let content = content.trim();
        let (head, rest) = content
            .split_once(char::is_whitespace)
            .unwrap_or((content, ""));

        let keyword = head.strip_prefix(prefix)?.to_lowercase();

        let command = match keyword.as_str() {
            "join" | "dentro" => Command::Join,
            "play" => Command::Play(rest.trim().to_string()),
            "queue" | "fila" => Command::Queue,
            "skip" | "pular" => Command::Skip,
            "leave" | "tchau" => Command::Leave,
            "help" | "ajuda" => Command::Help,
            _ => return None,
        };

        Some(command)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Join => "join",
            Command::Play(_) => "play",
            Command::Queue => "queue",
            Command::Skip => "skip",
            Command::Leave => "leave",
            Command::Help => "help",
        }
    }
}
