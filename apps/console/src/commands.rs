/// One line of console input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Signup,
    Login,
    Logout,
    WhoAmI,
    Queue,
    Recommend(String),
    Clear,
    History,
    Help,
    Quit,
    Chat(String),
    Unknown(String),
    Empty,
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Command::Empty;
        }
        if !line.starts_with('/') {
            return Command::Chat(line.to_string());
        }

        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };

        match name.to_ascii_lowercase().as_str() {
            "/signup" => Command::Signup,
            "/login" => Command::Login,
            "/logout" => Command::Logout,
            "/whoami" => Command::WhoAmI,
            "/queue" => Command::Queue,
            "/recommend" => Command::Recommend(rest.to_string()),
            "/clear" => Command::Clear,
            "/history" => Command::History,
            "/help" => Command::Help,
            "/quit" | "/exit" => Command::Quit,
            _ => Command::Unknown(name.to_string()),
        }
    }
}

pub const HELP_TEXT: &str = "\
Commands:
  /signup               create an account and log in
  /login                log in with email and password
  /logout               end the session
  /whoami               show the logged-in user
  /queue                show the patient queue
  /recommend <symptoms> suggest doctors for the given symptoms
  /clear                start a new conversation
  /history              print the conversation so far
  /help                 show this help
  /quit                 exit
Anything else is sent to the AI Health Assistant.";
