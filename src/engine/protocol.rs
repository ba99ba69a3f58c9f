use crate::model::story::Choice;

/// Where the game loop is. Each call to `Engine::step` consumes one phase
/// and returns the next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Choosing character, setting and motivation. Fresh games only.
    Setup,
    /// Fetch a new set of choices and advance the turn counter.
    TurnStart,
    AwaitingChoice { choices: Vec<Choice> },
    /// `choices` is kept so a failed generation can offer the same set again.
    ResolvingConsequence { action: String, choices: Vec<Choice> },
    AnsweringQuestion { question: String },
    ShowingHelp,
    Quit,
}

/// Whether to keep going after a recoverable failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Player input at the per-turn menu. `q` never gets here: the console
/// turns it into a quit signal first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `1`, `2` or `3`.
    Pick(usize),
    /// `4`: type a custom action.
    Custom,
    Help,
    FullStory,
    /// `m` or an empty line.
    More,
    Question(String),
}

pub fn parse_command(input: &str) -> Command {
    match input.trim() {
        "1" => Command::Pick(1),
        "2" => Command::Pick(2),
        "3" => Command::Pick(3),
        "4" => Command::Custom,
        "h" => Command::Help,
        "f" => Command::FullStory,
        "m" | "" => Command::More,
        other => Command::Question(other.to_string()),
    }
}

/// Player input while choosing character, setting or motivation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupPick {
    Offered(usize),
    /// `4`: ask for the text separately.
    TypeOwn,
    Text(String),
    Empty,
}

pub fn parse_setup_pick(input: &str) -> SetupPick {
    match input.trim() {
        "" => SetupPick::Empty,
        "1" => SetupPick::Offered(1),
        "2" => SetupPick::Offered(2),
        "3" => SetupPick::Offered(3),
        "4" => SetupPick::TypeOwn,
        text => SetupPick::Text(text.to_string()),
    }
}
