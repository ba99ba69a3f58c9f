use std::path::{Path, PathBuf};

use serde_json::{json, Value};

use crate::engine::llm_client::LlmBackend;
use crate::engine::narrator::Narrator;
use crate::engine::protocol::{parse_command, parse_setup_pick, Command, Flow, Phase, SetupPick};
use crate::error::{GameError, GenerationError, InvalidInputError};
use crate::model::game_save::{load_story, save_story};
use crate::model::memory::MemoryStore;
use crate::model::story::{ActionLogEntry, Choice, Consequence, QuestionLogEntry};
use crate::ui::console::{Console, Input};

/// Chosen in this order; each later list is generated with the earlier picks as context.
pub const SETUP_OPTIONS: [&str; 3] = ["character", "setting", "motivation"];

const MAX_OFFERED: usize = 3;

const WELCOME: &str = "Welcome to GameGirl - The stories we tell ourselves!\nPress q to quit.";
const FAREWELL: &str = "Thank you for playing GameGirl!";
const HELP: &str = "\nType for questions\nf for full story\nm for more choices\nq to quit\n";

/// Runs the story: owns the memory store and moves through [`Phase`]s until quit.
pub struct Engine<B, C> {
    narrator: Narrator<B>,
    console: C,
    store: MemoryStore,
    save_path: PathBuf,
    turn: u64,
    resumed: bool,
}

impl<B: LlmBackend, C: Console> Engine<B, C> {
    /// A fresh game that will be saved to `save_path`.
    pub fn new(narrator: Narrator<B>, console: C, save_path: PathBuf) -> Self {
        Self {
            narrator,
            console,
            store: MemoryStore::new(),
            save_path,
            turn: 0,
            resumed: false,
        }
    }

    /// Continue the game saved at `save_path`. Setup is skipped.
    pub fn resume(narrator: Narrator<B>, console: C, save_path: PathBuf) -> Result<Self, GameError> {
        let mut engine = Self::new(narrator, console, save_path);
        engine.store.replace_with(load_story(&engine.save_path)?);
        engine.turn = engine.store.read("turn").and_then(Value::as_u64).unwrap_or(0);
        engine.resumed = true;
        tracing::info!(turn = engine.turn, version = engine.store.latest_version(), "resuming story");
        Ok(engine)
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    pub fn narrator(&self) -> &Narrator<B> {
        &self.narrator
    }

    pub fn save_path(&self) -> &Path {
        &self.save_path
    }

    pub fn turn(&self) -> u64 {
        self.turn
    }

    /// Plays until the player quits.
    pub fn run(&mut self) -> Result<(), GameError> {
        let mut phase = if self.resumed {
            Phase::TurnStart
        } else {
            self.console.println(WELCOME)?;
            Phase::Setup
        };

        while phase != Phase::Quit {
            phase = self.step(phase)?;
        }

        tracing::info!(turn = self.turn, "player quit");
        self.console.println(FAREWELL)?;
        Ok(())
    }

    /// One transition of the turn state machine.
    pub fn step(&mut self, phase: Phase) -> Result<Phase, GameError> {
        match phase {
            Phase::Setup => self.setup(),
            Phase::TurnStart => self.start_turn(),
            Phase::AwaitingChoice { choices } => self.await_choice(choices),
            Phase::ResolvingConsequence { action, choices } => self.resolve(action, choices),
            Phase::AnsweringQuestion { question } => self.answer(question),
            Phase::ShowingHelp => self.show_help(),
            Phase::Quit => Ok(Phase::Quit),
        }
    }

    fn setup(&mut self) -> Result<Phase, GameError> {
        for option_type in SETUP_OPTIONS {
            let context = if option_type == "character" {
                String::new()
            } else {
                self.store.snapshot_json()
            };

            let Some(chosen) = self.choose_option(&context, option_type)? else {
                return Ok(Phase::Quit);
            };
            self.store.write(option_type, serde_json::to_value(&chosen)?);
        }

        self.store.write("actions", json!([]));
        self.store.write("turn", json!(0));
        self.turn = 0;
        self.persist()?;

        tracing::info!(path = %self.save_path.display(), "new story set up");
        Ok(Phase::TurnStart)
    }

    /// `None` means the player quit.
    fn choose_option(&mut self, context: &str, option_type: &str) -> Result<Option<Choice>, GameError> {
        let mut options = loop {
            match self.narrator.initial_options(context, option_type) {
                Ok(options) => break options,
                Err(e) => {
                    if self.generation_failed(&e)? == Flow::Quit {
                        return Ok(None);
                    }
                }
            }
        };
        options.truncate(MAX_OFFERED);

        self.console.println(&format!("\nChoose your {option_type}:"))?;
        for (i, option) in options.iter().enumerate() {
            self.console.println(&format!(
                "{}. {} - {} - {}",
                i + 1,
                option.emoji,
                option.name,
                option.choice
            ))?;
        }
        self.console.println(&format!("4. Type your own {option_type}"))?;

        let prompt = format!("Pick your {option_type} (1-3) or type your own {option_type}: ");
        loop {
            let Input::Line(line) = self.console.prompt(&prompt)? else {
                return Ok(None);
            };

            match parse_setup_pick(&line) {
                SetupPick::Offered(n) => match options.get(n - 1) {
                    Some(option) => return Ok(Some(option.clone())),
                    None => self.invalid(InvalidInputError::ChoiceOutOfRange {
                        pick: n,
                        offered: options.len(),
                    })?,
                },
                SetupPick::TypeOwn => {
                    let text = self.read_text(&format!("Type your own {option_type}: "))?;
                    return Ok(text.map(Choice::custom));
                }
                SetupPick::Text(text) => return Ok(Some(Choice::custom(text))),
                SetupPick::Empty => self.invalid(InvalidInputError::EmptyText)?,
            }
        }
    }

    fn start_turn(&mut self) -> Result<Phase, GameError> {
        let plot = self.store.read_str("plot");
        if plot.is_empty() {
            self.console.println("\nWhat's your next move?\n")?;
        } else {
            self.console.println(&format!("\nStory summary so far: \n{plot}"))?;
        }

        let mut choices = match self.narrator.choices(&self.store) {
            Ok(choices) => choices,
            Err(e) => {
                return Ok(match self.generation_failed(&e)? {
                    Flow::Continue => Phase::TurnStart,
                    Flow::Quit => Phase::Quit,
                })
            }
        };
        choices.truncate(MAX_OFFERED);

        // Every pass through here counts as a turn, including help, full-story
        // and more-choices detours.
        self.turn += 1;
        tracing::info!(turn = self.turn, offered = choices.len(), "turn started");

        self.show_choices(&choices)?;
        Ok(Phase::AwaitingChoice { choices })
    }

    fn show_choices(&mut self, choices: &[Choice]) -> Result<(), GameError> {
        for (i, choice) in choices.iter().enumerate() {
            self.console.println(&format!(
                "{}. {} - {} - {} ({})",
                i + 1,
                choice.emoji,
                choice.name,
                choice.choice,
                choice.choice_type
            ))?;
        }
        self.console.println("4. Custom event")?;
        Ok(())
    }

    fn await_choice(&mut self, choices: Vec<Choice>) -> Result<Phase, GameError> {
        let Input::Line(line) = self.console.prompt("Enter your choice (1-4) or h for help: ")? else {
            return Ok(Phase::Quit);
        };

        match parse_command(&line) {
            Command::Help => Ok(Phase::ShowingHelp),
            Command::FullStory => {
                let prose = self.store.read_str("prose").to_string();
                self.console.println(&format!("\nStory so far: \n{prose}"))?;
                Ok(Phase::TurnStart)
            }
            Command::More => Ok(Phase::TurnStart),
            Command::Pick(n) => match choices.get(n - 1).map(|c| c.choice.clone()) {
                Some(action) => Ok(Phase::ResolvingConsequence { action, choices }),
                None => {
                    self.invalid(InvalidInputError::ChoiceOutOfRange {
                        pick: n,
                        offered: choices.len(),
                    })?;
                    Ok(Phase::AwaitingChoice { choices })
                }
            },
            Command::Custom => Ok(match self.read_text("Enter your custom action: ")? {
                Some(action) => Phase::ResolvingConsequence { action, choices },
                None => Phase::Quit,
            }),
            Command::Question(question) => Ok(Phase::AnsweringQuestion { question }),
        }
    }

    fn resolve(&mut self, action: String, choices: Vec<Choice>) -> Result<Phase, GameError> {
        match self.narrator.consequence(&self.store, &action) {
            Ok(consequence) => {
                self.apply_consequence(&action, consequence)?;
                Ok(Phase::TurnStart)
            }
            Err(e) => match self.generation_failed(&e)? {
                Flow::Continue => {
                    self.show_choices(&choices)?;
                    Ok(Phase::AwaitingChoice { choices })
                }
                Flow::Quit => Ok(Phase::Quit),
            },
        }
    }

    fn apply_consequence(&mut self, action: &str, consequence: Consequence) -> Result<(), GameError> {
        let Consequence {
            choice,
            consequence,
            prose,
            plot,
        } = consequence;

        let choice = if choice.trim().is_empty() {
            action.to_string()
        } else {
            choice
        };
        if !consequence.is_empty() {
            self.console.println(&format!("\n{consequence}"))?;
        }

        let entry = ActionLogEntry {
            turn_sequence: self.turn,
            choice,
            consequence,
        };
        self.store.append_to_list("actions", serde_json::to_value(&entry)?);
        self.store.update("prose", Value::String(prose));
        self.store.update("plot", Value::String(plot));
        self.store.update("turn", json!(self.turn));
        self.persist()?;

        tracing::info!(turn = self.turn, version = self.store.latest_version(), "consequence applied");
        Ok(())
    }

    fn answer(&mut self, question: String) -> Result<Phase, GameError> {
        let answer = match self.narrator.answer(&self.store, &question) {
            Ok(answer) => answer,
            Err(e) => {
                return Ok(match self.generation_failed(&e)? {
                    Flow::Continue => Phase::AnsweringQuestion { question },
                    Flow::Quit => Phase::Quit,
                })
            }
        };

        self.console.println(&format!("\nQuestion: {question}\nAnswer: {answer}"))?;
        let entry = QuestionLogEntry { question, answer };
        self.store.append_to_list("user_questions", serde_json::to_value(&entry)?);
        self.persist()?;

        loop {
            let Input::Line(line) = self
                .console
                .prompt("Type your question for analysis\nEnter c to continue:\n")?
            else {
                return Ok(Phase::Quit);
            };

            if line == "c" {
                return Ok(Phase::TurnStart);
            }
            if line.is_empty() {
                self.invalid(InvalidInputError::EmptyText)?;
                continue;
            }
            return Ok(Phase::AnsweringQuestion { question: line });
        }
    }

    /// The extra line is read and thrown away; the turn already advanced.
    fn show_help(&mut self) -> Result<Phase, GameError> {
        Ok(match self.console.prompt(HELP)? {
            Input::Line(_) => Phase::TurnStart,
            Input::Quit => Phase::Quit,
        })
    }

    /// Non-empty text, or `None` if the player quit.
    fn read_text(&mut self, prompt: &str) -> Result<Option<String>, GameError> {
        loop {
            match self.console.prompt(prompt)? {
                Input::Quit => return Ok(None),
                Input::Line(text) if text.is_empty() => self.invalid(InvalidInputError::EmptyText)?,
                Input::Line(text) => return Ok(Some(text)),
            }
        }
    }

    fn invalid(&mut self, err: InvalidInputError) -> Result<(), GameError> {
        tracing::warn!(error = %err, "invalid input");
        self.console.println(&err.to_string())?;
        Ok(())
    }

    /// Reports a failed generation and waits for the player to retry or quit.
    fn generation_failed(&mut self, err: &GenerationError) -> Result<Flow, GameError> {
        tracing::error!(error = %err, "generation failed");
        self.console.println(&format!("\nThe storyteller is stuck: {err}"))?;
        Ok(match self.console.prompt("Press Enter to try again (q to quit): ")? {
            Input::Line(_) => Flow::Continue,
            Input::Quit => Flow::Quit,
        })
    }

    fn persist(&self) -> Result<(), GameError> {
        save_story(&self.store, &self.save_path)?;
        Ok(())
    }
}
