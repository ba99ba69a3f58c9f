use crate::model::memory::MemoryStore;

/// Builds the prompts sent to the model.
/// Only formats text: no networking, no decoding.
pub struct PromptBuilder;

impl PromptBuilder {
    /// Three candidate characters, settings or motivations.
    pub fn initial_options(context: &str, option_type: &str) -> String {
        let mut prompt = String::new();

        if !context.trim().is_empty() {
            prompt.push_str("Given the context:\n");
            prompt.push_str(context);
            prompt.push_str("\n\n");
        }

        prompt.push_str(&format!(
            "Using an emoji as inspiration, generate 3 compelling options for {option_type} \
to start a fun, relatable, coherent and thought-provoking storytelling game.\n"
        ));
        prompt.push_str(
            "Draw on philosophical ideas for depth, but never name authors or their exact concepts.\n\
Use a modern, vivid style: names, traits, beliefs, expressive adjectives.\n\
Each option must be at most 20 words.\n",
        );
        push_style_rules(&mut prompt);
        push_choice_format(&mut prompt, &format!("\"{option_type}\""));

        prompt
    }

    /// Three options for the next turn.
    pub fn choices(store: &MemoryStore) -> String {
        let mut prompt = String::new();

        prompt.push_str(&format!("Story summary: {}\n\n", store.describe("plot")));
        push_story_state(&mut prompt, store, false);

        prompt.push_str(
            "Generate 3 interesting and distinct choices for the next stage of the story.\n\n\
Each choice picks one of these event types, preferring the most relevant:\n\
character development, emotion or mental model, key reveal, dialogue that drives action, \
change of setting, character encounter, moment of crisis, twist, new conflict, \
resolution of a conflict, decision or turning point, change of perspective.\n\n\
Rules:\n\
- Write for a college-age reader.\n\
- Stay consistent with the character, setting, motivation, plot and past actions.\n\
- Keep fantastical elements plausible; explain any new element inside the choice.\n\
- Add concrete details (names, adjectives, natural events) the player won't predict.\n\
- Make clear whether the choice is an action by the character or a change in the world.\n\
- Keep each choice under 15 words and start it with a fitting emoji.\n\
- Leave room for a satisfying ending.\n",
        );
        push_style_rules(&mut prompt);
        push_choice_format(&mut prompt, "the event type you picked");

        prompt
    }

    pub fn question(store: &MemoryStore, question: &str) -> String {
        let mut prompt = String::new();

        push_story_state(&mut prompt, store, true);
        prompt.push_str("Answer the following question about the story above in under 150 words.\n");
        prompt.push_str(&format!("Question: {question}\n\n"));
        prompt.push_str("Respond with JSON: {\"answer\": string}\n");

        prompt
    }

    pub fn consequence(store: &MemoryStore, action: &str) -> String {
        let mut prompt = String::new();

        prompt.push_str("Generate the consequence of this action in the story game.\n");
        prompt.push_str(&format!("Action: {action}\n\n"));
        push_story_state(&mut prompt, store, true);

        prompt.push_str(
            "Be creative but causal and realistic, and respect past actions.\n\n\
Respond with JSON containing:\n\
- choice: a short description of what the player chose\n\
- consequence: what happens next, under 100 words\n\
- prose: the whole story so far as a short story, including this consequence. \
Keep every key detail and stay consistent with earlier events.\n\
- plot: a short summary of the plot based on the prose\n",
        );

        prompt
    }
}

fn push_story_state(prompt: &mut String, store: &MemoryStore, include_plot: bool) {
    prompt.push_str(&format!("Character: {}\n", store.describe("character")));
    prompt.push_str(&format!("Setting: {}\n", store.describe("setting")));
    prompt.push_str(&format!("Motivation: {}\n", store.describe("motivation")));
    if include_plot {
        prompt.push_str(&format!("Plot: {}\n", store.describe("plot")));
    }
    prompt.push_str(&format!("Story so far: {}\n\n", store.describe("prose")));
}

fn push_style_rules(prompt: &mut String) {
    prompt.push_str(
        "- Be relatable, realistic and grounded in the real world.\n\
- Use simple language.\n\n",
    );
}

fn push_choice_format(prompt: &mut String, choice_type: &str) {
    prompt.push_str(&format!(
        "Respond with JSON: {{\"choices\": [{{\"emoji\": string, \"name\": string, \
\"choice\": string, \"choice_type\": string}}]}} with exactly 3 entries. \
Set choice_type to {choice_type}.\n"
    ));
}
