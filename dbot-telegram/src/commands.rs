use teloxide::utils::command::BotCommands;

pub const START_TEXT: &str =
    "Hi! Ask me anything. When a plugin is configured I can call it to look things up for you.";
pub const HELP_TEXT: &str = "Send any message to chat.";

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Supported commands:")]
pub enum Command {
    #[command(description = "greet and show what the bot can do.")]
    Start,
    #[command(description = "show this text.")]
    Help,
    #[command(description = "forget the conversation so far.")]
    Newchat,
}

impl Command {
    pub fn help_text() -> String {
        format!("{HELP_TEXT}\n\n{}", Command::descriptions())
    }
}
