use inquire::{Password, PasswordDisplayMode, Text};
use log::warn;
use oj_api_utils::credentials::TfaCode;

use crate::schema::ContestId;

/// Source of interactive answers.  Every prompt is rendered on stderr.
pub trait Prompter {
    fn username(&mut self) -> anyhow::Result<String>;
    fn password(&mut self) -> anyhow::Result<String>;
    fn tfa_code(&mut self) -> anyhow::Result<String>;
    fn contest_id(&mut self) -> anyhow::Result<String>;
}

pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn username(&mut self) -> anyhow::Result<String> {
        Ok(Text::new("Username:").prompt()?)
    }

    fn password(&mut self) -> anyhow::Result<String> {
        Ok(Password::new("Password:")
            .without_confirmation()
            .with_display_mode(PasswordDisplayMode::Masked)
            .prompt()?)
    }

    fn tfa_code(&mut self) -> anyhow::Result<String> {
        Ok(Text::new("2FA code:").prompt()?)
    }

    fn contest_id(&mut self) -> anyhow::Result<String> {
        Ok(Text::new("Select contest id:").prompt()?)
    }
}

/// Asks until a six-digit code is entered.
pub fn read_tfa_code(prompter: &mut impl Prompter) -> anyhow::Result<TfaCode> {
    loop {
        match prompter.tfa_code()?.parse() {
            Ok(code) => return Ok(code),
            Err(e) => warn!("{e}"),
        }
    }
}

/// Asks until one of `candidates` is entered.
pub fn select_contest(
    prompter: &mut impl Prompter,
    candidates: &[ContestId],
) -> anyhow::Result<ContestId> {
    loop {
        let input = prompter.contest_id()?;
        if !input.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }
        match input.parse() {
            Ok(id) if candidates.contains(&id) => return Ok(id),
            _ => warn!("{input:?} is not one of the listed contests"),
        }
    }
}
