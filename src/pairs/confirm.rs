use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};

/// Yes/no gate in front of every destructive write.
pub trait Confirmer {
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

impl<C: Confirmer + ?Sized> Confirmer for &mut C {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        (**self).confirm(prompt)
    }
}

/// Only `y` (any case, surrounding whitespace ignored) counts as a yes.
pub fn is_affirmative(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("y")
}

/// Prompts on stdout and reads one line from stdin.
#[derive(Debug, Default)]
pub struct StdinConfirmer;

impl Confirmer for StdinConfirmer {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        let mut stdout = io::stdout();
        write!(stdout, "{} ", prompt)?;
        stdout.flush()?;

        let mut answer = String::new();
        io::stdin()
            .lock()
            .read_line(&mut answer)
            .context("Failed to read confirmation from stdin")?;

        // EOF reads as an empty answer, which declines
        Ok(is_affirmative(&answer))
    }
}

/// Replays canned answers; declines once they run out.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct ScriptedConfirmer {
    answers: Vec<String>,
    prompts: Vec<String>,
}

#[cfg(test)]
impl ScriptedConfirmer {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut answers: Vec<String> = answers.into_iter().map(Into::into).collect();
        answers.reverse();
        Self {
            answers,
            prompts: Vec::new(),
        }
    }

    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }
}

#[cfg(test)]
impl Confirmer for ScriptedConfirmer {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        self.prompts.push(prompt.to_string());
        Ok(self.answers.pop().map_or(false, |a| is_affirmative(&a)))
    }
}
