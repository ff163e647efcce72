use crate::models::error::SError;
use crate::utils::similarity;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{BufRead, Write};
use std::rc::Rc;
use tracing::debug;

type AskFn = Box<dyn FnMut(&str) -> Option<String>>;
type EmitFn = Box<dyn FnMut(&str)>;

/// Outcome of a menu prompt. Picks are 1-based option indices in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuChoice {
    Zero,
    Picks(Vec<usize>),
}

/// The user-facing boundary: ask a line, emit a line.
///
/// Scripted answers are consumed first, in order; once they run out the
/// `ask` function is consulted. `ask` returning `None` means input is closed.
pub struct Console {
    ask: AskFn,
    emit: EmitFn,
    scripted: VecDeque<String>,
    transcript: Option<Rc<RefCell<Vec<String>>>>,
}

impl Console {
    pub fn new<A, E>(ask: A, emit: E) -> Self
    where
        A: FnMut(&str) -> Option<String> + 'static,
        E: FnMut(&str) + 'static,
    {
        Self {
            ask: Box::new(ask),
            emit: Box::new(emit),
            scripted: VecDeque::new(),
            transcript: None,
        }
    }

    /// Console bound to the process' stdin/stdout.
    pub fn stdio() -> Self {
        Self::new(
            |prompt| {
                print!("{}", prompt);
                let _ = std::io::stdout().flush();
                let mut line = String::new();
                match std::io::stdin().lock().read_line(&mut line) {
                    Ok(0) | Err(_) => None,
                    Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_owned()),
                }
            },
            |line| println!("{}", line),
        )
    }

    /// Non-interactive console answering from `answers` and recording every emitted line.
    pub fn scripted<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let transcript = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&transcript);
        let mut console = Self::new(
            |_| None,
            move |line| sink.borrow_mut().push(line.to_owned()),
        )
        .with_script(answers);
        console.transcript = Some(transcript);
        console
    }

    pub fn with_script<I, S>(mut self, answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scripted.extend(answers.into_iter().map(Into::into));
        self
    }

    /// Lines emitted so far, for consoles built with [`Console::scripted`].
    pub fn transcript(&self) -> Vec<String> {
        self.transcript
            .as_ref()
            .map(|t| t.borrow().clone())
            .unwrap_or_default()
    }

    pub fn say(&mut self, line: impl AsRef<str>) {
        (self.emit)(line.as_ref());
    }

    pub fn ask(&mut self, prompt: &str) -> Result<String, SError> {
        if let Some(answer) = self.scripted.pop_front() {
            debug!("scripted answer for {:?}: {:?}", prompt, answer);
            return Ok(answer);
        }
        (self.ask)(prompt).ok_or(SError::InputClosed)
    }

    pub fn ask_line(&mut self, prompt: &str) -> Result<String, SError> {
        Ok(self.ask(prompt)?.trim().to_owned())
    }

    /// Yes/no question. Empty input takes `default`; anything unrecognised asks again.
    pub fn confirm(&mut self, question: &str, default: bool) -> Result<bool, SError> {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        loop {
            let answer = self.ask_line(&format!("{} {} ", question, hint))?;
            match answer.to_lowercase().as_str() {
                "" => return Ok(default),
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => self.say("Please answer 'y' or 'n'."),
            }
        }
    }

    /// Shows a numbered menu and reads a choice.
    ///
    /// Numbers pick options by their 1-based index and `0` picks the zero
    /// option. Words are matched to the closest option name. With `multi`,
    /// several space-separated tokens are accepted.
    pub fn select<S: AsRef<str>>(
        &mut self,
        zero_text: &str,
        prompt: &str,
        options: &[S],
        multi: bool,
    ) -> Result<MenuChoice, SError> {
        self.say(zero_text);
        for (idx, opt) in options.iter().enumerate() {
            self.say(format!("[ {} ]\t{}", idx + 1, opt.as_ref()));
        }

        loop {
            let raw = self.ask_line(prompt)?;
            if raw.is_empty() {
                self.say("That's not it.");
                continue;
            }

            let mut notes = Vec::new();
            let picks = parse_picks(&raw, options, multi, &mut notes);
            for note in notes {
                self.say(note);
            }

            if picks.contains(&0) {
                return Ok(MenuChoice::Zero);
            }
            if !picks.is_empty() {
                return Ok(MenuChoice::Picks(picks));
            }
            self.say("Nothing valid was selected, try again.");
        }
    }
}

/// Turns raw menu input into option indices (0 = zero option), deduplicated in input order.
fn parse_picks<S: AsRef<str>>(
    raw: &str,
    options: &[S],
    multi: bool,
    notes: &mut Vec<String>,
) -> Vec<usize> {
    let tokens: Vec<&str> = if multi {
        raw.split_whitespace().collect()
    } else {
        vec![raw.trim()]
    };

    let mut picks = Vec::new();
    for token in tokens {
        let pick = match token.parse::<usize>() {
            Ok(num) if num <= options.len() => Some(num),
            Ok(num) => {
                notes.push(format!("\t[ ! ] {} is out of range and will be ignored.", num));
                None
            }
            Err(_) => match similarity::best_match(token, options) {
                Some(idx) => Some(idx + 1),
                None => {
                    notes.push(format!("\t[ ! ] '{}' not recognised; ignored.", token));
                    None
                }
            },
        };

        if let Some(p) = pick {
            if !picks.contains(&p) {
                picks.push(p);
            }
        }
    }
    picks
}
