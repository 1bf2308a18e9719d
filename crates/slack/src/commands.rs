//! Mention text grammar:
//!
//! ```text
//! command   := keyword (connective argument)*
//! connective := "at" | "in" | "for"      (whole word, any case)
//! argument  := words up to the next connective
//! ```
//!
//! Keywords are matched case-insensitively; day tokens are matched exactly.

use seafoodtruck_core::domain::DayToken;
use seafoodtruck_core::errors::CommandError;

pub const HELP_KEYWORD: &str = "help";
pub const FIND_TRUCKS_KEYWORD: &str = "find trucks";
pub const FIND_EVENTS_KEYWORD: &str = "find events";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Connective {
    At,
    In,
    For,
}

impl Connective {
    fn from_word(word: &str) -> Option<Self> {
        [("at", Self::At), ("in", Self::In), ("for", Self::For)]
            .into_iter()
            .find(|(literal, _)| word.eq_ignore_ascii_case(literal))
            .map(|(_, connective)| connective)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Argument {
    pub connective: Connective,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedCommand {
    /// Text before the first connective, trimmed but otherwise verbatim.
    pub command: String,
    pub args: Vec<Argument>,
}

impl ParsedCommand {
    pub fn argument(&self, connective: Connective) -> Option<&str> {
        self.args
            .iter()
            .find(|arg| arg.connective == connective)
            .map(|arg| arg.value.as_str())
            .filter(|value| !value.is_empty())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BotCommand {
    Help,
    FindTrucks { location: Option<String>, neighborhood: Option<String>, day: DayToken },
    FindEvents { day: DayToken },
    Unknown { keyword: String },
}

impl BotCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Help => HELP_KEYWORD,
            Self::FindTrucks { .. } => FIND_TRUCKS_KEYWORD,
            Self::FindEvents { .. } => FIND_EVENTS_KEYWORD,
            Self::Unknown { .. } => "unknown",
        }
    }
}

/// Words of `text` with their byte offsets.
fn words(text: &str) -> Vec<(usize, &str)> {
    let mut found = Vec::new();
    let mut start = None;
    for (index, ch) in text.char_indices() {
        match (ch.is_whitespace(), start) {
            (true, Some(begin)) => {
                found.push((begin, &text[begin..index]));
                start = None;
            }
            (false, None) => start = Some(index),
            _ => {}
        }
    }
    if let Some(begin) = start {
        found.push((begin, &text[begin..]));
    }
    found
}

/// Splits mention text (bot mention already stripped) into a command and
/// its connective-introduced arguments.
pub fn parse(raw: &str) -> Result<ParsedCommand, CommandError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(CommandError::EmptyInput);
    }

    let boundaries: Vec<(usize, usize, Connective)> = words(text)
        .into_iter()
        .filter_map(|(offset, word)| {
            Connective::from_word(word).map(|connective| (offset, offset + word.len(), connective))
        })
        .collect();

    let Some(&(first_start, _, _)) = boundaries.first() else {
        return Ok(ParsedCommand { command: text.to_owned(), args: Vec::new() });
    };

    let args = boundaries
        .iter()
        .enumerate()
        .map(|(index, &(_, value_start, connective))| {
            let value_end =
                boundaries.get(index + 1).map(|&(next_start, _, _)| next_start).unwrap_or(text.len());
            Argument { connective, value: text[value_start..value_end].trim().to_owned() }
        })
        .collect();

    Ok(ParsedCommand { command: text[..first_start].trim().to_owned(), args })
}

/// Lowercases and collapses whitespace so `Find   Trucks` reads as `find trucks`.
pub fn normalize_keyword(command: &str) -> String {
    command.split_whitespace().map(str::to_ascii_lowercase).collect::<Vec<_>>().join(" ")
}

/// Splits a trailing exact day literal off an argument value.
fn split_trailing_day(value: &str) -> (String, Option<DayToken>) {
    let trimmed = value.trim();
    match trimmed.rsplit_once(char::is_whitespace) {
        Some((head, last)) => match DayToken::parse(last) {
            Some(day) => (head.trim_end().to_owned(), Some(day)),
            None => (trimmed.to_owned(), None),
        },
        None => (trimmed.to_owned(), None),
    }
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

pub fn classify(parsed: &ParsedCommand) -> BotCommand {
    let keyword = normalize_keyword(&parsed.command);
    let mut keyword_words = keyword.split(' ');
    let verb = keyword_words.next().unwrap_or_default();
    let noun = keyword_words.next();
    // Day literals are case-sensitive, so read them from the raw command.
    let rest: Vec<&str> = parsed.command.split_whitespace().skip(2).collect();
    let trailing_day = match rest.as_slice() {
        [] => None,
        [single] => Some(*single),
        _ => return BotCommand::Unknown { keyword: keyword.clone() },
    };

    match (verb, noun) {
        (HELP_KEYWORD, None) => BotCommand::Help,
        ("find" | "show", Some("trucks")) => classify_find_trucks(parsed, trailing_day),
        ("find" | "show", Some("events")) => {
            let token = parsed.argument(Connective::For).or(trailing_day);
            BotCommand::FindEvents { day: DayToken::from_token(token) }
        }
        _ => BotCommand::Unknown { keyword: keyword.clone() },
    }
}

fn classify_find_trucks(parsed: &ParsedCommand, trailing_day: Option<&str>) -> BotCommand {
    let mut location = parsed.argument(Connective::At).map(str::to_owned);
    let mut neighborhood = parsed.argument(Connective::In).map(str::to_owned);
    let mut day = parsed.argument(Connective::For).or(trailing_day).and_then(DayToken::parse);

    if day.is_none() {
        let last = parsed
            .args
            .iter()
            .rev()
            .find(|arg| matches!(arg.connective, Connective::At | Connective::In));
        if let Some(last) = last {
            let (value, found) = split_trailing_day(&last.value);
            if found.is_some() {
                day = found;
                let slot = match last.connective {
                    Connective::In => &mut neighborhood,
                    _ => &mut location,
                };
                *slot = non_empty(value);
            }
        }
    }

    BotCommand::FindTrucks { location, neighborhood, day: day.unwrap_or_default() }
}

/// Parses and classifies in one step.
pub fn interpret(raw: &str) -> Result<BotCommand, CommandError> {
    parse(raw).map(|parsed| classify(&parsed))
}
