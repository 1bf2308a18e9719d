use chrono::{Days, Local, NaiveDate};
use serde::{Deserialize, Serialize};

pub const TODAY: &str = "today";
pub const TOMORROW: &str = "tomorrow";

/// Relative day selector accepted in chat commands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayToken {
    #[default]
    Today,
    Tomorrow,
}

impl DayToken {
    /// Exact, case-sensitive match against the two recognized literals.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            TODAY => Some(Self::Today),
            TOMORROW => Some(Self::Tomorrow),
            _ => None,
        }
    }

    /// Anything absent or unrecognized means today.
    pub fn from_token(token: Option<&str>) -> Self {
        token.and_then(Self::parse).unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Today => TODAY,
            Self::Tomorrow => TOMORROW,
        }
    }

    pub fn resolve(self, today: NaiveDate) -> NaiveDate {
        match self {
            Self::Today => today,
            Self::Tomorrow => today.checked_add_days(Days::new(1)).unwrap_or(today),
        }
    }

    /// Resolves against the host clock, not the display timezone.
    pub fn resolve_local(self) -> NaiveDate {
        self.resolve(Local::now().date_naive())
    }
}

/// `YYYY-MM-DD` form used in API query strings.
pub fn query_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

impl std::fmt::Display for DayToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
