use chrono::NaiveDate;
use thiserror::Error;

/// Which upstream series a point or ordering problem belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesKind {
    Historical,
    Forecast,
}

impl std::fmt::Display for SeriesKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeriesKind::Historical => write!(f, "historical"),
            SeriesKind::Forecast => write!(f, "forecast"),
        }
    }
}

/// Recoverable failures reported by the forecast and learning engines.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    #[error("invalid point on {date}: {reason}")]
    InvalidPoint { date: NaiveDate, reason: String },

    #[error("historical series is empty")]
    EmptySeries,

    #[error("no {0} data to export")]
    EmptyData(&'static str),

    #[error("{kind} series is not strictly ascending at {date}")]
    UnsortedInput { kind: SeriesKind, date: NaiveDate },

    #[error("forecast date {date} precedes the last historical date {last_historical}")]
    ForecastBeforeHistory {
        date: NaiveDate,
        last_historical: NaiveDate,
    },

    #[error("current price is zero, change percent is undefined")]
    ZeroReferencePrice,

    #[error("sentiment score {0} is outside [-100, 100]")]
    OutOfRange(i32),

    #[error("no answer selected")]
    NoSelection,

    #[error("option {index} does not exist, question has {options} options")]
    OptionOutOfRange { index: usize, options: usize },

    #[error("cannot {action} while quiz is {state}")]
    InvalidQuizTransition {
        action: &'static str,
        state: &'static str,
    },

    #[error("module {0} does not exist")]
    UnknownModule(u32),

    #[error("lesson {lesson} does not exist in module {module}")]
    UnknownLesson { module: u32, lesson: u32 },

    #[error("invalid curriculum: {0}")]
    InvalidCurriculum(String),

    #[error("invalid learner progress: {0}")]
    InvalidProgress(String),
}
