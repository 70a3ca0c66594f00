//! Activity strategies

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Decides which activity events of a reporting period are reported
pub trait ActivityStrategy: Send + Sync + fmt::Debug {
    /// An activity event happened; `true` reports it immediately
    fn on_activity(&mut self) -> bool;

    /// The reporting period ended; `true` reports the latest event
    fn on_reporting_period_end(&mut self) -> bool;
}

/// Report every event
#[derive(Debug, Default, Clone, Copy)]
pub struct AllEventsActivityStrategy;

impl ActivityStrategy for AllEventsActivityStrategy {
    fn on_activity(&mut self) -> bool {
        true
    }

    fn on_reporting_period_end(&mut self) -> bool {
        true
    }
}

/// Report only the first event of each period
#[derive(Debug, Default)]
pub struct FirstEventActivityStrategy {
    first_event_received: bool,
}

impl ActivityStrategy for FirstEventActivityStrategy {
    fn on_activity(&mut self) -> bool {
        if self.first_event_received {
            return false;
        }
        self.first_event_received = true;
        true
    }

    fn on_reporting_period_end(&mut self) -> bool {
        self.first_event_received = false;
        false
    }
}

/// Report only the last event of each period
#[derive(Debug, Default, Clone, Copy)]
pub struct LastEventActivityStrategy;

impl ActivityStrategy for LastEventActivityStrategy {
    fn on_activity(&mut self) -> bool {
        false
    }

    fn on_reporting_period_end(&mut self) -> bool {
        true
    }
}

/// Report the first event immediately and the last one at period end
#[derive(Debug, Default)]
pub struct FirstAndLastEventActivityStrategy {
    first_event_received: bool,
}

impl ActivityStrategy for FirstAndLastEventActivityStrategy {
    fn on_activity(&mut self) -> bool {
        if self.first_event_received {
            return false;
        }
        self.first_event_received = true;
        true
    }

    fn on_reporting_period_end(&mut self) -> bool {
        self.first_event_received = false;
        true
    }
}

/// Closed set of activity strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityStrategyType {
    All,
    First,
    Last,
    FirstAndLast,
}

impl ActivityStrategyType {
    pub const VARIANTS: [ActivityStrategyType; 4] = [
        ActivityStrategyType::All,
        ActivityStrategyType::First,
        ActivityStrategyType::Last,
        ActivityStrategyType::FirstAndLast,
    ];

    /// Build the strategy for this type; stateful strategies start a fresh period
    pub fn to_strategy(self) -> Box<dyn ActivityStrategy> {
        match self {
            ActivityStrategyType::All => Box::new(AllEventsActivityStrategy),
            ActivityStrategyType::First => Box::new(FirstEventActivityStrategy::default()),
            ActivityStrategyType::Last => Box::new(LastEventActivityStrategy),
            ActivityStrategyType::FirstAndLast => {
                Box::new(FirstAndLastEventActivityStrategy::default())
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ActivityStrategyType::All => "ALL",
            ActivityStrategyType::First => "FIRST",
            ActivityStrategyType::Last => "LAST",
            ActivityStrategyType::FirstAndLast => "FIRST_AND_LAST",
        }
    }
}

impl fmt::Display for ActivityStrategyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ActivityStrategyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActivityStrategyType::VARIANTS
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Invalid activity strategy: {}", s))
    }
}
