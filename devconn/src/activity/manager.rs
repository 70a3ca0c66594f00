//! Per-session activity tracking

use std::collections::HashMap;
use std::sync::Mutex;

use serde::Serialize;
use tracing::debug;

use crate::activity::strategy::{ActivityStrategy, ActivityStrategyType};

/// An activity timestamp that should be reported upstream
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityReport {
    pub key: String,
    /// Epoch milliseconds of the reported event
    pub last_activity_time: i64,
}

/// Activity of a single session under one strategy
#[derive(Debug)]
pub struct ActivityState {
    strategy: Box<dyn ActivityStrategy>,
    last_activity_time: Option<i64>,
    last_reported_time: Option<i64>,
}

impl ActivityState {
    pub fn new(strategy_type: ActivityStrategyType) -> Self {
        Self {
            strategy: strategy_type.to_strategy(),
            last_activity_time: None,
            last_reported_time: None,
        }
    }

    /// Record an event; returns its time when it must be reported now
    pub fn record(&mut self, time: i64) -> Option<i64> {
        self.last_activity_time = Some(time);
        if self.strategy.on_activity() {
            self.last_reported_time = Some(time);
            Some(time)
        } else {
            None
        }
    }

    /// Close the reporting period; returns the latest event time when it
    /// must be reported and has not been reported yet
    pub fn period_end(&mut self) -> Option<i64> {
        let report = self.strategy.on_reporting_period_end();
        let last = self.last_activity_time?;
        let unreported = self.last_reported_time.map_or(true, |reported| last > reported);
        if report && unreported {
            self.last_reported_time = Some(last);
            Some(last)
        } else {
            None
        }
    }

    pub fn last_activity_time(&self) -> Option<i64> {
        self.last_activity_time
    }
}

/// Tracks activity for many sessions with a shared strategy type
pub struct ActivityManager {
    strategy_type: ActivityStrategyType,
    sessions: Mutex<HashMap<String, ActivityState>>,
}

impl ActivityManager {
    pub fn new(strategy_type: ActivityStrategyType) -> Self {
        Self {
            strategy_type,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn strategy_type(&self) -> ActivityStrategyType {
        self.strategy_type
    }

    /// Record activity for `key`, creating its state on first use
    pub fn on_activity(&self, key: &str, time: i64) -> Option<ActivityReport> {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        let state = sessions
            .entry(key.to_string())
            .or_insert_with(|| ActivityState::new(self.strategy_type));

        state.record(time).map(|last_activity_time| ActivityReport {
            key: key.to_string(),
            last_activity_time,
        })
    }

    /// Close the reporting period for every session
    pub fn on_reporting_period_end(&self) -> Vec<ActivityReport> {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        let reports: Vec<ActivityReport> = sessions
            .iter_mut()
            .filter_map(|(key, state)| {
                state.period_end().map(|last_activity_time| ActivityReport {
                    key: key.clone(),
                    last_activity_time,
                })
            })
            .collect();
        debug!(
            "Reporting period ended for {} sessions, {} reports",
            sessions.len(),
            reports.len()
        );
        reports
    }

    /// Forget a session
    pub fn remove(&self, key: &str) -> Option<i64> {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.remove(key).and_then(|s| s.last_activity_time())
    }

    /// Get number of tracked sessions
    pub fn len(&self) -> usize {
        let sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.len()
    }

    /// Check if no session is tracked
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
