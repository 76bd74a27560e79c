use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::alert::{Alert, Severity};

/// Inclusive time-of-day window, evaluated in UTC. A window whose start
/// lies after its end spans midnight (22:00-06:00 matches 23:30).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    start: NaiveTime,
    end: NaiveTime,
}

impl TimeWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, t: NaiveTime) -> bool {
        if self.start <= self.end {
            self.start <= t && t <= self.end
        } else {
            t >= self.start || t <= self.end
        }
    }
}

/// One suppression rule. Absent clauses are skipped, present clauses are
/// ANDed; the rule set as a whole is OR'd by [`first_match`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuppressionRule {
    name: String,
    window: Option<TimeWindow>,
    categories: Option<Vec<String>>,
    sources: Option<Vec<String>>,
    severities: Option<Vec<Severity>>,
}

impl SuppressionRule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            window: None,
            categories: None,
            sources: None,
            severities: None,
        }
    }

    pub fn with_window(mut self, window: TimeWindow) -> Self {
        self.window = Some(window);
        self
    }

    pub fn with_categories(mut self, categories: Vec<String>) -> Self {
        self.categories = Some(categories);
        self
    }

    pub fn with_sources(mut self, sources: Vec<String>) -> Self {
        self.sources = Some(sources);
        self
    }

    pub fn with_severities(mut self, severities: Vec<Severity>) -> Self {
        self.severities = Some(severities);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn matches(&self, alert: &Alert) -> bool {
        if let Some(window) = &self.window {
            if !window.contains(alert.created_at().time()) {
                return false;
            }
        }
        if let Some(categories) = &self.categories {
            if !categories.iter().any(|c| c == alert.category()) {
                return false;
            }
        }
        if let Some(sources) = &self.sources {
            if !sources.iter().any(|s| s == alert.source()) {
                return false;
            }
        }
        if let Some(severities) = &self.severities {
            if !severities.contains(&alert.severity()) {
                return false;
            }
        }
        true
    }
}

/// First rule whose present clauses all pass, or None. Short-circuits.
pub fn first_match<'r>(rules: &'r [SuppressionRule], alert: &Alert) -> Option<&'r SuppressionRule> {
    rules.iter().find(|rule| rule.matches(alert))
}
