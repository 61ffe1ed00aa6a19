// src/alerts.rs
//! Simulated live alerts. Each tick has a 30% chance of raising one; the
//! feed keeps the five most recent, newest first.
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::collections::VecDeque;

pub const ALERT_SYMBOLS: [&str; 5] = ["AAPL", "GOOGL", "MSFT", "TSLA", "AMZN"];
pub const MAX_ALERTS: usize = 5;
const ALERT_CHANCE: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Price,
    Volume,
    News,
    Technical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveAlert {
    pub id: String,
    pub symbol: String,
    pub message: String,
    pub kind: AlertKind,
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
}

const KINDS: [AlertKind; 4] = [
    AlertKind::Price,
    AlertKind::Volume,
    AlertKind::News,
    AlertKind::Technical,
];
const SEVERITIES: [Severity; 3] = [Severity::Low, Severity::Medium, Severity::High];

fn message<R: Rng>(rng: &mut R, kind: AlertKind, symbol: &str) -> String {
    match kind {
        AlertKind::Price => format!(
            "{} price moved {} key resistance level",
            symbol,
            if rng.gen_bool(0.5) { "above" } else { "below" }
        ),
        AlertKind::Volume => format!(
            "{} experiencing unusual volume spike (+{:.0}%)",
            symbol,
            rng.gen_range(50.0..250.0)
        ),
        AlertKind::News => format!("Breaking news may impact {} stock price", symbol),
        AlertKind::Technical => format!(
            "{} RSI indicates {} conditions",
            symbol,
            if rng.gen_bool(0.5) {
                "overbought"
            } else {
                "oversold"
            }
        ),
    }
}

pub fn generate_alert<R: Rng>(rng: &mut R, now: DateTime<Utc>) -> LiveAlert {
    let symbol = ALERT_SYMBOLS.choose(rng).copied().unwrap_or("AAPL");
    let kind = KINDS.choose(rng).copied().unwrap_or(AlertKind::News);
    let severity = SEVERITIES.choose(rng).copied().unwrap_or(Severity::Low);
    LiveAlert {
        id: format!("alert-{}-{}", now.timestamp_millis(), rng.gen::<u32>()),
        symbol: symbol.to_string(),
        message: message(rng, kind, symbol),
        kind,
        severity,
        timestamp: now,
    }
}

#[derive(Debug, Default)]
pub struct AlertFeed {
    alerts: VecDeque<LiveAlert>,
}

impl AlertFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, alert: LiveAlert) {
        self.alerts.push_front(alert);
        self.alerts.truncate(MAX_ALERTS);
    }

    /// Rolls for a new alert; returns it when one was raised.
    pub fn tick<R: Rng>(&mut self, rng: &mut R, now: DateTime<Utc>) -> Option<&LiveAlert> {
        if !rng.gen_bool(ALERT_CHANCE) {
            return None;
        }
        self.push(generate_alert(rng, now));
        self.alerts.front()
    }

    pub fn alerts(&self) -> impl Iterator<Item = &LiveAlert> {
        self.alerts.iter()
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn feed_keeps_five_newest() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut feed = AlertFeed::new();
        let mut ids = Vec::new();
        for _ in 0..8 {
            let alert = generate_alert(&mut rng, Utc::now());
            ids.push(alert.id.clone());
            feed.push(alert);
        }
        assert_eq!(feed.len(), MAX_ALERTS);
        let kept: Vec<_> = feed.alerts().map(|a| a.id.clone()).collect();
        let expected: Vec<_> = ids.iter().rev().take(MAX_ALERTS).cloned().collect();
        assert_eq!(kept, expected);
    }

    #[test]
    fn ticks_raise_alerts_sometimes() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut feed = AlertFeed::new();
        let raised = (0..200)
            .filter(|_| feed.tick(&mut rng, Utc::now()).is_some())
            .count();
        assert!(raised > 20 && raised < 120, "{}", raised);
        assert!(feed.len() <= MAX_ALERTS);
    }

    #[test]
    fn messages_mention_the_symbol() {
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..20 {
            let alert = generate_alert(&mut rng, Utc::now());
            assert!(alert.message.contains(&alert.symbol));
            assert!(ALERT_SYMBOLS.contains(&alert.symbol.as_str()));
        }
    }
}
