use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use sentinel_common::RuleConfig;

#[derive(Debug, Clone)]
struct Entry {
    config: RuleConfig,
    processed: bool,
}

/// The rules dispatched for one inbound message and which of them have
/// reported back.
#[derive(Debug, Clone)]
pub struct Correlation {
    eui: String,
    opened_at: Instant,
    entries: BTreeMap<i64, Entry>,
}

impl Correlation {
    pub fn new(eui: impl Into<String>, configs: &[RuleConfig]) -> Self {
        let entries = configs
            .iter()
            .map(|c| {
                (
                    c.id,
                    Entry {
                        config: c.clone(),
                        processed: false,
                    },
                )
            })
            .collect();
        Self {
            eui: eui.into(),
            opened_at: Instant::now(),
            entries,
        }
    }

    pub fn eui(&self) -> &str {
        &self.eui
    }

    pub fn config(&self, config_id: i64) -> Option<&RuleConfig> {
        self.entries.get(&config_id).map(|e| &e.config)
    }

    /// Returns `false` when the rule is not part of this correlation.
    pub fn mark_processed(&mut self, config_id: i64) -> bool {
        match self.entries.get_mut(&config_id) {
            Some(e) => {
                e.processed = true;
                true
            }
            None => false,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.entries.values().all(|e| e.processed)
    }

    pub fn pending(&self) -> usize {
        self.entries.values().filter(|e| !e.processed).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn age(&self) -> Duration {
        self.opened_at.elapsed()
    }
}
