//! Ranked alert stream with filtering and cross-tick selection.
//!
//! Each tick replaces the alert and conflict sets wholesale. Selection is
//! kept as identifiers (pair key, alert id) and re-resolved against the new
//! sets, never as references into the previous tick.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::alert::{Alert, AlertKind, Severity};
use crate::conflict::Conflict;
use crate::types::PairKey;

// ---------------------------------------------------------------------------
// Filter and selection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertFilter {
    pub enabled: BTreeSet<AlertKind>,
    pub min_severity: Severity,
}

impl AlertFilter {
    pub fn allows(&self, alert: &Alert) -> bool {
        self.enabled.contains(&alert.kind()) && alert.severity >= self.min_severity
    }

    pub fn set_kind(&mut self, kind: AlertKind, enabled: bool) {
        if enabled {
            self.enabled.insert(kind);
        } else {
            self.enabled.remove(&kind);
        }
    }
}

impl Default for AlertFilter {
    fn default() -> Self {
        AlertFilter {
            enabled: AlertKind::ALL.into_iter().collect(),
            min_severity: Severity::Info,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub conflict: Option<PairKey>,
    pub alert: Option<String>,
}

// ---------------------------------------------------------------------------
// Stream
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct AlertStream {
    filter: AlertFilter,
    alerts: Vec<Alert>,
    conflicts: Vec<Conflict>,
    visible: Vec<Alert>,
    visible_conflicts: Vec<Conflict>,
    selection: Selection,
}

impl AlertStream {
    pub fn new(filter: AlertFilter) -> Self {
        AlertStream {
            filter,
            ..Default::default()
        }
    }

    /// Replace this tick's alerts and conflicts, then refilter and reconcile
    /// the selection.
    pub fn publish(&mut self, mut alerts: Vec<Alert>, conflicts: Vec<Conflict>) {
        // Highest severity first; equal severities keep synthesis order
        alerts.sort_by(|a, b| b.severity.cmp(&a.severity));
        self.alerts = dedup_separation(alerts);

        let mut seen = HashSet::new();
        self.conflicts = conflicts
            .into_iter()
            .filter(|c| seen.insert(c.pair.clone()))
            .collect();

        self.refresh();
    }

    fn refresh(&mut self) {
        self.visible = self
            .alerts
            .iter()
            .filter(|a| self.filter.allows(a))
            .cloned()
            .collect();

        let mut visible_conflicts: Vec<Conflict> =
            self.visible.iter().filter_map(|a| a.conflict()).cloned().collect();
        visible_conflicts.sort_by(|a, b| {
            a.first_breach_s
                .total_cmp(&b.first_breach_s)
                .then(a.min_h_nm.total_cmp(&b.min_h_nm))
                .then_with(|| a.pair.cmp(&b.pair))
        });
        self.visible_conflicts = visible_conflicts;

        self.reconcile();
    }

    fn reconcile(&mut self) {
        let still_present = self
            .selection
            .conflict
            .as_ref()
            .is_some_and(|key| self.visible_conflicts.iter().any(|c| &c.pair == key));
        if !still_present {
            let fallback = self.visible_conflicts.first().map(|c| c.pair.clone());
            if fallback != self.selection.conflict {
                debug!(from = ?self.selection.conflict, to = ?fallback, "conflict selection moved");
            }
            self.selection.conflict = fallback;
        }

        if let Some(id) = &self.selection.alert {
            if !self.visible.iter().any(|a| &a.id == id) {
                self.selection.alert = None;
            }
        }
    }

    // -- accessors ----------------------------------------------------------

    /// All alerts of this tick, ranked, before filtering.
    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn visible_alerts(&self) -> &[Alert] {
        &self.visible
    }

    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    /// Conflicts whose separation alert passes the filter, most urgent first.
    pub fn visible_conflicts(&self) -> &[Conflict] {
        &self.visible_conflicts
    }

    pub fn filter(&self) -> &AlertFilter {
        &self.filter
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selected_conflict(&self) -> Option<&Conflict> {
        let key = self.selection.conflict.as_ref()?;
        self.visible_conflicts.iter().find(|c| &c.pair == key)
    }

    pub fn selected_alert(&self) -> Option<&Alert> {
        let id = self.selection.alert.as_ref()?;
        self.visible.iter().find(|a| &a.id == id)
    }

    // -- mutators -----------------------------------------------------------

    pub fn set_filter(&mut self, filter: AlertFilter) {
        self.filter = filter;
        self.refresh();
    }

    pub fn set_kind_enabled(&mut self, kind: AlertKind, enabled: bool) {
        self.filter.set_kind(kind, enabled);
        self.refresh();
    }

    pub fn set_min_severity(&mut self, severity: Severity) {
        self.filter.min_severity = severity;
        self.refresh();
    }

    /// Select a visible conflict. Returns false if the pair is not visible.
    pub fn select_conflict(&mut self, key: &PairKey) -> bool {
        if !self.visible_conflicts.iter().any(|c| &c.pair == key) {
            return false;
        }
        self.selection.conflict = Some(key.clone());
        true
    }

    /// Drop the conflict selection until the next publish re-resolves it.
    pub fn clear_conflict_selection(&mut self) {
        self.selection.conflict = None;
    }

    /// Select a visible alert; a separation alert also selects its conflict.
    pub fn select_alert(&mut self, id: &str) -> bool {
        let pair = match self.visible.iter().find(|a| a.id == id) {
            Some(alert) => alert.conflict().map(|c| c.pair.clone()),
            None => return false,
        };
        self.selection.alert = Some(id.to_string());
        if let Some(pair) = pair {
            self.selection.conflict = Some(pair);
        }
        true
    }

    pub fn clear_alert_selection(&mut self) {
        self.selection.alert = None;
    }
}

/// Keep only the first separation alert per unordered pair.
fn dedup_separation(alerts: Vec<Alert>) -> Vec<Alert> {
    let mut seen = HashSet::new();
    alerts
        .into_iter()
        .filter(|a| match a.conflict() {
            Some(c) => seen.insert(c.pair.clone()),
            None => true,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
