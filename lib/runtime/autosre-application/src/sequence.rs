//! Monotonic id source. Ids are never reused within a snapshot lineage.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdSequence {
    next: u64,
}

impl IdSequence {
    pub fn new(next: u64) -> Self {
        Self { next: next.max(1) }
    }

    pub fn peek(&self) -> u64 {
        self.next
    }

    fn bump(&mut self) -> u64 {
        let value = self.next;
        self.next = self.next.saturating_add(1);
        value
    }

    pub fn alert_id(&mut self, metric_id: &str) -> String {
        format!("alert-{:06}-{metric_id}", self.bump())
    }

    pub fn remediation_id(&mut self) -> String {
        format!("rem-{:06}", self.bump())
    }

    /// Make sure ids restored from a snapshot are never handed out again.
    pub fn observe(&mut self, id: &str) {
        let seq = id
            .split('-')
            .nth(1)
            .and_then(|part| part.parse::<u64>().ok());
        if let Some(seq) = seq {
            self.next = self.next.max(seq.saturating_add(1));
        }
    }
}

impl Default for IdSequence {
    fn default() -> Self {
        Self::new(1)
    }
}

/// Postmortems share the sequence number of the remediation that produced them.
pub fn postmortem_id(remediation_id: &str) -> String {
    match remediation_id.strip_prefix("rem-") {
        Some(seq) => format!("pm-{seq}"),
        None => format!("pm-{remediation_id}"),
    }
}
