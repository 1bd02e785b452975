//! Per-item results of provisioning and cleanup runs.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// A row with the same natural key exists from an earlier run.
    AlreadyExists,
    /// The video has no `{stem}_thumbnail.jpg` next to it.
    MissingFrame,
    /// No provisioned user is available to own the video.
    NoProvisionedUsers,
    /// The run was cancelled before this item started.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ItemOutcome {
    Created { id: i64 },
    Removed { id: i64 },
    Skipped { reason: SkipReason },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemReport {
    /// Source file name, or the email of a cleaned-up user.
    pub item: String,
    #[serde(flatten)]
    pub outcome: ItemOutcome,
    /// Recovered problems, such as a blob that could not be deleted.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ItemReport {
    pub fn new(item: impl Into<String>, outcome: ItemOutcome) -> Self {
        Self {
            item: item.into(),
            outcome,
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn skipped(item: impl Into<String>, reason: SkipReason) -> Self {
        Self::new(item, ItemOutcome::Skipped { reason })
    }

    pub fn failed(item: impl Into<String>, error: impl ToString) -> Self {
        Self::new(
            item,
            ItemOutcome::Failed {
                error: error.to_string(),
            },
        )
    }
}

/// Result of one bulk pass. Items are in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkReport {
    pub items: Vec<ItemReport>,
    pub cancelled: bool,
}

impl BulkReport {
    pub fn new(items: Vec<ItemReport>) -> Self {
        let cancelled = items
            .iter()
            .any(|i| i.outcome == ItemOutcome::Skipped { reason: SkipReason::Cancelled });
        Self { items, cancelled }
    }

    pub fn created(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Created { .. }))
    }

    pub fn removed(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Removed { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Failed { .. }))
    }

    pub fn skipped_for(&self, reason: SkipReason) -> usize {
        self.count(|o| *o == ItemOutcome::Skipped { reason })
    }

    pub fn is_clean(&self) -> bool {
        self.failed() == 0 && !self.cancelled
    }

    pub fn item(&self, name: &str) -> Option<&ItemReport> {
        self.items.iter().find(|i| i.item == name)
    }

    fn count(&self, pred: impl Fn(&ItemOutcome) -> bool) -> usize {
        self.items.iter().filter(|i| pred(&i.outcome)).count()
    }
}

/// Users pass, then videos pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProvisionReport {
    pub users: BulkReport,
    pub videos: BulkReport,
}

impl ProvisionReport {
    pub fn cancelled(&self) -> bool {
        self.users.cancelled || self.videos.cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_by_outcome() {
        let report = BulkReport::new(vec![
            ItemReport::new("a.png", ItemOutcome::Created { id: 1 }),
            ItemReport::skipped("b.png", SkipReason::AlreadyExists),
            ItemReport::failed("c.png", "boom"),
        ]);
        assert_eq!(report.created(), 1);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.failed(), 1);
        assert!(!report.cancelled);
        assert!(!report.is_clean());
    }

    #[test]
    fn cancelled_items_mark_the_report() {
        let report = BulkReport::new(vec![ItemReport::skipped("a.png", SkipReason::Cancelled)]);
        assert!(report.cancelled);
        assert_eq!(report.skipped_for(SkipReason::Cancelled), 1);
    }

    #[test]
    fn serializes_outcome_inline() {
        let item = ItemReport::skipped("clip.mp4", SkipReason::MissingFrame);
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["item"], "clip.mp4");
        assert_eq!(json["outcome"], "skipped");
        assert_eq!(json["reason"], "missing_frame");
        assert!(json.get("warnings").is_none());
    }
}
