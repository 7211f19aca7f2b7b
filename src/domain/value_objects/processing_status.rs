use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProcessingStatus {
    Pending,
    Processing,
    Completed,
    Failed(String),
}

impl ProcessingStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, ProcessingStatus::Pending)
    }

    pub fn is_processing(&self) -> bool {
        matches!(self, ProcessingStatus::Processing)
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, ProcessingStatus::Completed)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ProcessingStatus::Failed(_))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProcessingStatus::Completed | ProcessingStatus::Failed(_)
        )
    }

    pub fn can_transition_to(&self, new_status: &ProcessingStatus) -> bool {
        match (self, new_status) {
            (ProcessingStatus::Pending, ProcessingStatus::Processing) => true,
            (ProcessingStatus::Processing, ProcessingStatus::Completed) => true,
            (ProcessingStatus::Processing, ProcessingStatus::Failed(_)) => true,
            // A queued retry re-runs a document whose previous attempt failed.
            (ProcessingStatus::Failed(_), ProcessingStatus::Processing) => true,
            // Explicit retry resets to pending.
            (ProcessingStatus::Failed(_), ProcessingStatus::Pending) => true,
            _ => false,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            ProcessingStatus::Failed(error) => Some(error),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Pending => "pending",
            ProcessingStatus::Processing => "processing",
            ProcessingStatus::Completed => "completed",
            ProcessingStatus::Failed(_) => "failed",
        }
    }

    pub fn from_parts(status: &str, error_message: Option<&str>) -> Result<Self, String> {
        match status.to_lowercase().as_str() {
            "pending" => Ok(ProcessingStatus::Pending),
            "processing" => Ok(ProcessingStatus::Processing),
            "completed" => Ok(ProcessingStatus::Completed),
            "failed" => Ok(ProcessingStatus::Failed(
                error_message.unwrap_or("Unknown error").to_string(),
            )),
            _ => Err(format!("Invalid processing status: {}", status)),
        }
    }
}

impl Default for ProcessingStatus {
    fn default() -> Self {
        ProcessingStatus::Pending
    }
}

impl std::fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_checks() {
        let pending = ProcessingStatus::Pending;
        let processing = ProcessingStatus::Processing;
        let completed = ProcessingStatus::Completed;
        let failed = ProcessingStatus::Failed("error".to_string());

        assert!(pending.is_pending());
        assert!(processing.is_processing());
        assert!(completed.is_completed());
        assert!(failed.is_failed());

        assert!(!pending.is_terminal());
        assert!(!processing.is_terminal());
        assert!(completed.is_terminal());
        assert!(failed.is_terminal());
    }

    #[test]
    fn test_transitions() {
        let pending = ProcessingStatus::Pending;
        let processing = ProcessingStatus::Processing;
        let completed = ProcessingStatus::Completed;
        let failed = ProcessingStatus::Failed("error".to_string());

        assert!(pending.can_transition_to(&processing));
        assert!(processing.can_transition_to(&completed));
        assert!(processing.can_transition_to(&failed));
        assert!(failed.can_transition_to(&pending));
        assert!(failed.can_transition_to(&processing));

        assert!(!pending.can_transition_to(&completed));
        assert!(!completed.can_transition_to(&processing));
        assert!(!completed.can_transition_to(&pending));
        assert!(!failed.can_transition_to(&completed));
    }

    #[test]
    fn test_string_round_trip() {
        let failed = ProcessingStatus::Failed("boom".to_string());
        assert_eq!(failed.as_str(), "failed");

        let parsed = ProcessingStatus::from_parts("failed", Some("boom")).unwrap();
        assert_eq!(parsed, failed);

        let parsed = ProcessingStatus::from_parts("completed", None).unwrap();
        assert_eq!(parsed, ProcessingStatus::Completed);

        assert!(ProcessingStatus::from_parts("bogus", None).is_err());
    }
}
