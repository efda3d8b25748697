//! # Status
//!
//! Collapses the operation phases of all Applications touched by one step
//! into a single step status. The most severe phase wins:
//! `Running`/`Terminating` over `Failed`/`Error` over `Succeeded`.

use super::types::UpdateError;
use crate::crd::OperationPhase;
use crate::step::StepStatus;

/// Aggregate the phases collected during one pass
///
/// # Errors
///
/// Returns [`UpdateError::UnknownPhases`] when `phases` is empty or contains
/// a phase without a severity rank.
pub fn aggregate_phases(phases: &[OperationPhase]) -> Result<StepStatus, UpdateError> {
    let unknown = || UpdateError::UnknownPhases {
        phases: phases.to_vec(),
    };

    let mut most_severe: Option<u8> = None;
    for phase in phases {
        let severity = phase.severity().ok_or_else(unknown)?;
        most_severe = Some(most_severe.map_or(severity, |s| s.max(severity)));
    }

    match most_severe.ok_or_else(unknown)? {
        0 => Ok(StepStatus::Succeeded),
        1 => Ok(StepStatus::Errored),
        _ => Ok(StepStatus::Running),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_outranks_succeeded() {
        let status =
            aggregate_phases(&[OperationPhase::Succeeded, OperationPhase::Running]).unwrap();
        assert_eq!(status, StepStatus::Running);
    }

    #[test]
    fn test_terminating_is_running() {
        let status =
            aggregate_phases(&[OperationPhase::Error, OperationPhase::Terminating]).unwrap();
        assert_eq!(status, StepStatus::Running);
    }

    #[test]
    fn test_failed_outranks_succeeded() {
        let status = aggregate_phases(&[
            OperationPhase::Succeeded,
            OperationPhase::Failed,
            OperationPhase::Succeeded,
        ])
        .unwrap();
        assert_eq!(status, StepStatus::Errored);
    }

    #[test]
    fn test_all_succeeded() {
        let status =
            aggregate_phases(&[OperationPhase::Succeeded, OperationPhase::Succeeded]).unwrap();
        assert_eq!(status, StepStatus::Succeeded);
    }

    #[test]
    fn test_empty_phases_error() {
        assert!(matches!(
            aggregate_phases(&[]),
            Err(UpdateError::UnknownPhases { ref phases }) if phases.is_empty()
        ));
    }

    #[test]
    fn test_unknown_phase_error() {
        let result = aggregate_phases(&[
            OperationPhase::Running,
            OperationPhase::Other("Paused".to_string()),
        ]);
        assert!(matches!(result, Err(UpdateError::UnknownPhases { .. })));
    }
}
