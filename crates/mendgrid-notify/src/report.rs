//! Human-readable recovery report.

use mend_core::RecoveryResult;

/// Subject and body for one recovery outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub subject: String,
    pub body: String,
}

impl Report {
    pub fn render(environment: &str, cluster: &str, alarm_name: &str, result: &RecoveryResult) -> Self {
        let status = result.status_label();
        let subject = format!("[{status}] Cluster Auto Recovery - {alarm_name}");
        let body = format!(
            "Cluster Auto Recovery Report\n\
             \n\
             Environment: {environment}\n\
             Cluster: {cluster}\n\
             Alarm: {alarm_name}\n\
             \n\
             Action Taken: {action}\n\
             Status: {status}\n\
             \n\
             Details:\n\
             {detail}\n\
             \n\
             ---\n\
             This is an automated message from the mendgrid recovery dispatcher.\n",
            action = result.action,
            detail = result.detail,
        );
        Self { subject, body }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mend_core::ActionTag;

    #[test]
    fn success_report() {
        let mut b = RecoveryResult::builder("prod-status-check-failed-node3", ActionTag::TerminateUnhealthyInstance);
        b.line("Terminated unhealthy instance: i-0abc");
        let report = Report::render("prod", "prod-eks", "prod-status-check-failed-node3", &b.build());

        assert_eq!(
            report.subject,
            "[SUCCESS] Cluster Auto Recovery - prod-status-check-failed-node3"
        );
        assert!(report.body.starts_with("Cluster Auto Recovery Report\n\nEnvironment: prod\n"));
        assert!(report.body.contains("Cluster: prod-eks\n"));
        assert!(report.body.contains("Action Taken: terminate_unhealthy_instance\n"));
        assert!(report.body.contains("Status: SUCCESS\n"));
        assert!(report.body.contains("Details:\nTerminated unhealthy instance: i-0abc\n"));
    }

    #[test]
    fn failed_report_subject() {
        let mut b = RecoveryResult::builder("low-node-count-ng-a", ActionTag::ScaleUpNodeGroup);
        b.fail("Failed to scale nodegroup ng-a: request rejected");
        let report = Report::render("staging", "c1", "low-node-count-ng-a", &b.build());
        assert_eq!(report.subject, "[FAILED] Cluster Auto Recovery - low-node-count-ng-a");
        assert!(report.body.contains("Status: FAILED\n"));
    }
}
