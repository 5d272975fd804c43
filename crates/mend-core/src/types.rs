//! Domain types for the mendgrid recovery dispatcher.
//!
//! Alarms arrive from the monitoring system, topology is read fresh from the
//! infrastructure control plane on every dispatch, and a `RecoveryResult`
//! is produced once per firing alarm.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of a managed cluster.
pub type ClusterName = String;

/// Identifier of a worker node group within a cluster.
pub type NodeGroupId = String;

/// Identifier of the scaling group backing a node group.
pub type ScalingGroupId = String;

/// Identifier of a compute instance.
pub type InstanceId = String;

// ── Alarms ────────────────────────────────────────────────────────

/// State reported by the monitoring system for an alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlarmState {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "ALARM")]
    Alarm,
    #[serde(rename = "INSUFFICIENT_DATA")]
    InsufficientData,
    /// Missing or unrecognized `NewStateValue`; never firing.
    #[serde(rename = "UNKNOWN")]
    Unrecognized,
}

impl AlarmState {
    /// Parse the wire value used in `NewStateValue`.
    pub fn from_wire(value: &str) -> Self {
        match value {
            "OK" => Self::Ok,
            "ALARM" => Self::Alarm,
            "INSUFFICIENT_DATA" => Self::InsufficientData,
            _ => Self::Unrecognized,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Alarm => "ALARM",
            Self::InsufficientData => "INSUFFICIENT_DATA",
            Self::Unrecognized => "UNKNOWN",
        }
    }

    /// Whether the alarm is currently firing.
    pub fn is_firing(&self) -> bool {
        matches!(self, Self::Alarm)
    }
}

impl fmt::Display for AlarmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single alarm notification, consumed once by the dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmEvent {
    /// Alarm name; doubles as the classification key.
    pub name: String,
    pub state: AlarmState,
    /// The decoded alarm message, kept verbatim.
    pub payload: serde_json::Map<String, serde_json::Value>,
}

impl AlarmEvent {
    pub fn new(name: impl Into<String>, state: AlarmState) -> Self {
        Self {
            name: name.into(),
            state,
            payload: serde_json::Map::new(),
        }
    }

    /// Look up a string field in the forwarded payload.
    pub fn payload_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(|v| v.as_str())
    }
}

// ── Topology ──────────────────────────────────────────────────────

/// Min/desired/max capacity of a node group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalingBounds {
    pub min: u32,
    pub desired: u32,
    pub max: u32,
}

impl ScalingBounds {
    pub fn new(min: u32, desired: u32, max: u32) -> Self {
        Self { min, desired, max }
    }

    /// Check `min <= desired <= max`.
    pub fn validate(&self) -> Result<(), String> {
        if self.min > self.max {
            return Err(format!("min {} exceeds max {}", self.min, self.max));
        }
        if self.desired < self.min || self.desired > self.max {
            return Err(format!(
                "desired {} outside [{}, {}]",
                self.desired, self.min, self.max
            ));
        }
        Ok(())
    }

    /// Same bounds with a different desired capacity.
    pub fn with_desired(self, desired: u32) -> Self {
        Self { desired, ..self }
    }
}

impl fmt::Display for ScalingBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "min={} desired={} max={}", self.min, self.desired, self.max)
    }
}

/// A worker node group and its backing scaling group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeGroup {
    pub id: NodeGroupId,
    pub cluster: ClusterName,
    pub scaling_group: ScalingGroupId,
    pub bounds: ScalingBounds,
}

impl NodeGroup {
    /// Build the composite key for node group lookups.
    pub fn table_key(&self) -> String {
        format!("{}/{}", self.cluster, self.id)
    }
}

/// Scaling group membership as seen by the control plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingGroup {
    pub id: ScalingGroupId,
    /// Member instances, in control-plane order.
    pub instances: Vec<InstanceId>,
    /// Mirrored from the owning node group.
    pub bounds: ScalingBounds,
}

/// Outcome of one health facet check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthFacet {
    Ok,
    Impaired,
    Unknown,
}

impl HealthFacet {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Impaired => "impaired",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for HealthFacet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Instance-level and host-level health of a compute instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceHealth {
    pub instance_status: HealthFacet,
    pub system_status: HealthFacet,
}

impl InstanceHealth {
    pub fn new(instance_status: HealthFacet, system_status: HealthFacet) -> Self {
        Self {
            instance_status,
            system_status,
        }
    }

    pub fn ok() -> Self {
        Self::new(HealthFacet::Ok, HealthFacet::Ok)
    }

    /// Unhealthy iff either facet is not ok.
    pub fn is_unhealthy(&self) -> bool {
        self.instance_status != HealthFacet::Ok || self.system_status != HealthFacet::Ok
    }
}

// ── Recovery ──────────────────────────────────────────────────────

/// The remediation chosen for an alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionTag {
    #[serde(rename = "terminate_unhealthy_instance")]
    TerminateUnhealthyInstance,
    #[serde(rename = "notification_only")]
    AdvisoryOnly,
    #[serde(rename = "scale_up_nodes")]
    ScaleUpNodeGroup,
    #[serde(rename = "notification_with_recommendation")]
    AdvisoryWithRecommendation,
    #[serde(rename = "notification_with_investigation")]
    AdvisoryInvestigate,
    #[serde(rename = "none")]
    NoAction,
}

impl ActionTag {
    /// Stable tag used in reports and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TerminateUnhealthyInstance => "terminate_unhealthy_instance",
            Self::AdvisoryOnly => "notification_only",
            Self::ScaleUpNodeGroup => "scale_up_nodes",
            Self::AdvisoryWithRecommendation => "notification_with_recommendation",
            Self::AdvisoryInvestigate => "notification_with_investigation",
            Self::NoAction => "none",
        }
    }
}

impl fmt::Display for ActionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal outcome of one dispatched alarm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryResult {
    pub alarm_name: String,
    pub action: ActionTag,
    pub success: bool,
    pub detail: String,
}

impl RecoveryResult {
    /// Start accumulating a result for the given alarm and action.
    pub fn builder(alarm_name: &str, action: ActionTag) -> RecoveryResultBuilder {
        RecoveryResultBuilder {
            alarm_name: alarm_name.to_string(),
            action,
            success: true,
            lines: Vec::new(),
        }
    }

    /// `SUCCESS` or `FAILED`, as used in report subjects.
    pub fn status_label(&self) -> &'static str {
        if self.success { "SUCCESS" } else { "FAILED" }
    }
}

/// Accumulates detail lines while an action executes.
#[derive(Debug)]
pub struct RecoveryResultBuilder {
    alarm_name: String,
    action: ActionTag,
    success: bool,
    lines: Vec<String>,
}

impl RecoveryResultBuilder {
    /// Append one human-readable detail line.
    pub fn line(&mut self, line: impl Into<String>) -> &mut Self {
        self.lines.push(line.into());
        self
    }

    /// Mark the result failed and record the cause.
    pub fn fail(&mut self, cause: impl Into<String>) -> &mut Self {
        self.success = false;
        self.lines.push(cause.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// False once `fail` has been called.
    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn build(self) -> RecoveryResult {
        RecoveryResult {
            alarm_name: self.alarm_name,
            action: self.action,
            success: self.success,
            detail: self.lines.join("\n"),
        }
    }
}

/// Outer result of one invocation.
///
/// Always "completed" once the batch has been parsed; per-alarm failures
/// are carried in `results`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationStatus {
    pub status_code: u16,
    pub body: String,
    pub results: Vec<RecoveryResult>,
    /// Alarms that were not firing.
    pub skipped: usize,
}

impl InvocationStatus {
    pub fn completed(results: Vec<RecoveryResult>, skipped: usize) -> Self {
        Self {
            status_code: 200,
            body: "Recovery check completed".to_string(),
            results,
            skipped,
        }
    }

    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.success).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_validate() {
        assert!(ScalingBounds::new(1, 2, 3).validate().is_ok());
        assert!(ScalingBounds::new(2, 2, 2).validate().is_ok());
        assert!(ScalingBounds::new(3, 2, 5).validate().is_err());
        assert!(ScalingBounds::new(1, 6, 5).validate().is_err());
        assert!(ScalingBounds::new(4, 4, 3).validate().is_err());
    }

    #[test]
    fn unhealthy_if_either_facet_not_ok() {
        assert!(!InstanceHealth::ok().is_unhealthy());
        assert!(InstanceHealth::new(HealthFacet::Impaired, HealthFacet::Ok).is_unhealthy());
        assert!(InstanceHealth::new(HealthFacet::Ok, HealthFacet::Impaired).is_unhealthy());
        assert!(InstanceHealth::new(HealthFacet::Ok, HealthFacet::Unknown).is_unhealthy());
    }

    #[test]
    fn action_tag_serializes_to_wire_tag() {
        for tag in [
            ActionTag::TerminateUnhealthyInstance,
            ActionTag::AdvisoryOnly,
            ActionTag::ScaleUpNodeGroup,
            ActionTag::AdvisoryWithRecommendation,
            ActionTag::AdvisoryInvestigate,
            ActionTag::NoAction,
        ] {
            let json = serde_json::to_string(&tag).unwrap();
            assert_eq!(json, format!("\"{}\"", tag.as_str()));
        }
    }

    #[test]
    fn builder_accumulates_lines() {
        let mut b = RecoveryResult::builder("a", ActionTag::ScaleUpNodeGroup);
        assert!(b.is_empty());
        b.line("first").line("second");
        let r = b.build();
        assert!(r.success);
        assert_eq!(r.detail, "first\nsecond");
        assert_eq!(r.status_label(), "SUCCESS");
    }

    #[test]
    fn builder_fail_marks_result() {
        let mut b = RecoveryResult::builder("a", ActionTag::TerminateUnhealthyInstance);
        b.line("terminated i-1");
        b.fail("terminate i-2 rejected");
        let r = b.build();
        assert!(!r.success);
        assert!(r.detail.contains("i-1"));
        assert!(r.detail.contains("i-2"));
        assert_eq!(r.status_label(), "FAILED");
    }

    #[test]
    fn alarm_state_wire_values() {
        assert_eq!(AlarmState::from_wire("ALARM"), AlarmState::Alarm);
        assert_eq!(AlarmState::from_wire("OK"), AlarmState::Ok);
        assert_eq!(AlarmState::from_wire("INSUFFICIENT_DATA"), AlarmState::InsufficientData);
        assert_eq!(AlarmState::from_wire("alarm"), AlarmState::Unrecognized);
        assert_eq!(AlarmState::from_wire(""), AlarmState::Unrecognized);
        assert!(AlarmState::Alarm.is_firing());
        assert!(!AlarmState::Ok.is_firing());
        assert!(!AlarmState::Unrecognized.is_firing());
    }
}
