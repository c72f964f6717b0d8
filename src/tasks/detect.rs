//! One detection pass over every target.
use crate::status::{DetectionReport, TargetStatus};
use crate::target::TargetKey;

use super::Context;

/// Status of every target.
///
/// Failures are folded into the affected target's status and never stop
/// the pass.
#[must_use]
pub fn detect(ctx: &Context) -> DetectionReport {
    let mut report = DetectionReport::new();
    for key in TargetKey::ALL {
        let status = if ctx.discovery.is_detected(key) {
            let resource = ctx.resource(key);
            let drift = resource.current_state();
            ctx.log.debug(&format!(
                "{}: {} ({})",
                resource.description(),
                drift.state,
                drift.summary
            ));
            TargetStatus::from_report(&drift)
        } else {
            TargetStatus::NotDetected
        };
        report.push(key, status);
    }
    report
}
