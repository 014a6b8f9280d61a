//! Status report construction.

use crate::codec::to_wire;
use crate::host::SwitchingHost;
use crate::message::StatusReport;
use crate::registry::Bank;

/// Builds full PGN 127501 reports from current host state.
pub struct StatusReportBuilder;

impl StatusReportBuilder {
    /// Read every switch of `bank` and report the ones with a known value.
    ///
    /// Unknown values are left out rather than reported as off.
    pub async fn build(host: &dyn SwitchingHost, bank: &Bank) -> StatusReport {
        let mut report = StatusReport::new(bank.instance);
        for (i, path) in bank.switches.iter().enumerate() {
            if let Some(value) = host.get_self_path(path).await {
                report.set_indicator(i + 1, to_wire(&value));
            }
        }
        report
    }

    /// Build a report for `bank` and send it to the N2K output.
    pub async fn emit(host: &dyn SwitchingHost, bank: &Bank) -> StatusReport {
        let report = Self::build(host, bank).await;
        let message = report.to_json();
        tracing::debug!(bank = bank.instance, "sending {}", message);
        host.emit_nmea2000_json(message);
        report
    }
}
