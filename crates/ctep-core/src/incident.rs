//! Incident code → status text table.
//!
//! Terminals report failed sales with a numeric incident code and a free-text
//! description. The POS only needs a short, stable status string.

/// Status text for a sale that timed out on the terminal (or in the driver).
pub const TIMEOUT: &str = "Timeout";

/// Status text for a sale cancelled by the cardholder or cashier.
pub const CANCELLED: &str = "Cancelled";

/// Fallback status text for any incident code not in the table.
pub const GENERIC_ERROR: &str = "Error";

/// Known incident codes.
static INCIDENT_STATUSES: &[(&str, &str)] = &[("1803", TIMEOUT), ("2629", CANCELLED)];

/// Maps an incident code to its status text.
///
/// ```rust
/// use ctep_core::incident::status_for_incident;
///
/// assert_eq!(status_for_incident("1803"), "Timeout");
/// assert_eq!(status_for_incident("2629"), "Cancelled");
/// assert_eq!(status_for_incident("9999"), "Error");
/// ```
pub fn status_for_incident(code: &str) -> &'static str {
    let code = code.trim();
    INCIDENT_STATUSES
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, status)| *status)
        .unwrap_or(GENERIC_ERROR)
}
