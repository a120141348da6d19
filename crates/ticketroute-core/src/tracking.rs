//! Tracking id extraction.
//!
//! Every ticket operation starts here: a subject line either carries a
//! `TrackingID#<digits>` token with at least 15 ASCII digits, or the message
//! does not belong to any ticket.

use std::sync::LazyLock;

use regex::Regex;

use crate::ticket::TicketId;

// `\d` would also accept non-ASCII digits.
#[allow(clippy::expect_used)]
static TRACKING_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"TrackingID#([0-9]{15,})").expect("valid tracking id pattern"));

/// Extracts the ticket id from a subject line.
///
/// Returns the digit run of the first `TrackingID#` token followed by 15 or
/// more ASCII digits. The token is case-sensitive.
///
/// ```
/// use ticketroute_core::extract_tracking_id;
///
/// let id = extract_tracking_id("RE: outage TrackingID#123456789012345").unwrap();
/// assert_eq!(id.as_str(), "123456789012345");
///
/// assert!(extract_tracking_id("RE: outage TrackingID#12345").is_none());
/// ```
#[must_use]
pub fn extract_tracking_id(subject: &str) -> Option<TicketId> {
    TRACKING_ID
        .captures(subject)
        .and_then(|caps| caps.get(1))
        .map(|m| TicketId::new_unchecked(m.as_str()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_extracts_id_from_reply_subject() {
        let id = extract_tracking_id("RE: outage TrackingID#123456789012345").unwrap();
        assert_eq!(id.as_str(), "123456789012345");
    }

    #[test]
    fn test_takes_whole_digit_run() {
        let id = extract_tracking_id("TrackingID#12345678901234567890 [ext]").unwrap();
        assert_eq!(id.as_str(), "12345678901234567890");
    }

    #[test]
    fn test_too_few_digits() {
        assert!(extract_tracking_id("TrackingID#12345678901234").is_none());
    }

    #[test]
    fn test_missing_token() {
        assert!(extract_tracking_id("").is_none());
        assert!(extract_tracking_id("Weekly report 123456789012345").is_none());
    }

    #[test]
    fn test_token_is_case_sensitive() {
        assert!(extract_tracking_id("trackingid#123456789012345").is_none());
        assert!(extract_tracking_id("TRACKINGID#123456789012345").is_none());
    }

    #[test]
    fn test_first_qualifying_token_wins() {
        let subject = "TrackingID#1 then TrackingID#111111111111111 and TrackingID#222222222222222";
        let id = extract_tracking_id(subject).unwrap();
        assert_eq!(id.as_str(), "111111111111111");
    }

    #[test]
    fn test_unicode_subject() {
        let id = extract_tracking_id("Störung – Drucker 🖨 TrackingID#123456789012345 ✓").unwrap();
        assert_eq!(id.as_str(), "123456789012345");
    }

    #[test]
    fn test_non_ascii_digits_are_not_digits() {
        // Arabic-Indic digits
        assert!(extract_tracking_id("TrackingID#١٢٣٤٥٦٧٨٩٠١٢٣٤٥").is_none());
        // Fullwidth digits after a valid 15-digit run stop the match
        let id = extract_tracking_id("TrackingID#123456789012345０").unwrap();
        assert_eq!(id.as_str(), "123456789012345");
    }

    proptest! {
        #[test]
        fn prop_extracts_embedded_run(
            prefix in "[^#]{0,20}",
            digits in "[0-9]{15,30}",
            suffix in "([^0-9#][^#]{0,20})?",
        ) {
            let subject = format!("{prefix}TrackingID#{digits}{suffix}");
            let id = extract_tracking_id(&subject).unwrap();
            prop_assert_eq!(id.as_str(), digits.as_str());
        }

        #[test]
        fn prop_short_runs_are_rejected(
            prefix in "[^#]{0,20}",
            digits in "[0-9]{0,14}",
            suffix in "([^0-9#][^#]{0,20})?",
        ) {
            let subject = format!("{prefix}TrackingID#{digits}{suffix}");
            prop_assert!(extract_tracking_id(&subject).is_none());
        }
    }
}
