//! `OData` filter expressions.

/// Quotes a string literal for an `OData` expression.
///
/// Single quotes inside the value are doubled.
///
/// ```
/// use ticketroute_graph::filter::quote;
///
/// assert_eq!(quote("O'Brien"), "'O''Brien'");
/// ```
#[must_use]
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Filter matching folders whose display name equals `name` exactly.
#[must_use]
pub fn display_name_eq(name: &str) -> String {
    format!("displayName eq {}", quote(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_name() {
        assert_eq!(display_name_eq("Inbox"), "displayName eq 'Inbox'");
    }

    #[test]
    fn test_quotes_are_doubled() {
        assert_eq!(
            display_name_eq("123456789012345 \u{2013} Bob's laptop"),
            "displayName eq '123456789012345 \u{2013} Bob''s laptop'"
        );
        assert_eq!(quote("''"), "''''''");
    }
}
