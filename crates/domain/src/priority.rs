//! Urgency shared by jobs and work orders.

string_enum! {
    /// How urgently a piece of work should be handled.
    #[derive(PartialOrd, Ord, Default)]
    Priority {
        Low => "LOW",
        #[default]
        Medium => "MEDIUM",
        High => "HIGH",
        Critical => "CRITICAL",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_default_to_medium() {
        assert_eq!(Priority::default(), Priority::Medium);
    }

    #[test]
    fn should_parse_wire_names() {
        assert_eq!("CRITICAL".parse::<Priority>().unwrap(), Priority::Critical);
        assert!("urgent".parse::<Priority>().is_err());
    }
}
