//! Field-level checks shared by the entity `validate` methods.

use crate::error::ValidationError;

pub(crate) fn required(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    max_len(field, value, max)
}

pub(crate) fn max_len(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}

pub(crate) fn optional(
    field: &'static str,
    value: Option<&str>,
    max: usize,
) -> Result<(), ValidationError> {
    value.map_or(Ok(()), |value| max_len(field, value, max))
}

pub(crate) fn non_negative(field: &'static str, value: Option<i64>) -> Result<(), ValidationError> {
    match value {
        Some(value) if value < 0 => Err(ValidationError::Negative(field)),
        _ => Ok(()),
    }
}

pub(crate) fn positive(field: &'static str, value: Option<i64>) -> Result<(), ValidationError> {
    match value {
        Some(value) if value < 1 => Err(ValidationError::NotPositive(field)),
        _ => Ok(()),
    }
}

pub(crate) fn within(
    field: &'static str,
    value: i64,
    min: i64,
    max: i64,
) -> Result<(), ValidationError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange { field, min, max })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_reject_blank_required_field() {
        assert!(matches!(
            required("name", "   ", 10),
            Err(ValidationError::EmptyField("name"))
        ));
    }

    #[test]
    fn should_count_characters_not_bytes() {
        assert!(max_len("name", "ééé", 3).is_ok());
        assert!(matches!(
            max_len("name", "éééé", 3),
            Err(ValidationError::TooLong { field: "name", max: 3 })
        ));
    }

    #[test]
    fn should_accept_missing_optional_field() {
        assert!(optional("notes", None, 1).is_ok());
        assert!(non_negative("hours", None).is_ok());
        assert!(non_negative("hours", Some(-1)).is_err());
    }

    #[test]
    fn should_reject_zero_where_positive_required() {
        assert!(positive("minutes", Some(1)).is_ok());
        assert!(matches!(
            positive("minutes", Some(0)),
            Err(ValidationError::NotPositive("minutes"))
        ));
        assert!(within("every", 1000, 1, 1000).is_ok());
        assert!(within("every", 1001, 1, 1000).is_err());
    }
}
