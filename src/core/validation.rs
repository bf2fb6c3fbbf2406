use serde::Serialize;

use crate::errors::ValidationError;

/// Accepted ready-wait values, with or without a caveat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "lowercase")]
pub enum StartupWaitCheck {
    Ok,
    Warning(String),
}

/// Checks the number of seconds to wait for a machine to be ready.
///
/// Negative numbers and non-numbers are rejected. Zero is accepted, but a
/// machine is rarely ready the instant it starts, so it earns a warning.
pub fn validate_startup_wait(input: &str) -> Result<StartupWaitCheck, ValidationError> {
    let value: i64 = input.parse().map_err(|_| ValidationError::NotANumber {
        value: input.to_string(),
    })?;

    match value {
        v if v < 0 => Err(ValidationError::Negative { value: v }),
        0 => Ok(StartupWaitCheck::Warning(
            "You declared this virtual machine to be ready right away. \
             It probably needs a couple of seconds before it is ready to process jobs!"
                .to_string(),
        )),
        _ => Ok(StartupWaitCheck::Ok),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_wait_values() {
        assert_eq!(
            validate_startup_wait("-1"),
            Err(ValidationError::Negative { value: -1 })
        );
        assert!(matches!(validate_startup_wait("0"), Ok(StartupWaitCheck::Warning(_))));
        assert_eq!(validate_startup_wait("5"), Ok(StartupWaitCheck::Ok));
        assert_eq!(
            validate_startup_wait("abc"),
            Err(ValidationError::NotANumber { value: "abc".into() })
        );
    }

    #[test]
    fn edges() {
        assert_eq!(
            validate_startup_wait(" 30 "),
            Err(ValidationError::NotANumber { value: " 30 ".into() })
        );
        assert!(matches!(validate_startup_wait(""), Err(ValidationError::NotANumber { .. })));
        assert!(matches!(validate_startup_wait("1.5"), Err(ValidationError::NotANumber { .. })));
    }
}
