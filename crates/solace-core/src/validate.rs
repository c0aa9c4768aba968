//! Input validation performed before any storage call.

use uuid::Uuid;

use crate::error::ValidationFailure;
use crate::message::{SendMessage, ValidatedMessage};

/// Length of the canonical `8-4-4-4-12` identifier text.
const IDENTIFIER_LEN: usize = 36;
const HYPHEN_POSITIONS: [usize; 4] = [8, 13, 18, 23];

/// Maximum message body length, counted in characters after trimming.
pub const MAX_BODY_CHARS: usize = 4000;

/// Whether a participant may address a message to themself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SelfAddressPolicy {
    /// Self-notes are permitted.
    #[default]
    Allow,
    Reject,
}

/// Returns `true` only for canonical hyphenated hexadecimal identifiers.
pub fn validate(id: &str) -> bool {
    id.len() == IDENTIFIER_LEN
        && id.bytes().enumerate().all(|(i, b)| {
            if HYPHEN_POSITIONS.contains(&i) {
                b == b'-'
            } else {
                b.is_ascii_hexdigit()
            }
        })
}

/// Validates `value` and parses it, naming `field` on failure.
pub fn parse_identifier(field: &'static str, value: &str) -> Result<Uuid, ValidationFailure> {
    let invalid = || ValidationFailure::InvalidIdentifier {
        field,
        value: value.to_owned(),
    };
    if !validate(value) {
        return Err(invalid());
    }
    Uuid::try_parse(value).map_err(|_| invalid())
}

/// Checks identifiers, body, and the self-address policy.
pub fn validate_message(
    input: &SendMessage,
    policy: SelfAddressPolicy,
) -> Result<ValidatedMessage, ValidationFailure> {
    let session_id = parse_identifier("sessionId", &input.session_id)?;
    let sender_id = parse_identifier("senderId", &input.sender_id)?;
    let recipient_id = parse_identifier("recipientId", &input.recipient_id)?;

    let body = input.body.trim();
    if body.is_empty() {
        return Err(ValidationFailure::EmptyBody);
    }
    if body.chars().count() > MAX_BODY_CHARS {
        return Err(ValidationFailure::BodyTooLong { max: MAX_BODY_CHARS });
    }

    if policy == SelfAddressPolicy::Reject && sender_id == recipient_id {
        return Err(ValidationFailure::SelfAddressed);
    }

    Ok(ValidatedMessage {
        session_id,
        sender_id,
        recipient_id,
        body: body.to_owned(),
    })
}

#[cfg(test)]
mod test {
    use super::*;

    fn input(sender: &str, recipient: &str, body: &str) -> SendMessage {
        SendMessage {
            session_id: "11111111-1111-1111-1111-111111111111".into(),
            sender_id: sender.into(),
            recipient_id: recipient.into(),
            body: body.into(),
        }
    }

    const A: &str = "22222222-2222-2222-2222-222222222222";
    const B: &str = "33333333-3333-3333-3333-333333333333";

    #[test]
    fn accepts_canonical_forms() {
        assert!(validate("11111111-1111-1111-1111-111111111111"));
        assert!(validate("9f1c2a3b-4d5e-4f60-8a7b-0c1d2e3f4a5b"));
        assert!(validate("9F1C2A3B-4D5E-4F60-8A7B-0C1D2E3F4A5B"));
        assert!(validate("00000000-0000-0000-0000-000000000000"));
    }

    #[test]
    fn rejects_malformed_forms() {
        for bad in [
            "",
            "not-a-uuid",
            "9f1c2a3b4d5e4f608a7b0c1d2e3f4a5b",
            "{9f1c2a3b-4d5e-4f60-8a7b-0c1d2e3f4a5b}",
            "urn:uuid:9f1c2a3b-4d5e-4f60-8a7b-0c1d2e3f4a5b",
            " 9f1c2a3b-4d5e-4f60-8a7b-0c1d2e3f4a5b",
            "9f1c2a3b-4d5e-4f60-8a7b-0c1d2e3f4a5g",
            "9f1c2a3b-4d5e-4f60-8a7b0-c1d2e3f4a5b",
            "9f1c2a3b-4d5e-4f60-8a7b-0c1d2e3f4a5",
        ] {
            assert!(!validate(bad), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn parse_identifier_names_field() {
        let err = parse_identifier("recipientId", "nope").unwrap_err();
        assert_eq!(
            err,
            ValidationFailure::InvalidIdentifier {
                field: "recipientId",
                value: "nope".into()
            }
        );
    }

    #[test]
    fn body_is_trimmed() {
        let v = validate_message(&input(A, B, "  hello \n"), SelfAddressPolicy::Allow).unwrap();
        assert_eq!(v.body, "hello");
    }

    #[test]
    fn whitespace_body_is_empty() {
        let err = validate_message(&input(A, B, " \t\n "), SelfAddressPolicy::Allow).unwrap_err();
        assert_eq!(err, ValidationFailure::EmptyBody);
    }

    #[test]
    fn overlong_body_is_rejected() {
        let body = "x".repeat(MAX_BODY_CHARS + 1);
        let err = validate_message(&input(A, B, &body), SelfAddressPolicy::Allow).unwrap_err();
        assert_eq!(err, ValidationFailure::BodyTooLong { max: MAX_BODY_CHARS });
    }

    #[test]
    fn self_addressed_follows_policy() {
        assert!(validate_message(&input(A, A, "note"), SelfAddressPolicy::Allow).is_ok());
        assert_eq!(
            validate_message(&input(A, A, "note"), SelfAddressPolicy::Reject).unwrap_err(),
            ValidationFailure::SelfAddressed
        );
    }

    #[test]
    fn identifiers_checked_before_body() {
        let err = validate_message(&input("bad", B, ""), SelfAddressPolicy::Allow).unwrap_err();
        assert!(matches!(
            err,
            ValidationFailure::InvalidIdentifier { field: "senderId", .. }
        ));
    }
}
