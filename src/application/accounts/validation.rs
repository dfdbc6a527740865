//! Profile field validation.
//!
//! Checks run in a fixed order (name, email, phone, avatar, currency)
//! and stop at the first failing field, so callers always get a single
//! field-specific message.

use url::Url;

use crate::domain::{DomainError, DomainResult, UpdateAccountDto};

/// Validate the profile fields of a partial update. Fields that are
/// absent are skipped; present fields must be well-formed.
pub fn validate_profile_data(data: &UpdateAccountDto) -> DomainResult<()> {
    if let Some(ref name) = data.name {
        if name.trim().chars().count() < 2 {
            return Err(DomainError::Validation(
                "Name must be at least 2 characters".to_string(),
            ));
        }
    }

    if let Some(ref email) = data.email {
        if !is_valid_email(email) {
            return Err(DomainError::Validation(
                "Invalid email format".to_string(),
            ));
        }
    }

    if let Some(ref phone) = data.phone {
        if !phone.trim().is_empty() && !is_valid_phone(phone) {
            return Err(DomainError::Validation(
                "Phone number must be 10 digits".to_string(),
            ));
        }
    }

    if let Some(ref avatar) = data.avatar {
        if !avatar.is_empty() && Url::parse(avatar).is_err() {
            return Err(DomainError::Validation(
                "Avatar must be a valid URL".to_string(),
            ));
        }
    }

    // `preferred_currency` arrives as a closed enum, so a present value
    // is valid by construction; the HTTP layer rejects unknown codes.

    Ok(())
}

/// `local@domain.tld` shape: one `@`, no whitespace, dotted domain.
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !host.is_empty() && !tld.is_empty()
}

/// Exactly 10 digits after stripping spaces, hyphens and plus signs.
fn is_valid_phone(phone: &str) -> bool {
    let digits: String = phone
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '+'))
        .collect();
    digits.len() == 10 && digits.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(f: impl FnOnce(&mut UpdateAccountDto)) -> UpdateAccountDto {
        let mut dto = UpdateAccountDto::default();
        f(&mut dto);
        dto
    }

    #[test]
    fn short_name_rejected() {
        let err = validate_profile_data(&update(|d| d.name = Some("  a ".into()))).unwrap_err();
        assert!(err.to_string().contains("at least 2 characters"));
    }

    #[test]
    fn email_shape() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last@sub.example.co"));
        assert!(!is_valid_email("plainaddress"));
        assert!(!is_valid_email("a@nodot"));
        assert!(!is_valid_email("a b@x.com"));
        assert!(!is_valid_email("@x.com"));
        assert!(!is_valid_email("a@x."));
    }

    #[test]
    fn phone_normalization() {
        assert!(is_valid_phone("9876543210"));
        assert!(!is_valid_phone("+91 98765-43210")); // 12 digits
        assert!(is_valid_phone("98765 43210"));
        assert!(is_valid_phone("987-654-3210"));
        assert!(!is_valid_phone("12345"));
        assert!(!is_valid_phone("98765432101"));
        assert!(!is_valid_phone("98765abcde"));
    }

    #[test]
    fn invalid_phone_message_names_digit_rule() {
        let err = validate_profile_data(&update(|d| d.phone = Some("12345".into()))).unwrap_err();
        assert!(err.to_string().contains("must be 10 digits"));
    }

    #[test]
    fn empty_phone_is_skipped() {
        validate_profile_data(&update(|d| d.phone = Some("   ".into()))).unwrap();
    }

    #[test]
    fn avatar_must_parse_as_url() {
        validate_profile_data(&update(|d| d.avatar = Some("https://cdn.example.com/a.png".into())))
            .unwrap();
        validate_profile_data(&update(|d| d.avatar = Some(String::new()))).unwrap();

        let err =
            validate_profile_data(&update(|d| d.avatar = Some("not a url".into()))).unwrap_err();
        assert!(err.to_string().contains("valid URL"));
    }

    #[test]
    fn first_failing_field_wins() {
        // Both name and phone are bad; the name check runs first.
        let dto = update(|d| {
            d.name = Some("x".into());
            d.phone = Some("123".into());
        });
        let err = validate_profile_data(&dto).unwrap_err();
        assert!(err.to_string().contains("Name"));
    }
}
