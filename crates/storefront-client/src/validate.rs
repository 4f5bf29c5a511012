//! Local input checks run before any request is made.

use storefront_core::outcome::ValidationError;

pub type Checked = Result<(), ValidationError>;

pub fn required(field: &str, value: &str) -> Checked {
  if value.trim().is_empty() {
    return Err(ValidationError::new(field, "is required"));
  }
  Ok(())
}

/// Loose shape check: one `@`, a non-empty local part and a dotted domain.
pub fn email(field: &str, value: &str) -> Checked {
  required(field, value)?;
  let value = value.trim();
  let valid = match value.split_once('@') {
    Some((local, domain)) => {
      !local.is_empty()
        && !domain.contains('@')
        && domain
          .split_once('.')
          .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
        && !value.contains(char::is_whitespace)
    }
    None => false,
  };
  if valid {
    Ok(())
  } else {
    Err(ValidationError::new(field, "is not a valid email address"))
  }
}

/// 10 to 15 digits with an optional leading `+`.
pub fn phone(field: &str, value: &str) -> Checked {
  required(field, value)?;
  let digits = value.trim().strip_prefix('+').unwrap_or(value.trim());
  if (10..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit()) {
    Ok(())
  } else {
    Err(ValidationError::new(field, "must be 10-15 digits"))
  }
}

pub fn password(field: &str, value: &str) -> Checked {
  if value.chars().count() < 6 {
    return Err(ValidationError::new(field, "must be at least 6 characters"));
  }
  Ok(())
}

pub fn confirmation(field: &str, value: &str, confirm: &str) -> Checked {
  if value != confirm {
    return Err(ValidationError::new(field, "does not match"));
  }
  Ok(())
}

pub fn quantity(field: &str, value: u32) -> Checked {
  if value == 0 {
    return Err(ValidationError::new(field, "must be at least 1"));
  }
  Ok(())
}

/// Reset codes are 4 to 8 digits.
pub fn reset_code(field: &str, value: &str) -> Checked {
  let value = value.trim();
  if (4..=8).contains(&value.len()) && value.chars().all(|c| c.is_ascii_digit()) {
    Ok(())
  } else {
    Err(ValidationError::new(field, "must be 4-8 digits"))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn required_rejects_blank() {
    assert!(required("name", "").is_err());
    assert!(required("name", "   ").is_err());
    assert!(required("name", "Ali").is_ok());
  }

  #[test]
  fn email_shapes() {
    assert!(email("email", "mona@example.com").is_ok());
    assert!(email("email", "a@b.co").is_ok());
    assert!(email("email", "mona").is_err());
    assert!(email("email", "@example.com").is_err());
    assert!(email("email", "mona@example").is_err());
    assert!(email("email", "mona@@example.com").is_err());
    assert!(email("email", "mo na@example.com").is_err());
  }

  #[test]
  fn phone_shapes() {
    assert!(phone("phone", "01010700999").is_ok());
    assert!(phone("phone", "+201010700999").is_ok());
    assert!(phone("phone", "12345").is_err());
    assert!(phone("phone", "0101070099x").is_err());
  }

  #[test]
  fn passwords() {
    assert!(password("password", "12345").is_err());
    assert!(password("password", "123456").is_ok());
    assert!(confirmation("rePassword", "abcdef", "abcdeg").is_err());
    assert!(confirmation("rePassword", "abcdef", "abcdef").is_ok());
  }

  #[test]
  fn quantities_and_codes() {
    assert!(quantity("quantity", 0).is_err());
    assert!(quantity("quantity", 3).is_ok());
    assert!(reset_code("resetCode", "123456").is_ok());
    assert!(reset_code("resetCode", "12a456").is_err());
    assert!(reset_code("resetCode", "123").is_err());
  }
}
