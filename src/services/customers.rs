//! Customer directory
//!
//! Phone numbers are normalized to a canonical +<digits> form before any
//! lookup, so the same customer never splits across notations.

use crate::{
    error::{AppError, AppResult},
    models::customer::Customer,
    repository::Repository,
};
use uuid::Uuid;

/// Normalize a phone number to canonical international form.
///
/// Accepts "+33 6 12 34 56 78", "0612345678", "0033612345678" and the
/// like; `default_country_code` fills in numbers written in national
/// notation (leading single 0).
pub fn normalize_phone(raw: &str, default_country_code: &str) -> AppResult<String> {
    let has_plus = raw.trim_start().starts_with('+');
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.len() < 6 || digits.len() > 15 {
        return Err(AppError::Validation(format!(
            "Phone number '{}' is not a valid length",
            raw
        )));
    }

    let canonical = if has_plus {
        digits
    } else if let Some(rest) = digits.strip_prefix("00") {
        rest.to_string()
    } else if let Some(rest) = digits.strip_prefix('0') {
        format!("{}{}", default_country_code, rest)
    } else {
        digits
    };

    if canonical.is_empty() {
        return Err(AppError::Validation("Phone number is empty".to_string()));
    }
    Ok(format!("+{}", canonical))
}

#[derive(Clone)]
pub struct CustomersService {
    repository: Repository,
}

impl CustomersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Find or create a customer from a raw phone number and display name
    pub async fn find_or_create(
        &self,
        salon: &crate::models::salon::Salon,
        phone: &str,
        display_name: &str,
    ) -> AppResult<Customer> {
        let canonical = normalize_phone(phone, &salon.default_country_code)?;
        self.repository
            .customers
            .find_or_create(salon.id, &canonical, display_name)
            .await
    }

    /// Get a customer by id
    pub async fn get(&self, salon_id: Uuid, id: Uuid) -> AppResult<Customer> {
        self.repository
            .customers
            .get_by_id(salon_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Customer {} not found", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_national_notation() {
        assert_eq!(normalize_phone("0612345678", "33").unwrap(), "+33612345678");
        assert_eq!(
            normalize_phone("06 12 34 56 78", "33").unwrap(),
            "+33612345678"
        );
    }

    #[test]
    fn test_normalize_international_notations() {
        assert_eq!(
            normalize_phone("+33 6 12 34 56 78", "33").unwrap(),
            "+33612345678"
        );
        assert_eq!(
            normalize_phone("0033612345678", "33").unwrap(),
            "+33612345678"
        );
        // Already canonical stays untouched
        assert_eq!(normalize_phone("+33612345678", "33").unwrap(), "+33612345678");
    }

    #[test]
    fn test_normalize_same_customer_across_notations() {
        let a = normalize_phone("+33612345678", "33").unwrap();
        let b = normalize_phone("0612345678", "33").unwrap();
        let c = normalize_phone("00 33 6 12 34 56 78", "33").unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn test_normalize_rejects_garbage() {
        assert!(normalize_phone("hello", "33").is_err());
        assert!(normalize_phone("12", "33").is_err());
        assert!(normalize_phone("123456789012345678", "33").is_err());
    }
}
