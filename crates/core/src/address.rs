//! Shipping address input and validation.
//!
//! The same input shape is used when a customer saves an address from their
//! account page and when they type a new one during checkout.

use serde::{Deserialize, Serialize};

use crate::types::AddressType;
use crate::validation::ValidationErrors;

const MAX_TEXT_LEN: usize = 120;
const MIN_PHONE_DIGITS: usize = 7;
const MAX_PHONE_DIGITS: usize = 15;

/// Address fields as submitted by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressInput {
    pub full_name: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub phone_number: String,
    #[serde(default)]
    pub address_type: AddressType,
    #[serde(default)]
    pub is_default: bool,
}

impl AddressInput {
    /// Check every field and return all problems together.
    ///
    /// # Errors
    ///
    /// Returns the list of invalid fields.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        for (field, value) in [
            ("fullName", &self.full_name),
            ("street", &self.street),
            ("city", &self.city),
            ("state", &self.state),
            ("country", &self.country),
        ] {
            if value.trim().is_empty() {
                errors.add(field, "is required");
            } else if value.trim().chars().count() > MAX_TEXT_LEN {
                errors.add(field, format!("must be at most {MAX_TEXT_LEN} characters"));
            }
        }

        let zip = self.zip_code.trim();
        if zip.is_empty() {
            errors.add("zipCode", "is required");
        } else if !is_plausible_postal_code(zip) {
            errors.add("zipCode", "is not a valid postal code");
        }

        if self.phone_number.trim().is_empty() {
            errors.add("phoneNumber", "is required");
        } else if normalize_phone(&self.phone_number).is_none() {
            errors.add(
                "phoneNumber",
                format!("must contain {MIN_PHONE_DIGITS} to {MAX_PHONE_DIGITS} digits"),
            );
        }

        errors.into_result()
    }

    /// A copy with surrounding whitespace removed and the phone number normalized.
    ///
    /// Call after [`validate`](Self::validate) succeeds.
    #[must_use]
    pub fn normalized(&self) -> Self {
        Self {
            full_name: self.full_name.trim().to_owned(),
            street: self.street.trim().to_owned(),
            city: self.city.trim().to_owned(),
            state: self.state.trim().to_owned(),
            zip_code: self.zip_code.trim().to_uppercase(),
            country: self.country.trim().to_owned(),
            phone_number: normalize_phone(&self.phone_number)
                .unwrap_or_else(|| self.phone_number.trim().to_owned()),
            address_type: self.address_type,
            is_default: self.is_default,
        }
    }
}

/// Address copied onto an order when it is placed.
///
/// Orders keep their own copy so later edits to the address book do not
/// rewrite where past orders were shipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub full_name: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub phone_number: String,
}

impl From<&AddressInput> for ShippingAddress {
    fn from(input: &AddressInput) -> Self {
        Self {
            full_name: input.full_name.clone(),
            street: input.street.clone(),
            city: input.city.clone(),
            state: input.state.clone(),
            zip_code: input.zip_code.clone(),
            country: input.country.clone(),
            phone_number: input.phone_number.clone(),
        }
    }
}

/// Postal codes vary by country; accept 3-10 characters of letters, digits,
/// spaces and hyphens containing at least one digit.
fn is_plausible_postal_code(zip: &str) -> bool {
    let len = zip.chars().count();
    (3..=10).contains(&len)
        && zip
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == ' ' || c == '-')
        && zip.chars().any(|c| c.is_ascii_digit())
}

/// Strip formatting characters, keeping a leading `+`.
///
/// Returns `None` if the result is not 7-15 digits.
#[must_use]
pub fn normalize_phone(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let (plus, rest) = trimmed
        .strip_prefix('+')
        .map_or(("", trimmed), |rest| ("+", rest));

    let mut digits = String::with_capacity(rest.len());
    for c in rest.chars() {
        match c {
            '0'..='9' => digits.push(c),
            ' ' | '-' | '(' | ')' | '.' => {}
            _ => return None,
        }
    }

    if (MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits.len()) {
        Some(format!("{plus}{digits}"))
    } else {
        None
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid() -> AddressInput {
        AddressInput {
            full_name: "Asha Rao".to_owned(),
            street: "12 MG Road".to_owned(),
            city: "Bengaluru".to_owned(),
            state: "Karnataka".to_owned(),
            zip_code: "560001".to_owned(),
            country: "India".to_owned(),
            phone_number: "+91 98450 12345".to_owned(),
            address_type: AddressType::Home,
            is_default: false,
        }
    }

    #[test]
    fn accepts_complete_address() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn reports_every_blank_field() {
        let input = AddressInput {
            full_name: " ".to_owned(),
            street: String::new(),
            city: String::new(),
            state: String::new(),
            zip_code: String::new(),
            country: String::new(),
            phone_number: String::new(),
            address_type: AddressType::Work,
            is_default: true,
        };
        let errors = input.validate().unwrap_err();
        assert_eq!(errors.errors().len(), 7);
        assert!(errors.has("fullName"));
        assert!(errors.has("phoneNumber"));
    }

    #[test]
    fn rejects_bad_zip_and_phone() {
        let mut input = valid();
        input.zip_code = "ABCDE".to_owned();
        input.phone_number = "call me".to_owned();
        let errors = input.validate().unwrap_err();
        assert!(errors.has("zipCode"));
        assert!(errors.has("phoneNumber"));
    }

    #[test]
    fn normalizes_phone_numbers() {
        assert_eq!(
            normalize_phone("+91 (984) 501-2345").as_deref(),
            Some("+919845012345")
        );
        assert_eq!(normalize_phone("12345"), None);
        assert_eq!(normalize_phone("98450x12345"), None);
    }

    #[test]
    fn normalized_trims_fields() {
        let mut input = valid();
        input.city = "  Mysuru ".to_owned();
        input.zip_code = " sw1a 1aa ".to_owned();
        let out = input.normalized();
        assert_eq!(out.city, "Mysuru");
        assert_eq!(out.zip_code, "SW1A 1AA");
        assert_eq!(out.phone_number, "+919845012345");
    }

    #[test]
    fn deserializes_camel_case_with_defaults() {
        let json = r#"{
            "fullName": "Asha", "street": "1 Rd", "city": "Pune", "state": "MH",
            "zipCode": "411001", "country": "India", "phoneNumber": "9876543210"
        }"#;
        let input: AddressInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.address_type, AddressType::Home);
        assert!(!input.is_default);
    }
}
