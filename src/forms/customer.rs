use std::str::FromStr;

use super::address::{with_address, AddressForm};
use super::{is_valid_email, required_text, FieldErrors, FormData};
use crate::models::CustomerKind;

/// Validated customer fields.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub kind: CustomerKind,
    pub cvr_number: Option<String>,
}

impl CustomerForm {
    pub fn parse(form: &FormData) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();

        let name = required_text(form, "name", "Name is required.", &mut errors);
        let email = form.text_or_empty("email");
        if !is_valid_email(&email) {
            errors.add("email", "Please enter a valid email address.");
        }
        let phone = required_text(form, "phone", "Phone number is required.", &mut errors);

        let kind = form
            .text("type")
            .and_then(|kind| CustomerKind::from_str(&kind).ok());
        if kind.is_none() {
            errors.add(
                "type",
                "Customer type must be either 'private' or 'company'.",
            );
        }

        let cvr_number = form.text("cvr_number");

        errors.into_result(|| {
            let kind = kind.unwrap_or(CustomerKind::Private);
            Self {
                name,
                email,
                phone,
                // only companies carry a CVR number
                cvr_number: cvr_number.filter(|_| kind == CustomerKind::Company),
                kind,
            }
        })
    }

    /// Customer fields together with the mandatory address.
    pub fn parse_with_address(form: &FormData) -> Result<(Self, AddressForm), FieldErrors> {
        with_address(form, Self::parse(form))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> FormData {
        FormData::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn valid() -> Vec<(&'static str, &'static str)> {
        vec![
            ("name", "Hansen ApS"),
            ("email", "kontakt@hansen.dk"),
            ("phone", "12 34 56 78"),
            ("type", "company"),
            ("cvr_number", "87654321"),
            ("street", "Vestergade 2"),
            ("postalCode", "1456"),
            ("city", "København K"),
        ]
    }

    #[test]
    fn company_keeps_cvr() {
        let (customer, address) = CustomerForm::parse_with_address(&form(&valid())).unwrap();
        assert_eq!(customer.kind, CustomerKind::Company);
        assert_eq!(customer.cvr_number.as_deref(), Some("87654321"));
        assert_eq!(address.postal_code, "1456");
    }

    #[test]
    fn private_customer_drops_cvr() {
        let mut pairs = valid();
        pairs[3] = ("type", "private");
        let customer = CustomerForm::parse(&form(&pairs)).unwrap();
        assert_eq!(customer.kind, CustomerKind::Private);
        assert_eq!(customer.cvr_number, None);
    }

    #[test]
    fn reports_every_bad_field() {
        let errors = CustomerForm::parse(&form(&[("email", "nope"), ("type", "partner")])).unwrap_err();
        assert!(errors.contains("name"));
        assert!(errors.contains("phone"));
        assert_eq!(
            errors.get("email"),
            Some(&["Please enter a valid email address.".to_string()][..])
        );
        assert!(errors.contains("type"));
    }
}
