use serde::Serialize;

use super::{FieldErrors, FormData};

/// A validated street address, ready to insert.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressForm {
    pub street: String,
    pub postal_code: String,
    pub city: String,
}

impl AddressForm {
    /// Reads `street`, `postalCode` and `city`. Error keys are unprefixed;
    /// callers nest them under `address`.
    pub fn parse(form: &FormData) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();

        let street = form.text_or_empty("street");
        let postal_code = form.text_or_empty("postalCode");
        let city = form.text_or_empty("city");

        if street.is_empty() {
            errors.add("street", "Street is required.");
        }
        if postal_code.is_empty() {
            errors.add("postalCode", "Postal code is required.");
        }
        if city.is_empty() {
            errors.add("city", "City is required.");
        }

        errors.into_result(|| Self {
            street,
            postal_code,
            city,
        })
    }
}

/// Parses an owner's fields and its address together so that both sets of
/// errors are reported at once.
pub(crate) fn with_address<T>(
    form: &FormData,
    owner: Result<T, FieldErrors>,
) -> Result<(T, AddressForm), FieldErrors> {
    match (owner, AddressForm::parse(form)) {
        (Ok(owner), Ok(address)) => Ok((owner, address)),
        (owner, address) => {
            let mut errors = owner.err().unwrap_or_default();
            if let Err(address_errors) = address {
                errors.merge_prefixed("address", address_errors);
            }
            Err(errors)
        }
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

    #[test]
    fn trims_every_part() {
        let address = AddressForm::parse(&form(&[
            ("street", " Tingbjerg ås 9 "),
            ("postalCode", "2700"),
            ("city", "Brønshøj "),
        ]))
        .unwrap();

        assert_eq!(address.street, "Tingbjerg ås 9");
        assert_eq!(address.city, "Brønshøj");
    }

    #[test]
    fn owner_and_address_errors_are_reported_together() {
        let owner: Result<(), FieldErrors> = Err(FieldErrors::single("name", "Name is required."));
        let errors = with_address(&form(&[("street", "Vej 1")]), owner).unwrap_err();

        assert!(errors.contains("name"));
        assert!(errors.contains("address.postalCode"));
        assert!(errors.contains("address.city"));
        assert!(!errors.contains("address.street"));
    }
}
