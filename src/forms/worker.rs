use chrono::NaiveDate;

use super::address::{with_address, AddressForm};
use super::{is_valid_email, parse_date, parse_number, required_text, FieldErrors, FormData};
use crate::money;

/// Validated worker fields. `daily_rate` is in øre.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub position: String,
    pub daily_rate: i64,
    pub start_date: NaiveDate,
    pub is_active: bool,
}

impl WorkerForm {
    /// `today` is used when no start date was submitted.
    pub fn parse(form: &FormData, today: NaiveDate) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();

        let name = required_text(form, "name", "Name is required.", &mut errors);
        let email = form.text_or_empty("email");
        if !is_valid_email(&email) {
            errors.add("email", "A valid email address is required.");
        }
        let phone = required_text(form, "phone", "Phone number is required.", &mut errors);
        let position = required_text(form, "position", "Position is required.", &mut errors);

        let rate = form.text("dailyRate").as_deref().and_then(parse_number);
        match rate {
            Some(rate) if rate < 0.0 => errors.add("dailyRate", "Daily rate cannot be negative."),
            Some(rate) if rate > money::MAX_AMOUNT => errors.add(
                "dailyRate",
                format!("Daily rate cannot exceed {}.", money::MAX_AMOUNT),
            ),
            Some(rate) if rate >= 1.0 => {}
            _ => errors.add("dailyRate", "Daily rate is required."),
        }

        let start_date = match form.text("startDate") {
            None => Some(today),
            Some(raw) => parse_date(&raw),
        };
        if start_date.is_none() {
            errors.add("startDate", "Invalid date.");
        }

        let is_active = form.checked("isActive");

        errors.into_result(|| Self {
            name,
            email,
            phone,
            position,
            daily_rate: money::to_minor(rate.unwrap_or_default()),
            start_date: start_date.unwrap_or(today),
            is_active,
        })
    }

    pub fn parse_with_address(
        form: &FormData,
        today: NaiveDate,
    ) -> Result<(Self, AddressForm), FieldErrors> {
        with_address(form, Self::parse(form, today))
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

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
    }

    #[test]
    fn rate_is_stored_in_ore() {
        let worker = WorkerForm::parse(
            &form(&[
                ("name", "Mads"),
                ("email", "mads@rahmaler.dk"),
                ("phone", "22 33 44 55"),
                ("position", "Maler"),
                ("dailyRate", "1850.5"),
                ("startDate", "2023-02-01"),
                ("isActive", "on"),
            ]),
            today(),
        )
        .unwrap();

        assert_eq!(worker.daily_rate, 185050);
        assert_eq!(worker.start_date, NaiveDate::from_ymd_opt(2023, 2, 1).unwrap());
        assert!(worker.is_active);
    }

    #[test]
    fn missing_start_date_means_today_and_unchecked_is_inactive() {
        let worker = WorkerForm::parse(
            &form(&[
                ("name", "Mads"),
                ("email", "mads@rahmaler.dk"),
                ("phone", "22 33 44 55"),
                ("position", "Maler"),
                ("dailyRate", "1500"),
            ]),
            today(),
        )
        .unwrap();

        assert_eq!(worker.start_date, today());
        assert!(!worker.is_active);
    }

    #[test]
    fn rate_bounds() {
        let base = [
            ("name", "Mads"),
            ("email", "mads@rahmaler.dk"),
            ("phone", "22 33 44 55"),
            ("position", "Maler"),
        ];
        for (rate, message) in [
            ("-5", "Daily rate cannot be negative."),
            ("0.5", "Daily rate is required."),
            ("", "Daily rate is required."),
            ("abc", "Daily rate is required."),
            ("1e300", "Daily rate cannot exceed 10000000."),
        ] {
            let mut pairs = base.to_vec();
            pairs.push(("dailyRate", rate));
            let errors = WorkerForm::parse(&form(&pairs), today()).unwrap_err();
            assert_eq!(errors.get("dailyRate"), Some(&[message.to_string()][..]));
        }
    }

    #[test]
    fn bad_start_date_is_rejected() {
        let errors = WorkerForm::parse(&form(&[("startDate", "01/02/2023")]), today()).unwrap_err();
        assert!(errors.contains("startDate"));
        assert!(errors.contains("email"));
    }
}
