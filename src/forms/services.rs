//! Service lines submitted as indexed form keys.

use std::collections::BTreeMap;

use uuid::Uuid;

use super::{parse_number, parse_uuid, FieldErrors};
use crate::money::{MAX_AMOUNT, MAX_QUANTITY};

/// Either an existing catalogue service or a name to look up (or create).
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceRef {
    Id(Uuid),
    Name(String),
}

/// A validated line. `amount` is the unit price in kroner as submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceLine {
    pub service: ServiceRef,
    pub quantity: f64,
    pub amount: f64,
}

/// One line as submitted, before validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawServiceLine {
    pub service_id: Option<String>,
    pub service_name: Option<String>,
    pub quantity: Option<String>,
    pub amount: Option<String>,
}

/// Which bounds apply to a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRules {
    /// quantity > 0, required
    Project,
    /// quantity >= 1, defaults to 1
    Invoice,
}

/// Splits `services[2][amount]` or `services[2].amount` into `(2, "amount")`.
fn split_service_key(key: &str) -> Option<(usize, &str)> {
    let rest = key.strip_prefix("services[")?;
    let (index, rest) = rest.split_once(']')?;
    let index = index.parse().ok()?;
    let field = match rest.strip_prefix('.') {
        Some(field) => field,
        None => rest.strip_prefix('[')?.strip_suffix(']')?,
    };
    if field.is_empty() || !field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    Some((index, field))
}

/// Collects indexed service keys into lines ordered by index. Sparse
/// indexes are compacted; unknown fields are ignored.
pub fn parse_indexed_services(pairs: &[(String, String)]) -> Vec<RawServiceLine> {
    let mut lines: BTreeMap<usize, RawServiceLine> = BTreeMap::new();

    for (key, value) in pairs {
        let Some((index, field)) = split_service_key(key) else {
            continue;
        };
        let line = lines.entry(index).or_default();
        let value = Some(value.trim().to_string()).filter(|v| !v.is_empty());
        match field {
            "serviceId" => line.service_id = value,
            "serviceName" => line.service_name = value,
            "quantity" => line.quantity = value,
            "amount" => line.amount = value,
            _ => {}
        }
    }

    lines.into_values().collect()
}

/// Validates every line; messages are collected under `services`.
pub fn validate_lines(
    raw: Vec<RawServiceLine>,
    rules: LineRules,
) -> Result<Vec<ServiceLine>, FieldErrors> {
    let mut errors = FieldErrors::new();
    let mut lines = Vec::with_capacity(raw.len());

    for (position, line) in raw.into_iter().enumerate() {
        let row = position + 1;

        let service = match (line.service_id.as_deref(), line.service_name) {
            (Some(id), _) => match parse_uuid(id) {
                Some(id) => Some(ServiceRef::Id(id)),
                None => {
                    errors.add("services", format!("Line {row}: invalid service id."));
                    None
                }
            },
            (None, Some(name)) => Some(ServiceRef::Name(name)),
            (None, None) => {
                errors.add(
                    "services",
                    format!("Line {row}: Either service ID or service name is required."),
                );
                None
            }
        };

        let quantity = match (line.quantity.as_deref(), rules) {
            (None, LineRules::Invoice) => Some(1.0),
            (raw, _) => raw.and_then(parse_number),
        };
        let quantity = match (quantity, rules) {
            (Some(q), _) if q > MAX_QUANTITY => {
                errors.add(
                    "services",
                    format!("Line {row}: Quantity cannot exceed {MAX_QUANTITY}."),
                );
                None
            }
            (Some(q), LineRules::Project) if q > 0.0 => Some(q),
            (Some(q), LineRules::Invoice) if q >= 1.0 => Some(q),
            (_, LineRules::Project) => {
                errors.add("services", format!("Line {row}: Quantity must be greater than 0."));
                None
            }
            (_, LineRules::Invoice) => {
                errors.add("services", format!("Line {row}: Quantity must be at least 1."));
                None
            }
        };

        let amount = match line.amount.as_deref() {
            None => Some(0.0),
            Some(raw) => parse_number(raw),
        };
        let amount = match amount {
            Some(a) if a > MAX_AMOUNT => {
                errors.add("services", format!("Line {row}: Amount cannot exceed {MAX_AMOUNT}."));
                None
            }
            Some(a) if a >= 0.0 => Some(a),
            _ => {
                errors.add("services", format!("Line {row}: Amount must be non-negative."));
                None
            }
        };

        if let (Some(service), Some(quantity), Some(amount)) = (service, quantity, amount) {
            lines.push(ServiceLine {
                service,
                quantity,
                amount,
            });
        }
    }

    errors.into_result(|| lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn both_key_styles_and_sparse_indexes() {
        let raw = parse_indexed_services(&pairs(&[
            ("services[4][serviceName]", "Spartling"),
            ("services[4][amount]", "120"),
            ("name", "ignored"),
            ("services[1].serviceName", "Maling"),
            ("services[1].quantity", "3"),
            ("services[1].unknown", "x"),
        ]));

        assert_eq!(raw.len(), 2);
        assert_eq!(raw[0].service_name.as_deref(), Some("Maling"));
        assert_eq!(raw[0].quantity.as_deref(), Some("3"));
        assert_eq!(raw[1].service_name.as_deref(), Some("Spartling"));
        assert_eq!(raw[1].amount.as_deref(), Some("120"));
    }

    #[test]
    fn malformed_keys_are_skipped() {
        assert_eq!(split_service_key("services[x][amount]"), None);
        assert_eq!(split_service_key("services[1]amount"), None);
        assert_eq!(split_service_key("services[1][]"), None);
        assert_eq!(split_service_key("services[0][amount]"), Some((0, "amount")));
    }

    #[test]
    fn invoice_quantity_defaults_to_one() {
        let lines = validate_lines(
            parse_indexed_services(&pairs(&[
                ("services[0][serviceName]", "Maling"),
                ("services[0][amount]", "450.5"),
            ])),
            LineRules::Invoice,
        )
        .unwrap();

        assert_eq!(
            lines,
            vec![ServiceLine {
                service: ServiceRef::Name("Maling".into()),
                quantity: 1.0,
                amount: 450.5,
            }]
        );
    }

    #[test]
    fn id_wins_over_name() {
        let id = Uuid::new_v4().to_string();
        let lines = validate_lines(
            vec![RawServiceLine {
                service_id: Some(id.clone()),
                service_name: Some("Maling".into()),
                quantity: Some("2".into()),
                amount: Some("10".into()),
            }],
            LineRules::Project,
        )
        .unwrap();
        assert_eq!(lines[0].service, ServiceRef::Id(Uuid::parse_str(&id).unwrap()));
    }

    #[test]
    fn project_requires_positive_quantity() {
        let errors = validate_lines(
            vec![RawServiceLine {
                service_name: Some("Maling".into()),
                quantity: Some("0".into()),
                ..Default::default()
            }],
            LineRules::Project,
        )
        .unwrap_err();
        assert_eq!(
            errors.get("services"),
            Some(&["Line 1: Quantity must be greater than 0.".to_string()][..])
        );
    }

    #[test]
    fn invoice_rejects_fractions_below_one_and_negative_amounts() {
        let errors = validate_lines(
            vec![
                RawServiceLine {
                    service_name: Some("Maling".into()),
                    quantity: Some("0.5".into()),
                    ..Default::default()
                },
                RawServiceLine {
                    amount: Some("-1".into()),
                    ..Default::default()
                },
            ],
            LineRules::Invoice,
        )
        .unwrap_err();
        let messages = errors.get("services").unwrap();
        assert_eq!(messages.len(), 3);
        assert!(messages[1].contains("service name is required"));
    }

    #[test]
    fn oversized_amounts_and_quantities_are_rejected() {
        let errors = validate_lines(
            parse_indexed_services(&pairs(&[
                ("services[0][serviceName]", "Maling"),
                ("services[0][amount]", "1e300"),
                ("services[1][serviceName]", "Spartling"),
                ("services[1][amount]", "100"),
                ("services[1][quantity]", "1e300"),
            ])),
            LineRules::Invoice,
        )
        .unwrap_err();

        assert_eq!(
            errors.get("services"),
            Some(
                &[
                    "Line 1: Amount cannot exceed 10000000.".to_string(),
                    "Line 2: Quantity cannot exceed 100000.".to_string(),
                ][..]
            )
        );
    }
}
