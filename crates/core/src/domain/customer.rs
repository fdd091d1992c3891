use std::fmt;

use chrono::{DateTime, FixedOffset, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::tier::{classify, Tier};
use crate::validation::{violations, FieldViolation};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(pub Uuid);

impl CustomerId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The four caller-supplied attributes of a customer.
///
/// Updates replace every field of the stored record with the draft, so a `None` here clears
/// whatever value was stored before.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CustomerDraft {
    pub name: String,
    pub email: String,
    pub annual_spend: Option<Decimal>,
    pub last_purchase_date: Option<DateTime<FixedOffset>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub email: String,
    pub annual_spend: Option<Decimal>,
    pub last_purchase_date: Option<DateTime<FixedOffset>>,
}

impl Customer {
    pub fn from_draft(id: CustomerId, draft: CustomerDraft) -> Self {
        Self {
            id,
            name: draft.name,
            email: draft.email,
            annual_spend: draft.annual_spend,
            last_purchase_date: draft.last_purchase_date,
        }
    }

    pub fn replace_attributes(&mut self, draft: CustomerDraft) {
        self.name = draft.name;
        self.email = draft.email;
        self.annual_spend = draft.annual_spend;
        self.last_purchase_date = draft.last_purchase_date;
    }
}

/// Read-side projection of a customer with its loyalty tier derived at `now`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerView {
    pub id: CustomerId,
    pub name: String,
    pub email: String,
    #[serde(with = "rust_decimal::serde::arbitrary_precision_option")]
    pub annual_spend: Option<Decimal>,
    pub last_purchase_date: Option<DateTime<FixedOffset>>,
    pub tier: Tier,
}

impl CustomerView {
    pub fn project(customer: Customer, now: DateTime<Utc>) -> Self {
        let tier = classify(customer.annual_spend, customer.last_purchase_date, now);
        Self {
            id: customer.id,
            name: customer.name,
            email: customer.email,
            annual_spend: customer.annual_spend,
            last_purchase_date: customer.last_purchase_date,
            tier,
        }
    }
}

/// Key used to look a customer up; rendered into not-found messages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CustomerLookup {
    Id(CustomerId),
    Name(String),
    Email(String),
}

impl fmt::Display for CustomerLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id: {id}"),
            Self::Name(name) => write!(f, "name: {name}"),
            Self::Email(email) => write!(f, "email: {email}"),
        }
    }
}

const BLANK_MESSAGE: &str = "must not be blank";

/// Inbound payload for create and update.
///
/// `name` and `email` are optional at the serde level so that a missing field surfaces as a
/// field violation instead of a body rejection.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRequest {
    #[validate(
        required(message = "must not be blank"),
        custom(function = "not_blank", message = "must not be blank")
    )]
    pub name: Option<String>,
    #[validate(
        required(message = "must not be blank"),
        custom(function = "not_blank", message = "must not be blank"),
        email(message = "must be a well-formed email address")
    )]
    pub email: Option<String>,
    pub annual_spend: Option<Decimal>,
    pub last_purchase_date: Option<DateTime<FixedOffset>>,
}

impl CustomerRequest {
    pub fn into_draft(self) -> Result<CustomerDraft, Vec<FieldViolation>> {
        if let Err(errors) = self.validate() {
            return Err(violations(&errors));
        }

        let (Some(name), Some(email)) = (self.name, self.email) else {
            return Err(vec![
                FieldViolation::new("email", BLANK_MESSAGE),
                FieldViolation::new("name", BLANK_MESSAGE),
            ]);
        };

        Ok(CustomerDraft {
            name,
            email,
            annual_spend: self.annual_spend,
            last_purchase_date: self.last_purchase_date,
        })
    }
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use rust_decimal::Decimal;
    use uuid::Uuid;

    use super::{
        Customer, CustomerDraft, CustomerId, CustomerLookup, CustomerRequest, CustomerView,
    };
    use crate::tier::Tier;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).single().expect("valid timestamp")
    }

    fn request(name: Option<&str>, email: Option<&str>) -> CustomerRequest {
        CustomerRequest {
            name: name.map(str::to_string),
            email: email.map(str::to_string),
            annual_spend: Some(Decimal::new(1500, 0)),
            last_purchase_date: None,
        }
    }

    #[test]
    fn valid_request_becomes_draft() {
        let draft =
            request(Some("John Doe"), Some("john@x.com")).into_draft().expect("valid request");

        assert_eq!(draft.name, "John Doe");
        assert_eq!(draft.email, "john@x.com");
        assert_eq!(draft.annual_spend, Some(Decimal::new(1500, 0)));
        assert_eq!(draft.last_purchase_date, None);
    }

    #[test]
    fn malformed_email_is_reported_against_email_field() {
        let violations = request(Some("John Doe"), Some("not-a-valid-email"))
            .into_draft()
            .expect_err("email should be rejected");

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "email");
        assert_eq!(violations[0].message, "must be a well-formed email address");
    }

    #[test]
    fn blank_and_missing_fields_yield_one_violation_per_field() {
        let violations =
            request(Some("   "), None).into_draft().expect_err("both fields should be rejected");

        let fields: Vec<&str> = violations.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["email", "name"]);
        assert!(violations.iter().all(|v| v.message == "must not be blank"));
    }

    #[test]
    fn request_deserializes_camel_case_payload() {
        let payload = r#"{
            "name": "Alice",
            "email": "alice@example.com",
            "annualSpend": 12000.50,
            "lastPurchaseDate": "2026-05-19T09:30:00+02:00"
        }"#;

        let request: CustomerRequest = serde_json::from_str(payload).expect("parse request");

        assert_eq!(request.annual_spend, Some(Decimal::new(1_200_050, 2)));
        assert_eq!(request.annual_spend.map(|spend| spend.scale()), Some(2));
        let purchased = request.last_purchase_date.expect("purchase date");
        assert_eq!(purchased.offset().local_minus_utc(), 2 * 3600);
    }

    #[test]
    fn view_serializes_with_derived_tier() {
        let customer = Customer::from_draft(
            CustomerId(Uuid::nil()),
            CustomerDraft {
                name: "Bob".to_string(),
                email: "bob@example.com".to_string(),
                annual_spend: Some(Decimal::new(2000, 0)),
                last_purchase_date: Some(
                    DateTime::parse_from_rfc3339("2026-08-19T12:00:00Z").expect("timestamp"),
                ),
            },
        );

        let view = CustomerView::project(customer, now());
        assert_eq!(view.tier, Tier::Gold);

        let json = serde_json::to_value(&view).expect("serialize view");
        assert_eq!(json["id"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(json["annualSpend"].to_string(), "2000");
        assert_eq!(json["tier"], "Gold");
        assert!(json["lastPurchaseDate"].is_string());
    }

    #[test]
    fn view_of_customer_without_spend_keeps_nulls() {
        let customer = Customer::from_draft(
            CustomerId::generate(),
            CustomerDraft {
                name: "Carol".to_string(),
                email: "carol@example.com".to_string(),
                annual_spend: None,
                last_purchase_date: None,
            },
        );

        let json = serde_json::to_value(CustomerView::project(customer, now())).expect("json");
        assert!(json["annualSpend"].is_null());
        assert!(json["lastPurchaseDate"].is_null());
        assert_eq!(json["tier"], "Silver");
    }

    #[test]
    fn replace_attributes_overwrites_every_mutable_field() {
        let mut customer = Customer::from_draft(
            CustomerId::generate(),
            CustomerDraft {
                name: "Alice".to_string(),
                email: "alice@example.com".to_string(),
                annual_spend: Some(Decimal::new(1500, 0)),
                last_purchase_date: Some(
                    DateTime::parse_from_rfc3339("2026-07-01T00:00:00Z").expect("timestamp"),
                ),
            },
        );
        let id = customer.id;

        customer.replace_attributes(CustomerDraft {
            name: "Alice Updated".to_string(),
            email: "alice.new@example.com".to_string(),
            annual_spend: None,
            last_purchase_date: None,
        });

        assert_eq!(customer.id, id);
        assert_eq!(customer.name, "Alice Updated");
        assert_eq!(customer.annual_spend, None);
        assert_eq!(customer.last_purchase_date, None);
    }

    #[test]
    fn lookup_renders_key_and_value() {
        assert_eq!(CustomerLookup::Name("Alice".to_string()).to_string(), "name: Alice");
        assert_eq!(
            CustomerLookup::Id(CustomerId(Uuid::nil())).to_string(),
            "id: 00000000-0000-0000-0000-000000000000"
        );
    }
}
