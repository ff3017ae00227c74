//! Pricing validator.
//!
//! A product's subcategory belongs to a category, and the category's name
//! decides whether the product is sold at one flat price or at a fixed set of
//! size variants. `validate` turns the raw `price`/`prices` inputs of a
//! product write into a `Pricing`, so a product never carries both forms or
//! neither.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value;
use thiserror::Error;

use menuhub_core::DomainError;

use crate::product::{Pricing, VariantPrices};

pub const STANDARD_VARIANT_KEYS: [&str; 3] = ["small", "medium", "large"];
pub const DEFAULT_VARIANT_CATEGORIES: [&str; 2] = ["pizza", "пицца"];

/// Prices are stored as `NUMERIC(10, 2)`.
pub const MAX_PRICE_SCALE: u32 = 2;
pub const MAX_PRICE_INTEGER_DIGITS: u32 = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PricingMode {
    Flat,
    Variant { keys: BTreeSet<String> },
}

impl PricingMode {
    /// Variant pricing over small/medium/large.
    pub fn standard_variant() -> Self {
        Self::Variant {
            keys: STANDARD_VARIANT_KEYS.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// Whether an existing pricing already satisfies this mode.
    pub fn admits(&self, pricing: &Pricing) -> bool {
        match (self, pricing) {
            (Self::Flat, Pricing::Flat(_)) => true,
            (Self::Variant { keys }, Pricing::Variant(prices)) => {
                prices.len() == keys.len() && prices.keys().all(|k| keys.contains(k))
            }
            _ => false,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Flat => "flat",
            Self::Variant { .. } => "variant",
        }
    }
}

/// Category name → pricing mode. Names match case-insensitively; unknown
/// categories are flat-priced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingRules {
    modes: HashMap<String, PricingMode>,
}

impl Default for PricingRules {
    fn default() -> Self {
        Self::with_variant_categories(DEFAULT_VARIANT_CATEGORIES)
    }
}

impl PricingRules {
    /// No variant categories at all.
    pub fn flat_only() -> Self {
        Self {
            modes: HashMap::new(),
        }
    }

    /// Every named category gets standard variant pricing.
    pub fn with_variant_categories<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .fold(Self::flat_only(), |rules, name| {
                rules.with_mode(name.as_ref(), PricingMode::standard_variant())
            })
    }

    pub fn with_mode(mut self, category_name: &str, mode: PricingMode) -> Self {
        let key = normalize(category_name);
        if !key.is_empty() {
            self.modes.insert(key, mode);
        }
        self
    }

    pub fn resolve(&self, category_name: &str) -> PricingMode {
        self.modes
            .get(&normalize(category_name))
            .cloned()
            .unwrap_or(PricingMode::Flat)
    }

    /// Lowercased names of every variant-priced category, sorted.
    pub fn variant_categories(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .modes
            .iter()
            .filter(|(_, mode)| matches!(mode, PricingMode::Variant { .. }))
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort_unstable();
        names
    }
}

fn normalize(category_name: &str) -> String {
    category_name.trim().to_lowercase()
}

/// Raw pricing fields exactly as received. Blank strings count as absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PricingPayload<'a> {
    pub price: Option<&'a str>,
    /// JSON object text, e.g. `{"small": 10, "medium": "12.5", "large": 15}`.
    pub prices: Option<&'a str>,
}

impl<'a> PricingPayload<'a> {
    pub fn new(price: Option<&'a str>, prices: Option<&'a str>) -> Self {
        Self { price, prices }
    }

    fn price(&self) -> Option<&'a str> {
        self.price.map(str::trim).filter(|s| !s.is_empty())
    }

    fn prices(&self) -> Option<&'a str> {
        self.prices.map(str::trim).filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteIntent<'a> {
    Create,
    Update { current: &'a Pricing },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PricingError {
    #[error("prices must include all of: {}", .expected.join(", "))]
    IncompleteVariantPrices { expected: Vec<String> },

    #[error("unexpected price variant `{0}`")]
    UnexpectedVariantKey(String),

    #[error("price for `{0}` must be a number greater than 0")]
    NonPositiveVariantPrice(String),

    #[error("prices must be a JSON object: {0}")]
    MalformedVariantPrices(String),

    #[error("{mode}-priced products take only `{expected}`")]
    ConflictingPricingFields {
        mode: &'static str,
        expected: &'static str,
    },

    #[error("price is required and must be a number greater than 0")]
    MissingOrNonPositivePrice,

    #[error("`{0}` must have at most 8 digits before and 2 after the decimal point")]
    PriceOutOfRange(String),
}

impl From<PricingError> for DomainError {
    fn from(err: PricingError) -> Self {
        DomainError::validation(err.to_string())
    }
}

/// Decide the pricing a product write ends up with.
pub fn validate(
    mode: &PricingMode,
    payload: &PricingPayload<'_>,
    intent: WriteIntent<'_>,
) -> Result<Pricing, PricingError> {
    match mode {
        PricingMode::Flat => validate_flat(mode, payload, intent),
        PricingMode::Variant { keys } => validate_variant(mode, keys, payload, intent),
    }
}

fn validate_flat(
    mode: &PricingMode,
    payload: &PricingPayload<'_>,
    intent: WriteIntent<'_>,
) -> Result<Pricing, PricingError> {
    if payload.prices().is_some() {
        return Err(PricingError::ConflictingPricingFields {
            mode: mode.label(),
            expected: "price",
        });
    }

    let Some(raw) = payload.price() else {
        return keep_current(mode, intent).ok_or(PricingError::MissingOrNonPositivePrice);
    };

    match parse_decimal(raw) {
        Some(price) if price > Decimal::ZERO => {
            if !fits_column(price) {
                return Err(PricingError::PriceOutOfRange("price".to_string()));
            }
            Ok(Pricing::Flat(price))
        }
        _ => Err(PricingError::MissingOrNonPositivePrice),
    }
}

fn validate_variant(
    mode: &PricingMode,
    keys: &BTreeSet<String>,
    payload: &PricingPayload<'_>,
    intent: WriteIntent<'_>,
) -> Result<Pricing, PricingError> {
    if payload.price().is_some() {
        return Err(PricingError::ConflictingPricingFields {
            mode: mode.label(),
            expected: "prices",
        });
    }

    let incomplete = || PricingError::IncompleteVariantPrices {
        expected: keys.iter().cloned().collect(),
    };

    let Some(raw) = payload.prices() else {
        return keep_current(mode, intent).ok_or_else(incomplete);
    };

    let object = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(object)) => object,
        Ok(other) => return Err(PricingError::MalformedVariantPrices(format!("got {other}"))),
        Err(e) => return Err(PricingError::MalformedVariantPrices(e.to_string())),
    };

    if let Some(unexpected) = object.keys().find(|k| !keys.contains(k.as_str())) {
        return Err(PricingError::UnexpectedVariantKey(unexpected.clone()));
    }
    if keys.iter().any(|k| !object.contains_key(k)) {
        return Err(incomplete());
    }

    let mut prices = BTreeMap::new();
    for (key, value) in &object {
        let price = match value {
            Value::Number(n) => parse_decimal(&n.to_string()),
            Value::String(s) => parse_decimal(s),
            _ => None,
        };
        match price {
            Some(price) if price > Decimal::ZERO => {
                if !fits_column(price) {
                    return Err(PricingError::PriceOutOfRange(key.clone()));
                }
                prices.insert(key.clone(), price);
            }
            _ => return Err(PricingError::NonPositiveVariantPrice(key.clone())),
        }
    }

    Ok(Pricing::Variant(VariantPrices::new(prices)))
}

fn keep_current(mode: &PricingMode, intent: WriteIntent<'_>) -> Option<Pricing> {
    match intent {
        WriteIntent::Update { current } if mode.admits(current) => Some(current.clone()),
        _ => None,
    }
}

/// At most two fractional digits (trailing zeros ignored) and below 10^8.
fn fits_column(price: Decimal) -> bool {
    let limit = Decimal::from(10u64.pow(MAX_PRICE_INTEGER_DIGITS));
    price.normalize().scale() <= MAX_PRICE_SCALE && price < limit
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn variant() -> PricingMode {
        PricingMode::standard_variant()
    }

    fn sizes(small: &str, medium: &str, large: &str) -> Pricing {
        Pricing::Variant(
            [("small", small), ("medium", medium), ("large", large)]
                .into_iter()
                .map(|(k, v)| (k.to_string(), dec(v)))
                .collect(),
        )
    }

    #[test]
    fn rules_resolve_case_insensitively() {
        let rules = PricingRules::default();
        assert_eq!(rules.resolve("Pizza"), variant());
        assert_eq!(rules.resolve("ПИЦЦА"), variant());
        assert_eq!(rules.resolve(" pizza "), variant());
        assert_eq!(rules.resolve("Drinks"), PricingMode::Flat);
        assert_eq!(rules.variant_categories(), vec!["pizza", "пицца"]);
    }

    #[test]
    fn flat_only_rules_never_resolve_variant() {
        assert_eq!(PricingRules::flat_only().resolve("pizza"), PricingMode::Flat);
    }

    #[test]
    fn variant_create_accepts_numbers_and_numeric_strings() {
        let payload = PricingPayload::new(None, Some(r#"{"small": 10, "medium": "12.5", "large": 15.75}"#));
        let pricing = validate(&variant(), &payload, WriteIntent::Create).unwrap();
        assert_eq!(pricing, sizes("10", "12.5", "15.75"));
    }

    #[test]
    fn variant_create_requires_every_key() {
        let payload = PricingPayload::new(None, Some(r#"{"small": 10, "medium": 12}"#));
        assert!(matches!(
            validate(&variant(), &payload, WriteIntent::Create),
            Err(PricingError::IncompleteVariantPrices { .. })
        ));

        let missing = PricingPayload::default();
        assert!(matches!(
            validate(&variant(), &missing, WriteIntent::Create),
            Err(PricingError::IncompleteVariantPrices { .. })
        ));
    }

    #[test]
    fn variant_rejects_unknown_keys() {
        let payload = PricingPayload::new(
            None,
            Some(r#"{"small": 1, "medium": 2, "large": 3, "xl": 4}"#),
        );
        assert_eq!(
            validate(&variant(), &payload, WriteIntent::Create),
            Err(PricingError::UnexpectedVariantKey("xl".into()))
        );
    }

    #[test]
    fn variant_rejects_non_positive_and_non_numeric_values() {
        for body in [
            r#"{"small": 0, "medium": 2, "large": 3}"#,
            r#"{"small": 1, "medium": -2, "large": 3}"#,
            r#"{"small": 1, "medium": 2, "large": "lots"}"#,
            r#"{"small": 1, "medium": 2, "large": null}"#,
        ] {
            let payload = PricingPayload::new(None, Some(body));
            assert!(
                matches!(
                    validate(&variant(), &payload, WriteIntent::Create),
                    Err(PricingError::NonPositiveVariantPrice(_))
                ),
                "{body}"
            );
        }
    }

    #[test]
    fn variant_rejects_non_object_json() {
        for body in ["[1,2,3]", "not json", "12"] {
            let payload = PricingPayload::new(None, Some(body));
            assert!(matches!(
                validate(&variant(), &payload, WriteIntent::Create),
                Err(PricingError::MalformedVariantPrices(_))
            ));
        }
    }

    #[test]
    fn variant_rejects_flat_price_alongside() {
        let payload = PricingPayload::new(Some("10"), Some(r#"{"small": 1, "medium": 2, "large": 3}"#));
        assert!(matches!(
            validate(&variant(), &payload, WriteIntent::Create),
            Err(PricingError::ConflictingPricingFields { .. })
        ));
    }

    #[test]
    fn flat_create_rules() {
        let ok = validate(&PricingMode::Flat, &PricingPayload::new(Some(" 4.50 "), None), WriteIntent::Create);
        assert_eq!(ok, Ok(Pricing::Flat(dec("4.50"))));

        for price in [None, Some(""), Some("0"), Some("-1"), Some("abc")] {
            assert_eq!(
                validate(&PricingMode::Flat, &PricingPayload::new(price, None), WriteIntent::Create),
                Err(PricingError::MissingOrNonPositivePrice),
                "{price:?}"
            );
        }
    }

    #[test]
    fn flat_rejects_prices_alongside() {
        let payload = PricingPayload::new(Some("5"), Some(r#"{"small": 1}"#));
        assert!(matches!(
            validate(&PricingMode::Flat, &payload, WriteIntent::Create),
            Err(PricingError::ConflictingPricingFields { mode: "flat", .. })
        ));
    }

    #[test]
    fn flat_rejects_variant_map_alone() {
        let payload = PricingPayload::new(None, Some(r#"{"small": 1, "medium": 2, "large": 3}"#));
        assert_eq!(
            validate(&PricingMode::Flat, &payload, WriteIntent::Create),
            Err(PricingError::ConflictingPricingFields {
                mode: "flat",
                expected: "price",
            })
        );
    }

    #[test]
    fn flat_price_must_fit_two_decimal_places_and_eight_digits() {
        for raw in ["0.001", "1.005", "123456789012.5", "100000000", "1e20"] {
            assert_eq!(
                validate(&PricingMode::Flat, &PricingPayload::new(Some(raw), None), WriteIntent::Create),
                Err(PricingError::PriceOutOfRange("price".into())),
                "{raw}"
            );
        }

        for raw in ["99999999.99", "0.01", "4.500"] {
            assert!(
                validate(&PricingMode::Flat, &PricingPayload::new(Some(raw), None), WriteIntent::Create).is_ok(),
                "{raw}"
            );
        }
    }

    #[test]
    fn variant_prices_must_fit_column() {
        for body in [
            r#"{"small": 0.001, "medium": 2, "large": 3}"#,
            r#"{"small": 1, "medium": "123456789012.5", "large": 3}"#,
        ] {
            let payload = PricingPayload::new(None, Some(body));
            assert!(
                matches!(
                    validate(&variant(), &payload, WriteIntent::Create),
                    Err(PricingError::PriceOutOfRange(_))
                ),
                "{body}"
            );
        }
    }

    #[test]
    fn blank_other_field_is_not_a_conflict() {
        let payload = PricingPayload::new(Some("5"), Some("   "));
        assert_eq!(
            validate(&PricingMode::Flat, &payload, WriteIntent::Create),
            Ok(Pricing::Flat(dec("5")))
        );
    }

    #[test]
    fn update_keeps_matching_pricing_when_omitted() {
        let flat = Pricing::Flat(dec("3"));
        assert_eq!(
            validate(&PricingMode::Flat, &PricingPayload::default(), WriteIntent::Update { current: &flat }),
            Ok(flat.clone())
        );

        let variant_pricing = sizes("1", "2", "3");
        assert_eq!(
            validate(&variant(), &PricingPayload::default(), WriteIntent::Update { current: &variant_pricing }),
            Ok(variant_pricing.clone())
        );
    }

    #[test]
    fn update_switching_mode_requires_new_field() {
        let flat = Pricing::Flat(dec("3"));
        assert!(matches!(
            validate(&variant(), &PricingPayload::default(), WriteIntent::Update { current: &flat }),
            Err(PricingError::IncompleteVariantPrices { .. })
        ));

        let switched = validate(
            &variant(),
            &PricingPayload::new(None, Some(r#"{"small": 8, "medium": 10, "large": 12}"#)),
            WriteIntent::Update { current: &flat },
        )
        .unwrap();
        assert_eq!(switched.price(), None);
        assert_eq!(switched, sizes("8", "10", "12"));

        let variant_pricing = sizes("1", "2", "3");
        assert_eq!(
            validate(&PricingMode::Flat, &PricingPayload::default(), WriteIntent::Update { current: &variant_pricing }),
            Err(PricingError::MissingOrNonPositivePrice)
        );
    }

    #[test]
    fn update_with_new_value_replaces_current() {
        let flat = Pricing::Flat(dec("3"));
        assert_eq!(
            validate(&PricingMode::Flat, &PricingPayload::new(Some("7.25"), None), WriteIntent::Update { current: &flat }),
            Ok(Pricing::Flat(dec("7.25")))
        );
    }

    #[test]
    fn errors_become_validation_errors() {
        let err: DomainError = PricingError::MissingOrNonPositivePrice.into();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    proptest! {
        #[test]
        fn positive_flat_prices_round_trip(cents in 1u32..10_000_000) {
            let raw = format!("{}.{:02}", cents / 100, cents % 100);
            let pricing = validate(&PricingMode::Flat, &PricingPayload::new(Some(&raw), None), WriteIntent::Create).unwrap();
            prop_assert_eq!(pricing, Pricing::Flat(Decimal::new(i64::from(cents), 2)));
        }

        #[test]
        fn sub_cent_prices_are_rejected(whole in 0u32..100_000, thousandths in 1u32..10) {
            let raw = format!("{whole}.00{thousandths}");
            prop_assert_eq!(
                validate(&PricingMode::Flat, &PricingPayload::new(Some(&raw), None), WriteIntent::Create),
                Err(PricingError::PriceOutOfRange("price".into()))
            );
        }

        #[test]
        fn prices_of_nine_or_more_integer_digits_are_rejected(whole in 100_000_000u64..1_000_000_000_000) {
            let raw = format!(r#"{{"small": 1, "medium": 2, "large": {whole}}}"#);
            prop_assert_eq!(
                validate(&variant(), &PricingPayload::new(None, Some(&raw)), WriteIntent::Create),
                Err(PricingError::PriceOutOfRange("large".into()))
            );
        }

        #[test]
        fn both_fields_always_conflict(price in 1u32..1000, a in 1u32..1000, b in 1u32..1000, c in 1u32..1000, is_variant in any::<bool>()) {
            let mode = if is_variant { variant() } else { PricingMode::Flat };
            let raw_price = price.to_string();
            let raw_prices = format!(r#"{{"small": {a}, "medium": {b}, "large": {c}}}"#);
            let payload = PricingPayload::new(Some(&raw_price), Some(&raw_prices));
            let is_conflict = matches!(
                validate(&mode, &payload, WriteIntent::Create),
                Err(PricingError::ConflictingPricingFields { .. })
            );
            prop_assert!(is_conflict);
        }

        #[test]
        fn accepted_variant_pricing_matches_mode(a in 1u32..1000, b in 1u32..1000, c in 1u32..1000) {
            let raw = format!(r#"{{"small": {a}, "medium": {b}, "large": {c}}}"#);
            let pricing = validate(&variant(), &PricingPayload::new(None, Some(&raw)), WriteIntent::Create).unwrap();
            prop_assert!(variant().admits(&pricing));
            prop_assert!(!PricingMode::Flat.admits(&pricing));
        }
    }
}
