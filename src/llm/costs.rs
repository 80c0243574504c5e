//! Per-token prices for well-known models (USD).

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Rate used when the model is not in the table.
pub fn default_cost() -> (Decimal, Decimal) {
    (dec!(0.00001), dec!(0.00003))
}

/// Input and output price per token, matched on model-name prefix.
pub fn model_cost(model: &str) -> Option<(Decimal, Decimal)> {
    let model = model.to_lowercase();
    // Longer prefixes first so "gpt-4o-mini" does not match "gpt-4o".
    let table: &[(&str, Decimal, Decimal)] = &[
        ("gpt-4o-mini", dec!(0.00000015), dec!(0.0000006)),
        ("gpt-4o", dec!(0.0000025), dec!(0.00001)),
        ("gpt-4-turbo", dec!(0.00001), dec!(0.00003)),
        ("gpt-4.1-mini", dec!(0.0000004), dec!(0.0000016)),
        ("gpt-4.1", dec!(0.000002), dec!(0.000008)),
        ("gpt-3.5-turbo", dec!(0.0000005), dec!(0.0000015)),
        ("claude-3-5-haiku", dec!(0.0000008), dec!(0.000004)),
        ("claude-3-5-sonnet", dec!(0.000003), dec!(0.000015)),
        ("claude-sonnet-4", dec!(0.000003), dec!(0.000015)),
        ("claude-opus-4", dec!(0.000015), dec!(0.000075)),
    ];

    table
        .iter()
        .find(|(prefix, _, _)| model.starts_with(prefix))
        .map(|(_, input, output)| (*input, *output))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_models_resolve() {
        assert_eq!(
            model_cost("gpt-4-turbo"),
            Some((dec!(0.00001), dec!(0.00003)))
        );
        assert_eq!(
            model_cost("claude-sonnet-4-20250514"),
            Some((dec!(0.000003), dec!(0.000015)))
        );
    }

    #[test]
    fn mini_does_not_match_parent() {
        let (input, _) = model_cost("gpt-4o-mini-2024-07-18").unwrap();
        assert_eq!(input, dec!(0.00000015));
    }

    #[test]
    fn unknown_model_is_none() {
        assert!(model_cost("llama-3-70b").is_none());
    }
}
