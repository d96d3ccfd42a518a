use super::labels::Labels;
use super::ui;
use crate::core::{Calculator, CurrencySet, Evaluation, RateTable};
use anyhow::{Result, bail};

/// Renders the calculator's current result the way the result panel shows it.
pub fn render_conversion(calculator: &Calculator, labels: &Labels) -> String {
    let currencies = calculator.currencies();
    let source = currencies.code_of(calculator.source());
    let target = currencies.code_of(calculator.target());

    match calculator.evaluate() {
        Evaluation::Computed(conversion) => {
            let result = ui::format_number(
                conversion.result,
                ui::decimals_for(calculator.target()),
            );
            let amount = ui::format_number(
                conversion.amount,
                ui::decimals_for(calculator.source()),
            );
            let rate_decimals = if conversion.rate.fract() == 0.0 { 0 } else { 2 };
            format!(
                "{} {}\n{}",
                ui::style_text(&result, ui::StyleType::ResultValue),
                target,
                ui::style_text(
                    &format!(
                        "{amount} {source} {} {}",
                        conversion.direction.symbol(),
                        ui::format_number(conversion.rate, rate_decimals)
                    ),
                    ui::StyleType::Subtle
                )
            )
        }
        Evaluation::RateUnavailable => {
            let foreign = calculator
                .foreign()
                .map(|code| code.to_string())
                .unwrap_or_default();
            ui::style_text(
                &format!(
                    "{} {foreign}, {}",
                    labels.rate_unavailable, labels.enter_rate
                ),
                ui::StyleType::Error,
            )
        }
        Evaluation::NotComputable => format!("--- {target}"),
    }
}

/// Sets up a calculator for a one-off conversion.
pub fn prepare(
    currencies: CurrencySet,
    table: RateTable,
    amount: &str,
    from: &str,
    to: &str,
    rate: Option<&str>,
) -> Result<Calculator> {
    let source = currencies.parse(from)?;
    let target = currencies.parse(to)?;
    if source == target {
        bail!("Cannot convert {} to itself", currencies.code_of(&source));
    }
    if source.is_local() == target.is_local() {
        bail!(
            "One side of a conversion must be {}",
            currencies.local_code()
        );
    }

    let mut calculator = Calculator::new(currencies, table);
    calculator.select_source(source);
    calculator.select_target(target);
    calculator.set_amount_text(amount);
    if let Some(rate) = rate {
        calculator.set_rate_text(rate);
    }
    Ok(calculator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Language;
    use crate::core::currency::{Currency, code, test_set};

    fn en() -> &'static Labels {
        Labels::for_language(Language::En)
    }

    fn table() -> RateTable {
        RateTable::new()
            .with_rate(code("THB"), 132.0)
            .with_rate(code("USD"), 4500.0)
    }

    #[test]
    fn test_prepare_directions() {
        let calc = prepare(test_set(), table(), "100", "thb", "mmk", None).unwrap();
        assert_eq!(calc.evaluate().result().unwrap().result, 13200.0);

        let calc = prepare(test_set(), table(), "13200", "MMK", "THB", None).unwrap();
        assert_eq!(calc.source(), &Currency::Local);
        assert!((calc.evaluate().result().unwrap().result - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_prepare_manual_rate() {
        let calc = prepare(test_set(), table(), "1,500", "USD", "MMK", Some("4,500")).unwrap();
        assert!(!calc.is_automatic());
        let output = render_conversion(&calc, en());
        assert!(output.contains("6,750,000"));
        assert!(output.contains("1,500.00 USD × 4,500"));
    }

    #[test]
    fn test_prepare_rejects_bad_pairs() {
        let err = prepare(test_set(), table(), "1", "USD", "THB", None).unwrap_err();
        assert_eq!(err.to_string(), "One side of a conversion must be MMK");
        let err = prepare(test_set(), table(), "1", "USD", "usd", None).unwrap_err();
        assert_eq!(err.to_string(), "Cannot convert USD to itself");
        assert!(prepare(test_set(), table(), "1", "JPY", "MMK", None).is_err());
    }

    #[test]
    fn test_render_states() {
        let calc = prepare(test_set(), table(), "", "THB", "MMK", None).unwrap();
        assert_eq!(render_conversion(&calc, en()), "--- MMK");

        let calc = prepare(test_set(), table(), "10", "SGD", "MMK", None).unwrap();
        assert!(render_conversion(&calc, en()).contains("Rate unavailable for SGD"));

        let calc = prepare(test_set(), table(), "13200", "MMK", "THB", None).unwrap();
        let output = render_conversion(&calc, en());
        assert!(output.contains("100.00"));
        assert!(output.contains("13,200 MMK ÷ 132"));
    }

    #[test]
    fn test_render_rate_unavailable_in_myanmar() {
        let calc = prepare(test_set(), table(), "10", "SGD", "MMK", None).unwrap();
        let output = render_conversion(&calc, Labels::for_language(Language::Mm));
        assert!(output.contains("ပေါက်ဈေး မရှိပါ: SGD, ပေါက်ဈေးထည့်ပါ"));
    }
}
