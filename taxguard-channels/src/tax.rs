//! Pakistani salaried income tax schedule (2024-25).

/// One row of the bracket table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaxBracket {
    /// Inclusive upper bound in rupees; `None` for the top bracket
    pub upper: Option<f64>,
    /// Marginal rate applied above the previous bracket's upper bound
    pub rate: f64,
    /// Tax owed at the previous bracket's upper bound
    pub base: f64,
}

/// Fixed bracket table, ordered by upper bound.
pub const TAX_BRACKETS: [TaxBracket; 6] = [
    TaxBracket { upper: Some(600_000.0), rate: 0.0, base: 0.0 },
    TaxBracket { upper: Some(1_200_000.0), rate: 0.05, base: 0.0 },
    TaxBracket { upper: Some(2_400_000.0), rate: 0.15, base: 30_000.0 },
    TaxBracket { upper: Some(3_600_000.0), rate: 0.25, base: 210_000.0 },
    TaxBracket { upper: Some(6_000_000.0), rate: 0.30, base: 510_000.0 },
    TaxBracket { upper: None, rate: 0.35, base: 1_230_000.0 },
];

/// Annual tax owed on `annual_income`, rounded to paisa.
///
/// Non-positive and NaN incomes owe nothing.
pub fn compute_tax(annual_income: f64) -> f64 {
    if !(annual_income > 0.0) {
        return 0.0;
    }

    let mut lower = 0.0;
    let mut bracket = &TAX_BRACKETS[0];
    for candidate in &TAX_BRACKETS {
        bracket = candidate;
        match candidate.upper {
            Some(upper) if annual_income > upper => lower = upper,
            _ => break,
        }
    }
    round2(bracket.base + (annual_income - lower) * bracket.rate)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Render the table as the bullet list embedded in the system prompt.
pub fn bracket_lines() -> String {
    let mut lines = Vec::with_capacity(TAX_BRACKETS.len());
    let mut lower: Option<f64> = None;

    for bracket in &TAX_BRACKETS {
        let rate = format!("{}%", (bracket.rate * 100.0).round() as u32);
        let line = match (lower, bracket.upper) {
            (None, Some(upper)) => format!("- Up to Rs. {}: {rate}", rupees(upper)),
            (Some(from), Some(upper)) => {
                format!("- Rs. {} to {}: {rate}", rupees(from + 1.0), rupees(upper))
            }
            (Some(from), None) => format!("- Above Rs. {}: {rate}", rupees(from)),
            (None, None) => format!("- All income: {rate}"),
        };
        lines.push(line);
        lower = bracket.upper;
    }

    lines.join("\n")
}

/// Format whole rupees with thousands separators.
fn rupees(amount: f64) -> String {
    let digits = (amount.round() as u64).to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
