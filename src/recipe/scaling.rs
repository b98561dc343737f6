//! Best-effort scaling of free-text ingredient quantities such as
//! `1 1/2 cups flour`, `½ tsp salt` or `2-3 cloves garlic`.

const VULGAR_FRACTIONS: &[(char, f64)] = &[
    ('¼', 0.25),
    ('½', 0.5),
    ('¾', 0.75),
    ('⅓', 1.0 / 3.0),
    ('⅔', 2.0 / 3.0),
    ('⅛', 0.125),
    ('⅜', 0.375),
    ('⅝', 0.625),
    ('⅞', 0.875),
];

const NICE_FRACTIONS: &[(f64, &str)] = &[
    (0.125, "1/8"),
    (0.25, "1/4"),
    (1.0 / 3.0, "1/3"),
    (0.5, "1/2"),
    (2.0 / 3.0, "2/3"),
    (0.75, "3/4"),
];

const SNAP: f64 = 0.02;

#[derive(Debug, Clone, PartialEq)]
pub struct Quantity<'a> {
    pub amount: f64,
    /// Upper bound of a range like `2-3`.
    pub upper: Option<f64>,
    /// Unit and ingredient text following the number, including leading whitespace.
    pub rest: &'a str,
}

fn vulgar(c: char) -> Option<f64> {
    VULGAR_FRACTIONS
        .iter()
        .find(|(v, _)| *v == c)
        .map(|(_, value)| *value)
}

fn split_digits(s: &str) -> (&str, &str) {
    let end = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    s.split_at(end)
}

/// `n/d` at the very start of `s`.
fn fraction(s: &str) -> Option<(f64, &str)> {
    let (numerator, rest) = split_digits(s);
    let rest = rest.strip_prefix('/')?;
    let (denominator, rest) = split_digits(rest);
    let numerator: f64 = numerator.parse().ok()?;
    let denominator: f64 = denominator.parse().ok()?;
    if denominator == 0.0 {
        return None;
    }
    Some((numerator / denominator, rest))
}

fn leading_vulgar(s: &str) -> Option<(f64, &str)> {
    let c = s.chars().next()?;
    vulgar(c).map(|value| (value, &s[c.len_utf8()..]))
}

fn amount(s: &str) -> Option<(f64, &str)> {
    if let Some(found) = leading_vulgar(s) {
        return Some(found);
    }
    if let Some(found) = fraction(s) {
        return Some(found);
    }

    let (whole, rest) = split_digits(s);
    if whole.is_empty() {
        return None;
    }

    if let Some(decimals) = rest.strip_prefix('.') {
        let (digits, rest) = split_digits(decimals);
        if !digits.is_empty() {
            let value: f64 = format!("{whole}.{digits}").parse().ok()?;
            return Some((value, rest));
        }
    }

    let whole: f64 = whole.parse().ok()?;
    if let Some((part, rest)) = leading_vulgar(rest) {
        return Some((whole + part, rest));
    }

    let spaced = rest.trim_start_matches(' ');
    if spaced.len() < rest.len() {
        if let Some((part, after)) = leading_vulgar(spaced).or_else(|| fraction(spaced)) {
            if part < 1.0 {
                return Some((whole + part, after));
            }
        }
    }

    Some((whole, rest))
}

pub fn parse_quantity(text: &str) -> Option<Quantity<'_>> {
    let (value, rest) = amount(text.trim_start())?;

    let range = rest
        .trim_start()
        .strip_prefix(['-', '–'])
        .and_then(|after| amount(after.trim_start()));

    match range {
        Some((upper, after)) if upper >= value => Some(Quantity {
            amount: value,
            upper: Some(upper),
            rest: after,
        }),
        _ => Some(Quantity {
            amount: value,
            upper: None,
            rest,
        }),
    }
}

pub fn format_amount(value: f64) -> String {
    let whole = value.trunc();
    let frac = value - whole;

    if frac < SNAP {
        return format!("{}", whole as i64);
    }
    if frac > 1.0 - SNAP {
        return format!("{}", whole as i64 + 1);
    }

    if let Some((_, label)) = NICE_FRACTIONS
        .iter()
        .find(|(nice, _)| (frac - nice).abs() < SNAP)
    {
        return if whole == 0.0 {
            label.to_string()
        } else {
            format!("{} {}", whole as i64, label)
        };
    }

    let decimal = format!("{value:.2}");
    decimal
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

/// Multiplies the leading amount of `quantity` by `factor`.
///
/// Returns the input unchanged when no amount can be read or the factor is
/// not a positive number.
pub fn scale_quantity(quantity: &str, factor: f64) -> String {
    if !factor.is_finite() || factor <= 0.0 {
        return quantity.to_string();
    }

    match parse_quantity(quantity) {
        Some(Quantity {
            amount,
            upper: Some(upper),
            rest,
        }) => format!(
            "{}-{}{}",
            format_amount(amount * factor),
            format_amount(upper * factor),
            rest
        ),
        Some(Quantity {
            amount,
            upper: None,
            rest,
        }) => format!("{}{}", format_amount(amount * factor), rest),
        None => quantity.to_string(),
    }
}
