use std::fmt;

/// Symbols of the SI base units, in exponent order.
pub const BASE_SYMBOLS: [&str; 7] = ["m", "kg", "s", "K", "A", "mol", "cd"];

const BASE_NAMES: [&str; 7] = [
    "length",
    "mass",
    "time",
    "temperature",
    "current",
    "substance",
    "luminosity",
];

/// Largest denominator a decimal exponent may reduce to, e.g. `0.125` -> `1/8`.
pub const MAX_DENOMINATOR: i32 = 1000;

/// A reduced rational exponent with a positive denominator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Exponent {
    num: i32,
    den: i32,
}

impl Exponent {
    pub const fn integer(n: i32) -> Self {
        Exponent { num: n, den: 1 }
    }

    /// `None` when the denominator is zero or the reduced ratio leaves `i32`.
    pub fn new(num: i128, den: i128) -> Option<Self> {
        if den == 0 {
            return None;
        }
        let g = gcd(num.unsigned_abs(), den.unsigned_abs()).max(1) as i128;
        let sign = if den < 0 { -1 } else { 1 };
        Some(Exponent {
            num: i32::try_from(sign * num / g).ok()?,
            den: i32::try_from(sign * den / g).ok()?,
        })
    }

    /// Exact rational for a decimal such as `0.5` or `-1.25`.
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() || value.abs() > i32::MAX as f64 {
            return None;
        }
        (1..=MAX_DENOMINATOR).find_map(|den| {
            let scaled = value * den as f64;
            let rounded = scaled.round();
            if (scaled - rounded).abs() <= 1e-9 * den as f64 {
                Exponent::new(rounded as i128, den as i128)
            } else {
                None
            }
        })
    }

    pub fn numer(&self) -> i32 {
        self.num
    }

    pub fn denom(&self) -> i32 {
        self.den
    }

    pub fn is_zero(&self) -> bool {
        self.num == 0
    }

    pub fn as_f64(&self) -> f64 {
        self.num as f64 / self.den as f64
    }

    pub fn checked_add(self, rhs: Exponent) -> Option<Exponent> {
        Exponent::new(
            self.num as i128 * rhs.den as i128 + rhs.num as i128 * self.den as i128,
            self.den as i128 * rhs.den as i128,
        )
    }

    pub fn checked_mul(self, rhs: Exponent) -> Option<Exponent> {
        Exponent::new(
            self.num as i128 * rhs.num as i128,
            self.den as i128 * rhs.den as i128,
        )
    }
}

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

impl fmt::Display for Exponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            // decimal text reparses to the same ratio
            write!(f, "{}", self.as_f64())
        }
    }
}

/// Rational exponents over the seven SI base dimensions.
///
/// Arithmetic is checked: `None` means an exponent left the `i32` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimension([Exponent; 7]);

impl Default for Dimension {
    fn default() -> Self {
        Self::DIMENSIONLESS
    }
}

impl Dimension {
    pub const DIMENSIONLESS: Dimension = Dimension::new([0; 7]);

    pub const fn new(e: [i32; 7]) -> Self {
        Dimension([
            Exponent::integer(e[0]),
            Exponent::integer(e[1]),
            Exponent::integer(e[2]),
            Exponent::integer(e[3]),
            Exponent::integer(e[4]),
            Exponent::integer(e[5]),
            Exponent::integer(e[6]),
        ])
    }

    pub fn is_dimensionless(&self) -> bool {
        self.0.iter().all(Exponent::is_zero)
    }

    pub fn checked_mul(self, rhs: Dimension) -> Option<Dimension> {
        let mut out = self.0;
        for (e, r) in out.iter_mut().zip(rhs.0) {
            *e = e.checked_add(r)?;
        }
        Some(Dimension(out))
    }

    pub fn checked_div(self, rhs: Dimension) -> Option<Dimension> {
        self.checked_mul(rhs.checked_pow(Exponent::integer(-1))?)
    }

    pub fn checked_pow(self, n: Exponent) -> Option<Dimension> {
        let mut out = self.0;
        for e in out.iter_mut() {
            *e = e.checked_mul(n)?;
        }
        Some(Dimension(out))
    }

    /// Canonical base-unit text, e.g. `kg/m^3`, `m*kg/s^3/K` or `kg/m^0.5/s^2`.
    pub fn base_unit(&self) -> String {
        let mut numerator = Vec::new();
        let mut denominator = Vec::new();
        for (symbol, exp) in BASE_SYMBOLS.iter().zip(&self.0) {
            if exp.num > 0 {
                numerator.push(term(symbol, exp.num as i64, exp.den));
            } else if exp.num < 0 {
                denominator.push(term(symbol, -(exp.num as i64), exp.den));
            }
        }

        if numerator.is_empty() && denominator.is_empty() {
            return "dimensionless".to_string();
        }
        let mut text = if numerator.is_empty() {
            "1".to_string()
        } else {
            numerator.join("*")
        };
        for d in denominator {
            text.push('/');
            text.push_str(&d);
        }
        text
    }
}

fn term(symbol: &str, num: i64, den: i32) -> String {
    match (num, den) {
        (1, 1) => symbol.to_string(),
        (num, 1) => format!("{}^{}", symbol, num),
        (num, den) => format!("{}^{}", symbol, num as f64 / den as f64),
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dimensionless() {
            return f.write_str("dimensionless");
        }
        let parts: Vec<String> = BASE_NAMES
            .iter()
            .zip(&self.0)
            .filter(|(_, e)| !e.is_zero())
            .map(|(name, e)| {
                if *e == Exponent::integer(1) {
                    format!("[{}]", name)
                } else {
                    format!("[{}]^{}", name, e)
                }
            })
            .collect();
        f.write_str(&parts.join("*"))
    }
}
