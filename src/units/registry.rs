use super::dimension::Dimension;
use super::parser::{parse_unit_expr, UnitExpr};
use crate::math::array::NdArray;
use crate::utils::error::{PropError, Result};
use std::collections::HashMap;

/// A resolved unit: `base = value * factor + offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Unit {
    pub factor: f64,
    pub offset: f64,
    pub dimension: Dimension,
}

impl Unit {
    pub const fn new(factor: f64, dimension: Dimension) -> Self {
        Self {
            factor,
            offset: 0.0,
            dimension,
        }
    }

    pub fn to_base(&self, value: f64) -> f64 {
        value * self.factor + self.offset
    }

    pub fn from_base(&self, value: f64) -> f64 {
        (value - self.offset) / self.factor
    }

    fn is_offset(&self) -> bool {
        self.offset != 0.0
    }
}

const fn dim(l: i32, m: i32, t: i32, th: i32, i: i32, n: i32, j: i32) -> Dimension {
    Dimension::new([l, m, t, th, i, n, j])
}

const NONE: Dimension = dim(0, 0, 0, 0, 0, 0, 0);
const LENGTH: Dimension = dim(1, 0, 0, 0, 0, 0, 0);
const MASS: Dimension = dim(0, 1, 0, 0, 0, 0, 0);
const TIME: Dimension = dim(0, 0, 1, 0, 0, 0, 0);
const TEMPERATURE: Dimension = dim(0, 0, 0, 1, 0, 0, 0);
const CURRENT: Dimension = dim(0, 0, 0, 0, 1, 0, 0);
const SUBSTANCE: Dimension = dim(0, 0, 0, 0, 0, 1, 0);
const LUMINOSITY: Dimension = dim(0, 0, 0, 0, 0, 0, 1);
const FORCE: Dimension = dim(1, 1, -2, 0, 0, 0, 0);
const PRESSURE: Dimension = dim(-1, 1, -2, 0, 0, 0, 0);
const ENERGY: Dimension = dim(2, 1, -2, 0, 0, 0, 0);
const POWER: Dimension = dim(2, 1, -3, 0, 0, 0, 0);
const CHARGE: Dimension = dim(0, 0, 1, 0, 1, 0, 0);
const VOLTAGE: Dimension = dim(2, 1, -3, 0, -1, 0, 0);
const RESISTANCE: Dimension = dim(2, 1, -3, 0, -2, 0, 0);
const CONDUCTANCE: Dimension = dim(-2, -1, 3, 0, 2, 0, 0);
const CAPACITANCE: Dimension = dim(-2, -1, 4, 0, 2, 0, 0);
const FLUX: Dimension = dim(2, 1, -2, 0, -1, 0, 0);
const INDUCTANCE: Dimension = dim(2, 1, -2, 0, -2, 0, 0);
const FLUX_DENSITY: Dimension = dim(0, 1, -2, 0, -1, 0, 0);
const FREQUENCY: Dimension = dim(0, 0, -1, 0, 0, 0, 0);
const VOLUME: Dimension = dim(3, 0, 0, 0, 0, 0, 0);

const BUILTIN_UNITS: &[(&[&str], f64, Dimension)] = &[
    (&["m", "meter", "metre"], 1.0, LENGTH),
    (&["in", "inch"], 0.0254, LENGTH),
    (&["ft", "foot", "feet"], 0.3048, LENGTH),
    (&["yd", "yard"], 0.9144, LENGTH),
    (&["mi", "mile"], 1609.344, LENGTH),
    (&["Å", "angstrom"], 1e-10, LENGTH),
    (&["g", "gram"], 1e-3, MASS),
    (&["kg", "kilogram"], 1.0, MASS),
    (&["t", "tonne"], 1e3, MASS),
    (&["lb", "pound"], 0.45359237, MASS),
    (&["s", "sec", "second"], 1.0, TIME),
    (&["min", "minute"], 60.0, TIME),
    (&["h", "hr", "hour"], 3600.0, TIME),
    (&["day"], 86400.0, TIME),
    (&["K", "kelvin", "degK"], 1.0, TEMPERATURE),
    (&["degR", "rankine"], 5.0 / 9.0, TEMPERATURE),
    (&["delta_degC"], 1.0, TEMPERATURE),
    (&["delta_degF"], 5.0 / 9.0, TEMPERATURE),
    (&["A", "ampere", "amp"], 1.0, CURRENT),
    (&["mol", "mole"], 1.0, SUBSTANCE),
    (&["cd", "candela"], 1.0, LUMINOSITY),
    (&["N", "newton"], 1.0, FORCE),
    (&["lbf"], 4.4482216152605, FORCE),
    (&["Pa", "pascal"], 1.0, PRESSURE),
    (&["bar"], 1e5, PRESSURE),
    (&["atm", "atmosphere"], 101325.0, PRESSURE),
    (&["psi"], 6894.757293168361, PRESSURE),
    (&["torr"], 101325.0 / 760.0, PRESSURE),
    (&["J", "joule"], 1.0, ENERGY),
    (&["cal", "calorie"], 4.184, ENERGY),
    (&["Btu", "BTU"], 1055.05585262, ENERGY),
    (&["eV", "electron_volt"], 1.602176634e-19, ENERGY),
    (&["Wh"], 3600.0, ENERGY),
    (&["W", "watt"], 1.0, POWER),
    (&["C", "coulomb"], 1.0, CHARGE),
    (&["V", "volt"], 1.0, VOLTAGE),
    (&["Ω", "ohm", "Ohm"], 1.0, RESISTANCE),
    (&["S", "siemens"], 1.0, CONDUCTANCE),
    (&["F", "farad"], 1.0, CAPACITANCE),
    (&["Wb", "weber"], 1.0, FLUX),
    (&["H", "henry"], 1.0, INDUCTANCE),
    (&["T", "tesla"], 1.0, FLUX_DENSITY),
    (&["Hz", "hertz"], 1.0, FREQUENCY),
    (&["L", "l", "liter", "litre"], 1e-3, VOLUME),
    (&["rad", "radian"], 1.0, NONE),
    (&["deg", "degree"], std::f64::consts::PI / 180.0, NONE),
    (&["percent", "%"], 1e-2, NONE),
    (&["ppm"], 1e-6, NONE),
    (&["dimensionless"], 1.0, NONE),
];

const OFFSET_UNITS: &[(&[&str], f64, f64)] = &[
    (
        &["degC", "celsius", "degree_Celsius", "°C", "℃"],
        1.0,
        273.15,
    ),
    (
        &["degF", "fahrenheit", "degree_Fahrenheit", "°F", "℉"],
        5.0 / 9.0,
        459.67 * 5.0 / 9.0,
    ),
];

const PREFIXES: &[(&str, f64)] = &[
    ("yotta", 1e24),
    ("zetta", 1e21),
    ("exa", 1e18),
    ("peta", 1e15),
    ("tera", 1e12),
    ("giga", 1e9),
    ("mega", 1e6),
    ("kilo", 1e3),
    ("hecto", 1e2),
    ("deka", 1e1),
    ("deci", 1e-1),
    ("centi", 1e-2),
    ("milli", 1e-3),
    ("micro", 1e-6),
    ("nano", 1e-9),
    ("pico", 1e-12),
    ("femto", 1e-15),
    ("atto", 1e-18),
    ("da", 1e1),
    ("Y", 1e24),
    ("Z", 1e21),
    ("E", 1e18),
    ("P", 1e15),
    ("T", 1e12),
    ("G", 1e9),
    ("M", 1e6),
    ("k", 1e3),
    ("h", 1e2),
    ("d", 1e-1),
    ("c", 1e-2),
    ("m", 1e-3),
    ("u", 1e-6),
    ("µ", 1e-6),
    ("μ", 1e-6),
    ("n", 1e-9),
    ("p", 1e-12),
    ("f", 1e-15),
    ("a", 1e-18),
];

/// Preferred display units, one per dimension; later entries win.
pub const DEFAULT_PREFERRED_UNITS: &[&str] = &[
    "m", "kg", "s", "K", "N", "Pa", "J", "W", "C", "V", "Ω", "S", "F", "Wb", "H", "T",
    "kg/m^3", "mm/mm/K", "J/kg/K", "W/m/K", "Ω m",
];

/// Runtime registry of units in the SI (mks) system.
#[derive(Debug, Clone)]
pub struct UnitRegistry {
    units: HashMap<String, Unit>,
    preferred: Vec<String>,
    preferred_by_dimension: HashMap<Dimension, String>,
}

impl Default for UnitRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitRegistry {
    pub fn new() -> Self {
        let mut units = HashMap::new();
        for (names, factor, dimension) in BUILTIN_UNITS {
            for name in *names {
                units.insert(name.to_string(), Unit::new(*factor, *dimension));
            }
        }
        for (names, factor, offset) in OFFSET_UNITS {
            for name in *names {
                units.insert(
                    name.to_string(),
                    Unit {
                        factor: *factor,
                        offset: *offset,
                        dimension: TEMPERATURE,
                    },
                );
            }
        }

        let mut registry = Self {
            units,
            preferred: Vec::new(),
            preferred_by_dimension: HashMap::new(),
        };
        for unit in DEFAULT_PREFERRED_UNITS {
            // built-in preferred units always parse
            if let Ok(dimension) = registry.dimension(unit) {
                registry.preferred.push(unit.to_string());
                registry
                    .preferred_by_dimension
                    .insert(dimension, unit.to_string());
            }
        }
        registry
    }

    /// Defines `name` as a multiple of an existing unit expression, e.g.
    /// `define("ksi", "1000 psi")`.
    pub fn define(&mut self, name: &str, definition: &str) -> Result<()> {
        let valid_name = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_alphanumeric() || c == '_')
            && !name.starts_with(|c: char| c.is_ascii_digit());
        if !valid_name {
            return Err(PropError::UnitParseError {
                unit: name.to_string(),
                reason: "unit names must be identifiers".to_string(),
            });
        }

        // a lone offset unit such as `degC` keeps its offset
        let unit = self.parse(definition)?;
        if self.units.contains_key(name) {
            tracing::warn!("Redefining unit '{}' as '{}'", name, definition);
        }
        self.units.insert(name.to_string(), unit);
        Ok(())
    }

    pub fn preferred(&self) -> &[String] {
        &self.preferred
    }

    pub fn add_preferred(&mut self, unit: &str) -> Result<()> {
        let dimension = self.dimension(unit)?;
        self.preferred.push(unit.to_string());
        self.preferred_by_dimension
            .insert(dimension, unit.to_string());
        Ok(())
    }

    pub fn set_preferred(&mut self, units: &[String]) -> Result<()> {
        self.preferred.clear();
        self.preferred_by_dimension.clear();
        for unit in units {
            self.add_preferred(unit)?;
        }
        Ok(())
    }

    /// Resolves a single unit name, with an optional SI prefix.
    pub fn lookup(&self, name: &str) -> Result<Unit> {
        if let Some(unit) = self.units.get(name) {
            return Ok(*unit);
        }

        let mut prefixes: Vec<&(&str, f64)> = PREFIXES.iter().collect();
        prefixes.sort_by_key(|(prefix, _)| std::cmp::Reverse(prefix.len()));
        for (prefix, scale) in prefixes {
            if let Some(rest) = name.strip_prefix(prefix) {
                if rest.is_empty() {
                    continue;
                }
                if let Some(unit) = self.units.get(rest) {
                    if unit.is_offset() {
                        continue;
                    }
                    return Ok(Unit::new(unit.factor * scale, unit.dimension));
                }
            }
        }

        Err(PropError::UnitParseError {
            unit: name.to_string(),
            reason: "unknown unit".to_string(),
        })
    }

    /// Parses a unit expression. Offset units keep their offset only when
    /// they stand alone; inside products they behave as temperature deltas.
    pub fn parse(&self, text: &str) -> Result<Unit> {
        let text = text.trim();
        let expr = parse_unit_expr(text)?;
        if let UnitExpr::Name(name) = &expr {
            return self.lookup(name);
        }
        let unit = self.resolve(text, &expr)?;
        if !unit.factor.is_finite() || unit.factor == 0.0 {
            return Err(PropError::UnitParseError {
                unit: text.to_string(),
                reason: format!("scale factor {} is out of range", unit.factor),
            });
        }
        Ok(unit)
    }

    fn resolve(&self, text: &str, expr: &UnitExpr) -> Result<Unit> {
        let overflow = || PropError::UnitParseError {
            unit: text.to_string(),
            reason: "dimension exponent overflows".to_string(),
        };
        match expr {
            UnitExpr::Number(value) => Ok(Unit::new(*value, Dimension::DIMENSIONLESS)),
            UnitExpr::Name(name) => {
                let unit = self.lookup(name)?;
                Ok(Unit::new(unit.factor, unit.dimension))
            }
            UnitExpr::Mul(lhs, rhs) => {
                let (lhs, rhs) = (self.resolve(text, lhs)?, self.resolve(text, rhs)?);
                let dimension = lhs.dimension.checked_mul(rhs.dimension).ok_or_else(overflow)?;
                Ok(Unit::new(lhs.factor * rhs.factor, dimension))
            }
            UnitExpr::Div(lhs, rhs) => {
                let (lhs, rhs) = (self.resolve(text, lhs)?, self.resolve(text, rhs)?);
                let dimension = lhs.dimension.checked_div(rhs.dimension).ok_or_else(overflow)?;
                Ok(Unit::new(lhs.factor / rhs.factor, dimension))
            }
            UnitExpr::Pow(base, exponent) => {
                let base = self.resolve(text, base)?;
                let dimension = base.dimension.checked_pow(*exponent).ok_or_else(overflow)?;
                let factor = if exponent.denom() == 1 {
                    base.factor.powi(exponent.numer())
                } else {
                    base.factor.powf(exponent.as_f64())
                };
                Ok(Unit::new(factor, dimension))
            }
        }
    }

    pub fn dimension(&self, text: &str) -> Result<Dimension> {
        Ok(self.parse(text)?.dimension)
    }

    /// Converts values from `old_unit` to `new_unit`.
    pub fn to(&self, value: &NdArray, old_unit: &str, new_unit: &str) -> Result<NdArray> {
        let old = self.parse(old_unit)?;
        let new = self.parse(new_unit)?;
        if old.dimension != new.dimension {
            return Err(PropError::IncompatibleUnitsError {
                from: old_unit.to_string(),
                to: new_unit.to_string(),
            });
        }
        Ok(value.map(|x| new.from_base(old.to_base(x))))
    }

    pub fn to_scalar(&self, value: f64, old_unit: &str, new_unit: &str) -> Result<f64> {
        let converted = self.to(&NdArray::scalar(value), old_unit, new_unit)?;
        Ok(converted.as_slice()[0])
    }

    /// Converts values to SI base units, returning the base unit text.
    pub fn base(&self, value: &NdArray, unit: &str) -> Result<(NdArray, String)> {
        let parsed = self.parse(unit)?;
        Ok((
            value.map(|x| parsed.to_base(x)),
            parsed.dimension.base_unit(),
        ))
    }

    /// Converts values to the preferred unit of their dimension. Values with
    /// no preferred unit come back unchanged.
    pub fn display(&self, value: &NdArray, unit: &str) -> Result<(NdArray, String)> {
        let dimension = self.dimension(unit)?;
        match self.preferred_by_dimension.get(&dimension) {
            Some(preferred) => Ok((self.to(value, unit, preferred)?, preferred.clone())),
            None => Ok((value.clone(), unit.trim().to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * b.abs().max(1.0)
    }

    fn convert(value: f64, from: &str, to: &str) -> f64 {
        UnitRegistry::new().to_scalar(value, from, to).unwrap()
    }

    #[test]
    fn test_prefixed_units() {
        assert!(close(convert(1.0, "mm", "m"), 1e-3));
        assert!(close(convert(2.0, "kPa", "Pa"), 2000.0));
        assert!(close(convert(1.0, "GPa", "MPa"), 1000.0));
        assert!(close(convert(1.0, "µm", "m"), 1e-6));
        assert!(close(convert(5000.0, "g", "kg"), 5.0));
    }

    #[test]
    fn test_compound_units() {
        assert!(close(convert(1.0, "g/cm^3", "kg/m^3"), 1000.0));
        assert!(close(convert(1.0, "kW*h", "J"), 3.6e6));
        assert!(close(convert(1.0, "1e-6/K", "1/K"), 1e-6));
        assert!(close(convert(1.0, "Ω m", "ohm*m"), 1.0));
    }

    #[test]
    fn test_temperature_offsets() {
        assert!(close(convert(25.0, "degC", "K"), 298.15));
        assert!(close(convert(212.0, "degF", "degC"), 100.0));
        assert!(close(convert(0.0, "°C", "degF"), 32.0));
    }

    #[test]
    fn test_offset_unit_in_compound_acts_as_delta() {
        assert!(close(convert(1.0, "J/kg/degC", "J/kg/K"), 1.0));
    }

    #[test]
    fn test_incompatible_units() {
        let registry = UnitRegistry::new();
        assert!(matches!(
            registry.to(&NdArray::scalar(1.0), "m", "s"),
            Err(PropError::IncompatibleUnitsError { .. })
        ));
    }

    #[test]
    fn test_unknown_unit() {
        let registry = UnitRegistry::new();
        assert!(matches!(
            registry.parse("furlong"),
            Err(PropError::UnitParseError { .. })
        ));
    }

    #[test]
    fn test_base_returns_si_unit_text() {
        let registry = UnitRegistry::new();
        let (value, unit) = registry
            .base(&NdArray::scalar(7.99), "g/cm^3")
            .unwrap();
        assert!(close(value.as_scalar().unwrap(), 7990.0));
        assert_eq!(unit, "kg/m^3");

        let (value, unit) = registry.base(&NdArray::scalar(20.0), "degC").unwrap();
        assert!(close(value.as_scalar().unwrap(), 293.15));
        assert_eq!(unit, "K");
    }

    #[test]
    fn test_display_uses_preferred_units() {
        let registry = UnitRegistry::new();
        let (value, unit) = registry.display(&NdArray::scalar(2.0), "kg*m/s^2").unwrap();
        assert_eq!(unit, "N");
        assert!(close(value.as_scalar().unwrap(), 2.0));

        let (value, unit) = registry.display(&NdArray::scalar(1e-5), "1/K").unwrap();
        assert_eq!(unit, "mm/mm/K");
        assert!(close(value.as_scalar().unwrap(), 1e-5));

        // no preferred unit for velocity
        let (value, unit) = registry.display(&NdArray::scalar(3.0), "km/h").unwrap();
        assert_eq!(unit, "km/h");
        assert_eq!(value.as_scalar(), Some(3.0));
    }

    #[test]
    fn test_define_and_preferred() {
        let mut registry = UnitRegistry::new();
        registry.define("ksi", "1000 psi").unwrap();
        assert!(close(
            registry.to_scalar(1.0, "ksi", "psi").unwrap(),
            1000.0
        ));

        registry.add_preferred("MPa").unwrap();
        let (value, unit) = registry.display(&NdArray::scalar(2e6), "Pa").unwrap();
        assert_eq!(unit, "MPa");
        assert!(close(value.as_scalar().unwrap(), 2.0));

        assert!(registry.define("1bad", "m").is_err());
    }

    #[test]
    fn test_defined_offset_unit_keeps_offset() {
        let mut registry = UnitRegistry::new();
        registry.define("C2", "degC").unwrap();
        assert!(close(registry.to_scalar(25.0, "C2", "K").unwrap(), 298.15));
        assert!(close(registry.to_scalar(100.0, "C2", "degF").unwrap(), 212.0));
        // inside a compound it is a delta, like degC
        assert!(close(registry.to_scalar(1.0, "W/m/C2", "W/m/K").unwrap(), 1.0));
    }

    #[test]
    fn test_fractional_powers() {
        let registry = UnitRegistry::new();
        // fracture toughness
        assert!(close(convert(1.0, "MPa*m^0.5", "Pa*m^0.5"), 1e6));
        assert!(close(convert(1.0, "MPa*m^0.5", "MPa*mm^0.5"), 1000f64.sqrt()));
        assert!(close(
            convert(1.0, "psi*in^0.5", "Pa*m^0.5"),
            6894.757293168361 * 0.0254f64.sqrt()
        ));

        let (value, unit) = registry.base(&NdArray::scalar(2.0), "MPa*m^0.5").unwrap();
        assert!(close(value.as_scalar().unwrap(), 2e6));
        assert_eq!(unit, "kg/m^0.5/s^2");
        // the base text parses back to the same dimension
        assert_eq!(
            registry.dimension(&unit).unwrap(),
            registry.dimension("Pa*m^0.5").unwrap()
        );

        assert!(matches!(
            registry.to(&NdArray::scalar(1.0), "m^0.5", "m"),
            Err(PropError::IncompatibleUnitsError { .. })
        ));
    }

    #[test]
    fn test_exponent_overflow_is_a_parse_error() {
        let registry = UnitRegistry::new();
        assert!(registry.parse("((m^1000)^1000)^1000").is_ok());
        for text in [
            "(((m^1000)^1000)^1000)^3",
            "(((m^1000)^1000)^1000)^2 * (((m^1000)^1000)^1000)^0.2",
            "km^1000",
            "mm^1000",
        ] {
            assert!(
                matches!(registry.parse(text), Err(PropError::UnitParseError { .. })),
                "{} parsed",
                text
            );
        }
    }
}
