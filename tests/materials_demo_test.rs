use anyhow::Result;
use yaml_prop::{Property, PropertyArgs, PropertyDumper, PropertyLoader, Value};

const DEMO: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/demos/materials/ss316.yaml");

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * b.abs().max(1.0)
}

fn load_demo() -> Result<Vec<Value>> {
    Ok(PropertyLoader::new().load_all_file(DEMO)?)
}

fn scalar(property: &dyn Property, args: PropertyArgs) -> Result<f64> {
    let value = property.evaluate(&args)?;
    value
        .as_scalar()
        .ok_or_else(|| anyhow::anyhow!("expected a scalar, found shape {:?}", value.shape()))
}

#[test]
fn test_demo_has_two_documents() -> Result<()> {
    let documents = load_demo()?;
    assert_eq!(documents.len(), 2);

    let paths: Vec<String> = documents[0]
        .properties()
        .into_iter()
        .map(|(path, _)| path)
        .collect();
    assert_eq!(
        paths,
        vec![
            "constants.density",
            "constants.poisson",
            "thermal.conductivity",
            "thermal.expansion",
            "mechanical.elastic_modulus",
            "mechanical.yield_strength",
        ]
    );
    assert!(documents[1].properties().is_empty());
    Ok(())
}

#[test]
fn test_constants_in_base_units() -> Result<()> {
    let documents = load_demo()?;
    let density = documents[0]
        .find_property("density")
        .ok_or_else(|| anyhow::anyhow!("density missing"))?;
    assert_eq!(density.output_unit(), "kg/m^3");
    assert!((scalar(density, PropertyArgs::new())? - 7990.0).abs() < 1e-6);

    let poisson = documents[0]
        .find_property("Poisson ratio")
        .ok_or_else(|| anyhow::anyhow!("poisson missing"))?;
    assert_eq!(poisson.output_unit(), "dimensionless");
    Ok(())
}

#[test]
fn test_conductivity_table() -> Result<()> {
    let documents = load_demo()?;
    let k = documents[0]
        .find_property("thermal.conductivity")
        .ok_or_else(|| anyhow::anyhow!("conductivity missing"))?;

    // 150 degC lies halfway between the 100 and 200 degC entries
    let mid = scalar(k, PropertyArgs::new().arg(423.15))?;
    assert!((mid - 15.9).abs() < 1e-6);

    // clamped to the last grid point
    let hot = scalar(k, PropertyArgs::new().kwarg("temperature", 2000.0))?;
    assert!(close(hot, 21.8));

    let at_default = scalar(k, PropertyArgs::new())?;
    assert!(close(at_default, 14.0));
    Ok(())
}

#[test]
fn test_expansion_lambda_in_declared_units() -> Result<()> {
    let documents = load_demo()?;
    let alpha = documents[0]
        .find_property("expansion")
        .ok_or_else(|| anyhow::anyhow!("expansion missing"))?;
    assert_eq!(alpha.output_unit(), "1/K");

    let at_default = scalar(alpha, PropertyArgs::new())?;
    let expected = (15.9 + 4.8e-3 * 20.0 - 1.5e-6 * 400.0) * 1e-6;
    assert!((at_default - expected).abs() < 1e-15);

    // below 20 degC
    assert!(alpha.evaluate(&PropertyArgs::new().arg(250.0)).is_err());
    Ok(())
}

#[test]
fn test_elastic_modulus_string_expression() -> Result<()> {
    let documents = load_demo()?;
    let modulus = documents[0]
        .find_property("Elastic modulus")
        .ok_or_else(|| anyhow::anyhow!("elastic modulus missing"))?;
    let values = modulus.evaluate(&PropertyArgs::new().arg(vec![293.15, 393.15]))?;
    assert!((values.as_slice()[0] - 201.66e9).abs() < 1.0);
    assert!((values.as_slice()[1] - (201.66 - 8.42) * 1e9).abs() < 1.0);
    Ok(())
}

#[test]
fn test_two_dimensional_yield_table() -> Result<()> {
    let documents = load_demo()?;
    let yield_strength = documents[0]
        .find_property("yield_strength")
        .ok_or_else(|| anyhow::anyhow!("yield strength missing"))?;

    assert!((scalar(yield_strength, PropertyArgs::new())? - 250e6).abs() < 1e-3);

    let fast = scalar(
        yield_strength,
        PropertyArgs::new().arg(473.15).kwarg("STRAIN_RATE", 1.0),
    )?;
    assert!((fast - 215e6).abs() < 1e-3);

    // broadcast: one strain rate, two temperatures
    let values = yield_strength.evaluate(&PropertyArgs::new().arg(vec![293.15, 573.15]))?;
    assert_eq!(values.shape(), &[2]);
    assert!((values.as_slice()[1] - 165e6).abs() < 1.0);
    Ok(())
}

#[test]
fn test_arrays_and_numexpr() -> Result<()> {
    let documents = load_demo()?;
    let shared = &documents[1];

    let grid = shared
        .get("grid")
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow::anyhow!("grid missing"))?;
    assert_eq!(grid.shape(), &[2, 3]);

    let circumference = shared
        .get("circumference")
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow::anyhow!("circumference missing"))?;
    assert!(close(circumference.as_slice()[0], std::f64::consts::PI));
    assert!(close(circumference.as_slice()[1], 2.0 * std::f64::consts::PI));

    let scale = shared
        .get("scale")
        .and_then(Value::as_f64)
        .ok_or_else(|| anyhow::anyhow!("scale missing"))?;
    assert!(close(scale, 2f64.sqrt() * 10.0));
    Ok(())
}

#[test]
fn test_dump_reloads_with_same_behavior() -> Result<()> {
    let loader = PropertyLoader::new();
    let documents = loader.load_all_file(DEMO)?;
    let text = PropertyDumper::new().dump_all(&documents)?;
    assert!(text.contains("!table"));
    assert!(text.contains("!lambda"));

    let reloaded = loader.load_all(&text)?;
    assert_eq!(reloaded.len(), 2);

    for (path, original) in documents[0].properties() {
        let copy = reloaded[0]
            .find_property(&path)
            .ok_or_else(|| anyhow::anyhow!("{} lost in the dump", path))?;
        assert_eq!(copy.output_unit(), original.output_unit());
        let a = original.evaluate(&PropertyArgs::new())?;
        let b = copy.evaluate(&PropertyArgs::new())?;
        assert_eq!(a.shape(), b.shape());
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() <= 1e-9 * x.abs().max(1.0), "{}: {} != {}", path, x, y);
        }
    }
    Ok(())
}
