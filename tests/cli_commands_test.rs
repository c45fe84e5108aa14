use anyhow::Result;
use std::fs;
use tempfile::TempDir;
use yaml_prop::{App, PropError, ToolConfig};

const MATERIAL: &str = r#"
k: !table
  name: Thermal conductivity
  arguments: [temperature]
  units: [degC, W/m/K]
  symbols: [T, k]
  defaults: [20]
  values:
    - [0, 100, 200]
    - [14.0, 16.0, 17.0]
E: !function
  name: Elastic modulus
  arguments: [temperature]
  units: [K, GPa]
  symbols: [T, E]
  defaults: [293.15]
  bounds: [[273.15, 873.15]]
  expression: 200 - 0.08 * (temperature - 273.15)
"#;

fn write_material(dir: &TempDir) -> Result<std::path::PathBuf> {
    let path = dir.path().join("material.yaml");
    fs::write(&path, MATERIAL)?;
    Ok(path)
}

#[test]
fn test_sample_with_configured_preferred_units() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let file = write_material(&temp_dir)?;

    let config = ToolConfig::from_toml_str(
        r#"
[units]
preferred = ["degC", "GPa"]

[sample]
points = 7
"#,
    )?;
    let app = App::new(config)?;

    let sample = app.sample(&file, "E", "temperature", None, &[])?;
    assert_eq!(sample.x.len(), 7);
    assert_eq!(sample.x_unit, "degC");
    assert_eq!(sample.y_unit, "GPa");
    assert!((sample.x[0] - 0.0).abs() < 1e-9);
    assert!((sample.x[6] - 600.0).abs() < 1e-9);
    assert!((sample.y[0] - 200.0).abs() < 1e-9);
    assert!((sample.y[6] - 152.0).abs() < 1e-9);

    let csv_path = temp_dir.path().join("E.csv");
    let mut file = fs::File::create(&csv_path)?;
    sample.write_csv(&mut file)?;
    let text = fs::read_to_string(&csv_path)?;
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("temperature [degC],Elastic modulus [GPa]"));
    assert_eq!(lines.count(), 7);
    Ok(())
}

#[test]
fn test_sample_with_explicit_units() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let file = write_material(&temp_dir)?;
    let app = App::new(ToolConfig::default())?;

    let units = vec!["degF".to_string(), "W/m/K".to_string()];
    let sample = app.sample(&file, "Thermal conductivity", "Temperature", Some(10), &units)?;
    // table samples at its grid points
    assert_eq!(sample.x.len(), 3);
    assert!((sample.x[0] - 32.0).abs() < 1e-9);
    assert!((sample.x[2] - 392.0).abs() < 1e-9);
    assert_eq!(sample.y, vec![14.0, 16.0, 17.0]);

    let wrong = vec!["degF".to_string()];
    assert!(app.sample(&file, "k", "temperature", None, &wrong).is_err());
    Ok(())
}

#[test]
fn test_eval_converts_output_unit() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let file = write_material(&temp_dir)?;
    let app = App::new(ToolConfig::default())?;

    let evaluation = app.eval(&file, "E", &[373.15], &[], Some("GPa"))?;
    assert_eq!(evaluation.unit, "GPa");
    assert!((evaluation.value.as_scalar().unwrap_or_default() - 192.0).abs() < 1e-9);

    let json = serde_json::to_value(&evaluation)?;
    assert_eq!(json["property"], "Elastic modulus");

    let incompatible = app.eval(&file, "E", &[373.15], &[], Some("m"));
    assert!(matches!(incompatible, Err(PropError::IncompatibleUnitsError { .. })));
    Ok(())
}

#[test]
fn test_eval_out_of_bounds() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let file = write_material(&temp_dir)?;
    let app = App::new(ToolConfig::default())?;

    let result = app.eval(&file, "E", &[1000.0], &[], None);
    assert!(matches!(result, Err(PropError::OutOfBoundsError { .. })));
    Ok(())
}

#[test]
fn test_check_and_dump() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let file = write_material(&temp_dir)?;
    let app = App::new(ToolConfig::default())?;

    let summaries = app.check(&file)?;
    let names: Vec<&str> = summaries.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Thermal conductivity", "Elastic modulus"]);

    let dumped = app.dump(&file)?;
    let dump_path = temp_dir.path().join("dumped.yaml");
    fs::write(&dump_path, &dumped)?;
    assert_eq!(app.check(&dump_path)?.len(), 2);
    Ok(())
}

#[test]
fn test_missing_file_is_a_system_error() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let app = App::new(ToolConfig::default())?;
    let result = app.check(&temp_dir.path().join("missing.yaml"));
    assert!(matches!(result, Err(PropError::IoError(_))));
    Ok(())
}
