use clap::Parser;
use std::io::Write;
use std::path::Path;
use yaml_prop::utils::error::{ErrorCategory, PropError};
use yaml_prop::utils::{logger, validation::Validate};
use yaml_prop::{App, CliConfig, Command, ToolConfig};

fn main() {
    let config = CliConfig::parse();

    // 工具配置需在日誌之前載入，才能套用 [logging]
    let tool_config = match ToolConfig::discover(config.config.as_deref()) {
        Ok(tool_config) => tool_config,
        Err(e) => {
            logger::init_cli_logger(config.verbose, None);
            fail(&e);
        }
    };

    if tool_config.json_logs() {
        logger::init_json_logger(config.verbose, tool_config.log_level());
    } else {
        logger::init_cli_logger(config.verbose, tool_config.log_level());
    }

    tracing::info!("Starting yaml-prop CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate().and_then(|_| tool_config.validate()) {
        tracing::error!("❌ Configuration validation failed: {}", e);
        fail(&e);
    }

    if let Err(e) = run(config.command, tool_config) {
        tracing::error!("❌ Command failed: {} (Category: {:?})", e, e.category());
        fail(&e);
    }
}

fn run(command: Command, tool_config: ToolConfig) -> yaml_prop::Result<()> {
    let app = App::new(tool_config)?;

    match command {
        Command::Check { file } => {
            for summary in app.check(&file)? {
                println!(
                    "[{}] {} {} '{}' ({}) -> {}",
                    summary.document,
                    summary.path,
                    summary.tag,
                    summary.name,
                    summary.arguments.join(", "),
                    summary.unit
                );
            }
        }
        Command::Dump { file, output } => {
            let text = app.dump(&file)?;
            write_output(output.as_deref(), text.as_bytes())?;
        }
        Command::Eval {
            file,
            property,
            args,
            unit,
            values,
        } => {
            let evaluation = app.eval(&file, &property, &values, &args, unit.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&evaluation)?);
        }
        Command::Sample {
            file,
            property,
            argument,
            points,
            units,
            output,
        } => {
            let sample = app.sample(&file, &property, &argument, points, &units)?;
            let mut buffer = Vec::new();
            sample.write_csv(&mut buffer)?;
            write_output(output.as_deref(), &buffer)?;
        }
        Command::Convert { value, from, to } => {
            let conversion = app.convert(value, &from, &to)?;
            println!("{} {}", conversion.value, conversion.unit);
        }
    }
    Ok(())
}

fn write_output(path: Option<&Path>, bytes: &[u8]) -> yaml_prop::Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, bytes)?;
            tracing::info!("📁 Output saved to: {}", path.display());
        }
        None => std::io::stdout().write_all(bytes)?,
    }
    Ok(())
}

fn fail(e: &PropError) -> ! {
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    // 輸出用戶友好的錯誤信息
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

    // 根據錯誤類別決定退出碼
    let exit_code = match e.category() {
        ErrorCategory::Config => 2,
        ErrorCategory::Input | ErrorCategory::Schema => 3,
        ErrorCategory::Units | ErrorCategory::Evaluation => 4,
        ErrorCategory::System => 1,
    };
    std::process::exit(exit_code);
}
