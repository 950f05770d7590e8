use clap::Parser;
use layer_probe::config::cli::{feature_from_args, layer_id_arg};
use layer_probe::core::LayerApi;
use layer_probe::utils::error::ErrorSeverity;
use layer_probe::utils::logger;
use layer_probe::{CliConfig, Command, FeatureIndex, LayerClient, Result, SmokeSequence};
use serde_json::Value;

#[tokio::main]
async fn main() {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.json_logs {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting layer-probe");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = run(config).await {
        tracing::error!(
            "❌ layer-probe failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        // 保留伺服器的原始回應，方便診斷
        eprintln!("❌ {}", e.user_friendly_message());
        if let Some(raw) = e.raw_payload() {
            eprintln!("📄 Raw response: {}", raw);
        }
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Medium => 2,   // 可重試（網路）
            ErrorSeverity::High => 1,     // 伺服器或協定錯誤
            ErrorSeverity::Critical => 3, // 設定或系統錯誤
        };
        std::process::exit(exit_code);
    }
}

async fn run(config: CliConfig) -> Result<()> {
    let settings = config.settings()?;
    tracing::info!(
        "🌐 Target {} (timeout {}s)",
        settings.base_url,
        settings.timeout_seconds
    );

    let client = LayerClient::new(&settings)?;

    match config.command.unwrap_or_default() {
        Command::Run { report_json } => {
            let sequence = SmokeSequence::new(client).with_features(settings.features);
            let report = sequence.run().await?;

            if report.feature_round_trip {
                println!("✅ Smoke sequence completed for layer {}", report.datasource);
            } else {
                println!(
                    "⚠️ Smoke sequence completed for layer {} but fetched features differ",
                    report.datasource
                );
            }
            if report_json {
                println!("{}", report.to_pretty_json()?);
            }
        }
        Command::CreateLayer => {
            let created = client.create_layer().await?;
            print_payload(&serde_json::to_value(&created)?)?;
        }
        Command::GetLayer { id } => {
            print_payload(&client.get_layer(&layer_id_arg(id)?).await?)?;
        }
        Command::AddFeature {
            id,
            lon,
            lat,
            name,
            file,
        } => {
            let feature = feature_from_args(lon, lat, &name, file.as_ref())?;
            print_payload(&client.create_feature(&layer_id_arg(id)?, &feature).await?)?;
        }
        Command::GetFeature { id, index } => {
            let feature = client
                .get_feature(&layer_id_arg(id)?, FeatureIndex(index))
                .await?;
            print_payload(&serde_json::to_value(&feature)?)?;
        }
        Command::DeleteLayer { id } => {
            print_payload(&client.delete_layer(&layer_id_arg(id)?).await?)?;
        }
        Command::Ping => {
            print_payload(&client.ping().await?)?;
        }
        Command::Profile => {
            print_payload(&client.server_profile().await?)?;
        }
    }

    Ok(())
}

fn print_payload(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
