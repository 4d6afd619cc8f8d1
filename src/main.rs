use anyhow::Context;
use clap::Parser;
use leaf_doctor::{cli, config, error, scanner, server};
use leaf_doctor::analyzer::{BatchOutcome, LeafDiseaseDetector};
use cli::{Cli, Commands};
use config::Config;
use std::io::Read;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn init_tracing(level: &str, verbose: bool) {
    let default_level = if verbose { "debug" } else { level };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if let Err(err) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
    {
        eprintln!("ロガーの初期化に失敗: {}", err);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    let config = Config::load()?;
    init_tracing(&config.log_level, cli.verbose);

    match cli.command {
        Commands::Serve { host, port } => {
            println!("🌿 leaf-doctor - APIサーバー\n");

            let detector = LeafDiseaseDetector::from_config(&config)
                .context("検出器の初期化に失敗")?;
            let addr = SocketAddr::new(host, port);

            println!("✔ モデル: {}", detector.model_name());
            println!("✔ http://{} で待ち受け中", addr);

            server::serve(Arc::new(detector), addr)
                .await
                .context("サーバーの実行に失敗")?;
        }

        Commands::Analyze { path, output, recursive } => {
            println!("📸 leaf-doctor - 病害解析\n");

            // 1. 画像スキャン
            println!("[1/2] 画像をスキャン中...");
            let images = scanner::scan_path(&path, recursive)?;
            println!("✔ {}枚の画像を検出\n", images.len());

            if images.is_empty() {
                return Err(error::LeafDoctorError::NoImagesFound(path.display().to_string()).into());
            }

            // 2. AI解析
            println!("[2/2] AI解析中...");
            let detector = LeafDiseaseDetector::from_config(&config)?;
            let entries = detector.analyze_images(&images, cli.verbose).await;

            for entry in &entries {
                match &entry.outcome {
                    BatchOutcome::Result(result) => {
                        println!("\n{}: {}", entry.file_name, cli::describe_result(result));
                        for line in cli::describe_details(result) {
                            println!("  {}", line);
                        }
                    }
                    BatchOutcome::Error(err) => println!("\n{}: ✘ {}", entry.file_name, err),
                }
            }

            if let Some(output) = output {
                let json = serde_json::to_string_pretty(&entries)?;
                std::fs::write(&output, json)?;
                println!("\n✔ 結果を保存: {}", output.display());
            }

            let failed = entries.iter().filter(|e| e.is_failure()).count();
            println!("\n✅ 解析完了 ({}件成功 / {}件失敗)", entries.len() - failed, failed);
        }

        Commands::Parse { input } => {
            let raw = if input.as_os_str() == "-" {
                let mut buf = String::new();
                std::io::stdin().read_to_string(&mut buf)?;
                buf
            } else {
                std::fs::read_to_string(&input)
                    .with_context(|| format!("ファイルを読み込めません: {}", input.display()))?
            };

            let result = cli::interpret_reply(&raw)?;
            eprintln!("{}", cli::describe_result(&result));
            println!("{}", serde_json::to_string_pretty(&result)?);
        }

        Commands::Config { set_api_key, show } => {
            let mut config = config;
            let show = cli::shows_config(set_api_key.as_deref(), show);

            if let Some(key) = set_api_key {
                let mut stored = Config::load_file()?;
                stored.set_api_key(key.clone())?;
                config.api_key = Some(key);
                println!("✔ APIキーを設定しました");
            }

            if show {
                println!("設定 ({}):", Config::config_path()?.display());
                println!("  API: {}", config.api_base_url);
                println!("  モデル: {}", config.model);
                println!("  temperature: {}", config.temperature);
                println!("  最大トークン数: {}", config.max_completion_tokens);
                println!("  最大画像サイズ: {}px", config.max_image_size);
                println!("  タイムアウト: {}秒", config.timeout_seconds);
                println!("  ログレベル: {}", config.log_level);
                println!("  APIキー: {}", if config.api_key.is_some() { "設定済み" } else { "未設定" });
            }
        }
    }

    Ok(())
}
