use crate::error::Result;
use clap::{Parser, Subcommand};
use leaf_doctor_common::{parse_disease_response, DiseaseAnalysisResult, Verdict};
use std::net::IpAddr;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "leaf-doctor")]
#[command(about = "葉の病害画像解析ツール（ビジョンAI連携）", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// HTTP APIサーバーを起動
    Serve {
        /// バインドするアドレス
        #[arg(long, default_value = "127.0.0.1")]
        host: IpAddr,

        /// ポート番号
        #[arg(short, long, default_value = "8000")]
        port: u16,
    },

    /// 葉の画像（ファイルまたはフォルダ）を解析
    Analyze {
        /// 画像ファイルまたはフォルダのパス
        #[arg(required = true)]
        path: PathBuf,

        /// 結果JSONの出力先
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// サブフォルダも再帰的にスキャン
        #[arg(short = 'r', long)]
        recursive: bool,
    },

    /// 保存済みのAI返答テキストを解釈（APIは呼ばない）
    Parse {
        /// 返答テキストのファイル（`-` で標準入力）
        #[arg(required = true)]
        input: PathBuf,
    },

    /// 設定を表示/編集
    Config {
        /// APIキーを設定
        #[arg(long)]
        set_api_key: Option<String>,

        /// 設定を表示（フラグ指定なしでも表示）
        #[arg(long)]
        show: bool,
    },
}

/// `config` で設定を表示するか（フラグなしなら表示）
pub fn shows_config(set_api_key: Option<&str>, show: bool) -> bool {
    show || set_api_key.is_none()
}

/// 保存済みの返答テキストを解釈（`parse` コマンド）
pub fn interpret_reply(raw: &str) -> Result<DiseaseAnalysisResult> {
    Ok(parse_disease_response(raw)?)
}

/// 解析結果の1行表示
pub fn describe_result(result: &DiseaseAnalysisResult) -> String {
    match result.verdict() {
        Verdict::InvalidImage { reason } => format!("⚠ 葉の画像ではありません: {}", reason),
        Verdict::Healthy => format!("✔ 病害なし (信頼度 {:.0}%)", result.confidence()),
        Verdict::Diseased { name, kind, severity } => format!(
            "🦠 {} [種類: {} / 重症度: {} / 信頼度 {:.0}%]",
            name.as_deref().unwrap_or("名称不明"),
            kind,
            severity,
            result.confidence()
        ),
    }
}

/// 症状・原因・対処の詳細表示
pub fn describe_details(result: &DiseaseAnalysisResult) -> Vec<String> {
    let sections: [(&str, &[String]); 3] = [
        ("症状", result.symptoms()),
        ("原因", result.possible_causes()),
        ("対処", result.treatment()),
    ];

    sections
        .iter()
        .filter(|(_, items)| !items.is_empty())
        .map(|(label, items)| format!("{}: {}", label, items.join(" / ")))
        .collect()
}
