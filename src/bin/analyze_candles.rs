use log::{debug, error, info};
use market_structure::config::{AnalysisConfig, SwingConfig};
use market_structure::config_loader::{ConfigFormat, ConfigLoader};
use market_structure::model::{Candle, Timeframe};
use market_structure::pipeline::AnalysisPipeline;
use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

fn print_usage(program: &str) {
    println!("사용법: {program} <캔들_JSON_경로> [--config <설정_파일>] [--timeframe <1m|5m|15m|30m|1h|4h|1d>] [--sentiment <-1~1>]");
}

/// 커맨드 라인 옵션
struct Options {
    candles_path: PathBuf,
    config_path: Option<PathBuf>,
    timeframe: Option<Timeframe>,
    sentiment: f64,
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut iter = args.iter().skip(1);
    let candles_path = iter
        .next()
        .map(PathBuf::from)
        .ok_or_else(|| "캔들 파일 경로가 필요합니다".to_string())?;

    let mut options = Options {
        candles_path,
        config_path: None,
        timeframe: None,
        sentiment: 0.0,
    };

    while let Some(flag) = iter.next() {
        let value = iter
            .next()
            .ok_or_else(|| format!("{flag} 옵션에 값이 없습니다"))?;
        match flag.as_str() {
            "--config" => options.config_path = Some(PathBuf::from(value)),
            "--timeframe" => options.timeframe = Some(value.parse::<Timeframe>()?),
            "--sentiment" => {
                options.sentiment = value
                    .parse::<f64>()
                    .map_err(|e| format!("감성 점수 파싱 실패: {e}"))?;
            }
            other => return Err(format!("알 수 없는 옵션: {other}")),
        }
    }
    Ok(options)
}

fn load_config(options: &Options) -> Result<AnalysisConfig, String> {
    let mut config = match &options.config_path {
        Some(path) => {
            debug!("사용자 지정 설정 파일 사용: {}", path.display());
            ConfigLoader::load_from_file::<AnalysisConfig>(path, ConfigFormat::Auto)
                .map_err(|e| e.to_string())?
        }
        None => AnalysisConfig::default(),
    };
    if let Some(timeframe) = options.timeframe {
        config.swing = SwingConfig::for_timeframe(timeframe);
    }
    Ok(config)
}

fn load_candles(path: &Path) -> Result<Vec<Candle>, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("캔들 파일 읽기 실패: {} - {e}", path.display()))?;
    serde_json::from_str::<Vec<Candle>>(&content).map_err(|e| format!("캔들 JSON 파싱 실패: {e}"))
}

fn run(options: &Options) -> Result<String, String> {
    let config = load_config(options)?;
    let candles = load_candles(&options.candles_path)?;
    info!("캔들 {}개 로드: {}", candles.len(), options.candles_path.display());

    let pipeline = AnalysisPipeline::new(config).map_err(|e| e.to_string())?;
    let bundle = pipeline
        .analyze(&candles, options.sentiment)
        .map_err(|e| e.to_string())?;
    info!(
        "분석 결과: {} / {}점 ({})",
        bundle.signal, bundle.confluence.score, bundle.confluence.grade
    );
    serde_json::to_string_pretty(&bundle).map_err(|e| format!("결과 직렬화 실패: {e}"))
}

fn main() -> ExitCode {
    // 로그 초기화
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    debug!("커맨드 라인 인수: {:?}", args);
    let program = args.first().map_or("analyze_candles", String::as_str);

    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(msg) => {
            error!("{msg}");
            println!("{msg}");
            print_usage(program);
            return ExitCode::FAILURE;
        }
    };

    match run(&options) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(msg) => {
            error!("분석 실패: {msg}");
            eprintln!("분석 실패: {msg}");
            ExitCode::FAILURE
        }
    }
}
