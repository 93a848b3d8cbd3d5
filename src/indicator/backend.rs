//! 지표 계산 백엔드
//!
//! 로컬 계산과 원격 지표 서비스 호출을 같은 인터페이스로 다룹니다.
//! 어떤 백엔드를 쓸지, 실패 시 대체할지는 파이프라인이 결정합니다.

use crate::config::IndicatorConfig;
use crate::indicator::{IndicatorEngine, IndicatorRow, IndicatorSeries};
use crate::model::Candle;
use log::debug;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 백엔드 오류
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// 전송 실패 (연결, 타임아웃, HTTP 상태)
    #[error("지표 서비스 요청 실패: {0}")]
    Transport(String),
    /// 응답 형식 오류
    #[error("지표 서비스 응답 오류: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        BackendError::Transport(err.to_string())
    }
}

/// 지표 계산 백엔드
pub trait IndicatorBackend: Send + Sync {
    /// 백엔드 이름 (로그용)
    fn name(&self) -> &str;

    /// 캔들 시퀀스의 지표 시리즈 계산
    fn compute(
        &self,
        candles: &[Candle],
        config: &IndicatorConfig,
    ) -> Result<IndicatorSeries, BackendError>;
}

/// 프로세스 내 계산 백엔드
#[derive(Debug, Clone, Default)]
pub struct LocalBackend;

impl IndicatorBackend for LocalBackend {
    fn name(&self) -> &str {
        "local"
    }

    fn compute(
        &self,
        candles: &[Candle],
        config: &IndicatorConfig,
    ) -> Result<IndicatorSeries, BackendError> {
        Ok(IndicatorEngine::new(config.clone()).compute(candles))
    }
}

/// 원격 지표 서비스 요청 본문
#[derive(Debug, Serialize)]
struct IndicatorRequest<'a> {
    prices: &'a [f64],
    high: &'a [f64],
    low: &'a [f64],
    close: &'a [f64],
}

/// 원격 지표 서비스 응답 (워밍업 구간은 null)
#[derive(Debug, Deserialize)]
struct IndicatorResponse {
    ema_50: Vec<Option<f64>>,
    ema_200: Vec<Option<f64>>,
    rsi: Vec<Option<f64>>,
    atr: Vec<Option<f64>>,
}

/// 원격 지표 서비스 백엔드
///
/// `POST {base_url}/calculate/indicators`로 고가/저가/종가 배열을 보내고
/// 캔들과 같은 길이의 지표 배열을 받습니다.
/// 서비스는 EMA 50/200을 고정으로 계산하므로 다른 EMA 기간 설정은 거부합니다.
#[derive(Debug, Clone)]
pub struct RemoteBackend {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl RemoteBackend {
    /// 새 원격 백엔드 생성
    ///
    /// # Arguments
    /// * `base_url` - 서비스 주소 (끝의 '/'는 제거)
    /// * `timeout` - 요청 타임아웃
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self::with_client(base_url, client))
    }

    /// 미리 구성한 HTTP 클라이언트로 원격 백엔드 생성
    pub fn with_client(base_url: &str, client: reqwest::blocking::Client) -> Self {
        RemoteBackend {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/calculate/indicators", self.base_url)
    }
}

/// 원격 응답을 지표 시리즈로 변환
///
/// 배열 길이가 캔들 수와 다르거나 EMA 값이 비어 있으면 오류입니다.
fn into_series(
    response: IndicatorResponse,
    expected_len: usize,
    config: &IndicatorConfig,
) -> Result<IndicatorSeries, BackendError> {
    let lengths = [
        response.ema_50.len(),
        response.ema_200.len(),
        response.rsi.len(),
        response.atr.len(),
    ];
    if lengths.iter().any(|&len| len != expected_len) {
        return Err(BackendError::MalformedResponse(format!(
            "배열 길이 불일치: 기대 {expected_len}, 응답 {lengths:?}"
        )));
    }

    let mut rows = Vec::with_capacity(expected_len);
    for i in 0..expected_len {
        let (Some(ema_fast), Some(ema_slow)) = (response.ema_50[i], response.ema_200[i]) else {
            return Err(BackendError::MalformedResponse(format!(
                "인덱스 {i}의 EMA 값이 없습니다"
            )));
        };
        rows.push(IndicatorRow {
            ema_fast,
            ema_slow,
            rsi: response.rsi[i],
            atr: response.atr[i],
        });
    }

    Ok(IndicatorSeries {
        rows,
        config: config.clone(),
    })
}

impl IndicatorBackend for RemoteBackend {
    fn name(&self) -> &str {
        "remote"
    }

    fn compute(
        &self,
        candles: &[Candle],
        config: &IndicatorConfig,
    ) -> Result<IndicatorSeries, BackendError> {
        if config.ema_fast_span != 50 || config.ema_slow_span != 200 {
            return Err(BackendError::MalformedResponse(format!(
                "원격 서비스는 EMA 50/200만 지원합니다 (설정: {}/{})",
                config.ema_fast_span, config.ema_slow_span
            )));
        }

        let close: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let high: Vec<f64> = candles.iter().map(|c| c.high).collect();
        let low: Vec<f64> = candles.iter().map(|c| c.low).collect();
        let request = IndicatorRequest {
            prices: &close,
            high: &high,
            low: &low,
            close: &close,
        };

        debug!("원격 지표 요청: {} ({}개 캔들)", self.endpoint(), candles.len());
        let response: IndicatorResponse = self
            .client
            .post(self.endpoint())
            .json(&request)
            .send()?
            .error_for_status()?
            .json()
            .map_err(|e| BackendError::MalformedResponse(e.to_string()))?;

        into_series(response, candles.len(), config)
    }
}
