//! 설정 관리: shelfscan.toml 파싱 및 런타임 설정
//!
//! [`ShelfscanConfig`]는 모든 모듈의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`SHELFSCAN_API_BASE_URL=...` 형식)
//! 3. 설정 파일 (`shelfscan.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), shelfscan_core::error::ShelfscanError> {
//! use shelfscan_core::config::ShelfscanConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = ShelfscanConfig::load("shelfscan.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = ShelfscanConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ConfigError, ShelfscanError};
use crate::types::Locale;

/// 검색 결과 페이지 크기 상한
const MAX_PAGE_SIZE: usize = 100;
/// HTTP 타임아웃 상한 (초)
const MAX_TIMEOUT_SECS: u64 = 120;

/// Shelfscan 통합 설정
///
/// `shelfscan.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShelfscanConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 상품 데이터베이스 API 설정
    #[serde(default)]
    pub api: ApiConfig,
    /// 대체 상품 추천 설정
    #[serde(default)]
    pub alternatives: AlternativesSection,
    /// 바코드 스캐너 설정
    #[serde(default)]
    pub scanner: ScannerConfig,
}

impl ShelfscanConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ShelfscanError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 파일이 없으면 기본값으로 시작합니다. 환경변수 오버라이드는 항상 적용됩니다.
    pub async fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ShelfscanError> {
        let path = path.as_ref();
        let mut config = match Self::from_file(path).await {
            Ok(config) => config,
            Err(ShelfscanError::Config(ConfigError::FileNotFound { .. })) => {
                debug!(path = %path.display(), "config file not found, using defaults");
                Self::default()
            }
            Err(e) => return Err(e),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ShelfscanError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ShelfscanError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                ShelfscanError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, ShelfscanError> {
        toml::from_str(toml_str).map_err(|e| {
            ShelfscanError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `SHELFSCAN_{SECTION}_{FIELD}`
    /// 예: `SHELFSCAN_API_TIMEOUT_SECS=5`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "SHELFSCAN_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "SHELFSCAN_GENERAL_LOG_FORMAT");
        override_locale(&mut self.general.locale, "SHELFSCAN_GENERAL_LOCALE");

        // API
        override_string(&mut self.api.base_url, "SHELFSCAN_API_BASE_URL");
        override_string(&mut self.api.user_agent, "SHELFSCAN_API_USER_AGENT");
        override_u64(&mut self.api.timeout_secs, "SHELFSCAN_API_TIMEOUT_SECS");
        override_csv(&mut self.api.image_hosts, "SHELFSCAN_API_IMAGE_HOSTS");

        // Alternatives
        override_bool(
            &mut self.alternatives.enabled,
            "SHELFSCAN_ALTERNATIVES_ENABLED",
        );
        override_usize(
            &mut self.alternatives.page_size,
            "SHELFSCAN_ALTERNATIVES_PAGE_SIZE",
        );
        override_string(
            &mut self.alternatives.country_filter,
            "SHELFSCAN_ALTERNATIVES_COUNTRY_FILTER",
        );
        override_string(
            &mut self.alternatives.store_filter,
            "SHELFSCAN_ALTERNATIVES_STORE_FILTER",
        );
        override_csv(
            &mut self.alternatives.region_countries,
            "SHELFSCAN_ALTERNATIVES_REGION_COUNTRIES",
        );
        override_csv(
            &mut self.alternatives.region_purchase_places,
            "SHELFSCAN_ALTERNATIVES_REGION_PURCHASE_PLACES",
        );
        override_csv(
            &mut self.alternatives.retailer_slugs,
            "SHELFSCAN_ALTERNATIVES_RETAILER_SLUGS",
        );
        override_string(
            &mut self.alternatives.retailer_brand_fragment,
            "SHELFSCAN_ALTERNATIVES_RETAILER_BRAND_FRAGMENT",
        );

        // Scanner
        override_string(&mut self.scanner.device, "SHELFSCAN_SCANNER_DEVICE");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), ShelfscanError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        // API 검증
        if !(self.api.base_url.starts_with("https://") || self.api.base_url.starts_with("http://"))
        {
            return Err(invalid(
                "api.base_url",
                "must start with http:// or https://".to_owned(),
            ));
        }

        if self.api.user_agent.trim().is_empty() {
            return Err(invalid("api.user_agent", "must not be empty".to_owned()));
        }

        if self.api.timeout_secs == 0 || self.api.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(invalid(
                "api.timeout_secs",
                format!("must be 1-{MAX_TIMEOUT_SECS}"),
            ));
        }

        if self.api.image_hosts.iter().any(|h| h.trim().is_empty()) {
            return Err(invalid(
                "api.image_hosts",
                "entries must not be empty".to_owned(),
            ));
        }

        // 대체 상품 설정은 활성화된 경우에만 검증
        if self.alternatives.enabled {
            let alt = &self.alternatives;
            if alt.page_size == 0 || alt.page_size > MAX_PAGE_SIZE {
                return Err(invalid(
                    "alternatives.page_size",
                    format!("must be 1-{MAX_PAGE_SIZE}"),
                ));
            }

            if alt.region_countries.is_empty() && alt.region_purchase_places.is_empty() {
                return Err(invalid(
                    "alternatives.region_countries",
                    "at least one regional identifier required when enabled".to_owned(),
                ));
            }

            if alt.retailer_slugs.is_empty() && alt.retailer_brand_fragment.trim().is_empty() {
                return Err(invalid(
                    "alternatives.retailer_slugs",
                    "a retailer slug or brand fragment is required when enabled".to_owned(),
                ));
            }
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: String) -> ShelfscanError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason,
    }
    .into()
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
    /// 메시지 및 상품명 로케일
    pub locale: Locale,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_owned(),
            log_format: "pretty".to_owned(),
            locale: Locale::De,
        }
    }
}

/// 상품 데이터베이스 API 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API 기본 URL
    pub base_url: String,
    /// 모든 요청에 포함되는 User-Agent
    pub user_agent: String,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
    /// 허용된 이미지 호스트 + 경로 접두어 (`host/path/` 형식)
    pub image_hosts: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://world.openfoodfacts.org".to_owned(),
            user_agent: concat!("shelfscan/", env!("CARGO_PKG_VERSION")).to_owned(),
            timeout_secs: 10,
            image_hosts: vec!["images.openfoodfacts.org/images/products/".to_owned()],
        }
    }
}

/// 대체 상품 추천 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlternativesSection {
    /// 활성화 여부
    pub enabled: bool,
    /// 정렬 기준별 최대 검색 결과 수
    pub page_size: usize,
    /// 검색 요청의 국가 필터 값
    pub country_filter: String,
    /// 검색 요청의 판매처 필터 값
    pub store_filter: String,
    /// 지역 판정에 사용하는 국가 태그 (대소문자 무시)
    pub region_countries: Vec<String>,
    /// 지역 판정에 사용하는 구매 장소 태그 (정확히 일치)
    pub region_purchase_places: Vec<String>,
    /// 판매처 태그 허용 목록 (접두어 제거 후 비교)
    pub retailer_slugs: Vec<String>,
    /// 자유 텍스트 판매처 필드에서 찾을 브랜드 조각
    pub retailer_brand_fragment: String,
}

impl Default for AlternativesSection {
    fn default() -> Self {
        Self {
            enabled: true,
            page_size: 5,
            country_filter: "switzerland".to_owned(),
            store_filter: "coop".to_owned(),
            region_countries: vec![
                "en:switzerland".to_owned(),
                "de:schweiz".to_owned(),
                "fr:suisse".to_owned(),
                "it:svizzera".to_owned(),
                "en:ch".to_owned(),
            ],
            region_purchase_places: vec![
                "switzerland".to_owned(),
                "schweiz".to_owned(),
                "suisse".to_owned(),
            ],
            retailer_slugs: vec![
                "coop".to_owned(),
                "coop-pronto".to_owned(),
                "coop-city".to_owned(),
                "coop-vitality".to_owned(),
                "coop-fooby".to_owned(),
            ],
            retailer_brand_fragment: "coop".to_owned(),
        }
    }
}

/// 바코드 스캐너 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// 선호 장치 ID (비어 있으면 첫 번째 장치)
    pub device: String,
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

fn override_locale(target: &mut Locale, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match Locale::from_str_loose(&val) {
            Some(parsed) => *target = parsed,
            None => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse locale from env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}
