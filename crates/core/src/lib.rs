//! Shelfscan 공통 크레이트
//!
//! 모든 shelfscan 크레이트가 공유하는 도메인 타입, 에러, 설정, 메트릭 이름을 정의합니다.
//!
//! - [`config`]: `shelfscan.toml` 로딩 및 검증 (`ShelfscanConfig`)
//! - [`error`]: 에러 계층 (`ShelfscanError`, `ConfigError`, `ApiError`, `ScannerError`)
//! - [`messages`]: 로케일별 사용자 메시지 (`UserMessage`)
//! - [`metrics`]: 메트릭 이름 상수
//! - [`state`]: 조회 상태 머신 (`QueryState`)
//! - [`types`]: 상품 및 장치 타입 (`Product`, `CameraDevice`, `Locale`)

pub mod config;
pub mod error;
pub mod messages;
pub mod metrics;
pub mod state;
pub mod types;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ApiError, ConfigError, ScannerError, ShelfscanError};

// 설정
pub use config::ShelfscanConfig;

// 메시지
pub use messages::UserMessage;

// 상태
pub use state::QueryState;

// 도메인 타입
pub use types::{CameraDevice, Locale, Product};
