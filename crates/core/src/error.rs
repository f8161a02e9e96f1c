//! 에러 타입: 도메인별 에러 정의

/// Shelfscan 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum ShelfscanError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 상품 데이터베이스 API 에러
    #[error("api error: {0}")]
    Api(#[from] ApiError),

    /// 바코드 스캐너 에러
    #[error("scanner error: {0}")]
    Scanner(#[from] ScannerError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 상품 데이터베이스 API 에러
///
/// `Transport`는 요청 자체가 전달되지 못한 경우(연결 실패, 타임아웃)이고,
/// 나머지는 서버가 응답했지만 사용할 수 없는 경우입니다.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// 네트워크 전송 실패
    #[error("transport failure: {0}")]
    Transport(String),

    /// HTTP 에러 상태 코드
    #[error("http status {status} from {endpoint}")]
    Status { endpoint: String, status: u16 },

    /// 응답 본문에 명시된 에러 필드
    #[error("error reported by {endpoint}: {message}")]
    Reported { endpoint: String, message: String },

    /// 응답 본문 파싱 실패
    #[error("malformed response from {endpoint}: {reason}")]
    Malformed { endpoint: String, reason: String },
}

impl ApiError {
    /// 요청이 서버에 도달하지 못한 실패인지 여부
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// 바코드 스캐너 에러
#[derive(Debug, thiserror::Error)]
pub enum ScannerError {
    /// 사용 가능한 장치 없음
    #[error("no capture device available")]
    NoDevice,

    /// 지정한 장치를 찾을 수 없음
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    /// 장치 획득 실패
    #[error("failed to acquire device {device_id}: {reason}")]
    Acquire { device_id: String, reason: String },

    /// 장치가 닫힘 (스트림 종료)
    #[error("device closed: {0}")]
    DeviceClosed(String),

    /// 디코딩 실패
    #[error("decode failed: {0}")]
    Decode(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_converts_to_top_level() {
        let err: ShelfscanError = ConfigError::InvalidValue {
            field: "api.timeout_secs".to_owned(),
            reason: "must be 1-120".to_owned(),
        }
        .into();
        assert!(matches!(err, ShelfscanError::Config(_)));
        assert!(err.to_string().contains("api.timeout_secs"));
    }

    #[test]
    fn api_error_transport_classification() {
        assert!(ApiError::Transport("connection refused".to_owned()).is_transport());
        assert!(
            !ApiError::Status {
                endpoint: "search".to_owned(),
                status: 503,
            }
            .is_transport()
        );
    }

    #[test]
    fn api_error_display_includes_endpoint() {
        let err = ApiError::Reported {
            endpoint: "product".to_owned(),
            message: "rate limited".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("product"));
        assert!(msg.contains("rate limited"));
    }

    #[test]
    fn scanner_error_converts_to_top_level() {
        let err: ShelfscanError = ScannerError::DeviceNotFound("cam0".to_owned()).into();
        assert!(matches!(err, ShelfscanError::Scanner(_)));
        assert!(err.to_string().contains("cam0"));
    }
}
