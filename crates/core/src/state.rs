//! 쿼리 상태 머신
//!
//! 조회 하나마다 `Idle → Loading → Success | Error` 상태를 가집니다.
//! 새 조회가 시작되면 다시 `Loading`으로 돌아가고, 대상이 사라지면 `Idle`로 초기화됩니다.

use serde::Serialize;

/// 단일 비동기 조회의 상태
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum QueryState<T> {
    /// 조회 대상 없음
    #[default]
    Idle,
    /// 응답 대기 중
    Loading,
    /// 조회 성공
    Success(T),
    /// 조회 실패 (사용자에게 보여줄 메시지)
    Error(String),
}

impl<T> QueryState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// 성공 상태의 값을 반환합니다.
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Success(value) => Some(value),
            _ => None,
        }
    }

    /// 에러 상태의 메시지를 반환합니다.
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Error(message) => Some(message),
            _ => None,
        }
    }

    /// 성공 값을 변환합니다. 다른 상태는 그대로 유지됩니다.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> QueryState<U> {
        match self {
            Self::Idle => QueryState::Idle,
            Self::Loading => QueryState::Loading,
            Self::Success(value) => QueryState::Success(f(value)),
            Self::Error(message) => QueryState::Error(message),
        }
    }

    pub fn state_name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Success(_) => "success",
            Self::Error(_) => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_idle() {
        let state: QueryState<u32> = QueryState::default();
        assert_eq!(state, QueryState::Idle);
        assert!(state.value().is_none());
        assert!(state.error().is_none());
    }

    #[test]
    fn accessors_match_variant() {
        let ok = QueryState::Success(7);
        assert_eq!(ok.value(), Some(&7));
        assert_eq!(ok.state_name(), "success");

        let err: QueryState<u32> = QueryState::Error("boom".to_owned());
        assert_eq!(err.error(), Some("boom"));
        assert!(err.value().is_none());

        assert!(QueryState::<u32>::Loading.is_loading());
    }

    #[test]
    fn map_transforms_only_success() {
        let ok = QueryState::Success(2).map(|v| v * 10);
        assert_eq!(ok, QueryState::Success(20));

        let err: QueryState<u32> = QueryState::Error("boom".to_owned());
        assert_eq!(err.map(|v| v + 1), QueryState::Error("boom".to_owned()));
        assert_eq!(QueryState::<u32>::Loading.map(|v| v + 1), QueryState::Loading);
    }

    #[test]
    fn serializes_with_state_tag() {
        let json = serde_json::to_value(QueryState::Success(vec![1, 2])).unwrap();
        assert_eq!(json["state"], "success");
        assert_eq!(json["value"], serde_json::json!([1, 2]));

        let idle = serde_json::to_value(QueryState::<u32>::Idle).unwrap();
        assert_eq!(idle["state"], "idle");
    }
}
