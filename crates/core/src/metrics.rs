//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()` 매크로를 호출합니다.
//! 레코더가 설치되지 않은 경우 매크로 호출은 아무 동작도 하지 않습니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `shelfscan_`
//! - 모듈명: `lookup_`, `alternatives_`, `scanner_`
//! - 접미어: `_total` (counter)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(shelfscan_core::metrics::LOOKUP_REQUESTS_TOTAL,
//!     shelfscan_core::metrics::LABEL_RESULT => "found").increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 결과 레이블 키 (found, not_found, invalid, error / success, failure)
pub const LABEL_RESULT: &str = "result";

/// 정렬 기준 레이블 키 (nutrition, eco)
pub const LABEL_SORT: &str = "sort";

// ─── Lookup 메트릭 ──────────────────────────────────────────────────

/// Lookup: 바코드 조회 수 (counter, label: result)
pub const LOOKUP_REQUESTS_TOTAL: &str = "shelfscan_lookup_requests_total";

// ─── Alternatives 메트릭 ────────────────────────────────────────────

/// Alternatives: 카테고리 검색 요청 수 (counter, labels: sort, result)
pub const ALTERNATIVES_SEARCHES_TOTAL: &str = "shelfscan_alternatives_searches_total";

/// Alternatives: 필터에서 제외된 후보 수 (counter, label: sort)
pub const ALTERNATIVES_CANDIDATES_REJECTED_TOTAL: &str =
    "shelfscan_alternatives_candidates_rejected_total";

/// Alternatives: 새 조회에 밀려 버려진 응답 수 (counter)
pub const ALTERNATIVES_STALE_DISCARDED_TOTAL: &str = "shelfscan_alternatives_stale_discarded_total";

// ─── Scanner 메트릭 ─────────────────────────────────────────────────

/// Scanner: 디코딩 성공 수 (counter)
pub const SCANNER_CODES_DECODED_TOTAL: &str = "shelfscan_scanner_codes_decoded_total";

/// Scanner: 복구 가능한 디코딩 에러 수 (counter)
pub const SCANNER_DECODE_ERRORS_TOTAL: &str = "shelfscan_scanner_decode_errors_total";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::describe_counter;

    describe_counter!(
        LOOKUP_REQUESTS_TOTAL,
        "Barcode lookups by result (found, not_found, invalid, error)"
    );
    describe_counter!(
        ALTERNATIVES_SEARCHES_TOTAL,
        "Category searches issued for alternatives, by sort key and result"
    );
    describe_counter!(
        ALTERNATIVES_CANDIDATES_REJECTED_TOTAL,
        "Search candidates dropped by the region, retailer or grade filters"
    );
    describe_counter!(
        ALTERNATIVES_STALE_DISCARDED_TOTAL,
        "Alternative results discarded because a newer product superseded them"
    );
    describe_counter!(
        SCANNER_CODES_DECODED_TOTAL,
        "Barcodes decoded by the scanner"
    );
    describe_counter!(
        SCANNER_DECODE_ERRORS_TOTAL,
        "Recoverable decode errors reported by the scanner backend"
    );
}
