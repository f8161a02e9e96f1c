//! 도메인 타입: 시스템 전역에서 사용되는 공통 타입
//!
//! 외부 상품 데이터베이스의 응답 스키마는 고정되어 있지 않으므로
//! 모든 필드는 누락되거나 `null`일 수 있다고 가정합니다.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// 상품 레코드
///
/// 상품 데이터베이스에서 조회한 단일 상품입니다. 로컬 식별자나 생명주기는 없으며
/// 조회할 때마다 새로 가져오고, 다음 조회 시 버려집니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Product {
    /// 바코드
    #[serde(deserialize_with = "null_as_default")]
    pub code: String,
    /// 기본 상품명
    pub product_name: Option<String>,
    pub product_name_de: Option<String>,
    pub product_name_fr: Option<String>,
    pub product_name_it: Option<String>,
    pub product_name_en: Option<String>,
    /// 브랜드 (쉼표 구분 자유 텍스트)
    pub brands: Option<String>,
    /// 앞면 이미지 URL
    pub image_front_url: Option<String>,
    /// 대표 이미지 URL
    pub image_url: Option<String>,
    /// Nutri-Score 등급
    pub nutriscore_grade: Option<String>,
    /// 구형 Nutri-Score 필드
    pub nutrition_grades: Option<String>,
    /// Eco-Score 등급
    pub ecoscore_grade: Option<String>,
    /// 카테고리 태그 (일반 → 구체 순서)
    #[serde(deserialize_with = "null_as_default")]
    pub categories_tags: Vec<String>,
    /// 유통 국가 태그
    #[serde(deserialize_with = "null_as_default")]
    pub countries_tags: Vec<String>,
    /// 구매 장소 태그
    #[serde(deserialize_with = "null_as_default")]
    pub purchase_places_tags: Vec<String>,
    /// 판매처 태그 (`ch:coop` 처럼 로케일 접두어가 붙을 수 있음)
    #[serde(deserialize_with = "null_as_default")]
    pub stores_tags: Vec<String>,
    /// 판매처 자유 텍스트
    pub stores: Option<String>,
}

impl Product {
    /// Nutri-Score 등급을 반환합니다. 비어 있는 값은 없는 것으로 취급합니다.
    pub fn nutrition_grade(&self) -> Option<&str> {
        non_blank(self.nutriscore_grade.as_deref())
            .or_else(|| non_blank(self.nutrition_grades.as_deref()))
    }

    /// Eco-Score 등급을 반환합니다.
    pub fn eco_grade(&self) -> Option<&str> {
        non_blank(self.ecoscore_grade.as_deref())
    }

    /// 지정한 로케일의 상품명을 반환합니다.
    pub fn localized_name(&self, locale: Locale) -> Option<&str> {
        let name = match locale {
            Locale::De => self.product_name_de.as_deref(),
            Locale::Fr => self.product_name_fr.as_deref(),
            Locale::It => self.product_name_it.as_deref(),
            Locale::En => self.product_name_en.as_deref(),
        };
        non_blank(name)
    }

    /// 표시용 이름: 로케일 이름 → 기본 이름 → 바코드 순으로 선택합니다.
    pub fn display_name(&self, locale: Locale) -> &str {
        self.localized_name(locale)
            .or_else(|| non_blank(self.product_name.as_deref()))
            .unwrap_or(self.code.as_str())
    }

    /// 이미지 URL 후보 (앞면 이미지 우선)
    pub fn image_candidate(&self) -> Option<&str> {
        non_blank(self.image_front_url.as_deref()).or_else(|| non_blank(self.image_url.as_deref()))
    }
}

/// 캡처 장치 정보
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraDevice {
    /// 사람이 읽을 수 있는 장치 이름
    pub label: String,
    /// 장치 식별자
    pub device_id: String,
}

impl fmt::Display for CameraDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label, self.device_id)
    }
}

/// 사용자 메시지와 상품명에 사용하는 로케일
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    De,
    Fr,
    It,
    En,
}

impl Locale {
    /// 문자열에서 로케일을 파싱합니다 (대소문자 무시, `de-CH` 같은 지역 접미어 허용).
    pub fn from_str_loose(s: &str) -> Option<Self> {
        let lang = s.trim().split(['-', '_']).next().unwrap_or_default();
        match lang.to_lowercase().as_str() {
            "de" => Some(Self::De),
            "fr" => Some(Self::Fr),
            "it" => Some(Self::It),
            "en" => Some(Self::En),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::De => "de",
            Self::Fr => "fr",
            Self::It => "it",
            Self::En => "en",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_deserializes_with_missing_and_null_fields() {
        let json = r#"{"code":"737628064502","product_name":"Test","categories_tags":null}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.code, "737628064502");
        assert_eq!(product.product_name.as_deref(), Some("Test"));
        assert!(product.categories_tags.is_empty());
        assert!(product.stores.is_none());
    }

    #[test]
    fn product_ignores_unknown_fields() {
        let json = r#"{"code":"1","nova_group":4,"nutriments":{"energy":100}}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.code, "1");
    }

    #[test]
    fn nutrition_grade_falls_back_to_legacy_field() {
        let product = Product {
            nutriscore_grade: Some("  ".to_owned()),
            nutrition_grades: Some("b".to_owned()),
            ..Default::default()
        };
        assert_eq!(product.nutrition_grade(), Some("b"));
    }

    #[test]
    fn display_name_prefers_locale_then_default_then_code() {
        let mut product = Product {
            code: "761".to_owned(),
            product_name: Some("Milk".to_owned()),
            product_name_de: Some("Milch".to_owned()),
            ..Default::default()
        };
        assert_eq!(product.display_name(Locale::De), "Milch");
        assert_eq!(product.display_name(Locale::Fr), "Milk");

        product.product_name = None;
        assert_eq!(product.display_name(Locale::Fr), "761");
    }

    #[test]
    fn image_candidate_prefers_front_image() {
        let product = Product {
            image_front_url: Some("https://img/front.jpg".to_owned()),
            image_url: Some("https://img/main.jpg".to_owned()),
            ..Default::default()
        };
        assert_eq!(product.image_candidate(), Some("https://img/front.jpg"));
    }

    #[test]
    fn locale_from_str_loose() {
        assert_eq!(Locale::from_str_loose("DE"), Some(Locale::De));
        assert_eq!(Locale::from_str_loose("fr-CH"), Some(Locale::Fr));
        assert_eq!(Locale::from_str_loose("it_CH"), Some(Locale::It));
        assert_eq!(Locale::from_str_loose("rm"), None);
    }

    #[test]
    fn camera_device_display() {
        let device = CameraDevice {
            label: "Front camera".to_owned(),
            device_id: "cam0".to_owned(),
        };
        assert_eq!(device.to_string(), "Front camera (cam0)");
    }
}
