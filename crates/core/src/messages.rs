//! 사용자 메시지: 로케일별 고정 문구
//!
//! 화면(터미널)에 노출되는 모든 에러/안내 문구는 여기서만 정의합니다.
//! 내부 에러 내용은 로그로만 남기고, 사용자에게는 분류된 문구만 보여줍니다.

use std::fmt;

use crate::types::Locale;

/// 사용자에게 노출되는 메시지 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserMessage {
    /// 바코드 미입력
    EmptyCode,
    /// 바코드 형식 오류
    InvalidCode,
    /// 상품 없음
    NotFound,
    /// API 통신 실패
    ApiFailure,
    /// 대체 상품 검색에 필요한 카테고리 없음
    MissingCategory,
    /// 조건에 맞는 대체 상품 없음
    NoAlternatives,
}

impl UserMessage {
    /// 지정한 로케일의 문구를 반환합니다.
    pub fn text(self, locale: Locale) -> &'static str {
        use Locale::*;
        use UserMessage::*;

        match (self, locale) {
            (EmptyCode, De) => "Bitte einen Barcode eingeben.",
            (EmptyCode, Fr) => "Veuillez saisir un code-barres.",
            (EmptyCode, It) => "Inserisci un codice a barre.",
            (EmptyCode, En) => "Please enter a barcode.",

            (InvalidCode, De) => "Der Barcode darf nur aus Ziffern bestehen (max. 24).",
            (InvalidCode, Fr) => "Le code-barres ne doit contenir que des chiffres (24 max.).",
            (InvalidCode, It) => "Il codice a barre può contenere solo cifre (max. 24).",
            (InvalidCode, En) => "A barcode may only contain digits (at most 24).",

            (NotFound, De) => "Produkt nicht gefunden.",
            (NotFound, Fr) => "Produit introuvable.",
            (NotFound, It) => "Prodotto non trovato.",
            (NotFound, En) => "Product not found.",

            (ApiFailure, De) => {
                "Fehler bei der Kommunikation mit der Produktdatenbank. Bitte erneut versuchen."
            }
            (ApiFailure, Fr) => {
                "Erreur de communication avec la base de données produits. Veuillez réessayer."
            }
            (ApiFailure, It) => {
                "Errore di comunicazione con la banca dati dei prodotti. Riprova."
            }
            (ApiFailure, En) => {
                "Could not reach the product database. Please try again."
            }

            (MissingCategory, De) => "Keine Kategorie vorhanden, Alternativen nicht möglich.",
            (MissingCategory, Fr) => "Aucune catégorie, alternatives impossibles.",
            (MissingCategory, It) => "Nessuna categoria, alternative non disponibili.",
            (MissingCategory, En) => "No category available, cannot suggest alternatives.",

            (NoAlternatives, De) => "Keine passenden Alternativen gefunden.",
            (NoAlternatives, Fr) => "Aucune alternative correspondante.",
            (NoAlternatives, It) => "Nessuna alternativa adatta trovata.",
            (NoAlternatives, En) => "No matching alternatives found.",
        }
    }

    /// 기본 로케일(독일어) 문구
    pub fn default_text(self) -> &'static str {
        self.text(Locale::default())
    }
}

impl fmt::Display for UserMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.default_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_MESSAGES: [UserMessage; 6] = [
        UserMessage::EmptyCode,
        UserMessage::InvalidCode,
        UserMessage::NotFound,
        UserMessage::ApiFailure,
        UserMessage::MissingCategory,
        UserMessage::NoAlternatives,
    ];

    #[test]
    fn every_message_has_text_in_every_locale() {
        for message in ALL_MESSAGES {
            for locale in [Locale::De, Locale::Fr, Locale::It, Locale::En] {
                assert!(
                    !message.text(locale).is_empty(),
                    "{message:?} has no {locale} text"
                );
            }
        }
    }

    #[test]
    fn not_found_differs_from_api_failure() {
        for locale in [Locale::De, Locale::Fr, Locale::It, Locale::En] {
            assert_ne!(
                UserMessage::NotFound.text(locale),
                UserMessage::ApiFailure.text(locale)
            );
        }
    }

    #[test]
    fn display_uses_default_locale() {
        assert_eq!(
            UserMessage::NotFound.to_string(),
            UserMessage::NotFound.text(Locale::De)
        );
    }
}
