pub mod auth;
pub mod familia;
pub mod health;
pub mod perfil;

// common functions for the handlers
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Datelike, NaiveDate, Utc};
use regex::Regex;
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;

/// Symbols accepted (and required) by the password policy.
const SENHA_SIMBOLOS: &str = "@$!%*?&";

/// Error body shared by every failing endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

/// Plain confirmation body for message-only endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct Mensagem {
    pub message: String,
}

/// Build a `{"error": …}` response with the given status.
pub(crate) fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// Generic 500 used whenever storage misbehaves; detail stays in the logs.
pub(crate) fn internal_error() -> Response {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Erro interno do servidor")
}

/// Treat absent and empty-string fields the same way.
pub(crate) fn non_empty(field: Option<&String>) -> Option<&str> {
    field.map(String::as_str).filter(|value| !value.is_empty())
}

pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").map_or(false, |re| re.is_match(email))
}

/// Password policy: at least 8 characters from `[A-Za-z0-9@$!%*?&]`, with
/// at least one uppercase letter, one digit and one symbol.
pub fn valid_senha(senha: &str) -> bool {
    senha.len() >= 8
        && senha
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || SENHA_SIMBOLOS.contains(c))
        && senha.chars().any(|c| c.is_ascii_uppercase())
        && senha.chars().any(|c| c.is_ascii_digit())
        && senha.chars().any(|c| SENHA_SIMBOLOS.contains(c))
}

pub fn valid_sexo(sexo: &str) -> bool {
    matches!(sexo, "M" | "F")
}

/// Age in whole years, current year minus birth year. Month and day are
/// intentionally not adjusted; changing this would change the accepted
/// input range.
pub fn idade_em_anos(data_nascimento: NaiveDate) -> i32 {
    Utc::now().year() - data_nascimento.year()
}

/// Registration accepts ages in the inclusive range [1, 120].
pub fn valid_data_nascimento(data_nascimento: NaiveDate) -> bool {
    (1..=120).contains(&idade_em_anos(data_nascimento))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_accepts_basic_format() {
        assert!(valid_email("a@example.com"));
        assert!(!valid_email("not-an-email"));
        assert!(!valid_email("a b@example.com"));
        assert!(!valid_email("a@example"));
    }

    #[test]
    fn senha_policy_requires_all_classes() {
        // no uppercase, digit or symbol
        assert!(!valid_senha("abcdefgh"));
        assert!(valid_senha("Abcdef1!"));
        // too short
        assert!(!valid_senha("Abc1!"));
        // missing digit
        assert!(!valid_senha("Abcdefg!"));
        // missing symbol
        assert!(!valid_senha("Abcdefg1"));
        // symbol outside the accepted set
        assert!(!valid_senha("Abcdef1#"));
    }

    #[test]
    fn sexo_is_m_or_f() {
        assert!(valid_sexo("M"));
        assert!(valid_sexo("F"));
        assert!(!valid_sexo("X"));
        assert!(!valid_sexo("m"));
    }

    #[test]
    fn idade_bounds_are_inclusive() {
        let today = Utc::now().date_naive();
        let with_age = |years: i32| {
            NaiveDate::from_ymd_opt(today.year() - years, 6, 15).expect("valid date")
        };

        // computed age 0 and 121 rejected, 1 and 120 accepted
        assert!(!valid_data_nascimento(with_age(0)));
        assert!(valid_data_nascimento(with_age(1)));
        assert!(valid_data_nascimento(with_age(120)));
        assert!(!valid_data_nascimento(with_age(121)));
    }

    #[test]
    fn idade_ignores_month_and_day() {
        let today = Utc::now().date_naive();
        // Born on Dec 31 last year counts as age 1 all year long, even
        // before a full year has elapsed.
        let late_last_year = NaiveDate::from_ymd_opt(today.year() - 1, 12, 31).expect("valid date");
        assert_eq!(idade_em_anos(late_last_year), 1);
    }

    #[test]
    fn non_empty_filters_blank_fields() {
        assert_eq!(non_empty(Some(&"x".to_string())), Some("x"));
        assert_eq!(non_empty(Some(&String::new())), None);
        assert_eq!(non_empty(None), None);
    }
}
