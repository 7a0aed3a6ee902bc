//! User-facing text for error kinds.
//!
//! Errors inside the service carry only a kind; the HTTP layer picks the
//! wording here, in the locale from configuration.

use std::str::FromStr;

use crate::error::BadRequestKind;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Locale {
    #[default]
    En,
    Ru,
}

impl FromStr for Locale {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Self::En),
            "ru" => Ok(Self::Ru),
            other => anyhow::bail!("unsupported locale {other:?}"),
        }
    }
}

pub fn bad_request(kind: &BadRequestKind, locale: Locale) -> String {
    use BadRequestKind::*;
    match (kind, locale) {
        (DuplicateEmail(email), Locale::En) => {
            format!("A user with email {email} is already registered")
        }
        (DuplicateEmail(email), Locale::Ru) => {
            format!("Пользователь с почтовым адресом {email} уже зарегистрирован")
        }
        (InvalidActivationLink, Locale::En) => "Activation link is invalid".into(),
        (InvalidActivationLink, Locale::Ru) => "Ссылка для активации некорректна".into(),
        // Same text for both so the response does not reveal whether the email exists.
        (UnregisteredEmail | InvalidCredentials, Locale::En) => "Invalid email or password".into(),
        (UnregisteredEmail | InvalidCredentials, Locale::Ru) => "Данные для входа неверны".into(),
        (InvalidEmail, Locale::En) => "Invalid email".into(),
        (InvalidEmail, Locale::Ru) => "Некорректный email".into(),
        (InvalidPassword, Locale::En) => "Password must be 4 to 32 characters long".into(),
        (InvalidPassword, Locale::Ru) => "Пароль должен содержать от 4 до 32 символов".into(),
    }
}

pub fn unauthorized(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "User is not authorized",
        Locale::Ru => "Пользователь не авторизован",
    }
}

pub fn internal(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "Internal server error",
        Locale::Ru => "Внутренняя ошибка сервера",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_failures_share_one_message() {
        for locale in [Locale::En, Locale::Ru] {
            assert_eq!(
                bad_request(&BadRequestKind::UnregisteredEmail, locale),
                bad_request(&BadRequestKind::InvalidCredentials, locale)
            );
        }
    }

    #[test]
    fn duplicate_email_mentions_address() {
        let msg = bad_request(&BadRequestKind::DuplicateEmail("a@b.io".into()), Locale::En);
        assert!(msg.contains("a@b.io"));
    }

    #[test]
    fn locale_parses() {
        assert_eq!("RU".parse::<Locale>().unwrap(), Locale::Ru);
        assert!("de".parse::<Locale>().is_err());
    }
}
