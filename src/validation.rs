//! Form validation rules for the account and contact forms
//!
//! Messages are user-facing and in the site's language.

use crate::models::{ChangePassword, RegisterUser};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

pub const MIN_PASSWORD_LEN: usize = 6;

/// Uruguayan mobile or landline, with or without the +598 prefix
const PHONE_PATTERN: &str = r"^(?:\+598\s?(?:9\d{7}|[24]\d{7})|0?9\d{7}|[24]\d{7})$";
const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

fn phone_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(PHONE_PATTERN).expect("phone pattern compiles"))
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(EMAIL_PATTERN).expect("email pattern compiles"))
}

pub fn is_valid_phone(phone: &str) -> bool {
    phone_regex().is_match(phone)
}

pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email)
}

/// One failing field of a multi-field form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Todos los campos son obligatorios.")]
    MissingFields,
    #[error("Por favor ingresa un telefono válido.")]
    InvalidPhone,
    #[error("Por favor ingresa un correo electrónico válido.")]
    InvalidEmail,
    #[error("La contraseña debe tener al menos 6 caracteres.")]
    PasswordTooShort,
    #[error("Las contraseñas no coinciden.")]
    PasswordMismatch,
    #[error("Token de restablecimiento no válido.")]
    MissingResetToken,
    #[error("{}", FieldList(.0))]
    Fields(Vec<FieldError>),
}

struct FieldList<'a>(&'a [FieldError]);

impl fmt::Display for FieldList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", e.field, e.message)?;
        }
        Ok(())
    }
}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Checks run in the same order the registration page reports them
pub fn validate_registration(user: &RegisterUser) -> Result<(), ValidationError> {
    if [
        &user.first_name,
        &user.last_name,
        &user.email,
        &user.password,
        &user.phone,
    ]
    .iter()
    .any(|v| blank(v))
    {
        return Err(ValidationError::MissingFields);
    }
    if !is_valid_phone(&user.phone) {
        return Err(ValidationError::InvalidPhone);
    }
    if !is_valid_email(&user.email) {
        return Err(ValidationError::InvalidEmail);
    }
    if user.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort);
    }
    Ok(())
}

pub fn validate_login(email: &str, password: &str) -> Result<(), ValidationError> {
    if blank(email) || password.is_empty() {
        return Err(ValidationError::MissingFields);
    }
    Ok(())
}

pub fn validate_reset_password(password: &str, confirm: &str) -> Result<(), ValidationError> {
    if password.is_empty() || confirm.is_empty() {
        return Err(ValidationError::MissingFields);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort);
    }
    if password != confirm {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}

pub fn validate_change_password(request: &ChangePassword) -> Result<(), ValidationError> {
    if request.new_password != request.confirm_password {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}

/// Message sent from the contact page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

/// Every failing field is reported, not just the first
pub fn validate_contact(form: &ContactForm) -> Result<(), ValidationError> {
    let mut errors = Vec::new();

    if form.name.chars().count() < 2 {
        errors.push(FieldError {
            field: "name",
            message: "El nombre debe tener al menos 2 caracteres",
        });
    }
    if !is_valid_email(&form.email) {
        errors.push(FieldError {
            field: "email",
            message: "Correo electrónico inválido",
        });
    }
    if form.subject.chars().count() < 5 {
        errors.push(FieldError {
            field: "subject",
            message: "El asunto debe tener al menos 5 caracteres",
        });
    }
    if form.message.chars().count() < 10 {
        errors.push(FieldError {
            field: "message",
            message: "El mensaje debe tener al menos 10 caracteres",
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::Fields(errors))
    }
}

/// Share link that opens WhatsApp with a message about the page at `path`
pub fn whatsapp_link(phone: &str, site_url: &str, path: &str) -> String {
    let text = format!(
        "Hola, estoy interesado en tu propiedad: {}{}",
        site_url.trim_end_matches('/'),
        path
    );
    format!(
        "https://api.whatsapp.com/send?phone=+{}&text={}&app_absent=1",
        phone.trim_start_matches('+'),
        urlencoding::encode(&text)
    )
}
