//! Utilidades de validación
//!
//! Conversión de fechas de la API (`YYYY-MM-DD`) a ventanas de reserva.

use chrono::NaiveDate;
use validator::ValidationError;

use crate::services::overlap::DateWindow;
use crate::utils::errors::{invalid_input_error, AppError, AppResult};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Validar y convertir string a fecha
pub fn validate_date(value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        let mut error = ValidationError::new("date");
        error.add_param("value".into(), &value.to_string());
        error.add_param("format".into(), &"YYYY-MM-DD".to_string());
        error
    })
}

/// Rechaza textos vacíos o formados solo por espacios
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Igual que `validate_date` pero con el nombre del campo en el mensaje
pub fn parse_date(field: &str, value: &str) -> AppResult<NaiveDate> {
    validate_date(value).map_err(|_| {
        AppError::InvalidInput(format!("{} must be a date in YYYY-MM-DD format", field))
    })
}

/// Ventana obligatoria (reservas)
pub fn parse_date_window(start: &str, end: &str) -> AppResult<DateWindow> {
    DateWindow::new(parse_date("start_date", start)?, parse_date("end_date", end)?)
}

/// Ventana opcional (listados): ambas fechas o ninguna
pub fn parse_optional_window(
    start: Option<&str>,
    end: Option<&str>,
) -> AppResult<Option<DateWindow>> {
    match (start, end) {
        (None, None) => Ok(None),
        (Some(start), Some(end)) => parse_date_window(start, end).map(Some),
        _ => Err(invalid_input_error(
            "start_date and end_date must be provided together",
        )),
    }
}
