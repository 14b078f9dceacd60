//! Configuración del proyecto
//!
//! Este módulo contiene la configuración de base de datos, variables de entorno,
//! gateway de facturas, webhook y correo.

pub mod database;
pub mod environment;

pub use database::DatabaseConfig;
pub use environment::*;
