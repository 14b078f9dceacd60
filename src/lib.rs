//! Car rental: reservas de vehículos por días completos, pagos vía gateway de
//! facturas y conciliación por webhook.

pub mod clients;
pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;
