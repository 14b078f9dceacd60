//! Servicio de autenticación de clientes
//!
//! Registro con bcrypt, login con JWT y correo de bienvenida encolado.

use std::sync::Arc;

use bcrypt::{hash, verify, DEFAULT_COST};

use crate::models::{NewUser, User};
use crate::repositories::BookingRepository;
use crate::services::notification_service::{welcome_email, NotificationQueue};
use crate::utils::errors::{internal_error, invalid_input_error, AppError, AppResult};
use crate::utils::jwt::{generate_token, JwtConfig};

#[derive(Clone)]
pub struct AuthService {
    repository: Arc<dyn BookingRepository>,
    jwt: JwtConfig,
    notifications: NotificationQueue,
    cost: u32,
}

impl AuthService {
    pub fn new(
        repository: Arc<dyn BookingRepository>,
        jwt: JwtConfig,
        notifications: NotificationQueue,
    ) -> Self {
        Self {
            repository,
            jwt,
            notifications,
            cost: DEFAULT_COST,
        }
    }

    /// Coste de bcrypt; los tests usan el mínimo
    pub fn with_cost(mut self, cost: u32) -> Self {
        self.cost = cost;
        self
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> AppResult<User> {
        let name = name.trim();
        if name.is_empty() {
            return Err(invalid_input_error("name is required"));
        }
        let email = email.trim().to_lowercase();

        // bcrypt es CPU intensivo: fuera del hilo del runtime
        let password = password.to_string();
        let cost = self.cost;
        let password_hash = tokio::task::spawn_blocking(move || hash(password, cost))
            .await
            .map_err(|e| internal_error(&format!("Tarea de hash abortada: {}", e)))?
            .map_err(|e| AppError::Internal(format!("Error hasheando password: {}", e)))?;

        let user = self
            .repository
            .create_user(NewUser {
                name: name.to_string(),
                email,
                password_hash,
            })
            .await?;

        log::info!("👤 Usuario registrado: {}", user.email);
        self.notifications.enqueue(welcome_email(&user.email, &user.name));
        Ok(user)
    }

    /// Devuelve el token de sesión
    pub async fn login(&self, email: &str, password: &str) -> AppResult<String> {
        let user = self
            .repository
            .find_user_by_email(&email.trim().to_lowercase())
            .await?
            .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;

        let password = password.to_string();
        let password_hash = user.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || verify(password, &password_hash))
            .await
            .map_err(|e| internal_error(&format!("Tarea de verificación abortada: {}", e)))?
            .map_err(|e| AppError::Internal(format!("Error verificando password: {}", e)))?;
        if !matches {
            log::warn!("🔒 Login fallido para {}", user.email);
            return Err(AppError::Unauthorized("invalid email or password".to_string()));
        }

        log::info!("🔑 Login correcto: {}", user.email);
        generate_token(user.id, &user.email, &self.jwt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::InMemoryBookingRepository;
    use crate::utils::jwt::verify_token;

    fn service() -> (AuthService, tokio::sync::mpsc::Receiver<crate::clients::EmailNotification>) {
        let (queue, receiver) = NotificationQueue::channel(8);
        let jwt = JwtConfig {
            secret: "secret".to_string(),
            expiration: 60,
        };
        let service = AuthService::new(Arc::new(InMemoryBookingRepository::new()), jwt, queue)
            .with_cost(4);
        (service, receiver)
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let (service, mut receiver) = service();
        let user = service.register("Budi", "Budi@Example.com", "rahasia").await.unwrap();
        assert_eq!(user.email, "budi@example.com");
        assert_ne!(user.password_hash, "rahasia");
        assert_eq!(receiver.recv().await.unwrap().to, "budi@example.com");

        let token = service.login("budi@example.com", "rahasia").await.unwrap();
        let claims = verify_token(
            &token,
            &JwtConfig {
                secret: "secret".to_string(),
                expiration: 60,
            },
        )
        .unwrap();
        assert_eq!(claims.sub, user.id.to_string());
    }

    #[tokio::test]
    async fn test_login_errors() {
        let (service, _receiver) = service();
        service.register("Budi", "budi@example.com", "rahasia").await.unwrap();

        let err = service.login("budi@example.com", "salah").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
        let err = service.login("nobody@example.com", "rahasia").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_register_trims_and_rejects_blank_name() {
        let (service, mut receiver) = service();
        let err = service
            .register("   ", "blank@example.com", "rahasia")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert!(receiver.try_recv().is_err());

        let user = service
            .register("  Siti  ", "siti@example.com", "rahasia")
            .await
            .unwrap();
        assert_eq!(user.name, "Siti");
    }
}
