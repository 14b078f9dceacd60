use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::dto::payment_dto::PaymentSummary;
use crate::models::{Payment, TopUp, User};
use crate::utils::validation::validate_not_blank;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(custom(function = "validate_not_blank", message = "name is required"))]
    pub name: String,
    #[validate(email(message = "email is not valid"))]
    pub email: String,
    #[validate(length(min = 4, message = "password must be at least 4 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "email is not valid"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub deposit: Decimal,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            deposit: user.deposit,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TopUpRequest {
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

#[derive(Debug, Serialize)]
pub struct TopUpResponse {
    pub top_up_id: Uuid,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub payment: PaymentSummary,
}

impl TopUpResponse {
    pub fn new(top_up: &TopUp, payment: &Payment) -> Self {
        Self {
            top_up_id: top_up.id,
            amount: top_up.amount,
            payment: PaymentSummary::from(payment),
        }
    }
}
