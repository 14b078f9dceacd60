mod common;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use car_rental::models::{InvoiceState, PaymentStatus};
use car_rental::repositories::BookingRepository;
use car_rental::services::overlap::DateWindow;
use car_rental::services::BookingStage;
use car_rental::utils::errors::{AppError, ErrorKind};
use common::{GatewayMode, TestApp};

fn window(start: &str, end: &str) -> DateWindow {
    DateWindow::new(
        NaiveDate::parse_from_str(start, "%Y-%m-%d").unwrap(),
        NaiveDate::parse_from_str(end, "%Y-%m-%d").unwrap(),
    )
    .unwrap()
}

#[tokio::test]
async fn test_single_unit_books_once_then_conflicts() {
    let mut app = TestApp::new(GatewayMode::Succeed);
    let car = app.add_vehicle(1, 250_000).await;
    let customer = app.add_customer("budi@example.com").await;

    let confirmation = app
        .state
        .bookings
        .book(&customer, car.id, window("2024-09-01", "2024-09-03"))
        .await
        .unwrap();

    assert_eq!(confirmation.stage, BookingStage::Confirmed);
    assert_eq!(confirmation.rental.total_price, Decimal::from(500_000));
    assert_eq!(confirmation.payment.status, PaymentStatus::Unpaid);
    assert_eq!(
        confirmation.payment.invoice.url(),
        Some(format!("https://pay.example/{}", confirmation.payment.id).as_str())
    );

    let request = app.gateway.last_request().unwrap();
    assert_eq!(request.payment_id, confirmation.payment.id);
    assert_eq!(request.amount, Decimal::from(500_000));
    assert_eq!(request.customer_email, "budi@example.com");
    assert_eq!(
        request.description,
        "Renting Toyota Avanza, from: 2024-09-01 to 2024-09-03"
    );

    let emails = app.drain_outbox();
    assert_eq!(emails.len(), 1);
    assert_eq!(emails[0].subject, "You've made a booking!");

    let err = app
        .state
        .bookings
        .book(&customer, car.id, window("2024-09-02", "2024-09-04"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(app.repo.rental_count().await, 1);
    assert_eq!(app.gateway.calls(), 1);
}

#[tokio::test]
async fn test_shared_boundary_day_counts_as_overlap() {
    let app = TestApp::new(GatewayMode::Succeed);
    let car = app.add_vehicle(1, 100_000).await;
    let customer = app.add_customer("ani@example.com").await;

    app.state
        .bookings
        .book(&customer, car.id, window("2024-09-01", "2024-09-03"))
        .await
        .unwrap();

    let err = app
        .state
        .bookings
        .book(&customer, car.id, window("2024-09-03", "2024-09-05"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    app.state
        .bookings
        .book(&customer, car.id, window("2024-09-04", "2024-09-05"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_one_day_window_prices_one_day() {
    let app = TestApp::new(GatewayMode::Succeed);
    let car = app.add_vehicle(2, 300_000).await;
    let customer = app.add_customer("citra@example.com").await;

    let confirmation = app
        .state
        .bookings
        .book(&customer, car.id, window("2024-09-01", "2024-09-02"))
        .await
        .unwrap();
    assert_eq!(confirmation.rental.total_price, Decimal::from(300_000));
}

#[tokio::test]
async fn test_unknown_vehicle_is_not_found_without_writes() {
    let app = TestApp::new(GatewayMode::Succeed);
    let customer = app.add_customer("dedi@example.com").await;

    let err = app
        .state
        .bookings
        .book(&customer, uuid::Uuid::new_v4(), window("2024-09-01", "2024-09-02"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(app.repo.rental_count().await, 0);
    assert_eq!(app.gateway.calls(), 0);
}

#[tokio::test]
async fn test_gateway_failure_keeps_reservation() {
    let mut app = TestApp::new(GatewayMode::Fail);
    let car = app.add_vehicle(1, 200_000).await;
    let customer = app.add_customer("eka@example.com").await;

    let err = app
        .state
        .bookings
        .book(&customer, car.id, window("2024-10-01", "2024-10-02"))
        .await
        .unwrap_err();

    let details = match err {
        AppError::Upstream { details: Some(details), .. } => details,
        other => panic!("expected upstream error, got {:?}", other),
    };
    assert_eq!(details["booking_stage"], "invoice_failed");
    assert_eq!(details["stage"], "invoice_gateway");

    // La reserva sigue reteniendo la unidad
    assert_eq!(app.repo.rental_count().await, 1);
    let rentals = app.repo.list_rentals_for_user(customer.id).await.unwrap();
    let (rental, payment) = &rentals[0];
    assert_eq!(details["rental_id"], rental.id.to_string());
    assert_eq!(details["payment_id"], payment.id.to_string());
    assert_eq!(payment.status, PaymentStatus::Unpaid);
    assert_eq!(payment.invoice, InvoiceState::NotIssued);
    assert!(app.drain_outbox().is_empty());

    let err = app
        .state
        .bookings
        .book(&customer, car.id, window("2024-10-02", "2024-10-03"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test(start_paused = true)]
async fn test_gateway_timeout_behaves_like_failure() {
    let app = TestApp::new(GatewayMode::Hang);
    let car = app.add_vehicle(1, 200_000).await;
    let customer = app.add_customer("fajar@example.com").await;

    let err = app
        .state
        .bookings
        .book(&customer, car.id, window("2024-10-01", "2024-10-02"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Upstream);
    let rentals = app.repo.list_rentals_for_user(customer.id).await.unwrap();
    assert_eq!(rentals.len(), 1);
    assert!(rentals[0].1.awaiting_invoice());
}

#[tokio::test]
async fn test_reissue_invoice_after_failure() {
    let app = TestApp::new(GatewayMode::Fail);
    let car = app.add_vehicle(1, 200_000).await;
    let customer = app.add_customer("gita@example.com").await;
    let stranger = app.add_customer("hadi@example.com").await;

    app.state
        .bookings
        .book(&customer, car.id, window("2024-10-01", "2024-10-03"))
        .await
        .unwrap_err();
    let payment_id = app.repo.list_rentals_for_user(customer.id).await.unwrap()[0].1.id;

    // Otro cliente no ve el pago
    let err = app.state.invoices.reissue(&stranger, payment_id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    // Sigue fallando: nada cambia
    let err = app.state.invoices.reissue(&customer, payment_id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Upstream);

    app.gateway.set_mode(GatewayMode::Succeed);
    let payment = app.state.invoices.reissue(&customer, payment_id).await.unwrap();
    assert_eq!(
        payment.invoice.url(),
        Some(format!("https://pay.example/{}", payment_id).as_str())
    );
    assert_eq!(
        app.gateway.last_request().unwrap().amount,
        Decimal::from(400_000)
    );

    let err = app.state.invoices.reissue(&customer, payment_id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn test_concurrent_bookings_never_oversell() {
    let app = TestApp::new(GatewayMode::Succeed);
    let car = app.add_vehicle(3, 100_000).await;

    let mut customers = Vec::new();
    for i in 0..12 {
        customers.push(app.add_customer(&format!("c{}@example.com", i)).await);
    }

    let mut handles = Vec::new();
    for customer in customers {
        let bookings = app.state.bookings.clone();
        let car_id = car.id;
        handles.push(tokio::spawn(async move {
            bookings
                .book(&customer, car_id, window("2024-11-01", "2024-11-05"))
                .await
        }));
    }

    let mut confirmed = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => confirmed += 1,
            Err(e) => assert_eq!(e.kind(), ErrorKind::Conflict),
        }
    }

    assert_eq!(confirmed, 3);
    assert_eq!(app.repo.rental_count().await, 3);
}

#[tokio::test]
async fn test_availability_listing_after_bookings() {
    let app = TestApp::new(GatewayMode::Succeed);
    let car = app.add_vehicle(2, 100_000).await;
    let customer = app.add_customer("ida@example.com").await;

    app.state
        .bookings
        .book(&customer, car.id, window("2024-09-01", "2024-09-03"))
        .await
        .unwrap();

    let filters = Default::default();
    let during = app
        .state
        .availability
        .list_available(Some(window("2024-09-02", "2024-09-02")), &filters)
        .await
        .unwrap();
    assert_eq!(during[0].remaining, 1);

    let after = app
        .state
        .availability
        .list_available(Some(window("2024-09-10", "2024-09-12")), &filters)
        .await
        .unwrap();
    assert_eq!(after[0].remaining, 2);

    assert!(app
        .state
        .availability
        .is_available(car.id, window("2024-09-03", "2024-09-04"))
        .await
        .unwrap());
}
