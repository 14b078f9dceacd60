use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use dotenvy::dotenv;
use tokio::signal;
use tracing::{error, info, warn};

use car_rental::clients::{LogMailTransport, MailTransport, SmtpMailTransport, XenditInvoiceClient};
use car_rental::config::EnvironmentConfig;
use car_rental::database::connect_and_migrate;
use car_rental::repositories::PgBookingRepository;
use car_rental::routes::create_router;
use car_rental::services::{NotificationQueue, NotificationWorker};
use car_rental::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    info!("🚗 Car Rental API");
    info!("================");

    let config = EnvironmentConfig::from_env()?;

    // Inicializar base de datos
    let pool = match connect_and_migrate(&config.database).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("❌ Error conectando a la base de datos: {}", e);
            return Err(e);
        }
    };
    let repository = Arc::new(PgBookingRepository::new(pool));

    let gateway = Arc::new(XenditInvoiceClient::new(config.invoice.clone())?);

    // Correo: SMTP si está configurado, si no solo log
    let transport: Arc<dyn MailTransport> = match &config.mail.host {
        Some(host) => Arc::new(SmtpMailTransport::new(host, &config.mail)?),
        None => {
            warn!("⚠️ SMTP_HOST no configurado, los correos solo se registran en el log");
            Arc::new(LogMailTransport)
        }
    };
    let (notifications, receiver) = NotificationQueue::channel(config.mail.queue_capacity);
    let worker = NotificationWorker::new(receiver, transport).spawn();

    let addr: SocketAddr = config.server_url().parse()?;
    let state = AppState::new(config, repository, gateway, notifications);
    let app = create_router(state);

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   POST /users/register      - Registrar cliente");
    info!("   POST /users/login         - Login");
    info!("   GET  /users/profile       - Perfil y saldo");
    info!("   POST /users/topup         - Recargar saldo");
    info!("   GET  /cars                - Coches disponibles por fechas");
    info!("   GET  /cars/:id/availability - Disponibilidad de un coche");
    info!("   POST /rentals             - Reservar");
    info!("   GET  /rentals             - Mis reservas");
    info!("   POST /payments/callback   - Webhook del gateway");
    info!("   POST /payments/:id/invoice - Reintentar factura");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("❌ Error del servidor: {}", e);
    }

    // El router ya se soltó: al cerrarse la cola el worker vacía lo pendiente y termina
    if tokio::time::timeout(Duration::from_secs(10), worker).await.is_err() {
        warn!("⚠️ El worker de correos no terminó a tiempo");
    }

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo instalar el handler de Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el handler de SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
