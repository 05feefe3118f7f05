use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use clap::{Parser, Subcommand};
use std::net::Ipv4Addr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_postgres::{Client, NoTls};

mod utils;

mod db_types;
mod handlers;
mod request;
mod response;
mod session;
mod token;

// auth flows
mod auth;
mod mail_service;

// database interface
mod password_reset_service;
mod store;
mod user_service;

#[cfg(test)]
mod memory_store;

use auth::AuthConfig;
use db_types::Role;
use mail_service::MailService;
use store::PgStore;

static SERVICE_NAME: &str = "college-auth";
static VERSION_MAJOR: i64 = 0;
static VERSION_MINOR: i64 = 1;
static VERSION_REV: i64 = 0;

static SCHEMA: &str = include_str!("../sql/schema.sql");

#[derive(Parser, Clone)]
#[clap(about, version, author)]
struct Opts {
    #[clap(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,
    #[clap(long, env = "JWT_SECRET", hide_env_values = true)]
    jwt_secret: String,
    #[clap(long, env = "HASH_TIME_COST")]
    hash_time_cost: Option<u32>,
    #[clap(long, env = "HASH_MEM_COST")]
    hash_mem_cost: Option<u32>,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Clone)]
enum Command {
    /// Run the HTTP service
    Serve {
        #[clap(long, env = "PORT", default_value_t = 4000)]
        port: u16,
        #[clap(long, env = "SITE_EXTERNAL_URL")]
        site_external_url: String,
        #[clap(long, env = "MAIL_SERVICE_URL")]
        mail_service_url: String,
        /// comma separated list of origins allowed by CORS
        #[clap(long, env = "PERMITTED_ORIGINS", default_value = "")]
        permitted_origins: String,
    },
    /// Create an admin with an explicit password
    SeedAdmin {
        #[clap(long)]
        email: String,
        #[clap(long)]
        employee_id: i64,
        #[clap(long, env = "SEED_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

/// Shared app state. Production runs on `Data<PgStore<Client>, MailService>`.
pub struct Data<S, M> {
    pub db: Arc<Mutex<S>>,
    pub mail_service: M,
    pub auth: Arc<AuthConfig>,
    pub permitted_origins: Vec<String>,
}

impl<S, M: Clone> Clone for Data<S, M> {
    fn clone(&self) -> Self {
        Data {
            db: self.db.clone(),
            mail_service: self.mail_service.clone(),
            auth: self.auth.clone(),
            permitted_origins: self.permitted_origins.clone(),
        }
    }
}

async fn connect(database_url: &str) -> Result<Client, tokio_postgres::Error> {
    let (client, connection) = loop {
        match tokio_postgres::connect(database_url, NoTls).await {
            Ok(v) => break v,
            Err(e) => {
                log::error!("{}", e);
            }
        }

        // sleep for 5 seconds
        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
    };

    // The connection object performs the actual communication with the database,
    // so spawn it off to run on its own.
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            log::error!("connection error: {}", e);
        }
    });

    client.batch_execute(SCHEMA).await?;

    Ok(client)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + 'static>> {
    env_logger::init();

    let Opts {
        database_url,
        jwt_secret,
        hash_time_cost,
        hash_mem_cost,
        command,
    } = Opts::parse();

    let default_hash_config = utils::HashConfig::default();
    let hash_config = utils::HashConfig {
        time_cost: hash_time_cost.unwrap_or(default_hash_config.time_cost),
        mem_cost: hash_mem_cost.unwrap_or(default_hash_config.mem_cost),
    };

    // misconfiguration is fatal here rather than a 500 on every request
    hash_config.validate()?;
    let auth_config = Arc::new(AuthConfig::new(&jwt_secret, hash_config)?);

    let client = connect(&database_url).await?;

    match command {
        Command::SeedAdmin {
            email,
            employee_id,
            password,
        } => {
            let admin = auth::register_with_password(
                &mut PgStore(client),
                &auth_config,
                Role::Admin,
                &email,
                Some(employee_id),
                &password,
            )
            .await?;
            log::info!("seeded admin {} ({})", admin.user_id, admin.email);
            Ok(())
        }
        Command::Serve {
            port,
            site_external_url,
            mail_service_url,
            permitted_origins,
        } => {
            let data = Data {
                db: Arc::new(Mutex::new(PgStore(client))),
                mail_service: MailService::new(&mail_service_url, &site_external_url)?,
                auth: auth_config,
                permitted_origins: permitted_origins
                    .split(',')
                    .map(str::trim)
                    .filter(|x| !x.is_empty())
                    .map(|x| x.into())
                    .collect(),
            };

            log::info!("{} listening on port {}", SERVICE_NAME, port);

            HttpServer::new(move || {
                let cors = data
                    .permitted_origins
                    .iter()
                    .fold(
                        Cors::default()
                            .allow_any_method()
                            .allow_any_header()
                            .supports_credentials(),
                        |cors, origin| cors.allowed_origin(origin),
                    );

                App::new()
                    .wrap(middleware::Logger::default())
                    .wrap(cors)
                    .app_data(web::Data::new(data.clone()))
                    .app_data(web::Data::from(data.auth.clone()))
                    .configure(handlers::config::<PgStore<Client>, MailService>)
                    .default_service(web::route().to(handlers::not_found))
            })
            .bind((Ipv4Addr::UNSPECIFIED, port))?
            .run()
            .await?;

            Ok(())
        }
    }
}
