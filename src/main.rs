use anyhow::Context;
use api::{db, App};
use hyper::{server::conn::http1, service};
use hyper_util::rt::TokioIo;
use std::{
    convert::Infallible,
    env,
    net::{Ipv4Addr, SocketAddr},
};
use tokio::{net::TcpListener, runtime::Runtime};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    // Parse environment variables
    let port: u16 = env::var("PORT").context("missing PORT")?.parse()?;
    let secret = env::var("JWT_SECRET").context("missing JWT_SECRET")?;
    let frontend = env::var("FRONTEND_URL").context("missing FRONTEND_URL")?;
    let pg_host = env::var("PG_HOSTNAME").context("missing PG_HOSTNAME")?;
    let pg_user = env::var("PG_USERNAME").context("missing PG_USERNAME")?;
    let pg_pass = env::var("PG_PASSWORD").context("missing PG_PASSWORD")?;
    let pg_data = env::var("PG_DATABASE").context("missing PG_DATABASE")?;
    let pg_port = match env::var("PG_PORT") {
        Ok(value) => value.parse()?,
        _ => 5432,
    };

    // Connect to the database
    let runtime = Runtime::new()?;
    let (client, connection) = runtime.block_on(
        db::Config::new()
            .host(&pg_host)
            .port(pg_port)
            .user(&pg_user)
            .password(&pg_pass)
            .dbname(&pg_data)
            .connect(db::NoTls),
    )?;
    runtime.spawn(async move {
        if let Err(err) = connection.await {
            log::error!("database connection terminated: {err}");
        }
    });

    let app = App::new(client.into(), secret.as_bytes(), &frontend)?;
    let addr: SocketAddr = (Ipv4Addr::UNSPECIFIED, port).into();

    runtime.block_on(async {
        let listener = TcpListener::bind(addr).await?;
        log::info!("listening on {addr}");
        loop {
            let (stream, remote) = tokio::select! {
                accept = listener.accept() => accept?,
                signal = tokio::signal::ctrl_c() => {
                    signal?;
                    log::info!("shutdown signal received");
                    break;
                }
            };
            log::debug!("accepted connection from {remote}");
            let io = TokioIo::new(stream);
            let app_outer = app.clone();
            tokio::spawn(async move {
                let service = service::service_fn(move |req| {
                    let app_inner = app_outer.clone();
                    async move { Ok::<_, Infallible>(app_inner.respond(req).await) }
                });
                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    log::error!("connection error: {err}");
                }
            });
        }
        anyhow::Ok(())
    })
}
