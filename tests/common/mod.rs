use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const JWT_SECRET: &str = "integration-test-secret";

#[allow(dead_code)]
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub config_path: PathBuf,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // Nothing listens on port 1, so every store call fails fast and only
        // database-free paths are exercised.
        let config_path = std::env::temp_dir().join(format!("dify-admin-it-{}-{}.yaml", std::process::id(), port));
        std::fs::write(
            &config_path,
            format!(
                r#"
database:
  host: 127.0.0.1
  port: 1
  user: nobody
  dbname: nothing
  acquire_timeout_secs: 1
  max_retries: 0
admins:
  - {admin}
server:
  host: 127.0.0.1
  port: {port}
security:
  jwt_secret: {secret}
"#,
                admin = ADMIN_EMAIL,
                port = port,
                secret = JWT_SECRET
            ),
        )
        .context("failed to write test config")?;

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_dify-admin-api"));
        // Run outside the workspace so the server's .env lookup finds nothing
        cmd.current_dir(std::env::temp_dir())
            .arg("--config")
            .arg(&config_path)
            .env("RUST_LOG", "warn")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        // Keep the developer's shell from redirecting the server
        for var in [
            "DATABASE_HOST",
            "DATABASE_PORT",
            "DATABASE_USER",
            "DATABASE_PASSWORD",
            "DATABASE_NAME",
            "DATABASE_MAX_CONNECTIONS",
            "SERVER_HOST",
            "SERVER_PORT",
            "JWT_SECRET",
            "ADMIN_EMAILS",
            "CORS_ORIGINS",
        ] {
            cmd.env_remove(var);
        }

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, config_path, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK || resp.status() == StatusCode::SERVICE_UNAVAILABLE {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(15)).await?;
    Ok(server)
}
