//! Check Xenqu credentials from the environment.
//!
//! Authenticates with the JWT-bearer strategy and optionally performs one
//! signed GET.
//!
//! ```sh
//! export XENQU_CLIENT_ID=...
//! export XENQU_CLIENT_SECRET=...
//! export XENQU_SUPER_ADMIN_SUBSCRIBER=...
//! export XENQU_PRIVATE_KEY_FILE=path/to/key.pem
//! cargo run --bin xenqu-auth-check -- /user
//! ```

use tracing_subscriber::EnvFilter;
use xenqu_auth::{StrategyKind, XenquConfig};
use xenqu_rest::XenquRestClient;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = XenquConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!();
        eprintln!("  Required: XENQU_CLIENT_ID, XENQU_CLIENT_SECRET");
        eprintln!(
            "  JWT Bearer: XENQU_SUPER_ADMIN_SUBSCRIBER and \
             XENQU_PRIVATE_KEY or XENQU_PRIVATE_KEY_FILE"
        );
        eprintln!("  Optional: XENQU_BASE_URL (default https://xenqu.com/api)");
        std::process::exit(1);
    });

    if config.strategy_kind() != StrategyKind::JwtBearer {
        eprintln!(
            "Error: JWT Bearer settings missing; \
             set XENQU_SUPER_ADMIN_SUBSCRIBER and a private key."
        );
        std::process::exit(1);
    }

    let client = XenquRestClient::from_config(&config).unwrap_or_else(|e| {
        eprintln!("Error: Failed to create client: {e}");
        std::process::exit(1);
    });

    let credentials = client
        .authenticator()
        .authenticate()
        .await
        .unwrap_or_else(|e| {
            eprintln!("Error: Failed to authenticate: {e}");
            std::process::exit(1);
        });

    println!("Authenticated to {}", config.base_url);
    println!("  consumer key: {}", credentials.consumer_key);

    let Some(path) = std::env::args().nth(1) else {
        return;
    };

    match client.get::<serde_json::Value>(&path, &[]).await {
        Ok(body) => match serde_json::to_string_pretty(&body) {
            Ok(pretty) => println!("{pretty}"),
            Err(_) => println!("{body}"),
        },
        Err(e) => {
            eprintln!("Error: GET {path} failed: {e}");
            std::process::exit(1);
        }
    }
}
