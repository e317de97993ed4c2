//! Configuration loading and resolution.

/// Port the local server uses when nothing else is configured.
pub const DEFAULT_PORT: u16 = 3000;

pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Resolve the listen port: explicit value, then `STEVIE_PORT`, then the default.
pub fn resolve_port(explicit: Option<u16>) -> u16 {
    if let Some(port) = explicit {
        return port;
    }

    match std::env::var("STEVIE_PORT") {
        Ok(value) => value.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid STEVIE_PORT value: {value}");
            DEFAULT_PORT
        }),
        Err(_) => DEFAULT_PORT,
    }
}

/// Resolve the listen host: explicit value, then `STEVIE_HOST`, then loopback.
pub fn resolve_host(explicit: Option<&str>) -> String {
    if let Some(host) = explicit {
        return host.to_string();
    }

    std::env::var("STEVIE_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string())
}

pub fn resolve_listen_addr(host: Option<&str>, port: Option<u16>) -> String {
    format!("{}:{}", resolve_host(host), resolve_port(port))
}
