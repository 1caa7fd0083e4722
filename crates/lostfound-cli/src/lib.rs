use lostfound_core::models::Client;

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// A fresh secret suitable for `JWT_SECRET`: 64 hex characters.
pub fn generate_secret() -> String {
    let mut bytes = Vec::with_capacity(32);
    bytes.extend_from_slice(uuid::Uuid::new_v4().as_bytes());
    bytes.extend_from_slice(uuid::Uuid::new_v4().as_bytes());
    hex::encode(bytes)
}

/// Fixed-width listing of the client directory.
pub fn format_client_table(clients: &[Client]) -> String {
    let mut out = format!("{:<20} {:<28} {:<36}\n", "ID", "NAME", "EMAIL");
    for client in clients {
        out.push_str(&format!(
            "{:<20} {:<28} {:<36}\n",
            truncate_string(&client.id, 20),
            truncate_string(&client.name, 28),
            truncate_string(&client.email, 36),
        ));
    }
    out.push_str(&format!("{} client(s)\n", clients.len()));
    out
}
