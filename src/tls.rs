use std::sync::Once;

/// Select ring as the process-wide rustls provider before the first TLS
/// connection to the API server is made.
pub fn ensure_rustls_provider_installed() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        if rustls::crypto::ring::default_provider()
            .install_default()
            .is_err()
        {
            tracing::debug!("A rustls crypto provider was already installed");
        }
    });
}
