//! HTTPS variant of the mock server with a freshly generated self-signed
//! certificate. No client trusts it unless certificate checks are disabled.

use std::sync::Arc;

use hyper::server::conn::http1;
use hyper_util::{rt::TokioIo, service::TowerToHyperService};
use rcgen::{CertificateParams, KeyPair};
use tokio::net::TcpListener;
use tokio_rustls::{
    rustls::{
        crypto::ring,
        pki_types::{PrivateKeyDer, PrivatePkcs8KeyDer},
        ServerConfig,
    },
    TlsAcceptor,
};
use tracing::debug;

use crate::{router, AppState};

pub type TlsSetupError = Box<dyn std::error::Error + Send + Sync>;

/// Acceptor for a self-signed certificate covering `localhost` and `127.0.0.1`.
pub fn self_signed_acceptor() -> Result<TlsAcceptor, TlsSetupError> {
    let key_pair = KeyPair::generate()?;
    let params = CertificateParams::new(vec!["localhost".to_string(), "127.0.0.1".to_string()])?;
    let cert = params.self_signed(&key_pair)?;
    let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key_pair.serialize_der()));

    let config = ServerConfig::builder_with_provider(Arc::new(ring::default_provider()))
        .with_safe_default_protocol_versions()?
        .with_no_client_auth()
        .with_single_cert(vec![cert.der().clone()], key)?;
    Ok(TlsAcceptor::from(Arc::new(config)))
}

/// Serve the mock router over TLS. Failed handshakes only drop that connection.
pub async fn serve_tls(
    listener: TcpListener,
    state: AppState,
    acceptor: TlsAcceptor,
) -> Result<(), std::io::Error> {
    let app = router(state);
    loop {
        let (stream, peer) = listener.accept().await?;
        let acceptor = acceptor.clone();
        let service = TowerToHyperService::new(app.clone());
        tokio::spawn(async move {
            let tls = match acceptor.accept(stream).await {
                Ok(tls) => tls,
                Err(err) => {
                    debug!(%peer, error = %err, "TLS handshake failed");
                    return;
                }
            };
            if let Err(err) = http1::Builder::new()
                .serve_connection(TokioIo::new(tls), service)
                .await
            {
                debug!(%peer, error = %err, "connection closed with error");
            }
        });
    }
}
