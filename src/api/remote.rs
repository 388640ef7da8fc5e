//! Purpose: Provide the HTTP transport for registrar management endpoints.
//! Exports: `RemoteClient`.
//! Role: Issues plain GET requests and returns parsed reply envelopes.
//! Invariants: A non-zero (or missing) reply status aborts before any body decode.
//! Invariants: The session token travels as the `auth-sid` query parameter.
//! Invariants: The session is updated only after a successful reply, explicitly.
#![allow(clippy::result_large_err)]

use super::session::Session;
use crate::core::error::{Error, ErrorKind};
use crate::core::reply::Reply;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use ureq::rustls::client::danger::{
    HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier,
};
use ureq::rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use ureq::rustls::{DigitallySignedStruct, Error as TlsError, SignatureScheme};
use url::Url;

type ApiResult<T> = Result<T, Error>;

#[derive(Clone)]
pub struct RemoteClient {
    inner: Arc<RemoteClientInner>,
}

struct RemoteClientInner {
    base_url: Url,
    agent: ureq::Agent,
}

#[derive(Debug)]
struct AcceptAllServerCertVerifier;

impl ServerCertVerifier for AcceptAllServerCertVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, TlsError> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, TlsError> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, TlsError> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        ureq::rustls::crypto::aws_lc_rs::default_provider()
            .signature_verification_algorithms
            .supported_schemes()
    }
}

impl RemoteClient {
    pub fn new(base_url: impl Into<String>) -> ApiResult<Self> {
        let base_url = normalize_base_url(base_url.into())?;
        let agent = ureq::AgentBuilder::new().build();
        Ok(Self {
            inner: Arc::new(RemoteClientInner { base_url, agent }),
        })
    }

    pub fn with_tls_ca_file(self, path: impl AsRef<Path>) -> ApiResult<Self> {
        let path = path.as_ref();
        let cert_bytes = std::fs::read(path).map_err(|err| {
            Error::new(ErrorKind::Usage)
                .with_message(format!(
                    "failed to read TLS CA/certificate file {}",
                    path.display()
                ))
                .with_source(err)
        })?;
        let mut cert_reader = Cursor::new(cert_bytes);
        let certs = rustls_pemfile::certs(&mut cert_reader)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| {
                Error::new(ErrorKind::Usage)
                    .with_message(format!(
                        "failed to parse TLS CA/certificate file {}",
                        path.display()
                    ))
                    .with_source(err)
            })?;
        if certs.is_empty() {
            return Err(Error::new(ErrorKind::Usage).with_message(format!(
                "TLS CA/certificate file {} contains no certificates",
                path.display()
            )));
        }

        let _ = ureq::rustls::crypto::aws_lc_rs::default_provider().install_default();
        let mut root_store = ureq::rustls::RootCertStore::empty();
        let (added, _) = root_store.add_parsable_certificates(certs);
        if added == 0 {
            return Err(Error::new(ErrorKind::Usage).with_message(format!(
                "TLS CA/certificate file {} contains no parsable certificates",
                path.display()
            )));
        }

        let tls_config = ureq::rustls::ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth();
        let agent = ureq::builder().tls_config(Arc::new(tls_config)).build();
        Ok(self.with_agent(agent))
    }

    pub fn with_tls_skip_verify(self) -> Self {
        let _ = ureq::rustls::crypto::aws_lc_rs::default_provider().install_default();
        let tls_config = ureq::rustls::ClientConfig::builder()
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAllServerCertVerifier))
            .with_no_client_auth();
        let agent = ureq::builder().tls_config(Arc::new(tls_config)).build();
        self.with_agent(agent)
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Perform the `login` command and return a fresh authenticated session
    /// together with the reply (its body lists account capabilities).
    pub fn login(&self, username: &str, password: &str) -> ApiResult<(Session, Reply)> {
        let reply = self.perform(
            "login",
            &[("username", username), ("password", password)],
            None,
        )?;
        if reply.head.session_id.is_none() {
            return Err(Error::new(ErrorKind::Auth)
                .with_message("login reply carried no session token")
                .with_command("login"));
        }
        let mut session = Session::new();
        session.update_from(&reply.head);
        Ok((session, reply))
    }

    /// Perform the `logout` command and clear the session token.
    pub fn logout(&self, session: &mut Session) -> ApiResult<Reply> {
        let reply = self.call(session, "logout", &[])?;
        session.clear();
        Ok(reply)
    }

    /// Perform one authenticated command. On success the session absorbs the
    /// reply head (token refresh, balance) before the reply is returned.
    pub fn call(
        &self,
        session: &mut Session,
        command: &str,
        params: &[(&str, &str)],
    ) -> ApiResult<Reply> {
        let Some(token) = session.token().map(str::to_string) else {
            return Err(Error::new(ErrorKind::Auth)
                .with_message("no active session")
                .with_command(command)
                .with_hint("Log in first."));
        };
        let reply = self.perform(command, params, Some(&token))?;
        session.update_from(&reply.head);
        Ok(reply)
    }

    fn perform(
        &self,
        command: &str,
        params: &[(&str, &str)],
        token: Option<&str>,
    ) -> ApiResult<Reply> {
        let url = build_request_url(&self.inner.base_url, command, params, token)?;
        tracing::debug!(command, "registrar request");
        let response = self
            .inner
            .agent
            .request("GET", url.as_str())
            .set("Accept", "text/plain")
            .call();

        match response {
            Ok(resp) => {
                let text = resp.into_string().map_err(|err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to read reply body")
                        .with_command(command)
                        .with_source(err)
                })?;
                let reply = Reply::parse(&text);
                tracing::debug!(command, status = ?reply.head.status_code, "registrar reply");
                match reply.head.status_code {
                    Some(0) => Ok(reply),
                    Some(code) => Err(reply_error(&reply, code, command)),
                    None => Err(Error::new(ErrorKind::Transport)
                        .with_message("reply carried no status code")
                        .with_command(command)),
                }
            }
            Err(ureq::Error::Status(code, _resp)) => {
                Err(Error::new(error_kind_from_http_status(code))
                    .with_message("GET request to registrar endpoint failed")
                    .with_http_status(code)
                    .with_command(command))
            }
            Err(ureq::Error::Transport(err)) => Err(Error::new(ErrorKind::Transport)
                .with_message("request failed")
                .with_command(command)
                .with_source(err)),
        }
    }

    fn with_agent(mut self, agent: ureq::Agent) -> Self {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.agent = agent;
        } else {
            self.inner = Arc::new(RemoteClientInner {
                base_url: self.inner.base_url.clone(),
                agent,
            });
        }
        self
    }
}

fn normalize_base_url(raw: String) -> ApiResult<Url> {
    let mut url = Url::parse(&raw).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("invalid registrar endpoint url")
            .with_source(err)
    })?;
    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("registrar endpoint must use http or https scheme"));
    }
    if url.path() != "/" && !url.path().is_empty() {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("registrar endpoint must not include a path"));
    }
    url.set_path("/");
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

fn build_request_url(
    base_url: &Url,
    command: &str,
    params: &[(&str, &str)],
    token: Option<&str>,
) -> ApiResult<Url> {
    if command.is_empty() || command.contains('/') {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("command name must be a single non-empty path segment"));
    }
    let mut url = base_url.clone();
    {
        let mut path = url.path_segments_mut().map_err(|_| {
            Error::new(ErrorKind::Usage).with_message("registrar endpoint cannot be a base url")
        })?;
        path.clear();
        path.push("request");
        path.push(command);
    }
    {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in params {
            pairs.append_pair(key, value);
        }
        if let Some(token) = token {
            pairs.append_pair("auth-sid", token);
        }
    }
    Ok(url)
}

fn reply_error(reply: &Reply, code: i64, command: &str) -> Error {
    let message = reply
        .head
        .status_text
        .clone()
        .unwrap_or_else(|| "registrar request failed".to_string());
    let mut err = Error::new(error_kind_from_reply_status(code))
        .with_message(message)
        .with_status(code)
        .with_command(command);
    if err.kind() == ErrorKind::Auth {
        err = err.with_hint("Session may have expired. Log in again.");
    }
    err
}

// Registrar status-code space: 0 success, 1xxx request/argument faults,
// 2xxx account/object faults, everything else endpoint-defined.
fn error_kind_from_reply_status(code: i64) -> ErrorKind {
    match code {
        1000..=1999 => ErrorKind::Usage,
        2000..=2099 => ErrorKind::Auth,
        2100..=2199 => ErrorKind::Permission,
        2200..=2299 => ErrorKind::NotFound,
        _ => ErrorKind::Registrar,
    }
}

fn error_kind_from_http_status(status: u16) -> ErrorKind {
    match status {
        401 | 403 => ErrorKind::Permission,
        404 => ErrorKind::NotFound,
        _ => ErrorKind::Transport,
    }
}
