//! Purpose: End-to-end tests for the remote client against a scripted endpoint.
//! Exports: None (integration test module).
//! Role: Validate login/call flows, token plumbing, and fault propagation over TCP.
//! Invariants: Uses a loopback-only stub that serves canned replies in order.
//! Invariants: Each scripted reply answers exactly one connection.

use domreg::api::{ErrorKind, RemoteClient, Session, domain_info, domain_list};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};

type TestResult<T> = Result<T, Box<dyn std::error::Error>>;

struct StubReply {
    status_line: &'static str,
    body: String,
}

impl StubReply {
    fn http_ok(body: impl Into<String>) -> Self {
        Self {
            status_line: "200 OK",
            body: body.into(),
        }
    }

    fn http_error(status_line: &'static str) -> Self {
        Self {
            status_line,
            body: String::new(),
        }
    }
}

struct StubServer {
    base_url: String,
    targets: Arc<Mutex<Vec<String>>>,
}

impl StubServer {
    // The serving thread is detached on purpose: joining it from Drop would
    // hang a failing test that never consumed every scripted reply.
    fn start(replies: Vec<StubReply>) -> TestResult<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let base_url = format!("http://{}", listener.local_addr()?);
        let targets = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&targets);
        std::thread::spawn(move || {
            for reply in replies {
                let Ok((mut stream, _)) = listener.accept() else {
                    return;
                };
                let target = read_request_target(&mut stream);
                captured
                    .lock()
                    .unwrap_or_else(|poison| poison.into_inner())
                    .push(target);
                let head = format!(
                    "HTTP/1.1 {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    reply.status_line,
                    reply.body.len()
                );
                let _ = stream.write_all(head.as_bytes());
                let _ = stream.write_all(reply.body.as_bytes());
            }
        });
        Ok(Self { base_url, targets })
    }

    fn client(&self) -> TestResult<RemoteClient> {
        Ok(RemoteClient::new(self.base_url.clone())?)
    }

    fn targets(&self) -> Vec<String> {
        self.targets
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone()
    }
}

fn read_request_target(stream: &mut std::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 512];
    loop {
        match stream.read(&mut chunk) {
            Ok(0) => break,
            Ok(read) => {
                buf.extend_from_slice(&chunk[..read]);
                if buf.windows(4).any(|window| window == b"\r\n\r\n") {
                    break;
                }
            }
            Err(_) => break,
        }
    }
    let text = String::from_utf8_lossy(&buf);
    text.lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or_default()
        .to_string()
}

fn reply_text(session_id: &str, body: &str) -> String {
    format!(
        "Version: 1.7.2\r\nStatus-Code: 0\r\nStatus-Text: OK\r\nSession-Id: {session_id}\r\nAccount-Balance: 42.50\r\n\r\n{body}"
    )
}

fn fault_text(code: i64, text: &str) -> String {
    format!("Version: 1.7.2\r\nStatus-Code: {code}\r\nStatus-Text: {text}\r\n\r\n")
}

#[test]
fn login_then_domain_info_flow() -> TestResult<()> {
    let server = StubServer::start(vec![
        StubReply::http_ok(reply_text("sid-1", "account.tld.0: com\naccount.tld.1: net\n")),
        StubReply::http_ok(reply_text(
            "sid-1",
            "domain.name: example.com\n\
             domain.status: active\n\
             domain.expires: 2027-03-01\n\
             domain.ns.0: ns1.example.net\n\
             domain.ns.1: ns2.example.net\n",
        )),
    ])?;

    let client = server.client()?;
    let (mut session, reply) = client.login("alice", "hunter2")?;
    assert_eq!(session.token(), Some("sid-1"));
    assert_eq!(session.balance(), Some("42.50"));
    assert_eq!(
        reply.decode_body().subtree("account").map(|t| t.len()),
        Some(1)
    );

    let info = domain_info(&client, &mut session, "example.com")?;
    assert_eq!(info.name, "example.com");
    assert_eq!(info.status.as_deref(), Some("active"));
    assert_eq!(info.expires.as_deref(), Some("2027-03-01"));
    assert_eq!(info.nameservers, vec!["ns1.example.net", "ns2.example.net"]);
    let expires = info.expires_date().expect("date");
    assert_eq!(expires.year(), 2027);

    let targets = server.targets();
    assert_eq!(targets.len(), 2);
    assert!(targets[0].starts_with("/request/login?"));
    assert!(targets[0].contains("username=alice"));
    assert!(targets[0].contains("password=hunter2"));
    assert!(targets[1].starts_with("/request/query-domain-info?"));
    assert!(targets[1].contains("domain=example.com"));
    assert!(targets[1].contains("auth-sid=sid-1"));
    Ok(())
}

#[test]
fn domain_list_shapes_numbered_siblings() -> TestResult<()> {
    let server = StubServer::start(vec![StubReply::http_ok(reply_text(
        "sid-9",
        "domain.0: alpha.com\ndomain.2: charlie.com\ndomain.1: bravo.com\n",
    ))])?;

    let client = server.client()?;
    let mut session = Session::with_token("sid-9");
    let domains = domain_list(&client, &mut session)?;
    assert_eq!(domains, vec!["alpha.com", "bravo.com", "charlie.com"]);
    Ok(())
}

#[test]
fn session_absorbs_refreshed_token() -> TestResult<()> {
    let server = StubServer::start(vec![StubReply::http_ok(reply_text("sid-next", ""))])?;

    let client = server.client()?;
    let mut session = Session::with_token("sid-old");
    client.call(&mut session, "query-profile", &[])?;
    assert_eq!(session.token(), Some("sid-next"));

    let targets = server.targets();
    assert!(targets[0].contains("auth-sid=sid-old"));
    Ok(())
}

#[test]
fn registrar_fault_aborts_with_status_context() -> TestResult<()> {
    let server = StubServer::start(vec![StubReply::http_ok(fault_text(
        2201,
        "domain not found",
    ))])?;

    let client = server.client()?;
    let mut session = Session::with_token("sid-1");
    let err = client
        .call(&mut session, "query-domain-info", &[("domain", "nope.com")])
        .expect_err("err");
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.status(), Some(2201));
    assert_eq!(err.command(), Some("query-domain-info"));
    assert_eq!(err.message(), Some("domain not found"));
    Ok(())
}

#[test]
fn expired_session_fault_maps_to_auth() -> TestResult<()> {
    let server = StubServer::start(vec![StubReply::http_ok(fault_text(
        2002,
        "session expired",
    ))])?;

    let client = server.client()?;
    let mut session = Session::with_token("sid-stale");
    let err = client
        .call(&mut session, "query-domain-list", &[])
        .expect_err("err");
    assert_eq!(err.kind(), ErrorKind::Auth);
    assert!(err.hint().is_some());
    // The failed call must not clobber the session state.
    assert_eq!(session.token(), Some("sid-stale"));
    Ok(())
}

#[test]
fn http_error_is_a_transport_fault() -> TestResult<()> {
    let server = StubServer::start(vec![StubReply::http_error("500 Internal Server Error")])?;

    let client = server.client()?;
    let mut session = Session::with_token("sid-1");
    let err = client
        .call(&mut session, "query-domain-list", &[])
        .expect_err("err");
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert_eq!(err.http_status(), Some(500));
    Ok(())
}

#[test]
fn reply_without_status_code_is_a_transport_fault() -> TestResult<()> {
    let server = StubServer::start(vec![StubReply::http_ok(
        "domain.name: example.com\n".to_string(),
    )])?;

    let client = server.client()?;
    let mut session = Session::with_token("sid-1");
    let err = client
        .call(&mut session, "query-domain-info", &[("domain", "example.com")])
        .expect_err("err");
    assert_eq!(err.kind(), ErrorKind::Transport);
    Ok(())
}

#[test]
fn login_reply_without_token_is_an_auth_fault() -> TestResult<()> {
    let server = StubServer::start(vec![StubReply::http_ok(
        "Version: 1.7.2\r\nStatus-Code: 0\r\nStatus-Text: OK\r\n\r\n".to_string(),
    )])?;

    let client = server.client()?;
    let err = client.login("alice", "hunter2").expect_err("err");
    assert_eq!(err.kind(), ErrorKind::Auth);
    Ok(())
}
