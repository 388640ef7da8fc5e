//! Purpose: Hold top-level CLI command dispatch for `domreg`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Output envelopes and exit-code semantics live with `main.rs` helpers.
//! Invariants: Every network command persists session changes before returning.

use super::*;

pub(super) fn dispatch_command(command: Command, ctx: CliContext) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "domreg", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Version => {
            emit_version_output();
            Ok(RunOutcome::ok())
        }
        Command::Login {
            username,
            password,
            password_file,
            json,
        } => {
            let password = resolve_password(password, password_file)?;
            let client = ctx.client()?;
            let (session, _reply) = client.login(&username, &password)?;
            let token = session.token().ok_or_else(|| {
                Error::new(ErrorKind::Internal).with_message("login produced no session token")
            })?;
            save_token(&ctx.session_file, token)?;

            if json || !io::stdout().is_terminal() {
                emit_json(json!({
                    "login": {
                        "endpoint": client.base_url().as_str(),
                        "balance": session.balance(),
                        "session_file": ctx.session_file.display().to_string(),
                    }
                }));
            } else {
                println!("Logged in to {}.", client.base_url());
                if let Some(balance) = session.balance() {
                    println!("Account balance: {balance}");
                }
            }
            Ok(RunOutcome::ok())
        }
        Command::Logout { json } => {
            let (mut session, _stored) = ctx.open_session()?;
            let client = ctx.client()?;
            match client.logout(&mut session) {
                Ok(_) => {}
                // An already-expired token still ends the local session.
                Err(err) if err.kind() == ErrorKind::Auth => {}
                Err(err) => return Err(err),
            }
            clear_token(&ctx.session_file)?;

            if json || !io::stdout().is_terminal() {
                emit_json(json!({ "logout": { "cleared": true } }));
            } else {
                println!("Logged out.");
            }
            Ok(RunOutcome::ok())
        }
        Command::Query {
            command,
            params,
            raw,
        } => {
            let pairs = params
                .iter()
                .map(|param| parse_param(param))
                .collect::<Result<Vec<_>, _>>()?;
            let borrowed: Vec<(&str, &str)> = pairs
                .iter()
                .map(|(key, value)| (key.as_str(), value.as_str()))
                .collect();

            let client = ctx.client()?;
            let (mut session, stored) = ctx.open_session()?;
            let reply = client.call(&mut session, &command, &borrowed)?;
            ctx.persist_session(&stored, &session)?;

            if raw {
                print!("{}", reply.body);
            } else {
                emit_tree(&reply.decode_body(), ctx.color);
            }
            Ok(RunOutcome::ok())
        }
        Command::Domain { command } => match command {
            DomainCommand::Info { name, json } => {
                let client = ctx.client()?;
                let (mut session, stored) = ctx.open_session()?;
                let info = domreg::api::domain_info(&client, &mut session, &name)?;
                ctx.persist_session(&stored, &session)?;

                if json || !io::stdout().is_terminal() {
                    emit_json(json!({ "domain": &info }));
                } else {
                    println!("{}", info.name);
                    if let Some(status) = &info.status {
                        println!("  status:  {status}");
                    }
                    if let Some(expires) = &info.expires {
                        println!("  expires: {expires}");
                    }
                    for ns in &info.nameservers {
                        println!("  ns:      {ns}");
                    }
                }
                Ok(RunOutcome::ok())
            }
            DomainCommand::List { json } => {
                let client = ctx.client()?;
                let (mut session, stored) = ctx.open_session()?;
                let domains = domreg::api::domain_list(&client, &mut session)?;
                ctx.persist_session(&stored, &session)?;

                if json || !io::stdout().is_terminal() {
                    emit_json(json!({ "domains": domains }));
                } else if domains.is_empty() {
                    println!("No domains.");
                } else {
                    for domain in &domains {
                        println!("{domain}");
                    }
                }
                Ok(RunOutcome::ok())
            }
        },
    }
}
