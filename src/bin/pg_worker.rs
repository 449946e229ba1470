//! Runs one embedded `PostgreSQL` lifecycle step on behalf of the test
//! cluster.
//!
//! ```text
//! pg_worker <setup|start|stop> <payload.json>
//! ```
//!
//! `PostgreSQL` refuses to run as root, so root test runs delegate to this
//! binary. The payload, a serialized
//! `pg_embedded_setup_unpriv::worker::WorkerPayload`, is read first; the
//! process then switches to `nobody` before touching the cluster.

#[cfg(unix)]
use camino::{Utf8Path, Utf8PathBuf};
#[cfg(unix)]
use nix::unistd::{User, initgroups, setgid, setuid};
#[cfg(unix)]
use pg_embedded_setup_unpriv::ambient_dir_and_path;
#[cfg(unix)]
use pg_embedded_setup_unpriv::worker::{PlainSecret, WorkerPayload};
#[cfg(unix)]
use postgresql_embedded::{PostgreSQL, Status};
#[cfg(unix)]
use std::ffi::CString;
#[cfg(unix)]
use std::io::Read;
#[cfg(unix)]
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[cfg(unix)]
const UNPRIVILEGED_USER: &str = "nobody";

#[cfg(unix)]
#[derive(Debug, Error)]
enum WorkerError {
    #[error("usage: pg_worker <setup|start|stop> <payload.json>: {0}")]
    Usage(String),
    #[error("failed to read worker payload {path}")]
    Payload {
        path: Utf8PathBuf,
        #[source]
        source: BoxError,
    },
    #[error("failed to drop root privileges: {0}")]
    PrivilegeDrop(String),
    #[error("invalid PostgreSQL settings: {0}")]
    Settings(String),
    #[error("failed to build runtime")]
    Runtime(#[source] std::io::Error),
    #[error("PostgreSQL {step} failed: {reason}")]
    Postgres { step: Step, reason: String },
}

/// Lifecycle step requested by the test cluster.
#[cfg(unix)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Setup,
    Start,
    Stop,
}

#[cfg(unix)]
impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Setup => "setup",
            Self::Start => "start",
            Self::Stop => "stop",
        })
    }
}

#[cfg(unix)]
impl std::str::FromStr for Step {
    type Err = WorkerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "setup" => Ok(Self::Setup),
            "start" => Ok(Self::Start),
            "stop" => Ok(Self::Stop),
            other => Err(WorkerError::Usage(format!("unknown step '{other}'"))),
        }
    }
}

#[cfg(unix)]
fn main() -> Result<(), BoxError> {
    let args = std::env::args_os()
        .skip(1)
        .map(|arg| {
            arg.into_string()
                .map_err(|_| WorkerError::Usage("arguments must be UTF-8".to_owned()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let (step, payload_path) = parse_args(&args)?;
    run(step, &payload_path)?;
    Ok(())
}

#[cfg(not(unix))]
fn main() -> Result<(), BoxError> {
    Err("pg_worker needs a Unix host".into())
}

#[cfg(unix)]
fn parse_args(args: &[String]) -> Result<(Step, Utf8PathBuf), WorkerError> {
    match args {
        [step, payload] => Ok((step.parse()?, Utf8PathBuf::from(payload))),
        _ => Err(WorkerError::Usage(format!(
            "expected two arguments, got {}",
            args.len()
        ))),
    }
}

#[cfg(unix)]
fn run(step: Step, payload_path: &Utf8Path) -> Result<(), WorkerError> {
    let payload = load_payload(payload_path)?;
    drop_root(UNPRIVILEGED_USER)?;
    let settings = payload
        .settings
        .into_settings()
        .map_err(|err| WorkerError::Settings(err.to_string()))?;
    apply_environment(&payload.environment);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(WorkerError::Runtime)?;
    let mut server = PostgreSQL::new(settings);
    rt.block_on(async {
        match step {
            Step::Setup => {
                server.setup().await.map_err(|err| failed(step, &err))?;
                ensure_started(&mut server).await
            }
            Step::Start => ensure_started(&mut server).await,
            Step::Stop => server.stop().await.map_err(|err| failed(step, &err)),
        }
    })?;
    if step != Step::Stop {
        // Dropping the handle would stop the server this step just started.
        let _running = std::mem::ManuallyDrop::new(server);
    }
    Ok(())
}

#[cfg(unix)]
async fn ensure_started(server: &mut PostgreSQL) -> Result<(), WorkerError> {
    if matches!(server.status(), Status::Started) {
        return Ok(());
    }
    server
        .start()
        .await
        .map_err(|err| failed(Step::Start, &err))
}

#[cfg(unix)]
fn failed(step: Step, err: &impl std::fmt::Display) -> WorkerError {
    WorkerError::Postgres {
        step,
        reason: err.to_string(),
    }
}

#[cfg(unix)]
fn load_payload(path: &Utf8Path) -> Result<WorkerPayload, WorkerError> {
    let read = || -> Result<WorkerPayload, BoxError> {
        let (dir, relative) = ambient_dir_and_path(path)?;
        let mut bytes = Vec::new();
        dir.open(relative.as_std_path())?.read_to_end(&mut bytes)?;
        Ok(serde_json::from_slice(&bytes)?)
    };
    read().map_err(|source| WorkerError::Payload {
        path: path.to_owned(),
        source,
    })
}

/// Switches to `username` when started as root.
#[cfg(unix)]
fn drop_root(username: &str) -> Result<(), WorkerError> {
    if !nix::unistd::Uid::effective().is_root() {
        return Ok(());
    }
    let user = User::from_name(username)
        .map_err(|err| WorkerError::PrivilegeDrop(err.to_string()))?
        .ok_or_else(|| WorkerError::PrivilegeDrop(format!("no user named {username}")))?;
    let name =
        CString::new(user.name.as_str()).map_err(|err| WorkerError::PrivilegeDrop(err.to_string()))?;
    initgroups(&name, user.gid).map_err(|err| WorkerError::PrivilegeDrop(err.to_string()))?;
    setgid(user.gid).map_err(|err| WorkerError::PrivilegeDrop(err.to_string()))?;
    setuid(user.uid).map_err(|err| WorkerError::PrivilegeDrop(err.to_string()))?;

    // SAFETY: no other threads exist yet; the runtime is built afterwards.
    unsafe {
        std::env::set_var("HOME", &user.dir);
        std::env::set_var("USER", &user.name);
        std::env::set_var("LOGNAME", &user.name);
    }
    Ok(())
}

#[cfg(unix)]
fn apply_environment(environment: &[(String, Option<PlainSecret>)]) {
    for (key, value) in environment {
        // SAFETY: single-threaded until the runtime is built.
        unsafe {
            match value {
                Some(secret) => std::env::set_var(key, secret.expose()),
                None => std::env::remove_var(key),
            }
        }
    }
}
