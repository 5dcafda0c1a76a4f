//! Configuration for the gradebook server.
//!
//! CLI arguments with environment variable fallbacks using clap.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use crate::error::StatusPolicy;
use crate::identity::DigestKind;

/// gradebook - teacher/student grade service
#[derive(Parser, Debug, Clone)]
#[command(name = "gradebook")]
#[command(about = "Course rosters and grade ledger over HTTP")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "GRADEBOOK_LISTEN", default_value = "0.0.0.0:3000")]
    pub listen: SocketAddr,

    /// JSON directory of teachers, students and courses (built-in school when unset)
    #[arg(long, env = "GRADEBOOK_DIRECTORY")]
    pub directory: Option<PathBuf>,

    /// Digest used to derive session tokens from emails
    #[arg(long, env = "GRADEBOOK_TOKEN_DIGEST", value_enum, default_value_t = DigestKind::Md5)]
    pub token_digest: DigestKind,

    /// uniform: every failure is a 500; semantic: 400/401/403/404 by error kind
    #[arg(long, env = "GRADEBOOK_STATUS_POLICY", value_enum, default_value_t = StatusPolicy::Uniform)]
    pub status_policy: StatusPolicy,

    /// Simulated latency added to every request, in seconds
    #[arg(long, env = "GRADEBOOK_LATENCY", default_value_t = 0.0)]
    pub latency: f64,

    /// Log level used when RUST_LOG is unset (trace, debug, info, warn, error)
    #[arg(long, env = "GRADEBOOK_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENV_VARS: [&str; 6] = [
        "GRADEBOOK_LISTEN",
        "GRADEBOOK_DIRECTORY",
        "GRADEBOOK_TOKEN_DIGEST",
        "GRADEBOOK_STATUS_POLICY",
        "GRADEBOOK_LATENCY",
        "GRADEBOOK_LOG_LEVEL",
    ];

    // Parse with the process environment scrubbed so an exported GRADEBOOK_* cannot leak in.
    fn parse_clean(argv: &[&str]) -> Result<Args, clap::Error> {
        for var in ENV_VARS {
            std::env::remove_var(var);
        }
        Args::try_parse_from(argv)
    }

    #[test]
    fn parser_defaults() {
        let a = parse_clean(&["gradebook"]).unwrap();
        assert_eq!(a.listen, SocketAddr::from(([0, 0, 0, 0], 3000)));
        assert_eq!(a.token_digest, DigestKind::Md5);
        assert_eq!(a.status_policy, StatusPolicy::Uniform);
        assert_eq!(a.latency, 0.0);
        assert_eq!(a.log_level, "info");
        assert!(a.directory.is_none());
    }

    #[test]
    fn flags_override() {
        let a = parse_clean(&[
            "gradebook",
            "--listen", "127.0.0.1:8080",
            "--token-digest", "sha256",
            "--status-policy", "semantic",
            "--latency", "0.25",
            "--directory", "school.json",
        ])
        .unwrap();
        assert_eq!(a.listen.port(), 8080);
        assert_eq!(a.token_digest, DigestKind::Sha256);
        assert_eq!(a.status_policy, StatusPolicy::Semantic);
        assert_eq!(a.latency, 0.25);
        assert_eq!(a.directory.as_deref(), Some(std::path::Path::new("school.json")));
        assert!(parse_clean(&["gradebook", "--token-digest", "crc32"]).is_err());
    }
}
