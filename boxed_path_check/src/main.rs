use anyhow::{Context, Result, anyhow, bail};
use boxed_path::{
    BoxedPath, CaseSensitivity, JailbreakPolicy, PathKind, Sandbox, SandboxConfig, SandboxError,
};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

/// Boxed Path Checker
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    long_about = "Checks whether paths stay inside a sandbox directory, following symlinks the way the boxed_path library does."
)]
struct Cli {
    /// Sandbox root directory. Required unless --config provides one.
    #[arg(long)]
    root: Option<PathBuf>,

    /// TOML sandbox configuration file. Command-line flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// How symlinks inside the sandbox are treated.
    #[arg(long, value_enum)]
    policy: Option<PolicyArg>,

    /// Maximum number of symlink hops while resolving one path.
    #[arg(long)]
    max_link_follows: Option<usize>,

    /// Compare the root prefix case-insensitively.
    #[arg(long, conflicts_with = "case_sensitive")]
    case_insensitive: bool,

    /// Compare the root prefix case-sensitively.
    #[arg(long)]
    case_sensitive: bool,

    /// Print real resolved paths instead of masked labels.
    #[arg(long)]
    reveal: bool,

    /// Print one JSON array of verdicts instead of text lines.
    #[arg(long)]
    json: bool,

    /// Enable debug logging.
    #[arg(short, long)]
    debug: bool,

    /// Write logs to a daily rolling file in this directory instead of stderr.
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Paths to check, absolute or relative to the root.
    #[arg(required = true)]
    paths: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PolicyArg {
    Disallow,
    UncheckedSymlinks,
}

impl From<PolicyArg> for JailbreakPolicy {
    fn from(value: PolicyArg) -> Self {
        match value {
            PolicyArg::Disallow => JailbreakPolicy::Disallow,
            PolicyArg::UncheckedSymlinks => JailbreakPolicy::UncheckedSymlinks,
        }
    }
}

/// Outcome for one input path.
#[derive(Debug, Serialize)]
struct Verdict {
    input: String,
    kind: &'static str,
    allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolved: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[instrument]
fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.debug { "debug" } else { "info" };
    boxed_path::utils::logging::init_logging(log_level, cli.log_dir.as_deref())
        .context("Failed to initialize logging")?;

    let sandbox = sandbox_config(&cli)?.build()?;
    info!(sandbox = ?sandbox, "Checking {} path(s)", cli.paths.len());

    let verdicts: Vec<Verdict> = cli
        .paths
        .iter()
        .map(|raw| check_path(&sandbox, raw, cli.reveal))
        .collect();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&verdicts)?);
    } else {
        for verdict in &verdicts {
            println!("{}", render_line(verdict));
        }
    }

    let rejected = verdicts.iter().filter(|v| !v.allowed).count();
    if rejected == 0 {
        Ok(())
    } else {
        Err(anyhow!("{rejected} of {} path(s) rejected", verdicts.len()))
    }
}

/// Merge the optional config file with command-line overrides.
fn sandbox_config(cli: &Cli) -> Result<SandboxConfig> {
    let mut config = match (&cli.config, &cli.root) {
        (Some(path), _) => SandboxConfig::load_from_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        (None, Some(root)) => SandboxConfig::new(root),
        (None, None) => bail!("Either --root or --config is required"),
    };

    if let Some(root) = &cli.root {
        config.root = root.clone();
    }
    if let Some(policy) = cli.policy {
        config.jailbreak_policy = policy.into();
    }
    if let Some(max_link_follows) = cli.max_link_follows {
        config.max_link_follows = max_link_follows;
    }
    if cli.case_insensitive {
        config.case_sensitivity = Some(CaseSensitivity::Insensitive);
    } else if cli.case_sensitive {
        config.case_sensitivity = Some(CaseSensitivity::Sensitive);
    }

    Ok(config)
}

fn check_path(sandbox: &Sandbox, raw: &str, reveal: bool) -> Verdict {
    let input = if reveal {
        raw.to_string()
    } else {
        sandbox.mask(Path::new(raw))
    };
    let wrapped = sandbox.wrap(raw);
    // Only absolute input is refused at wrap time.
    let kind = wrapped.as_ref().map_or(PathKind::Absolute, BoxedPath::kind);

    let outcome = wrapped.and_then(|path| path.export());

    let mut verdict = Verdict {
        input,
        kind: match kind {
            PathKind::Absolute => "absolute",
            PathKind::Relative => "relative",
        },
        allowed: false,
        resolved: None,
        reason: None,
        error: None,
    };

    match outcome {
        Ok(resolved) => {
            verdict.allowed = true;
            verdict.resolved = Some(if reveal {
                resolved.display().to_string()
            } else {
                sandbox.mask(&resolved)
            });
        }
        Err(SandboxError::Security(violation)) => {
            warn!(path = %verdict.input, reason = ?violation.reason(), "Path rejected");
            verdict.reason = Some(format!("{:?}", violation.reason()));
            if reveal {
                verdict.error = Some(violation.to_string());
            }
        }
        Err(e) => {
            warn!(path = %verdict.input, "Path could not be checked");
            verdict.reason = Some("Filesystem".to_string());
            if reveal {
                verdict.error = Some(e.to_string());
            }
        }
    }

    verdict
}

fn render_line(verdict: &Verdict) -> String {
    match (&verdict.resolved, &verdict.reason) {
        (Some(resolved), _) => format!("OK       {} -> {}", verdict.input, resolved),
        (None, Some(reason)) => match &verdict.error {
            Some(error) => format!("REJECTED {} ({reason}: {error})", verdict.input),
            None => format!("REJECTED {} ({reason})", verdict.input),
        },
        (None, None) => format!("REJECTED {}", verdict.input),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("boxed_path_check").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_paths_are_required() {
        assert!(Cli::try_parse_from(["boxed_path_check", "--root", "/tmp"]).is_err());
    }

    #[test]
    fn test_case_flags_conflict() {
        assert!(
            Cli::try_parse_from([
                "boxed_path_check",
                "--root",
                "/tmp",
                "--case-insensitive",
                "--case-sensitive",
                "x",
            ])
            .is_err()
        );
    }

    #[test]
    fn test_root_or_config_is_required() {
        let cli = parse(&["some/path"]);
        assert!(sandbox_config(&cli).is_err());
    }

    #[test]
    fn test_flags_build_config() {
        let cli = parse(&[
            "--root",
            "/srv/box",
            "--policy",
            "unchecked-symlinks",
            "--max-link-follows",
            "2",
            "--case-insensitive",
            "a.txt",
        ]);
        let config = sandbox_config(&cli).unwrap();
        assert_eq!(config.root, PathBuf::from("/srv/box"));
        assert_eq!(config.jailbreak_policy, JailbreakPolicy::UncheckedSymlinks);
        assert_eq!(config.max_link_follows, 2);
        assert_eq!(config.case_sensitivity, Some(CaseSensitivity::Insensitive));
    }

    #[test]
    fn test_flags_override_config_file() {
        let temp = tempdir().unwrap();
        let config_path = temp.path().join("sandbox.toml");
        std::fs::write(
            &config_path,
            "root = \"/srv/from_file\"\nmax_link_follows = 9\njailbreak_policy = \"unchecked_symlinks\"\n",
        )
        .unwrap();

        let cli = parse(&[
            "--config",
            config_path.to_str().unwrap(),
            "--max-link-follows",
            "1",
            "x",
        ]);
        let config = sandbox_config(&cli).unwrap();
        assert_eq!(config.root, PathBuf::from("/srv/from_file"));
        assert_eq!(config.max_link_follows, 1);
        assert_eq!(config.jailbreak_policy, JailbreakPolicy::UncheckedSymlinks);
    }

    #[test]
    fn test_check_path_masks_by_default() {
        let temp = tempdir().unwrap();
        std::fs::create_dir(temp.path().join("data")).unwrap();
        let sandbox = Sandbox::new(temp.path()).unwrap();
        let root_text = sandbox.root_path().to_string_lossy().into_owned();

        let ok = check_path(&sandbox, "data/file.txt", false);
        assert!(ok.allowed);
        assert_eq!(ok.kind, "relative");
        assert_eq!(ok.resolved.as_deref(), Some("[SANDBOX_ROOT]...file.txt"));

        let rejected = check_path(&sandbox, "../../etc/passwd", false);
        assert!(!rejected.allowed);
        assert_eq!(rejected.reason.as_deref(), Some("LexicalEscape"));
        assert!(rejected.error.is_none());

        let line = render_line(&rejected);
        assert!(line.starts_with("REJECTED"));
        assert!(!line.contains(&root_text));
    }

    #[test]
    fn test_check_path_reveal_shows_real_paths() {
        let temp = tempdir().unwrap();
        let sandbox = Sandbox::new(temp.path()).unwrap();
        let verdict = check_path(&sandbox, "a.txt", true);
        assert_eq!(
            verdict.resolved,
            Some(sandbox.root_path().join("a.txt").display().to_string())
        );
        assert_eq!(verdict.input, "a.txt");
    }

    #[test]
    fn test_kind_comes_from_the_wrapped_value() {
        let temp = tempdir().unwrap();
        let sandbox = Sandbox::new(temp.path()).unwrap();

        let inside = sandbox.root_path().join("inside.txt");
        let absolute = check_path(&sandbox, inside.to_str().unwrap(), false);
        assert!(absolute.allowed);
        assert_eq!(absolute.kind, "absolute");

        let escaping = check_path(&sandbox, "../outside.txt", false);
        assert!(!escaping.allowed);
        assert_eq!(escaping.kind, "relative");

        let outside = temp.path().parent().unwrap().join("outside.txt");
        let rejected = check_path(&sandbox, outside.to_str().unwrap(), false);
        assert!(!rejected.allowed);
        assert_eq!(rejected.kind, "absolute");
    }

    #[cfg(unix)]
    #[test]
    fn test_verdicts_serialize_to_json() {
        let temp = tempdir().unwrap();
        let sandbox = Sandbox::new(temp.path()).unwrap();
        let verdicts = vec![
            check_path(&sandbox, "a.txt", false),
            check_path(&sandbox, "/etc/passwd", false),
        ];
        let json: serde_json::Value = serde_json::to_value(&verdicts).unwrap();
        assert_eq!(json[0]["allowed"], true);
        assert_eq!(json[1]["allowed"], false);
        assert_eq!(json[1]["kind"], "absolute");
        assert_eq!(json[1]["reason"], "LexicalEscape");
        assert!(json[1].get("resolved").is_none());
    }
}
