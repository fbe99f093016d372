mod store;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use docseal_core::{SealEngine, SealSettings, TrustLevel};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::store::{
    load_identity, load_keyring, load_relationships, replace_identity, save_identity, IdentityFile,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Docseal document signing", long_about = None)]
struct Cli {
    /// JSON file overriding engine settings
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a sealed signing key for a user
    Register {
        #[arg(long)]
        owner: Option<Uuid>,
        /// Prompted for (or read from DOCSEAL_PASSWORD) when omitted
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        out: PathBuf,
    },
    /// Sign a document and write signed_<name> next to it (or into --out-dir)
    Sign {
        #[arg(long)]
        identity: PathBuf,
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Verify a signed document; exits non-zero when the result is RED
    Verify {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        requester: Uuid,
        /// Directory of identity files whose public keys are candidates
        #[arg(long)]
        keyring: PathBuf,
        /// JSON list of accepted invitations
        #[arg(long)]
        relationships: Option<PathBuf>,
    },
    /// Re-seal a private key after a password change
    Rewrap {
        #[arg(long)]
        identity: PathBuf,
        /// Prompted for (or read from DOCSEAL_PASSWORD) when omitted
        #[arg(long)]
        old_password: Option<String>,
        /// Prompted for (or read from DOCSEAL_NEW_PASSWORD) when omitted
        #[arg(long)]
        new_password: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let engine = build_engine(cli.settings.as_deref())?;

    match cli.command {
        Commands::Register {
            owner,
            password,
            out,
        } => {
            let owner = owner.unwrap_or_else(Uuid::new_v4);
            let password =
                resolve_password(password, PASSWORD_ENV, "New signing password", true)?;
            let registration = engine.register(owner, &password)?;
            save_identity(&out, &IdentityFile::from_registration(&registration))?;
            info!(owner = %owner, path = %out.display(), "identity written");
            println!("{owner}");
        }
        Commands::Sign {
            identity,
            password,
            input,
            out_dir,
        } => {
            let identity = load_identity(&identity)?;
            let salt = identity.salt()?;
            let password = resolve_password(password, PASSWORD_ENV, "Signing password", false)?;
            let content =
                std::fs::read(&input).with_context(|| format!("read {}", input.display()))?;
            let filename = input
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| anyhow!("input path has no usable file name"))?;

            let signed =
                engine.sign_document(&identity.key_pair, &password, &salt, filename, &content)?;

            let dir = match out_dir {
                Some(dir) => dir,
                None => input
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from(".")),
            };
            let out = dir.join(&signed.filename);
            std::fs::write(&out, &signed.composite)
                .with_context(|| format!("write {}", out.display()))?;
            println!("{}", out.display());
        }
        Commands::Verify {
            input,
            requester,
            keyring,
            relationships,
        } => {
            let composite =
                std::fs::read(&input).with_context(|| format!("read {}", input.display()))?;
            let candidates = load_keyring(&keyring)?;
            let relationships = load_relationships(relationships.as_deref())?;

            let report =
                engine.verify_document(&composite, &requester, &candidates, &relationships)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if report.trust_level == TrustLevel::Red {
                return Err(anyhow!(report.message));
            }
        }
        Commands::Rewrap {
            identity: path,
            old_password,
            new_password,
        } => {
            let mut identity = load_identity(&path)?;
            let salt = identity.salt()?;
            let old_password =
                resolve_password(old_password, PASSWORD_ENV, "Current password", false)?;
            let new_password =
                resolve_password(new_password, NEW_PASSWORD_ENV, "New password", true)?;
            identity.key_pair.encrypted_private_key = engine.rewrap_private_key(
                &identity.key_pair.encrypted_private_key,
                &old_password,
                &new_password,
                &salt,
            )?;
            replace_identity(&path, &identity)?;
            info!(owner = %identity.key_pair.owner_id, "private key re-sealed");
        }
    }
    Ok(())
}

const PASSWORD_ENV: &str = "DOCSEAL_PASSWORD";
const NEW_PASSWORD_ENV: &str = "DOCSEAL_NEW_PASSWORD";

/// Flag value first, then the environment, then an interactive prompt.
fn resolve_password(
    flag: Option<String>,
    env_var: &str,
    prompt: &str,
    confirm: bool,
) -> Result<String> {
    if let Some(pw) = flag {
        return Ok(pw);
    }
    if let Ok(pw) = std::env::var(env_var) {
        if !pw.is_empty() {
            return Ok(pw);
        }
    }
    let pw = rpassword::prompt_password(format!("{prompt}: "))
        .map_err(|e| anyhow!("password prompt: {e}"))?;
    if confirm {
        let second = rpassword::prompt_password("Confirm password: ")
            .map_err(|e| anyhow!("password prompt: {e}"))?;
        if pw != second {
            return Err(anyhow!("passwords do not match"));
        }
    }
    Ok(pw)
}

fn build_engine(settings: Option<&Path>) -> Result<SealEngine> {
    let settings = match settings {
        Some(path) => SealSettings::from_json_file(path)?,
        None => SealSettings::default(),
    };
    Ok(SealEngine::new(settings)?)
}
