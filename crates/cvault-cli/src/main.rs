//! cvault: vault crypto command-line tool
//!
//! Commands:
//!   config show                         - display current configuration
//!   masterkey generate                  - print a fresh 64-byte masterkey as hex
//!   dir new | dir path [<id>]           - create directory ids, map them to storage paths
//!   name encrypt|decrypt <name>         - encrypt/decrypt a name within a directory
//!   ecies keygen|seal|open              - exchange secrets with P-384 ECIES
//!
//! Masterkey-consuming commands read the key from --masterkey or CVAULT_MASTERKEY.

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use clap::{Parser, Subcommand, ValueEnum};
use data_encoding::{HEXLOWER, HEXLOWER_PERMISSIVE};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use zeroize::Zeroizing;

use cvault_core::config::CvaultConfig;
use cvault_crypto::ecies::{
    generate_key_pair, public_key_from_sec1, public_key_to_sec1, secret_key_from_bytes,
};
use cvault_crypto::{Cryptor, DirectoryMetadata, EncryptedMessage, Masterkey, P384Ecies};

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "cvault",
    version,
    about = "cvault vault cryptography",
    long_about = "cvault: generate vault keys, encrypt names and directory paths, exchange keys with ECIES"
)]
struct Cli {
    /// Path to cvault.toml configuration file
    #[arg(long, short = 'c', env = "CVAULT_CONFIG", default_value = "cvault.toml")]
    config: PathBuf,

    /// Log level or filter directive (overrides config)
    #[arg(long, global = true)]
    log: Option<String>,

    /// Log output format (overrides config)
    #[arg(long, value_enum, global = true)]
    log_format: Option<LogFormat>,

    /// Vault masterkey as 128 hex characters
    #[arg(long, env = "CVAULT_MASTERKEY", hide_env_values = true, global = true)]
    masterkey: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Vault masterkey management
    Masterkey {
        #[command(subcommand)]
        action: MasterkeyAction,
    },

    /// Directory ids and storage paths
    Dir {
        #[command(subcommand)]
        action: DirAction,
    },

    /// File name encryption within a directory
    Name {
        #[command(subcommand)]
        action: NameAction,
    },

    /// P-384 ECIES key exchange
    Ecies {
        #[command(subcommand)]
        action: EciesAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

#[derive(Subcommand, Debug)]
enum MasterkeyAction {
    /// Print a fresh random masterkey (encryption key || MAC key) as hex
    Generate,
}

#[derive(Subcommand, Debug)]
enum DirAction {
    /// Create a new directory id and print it with its storage path
    New,

    /// Print the storage path of a directory
    Path {
        /// Directory id (omit for the root directory)
        id: Option<String>,
        /// Use the root directory
        #[arg(long, conflicts_with = "id")]
        root: bool,
    },
}

#[derive(Subcommand, Debug)]
enum NameAction {
    /// Encrypt a cleartext name (suffix included in the output)
    Encrypt {
        name: String,
        /// Id of the parent directory (default: root)
        #[arg(long, default_value = "")]
        dir_id: String,
    },

    /// Decrypt a suffixed encrypted name
    Decrypt {
        ciphertext: String,
        /// Id of the parent directory (default: root)
        #[arg(long, default_value = "")]
        dir_id: String,
    },
}

#[derive(Subcommand, Debug)]
enum EciesAction {
    /// Generate a recipient key pair; prints the public key as hex
    Keygen {
        /// File receiving the hex-encoded secret key
        #[arg(long)]
        secret_out: PathBuf,
    },

    /// Encrypt a file for a recipient public key
    Seal {
        /// Recipient SEC1 public key as hex
        #[arg(long)]
        recipient: String,
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },

    /// Decrypt a sealed message with a secret key file
    Open {
        /// File holding the hex-encoded secret key
        #[arg(long)]
        secret: PathBuf,
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
}

/// On-disk form of an ECIES message
#[derive(Debug, Serialize, Deserialize)]
struct MessageFile {
    /// Base64 SEC1 uncompressed ephemeral public key
    ephemeral_public_key: String,
    /// Base64 AEAD output
    ciphertext: String,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = CvaultConfig::load(&cli.config)
        .with_context(|| format!("loading config: {}", cli.config.display()))?;

    let level = cli.log.clone().unwrap_or_else(|| config.log.level.clone());
    let format = cli.log_format.unwrap_or(if config.log.format == "json" {
        LogFormat::Json
    } else {
        LogFormat::Text
    });
    init_logging(&level, format);

    let masterkey = cli.masterkey.map(SecretString::from);

    match cli.command {
        Commands::Config { action: ConfigAction::Show } => cmd_config_show(&config, &cli.config),
        Commands::Masterkey { action: MasterkeyAction::Generate } => cmd_masterkey_generate(),
        Commands::Dir { action: DirAction::New } => {
            let cryptor = build_cryptor(&config, masterkey.as_ref())?;
            cmd_dir_new(&cryptor)
        }
        Commands::Dir { action: DirAction::Path { id, root } } => {
            let cryptor = build_cryptor(&config, masterkey.as_ref())?;
            let id = if root { None } else { id };
            cmd_dir_path(&cryptor, id.as_deref())
        }
        Commands::Name { action: NameAction::Encrypt { name, dir_id } } => {
            let cryptor = build_cryptor(&config, masterkey.as_ref())?;
            cmd_name_encrypt(&cryptor, &name, &dir_id)
        }
        Commands::Name { action: NameAction::Decrypt { ciphertext, dir_id } } => {
            let cryptor = build_cryptor(&config, masterkey.as_ref())?;
            cmd_name_decrypt(&cryptor, &ciphertext, &dir_id)
        }
        Commands::Ecies { action: EciesAction::Keygen { secret_out } } => {
            cmd_ecies_keygen(&secret_out)
        }
        Commands::Ecies { action: EciesAction::Seal { recipient, input, output } } => {
            cmd_ecies_seal(&recipient, &input, &output)
        }
        Commands::Ecies { action: EciesAction::Open { secret, input, output } } => {
            cmd_ecies_open(&secret, &input, &output)
        }
    }
}

fn init_logging(level: &str, format: LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries command output; logs go to stderr
    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

// ── Masterkey handling ────────────────────────────────────────────────────────

fn parse_masterkey(hex: &SecretString) -> Result<Masterkey> {
    let raw = Zeroizing::new(
        HEXLOWER_PERMISSIVE
            .decode(hex.expose_secret().trim().as_bytes())
            .context("masterkey is not valid hex")?,
    );
    Masterkey::from_raw(&raw).context("masterkey must be 64 bytes (128 hex characters)")
}

fn build_cryptor(config: &CvaultConfig, masterkey: Option<&SecretString>) -> Result<Cryptor> {
    let hex = masterkey.context(
        "masterkey not set\n\
         Pass --masterkey or set CVAULT_MASTERKEY (see `cvault masterkey generate`).",
    )?;
    let masterkey = parse_masterkey(hex)?;
    Ok(Cryptor::new(Arc::new(masterkey), &config.vault))
}

fn directory(cryptor: &Cryptor, id: Option<&str>) -> DirectoryMetadata {
    let dirs = cryptor.directory_content_cryptor();
    match id {
        Some(id) => dirs.decrypt_directory_metadata(id.as_bytes()),
        None => dirs.root_directory_metadata(),
    }
}

// ── `cvault config show` ──────────────────────────────────────────────────────

fn cmd_config_show(config: &CvaultConfig, config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!("# Configuration from: {}", config_path.display());
    } else {
        println!("# Configuration: defaults (no file at {})", config_path.display());
    }
    println!();
    let rendered = toml::to_string_pretty(config).context("serializing config to TOML")?;
    print!("{rendered}");
    Ok(())
}

// ── `cvault masterkey generate` ───────────────────────────────────────────────

fn cmd_masterkey_generate() -> Result<()> {
    let raw = Masterkey::generate().to_raw();
    let hex = Zeroizing::new(HEXLOWER.encode(&raw));
    println!("{}", hex.as_str());
    Ok(())
}

// ── `cvault dir` ──────────────────────────────────────────────────────────────

fn cmd_dir_new(cryptor: &Cryptor) -> Result<()> {
    let dirs = cryptor.directory_content_cryptor();
    let metadata = dirs.new_directory_metadata();
    let id = String::from_utf8_lossy(metadata.dir_id()).into_owned();
    let path = dirs.dir_path(&metadata)?;

    println!("id:   {id}");
    println!("path: {path}");
    Ok(())
}

fn cmd_dir_path(cryptor: &Cryptor, id: Option<&str>) -> Result<()> {
    let metadata = directory(cryptor, id);
    println!("{}", cryptor.directory_content_cryptor().dir_path(&metadata)?);
    Ok(())
}

// ── `cvault name` ─────────────────────────────────────────────────────────────

fn cmd_name_encrypt(cryptor: &Cryptor, name: &str, dir_id: &str) -> Result<()> {
    let metadata = directory(cryptor, Some(dir_id));
    let encrypted = cryptor.directory_content_cryptor().file_name_encryptor(&metadata)(name)?;
    println!("{encrypted}");
    Ok(())
}

fn cmd_name_decrypt(cryptor: &Cryptor, ciphertext: &str, dir_id: &str) -> Result<()> {
    let metadata = directory(cryptor, Some(dir_id));
    let name = cryptor.directory_content_cryptor().file_name_decryptor(&metadata)(ciphertext)
        .context("decrypting name (wrong masterkey or directory id?)")?;
    println!("{name}");
    Ok(())
}

// ── `cvault ecies` ────────────────────────────────────────────────────────────

fn cmd_ecies_keygen(secret_out: &Path) -> Result<()> {
    let (secret, public) = generate_key_pair();
    let secret_hex = Zeroizing::new(HEXLOWER.encode(&secret.to_bytes()));
    write_secret_file(secret_out, secret_hex.as_bytes())?;

    tracing::info!("wrote secret key to {}", secret_out.display());
    println!("{}", HEXLOWER.encode(&public_key_to_sec1(&public)));
    Ok(())
}

fn cmd_ecies_seal(recipient: &str, input: &Path, output: &Path) -> Result<()> {
    let recipient = HEXLOWER_PERMISSIVE
        .decode(recipient.trim().as_bytes())
        .context("recipient is not valid hex")?;
    let recipient = public_key_from_sec1(&recipient)?;

    let plaintext = Zeroizing::new(
        std::fs::read(input).with_context(|| format!("reading {}", input.display()))?,
    );
    let message = P384Ecies::p384_sha256_aes_gcm().encrypt(&recipient, &plaintext)?;

    let json = serde_json::to_string_pretty(&message_to_file(&message))?;
    std::fs::write(output, json).with_context(|| format!("writing {}", output.display()))?;
    println!("sealed {} bytes -> {}", plaintext.len(), output.display());
    Ok(())
}

fn cmd_ecies_open(secret: &Path, input: &Path, output: &Path) -> Result<()> {
    let secret_hex = Zeroizing::new(
        std::fs::read_to_string(secret).with_context(|| format!("reading {}", secret.display()))?,
    );
    let secret_bytes = Zeroizing::new(
        HEXLOWER_PERMISSIVE
            .decode(secret_hex.trim().as_bytes())
            .context("secret key file is not valid hex")?,
    );
    let secret = secret_key_from_bytes(&secret_bytes)?;

    let json = std::fs::read_to_string(input)
        .with_context(|| format!("reading {}", input.display()))?;
    let file: MessageFile = serde_json::from_str(&json)
        .with_context(|| format!("parsing message: {}", input.display()))?;
    let message = message_from_file(&file)?;

    let plaintext = P384Ecies::p384_sha256_aes_gcm()
        .decrypt(&secret, &message)
        .context("opening message (wrong secret key or tampered message?)")?;
    write_secret_file(output, &plaintext)?;
    println!("opened {} bytes -> {}", plaintext.len(), output.display());
    Ok(())
}

fn message_to_file(message: &EncryptedMessage) -> MessageFile {
    MessageFile {
        ephemeral_public_key: STANDARD.encode(message.ephemeral_public_key_bytes()),
        ciphertext: STANDARD.encode(message.ciphertext()),
    }
}

fn message_from_file(file: &MessageFile) -> Result<EncryptedMessage> {
    let ephemeral = STANDARD
        .decode(&file.ephemeral_public_key)
        .context("ephemeral_public_key is not valid base64")?;
    let ciphertext = STANDARD
        .decode(&file.ciphertext)
        .context("ciphertext is not valid base64")?;
    Ok(EncryptedMessage::from_parts(&ephemeral, ciphertext)?)
}

/// Write `data` readable by the owner only (on Unix).
fn write_secret_file(path: &Path, data: &[u8]) -> Result<()> {
    use std::io::Write;

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options
        .open(path)
        .with_context(|| format!("creating {}", path.display()))?;
    file.write_all(data)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_masterkey() {
        let raw = Masterkey::generate().to_raw();
        let hex = SecretString::from(HEXLOWER.encode(&raw));
        let parsed = parse_masterkey(&hex).unwrap();
        assert_eq!(parsed.to_raw().as_slice(), raw.as_slice());

        let upper = SecretString::from(format!("{}\n", HEXLOWER.encode(&raw).to_uppercase()));
        assert!(parse_masterkey(&upper).is_ok());

        assert!(parse_masterkey(&SecretString::from("abcd".to_string())).is_err());
        assert!(parse_masterkey(&SecretString::from("zz".repeat(64))).is_err());
    }

    #[test]
    fn test_missing_masterkey_is_reported() {
        let err = build_cryptor(&CvaultConfig::default(), None).unwrap_err();
        assert!(err.to_string().contains("masterkey not set"));
    }

    #[test]
    fn test_message_file_roundtrip() {
        let ecies = P384Ecies::p384_sha256_aes_gcm();
        let (secret, public) = generate_key_pair();
        let message = ecies.encrypt(&public, b"vault key").unwrap();

        let json = serde_json::to_string(&message_to_file(&message)).unwrap();
        let file: MessageFile = serde_json::from_str(&json).unwrap();
        let restored = message_from_file(&file).unwrap();

        assert_eq!(restored, message);
        assert_eq!(ecies.decrypt(&secret, &restored).unwrap().as_slice(), b"vault key");
    }

    #[test]
    fn test_seal_open_files() {
        let tmp = tempfile::TempDir::new().unwrap();
        let secret_path = tmp.path().join("device.key");
        let input = tmp.path().join("masterkey.bin");
        let sealed = tmp.path().join("masterkey.json");
        let opened = tmp.path().join("masterkey.out");

        let (secret, public) = generate_key_pair();
        write_secret_file(&secret_path, HEXLOWER.encode(&secret.to_bytes()).as_bytes()).unwrap();
        std::fs::write(&input, b"0123456789abcdef").unwrap();

        let recipient = HEXLOWER.encode(&public_key_to_sec1(&public));
        cmd_ecies_seal(&recipient, &input, &sealed).unwrap();
        cmd_ecies_open(&secret_path, &sealed, &opened).unwrap();

        assert_eq!(std::fs::read(&opened).unwrap(), b"0123456789abcdef");
    }

    #[test]
    fn test_named_directory_vs_root() {
        let cryptor = Cryptor::new(Arc::new(Masterkey::generate()), &Default::default());
        assert!(directory(&cryptor, None).is_root());
        assert_eq!(directory(&cryptor, Some("abc")).dir_id(), b"abc");
    }
}
