//! Key generation command.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use powchain_core::{Keypair, Signer};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct KeygenArgs {
    /// Directory to write the key files to
    #[arg(short, long, default_value = "./keys")]
    out: PathBuf,

    /// Base name for the key files
    #[arg(short, long)]
    name: String,

    /// Overwrite existing key files
    #[arg(long)]
    force: bool,
}

pub fn run(args: KeygenArgs) -> Result<()> {
    let keypair = Keypair::generate();
    let (private_path, public_path) = write_keypair(&args.out, &args.name, &keypair, args.force)?;

    println!("{}  Generated keypair '{}'", "✓".green().bold(), args.name);
    println!(
        "    Private key: {}",
        private_path.display().to_string().bright_black()
    );
    println!(
        "    Public key:  {}",
        public_path.display().to_string().bright_yellow()
    );
    Ok(())
}

/// Write `<name>.pem` (PKCS#8) and `<name>.pub.pem` (SPKI) into `dir`.
fn write_keypair(
    dir: &Path,
    name: &str,
    keypair: &Keypair,
    force: bool,
) -> Result<(PathBuf, PathBuf)> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create key directory: {}", dir.display()))?;

    let private_path = dir.join(format!("{}.pem", name));
    let public_path = dir.join(format!("{}.pub.pem", name));
    if !force && (private_path.exists() || public_path.exists()) {
        bail!(
            "Key files for '{}' already exist in {} (use --force to overwrite)",
            name,
            dir.display()
        );
    }

    fs::write(&private_path, keypair.to_pkcs8_pem()?)?;
    fs::write(&public_path, keypair.public_key_pem())?;
    Ok((private_path, public_path))
}
