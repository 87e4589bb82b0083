//! Build tasks for the mihrab workspace.
//!
//! ```sh
//! cargo xtask dist-web              # WASM bundle for the browser front-end
//! cargo xtask test-all              # workspace tests, every feature set
//! cargo xtask sync-versions         # copy the workspace version into pkg/package.json
//! cargo xtask publish-crates -n     # crates.io, dry run
//! ```

use anyhow::{Context, Result, bail};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Publish order; each crate depends only on the ones before it.
const PUBLISH_ORDER: &[(&str, &str)] = &[
    ("mihrab-types", "crates/mihrab-types"),
    ("mihrab-calendar", "crates/mihrab-calendar"),
    ("mihrab-qibla", "crates/mihrab-qibla"),
    ("mihrab-schedule", "crates/mihrab-schedule"),
    ("mihrab-network", "crates/mihrab-network"),
    ("mihrab-core", "crates/mihrab_core"),
    ("mihrab", "crates/mihrab"),
];

fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let dry_run = args.iter().any(|a| a == "--dry-run" || a == "-n");

    match args.first().map(String::as_str) {
        Some("dist-web") => dist_web(),
        Some("test-all") => test_all(),
        Some("sync-versions") => sync_versions(),
        Some("publish-crates") => publish_crates(dry_run),
        Some("-h" | "--help" | "help") | None => {
            print_usage();
            Ok(())
        }
        Some(cmd) => {
            print_usage();
            bail!("unknown command: {cmd}")
        }
    }
}

fn print_usage() {
    println!(
        r#"
mihrab xtask

USAGE:
    cargo xtask <COMMAND> [--dry-run|-n]

COMMANDS:
    dist-web        Build bindings/mihrab_wasm with wasm-pack into dist/web/
    test-all        cargo test for the workspace, then the facade without default features
    sync-versions   Write the workspace version into pkg/package.json
    publish-crates  Publish every crate in dependency order
"#
    );
}

fn project_root() -> Result<PathBuf> {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .map(Path::to_path_buf)
        .context("xtask has no parent directory")
}

fn run(dir: &Path, cmd: &str, args: &[&str]) -> Result<()> {
    println!("  -> [{}] {} {}", dir.display(), cmd, args.join(" "));
    let status = Command::new(cmd)
        .args(args)
        .current_dir(dir)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .with_context(|| format!("failed to start {cmd}"))?;
    if !status.success() {
        bail!("{cmd} {} exited with {:?}", args.join(" "), status.code());
    }
    Ok(())
}

fn command_exists(cmd: &str) -> bool {
    let probe = if cfg!(windows) { "where" } else { "which" };
    Command::new(probe)
        .arg(cmd)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

fn workspace_version(root: &Path) -> Result<String> {
    let manifest = fs::read_to_string(root.join("Cargo.toml"))?;
    manifest
        .lines()
        .skip_while(|l| l.trim() != "[workspace.package]")
        .find(|l| l.trim_start().starts_with("version"))
        .and_then(|l| l.split('"').nth(1))
        .map(str::to_string)
        .context("no version under [workspace.package]")
}

fn dist_web() -> Result<()> {
    let root = project_root()?;
    let out_dir = root.join("dist").join("web");

    if !command_exists("wasm-pack") {
        println!("  wasm-pack not found, installing");
        run(&root, "cargo", &["install", "wasm-pack"])?;
    }

    run(
        &root.join("bindings").join("mihrab_wasm"),
        "wasm-pack",
        &["build", "--target", "web", "--out-dir", &out_dir.to_string_lossy(), "--out-name", "mihrab"],
    )?;
    println!("WASM bundle written to {}", out_dir.display());
    Ok(())
}

fn test_all() -> Result<()> {
    let root = project_root()?;
    run(&root, "cargo", &["test", "--workspace", "--all-features"])?;
    run(&root, "cargo", &["test", "-p", "mihrab", "--no-default-features"])?;
    run(&root, "cargo", &["test", "-p", "mihrab-wasm"])
}

fn sync_versions() -> Result<()> {
    let root = project_root()?;
    let version = workspace_version(&root)?;
    let package = root.join("pkg").join("package.json");
    if !package.exists() {
        println!("  {} missing, run dist-web first", package.display());
        return Ok(());
    }

    let updated: Vec<String> = fs::read_to_string(&package)?
        .lines()
        .map(|line| {
            if line.trim_start().starts_with("\"version\"") {
                format!("  \"version\": \"{version}\",")
            } else {
                line.to_string()
            }
        })
        .collect();
    fs::write(&package, updated.join("\n"))?;
    println!("pkg/package.json -> {version}");
    Ok(())
}

fn publish_crates(dry_run: bool) -> Result<()> {
    let root = project_root()?;
    for (name, dir) in PUBLISH_ORDER {
        let mut args = vec!["publish"];
        if dry_run {
            args.push("--dry-run");
        }
        let output = Command::new("cargo")
            .args(&args)
            .current_dir(root.join(dir))
            .output()
            .with_context(|| format!("cargo publish for {name}"))?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if output.status.success() {
            println!("  {name} published");
        } else if stderr.contains("already exists") {
            println!("  {name} already published, skipping");
        } else {
            eprintln!("{stderr}");
            bail!("failed to publish {name}");
        }
    }
    Ok(())
}
