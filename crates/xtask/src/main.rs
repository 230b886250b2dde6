use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

/// Dependencies each workspace crate must not have (normal or build kind).
const FORBIDDEN_DEPS: &[(&str, &[&str])] = &[
    (
        "levelup-domain",
        &[
            "levelup-shared",
            "levelup-engine",
            "levelup-player",
            "axum",
            "reqwest",
            "tokio",
        ],
    ),
    (
        "levelup-shared",
        &["levelup-engine", "levelup-player", "axum", "reqwest", "tokio"],
    ),
    ("levelup-engine", &["levelup-player"]),
    ("levelup-player", &["levelup-engine", "axum"]),
];

/// Only these files may read process environment variables.
const ENV_READERS: &[&str] = &["config.rs", "main.rs"];

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        Some("arch-check") => arch_check(),
        Some(cmd) => anyhow::bail!("Unknown xtask command: {cmd}"),
        None => anyhow::bail!("Usage: cargo xtask <command>\n\nCommands:\n  arch-check"),
    }
}

fn arch_check() -> anyhow::Result<()> {
    let output = std::process::Command::new("cargo")
        .args(["metadata", "--format-version", "1", "--no-deps"])
        .output()
        .context("running cargo metadata")?;

    if !output.status.success() {
        anyhow::bail!("cargo metadata failed")
    }

    let metadata: Metadata =
        serde_json::from_slice(&output.stdout).context("parsing cargo metadata")?;

    let mut violations = dependency_violations(&metadata);

    let crates_dir = PathBuf::from(&metadata.workspace_root).join("crates");
    for file in rust_files(&crates_dir)? {
        let source = std::fs::read_to_string(&file)
            .with_context(|| format!("reading {}", file.display()))?;
        violations.extend(env_violations(&file, &source));
    }

    if violations.is_empty() {
        println!("arch-check: ok");
        return Ok(());
    }

    for violation in &violations {
        eprintln!("arch-check: {violation}");
    }
    anyhow::bail!("{} architecture violation(s)", violations.len())
}

#[derive(Debug, Deserialize)]
struct Metadata {
    packages: Vec<Package>,
    workspace_root: String,
}

#[derive(Debug, Deserialize)]
struct Package {
    name: String,
    dependencies: Vec<Dependency>,
}

#[derive(Debug, Deserialize)]
struct Dependency {
    name: String,
    kind: Option<String>,
}

fn dependency_violations(metadata: &Metadata) -> Vec<String> {
    let rules: BTreeMap<&str, &[&str]> = FORBIDDEN_DEPS.iter().copied().collect();

    let mut violations = Vec::new();
    for package in &metadata.packages {
        let Some(forbidden) = rules.get(package.name.as_str()) else {
            continue;
        };
        for dependency in &package.dependencies {
            // Dev-dependencies only reach test builds.
            if dependency.kind.as_deref() == Some("dev") {
                continue;
            }
            if forbidden.contains(&dependency.name.as_str()) {
                violations.push(format!(
                    "{} must not depend on {}",
                    package.name, dependency.name
                ));
            }
        }
    }
    violations
}

fn env_violations(file: &Path, source: &str) -> Vec<String> {
    let allowed = file
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| ENV_READERS.contains(&name));
    if allowed {
        return Vec::new();
    }

    let Ok(pattern) = regex_lite::Regex::new(r"\benv::var(_os)?\s*\(") else {
        return Vec::new();
    };
    source
        .lines()
        .enumerate()
        .filter(|(_, line)| pattern.is_match(line))
        .map(|(index, _)| {
            format!(
                "{}:{} reads the environment outside configuration",
                file.display(),
                index + 1
            )
        })
        .collect()
}

fn rust_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in std::fs::read_dir(&dir).with_context(|| format!("reading {}", dir.display()))? {
            let path = entry?.path();
            if path.is_dir() {
                if path.file_name().is_some_and(|name| name == "target") {
                    continue;
                }
                pending.push(path);
            } else if path.extension().is_some_and(|ext| ext == "rs") {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}
