use std::path::{Path, PathBuf};

use anyhow::Context;
use regex_lite::Regex;
use serde::Deserialize;

/// Crates that must stay free of runtime and transport dependencies.
const FORBIDDEN_IN_CORE: &[&str] = &[
    "tokio",
    "tokio-tungstenite",
    "reqwest",
    "futures-util",
    "async-trait",
    "pokerbot-agent",
];

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        Some("arch-check") => arch_check(),
        Some(cmd) => anyhow::bail!("Unknown xtask command: {cmd}"),
        None => anyhow::bail!("Usage: cargo xtask <command>\n\nCommands:\n  arch-check"),
    }
}

#[derive(Debug, Deserialize)]
struct Metadata {
    packages: Vec<Package>,
}

#[derive(Debug, Deserialize)]
struct Package {
    name: String,
    manifest_path: PathBuf,
    dependencies: Vec<Dependency>,
}

#[derive(Debug, Deserialize)]
struct Dependency {
    name: String,
    /// `None` for normal dependencies, `dev` or `build` otherwise.
    kind: Option<String>,
}

impl Package {
    fn normal_dependencies(&self) -> impl Iterator<Item = &str> {
        self.dependencies
            .iter()
            .filter(|d| d.kind.is_none())
            .map(|d| d.name.as_str())
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

    let mut violations = check_manifests(&metadata);
    if let Some(domain) = metadata.packages.iter().find(|p| p.name == "pokerbot-domain") {
        let src = domain
            .manifest_path
            .parent()
            .map(|dir| dir.join("src"))
            .context("domain manifest has no parent directory")?;
        violations.extend(check_sources(&src)?);
    }

    if violations.is_empty() {
        println!("arch-check: ok");
        Ok(())
    } else {
        for violation in &violations {
            eprintln!("arch-check: {violation}");
        }
        anyhow::bail!("{} architecture violation(s)", violations.len())
    }
}

fn check_manifests(metadata: &Metadata) -> Vec<String> {
    let mut violations = Vec::new();

    for package in &metadata.packages {
        match package.name.as_str() {
            "pokerbot-domain" => {
                for dep in package.normal_dependencies() {
                    if dep.starts_with("pokerbot-") || FORBIDDEN_IN_CORE.contains(&dep) {
                        violations.push(format!("pokerbot-domain must not depend on {dep}"));
                    }
                }
            }
            "pokerbot-shared" => {
                for dep in package.normal_dependencies() {
                    let internal_other = dep.starts_with("pokerbot-") && dep != "pokerbot-domain";
                    if internal_other || FORBIDDEN_IN_CORE.contains(&dep) {
                        violations.push(format!("pokerbot-shared must not depend on {dep}"));
                    }
                }
            }
            _ => {}
        }
    }

    violations
}

/// Domain code must not reach for runtime crates even through re-exports.
fn check_sources(src: &Path) -> anyhow::Result<Vec<String>> {
    let pattern = Regex::new(r"\b(tokio|tokio_tungstenite|reqwest|futures_util)::")
        .context("compiling source pattern")?;
    let mut violations = Vec::new();

    let mut pending = vec![src.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in std::fs::read_dir(&dir).with_context(|| format!("reading {}", dir.display()))? {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
            } else if path.extension().is_some_and(|ext| ext == "rs") {
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?;
                for (line_no, line) in text.lines().enumerate() {
                    if let Some(found) = pattern.find(line) {
                        violations.push(format!(
                            "{}:{}: domain code uses {}",
                            path.display(),
                            line_no + 1,
                            found.as_str().trim_end_matches("::")
                        ));
                    }
                }
            }
        }
    }

    Ok(violations)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package(name: &str, deps: &[(&str, Option<&str>)]) -> Package {
        Package {
            name: name.to_string(),
            manifest_path: PathBuf::from(format!("/ws/{name}/Cargo.toml")),
            dependencies: deps
                .iter()
                .map(|(n, kind)| Dependency {
                    name: n.to_string(),
                    kind: kind.map(str::to_string),
                })
                .collect(),
        }
    }

    #[test]
    fn clean_layering_passes() {
        let metadata = Metadata {
            packages: vec![
                package("pokerbot-domain", &[("serde", None), ("serde_json", Some("dev"))]),
                package("pokerbot-shared", &[("pokerbot-domain", None), ("serde", None)]),
                package("pokerbot-agent", &[("tokio", None), ("pokerbot-shared", None)]),
            ],
        };
        assert!(check_manifests(&metadata).is_empty());
    }

    #[test]
    fn runtime_dependency_in_domain_is_reported() {
        let metadata = Metadata {
            packages: vec![package("pokerbot-domain", &[("tokio", None)])],
        };
        assert_eq!(
            check_manifests(&metadata),
            vec!["pokerbot-domain must not depend on tokio".to_string()]
        );
    }

    #[test]
    fn shared_may_only_use_domain_internally() {
        let metadata = Metadata {
            packages: vec![package(
                "pokerbot-shared",
                &[("pokerbot-domain", None), ("pokerbot-agent", None), ("tokio", Some("dev"))],
            )],
        };
        assert_eq!(
            check_manifests(&metadata),
            vec!["pokerbot-shared must not depend on pokerbot-agent".to_string()]
        );
    }
}
