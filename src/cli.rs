//! Minimal CLI: registry → (json | swift)
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use crate::codegen::Codegen;
use crate::lower::{LowerOptions, lower_registry};
use crate::manifest::Manifest;
use crate::registry::Registry;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// resolve an XML API registry and print either the resolved enums as JSON or Swift bindings
#[derive(Parser, Debug)]
#[command(version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// resolve enums and bitmasks (extension cases included) and print them as JSON
    Registry(RegistryOut),
    /// emit Swift bindings
    Swift(SwiftOut),
}

#[derive(Args, Debug, Clone)]
struct RegistrySettings {
    /// path to the registry document (e.g. vk.xml)
    #[arg(long, short)]
    registry: PathBuf,
}

#[derive(clap::Parser, Debug)]
struct RegistryOut {
    #[command(flatten)]
    registry_settings: RegistrySettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct SwiftOut {
    #[command(flatten)]
    registry_settings: RegistrySettings,

    /// Struct/class descriptor manifests. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1..)]
    manifest: Vec<String>,

    /// module(s) imported at the top of the generated file
    #[arg(long = "import", default_value = "CVulkan")]
    imports: Vec<String>,

    /// prefix stripped from C type names
    #[arg(long, default_value = "Vk")]
    c_prefix: String,

    /// output .swift file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl RegistrySettings {
    fn load(&self) -> Result<Registry> {
        Registry::from_path(&self.registry)
            .with_context(|| format!("failed to load registry {}", self.registry.display()))
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Registry(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }

                let registry = target.registry_settings.load()?;
                let json = serde_json::to_string_pretty(&registry)?;
                write_output(target.out.as_deref(), &json)
            }
            Command::Swift(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }

                // 1) registry → enum / option-set descriptors
                let registry = target.registry_settings.load()?;
                let options = LowerOptions { c_prefix: target.c_prefix.clone() };
                let mut bindings = lower_registry(&registry, &options);

                // 2) struct / class descriptors from the importer
                let manifest_paths = resolve_file_path_patterns(&target.manifest)?;
                let manifest = Manifest::load_all(&manifest_paths)?;
                bindings.structs = manifest.structs;
                bindings.classes = manifest.classes;

                // 3) emit
                let mut cg = Codegen::new();
                cg.emit_bindings(&target.imports, &bindings)
                    .context("failed to generate Swift bindings")?;
                let swift_src = cg.into_string();
                info!(
                    enums = bindings.enums.len(),
                    option_sets = bindings.option_sets.len(),
                    structs = bindings.structs.len(),
                    classes = bindings.classes.len(),
                    "generated bindings"
                );
                write_output(target.out.as_deref(), &swift_src)
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn write_output(out: Option<&Path>, contents: &str) -> Result<()> {
    let Some(out) = out else {
        println!("{contents}");
        return Ok(());
    };
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(out, contents).with_context(|| format!("failed to write {}", out.display()))
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'['))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if !has_glob_chars(pattern) {
            out.push(PathBuf::from(pattern));
            continue;
        }

        let mut matched = glob::glob(pattern)
            .with_context(|| format!("invalid glob pattern: {pattern}"))?
            .collect::<Result<Vec<_>, _>>()?;
        if matched.is_empty() {
            // Pattern was explicitly a glob but matched nothing -> surface as an error
            bail!("glob pattern matched no files: {pattern}");
        }
        // glob yields alphabetical order already; keep it stable across platforms
        matched.sort();
        out.extend(matched);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_swift_subcommand_defaults() {
        let cli = CommandLineInterface::try_parse_from([
            "vkswiftgen", "swift", "--registry", "vk.xml", "--manifest", "a.json", "b.json",
        ])
        .unwrap();
        let Command::Swift(target) = cli.cmd else { panic!("expected swift subcommand") };
        assert_eq!(target.registry_settings.registry, PathBuf::from("vk.xml"));
        assert_eq!(target.manifest, ["a.json", "b.json"]);
        assert_eq!(target.imports, ["CVulkan"]);
        assert_eq!(target.c_prefix, "Vk");
        assert!(target.out.is_none());
    }

    #[test]
    fn literal_paths_pass_through_unchecked() {
        let paths = resolve_file_path_patterns(["one.json", "dir/two.json"]).unwrap();
        assert_eq!(paths, [PathBuf::from("one.json"), PathBuf::from("dir/two.json")]);
    }

    #[test]
    fn empty_glob_is_an_error() {
        let err = resolve_file_path_patterns(["/definitely/not/here/*.json"]).unwrap_err();
        assert!(err.to_string().contains("matched no files"));
    }
}
