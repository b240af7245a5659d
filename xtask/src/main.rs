use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{exit, Command};

use clap::{Parser, Subcommand, ValueEnum};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const LAMBDA_PACKAGE: &str = "coagent_lambda";
const DIST_DIR: &str = "infra/lambda/dist";

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the coagent serverless workspace",
    long_about = "A unified CLI for packaging the deployment hooks and AI proxy\n\
                  Lambda functions and running CI checks."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run CI checks (fmt, clippy, tests)
    Ci {
        /// Job to run
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
    /// Build and package Rust Lambda artifacts for deployment
    ServerlessPackage {
        /// Compilation target triple for Lambda binaries
        #[arg(long, default_value = "x86_64-unknown-linux-gnu", env = "LAMBDA_TARGET")]
        target: String,
        /// Build profile used for binaries
        #[arg(value_enum, long, default_value_t = BuildProfile::Release)]
        profile: BuildProfile,
        /// Package a single function instead of all of them
        #[arg(value_enum, long)]
        function: Option<LambdaFunction>,
    },
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting, clippy, and tests
    Check,
    /// Build and zip every Lambda artifact
    Package,
    /// Run check + package
    All,
}

#[derive(Clone, Copy, ValueEnum)]
enum BuildProfile {
    Debug,
    Release,
}

impl BuildProfile {
    fn dir_name(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
        }
    }

    fn as_cargo_flag(self) -> Option<&'static str> {
        match self {
            Self::Debug => None,
            Self::Release => Some("--release"),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum LambdaFunction {
    PreTrafficHook,
    PostTrafficHook,
    AiProxy,
}

impl LambdaFunction {
    const ALL: [Self; 3] = [Self::PreTrafficHook, Self::PostTrafficHook, Self::AiProxy];

    fn bin_name(self) -> &'static str {
        match self {
            Self::PreTrafficHook => "pre_traffic_hook",
            Self::PostTrafficHook => "post_traffic_hook",
            Self::AiProxy => "ai_proxy",
        }
    }

    fn artifact_name(self) -> &'static str {
        match self {
            Self::PreTrafficHook => "pre-traffic-hook.zip",
            Self::PostTrafficHook => "post-traffic-hook.zip",
            Self::AiProxy => "ai-proxy.zip",
        }
    }
}

// ── helpers ────────────────────────────────────────────────────────

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn run_cargo(args: &[&str]) -> Result<(), String> {
    eprintln!("+ cargo {}", args.join(" "));
    let status = Command::new("cargo")
        .args(args)
        .status()
        .map_err(|error| format!("failed to execute cargo: {error}"))?;
    if status.success() {
        Ok(())
    } else {
        Err(format!("`cargo {}` exited with {status}", args.join(" ")))
    }
}

fn package_serverless_lambdas(
    target: &str,
    profile: BuildProfile,
    functions: &[LambdaFunction],
) -> Result<(), String> {
    if !target.contains("-linux-") {
        return Err(format!(
            "`{target}` is not a Linux target; Lambda `provided.al2023` functions need one"
        ));
    }
    check_target_installed(target)?;

    step("Build serverless lambda binaries");
    let mut cargo_args = vec!["build", "-p", LAMBDA_PACKAGE, "--target", target];
    for function in functions {
        cargo_args.extend(["--bin", function.bin_name()]);
    }
    cargo_args.extend(profile.as_cargo_flag());
    run_cargo(&cargo_args)?;

    step("Package lambda zip artifacts");
    let target_dir = Path::new("target").join(target).join(profile.dir_name());
    let dist_dir = Path::new(DIST_DIR);
    fs::create_dir_all(dist_dir)
        .map_err(|error| format!("failed to create {}: {error}", dist_dir.display()))?;

    for function in functions {
        let zip_path = dist_dir.join(function.artifact_name());
        write_bootstrap_zip(&target_dir.join(function.bin_name()), &zip_path)?;
        eprintln!("- {} -> {}", function.bin_name(), zip_path.display());
    }
    Ok(())
}

/// Skipped with a warning when rustup is unavailable (e.g. a distro toolchain).
fn check_target_installed(target: &str) -> Result<(), String> {
    let output = match Command::new("rustup")
        .args(["target", "list", "--installed"])
        .output()
    {
        Ok(output) if output.status.success() => output,
        _ => {
            eprintln!("warning: could not query rustup; assuming `{target}` is installed");
            return Ok(());
        }
    };

    if String::from_utf8_lossy(&output.stdout)
        .lines()
        .any(|line| line.trim() == target)
    {
        Ok(())
    } else {
        Err(format!("rust target `{target}` is missing; run `rustup target add {target}`"))
    }
}

// The provided.al2023 runtime executes the entry named `bootstrap`.
fn write_bootstrap_zip(binary_path: &Path, zip_path: &Path) -> Result<(), String> {
    let binary = fs::read(binary_path)
        .map_err(|error| format!("failed to read {}: {error}", binary_path.display()))?;
    let file = fs::File::create(zip_path)
        .map_err(|error| format!("failed to create {}: {error}", zip_path.display()))?;

    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o755);
    zip.start_file("bootstrap", options)
        .map_err(|error| format!("failed to start bootstrap entry: {error}"))?;
    zip.write_all(&binary)
        .map_err(|error| format!("failed to write bootstrap entry: {error}"))?;
    zip.finish()
        .map_err(|error| format!("failed to finish {}: {error}", zip_path.display()))?;
    Ok(())
}

// ── CI jobs ────────────────────────────────────────────────────────

fn ci_check() -> Result<(), String> {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"])?;

    step("Clippy");
    run_cargo(&["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"])?;

    for package in ["coagent_core", LAMBDA_PACKAGE] {
        step(&format!("Test {package}"));
        run_cargo(&["test", "-p", package])?;
    }
    Ok(())
}

fn ci_package() -> Result<(), String> {
    package_serverless_lambdas(
        "x86_64-unknown-linux-gnu",
        BuildProfile::Release,
        &LambdaFunction::ALL,
    )
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Ci { job } => match job {
            CiJob::Check => ci_check(),
            CiJob::Package => ci_package(),
            CiJob::All => ci_check().and_then(|()| ci_package()),
        },
        Commands::ServerlessPackage {
            target,
            profile,
            function,
        } => {
            let functions = match function {
                Some(one) => vec![one],
                None => LambdaFunction::ALL.to_vec(),
            };
            package_serverless_lambdas(&target, profile, &functions)
        }
    };

    if let Err(message) = result {
        eprintln!("\nxtask failed: {message}");
        exit(1);
    }
    eprintln!("\nDone.");
}
