// Copyright 2025 Jayashankar
// SPDX-License-Identifier: Apache-2.0

use clap::Parser;
use localcert::{
    expiry, generate, get_backend, parse_cert_file, plan, signals, BackendKind, Config,
    GenerationPlan, GenerationRequest, Mode, Paths, Result, SystemHost,
};
use std::path::PathBuf;

// ============================================================================
// CLI definitions
// ============================================================================

#[derive(Parser)]
#[command(name = "localcert")]
#[command(about = "Self-signed certificates, CSRs and DH parameters for local services")]
#[command(version)]
#[command(after_help = "\
EXAMPLES:
    localcert --default                      # Host certificate, DH params and combined PEM
    localcert intranet.example.com           # Certificate for a name and its parts
    localcert --wildcard example.com         # example.com and *.example.com
    localcert --csr --out /srv/tls/web web   # Write web.crt, web.key, web.csr to /srv/tls
    localcert --dh-params-only --dh-bits 4096
                                             # New DH params for the existing pair

ENVIRONMENT:
    LOCALCERT_DH_BITS   Default DH parameter size
    LOCALCERT_ROOT      Prefix for every well-known path
    RUST_LOG            Diagnostic log filter")]
struct Cli {
    /// Certificate path; the key and CSR are written next to it
    #[arg(short, long, value_name = "PATH")]
    out: Option<PathBuf>,

    /// Generate the host certificate at the well-known location
    #[arg(long)]
    default: bool,

    /// Validity period, e.g. 10y, 18m, 90d
    #[arg(short, long, value_name = "DURATION")]
    expiry: Option<String>,

    /// DH parameter size: 1024, 2048 or 4096
    #[arg(long, value_name = "BITS")]
    dh_bits: Option<u32>,

    /// Only regenerate DH parameters and the combined PEM
    #[arg(long)]
    dh_params_only: bool,

    /// Also write a certificate signing request
    #[arg(long)]
    csr: bool,

    /// Cover each domain and its subdomains (*.domain)
    #[arg(short, long)]
    wildcard: bool,

    /// OpenSSL request template
    #[arg(short, long, value_name = "PATH")]
    template: Option<PathBuf>,

    /// Include the host's IP addresses and 127.0.0.1
    #[arg(long)]
    ip: bool,

    /// Show detailed output, including the issued certificate
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Overwrite an existing certificate and key
    #[arg(short, long)]
    force: bool,

    /// Crypto backend (default from config: native)
    #[arg(long, value_enum)]
    backend: Option<BackendKind>,

    /// Config file (default: /etc/localcert/localcert.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    /// Names to certify; the first is the common name.
    /// Defaults to the host's FQDN (or its domain with --wildcard)
    #[arg(value_name = "NAME")]
    names: Vec<String>,
}

struct Output {
    quiet: bool,
    verbose: bool,
}

impl Output {
    fn new(quiet: bool, verbose: bool) -> Self {
        Self { quiet, verbose }
    }

    /// Print a standard message (suppressed with --quiet)
    fn print(&self, msg: &str) {
        if !self.quiet {
            println!("{}", msg);
        }
    }

    /// Print a verbose message (only shown with --verbose)
    fn verbose(&self, msg: &str) {
        if self.verbose {
            println!("{}", msg);
        }
    }

    fn warn(&self, msg: &str) {
        eprintln!("Warning: {}", msg);
    }
}

fn init_logging(cli: &Cli) {
    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else if cli.quiet {
        log::LevelFilter::Error
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn main() {
    // Reset SIGPIPE to default behavior (exit) instead of panic
    // This prevents "broken pipe" panics when output is piped to tools like grep/head
    #[cfg(unix)]
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);
    signals::install()?;

    let out = Output::new(cli.quiet, cli.verbose);
    let paths = Paths::new()?;
    let config = match &cli.config {
        Some(path) => Config::load_required(path)?,
        None => Config::load(&paths.config)?,
    };

    let request = GenerationRequest {
        mode: Mode::from_flags(cli.dh_params_only, cli.default, cli.wildcard),
        names: cli.names.clone(),
        include_ip: cli.ip,
        emit_csr: cli.csr,
        force_overwrite: cli.force,
        expiry_days: expiry::resolve(cli.expiry.as_deref().unwrap_or(&config.expiry))?,
        dh_bits: config.effective_dh_bits(cli.dh_bits)?,
        template_path: cli
            .template
            .clone()
            .unwrap_or_else(|| config.template_path(&paths)),
        output_override: cli.out.clone(),
        cert_name: config.cert_name.clone(),
    };

    let plan = plan::resolve(&request, &paths, &SystemHost)?;
    for advisory in &plan.advisories {
        out.warn(advisory);
    }

    let backend = get_backend(cli.backend.unwrap_or(config.backend));
    describe_plan(&out, &plan, backend.name());

    let report = generate(&plan, &paths, backend.as_ref())?;
    for warning in &report.warnings {
        out.warn(warning);
    }

    out.print("Wrote:");
    for path in &report.written {
        out.print(&format!("  {}", path.display()));
    }

    if cli.verbose && plan.issue_cert {
        out.verbose("");
        for line in parse_cert_file(&plan.paths.cert)?.describe() {
            out.verbose(&line);
        }
    }

    Ok(())
}

fn describe_plan(out: &Output, plan: &GenerationPlan, backend: &str) {
    match &plan.san {
        Some(san) => {
            let kind = if plan.mode == Mode::Wildcard {
                "wildcard certificate"
            } else {
                "certificate"
            };
            out.print(&format!(
                "Generating {} for {} (valid {} days)",
                kind, san.common_name, plan.expiry_days
            ));
            let names: Vec<String> = san.sans.iter().map(|s| s.to_string()).collect();
            out.verbose(&format!("  Alt names: {}", names.join(", ")));
        }
        None => out.print(&format!(
            "Generating {}-bit DH parameters for {}",
            plan.dh_bits,
            plan.paths.cert.display()
        )),
    }
    out.verbose(&format!("  Backend:   {}", backend));
    if plan.generate_dh && plan.issue_cert {
        out.verbose(&format!("  DH params: {} bits", plan.dh_bits));
    }
}
