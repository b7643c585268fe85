//! Extracts a command spec from captured help text.
//!
//! Nothing is executed; the help page below stands in for the output of
//! `gcloud run services describe --help`.
//!
//! ```bash
//! cargo run -p cmdgen-discovery --example parse_help
//! ```

use cmdgen_core::{ReleaseTrack, RenderOptions, render_command};
use cmdgen_discovery::extractor::spec_from_help;
use cmdgen_discovery::parser::parse_wide_flags;

fn main() {
    let help = "\
NAME
    gcloud run services describe - obtain details about a given service

SYNOPSIS
    gcloud run services describe (SERVICE : --namespace=NAMESPACE)
        [--region=REGION] [GCLOUD_WIDE_FLAG ...]

FLAGS
     --region=REGION
        Region in which the resource can be found.

GCLOUD WIDE FLAGS
    These flags are available to all commands: --account, --configuration,
    --format, --project, --quiet, --verbosity.
";

    let wide_flags = parse_wide_flags(help);
    let extracted = spec_from_help(
        "gcloud",
        "run services describe",
        ReleaseTrack::Ga,
        help,
        &wide_flags,
    );
    let spec = &extracted.spec;

    println!("Path: {} [{}]", spec.path, spec.release);
    println!("Summary: {}", spec.summary);
    println!("Positionals: {}", spec.positionals.join(", "));
    println!("Flags ({}):", spec.flags.len());
    for flag in &spec.flags {
        println!("  {flag}");
    }

    println!();
    println!("{}", render_command("gcloud", spec, &RenderOptions::default()));
}
