use clap::{Arg, Command, ValueHint};
use clap_complete::{generate_to, shells::*};
use std::env;
use std::io::Error;

// Mirror of the inspect views from src/transforms.rs
// We need to duplicate this here since build scripts can't access src/ modules
const AVAILABLE_TRANSFORMS: &[&str] = &["treeviz", "json", "html", "types"];

fn main() -> Result<(), Error> {
    let outdir = match env::var_os("OUT_DIR") {
        None => return Ok(()),
        Some(outdir) => outdir,
    };

    let path = || {
        Arg::new("input")
            .help("Input document")
            .required(true)
            .index(1)
            .value_hint(ValueHint::FilePath)
    };

    let mut cmd = Command::new("quire")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A tool for converting, inspecting and scripting quire documents")
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .value_hint(ValueHint::FilePath)
                .global(true),
        )
        .subcommand(
            Command::new("convert")
                .arg(path())
                .arg(Arg::new("from").long("from").value_parser(["json", "html"]))
                .arg(
                    Arg::new("to")
                        .long("to")
                        .required(true)
                        .value_parser(["json", "html", "treeviz"]),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .value_hint(ValueHint::FilePath),
                ),
        )
        .subcommand(
            Command::new("inspect").arg(path()).arg(
                Arg::new("transform")
                    .index(2)
                    .value_parser(clap::builder::PossibleValuesParser::new(
                        AVAILABLE_TRANSFORMS,
                    )),
            ),
        )
        .subcommand(
            Command::new("exec")
                .arg(path())
                .arg(
                    Arg::new("script")
                        .required(true)
                        .index(2)
                        .value_hint(ValueHint::FilePath),
                )
                .arg(Arg::new("from").long("from").value_parser(["json", "html"]))
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .value_hint(ValueHint::FilePath),
                ),
        )
        .subcommand(Command::new("list-types"))
        .subcommand(
            Command::new("render-equation").arg(Arg::new("latex").required(true).index(1)),
        );

    // Generate completions for bash
    generate_to(Bash, &mut cmd, "quire", &outdir)?;

    // Generate completions for zsh
    generate_to(Zsh, &mut cmd, "quire", &outdir)?;

    // Generate completions for fish
    generate_to(Fish, &mut cmd, "quire", &outdir)?;

    println!("cargo:warning=Shell completions generated in {outdir:?}");

    Ok(())
}
