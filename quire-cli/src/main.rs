// Command-line interface for quire
//
// This binary converts, inspects and edits quire documents. The document work is done by
// the quire-doc library; this is the shell around it: argument parsing, configuration,
// files and exit codes.
//
// Usage:
//  quire <input> --to <format> [--from <format>] [--output <file>]  - Convert between formats (default)
//  quire convert <input> --to <format> [--from <format>] [--output <file>]  - Same as above (explicit)
//  quire inspect <input> [<view>]                   - Render the tree (defaults to "treeviz")
//  quire exec <input> <script.json> [--output <file>] - Replay a command script, output JSON
//  quire list-types                                 - List node types, extensions and formats
//  quire render-equation <latex>                    - Print the markup rendering of an equation
//
// The source format is detected from the file extension unless --from is given.
//
// Extra Parameters:
//
// Format-specific parameters can be passed using --extra-<parameter-name> <value>.
// The CLI layer strips the "extra-" prefix; configuration keys it knows are applied to the
// loaded configuration, everything else goes to the format or view.
// Example:
//  quire doc.json --to html --extra-standalone false
//  quire inspect doc.json --extra-show-keys

use quire_cli::{script, transforms};

use clap::{Arg, ArgAction, Command, ValueHint};
use quire_config::{Loader, QuireConfig, LOCAL_CONFIG_FILE};
use quire_doc::nodes::equation::display_latex;
use quire_doc::{Editor, EditorOptions, FormatRegistry, NodeType, NodeTypeRegistry};
use std::collections::HashMap;
use std::fs;

const SUBCOMMANDS: &[&str] = &[
    "convert",
    "inspect",
    "exec",
    "list-types",
    "render-equation",
    "help",
];

/// Parse extra-* arguments from command line args
/// Returns (cleaned_args_without_extras, extra_params_map)
///
/// Supports both:
/// - `--extra-<key> <value>` (explicit value)
/// - `--extra-<key>` (boolean flag, defaults to "true")
fn parse_extra_args(args: &[String]) -> (Vec<String>, HashMap<String, String>) {
    let mut cleaned_args = Vec::new();
    let mut extra_params = HashMap::new();
    let mut i = 0;

    while i < args.len() {
        let arg = &args[i];

        if let Some(key) = arg.strip_prefix("--extra-") {
            let has_value = args.get(i + 1).is_some_and(|next| !next.starts_with('-'));
            if has_value {
                extra_params.insert(key.to_string(), args[i + 1].clone());
                i += 2;
            } else {
                extra_params.insert(key.to_string(), "true".to_string());
                i += 1;
            }
            continue;
        }

        cleaned_args.push(arg.clone());
        i += 1;
    }

    (cleaned_args, extra_params)
}

fn input_arg(help: &'static str) -> Arg {
    Arg::new("input")
        .help(help)
        .required(true)
        .index(1)
        .value_hint(ValueHint::FilePath)
}

fn from_arg() -> Arg {
    Arg::new("from")
        .long("from")
        .help("Source format (auto-detected from file extension if not specified)")
        .value_parser(["json", "html"])
        .value_hint(ValueHint::Other)
}

fn output_arg() -> Arg {
    Arg::new("output")
        .long("output")
        .short('o')
        .help("Output file path (defaults to stdout)")
        .value_hint(ValueHint::FilePath)
}

fn build_cli() -> Command {
    Command::new("quire")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A tool for converting, inspecting and scripting quire documents")
        .long_about(
            "quire works with structured rich documents stored as interchange JSON or HTML.\n\n\
            Commands:\n  \
            - convert:         Transform between formats (json, html, treeviz)\n  \
            - inspect:         View the node tree\n  \
            - exec:            Apply a JSON command script to a document\n  \
            - list-types:      Show registered node types and extensions\n  \
            - render-equation: Render LaTeX the way equation nodes display it\n\n\
            Extra Parameters:\n  \
            Use --extra-<name> [value] to pass format-specific options.\n  \
            Boolean flags can omit the value (defaults to 'true').\n\n\
            Examples:\n  \
            quire doc.json --to html -o doc.html       # Standalone HTML page\n  \
            quire page.html --to json                  # Import HTML as interchange JSON\n  \
            quire inspect doc.json                     # Tree visualization\n  \
            quire exec doc.json edits.json -o out.json # Replay commands",
        )
        .arg_required_else_help(true)
        .subcommand_required(false)
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .help("Path to a quire.toml configuration file")
                .value_hint(ValueHint::FilePath)
                .global(true),
        )
        .subcommand(
            Command::new("convert")
                .about("Convert between document formats (default command)")
                .long_about(
                    "Convert documents between different formats.\n\n\
                    Supported formats:\n  \
                    - json:    Interchange JSON (.json), lossless\n  \
                    - html:    HTML5 (.html), standalone page by default\n  \
                    - treeviz: Tree visualization (output only)\n\n\
                    HTML options (config [convert.html] or --extra-*):\n  \
                    standalone, title, css\n\n\
                    Examples:\n  \
                    quire convert doc.json --to html                       # Page to stdout\n  \
                    quire convert doc.json --to html --extra-standalone false  # Fragment only\n  \
                    quire doc.html --to json -o doc.json                   # 'convert' is optional",
                )
                .arg(input_arg("Input file path"))
                .arg(from_arg())
                .arg(
                    Arg::new("to")
                        .long("to")
                        .help("Target format (required)")
                        .required(true)
                        .value_parser(["json", "html", "treeviz"])
                        .value_hint(ValueHint::Other),
                )
                .arg(output_arg()),
        )
        .subcommand(
            Command::new("inspect")
                .about("Inspect the node tree of a document")
                .long_about(
                    "View the structure of a document.\n\n\
                    Views:\n  \
                    - treeviz: Tree visualization (default)\n  \
                    - json:    Interchange record\n  \
                    - html:    Markup fragment without page wrapper\n  \
                    - types:   Node count per type\n\n\
                    Extra Parameters:\n  \
                    --extra-show-keys     Append arena keys to treeviz lines",
                )
                .arg(input_arg("Path to the document"))
                .arg(from_arg())
                .arg(
                    Arg::new("transform")
                        .help("View to render. Defaults to 'treeviz'")
                        .required(false)
                        .value_parser(clap::builder::PossibleValuesParser::new(
                            transforms::AVAILABLE_TRANSFORMS,
                        ))
                        .index(2)
                        .value_hint(ValueHint::Other),
                ),
        )
        .subcommand(
            Command::new("exec")
                .about("Replay a JSON command script against a document")
                .long_about(
                    "Open the input document, dispatch every command of the script in order\n\
                    and write the resulting interchange JSON.\n\n\
                    The script is a JSON array such as:\n  \
                    [{\"type\": \"INSERT_PAGE_BREAK_COMMAND\"},\n   \
                    {\"type\": \"INSERT_LAYOUT_COMMAND\", \"payload\": {\"columns\": 3}}]\n\n\
                    Commands nobody handles are reported and skipped; a failing command\n\
                    aborts with exit code 1.",
                )
                .arg(input_arg("Input document"))
                .arg(
                    Arg::new("script")
                        .help("Command script (JSON array)")
                        .required(true)
                        .index(2)
                        .value_hint(ValueHint::FilePath),
                )
                .arg(from_arg())
                .arg(output_arg()),
        )
        .subcommand(Command::new("list-types").about("List node types, extensions and formats"))
        .subcommand(
            Command::new("render-equation")
                .about("Render a LaTeX equation to markup")
                .arg(
                    Arg::new("latex")
                        .help("Equation source")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("source")
                        .long("source")
                        .help("Print the escaped source next to the rendering")
                        .action(ArgAction::SetTrue),
                ),
        )
}

fn main() {
    // Try to parse args. If no subcommand is provided, inject "convert"
    let args: Vec<String> = std::env::args().collect();

    let (cleaned_args, mut extra_params) = parse_extra_args(&args);

    let cli = build_cli();
    let matches = match cli.clone().try_get_matches_from(&cleaned_args) {
        Ok(m) => m,
        Err(e) => {
            if cleaned_args.len() > 1
                && !cleaned_args[1].starts_with('-')
                && !SUBCOMMANDS.contains(&cleaned_args[1].as_str())
            {
                let mut new_args = vec![cleaned_args[0].clone(), "convert".to_string()];
                new_args.extend_from_slice(&cleaned_args[1..]);

                match cli.try_get_matches_from(&new_args) {
                    Ok(m) => m,
                    Err(e2) => e2.exit(),
                }
            } else {
                e.exit();
            }
        }
    };

    let mut config = load_cli_config(matches.get_one::<String>("config").map(|s| s.as_str()));
    apply_config_overrides(&mut config, &mut extra_params);
    init_logging(&config);

    match matches.subcommand() {
        Some(("convert", sub_matches)) => {
            let input = sub_matches
                .get_one::<String>("input")
                .expect("input is required");
            let from = resolve_from(input, sub_matches.get_one::<String>("from"));
            let to = sub_matches.get_one::<String>("to").expect("to is required");
            let output = sub_matches.get_one::<String>("output").map(|s| s.as_str());
            handle_convert_command(input, &from, to, output, &extra_params, &config);
        }
        Some(("inspect", sub_matches)) => {
            let input = sub_matches
                .get_one::<String>("input")
                .expect("input is required");
            let from = resolve_from(input, sub_matches.get_one::<String>("from"));
            let transform = sub_matches
                .get_one::<String>("transform")
                .map(|s| s.as_str())
                .unwrap_or("treeviz");
            handle_inspect_command(input, &from, transform, &extra_params);
        }
        Some(("exec", sub_matches)) => {
            let input = sub_matches
                .get_one::<String>("input")
                .expect("input is required");
            let script_path = sub_matches
                .get_one::<String>("script")
                .expect("script is required");
            let from = resolve_from(input, sub_matches.get_one::<String>("from"));
            let output = sub_matches.get_one::<String>("output").map(|s| s.as_str());
            handle_exec_command(input, &from, script_path, output, &config);
        }
        Some(("list-types", _)) => {
            handle_list_types_command(&config);
        }
        Some(("render-equation", sub_matches)) => {
            let latex = sub_matches
                .get_one::<String>("latex")
                .expect("latex is required");
            handle_render_equation_command(latex, sub_matches.get_flag("source"));
        }
        _ => {
            eprintln!("Unknown subcommand. Use --help for usage information.");
            std::process::exit(1);
        }
    }
}

/// Explicit --from, or the format registered for the input's extension.
fn resolve_from(input: &str, from_arg: Option<&String>) -> String {
    if let Some(from) = from_arg {
        return from.to_string();
    }
    match FormatRegistry::default().detect_format_from_filename(input) {
        Some(detected) => detected,
        None => {
            eprintln!("Error: Could not detect format from filename '{input}'");
            eprintln!("Please specify --from explicitly");
            std::process::exit(1);
        }
    }
}

fn read_input(path: &str) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading file '{path}': {e}");
        std::process::exit(1);
    })
}

fn write_output(output: Option<&str>, text: &str) {
    match output {
        Some(path) => fs::write(path, text).unwrap_or_else(|e| {
            eprintln!("Error writing file '{path}': {e}");
            std::process::exit(1);
        }),
        None => print!("{text}"),
    }
}

/// Handle the convert command
fn handle_convert_command(
    input: &str,
    from: &str,
    to: &str,
    output: Option<&str>,
    extra_params: &HashMap<String, String>,
    config: &QuireConfig,
) {
    let formats = FormatRegistry::default();
    let nodes = NodeTypeRegistry::with_defaults();

    if let Err(e) = formats.get(from) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    let source = read_input(input);
    let tree = formats.parse(&source, from, &nodes).unwrap_or_else(|e| {
        eprintln!("Parse error: {e}");
        std::process::exit(1);
    });

    let mut format_options = HashMap::new();
    if to == "html" {
        format_options = html_params_from_config(config);
    }
    for (key, value) in extra_params {
        format_options.insert(key.clone(), value.clone());
    }

    let result = formats
        .serialize_with_options(&tree, to, &nodes, &format_options)
        .unwrap_or_else(|e| {
            eprintln!("Serialization error: {e}");
            std::process::exit(1);
        });
    write_output(output, &result);
}

/// Handle the inspect command
fn handle_inspect_command(
    input: &str,
    from: &str,
    transform: &str,
    extra_params: &HashMap<String, String>,
) {
    let nodes = NodeTypeRegistry::with_defaults();
    let source = read_input(input);
    let tree = FormatRegistry::default()
        .parse(&source, from, &nodes)
        .unwrap_or_else(|e| {
            eprintln!("Parse error: {e}");
            std::process::exit(1);
        });

    let output =
        transforms::execute_transform(&tree, &nodes, transform, extra_params).unwrap_or_else(|e| {
            eprintln!("Execution error: {e}");
            std::process::exit(1);
        });

    print!("{output}");
}

/// Handle the exec command
fn handle_exec_command(
    input: &str,
    from: &str,
    script_path: &str,
    output: Option<&str>,
    config: &QuireConfig,
) {
    let source = read_input(input);
    let options = EditorOptions::from(&config.editor);
    let mut editor = script::open_editor(&source, from, options).unwrap_or_else(|e| {
        eprintln!("{e}");
        std::process::exit(1);
    });

    let commands = script::parse_script(&read_input(script_path)).unwrap_or_else(|e| {
        eprintln!("{e}");
        std::process::exit(1);
    });

    let report = script::run_script(&mut editor, &commands).unwrap_or_else(|e| {
        eprintln!("{e}");
        std::process::exit(1);
    });
    for (index, kind) in &report.declined {
        eprintln!("Command {index} ({kind}) was not handled");
    }

    let mut json = editor.to_json().unwrap_or_else(|e| {
        eprintln!("Serialization error: {e}");
        std::process::exit(1);
    });
    json.push('\n');
    write_output(output, &json);
}

/// Handle the list-types command
fn handle_list_types_command(config: &QuireConfig) {
    let editor = Editor::with_options(EditorOptions::from(&config.editor));
    let nodes = editor.registry();

    println!("Node types:\n");
    for tag in nodes.list_types() {
        let Ok(node_type) = nodes.get(&tag) else {
            continue;
        };
        let markup = node_type.markup_tags().join(", ");
        println!("  {tag:<24}{:<12}{markup}", format!("{:?}", node_type.class()));
    }

    println!("\nExtensions:");
    for name in editor.extension_names() {
        println!("  {name}");
    }

    println!("\nConversion formats:");
    for format_name in FormatRegistry::default().list_formats() {
        println!("  {format_name}");
    }
}

/// Handle the render-equation command
fn handle_render_equation_command(latex: &str, show_source: bool) {
    if show_source {
        println!("{latex}");
    }
    println!("{}", display_latex(latex));
}

fn load_cli_config(explicit_path: Option<&str>) -> QuireConfig {
    let loader = Loader::new().with_optional_file(LOCAL_CONFIG_FILE);
    let loader = if let Some(path) = explicit_path {
        loader.with_file(path)
    } else {
        loader
    };

    loader.build().unwrap_or_else(|err| {
        eprintln!("Failed to load configuration: {err}");
        std::process::exit(1);
    })
}

/// Log level comes from configuration unless RUST_LOG is set.
fn init_logging(config: &QuireConfig) {
    let env = env_logger::Env::default().default_filter_or(config.logging.level.as_str());
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .try_init();
}

fn apply_config_overrides(config: &mut QuireConfig, extra_params: &mut HashMap<String, String>) {
    if let Some(raw) = extra_params.remove("standalone") {
        config.convert.html.standalone = parse_bool_arg("standalone", &raw);
    }
    if let Some(title) = extra_params.remove("title") {
        config.convert.html.title = title;
    }
    if let Some(css) = take_override(extra_params, &["css", "custom-css"]) {
        config.convert.html.custom_css = Some(css);
    }

    if let Some(raw) = take_override(extra_params, &["max-list-indent-depth", "max-indent"]) {
        config.editor.max_list_indent_depth = parse_usize_arg("max-list-indent-depth", &raw);
    }
    if let Some(raw) = take_override(extra_params, &["default-layout-columns", "columns"]) {
        config.editor.default_layout_columns = parse_usize_arg("default-layout-columns", &raw);
    }
    if let Some(raw) = extra_params.remove("lock-aspect-ratio") {
        config.editor.lock_aspect_ratio = parse_bool_arg("lock-aspect-ratio", &raw);
    }

    if let Some(level) = extra_params.remove("log-level") {
        config.logging.level = level;
    }
}

fn html_params_from_config(config: &QuireConfig) -> HashMap<String, String> {
    let html = &config.convert.html;
    let mut params = HashMap::new();
    params.insert("standalone".to_string(), html.standalone.to_string());
    params.insert("title".to_string(), html.title.clone());
    if let Some(css) = &html.custom_css {
        params.insert("css".to_string(), css.clone());
    }
    params
}

fn take_override(map: &mut HashMap<String, String>, keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Some(value) = map.remove(*key) {
            return Some(value);
        }
    }
    None
}

fn parse_bool_arg(flag: &str, raw: &str) -> bool {
    match raw.to_lowercase().as_str() {
        "true" | "1" | "yes" | "y" => true,
        "false" | "0" | "no" | "n" => false,
        other => {
            eprintln!("Invalid boolean value '{other}' for --extra-{flag}");
            std::process::exit(1);
        }
    }
}

fn parse_usize_arg(flag: &str, raw: &str) -> usize {
    raw.parse().unwrap_or_else(|_| {
        eprintln!("Invalid number '{raw}' for --extra-{flag}");
        std::process::exit(1);
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_extra_args_empty() {
        let input = args(&["quire", "inspect", "doc.json"]);
        let (cleaned, extra) = parse_extra_args(&input);
        assert_eq!(cleaned, input);
        assert!(extra.is_empty());
    }

    #[test]
    fn test_parse_extra_args_mixed_with_regular_args() {
        let (cleaned, extra) = parse_extra_args(&args(&[
            "quire",
            "convert",
            "doc.json",
            "--to",
            "html",
            "--extra-title",
            "Notes",
            "--from",
            "json",
        ]));
        assert_eq!(
            cleaned,
            args(&["quire", "convert", "doc.json", "--to", "html", "--from", "json"])
        );
        assert_eq!(extra.len(), 1);
        assert_eq!(extra.get("title"), Some(&"Notes".to_string()));
    }

    #[test]
    fn test_parse_extra_args_boolean_flag_at_end() {
        let (cleaned, extra) =
            parse_extra_args(&args(&["quire", "inspect", "doc.json", "--extra-show-keys"]));
        assert_eq!(cleaned, args(&["quire", "inspect", "doc.json"]));
        assert_eq!(extra.get("show-keys"), Some(&"true".to_string()));
    }

    #[test]
    fn apply_config_overrides_updates_known_flags() {
        let mut config = load_cli_config(None);
        let mut extras = HashMap::new();
        extras.insert("standalone".to_string(), "no".to_string());
        extras.insert("max-indent".to_string(), "3".to_string());
        extras.insert("columns".to_string(), "4".to_string());
        extras.insert("show-keys".to_string(), "true".to_string());

        apply_config_overrides(&mut config, &mut extras);

        assert!(!config.convert.html.standalone);
        assert_eq!(config.editor.max_list_indent_depth, 3);
        assert_eq!(config.editor.default_layout_columns, 4);
        assert_eq!(extras.len(), 1);
        assert!(extras.contains_key("show-keys"));
    }

    #[test]
    fn html_params_follow_config() {
        let mut config = load_cli_config(None);
        config.convert.html.custom_css = Some("p { color: red }".to_string());
        let params = html_params_from_config(&config);
        assert_eq!(params.get("standalone"), Some(&"true".to_string()));
        assert_eq!(params.get("title"), Some(&"Quire Document".to_string()));
        assert_eq!(params.get("css"), Some(&"p { color: red }".to_string()));
    }

    #[test]
    fn cli_definition_is_consistent() {
        build_cli().debug_assert();
    }
}
