//! Megamacros CLI
//!
//! Usage:
//!   megamacros [OPTIONS] [FILE]
//!
//! Options:
//!   -c, --config <FILE>  Render configuration (TOML format)
//!   --no-autoescape      Emit `{{ }}` output without HTML escaping
//!   -s, --syntax         Show tag reference
//!   -e, --examples       Show annotated examples
//!   -h, --help           Print help

use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use megamacros::{render_with_config, RenderConfig};

#[derive(Parser)]
#[command(name = "megamacros")]
#[command(about = "Render templates with reusable components and slots")]
struct Cli {
    /// Input file (reads from stdin if not provided)
    input: Option<PathBuf>,

    /// Render configuration: autoescape flag and global variables (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Disable HTML escaping of variable output
    #[arg(long)]
    no_autoescape: bool,

    /// Show tag reference
    #[arg(short, long)]
    syntax: bool,

    /// Show annotated examples
    #[arg(short, long)]
    examples: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    // Handle documentation flags first
    if cli.syntax {
        println!("{}", SYNTAX);
        return;
    }

    if cli.examples {
        println!("{}", EXAMPLES);
        return;
    }

    // If no input file and stdin is a terminal (interactive), show intro help
    if cli.input.is_none() && io::stdin().is_terminal() {
        println!("{}", INTRO);
        return;
    }

    // Load configuration
    let mut config = match &cli.config {
        Some(path) => match RenderConfig::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => RenderConfig::default(),
    };
    if cli.no_autoescape {
        config = config.with_autoescape(false);
    }

    // Read input
    let (source, filename) = match &cli.input {
        Some(path) => match fs::read_to_string(path) {
            Ok(content) => (content, path.display().to_string()),
            Err(e) => {
                eprintln!("Error reading file '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => {
            let mut buffer = String::new();
            match io::stdin().read_to_string(&mut buffer) {
                Ok(_) => (buffer, "<stdin>".to_string()),
                Err(e) => {
                    eprintln!("Error reading from stdin: {}", e);
                    std::process::exit(1);
                }
            }
        }
    };

    match render_with_config(&source, &config) {
        Ok(output) => {
            print!("{}", output);
        }
        Err(e) => {
            eprint!("{}", e.format(&source, &filename));
            std::process::exit(1);
        }
    }
}

const INTRO: &str = r#"Megamacros - reusable components and slots for templates

USAGE:
    megamacros [OPTIONS] [FILE]
    echo '<template>' | megamacros

OPTIONS:
    -c, --config       Render configuration (TOML file)
    --no-autoescape    Do not HTML-escape {{ }} output
    -s, --syntax       Show tag reference
    -e, --examples     Show annotated examples
    -h, --help         Print help

QUICK START:
    echo "{% definecomponent hi %}Hi {{ content }}{% enddefinecomponent %}{% usecomponent hi %}there{% endusecomponent %}" | megamacros

Set RUST_LOG=megamacros=debug to trace component registration."#;

const SYNTAX: &str = r#"TAG REFERENCE

COMPONENTS
    {% definecomponent NAME [key=expr ...] %} body {% enddefinecomponent %}
        Register NAME when the tag renders. Defaults are evaluated right away.
        A later definition with the same name replaces the earlier one.

    {% usecomponent NAME [key=expr ...] %} inner {% endusecomponent %}
        Render NAME with the given parameters overriding its defaults.
        NAME must already be defined at this point in the render.

    {% defineslot NAME %} default {% enddefineslot %}
        Insertion point inside a definition body.

    {% fillslot NAME %} content {% endfillslot %}
        Replace slot NAME; must sit directly inside usecomponent.
        Fill content sees the variables of the calling template.

    Inside a component without slots:
        content       rendered inner content of the use block
        extraparams   (key, value) pairs for parameters without a default
        extraattrs    the same pairs, keys as attributes: data_Role -> data-role

HOST TAGS
    {{ expr }}                           output, HTML-escaped unless safe
    {% if [not] expr %} {% else %} {% endif %}
    {% for x in expr %} {% endfor %}     also: for key, value in pairs
    {% generate_id 'prefix' [as name] %} prefix-1, prefix-2, ...
    {# comment #}

EXPRESSIONS
    'text' "text" 42 1.5 True False None
    name.key.0                           missing names render as nothing
    expr|filter[:arg]                    safe escape upper lower length default"#;

const EXAMPLES: &str = r#"ANNOTATED EXAMPLES

1. Component with a slot

    {% definecomponent button flat=False %}
    <button class="btn{% if flat %} btn-flat{% endif %}">
      {% defineslot label %}Click me!{% enddefineslot %}
    </button>
    {% enddefinecomponent %}

    {% usecomponent button flat=True %}{% endusecomponent %}
        -> <button class="btn btn-flat">Click me!</button>

    {% usecomponent button %}{% fillslot label %}Save{% endfillslot %}{% endusecomponent %}
        -> <button class="btn">Save</button>

2. Component without slots, forwarding extra attributes

    {% definecomponent field %}
    <input{% for name, value in extraattrs %} {{ name }}="{{ value }}"{% endfor %}>{{ content }}
    {% enddefinecomponent %}

    {% usecomponent field data_Role='search' %}!{% endusecomponent %}
        -> <input data-role="search">!

3. Unique ids for label/input pairs

    {% generate_id 'email' as id %}<label for="{{ id }}">Email</label><input id="{{ id }}">
        -> <label for="email-1">Email</label><input id="email-1">"#;
