use blogbake::{build, config, naming, output};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "blogbake")]
#[command(about = "Turn an XML chapter/page blog into a static HTML site")]
#[command(long_about = "\
Turn an XML chapter/page blog into a static HTML site

The blog is a folder of hand-written XML. index.xml lists the chapters; each
chapter folder holds page1.xml, page2.xml, ... which become page1.html,
page2.html, ... with navigation between them.

Source structure:

  content/
  ├── index.xml            # <blog><chapters> chapter / empty-line / link entries
  ├── index.html           # Home page template (div#content)
  ├── page.html            # Page template (title, p#title, div#content)
  ├── images/              # Searched by file name, any depth
  ├── css/ script/ fonts/  # Static folders, copied with cache-busting names
  └── intro/
      ├── page1.xml        # <page> of <img> and <txt> elements
      └── page2.xml

Run 'blogbake gen-config' to generate a documented blog.toml.")]
#[command(version)]
struct Cli {
    /// Settings file; relative roots inside it are resolved from its folder
    #[arg(long, default_value = "blog.toml", global = true)]
    config: PathBuf,

    /// More log output (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate the site
    Build {
        /// Remove the output folder first
        #[arg(long)]
        clean: bool,
    },
    /// Parse the index and every page without writing anything
    Check,
    /// Rename image files to lowercase
    LowercaseImages,
    /// Print a stock blog.toml with all options documented
    GenConfig,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Build { clean } => {
            let config = config::load_config(&cli.config)?;
            println!(
                "==> Building {} \u{2192} {}",
                config.source_root.display(),
                config.html_root.display()
            );
            let summary = build::build(&config, clean)?;
            output::print_build_output(&summary);
            println!("==> Build complete: {}", config.html_root.display());
        }
        Command::Check => {
            let config = config::load_config(&cli.config)?;
            println!("==> Checking {}", config.source_root.display());
            let chapters = build::check(&config)?;
            output::print_check_output(&chapters);
            println!("==> Content is valid");
        }
        Command::LowercaseImages => {
            let config = config::load_config(&cli.config)?;
            let root = config.images_root();
            let renamed = naming::lowercase_image_names(&root)?;
            output::print_lowercase_output(&renamed, &root);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}
