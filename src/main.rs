use anyhow::Result;
use clap::{crate_version, App, AppSettings, Arg, ArgMatches, SubCommand};
use log::LevelFilter;
use simple_logger::SimpleLogger;
use std::path::{Path, PathBuf};
use wotw_posts::build::{build_posts, render_post};
use wotw_posts::config::Config;

fn project_arg<'a, 'b>() -> Arg<'a, 'b> {
    Arg::with_name("project")
        .short("p")
        .long("project")
        .takes_value(true)
        .value_name("DIR")
        .help("Directory to search upward from for wotw.yaml (default: current directory)")
}

fn load_config(matches: &ArgMatches) -> Result<Config> {
    let project = match matches.value_of("project") {
        Some(dir) => PathBuf::from(dir),
        None => std::env::current_dir()?,
    };
    Config::from_directory(&project)
}

fn build(matches: &ArgMatches) -> Result<()> {
    let mut config = load_config(matches)?;
    if let Some(output) = matches.value_of("output") {
        config.build_directory = PathBuf::from(output);
    }
    if let Some(graphs) = matches.value_of("graphs") {
        config.graph_directory = PathBuf::from(graphs);
    }
    let written = build_posts(&config)?;
    log::info!(
        "compiled {} posts into `{}`",
        written.len(),
        config.build_directory.display()
    );
    Ok(())
}

fn render(matches: &ArgMatches) -> Result<()> {
    let config = load_config(matches)?;
    // `template` is required, so clap guarantees it's present.
    let template = Path::new(matches.value_of("template").unwrap_or_default());
    println!("{}", render_post(&config, template)?);
    Ok(())
}

fn main() {
    let matches = App::new("wotw-posts")
        .version(crate_version!())
        .about("Compiles post templates into Markdown with a generated table of contents")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .global(true)
                .help("Log debug output"),
        )
        .subcommand(
            SubCommand::with_name("build")
                .about("Compiles every post template into the build directory")
                .arg(project_arg())
                .arg(
                    Arg::with_name("output")
                        .short("o")
                        .long("output")
                        .takes_value(true)
                        .value_name("DIR")
                        .help("Overrides the build directory"),
                )
                .arg(
                    Arg::with_name("graphs")
                        .short("g")
                        .long("graphs")
                        .takes_value(true)
                        .value_name("DIR")
                        .help("Overrides the branch graph directory"),
                ),
        )
        .subcommand(
            SubCommand::with_name("render")
                .about("Compiles a single post template and prints it")
                .arg(project_arg())
                .arg(
                    Arg::with_name("template")
                        .required(true)
                        .index(1)
                        .help("The post template to compile"),
                ),
        )
        .get_matches();

    // Global args propagate down to subcommands, not back up.
    let verbose = matches.is_present("verbose")
        || matches
            .subcommand()
            .1
            .map_or(false, |sub| sub.is_present("verbose"));
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    if let Err(e) = SimpleLogger::new().with_level(level).init() {
        eprintln!("failed to initialize logging: {}", e);
    }

    let result = match matches.subcommand() {
        ("build", Some(sub)) => build(sub),
        ("render", Some(sub)) => render(sub),
        _ => unreachable!("clap requires a subcommand"),
    };
    if let Err(e) = result {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}
