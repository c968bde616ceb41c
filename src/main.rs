//! crustify - Spacing detection for C-family source code

#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufReader, Cursor, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use crustify::detect::SpaceOption;
use crustify::lang::LangFlags;
use crustify::process::{analyze, detect_options, dump_tokens, AnalysisOptions};
use crustify::{find_directive, parse_args, CliArgs, Config, Result};
use glob::Pattern;
use log::{debug, error, info, warn, LevelFilter};
use walkdir::WalkDir;

/// Default maximum file size in bytes (100 MB)
/// Files larger than this are skipped to prevent memory exhaustion
const DEFAULT_MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Detected settings per input file
type Report = BTreeMap<String, BTreeMap<&'static str, SpaceOption>>;

fn main() -> Result<()> {
    let args = parse_args();
    init_logger(&args);

    let files = collect_files(&args);
    if files.is_empty() {
        if !args.silent {
            warn!("no source files found to analyze");
        }
        return Ok(());
    }

    let mut report = Report::new();
    let mut dump = Vec::new();
    let mut errors = 0usize;

    for path in &files {
        let result = build_config(&args, path).and_then(|config| {
            process_single_file(path, &config, &args, &mut report, &mut dump)
        });
        if let Err(e) = result {
            errors += 1;
            error!("{}: {e:#}", path.display());
        }
    }

    let output = if args.dump_tokens {
        dump
    } else {
        toml::to_string(&report)?.into_bytes()
    };
    write_output(&args, &output)?;

    if errors > 0 {
        anyhow::bail!("{errors} of {} file(s) failed", files.len());
    }
    if !args.silent {
        info!("analyzed {} file(s)", files.len());
    }
    Ok(())
}

/// Install the logger; `--debug` and `--silent` set the default level, `RUST_LOG` refines it
fn init_logger(args: &CliArgs) {
    let level = if args.debug {
        LevelFilter::Debug
    } else if args.silent {
        LevelFilter::Error
    } else {
        LevelFilter::Warn
    };
    pretty_env_logger::formatted_builder()
        .filter_level(level)
        .parse_env("RUST_LOG")
        .init();
}

/// Build configuration from CLI args and the config files that apply to `path`
fn build_config(args: &CliArgs, path: &Path) -> Result<Config> {
    let mut config = if let Some(config_path) = &args.config {
        debug!("using explicit config file: {}", config_path.display());
        Config::from_toml_file(config_path)
            .with_context(|| format!("reading {}", config_path.display()))?
    } else {
        let discovered = Config::discover_config_files(path);
        for f in &discovered {
            debug!("discovered config file: {}", f.display());
        }
        Config::from_discovered_files(path)
    };

    // CLI arguments override files
    if let Some(lang) = &args.lang {
        config.language = Some(lang.clone());
    }
    if let Some(span) = args.span {
        config.align.braced_init_list_span = span;
    }
    if let Some(thresh) = args.thresh {
        config.align.braced_init_list_thresh = thresh;
    }
    if let Some(tab_size) = args.tab_size {
        config.input_tab_size = tab_size;
    }

    debug!("configuration for {}: {config:?}", path.display());

    if let Some(error) = config.validate() {
        anyhow::bail!("Invalid configuration: {error}");
    }
    Ok(config)
}

/// Collect all files to process, handling directories and recursive flag
fn collect_files(args: &CliArgs) -> Vec<PathBuf> {
    let exclude_patterns: Vec<Pattern> = args
        .exclude
        .iter()
        .filter_map(|p| match Pattern::new(p) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                warn!("ignoring exclude pattern '{p}': {e}");
                None
            }
        })
        .collect();

    let mut files = Vec::new();
    for input in &args.inputs {
        if input.is_file() {
            // explicit files are taken even with an unknown extension
            if !is_excluded(input, &exclude_patterns) {
                files.push(input.clone());
            }
        } else if input.is_dir() {
            let depth = if args.recursive { 256 } else { 1 };
            for entry in WalkDir::new(input)
                .follow_links(true)
                .max_depth(depth)
                .sort_by_file_name()
                .into_iter()
                .filter_map(std::result::Result::ok)
            {
                let path = entry.path();
                if path.is_file()
                    && LangFlags::from_extension(path).is_some()
                    && !is_excluded(path, &exclude_patterns)
                {
                    files.push(path.to_path_buf());
                }
            }
        } else {
            warn!("{}: no such file or directory", input.display());
        }
    }
    files
}

/// Check if a path matches any exclusion pattern
fn is_excluded(path: &Path, patterns: &[Pattern]) -> bool {
    let path_str = path.to_string_lossy();
    patterns.iter().any(|pattern| {
        pattern.matches(&path_str)
            || path
                .file_name()
                .is_some_and(|name| pattern.matches(&name.to_string_lossy()))
            || path.components().any(|component| match component {
                std::path::Component::Normal(c) => pattern.matches(&c.to_string_lossy()),
                _ => false,
            })
    })
}

/// Language for `path`: configured name first, then the extension
fn resolve_lang(config: &Config, path: &Path) -> Option<LangFlags> {
    config.lang().or_else(|| LangFlags::from_extension(path))
}

/// Analyze a single file, adding its settings to `report` or its tokens to `dump`
fn process_single_file(
    path: &Path,
    config: &Config,
    args: &CliArgs,
    report: &mut Report,
    dump: &mut Vec<u8>,
) -> Result<()> {
    let file_size = std::fs::metadata(path)?.len();
    if file_size > DEFAULT_MAX_FILE_SIZE {
        warn!(
            "skipping {} ({} MB exceeds limit of {} MB)",
            path.display(),
            file_size / (1024 * 1024),
            DEFAULT_MAX_FILE_SIZE / (1024 * 1024)
        );
        return Ok(());
    }

    let Some(lang) = resolve_lang(config, path) else {
        warn!("skipping {}: unknown language, use --lang", path.display());
        return Ok(());
    };

    let mut contents = Vec::new();
    File::open(path)?.read_to_end(&mut contents)?;

    let mut settings = config.settings();
    let mut options = AnalysisOptions::from(config);
    if let Some(overrides) = find_directive(&mut BufReader::new(Cursor::new(&contents))) {
        debug!("{}: directive {overrides:?}", path.display());
        overrides.apply(&mut settings, &mut options);
    }

    info!("analyzing {} as {lang}", path.display());
    if args.dump_tokens {
        let list = analyze(&contents, lang, &options);
        writeln!(dump, "# {}", path.display())?;
        dump_tokens(&list, dump)?;
    } else {
        detect_options(&contents, lang, &mut settings, &options);
        report.insert(path.display().to_string(), settings.to_table());
    }
    Ok(())
}

/// Write the final output to `--output` or stdout
fn write_output(args: &CliArgs, output: &[u8]) -> Result<()> {
    if let Some(path) = &args.output {
        std::fs::write(path, output).with_context(|| format!("writing {}", path.display()))?;
    } else if !args.silent {
        let mut stdout = io::stdout().lock();
        stdout.write_all(output)?;
        stdout.flush()?;
    }
    Ok(())
}
