//! # CLI Module
//!
//! Command-line interface for the similar image checker.
//!
//! ## Usage
//! ```bash
//! # Compare every image under a directory
//! similar-images compare ~/Photos --model mobilenet.onnx
//!
//! # With a custom threshold
//! similar-images compare ~/Photos --model mobilenet.onnx --threshold 0.9
//!
//! # JSON output
//! similar-images compare ~/Photos --model mobilenet.onnx --output json
//!
//! # Score a single pair
//! similar-images score a.jpg b.jpg --model mobilenet.onnx
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use similar_image_checker::core::checker::SimilarityChecker;
use similar_image_checker::core::comparator::{SimilarityReport, DEFAULT_THRESHOLD};
use similar_image_checker::core::engine::ort::OrtLoader;
use similar_image_checker::error::{Result, SimilarityCheckError};
use similar_image_checker::events::{CompareEvent, Event, EventChannel, ExtractEvent};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::thread;
use walkdir::WalkDir;

/// Similar Image Checker - find visually similar images
#[derive(Parser, Debug)]
#[command(name = "similar-images")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compare a batch of images and report similar pairs and groups
    Compare {
        /// Image files or directories to compare
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Path to the ONNX classification model
        #[arg(short, long)]
        model: PathBuf,

        /// Similarity threshold (inclusive, 0.0-1.0)
        #[arg(short, long, default_value_t = DEFAULT_THRESHOLD, value_parser = parse_threshold)]
        threshold: f64,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,

        /// Include hidden files when expanding directories
        #[arg(long)]
        include_hidden: bool,
    },

    /// Score one pair of images
    Score {
        /// First image
        image_a: PathBuf,

        /// Second image
        image_b: PathBuf,

        /// Path to the ONNX classification model
        #[arg(short, long)]
        model: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
    /// Minimal output (index pairs only)
    Minimal,
}

/// The core accepts any float; range checking is a flag-level concern.
fn parse_threshold(raw: &str) -> std::result::Result<f64, String> {
    let value: f64 = raw.parse().map_err(|_| format!("'{raw}' is not a number"))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("threshold must be between 0.0 and 1.0, got {value}"))
    }
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Compare {
            paths,
            model,
            threshold,
            output,
            include_hidden,
        } => run_compare(paths, model, threshold, output, include_hidden),
        Commands::Score {
            image_a,
            image_b,
            model,
        } => run_score(image_a, image_b, model),
    }
}

fn run_compare(
    paths: Vec<PathBuf>,
    model: PathBuf,
    threshold: f64,
    output: OutputFormat,
    include_hidden: bool,
) -> Result<()> {
    let term = Term::stderr();

    if matches!(output, OutputFormat::Pretty) {
        term.write_line(&format!(
            "{} {}",
            style("Similar Image Checker").bold().cyan(),
            style(format!("v{}", env!("CARGO_PKG_VERSION"))).dim()
        ))
        .ok();
        term.write_line("").ok();
    }

    let files = collect_image_files(&paths, include_hidden);
    let images = read_images(&files)?;

    let mut checker = SimilarityChecker::new(OrtLoader::new(&model));
    checker.load_model()?;

    // Progress bar for pretty output
    let progress = if matches!(output, OutputFormat::Pretty) {
        let pb = ProgressBar::new(images.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("█▓░"),
        );
        Some(pb)
    } else {
        None
    };

    let (sender, receiver) = EventChannel::new();
    let progress_clone = progress.clone();

    // Handle events in a separate thread
    let event_thread = thread::spawn(move || {
        for event in receiver.iter() {
            match event {
                Event::Extract(ExtractEvent::Started { total_images }) => {
                    if let Some(ref pb) = progress_clone {
                        pb.set_length(total_images as u64);
                        pb.set_message("extracting embeddings");
                    }
                }
                Event::Extract(ExtractEvent::Progress(p)) => {
                    if let Some(ref pb) = progress_clone {
                        pb.set_position(p.completed as u64);
                    }
                }
                Event::Compare(CompareEvent::Started { total_comparisons }) => {
                    if let Some(ref pb) = progress_clone {
                        pb.set_length(total_comparisons as u64);
                        pb.set_position(0);
                        pb.set_message("comparing pairs");
                    }
                }
                Event::Compare(CompareEvent::Progress(p)) => {
                    if let Some(ref pb) = progress_clone {
                        pb.set_position(p.comparisons_completed as u64);
                    }
                }
                Event::Compare(CompareEvent::Completed { .. }) => {
                    if let Some(ref pb) = progress_clone {
                        pb.finish_and_clear();
                    }
                }
                _ => {}
            }
        }
    });

    let result = checker.find_similar_images_with_events(&images, threshold, &sender);

    // Drop sender to signal the event thread to finish
    drop(sender);
    event_thread.join().ok();

    let report = result?;

    match output {
        OutputFormat::Pretty => print_pretty_results(&term, &files, &report, threshold),
        OutputFormat::Json => print_json_results(&files, &report, threshold),
        OutputFormat::Minimal => print_minimal_results(&report),
    }

    Ok(())
}

fn run_score(image_a: PathBuf, image_b: PathBuf, model: PathBuf) -> Result<()> {
    let bytes_a = read_image(&image_a)?;
    let bytes_b = read_image(&image_b)?;

    let mut checker = SimilarityChecker::new(OrtLoader::new(&model));
    checker.load_model()?;

    let score = checker.get_similarity(&bytes_a, &bytes_b)?;
    println!("{score:.6}");
    Ok(())
}

/// Expand files and directories into a sorted, deduplicated image list.
///
/// Directories are walked recursively; non-image files are skipped by
/// extension. Sorting keeps batch indices stable across runs.
fn collect_image_files(paths: &[PathBuf], include_hidden: bool) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = Vec::new();
    let mut seen: HashSet<PathBuf> = HashSet::new();

    for path in paths {
        if path.is_dir() {
            for entry in WalkDir::new(path)
                .follow_links(false)
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let candidate = entry.path();
                if candidate.is_file()
                    && is_image_file(candidate, include_hidden)
                    && seen.insert(candidate.to_path_buf())
                {
                    files.push(candidate.to_path_buf());
                }
            }
        } else if seen.insert(path.clone()) {
            // Explicitly named files bypass the extension filter
            files.push(path.clone());
        }
    }

    files.sort();
    files
}

const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "webp", "gif", "bmp", "tiff", "tif",
];

fn is_image_file(path: &Path, include_hidden: bool) -> bool {
    if !include_hidden {
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if name.starts_with('.') {
                return false;
            }
        }
    }

    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn read_images(files: &[PathBuf]) -> Result<Vec<Vec<u8>>> {
    files.iter().map(|path| read_image(path)).collect()
}

fn read_image(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|source| SimilarityCheckError::ReadImage {
        path: path.to_path_buf(),
        source,
    })
}

fn print_pretty_results(
    term: &Term,
    files: &[PathBuf],
    report: &SimilarityReport,
    threshold: f64,
) {
    term.write_line("").ok();
    term.write_line(&format!("{} Comparison Complete", style("✓").green().bold()))
        .ok();
    term.write_line("").ok();

    term.write_line(&format!(
        "  {} images compared at threshold {}",
        style(files.len()).cyan(),
        style(format!("{threshold:.2}")).cyan()
    ))
    .ok();
    term.write_line(&format!(
        "  {} similar pairs found",
        style(report.pairs.len()).cyan()
    ))
    .ok();
    term.write_line(&format!(
        "  {} similarity groups",
        style(report.groups.len()).cyan()
    ))
    .ok();
    term.write_line("").ok();

    if report.groups.is_empty() {
        term.write_line(&format!("  {} No similar images found", style("·").dim()))
            .ok();
        term.write_line("").ok();
        return;
    }

    term.write_line(&format!("{}", style("Similarity Groups:").bold().underlined()))
        .ok();
    term.write_line("").ok();

    for (i, group) in report.groups.iter().enumerate() {
        term.write_line(&format!(
            "  {} ({} images)",
            style(format!("Group {}:", i + 1)).bold(),
            group.members.len()
        ))
        .ok();

        for &index in &group.members {
            let name = files
                .get(index)
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| format!("#{index}"));
            term.write_line(&format!("    {} {}", style("○").dim(), name))
                .ok();
        }
        term.write_line("").ok();
    }

    term.write_line(&format!("{}", style("Similar Pairs:").bold().underlined()))
        .ok();
    term.write_line("").ok();

    for pair in &report.pairs {
        let name = |index: usize| {
            files
                .get(index)
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| format!("#{index}"))
        };
        term.write_line(&format!(
            "  {} ↔ {} {}",
            name(pair.index_a),
            name(pair.index_b),
            style(format!("{:.1}%", pair.score * 100.0)).yellow()
        ))
        .ok();
    }
    term.write_line("").ok();
}

fn print_json_results(files: &[PathBuf], report: &SimilarityReport, threshold: f64) {
    let output = serde_json::json!({
        "total_images": files.len(),
        "threshold": threshold,
        "files": files,
        "pairs": report.pairs,
        "groups": report.groups,
    });

    println!("{}", serde_json::to_string_pretty(&output).unwrap());
}

fn print_minimal_results(report: &SimilarityReport) {
    for pair in &report.pairs {
        println!("{}\t{}\t{:.6}", pair.index_a, pair.index_b, pair.score);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn threshold_parser_accepts_unit_range() {
        assert_eq!(parse_threshold("0.95").unwrap(), 0.95);
        assert_eq!(parse_threshold("0").unwrap(), 0.0);
        assert_eq!(parse_threshold("1").unwrap(), 1.0);
    }

    #[test]
    fn threshold_parser_rejects_out_of_range() {
        assert!(parse_threshold("1.5").is_err());
        assert!(parse_threshold("-0.1").is_err());
        assert!(parse_threshold("abc").is_err());
    }

    #[test]
    fn image_filter_matches_extensions_case_insensitively() {
        assert!(is_image_file(Path::new("/photos/a.jpg"), false));
        assert!(is_image_file(Path::new("/photos/a.JPEG"), false));
        assert!(is_image_file(Path::new("/photos/a.Png"), false));
        assert!(!is_image_file(Path::new("/photos/doc.pdf"), false));
        assert!(!is_image_file(Path::new("/photos/no_extension"), false));
    }

    #[test]
    fn image_filter_excludes_hidden_unless_asked() {
        assert!(!is_image_file(Path::new("/photos/.hidden.jpg"), false));
        assert!(is_image_file(Path::new("/photos/.hidden.jpg"), true));
    }

    #[test]
    fn collect_expands_directories_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.png"), b"x").unwrap();
        fs::write(dir.path().join("a.jpg"), b"x").unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        fs::write(dir.path().join(".hidden.jpg"), b"x").unwrap();

        let files = collect_image_files(&[dir.path().to_path_buf()], false);

        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("a.jpg"));
        assert!(files[1].ends_with("b.png"));
    }

    #[test]
    fn collect_keeps_explicit_files_regardless_of_extension() {
        let dir = tempfile::tempdir().unwrap();
        let odd = dir.path().join("frame.raw");
        fs::write(&odd, b"x").unwrap();

        let files = collect_image_files(&[odd.clone()], false);
        assert_eq!(files, vec![odd]);
    }

    #[test]
    fn collect_deduplicates_repeated_paths() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.jpg");
        fs::write(&file, b"x").unwrap();

        let files = collect_image_files(
            &[file.clone(), file.clone(), dir.path().to_path_buf()],
            false,
        );
        assert_eq!(files.len(), 1);
    }
}
