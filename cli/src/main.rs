//! pagetex CLI - validate page descriptions and assemble them into LaTeX

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pagetex::{Error, Issue, PageSelection, Pagetex, ValidationReport};

#[derive(Parser)]
#[command(name = "pagetex")]
#[command(version)]
#[command(about = "Validate per-page JSON content and assemble it into a LaTeX document", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ProjectArgs {
    /// Project root (contains pages/)
    #[arg(short, long, value_name = "DIR", default_value = ".", env = "PAGETEX_ROOT")]
    root: PathBuf,

    /// Page numbers to process (e.g., "3", "1-10", "1,3,5-7")
    #[arg(short, long, visible_alias = "page")]
    pages: Option<String>,

    /// Validate pages one at a time
    #[arg(long)]
    sequential: bool,

    /// Skip image existence checks
    #[arg(long)]
    no_image_checks: bool,

    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

impl ProjectArgs {
    fn builder(&self) -> Result<Pagetex, Box<dyn std::error::Error>> {
        let selection = match self.pages {
            Some(ref p) => PageSelection::parse(p)?,
            None => PageSelection::All,
        };
        let mut builder = Pagetex::new(&self.root)
            .with_pages(selection)
            .with_image_checks(!self.no_image_checks);
        if self.sequential {
            builder = builder.sequential();
        }
        Ok(builder)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Validate pages against the schema and text policy
    Validate {
        #[command(flatten)]
        project: ProjectArgs,
    },

    /// Validate a single page document outside a project
    Check {
        /// Page document (content.json)
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate and assemble pages into build/tex
    #[command(alias = "build")]
    Assemble {
        #[command(flatten)]
        project: ProjectArgs,
    },

    /// Remove build/tex, build/pdf and build/logs
    Clean {
        /// Project root (contains pages/)
        #[arg(short, long, value_name = "DIR", default_value = ".", env = "PAGETEX_ROOT")]
        root: PathBuf,
    },

    /// Show version information
    Version,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { project } => cmd_validate(&project),
        Commands::Check { input, json } => cmd_check(&input, json),
        Commands::Assemble { project } => cmd_assemble(&project),
        Commands::Clean { root } => cmd_clean(&root),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn cmd_validate(project: &ProjectArgs) -> Result<(), Box<dyn std::error::Error>> {
    let reports = project.builder()?.validate()?;

    if project.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            print_report(report);
        }
        print_summary(&reports);
    }

    fail_on_invalid(&reports)
}

fn cmd_check(input: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let report = pagetex::validate_file(input);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    fail_on_invalid(std::slice::from_ref(&report))
}

fn cmd_assemble(project: &ProjectArgs) -> Result<(), Box<dyn std::error::Error>> {
    let builder = project.builder()?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("Validating and rendering pages...");

    let output = match builder.assemble() {
        Ok(output) => {
            pb.finish_and_clear();
            output
        }
        Err(e) => {
            pb.finish_and_clear();
            if let Error::Conflicts(ref issues) = e {
                eprintln!("{}", "Assembly aborted, nothing was written:".red().bold());
                for issue in issues {
                    print_issue(issue);
                }
            }
            return Err(e.into());
        }
    };

    if project.json {
        println!("{}", serde_json::to_string_pretty(&output.manifest)?);
    } else {
        for report in output.skipped() {
            print_report(report);
        }

        println!("{}", "Output files:".green().bold());
        for path in &output.fragments {
            println!("  {} {}", "├─".dimmed(), path.display());
        }
        if let Some(ref bib) = output.bibliography {
            println!("  {} {}", "├─".dimmed(), bib.display());
        }
        println!("  {} {}", "└─".dimmed(), output.document.display());

        let stats = &output.stats;
        println!();
        println!("{}", "Content Statistics".cyan().bold());
        println!("{}", "─".repeat(40).dimmed());
        println!("{}: {}", "Pages".bold(), output.page_count());
        println!("{}: {}", "Blocks".bold(), stats.block_count());
        println!("{}: {}", "Figures".bold(), stats.image_count);
        println!("{}: {}", "Tables".bold(), stats.table_count);
        println!("{}: {}", "Listings".bold(), stats.code_count + stats.listing_count);
        println!("{}: {}", "Equations".bold(), stats.equation_count);
        println!("{}: {}", "Words".bold(), stats.word_count);
        println!("{}: {}", "Citations".bold(), stats.reference_count);
    }

    let skipped = output.skipped().count();
    if skipped > 0 {
        return Err(format!("{} page(s) skipped, see the reports above", skipped).into());
    }
    Ok(())
}

fn cmd_clean(root: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let summary = Pagetex::new(root).clean()?;

    if summary.is_empty() {
        println!("{}", "Nothing to clean".dimmed());
    }
    for dir in &summary.removed {
        println!("{} {}", "Removed".green(), dir.display());
    }

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "pagetex".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Per-page JSON to LaTeX assembler");
}

fn print_report(report: &ValidationReport) {
    let page = report
        .page_number
        .map_or_else(|| "?".to_string(), |n| n.to_string());
    if report.is_valid() {
        println!(
            "{} page {} {}",
            "✓".green(),
            page,
            report.source.display().to_string().dimmed()
        );
        return;
    }

    println!(
        "{} page {} {} ({} issue(s))",
        "✗".red(),
        page,
        report.source.display(),
        report.error_count()
    );
    for issue in &report.errors {
        print_issue(issue);
    }
}

fn print_issue(issue: &Issue) {
    println!(
        "    {} {}: {}",
        format!("[{}]", issue.code).yellow(),
        issue.location.to_string().dimmed(),
        issue.message
    );
}

fn print_summary(reports: &[ValidationReport]) {
    let failed = reports.iter().filter(|r| !r.is_valid()).count();
    println!();
    if failed == 0 {
        println!(
            "{} {} page(s) valid",
            "Done!".green().bold(),
            reports.len()
        );
    } else {
        println!(
            "{} {} of {} page(s) invalid",
            "Failed".red().bold(),
            failed,
            reports.len()
        );
    }
}

fn fail_on_invalid(reports: &[ValidationReport]) -> Result<(), Box<dyn std::error::Error>> {
    let failed = reports.iter().filter(|r| !r.is_valid()).count();
    if failed > 0 {
        return Err(format!("{} page(s) failed validation", failed).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_validate_args() {
        let cli = Cli::try_parse_from(["pagetex", "validate", "--root", "thesis", "--page", "1-3", "--json"])
            .unwrap();
        match cli.command {
            Commands::Validate { project } => {
                assert_eq!(project.root, PathBuf::from("thesis"));
                assert_eq!(project.pages.as_deref(), Some("1-3"));
                assert!(project.json);
                assert!(!project.sequential);
            }
            _ => panic!("expected validate"),
        }
    }

    #[test]
    fn test_invalid_page_selection_is_an_error() {
        let cli = Cli::try_parse_from(["pagetex", "assemble", "--pages", "x-"]).unwrap();
        let Commands::Assemble { project } = cli.command else {
            panic!("expected assemble");
        };
        assert!(project.builder().is_err());
    }

    #[test]
    fn test_validate_exit_status() {
        let root = TempDir::new().unwrap();
        let page = root.path().join("pages").join("01");
        fs::create_dir_all(&page).unwrap();
        fs::write(page.join("content.json"), r#"{"title": "A", "pageNumber": 1}"#).unwrap();

        let project = ProjectArgs {
            root: root.path().to_path_buf(),
            pages: None,
            sequential: true,
            no_image_checks: false,
            json: true,
        };
        assert!(cmd_validate(&project).is_ok());

        fs::write(page.join("content.json"), r##"{"title": "# A"}"##).unwrap();
        assert!(cmd_validate(&project).is_err());
    }
}
