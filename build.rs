use grep::regex::RegexMatcher;
use grep::searcher::{Searcher, Sink, SinkMatch};
use std::error::Error;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// Source directories owned by this crate. Anything else in the checkout
// (vendored data, target/) is never scanned.
const SCANNED_DIRS: [&str; 5] = ["solver", "model", "cli", "tests", "benches"];

// The coding policies enforced on every Rust source file of the crate.
#[derive(Clone, Copy)]
enum Lint {
    UnderscoreBinding,
    ChangeLogComment,
    StarsInComment,
    UppercaseComment,
    AllowDeadCode,
}

impl Lint {
    fn pattern(self) -> &'static str {
        match self {
            Lint::UnderscoreBinding => r"\b(_[a-zA-Z0-9_]+)\b",
            Lint::ChangeLogComment => {
                r"(//|/\*).*(?:FIXED|CORRECTED|FIX|FIXES|NEW|CHANGED|CHANGES|CHANGE|MODIFIED|MODIFIES|MODIFY|UPDATED|UPDATES|UPDATE)"
            }
            Lint::StarsInComment => r"(//|/\*).*\*\*",
            Lint::UppercaseComment => r"(//|/\*).*",
            Lint::AllowDeadCode => r"#\s*\[\s*allow\s*\(\s*dead_code\s*\)\s*\]",
        }
    }

    fn explanation(self) -> &'static str {
        match self {
            Lint::UnderscoreBinding => {
                "Underscore-prefixed names are not allowed. Use the binding or remove it."
            }
            Lint::ChangeLogComment => {
                "Comments describe the code as it is, not its history. Remove change-log words."
            }
            Lint::StarsInComment => {
                "The '**' pattern is only allowed in doc comments."
            }
            Lint::UppercaseComment => {
                "Comments where every alphabetic character is uppercase are not allowed."
            }
            Lint::AllowDeadCode => {
                "#[allow(dead_code)] is not allowed. Use the item or delete it."
            }
        }
    }
}

// Collects the offending lines of one file for one lint.
struct LintCollector {
    lint: Lint,
    violations: Vec<String>,
}

impl LintCollector {
    fn new(lint: Lint) -> Self {
        Self {
            lint,
            violations: Vec::new(),
        }
    }

    fn error_message(&self, file_path: &Path) -> Option<String> {
        if self.violations.is_empty() {
            return None;
        }
        let mut error_msg = format!(
            "\n❌ ERROR: Found {} policy violations in {}:\n",
            self.violations.len(),
            file_path.display()
        );
        for violation in &self.violations {
            error_msg.push_str(&format!("   {violation}\n"));
        }
        error_msg.push_str(&format!("\n⚠️ {}\n", self.lint.explanation()));
        Some(error_msg)
    }

    // Decides whether a line matched by the lint's regex really violates it.
    fn is_violation(&self, line_text: &str) -> bool {
        let trimmed = line_text.trim_start();
        match self.lint {
            Lint::UnderscoreBinding => {
                let is_pure_comment = trimmed.starts_with("//") || line_text.contains("/*");
                !is_pure_comment && !underscore_only_in_strings(line_text)
            }
            Lint::ChangeLogComment | Lint::AllowDeadCode => true,
            Lint::StarsInComment => !is_doc_comment(line_text),
            Lint::UppercaseComment => comment_text(line_text).is_some_and(|text| {
                let alpha: Vec<char> = text.chars().filter(|c| c.is_alphabetic()).collect();
                !alpha.is_empty() && alpha.iter().all(|c| c.is_uppercase())
            }),
        }
    }
}

impl Sink for LintCollector {
    type Error = std::io::Error;

    fn matched(&mut self, _: &Searcher, mat: &SinkMatch) -> Result<bool, Self::Error> {
        let line_number = mat.line_number().unwrap_or(0);
        let line_text = std::str::from_utf8(mat.bytes()).unwrap_or("").trim_end();
        if self.is_violation(line_text) {
            self.violations.push(format!("{line_number}:{line_text}"));
        }
        Ok(true)
    }
}

fn is_doc_comment(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("///") || trimmed.starts_with("//!")
}

// Every underscore-prefixed token on the line sits between double quotes.
fn underscore_only_in_strings(line: &str) -> bool {
    line.contains('"')
        && line
            .split('"')
            .enumerate()
            .any(|(i, part)| i % 2 == 1 && part.contains('_'))
}

// The text of a comment-only line, without its comment markers.
fn comment_text(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    if let Some(rest) = trimmed
        .strip_prefix("///")
        .or_else(|| trimmed.strip_prefix("//!"))
        .or_else(|| trimmed.strip_prefix("//"))
    {
        return Some(rest.trim());
    }
    let idx = line.find("/*")?;
    let rest = &line[idx + 2..];
    Some(match rest.find("*/") {
        Some(end) => rest[..end].trim(),
        None => rest.trim(),
    })
}

fn rust_sources() -> Vec<PathBuf> {
    let mut files = vec![PathBuf::from("build.rs")];
    for dir in SCANNED_DIRS {
        files.extend(
            WalkDir::new(dir)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.path().extension().is_some_and(|ext| ext == "rs"))
                .map(|e| e.into_path()),
        );
    }
    files
}

fn scan(lint: Lint, files: &[PathBuf]) -> Result<(), Box<dyn Error>> {
    let matcher = RegexMatcher::new_line_matcher(lint.pattern())?;
    let mut searcher = Searcher::new();

    for path in files {
        // The build script necessarily spells out the patterns it rejects.
        if path.as_path() == Path::new("build.rs") && !matches!(lint, Lint::UnderscoreBinding) {
            continue;
        }
        let mut collector = LintCollector::new(lint);
        searcher.search_path(&matcher, path, &mut collector)?;
        if let Some(error_message) = collector.error_message(path) {
            return Err(error_message.into());
        }
    }
    Ok(())
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    for dir in SCANNED_DIRS {
        println!("cargo:rerun-if-changed={dir}");
    }

    let files = rust_sources();
    let lints = [
        Lint::UnderscoreBinding,
        Lint::ChangeLogComment,
        Lint::StarsInComment,
        Lint::UppercaseComment,
        Lint::AllowDeadCode,
    ];
    for lint in lints {
        if let Err(e) = scan(lint, &files) {
            // The `eprintln!` here is what shows the violation in cargo's output.
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
