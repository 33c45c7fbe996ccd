//! Pretty formatter for human-readable terminal output
//!
//! One section per analyzed file, one block per tracked binding: the
//! fragment text, the flat paths, and the graph size.

use std::path::PathBuf;

use colored::Colorize;
use fieldtrace_core::tracker::TrackReport;

pub struct PrettyFormatter;

impl PrettyFormatter {
    pub fn format(&self, results: &[(PathBuf, Vec<TrackReport>)]) -> String {
        let mut output = String::new();

        if results.is_empty() {
            output.push_str("No tracked bindings found.\n");
            return output;
        }

        for (file, reports) in results {
            output.push_str(&format!("{}\n", file.display().to_string().bold()));
            for report in reports {
                output.push_str(&self.format_report(report));
            }
            output.push('\n');
        }

        let total: usize = results.iter().map(|(_, r)| r.len()).sum();
        output.push_str(&format!(
            "Tracked {} binding(s) across {} file(s)\n",
            total,
            results.len()
        ));
        output
    }

    fn format_report(&self, report: &TrackReport) -> String {
        let mut lines = Vec::new();

        lines.push(format!(
            "  {} {} {} {}",
            "binding".green().bold(),
            report.name.bold(),
            "in".dimmed(),
            report.scope
        ));
        lines.push(format!(
            "  {} {} node(s), {} edge(s)",
            "graph".blue(),
            report.graph.nodes.len(),
            report.graph.edges.len()
        ));

        if report.paths.is_empty() {
            lines.push(format!("  {} (none)", "paths".cyan()));
        } else {
            lines.push(format!("  {}", "paths".cyan()));
            for path in &report.paths {
                lines.push(format!("    {path}"));
            }
        }

        if !report.fragment.is_empty() {
            lines.push(format!("  {}", "fragment".magenta()));
            for line in report.fragment_text.lines() {
                lines.push(format!("    {line}"));
            }
        }

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}
