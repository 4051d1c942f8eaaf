//! HTML summary of a training run.
pub mod plots;
pub mod report;

use std::path::Path;

use maud::html;

use crate::error::Result;
use crate::normalizer::TargetEncoding;
use crate::training::TrainingOutcome;

pub use plots::plot_probability_histogram;
pub use report::{Report, ReportSection};

/// Write an HTML report with the schema, column resolutions, training
/// metrics and the distribution of training probabilities.
pub fn write_training_report<P: AsRef<Path>>(outcome: &TrainingOutcome, path: P) -> Result<()> {
    let artifact = &outcome.artifact;
    let schema = outcome.schema();
    let metrics = &outcome.metrics;

    let mut report = Report::new("Churn Model Training Report", env!("CARGO_PKG_VERSION"));

    /* Overview */
    {
        let mut section = ReportSection::new("Overview");
        section.add_content(html! {
            @if artifact.provenance.placeholder_data {
                p style="color: #b00020" {
                    strong { "Trained on synthesized placeholder data." }
                    " Predictions from this model carry no information."
                }
            }
            table {
                tr { th { "Model" } td { (artifact.provenance.model_type) } }
                tr { th { "Trained at" } td { (artifact.provenance.trained_at.to_rfc3339()) } }
                tr { th { "Rows" } td { (metrics.n_rows) } }
                tr { th { "Churn rate" } td { (format!("{:.4}", metrics.positive_rate)) } }
                tr { th { "Training accuracy" } td { (format!("{:.4}", metrics.accuracy)) } }
                tr {
                    th { "Training ROC AUC" }
                    td {
                        @match metrics.roc_auc {
                            Some(auc) => { (format!("{:.4}", auc)) }
                            None => { "n/a" }
                        }
                    }
                }
            }
        });
        report.add_section(section);
    }

    /* Schema */
    {
        let mut section = ReportSection::new("Feature Schema");
        section.add_content(html! {
            p { "Target: " code { (schema.target_name()) } }
            @if let TargetEncoding::Fallback { classes } = &artifact.provenance.target_encoding {
                p { "Target labels were not Yes/No; encoded as codes of " (format!("{:?}", classes)) }
            }
            table {
                tr { th { "Feature" } th { "Kind" } }
                @for name in schema.feature_names() {
                    tr {
                        td { code { (name) } }
                        td { @if schema.is_numeric(name) { "numeric" } @else { "categorical" } }
                    }
                }
            }
            h3 { "Column resolutions" }
            table {
                tr { th { "Canonical" } th { "Observed" } th { "Rule" } }
                @for r in &outcome.normalized.resolutions {
                    tr {
                        td { code { (r.canonical) } }
                        td { code { (r.observed) } }
                        td { (format!("{:?}", r.rule)) }
                    }
                }
            }
        });
        report.add_section(section);
    }

    /* Score distribution */
    if let Some(target) = &outcome.normalized.target {
        let mut section = ReportSection::new("Score Distribution");
        section.add_plot(plot_probability_histogram(
            &outcome.training_proba,
            &target.labels,
            "Training churn probabilities",
        ));
        report.add_section(section);
    }

    /* Provenance */
    {
        let mut section = ReportSection::new("Provenance");
        section.add_content(html! {
            div class="code-container" {
                pre {
                    code { (serde_json::to_string_pretty(&artifact.provenance)?) }
                }
            }
        });
        report.add_section(section);
    }

    report.save_to_file(path)
}
