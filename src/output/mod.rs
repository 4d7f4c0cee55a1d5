mod progress;
mod styling;
mod summary;
mod tables;
pub mod vso;

pub use progress::PhaseProgress;
pub use styling::{blue_bold, dim};
pub use summary::{print_notes_summary, print_stage_summary};

/// Prints the `azrelease` banner to stderr.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        blue_bold("🚢 azrelease"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("Azure DevOps release automation")
    );
}
