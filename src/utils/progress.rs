use indicatif::{ProgressBar, ProgressStyle};

/// Create a byte-based progress bar for the copy pass; its length is set once the size is known
pub fn create_copy_progress_bar(prefix: &str) -> ProgressBar {
    let bar = ProgressBar::new(0);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{prefix:.bold} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta}) {wide_msg}")
    {
        bar.set_style(style.progress_chars("━━╸"));
    }
    bar.set_prefix(prefix.to_string());
    bar
}

/// Format bytes into human-readable format
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KiB", "MiB", "GiB", "TiB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}
