use indicatif::{ProgressBar, ProgressStyle};

/// Progress bar over a file list; hidden unless `verbose`.
pub fn file_progress(len: usize, message: &str, verbose: bool) -> ProgressBar {
    if !verbose {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len as u64);
    match ProgressStyle::default_bar()
        .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {elapsed_precise}")
    {
        Ok(style) => pb.set_style(style.progress_chars("▉▊▋▌▍▎▏ ")),
        Err(e) => tracing::debug!("Falling back to default progress style: {}", e),
    }
    pb.set_message(message.to_string());
    pb
}
