// Terminal progress rendering for running wipes
//
// With the `progress-bars` feature a single indicatif bar tracks the current
// phase; it is reset whenever the phase changes. Without it, or in plain mode,
// a status line is printed on every pass change and at most once a second.

use crate::progress::Progress;
use crate::WipePhase;
use std::time::{Duration, Instant};

#[cfg(feature = "progress-bars")]
use indicatif::{ProgressBar, ProgressStyle};

/// How progress is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Interactive bar (falls back to `Plain` without the `progress-bars` feature)
    Bar,
    /// Throttled status lines on stderr
    Plain,
    /// One JSON object per snapshot on stdout
    Json,
}

const PLAIN_INTERVAL: Duration = Duration::from_secs(1);

pub struct ProgressRenderer {
    mode: RenderMode,
    #[cfg(feature = "progress-bars")]
    bar: Option<ProgressBar>,
    current: Option<(WipePhase, usize)>,
    last_line: Option<Instant>,
}

impl ProgressRenderer {
    pub fn new(mode: RenderMode) -> Self {
        #[cfg(not(feature = "progress-bars"))]
        let mode = if mode == RenderMode::Bar {
            RenderMode::Plain
        } else {
            mode
        };

        Self {
            mode,
            #[cfg(feature = "progress-bars")]
            bar: None,
            current: None,
            last_line: None,
        }
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    pub fn update(&mut self, progress: &Progress) {
        let position = (progress.phase, progress.current_pass);
        let pass_changed = self.current != Some(position);
        let phase_changed = self.current.map(|(phase, _)| phase) != Some(progress.phase);
        self.current = Some(position);

        match self.mode {
            RenderMode::Json => match serde_json::to_string(progress) {
                Ok(line) => println!("{}", line),
                Err(e) => tracing::warn!(error = %e, "Failed to encode progress"),
            },
            RenderMode::Plain => {
                let due = self
                    .last_line
                    .map_or(true, |at| at.elapsed() >= PLAIN_INTERVAL);
                if pass_changed || due {
                    eprintln!("{}", status_line(progress));
                    self.last_line = Some(Instant::now());
                }
            }
            RenderMode::Bar => {
                #[cfg(feature = "progress-bars")]
                self.update_bar(progress, phase_changed);
            }
        }

        #[cfg(not(feature = "progress-bars"))]
        let _ = phase_changed;
    }

    #[cfg(feature = "progress-bars")]
    fn update_bar(&mut self, progress: &Progress, phase_changed: bool) {
        if phase_changed {
            if let Some(bar) = self.bar.take() {
                bar.finish();
            }
        }

        let bar = self.bar.get_or_insert_with(|| {
            let bar = ProgressBar::new(progress.total_bytes);
            let style = ProgressStyle::with_template(
                "{prefix:.bold} [{elapsed_precise}] [{wide_bar:.green/white}] {bytes}/{total_bytes} ({bytes_per_sec}, ETA {eta}) {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
            bar.set_style(style);
            bar.set_prefix(progress.phase.to_string());
            bar
        });

        bar.set_length(progress.total_bytes);
        bar.set_position(progress.phase_bytes_written.min(progress.total_bytes));
        bar.set_message(progress.label.clone());
    }

    /// Close the bar, leaving its last state on screen
    pub fn finish(&mut self) {
        #[cfg(feature = "progress-bars")]
        if let Some(bar) = self.bar.take() {
            bar.finish();
        }
        self.current = None;
    }
}

impl Drop for ProgressRenderer {
    fn drop(&mut self) {
        self.finish();
    }
}

/// One-line summary of a snapshot:
/// `Phase 1 | DoD Pass 2/3 (0xFF) | 50.0% | 10.00MB/s | ETA 0:42`
pub fn status_line(progress: &Progress) -> String {
    let eta = progress
        .estimated_remaining
        .map(|d| format_duration(d.as_secs()))
        .unwrap_or_else(|| "--:--".to_string());

    format!(
        "{} | {} | {:.1}% | {}/s | ETA {}",
        progress.phase,
        progress.label,
        progress.percentage(),
        human_bytes(progress.throughput()),
        eta
    )
}

/// Convert a byte count (or bytes/sec) to a readable string
pub fn human_bytes(bytes: f64) -> String {
    let units = ["B", "KB", "MB", "GB", "TB"];
    if bytes <= 0.0 || bytes.is_nan() {
        return "0B".to_string();
    }
    let mut val = bytes;
    let mut i = 0usize;
    while val >= 1024.0 && i + 1 < units.len() {
        val /= 1024.0;
        i += 1;
    }
    format!("{:.2}{}", val, units[i])
}

/// Format seconds to H:MM:SS or M:SS
pub fn format_duration(secs: u64) -> String {
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{}:{:02}", m, s)
    }
}
