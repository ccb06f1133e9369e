use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicUsize, Ordering};

use schemalock_engine::{Confirm, Progress};

/// Asks on stderr and reads the answer from stdin. Anything but `y`/`yes` declines.
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        let mut stderr = io::stderr().lock();
        if write!(stderr, "{prompt} [y/N] ").and_then(|_| stderr.flush()).is_err() {
            return false;
        }

        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => is_yes(&answer),
            Err(_) => false,
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Prints one dot per table on stderr.
#[derive(Default)]
pub struct DotProgress {
    printed: AtomicUsize,
}

impl DotProgress {
    /// Ends the dot line if anything was printed.
    pub fn finish(&self) {
        if self.printed.load(Ordering::Relaxed) > 0 {
            eprintln!();
        }
    }
}

impl Progress for DotProgress {
    fn on_table(&self, _table: &str) {
        self.printed.fetch_add(1, Ordering::Relaxed);
        let mut stderr = io::stderr().lock();
        let _ = write!(stderr, ".").and_then(|_| stderr.flush());
    }
}
