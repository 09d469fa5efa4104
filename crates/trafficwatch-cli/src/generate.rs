//! Synthetic CLF traffic generator.
//!
//! Appends a burst of random log lines to the target file once per second,
//! all stamped with the wall-clock second of the burst. Useful for demos
//! and for driving the alert threshold in load tests.

use std::io::Write as _;
use std::path::Path;
use std::time::Duration;
use trafficwatch_core::worker::PeriodicWorker;
use trafficwatch_core::{Error, Result};

const CLIENT_IPS: &[&str] = &[
    "192.168.0.110",
    "127.0.0.1",
    "60.242.26.14",
    "50.18.212.157",
    "52.25.214.31",
    "52.26.14.11",
    "54.149.153.72",
    "54.187.208.163",
    "54.68.183.151",
    "107.23.48.182",
];

// Repeats weight the draw toward the common cases.
const METHODS: &[&str] = &["GET", "GET", "GET", "POST", "POST", "PUT", "DELETE"];
const STATUSES: &[&str] = &["200", "200", "200", "200", "200", "304", "403", "404"];

pub fn run(file: &Path, rate: u32) -> Result<()> {
    tracing::info!(file = %file.display(), rate, "generating log lines; press q<Enter> to stop");

    let mut rng = Rng::from_entropy()?;
    let path = file.to_path_buf();
    let mut worker = PeriodicWorker::spawn("log-generator", Duration::from_secs(1), move || {
        if let Err(error) = write_burst(&path, rate, &mut rng) {
            tracing::warn!(%error, "failed to write generated log lines");
        }
    })?;

    let quit = crate::watch::spawn_stdin_reader()?;
    // recv returns Ok on a `q` line and Err when stdin reaches EOF and the
    // reader thread drops its sender; both mean "stop generating".
    let _ = quit.recv();
    worker.stop();
    Ok(())
}

fn write_burst(path: &Path, rate: u32, rng: &mut Rng) -> Result<()> {
    let timestamp = chrono::Local::now().format("%d/%b/%Y:%H:%M:%S %z").to_string();
    let mut burst = String::new();
    for _ in 0..rate {
        burst.push_str(&format!(
            r#"{} - {} [{timestamp}] "{} {} HTTP/1.1" {} {}"#,
            pick(CLIENT_IPS, rng),
            random_word(4, rng),
            pick(METHODS, rng),
            random_path(rng),
            pick(STATUSES, rng),
            rng.below(1000),
        ));
        burst.push('\n');
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    file.write_all(burst.as_bytes())?;
    Ok(())
}

fn pick<'a>(choices: &'a [&'a str], rng: &mut Rng) -> &'a str {
    choices[rng.below(choices.len() as u64) as usize]
}

fn random_path(rng: &mut Rng) -> String {
    format!("/{}/{}", random_word(4, rng), random_word(3, rng))
}

fn random_word(length: usize, rng: &mut Rng) -> String {
    (0..length)
        .map(|_| char::from(b'a' + u8::try_from(rng.below(26)).unwrap_or(0)))
        .collect()
}

/// xorshift64* generator, seeded once from the OS.
struct Rng {
    state: u64,
}

impl Rng {
    fn from_entropy() -> Result<Self> {
        let mut seed = [0u8; 8];
        getrandom::getrandom(&mut seed).map_err(|error| Error::Io(error.into()))?;
        let state = u64::from_le_bytes(seed) | 1;
        Ok(Self { state })
    }

    fn next(&mut self) -> u64 {
        self.state ^= self.state >> 12;
        self.state ^= self.state << 25;
        self.state ^= self.state >> 27;
        self.state.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    fn below(&mut self, bound: u64) -> u64 {
        self.next() % bound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_writes_the_requested_number_of_parseable_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("generated.log");
        let mut rng = Rng::from_entropy().unwrap();

        write_burst(&path, 25, &mut rng).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 25);
        for line in lines {
            let record = trafficwatch_core::parse_line(line)
                .unwrap_or_else(|| panic!("generated line should parse: {line}"));
            assert!(record.timestamp.is_some());
            assert!(record.section.is_some());
        }
    }

    #[test]
    fn bursts_append_rather_than_truncate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("generated.log");
        let mut rng = Rng::from_entropy().unwrap();

        write_burst(&path, 5, &mut rng).unwrap();
        write_burst(&path, 5, &mut rng).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 10);
    }

    #[test]
    fn random_words_are_lowercase_alphabetic() {
        let mut rng = Rng::from_entropy().unwrap();
        for _ in 0..100 {
            let word = random_word(4, &mut rng);
            assert_eq!(word.len(), 4);
            assert!(word.bytes().all(|b| b.is_ascii_lowercase()));
        }
    }
}
