use serde::{Deserialize, Serialize};
use std::path::Path;

const CSV_HEADER: [&str; 11] = [
    "timestamp",
    "issued",
    "code_collisions",
    "issuance_failures",
    "validations",
    "validation_misses",
    "cache_hits",
    "cache_misses",
    "cache_hit_rate_percent",
    "issuance_rate_certs_per_sec",
    "uptime_secs",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsReport {
    pub timestamp: String,
    pub issued: u64,
    pub code_collisions: u64,
    pub issuance_failures: u64,
    pub validations: u64,
    pub validation_misses: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_hit_rate: f64,
    /// Filled in by whoever timed the workload; the counters alone can't know it.
    pub issuance_rate: f64,
    pub uptime_secs: u64,
}

impl MetricsReport {
    pub fn print_report(&self) {
        println!("\n╔═══════════════════════════════════════════════════════╗");
        println!("║        Certificate Registry Metrics Report           ║");
        println!("╠═══════════════════════════════════════════════════════╣");
        println!("║ Timestamp: {:<42} ║", self.timestamp);
        println!("║                                                       ║");
        println!("║ 1. Issuance                                           ║");
        println!("║    → Issued: {:<40} ║", self.issued);
        println!("║    → Rate: {:<36.2} certs/sec ║", self.issuance_rate);
        println!("║    → Code collisions retried: {:<23} ║", self.code_collisions);
        println!("║    → Failed issuances: {:<30} ║", self.issuance_failures);
        println!("║                                                       ║");
        println!("║ 2. Validation                                         ║");
        println!("║    → Lookups: {:<39} ║", self.validations);
        println!("║    → Unknown codes: {:<33} ║", self.validation_misses);
        println!("║                                                       ║");
        println!("║ 3. Validation Cache                                   ║");
        println!("║    → Hits: {:<42} ║", self.cache_hits);
        println!("║    → Misses: {:<40} ║", self.cache_misses);
        println!("║    → Hit rate: {:<37.2}% ║", self.cache_hit_rate);
        println!("║                                                       ║");
        println!("║ Uptime: {:<41} sec ║", self.uptime_secs);
        println!("╚═══════════════════════════════════════════════════════╝\n");
    }

    /// Append this report as one CSV row, writing the header when the file is new.
    pub fn save_to_csv(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let file_exists = path.exists();
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;

        let mut wtr = csv::Writer::from_writer(file);

        if !file_exists {
            wtr.write_record(CSV_HEADER)?;
        }

        wtr.write_record([
            self.timestamp.clone(),
            self.issued.to_string(),
            self.code_collisions.to_string(),
            self.issuance_failures.to_string(),
            self.validations.to_string(),
            self.validation_misses.to_string(),
            self.cache_hits.to_string(),
            self.cache_misses.to_string(),
            format!("{:.2}", self.cache_hit_rate),
            format!("{:.2}", self.issuance_rate),
            self.uptime_secs.to_string(),
        ])?;

        wtr.flush()?;
        Ok(())
    }
}
